// {{{ Imports
use std::path::PathBuf;

use osubot::context::Error;
use osubot::osu::calculator::RosuCalculator;
use osubot::osu::metrics::compute_metrics;
use osubot::osu::mods::Mods;
use osubot::osu::score::{HitStatistics, ScoreRecord};
// }}}

#[derive(clap::Args)]
pub struct Args {
	/// Path to the `.osu` file
	beatmap: PathBuf,

	#[arg(long, default_value_t = 0)]
	great: u32,
	#[arg(long, default_value_t = 0)]
	ok: u32,
	#[arg(long, default_value_t = 0)]
	meh: u32,
	#[arg(long, default_value_t = 0)]
	miss: u32,

	/// Highest combo reached
	#[arg(long)]
	combo: Option<u32>,

	/// Accuracy percentage used by the stable model. Computed from the
	/// judgements when missing.
	#[arg(long)]
	accuracy: Option<f64>,

	/// Mod acronyms, like `HDDT` or `HD,DT`
	#[arg(long, default_value = "")]
	mods: String,

	/// Use the stable scoring model instead of the lazer one
	#[arg(long)]
	stable: bool,
}

pub fn run(args: Args) -> Result<(), Error> {
	let statistics = HitStatistics::new(args.great, args.ok, args.meh, args.miss);
	let accuracy = args
		.accuracy
		.unwrap_or_else(|| statistics.accuracy_over(statistics.passed_objects()));

	let record = ScoreRecord {
		statistics,
		max_combo: args.combo,
		accuracy: accuracy / 100.0,
		mods: Mods::parse(&args.mods),
		lazer: !args.stable,
		..Default::default()
	};

	let model = record.scoring_model();
	tracing::debug!(?model, "Computing metrics for {:?}", args.beatmap);

	let metrics = compute_metrics(&RosuCalculator, &args.beatmap, &record, model)?;
	println!("{}", toml::to_string_pretty(&metrics)?);

	Ok(())
}
