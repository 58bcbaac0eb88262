// {{{ Imports
use osubot::commands::score::metrics_for;
use osubot::context::{Error, UserContext};
// }}}

#[derive(clap::Args)]
pub struct Args {
	score_id: u64,
}

pub async fn run(args: Args) -> Result<(), Error> {
	let ctx = UserContext::new()?;

	let score = ctx
		.osu
		.score(args.score_id)
		.await
		.map_err(|e| e.error)?;
	let metrics = metrics_for(&ctx, &score).await.map_err(|e| e.error)?;

	println!("{}", toml::to_string_pretty(&metrics)?);
	Ok(())
}
