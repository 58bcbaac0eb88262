//! The narrow interface the metrics engine uses to talk to the
//! performance calculator, together with its `rosu-pp` implementation.
//!
//! The calculator's builders accumulate configuration by mutation, so
//! every difficulty or performance evaluation builds its own object from
//! scratch. Nothing is shared between evaluations apart from the parsed
//! beatmap, which is only ever read.

use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use rosu_pp::any::DifficultyAttributes as RosuAttributes;
use rosu_pp::model::mode::GameMode;
use rosu_pp::model::mods::rosu_mods::GameModsIntermode;
use rosu_pp::{Beatmap, Difficulty, Performance};
use serde::Serialize;

use super::mods::Mods;

// {{{ Errors
#[derive(Debug, thiserror::Error)]
pub enum CalculationError {
	#[error("Could not read beatmap file `{path}`: {source}")]
	Read {
		path: PathBuf,
		source: std::io::Error,
	},

	#[error("Could not parse beatmap file `{path}`: {source}")]
	Parse {
		path: PathBuf,
		source: std::io::Error,
	},

	#[error("The calculator does not understand the mod `{0}`")]
	InvalidMods(String),

	#[error("Performance metrics are only available for osu!standard beatmaps, not {0}")]
	UnsupportedRuleset(String),
}

impl CalculationError {
	fn invalid_data(path: &Path, reason: impl Into<String>) -> Self {
		Self::Parse {
			path: path.to_owned(),
			source: std::io::Error::new(IoErrorKind::InvalidData, reason.into()),
		}
	}
}
// }}}
// {{{ Scoring model
/// The two incompatible scoring conventions, which expect differently
/// shaped inputs when evaluating performance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, poise::ChoiceParameter)]
pub enum ScoringModel {
	/// Full judgement granularity, including slider sub-judgements.
	Lazer,
	/// Accuracy, misses and combo only.
	Stable,
}

impl Default for ScoringModel {
	fn default() -> Self {
		Self::Lazer
	}
}

impl ScoringModel {
	#[inline]
	pub fn is_lazer(self) -> bool {
		matches!(self, Self::Lazer)
	}
}
// }}}
// {{{ Hit profiles
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JudgementProfile {
	pub n300: u32,
	pub n100: u32,
	pub n50: u32,
	pub misses: u32,
	pub slider_end_hits: Option<u32>,
	pub small_tick_hits: Option<u32>,
	pub combo: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccuracyProfile {
	/// Accuracy as a percentage in `0..=100`.
	pub accuracy: f64,
	pub misses: u32,
	pub combo: Option<u32>,
}

/// What a single performance evaluation is told about the play.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitProfile {
	Judgements(JudgementProfile),
	Accuracy(AccuracyProfile),
}

impl HitProfile {
	/// A flawless play, independent of any actual attempt.
	#[inline]
	pub fn perfect() -> Self {
		Self::Accuracy(AccuracyProfile {
			accuracy: 100.0,
			misses: 0,
			combo: None,
		})
	}
}
// }}}
// {{{ Difficulty attributes
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct DifficultyAttributes {
	pub stars: f64,
	pub max_combo: Option<u32>,
	pub circle_count: u32,
	pub slider_count: u32,
	pub spinner_count: u32,
	pub large_tick_count: u32,
	pub small_tick_count: u32,
}

impl DifficultyAttributes {
	/// The number of objects a play is judged on.
	///
	/// Spinners are judged like any other object, while ticks never are.
	/// This is the same for both scoring models, so the actual, full combo
	/// and perfect evaluations all agree on it.
	#[inline]
	pub fn total_objects(&self) -> u32 {
		self.circle_count + self.slider_count + self.spinner_count
	}
}
// }}}
// {{{ Calculator trait
pub trait DifficultyCalculator {
	type Beatmap;

	fn parse_beatmap(&self, path: &Path) -> Result<Self::Beatmap, CalculationError>;

	fn difficulty(
		&self,
		beatmap: &Self::Beatmap,
		mods: &Mods,
		model: ScoringModel,
	) -> Result<DifficultyAttributes, CalculationError>;

	/// Evaluates a single hit profile. Returns [None] when the calculator
	/// does not produce a usable value.
	fn performance(
		&self,
		beatmap: &Self::Beatmap,
		mods: &Mods,
		model: ScoringModel,
		profile: &HitProfile,
	) -> Result<Option<f64>, CalculationError>;
}
// }}}
// {{{ rosu-pp implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct RosuCalculator;

impl RosuCalculator {
	fn game_mods(mods: &Mods) -> Result<GameModsIntermode, CalculationError> {
		if let Some(invalid) = mods.first_invalid() {
			return Err(CalculationError::InvalidMods(invalid.to_owned()));
		}

		Ok(GameModsIntermode::from_acronyms(&mods.to_string()))
	}
}

impl DifficultyCalculator for RosuCalculator {
	type Beatmap = Beatmap;

	fn parse_beatmap(&self, path: &Path) -> Result<Beatmap, CalculationError> {
		let beatmap = Beatmap::from_path(path).map_err(|source| match source.kind() {
			IoErrorKind::NotFound | IoErrorKind::PermissionDenied => CalculationError::Read {
				path: path.to_owned(),
				source,
			},
			_ => CalculationError::Parse {
				path: path.to_owned(),
				source,
			},
		})?;

		// The parser is lenient enough to accept any text, error pages included
		if beatmap.hit_objects.is_empty() {
			return Err(CalculationError::invalid_data(path, "beatmap has no hit objects"));
		}

		beatmap
			.check_suspicion()
			.map_err(|suspicion| CalculationError::invalid_data(path, suspicion.to_string()))?;

		Ok(beatmap)
	}

	fn difficulty(
		&self,
		beatmap: &Beatmap,
		mods: &Mods,
		model: ScoringModel,
	) -> Result<DifficultyAttributes, CalculationError> {
		if beatmap.mode != GameMode::Osu {
			return Err(CalculationError::UnsupportedRuleset(format!("{:?}", beatmap.mode)));
		}

		let game_mods = Self::game_mods(mods)?;
		let attributes = Difficulty::new()
			.mods(&game_mods)
			.lazer(model.is_lazer())
			.calculate(beatmap);

		let stars = attributes.stars();
		let max_combo = Some(attributes.max_combo()).filter(|combo| *combo > 0);

		let RosuAttributes::Osu(attrs) = &attributes else {
			return Err(CalculationError::UnsupportedRuleset(format!("{:?}", beatmap.mode)));
		};

		Ok(DifficultyAttributes {
			stars,
			max_combo,
			circle_count: attrs.n_circles,
			slider_count: attrs.n_sliders,
			spinner_count: attrs.n_spinners,
			large_tick_count: attrs.n_large_ticks,
			// rosu-pp does not expose small tick totals
			small_tick_count: 0,
		})
	}

	fn performance(
		&self,
		beatmap: &Beatmap,
		mods: &Mods,
		model: ScoringModel,
		profile: &HitProfile,
	) -> Result<Option<f64>, CalculationError> {
		let game_mods = Self::game_mods(mods)?;
		let mut performance = Performance::new(beatmap)
			.mods(&game_mods)
			.lazer(model.is_lazer());

		match profile {
			HitProfile::Judgements(judgements) => {
				performance = performance
					.n300(judgements.n300)
					.n100(judgements.n100)
					.n50(judgements.n50)
					.misses(judgements.misses);

				if let Some(hits) = judgements.slider_end_hits {
					performance = performance.slider_end_hits(hits);
				}

				if let Some(hits) = judgements.small_tick_hits {
					performance = performance.small_tick_hits(hits);
				}

				if let Some(combo) = judgements.combo {
					performance = performance.combo(combo);
				}
			}
			HitProfile::Accuracy(accuracy) => {
				performance = performance
					.accuracy(accuracy.accuracy)
					.misses(accuracy.misses);

				if let Some(combo) = accuracy.combo {
					performance = performance.combo(combo);
				}
			}
		}

		let pp = performance.calculate().pp();
		Ok(Some(pp).filter(|pp| pp.is_finite()))
	}
}
// }}}
// {{{ Tests
#[cfg(test)]
mod calculator_tests {
	use tempfile::TempDir;

	use super::*;
	use crate::osu::metrics::compute_metrics;
	use crate::osu::mods::ApiMod;
	use crate::osu::score::{HitStatistics, ScoreRecord};

	const CIRCLES: u32 = 40;

	/// A short osu!standard beatmap with alternating jumps, one slider and
	/// one spinner.
	fn beatmap_text(mode: u8) -> String {
		let mut text = format!(
			"osu file format v14

[General]
AudioFilename: audio.mp3
Mode: {mode}

[Difficulty]
HPDrainRate:5
CircleSize:4
OverallDifficulty:8
ApproachRate:9
SliderMultiplier:1.4
SliderTickRate:1

[TimingPoints]
0,375,4,2,0,100,1,0

[HitObjects]
"
		);

		for i in 0..CIRCLES {
			let x = if i % 2 == 0 { 64 } else { 448 };
			text.push_str(&format!("{x},192,{},1,0,0:0:0:0:\n", 1000 + i * 250));
		}

		text.push_str("256,64,12000,2,0,L|256:320,1,256\n");
		text.push_str("256,192,14000,12,0,16000,0:0:0:0:\n");
		text
	}

	fn write_beatmap(contents: &str) -> (PathBuf, TempDir) {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("75.osu");
		std::fs::write(&path, contents).unwrap();
		(path, dir)
	}

	fn record(statistics: HitStatistics, lazer: bool) -> ScoreRecord {
		ScoreRecord {
			statistics,
			max_combo: Some(20),
			accuracy: statistics.accuracy_over(CIRCLES + 2) / 100.0,
			beatmap_id: 75,
			lazer,
			..Default::default()
		}
	}

	// {{{ Parsing
	#[test]
	fn missing_beatmap_is_a_read_error() {
		let dir = tempfile::tempdir().unwrap();
		let res = RosuCalculator.parse_beatmap(&dir.path().join("404.osu"));
		assert!(matches!(res, Err(CalculationError::Read { .. })));
	}

	#[test]
	fn error_pages_are_parse_errors() {
		for contents in ["<html>502 Bad Gateway</html>", ""] {
			let (path, _guard) = write_beatmap(contents);
			let res = RosuCalculator.parse_beatmap(&path);
			assert!(matches!(res, Err(CalculationError::Parse { .. })));
		}
	}

	#[test]
	fn broken_beatmaps_never_yield_metrics() {
		let (path, _guard) = write_beatmap("<html>502 Bad Gateway</html>");
		let score = record(HitStatistics::new(CIRCLES + 2, 0, 0, 0), true);

		let res = compute_metrics(&RosuCalculator, &path, &score, ScoringModel::Lazer);
		assert!(matches!(res, Err(CalculationError::Parse { .. })));
	}

	#[test]
	fn only_standard_beatmaps_are_supported() {
		let (path, _guard) = write_beatmap(&beatmap_text(3));
		let beatmap = RosuCalculator.parse_beatmap(&path).unwrap();

		let res = RosuCalculator.difficulty(&beatmap, &Mods::default(), ScoringModel::Lazer);
		assert!(matches!(res, Err(CalculationError::UnsupportedRuleset(_))));
	}
	// }}}
	// {{{ Attributes
	#[test]
	fn rejects_unknown_mod_shapes() {
		let mods = Mods::parse("HD");
		assert!(RosuCalculator::game_mods(&mods).is_ok());

		let mods = Mods::from_api(&[ApiMod::Acronym("??".into())]);
		assert!(matches!(
			RosuCalculator::game_mods(&mods),
			Err(CalculationError::InvalidMods(m)) if m == "??"
		));
	}

	#[test]
	fn object_total_ignores_ticks() {
		let attrs = DifficultyAttributes {
			circle_count: 300,
			slider_count: 150,
			spinner_count: 2,
			large_tick_count: 90,
			small_tick_count: 12,
			..Default::default()
		};

		assert_eq!(attrs.total_objects(), 452);
	}

	#[test]
	fn counts_every_judged_object() {
		let (path, _guard) = write_beatmap(&beatmap_text(0));
		let beatmap = RosuCalculator.parse_beatmap(&path).unwrap();

		for model in [ScoringModel::Lazer, ScoringModel::Stable] {
			let attrs = RosuCalculator
				.difficulty(&beatmap, &Mods::parse("HR"), model)
				.unwrap();

			assert_eq!(attrs.circle_count, CIRCLES);
			assert_eq!(attrs.slider_count, 1);
			assert_eq!(attrs.spinner_count, 1);
			assert_eq!(attrs.total_objects(), CIRCLES + 2);
			assert!(attrs.stars > 0.0);
			assert!(attrs.max_combo.is_some_and(|combo| combo >= CIRCLES + 2));
		}
	}
	// }}}
	// {{{ Performance
	#[test]
	fn full_plays_project_to_at_most_a_hundred_percent() {
		let (path, _guard) = write_beatmap(&beatmap_text(0));
		let score = record(HitStatistics::new(CIRCLES + 2, 0, 0, 0), true);

		for model in [ScoringModel::Lazer, ScoringModel::Stable] {
			let metrics = compute_metrics(&RosuCalculator, &path, &score, model).unwrap();
			assert!((metrics.accuracy_if_full_combo - 100.0).abs() < 1e-9);
		}
	}

	#[test]
	fn performance_is_ordered_for_both_models() {
		let (path, _guard) = write_beatmap(&beatmap_text(0));
		let statistics = HitStatistics {
			slider_tail_hit: 1,
			..HitStatistics::new(36, 2, 0, 4)
		};

		for model in [ScoringModel::Lazer, ScoringModel::Stable] {
			let score = record(statistics, model.is_lazer());
			let metrics = compute_metrics(&RosuCalculator, &path, &score, model).unwrap();

			let actual = metrics.actual_pp.unwrap();
			let full_combo = metrics.pp_if_full_combo.unwrap();
			let perfect = metrics.pp_if_perfect.unwrap();

			assert!(actual.is_finite() && actual >= 0.0);
			assert!(perfect > 0.0);
			assert!(full_combo + 1e-9 >= actual, "{model:?}: {full_combo} < {actual}");
			assert!(perfect + 1e-9 >= full_combo, "{model:?}: {perfect} < {full_combo}");
			assert!(metrics.accuracy_if_full_combo <= 100.0);
		}
	}

	#[test]
	fn perfect_pp_is_the_same_for_every_play() {
		let (path, _guard) = write_beatmap(&beatmap_text(0));
		let good = record(HitStatistics::new(CIRCLES + 2, 0, 0, 0), true);
		let bad = record(HitStatistics::new(10, 12, 6, 14), true);

		let good = compute_metrics(&RosuCalculator, &path, &good, ScoringModel::Lazer).unwrap();
		let bad = compute_metrics(&RosuCalculator, &path, &bad, ScoringModel::Lazer).unwrap();

		assert_eq!(good.pp_if_perfect, bad.pp_if_perfect);
		assert_ne!(good.actual_pp, bad.actual_pp);
	}
	// }}}
}
// }}}
