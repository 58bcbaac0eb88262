// {{{ Imports
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use super::beatmap::BeatmapMetadata;
use super::calculator::{
	AccuracyProfile, CalculationError, DifficultyAttributes, DifficultyCalculator, HitProfile,
	JudgementProfile, ScoringModel,
};
use super::score::{HitStatistics, ScoreRecord};
// }}}

// {{{ Score metrics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreMetrics {
	pub actual_pp: Option<f64>,
	pub pp_if_full_combo: Option<f64>,
	pub pp_if_perfect: Option<f64>,
	/// Percentage in `0..=100`.
	pub accuracy_if_full_combo: f64,
	pub stars_with_mods: f64,
	pub max_combo: Option<u32>,
	pub metadata: BeatmapMetadata,
}
// }}}
// {{{ Full combo projection
/// Judgement counts the player would realistically have ended up with, had
/// they not broken combo.
///
/// Objects the player never reached count as greats. Misses are split
/// between greats and oks according to how often the player failed to get a
/// great on the objects they did hit, rounding towards oks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FullComboProjection {
	pub great: u32,
	pub ok: u32,
	pub meh: u32,
	pub miss: u32,
	/// Percentage in `0..=100`.
	pub accuracy: f64,
}

impl FullComboProjection {
	pub fn project(statistics: &HitStatistics, total_objects: u32) -> Self {
		let great = statistics.great as i64;
		let ok = statistics.ok as i64;
		let meh = statistics.meh as i64;
		let miss = statistics.miss as i64;
		let passed = great + ok + meh + miss;

		// A play can never be judged on more objects than the beatmap has,
		// so a surplus of judgements means the total is too low.
		let total = match total_objects as i64 {
			0 => 0,
			total => total.max(passed),
		};

		let unseen = (total - passed).max(0);
		let mut great_fc = great + unseen;

		let counted_hits = total - miss;
		if counted_hits <= 0 || total <= 0 {
			return Self {
				great: great_fc as u32,
				ok: ok as u32,
				meh: meh as u32,
				miss: 0,
				accuracy: 100.0,
			};
		}

		let ratio = 1.0 - (great_fc as f64 / counted_hits as f64);
		let new_oks = (ratio.max(0.0) * miss as f64).ceil() as i64;

		great_fc += (miss - new_oks).max(0);
		let ok_fc = ok + new_oks;

		let accuracy = (300 * great_fc + 100 * ok_fc + 50 * meh) as f64 / (300 * total) as f64 * 100.0;

		Self {
			great: great_fc as u32,
			ok: ok_fc as u32,
			meh: meh as u32,
			miss: 0,
			accuracy,
		}
	}
}
// }}}
// {{{ Hit profiles
fn actual_profile(score: &ScoreRecord, model: ScoringModel) -> HitProfile {
	let statistics = &score.statistics;
	match model {
		ScoringModel::Lazer => HitProfile::Judgements(JudgementProfile {
			n300: statistics.great,
			n100: statistics.ok,
			n50: statistics.meh,
			misses: statistics.miss,
			slider_end_hits: Some(statistics.slider_tail_hit),
			small_tick_hits: Some(statistics.small_tick_hit),
			combo: score.max_combo,
		}),
		ScoringModel::Stable => HitProfile::Accuracy(AccuracyProfile {
			accuracy: score.accuracy * 100.0,
			misses: statistics.miss,
			combo: score.max_combo,
		}),
	}
}

fn full_combo_profile(
	projection: &FullComboProjection,
	attributes: &DifficultyAttributes,
	model: ScoringModel,
) -> HitProfile {
	match model {
		// Slider ends and ticks are all collected on a full combo
		ScoringModel::Lazer => HitProfile::Judgements(JudgementProfile {
			n300: projection.great,
			n100: projection.ok,
			n50: projection.meh,
			misses: projection.miss,
			slider_end_hits: Some(attributes.slider_count),
			small_tick_hits: Some(attributes.small_tick_count).filter(|ticks| *ticks > 0),
			combo: None,
		}),
		ScoringModel::Stable => HitProfile::Accuracy(AccuracyProfile {
			accuracy: projection.accuracy,
			misses: 0,
			combo: attributes.max_combo,
		}),
	}
}
// }}}
// {{{ Compute metrics
/// Computes the actual, full combo and perfect performance of a play,
/// together with the data needed to display it.
///
/// This does no I/O besides reading the beatmap at `beatmap_path`, so async
/// callers should run it on a blocking thread.
pub fn compute_metrics<C: DifficultyCalculator>(
	calculator: &C,
	beatmap_path: &Path,
	score: &ScoreRecord,
	model: ScoringModel,
) -> Result<ScoreMetrics, CalculationError> {
	let mods = &score.mods;
	let beatmap = calculator.parse_beatmap(beatmap_path)?;
	let attributes = calculator.difficulty(&beatmap, mods, model)?;

	let projection = FullComboProjection::project(&score.statistics, attributes.total_objects());
	debug!(
		?projection,
		total_objects = attributes.total_objects(),
		"Projected full combo for beatmap {}",
		score.beatmap_id
	);

	let actual_pp =
		calculator.performance(&beatmap, mods, model, &actual_profile(score, model))?;
	let pp_if_full_combo = calculator.performance(
		&beatmap,
		mods,
		model,
		&full_combo_profile(&projection, &attributes, model),
	)?;
	let pp_if_perfect = calculator.performance(&beatmap, mods, model, &HitProfile::perfect())?;

	Ok(ScoreMetrics {
		actual_pp,
		pp_if_full_combo,
		pp_if_perfect,
		accuracy_if_full_combo: projection.accuracy,
		stars_with_mods: attributes.stars,
		max_combo: attributes.max_combo,
		metadata: score.metadata,
	})
}

#[cfg(test)]
mod metrics_tests {
	use std::path::PathBuf;

	use proptest::prelude::*;

	use super::testing::FakeCalculator;
	use super::*;
	use crate::osu::mods::Mods;

	fn record(statistics: HitStatistics) -> ScoreRecord {
		ScoreRecord {
			statistics,
			max_combo: Some(321),
			accuracy: 0.5,
			mods: Mods::parse("HDDT"),
			beatmap_id: 75,
			beatmapset_id: 1,
			metadata: BeatmapMetadata {
				circle_size: Some(4.0),
				bpm: Some(180.0),
				..Default::default()
			},
			lazer: true,
		}
	}

	fn path() -> PathBuf {
		PathBuf::from("75.osu")
	}

	// {{{ Projection scenarios
	#[test]
	fn redistributes_misses_towards_oks() {
		let projection = FullComboProjection::project(&HitStatistics::new(80, 10, 5, 5), 100);

		// 1 - 80/95 of five misses, rounded up
		assert_eq!(projection.great, 84);
		assert_eq!(projection.ok, 11);
		assert_eq!(projection.meh, 5);
		assert_eq!(projection.miss, 0);
		assert!((projection.accuracy - 88.5).abs() < 1e-9);
	}

	#[test]
	fn no_misses_keeps_counts() {
		let statistics = HitStatistics::new(85, 10, 5, 0);
		let projection = FullComboProjection::project(&statistics, 100);

		assert_eq!(
			(projection.great, projection.ok, projection.meh, projection.miss),
			(85, 10, 5, 0)
		);
		assert!((projection.accuracy - statistics.accuracy_over(100)).abs() < 1e-9);
	}

	#[test]
	fn unplayed_attempt_is_perfect() {
		let projection = FullComboProjection::project(&HitStatistics::default(), 50);

		assert_eq!(projection.great, 50);
		assert_eq!(projection.ok, 0);
		assert!((projection.accuracy - 100.0).abs() < 1e-9);
	}

	#[test]
	fn empty_beatmap_does_not_divide_by_zero() {
		let projection = FullComboProjection::project(&HitStatistics::new(3, 2, 1, 4), 0);
		assert_eq!(projection.accuracy, 100.0);
		assert_eq!(projection.ok, 2);
		assert_eq!(projection.meh, 1);
		assert_eq!(projection.miss, 0);
	}

	#[test]
	fn more_misses_than_objects_is_perfect() {
		let projection = FullComboProjection::project(&HitStatistics::new(0, 0, 0, 20), 10);
		assert_eq!(projection.accuracy, 100.0);
		assert_eq!(projection.miss, 0);
	}

	#[test]
	fn surplus_judgements_never_exceed_a_hundred_percent() {
		let projection = FullComboProjection::project(&HitStatistics::new(102, 0, 0, 0), 100);
		assert_eq!(projection.great, 102);
		assert!((projection.accuracy - 100.0).abs() < 1e-9);

		let projection = FullComboProjection::project(&HitStatistics::new(98, 2, 0, 3), 100);
		assert!(projection.accuracy <= 100.0);
		assert_eq!(projection.great + projection.ok + projection.meh, 103);
	}

	#[test]
	fn failed_play_counts_unseen_objects_as_greats() {
		// 40 objects were never reached
		let projection = FullComboProjection::project(&HitStatistics::new(50, 5, 3, 2), 100);

		// ratio = 1 - 90/98 ~ 0.0816, so one of the two misses becomes an ok
		assert_eq!(projection.great, 91);
		assert_eq!(projection.ok, 6);
		assert_eq!(projection.meh, 3);
	}
	// }}}
	// {{{ Engine
	#[test]
	fn evaluates_three_independent_profiles() {
		let calculator = FakeCalculator::with_objects(70, 30);
		let score = record(HitStatistics {
			slider_tail_hit: 25,
			small_tick_hit: 4,
			..HitStatistics::new(80, 10, 5, 5)
		});

		let metrics = compute_metrics(&calculator, &path(), &score, ScoringModel::Lazer).unwrap();
		let evaluations = calculator.evaluations();

		assert_eq!(evaluations.len(), 3);
		assert!(evaluations
			.iter()
			.all(|(mods, model, _)| mods == "HDDT" && *model == ScoringModel::Lazer));

		let HitProfile::Judgements(actual) = evaluations[0].2 else {
			panic!("expected judgements for the actual play");
		};
		assert_eq!((actual.n300, actual.n100, actual.n50, actual.misses), (80, 10, 5, 5));
		assert_eq!(actual.slider_end_hits, Some(25));
		assert_eq!(actual.small_tick_hits, Some(4));
		assert_eq!(actual.combo, Some(321));

		let HitProfile::Judgements(fc) = evaluations[1].2 else {
			panic!("expected judgements for the full combo");
		};
		assert_eq!((fc.n300, fc.n100, fc.n50, fc.misses), (84, 11, 5, 0));
		assert_eq!(fc.slider_end_hits, Some(30));
		assert_eq!(fc.small_tick_hits, None);

		assert_eq!(evaluations[2].2, HitProfile::perfect());

		assert!((metrics.accuracy_if_full_combo - 88.5).abs() < 1e-9);
		assert_eq!(metrics.stars_with_mods, 5.25);
		assert_eq!(metrics.max_combo, Some(130));
		assert_eq!(metrics.metadata.bpm, Some(180.0));
		assert!(metrics.pp_if_full_combo >= metrics.actual_pp);
	}

	#[test]
	fn stable_uses_accuracy_profiles() {
		let calculator = FakeCalculator::with_objects(70, 30);
		let score = record(HitStatistics::new(80, 10, 5, 5));

		compute_metrics(&calculator, &path(), &score, ScoringModel::Stable).unwrap();
		let evaluations = calculator.evaluations();

		assert_eq!(
			evaluations[0].2,
			HitProfile::Accuracy(AccuracyProfile {
				accuracy: 50.0,
				misses: 5,
				combo: Some(321),
			})
		);

		let HitProfile::Accuracy(fc) = evaluations[1].2 else {
			panic!("expected an accuracy profile for the full combo");
		};
		assert!((fc.accuracy - 88.5).abs() < 1e-9);
		assert_eq!(fc.misses, 0);
		assert_eq!(fc.combo, Some(130));
	}

	#[test]
	fn unknown_max_combo_is_never_fed_as_zero() {
		let mut calculator = FakeCalculator::with_objects(10, 0);
		calculator.attributes.max_combo = None;
		let mut score = record(HitStatistics::new(9, 0, 0, 1));
		score.max_combo = None;

		let metrics = compute_metrics(&calculator, &path(), &score, ScoringModel::Stable).unwrap();

		for (_, _, profile) in calculator.evaluations() {
			let HitProfile::Accuracy(profile) = profile else {
				panic!("expected accuracy profiles");
			};
			assert_eq!(profile.combo, None);
		}
		assert_eq!(metrics.max_combo, None);
	}

	#[test]
	fn perfect_pp_ignores_the_play() {
		let calculator = FakeCalculator::with_objects(70, 30);
		let good = compute_metrics(
			&calculator,
			&path(),
			&record(HitStatistics::new(100, 0, 0, 0)),
			ScoringModel::Lazer,
		)
		.unwrap();
		let bad = compute_metrics(
			&calculator,
			&path(),
			&record(HitStatistics::new(10, 20, 30, 40)),
			ScoringModel::Lazer,
		)
		.unwrap();

		assert_eq!(good.pp_if_perfect, bad.pp_if_perfect);
		assert_ne!(good.actual_pp, bad.actual_pp);
	}

	#[test]
	fn is_idempotent() {
		let calculator = FakeCalculator::with_objects(70, 30);
		let score = record(HitStatistics::new(60, 20, 10, 10));

		let first = compute_metrics(&calculator, &path(), &score, ScoringModel::Lazer).unwrap();
		let second = compute_metrics(&calculator, &path(), &score, ScoringModel::Lazer).unwrap();
		assert_eq!(first, second);
	}

	#[test]
	fn surfaces_calculator_errors() {
		let calculator = FakeCalculator::with_objects(70, 30);
		let score = record(HitStatistics::default());

		let res = compute_metrics(&calculator, Path::new("75.txt"), &score, ScoringModel::Lazer);
		assert!(matches!(res, Err(CalculationError::Parse { .. })));

		let mut score = score;
		score.mods = Mods::from_api(&[crate::osu::mods::ApiMod::Acronym("#".into())]);
		let res = compute_metrics(&calculator, &path(), &score, ScoringModel::Lazer);
		assert!(matches!(res, Err(CalculationError::InvalidMods(_))));
	}

	#[test]
	fn all_zero_statistics_do_not_fail() {
		let calculator = FakeCalculator::with_objects(0, 0);
		let metrics = compute_metrics(
			&calculator,
			&path(),
			&record(HitStatistics::default()),
			ScoringModel::Lazer,
		)
		.unwrap();

		assert_eq!(metrics.accuracy_if_full_combo, 100.0);
	}
	// }}}
	// {{{ Properties
	proptest! {
		#[test]
		fn full_combo_never_scores_worse(
			great in 0u32..2000,
			ok in 0u32..500,
			meh in 0u32..500,
			miss in 0u32..500,
			unseen in -200i64..500,
		) {
			let statistics = HitStatistics::new(great, ok, meh, miss);
			let passed = statistics.passed_objects();
			let total = (passed as i64 + unseen).max(0) as u32;
			let projection = FullComboProjection::project(&statistics, total);

			// Surplus judgements are judged against the objects actually played
			let judged = if total == 0 { 0 } else { total.max(passed) };

			prop_assert!(projection.accuracy + 1e-9 >= statistics.accuracy_over(judged));
			prop_assert!(projection.accuracy >= 0.0);
			prop_assert!(projection.accuracy <= 100.0 + 1e-9);
			prop_assert_eq!(projection.miss, 0);
			prop_assert_eq!(projection.meh, meh);
			if judged > 0 && miss < judged {
				prop_assert_eq!(projection.great + projection.ok + projection.meh, judged);
			}
		}

		#[test]
		fn zero_misses_is_a_no_op(great in 0u32..2000, ok in 0u32..500, meh in 0u32..500) {
			let statistics = HitStatistics::new(great, ok, meh, 0);
			let total = statistics.passed_objects();
			let projection = FullComboProjection::project(&statistics, total);

			prop_assert_eq!(
				(projection.great, projection.ok, projection.meh),
				(great, ok, meh)
			);
		}
	}
	// }}}
}
// }}}
