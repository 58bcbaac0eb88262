use std::fmt::Display;
use std::str::FromStr;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use super::beatmap::BeatmapMetadata;
use super::calculator::ScoringModel;
use super::mods::Mods;

// {{{ Ruleset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, poise::ChoiceParameter)]
#[serde(rename_all = "lowercase")]
pub enum Ruleset {
	#[name = "osu"]
	Osu,
	#[name = "taiko"]
	Taiko,
	#[name = "fruits"]
	Fruits,
	#[name = "mania"]
	Mania,
}

impl Default for Ruleset {
	fn default() -> Self {
		Self::Osu
	}
}

impl Ruleset {
	pub const RULESETS: [Self; 4] = [Self::Osu, Self::Taiko, Self::Fruits, Self::Mania];
	pub const RULESET_STRINGS: [&'static str; 4] = ["osu", "taiko", "fruits", "mania"];

	#[inline]
	pub fn to_index(self) -> usize {
		self as usize
	}

	#[inline]
	pub fn as_str(self) -> &'static str {
		Self::RULESET_STRINGS[self.to_index()]
	}

	/// Converts the numeric `ruleset_id` used by score payloads.
	#[inline]
	pub fn from_id(id: u8) -> Option<Self> {
		Self::RULESETS.get(id as usize).copied()
	}
}

impl Display for Ruleset {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

impl FromStr for Ruleset {
	type Err = anyhow::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::RULESET_STRINGS
			.iter()
			.position(|r| r.eq_ignore_ascii_case(s.trim()))
			.map(|i| Self::RULESETS[i])
			.ok_or_else(|| {
				anyhow!("Ruleset must be one of (osu | taiko | fruits | mania), got {s:?}")
			})
	}
}
// }}}
// {{{ Hit statistics
/// Judgement counts for a single attempt. The API omits zero counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HitStatistics {
	pub great: u32,
	pub ok: u32,
	pub meh: u32,
	pub miss: u32,
	pub slider_tail_hit: u32,
	pub small_tick_hit: u32,
}

impl HitStatistics {
	#[inline]
	pub fn new(great: u32, ok: u32, meh: u32, miss: u32) -> Self {
		Self {
			great,
			ok,
			meh,
			miss,
			..Default::default()
		}
	}

	/// Every object the player reached, missed or not.
	#[inline]
	pub fn passed_objects(&self) -> u32 {
		self.great + self.ok + self.meh + self.miss
	}

	/// Accuracy as a percentage, judged against `total_objects` rather than
	/// only the objects that were reached.
	pub fn accuracy_over(&self, total_objects: u32) -> f64 {
		if total_objects == 0 {
			return 0.0;
		}

		let points = 300 * self.great as u64 + 100 * self.ok as u64 + 50 * self.meh as u64;
		points as f64 / (300 * total_objects as u64) as f64 * 100.0
	}
}
// }}}
// {{{ Score record
/// Everything the metrics engine needs to know about a single play.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScoreRecord {
	pub statistics: HitStatistics,
	pub max_combo: Option<u32>,
	/// Accuracy as a fraction in `0..=1`.
	pub accuracy: f64,
	pub mods: Mods,
	pub beatmap_id: u32,
	pub beatmapset_id: u32,
	pub metadata: BeatmapMetadata,
	/// Whether the play was set on lazer.
	pub lazer: bool,
}

impl ScoreRecord {
	/// Lazer plays are scored with the lazer model, everything else with
	/// the stable one.
	#[inline]
	pub fn scoring_model(&self) -> ScoringModel {
		if self.lazer {
			ScoringModel::Lazer
		} else {
			ScoringModel::Stable
		}
	}
}
// }}}
// {{{ Tests
#[cfg(test)]
mod score_tests {
	use super::*;

	#[test]
	fn ruleset_round_trips_through_strings() {
		for ruleset in Ruleset::RULESETS {
			assert_eq!(ruleset.as_str().parse::<Ruleset>().unwrap(), ruleset);
		}

		assert_eq!("Mania".parse::<Ruleset>().unwrap(), Ruleset::Mania);
		assert!("catch".parse::<Ruleset>().is_err());
		assert_eq!(Ruleset::from_id(2), Some(Ruleset::Fruits));
		assert_eq!(Ruleset::from_id(7), None);
	}

	#[test]
	fn statistics_default_missing_counts() {
		let stats: HitStatistics = serde_json::from_str(r#"{ "great": 420, "miss": 3 }"#).unwrap();
		assert_eq!(stats, HitStatistics::new(420, 0, 0, 3));
		assert_eq!(stats.passed_objects(), 423);
	}

	#[test]
	fn accuracy_counts_unseen_objects() {
		let stats = HitStatistics::new(80, 10, 5, 5);
		assert!((stats.accuracy_over(100) - 84.166_667).abs() < 1e-4);
		assert_eq!(HitStatistics::default().accuracy_over(0), 0.0);
	}
}
// }}}
