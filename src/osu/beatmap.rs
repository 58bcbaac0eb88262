use serde::{Deserialize, Serialize};

/// Beatmap settings as reported by the osu! API. These are the raw values,
/// not scaled by any mods.
///
/// Every field is optional, since the API omits them on some endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BeatmapMetadata {
	#[serde(rename = "cs", default)]
	pub circle_size: Option<f64>,
	#[serde(rename = "ar", default)]
	pub approach_rate: Option<f64>,
	// The API calls OD "accuracy"
	#[serde(rename = "accuracy", default)]
	pub overall_difficulty: Option<f64>,
	#[serde(rename = "drain", default)]
	pub drain_rate: Option<f64>,
	#[serde(default)]
	pub bpm: Option<f64>,
	#[serde(rename = "total_length", default)]
	pub length_seconds: Option<u32>,
}

impl BeatmapMetadata {
	/// Formats the length as `m:ss`.
	pub fn display_length(&self) -> Option<String> {
		self.length_seconds
			.map(|seconds| format!("{}:{:0>2}", seconds / 60, seconds % 60))
	}
}

#[cfg(test)]
mod beatmap_tests {
	use super::*;

	#[test]
	fn reads_api_field_names() {
		let raw = r#"{
			"cs": 4.2, "ar": 9.3, "accuracy": 8.5, "drain": 5,
			"bpm": 180, "total_length": 125, "version": "Insane"
		}"#;
		let metadata: BeatmapMetadata = serde_json::from_str(raw).unwrap();

		assert_eq!(metadata.circle_size, Some(4.2));
		assert_eq!(metadata.overall_difficulty, Some(8.5));
		assert_eq!(metadata.drain_rate, Some(5.0));
		assert_eq!(metadata.display_length().as_deref(), Some("2:05"));
	}

	#[test]
	fn missing_fields_stay_absent() {
		let metadata: BeatmapMetadata = serde_json::from_str(r#"{ "bpm": 200 }"#).unwrap();
		assert_eq!(metadata.circle_size, None);
		assert_eq!(metadata.length_seconds, None);
		assert_eq!(metadata.bpm, Some(200.0));
	}
}
