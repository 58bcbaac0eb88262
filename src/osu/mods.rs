use std::fmt::Display;

use serde::{Deserialize, Serialize};

// {{{ API representation
/// A single mod as returned by the osu! API.
///
/// Lazer-style payloads send objects (`{ "acronym": "DT", "settings": {..} }`),
/// while legacy payloads send bare acronyms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApiMod {
	Acronym(String),
	Detailed { acronym: String },
}

impl ApiMod {
	#[inline]
	pub fn acronym(&self) -> &str {
		match self {
			Self::Acronym(acronym) => acronym,
			Self::Detailed { acronym } => acronym,
		}
	}
}
// }}}
// {{{ Mod acronyms
/// An ordered list of mod acronyms, displayed as their concatenation
/// (`"HDDT"`), or as the empty string when no mods are enabled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mods(Vec<String>);

impl Mods {
	pub fn from_api(mods: &[ApiMod]) -> Self {
		Self(
			mods.iter()
				.map(|m| m.acronym().trim().to_uppercase())
				.filter(|acronym| !acronym.is_empty())
				.collect(),
		)
	}

	/// Splits a string such as `"hddt"` or `"HD,DT"` into acronyms.
	pub fn parse(input: &str) -> Self {
		let mut acronyms = Vec::new();
		for part in input.split(|c: char| c == ',' || c == '+' || c.is_whitespace()) {
			let part = part.trim().to_uppercase();
			let chars = part.chars().collect::<Vec<_>>();
			for chunk in chars.chunks(2) {
				acronyms.push(chunk.iter().collect());
			}
		}

		Self(acronyms)
	}

	#[inline]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	#[inline]
	pub fn acronyms(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(|s| s.as_str())
	}

	#[inline]
	pub fn contains(&self, acronym: &str) -> bool {
		self.0.iter().any(|m| m == acronym)
	}

	/// Returns the first acronym the calculator would not understand.
	pub fn first_invalid(&self) -> Option<&str> {
		self.acronyms().find(|acronym| {
			!(2..=3).contains(&acronym.len())
				|| !acronym.chars().all(|c| c.is_ascii_alphanumeric())
		})
	}
}

impl Display for Mods {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		for acronym in &self.0 {
			write!(f, "{acronym}")?;
		}

		Ok(())
	}
}
// }}}
// {{{ Tests
#[cfg(test)]
mod mods_tests {
	use super::*;

	#[test]
	fn concatenates_api_acronyms() {
		let raw = r#"[{"acronym": "hd"}, "DT", {"acronym": "CL", "settings": {}}]"#;
		let api: Vec<ApiMod> = serde_json::from_str(raw).unwrap();
		let mods = Mods::from_api(&api);

		assert_eq!(mods.to_string(), "HDDTCL");
		assert!(mods.contains("CL"));
		assert_eq!(mods.first_invalid(), None);
	}

	#[test]
	fn no_mods_is_empty_string() {
		let mods = Mods::from_api(&[]);
		assert!(mods.is_empty());
		assert_eq!(mods.to_string(), "");
	}

	#[test]
	fn parses_user_input() {
		assert_eq!(Mods::parse("hddt").to_string(), "HDDT");
		assert_eq!(Mods::parse("HD,HR").acronyms().collect::<Vec<_>>(), ["HD", "HR"]);
		assert!(Mods::parse("").is_empty());
	}

	#[test]
	fn flags_garbage_acronyms() {
		let mods = Mods::from_api(&[ApiMod::Acronym("H!".to_string())]);
		assert_eq!(mods.first_invalid(), Some("H!"));
	}
}
// }}}
