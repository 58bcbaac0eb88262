//! This module provides helpers for working with environment
//! variables and paths, together with a struct
//! that keeps track of all the runtime-relevant paths.

use anyhow::Context;
use std::{path::PathBuf, str::FromStr};

/// Wrapper around [std::env::var] which adds [anyhow] context around errors.
pub fn get_var(name: &str) -> anyhow::Result<String> {
	std::env::var(name).with_context(|| format!("Missing ${name} environment variable"))
}

/// Like [get_var], except missing variables fall back to a default.
pub fn get_var_or(name: &str, default: &str) -> String {
	std::env::var(name).unwrap_or_else(|_| default.to_owned())
}

/// Reads an environment variable containing a directory path,
/// creating the directory if it doesn't exist.
pub fn get_env_dir_path(name: &str, default_to: Option<&str>) -> anyhow::Result<PathBuf> {
	let var = get_var(name);
	let var = match default_to {
		None => var?,
		Some(other) => var.or(get_var(other))?,
	};

	let path = PathBuf::from_str(&var).with_context(|| format!("${name} is not a valid path"))?;

	if !path.exists() {
		std::fs::create_dir_all(&path).with_context(|| format!("Could not create ${name}"))?;
	}

	Ok(path)
}

#[derive(Clone, Debug)]
pub struct BotPaths {
	/// This directory contains files that are entirely managed
	/// by the runtime of the app, like the link database.
	data_dir: PathBuf,

	/// This directory contains downloaded `.osu` files, which
	/// can be deleted at any time.
	cache_dir: PathBuf,
}

impl BotPaths {
	/// Gets all the standard paths from the environment,
	/// creating every involved directory in the process.
	pub fn new() -> anyhow::Result<Self> {
		let res = Self {
			data_dir: get_env_dir_path("OSUBOT_DATA_DIR", Some("STATE_DIRECTORY"))?,
			cache_dir: get_env_dir_path("OSUBOT_CACHE_DIR", Some("CACHE_DIRECTORY"))?,
		};

		Ok(res)
	}

	/// Keeps every path inside a single directory.
	pub fn in_dir(root: PathBuf) -> Self {
		Self {
			cache_dir: root.join("cache"),
			data_dir: root,
		}
	}

	pub fn data_dir(&self) -> &PathBuf {
		&self.data_dir
	}

	pub fn db_path(&self) -> PathBuf {
		self.data_dir.join("db.sqlite")
	}

	pub fn beatmaps_path(&self) -> PathBuf {
		self.cache_dir.join("beatmaps")
	}
}
