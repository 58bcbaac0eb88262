use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::debug;

const BEATMAP_HEADER: &[u8] = b"osu file format";

/// Whether some downloaded bytes look like a `.osu` file, as opposed to an
/// error page served with an ok status.
pub fn is_beatmap_file(bytes: &[u8]) -> bool {
	let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
	let start = bytes
		.iter()
		.position(|b| !b.is_ascii_whitespace())
		.unwrap_or(bytes.len());

	bytes[start..].starts_with(BEATMAP_HEADER)
}

/// On-disk cache of `.osu` files, keyed by beatmap id.
#[derive(Debug, Clone)]
pub struct BeatmapCache {
	dir: PathBuf,
}

impl BeatmapCache {
	/// Opens the cache at the given directory, creating it if needed.
	pub fn new(dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
		let dir = dir.into();
		std::fs::create_dir_all(&dir)
			.with_context(|| format!("Could not create beatmap cache at `{dir:?}`"))?;

		Ok(Self { dir })
	}

	#[inline]
	pub fn dir(&self) -> &Path {
		&self.dir
	}

	#[inline]
	pub fn path_for(&self, beatmap_id: u32) -> PathBuf {
		self.dir.join(format!("{beatmap_id}.osu"))
	}

	/// Returns the path of a cached beatmap. Empty files are left over
	/// from interrupted downloads, and do not count.
	pub fn cached(&self, beatmap_id: u32) -> Option<PathBuf> {
		let path = self.path_for(beatmap_id);
		let metadata = std::fs::metadata(&path).ok()?;
		(metadata.is_file() && metadata.len() > 0).then_some(path)
	}

	pub async fn store(&self, beatmap_id: u32, bytes: &[u8]) -> anyhow::Result<PathBuf> {
		let path = self.path_for(beatmap_id);
		tokio::fs::write(&path, bytes)
			.await
			.with_context(|| format!("Could not write beatmap {beatmap_id} to the cache"))?;

		debug!("Cached beatmap {beatmap_id} at {path:?}");
		Ok(path)
	}

	/// Removes a cached beatmap, for example after it failed to parse.
	pub async fn evict(&self, beatmap_id: u32) -> anyhow::Result<()> {
		let path = self.path_for(beatmap_id);
		if path.exists() {
			tokio::fs::remove_file(&path)
				.await
				.with_context(|| format!("Could not evict beatmap {beatmap_id}"))?;
		}

		Ok(())
	}
}

#[cfg(test)]
mod cache_tests {
	use super::*;

	#[tokio::test]
	async fn stores_and_finds_beatmaps() -> anyhow::Result<()> {
		let dir = tempfile::tempdir()?;
		let cache = BeatmapCache::new(dir.path().join("beatmaps"))?;

		assert_eq!(cache.cached(129891), None);
		let path = cache.store(129891, b"osu file format v14\n").await?;

		assert_eq!(cache.cached(129891), Some(path.clone()));
		assert!(path.ends_with("129891.osu"));

		cache.evict(129891).await?;
		assert_eq!(cache.cached(129891), None);
		Ok(())
	}

	#[tokio::test]
	async fn empty_files_are_not_cached() -> anyhow::Result<()> {
		let dir = tempfile::tempdir()?;
		let cache = BeatmapCache::new(dir.path())?;

		cache.store(1, b"").await?;
		assert_eq!(cache.cached(1), None);
		Ok(())
	}

	#[test]
	fn recognizes_beatmap_files() {
		assert!(is_beatmap_file(b"osu file format v14\n\n[General]"));
		assert!(is_beatmap_file(b"\xEF\xBB\xBFosu file format v128\r\n"));
		assert!(is_beatmap_file(b"\n  osu file format v7"));

		assert!(!is_beatmap_file(b"<html>502 Bad Gateway</html>"));
		assert!(!is_beatmap_file(b""));
		assert!(!is_beatmap_file(b"   "));
	}
}
