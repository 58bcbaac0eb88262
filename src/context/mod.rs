// {{{ Imports
use db::{connect_db, SqlitePool};

use crate::context::paths::BotPaths;
use crate::osu::cache::BeatmapCache;
use crate::osu_api::{OsuClient, OsuCredentials};
use crate::timed;
use tracing::info;
// }}}

pub mod db;
pub mod paths;

// {{{ Common types
pub type Error = anyhow::Error;
pub type PoiseContext<'a> = poise::Context<'a, UserContext, Error>;
// }}}
// {{{ Error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	User,
	Internal,
}

#[derive(Debug)]
pub struct TaggedError {
	pub kind: ErrorKind,
	pub error: Error,
}

impl TaggedError {
	#[inline]
	pub fn new(kind: ErrorKind, error: Error) -> Self {
		Self { kind, error }
	}
}

impl<E: Into<Error>> From<E> for TaggedError {
	fn from(value: E) -> Self {
		Self::new(ErrorKind::Internal, value.into())
	}
}

pub trait TagError {
	fn tag(self, tag: ErrorKind) -> TaggedError;
}

impl TagError for Error {
	fn tag(self, tag: ErrorKind) -> TaggedError {
		TaggedError::new(tag, self)
	}
}
// }}}
// {{{ UserContext
/// Custom user data passed to all command functions
#[derive(Clone)]
pub struct UserContext {
	pub db: SqlitePool,
	pub paths: BotPaths,
	pub osu: OsuClient,
	pub beatmap_cache: BeatmapCache,
}

impl UserContext {
	#[inline]
	pub fn new() -> Result<Self, Error> {
		timed!("create_context", {
			let paths = BotPaths::new()?;
			let credentials = OsuCredentials::from_env()?;
			Self::from_parts(paths, credentials)
		})
	}

	pub fn from_parts(paths: BotPaths, credentials: OsuCredentials) -> Result<Self, Error> {
		let db = connect_db(&paths.db_path())?;
		let beatmap_cache = BeatmapCache::new(paths.beatmaps_path())?;
		info!(
			"Storing data in {:?}, caching beatmaps in {:?}",
			paths.data_dir(),
			beatmap_cache.dir()
		);
		let osu = OsuClient::new(credentials)?;

		Ok(Self {
			db,
			paths,
			osu,
			beatmap_cache,
		})
	}
}
// }}}
