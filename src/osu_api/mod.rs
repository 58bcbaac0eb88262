use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::context::paths::get_var;
use crate::context::{ErrorKind, TagError, TaggedError};
use crate::osu::beatmap::BeatmapMetadata;
use crate::osu::cache::{is_beatmap_file, BeatmapCache};
use crate::osu::mods::{ApiMod, Mods};
use crate::osu::score::{HitStatistics, Ruleset, ScoreRecord};

pub const OSU_URL: &str = "https://osu.ppy.sh";
const API_VERSION: &str = "20220705";

// {{{ Credentials
#[derive(Debug, Clone)]
pub struct OsuCredentials {
	pub client_id: String,
	pub client_secret: String,
	/// Only required for linking accounts through OAuth.
	pub redirect_uri: Option<String>,
}

impl OsuCredentials {
	pub fn from_env() -> anyhow::Result<Self> {
		Ok(Self {
			client_id: get_var("OSU_CLIENT_ID")?,
			client_secret: get_var("OSU_CLIENT_SECRET")?,
			redirect_uri: get_var("OSU_REDIRECT_URI").ok(),
		})
	}
}
// }}}
// {{{ Response types
#[derive(Deserialize)]
struct TokenResponse {
	access_token: String,
	expires_in: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawUserLevel {
	pub current: u32,
	#[serde(default)]
	pub progress: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawUserStatistics {
	#[serde(default)]
	pub pp: f64,
	pub global_rank: Option<u32>,
	pub country_rank: Option<u32>,
	#[serde(default)]
	pub hit_accuracy: f64,
	#[serde(default)]
	pub play_count: u32,
	pub play_time: Option<u64>,
	#[serde(default)]
	pub maximum_combo: u32,
	pub level: Option<RawUserLevel>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawUser {
	pub id: u32,
	pub username: String,
	#[serde(default)]
	pub country_code: String,
	#[serde(default)]
	pub avatar_url: String,
	pub playmode: Option<Ruleset>,
	pub statistics: Option<RawUserStatistics>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawCovers {
	pub list: Option<String>,
	pub cover: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawBeatmapset {
	pub id: u32,
	pub title: String,
	pub artist: String,
	#[serde(default)]
	pub creator: String,
	pub covers: Option<RawCovers>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawBeatmap {
	pub id: u32,
	pub beatmapset_id: u32,
	pub version: String,
	#[serde(default)]
	pub difficulty_rating: f64,
	pub mode: Option<Ruleset>,
	pub max_combo: Option<u32>,
	#[serde(flatten)]
	pub metadata: BeatmapMetadata,
	pub beatmapset: Option<RawBeatmapset>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawScore {
	pub id: Option<u64>,
	pub user_id: u32,
	pub accuracy: f64,
	#[serde(default)]
	pub max_combo: u32,
	#[serde(default)]
	pub mods: Vec<ApiMod>,
	#[serde(default)]
	pub statistics: HitStatistics,
	pub pp: Option<f64>,
	pub rank: String,
	#[serde(default)]
	pub passed: bool,
	pub ended_at: Option<String>,
	#[serde(default)]
	pub ruleset_id: u8,
	pub build_id: Option<u32>,
	#[serde(default)]
	pub total_score: u64,
	pub beatmap_id: Option<u32>,
	pub beatmap: Option<RawBeatmap>,
	pub beatmapset: Option<RawBeatmapset>,
}

impl RawScore {
	/// Extracts what the metrics engine needs to know about this play.
	pub fn record(&self) -> ScoreRecord {
		let beatmap = self.beatmap.as_ref();
		ScoreRecord {
			statistics: self.statistics,
			max_combo: Some(self.max_combo),
			accuracy: self.accuracy,
			mods: Mods::from_api(&self.mods),
			beatmap_id: beatmap.map(|b| b.id).or(self.beatmap_id).unwrap_or_default(),
			beatmapset_id: beatmap.map(|b| b.beatmapset_id).unwrap_or_default(),
			metadata: beatmap.map(|b| b.metadata).unwrap_or_default(),
			lazer: self.build_id.is_some(),
		}
	}

	#[inline]
	pub fn ruleset(&self) -> Ruleset {
		Ruleset::from_id(self.ruleset_id).unwrap_or_default()
	}
}

#[derive(Deserialize)]
struct RawBeatmapUserScores {
	scores: Vec<RawScore>,
}
// }}}
// {{{ Client
struct Token {
	access_token: String,
	expires_at: Instant,
}

/// Client for the osu! API v2, authenticated through the client
/// credentials grant.
#[derive(Clone)]
pub struct OsuClient {
	http: reqwest::Client,
	credentials: OsuCredentials,
	token: Arc<RwLock<Option<Token>>>,
}

impl OsuClient {
	pub fn new(credentials: OsuCredentials) -> anyhow::Result<Self> {
		let http = reqwest::Client::builder()
			.timeout(Duration::from_secs(12))
			.build()
			.context("Could not create http client")?;

		Ok(Self {
			http,
			credentials,
			token: Arc::new(RwLock::new(None)),
		})
	}

	#[inline]
	pub fn credentials(&self) -> &OsuCredentials {
		&self.credentials
	}

	// {{{ Authentication
	async fn token(&self) -> Result<String, TaggedError> {
		if let Some(token) = self.token.read().await.as_ref() {
			if token.expires_at > Instant::now() {
				return Ok(token.access_token.clone());
			}
		}

		let mut guard = self.token.write().await;

		// Somebody else might've refreshed it while we were waiting
		if let Some(token) = guard.as_ref() {
			if token.expires_at > Instant::now() {
				return Ok(token.access_token.clone());
			}
		}

		let response = self
			.http
			.post(format!("{OSU_URL}/oauth/token"))
			.form(&[
				("client_id", self.credentials.client_id.as_str()),
				("client_secret", self.credentials.client_secret.as_str()),
				("grant_type", "client_credentials"),
				("scope", "public"),
			])
			.send()
			.await
			.context("Failed to send token request")?
			.error_for_status()
			.context("Token request has non-ok status")?
			.json::<TokenResponse>()
			.await
			.context("Failed to decode token response")?;

		info!("Obtained a new osu! api token");

		// Refresh a minute early, so in-flight requests never use a stale token
		let lifetime = Duration::from_secs(response.expires_in.saturating_sub(60));
		*guard = Some(Token {
			access_token: response.access_token.clone(),
			expires_at: Instant::now() + lifetime,
		});

		Ok(response.access_token)
	}
	// }}}
	// {{{ Requests
	/// Performs an authenticated api request, mapping 404 responses to [None].
	async fn get<T: DeserializeOwned>(
		&self,
		path: &str,
		query: &[(&str, String)],
	) -> Result<Option<T>, TaggedError> {
		let token = self.token().await?;
		debug!("GET /api/v2{path}");

		let response = self
			.http
			.get(format!("{OSU_URL}/api/v2{path}"))
			.query(query)
			.bearer_auth(token)
			.header("x-api-version", API_VERSION)
			.send()
			.await
			.context("Failed to send request")?;

		if response.status() == StatusCode::NOT_FOUND {
			return Ok(None);
		}

		let decoded = response
			.error_for_status()
			.context("Request has non-ok status")?
			.json::<T>()
			.await
			.context("Failed to decode response")?;

		Ok(Some(decoded))
	}
	// }}}
	// {{{ Users
	/// Looks up a user by id or by name. Purely numeric identifiers are
	/// treated as ids.
	pub async fn user(&self, identifier: &str, mode: Option<Ruleset>) -> Result<RawUser, TaggedError> {
		let identifier = identifier.trim();
		let key = if !identifier.is_empty() && identifier.chars().all(|c| c.is_ascii_digit()) {
			identifier.to_owned()
		} else {
			format!("@{identifier}")
		};

		let path = match mode {
			Some(mode) => format!("/users/{key}/{mode}"),
			None => format!("/users/{key}"),
		};

		self.get(&path, &[]).await?.ok_or_else(|| {
			anyhow!("Could not find osu! user `{identifier}`").tag(ErrorKind::User)
		})
	}

	pub async fn recent_scores(
		&self,
		user_id: u32,
		mode: Option<Ruleset>,
		limit: u32,
		include_fails: bool,
	) -> Result<Vec<RawScore>, TaggedError> {
		let mut query = vec![
			("limit", limit.clamp(1, 100).to_string()),
			("include_fails", (include_fails as u8).to_string()),
		];
		if let Some(mode) = mode {
			query.push(("mode", mode.to_string()));
		}

		let scores = self
			.get(&format!("/users/{user_id}/scores/recent"), &query)
			.await?;
		Ok(scores.unwrap_or_default())
	}

	pub async fn top_scores(
		&self,
		user_id: u32,
		mode: Option<Ruleset>,
		limit: u32,
	) -> Result<Vec<RawScore>, TaggedError> {
		let mut query = vec![("limit", limit.clamp(1, 100).to_string())];
		if let Some(mode) = mode {
			query.push(("mode", mode.to_string()));
		}

		let scores = self
			.get(&format!("/users/{user_id}/scores/best"), &query)
			.await?;
		Ok(scores.unwrap_or_default())
	}

	/// Every score a user has set on a beatmap, best first.
	pub async fn user_beatmap_scores(
		&self,
		beatmap_id: u32,
		user_id: u32,
	) -> Result<Vec<RawScore>, TaggedError> {
		let scores: Option<RawBeatmapUserScores> = self
			.get(
				&format!("/beatmaps/{beatmap_id}/scores/users/{user_id}/all"),
				&[],
			)
			.await?;

		Ok(scores.map(|s| s.scores).unwrap_or_default())
	}
	// }}}
	// {{{ Scores & beatmaps
	pub async fn score(&self, score_id: u64) -> Result<RawScore, TaggedError> {
		self.get(&format!("/scores/{score_id}"), &[])
			.await?
			.ok_or_else(|| anyhow!("Could not find score {score_id}").tag(ErrorKind::User))
	}

	pub async fn beatmap(&self, beatmap_id: u32) -> Result<RawBeatmap, TaggedError> {
		self.get(&format!("/beatmaps/{beatmap_id}"), &[])
			.await?
			.ok_or_else(|| anyhow!("Could not find beatmap {beatmap_id}").tag(ErrorKind::User))
	}

	pub async fn beatmapset(&self, beatmapset_id: u32) -> Result<RawBeatmapset, TaggedError> {
		self.get(&format!("/beatmapsets/{beatmapset_id}"), &[])
			.await?
			.ok_or_else(|| {
				anyhow!("Could not find beatmapset {beatmapset_id}").tag(ErrorKind::User)
			})
	}

	/// Returns the path to the `.osu` file of a beatmap, downloading it
	/// only if it isn't cached yet.
	pub async fn download_beatmap(
		&self,
		cache: &BeatmapCache,
		beatmap_id: u32,
	) -> Result<std::path::PathBuf, TaggedError> {
		if let Some(path) = cache.cached(beatmap_id) {
			return Ok(path);
		}

		let bytes = self
			.http
			.get(format!("{OSU_URL}/osu/{beatmap_id}"))
			.send()
			.await
			.context("Failed to send beatmap download request")?
			.error_for_status()
			.context("Beatmap download has non-ok status")?
			.bytes()
			.await
			.context("Failed to read beatmap file")?;

		if bytes.is_empty() {
			return Err(
				anyhow!("The beatmap file for {beatmap_id} is not available").tag(ErrorKind::User)
			);
		}

		if !is_beatmap_file(&bytes) {
			return Err(anyhow!("The download of beatmap {beatmap_id} is not a .osu file").into());
		}

		info!("Downloaded beatmap {beatmap_id}");
		Ok(cache.store(beatmap_id, &bytes).await?)
	}
	// }}}
	// {{{ OAuth
	/// Exchanges an authorization code for a user access token.
	pub async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<String, TaggedError> {
		let response = self
			.http
			.post(format!("{OSU_URL}/oauth/token"))
			.form(&[
				("client_id", self.credentials.client_id.as_str()),
				("client_secret", self.credentials.client_secret.as_str()),
				("code", code),
				("grant_type", "authorization_code"),
				("redirect_uri", redirect_uri),
			])
			.send()
			.await
			.context("Failed to send token exchange request")?
			.error_for_status()
			.context("Token exchange has non-ok status")?
			.json::<TokenResponse>()
			.await
			.context("Failed to decode token exchange response")?;

		Ok(response.access_token)
	}

	/// Fetches the user owning an access token.
	pub async fn me(&self, access_token: &str) -> Result<RawUser, TaggedError> {
		let user = self
			.http
			.get(format!("{OSU_URL}/api/v2/me"))
			.bearer_auth(access_token)
			.send()
			.await
			.context("Failed to send /me request")?
			.error_for_status()
			.context("/me request has non-ok status")?
			.json::<RawUser>()
			.await
			.context("Failed to decode /me response")?;

		Ok(user)
	}
	// }}}
}
// }}}
// {{{ Tests
#[cfg(test)]
mod osu_api_tests {
	use super::*;

	const LAZER_SCORE: &str = r#"{
		"id": 4211337,
		"user_id": 2,
		"accuracy": 0.9612,
		"max_combo": 411,
		"mods": [{ "acronym": "HD" }, { "acronym": "DT", "settings": { "speed_change": 1.5 } }],
		"statistics": { "great": 380, "ok": 22, "meh": 1, "miss": 3, "slider_tail_hit": 120 },
		"pp": 312.5,
		"rank": "A",
		"passed": true,
		"ended_at": "2024-09-01T12:00:00Z",
		"ruleset_id": 0,
		"build_id": 7321,
		"total_score": 812345,
		"beatmap_id": 75,
		"beatmap": {
			"id": 75, "beatmapset_id": 1, "version": "Normal", "difficulty_rating": 2.55,
			"mode": "osu", "cs": 4, "ar": 6, "accuracy": 6, "drain": 6, "bpm": 119.999,
			"total_length": 142
		},
		"beatmapset": { "id": 1, "title": "DISCO PRINCE", "artist": "Kenji Ninuma", "creator": "peppy" }
	}"#;

	#[test]
	fn decodes_lazer_scores() {
		let score: RawScore = serde_json::from_str(LAZER_SCORE).unwrap();
		let record = score.record();

		assert_eq!(record.mods.to_string(), "HDDT");
		assert_eq!(record.statistics.great, 380);
		assert_eq!(record.statistics.slider_tail_hit, 120);
		assert_eq!(record.statistics.small_tick_hit, 0);
		assert_eq!(record.max_combo, Some(411));
		assert_eq!(record.beatmap_id, 75);
		assert_eq!(record.beatmapset_id, 1);
		assert_eq!(record.metadata.overall_difficulty, Some(6.0));
		assert_eq!(record.metadata.length_seconds, Some(142));
		assert!(record.lazer);
		assert_eq!(score.ruleset(), Ruleset::Osu);
	}

	#[test]
	fn scores_without_build_are_stable() {
		let mut score: RawScore = serde_json::from_str(LAZER_SCORE).unwrap();
		score.build_id = None;
		score.beatmap = None;

		let record = score.record();
		assert!(!record.lazer);
		assert_eq!(record.beatmap_id, 75);
		assert_eq!(record.metadata, BeatmapMetadata::default());
	}
}
// }}}
