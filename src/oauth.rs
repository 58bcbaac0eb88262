//! Account linking through the osu! OAuth authorization code flow.
//!
//! The bot hands out an authorize url carrying a random `state`, and
//! remembers which discord user that state belongs to. Once osu! redirects
//! back to the callback server, the state is consumed to find out who
//! is linking their account.

use anyhow::{anyhow, Context};
use chrono::{NaiveDateTime, TimeDelta, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use reqwest::Url;
use rusqlite::OptionalExtension;
use tracing::debug;

use crate::context::{Error, UserContext};
use crate::osu_api::{OsuCredentials, OSU_URL};

pub const STATE_LENGTH: usize = 32;
pub const STATE_LIFETIME_MINUTES: i64 = 10;

#[inline]
fn state_lifetime() -> TimeDelta {
	TimeDelta::minutes(STATE_LIFETIME_MINUTES)
}

fn random_state() -> String {
	rand::thread_rng()
		.sample_iter(&Alphanumeric)
		.take(STATE_LENGTH)
		.map(char::from)
		.collect()
}

/// Remembers a fresh state for the given discord user.
pub fn create_state(ctx: &UserContext, discord_id: u64) -> Result<String, Error> {
	let state = random_state();
	let now = Utc::now().naive_utc();
	let conn = ctx.db.get()?;

	conn.prepare_cached("DELETE FROM oauth_states WHERE created_at < ?")?
		.execute([now - state_lifetime()])?;

	conn.prepare_cached("INSERT INTO oauth_states(state, discord_id, created_at) VALUES (?, ?, ?)")?
		.execute((&state, discord_id as i64, now))?;

	debug!("Created oauth state for discord user {discord_id}");
	Ok(state)
}

/// Consumes a state, returning the discord user it was created for.
/// Each state can only be used once, and expires after [STATE_LIFETIME_MINUTES] minutes.
pub fn pop_state(ctx: &UserContext, state: &str) -> Result<Option<u64>, Error> {
	let entry = ctx
		.db
		.get()?
		.prepare_cached("DELETE FROM oauth_states WHERE state = ? RETURNING discord_id, created_at")?
		.query_row([state], |row| {
			Ok((
				row.get::<_, i64>("discord_id")?,
				row.get::<_, NaiveDateTime>("created_at")?,
			))
		})
		.optional()?;

	let Some((discord_id, created_at)) = entry else {
		return Ok(None);
	};

	if Utc::now().naive_utc() - created_at > state_lifetime() {
		debug!("Rejected expired oauth state for discord user {discord_id}");
		return Ok(None);
	}

	Ok(Some(discord_id as u64))
}

/// The page a user must visit in order to link their account.
pub fn authorize_url(credentials: &OsuCredentials, state: &str) -> Result<Url, Error> {
	let redirect_uri = credentials
		.redirect_uri
		.as_deref()
		.ok_or_else(|| anyhow!("OSU_REDIRECT_URI is not configured"))?;

	Url::parse_with_params(
		&format!("{OSU_URL}/oauth/authorize"),
		&[
			("client_id", credentials.client_id.as_str()),
			("redirect_uri", redirect_uri),
			("response_type", "code"),
			("scope", "identify public"),
			("state", state),
		],
	)
	.context("Could not build authorize url")
}

// }}}
