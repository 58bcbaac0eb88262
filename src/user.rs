use anyhow::anyhow;
use chrono::{NaiveDateTime, Utc};
use rusqlite::{OptionalExtension, Row};

use crate::commands::discord::MessageContext;
use crate::context::{ErrorKind, TagError, TaggedError, UserContext};
use crate::osu::score::Ruleset;

/// The osu! account a discord user has linked.
#[derive(Debug, Clone, PartialEq)]
pub struct UserLink {
	pub discord_id: u64,
	pub osu_user_id: u32,
	pub osu_username: String,
	pub preferred_mode: Ruleset,
	pub linked_at: NaiveDateTime,
}

impl UserLink {
	#[inline]
	fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
		let mode: String = row.get("preferred_mode")?;
		Ok(Self {
			discord_id: row.get::<_, i64>("discord_id")? as u64,
			osu_user_id: row.get("osu_user_id")?,
			osu_username: row.get("osu_username")?,
			preferred_mode: mode.parse().unwrap_or_default(),
			linked_at: row.get("linked_at")?,
		})
	}

	/// Creates or replaces the link of a discord user.
	pub fn set(
		ctx: &UserContext,
		discord_id: u64,
		osu_user_id: u32,
		osu_username: &str,
		preferred_mode: Ruleset,
	) -> Result<Self, TaggedError> {
		let link = ctx
			.db
			.get()?
			.prepare_cached(
				"
          INSERT INTO user_links(discord_id, osu_user_id, osu_username, preferred_mode, linked_at)
          VALUES (?, ?, ?, ?, ?)
          ON CONFLICT(discord_id) DO UPDATE SET
            osu_user_id=excluded.osu_user_id,
            osu_username=excluded.osu_username,
            preferred_mode=excluded.preferred_mode,
            linked_at=excluded.linked_at
          RETURNING *
        ",
			)?
			.query_row(
				(
					discord_id as i64,
					osu_user_id,
					osu_username,
					preferred_mode.as_str(),
					Utc::now().naive_utc(),
				),
				Self::from_row,
			)?;

		Ok(link)
	}

	pub fn get(ctx: &UserContext, discord_id: u64) -> Result<Option<Self>, TaggedError> {
		let link = ctx
			.db
			.get()?
			.prepare_cached("SELECT * FROM user_links WHERE discord_id = ?")?
			.query_row([discord_id as i64], Self::from_row)
			.optional()?;

		Ok(link)
	}

	/// Returns whether a link existed.
	pub fn delete(ctx: &UserContext, discord_id: u64) -> Result<bool, TaggedError> {
		let rows_changed = ctx
			.db
			.get()?
			.prepare_cached("DELETE FROM user_links WHERE discord_id = ?")?
			.execute([discord_id as i64])?;

		Ok(rows_changed > 0)
	}

	/// The link of whoever sent the current message.
	pub fn from_context(ctx: &impl MessageContext) -> Result<Self, TaggedError> {
		Self::get(ctx.data(), ctx.author_id())?.ok_or_else(|| {
			anyhow!("You do not have a linked osu! account. Use `/link` to link one.")
				.tag(ErrorKind::User)
		})
	}
}

// }}}
