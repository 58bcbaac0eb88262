// {{{ Imports
use anyhow::anyhow;
use axum::extract::{Query, State};
use axum::response::Html;
use osubot::commands::embeds::{notice, profile_url};
use osubot::oauth::pop_state;
use osubot::osu_api::RawUser;
use osubot::user::UserLink;
use poise::serenity_prelude::{CreateMessage, Http, UserId};
use serde::Deserialize;
use tracing::{info, warn};

use crate::context::AppContext;
use crate::error::AppError;
// }}}

#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
	pub code: Option<String>,
	pub state: Option<String>,
}

pub async fn osu_callback(
	State(state): State<AppContext>,
	Query(query): Query<CallbackQuery>,
) -> Result<Html<String>, AppError> {
	let (Some(code), Some(oauth_state)) = (query.code, query.state) else {
		return Err(AppError::bad_request("Missing code/state."));
	};

	let ctx = state.ctx;
	let discord_id =
		pop_state(ctx, &oauth_state)?.ok_or_else(|| AppError::bad_request("Invalid or expired state."))?;

	let redirect_uri = ctx
		.osu
		.credentials()
		.redirect_uri
		.as_deref()
		.ok_or_else(|| anyhow!("OSU_REDIRECT_URI is not configured"))?;

	let token = ctx
		.osu
		.exchange_code(&code, redirect_uri)
		.await
		.map_err(|e| AppError::from(e.error))?;
	let user = ctx.osu.me(&token).await.map_err(|e| AppError::from(e.error))?;

	let link = UserLink::set(
		ctx,
		discord_id,
		user.id,
		&user.username,
		user.playmode.unwrap_or_default(),
	)
	.map_err(|e| AppError::from(e.error))?;

	info!(
		"Linked discord user {} to osu! user {} ({})",
		link.discord_id, link.osu_username, link.osu_user_id
	);

	if let Some(http) = state.discord {
		if let Err(e) = notify(http, discord_id, &user).await {
			warn!("Could not notify discord user {discord_id}: {e}");
		}
	}

	Ok(Html(success_page(&user)))
}

async fn notify(http: &Http, discord_id: u64, user: &RawUser) -> Result<(), poise::serenity_prelude::Error> {
	let embed = notice(
		"Account Linked",
		format!(
			"Your discord account is now linked to [{}]({}).",
			user.username,
			profile_url(user.id)
		),
	);

	UserId::new(discord_id)
		.direct_message(http, CreateMessage::new().embed(embed))
		.await?;

	Ok(())
}

fn success_page(user: &RawUser) -> String {
	let name = html_escape(&user.username);
	format!(
		"<!DOCTYPE html>
<html>
  <head><meta charset=\"utf-8\"><title>Account linked</title></head>
  <body style=\"font-family: sans-serif; text-align: center; margin-top: 20vh\">
    <h1>Linked to {name}!</h1>
    <p>You can close this page and head back to discord.</p>
  </body>
</html>"
	)
}

fn html_escape(input: &str) -> String {
	input
		.replace('&', "&amp;")
		.replace('<', "&lt;")
		.replace('>', "&gt;")
		.replace('"', "&quot;")
}

// }}}
