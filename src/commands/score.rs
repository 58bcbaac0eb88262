use anyhow::{anyhow, Context};
use poise::CreateReply;
use tracing::warn;

use crate::context::{Error, ErrorKind, PoiseContext, TagError, TaggedError, UserContext};
use crate::osu::calculator::{CalculationError, RosuCalculator};
use crate::osu::metrics::{compute_metrics, ScoreMetrics};
use crate::osu::score::Ruleset;
use crate::osu_api::{RawScore, RawUser};
use crate::timed;
use crate::user::UserLink;

use super::discord::MessageContext;
use super::embeds::{profile_card, score_card, top_listing};

// {{{ Helpers
/// Figures out whose plays a command is about. An explicit username wins
/// over the author's linked account, in which case no mode is implied.
fn resolve_target(
	ctx: &impl MessageContext,
	username: Option<String>,
) -> Result<(String, Option<Ruleset>), TaggedError> {
	match username {
		Some(username) if !username.trim().is_empty() => Ok((username, None)),
		_ => {
			let link = UserLink::from_context(ctx)?;
			Ok((link.osu_user_id.to_string(), Some(link.preferred_mode)))
		}
	}
}

/// Downloads the beatmap of a score if needed, then computes its metrics
/// on a blocking thread.
pub async fn metrics_for(ctx: &UserContext, score: &RawScore) -> Result<ScoreMetrics, TaggedError> {
	let record = score.record();
	if record.beatmap_id == 0 {
		return Err(anyhow!("This score has no beatmap attached").tag(ErrorKind::User));
	}

	let ruleset = score.ruleset();
	if ruleset != Ruleset::Osu {
		return Err(anyhow!(
			"Performance metrics are only available for osu! plays, this one is a {ruleset} play"
		)
		.tag(ErrorKind::User));
	}

	let path = ctx
		.osu
		.download_beatmap(&ctx.beatmap_cache, record.beatmap_id)
		.await?;

	let beatmap_id = record.beatmap_id;
	let res = timed!("compute_metrics", {
		tokio::task::spawn_blocking(move || {
			let model = record.scoring_model();
			compute_metrics(&RosuCalculator, &path, &record, model)
		})
		.await
		.context("Metrics computation panicked")?
	});

	// Most likely a broken download, so make sure the next attempt refetches it
	if let Err(CalculationError::Parse { .. }) = &res {
		ctx.beatmap_cache.evict(beatmap_id).await?;
	}

	Ok(res?)
}

async fn fetch_user(
	ctx: &impl MessageContext,
	username: Option<String>,
) -> Result<(RawUser, Option<Ruleset>), TaggedError> {
	let (identifier, mode) = resolve_target(ctx, username)?;
	let user = ctx.data().osu.user(&identifier, mode).await?;
	Ok((user, mode))
}
// }}}
// {{{ Recent
pub async fn recent_impl<C: MessageContext>(
	ctx: &mut C,
	username: Option<String>,
	include_fails: bool,
) -> Result<(), TaggedError> {
	let (user, mode) = fetch_user(&*ctx, username).await?;

	let score = ctx
		.data()
		.osu
		.recent_scores(user.id, mode, 1, include_fails)
		.await?
		.into_iter()
		.next()
		.ok_or_else(|| {
			anyhow!("{} has no recent plays", user.username).tag(ErrorKind::User)
		})?;

	// The card is still useful without metrics
	let metrics = match metrics_for(ctx.data(), &score).await {
		Ok(metrics) => Some(metrics),
		Err(e) => {
			warn!("Could not compute metrics: {:#}", e.error);
			None
		}
	};

	ctx.send(
		CreateReply::default()
			.reply(true)
			.embed(score_card(&user, &score, metrics.as_ref())),
	)
	.await?;

	Ok(())
}

/// Show the latest play of a user
#[poise::command(prefix_command, slash_command, aliases("rs"), user_cooldown = 1)]
pub async fn recent(
	mut ctx: PoiseContext<'_>,
	#[description = "osu! username (defaults to your linked account)"] username: Option<String>,
	#[description = "Whether to include failed plays"] include_fails: Option<bool>,
) -> Result<(), Error> {
	ctx.defer().await?;
	let res = recent_impl(&mut ctx, username, include_fails.unwrap_or(true)).await;
	ctx.handle_error(res).await?;
	Ok(())
}
// }}}
// {{{ Top
pub const MAX_TOP_PLAYS: u32 = 10;

async fn top_impl<C: MessageContext>(
	ctx: &mut C,
	username: Option<String>,
	amount: Option<u32>,
) -> Result<(), TaggedError> {
	let amount = amount.unwrap_or(5).clamp(1, MAX_TOP_PLAYS);
	let (user, mode) = fetch_user(&*ctx, username).await?;

	let scores = ctx.data().osu.top_scores(user.id, mode, amount).await?;
	if scores.is_empty() {
		return Err(anyhow!("{} has no top plays", user.username).tag(ErrorKind::User));
	}

	ctx.send(
		CreateReply::default()
			.reply(true)
			.embed(top_listing(&user, &scores)),
	)
	.await?;

	Ok(())
}

/// Show the best plays of a user
#[poise::command(prefix_command, slash_command, user_cooldown = 1)]
pub async fn top(
	mut ctx: PoiseContext<'_>,
	#[description = "osu! username (defaults to your linked account)"] username: Option<String>,
	#[description = "How many plays to show"]
	#[min = 1]
	#[max = 10]
	amount: Option<u32>,
) -> Result<(), Error> {
	ctx.defer().await?;
	let res = top_impl(&mut ctx, username, amount).await;
	ctx.handle_error(res).await?;
	Ok(())
}
// }}}
// {{{ Best
/// Picks the play worth the most pp, breaking ties by score.
fn best_of(scores: Vec<RawScore>) -> Option<RawScore> {
	scores.into_iter().max_by(|a, b| {
		a.pp.unwrap_or_default()
			.total_cmp(&b.pp.unwrap_or_default())
			.then(a.total_score.cmp(&b.total_score))
	})
}

async fn best_impl<C: MessageContext>(
	ctx: &mut C,
	beatmap_id: u32,
	username: Option<String>,
) -> Result<(), TaggedError> {
	let (user, _) = fetch_user(&*ctx, username).await?;
	let osu = &ctx.data().osu;

	let mut score = best_of(osu.user_beatmap_scores(beatmap_id, user.id).await?)
		.ok_or_else(|| {
			anyhow!("{} has no plays on beatmap {beatmap_id}", user.username).tag(ErrorKind::User)
		})?;

	// Scores listed per beatmap do not embed the beatmap they were set on
	let mut beatmap = match score.beatmap.take() {
		Some(beatmap) => beatmap,
		None => osu.beatmap(beatmap_id).await?,
	};

	if score.beatmapset.is_none() {
		score.beatmapset = match beatmap.beatmapset.take() {
			Some(beatmapset) => Some(beatmapset),
			None => Some(osu.beatmapset(beatmap.beatmapset_id).await?),
		};
	}

	score.beatmap = Some(beatmap);

	let metrics = match metrics_for(ctx.data(), &score).await {
		Ok(metrics) => Some(metrics),
		Err(e) => {
			warn!("Could not compute metrics: {:#}", e.error);
			None
		}
	};

	ctx.send(
		CreateReply::default()
			.reply(true)
			.embed(score_card(&user, &score, metrics.as_ref())),
	)
	.await?;

	Ok(())
}

/// Show the best play of a user on a beatmap
#[poise::command(prefix_command, slash_command, user_cooldown = 1)]
pub async fn best(
	mut ctx: PoiseContext<'_>,
	#[description = "Id of the beatmap (the number after /b/)"] beatmap_id: u32,
	#[description = "osu! username (defaults to your linked account)"] username: Option<String>,
) -> Result<(), Error> {
	ctx.defer().await?;
	let res = best_impl(&mut ctx, beatmap_id, username).await;
	ctx.handle_error(res).await?;
	Ok(())
}
// }}}
// {{{ Profile
async fn profile_impl<C: MessageContext>(
	ctx: &mut C,
	username: Option<String>,
) -> Result<(), TaggedError> {
	let (user, mode) = fetch_user(&*ctx, username).await?;

	ctx.send(
		CreateReply::default()
			.reply(true)
			.embed(profile_card(&user, mode)),
	)
	.await?;

	Ok(())
}

/// Show the profile of a user
#[poise::command(prefix_command, slash_command, user_cooldown = 1)]
pub async fn profile(
	mut ctx: PoiseContext<'_>,
	#[description = "osu! username (defaults to your linked account)"] username: Option<String>,
) -> Result<(), Error> {
	let res = profile_impl(&mut ctx, username).await;
	ctx.handle_error(res).await?;
	Ok(())
}
// }}}
