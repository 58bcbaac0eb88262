use std::time::Duration;

use poise::serenity_prelude::{ButtonStyle, CreateActionRow, CreateButton};
use poise::CreateReply;
use tracing::info;

use crate::context::{Error, PoiseContext, TaggedError};
use crate::oauth::{authorize_url, create_state};
use crate::user::UserLink;

use super::discord::MessageContext;
use super::embeds::{notice, profile_card, profile_url};

const PROMPT_TIMEOUT: Duration = Duration::from_secs(300);

const LINK_CANCEL: &str = "link-cancel";
const UNLINK_CONFIRM: &str = "unlink-confirm";
const UNLINK_CANCEL: &str = "unlink-cancel";

// {{{ Link
async fn link_impl<C: MessageContext>(ctx: &mut C) -> Result<(), TaggedError> {
	if let Some(link) = UserLink::get(ctx.data(), ctx.author_id())? {
		ctx.send(
			CreateReply::default().reply(true).ephemeral(true).embed(notice(
				"Already Linked",
				format!(
					"You are already linked to [{}]({}). Use `/unlink` first if you want to link another account.",
					link.osu_username,
					profile_url(link.osu_user_id)
				),
			)),
		)
		.await?;
		return Ok(());
	}

	let state = create_state(ctx.data(), ctx.author_id())?;
	let url = authorize_url(ctx.data().osu.credentials(), &state)?;

	let buttons = CreateActionRow::Buttons(vec![
		CreateButton::new_link(url.as_str()).label("Link osu! account"),
		CreateButton::new(LINK_CANCEL)
			.label("Cancel")
			.style(ButtonStyle::Secondary),
	]);

	let message = CreateReply::default()
		.reply(true)
		.ephemeral(true)
		.embed(notice(
			"Link your osu! account",
			"Press the button below and authorize the bot on the osu! website. The link expires in 10 minutes.",
		))
		.components(vec![buttons]);

	if ctx.prompt(message, PROMPT_TIMEOUT).await?.as_deref() == Some(LINK_CANCEL) {
		ctx.send(
			CreateReply::default()
				.ephemeral(true)
				.embed(notice("Link cancelled", "No account was linked.")),
		)
		.await?;
	}

	Ok(())
}

/// Link your discord account to an osu! account
#[poise::command(prefix_command, slash_command)]
pub async fn link(mut ctx: PoiseContext<'_>) -> Result<(), Error> {
	let res = link_impl(&mut ctx).await;
	ctx.handle_error(res).await?;
	Ok(())
}
// }}}
// {{{ Unlink
async fn unlink_impl<C: MessageContext>(ctx: &mut C) -> Result<(), TaggedError> {
	let Some(link) = UserLink::get(ctx.data(), ctx.author_id())? else {
		ctx.send(
			CreateReply::default()
				.reply(true)
				.ephemeral(true)
				.embed(notice("No Link", "You do not have a linked osu! account.")),
		)
		.await?;
		return Ok(());
	};

	let buttons = CreateActionRow::Buttons(vec![
		CreateButton::new(UNLINK_CONFIRM)
			.label("Unlink")
			.style(ButtonStyle::Danger),
		CreateButton::new(UNLINK_CANCEL)
			.label("Cancel")
			.style(ButtonStyle::Secondary),
	]);

	let message = CreateReply::default()
		.reply(true)
		.ephemeral(true)
		.embed(notice(
			"Unlink your osu! account?",
			format!(
				"You are currently linked to [{}]({}).",
				link.osu_username,
				profile_url(link.osu_user_id)
			),
		))
		.components(vec![buttons]);

	match ctx.prompt(message, PROMPT_TIMEOUT).await?.as_deref() {
		Some(UNLINK_CONFIRM) => {
			let embed = if UserLink::delete(ctx.data(), ctx.author_id())? {
				info!("Discord user {} unlinked their account", ctx.author_id());
				notice("Account Unlinked", "Your osu! account is no longer linked.")
			} else {
				notice("No Link Found", "There was no linked account to remove.")
			};

			ctx.send(CreateReply::default().ephemeral(true).embed(embed))
				.await?;
		}
		Some(UNLINK_CANCEL) => {
			ctx.send(
				CreateReply::default()
					.ephemeral(true)
					.embed(notice("Unlink Cancelled", "Your account is still linked.")),
			)
			.await?;
		}
		_ => {}
	}

	Ok(())
}

/// Unlink your osu! account
#[poise::command(prefix_command, slash_command)]
pub async fn unlink(mut ctx: PoiseContext<'_>) -> Result<(), Error> {
	let res = unlink_impl(&mut ctx).await;
	ctx.handle_error(res).await?;
	Ok(())
}
// }}}
// {{{ Whois
async fn whois_impl<C: MessageContext>(ctx: &mut C, discord_id: u64) -> Result<(), TaggedError> {
	let Some(link) = UserLink::get(ctx.data(), discord_id)? else {
		ctx.send(CreateReply::default().reply(true).embed(notice(
			"No Link",
			format!("<@{discord_id}> has not linked an osu! account."),
		)))
		.await?;
		return Ok(());
	};

	let mut reply = CreateReply::default().reply(true).embed(notice(
		"Linked Account",
		format!(
			"<@{discord_id}> is [{}]({}), linked on {}.",
			link.osu_username,
			profile_url(link.osu_user_id),
			link.linked_at.format("%Y-%m-%d")
		),
	));

	let user = ctx
		.data()
		.osu
		.user(&link.osu_user_id.to_string(), Some(link.preferred_mode))
		.await?;
	reply = reply.embed(profile_card(&user, Some(link.preferred_mode)));

	ctx.send(reply).await?;
	Ok(())
}

/// Show which osu! account a member has linked
#[poise::command(prefix_command, slash_command, context_menu_command = "osu! account")]
pub async fn whois(
	mut ctx: PoiseContext<'_>,
	#[description = "The member to look up"] member: poise::serenity_prelude::User,
) -> Result<(), Error> {
	let res = whois_impl(&mut ctx, member.id.get()).await;
	ctx.handle_error(res).await?;
	Ok(())
}
// }}}
