use crate::context::{Error, PoiseContext};

pub mod discord;
pub mod embeds;
pub mod link;
pub mod score;

// {{{ Help
/// Show this help menu
#[poise::command(prefix_command, track_edits, slash_command)]
pub async fn help(
	ctx: PoiseContext<'_>,
	#[description = "Specific command to show help about"]
	#[autocomplete = "poise::builtins::autocomplete_command"]
	command: Option<String>,
) -> Result<(), Error> {
	poise::builtins::help(
		ctx,
		command.as_deref(),
		poise::builtins::HelpConfiguration {
			extra_text_at_bottom: "Link your osu! account with /link to use commands without a username",
			show_subcommands: true,
			..Default::default()
		},
	)
	.await?;
	Ok(())
}
// }}}

/// Every command the bot registers.
pub fn all() -> Vec<poise::Command<crate::context::UserContext, Error>> {
	vec![
		help(),
		link::link(),
		link::unlink(),
		link::whois(),
		score::recent(),
		score::top(),
		score::best(),
		score::profile(),
	]
}
