// {{{ Imports
use crate::context::CliContext;
use osubot::commands::discord::MessageContext;
use osubot::commands::score::recent_impl;
use osubot::context::{Error, UserContext};
// }}}

#[derive(clap::Args)]
pub struct Args {
	/// Defaults to the account linked to $OSUBOT_DISCORD_USER_ID
	username: Option<String>,

	/// Skip failed plays
	#[arg(long)]
	passes_only: bool,
}

pub async fn run(args: Args) -> Result<(), Error> {
	let mut ctx = CliContext::new(UserContext::new()?)?;
	let res = recent_impl(&mut ctx, args.username, !args.passes_only).await;
	ctx.handle_error(res).await?;
	Ok(())
}
