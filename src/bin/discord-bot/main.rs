use std::sync::Arc;
use std::time::Duration;

use osubot::context::paths::get_var;
use osubot::context::{Error, UserContext};
use osubot::{commands, logs};
use poise::serenity_prelude as serenity;
use tracing::{error, info};

// {{{ Error handler
async fn on_error(error: poise::FrameworkError<'_, UserContext, Error>) {
	if let Err(e) = poise::builtins::on_error(error).await {
		error!("Error while handling error: {}", e)
	}
}
// }}}

#[tokio::main]
async fn main() -> Result<(), Error> {
	logs::init();

	// {{{ Poise options
	let options = poise::FrameworkOptions {
		commands: commands::all(),
		prefix_options: poise::PrefixFrameworkOptions {
			prefix: Some("!".into()),
			edit_tracker: Some(Arc::new(poise::EditTracker::for_timespan(
				Duration::from_secs(3600),
			))),
			..Default::default()
		},
		on_error: |error| Box::pin(on_error(error)),
		..Default::default()
	};
	// }}}
	// {{{ Start poise
	let framework = poise::Framework::builder()
		.setup(move |ctx, ready, framework| {
			Box::pin(async move {
				info!("Logged in as {}", ready.user.name);
				poise::builtins::register_globally(ctx, &framework.options().commands).await?;
				let ctx = UserContext::new()?;

				Ok(ctx)
			})
		})
		.options(options)
		.build();

	let token = get_var("OSUBOT_DISCORD_TOKEN")?;
	let intents =
		serenity::GatewayIntents::non_privileged() | serenity::GatewayIntents::MESSAGE_CONTENT;

	let mut client = serenity::ClientBuilder::new(token, intents)
		.framework(framework)
		.await?;

	client.start().await?;
	// }}}

	Ok(())
}
