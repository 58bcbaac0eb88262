use context::AppContext;
use osubot::context::paths::{get_var, get_var_or};
use osubot::context::{Error, UserContext};
use osubot::logs;
use poise::serenity_prelude::Http;
use routes::callback::osu_callback;
use tracing::{info, warn};

mod context;
mod error;
mod routes;

#[tokio::main]
async fn main() -> Result<(), Error> {
	logs::init();

	let ctx = Box::leak(Box::new(UserContext::new()?));
	let discord = match get_var("OSUBOT_DISCORD_TOKEN") {
		Ok(token) => Some(&*Box::leak(Box::new(Http::new(&token)))),
		Err(_) => {
			warn!("OSUBOT_DISCORD_TOKEN is not set, users won't be notified after linking");
			None
		}
	};

	let app = axum::Router::new()
		.route("/osu/callback", axum::routing::get(osu_callback))
		.with_state(AppContext::new(ctx, discord));

	let host = get_var_or("OSUBOT_OAUTH_HOST", "127.0.0.1");
	let port: u16 = get_var_or("OSUBOT_OAUTH_PORT", "8080").parse()?;
	let listener = tokio::net::TcpListener::bind((host.as_str(), port)).await?;

	info!("Listening on {}", listener.local_addr()?);

	axum::serve(listener, app).await?;

	Ok(())
}
