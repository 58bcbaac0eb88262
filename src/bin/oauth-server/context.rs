use osubot::context::UserContext;
use poise::serenity_prelude::Http;

#[derive(Clone, Copy)]
pub struct AppContext {
	pub ctx: &'static UserContext,

	/// Used to notify users once linking succeeds. Notifications are
	/// skipped when no discord token is configured.
	pub discord: Option<&'static Http>,
}

impl AppContext {
	pub fn new(ctx: &'static UserContext, discord: Option<&'static Http>) -> Self {
		Self { ctx, discord }
	}
}
