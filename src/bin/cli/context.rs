// {{{ Imports
use std::time::Duration;

use osubot::commands::discord::mock::ReplyEssence;
use osubot::commands::discord::MessageContext;
use osubot::context::paths::get_var;
use osubot::context::{Error, UserContext};
use poise::CreateReply;
// }}}

/// Similar in scope to [osubot::commands::discord::mock::MockContext],
/// except replies and messages are printed to the standard output.
///
/// Messages are printed as TOML, and buttons are never pressed.
pub struct CliContext {
	pub user_id: u64,
	pub data: UserContext,
}

impl CliContext {
	pub fn new(data: UserContext) -> Result<Self, Error> {
		let user_id = match get_var("OSUBOT_DISCORD_USER_ID") {
			Ok(id) => id.parse()?,
			Err(_) => 0,
		};

		Ok(Self { data, user_id })
	}
}

impl MessageContext for CliContext {
	fn author_id(&self) -> u64 {
		self.user_id
	}

	fn data(&self) -> &UserContext {
		&self.data
	}

	async fn reply(&mut self, text: &str) -> Result<(), Error> {
		println!("[Reply] {text}");
		Ok(())
	}

	async fn send(&mut self, message: CreateReply) -> Result<(), Error> {
		let all = toml::to_string(&ReplyEssence::from_reply(message))?;
		println!("\n========== Message ==========");
		println!("{all}");
		Ok(())
	}

	async fn prompt(
		&mut self,
		message: CreateReply,
		_timeout: Duration,
	) -> Result<Option<String>, Error> {
		self.send(message).await?;
		Ok(None)
	}
}
