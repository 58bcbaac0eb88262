use std::time::Duration;

use poise::serenity_prelude::{CreateInteractionResponse, UserId};
use poise::CreateReply;
use tracing::error;

use crate::context::{Error, ErrorKind, PoiseContext, TaggedError, UserContext};

// {{{ Trait
pub trait MessageContext {
	/// Get the user context held by the message
	fn data(&self) -> &UserContext;
	fn author_id(&self) -> u64;

	/// Reply to the current message
	async fn reply(&mut self, text: &str) -> Result<(), Error>;

	/// Deliver a message
	async fn send(&mut self, message: CreateReply) -> Result<(), Error>;

	/// Deliver a message carrying buttons, then wait for the author to
	/// press one of them. Returns the custom id of the pressed button, or
	/// [None] once the timeout elapses.
	async fn prompt(
		&mut self,
		message: CreateReply,
		timeout: Duration,
	) -> Result<Option<String>, Error>;

	/// Reports user errors back to the user, and propagates internal ones.
	async fn handle_error<V>(&mut self, res: Result<V, TaggedError>) -> Result<Option<V>, Error> {
		match res {
			Ok(v) => Ok(Some(v)),
			Err(e) => match e.kind {
				ErrorKind::Internal => {
					error!("Internal error: {:#}", e.error);
					Err(e.error)
				}
				ErrorKind::User => {
					self.reply(&format!("{}", e.error)).await?;
					Ok(None)
				}
			},
		}
	}
}
// }}}
// {{{ Poise implementation
impl<'a> MessageContext for PoiseContext<'a> {
	fn data(&self) -> &UserContext {
		Self::data(*self)
	}

	fn author_id(&self) -> u64 {
		self.author().id.get()
	}

	async fn reply(&mut self, text: &str) -> Result<(), Error> {
		Self::reply(*self, text).await?;
		Ok(())
	}

	async fn send(&mut self, message: CreateReply) -> Result<(), Error> {
		poise::send_reply(*self, message).await?;
		Ok(())
	}

	async fn prompt(
		&mut self,
		message: CreateReply,
		timeout: Duration,
	) -> Result<Option<String>, Error> {
		let handle = poise::send_reply(*self, message).await?;
		let message = handle.message().await?;

		let interaction = message
			.await_component_interaction(self.serenity_context())
			.author_id(UserId::new(self.author_id()))
			.timeout(timeout)
			.await;

		// Buttons are single use
		handle
			.edit(*self, CreateReply::default().components(vec![]))
			.await?;

		let Some(interaction) = interaction else {
			return Ok(None);
		};

		interaction
			.create_response(self.http(), CreateInteractionResponse::Acknowledge)
			.await?;

		Ok(Some(interaction.data.custom_id))
	}
}
// }}}
// {{{ Testing context
pub mod mock {
	use std::collections::VecDeque;

	use poise::serenity_prelude::{CreateActionRow, CreateEmbed};
	use serde::Serialize;

	use super::*;

	/// The parts of a [CreateReply] tests care about.
	#[derive(Debug, Clone, Serialize)]
	pub struct ReplyEssence {
		pub content: Option<String>,
		pub embeds: Vec<CreateEmbed>,
		pub components: Vec<CreateActionRow>,
	}

	impl ReplyEssence {
		pub fn from_reply(message: CreateReply) -> Self {
			Self {
				content: message.content,
				embeds: message.embeds,
				components: message.components.unwrap_or_default(),
			}
		}

		/// The title of every embed, serialized the way discord receives it.
		pub fn embed_titles(&self) -> Vec<String> {
			self.embeds
				.iter()
				.filter_map(|embed| {
					let value = serde_json::to_value(embed).ok()?;
					Some(value["title"].as_str()?.to_owned())
				})
				.collect()
		}
	}

	pub struct MockContext {
		pub user_id: u64,
		pub data: UserContext,
		pub messages: Vec<ReplyEssence>,

		/// Buttons the author will press, in order.
		pub button_presses: VecDeque<String>,
	}

	impl MockContext {
		pub fn new(data: UserContext) -> Self {
			Self {
				data,
				user_id: 666,
				messages: vec![],
				button_presses: VecDeque::new(),
			}
		}

		#[inline]
		pub fn last_message(&self) -> Option<&ReplyEssence> {
			self.messages.last()
		}
	}

	impl MessageContext for MockContext {
		fn author_id(&self) -> u64 {
			self.user_id
		}

		fn data(&self) -> &UserContext {
			&self.data
		}

		async fn reply(&mut self, text: &str) -> Result<(), Error> {
			self.messages
				.push(ReplyEssence::from_reply(CreateReply::default().content(text)));
			Ok(())
		}

		async fn send(&mut self, message: CreateReply) -> Result<(), Error> {
			self.messages.push(ReplyEssence::from_reply(message));
			Ok(())
		}

		async fn prompt(
			&mut self,
			message: CreateReply,
			_timeout: Duration,
		) -> Result<Option<String>, Error> {
			self.messages.push(ReplyEssence::from_reply(message));
			Ok(self.button_presses.pop_front())
		}
	}
}
// }}}
