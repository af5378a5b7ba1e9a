//! Messaging ports for posting to channels and answering interactions.

use std::future::Future;
use std::pin::Pin;

use crate::error::BotError;

/// A reply delivered to the member who triggered an interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Plain text.
    Text(String),
    /// A file attachment.
    Attachment {
        /// Filename shown to the member.
        filename: String,
        /// File contents.
        data: Vec<u8>,
    },
}

/// A message carrying a single clickable button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonPrompt {
    /// Message text above the button.
    pub text: String,
    /// Button label.
    pub label: String,
    /// Identifier reported back when the button is clicked.
    pub custom_id: String,
}

/// Boxed future type returned by messaging operations.
pub type SendFuture<'a> = Pin<Box<dyn Future<Output = Result<(), BotError>> + Send + 'a>>;

/// Posts messages into the channel a command arrived in.
pub trait ChannelMessenger: Send + Sync {
    /// Post a message with a button.
    fn send_button(&self, prompt: &ButtonPrompt) -> SendFuture<'_>;
}

/// Answers a single component interaction.
pub trait InteractionResponder: Send + Sync {
    /// Tell the platform a private reply is on its way.
    ///
    /// Must precede [`respond_ephemeral`](Self::respond_ephemeral). Discord
    /// only waits three seconds for this; the reply itself may follow later.
    fn acknowledge(&self) -> SendFuture<'_>;

    /// Reply visible only to the member who clicked.
    ///
    /// Fails with [`BotError::ResponseExpired`] once the interaction token
    /// is no longer accepted by the platform.
    fn respond_ephemeral(&self, reply: Reply) -> SendFuture<'_>;

    /// Post plain text in the channel the interaction came from.
    fn post_in_channel(&self, text: &str) -> SendFuture<'_>;
}
