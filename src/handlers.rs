//! The setup command and the frame button.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::compositor::OUTPUT_FILENAME;
use crate::config::BotConfig;
use crate::context::AppContext;
use crate::dispatch::{
    ChannelScope, CommandEvent, CommandHandler, ComponentEvent, ComponentHandler, Dispatcher,
    HandlerFuture,
};
use crate::error::{BotError, EXPIRED_FALLBACK_MESSAGE};
use crate::ports::{ButtonPrompt, ChannelMessenger, InteractionResponder, Reply};

/// Text posted above the frame button.
pub const SETUP_PROMPT: &str = "Click the button below to get your profile picture with a frame!";

/// Label of the frame button.
pub const BUTTON_LABEL: &str = "Get Your PFP";

/// Component id of the frame button.
pub const BUTTON_ID: &str = "get_pfp_button";

/// Reply for members without a profile picture.
pub const NO_AVATAR_MESSAGE: &str = "You don't have a profile picture to frame.";

/// Register the setup command and the frame button on `dispatcher`.
pub fn register(dispatcher: &mut Dispatcher, ctx: Arc<AppContext>, bot: &BotConfig) {
    dispatcher
        .on_command(
            bot.command.clone(),
            ChannelScope::only(bot.channels.iter().copied()),
            Arc::new(SetupCommand),
        )
        .on_component_interaction(BUTTON_ID, Arc::new(FrameButton::new(ctx)));
}

/// Posts the frame button.
pub struct SetupCommand;

impl CommandHandler for SetupCommand {
    fn handle<'a>(
        &'a self,
        event: &'a CommandEvent,
        channel: &'a dyn ChannelMessenger,
    ) -> HandlerFuture<'a> {
        let prompt = ButtonPrompt {
            text: SETUP_PROMPT.to_string(),
            label: BUTTON_LABEL.to_string(),
            custom_id: BUTTON_ID.to_string(),
        };
        Box::pin(async move {
            match channel.send_button(&prompt).await {
                Ok(()) => info!(
                    channel_id = event.channel_id,
                    requested_by = event.author_id,
                    "posted frame button"
                ),
                Err(e) => error!(channel_id = event.channel_id, error = %e, "failed to post frame button"),
            }
        })
    }
}

/// Frames the clicking member's avatar and replies with it.
pub struct FrameButton {
    ctx: Arc<AppContext>,
}

impl FrameButton {
    /// Create the handler over a shared context.
    #[must_use]
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self { ctx }
    }
}

impl ComponentHandler for FrameButton {
    fn handle<'a>(
        &'a self,
        event: &'a ComponentEvent,
        responder: &'a dyn InteractionResponder,
    ) -> HandlerFuture<'a> {
        Box::pin(async move {
            match responder.acknowledge().await {
                Ok(()) => {}
                Err(BotError::ResponseExpired(e)) => {
                    warn!(error = %e, "interaction expired before acknowledgement");
                    post_fallback(responder).await;
                    return;
                }
                Err(e) => {
                    error!(error = %e, "failed to acknowledge interaction");
                    return;
                }
            }

            let Some(url) = event.avatar_url.as_deref() else {
                deliver(responder, Reply::Text(NO_AVATAR_MESSAGE.to_string())).await;
                return;
            };

            let deadline = self.ctx.response_deadline;
            let reply = match tokio::time::timeout(deadline, self.ctx.frame_avatar(url)).await {
                Ok(Ok(data)) => {
                    info!(user_id = event.user_id, bytes = data.len(), "framed avatar");
                    Reply::Attachment { filename: OUTPUT_FILENAME.to_string(), data }
                }
                Ok(Err(e)) => {
                    warn!(user_id = event.user_id, error = %e, "could not frame avatar");
                    Reply::Text(e.user_message())
                }
                Err(_) => {
                    warn!(user_id = event.user_id, ?deadline, "deadline elapsed, abandoning reply");
                    post_fallback(responder).await;
                    return;
                }
            };
            deliver(responder, reply).await;
        })
    }
}

/// Send an ephemeral reply, falling back to a channel post if the
/// interaction has expired.
async fn deliver(responder: &dyn InteractionResponder, reply: Reply) {
    match responder.respond_ephemeral(reply).await {
        Ok(()) => {}
        Err(BotError::ResponseExpired(e)) => {
            warn!(error = %e, "interaction expired before reply");
            post_fallback(responder).await;
        }
        Err(e) => error!(error = %e, "failed to reply to interaction"),
    }
}

async fn post_fallback(responder: &dyn InteractionResponder) {
    if let Err(e) = responder.post_in_channel(EXPIRED_FALLBACK_MESSAGE).await {
        error!(error = %e, "failed to post fallback message");
    }
}
