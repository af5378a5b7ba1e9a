//! Live Discord adapter built on serenity.
//!
//! Translates gateway events into dispatcher events and implements the
//! messaging ports on top of the REST client.

use std::sync::Arc;

use serenity::all::{
    ButtonStyle, ChannelId, ComponentInteraction, Context, CreateActionRow, CreateAttachment,
    CreateButton, CreateInteractionResponse, CreateInteractionResponseFollowup,
    CreateInteractionResponseMessage, CreateMessage, EventHandler, GatewayIntents, Interaction,
    Message, Ready,
};
use serenity::async_trait;
use serenity::http::{Http, HttpError};
use serenity::Client;
use tracing::info;

use crate::dispatch::{CommandEvent, ComponentEvent, Dispatcher};
use crate::error::BotError;
use crate::ports::messenger::SendFuture;
use crate::ports::{ButtonPrompt, ChannelMessenger, InteractionResponder, Reply};

/// Connect to the gateway and feed events to `dispatcher` until the
/// connection ends.
///
/// # Errors
///
/// Returns an error if the client cannot be built or the gateway shuts down
/// with an error.
pub async fn run_gateway(token: &str, dispatcher: Arc<Dispatcher>) -> Result<(), BotError> {
    let intents = GatewayIntents::GUILD_MESSAGES | GatewayIntents::MESSAGE_CONTENT;
    let mut client = Client::builder(token, intents)
        .event_handler(Gateway { dispatcher })
        .await
        .map_err(|e| BotError::Gateway(e.to_string()))?;
    client.start().await.map_err(|e| BotError::Gateway(e.to_string()))
}

struct Gateway {
    dispatcher: Arc<Dispatcher>,
}

#[async_trait]
impl EventHandler for Gateway {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(user = %ready.user.name, guilds = ready.guilds.len(), "logged in");
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }
        let channel = DiscordChannel { http: Arc::clone(&ctx.http), channel_id: msg.channel_id };
        let event = CommandEvent {
            channel_id: msg.channel_id.get(),
            author_id: msg.author.id.get(),
            content: msg.content,
        };
        self.dispatcher.dispatch_command(&event, &channel).await;
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Interaction::Component(component) = interaction else {
            return;
        };
        let event = ComponentEvent {
            custom_id: component.data.custom_id.clone(),
            channel_id: component.channel_id.get(),
            user_id: component.user.id.get(),
            avatar_url: component.user.avatar_url(),
        };
        let responder = DiscordInteraction { http: Arc::clone(&ctx.http), interaction: component };
        self.dispatcher.dispatch_component(&event, &responder).await;
    }
}

/// Posts into the channel a command arrived in.
struct DiscordChannel {
    http: Arc<Http>,
    channel_id: ChannelId,
}

impl ChannelMessenger for DiscordChannel {
    fn send_button(&self, prompt: &ButtonPrompt) -> SendFuture<'_> {
        let button = CreateButton::new(prompt.custom_id.clone())
            .label(prompt.label.clone())
            .style(ButtonStyle::Primary);
        let message = CreateMessage::new()
            .content(prompt.text.clone())
            .components(vec![CreateActionRow::Buttons(vec![button])]);
        Box::pin(async move {
            self.channel_id
                .send_message(&self.http, message)
                .await
                .map_err(|e| BotError::Delivery(e.to_string()))?;
            Ok(())
        })
    }
}

/// Answers one component interaction.
struct DiscordInteraction {
    http: Arc<Http>,
    interaction: ComponentInteraction,
}

impl InteractionResponder for DiscordInteraction {
    fn acknowledge(&self) -> SendFuture<'_> {
        let defer = CreateInteractionResponse::Defer(
            CreateInteractionResponseMessage::new().ephemeral(true),
        );
        Box::pin(async move {
            self.interaction.create_response(&self.http, defer).await.map_err(interaction_error)
        })
    }

    fn respond_ephemeral(&self, reply: Reply) -> SendFuture<'_> {
        let followup = match reply {
            Reply::Text(text) => CreateInteractionResponseFollowup::new().content(text),
            Reply::Attachment { filename, data } => CreateInteractionResponseFollowup::new()
                .add_file(CreateAttachment::bytes(data, filename)),
        }
        .ephemeral(true);
        Box::pin(async move {
            self.interaction
                .create_followup(&self.http, followup)
                .await
                .map_err(interaction_error)?;
            Ok(())
        })
    }

    fn post_in_channel(&self, text: &str) -> SendFuture<'_> {
        let message = CreateMessage::new().content(text);
        Box::pin(async move {
            self.interaction
                .channel_id
                .send_message(&self.http, message)
                .await
                .map_err(|e| BotError::Delivery(e.to_string()))?;
            Ok(())
        })
    }
}

fn interaction_error(err: serenity::Error) -> BotError {
    let status = match &err {
        serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) => {
            Some(response.status_code.as_u16())
        }
        _ => None,
    };
    if status.is_some_and(is_expired) {
        BotError::ResponseExpired(err.to_string())
    } else {
        BotError::Delivery(err.to_string())
    }
}

/// Discord answers 404 once an interaction token has expired.
fn is_expired(status: u16) -> bool {
    status == 404
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_not_found_means_expired() {
        assert!(is_expired(404));
        for status in [400, 401, 403, 429, 500, 502] {
            assert!(!is_expired(status), "{status}");
        }
    }

    #[test]
    fn non_http_failure_is_delivery_error() {
        let err = interaction_error(serenity::Error::Other("gateway closed"));
        assert!(matches!(err, BotError::Delivery(ref msg) if msg.contains("gateway closed")), "{err:?}");
    }
}
