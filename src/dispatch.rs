//! Platform-neutral event routing.
//!
//! The gateway adapter turns platform events into [`CommandEvent`] and
//! [`ComponentEvent`] values and hands them to a [`Dispatcher`], which runs
//! whichever handler was registered for them.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::debug;

use crate::ports::{ChannelMessenger, InteractionResponder};

/// A text message seen in a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandEvent {
    /// Channel the message was posted in.
    pub channel_id: u64,
    /// Author of the message.
    pub author_id: u64,
    /// Full message text.
    pub content: String,
}

/// A click on a message component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentEvent {
    /// Identifier of the clicked component.
    pub custom_id: String,
    /// Channel holding the component.
    pub channel_id: u64,
    /// Member who clicked.
    pub user_id: u64,
    /// Profile picture of the member, if they have one.
    pub avatar_url: Option<String>,
}

/// Allow-list of channels a command is accepted in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelScope(HashSet<u64>);

impl ChannelScope {
    /// Build a scope from channel ids.
    pub fn only(channels: impl IntoIterator<Item = u64>) -> Self {
        Self(channels.into_iter().collect())
    }

    /// Whether `channel_id` falls inside this scope.
    #[must_use]
    pub fn contains(&self, channel_id: u64) -> bool {
        self.0.contains(&channel_id)
    }
}

/// Boxed future type returned by handlers.
pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

/// Handles a text command.
pub trait CommandHandler: Send + Sync {
    /// Handle a matched command.
    fn handle<'a>(
        &'a self,
        event: &'a CommandEvent,
        channel: &'a dyn ChannelMessenger,
    ) -> HandlerFuture<'a>;
}

/// Handles a component interaction.
pub trait ComponentHandler: Send + Sync {
    /// Handle a click on the registered component.
    fn handle<'a>(
        &'a self,
        event: &'a ComponentEvent,
        responder: &'a dyn InteractionResponder,
    ) -> HandlerFuture<'a>;
}

struct CommandRoute {
    name: String,
    scope: ChannelScope,
    handler: Arc<dyn CommandHandler>,
}

/// Routes events to registered handlers.
#[derive(Default)]
pub struct Dispatcher {
    commands: Vec<CommandRoute>,
    components: HashMap<String, Arc<dyn ComponentHandler>>,
}

impl Dispatcher {
    /// Create a dispatcher with no routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for messages whose whole text equals `name`,
    /// ignoring case, in channels inside `scope`.
    pub fn on_command(
        &mut self,
        name: impl Into<String>,
        scope: ChannelScope,
        handler: Arc<dyn CommandHandler>,
    ) -> &mut Self {
        self.commands.push(CommandRoute { name: name.into().to_lowercase(), scope, handler });
        self
    }

    /// Register `handler` for clicks on the component with `custom_id`.
    /// A later registration for the same id replaces the earlier one.
    pub fn on_component_interaction(
        &mut self,
        custom_id: impl Into<String>,
        handler: Arc<dyn ComponentHandler>,
    ) -> &mut Self {
        self.components.insert(custom_id.into(), handler);
        self
    }

    /// Run the first command handler matching `event`.
    /// Returns whether one ran.
    pub async fn dispatch_command(
        &self,
        event: &CommandEvent,
        channel: &dyn ChannelMessenger,
    ) -> bool {
        let content = event.content.to_lowercase();
        let Some(route) =
            self.commands.iter().find(|r| r.name == content && r.scope.contains(event.channel_id))
        else {
            return false;
        };
        debug!(
            command = %route.name,
            channel_id = event.channel_id,
            author_id = event.author_id,
            "dispatching command"
        );
        route.handler.handle(event, channel).await;
        true
    }

    /// Run the handler registered for the clicked component.
    /// Returns whether one ran.
    pub async fn dispatch_component(
        &self,
        event: &ComponentEvent,
        responder: &dyn InteractionResponder,
    ) -> bool {
        let Some(handler) = self.components.get(&event.custom_id) else {
            debug!(custom_id = %event.custom_id, "no handler for component");
            return false;
        };
        debug!(custom_id = %event.custom_id, user_id = event.user_id, "dispatching component");
        handler.handle(event, responder).await;
        true
    }
}
