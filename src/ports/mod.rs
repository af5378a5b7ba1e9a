//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the application core and an
//! external system. Implementations live in `src/adapters/`.

pub mod avatar_source;
pub mod messenger;

pub use avatar_source::{AvatarRequest, AvatarSource};
pub use messenger::{ButtonPrompt, ChannelMessenger, InteractionResponder, Reply};
