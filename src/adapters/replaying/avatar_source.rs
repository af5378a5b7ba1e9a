//! Replaying adapter for the `AvatarSource` port.

use std::sync::{Arc, Mutex};

use super::{next_output, replay_result};
use crate::cassette::replayer::CassetteReplayer;
use crate::error::BotError;
use crate::ports::avatar_source::{AvatarRequest, AvatarSource, FetchFuture, FetchedResource};

/// Serves recorded avatar downloads from a cassette.
pub struct ReplayingAvatarSource {
    replayer: Arc<Mutex<CassetteReplayer>>,
}

impl ReplayingAvatarSource {
    /// Create a replaying source backed by the given replayer.
    #[must_use]
    pub fn new(replayer: Arc<Mutex<CassetteReplayer>>) -> Self {
        Self { replayer }
    }
}

impl AvatarSource for ReplayingAvatarSource {
    fn fetch(&self, _request: &AvatarRequest) -> FetchFuture<'_> {
        let output = next_output(&self.replayer, "avatar_source", "fetch");
        Box::pin(async move {
            replay_result::<FetchedResource>(output).map_err(|e| BotError::Transport(e.to_string()))
        })
    }
}
