//! Application context shared by every request handler.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::debug;

use crate::adapters::live::http_avatar::HttpAvatarSource;
use crate::adapters::recording::avatar_source::RecordingAvatarSource;
use crate::adapters::replaying::avatar_source::ReplayingAvatarSource;
use crate::cassette::config::load_cassette;
use crate::cassette::recorder::CassetteRecorder;
use crate::compositor::{self, FrameAsset};
use crate::config::Config;
use crate::error::BotError;
use crate::ports::{AvatarRequest, AvatarSource};

/// Everything a request needs: the frame, an avatar source and the reply deadline.
///
/// Built once at startup and shared behind an `Arc`; nothing in it is mutated
/// after construction.
pub struct AppContext {
    /// Frame every avatar is composited into.
    pub frame: Arc<FrameAsset>,
    /// Avatar source port.
    pub avatars: Box<dyn AvatarSource>,
    /// Time allowed for fetching and compositing one avatar.
    pub response_deadline: Duration,
}

/// Handle to a recording session that must be finished after use.
pub struct RecordingSession {
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingSession {
    /// Finish the recording and write the cassette file to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be written.
    pub fn finish(self) -> Result<PathBuf, String> {
        let recorder = Arc::try_unwrap(self.recorder)
            .map_err(|_| "Recording adapter still has references".to_string())?
            .into_inner()
            .map_err(|e| format!("Recorder lock poisoned: {e}"))?;
        recorder.finish().map_err(|e| format!("Failed to write cassette: {e}"))
    }
}

impl AppContext {
    /// Assemble a context from its parts.
    #[must_use]
    pub fn new(frame: FrameAsset, avatars: Box<dyn AvatarSource>, response_deadline: Duration) -> Self {
        Self { frame: Arc::new(frame), avatars, response_deadline }
    }

    /// Create a live context that downloads avatars over HTTP.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn live(frame: FrameAsset, config: &Config) -> Result<Self, BotError> {
        let avatars = HttpAvatarSource::new(config.http.fetch_timeout())?;
        Ok(Self::new(frame, Box::new(avatars), config.http.response_deadline()))
    }

    /// Create a live context whose downloads are also recorded to a cassette.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn recording(
        frame: FrameAsset,
        config: &Config,
    ) -> Result<(Self, RecordingSession), BotError> {
        let live = HttpAvatarSource::new(config.http.fetch_timeout())?;

        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H-%M-%S").to_string();
        let path = PathBuf::from(".pfp-framer/cassettes")
            .join(&timestamp)
            .join("avatar_source.cassette.yaml");
        let recorder = Arc::new(Mutex::new(CassetteRecorder::new(
            path,
            format!("{timestamp}-avatar_source"),
            get_commit_hash(),
        )));

        let avatars = RecordingAvatarSource::new(Box::new(live), Arc::clone(&recorder));
        let ctx = Self::new(frame, Box::new(avatars), config.http.response_deadline());
        Ok((ctx, RecordingSession { recorder }))
    }

    /// Create a context that serves avatar downloads from a cassette file.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be loaded.
    pub fn replaying(frame: FrameAsset, config: &Config, path: &Path) -> Result<Self, BotError> {
        let replayer = load_cassette(path)
            .map_err(|e| BotError::Config(format!("Failed to load cassette: {e}")))?;
        let avatars = ReplayingAvatarSource::new(Arc::new(Mutex::new(replayer)));
        Ok(Self::new(frame, Box::new(avatars), config.http.response_deadline()))
    }

    /// Download the avatar at `url`, check it is an image and frame it.
    ///
    /// # Errors
    ///
    /// Returns a fetch error without decoding when the download fails or is
    /// not an image, otherwise whatever [`Self::frame_bytes`] returns.
    pub async fn frame_avatar(&self, url: &str) -> Result<Vec<u8>, BotError> {
        let fetched = self.avatars.fetch(&AvatarRequest { url: url.to_string() }).await?;
        let bytes = fetched.into_image_bytes()?;
        debug!(url, bytes = bytes.len(), "avatar accepted");
        self.frame_bytes(bytes).await
    }

    /// Frame raw image bytes on the blocking worker pool.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::Decode`] for undecodable input and
    /// [`BotError::Worker`] if the worker task dies.
    pub async fn frame_bytes(&self, source: Vec<u8>) -> Result<Vec<u8>, BotError> {
        let frame = Arc::clone(&self.frame);
        tokio::task::spawn_blocking(move || compositor::composite(&source, &frame))
            .await
            .map_err(|e| BotError::Worker(e.to_string()))?
    }
}

/// Get the current git commit hash, or "unknown" if unavailable.
fn get_commit_hash() -> String {
    std::process::Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map_or_else(|| "unknown".to_string(), |s| s.trim().to_string())
}
