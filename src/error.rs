//! Unified error type for pfp-framer.

use std::path::PathBuf;

use thiserror::Error;

/// Message shown when the avatar could not be downloaded.
pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch image. Please try again later.";

/// Message shown when the avatar URL served something other than an image.
pub const UNSUPPORTED_FORMAT_MESSAGE: &str = "Unsupported image format. Please try again later.";

/// Message posted in the channel when the interaction can no longer be answered.
pub const EXPIRED_FALLBACK_MESSAGE: &str = "Failed to complete the request. Please try again.";

/// Why a fetched avatar response was rejected before decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The server answered with something other than `200 OK`.
    #[error("HTTP {0}")]
    Status(u16),

    /// The response did not declare an image content type.
    #[error("content type {} is not an image", .0.as_deref().unwrap_or("(missing)"))]
    UnsupportedContentType(Option<String>),
}

/// Errors that can occur while running the bot or framing an avatar.
#[derive(Debug, Error)]
pub enum BotError {
    /// The avatar response was rejected.
    #[error("Failed to fetch image: {0}")]
    Fetch(#[from] FetchError),

    /// A network error occurred.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A transport failure reported without an underlying client error.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The source bytes are not a decodable raster image.
    #[error("Error processing image: {0}")]
    Decode(String),

    /// The composite could not be encoded.
    #[error("Image encoding error: {0}")]
    Encode(String),

    /// The blocking worker running the composite failed.
    #[error("Worker error: {0}")]
    Worker(String),

    /// The frame asset could not be loaded.
    #[error("Failed to load frame {}: {message}", .path.display())]
    FrameLoad {
        /// Path the frame was read from.
        path: PathBuf,
        /// Underlying decode or I/O failure.
        message: String,
    },

    /// The interaction token behind a reply is no longer valid.
    #[error("Response expired: {0}")]
    ResponseExpired(String),

    /// A message could not be delivered for any other reason.
    #[error("Delivery error: {0}")]
    Delivery(String),

    /// The gateway client failed.
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// No bot token configured.
    #[error("No bot token found. Set {env_var} or add it to the config file.")]
    MissingToken {
        /// The environment variable name.
        env_var: String,
    },
}

impl BotError {
    /// Text shown to the member whose request failed with this error.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Fetch(FetchError::UnsupportedContentType(_)) => {
                UNSUPPORTED_FORMAT_MESSAGE.to_string()
            }
            Self::Fetch(FetchError::Status(_)) | Self::Network(_) | Self::Transport(_) => {
                FETCH_FAILED_MESSAGE.to_string()
            }
            Self::Decode(cause) => format!("Error processing image: {cause}"),
            _ => EXPIRED_FALLBACK_MESSAGE.to_string(),
        }
    }
}
