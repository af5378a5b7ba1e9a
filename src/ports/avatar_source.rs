//! Avatar source port for downloading profile pictures.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::error::{BotError, FetchError};

/// A request to download an avatar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvatarRequest {
    /// Avatar URL as reported by the platform.
    pub url: String,
}

/// An HTTP response to an avatar request, before any validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchedResource {
    /// HTTP status code.
    pub status: u16,
    /// Value of the `Content-Type` header, if present.
    #[serde(default)]
    pub content_type: Option<String>,
    /// Raw response body.
    #[serde(with = "base64_bytes")]
    pub body: Vec<u8>,
}

impl FetchedResource {
    /// Accept the response as image bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Status`] unless the status is exactly 200, and
    /// [`FetchError::UnsupportedContentType`] unless the content type
    /// contains `image`.
    pub fn into_image_bytes(self) -> Result<Vec<u8>, FetchError> {
        if self.status != 200 {
            return Err(FetchError::Status(self.status));
        }
        match self.content_type {
            Some(ref ct) if ct.contains("image") => Ok(self.body),
            other => Err(FetchError::UnsupportedContentType(other)),
        }
    }
}

/// Boxed future type returned by [`AvatarSource::fetch`].
pub type FetchFuture<'a> =
    Pin<Box<dyn Future<Output = Result<FetchedResource, BotError>> + Send + 'a>>;

/// Downloads avatars from wherever the platform hosts them.
pub trait AvatarSource: Send + Sync {
    /// Fetch the resource behind the request URL.
    fn fetch(&self, request: &AvatarRequest) -> FetchFuture<'_>;
}

/// Serde helper for serializing `Vec<u8>` as base64 strings in cassettes.
mod base64_bytes {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize bytes as base64 string.
    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(data);
        serializer.serialize_str(&encoded)
    }

    /// Deserialize base64 string to bytes.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        base64::engine::general_purpose::STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}
