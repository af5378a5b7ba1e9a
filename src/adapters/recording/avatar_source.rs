//! Recording adapter for the `AvatarSource` port.

use std::sync::{Arc, Mutex};

use super::record_result;
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::avatar_source::{AvatarRequest, AvatarSource, FetchFuture};

/// Records avatar downloads while delegating to an inner source.
pub struct RecordingAvatarSource {
    inner: Box<dyn AvatarSource>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingAvatarSource {
    /// Wrap `inner`, recording every fetch into `recorder`.
    pub fn new(inner: Box<dyn AvatarSource>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

impl AvatarSource for RecordingAvatarSource {
    fn fetch(&self, request: &AvatarRequest) -> FetchFuture<'_> {
        let request = request.clone();
        Box::pin(async move {
            let result = self.inner.fetch(&request).await;
            record_result(&self.recorder, "avatar_source", "fetch", &request, &result);
            result
        })
    }
}
