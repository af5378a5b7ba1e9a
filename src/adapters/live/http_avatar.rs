//! Live adapter downloading avatars over HTTP.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::debug;

use crate::error::BotError;
use crate::ports::avatar_source::{AvatarRequest, AvatarSource, FetchFuture, FetchedResource};

/// Avatar source backed by a shared `reqwest` client.
pub struct HttpAvatarSource {
    client: Client,
}

impl HttpAvatarSource {
    /// Create a source whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, BotError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl AvatarSource for HttpAvatarSource {
    fn fetch(&self, request: &AvatarRequest) -> FetchFuture<'_> {
        let request = request.clone();
        Box::pin(async move {
            let response = self.client.get(&request.url).send().await?;

            let status = response.status().as_u16();
            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body = response.bytes().await?.to_vec();

            debug!(url = %request.url, status, content_type = ?content_type, bytes = body.len(), "fetched avatar");
            Ok(FetchedResource { status, content_type, body })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::http::header;
    use axum::routing::get;
    use axum::Router;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn reports_status_content_type_and_body() {
        let base = serve(Router::new().route(
            "/avatar.png",
            get(|| async { ([(header::CONTENT_TYPE, "image/png")], vec![1_u8, 2, 3]) }),
        ))
        .await;

        let source = HttpAvatarSource::new(Duration::from_secs(5)).unwrap();
        let fetched =
            source.fetch(&AvatarRequest { url: format!("{base}/avatar.png") }).await.unwrap();

        assert_eq!(fetched.status, 200);
        assert_eq!(fetched.content_type.as_deref(), Some("image/png"));
        assert_eq!(fetched.body, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn missing_route_is_reported_not_raised() {
        let base = serve(Router::new()).await;

        let source = HttpAvatarSource::new(Duration::from_secs(5)).unwrap();
        let fetched = source.fetch(&AvatarRequest { url: format!("{base}/gone.png") }).await.unwrap();

        assert_eq!(fetched.status, 404);
    }

    #[tokio::test]
    async fn unreachable_host_is_network_error() {
        let source = HttpAvatarSource::new(Duration::from_secs(5)).unwrap();
        let result = source.fetch(&AvatarRequest { url: "http://127.0.0.1:1/avatar.png".into() }).await;

        assert!(matches!(result, Err(BotError::Network(_))));
    }
}
