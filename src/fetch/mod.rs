//! HTTP retrieval of realtime feeds as JSON.

mod basic;
mod client;
mod error;

pub use basic::{BasicClient, DEFAULT_TIMEOUT};
pub use client::HttpClient;
pub use error::FetchError;

use serde_json::Value;
use tracing::{debug, info};

/// Issues a single GET to `url` and decodes the body as JSON.
///
/// # Errors
///
/// [`FetchError::Http`] for a non-2xx status, [`FetchError::Network`] when the
/// request or body transfer fails and [`FetchError::Decode`] when the body is
/// not JSON.
#[tracing::instrument(skip(client))]
pub async fn fetch_json<C: HttpClient>(client: &C, url: &str) -> Result<Value, FetchError> {
    info!(url, "Fetching data");

    let parsed = reqwest::Url::parse(url).map_err(|e| FetchError::InvalidUrl {
        url: url.to_string(),
        message: e.to_string(),
    })?;
    let req = reqwest::Request::new(reqwest::Method::GET, parsed);

    let resp = client.execute(req).await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::Http {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
        });
    }

    let bytes = resp.bytes().await?;
    debug!(bytes = bytes.len(), "Feed body received");
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
pub(crate) mod stub {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::HttpClient;

    /// Replays canned `(status, body)` pairs keyed by request path. Unknown
    /// paths answer 404.
    #[derive(Default)]
    pub struct StubClient {
        routes: HashMap<String, (u16, String)>,
        pub requests: Mutex<Vec<String>>,
    }

    impl StubClient {
        pub fn with(mut self, path: &str, status: u16, body: &str) -> Self {
            self.routes
                .insert(path.to_string(), (status, body.to_string()));
            self
        }
    }

    #[async_trait]
    impl HttpClient for StubClient {
        async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
            let path = req.url().path().to_string();
            self.requests.lock().unwrap().push(path.clone());
            let (status, body) = self
                .routes
                .get(&path)
                .cloned()
                .unwrap_or((404, String::new()));
            let resp = http::Response::builder()
                .status(status)
                .body(body)
                .unwrap();
            Ok(reqwest::Response::from(resp))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::stub::StubClient;
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    const URL: &str = "http://127.0.0.1:5343/gtfs/seq/trip_updates.json";

    #[tokio::test]
    async fn test_fetch_json_decodes_body() {
        let client = StubClient::default().with(
            "/gtfs/seq/trip_updates.json",
            200,
            r#"{"entity":[{"id":"1"}]}"#,
        );

        let value = fetch_json(&client, URL).await.unwrap();
        assert_eq!(value, json!({"entity": [{"id": "1"}]}));
    }

    #[tokio::test]
    async fn test_fetch_json_non_success_status() {
        let client = StubClient::default().with("/gtfs/seq/trip_updates.json", 500, "boom");

        match fetch_json(&client, URL).await {
            Err(FetchError::Http {
                status,
                status_text,
            }) => {
                assert_eq!(status, 500);
                assert_eq!(status_text, "Internal Server Error");
            }
            other => panic!("expected HTTP error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_json_invalid_body() {
        let client = StubClient::default().with("/gtfs/seq/trip_updates.json", 200, "<html>");

        let result = fetch_json(&client, URL).await;
        assert!(matches!(result, Err(FetchError::Decode(_))));
    }

    #[tokio::test]
    async fn test_fetch_json_invalid_url() {
        let client = StubClient::default();

        let result = fetch_json(&client, "not a url").await;
        assert!(matches!(result, Err(FetchError::InvalidUrl { .. })));
        assert!(client.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_json_times_out_on_silent_server() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            // Hold accepted sockets open without ever answering.
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        let client = BasicClient::with_timeout(Duration::from_millis(100)).unwrap();

        let result = fetch_json(&client, &format!("http://{addr}/feed.json")).await;

        match result {
            Err(FetchError::Network(e)) => assert!(e.is_timeout(), "not a timeout: {e}"),
            other => panic!("expected network timeout, got {other:?}"),
        }
        server.abort();
    }

    #[tokio::test]
    async fn test_fetch_json_connection_refused() {
        let client = BasicClient::new().unwrap();

        // Port 1 is reserved and nothing listens on it.
        let result = fetch_json(&client, "http://127.0.0.1:1/feed.json").await;
        assert!(matches!(result, Err(FetchError::Network(_))));
    }
}
