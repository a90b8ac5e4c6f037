use async_trait::async_trait;
use reqwest::{Request, Response};

/// Transport used to issue feed requests.
///
/// [`BasicClient`](super::BasicClient) talks to the network; tests substitute
/// a client that replays canned responses.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
