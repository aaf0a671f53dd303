//! HTTP transport to the chat gateway

use secrecy::{ExposeSecret, SecretString};

use crate::chat::{ChatRequest, GatewayError};
use crate::{Error, Result};

/// Client for the streaming chat endpoint
pub struct ChatClient {
    client: reqwest::Client,
    url: String,
    api_key: SecretString,
}

impl ChatClient {
    /// Create a client for the given endpoint
    #[must_use]
    pub fn new(url: String, api_key: SecretString) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
            api_key,
        }
    }

    /// POST the conversation and return the streaming response
    ///
    /// The returned response's body is a `text/event-stream`; read it with
    /// `bytes_stream`. A non-2xx status is decoded from the gateway's
    /// `{"error": ...}` body where possible.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Chat`] for gateway-reported failures and
    /// [`Error::Http`] for transport failures.
    pub async fn stream_chat(&self, request: &ChatRequest) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(&self.url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<GatewayError>(&body).map_or_else(
                |_| format!("chat gateway returned {status}"),
                |e| e.error,
            );
            return Err(Error::Chat(detail));
        }

        Ok(response)
    }
}
