//! HTTP Agent Client
//!
//! Talks to the Cortex backend over HTTP:
//!
//! - `POST {base}/agent` with `{"query": ...}` returns `{"responses": [...]}`
//! - `POST {base}/tts/play` with `{"text", "voice", "lang_code"}` returns
//!   raw audio bytes
//!
//! All failures are absorbed here per the no-throw boundary policy; see
//! [`super::traits`].

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::traits::{AgentBackend, AudioClip, SpeechRequest, AGENT_FALLBACK};

/// Request timeout for agent and synthesis calls
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// HTTP client for the Cortex agent backend
#[derive(Clone, Debug)]
pub struct HttpAgentClient {
    base_url: String,
    http: reqwest::Client,
}

/// Wire shape of the query endpoint response
#[derive(Debug, Deserialize)]
struct AgentReply {
    /// Ordered reply fragments; a missing field reads as an empty list
    #[serde(default)]
    responses: Vec<String>,
}

impl HttpAgentClient {
    /// Create a client for the given base URL (no trailing slash)
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            http: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    /// The configured base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn try_query(&self, text: &str) -> anyhow::Result<Vec<String>> {
        let url = format!("{}/agent", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "query": text }))
            .send()
            .await?;
        let reply: AgentReply = response.error_for_status()?.json().await?;
        Ok(reply.responses)
    }

    async fn try_synthesize(&self, request: &SpeechRequest) -> anyhow::Result<AudioClip> {
        let url = format!("{}/tts/play", self.base_url);
        let response = self.http.post(&url).json(request).send().await?;
        let bytes = response.error_for_status()?.bytes().await?;
        Ok(AudioClip::new(bytes.to_vec()))
    }
}

#[async_trait]
impl AgentBackend for HttpAgentClient {
    fn name(&self) -> &str {
        "cortex-http"
    }

    async fn query(&self, text: &str) -> Vec<String> {
        match self.try_query(text).await {
            Ok(fragments) => fragments,
            Err(error) => {
                tracing::warn!(%error, "Agent query failed, substituting fallback");
                vec![AGENT_FALLBACK.to_string()]
            }
        }
    }

    async fn synthesize(&self, request: &SpeechRequest) -> Option<AudioClip> {
        match self.try_synthesize(request).await {
            Ok(clip) => Some(clip),
            Err(error) => {
                tracing::warn!(%error, "Speech synthesis failed");
                None
            }
        }
    }

    async fn health_check(&self) -> bool {
        let url = format!("{}/", self.base_url);
        self.http.get(&url).send().await.is_ok()
    }
}
