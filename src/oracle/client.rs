//! OpenAI-compatible chat completions client

use crate::config::OracleConfig;
use crate::oracle::{JudgmentOracle, OracleError, OracleRequest};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const SYSTEM_PROMPT: &str = "You are a careful research assistant. Answer strictly in the \
format requested. Never guess: use the requested sentinel when the answer is not supported.";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Oracle backed by a `/chat/completions` endpoint
pub struct ChatCompletionsOracle {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl ChatCompletionsOracle {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, OracleError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OracleError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
        })
    }

    pub fn from_config(config: &OracleConfig, api_key: String) -> Result<Self, OracleError> {
        Self::new(
            &config.endpoint,
            &config.model,
            api_key,
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Joins the prompt and its documents into the user message
    fn user_message(request: &OracleRequest) -> String {
        let mut content = request.prompt.clone();
        for (i, document) in request.documents.iter().enumerate() {
            content.push_str(&format!("\n\n--- Document {} ---\n{}", i + 1, document));
        }
        content
    }
}

#[async_trait]
impl JudgmentOracle for ChatCompletionsOracle {
    async fn judge(&self, request: &OracleRequest) -> Result<String, OracleError> {
        let start = Instant::now();

        let body = ChatRequest {
            model: &self.model,
            temperature: 0.0,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: Self::user_message(request),
                },
            ],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!(task = %request.task, error = %e, "Oracle request failed");
                if e.is_timeout() {
                    OracleError::Timeout
                } else {
                    OracleError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(task = %request.task, status = %status, "Oracle API error");
            return Err(OracleError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| OracleError::Network(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(OracleError::EmptyResponse)?;

        debug!(
            task = %request.task,
            duration_ms = start.elapsed().as_millis() as u64,
            "Oracle reply received"
        );

        Ok(content)
    }
}
