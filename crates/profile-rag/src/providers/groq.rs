//! Groq chat-completion client (OpenAI-compatible API) with retry and SSE streaming

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tokio_stream::StreamExt;

use crate::config::GroqConfig;
use crate::error::{Error, Result};

use super::llm::{ChatMessage, ChatProvider, TokenStream};

/// Groq API client
///
/// Covers the two call shapes the pipeline needs: a blocking completion
/// for the compaction and answer stages, and an SSE stream for the
/// streaming answer flow.
pub struct GroqChat {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_retries: u32,
}

impl fmt::Debug for GroqChat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroqChat")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl GroqChat {
    /// Build a client from config; the API key is read from the
    /// environment variable the config names.
    pub fn from_config(config: &GroqConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| Error::config(format!("{} is not set", config.api_key_env)))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let mut base_url = config.base_url.clone();
        while base_url.ends_with('/') {
            base_url.pop();
        }

        Ok(Self {
            client,
            base_url,
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            max_retries: config.max_retries,
        })
    }

    /// Retry a request with exponential backoff. Only transient failures
    /// are retried; a rejected request surfaces immediately.
    async fn retry_request<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let delay = Duration::from_secs(2u64.pow(attempt));
                    tracing::warn!(
                        "Groq request failed (attempt {}/{}), retrying in {:?}: {}",
                        attempt + 1,
                        self.max_retries + 1,
                        delay,
                        e
                    );
                    last_error = Some(e);
                    sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| Error::upstream("groq", "retries exhausted")))
    }
}

#[async_trait]
impl ChatProvider for GroqChat {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let client = self.client.clone();
        let url = format!("{}/chat/completions", self.base_url);
        let api_key = self.api_key.clone();
        let model = self.model.clone();
        let temperature = self.temperature;
        let api_messages = convert_messages(messages);

        self.retry_request(|| {
            let client = client.clone();
            let url = url.clone();
            let api_key = api_key.clone();
            let model = model.clone();
            let api_messages = api_messages.clone();

            async move {
                let body = ChatCompletionRequest {
                    model: &model,
                    messages: &api_messages,
                    temperature,
                    stream: false,
                };
                let response = client
                    .post(&url)
                    .header("Authorization", format!("Bearer {api_key}"))
                    .json(&body)
                    .send()
                    .await?;

                let status = response.status();
                let text = response.text().await?;
                if !status.is_success() {
                    return Err(status_error(status, &text));
                }

                let parsed: ChatCompletionResponse = serde_json::from_str(&text)?;
                parsed.primary_text()
            }
        })
        .await
    }

    async fn complete_stream(&self, messages: &[ChatMessage]) -> Result<TokenStream> {
        let client = self.client.clone();
        let url = format!("{}/chat/completions", self.base_url);
        let api_key = self.api_key.clone();
        let model = self.model.clone();
        let temperature = self.temperature;
        let api_messages = convert_messages(messages);

        let response = self
            .retry_request(|| {
                let client = client.clone();
                let url = url.clone();
                let api_key = api_key.clone();
                let model = model.clone();
                let api_messages = api_messages.clone();

                async move {
                    let body = ChatCompletionRequest {
                        model: &model,
                        messages: &api_messages,
                        temperature,
                        stream: true,
                    };
                    let response = client
                        .post(&url)
                        .header("Authorization", format!("Bearer {api_key}"))
                        .json(&body)
                        .send()
                        .await?;

                    let status = response.status();
                    if !status.is_success() {
                        let text = response.text().await.unwrap_or_default();
                        return Err(status_error(status, &text));
                    }
                    Ok(response)
                }
            })
            .await?;

        Ok(sse_to_stream(response))
    }

    fn name(&self) -> &str {
        "groq"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Map a non-success status to an error. Rate limiting and server-side
/// failures come back as transient upstream errors; other rejections
/// are permanent.
fn status_error(status: reqwest::StatusCode, body: &str) -> Error {
    if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        Error::upstream("groq", format!("chat request failed (status {status}): {body}"))
    } else {
        Error::internal(format!("Groq rejected the request (status {status}): {body}"))
    }
}

/// Convert a streaming response body into a stream of text fragments.
/// Dropping the stream drops the response and cancels the request.
fn sse_to_stream(response: reqwest::Response) -> TokenStream {
    let events = response.bytes_stream().eventsource();
    let mapped = events.filter_map(|event| match event {
        Ok(event) => parse_stream_event(&event.data),
        Err(e) => Some(Err(Error::upstream("groq", format!("SSE decode error: {e}")))),
    });
    Box::pin(mapped)
}

fn parse_stream_event(data: &str) -> Option<Result<String>> {
    if data == "[DONE]" {
        return None;
    }

    match serde_json::from_str::<StreamChunk>(data) {
        Ok(chunk) => {
            let content = chunk
                .choices
                .first()
                .and_then(|c| c.delta.content.as_deref())
                .unwrap_or_default();

            if content.is_empty() {
                None
            } else {
                Some(Ok(content.to_owned()))
            }
        }
        Err(e) => Some(Err(Error::upstream(
            "groq",
            format!("failed to parse SSE data: {e}"),
        ))),
    }
}

fn convert_messages(messages: &[ChatMessage]) -> Vec<ApiMessage> {
    messages
        .iter()
        .map(|msg| ApiMessage {
            role: msg.role.as_str(),
            content: msg.content.clone(),
        })
        .collect()
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ApiMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Clone, Serialize)]
struct ApiMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

impl ChatCompletionResponse {
    /// Text of the first choice; an empty `choices` array is an error,
    /// never silently an empty string.
    fn primary_text(self) -> Result<String> {
        self.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::upstream("groq", "chat response contained no choices"))
    }
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}
