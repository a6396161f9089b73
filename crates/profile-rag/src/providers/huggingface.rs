//! Hugging Face Inference API clients: text2text generation and embeddings

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;

use crate::config::HuggingFaceConfig;
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;
use super::llm::Text2TextProvider;

/// Text2text generation client (flan-t5), used by the classifier and
/// rephrase stages
pub struct HfText2Text {
    client: Client,
    url: String,
    api_key: String,
    model: String,
    max_retries: u32,
}

impl fmt::Debug for HfText2Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HfText2Text")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl HfText2Text {
    /// Build a client from config; the API token is read from the
    /// environment variable the config names.
    pub fn from_config(config: &HuggingFaceConfig) -> Result<Self> {
        let api_key = read_api_key(config)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: format!(
                "{}/models/{}",
                trim_base_url(&config.base_url),
                config.text2text_model
            ),
            api_key,
            model: config.text2text_model.clone(),
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl Text2TextProvider for HfText2Text {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let client = self.client.clone();
        let url = self.url.clone();
        let api_key = self.api_key.clone();
        let prompt = prompt.to_string();

        retry_request("huggingface", self.max_retries, || {
            let client = client.clone();
            let url = url.clone();
            let api_key = api_key.clone();
            let prompt = prompt.clone();

            async move {
                let body = GenerationRequest {
                    inputs: &prompt,
                    options: RequestOptions {
                        wait_for_model: true,
                    },
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

                let generations: Vec<GeneratedText> = serde_json::from_str(&text)?;
                first_generation(generations)
            }
        })
        .await
    }

    fn name(&self) -> &str {
        "huggingface"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Feature-extraction embedding client (jina-embeddings-v2-base-en),
/// used by the vector index
pub struct HfEmbedder {
    client: Client,
    url: String,
    api_key: String,
    model: String,
    dimensions: usize,
    max_retries: u32,
}

impl fmt::Debug for HfEmbedder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HfEmbedder")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("dimensions", &self.dimensions)
            .finish()
    }
}

impl HfEmbedder {
    /// Build a client from config; shares the API token env var with the
    /// text2text client.
    pub fn from_config(config: &HuggingFaceConfig) -> Result<Self> {
        let api_key = read_api_key(config)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: format!(
                "{}/pipeline/feature-extraction/{}",
                trim_base_url(&config.base_url),
                config.embedding_model
            ),
            api_key,
            model: config.embedding_model.clone(),
            dimensions: config.embedding_dimensions,
            max_retries: config.max_retries,
        })
    }

    async fn request_embeddings(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let client = self.client.clone();
        let url = self.url.clone();
        let api_key = self.api_key.clone();
        let texts = texts.to_vec();

        let embeddings: Vec<Vec<f32>> = retry_request("huggingface", self.max_retries, || {
            let client = client.clone();
            let url = url.clone();
            let api_key = api_key.clone();
            let texts = texts.clone();

            async move {
                let body = EmbeddingRequest {
                    inputs: &texts,
                    options: RequestOptions {
                        wait_for_model: true,
                    },
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

                Ok(serde_json::from_str(&text)?)
            }
        })
        .await?;

        if embeddings.len() != texts.len() {
            return Err(Error::upstream(
                "huggingface",
                format!(
                    "expected {} embeddings, got {}",
                    texts.len(),
                    embeddings.len()
                ),
            ));
        }
        Ok(embeddings)
    }
}

#[async_trait]
impl EmbeddingProvider for HfEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self.request_embeddings(&[text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| Error::upstream("huggingface", "embedding response was empty"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request_embeddings(texts).await
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "huggingface"
    }
}

fn read_api_key(config: &HuggingFaceConfig) -> Result<String> {
    std::env::var(&config.api_key_env)
        .map_err(|_| Error::config(format!("{} is not set", config.api_key_env)))
}

fn trim_base_url(base_url: &str) -> &str {
    base_url.trim_end_matches('/')
}

/// Map a non-success status to an error. A 503 from this API usually
/// means the model is still loading, which is retryable.
fn status_error(status: reqwest::StatusCode, body: &str) -> Error {
    if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        Error::upstream(
            "huggingface",
            format!("request failed (status {status}): {body}"),
        )
    } else {
        Error::internal(format!(
            "Hugging Face rejected the request (status {status}): {body}"
        ))
    }
}

/// Retry a request with exponential backoff. Only transient failures
/// are retried.
async fn retry_request<F, Fut, T>(provider: &str, max_retries: u32, operation: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut last_error = None;

    for attempt in 0..=max_retries {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_transient() && attempt < max_retries => {
                let delay = Duration::from_secs(2u64.pow(attempt));
                tracing::warn!(
                    "{} request failed (attempt {}/{}), retrying in {:?}: {}",
                    provider,
                    attempt + 1,
                    max_retries + 1,
                    delay,
                    e
                );
                last_error = Some(e);
                sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_error.unwrap_or_else(|| Error::upstream(provider, "retries exhausted")))
}

#[derive(Serialize)]
struct GenerationRequest<'a> {
    inputs: &'a str,
    options: RequestOptions,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    inputs: &'a [String],
    options: RequestOptions,
}

#[derive(Serialize)]
struct RequestOptions {
    wait_for_model: bool,
}

/// One element of the text2text response array
#[derive(Debug, Deserialize)]
struct GeneratedText {
    generated_text: String,
}

/// First generation of the response; an empty array is an error, never
/// silently an empty string.
fn first_generation(generations: Vec<GeneratedText>) -> Result<String> {
    generations
        .into_iter()
        .next()
        .map(|g| g.generated_text)
        .ok_or_else(|| Error::upstream("huggingface", "response contained no generations"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_text2text() -> HfText2Text {
        HfText2Text {
            client: Client::new(),
            url: "http://127.0.0.1:1/models/google/flan-t5-base".to_string(),
            api_key: "hf-test-token".to_string(),
            model: "google/flan-t5-base".to_string(),
            max_retries: 0,
        }
    }

    fn test_embedder() -> HfEmbedder {
        HfEmbedder {
            client: Client::new(),
            url: "http://127.0.0.1:1/pipeline/feature-extraction/jinaai/jina-embeddings-v2-base-en"
                .to_string(),
            api_key: "hf-test-token".to_string(),
            model: "jinaai/jina-embeddings-v2-base-en".to_string(),
            dimensions: 768,
            max_retries: 0,
        }
    }

    #[test]
    fn generation_request_serialization() {
        let body = GenerationRequest {
            inputs: "Classify this question",
            options: RequestOptions {
                wait_for_model: true,
            },
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("\"inputs\":\"Classify this question\""));
        assert!(json.contains("\"wait_for_model\":true"));
    }

    #[test]
    fn parse_generation_response() {
        let json = r#"[{"generated_text":"transcript"}]"#;
        let generations: Vec<GeneratedText> = serde_json::from_str(json).unwrap();
        assert_eq!(first_generation(generations).unwrap(), "transcript");
    }

    #[test]
    fn empty_generation_response_is_an_error() {
        let err = first_generation(Vec::new()).unwrap_err();
        assert!(err.to_string().contains("no generations"));
    }

    #[test]
    fn unexpected_generation_shape_fails_to_parse() {
        let json = r#"{"error":"Model google/flan-t5-base is currently loading"}"#;
        let parsed: std::result::Result<Vec<GeneratedText>, _> = serde_json::from_str(json);
        assert!(parsed.is_err());
    }

    #[test]
    fn parse_embedding_response() {
        let json = "[[0.1,0.2,0.3],[0.4,0.5,0.6]]";
        let embeddings: Vec<Vec<f32>> = serde_json::from_str(json).unwrap();
        assert_eq!(embeddings.len(), 2);
        assert_eq!(embeddings[0], vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn model_loading_status_is_transient() {
        let err = status_error(
            reqwest::StatusCode::SERVICE_UNAVAILABLE,
            "model is loading",
        );
        assert!(err.is_transient());

        let err = status_error(reqwest::StatusCode::UNAUTHORIZED, "bad token");
        assert!(!err.is_transient());
    }

    #[test]
    fn debug_redacts_api_key() {
        assert!(!format!("{:?}", test_text2text()).contains("hf-test-token"));
        assert!(!format!("{:?}", test_embedder()).contains("hf-test-token"));
    }

    #[test]
    fn embedder_reports_configured_dimensions() {
        assert_eq!(EmbeddingProvider::dimensions(&test_embedder()), 768);
    }

    #[tokio::test]
    async fn generate_unreachable_endpoint_errors() {
        let result = test_text2text().generate("test").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn embed_unreachable_endpoint_errors() {
        let result = test_embedder().embed("test").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn embed_batch_of_nothing_skips_the_network() {
        let embeddings = test_embedder().embed_batch(&[]).await.unwrap();
        assert!(embeddings.is_empty());
    }

    #[tokio::test]
    #[ignore = "requires HF_API_TOKEN env var"]
    async fn integration_hf_generate() {
        let provider = HfText2Text::from_config(&HuggingFaceConfig::default()).unwrap();
        let output = provider
            .generate("Answer with one word. What color is the sky?")
            .await
            .unwrap();
        assert!(!output.is_empty());
    }

    #[tokio::test]
    #[ignore = "requires HF_API_TOKEN env var"]
    async fn integration_hf_embed() {
        let provider = HfEmbedder::from_config(&HuggingFaceConfig::default()).unwrap();
        let embedding = provider.embed("Hello world").await.unwrap();
        assert!(!embedding.is_empty());
    }
}
