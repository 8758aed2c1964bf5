// [libs/infra/adapters/src/embedding.rs]
//! Text-embedding adapter: fixed-dimension vectors for a batch of
//! input strings, used by both the business-profile embedder and the
//! RAG generator's narrative chunker.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::errors::AdapterError;

#[async_trait]
pub trait EmbeddingAdapter: Send + Sync {
    fn dimensions(&self) -> usize;
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AdapterError>;
}

pub struct OpenAiEmbeddingAdapter {
    client: Client,
    base_url: String,
    model: String,
    dimensions: usize,
}

impl OpenAiEmbeddingAdapter {
    pub fn new(base_url: impl Into<String>, api_key: &str, model: impl Into<String>, dimensions: usize) -> Self {
        let mut headers = reqwest::header::HeaderMap::new();
        let auth = reqwest::header::HeaderValue::from_str(&format!("Bearer {api_key}"))
            .expect("api key must be a valid header value");
        headers.insert(reqwest::header::AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .user_agent("grantwell-research-agent/1.0")
            .connect_timeout(std::time::Duration::from_secs(5))
            .timeout(std::time::Duration::from_secs(20))
            .build()
            .expect("embedding adapter http client must build");

        OpenAiEmbeddingAdapter { client, base_url: base_url.into().trim_end_matches('/').to_string(), model: model.into(), dimensions }
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingAdapter for OpenAiEmbeddingAdapter {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AdapterError> {
        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .json(&EmbeddingRequest { model: &self.model, input: texts })
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let parsed: EmbeddingResponse = response.json().await.map_err(|e| AdapterError::Decoding(e.to_string()))?;
                Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
            }
            StatusCode::UNAUTHORIZED => Err(AdapterError::Unauthorized),
            StatusCode::TOO_MANY_REQUESTS => Err(AdapterError::RateLimited { retry_after_secs: 60 }),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(AdapterError::ServerRejection { status: status.as_u16(), body })
            }
        }
    }
}
