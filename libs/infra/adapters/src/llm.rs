// [libs/infra/adapters/src/llm.rs]
//! Chat-completion adapter: a single typed request/response pair, no
//! provider-specific detail (model name, token accounting) leaks past
//! `LlmResponse`.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::errors::AdapterError;

#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub text: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

#[async_trait]
pub trait LlmAdapter: Send + Sync {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, AdapterError>;
}

pub struct OpenAiLlmAdapter {
    client: Client,
    base_url: String,
    model: String,
}

impl OpenAiLlmAdapter {
    pub fn new(base_url: impl Into<String>, api_key: &str, model: impl Into<String>) -> Self {
        let mut headers = reqwest::header::HeaderMap::new();
        let auth = reqwest::header::HeaderValue::from_str(&format!("Bearer {api_key}"))
            .expect("api key must be a valid header value");
        headers.insert(reqwest::header::AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .user_agent("grantwell-research-agent/1.0")
            .connect_timeout(std::time::Duration::from_secs(5))
            .timeout(std::time::Duration::from_secs(45))
            .build()
            .expect("llm adapter http client must build");

        OpenAiLlmAdapter { client, base_url: base_url.into().trim_end_matches('/').to_string(), model: model.into() }
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Usage,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[async_trait]
impl LlmAdapter for OpenAiLlmAdapter {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, AdapterError> {
        let body = ChatCompletionRequest {
            model: &self.model,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            messages: vec![
                ChatMessage { role: "system", content: &request.system_prompt },
                ChatMessage { role: "user", content: &request.user_prompt },
            ],
        };

        let response = self.client.post(format!("{}/chat/completions", self.base_url)).json(&body).send().await?;

        match response.status() {
            StatusCode::OK => {
                let parsed: ChatCompletionResponse =
                    response.json().await.map_err(|e| AdapterError::Decoding(e.to_string()))?;
                let text = parsed
                    .choices
                    .into_iter()
                    .next()
                    .map(|c| c.message.content)
                    .ok_or_else(|| AdapterError::Decoding("no choices in response".into()))?;
                Ok(LlmResponse { text, prompt_tokens: parsed.usage.prompt_tokens, completion_tokens: parsed.usage.completion_tokens })
            }
            StatusCode::UNAUTHORIZED => Err(AdapterError::Unauthorized),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after_secs = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(60);
                Err(AdapterError::RateLimited { retry_after_secs })
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(AdapterError::ServerRejection { status: status.as_u16(), body })
            }
        }
    }
}
