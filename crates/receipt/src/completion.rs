use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Completion client error: {0}")]
    Client(String),
}

/// One single-shot completion call.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionRequest {
    /// The prompt already contains the receipt text.
    Text { prompt: String },
    /// System prompt plus the receipt image as a `data:` URL.
    Vision { system: String, image_data_url: String },
}

/// Abstraction over the external text/vision completion service.
/// Implementations return the model's raw reply text.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError>;
}

#[async_trait]
impl<B: CompletionBackend + ?Sized> CompletionBackend for Box<B> {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        (**self).complete(request).await
    }
}

#[async_trait]
impl<B: CompletionBackend + ?Sized> CompletionBackend for Arc<B> {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        (**self).complete(request).await
    }
}

// ── OpenAI-compatible backend ─────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub vision_model: String,
    pub timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            vision_model: "gpt-4o-mini".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

/// Talks to any `/v1/chat/completions` endpoint.
pub struct OpenAiBackend {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiBackend {
    pub fn new(config: OpenAiConfig) -> Result<Self, CompletionError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CompletionError::Client(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    fn headers(&self) -> Result<HeaderMap, CompletionError> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", self.config.api_key))
            .map_err(|e| CompletionError::Client(format!("Invalid API key format: {e}")))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    fn build_body(&self, request: CompletionRequest) -> ChatRequest<'_> {
        match request {
            CompletionRequest::Text { prompt } => ChatRequest {
                model: &self.config.model,
                messages: vec![ChatMessage {
                    role: "user",
                    content: MessageContent::Text(prompt),
                }],
                temperature: 0.0,
                stream: false,
            },
            CompletionRequest::Vision {
                system,
                image_data_url,
            } => ChatRequest {
                model: &self.config.vision_model,
                messages: vec![
                    ChatMessage {
                        role: "system",
                        content: MessageContent::Text(system),
                    },
                    ChatMessage {
                        role: "user",
                        content: MessageContent::Parts(vec![
                            ContentPart::Text {
                                text: "Extract the expense data from this receipt.".to_string(),
                            },
                            ContentPart::ImageUrl {
                                image_url: ImageUrl { url: image_data_url },
                            },
                        ]),
                    },
                ],
                temperature: 0.0,
                stream: false,
            },
        }
    }
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        let url = format!(
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let body = self.build_body(request);
        tracing::debug!(model = body.model, messages = body.messages.len(), "Sending completion request");

        let start = Instant::now();
        let response = self
            .client
            .post(&url)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status, "Completion API error: {body}");
            return Err(CompletionError::Status { status, body });
        }

        let parsed: ChatResponse = response.json().await?;
        tracing::debug!(elapsed_ms = start.elapsed().as_millis() as u64, "Completion received");

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: MessageContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Returns a preset reply and records what it was asked.
pub struct MockCompletion {
    reply: Result<String, String>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockCompletion {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: Ok(reply.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails with a 503 carrying `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            reply: Err(message.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests().len()
    }
}

#[async_trait]
impl CompletionBackend for MockCompletion {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        if let Ok(mut seen) = self.requests.lock() {
            seen.push(request);
        }
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(message) => Err(CompletionError::Status {
                status: 503,
                body: message.clone(),
            }),
        }
    }
}
