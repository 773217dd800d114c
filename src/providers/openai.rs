//! OpenAI chat-completions adapter.
//!
//! Sends a system message with [`CLASSIFIER_SYSTEM_PROMPT`] and one user
//! message whose content is the instruction text followed by each page as
//! an `image_url` part carrying a `data:image/png;base64,` URI. The label is
//! `choices[0].message.content`.

use super::{join_url, Classifier, HttpClient};
use crate::error::BackendError;
use crate::pipeline::encode::EncodedPage;
use crate::prompts::CLASSIFIER_SYSTEM_PROMPT;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const BACKEND_ID: &str = "openai";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: MessageContent<'a>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart<'a>>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

pub(crate) fn build_request<'a>(
    instruction: &'a str,
    pages: &[EncodedPage],
    model: &'a str,
) -> ChatRequest<'a> {
    let mut parts = Vec::with_capacity(pages.len() + 1);
    parts.push(ContentPart::Text { text: instruction });
    parts.extend(pages.iter().map(|p| ContentPart::ImageUrl {
        image_url: ImageUrl { url: p.data_url() },
    }));

    ChatRequest {
        model,
        messages: vec![
            ChatMessage {
                role: "system",
                content: MessageContent::Text(CLASSIFIER_SYSTEM_PROMPT),
            },
            ChatMessage {
                role: "user",
                content: MessageContent::Parts(parts),
            },
        ],
        temperature: 0.0,
    }
}

pub(crate) fn extract_label(response: &ChatResponse) -> String {
    response
        .choices
        .first()
        .and_then(|c| c.message.content.as_deref())
        .unwrap_or_default()
        .trim()
        .to_string()
}

// ── Adapter ──────────────────────────────────────────────────────────────

/// Adapter for OpenAI (and OpenAI-compatible) chat-completions endpoints.
#[derive(Debug, Clone)]
pub struct OpenAiClassifier {
    http: HttpClient,
    base_url: String,
}

impl OpenAiClassifier {
    pub fn new(http: HttpClient) -> Self {
        Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point at a different API root (including the `/v1` segment).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl Classifier for OpenAiClassifier {
    fn backend_id(&self) -> &str {
        BACKEND_ID
    }

    async fn classify(
        &self,
        api_key: &str,
        instruction: &str,
        pages: &[EncodedPage],
        model: &str,
    ) -> Result<String, BackendError> {
        let url = join_url(&self.base_url, "chat/completions");
        let body = build_request(instruction, pages, model);
        let bearer = format!("Bearer {api_key}");
        debug!("POST {} ({} page(s), model {})", url, pages.len(), model);

        let response: ChatResponse = self
            .http
            .post_json(BACKEND_ID, &url, &[("authorization", bearer.as_str())], &body)
            .await?;
        Ok(extract_label(&response))
    }
}
