//! Anthropic messages adapter.
//!
//! The directive goes in the top-level `system` field; the user turn holds
//! the instruction followed by one base64 `image` block per page. The label
//! is the first `text` block of the reply.

use super::{join_url, Classifier, HttpClient};
use crate::error::BackendError;
use crate::pipeline::encode::EncodedPage;
use crate::prompts::CLASSIFIER_SYSTEM_PROMPT_SHORT;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const BACKEND_ID: &str = "anthropic";
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
pub const API_VERSION: &str = "2023-06-01";

/// Ceiling on reply length; a label needs a handful of tokens.
const MAX_TOKENS: u32 = 200;

#[derive(Debug, Serialize)]
pub(crate) struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: Vec<ContentBlock<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ContentBlock<'a> {
    Text { text: &'a str },
    Image { source: ImageSource<'a> },
}

#[derive(Debug, Serialize)]
struct ImageSource<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    media_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessagesResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
}

#[derive(Debug, Deserialize)]
struct ResponseBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

pub(crate) fn build_request<'a>(
    instruction: &'a str,
    pages: &'a [EncodedPage],
    model: &'a str,
) -> MessagesRequest<'a> {
    let mut content = Vec::with_capacity(pages.len() + 1);
    content.push(ContentBlock::Text { text: instruction });
    content.extend(pages.iter().map(|p| ContentBlock::Image {
        source: ImageSource {
            kind: "base64",
            media_type: p.media_type,
            data: &p.data,
        },
    }));

    MessagesRequest {
        model,
        max_tokens: MAX_TOKENS,
        temperature: 0.0,
        system: CLASSIFIER_SYSTEM_PROMPT_SHORT,
        messages: vec![Message {
            role: "user",
            content,
        }],
    }
}

pub(crate) fn extract_label(response: &MessagesResponse) -> String {
    response
        .content
        .iter()
        .find(|b| b.kind == "text")
        .and_then(|b| b.text.as_deref())
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Adapter for the Anthropic messages API.
#[derive(Debug, Clone)]
pub struct AnthropicClassifier {
    http: HttpClient,
    base_url: String,
}

impl AnthropicClassifier {
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
impl Classifier for AnthropicClassifier {
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
        let url = join_url(&self.base_url, "messages");
        let body = build_request(instruction, pages, model);
        debug!("POST {} ({} page(s), model {})", url, pages.len(), model);

        let response: MessagesResponse = self
            .http
            .post_json(
                BACKEND_ID,
                &url,
                &[("x-api-key", api_key), ("anthropic-version", API_VERSION)],
                &body,
            )
            .await?;
        Ok(extract_label(&response))
    }
}
