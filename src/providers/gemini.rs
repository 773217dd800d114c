//! Google Gemini `generateContent` adapter.
//!
//! The directive travels as `systemInstruction`; the single user turn holds
//! the instruction text followed by one `inlineData` part per page. The
//! label is the text of the first candidate (text parts concatenated).

use super::{join_url, Classifier, HttpClient};
use crate::error::BackendError;
use crate::pipeline::encode::EncodedPage;
use crate::prompts::CLASSIFIER_SYSTEM_PROMPT_SHORT;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const BACKEND_ID: &str = "gemini";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: &'a str,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData<'a>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

pub(crate) fn build_request<'a>(
    instruction: &'a str,
    pages: &'a [EncodedPage],
) -> GenerateRequest<'a> {
    let mut parts = Vec::with_capacity(pages.len() + 1);
    parts.push(Part::Text { text: instruction });
    parts.extend(pages.iter().map(|p| Part::InlineData {
        inline_data: InlineData {
            mime_type: p.media_type,
            data: &p.data,
        },
    }));

    GenerateRequest {
        system_instruction: Content {
            role: None,
            parts: vec![Part::Text {
                text: CLASSIFIER_SYSTEM_PROMPT_SHORT,
            }],
        },
        contents: vec![Content {
            role: Some("user"),
            parts,
        }],
        generation_config: GenerationConfig { temperature: 0.0 },
    }
}

pub(crate) fn extract_label(response: &GenerateResponse) -> String {
    let Some(content) = response.candidates.first().and_then(|c| c.content.as_ref()) else {
        return String::new();
    };
    content
        .parts
        .iter()
        .filter_map(|p| p.text.as_deref())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Adapter for the Gemini `generateContent` endpoint.
#[derive(Debug, Clone)]
pub struct GeminiClassifier {
    http: HttpClient,
    base_url: String,
}

impl GeminiClassifier {
    pub fn new(http: HttpClient) -> Self {
        Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point at a different API root (including the `/v1beta` segment).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl Classifier for GeminiClassifier {
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
        let url = join_url(&self.base_url, &format!("models/{model}:generateContent"));
        let body = build_request(instruction, pages);
        debug!("POST {} ({} page(s))", url, pages.len());

        let response: GenerateResponse = self
            .http
            .post_json(BACKEND_ID, &url, &[("x-goog-api-key", api_key)], &body)
            .await?;
        Ok(extract_label(&response))
    }
}
