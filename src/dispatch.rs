//! Backend selection: identifier → [`Classifier`] adapter.
//!
//! The dispatcher is a lookup table keyed by the normalised (trimmed,
//! lowercased) backend identifier. Call sites never branch on backend;
//! they hand the identifier and a [`ClassificationRequest`] to
//! [`Dispatcher::dispatch`] and get a label back.

use crate::config::{normalize_backend_id, Backend, ClassifierConfig};
use crate::error::ClassifyError;
use crate::pipeline::encode::ClassificationRequest;
use crate::providers::{
    AnthropicClassifier, Classifier, GeminiClassifier, HttpClient, OpenAiClassifier,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Table of registered backend adapters.
#[derive(Clone, Default)]
pub struct Dispatcher {
    adapters: HashMap<String, Arc<dyn Classifier>>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("backends", &self.backends())
            .finish()
    }
}

impl Dispatcher {
    /// An empty table. Every dispatch fails until adapters are registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// All three built-in adapters sharing one HTTP client, at their
    /// default base URLs.
    pub fn builtin(http: HttpClient) -> Self {
        let mut d = Self::new();
        d.register(
            Backend::OpenAi.as_str(),
            Arc::new(OpenAiClassifier::new(http.clone())),
        );
        d.register(
            Backend::Anthropic.as_str(),
            Arc::new(AnthropicClassifier::new(http.clone())),
        );
        d.register(Backend::Gemini.as_str(), Arc::new(GeminiClassifier::new(http)));
        d
    }

    /// Built-in adapters for a run: the HTTP client carries the configured
    /// timeout, and `config.base_url` (if any) is applied to the configured
    /// backend only.
    pub fn for_config(config: &ClassifierConfig) -> Result<Self, ClassifyError> {
        let http = HttpClient::new(config.api_timeout_secs)?;
        let mut d = Self::builtin(http.clone());

        if let Some(base) = config.base_url.as_deref().filter(|b| !b.trim().is_empty()) {
            let base = base.trim().to_string();
            debug!("Using base URL {} for {}", base, config.backend);
            let adapter: Arc<dyn Classifier> = match config.backend {
                Backend::OpenAi => Arc::new(OpenAiClassifier::new(http).with_base_url(base)),
                Backend::Anthropic => {
                    Arc::new(AnthropicClassifier::new(http).with_base_url(base))
                }
                Backend::Gemini => Arc::new(GeminiClassifier::new(http).with_base_url(base)),
            };
            d.register(config.backend.as_str(), adapter);
        }

        Ok(d)
    }

    /// Register (or replace) the adapter for `id`. The identifier is
    /// normalised the same way lookups are.
    pub fn register(&mut self, id: &str, adapter: Arc<dyn Classifier>) {
        self.adapters.insert(normalize_backend_id(id), adapter);
    }

    /// Registered identifiers, sorted.
    pub fn backends(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.adapters.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Look up the adapter for `id` (case-insensitive, whitespace-trimmed).
    pub fn resolve(&self, id: &str) -> Result<&Arc<dyn Classifier>, ClassifyError> {
        self.adapters
            .get(&normalize_backend_id(id))
            .ok_or_else(|| ClassifyError::UnsupportedBackend {
                name: id.trim().to_string(),
            })
    }

    /// Send `request` to the adapter registered for `backend_id`.
    ///
    /// # Errors
    /// * [`ClassifyError::UnsupportedBackend`] if no adapter matches; fatal
    ///   for the run.
    /// * [`ClassifyError::Backend`] if the adapter's call failed; scoped to
    ///   this one file (see [`ClassifyError::is_per_file`]).
    pub async fn dispatch(
        &self,
        backend_id: &str,
        api_key: &str,
        request: &ClassificationRequest,
        model: &str,
    ) -> Result<String, ClassifyError> {
        let adapter = self.resolve(backend_id)?;
        debug!(
            "Dispatching {} page(s) to {} ({})",
            request.pages().len(),
            adapter.backend_id(),
            model
        );
        let label = adapter
            .classify(api_key, request.instruction(), request.pages(), model)
            .await?;
        Ok(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackendError;
    use crate::pipeline::encode::EncodedPage;
    use async_trait::async_trait;

    struct FixedLabel(&'static str);

    #[async_trait]
    impl Classifier for FixedLabel {
        fn backend_id(&self) -> &str {
            self.0
        }

        async fn classify(
            &self,
            _api_key: &str,
            _instruction: &str,
            pages: &[EncodedPage],
            model: &str,
        ) -> Result<String, BackendError> {
            Ok(format!("{}:{}:{}", self.0, model, pages.len()))
        }
    }

    fn request() -> ClassificationRequest {
        ClassificationRequest::build(Arc::from("classify"), &[])
    }

    #[tokio::test]
    async fn routes_identifiers_case_insensitively() {
        let mut d = Dispatcher::new();
        d.register("openai", Arc::new(FixedLabel("openai")));
        d.register("Gemini", Arc::new(FixedLabel("gemini")));

        for id in ["OpenAI", "openai", " openai ", "OPENAI\n"] {
            let label = d.dispatch(id, "k", &request(), "m").await.unwrap();
            assert_eq!(label, "openai:m:0", "id {id:?}");
        }
        let label = d.dispatch("gemini", "k", &request(), "m").await.unwrap();
        assert_eq!(label, "gemini:m:0");
    }

    #[tokio::test]
    async fn unknown_identifier_is_unsupported_backend() {
        let mut d = Dispatcher::new();
        d.register("openai", Arc::new(FixedLabel("openai")));

        let err = d.dispatch(" foo ", "k", &request(), "m").await.unwrap_err();
        assert!(matches!(err, ClassifyError::UnsupportedBackend { ref name } if name == "foo"));
        assert!(!err.is_per_file());
    }

    #[test]
    fn builtin_registers_every_backend() {
        let d = Dispatcher::builtin(HttpClient::new(5).unwrap());
        assert_eq!(d.backends(), vec!["anthropic", "gemini", "openai"]);
        for b in Backend::ALL {
            assert_eq!(d.resolve(b.as_str()).unwrap().backend_id(), b.as_str());
        }
    }

    #[test]
    fn for_config_keeps_all_backends_with_base_url_override() {
        let config = ClassifierConfig::builder(Backend::Anthropic)
            .api_key("k")
            .base_url("http://127.0.0.1:9/v1")
            .build()
            .unwrap();
        let d = Dispatcher::for_config(&config).unwrap();
        assert_eq!(d.backends().len(), 3);
        assert_eq!(d.resolve("anthropic").unwrap().backend_id(), "anthropic");
    }
}
