use crate::config::DEFAULT_MODEL;
use crate::error::{Result, SummarizerError};
use crate::llm::types::*;
use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: GEMINI_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Points the client at a different endpoint (proxies, local mocks).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub(crate) async fn generate_content(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let payload = GenerateContentRequest {
            contents: vec![Content::user(prompt)],
            generation_config: GenerationConfig::json(),
        };

        info!(
            "Requesting structured extraction from {} ({} prompt chars)",
            self.model,
            prompt.len()
        );

        let res = self.client.post(&url).json(&payload).send().await?;
        let status = res.status();

        if !status.is_success() {
            let err_text = res.text().await?;
            return Err(SummarizerError::Network(format!(
                "Gemini API Error (status {}): {}",
                status, err_text
            )));
        }

        let body: GenerateContentResponse = res.json().await?;

        match body.first_text() {
            Some(text) => {
                debug!("Gemini returned {} chars", text.len());
                Ok(text)
            }
            None => {
                let reason = body
                    .candidates
                    .as_ref()
                    .and_then(|c| c.first())
                    .and_then(|c| c.finish_reason.clone())
                    .unwrap_or_else(|| "no candidates returned".to_string());
                Err(SummarizerError::Network(format!(
                    "Gemini returned no text ({})",
                    reason
                )))
            }
        }
    }
}

#[async_trait]
impl ContentGenerator for GeminiClient {
    async fn generate_json(&self, prompt: &str) -> Result<String> {
        self.generate_content(prompt).await
    }
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides() {
        let client = GeminiClient::new("secret".to_string())
            .with_model("gemini-2.5-flash")
            .with_base_url("http://localhost:8080/v1beta/");
        assert_eq!(client.model(), "gemini-2.5-flash");

        let debug = format!("{:?}", client);
        assert!(debug.contains("http://localhost:8080/v1beta"));
        assert!(!debug.contains("secret"));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        let client =
            GeminiClient::new("key".to_string()).with_base_url("http://127.0.0.1:9/v1beta");
        let err = client.generate_json("prompt").await.unwrap_err();
        assert!(matches!(err, SummarizerError::Network(_)));
    }
}
