use crate::{
    parse_reply, prompt, sniff_mime_type, EstimateError, EstimateRequest, EstimateTarget,
    RoofEstimator,
};
use base64::{engine::general_purpose, Engine as _};
use panel_layout::{AnalysisMode, Estimation};
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};

const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const MAX_TOKENS: u32 = 4000;

/// Roof estimator backed by an OpenAI-compatible vision chat model.
pub struct VisionEstimator {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
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

impl VisionEstimator {
    /// # Arguments
    /// * `api_key` - OpenAI API key
    /// * `model` - Model to use (default: "gpt-4o")
    pub fn new(api_key: String, model: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point at another OpenAI-compatible endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Reads `OPENAI_API_KEY`, plus optional `OPENAI_MODEL` and `OPENAI_BASE_URL`.
    pub fn from_env() -> Result<Self, EstimateError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| EstimateError::MissingCredential("OPENAI_API_KEY"))?;
        let estimator = Self::new(api_key, std::env::var("OPENAI_MODEL").ok());
        Ok(match std::env::var("OPENAI_BASE_URL") {
            Ok(url) => estimator.with_base_url(url),
            Err(_) => estimator,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body(&self, prompt: &str, image: &[u8]) -> serde_json::Value {
        let image_url = format!(
            "data:{};base64,{}",
            sniff_mime_type(image),
            general_purpose::STANDARD.encode(image)
        );

        let mut body = serde_json::json!({
            "model": self.model.clone(),
            "messages": vec![serde_json::json!({
                "role": "user",
                "content": vec![
                    serde_json::json!({
                        "type": "text",
                        "text": prompt
                    }),
                    serde_json::json!({
                        "type": "image_url",
                        "image_url": {
                            "url": image_url
                        }
                    })
                ]
            })]
        });

        // Newer models take max_completion_tokens instead of max_tokens
        if self.model.starts_with("gpt-5") || self.model.starts_with("o1") {
            body["max_completion_tokens"] = serde_json::json!(MAX_TOKENS);
        } else {
            body["max_tokens"] = serde_json::json!(MAX_TOKENS);
        }
        body
    }
}

impl RoofEstimator for VisionEstimator {
    async fn estimate(&self, request: EstimateRequest<'_>) -> Result<Estimation, EstimateError> {
        let (mode, prompt) = match request.target {
            EstimateTarget::PanelCount { roof, panel } => {
                (AnalysisMode::PanelCount, prompt::panel_count_prompt(roof, panel))
            }
            EstimateTarget::Zones { grid } => (AnalysisMode::ZoneDetection, prompt::zone_prompt(grid)),
        };
        let body = self.request_body(&prompt, request.image);

        info!(
            "Sending {:?} estimation request (model: {}, image: {} bytes)",
            mode,
            self.model,
            request.image.len()
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            warn!("Estimation service error: {} - {}", status, error_text);
            return Err(EstimateError::Upstream {
                status: status.as_u16(),
                body: error_text,
            });
        }

        let api_response: OpenAIResponse = response.json().await?;
        let content = api_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(EstimateError::EmptyResponse)?;

        let estimation = parse_reply(mode, &content).inspect_err(|e| {
            warn!("Could not parse estimation reply: {}. Response: {}", e, content);
        })?;

        info!(
            "Estimation complete: rooftop={}, cap={:?}",
            estimation.is_rooftop(),
            estimation.panel_cap()
        );
        Ok(estimation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_for_classic_model() {
        let estimator = VisionEstimator::new("key".to_string(), None);
        let body = estimator.request_body("prompt", &[0xFF, 0xD8, 0xFF, 0xE0]);

        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["max_tokens"], MAX_TOKENS);
        assert!(body.get("max_completion_tokens").is_none());
        assert_eq!(body["messages"][0]["content"][0]["text"], "prompt");
        let url = body["messages"][0]["content"][1]["image_url"]["url"]
            .as_str()
            .unwrap();
        assert!(url.starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn test_request_body_for_reasoning_model() {
        let estimator = VisionEstimator::new("key".to_string(), Some("o1-preview".to_string()));
        let body = estimator.request_body("prompt", b"");

        assert_eq!(body["max_completion_tokens"], MAX_TOKENS);
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let estimator =
            VisionEstimator::new("key".to_string(), None).with_base_url("http://localhost:8089/v1/");

        assert_eq!(estimator.base_url, "http://localhost:8089/v1");
        assert_eq!(estimator.model(), DEFAULT_MODEL);
    }
}
