// Blocking client for an OpenAI-compatible chat-completions endpoint. One
// request per image, no retries.

use super::models::{
    AnalysisRecord, ChatCompletionResponse, ChatMessage, ChatRequest, ContentPart, ImageUrl,
};
use crate::config::VisionConfig;
use crate::error::{Error, Result};
use base64::Engine as _;
use reqwest::blocking::Client;
use std::path::Path;
use std::time::Duration;

/// Holds the HTTP client, the endpoint and the bearer key.
#[derive(Clone)]
pub struct VisionClient {
    client: Client,
    endpoint: String,
    model: String,
    max_tokens: u32,
    api_key: String,
}

impl VisionClient {
    pub fn from_config(config: &VisionConfig, api_key: &str) -> Result<Self> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(Error::EmptyApiKey);
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(VisionClient {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            api_key: api_key.to_string(),
        })
    }

    /// Send one image with `prompt`. Transport and decode errors are returned
    /// as `Err`; an HTTP error status or a reply without choices becomes a
    /// failed record.
    pub fn analyze(&self, image_path: &Path, prompt: &str) -> Result<AnalysisRecord> {
        let image_name = display_name(image_path);
        let data_url = encode_data_url(image_path)?;

        let payload = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    ContentPart::Text {
                        text: prompt.to_string(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl { url: data_url },
                    },
                ],
            }],
            max_tokens: self.max_tokens,
        };

        tracing::debug!(image = %image_name, endpoint = %self.endpoint, "sending vision request");
        let res = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()?;

        let status = res.status();
        if !status.is_success() {
            let txt = res.text().unwrap_or_default();
            tracing::warn!(image = %image_name, %status, "vision request rejected");
            return Ok(AnalysisRecord::failed(
                &image_name,
                format!("{} - {}", status, txt),
            ));
        }

        let raw: serde_json::Value = res.json()?;
        record_from_response(&image_name, &self.model, raw)
    }
}

/// Interpret a decoded response body.
pub fn record_from_response(
    image_name: &str,
    requested_model: &str,
    raw: serde_json::Value,
) -> Result<AnalysisRecord> {
    let parsed: ChatCompletionResponse = serde_json::from_value(raw.clone())?;
    let content = parsed
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content.unwrap_or_default());

    Ok(match content {
        Some(text) => AnalysisRecord::succeeded(
            image_name,
            text,
            parsed.model.unwrap_or_else(|| requested_model.to_string()),
            parsed.usage,
        ),
        None => AnalysisRecord::malformed(image_name, raw),
    })
}

/// `data:<mime>;base64,<payload>` for a local image file.
pub fn encode_data_url(image_path: &Path) -> Result<String> {
    let bytes = std::fs::read(image_path)?;
    let mime = mime_guess::from_path(image_path)
        .first_raw()
        .unwrap_or("image/jpeg");
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    Ok(format!("data:{mime};base64,{encoded}"))
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
