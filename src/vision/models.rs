// Wire types for the chat-completions vision endpoint and the records we
// persist for each analysed image.

use serde::{Deserialize, Serialize};

#[derive(Serialize, Debug)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
}

#[derive(Serialize, Debug)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: Vec<ContentPart>,
}

#[derive(Serialize, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize, Debug, PartialEq)]
pub struct ImageUrl {
    pub url: String,
}

#[derive(Deserialize, Debug)]
pub struct ChatCompletionResponse {
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Deserialize, Debug)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Deserialize, Debug)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// Token accounting as reported by the API.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

/// Outcome for one image. Exactly one of `response` / `error` is set.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AnalysisRecord {
    pub success: bool,
    /// File name of the analysed image
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<serde_json::Value>,
}

impl AnalysisRecord {
    pub fn succeeded(image: &str, response: String, model: String, usage: Option<Usage>) -> Self {
        Self {
            success: true,
            image: image.to_string(),
            response: Some(response),
            model: Some(model),
            usage,
            error: None,
            raw_response: None,
        }
    }

    pub fn failed(image: &str, error: impl Into<String>) -> Self {
        Self {
            success: false,
            image: image.to_string(),
            response: None,
            model: None,
            usage: None,
            error: Some(error.into()),
            raw_response: None,
        }
    }

    /// The API answered but without any choice to read text from.
    pub fn malformed(image: &str, raw: serde_json::Value) -> Self {
        Self {
            raw_response: Some(raw),
            ..Self::failed(image, "Invalid response format")
        }
    }

    pub fn total_tokens(&self) -> u64 {
        self.usage.map(|u| u.total_tokens).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_matches_chat_completions_shape() {
        let req = ChatRequest {
            model: "gpt-4o",
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    ContentPart::Text { text: "count".into() },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: "data:image/jpeg;base64,AAAA".into(),
                        },
                    },
                ],
            }],
            max_tokens: 500,
        };

        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "model": "gpt-4o",
                "messages": [{
                    "role": "user",
                    "content": [
                        {"type": "text", "text": "count"},
                        {"type": "image_url", "image_url": {"url": "data:image/jpeg;base64,AAAA"}}
                    ]
                }],
                "max_tokens": 500
            })
        );
    }

    #[test]
    fn failure_record_omits_success_fields() {
        let value = serde_json::to_value(AnalysisRecord::failed("a.jpg", "timeout")).unwrap();
        assert_eq!(
            value,
            json!({"success": false, "image": "a.jpg", "error": "timeout"})
        );
    }

    #[test]
    fn response_without_usage_parses() {
        let resp: ChatCompletionResponse = serde_json::from_value(json!({
            "model": "gpt-4o-2024-08-06",
            "choices": [{"message": {"role": "assistant", "content": "2 apples"}}]
        }))
        .unwrap();
        assert_eq!(resp.choices[0].message.content.as_deref(), Some("2 apples"));
        assert!(resp.usage.is_none());
    }
}
