use serde::{Deserialize, Serialize};

/// Body of a chat-completion call.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: MessageContent,
}

/// Plain text for text-only calls, typed parts when an image rides along.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

impl ChatRequest {
    /// Single user message carrying the prompt and the image in the same turn.
    pub fn vision(
        model: &str,
        prompt: String,
        image_url: String,
        max_tokens: u32,
        temperature: f32,
    ) -> Self {
        Self {
            model: model.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: MessageContent::Parts(vec![
                    ContentPart::Text { text: prompt },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl { url: image_url },
                    },
                ]),
            }],
            max_tokens,
            temperature,
        }
    }

    pub fn text(model: &str, prompt: String, max_tokens: u32, temperature: f32) -> Self {
        Self {
            model: model.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: MessageContent::Text(prompt),
            }],
            max_tokens,
            temperature,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: Option<ResponseMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage {
    pub content: Option<String>,
}

impl ChatResponse {
    /// `choices[0].message.content`, if the provider sent it.
    pub fn into_first_content(self) -> Option<String> {
        self.choices.into_iter().next()?.message?.content
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vision_request_shape() {
        let request = ChatRequest::vision(
            "google/gemma-3-27b-it:free",
            "analyze".to_string(),
            "data:image/png;base64,AAAA".to_string(),
            2000,
            0.7,
        );
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "google/gemma-3-27b-it:free");
        assert_eq!(json["max_tokens"], 2000);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"][0]["type"], "text");
        assert_eq!(json["messages"][0]["content"][0]["text"], "analyze");
        assert_eq!(json["messages"][0]["content"][1]["type"], "image_url");
        assert_eq!(
            json["messages"][0]["content"][1]["image_url"]["url"],
            "data:image/png;base64,AAAA"
        );
    }

    #[test]
    fn test_text_request_shape() {
        let request = ChatRequest::text("m", "hello".to_string(), 50, 0.1);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["content"], "hello");
    }

    #[test]
    fn test_first_content() {
        let response: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"role":"assistant","content":"hi"}}]}"#).unwrap();
        assert_eq!(response.into_first_content(), Some("hi".to_string()));

        let response: ChatResponse = serde_json::from_str(r#"{"error":{"message":"rate limited"}}"#).unwrap();
        assert_eq!(response.into_first_content(), None);

        let response: ChatResponse = serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap();
        assert_eq!(response.into_first_content(), None);
    }
}
