//! Generative model boundary.
//!
//! A [`ChatModel`] turns an ordered list of role-tagged messages into zero or
//! more completions. The answerer only ever reads the first one.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::GenerationError;

/// Model used when nothing else is configured.
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4-turbo";

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Instruction to the model.
    System,
    /// End-user input.
    User,
}

/// One message of a generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// One candidate answer from the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    /// Generated text; absent when the model produced none.
    pub content: Option<String>,

    /// Why generation stopped, as reported by the provider.
    pub finish_reason: Option<String>,
}

impl Completion {
    /// A finished completion carrying `content`.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            finish_reason: Some("stop".to_string()),
        }
    }
}

/// Trait for generative model providers.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Get the name of this provider.
    fn name(&self) -> &str;

    /// Generate completions for `messages`, in provider order.
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
    ) -> Result<Vec<Completion>, GenerationError>;
}

/// OpenAI-compatible chat completions provider.
pub struct OpenAIChatModel {
    /// API key, sent as a bearer token when present.
    api_key: Option<String>,

    /// API base URL, without the trailing `/chat/completions`.
    base_url: String,

    /// HTTP client.
    client: reqwest::Client,

    /// Model to request.
    model: String,
}

impl OpenAIChatModel {
    /// Create a provider for the server at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            api_key: None,
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            model: DEFAULT_CHAT_MODEL.to_string(),
        }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Use a preconfigured HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

#[async_trait]
impl ChatModel for OpenAIChatModel {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
    ) -> Result<Vec<Completion>, GenerationError> {
        debug!(
            "Requesting chat completion with model {} ({} messages)",
            self.model,
            messages.len()
        );

        let body = serde_json::json!({
            "model": self.model,
            "messages": messages,
        });

        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Content-Type", "application/json")
            .json(&body);
        if let Some(api_key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {api_key}"));
        }

        let response = builder.send().await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);

            return Err(GenerationError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(GenerationError::ApiRequest(format!(
                "API error ({status}): {error_text}"
            )));
        }

        let bytes = response.bytes().await?;
        let result: OpenAIChatResponse = serde_json::from_slice(&bytes)?;

        let completions: Vec<Completion> = result
            .choices
            .into_iter()
            .map(|choice| Completion {
                content: choice.message.and_then(|m| m.content),
                finish_reason: choice.finish_reason,
            })
            .collect();

        info!("Received {} completions", completions.len());
        Ok(completions)
    }
}

/// OpenAI chat completions response format.
#[derive(Debug, Deserialize)]
struct OpenAIChatResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: Option<OpenAIChoiceMessage>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoiceMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_messages_serialize_with_lowercase_roles() {
        let json = serde_json::to_value(vec![
            ChatMessage::system("be nice"),
            ChatMessage::user("hi"),
        ])
        .unwrap();

        assert_eq!(
            json,
            serde_json::json!([
                { "role": "system", "content": "be nice" },
                { "role": "user", "content": "hi" }
            ])
        );
    }

    #[tokio::test]
    async fn test_complete_posts_messages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer sk-chat"))
            .and(body_json(serde_json::json!({
                "model": "gpt-4-turbo",
                "messages": [
                    { "role": "system", "content": "sys" },
                    { "role": "user", "content": "question" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "chatcmpl-1",
                "choices": [
                    {
                        "index": 0,
                        "message": { "role": "assistant", "content": "The sky is blue." },
                        "finish_reason": "stop"
                    },
                    {
                        "index": 1,
                        "message": { "role": "assistant", "content": null },
                        "finish_reason": "length"
                    }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let model = OpenAIChatModel::new(format!("{}/v1/", server.uri())).with_api_key("sk-chat");
        let completions = model
            .complete(vec![ChatMessage::system("sys"), ChatMessage::user("question")])
            .await
            .unwrap();

        assert_eq!(
            completions,
            vec![
                Completion::text("The sky is blue."),
                Completion {
                    content: None,
                    finish_reason: Some("length".to_string()),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_complete_without_choices_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "chatcmpl-2"
            })))
            .mount(&server)
            .await;

        let model = OpenAIChatModel::new(server.uri());
        let completions = model.complete(vec![ChatMessage::user("hi")]).await.unwrap();

        assert!(completions.is_empty());
    }

    #[tokio::test]
    async fn test_complete_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let model = OpenAIChatModel::new(server.uri());
        let err = model
            .complete(vec![ChatMessage::user("hi")])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            GenerationError::RateLimited {
                retry_after_secs: 60
            }
        ));
    }

    #[tokio::test]
    async fn test_complete_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let model = OpenAIChatModel::new(server.uri()).with_model("local-model");
        let err = model
            .complete(vec![ChatMessage::user("hi")])
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::ApiRequest(ref msg) if msg.contains("overloaded")));
    }
}
