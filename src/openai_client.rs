use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use url::Url;

use crate::error::{Result, ShoppingError};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
        }
    }
}

/// Body of a chat-completion call.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// A chat-completion backend returning the first choice's text.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(&self, api_key: &SecretString, request: &CompletionRequest) -> Result<String>;
}

pub struct OpenAiClient {
    endpoint: Url,
    client: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(endpoint: Url, client: reqwest::Client) -> Self {
        Self { endpoint, client }
    }
}

#[async_trait]
impl ChatCompletion for OpenAiClient {
    async fn complete(&self, api_key: &SecretString, request: &CompletionRequest) -> Result<String> {
        debug!(
            "Sending request to completion API: {}",
            serde_json::to_string_pretty(request).unwrap_or_default()
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(api_key.expose_secret())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!("Completion request failed with status {}: {}", status, body);
            return Err(ShoppingError::Api {
                status: status.as_u16(),
                body,
            });
        }

        debug!("Received response from completion API: {}", body);

        let parsed: CompletionResponse = serde_json::from_str(&body)
            .map_err(|e| ShoppingError::MalformedResponse(format!("completion response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ShoppingError::MalformedResponse("no choices in completion response".to_string()))?
            .message
            .content
            .ok_or_else(|| ShoppingError::MalformedResponse("first choice has no content".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::error::ErrorKind;

    fn client_for(server: &MockServer) -> OpenAiClient {
        let endpoint = Url::parse(&format!("{}/v1/chat/completions", server.uri())).unwrap();
        OpenAiClient::new(endpoint, reqwest::Client::new())
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "gpt-3.5-turbo".to_string(),
            messages: vec![
                ChatMessage::new("system", "be helpful"),
                ChatMessage::new("user", "phones?"),
            ],
            max_tokens: 400,
            temperature: 0.7,
        }
    }

    fn key() -> SecretString {
        SecretString::from("sk-test")
    }

    #[tokio::test]
    async fn posts_request_and_returns_first_choice_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_json(json!({
                "model": "gpt-3.5-turbo",
                "messages": [
                    {"role": "system", "content": "be helpful"},
                    {"role": "user", "content": "phones?"}
                ],
                "max_tokens": 400,
                "temperature": 0.7
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [
                    {"index": 0, "message": {"role": "assistant", "content": "  Here are some great phones...\n"}},
                    {"index": 1, "message": {"role": "assistant", "content": "ignored"}}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = client_for(&server).complete(&key(), &request()).await.unwrap();

        assert_eq!(reply, "  Here are some great phones...\n");
    }

    #[tokio::test]
    async fn rate_limit_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("Rate limit reached"))
            .mount(&server)
            .await;

        let err = client_for(&server).complete(&key(), &request()).await.unwrap_err();

        assert!(matches!(err, ShoppingError::Api { status: 429, .. }));
    }

    #[tokio::test]
    async fn empty_choices_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let err = client_for(&server).complete(&key(), &request()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::MalformedResponse);
    }

    #[tokio::test]
    async fn null_content_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": null}}]
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).complete(&key(), &request()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::MalformedResponse);
    }
}
