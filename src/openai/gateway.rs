use std::time::Duration;

use async_trait::async_trait;

use super::core::completion;
use crate::chat::{CompletionRequest, ModelGateway, RequestShape};
use crate::core::{AppConfig, ErrorKind};

/// `ModelGateway` backed by an OpenAI compatible chat completions
/// API. Vision requests can be routed to a separate model.
#[derive(Clone, Debug)]
pub struct OpenAiGateway {
    client: reqwest::Client,
    api_hostname: String,
    api_key: String,
    model: String,
    vision_model: String,
    timeout: Duration,
}

impl OpenAiGateway {
    pub fn new(api_hostname: &str, api_key: &str, model: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_hostname: api_hostname.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            vision_model: model.to_string(),
            timeout: Duration::from_secs(120),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            &config.openai_api_hostname,
            &config.openai_api_key,
            &config.openai_model,
        )
        .vision_model(&config.openai_vision_model)
        .timeout(config.request_timeout)
    }

    pub fn vision_model(mut self, model: &str) -> Self {
        self.vision_model = model.to_string();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn model_for(&self, shape: RequestShape) -> &str {
        match shape {
            RequestShape::Text => &self.model,
            RequestShape::Vision => &self.vision_model,
        }
    }
}

#[async_trait]
impl ModelGateway for OpenAiGateway {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ErrorKind> {
        let model = self.model_for(request.shape);
        tracing::debug!(
            "Requesting completion from {} ({:?}, {} messages)",
            model,
            request.shape,
            request.messages.len()
        );
        completion(
            &self.client,
            &request.messages,
            &self.api_hostname,
            &self.api_key,
            model,
            self.timeout,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::chat::{ImageRef, Turn, assemble};
    use crate::vision::{ImageEncoding, ImagePayload};

    const REPLY: &str = r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"Looks like a stage 2 pressure injury."},"finish_reason":"stop"}]}"#;

    #[tokio::test]
    async fn test_text_requests_use_text_model() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_body(mockito::Matcher::PartialJson(json!({"model": "gpt-4o-mini"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(REPLY)
            .create_async()
            .await;

        let gateway = OpenAiGateway::new(&server.url(), "test-key", "gpt-4o-mini")
            .vision_model("gpt-4o");
        let request = assemble("instruction", &[], &Turn::user("Hi"), None);
        let reply = gateway.complete(&request).await.unwrap();

        mock.assert_async().await;
        assert_eq!(reply, "Looks like a stage 2 pressure injury.");
    }

    #[tokio::test]
    async fn test_vision_requests_use_vision_model() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_body(mockito::Matcher::PartialJson(json!({
                "model": "gpt-4o",
                "messages": [
                    {"role": "system", "content": "instruction"},
                    {"role": "user", "content": [
                        {"type": "text", "text": "Stage this"},
                        {"type": "image_url", "image_url": {"url": "data:image/jpeg;base64,/9j/"}}
                    ]}
                ]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(REPLY)
            .create_async()
            .await;

        let image = ImagePayload {
            bytes: vec![0xff, 0xd8, 0xff],
            encoding: ImageEncoding::Jpeg,
            width: 1,
            height: 1,
        };
        let turn = Turn::user_with_image("Stage this", ImageRef::from_payload(&image, None));
        let request = assemble("instruction", &[], &turn, Some(&image));

        let gateway = OpenAiGateway::new(&server.url(), "test-key", "gpt-4o-mini")
            .vision_model("gpt-4o");
        assert!(gateway.complete(&request).await.is_ok());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_provider_failure() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(500)
            .with_body(r#"{"error":{"message":"The server had an error"}}"#)
            .create_async()
            .await;

        let gateway = OpenAiGateway::new(&server.url(), "test-key", "gpt-4o");
        let request = assemble("instruction", &[], &Turn::user("Hi"), None);
        assert_eq!(
            gateway.complete(&request).await,
            Err(ErrorKind::GatewayFailure(
                "provider error (500): The server had an error".to_string()
            ))
        );
        mock.assert_async().await;
    }
}
