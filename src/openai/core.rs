use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::core::ErrorKind;

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "system")]
    System,
    #[serde(rename = "assistant")]
    Assistant,
    #[serde(rename = "user")]
    User,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct ImageUrl {
    pub url: String,
}

// {"type": "text", "text": "What is in this image?"}
// {"type": "image_url", "image_url": {"url": "data:image/jpeg;base64,..."}}
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

impl ContentPart {
    pub fn text(text: &str) -> Self {
        ContentPart::Text {
            text: text.to_string(),
        }
    }

    pub fn image_url(url: &str) -> Self {
        ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: url.to_string(),
            },
        }
    }
}

/// Message content is a plain string for text requests and a list
/// of typed parts for vision requests.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: MessageContent,
}

impl Message {
    pub fn new(role: Role, content: &str) -> Self {
        Message {
            role,
            content: MessageContent::Text(content.to_string()),
        }
    }

    pub fn new_with_parts(role: Role, parts: Vec<ContentPart>) -> Self {
        Message {
            role,
            content: MessageContent::Parts(parts),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    refusal: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

// {"error": {"message": "Incorrect API key provided", "type": "invalid_request_error", ...}}
#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

fn provider_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

fn status_failure(status: StatusCode, body: &str) -> ErrorKind {
    let message = provider_message(body);
    let reason = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            format!("authentication failed: {}", message)
        }
        StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND | StatusCode::UNPROCESSABLE_ENTITY => {
            format!("request rejected: {}", message)
        }
        _ => format!("provider error ({}): {}", status.as_u16(), message),
    };
    ErrorKind::GatewayFailure(reason)
}

fn transport_failure(err: reqwest::Error, timeout: Duration) -> ErrorKind {
    if err.is_timeout() {
        ErrorKind::GatewayFailure(format!(
            "request failed: timed out after {}s",
            timeout.as_secs()
        ))
    } else {
        ErrorKind::GatewayFailure(format!("request failed: {}", err))
    }
}

/// Requests a single, non-streaming chat completion and returns the
/// reply text.
pub async fn completion(
    client: &reqwest::Client,
    messages: &[Message],
    api_hostname: &str,
    api_key: &str,
    model: &str,
    timeout: Duration,
) -> Result<String, ErrorKind> {
    let payload = json!({
        "model": model,
        "messages": messages,
    });
    let url = format!("{}/v1/chat/completions", api_hostname.trim_end_matches("/"));
    let response = client
        .post(url)
        .bearer_auth(api_key)
        .header("Content-Type", "application/json")
        .timeout(timeout)
        .json(&payload)
        .send()
        .await
        .map_err(|e| transport_failure(e, timeout))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| transport_failure(e, timeout))?;

    if !status.is_success() {
        tracing::warn!("Completion request returned {}: {}", status, body);
        return Err(status_failure(status, &body));
    }

    let resp = serde_json::from_str::<CompletionResponse>(&body)
        .map_err(|e| ErrorKind::GatewayFailure(format!("unexpected response: {}", e)))?;
    let message = resp
        .choices
        .into_iter()
        .next()
        .map(|c| c.message)
        .ok_or_else(|| ErrorKind::GatewayFailure("model returned no content".to_string()))?;

    match message {
        ResponseMessage {
            refusal: Some(refusal),
            ..
        } => Err(ErrorKind::GatewayFailure(format!(
            "model declined: {}",
            refusal
        ))),
        ResponseMessage {
            content: Some(content),
            ..
        } if !content.trim().is_empty() => Ok(content),
        _ => Err(ErrorKind::GatewayFailure(
            "model returned no content".to_string(),
        )),
    }
}
