//! Test utilities for integration tests
#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use tower::util::ServiceExt;

use woundbot::api::AppState;
use woundbot::api::app;
use woundbot::chat::{CompletionRequest, ModelGateway};
use woundbot::core::{AppConfig, ErrorKind};
use woundbot::export::GlyphPolicy;

pub const BOUNDARY: &str = "woundbot-test-boundary";

/// Stands in for the hosted model. Replies are taken from a script
/// (falling back to a fixed reply) and every request is recorded.
#[derive(Default)]
pub struct ScriptedGateway {
    replies: Mutex<VecDeque<Result<String, ErrorKind>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedGateway {
    pub fn new(replies: Vec<Result<String, ErrorKind>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelGateway for ScriptedGateway {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ErrorKind> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("Keep the wound moist and covered.".to_string()))
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        openai_model: String::from("gpt-4o"),
        openai_vision_model: String::from("gpt-4o"),
        openai_api_hostname: String::from("http://localhost:0"),
        openai_api_key: String::from("test-api-key"),
        system_message: String::from("You are a wound care expert."),
        request_timeout: Duration::from_secs(5),
        max_upload_bytes: 1024 * 1024,
        session_idle_timeout: Duration::from_secs(3600),
        export_glyph_policy: GlyphPolicy::Substitute,
        export_file_name: String::from("WoundCareChat.pdf"),
    }
}

/// Creates a test application router backed by `gateway`
pub fn test_app(gateway: Arc<ScriptedGateway>) -> Router {
    test_app_with_config(gateway, test_config())
}

pub fn test_app_with_config(gateway: Arc<ScriptedGateway>, config: AppConfig) -> Router {
    let app_state = AppState::new(config, gateway);
    app(Arc::new(RwLock::new(app_state)))
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    String::from_utf8_lossy(&bytes).to_string()
}

pub async fn body_to_json(body: Body) -> serde_json::Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Creates a session through the API and returns its ID
pub async fn create_session(app: &Router) -> String {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/sessions")
                .method("POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_to_json(response.into_body()).await;
    json["session_id"].as_str().unwrap().to_string()
}

pub fn message_request(session_id: &str, message: &str) -> Request<Body> {
    Request::builder()
        .uri(format!("/api/sessions/{}/messages", session_id))
        .method("POST")
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::json!({ "message": message }).to_string(),
        ))
        .unwrap()
}

pub fn png_bytes() -> Vec<u8> {
    let img = RgbImage::from_pixel(10, 10, Rgb([180, 60, 60]));
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

/// Builds a multipart/form-data body with a `file` field and an
/// optional `message` field
pub fn multipart_body(file: &[u8], file_name: &str, caption: Option<&str>) -> Vec<u8> {
    let mut body = Vec::new();
    if let Some(caption) = caption {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"message\"\r\n\r\n{caption}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(file);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn image_request(session_id: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .uri(format!("/api/sessions/{}/images", session_id))
        .method("POST")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}
