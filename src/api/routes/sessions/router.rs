//! Router for the sessions API

use std::sync::{Arc, RwLock};

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};

use super::public;
use crate::api::public::ApiError;
use crate::api::state::{AppState, SessionHandle};
use crate::chat::ModelGateway;

type SharedState = Arc<RwLock<AppState>>;

fn find_session(state: &SharedState, id: &str) -> Result<SessionHandle, ApiError> {
    state
        .read()
        .expect("Unable to read share state")
        .session(id)
        .ok_or_else(|| ApiError::NotFound(format!("Session {} not found", id)))
}

fn session_and_gateway(
    state: &SharedState,
    id: &str,
) -> Result<(SessionHandle, Arc<dyn ModelGateway>), ApiError> {
    let session = find_session(state, id)?;
    let gateway = state
        .read()
        .expect("Unable to read share state")
        .gateway
        .clone();
    Ok((session, gateway))
}

/// Start a new, empty session
async fn create_session(State(state): State<SharedState>) -> impl IntoResponse {
    let session_id = state
        .write()
        .expect("Unable to write share state")
        .create_session();
    (
        StatusCode::CREATED,
        Json(public::CreateSessionResponse { session_id }),
    )
}

/// Get the conversation log of a session
async fn get_session(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<public::SessionResponse>, ApiError> {
    let session = find_session(&state, &id)?;
    let session = session.lock().await;
    Ok(Json(public::SessionResponse {
        session_id: session.id().to_string(),
        created_at: session.created_at(),
        turns: session.turns().to_vec(),
    }))
}

/// End a session and drop its log
async fn delete_session(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let removed = state
        .write()
        .expect("Unable to write share state")
        .remove_session(&id);
    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Session {} not found", id)))
    }
}

/// Send a text message and wait for the reply
async fn send_message(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(payload): Json<public::MessageRequest>,
) -> Result<Json<public::ExchangeResponse>, ApiError> {
    let (session, gateway) = session_and_gateway(&state, &id)?;
    let mut session = session.lock().await;
    let reply = session.submit(gateway.as_ref(), &payload.message).await?;
    Ok(Json(public::ExchangeResponse {
        reply,
        turns: session.turns().to_vec(),
    }))
}

/// Upload an image (multipart field `file`) with an optional
/// `message` caption and wait for the reply
async fn send_image(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<public::ExchangeResponse>, ApiError> {
    let (session, gateway) = session_and_gateway(&state, &id)?;

    let mut upload: Option<(Vec<u8>, Option<String>)> = None;
    let mut caption = String::new();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().map(String::from);
                let data = field.bytes().await?;
                upload = Some((data.to_vec(), file_name));
            }
            "message" => caption = field.text().await?,
            other => tracing::debug!("Ignoring upload field {}", other),
        }
    }
    let (bytes, file_name) =
        upload.ok_or_else(|| ApiError::BadRequest("Missing file field".to_string()))?;

    let mut session = session.lock().await;
    let reply = session
        .submit_image(gateway.as_ref(), &caption, &bytes, file_name.as_deref())
        .await?;
    Ok(Json(public::ExchangeResponse {
        reply,
        turns: session.turns().to_vec(),
    }))
}

/// Clear the conversation log
async fn reset_session(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let session = find_session(&state, &id)?;
    session.lock().await.reset();
    Ok(StatusCode::NO_CONTENT)
}

/// Download the transcript as a PDF
async fn export_session(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let session = find_session(&state, &id)?;
    let (policy, file_name) = {
        let shared_state = state.read().expect("Unable to read share state");
        (
            shared_state.config.export_glyph_policy,
            shared_state.config.export_file_name.clone(),
        )
    };

    let pdf = session.lock().await.export(policy)?;
    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file_name),
        ),
    ];
    Ok((headers, pdf))
}

/// Create the sessions router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", post(create_session))
        .route("/{id}", get(get_session).delete(delete_session))
        .route("/{id}/messages", post(send_message))
        .route("/{id}/images", post(send_image))
        .route("/{id}/reset", post(reset_session))
        .route("/{id}/export", get(export_session))
}
