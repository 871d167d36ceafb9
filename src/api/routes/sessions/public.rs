//! Public types for the sessions API
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chat::Turn;

#[derive(Serialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub turns: Vec<Turn>,
}

#[derive(Deserialize)]
pub struct MessageRequest {
    pub message: String,
}

/// Reply to a submission along with the updated log
#[derive(Serialize)]
pub struct ExchangeResponse {
    pub reply: String,
    pub turns: Vec<Turn>,
}
