//! Chat endpoint running the answering pipeline

use axum::{extract::State, Json};

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{ChatRequest, ChatResponse};

/// POST /api/chat/ - Answer one question about the subject
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    let question = request
        .question()
        .ok_or_else(|| Error::validation("No question provided."))?;

    let answer = state.pipeline().answer_question(question, &[]).await?;

    Ok(Json(ChatResponse { answer }))
}
