//! QUBO compilation endpoint.

use std::sync::Arc;

use axum::{Json, body::Bytes, extract::State};
use qblock_model::QuboResponse;

use super::{compile_request, read_body};
use crate::error::ApiError;
use crate::state::AppState;

/// POST /quantum - Compile a model description into a QUBO.
///
/// The body is read raw so that empty or malformed JSON still produces the
/// fallback QUBO with status 200.
pub async fn quantum(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<QuboResponse>, ApiError> {
    let limits = state.limits;

    let response = tokio::task::spawn_blocking(move || {
        let (request, note) = read_body(&body);
        compile_request(request.as_ref(), note, &limits).to_response()
    })
    .await?;

    Ok(Json(response))
}
