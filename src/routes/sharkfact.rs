//! Chat webhook handler.

use axum::{extract::State, Extension, Json};
use tracing::instrument;

use crate::middleware::RequestId;
use crate::selector::{self, FactResponse, FormatMode};
use crate::state::AppState;

/// Answers `POST /sharkfact` with a random fact as a webhook message.
///
/// The request body is ignored and there is no failure path: the fact store
/// is non-empty by construction.
#[instrument(name = "routes::sharkfact", skip(state, request_id))]
pub async fn sharkfact(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> Json<FactResponse> {
    let response = selector::pick(&state.facts, FormatMode::Json, &mut rand::thread_rng());
    tracing::debug!(request_id = %request_id.0, fact = response.text().trim_end(), "Picked fact");
    Json(response)
}
