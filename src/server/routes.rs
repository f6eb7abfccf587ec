//! HTTP route handlers for the paper feed API.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::feed::core::errors::FeedError;
use crate::feed::core::paper::PaperSummary;

use super::error::ApiError;
use super::state::AppState;

/// Create the API router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/update-interests", post(update_interests))
        // `get` also answers HEAD, with the body stripped.
        .route("/papers", get(fetch_papers))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "paperfeed",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Interest replacement request.
#[derive(Debug, Deserialize)]
pub struct UpdateInterestsRequest {
    /// User whose interests are replaced.
    pub user_id: String,
    /// New interests, in order.
    #[serde(default)]
    pub research_interests: Vec<String>,
}

/// Interest replacement acknowledgement.
#[derive(Debug, Serialize)]
pub struct UpdateInterestsResponse {
    /// Always `"ok"`.
    pub status: &'static str,
    /// User whose interests were replaced.
    pub user_id: String,
    /// Number of interests stored.
    pub interests: usize,
}

/// Replace a user's interests.
async fn update_interests(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<UpdateInterestsRequest>, JsonRejection>,
) -> Result<Json<UpdateInterestsResponse>, ApiError> {
    let Json(request) =
        payload.map_err(|rejection| FeedError::Validation(rejection.body_text()))?;

    let ack = state
        .engine
        .update_interests(&request.user_id, request.research_interests)
        .await?;

    Ok(Json(UpdateInterestsResponse {
        status: "ok",
        user_id: ack.user_id.into(),
        interests: ack.stored,
    }))
}

/// Query string of the papers endpoint.
#[derive(Debug, Deserialize)]
pub struct PapersQuery {
    /// User to rank papers for.
    pub user_id: Option<String>,
}

/// Ranked papers response.
#[derive(Debug, Serialize)]
pub struct PapersResponse {
    /// Papers in descending relevance order.
    pub papers: Vec<PaperSummary>,
}

/// Rank the corpus for a user.
async fn fetch_papers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PapersQuery>,
) -> Result<Json<PapersResponse>, ApiError> {
    let user_id = query
        .user_id
        .ok_or_else(|| FeedError::Validation("missing user_id query parameter".into()))?;

    let papers = state.engine.fetch_ranked_papers(&user_id).await?;
    Ok(Json(PapersResponse { papers }))
}
