//! Routes for the submission lifecycle.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Json, Router, routing::get, routing::patch, routing::post};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use trackpitch_core::error::DomainError;
use trackpitch_core::store::Page;
use trackpitch_submission::application::{command_handlers, query_handlers};
use trackpitch_submission::domain::commands::{
    CreateSubmission, SubmissionCreatedResult, SubmissionStatusUpdatedResult,
    UpdateSubmissionStatus,
};
use trackpitch_submission::domain::dto::{SubmissionDto, SubmissionStatsDto};
use trackpitch_submission::domain::entities::SubmissionStatus;

use crate::error::ApiError;
use crate::extract::Actor;
use crate::state::AppState;

/// Request body for POST /.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubmissionRequest {
    /// The curator owning the target catalog slot.
    pub curator_user_id: Uuid,
    /// The catalog slot being pitched to.
    pub catalog_item_id: Uuid,
    /// The track being pitched.
    pub track_id: Uuid,
}

/// Request body for PATCH /{catalog_item_id}/{submission_id}/status.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    /// The artist owning the inbox mirror of the submission.
    pub artist_id: Uuid,
    /// The status name to transition into.
    pub status: String,
}

/// Query parameters shared by the listing endpoints.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Optional status name filter.
    pub status: Option<String>,
    /// Number of items to skip.
    #[serde(default)]
    pub offset: i64,
    /// Maximum number of items to return.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    50
}

impl ListQuery {
    fn page(&self) -> Page {
        Page {
            offset: self.offset,
            limit: self.limit,
        }
    }

    fn status(&self) -> Result<Option<SubmissionStatus>, ApiError> {
        self.status.as_deref().map_or(Ok(None), |raw| {
            SubmissionStatus::parse(raw)
                .map(Some)
                .ok_or_else(|| ApiError::InvalidStatus(raw.to_string()))
        })
    }
}

/// POST /
#[instrument(skip(state, actor, request), fields(catalog_item_id = %request.catalog_item_id))]
async fn create_submission(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Json(request): Json<CreateSubmissionRequest>,
) -> Result<(StatusCode, Json<SubmissionCreatedResult>), ApiError> {
    let command = CreateSubmission {
        curator_user_id: request.curator_user_id,
        catalog_item_id: request.catalog_item_id,
        track_id: request.track_id,
    };

    info!(correlation_id = %actor.correlation_id, "handling create_submission command");

    let result = command_handlers::handle_create_submission(
        &command,
        &actor,
        state.clock.as_ref(),
        state.store.as_ref(),
        state.tracks.as_ref(),
        state.catalog.as_ref(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(result)))
}

/// PATCH /{catalog_item_id}/{submission_id}/status
#[instrument(skip(state, actor, request), fields(submission_id = %submission_id))]
async fn update_submission_status(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path((catalog_item_id, submission_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<SubmissionStatusUpdatedResult>, ApiError> {
    let new_status = SubmissionStatus::parse(&request.status)
        .ok_or_else(|| ApiError::InvalidStatus(request.status.clone()))?;

    let command = UpdateSubmissionStatus {
        submission_id,
        artist_id: request.artist_id,
        catalog_item_id,
        new_status,
    };

    info!(correlation_id = %actor.correlation_id, "handling update_submission_status command");

    let result = command_handlers::handle_update_submission_status(
        &command,
        &actor,
        state.clock.as_ref(),
        state.store.as_ref(),
    )
    .await?;

    Ok(Json(result))
}

/// GET /{catalog_item_id}/{submission_id}
#[instrument(skip(state, actor), fields(submission_id = %submission_id))]
async fn get_submission_by_id(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path((catalog_item_id, submission_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<SubmissionDto>, ApiError> {
    let query = query_handlers::GetSubmissionById {
        catalog_item_id,
        submission_id,
    };
    let dto = query_handlers::get_submission_by_id(&query, &actor, state.store.as_ref())
        .await
        .ok_or_else(|| {
            ApiError::Domain(DomainError::NotFound {
                status: 404,
                title: "Submission not found",
                message: "No submission with this ID exists in your inbox.",
                detail: format!("submission {submission_id} not found for {}", actor.actor_id),
            })
        })?;
    Ok(Json(dto))
}

/// GET /{catalog_item_id}
#[instrument(skip(state, actor, params), fields(catalog_item_id = %catalog_item_id))]
async fn list_submissions_by_catalog(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(catalog_item_id): Path<Uuid>,
    Query(params): Query<ListQuery>,
) -> Result<Json<Vec<SubmissionDto>>, ApiError> {
    let query = query_handlers::GetSubmissionsByCatalog {
        catalog_item_id,
        status: params.status()?,
        page: params.page(),
    };
    let dtos =
        query_handlers::get_submissions_by_catalog(&query, &actor, state.store.as_ref()).await;
    Ok(Json(dtos))
}

/// GET /
#[instrument(skip(state, actor, params))]
async fn list_my_submissions(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Query(params): Query<ListQuery>,
) -> Result<Json<Vec<SubmissionDto>>, ApiError> {
    let query = query_handlers::GetMySubmissions {
        status: params.status()?,
        page: params.page(),
    };
    let dtos = query_handlers::get_my_submissions(&query, &actor, state.store.as_ref()).await;
    Ok(Json(dtos))
}

/// GET /stats
#[instrument(skip(state, actor))]
async fn submission_stats(
    State(state): State<AppState>,
    Actor(actor): Actor,
) -> Json<Vec<SubmissionStatsDto>> {
    let stats = query_handlers::get_submission_stats(
        actor.actor_id,
        state.clock.as_ref(),
        state.store.as_ref(),
    )
    .await;
    Json(stats)
}

/// Returns the router for the submission context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_submission).get(list_my_submissions))
        .route("/stats", get(submission_stats))
        .route("/{catalog_item_id}", get(list_submissions_by_catalog))
        .route(
            "/{catalog_item_id}/{submission_id}",
            get(get_submission_by_id),
        )
        .route(
            "/{catalog_item_id}/{submission_id}/status",
            patch(update_submission_status),
        )
}
