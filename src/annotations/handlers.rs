use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::dto::{
    AnnotationListResponse, AnnotationResponse, CreateAnnotationRequest, MessageResponse,
    UpdateAnnotationRequest,
};
use super::model::ValidationErrors;
use crate::{
    auth::AuthUser,
    error::{AppError, AppResult},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_annotations).post(create_annotation))
        .route(
            "/:id",
            get(get_annotation)
                .put(update_annotation)
                .delete(delete_annotation),
        )
}

/// Ids that do not parse are answered exactly like unknown ids.
fn parse_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::InvalidId)
}

/// A body that is not JSON is a validation failure, reported in the envelope.
fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    body.map(|Json(v)| v).map_err(|rejection| {
        AppError::Validation(ValidationErrors::single("body", rejection.body_text()))
    })
}

#[instrument(skip(state, body))]
pub async fn create_annotation(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    body: Result<Json<CreateAnnotationRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<AnnotationResponse>)> {
    let new = json_body(body)?.into_new()?;

    let annotation = state
        .store
        .create(user_id, new)
        .await
        .map_err(|e| AppError::from_store(e, "creating annotation"))?;

    info!(%user_id, annotation_id = %annotation.id, "annotation created");
    Ok((
        StatusCode::CREATED,
        Json(AnnotationResponse::with_message(
            "Annotation created successfully",
            annotation,
        )),
    ))
}

#[instrument(skip(state))]
pub async fn list_annotations(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<AnnotationListResponse>> {
    let annotations = state
        .store
        .list(user_id)
        .await
        .map_err(|e| AppError::from_store(e, "fetching annotations"))?;
    Ok(Json(annotations.into()))
}

#[instrument(skip(state))]
pub async fn get_annotation(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<AnnotationResponse>> {
    let id = parse_id(&id)?;
    let annotation = state
        .store
        .find(id, user_id)
        .await
        .map_err(|e| AppError::from_store(e, "fetching annotation"))?;
    Ok(Json(AnnotationResponse::new(annotation)))
}

#[instrument(skip(state, body))]
pub async fn update_annotation(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    body: Result<Json<UpdateAnnotationRequest>, JsonRejection>,
) -> AppResult<Json<AnnotationResponse>> {
    let id = parse_id(&id)?;
    let patch = json_body(body)?.into_patch()?;

    let annotation = state
        .store
        .update(id, user_id, patch)
        .await
        .map_err(|e| AppError::from_store(e, "updating annotation"))?;

    info!(%user_id, annotation_id = %id, "annotation updated");
    Ok(Json(AnnotationResponse::with_message(
        "Annotation updated successfully",
        annotation,
    )))
}

#[instrument(skip(state))]
pub async fn delete_annotation(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let id = parse_id(&id)?;
    state
        .store
        .delete(id, user_id)
        .await
        .map_err(|e| AppError::from_store(e, "deleting annotation"))?;

    info!(%user_id, annotation_id = %id, "annotation deleted");
    Ok(Json(MessageResponse {
        success: true,
        message: "Annotation deleted successfully",
    }))
}
