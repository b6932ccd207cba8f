use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{Language, StudentId};
use super::eligibility::SchemeCatalog;
use super::repository::StudentRepository;
use super::service::{InterventionError, InterventionService};

/// Largest number of students accepted in one batch request.
pub const MAX_BATCH_SIZE: usize = 500;

/// Router builder exposing assessment and intervention endpoints.
pub fn intervention_router<R, C>(service: Arc<InterventionService<R, C>>) -> Router
where
    R: StudentRepository + 'static,
    C: SchemeCatalog + 'static,
{
    Router::new()
        .route(
            "/api/v1/students/:student_id/assessment",
            get(assessment_handler::<R, C>),
        )
        .route(
            "/api/v1/students/:student_id/interventions",
            post(intervention_handler::<R, C>),
        )
        .route("/api/v1/interventions/batch", post(batch_handler::<R, C>))
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct LanguageQuery {
    #[serde(default)]
    pub(crate) language: Option<Language>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct InterventionRequest {
    #[serde(default)]
    pub(crate) language: Option<Language>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BatchRequest {
    pub(crate) student_ids: Vec<StudentId>,
    #[serde(default)]
    pub(crate) language: Option<Language>,
}

pub(crate) async fn assessment_handler<R, C>(
    State(service): State<Arc<InterventionService<R, C>>>,
    path: Result<Path<u32>, PathRejection>,
    query: Result<Query<LanguageQuery>, QueryRejection>,
) -> Response
where
    R: StudentRepository + 'static,
    C: SchemeCatalog + 'static,
{
    let Path(student_id) = match path {
        Ok(path) => path,
        Err(rejection) => return invalid_request(rejection.status(), rejection.body_text()),
    };
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return invalid_request(rejection.status(), rejection.body_text()),
    };

    let language = query.language.unwrap_or_default();
    match service.plan(StudentId(student_id), language) {
        Ok(plan) => (StatusCode::OK, Json(plan)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn intervention_handler<R, C>(
    State(service): State<Arc<InterventionService<R, C>>>,
    path: Result<Path<u32>, PathRejection>,
    body: Result<Json<InterventionRequest>, JsonRejection>,
) -> Response
where
    R: StudentRepository + 'static,
    C: SchemeCatalog + 'static,
{
    let Path(student_id) = match path {
        Ok(path) => path,
        Err(rejection) => return invalid_request(rejection.status(), rejection.body_text()),
    };
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return invalid_request(rejection.status(), rejection.body_text()),
    };

    let language = request.language.unwrap_or_default();
    match service.intervene(StudentId(student_id), language).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn batch_handler<R, C>(
    State(service): State<Arc<InterventionService<R, C>>>,
    body: Result<Json<BatchRequest>, JsonRejection>,
) -> Response
where
    R: StudentRepository + 'static,
    C: SchemeCatalog + 'static,
{
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return invalid_request(rejection.status(), rejection.body_text()),
    };

    if request.student_ids.is_empty() || request.student_ids.len() > MAX_BATCH_SIZE {
        return error_body(
            StatusCode::UNPROCESSABLE_ENTITY,
            "invalid_batch",
            format!("student_ids must contain between 1 and {MAX_BATCH_SIZE} ids"),
        );
    }

    let language = request.language.unwrap_or_default();
    let report = service.intervene_batch(request.student_ids, language).await;
    (StatusCode::OK, Json(report)).into_response()
}

pub(crate) fn error_response(err: InterventionError) -> Response {
    let status = match err {
        InterventionError::NotFound(_) => StatusCode::NOT_FOUND,
        InterventionError::DataUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    };

    error_body(status, err.label(), err.to_string())
}

/// Extractor rejections keep axum's status but use the JSON error body.
pub(crate) fn invalid_request(status: StatusCode, message: String) -> Response {
    error_body(status, "invalid_request", message)
}

fn error_body(status: StatusCode, kind: &str, message: String) -> Response {
    let payload = json!({
        "status": "error",
        "error_kind": kind,
        "error": message,
    });
    (status, Json(payload)).into_response()
}
