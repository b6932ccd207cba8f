use crate::infra::AppState;
use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use safety_net::workflows::intervention::{
    intervention_router, InterventionService, SchemeCatalog, StudentRepository,
};
use tracing::warn;

pub(crate) fn with_service_routes<R, C>(service: Arc<InterventionService<R, C>>) -> axum::Router
where
    R: StudentRepository + 'static,
    C: SchemeCatalog + 'static,
{
    intervention_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route("/api/v1/students", axum::routing::get(roster_endpoint))
        .route(
            "/api/v1/forms/:file_name",
            axum::routing::get(form_download_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Read-only roster with the school-wide risk factor distribution.
pub(crate) async fn roster_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.roster.overview()))
}

/// Serves a rendered aid application by bare file name.
pub(crate) async fn form_download_endpoint(
    Extension(state): Extension<AppState>,
    Path(file_name): Path<String>,
) -> Response {
    if !is_plain_file_name(&file_name) {
        return form_error(
            StatusCode::BAD_REQUEST,
            "invalid_file_name",
            format!("'{file_name}' is not a plain file name"),
        );
    }

    let path = state.forms_dir.join(&file_name);
    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            let content_type = mime_guess::from_path(&path).first_or_octet_stream();
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, content_type.essence_str().to_string())],
                bytes,
            )
                .into_response()
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => form_error(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("form {file_name} not found"),
        ),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "unable to read rendered form");
            form_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                "rendered form could not be read".to_string(),
            )
        }
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\'])
        && !name.contains("..")
}

fn form_error(status: StatusCode, kind: &str, message: String) -> Response {
    let payload = json!({
        "status": "error",
        "error_kind": kind,
        "error": message,
    });
    (status, Json(payload)).into_response()
}
