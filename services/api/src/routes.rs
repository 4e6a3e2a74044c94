use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use breastcare_intake::workflows::assessment::{
    assessment_router, AssessmentService, QuestionCatalog, QuestionDefinition, RiskBackend,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub(crate) struct QuestionsResponse {
    pub(crate) total: usize,
    pub(crate) questions: Vec<QuestionDefinition>,
}

pub(crate) fn with_assessment_routes<B>(service: Arc<AssessmentService<B>>) -> axum::Router
where
    B: RiskBackend + 'static,
{
    assessment_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/assessment/questions",
            axum::routing::get(questions_endpoint),
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

/// Full catalog, including questions currently hidden by their dependency.
pub(crate) async fn questions_endpoint(
    Extension(catalog): Extension<Arc<QuestionCatalog>>,
) -> Json<QuestionsResponse> {
    Json(QuestionsResponse {
        total: catalog.len(),
        questions: catalog.questions().to_vec(),
    })
}
