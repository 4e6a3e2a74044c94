use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::access::BearerCredential;
use super::gateway::RiskBackend;
use super::questionnaire::AnswerValue;
use super::service::{AssessmentError, AssessmentService, AssessmentSessionId};

/// JSON endpoints driving the questionnaire and results steps.
pub fn assessment_router<B>(service: Arc<AssessmentService<B>>) -> Router
where
    B: RiskBackend + 'static,
{
    Router::new()
        .route("/api/v1/assessment/sessions", post(start_handler::<B>))
        .route(
            "/api/v1/assessment/sessions/:session_id",
            get(snapshot_handler::<B>).delete(abandon_handler::<B>),
        )
        .route(
            "/api/v1/assessment/sessions/:session_id/answer",
            put(answer_handler::<B>).delete(clear_answer_handler::<B>),
        )
        .route(
            "/api/v1/assessment/sessions/:session_id/next",
            post(next_handler::<B>),
        )
        .route(
            "/api/v1/assessment/sessions/:session_id/previous",
            post(previous_handler::<B>),
        )
        .route(
            "/api/v1/assessment/sessions/:session_id/results",
            post(results_handler::<B>),
        )
        .with_state(service)
}

/// Body of `PUT .../answer`: a typed `value`, or raw form `input`.
#[derive(Debug, Default, Deserialize)]
pub struct AnswerRequest {
    #[serde(default)]
    pub value: Option<AnswerValue>,
    #[serde(default)]
    pub input: Option<String>,
}

impl IntoResponse for AssessmentError {
    fn into_response(self) -> Response {
        let status = match &self {
            AssessmentError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AssessmentError::WrongAccountType { .. } => StatusCode::FORBIDDEN,
            AssessmentError::StaleSession => StatusCode::CONFLICT,
            AssessmentError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            AssessmentError::InvalidAnswer(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AssessmentError::Scoring(_) => StatusCode::BAD_GATEWAY,
        };

        let payload = match self.redirect() {
            Some(redirect) => json!({
                "error": self.to_string(),
                "redirect": redirect.location,
                "clear_credential": redirect.clear_credential,
            }),
            None => json!({
                "error": self.to_string(),
            }),
        };
        (status, Json(payload)).into_response()
    }
}

fn credential(headers: &HeaderMap) -> Option<BearerCredential> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(BearerCredential::from_authorization)
}

fn required_credential(headers: &HeaderMap) -> Result<BearerCredential, AssessmentError> {
    credential(headers).ok_or(AssessmentError::Unauthenticated)
}

fn session_id(raw: &str) -> Result<AssessmentSessionId, Response> {
    AssessmentSessionId::parse(raw).ok_or_else(|| {
        let payload = json!({
            "error": format!("assessment session {raw} not found"),
        });
        (StatusCode::NOT_FOUND, Json(payload)).into_response()
    })
}

pub(crate) async fn start_handler<B>(
    State(service): State<Arc<AssessmentService<B>>>,
    headers: HeaderMap,
) -> Response
where
    B: RiskBackend + 'static,
{
    match service.start(credential(&headers)) {
        Ok(snapshot) => (StatusCode::CREATED, Json(snapshot)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn snapshot_handler<B>(
    State(service): State<Arc<AssessmentService<B>>>,
    Path(raw_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    B: RiskBackend + 'static,
{
    let id = match session_id(&raw_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let result = required_credential(&headers)
        .and_then(|credential| service.snapshot(id, &credential));
    match result {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn abandon_handler<B>(
    State(service): State<Arc<AssessmentService<B>>>,
    Path(raw_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    B: RiskBackend + 'static,
{
    let id = match session_id(&raw_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let result =
        required_credential(&headers).and_then(|credential| service.abandon(id, &credential));
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn answer_handler<B>(
    State(service): State<Arc<AssessmentService<B>>>,
    Path(raw_id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<AnswerRequest>,
) -> Response
where
    B: RiskBackend + 'static,
{
    let id = match session_id(&raw_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let credential = match required_credential(&headers) {
        Ok(credential) => credential,
        Err(error) => return error.into_response(),
    };

    let result = match request {
        AnswerRequest {
            value: Some(value), ..
        } => service.answer(id, &credential, value),
        AnswerRequest {
            input: Some(input), ..
        } => service.answer_input(id, &credential, &input),
        _ => {
            let payload = json!({
                "error": "answer requires a `value` or an `input` field",
            });
            return (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response();
        }
    };

    match result {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn clear_answer_handler<B>(
    State(service): State<Arc<AssessmentService<B>>>,
    Path(raw_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    B: RiskBackend + 'static,
{
    let id = match session_id(&raw_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let result = required_credential(&headers)
        .and_then(|credential| service.clear_answer(id, &credential));
    match result {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn next_handler<B>(
    State(service): State<Arc<AssessmentService<B>>>,
    Path(raw_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    B: RiskBackend + 'static,
{
    let id = match session_id(&raw_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let result =
        required_credential(&headers).and_then(|credential| service.next(id, &credential));
    match result {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn previous_handler<B>(
    State(service): State<Arc<AssessmentService<B>>>,
    Path(raw_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    B: RiskBackend + 'static,
{
    let id = match session_id(&raw_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let result =
        required_credential(&headers).and_then(|credential| service.previous(id, &credential));
    match result {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn results_handler<B>(
    State(service): State<Arc<AssessmentService<B>>>,
    Path(raw_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    B: RiskBackend + 'static,
{
    let id = match session_id(&raw_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match service.results(id, credential(&headers)).await {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => error.into_response(),
    }
}
