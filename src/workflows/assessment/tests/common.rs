use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::workflows::assessment::access::{AccountType, BearerCredential, CurrentUser};
use crate::workflows::assessment::gateway::{GatewayError, RiskBackend};
use crate::workflows::assessment::payload::RiskRequestPayload;
use crate::workflows::assessment::questionnaire::{
    Advance, AnswerValue, QuestionCatalog, QuestionnaireEngine,
};
use crate::workflows::assessment::result::RiskResult;
use crate::workflows::assessment::service::{
    AssessmentService, AssessmentSessionId, SessionPolicy, StepOutcome,
};

pub(super) const PATIENT_TOKEN: &str = "patient-token";
pub(super) const OTHER_TOKEN: &str = "other-patient-token";

pub(super) fn credential() -> BearerCredential {
    BearerCredential::new(PATIENT_TOKEN).expect("non-empty token")
}

pub(super) fn other_credential() -> BearerCredential {
    BearerCredential::new(OTHER_TOKEN).expect("non-empty token")
}

pub(super) fn engine() -> QuestionnaireEngine {
    QuestionnaireEngine::new(Arc::new(QuestionCatalog::breast_cancer_risk()))
}

pub(super) fn answer_and_advance(engine: &mut QuestionnaireEngine, value: impl Into<AnswerValue>) {
    let id = engine.current_question().id.clone();
    engine
        .answer(value.into())
        .unwrap_or_else(|err| panic!("answer for {id} rejected: {err}"));
    assert_eq!(engine.next(), Advance::Moved, "advance past {id}");
}

pub(super) fn moderate_result() -> RiskResult {
    RiskResult {
        risk_category: "Modéré".to_string(),
        risk_5_years: 1.62,
        average_risk_for_age: Some(1.1),
        risk_relative: Some(1.47),
        recommendations: vec!["Mammographie tous les deux ans".to_string()],
        warning_message: None,
        disclaimer: Some("Estimation indicative".to_string()),
        clinical_significance: None,
        significance_explanation: None,
        educational_message: Vec::new(),
        critical_warnings: Vec::new(),
        model_used: Some("gail".to_string()),
        estimated_accuracy: None,
    }
}

/// Scoring backend double recording every call it receives.
pub(super) struct MockBackend {
    user: Result<CurrentUser, GatewayError>,
    scoring: Result<RiskResult, GatewayError>,
    user_calls: AtomicUsize,
    submitted: Mutex<Vec<RiskRequestPayload>>,
}

impl MockBackend {
    pub(super) fn patient() -> Self {
        Self::with_user_type(AccountType::Patient)
    }

    pub(super) fn with_user_type(user_type: AccountType) -> Self {
        Self {
            user: Ok(CurrentUser {
                user_type,
                email: Some("patiente@example.fr".to_string()),
            }),
            scoring: Ok(moderate_result()),
            user_calls: AtomicUsize::new(0),
            submitted: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn rejecting_credentials() -> Self {
        Self {
            user: Err(GatewayError::Rejected {
                status: 401,
                detail: "Could not validate credentials".to_string(),
            }),
            ..Self::patient()
        }
    }

    pub(super) fn failing_scoring(error: GatewayError) -> Self {
        Self {
            scoring: Err(error),
            ..Self::patient()
        }
    }

    pub(super) fn user_calls(&self) -> usize {
        self.user_calls.load(Ordering::SeqCst)
    }

    pub(super) fn submitted(&self) -> Vec<RiskRequestPayload> {
        self.submitted.lock().expect("submitted mutex poisoned").clone()
    }
}

impl RiskBackend for MockBackend {
    async fn current_user(
        &self,
        _credential: &BearerCredential,
    ) -> Result<CurrentUser, GatewayError> {
        self.user_calls.fetch_add(1, Ordering::SeqCst);
        self.user.clone()
    }

    async fn calculate_and_save(
        &self,
        _credential: &BearerCredential,
        payload: &RiskRequestPayload,
    ) -> Result<RiskResult, GatewayError> {
        self.submitted
            .lock()
            .expect("submitted mutex poisoned")
            .push(payload.clone());
        self.scoring.clone()
    }
}

pub(super) fn build_service(
    backend: MockBackend,
) -> (Arc<AssessmentService<MockBackend>>, Arc<MockBackend>) {
    let backend = Arc::new(backend);
    let service = AssessmentService::new(
        Arc::new(QuestionCatalog::breast_cancer_risk()),
        Arc::clone(&backend),
        SessionPolicy::default(),
    );
    (Arc::new(service), backend)
}

/// Drive a fresh session through every visible question, returning its id.
pub(super) fn complete_session(
    service: &AssessmentService<MockBackend>,
    credential: &BearerCredential,
) -> AssessmentSessionId {
    let session_id = service
        .start(Some(credential.clone()))
        .expect("session starts")
        .session_id;

    let answers: Vec<AnswerValue> = vec![
        AnswerValue::from(35),
        AnswerValue::from(1),
        AnswerValue::from(0),
        AnswerValue::from("12-13"),
        AnswerValue::from("25-29"),
        AnswerValue::from(65),
        AnswerValue::from(168),
        AnswerValue::from(2),
        AnswerValue::from(150),
        AnswerValue::from("never"),
    ];

    let last = answers.len() - 1;
    for (index, value) in answers.into_iter().enumerate() {
        service
            .answer(session_id, credential, value)
            .expect("answer accepted");
        let outcome = service.next(session_id, credential).expect("next succeeds");
        if index == last {
            assert!(matches!(outcome, StepOutcome::Complete { .. }), "{outcome:?}");
        } else {
            assert!(matches!(outcome, StepOutcome::Moved { .. }), "{outcome:?}");
        }
    }

    session_id
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
