use chrono::{Duration, Utc};

use super::common::*;
use crate::workflows::assessment::access::{AccountType, Redirect};
use crate::workflows::assessment::gateway::GatewayError;
use crate::workflows::assessment::interpreter::RiskTier;
use crate::workflows::assessment::questionnaire::AnswerValue;
use crate::workflows::assessment::service::{AssessmentError, AssessmentSessionId, StepOutcome};

#[test]
fn start_without_credential_creates_no_session() {
    let (service, _) = build_service(MockBackend::patient());

    match service.start(None) {
        Err(AssessmentError::Unauthenticated) => {}
        other => panic!("expected unauthenticated, got {other:?}"),
    }
    assert_eq!(service.live_sessions(), 0);
    assert_eq!(
        AssessmentError::Unauthenticated.redirect(),
        Some(Redirect::to("/mobile/login?redirect=/mobile/assessment"))
    );
}

#[test]
fn sessions_are_private_to_their_credential() {
    let (service, _) = build_service(MockBackend::patient());
    let snapshot = service.start(Some(credential())).expect("session starts");

    match service.snapshot(snapshot.session_id, &other_credential()) {
        Err(AssessmentError::SessionNotFound(id)) => assert_eq!(id, snapshot.session_id),
        other => panic!("expected session not found, got {other:?}"),
    }
    assert!(service.snapshot(snapshot.session_id, &credential()).is_ok());
}

#[test]
fn next_reports_blocked_and_moved_steps() {
    let (service, _) = build_service(MockBackend::patient());
    let credential = credential();
    let id = service.start(Some(credential.clone())).expect("starts").session_id;

    match service.next(id, &credential).expect("next succeeds") {
        StepOutcome::Blocked { session } => assert_eq!(session.step.question.id, "age"),
        other => panic!("expected blocked, got {other:?}"),
    }

    service
        .answer_input(id, &credential, "42")
        .expect("answer accepted");
    match service.next(id, &credential).expect("next succeeds") {
        StepOutcome::Moved { session } => {
            assert_eq!(session.step.question.id, "first_degree_relatives");
            assert!(session.step.can_go_back);
        }
        other => panic!("expected moved, got {other:?}"),
    }
}

#[test]
fn invalid_answers_surface_as_errors() {
    let (service, _) = build_service(MockBackend::patient());
    let credential = credential();
    let id = service.start(Some(credential.clone())).expect("starts").session_id;

    match service.answer(id, &credential, AnswerValue::Boolean(true)) {
        Err(AssessmentError::InvalidAnswer(_)) => {}
        other => panic!("expected invalid answer, got {other:?}"),
    }
}

#[test]
fn abandon_discards_the_session() {
    let (service, _) = build_service(MockBackend::patient());
    let credential = credential();
    let id = service.start(Some(credential.clone())).expect("starts").session_id;
    service
        .answer(id, &credential, AnswerValue::from(35))
        .expect("answer accepted");

    service.abandon(id, &credential).expect("abandon succeeds");
    assert_eq!(service.live_sessions(), 0);
    assert!(matches!(
        service.snapshot(id, &credential),
        Err(AssessmentError::SessionNotFound(_))
    ));
}

#[test]
fn clear_answer_resets_the_current_question() {
    let (service, _) = build_service(MockBackend::patient());
    let credential = credential();
    let id = service.start(Some(credential.clone())).expect("starts").session_id;
    service
        .answer(id, &credential, AnswerValue::from(35))
        .expect("answer accepted");

    let snapshot = service.clear_answer(id, &credential).expect("clear succeeds");
    assert_eq!(snapshot.step.answer, None);
    assert!(!snapshot.step.can_advance);
}

#[tokio::test]
async fn completed_session_is_scored_exactly_once() {
    let (service, backend) = build_service(MockBackend::patient());
    let credential = credential();
    let id = complete_session(&service, &credential);

    assert_eq!(service.live_sessions(), 0);
    assert_eq!(service.pending_results(), 1);

    let view = service
        .results(id, Some(credential.clone()))
        .await
        .expect("results render");
    assert_eq!(view.presentation.tier, RiskTier::Moderate);
    assert_eq!(view.risk_5_years_display, "1.62%");
    assert!(view.comparison.is_some());

    let submitted = backend.submitted();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].age, 35);
    assert_eq!(submitted[0].weight_kg, Some(65.0));
    assert_eq!(submitted[0].hormone_therapy, None);

    match service.results(id, Some(credential)).await {
        Err(error @ AssessmentError::StaleSession) => {
            assert_eq!(error.redirect(), Some(Redirect::to("/mobile/assessment")));
        }
        other => panic!("expected stale session, got {other:?}"),
    }
    assert_eq!(backend.submitted().len(), 1);
}

#[tokio::test]
async fn results_without_a_completed_questionnaire_make_no_backend_call() {
    let (service, backend) = build_service(MockBackend::patient());

    let outcome = service
        .results(AssessmentSessionId::generate(), Some(credential()))
        .await;

    assert!(matches!(outcome, Err(AssessmentError::StaleSession)));
    assert_eq!(backend.user_calls(), 0);
    assert!(backend.submitted().is_empty());
}

#[tokio::test]
async fn results_require_a_credential() {
    let (service, backend) = build_service(MockBackend::patient());
    let id = complete_session(&service, &credential());

    let outcome = service.results(id, None).await;
    assert!(matches!(outcome, Err(AssessmentError::Unauthenticated)));
    assert_eq!(service.pending_results(), 1);
    assert_eq!(backend.user_calls(), 0);
}

#[tokio::test]
async fn staff_accounts_are_redirected_without_consuming_the_payload() {
    for (user_type, location) in [
        (AccountType::Admin, "/admin/login"),
        (AccountType::Professional, "/professional/login"),
    ] {
        let (service, backend) = build_service(MockBackend::with_user_type(user_type));
        let id = complete_session(&service, &credential());

        match service.results(id, Some(credential())).await {
            Err(error @ AssessmentError::WrongAccountType { .. }) => {
                let redirect = error.redirect().expect("redirect");
                assert_eq!(redirect.location, location);
                assert!(redirect.clear_credential);
            }
            other => panic!("expected wrong account type, got {other:?}"),
        }
        assert!(backend.submitted().is_empty());
        assert_eq!(service.pending_results(), 1);
    }
}

#[tokio::test]
async fn failing_identity_check_sends_to_login() {
    let (service, backend) = build_service(MockBackend::rejecting_credentials());
    let id = complete_session(&service, &credential());

    let outcome = service.results(id, Some(credential())).await;
    assert!(matches!(outcome, Err(AssessmentError::Unauthenticated)));
    assert!(backend.submitted().is_empty());
}

#[tokio::test]
async fn another_credential_cannot_claim_the_results() {
    let (service, backend) = build_service(MockBackend::patient());
    let id = complete_session(&service, &credential());

    let outcome = service.results(id, Some(other_credential())).await;
    assert!(matches!(outcome, Err(AssessmentError::StaleSession)));
    assert!(backend.submitted().is_empty());
    assert_eq!(service.pending_results(), 1);

    assert!(service.results(id, Some(credential())).await.is_ok());
}

#[tokio::test]
async fn scoring_failures_carry_the_backend_message() {
    let (service, backend) = build_service(MockBackend::failing_scoring(GatewayError::Rejected {
        status: 422,
        detail: "Âge hors limites".to_string(),
    }));
    let id = complete_session(&service, &credential());

    match service.results(id, Some(credential())).await {
        Err(error @ AssessmentError::Scoring(_)) => {
            assert_eq!(error.to_string(), "Âge hors limites");
            assert_eq!(error.redirect(), None);
        }
        other => panic!("expected scoring failure, got {other:?}"),
    }
    assert_eq!(backend.submitted().len(), 1);
    assert_eq!(service.pending_results(), 0);
}

#[test]
fn purge_expired_drops_idle_sessions_and_old_handoffs() {
    let (service, _) = build_service(MockBackend::patient());
    service.start(Some(credential())).expect("starts");
    complete_session(&service, &other_credential());

    let summary = service.purge_expired(Utc::now() + Duration::hours(2));
    assert_eq!(summary.sessions, 1);
    assert_eq!(summary.handoffs, 1);
    assert_eq!(service.live_sessions(), 0);
    assert_eq!(service.pending_results(), 0);
}

#[test]
fn purge_keeps_fresh_state() {
    let (service, _) = build_service(MockBackend::patient());
    service.start(Some(credential())).expect("starts");

    let summary = service.purge_expired(Utc::now());
    assert_eq!(summary.sessions, 0);
    assert_eq!(service.live_sessions(), 1);
}
