use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::access::{
    login_redirect, route_account, AccessDecision, BearerCredential, Redirect, ASSESSMENT_PATH,
    RESULTS_PATH,
};
use super::bridge::SessionBridge;
use super::gateway::{GatewayError, RiskBackend};
use super::payload::RiskRequestPayload;
use super::questionnaire::{
    Advance, AnswerError, AnswerValue, QuestionCatalog, QuestionnaireEngine,
    QuestionnaireSnapshot,
};
use super::result::ResultView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssessmentSessionId(Uuid);

impl AssessmentSessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw.trim()).ok().map(Self)
    }
}

impl fmt::Display for AssessmentSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifetimes applied to live questionnaires and completed handoffs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    pub handoff_ttl: Duration,
    pub idle_timeout: Duration,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            handoff_ttl: Duration::minutes(30),
            idle_timeout: Duration::minutes(60),
        }
    }
}

/// Current step of a live session, as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub session_id: AssessmentSessionId,
    #[serde(flatten)]
    pub step: QuestionnaireSnapshot,
}

impl SessionSnapshot {
    fn capture(session_id: AssessmentSessionId, engine: &QuestionnaireEngine) -> Self {
        Self {
            session_id,
            step: engine.snapshot(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    Moved { session: SessionSnapshot },
    Blocked { session: SessionSnapshot },
    Complete { redirect: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PurgeSummary {
    pub sessions: usize,
    pub handoffs: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum AssessmentError {
    #[error("authentication required")]
    Unauthenticated,
    #[error("this account cannot take the patient assessment")]
    WrongAccountType { redirect: Redirect },
    #[error("no completed questionnaire is waiting for results")]
    StaleSession,
    #[error("assessment session {0} not found")]
    SessionNotFound(AssessmentSessionId),
    #[error(transparent)]
    InvalidAnswer(#[from] AnswerError),
    #[error("{0}")]
    Scoring(#[source] GatewayError),
}

impl AssessmentError {
    /// Where the client should navigate next, for errors that end the current page.
    pub fn redirect(&self) -> Option<Redirect> {
        match self {
            Self::Unauthenticated => Some(login_redirect()),
            Self::WrongAccountType { redirect } => Some(redirect.clone()),
            Self::StaleSession => Some(Redirect::to(ASSESSMENT_PATH)),
            _ => None,
        }
    }
}

struct LiveSession {
    engine: QuestionnaireEngine,
    owner: BearerCredential,
    last_touched: DateTime<Utc>,
}

struct PendingAssessment {
    owner: BearerCredential,
    payload: RiskRequestPayload,
}

/// Owns live questionnaires and the completed-payload handoff, and runs the results step
/// against a [`RiskBackend`].
pub struct AssessmentService<B> {
    catalog: Arc<QuestionCatalog>,
    sessions: Mutex<HashMap<AssessmentSessionId, LiveSession>>,
    bridge: SessionBridge<AssessmentSessionId, PendingAssessment>,
    backend: Arc<B>,
    idle_timeout: Duration,
}

impl<B> AssessmentService<B>
where
    B: RiskBackend + 'static,
{
    pub fn new(catalog: Arc<QuestionCatalog>, backend: Arc<B>, policy: SessionPolicy) -> Self {
        Self {
            catalog,
            sessions: Mutex::new(HashMap::new()),
            bridge: SessionBridge::new(policy.handoff_ttl),
            backend,
            idle_timeout: policy.idle_timeout,
        }
    }

    pub fn catalog(&self) -> &QuestionCatalog {
        &self.catalog
    }

    pub fn live_sessions(&self) -> usize {
        self.sessions().len()
    }

    pub fn pending_results(&self) -> usize {
        self.bridge.len()
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<AssessmentSessionId, LiveSession>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Open a questionnaire. Without a credential no session is created.
    pub fn start(
        &self,
        credential: Option<BearerCredential>,
    ) -> Result<SessionSnapshot, AssessmentError> {
        let owner = credential.ok_or(AssessmentError::Unauthenticated)?;
        let session_id = AssessmentSessionId::generate();
        let engine = QuestionnaireEngine::new(Arc::clone(&self.catalog));
        let snapshot = SessionSnapshot::capture(session_id, &engine);

        self.sessions().insert(
            session_id,
            LiveSession {
                engine,
                owner,
                last_touched: Utc::now(),
            },
        );
        info!(%session_id, "assessment session started");
        Ok(snapshot)
    }

    pub fn snapshot(
        &self,
        session_id: AssessmentSessionId,
        credential: &BearerCredential,
    ) -> Result<SessionSnapshot, AssessmentError> {
        self.with_engine(session_id, credential, |engine| {
            Ok(SessionSnapshot::capture(session_id, engine))
        })
    }

    pub fn answer(
        &self,
        session_id: AssessmentSessionId,
        credential: &BearerCredential,
        value: AnswerValue,
    ) -> Result<SessionSnapshot, AssessmentError> {
        self.with_engine(session_id, credential, |engine| {
            engine.answer(value)?;
            Ok(SessionSnapshot::capture(session_id, engine))
        })
    }

    /// Record raw form text; unparsable numbers leave the question unanswered.
    pub fn answer_input(
        &self,
        session_id: AssessmentSessionId,
        credential: &BearerCredential,
        raw: &str,
    ) -> Result<SessionSnapshot, AssessmentError> {
        self.with_engine(session_id, credential, |engine| {
            engine.answer_input(raw)?;
            Ok(SessionSnapshot::capture(session_id, engine))
        })
    }

    pub fn clear_answer(
        &self,
        session_id: AssessmentSessionId,
        credential: &BearerCredential,
    ) -> Result<SessionSnapshot, AssessmentError> {
        self.with_engine(session_id, credential, |engine| {
            engine.clear_answer();
            Ok(SessionSnapshot::capture(session_id, engine))
        })
    }

    pub fn previous(
        &self,
        session_id: AssessmentSessionId,
        credential: &BearerCredential,
    ) -> Result<SessionSnapshot, AssessmentError> {
        self.with_engine(session_id, credential, |engine| {
            engine.previous();
            Ok(SessionSnapshot::capture(session_id, engine))
        })
    }

    /// Advance the questionnaire. Completing it closes the session and hands the normalized
    /// payload to the results step.
    pub fn next(
        &self,
        session_id: AssessmentSessionId,
        credential: &BearerCredential,
    ) -> Result<StepOutcome, AssessmentError> {
        let now = Utc::now();
        let mut sessions = self.sessions();
        let session = self.owned_session(&mut sessions, session_id, credential, now)?;

        match session.engine.next() {
            Advance::Moved => Ok(StepOutcome::Moved {
                session: SessionSnapshot::capture(session_id, &session.engine),
            }),
            Advance::Blocked => {
                debug!(
                    %session_id,
                    question_id = %session.engine.current_question().id,
                    "next blocked on unanswered question"
                );
                Ok(StepOutcome::Blocked {
                    session: SessionSnapshot::capture(session_id, &session.engine),
                })
            }
            Advance::Complete => {
                let session = sessions
                    .remove(&session_id)
                    .ok_or(AssessmentError::SessionNotFound(session_id))?;
                drop(sessions);

                let payload = session.engine.finish();
                self.bridge.put_at(
                    session_id,
                    PendingAssessment {
                        owner: session.owner,
                        payload,
                    },
                    now,
                );
                info!(%session_id, "questionnaire completed; payload handed off");
                Ok(StepOutcome::Complete {
                    redirect: RESULTS_PATH.to_string(),
                })
            }
        }
    }

    /// Drop a live questionnaire and its answers. Nothing is submitted.
    pub fn abandon(
        &self,
        session_id: AssessmentSessionId,
        credential: &BearerCredential,
    ) -> Result<(), AssessmentError> {
        let mut sessions = self.sessions();
        self.owned_session(&mut sessions, session_id, credential, Utc::now())?;
        sessions.remove(&session_id);
        info!(%session_id, "assessment session abandoned");
        Ok(())
    }

    /// Results step: check the account, consume the handed-off payload, then score it.
    ///
    /// Without a pending payload the caller is sent back to the questionnaire before any
    /// backend call. The payload is taken before scoring, so a repeated or concurrent request
    /// for the same session finds nothing to submit.
    pub async fn results(
        &self,
        session_id: AssessmentSessionId,
        credential: Option<BearerCredential>,
    ) -> Result<ResultView, AssessmentError> {
        let credential = credential.ok_or(AssessmentError::Unauthenticated)?;

        if !self.bridge.contains(&session_id) {
            info!(%session_id, "no pending assessment; returning to questionnaire");
            return Err(AssessmentError::StaleSession);
        }

        let user = self
            .backend
            .current_user(&credential)
            .await
            .map_err(|err| {
                warn!(error = %err, "could not resolve current user; sending to login");
                AssessmentError::Unauthenticated
            })?;

        if let AccessDecision::Redirect(redirect) = route_account(&user) {
            info!(
                user_type = ?user.user_type,
                location = %redirect.location,
                "non-patient account redirected to its portal"
            );
            return Err(AssessmentError::WrongAccountType { redirect });
        }

        let pending = self
            .bridge
            .take_if(&session_id, |pending| pending.owner == credential)
            .ok_or_else(|| {
                info!(%session_id, "no pending assessment; returning to questionnaire");
                AssessmentError::StaleSession
            })?;

        let result = self
            .backend
            .calculate_and_save(&credential, &pending.payload)
            .await
            .map_err(|err| {
                warn!(%session_id, error = %err, "risk scoring failed");
                AssessmentError::Scoring(err)
            })?;

        info!(
            %session_id,
            risk_category = %result.risk_category,
            "assessment scored"
        );
        Ok(ResultView::from_result(result))
    }

    /// Drop idle questionnaires and expired handoffs.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> PurgeSummary {
        let idle_timeout = self.idle_timeout;
        let sessions = {
            let mut sessions = self.sessions();
            let before = sessions.len();
            sessions.retain(|_, session| now - session.last_touched <= idle_timeout);
            before - sessions.len()
        };
        let handoffs = self.bridge.purge_expired(now);

        if sessions > 0 || handoffs > 0 {
            info!(sessions, handoffs, "purged expired assessment state");
        }
        PurgeSummary { sessions, handoffs }
    }

    fn with_engine<T, F>(
        &self,
        session_id: AssessmentSessionId,
        credential: &BearerCredential,
        action: F,
    ) -> Result<T, AssessmentError>
    where
        F: FnOnce(&mut QuestionnaireEngine) -> Result<T, AssessmentError>,
    {
        let mut sessions = self.sessions();
        let session = self.owned_session(&mut sessions, session_id, credential, Utc::now())?;
        action(&mut session.engine)
    }

    /// Look up a live session for its owner, refreshing its idle clock. Sessions owned by
    /// another credential are reported as missing.
    fn owned_session<'a>(
        &self,
        sessions: &'a mut HashMap<AssessmentSessionId, LiveSession>,
        session_id: AssessmentSessionId,
        credential: &BearerCredential,
        now: DateTime<Utc>,
    ) -> Result<&'a mut LiveSession, AssessmentError> {
        let expired = match sessions.get(&session_id) {
            Some(session) if session.owner == *credential => {
                now - session.last_touched > self.idle_timeout
            }
            _ => return Err(AssessmentError::SessionNotFound(session_id)),
        };

        if expired {
            sessions.remove(&session_id);
            info!(%session_id, "idle assessment session expired");
            return Err(AssessmentError::SessionNotFound(session_id));
        }

        let session = sessions
            .get_mut(&session_id)
            .ok_or(AssessmentError::SessionNotFound(session_id))?;
        session.last_touched = now;
        Ok(session)
    }
}
