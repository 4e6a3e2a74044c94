//! Patient breast-cancer risk assessment: questionnaire, payload handoff, and results.
//!
//! A session walks the respondent through the [`QuestionCatalog`], normalizes the answers into
//! a [`RiskRequestPayload`] on completion, and parks it in a single-use handoff until the
//! results step submits it to the scoring backend.

pub mod access;
pub mod bridge;
pub mod gateway;
pub mod interpreter;
pub mod normalizer;
pub mod payload;
pub mod questionnaire;
pub mod result;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use access::{
    login_redirect, route_account, AccessDecision, AccountType, BearerCredential, CurrentUser,
    Portal, Redirect, ASSESSMENT_PATH, RESULTS_PATH,
};
pub use bridge::SessionBridge;
pub use gateway::{extract_error_detail, GatewayError, HttpRiskBackend, RiskBackend};
pub use interpreter::{interpret_category, RiskTier, TierPresentation, Tone};
pub use normalizer::normalize_answers;
pub use payload::{FirstBirthAge, MenarcheAge, RiskRequestPayload, SmokingStatus};
pub use questionnaire::{
    Advance, AnswerError, AnswerSet, AnswerValue, CatalogError, QuestionCatalog,
    QuestionDefinition, QuestionKind, QuestionnaireEngine, QuestionnaireSnapshot,
};
pub use result::{ResultView, RiskResult};
pub use router::{assessment_router, AnswerRequest};
pub use service::{
    AssessmentError, AssessmentService, AssessmentSessionId, PurgeSummary, SessionPolicy,
    SessionSnapshot, StepOutcome,
};
