use std::sync::Arc;

use serde::Serialize;

use super::answers::{AnswerSet, AnswerValue};
use super::catalog::QuestionCatalog;
use super::definition::{AnswerError, QuestionDefinition, QuestionKind};
use crate::workflows::assessment::normalizer::normalize_answers;
use crate::workflows::assessment::payload::RiskRequestPayload;

/// Result of asking the engine to move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Advance {
    /// Moved to the next visible question.
    Moved,
    /// The current question still needs an answer.
    Blocked,
    /// The current question was the last visible one.
    Complete,
}

/// Drives one respondent through a [`QuestionCatalog`].
///
/// The engine only remembers the catalog index of the current question and the latest
/// [`AnswerSet`]; the visible set, position and progress are derived on every call so they
/// follow answer changes that reveal or hide questions.
#[derive(Debug, Clone)]
pub struct QuestionnaireEngine {
    catalog: Arc<QuestionCatalog>,
    answers: AnswerSet,
    current: usize,
}

impl QuestionnaireEngine {
    pub fn new(catalog: Arc<QuestionCatalog>) -> Self {
        Self {
            catalog,
            answers: AnswerSet::new(),
            current: 0,
        }
    }

    pub fn catalog(&self) -> &QuestionCatalog {
        &self.catalog
    }

    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    pub fn visible_questions(&self) -> Vec<&QuestionDefinition> {
        self.catalog.visible(&self.answers)
    }

    /// Zero-based index of the current question within the visible set.
    ///
    /// When the stored question is hidden the nearest preceding visible question stands in
    /// for it. The first catalog entry cannot depend on anything, so one always exists.
    fn visible_index(&self, visible: &[&QuestionDefinition]) -> usize {
        let questions = self.catalog.questions();
        let current_id = questions[self.current].id.as_str();

        if let Some(index) = visible.iter().position(|question| question.id == current_id) {
            return index;
        }

        visible
            .iter()
            .rposition(|question| {
                self.catalog
                    .index_of(&question.id)
                    .map(|index| index < self.current)
                    .unwrap_or(false)
            })
            .unwrap_or(0)
    }

    pub fn current_question(&self) -> &QuestionDefinition {
        let visible = self.visible_questions();
        let index = self.visible_index(&visible);
        visible[index]
    }

    /// One-based position of the current question and the size of the visible set.
    pub fn position(&self) -> (usize, usize) {
        let visible = self.visible_questions();
        (self.visible_index(&visible) + 1, visible.len())
    }

    pub fn progress(&self) -> f64 {
        let (position, total) = self.position();
        if total == 0 {
            0.0
        } else {
            position as f64 / total as f64
        }
    }

    pub fn is_first(&self) -> bool {
        self.position().0 == 1
    }

    pub fn is_last(&self) -> bool {
        let (position, total) = self.position();
        position == total
    }

    /// A question is satisfied when it has an answer, or when its dependency is not met:
    /// the answer requirement is waived for questions that do not currently apply.
    pub fn is_satisfied(&self, question: &QuestionDefinition) -> bool {
        if let Some(dependency) = &question.depends_on {
            let met = self
                .catalog
                .is_visible(&dependency.question_id, &self.answers)
                && dependency
                    .predicate
                    .evaluate(self.answers.get(&dependency.question_id));
            if !met {
                return true;
            }
        }

        self.answers.is_answered(&question.id)
    }

    pub fn can_advance(&self) -> bool {
        self.is_satisfied(self.current_question())
    }

    /// Record a typed answer for the current question.
    pub fn answer(&mut self, value: AnswerValue) -> Result<(), AnswerError> {
        let question = self.current_question();
        let id = question.id.clone();
        let accepted = question.accept(value)?;

        self.answers = match accepted {
            Some(value) => self.answers.with_answer(id, value),
            None => self.answers.without(&id),
        };
        Ok(())
    }

    /// Record raw form input for the current question.
    ///
    /// For number questions blank or unparsable input leaves the question unanswered
    /// instead of failing.
    pub fn answer_input(&mut self, raw: &str) -> Result<(), AnswerError> {
        let question = self.current_question();
        let trimmed = raw.trim();

        if trimmed.is_empty() && matches!(question.kind, QuestionKind::Number { .. }) {
            self.clear_answer();
            return Ok(());
        }

        self.answer(AnswerValue::Text(trimmed.to_string()))
    }

    pub fn clear_answer(&mut self) {
        let id = self.current_question().id.clone();
        self.answers = self.answers.without(&id);
    }

    pub fn next(&mut self) -> Advance {
        if !self.can_advance() {
            return Advance::Blocked;
        }

        let visible = self.visible_questions();
        let index = self.visible_index(&visible);
        match visible.get(index + 1) {
            Some(question) => {
                let target = self.catalog.index_of(&question.id);
                if let Some(target) = target {
                    self.current = target;
                }
                Advance::Moved
            }
            None => Advance::Complete,
        }
    }

    /// Step back to the previous visible question. Returns `false` at the first one.
    pub fn previous(&mut self) -> bool {
        let visible = self.visible_questions();
        let index = self.visible_index(&visible);
        if index == 0 {
            return false;
        }

        let target = self.catalog.index_of(&visible[index - 1].id);
        match target {
            Some(target) => {
                self.current = target;
                true
            }
            None => false,
        }
    }

    /// Close the questionnaire and build the scoring payload.
    ///
    /// Answers left behind on questions that are hidden under the final answers are dropped
    /// before normalization; the answer set itself does not outlive this call.
    pub fn finish(self) -> RiskRequestPayload {
        let answers = self.catalog.visible_answers(&self.answers);
        normalize_answers(&answers)
    }

    pub fn snapshot(&self) -> QuestionnaireSnapshot {
        let visible = self.visible_questions();
        let index = self.visible_index(&visible);
        let question = visible[index].clone();
        let position = index + 1;
        let total = visible.len();
        let progress = position as f64 / total as f64;
        let answer = self.answers.get(&question.id).cloned();
        let can_advance = self.is_satisfied(&question);

        QuestionnaireSnapshot {
            question,
            answer,
            position,
            total,
            progress_pct: (progress * 100.0).round() as u8,
            can_go_back: index > 0,
            can_advance,
            is_last: position == total,
        }
    }
}

/// Everything a client needs to render the current step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionnaireSnapshot {
    pub question: QuestionDefinition,
    pub answer: Option<AnswerValue>,
    pub position: usize,
    pub total: usize,
    pub progress_pct: u8,
    pub can_go_back: bool,
    pub can_advance: bool,
    pub is_last: bool,
}
