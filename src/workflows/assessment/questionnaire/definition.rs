use serde::{Deserialize, Serialize};

use super::answers::AnswerValue;

/// How a numeric answer is stored once accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberFormat {
    Integer,
    Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionKind {
    Number { format: NumberFormat },
    Boolean,
    SingleSelect { options: Vec<SelectOption> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: AnswerValue,
}

impl SelectOption {
    pub fn new(label: impl Into<String>, value: impl Into<AnswerValue>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }

    fn matches(&self, candidate: &AnswerValue) -> bool {
        match (&self.value, candidate) {
            (AnswerValue::Number(expected), _) => candidate
                .as_f64()
                .map(|value| value == *expected)
                .unwrap_or(false),
            (AnswerValue::Text(expected), AnswerValue::Text(value)) => expected == value,
            (AnswerValue::Boolean(expected), _) => candidate.as_bool() == Some(*expected),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unit {
    #[serde(rename = "kg")]
    Kilograms,
    #[serde(rename = "cm")]
    Centimeters,
}

impl Unit {
    pub fn symbol(self) -> &'static str {
        match self {
            Unit::Kilograms => "kg",
            Unit::Centimeters => "cm",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    MedicalHistory,
    Lifestyle,
}

/// Input range hint for number questions. Not enforced on answers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericBounds {
    pub min: f64,
    pub max: f64,
}

/// Condition evaluated against the current answer of the question depended on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum VisibilityPredicate {
    Answered,
    GreaterThan(f64),
    AtLeast(f64),
}

impl VisibilityPredicate {
    pub fn evaluate(&self, answer: Option<&AnswerValue>) -> bool {
        let Some(answer) = answer.filter(|answer| answer.is_present()) else {
            return false;
        };

        match self {
            VisibilityPredicate::Answered => true,
            VisibilityPredicate::GreaterThan(threshold) => answer
                .as_f64()
                .map(|value| value > *threshold)
                .unwrap_or(false),
            VisibilityPredicate::AtLeast(threshold) => answer
                .as_f64()
                .map(|value| value >= *threshold)
                .unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dependency {
    pub question_id: String,
    pub predicate: VisibilityPredicate,
}

/// A single question of the intake questionnaire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionDefinition {
    pub id: String,
    pub prompt: String,
    pub kind: QuestionKind,
    pub section: Section,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<Unit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<NumericBounds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<Dependency>,
}

impl QuestionDefinition {
    fn new(id: impl Into<String>, prompt: impl Into<String>, kind: QuestionKind) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
            kind,
            section: Section::MedicalHistory,
            help: None,
            placeholder: None,
            unit: None,
            bounds: None,
            depends_on: None,
        }
    }

    pub fn integer(id: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self::new(
            id,
            prompt,
            QuestionKind::Number {
                format: NumberFormat::Integer,
            },
        )
    }

    pub fn decimal(id: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self::new(
            id,
            prompt,
            QuestionKind::Number {
                format: NumberFormat::Decimal,
            },
        )
    }

    pub fn boolean(id: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self::new(id, prompt, QuestionKind::Boolean)
    }

    pub fn single_select(
        id: impl Into<String>,
        prompt: impl Into<String>,
        options: Vec<SelectOption>,
    ) -> Self {
        Self::new(id, prompt, QuestionKind::SingleSelect { options })
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    pub fn with_bounds(mut self, min: f64, max: f64) -> Self {
        self.bounds = Some(NumericBounds { min, max });
        self
    }

    pub fn in_section(mut self, section: Section) -> Self {
        self.section = section;
        self
    }

    pub fn depends_on(
        mut self,
        question_id: impl Into<String>,
        predicate: VisibilityPredicate,
    ) -> Self {
        self.depends_on = Some(Dependency {
            question_id: question_id.into(),
            predicate,
        });
        self
    }

    pub fn options(&self) -> &[SelectOption] {
        match &self.kind {
            QuestionKind::SingleSelect { options } => options,
            _ => &[],
        }
    }

    /// Canonicalise `value` for this question.
    ///
    /// `Ok(None)` means the input carries no usable answer (blank or unparsable number) and
    /// the question must be treated as unanswered.
    pub fn accept(&self, value: AnswerValue) -> Result<Option<AnswerValue>, AnswerError> {
        match &self.kind {
            QuestionKind::Number { format } => match value {
                AnswerValue::Boolean(_) => Err(AnswerError::ExpectedNumber {
                    question_id: self.id.clone(),
                }),
                other => Ok(other.as_f64().map(|number| match format {
                    NumberFormat::Integer => AnswerValue::Number(number.trunc()),
                    NumberFormat::Decimal => AnswerValue::Number(number),
                })),
            },
            QuestionKind::Boolean => value
                .as_bool()
                .map(|flag| Some(AnswerValue::Boolean(flag)))
                .ok_or_else(|| AnswerError::ExpectedBoolean {
                    question_id: self.id.clone(),
                }),
            QuestionKind::SingleSelect { options } => options
                .iter()
                .find(|option| option.matches(&value))
                .map(|option| Some(option.value.clone()))
                .ok_or_else(|| AnswerError::UnknownOption {
                    question_id: self.id.clone(),
                    value: value.to_string(),
                }),
        }
    }
}

/// Rejection raised when an answer does not fit the question kind.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnswerError {
    #[error("question '{question_id}' expects a number")]
    ExpectedNumber { question_id: String },
    #[error("question '{question_id}' expects true or false")]
    ExpectedBoolean { question_id: String },
    #[error("'{value}' is not an option of question '{question_id}'")]
    UnknownOption { question_id: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relatives() -> QuestionDefinition {
        QuestionDefinition::single_select(
            "first_degree_relatives",
            "Relatives",
            vec![
                SelectOption::new("None", 0),
                SelectOption::new("One", 1),
                SelectOption::new("Two or more", 2),
            ],
        )
    }

    #[test]
    fn integer_questions_truncate_and_parse_strings() {
        let age = QuestionDefinition::integer("age", "Age");
        assert_eq!(
            age.accept(AnswerValue::from("42.7")).expect("accepted"),
            Some(AnswerValue::Number(42.0))
        );
        assert_eq!(age.accept(AnswerValue::from("abc")).expect("accepted"), None);
        assert_eq!(age.accept(AnswerValue::from("")).expect("accepted"), None);
        assert!(age.accept(AnswerValue::Boolean(true)).is_err());
    }

    #[test]
    fn decimal_questions_keep_fraction() {
        let weight = QuestionDefinition::decimal("weight_kg", "Weight").with_unit(Unit::Kilograms);
        assert_eq!(
            weight.accept(AnswerValue::Number(64.5)).expect("accepted"),
            Some(AnswerValue::Number(64.5))
        );
    }

    #[test]
    fn select_accepts_numeric_strings_for_numeric_options() {
        let question = relatives();
        assert_eq!(
            question.accept(AnswerValue::from("1")).expect("accepted"),
            Some(AnswerValue::Number(1.0))
        );
        match question.accept(AnswerValue::from(5)) {
            Err(AnswerError::UnknownOption { value, .. }) => assert_eq!(value, "5"),
            other => panic!("expected unknown option, got {other:?}"),
        }
    }

    #[test]
    fn predicates_require_present_answers() {
        assert!(!VisibilityPredicate::Answered.evaluate(None));
        assert!(!VisibilityPredicate::Answered.evaluate(Some(&AnswerValue::from(""))));
        assert!(VisibilityPredicate::Answered.evaluate(Some(&AnswerValue::from(0))));
        assert!(!VisibilityPredicate::GreaterThan(0.0).evaluate(Some(&AnswerValue::from(0))));
        assert!(VisibilityPredicate::GreaterThan(0.0).evaluate(Some(&AnswerValue::from("2"))));
        assert!(VisibilityPredicate::AtLeast(50.0).evaluate(Some(&AnswerValue::from(50))));
        assert!(!VisibilityPredicate::AtLeast(50.0).evaluate(Some(&AnswerValue::from(49))));
    }
}
