use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Raw answer as it arrives from a form control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Boolean(bool),
    Number(f64),
    Text(String),
}

impl AnswerValue {
    /// `0`, `false` and any non-empty string count as an answer; an empty string does not.
    pub fn is_present(&self) -> bool {
        match self {
            AnswerValue::Boolean(_) => true,
            AnswerValue::Number(value) => value.is_finite(),
            AnswerValue::Text(text) => !text.is_empty(),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AnswerValue::Number(value) if value.is_finite() => Some(*value),
            AnswerValue::Number(_) => None,
            AnswerValue::Text(text) => text
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite()),
            AnswerValue::Boolean(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AnswerValue::Boolean(value) => Some(*value),
            AnswerValue::Text(text) => match text.trim() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            AnswerValue::Number(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AnswerValue::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerValue::Boolean(value) => write!(f, "{value}"),
            AnswerValue::Number(value) => write!(f, "{value}"),
            AnswerValue::Text(text) => write!(f, "{text}"),
        }
    }
}

impl From<bool> for AnswerValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<f64> for AnswerValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for AnswerValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AnswerValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Answers keyed by question id.
///
/// Updates never mutate an existing set: [`AnswerSet::with_answer`] and
/// [`AnswerSet::without`] return a replacement, so a set handed out earlier keeps
/// describing the state it was taken from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSet {
    entries: BTreeMap<String, AnswerValue>,
}

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, question_id: &str) -> Option<&AnswerValue> {
        self.entries.get(question_id)
    }

    pub fn contains(&self, question_id: &str) -> bool {
        self.entries.contains_key(question_id)
    }

    pub fn is_answered(&self, question_id: &str) -> bool {
        self.get(question_id)
            .map(AnswerValue::is_present)
            .unwrap_or(false)
    }

    pub fn with_answer(&self, question_id: impl Into<String>, value: AnswerValue) -> Self {
        let mut entries = self.entries.clone();
        entries.insert(question_id.into(), value);
        Self { entries }
    }

    pub fn without(&self, question_id: &str) -> Self {
        let mut entries = self.entries.clone();
        entries.remove(question_id);
        Self { entries }
    }

    /// Keep only the entries whose id satisfies `keep`.
    pub fn retain_ids<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(&str) -> bool,
    {
        let entries = self
            .entries
            .iter()
            .filter(|(id, _)| keep(id.as_str()))
            .map(|(id, value)| (id.clone(), value.clone()))
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AnswerValue)> {
        self.entries.iter().map(|(id, value)| (id.as_str(), value))
    }
}

impl<K> FromIterator<(K, AnswerValue)> for AnswerSet
where
    K: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, AnswerValue)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(id, value)| (id.into(), value))
                .collect(),
        }
    }
}
