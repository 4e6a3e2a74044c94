use tracing::debug;

use super::payload::{
    FirstBirthAge, MenarcheAge, RiskRequestPayload, SmokingStatus, DEFAULT_AGE,
    DEFAULT_FIRST_DEGREE_RELATIVES, DEFAULT_PREVIOUS_BIOPSIES, MAX_COUNTED_EVENTS,
};
use super::questionnaire::AnswerSet;

/// Build the scoring payload from whatever subset of the questionnaire was answered.
///
/// Required factors fall back to their documented defaults when missing or unparsable.
/// Lifestyle factors are only emitted when an answer exists.
pub fn normalize_answers(answers: &AnswerSet) -> RiskRequestPayload {
    let age = integer(answers, "age")
        .filter(|age| *age > 0)
        .and_then(|age| u32::try_from(age).ok())
        .unwrap_or(DEFAULT_AGE);

    let first_degree_relatives = event_count(answers, "first_degree_relatives")
        .unwrap_or(DEFAULT_FIRST_DEGREE_RELATIVES);
    let previous_biopsies =
        event_count(answers, "previous_biopsies").unwrap_or(DEFAULT_PREVIOUS_BIOPSIES);

    let atypical_hyperplasia = flag(answers, "atypical_hyperplasia").unwrap_or(false);

    let age_menarche = text(answers, "age_menarche")
        .and_then(MenarcheAge::from_code)
        .unwrap_or_default();
    let age_first_birth = text(answers, "age_first_birth")
        .and_then(FirstBirthAge::from_code)
        .unwrap_or_default();

    let smoking_status = text(answers, "smoking_status").and_then(|code| {
        let status = SmokingStatus::from_code(code);
        if status.is_none() {
            debug!(code, "dropping unrecognized smoking status");
        }
        status
    });

    RiskRequestPayload {
        age,
        first_degree_relatives,
        previous_biopsies,
        atypical_hyperplasia,
        age_menarche,
        age_first_birth,
        weight_kg: positive_decimal(answers, "weight_kg"),
        height_cm: positive_decimal(answers, "height_cm"),
        alcohol_consumption: weekly_amount(answers, "alcohol_consumption"),
        exercise_minutes_per_week: weekly_amount(answers, "exercise_minutes_per_week"),
        smoking_status,
        hormone_therapy: answers
            .contains("hormone_therapy")
            .then(|| flag(answers, "hormone_therapy").unwrap_or(false)),
    }
}

fn integer(answers: &AnswerSet, id: &str) -> Option<i64> {
    answers
        .get(id)
        .and_then(|value| value.as_f64())
        .map(|value| value.trunc() as i64)
}

fn event_count(answers: &AnswerSet, id: &str) -> Option<u8> {
    integer(answers, id).map(|count| count.clamp(0, i64::from(MAX_COUNTED_EVENTS)) as u8)
}

fn flag(answers: &AnswerSet, id: &str) -> Option<bool> {
    answers.get(id).and_then(|value| value.as_bool())
}

fn text<'a>(answers: &'a AnswerSet, id: &str) -> Option<&'a str> {
    answers
        .get(id)
        .and_then(|value| value.as_text())
        .filter(|text| !text.is_empty())
}

fn positive_decimal(answers: &AnswerSet, id: &str) -> Option<f64> {
    answers
        .get(id)
        .and_then(|value| value.as_f64())
        .filter(|value| *value > 0.0)
}

/// Present answers always produce a value: unparsable input reads as zero.
fn weekly_amount(answers: &AnswerSet, id: &str) -> Option<u32> {
    if !answers.contains(id) {
        return None;
    }

    let amount = integer(answers, id).unwrap_or(0).clamp(0, i64::from(u32::MAX));
    Some(amount as u32)
}
