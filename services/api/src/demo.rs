use crate::infra::ScriptedRiskBackend;
use breastcare_intake::error::AppError;
use breastcare_intake::workflows::assessment::{
    AnswerValue, AssessmentService, BearerCredential, QuestionCatalog, ResultView,
    SessionPolicy, StepOutcome,
};
use clap::Args;
use std::sync::Arc;

const DEMO_TOKEN: &str = "demo-patient-token";

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Age answered on the first question. 50 and above adds the hormone therapy question.
    #[arg(long, default_value_t = 55)]
    pub(crate) age: u8,
    /// Number of first-degree relatives with breast cancer (0, 1 or 2).
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(0..=2))]
    pub(crate) relatives: u8,
    /// Answer one biopsy with atypical hyperplasia.
    #[arg(long)]
    pub(crate) biopsy: bool,
    /// Print the results view as JSON instead of a summary.
    #[arg(long)]
    pub(crate) json: bool,
}

impl Default for DemoArgs {
    fn default() -> Self {
        Self {
            age: 55,
            relatives: 1,
            biopsy: false,
            json: false,
        }
    }
}

/// Walk the questionnaire with scripted answers against the in-process scoring backend.
pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let catalog = Arc::new(QuestionCatalog::breast_cancer_risk());
    let backend = Arc::new(ScriptedRiskBackend::default());
    let service = AssessmentService::new(catalog, Arc::clone(&backend), SessionPolicy::default());
    let Some(credential) = BearerCredential::new(DEMO_TOKEN) else {
        return Ok(());
    };

    println!("Breast cancer risk questionnaire demo (scripted scoring, not clinical)");
    let mut snapshot = match service.start(Some(credential.clone())) {
        Ok(snapshot) => snapshot,
        Err(err) => {
            println!("  Session refused: {err}");
            return Ok(());
        }
    };
    let session_id = snapshot.session_id;

    loop {
        let question = snapshot.step.question.clone();
        let Some(value) = scripted_answer(&question.id, &args) else {
            println!("  No scripted answer for '{}'; stopping", question.id);
            return Ok(());
        };

        println!(
            "[{}/{} {:>3}%] {}",
            snapshot.step.position, snapshot.step.total, snapshot.step.progress_pct, question.prompt
        );
        println!("    -> {}", describe(&value));

        if let Err(err) = service.answer(session_id, &credential, value) {
            println!("  Answer rejected: {err}");
            return Ok(());
        }

        match service.next(session_id, &credential) {
            Ok(StepOutcome::Moved { session }) => snapshot = session,
            Ok(StepOutcome::Blocked { .. }) => {
                println!("  Question '{}' still needs an answer", question.id);
                return Ok(());
            }
            Ok(StepOutcome::Complete { redirect }) => {
                println!("Questionnaire complete, continuing to {redirect}");
                break;
            }
            Err(err) => {
                println!("  Navigation failed: {err}");
                return Ok(());
            }
        }
    }

    if let Some(payload) = backend.submissions().last() {
        println!("Submitted payload:");
        println!("{}", serde_json::to_string_pretty(payload)?);
    }

    let view = match service.results(session_id, Some(credential)).await {
        Ok(view) => view,
        Err(err) => {
            println!("  Results unavailable: {err}");
            return Ok(());
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        render_result(&view);
    }

    Ok(())
}

fn scripted_answer(question_id: &str, args: &DemoArgs) -> Option<AnswerValue> {
    let value = match question_id {
        "age" => AnswerValue::from(i32::from(args.age)),
        "first_degree_relatives" => AnswerValue::from(i32::from(args.relatives)),
        "previous_biopsies" => AnswerValue::from(i32::from(args.biopsy)),
        "atypical_hyperplasia" => AnswerValue::from(args.biopsy),
        "age_menarche" => AnswerValue::from("12-13"),
        "age_first_birth" => AnswerValue::from("25-29"),
        "weight_kg" => AnswerValue::from(64.5),
        "height_cm" => AnswerValue::from(165.0),
        "alcohol_consumption" => AnswerValue::from(2),
        "exercise_minutes_per_week" => AnswerValue::from(150),
        "smoking_status" => AnswerValue::from("never"),
        "hormone_therapy" => AnswerValue::from(false),
        _ => return None,
    };
    Some(value)
}

fn describe(value: &AnswerValue) -> String {
    match value {
        AnswerValue::Boolean(true) => "oui".to_string(),
        AnswerValue::Boolean(false) => "non".to_string(),
        AnswerValue::Number(number) => number.to_string(),
        AnswerValue::Text(text) => text.clone(),
    }
}

fn render_result(view: &ResultView) {
    println!(
        "\nRisque {} ({}) : {} sur 5 ans",
        view.presentation.label, view.presentation.color, view.risk_5_years_display
    );
    if let Some(comparison) = &view.comparison {
        println!(
            "- moyenne pour l'âge {:.2}% | risque relatif x{:.2}",
            comparison.average_risk_for_age, comparison.risk_relative
        );
    }
    if let Some(warning) = &view.warning_message {
        println!("- avertissement : {warning}");
    }
    if !view.recommendations.is_empty() {
        println!("Recommandations :");
        for recommendation in &view.recommendations {
            println!("  - {recommendation}");
        }
    }
    if let Some(model) = &view.model_used {
        println!("Modèle : {model}");
    }
    if let Some(disclaimer) = &view.disclaimer {
        println!("{disclaimer}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_catalog_question_has_a_scripted_answer() {
        let args = DemoArgs::default();
        for question in QuestionCatalog::breast_cancer_risk().questions() {
            assert!(
                scripted_answer(&question.id, &args).is_some(),
                "missing answer for {}",
                question.id
            );
        }
    }

    #[test]
    fn biopsy_flag_drives_hyperplasia_answers() {
        let args = DemoArgs {
            biopsy: true,
            ..DemoArgs::default()
        };
        assert_eq!(
            scripted_answer("previous_biopsies", &args),
            Some(AnswerValue::Number(1.0))
        );
        assert_eq!(
            scripted_answer("atypical_hyperplasia", &args),
            Some(AnswerValue::Boolean(true))
        );
    }

    #[tokio::test]
    async fn demo_runs_to_results() {
        run_demo(DemoArgs {
            json: true,
            ..DemoArgs::default()
        })
        .await
        .expect("demo completes");
    }
}
