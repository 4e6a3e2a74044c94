use breastcare_intake::workflows::assessment::{
    AccountType, BearerCredential, CurrentUser, FirstBirthAge, GatewayError, MenarcheAge,
    RiskBackend, RiskRequestPayload, RiskResult,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) const SCRIPTED_MODEL: &str = "scripted-demo";

/// In-process stand-in for the scoring backend used by the demo and local UI work.
///
/// Every credential resolves to the configured account type. Scores come from a fixed
/// factor count and carry no clinical meaning.
#[derive(Clone)]
pub(crate) struct ScriptedRiskBackend {
    account: AccountType,
    submissions: Arc<Mutex<Vec<RiskRequestPayload>>>,
}

impl Default for ScriptedRiskBackend {
    fn default() -> Self {
        Self::for_account(AccountType::Patient)
    }
}

impl ScriptedRiskBackend {
    pub(crate) fn for_account(account: AccountType) -> Self {
        Self {
            account,
            submissions: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn submissions(&self) -> Vec<RiskRequestPayload> {
        self.submissions
            .lock()
            .expect("submissions mutex poisoned")
            .clone()
    }
}

impl RiskBackend for ScriptedRiskBackend {
    async fn current_user(
        &self,
        _credential: &BearerCredential,
    ) -> Result<CurrentUser, GatewayError> {
        Ok(CurrentUser {
            user_type: self.account,
            email: None,
        })
    }

    async fn calculate_and_save(
        &self,
        _credential: &BearerCredential,
        payload: &RiskRequestPayload,
    ) -> Result<RiskResult, GatewayError> {
        self.submissions
            .lock()
            .expect("submissions mutex poisoned")
            .push(payload.clone());
        Ok(scripted_result(payload))
    }
}

fn elevated_factors(payload: &RiskRequestPayload) -> u32 {
    let mut factors = u32::from(payload.first_degree_relatives);
    if payload.previous_biopsies > 0 {
        factors += 1;
    }
    if payload.atypical_hyperplasia {
        factors += 2;
    }
    if payload.age_menarche == MenarcheAge::Before12 {
        factors += 1;
    }
    if matches!(
        payload.age_first_birth,
        FirstBirthAge::From30 | FirstBirthAge::Nulliparous
    ) {
        factors += 1;
    }
    if payload.age >= 50 {
        factors += 1;
    }
    factors
}

pub(crate) fn scripted_result(payload: &RiskRequestPayload) -> RiskResult {
    let factors = elevated_factors(payload);
    let category = match factors {
        0..=1 => "Faible",
        2..=3 => "Modéré",
        4..=5 => "Élevé",
        _ => "Très élevé",
    };
    let risk_5_years = 0.6 + 0.55 * f64::from(factors);
    let average = if payload.age >= 50 { 1.4 } else { 0.8 };

    RiskResult {
        risk_category: category.to_string(),
        risk_5_years,
        average_risk_for_age: Some(average),
        risk_relative: Some(risk_5_years / average),
        recommendations: vec![
            "Parlez de ce résultat avec votre médecin traitant".to_string(),
            "Participez au dépistage organisé recommandé pour votre âge".to_string(),
        ],
        warning_message: None,
        disclaimer: Some(
            "Résultat scénarisé pour la démonstration : aucun modèle clinique n'a été exécuté."
                .to_string(),
        ),
        clinical_significance: None,
        significance_explanation: None,
        educational_message: Vec::new(),
        critical_warnings: Vec::new(),
        model_used: Some(SCRIPTED_MODEL.to_string()),
        estimated_accuracy: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_tiers_follow_factor_count() {
        let baseline = RiskRequestPayload {
            age: 35,
            ..RiskRequestPayload::default()
        };
        assert_eq!(scripted_result(&baseline).risk_category, "Faible");

        let loaded = RiskRequestPayload {
            age: 62,
            first_degree_relatives: 2,
            previous_biopsies: 1,
            atypical_hyperplasia: true,
            ..RiskRequestPayload::default()
        };
        let result = scripted_result(&loaded);
        assert_eq!(result.risk_category, "Très élevé");
        assert_eq!(result.model_used.as_deref(), Some(SCRIPTED_MODEL));
    }

    #[tokio::test]
    async fn scripted_backend_records_submissions() {
        let backend = ScriptedRiskBackend::for_account(AccountType::Professional);
        let credential = BearerCredential::new("demo").expect("token");

        let user = backend.current_user(&credential).await.expect("user");
        assert_eq!(user.user_type, AccountType::Professional);

        backend
            .calculate_and_save(&credential, &RiskRequestPayload::default())
            .await
            .expect("scores");
        assert_eq!(backend.submissions().len(), 1);
    }
}
