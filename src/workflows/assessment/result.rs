use serde::{Deserialize, Serialize};

use super::interpreter::{interpret_category, TierPresentation};

/// Scoring response returned by `POST /risk/calculate-and-save`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskResult {
    pub risk_category: String,
    pub risk_5_years: f64,
    #[serde(default)]
    pub average_risk_for_age: Option<f64>,
    #[serde(default)]
    pub risk_relative: Option<f64>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub warning_message: Option<String>,
    #[serde(default)]
    pub disclaimer: Option<String>,
    #[serde(default)]
    pub clinical_significance: Option<String>,
    #[serde(default)]
    pub significance_explanation: Option<String>,
    #[serde(default)]
    pub educational_message: Vec<String>,
    #[serde(default)]
    pub critical_warnings: Vec<String>,
    #[serde(default)]
    pub model_used: Option<String>,
    #[serde(default)]
    pub estimated_accuracy: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskComparison {
    pub average_risk_for_age: f64,
    pub risk_relative: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClinicalSignificance {
    pub headline: String,
    pub explanation: String,
}

/// Render-ready view of a scoring result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultView {
    pub presentation: TierPresentation,
    pub risk_5_years: f64,
    pub risk_5_years_display: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<RiskComparison>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clinical_significance: Option<ClinicalSignificance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning_message: Option<String>,
    pub recommendations: Vec<String>,
    pub educational_message: Vec<String>,
    pub critical_warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_accuracy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disclaimer: Option<String>,
}

impl ResultView {
    pub fn from_result(result: RiskResult) -> Self {
        let presentation = interpret_category(&result.risk_category);

        let comparison = match (result.average_risk_for_age, result.risk_relative) {
            (Some(average_risk_for_age), Some(risk_relative)) => Some(RiskComparison {
                average_risk_for_age,
                risk_relative,
            }),
            _ => None,
        };

        let clinical_significance = match (
            non_empty(result.clinical_significance),
            non_empty(result.significance_explanation),
        ) {
            (Some(headline), Some(explanation)) => Some(ClinicalSignificance {
                headline,
                explanation,
            }),
            _ => None,
        };

        Self {
            presentation,
            risk_5_years: result.risk_5_years,
            risk_5_years_display: format!("{:.2}%", result.risk_5_years),
            comparison,
            clinical_significance,
            warning_message: non_empty(result.warning_message),
            recommendations: result.recommendations,
            educational_message: result.educational_message,
            critical_warnings: result.critical_warnings,
            model_used: non_empty(result.model_used),
            estimated_accuracy: non_empty(result.estimated_accuracy),
            disclaimer: non_empty(result.disclaimer),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}
