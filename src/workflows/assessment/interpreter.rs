use serde::Serialize;
use tracing::warn;

/// Coarse display category for a backend risk label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskTier {
    Low,
    Moderate,
    High,
    VeryHigh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Positive,
    Caution,
    Warning,
    Alert,
}

impl RiskTier {
    /// Exact, case-sensitive match on the backend category label.
    pub fn from_category(category: &str) -> Option<Self> {
        match category {
            "Faible" => Some(Self::Low),
            "Modéré" => Some(Self::Moderate),
            "Élevé" => Some(Self::High),
            "Très élevé" => Some(Self::VeryHigh),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "faible",
            Self::Moderate => "modéré",
            Self::High => "élevé",
            Self::VeryHigh => "très élevé",
        }
    }

    pub fn tone(self) -> Tone {
        match self {
            Self::Low => Tone::Positive,
            Self::Moderate => Tone::Caution,
            Self::High => Tone::Warning,
            Self::VeryHigh => Tone::Alert,
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Self::Low => "green",
            Self::Moderate => "yellow",
            Self::High => "orange",
            Self::VeryHigh => "red",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierPresentation {
    pub category: String,
    pub tier: RiskTier,
    pub label: &'static str,
    pub tone: Tone,
    pub color: &'static str,
    /// `false` when the label was not recognized and the low tier was used as a fallback.
    pub recognized: bool,
}

/// Map a backend category label to its presentation tier.
///
/// Unknown labels render with the low tier, mirroring the current portal. The fallback is
/// flagged on the result and logged because it can hide a label mismatch with the scorer.
pub fn interpret_category(category: &str) -> TierPresentation {
    let (tier, recognized) = match RiskTier::from_category(category) {
        Some(tier) => (tier, true),
        None => {
            warn!(category, "unrecognized risk category; rendering low tier");
            (RiskTier::Low, false)
        }
    };

    TierPresentation {
        category: category.to_string(),
        tier,
        label: tier.label(),
        tone: tier.tone(),
        color: tier.color(),
        recognized,
    }
}
