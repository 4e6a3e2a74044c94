use serde::{Deserialize, Serialize};

pub const DEFAULT_AGE: u32 = 50;
pub const DEFAULT_FIRST_DEGREE_RELATIVES: u8 = 0;
pub const DEFAULT_PREVIOUS_BIOPSIES: u8 = 0;
pub const MAX_COUNTED_EVENTS: u8 = 2;

/// Age bucket of the first menstrual period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MenarcheAge {
    #[serde(rename = "<12")]
    Before12,
    #[default]
    #[serde(rename = "12-13")]
    From12To13,
    #[serde(rename = "14+")]
    From14,
}

impl MenarcheAge {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "<12" => Some(Self::Before12),
            "12-13" => Some(Self::From12To13),
            "14+" => Some(Self::From14),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Before12 => "<12",
            Self::From12To13 => "12-13",
            Self::From14 => "14+",
        }
    }
}

/// Age bucket at first live birth, including the no-children bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FirstBirthAge {
    #[serde(rename = "<20")]
    Before20,
    #[serde(rename = "20-24")]
    From20To24,
    #[default]
    #[serde(rename = "25-29")]
    From25To29,
    #[serde(rename = "30+")]
    From30,
    #[serde(rename = "nulliparous")]
    Nulliparous,
}

impl FirstBirthAge {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "<20" => Some(Self::Before20),
            "20-24" => Some(Self::From20To24),
            "25-29" => Some(Self::From25To29),
            "30+" => Some(Self::From30),
            "nulliparous" => Some(Self::Nulliparous),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Before20 => "<20",
            Self::From20To24 => "20-24",
            Self::From25To29 => "25-29",
            Self::From30 => "30+",
            Self::Nulliparous => "nulliparous",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmokingStatus {
    Never,
    Former,
    Current,
}

impl SmokingStatus {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "never" => Some(Self::Never),
            "former" => Some(Self::Former),
            "current" => Some(Self::Current),
            _ => None,
        }
    }
}

/// Body of `POST /risk/calculate-and-save`.
///
/// The six risk factors are always present. Lifestyle fields are serialized only when the
/// respondent supplied them, so the scorer can tell "not asked" from zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskRequestPayload {
    pub age: u32,
    pub first_degree_relatives: u8,
    pub previous_biopsies: u8,
    pub atypical_hyperplasia: bool,
    pub age_menarche: MenarcheAge,
    pub age_first_birth: FirstBirthAge,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height_cm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alcohol_consumption: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise_minutes_per_week: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smoking_status: Option<SmokingStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hormone_therapy: Option<bool>,
}

impl Default for RiskRequestPayload {
    fn default() -> Self {
        Self {
            age: DEFAULT_AGE,
            first_degree_relatives: DEFAULT_FIRST_DEGREE_RELATIVES,
            previous_biopsies: DEFAULT_PREVIOUS_BIOPSIES,
            atypical_hyperplasia: false,
            age_menarche: MenarcheAge::default(),
            age_first_birth: FirstBirthAge::default(),
            weight_kg: None,
            height_cm: None,
            alcohol_consumption: None,
            exercise_minutes_per_week: None,
            smoking_status: None,
            hormone_therapy: None,
        }
    }
}
