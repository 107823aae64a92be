//! Data model for the orchestration core.
//!
//! Every gateway payload has an explicit typed schema here; parsing
//! happens at the boundary and fails closed on shape mismatch. Field
//! names follow the wire contract (serde renames where they differ).

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Date format the gateway uses for record timestamps.
pub const GATEWAY_DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

// ═══════════════════════════════════════════════════════════
// History records
// ═══════════════════════════════════════════════════════════

/// Which of the three independently-loaded history collections a
/// record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryKind {
    Symptom,
    Diet,
    Skin,
}

impl std::fmt::Display for HistoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Symptom => write!(f, "symptom scan"),
            Self::Diet => write!(f, "diet plan"),
            Self::Skin => write!(f, "skin analysis"),
        }
    }
}

/// One saved symptom analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymptomScan {
    pub id: i64,
    pub date: String,
    pub disease: String,
    pub symptoms: Vec<String>,
}

/// Macro split of a generated diet plan. The gateway formats each
/// value as a display string ("142g"), so they stay strings here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Macros {
    pub protein: String,
    pub carbs: String,
    pub fats: String,
}

/// Computed portion of a diet plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanData {
    pub calories: u32,
    pub macros: Macros,
}

/// One saved diet plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DietPlan {
    pub id: i64,
    pub date: String,
    pub goal: String,
    #[serde(rename = "plan_data")]
    pub plan: PlanData,
}

/// One saved skin analysis. Not user-deletable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkinScan {
    pub id: i64,
    pub date: String,
    pub condition_name: String,
    /// Model confidence, 0–100.
    pub probability: f32,
}

/// Parse a gateway record timestamp. `None` if the gateway ever sends
/// a malformed date — callers fall back to the raw string for display.
pub fn parse_record_date(date: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(date, GATEWAY_DATE_FORMAT).ok()
}

impl SymptomScan {
    pub fn recorded_at(&self) -> Option<NaiveDateTime> {
        parse_record_date(&self.date)
    }
}

impl DietPlan {
    pub fn recorded_at(&self) -> Option<NaiveDateTime> {
        parse_record_date(&self.date)
    }
}

impl SkinScan {
    pub fn recorded_at(&self) -> Option<NaiveDateTime> {
        parse_record_date(&self.date)
    }
}

// ═══════════════════════════════════════════════════════════
// Contacts, location, prediction
// ═══════════════════════════════════════════════════════════

/// An emergency contact. CRUD lives outside this core; the SOS
/// dispatcher only reads the count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyContact {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
}

/// A geolocation fix. Never absent — when the device cannot produce
/// one, [`LocationFix::FALLBACK`] stands in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
}

impl LocationFix {
    /// The unknown-location sentinel the alert wire contract expects.
    ///
    /// Indistinguishable from a legitimate 0°N 0°E fix; kept as-is for
    /// wire compatibility with the gateway.
    pub const FALLBACK: LocationFix = LocationFix {
        latitude: 0.0,
        longitude: 0.0,
    };

    pub fn is_fallback(&self) -> bool {
        *self == Self::FALLBACK
    }
}

/// One model's vote within a prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelVote {
    pub disease: String,
    /// 0–100.
    pub confidence: f32,
}

/// Result of a symptom prediction. Immutable once received; handed to
/// the result view, never persisted client-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Per-model votes, keyed by model name.
    pub predictions: BTreeMap<String, ModelVote>,
    pub final_prediction: String,
    pub remedies: Vec<String>,
    pub exercises: Vec<String>,
}

// ═══════════════════════════════════════════════════════════
// Wire envelopes
// ═══════════════════════════════════════════════════════════

/// `{"history": [...]}` — shared by the three history endpoints.
#[derive(Debug, Deserialize)]
pub struct HistoryEnvelope<T> {
    pub history: Vec<T>,
}

/// `{"contacts": [...]}` from GET /contacts.
#[derive(Debug, Deserialize)]
pub struct ContactsEnvelope {
    pub contacts: Vec<EmergencyContact>,
}

/// `{"symptoms": [...]}` from GET /symptoms.
#[derive(Debug, Deserialize)]
pub struct SymptomCatalogEnvelope {
    pub symptoms: Vec<String>,
}

/// `{"symptoms": [...]}` body for POST /predict.
#[derive(Debug, Serialize)]
pub struct PredictRequest<'a> {
    pub symptoms: &'a [String],
}
