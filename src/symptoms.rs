//! Symptom selection and prediction submission.
//!
//! The working set has set semantics (no duplicates by construction)
//! but preserves insertion order for chip display. Submission clears
//! it only on success; a failed request keeps the selection so the
//! user retries without reselecting.

use serde::Serialize;

use crate::error::{GatewayError, PredictError};
use crate::gateway::HealthGateway;
use crate::models::PredictionResult;

/// Insertion-order-preserving set of symptom identifiers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SymptomSelection {
    picked: Vec<String>,
}

impl SymptomSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle one symptom: add if absent, remove if present.
    /// Returns whether the symptom is selected afterwards.
    pub fn toggle(&mut self, symptom: &str) -> bool {
        if let Some(pos) = self.picked.iter().position(|s| s == symptom) {
            self.picked.remove(pos);
            false
        } else {
            self.picked.push(symptom.to_string());
            true
        }
    }

    pub fn contains(&self, symptom: &str) -> bool {
        self.picked.iter().any(|s| s == symptom)
    }

    pub fn clear(&mut self) {
        self.picked.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.picked.is_empty()
    }

    pub fn len(&self) -> usize {
        self.picked.len()
    }

    /// Selected symptoms in insertion order.
    pub fn as_slice(&self) -> &[String] {
        &self.picked
    }
}

/// Flow behind the symptom-checker screen.
pub struct PredictionFlow<G: HealthGateway> {
    gateway: G,
    selection: SymptomSelection,
    catalog: Vec<String>,
}

impl<G: HealthGateway> PredictionFlow<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            selection: SymptomSelection::new(),
            catalog: Vec::new(),
        }
    }

    pub fn selection(&self) -> &SymptomSelection {
        &self.selection
    }

    /// Selectable symptoms, as last fetched.
    pub fn catalog(&self) -> &[String] {
        &self.catalog
    }

    pub fn toggle(&mut self, symptom: &str) -> bool {
        self.selection.toggle(symptom)
    }

    /// Explicit reset ("Clear All").
    pub fn clear(&mut self) {
        self.selection.clear();
    }

    /// Fetch the selectable symptom catalog.
    pub async fn load_catalog(&mut self) -> Result<&[String], GatewayError> {
        self.catalog = self.gateway.fetch_symptom_catalog().await?;
        tracing::debug!(count = self.catalog.len(), "symptom catalog loaded");
        Ok(&self.catalog)
    }

    /// Submit the working set for prediction.
    ///
    /// An empty set is rejected locally with no request. On success the
    /// result is returned for the result view and the selection is
    /// cleared; on failure the selection is preserved unchanged.
    pub async fn submit(&mut self) -> Result<PredictionResult, PredictError> {
        if self.selection.is_empty() {
            return Err(PredictError::EmptySelection);
        }

        let result = self.gateway.predict(self.selection.as_slice()).await?;
        tracing::info!(
            final_prediction = %result.final_prediction,
            symptoms = self.selection.len(),
            "prediction received"
        );
        self.selection.clear();
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{MockGateway, MockOp};
    use crate::models::ModelVote;
    use std::collections::BTreeMap;

    fn prediction(disease: &str) -> PredictionResult {
        let mut predictions = BTreeMap::new();
        predictions.insert(
            "random_forest".to_string(),
            ModelVote {
                disease: disease.into(),
                confidence: 92.4,
            },
        );
        PredictionResult {
            predictions,
            final_prediction: disease.into(),
            remedies: vec!["Rest".into()],
            exercises: vec!["Stretching".into()],
        }
    }

    #[test]
    fn toggle_adds_then_removes() {
        let mut selection = SymptomSelection::new();
        assert!(selection.toggle("itching"));
        assert!(selection.contains("itching"));
        assert!(!selection.toggle("itching"));
        assert!(selection.is_empty());
    }

    #[test]
    fn toggle_twice_restores_contents_and_order() {
        let mut selection = SymptomSelection::new();
        selection.toggle("itching");
        selection.toggle("skin_rash");
        selection.toggle("fatigue");
        let before = selection.clone();

        selection.toggle("headache");
        selection.toggle("headache");
        assert_eq!(selection, before);
        assert_eq!(selection.as_slice(), ["itching", "skin_rash", "fatigue"]);
    }

    #[test]
    fn no_duplicates_by_construction() {
        let mut selection = SymptomSelection::new();
        selection.toggle("fever");
        selection.toggle("cough");
        selection.toggle("fever"); // removes
        selection.toggle("fever"); // re-adds at the end
        assert_eq!(selection.as_slice(), ["cough", "fever"]);
        assert_eq!(selection.len(), 2);
    }

    #[tokio::test]
    async fn empty_submission_issues_zero_requests() {
        let mut flow = PredictionFlow::new(MockGateway::new());
        let err = flow.submit().await.unwrap_err();
        assert!(matches!(err, PredictError::EmptySelection));
        assert_eq!(flow.gateway.predict_calls(), 0);
    }

    #[tokio::test]
    async fn successful_submission_returns_result_and_clears_selection() {
        let gateway = MockGateway::new().with_prediction(prediction("Fungal infection"));
        let mut flow = PredictionFlow::new(gateway);
        flow.toggle("itching");
        flow.toggle("skin_rash");

        let result = flow.submit().await.unwrap();
        assert_eq!(result.final_prediction, "Fungal infection");
        assert!(!result.final_prediction.is_empty());
        assert!(flow.selection().is_empty());
        assert_eq!(flow.gateway.predict_calls(), 1);
        // Submitted in insertion order, exactly once.
        assert_eq!(
            flow.gateway.predicted_sets(),
            vec![vec!["itching".to_string(), "skin_rash".to_string()]]
        );
    }

    #[tokio::test]
    async fn failed_submission_preserves_selection() {
        let gateway = MockGateway::new()
            .with_prediction(prediction("Allergy"))
            .with_failing(MockOp::Predict);
        let mut flow = PredictionFlow::new(gateway);
        flow.toggle("itching");
        flow.toggle("skin_rash");

        let err = flow.submit().await.unwrap_err();
        assert!(matches!(err, PredictError::Gateway(_)));
        assert_eq!(flow.selection().as_slice(), ["itching", "skin_rash"]);

        // Retry without reselecting.
        flow.gateway.set_failing(MockOp::Predict, false);
        let result = flow.submit().await.unwrap();
        assert_eq!(result.final_prediction, "Allergy");
        assert!(flow.selection().is_empty());
    }

    #[tokio::test]
    async fn catalog_load_stores_symptoms() {
        let gateway =
            MockGateway::new().with_catalog(vec!["itching".into(), "fatigue".into()]);
        let mut flow = PredictionFlow::new(gateway);
        let catalog = flow.load_catalog().await.unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(flow.catalog(), ["itching", "fatigue"]);
    }

    #[test]
    fn clear_resets_selection() {
        let mut flow = PredictionFlow::new(MockGateway::new());
        flow.toggle("fever");
        flow.clear();
        assert!(flow.selection().is_empty());
    }
}
