//! History board — aggregate loading and optimistic deletion.
//!
//! The three history collections load concurrently but are applied
//! atomically: any failure keeps all of them at their prior state, so
//! the view never shows one tab populated and another silently blank.
//! Deletion is optimistic only after the server acknowledges — the
//! record leaves the local collection without a refetch, and never
//! before the 2xx.

use crate::error::{GatewayError, HistoryError};
use crate::gateway::HealthGateway;
use crate::models::{DietPlan, HistoryKind, SkinScan, SymptomScan};

/// Outcome of the yes/no gate shown before any destructive call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
}

/// What a delete attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Server acknowledged; record removed locally.
    Deleted,
    /// User declined the confirmation gate; nothing sent.
    Aborted,
    /// Skin analyses are not deletable; nothing sent, nothing changed.
    Unsupported,
}

/// State machine behind the history view.
pub struct HistoryBoard<G: HealthGateway> {
    gateway: G,
    symptom: Vec<SymptomScan>,
    diet: Vec<DietPlan>,
    skin: Vec<SkinScan>,
    loaded: bool,
}

impl<G: HealthGateway> HistoryBoard<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            symptom: Vec::new(),
            diet: Vec::new(),
            skin: Vec::new(),
            loaded: false,
        }
    }

    pub fn symptom_scans(&self) -> &[SymptomScan] {
        &self.symptom
    }

    pub fn diet_plans(&self) -> &[DietPlan] {
        &self.diet
    }

    pub fn skin_scans(&self) -> &[SkinScan] {
        &self.skin
    }

    /// Whether a load has completed successfully at least once.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Load all three collections concurrently.
    ///
    /// All-or-nothing: the collections are replaced in a single
    /// transition only when every request succeeded. On any failure the
    /// prior state is kept and the error carries each failed resource.
    pub async fn load(&mut self) -> Result<(), HistoryError> {
        let (symptom, diet, skin) = tokio::join!(
            self.gateway.fetch_symptom_history(),
            self.gateway.fetch_diet_history(),
            self.gateway.fetch_skin_history(),
        );

        match (symptom, diet, skin) {
            (Ok(symptom), Ok(diet), Ok(skin)) => {
                // Single state transition — no await between assignments.
                self.symptom = symptom;
                self.diet = diet;
                self.skin = skin;
                self.loaded = true;
                tracing::debug!(
                    symptom = self.symptom.len(),
                    diet = self.diet.len(),
                    skin = self.skin.len(),
                    "history loaded"
                );
                Ok(())
            }
            (symptom, diet, skin) => {
                let mut failures: Vec<(HistoryKind, GatewayError)> = Vec::new();
                if let Err(e) = symptom {
                    failures.push((HistoryKind::Symptom, e));
                }
                if let Err(e) = diet {
                    failures.push((HistoryKind::Diet, e));
                }
                if let Err(e) = skin {
                    failures.push((HistoryKind::Skin, e));
                }
                tracing::warn!(
                    failed = failures.len(),
                    "history aggregation failed, keeping prior collections"
                );
                Err(HistoryError::Aggregate { failures })
            }
        }
    }

    /// Delete one record after user confirmation.
    ///
    /// The local collection changes only after the server acknowledges;
    /// a failed request leaves it untouched so the user can retry.
    /// Skin analyses are not deletable — the call is a no-op that never
    /// reaches the network.
    pub async fn delete_record(
        &mut self,
        kind: HistoryKind,
        id: i64,
        confirmation: Confirmation,
    ) -> Result<DeleteOutcome, HistoryError> {
        if confirmation == Confirmation::Declined {
            tracing::debug!(%kind, id, "delete declined at confirmation gate");
            return Ok(DeleteOutcome::Aborted);
        }

        match kind {
            HistoryKind::Skin => {
                tracing::debug!(id, "skin analyses are not deletable, ignoring");
                Ok(DeleteOutcome::Unsupported)
            }
            HistoryKind::Symptom => {
                self.gateway
                    .delete_symptom_record(id)
                    .await
                    .map_err(HistoryError::Delete)?;
                self.symptom.retain(|r| r.id != id);
                tracing::info!(id, "symptom scan deleted");
                Ok(DeleteOutcome::Deleted)
            }
            HistoryKind::Diet => {
                self.gateway
                    .delete_diet_record(id)
                    .await
                    .map_err(HistoryError::Delete)?;
                self.diet.retain(|r| r.id != id);
                tracing::info!(id, "diet plan deleted");
                Ok(DeleteOutcome::Deleted)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{MockGateway, MockOp};
    use crate::models::{Macros, PlanData};

    fn scan(id: i64, disease: &str) -> SymptomScan {
        SymptomScan {
            id,
            date: "2026-03-01 14:20".into(),
            disease: disease.into(),
            symptoms: vec!["itching".into(), "skin_rash".into()],
        }
    }

    fn plan(id: i64) -> DietPlan {
        DietPlan {
            id,
            date: "2026-02-11 09:00".into(),
            goal: "maintain".into(),
            plan: PlanData {
                calories: 2100,
                macros: Macros {
                    protein: "157g".into(),
                    carbs: "210g".into(),
                    fats: "70g".into(),
                },
            },
        }
    }

    fn skin(id: i64) -> SkinScan {
        SkinScan {
            id,
            date: "2026-01-05 10:15".into(),
            condition_name: "Eczema".into(),
            probability: 87.5,
        }
    }

    fn populated_gateway() -> MockGateway {
        MockGateway::new()
            .with_symptom_history(vec![scan(1, "Allergy"), scan(2, "Migraine")])
            .with_diet_history(vec![plan(10)])
            .with_skin_history(vec![skin(20)])
    }

    #[tokio::test]
    async fn load_replaces_all_three_collections() {
        let mut board = HistoryBoard::new(populated_gateway());
        board.load().await.unwrap();
        assert!(board.is_loaded());
        assert_eq!(board.symptom_scans().len(), 2);
        assert_eq!(board.diet_plans().len(), 1);
        assert_eq!(board.skin_scans().len(), 1);
    }

    #[tokio::test]
    async fn one_failure_keeps_every_collection_at_prior_state() {
        let gateway = populated_gateway().with_failing(MockOp::DietHistory);
        let mut board = HistoryBoard::new(gateway);

        let err = board.load().await.unwrap_err();
        match err {
            HistoryError::Aggregate { failures } => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].0, HistoryKind::Diet);
            }
            other => panic!("expected aggregate error, got {other:?}"),
        }
        // First load: everything still empty, nothing partially applied.
        assert!(!board.is_loaded());
        assert!(board.symptom_scans().is_empty());
        assert!(board.diet_plans().is_empty());
        assert!(board.skin_scans().is_empty());
    }

    #[tokio::test]
    async fn failed_reload_preserves_previously_loaded_data() {
        let mut board = HistoryBoard::new(populated_gateway());
        board.load().await.unwrap();

        board.gateway.set_failing(MockOp::SkinHistory, true);
        assert!(board.load().await.is_err());
        // Reload failed, but the earlier snapshot is intact.
        assert_eq!(board.symptom_scans().len(), 2);
        assert_eq!(board.diet_plans().len(), 1);
        assert_eq!(board.skin_scans().len(), 1);
    }

    #[tokio::test]
    async fn all_failures_are_reported() {
        let gateway = MockGateway::new()
            .with_failing(MockOp::SymptomHistory)
            .with_failing(MockOp::DietHistory)
            .with_failing(MockOp::SkinHistory);
        let mut board = HistoryBoard::new(gateway);
        match board.load().await.unwrap_err() {
            HistoryError::Aggregate { failures } => assert_eq!(failures.len(), 3),
            other => panic!("expected aggregate error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn successful_delete_removes_exactly_that_record() {
        let mut board = HistoryBoard::new(populated_gateway());
        board.load().await.unwrap();

        let outcome = board
            .delete_record(HistoryKind::Symptom, 1, Confirmation::Confirmed)
            .await
            .unwrap();
        assert_eq!(outcome, DeleteOutcome::Deleted);
        assert_eq!(board.symptom_scans().len(), 1);
        assert_eq!(board.symptom_scans()[0].id, 2);
        // Other kinds untouched.
        assert_eq!(board.diet_plans().len(), 1);
        assert_eq!(board.skin_scans().len(), 1);
    }

    #[tokio::test]
    async fn failed_delete_leaves_record_in_place() {
        let gateway = populated_gateway().with_failing(MockOp::DeleteSymptom);
        let mut board = HistoryBoard::new(gateway);
        board.load().await.unwrap();

        let err = board
            .delete_record(HistoryKind::Symptom, 1, Confirmation::Confirmed)
            .await
            .unwrap_err();
        assert!(matches!(err, HistoryError::Delete(_)));
        // No speculative removal.
        assert_eq!(board.symptom_scans().len(), 2);
    }

    #[tokio::test]
    async fn declined_confirmation_sends_nothing() {
        let mut board = HistoryBoard::new(populated_gateway());
        board.load().await.unwrap();

        let outcome = board
            .delete_record(HistoryKind::Diet, 10, Confirmation::Declined)
            .await
            .unwrap();
        assert_eq!(outcome, DeleteOutcome::Aborted);
        assert_eq!(board.gateway.delete_calls(), 0);
        assert_eq!(board.diet_plans().len(), 1);
    }

    #[tokio::test]
    async fn skin_delete_is_a_network_free_noop() {
        let mut board = HistoryBoard::new(populated_gateway());
        board.load().await.unwrap();

        let outcome = board
            .delete_record(HistoryKind::Skin, 20, Confirmation::Confirmed)
            .await
            .unwrap();
        assert_eq!(outcome, DeleteOutcome::Unsupported);
        assert_eq!(board.gateway.delete_calls(), 0);
        assert_eq!(board.skin_scans().len(), 1);
    }
}
