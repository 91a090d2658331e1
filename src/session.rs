//! The analysis view: correlations, feature importance and model performance,
//! fetched concurrently into separate slots.

use crate::api::error::ClientError;
use crate::api::types::ModelPerformance;
use crate::api::Backend;
use crate::logging::ProfileScope;
use crate::rank::ImportanceRanking;
use crate::shape::{CanonicalCorrelationView, ShapeNormalizer};
use crate::state::{SharedSlot, SlotSnapshot};

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisView {
    pub correlations: SlotSnapshot<CanonicalCorrelationView>,
    pub importance: SlotSnapshot<ImportanceRanking>,
    pub performance: SlotSnapshot<ModelPerformance>,
}

impl AnalysisView {
    pub fn failures(&self) -> Vec<&str> {
        [
            self.correlations.error.as_deref(),
            self.importance.error.as_deref(),
            self.performance.error.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

/// Which slots accepted the responses of one refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshOutcome {
    pub correlations: bool,
    pub importance: bool,
    pub performance: bool,
}

#[derive(Clone)]
pub struct AnalysisSession {
    normalizer: ShapeNormalizer,
    correlations: SharedSlot<CanonicalCorrelationView>,
    importance: SharedSlot<ImportanceRanking>,
    performance: SharedSlot<ModelPerformance>,
}

impl AnalysisSession {
    pub fn new(normalizer: ShapeNormalizer) -> Self {
        Self {
            normalizer,
            correlations: SharedSlot::new("correlations"),
            importance: SharedSlot::new("feature_importance"),
            performance: SharedSlot::new("model_performance"),
        }
    }

    /// Issues all three requests at once and waits for every one of them.
    /// Each response lands in its own slot unless a newer refresh has since
    /// been issued for that slot.
    pub async fn refresh<B: Backend + ?Sized>(&self, backend: &B) -> RefreshOutcome {
        let _scope = ProfileScope::new("analysis_refresh");

        let correlations = async {
            let ticket = self.correlations.issue();
            let result = backend
                .correlations()
                .await
                .and_then(|raw| self.normalizer.normalize(&raw).map_err(ClientError::from));
            self.correlations
                .complete(ticket, result.map_err(|e| e.user_message()))
        };
        let importance = async {
            let ticket = self.importance.issue();
            let result = backend
                .feature_importance()
                .await
                .map(|fi| ImportanceRanking::from_scores(&fi.feature_importance));
            self.importance
                .complete(ticket, result.map_err(|e| e.user_message()))
        };
        let performance = async {
            let ticket = self.performance.issue();
            let result = backend.model_performance().await;
            self.performance
                .complete(ticket, result.map_err(|e| e.user_message()))
        };

        let (correlations, importance, performance) =
            tokio::join!(correlations, importance, performance);
        RefreshOutcome {
            correlations,
            importance,
            performance,
        }
    }

    pub fn view(&self) -> AnalysisView {
        AnalysisView {
            correlations: self.correlations.snapshot(),
            importance: self.importance.snapshot(),
            performance: self.performance.snapshot(),
        }
    }
}
