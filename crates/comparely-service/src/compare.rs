//! Comparison facade: fetch two devices, evaluate the rule engine, try the
//! augmentation service, and finalize with whichever highlights survived.

use std::collections::BTreeMap;
use std::sync::Arc;

use comparely_ai::{
    Analysis, AugmentationClient, AugmentationResult, ChatClient, ComparisonAnalysis, LlmError,
    MergedHighlights, Provenance, merge,
};
use comparely_core::{Device, DeviceId, DeviceRepository, Highlight, generate_highlights};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum CompareError {
    #[error("device {0} not found")]
    NotFound(DeviceId),
    #[error("device lookup failed: {0}")]
    Repository(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// The outcome of comparing two devices.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub device_1: Device,
    pub device_2: Device,
    pub highlights: Vec<Highlight>,
    pub summary: Option<String>,
    pub scores: BTreeMap<String, f64>,
    pub provenance: Provenance,
}

impl ComparisonResult {
    fn new(device_1: Device, device_2: Device, merged: MergedHighlights) -> Self {
        Self {
            device_1,
            device_2,
            highlights: merged.highlights,
            summary: merged.summary,
            scores: merged.scores,
            provenance: merged.provenance,
        }
    }
}

/// Orchestrates one comparison per call. Holds no per-request state.
pub struct ComparisonService<R> {
    repo: R,
    augmenter: Arc<AugmentationClient>,
}

impl<R: DeviceRepository> ComparisonService<R> {
    pub fn new(repo: R, augmenter: Arc<AugmentationClient>) -> Self {
        Self { repo, augmenter }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Compare `id1` against `id2`.
    ///
    /// Fails only when a device is missing or the repository errors. If `id1`
    /// does not resolve, `id2` is never fetched. Augmentation problems never
    /// surface here; they end in a `rule_based` result.
    pub async fn compare(
        &self,
        id1: DeviceId,
        id2: DeviceId,
    ) -> Result<ComparisonResult, CompareError> {
        let first = self.fetch(id1)?;
        let second = self.fetch(id2)?;

        let rule_highlights = generate_highlights(&first, &second);
        debug!(id1, id2, count = rule_highlights.len(), "rule-based highlights evaluated");

        let augmentation = self
            .augmenter
            .augment(&first, &second, &rule_highlights)
            .await
            .map(|payload| AugmentationResult::from_payload(&payload));

        // Client errors are logged by the client itself.
        let merged = match augmentation {
            Ok(valid @ AugmentationResult::Valid { .. }) => merge(rule_highlights, valid),
            Ok(AugmentationResult::Invalid) | Err(_) => MergedHighlights::fallback(rule_highlights),
        };
        info!(
            id1,
            id2,
            provenance = ?merged.provenance,
            highlights = merged.highlights.len(),
            "comparison finalized"
        );
        Ok(ComparisonResult::new(first, second, merged))
    }

    fn fetch(&self, id: DeviceId) -> Result<Device, CompareError> {
        self.repo
            .get_device(id)
            .map_err(|e| CompareError::Repository(Box::new(e)))?
            .ok_or(CompareError::NotFound(id))
    }
}

/// A comparison plus the optional chat-model commentary.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzedComparison {
    #[serde(flatten)]
    pub comparison: ComparisonResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_analysis: Option<Analysis<ComparisonAnalysis>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_unavailable: Option<String>,
}

impl AnalyzedComparison {
    /// Attach chat analysis to `comparison`. Analysis failures become a
    /// user-facing `ai_unavailable` message.
    pub async fn build(comparison: ComparisonResult, llm: Option<&ChatClient>) -> Self {
        let outcome = match llm {
            Some(client) => {
                client
                    .analyze_comparison(&comparison.device_1, &comparison.device_2)
                    .await
            }
            None => Err(LlmError::MissingApiKey),
        };
        let (ai_analysis, ai_unavailable) = match outcome {
            Ok(analysis) => (Some(analysis), None),
            Err(e) => (None, Some(e.user_message())),
        };
        Self {
            comparison,
            ai_analysis,
            ai_unavailable,
        }
    }
}
