//! Recommendation listing with per-device scores and optional chat analysis.

use comparely_ai::{Analysis, ChatClient, LlmError, RecommendationAnalysis};
use comparely_core::{Device, RecommendationCriteria, device_score};
use comparely_store::{SharedStore, StoreError};
use serde::Serialize;
use tracing::info;

/// Upper bound on how many devices one request may ask for.
pub const MAX_RECOMMENDATION_LIMIT: usize = 20;

const NO_MATCHES: &str = "No devices match the given criteria.";

/// A device together with its desirability score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedDevice {
    #[serde(flatten)]
    pub device: Device,
    pub score: f64,
}

impl From<Device> for RankedDevice {
    fn from(device: Device) -> Self {
        let score = device_score(&device);
        Self { device, score }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Recommendations {
    pub devices: Vec<RankedDevice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_analysis: Option<Analysis<RecommendationAnalysis>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_unavailable: Option<String>,
}

#[derive(Clone)]
pub struct RecommendationService {
    store: SharedStore,
}

impl RecommendationService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Devices matching `criteria`, newest then cheapest first, each scored.
    pub fn rank(&self, criteria: &RecommendationCriteria) -> Result<Vec<RankedDevice>, StoreError> {
        let criteria = RecommendationCriteria {
            limit: Some(criteria.limit().clamp(1, MAX_RECOMMENDATION_LIMIT)),
            ..criteria.clone()
        };
        let devices = self.store.with(|s| s.recommend(&criteria))?;
        info!(count = devices.len(), "recommendations ranked");
        Ok(devices.into_iter().map(RankedDevice::from).collect())
    }

    /// [`rank`](Self::rank), then optionally ask the chat model to comment
    /// on the leading candidates.
    ///
    /// The store lock is released before the chat request is sent.
    pub async fn recommend(
        &self,
        criteria: &RecommendationCriteria,
        use_case: Option<&str>,
        llm: Option<&ChatClient>,
    ) -> Result<Recommendations, StoreError> {
        let devices = self.rank(criteria)?;
        let Some(llm) = llm else {
            return Ok(Recommendations {
                devices,
                ai_analysis: None,
                ai_unavailable: None,
            });
        };

        if devices.is_empty() {
            return Ok(Recommendations {
                devices,
                ai_analysis: None,
                ai_unavailable: Some(NO_MATCHES.to_string()),
            });
        }

        let candidates: Vec<Device> = devices.iter().map(|r| r.device.clone()).collect();
        let outcome: Result<_, LlmError> =
            llm.recommend(&candidates, use_case, criteria.max_price).await;
        let (ai_analysis, ai_unavailable) = match outcome {
            Ok(analysis) => (Some(analysis), None),
            Err(e) => (None, Some(e.user_message())),
        };
        Ok(Recommendations {
            devices,
            ai_analysis,
            ai_unavailable,
        })
    }
}
