//! Validation of augmentation payloads and the rule-based fallback.
//!
//! The webhook is an external contract we do not control, so its body is
//! checked key by key. Anything short of at least one well-formed highlight
//! is [`AugmentationResult::Invalid`] and the caller falls back to the
//! locally generated highlights.

use std::collections::BTreeMap;

use comparely_core::Highlight;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Summary attached to results that were not augmented.
pub const FALLBACK_SUMMARY: &str =
    "Comparison based on the catalogue specifications of both devices.";

/// Where the highlights of a comparison came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    RuleBased,
    Augmented,
}

/// A validated augmentation payload.
#[derive(Debug, Clone, PartialEq)]
pub enum AugmentationResult {
    Valid {
        highlights: Vec<Highlight>,
        summary: Option<String>,
        scores: BTreeMap<String, f64>,
    },
    Invalid,
}

impl AugmentationResult {
    /// Check the shape of a webhook response body.
    ///
    /// `ai_highlights` must be an array; entries missing a string
    /// `category`, `winner` or `reason` are dropped. An empty result is
    /// `Invalid`.
    pub fn from_payload(payload: &Value) -> Self {
        let Some(entries) = payload.get("ai_highlights").and_then(Value::as_array) else {
            warn!("augmentation response has no ai_highlights array");
            return Self::Invalid;
        };

        let highlights: Vec<Highlight> = entries
            .iter()
            .enumerate()
            .filter_map(|(i, entry)| {
                let parsed = entry.as_object().and_then(highlight_from_object);
                if parsed.is_none() {
                    warn!(index = i, "dropping malformed augmentation highlight");
                }
                parsed
            })
            .collect();

        if highlights.is_empty() {
            warn!("augmentation response has no usable highlights");
            return Self::Invalid;
        }

        let summary = payload
            .get("ai_summary")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let scores = payload
            .get("scores")
            .and_then(Value::as_object)
            .map(|obj| {
                obj.iter()
                    .filter_map(|(k, v)| v.as_f64().map(|n| (k.clone(), n)))
                    .collect()
            })
            .unwrap_or_default();

        Self::Valid {
            highlights,
            summary,
            scores,
        }
    }
}

fn highlight_from_object(obj: &Map<String, Value>) -> Option<Highlight> {
    let text = |key: &str| obj.get(key).and_then(Value::as_str).map(str::to_string);
    Some(Highlight {
        category: text("category")?,
        winner: text("winner")?,
        winner_id: None,
        reason: text("reason")?,
    })
}

/// Highlights as presented to the caller, whichever path produced them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedHighlights {
    pub highlights: Vec<Highlight>,
    pub summary: Option<String>,
    pub scores: BTreeMap<String, f64>,
    pub provenance: Provenance,
}

impl MergedHighlights {
    /// Wrap rule-based highlights in the augmented shape.
    pub fn fallback(rule_highlights: Vec<Highlight>) -> Self {
        Self {
            highlights: rule_highlights,
            summary: Some(FALLBACK_SUMMARY.to_string()),
            scores: BTreeMap::new(),
            provenance: Provenance::RuleBased,
        }
    }
}

/// Prefer a valid augmentation, otherwise fall back to the rule highlights.
pub fn merge(rule_highlights: Vec<Highlight>, augmentation: AugmentationResult) -> MergedHighlights {
    match augmentation {
        AugmentationResult::Valid {
            highlights,
            summary,
            scores,
        } => MergedHighlights {
            highlights,
            summary,
            scores,
            provenance: Provenance::Augmented,
        },
        AugmentationResult::Invalid => MergedHighlights::fallback(rule_highlights),
    }
}
