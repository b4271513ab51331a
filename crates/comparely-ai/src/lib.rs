//! AI integration layer: the comparison-augmentation webhook (with result
//! validation and rule-based fallback) and a chat-completion client for
//! free-text analysis.

pub mod augment;
pub mod llm;
pub mod merge;

pub use augment::{AugmentError, AugmentationClient};
pub use llm::{
    Analysis, ChatClient, ChatMessage, ComparisonAnalysis, LlmError, RecommendationAnalysis,
    USE_CASES,
};
pub use merge::{AugmentationResult, MergedHighlights, Provenance, merge};
