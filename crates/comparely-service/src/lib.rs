//! Application services over the device catalogue: the comparison facade,
//! recommendations, and the axum HTTP API that exposes them.

pub mod compare;
pub mod http;
pub mod recommend;

pub use compare::{AnalyzedComparison, CompareError, ComparisonResult, ComparisonService};
pub use http::{ApiError, AppState, router, serve};
pub use recommend::{MAX_RECOMMENDATION_LIMIT, RankedDevice, RecommendationService, Recommendations};
