pub mod config;
pub mod device;
pub mod extract;
pub mod highlight;
pub mod query;
pub mod score;

pub use config::{AugmentConfig, LlmConfig};
pub use device::{
    Category, CategoryId, Device, DeviceId, DeviceRepository, NewDevice, ValidationError,
};
pub use extract::{Magnitude, MagnitudeKind, extract_magnitude, parse_price};
pub use highlight::{Attribute, Highlight, format_thousands, generate_highlights};
pub use query::{DeviceFilter, DeviceSuggestion, RecommendationCriteria};
pub use score::device_score;
