//! Composite desirability score for a single device.
//!
//! Kept apart from highlight generation: highlights never weigh attributes
//! against each other, the score does.

use crate::device::Device;

/// First release year that earns year points.
const BASE_YEAR: i32 = 2020;
const POINTS_PER_YEAR: f64 = 12.0;
const MAX_YEAR_POINTS: f64 = 60.0;

const MAX_PRICE_POINTS: f64 = 40.0;
/// Each Rp 500,000 of price costs one point.
const RUPIAH_PER_POINT: f64 = 500_000.0;

/// Score in `0.0..=100.0`; higher is more recommendable.
///
/// Release year contributes up to 60 points (12 per year after 2020), price
/// up to 40 (cheaper is better, zero at Rp 20,000,000 and above). Missing
/// fields contribute nothing.
pub fn device_score(device: &Device) -> f64 {
    let year_points = device
        .release_year
        .map(|y| (f64::from((y - BASE_YEAR).max(0)) * POINTS_PER_YEAR).min(MAX_YEAR_POINTS))
        .unwrap_or(0.0);

    let price_points = device
        .price
        .filter(|p| p.is_finite() && *p > 0.0)
        .map(|p| (MAX_PRICE_POINTS - p / RUPIAH_PER_POINT).max(0.0))
        .unwrap_or(0.0);

    year_points + price_points
}
