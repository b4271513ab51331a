//! Rule-based highlight generation for a pair of devices.
//!
//! Each [`Attribute`] is evaluated in a fixed presentation order. An attribute
//! yields a [`Highlight`] only when both devices have a usable value and the
//! values differ; ties and missing data are silent. Price is the one
//! lower-is-better attribute.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::device::{Device, DeviceId};
use crate::extract::{MagnitudeKind, extract_magnitude};

/// Attributes compared by the rule engine, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Price,
    ReleaseYear,
    Ram,
    Storage,
    Camera,
    Battery,
    Screen,
}

impl Attribute {
    pub const ALL: [Attribute; 7] = [
        Self::Price,
        Self::ReleaseYear,
        Self::Ram,
        Self::Storage,
        Self::Camera,
        Self::Battery,
        Self::Screen,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Price => "Price",
            Self::ReleaseYear => "Release year",
            Self::Ram => "RAM",
            Self::Storage => "Storage",
            Self::Camera => "Camera",
            Self::Battery => "Battery",
            Self::Screen => "Screen",
        }
    }

    pub fn lower_is_better(self) -> bool {
        matches!(self, Self::Price)
    }

    /// Comparable value of this attribute for `device`, if usable.
    pub fn value(self, device: &Device) -> Option<f64> {
        let spec = |field: &Option<String>, kind| {
            field
                .as_deref()
                .and_then(|s| extract_magnitude(s, kind))
                .map(|m| m.value())
        };
        match self {
            // Whole currency units, so sub-unit differences are a tie.
            Self::Price => device
                .price
                .filter(|p| p.is_finite())
                .map(f64::round)
                .filter(|p| *p > 0.0),
            Self::ReleaseYear => device.release_year.filter(|y| *y > 0).map(f64::from),
            Self::Ram => spec(&device.ram, MagnitudeKind::Capacity),
            Self::Storage => spec(&device.storage, MagnitudeKind::Capacity),
            Self::Camera => spec(&device.camera, MagnitudeKind::Count),
            Self::Battery => spec(&device.battery, MagnitudeKind::Count),
            Self::Screen => spec(&device.screen, MagnitudeKind::Inches),
        }
    }
}

/// One attribute-level comparison outcome.
///
/// `winner` is a display name. Highlights produced locally also carry the
/// winning device's id; highlights received from the augmentation service do
/// not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    pub category: String,
    pub winner: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner_id: Option<DeviceId>,
    pub reason: String,
}

/// Compare two devices attribute by attribute.
///
/// Pure: the same pair always yields the same list.
pub fn generate_highlights(a: &Device, b: &Device) -> Vec<Highlight> {
    Attribute::ALL
        .iter()
        .filter_map(|&attr| compare_attribute(attr, a, b))
        .collect()
}

fn compare_attribute(attr: Attribute, a: &Device, b: &Device) -> Option<Highlight> {
    let va = attr.value(a)?;
    let vb = attr.value(b)?;

    let a_wins = match va.partial_cmp(&vb)? {
        Ordering::Equal => return None,
        Ordering::Less => attr.lower_is_better(),
        Ordering::Greater => !attr.lower_is_better(),
    };
    let (winner, won, lost) = if a_wins { (a, va, vb) } else { (b, vb, va) };

    Some(Highlight {
        category: attr.label().to_string(),
        winner: winner.name.clone(),
        winner_id: Some(winner.id),
        reason: describe(attr, &winner.name, won, lost),
    })
}

fn describe(attr: Attribute, name: &str, won: f64, lost: f64) -> String {
    match attr {
        Attribute::Price => format!(
            "{name} is cheaper by Rp {}",
            format_thousands((won - lost).abs())
        ),
        Attribute::ReleaseYear => format!("{name} is newer (released {won})"),
        Attribute::Ram => format!("{name} has more RAM ({won} GB vs {lost} GB)"),
        Attribute::Storage => format!("{name} has more storage ({won} GB vs {lost} GB)"),
        Attribute::Camera => {
            format!("{name} has a higher-resolution main camera ({won} MP vs {lost} MP)")
        }
        Attribute::Battery => format!("{name} has a bigger battery ({won} mAh vs {lost} mAh)"),
        Attribute::Screen => format!("{name} has a larger screen ({won}\" vs {lost}\")"),
    }
}

/// Format an amount rounded to whole units with `,` thousands separators.
///
/// `2000000.0` → `"2,000,000"`.
pub fn format_thousands(amount: f64) -> String {
    let rounded = amount.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(id: DeviceId, name: &str) -> Device {
        Device {
            id,
            name: name.into(),
            brand: "Test".into(),
            ..Default::default()
        }
    }

    fn categories(highlights: &[Highlight]) -> Vec<&str> {
        highlights.iter().map(|h| h.category.as_str()).collect()
    }

    #[test]
    fn sub_unit_price_gap_is_a_tie() {
        let a = Device {
            price: Some(5_000_000.2),
            ..device(1, "A")
        };
        let b = Device {
            price: Some(5_000_000.4),
            ..device(2, "B")
        };
        assert!(generate_highlights(&a, &b).is_empty());

        let c = Device {
            price: Some(4_999_999.4),
            ..device(3, "C")
        };
        let highlights = generate_highlights(&a, &c);
        assert_eq!(highlights[0].reason, "C is cheaper by Rp 1");
    }

    #[test]
    fn price_year_scenario() {
        let a = Device {
            price: Some(5_000_000.0),
            release_year: Some(2023),
            ram: Some("8GB".into()),
            ..device(1, "A")
        };
        let b = Device {
            price: Some(7_000_000.0),
            release_year: Some(2024),
            ram: Some("8GB".into()),
            ..device(2, "B")
        };

        let highlights = generate_highlights(&a, &b);
        let reasons: Vec<&str> = highlights.iter().map(|h| h.reason.as_str()).collect();
        assert_eq!(
            reasons,
            vec![
                "A is cheaper by Rp 2,000,000",
                "B is newer (released 2024)"
            ]
        );
        assert_eq!(highlights[0].winner_id, Some(1));
        assert_eq!(highlights[1].winner_id, Some(2));
    }

    #[test]
    fn camera_compares_primary_sensor() {
        let a = Device {
            camera: Some("48MP + 12MP".into()),
            ..device(1, "A")
        };
        let b = Device {
            camera: Some("64MP".into()),
            ..device(2, "B")
        };
        let highlights = generate_highlights(&a, &b);
        assert_eq!(highlights.len(), 1);
        assert_eq!(highlights[0].category, "Camera");
        assert_eq!(highlights[0].winner, "B");
        assert!(highlights[0].reason.contains("64 MP vs 48 MP"));
    }

    #[test]
    fn ram_larger_wins_exactly_once() {
        for (ra, rb, expected) in [("8GB", "12GB", "B"), ("16 GB", "6GB", "A"), ("1TB", "512GB", "A")] {
            let a = Device {
                ram: Some(ra.into()),
                ..device(1, "A")
            };
            let b = Device {
                ram: Some(rb.into()),
                ..device(2, "B")
            };
            let ram: Vec<_> = generate_highlights(&a, &b)
                .into_iter()
                .filter(|h| h.category == "RAM")
                .collect();
            assert_eq!(ram.len(), 1, "{ra} vs {rb}");
            assert_eq!(ram[0].winner, expected, "{ra} vs {rb}");
        }
    }

    #[test]
    fn equal_values_produce_nothing() {
        let spec = |id, name| Device {
            price: Some(3_000_000.0),
            release_year: Some(2022),
            ram: Some("8GB".into()),
            storage: Some("128GB".into()),
            camera: Some("50MP".into()),
            battery: Some("5000 mAh".into()),
            screen: Some("6.5\"".into()),
            ..device(id, name)
        };
        assert!(generate_highlights(&spec(1, "A"), &spec(2, "B")).is_empty());
    }

    #[test]
    fn missing_on_either_side_produces_nothing() {
        let a = Device {
            price: Some(1_000_000.0),
            ram: Some("8GB".into()),
            battery: Some("N/A".into()),
            screen: Some("6.1 inch".into()),
            ..device(1, "A")
        };
        let b = Device {
            release_year: Some(2024),
            ram: None,
            battery: Some("4000 mAh".into()),
            screen: Some("garbage".into()),
            ..device(2, "B")
        };
        assert!(generate_highlights(&a, &b).is_empty());
    }

    #[test]
    fn price_is_inverted() {
        let a = Device {
            price: Some(9_500_000.0),
            ..device(1, "Pricey")
        };
        let b = Device {
            price: Some(4_250_000.0),
            ..device(2, "Cheap")
        };
        let highlights = generate_highlights(&a, &b);
        assert_eq!(highlights[0].winner, "Cheap");
        assert_eq!(highlights[0].reason, "Cheap is cheaper by Rp 5,250,000");
    }

    #[test]
    fn full_attribute_order() {
        let a = Device {
            price: Some(2_000_000.0),
            release_year: Some(2020),
            ram: Some("4GB".into()),
            storage: Some("64GB".into()),
            camera: Some("12MP".into()),
            battery: Some("3000 mAh".into()),
            screen: Some("5.8\"".into()),
            ..device(1, "A")
        };
        let b = Device {
            price: Some(3_000_000.0),
            release_year: Some(2021),
            ram: Some("6GB".into()),
            storage: Some("128GB".into()),
            camera: Some("48MP".into()),
            battery: Some("4500 mAh".into()),
            screen: Some("6.4\"".into()),
            ..device(2, "B")
        };
        let highlights = generate_highlights(&a, &b);
        assert_eq!(
            categories(&highlights),
            vec!["Price", "Release year", "RAM", "Storage", "Camera", "Battery", "Screen"]
        );
        assert_eq!(highlights[0].winner, "A");
        assert!(highlights[1..].iter().all(|h| h.winner == "B"));
    }

    #[test]
    fn idempotent() {
        let a = Device {
            price: Some(2_000_000.0),
            storage: Some("256GB".into()),
            ..device(1, "A")
        };
        let b = Device {
            price: Some(2_500_000.0),
            storage: Some("1TB".into()),
            ..device(2, "B")
        };
        assert_eq!(generate_highlights(&a, &b), generate_highlights(&a, &b));
    }

    #[test]
    fn zero_price_is_unusable() {
        let a = Device {
            price: Some(0.0),
            ..device(1, "A")
        };
        let b = Device {
            price: Some(1_000.0),
            ..device(2, "B")
        };
        assert!(generate_highlights(&a, &b).is_empty());
    }

    #[test]
    fn thousands_formatting() {
        assert_eq!(format_thousands(0.0), "0");
        assert_eq!(format_thousands(999.0), "999");
        assert_eq!(format_thousands(1_000.0), "1,000");
        assert_eq!(format_thousands(2_000_000.0), "2,000,000");
        assert_eq!(format_thousands(1_234_567.6), "1,234,568");
        assert_eq!(format_thousands(-12_345.0), "-12,345");
    }
}
