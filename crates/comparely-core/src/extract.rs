//! Numeric extraction from free-form specification strings.
//!
//! Catalogue spec fields are typed in by hand or scraped, so the same quantity
//! shows up as `"8GB"`, `"8 GB RAM"`, `"5000 mAh"`, `"6.7\""` or
//! `"48MP + 12MP + 5MP"`. Extraction is deliberately conservative: anything
//! that cannot be read with confidence is reported as unavailable (`None`)
//! and the attribute simply produces no highlight.
//!
//! # Rules
//!
//! 1. Cut the string at the first separator: `+ / | (` for every kind, plus
//!    `"` and the word `inch` for [`MagnitudeKind::Inches`]. Multi-camera
//!    strings therefore compare on the primary sensor only.
//! 2. Take the first contiguous ASCII digit run of that segment.
//! 3. Integer kinds reject a run followed by `,`/`.` and another digit
//!    (`"12,000mAh"`, `"4.5GB"`). Guessing at thousands separators is worse
//!    than skipping the attribute.
//! 4. `Inches` accepts one decimal point, rejects comma decimals and
//!    anything measured in `cm`/`mm`.
//! 5. Zero is unavailable.

/// What kind of quantity a spec field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MagnitudeKind {
    /// Whole number with a unit: mAh, MP.
    Count,
    /// Memory or storage size normalised to GB (`TB` × 1024, `MB` unavailable).
    Capacity,
    /// Decimal screen diagonal in inches.
    Inches,
}

/// A parsed spec value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Magnitude {
    Count(u64),
    Inches(f64),
}

impl Magnitude {
    pub fn value(self) -> f64 {
        match self {
            Self::Count(n) => n as f64,
            Self::Inches(v) => v,
        }
    }
}

const SEPARATORS: &[char] = &['+', '/', '|', '('];

/// Parse a spec string into a comparable magnitude, or `None` if unavailable.
///
/// Never panics, whatever the input.
pub fn extract_magnitude(text: &str, kind: MagnitudeKind) -> Option<Magnitude> {
    let text = text.trim();
    if text.is_empty() || text.eq_ignore_ascii_case("n/a") {
        return None;
    }

    let segment = first_segment(text, kind);
    match kind {
        MagnitudeKind::Count => parse_count(segment).map(Magnitude::Count),
        MagnitudeKind::Capacity => parse_capacity(segment).map(Magnitude::Count),
        MagnitudeKind::Inches => parse_inches(segment).map(Magnitude::Inches),
    }
}

/// Parse a loosely formatted price such as `"Rp 5.000.000"` or `"5,499,000"`.
///
/// A leading currency label is dropped and every `,` and `.` is treated as a
/// thousands separator, so `"12.5"` reads as 125.
pub fn parse_price(text: &str) -> Option<f64> {
    let t = text
        .trim()
        .trim_start_matches(|c: char| c.is_alphabetic() || c == '$' || c.is_whitespace())
        .trim_end_matches(|c: char| matches!(c, '-' | ',' | '.') || c.is_whitespace());
    if t.is_empty() || !t.bytes().all(|b| b.is_ascii_digit() || b == b',' || b == b'.') {
        return None;
    }

    let digits: String = t.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    let value: f64 = digits.parse().ok()?;
    value.is_finite().then_some(value)
}

fn first_segment(text: &str, kind: MagnitudeKind) -> &str {
    let mut end = text.find(SEPARATORS).unwrap_or(text.len());
    if kind == MagnitudeKind::Inches {
        if let Some(i) = text.find('"') {
            end = end.min(i);
        }
        // ASCII lowercasing keeps byte offsets stable.
        if let Some(i) = text.to_ascii_lowercase().find("inch") {
            end = end.min(i);
        }
    }
    &text[..end]
}

/// Byte range of the first ASCII digit run in `s`.
fn first_digit_run(s: &str) -> Option<(usize, usize)> {
    let bytes = s.as_bytes();
    let start = bytes.iter().position(|b| b.is_ascii_digit())?;
    let len = bytes[start..]
        .iter()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(bytes.len() - start);
    Some((start, start + len))
}

fn followed_by_separated_digit(bytes: &[u8], end: usize, seps: &[u8]) -> bool {
    matches!(bytes.get(end), Some(b) if seps.contains(b))
        && bytes.get(end + 1).is_some_and(|b| b.is_ascii_digit())
}

fn parse_count(segment: &str) -> Option<u64> {
    let (start, end) = first_digit_run(segment)?;
    if followed_by_separated_digit(segment.as_bytes(), end, b",.") {
        return None;
    }
    let n: u64 = segment[start..end].parse().ok()?;
    (n > 0).then_some(n)
}

fn parse_capacity(segment: &str) -> Option<u64> {
    let n = parse_count(segment)?;
    let (_, end) = first_digit_run(segment)?;
    let unit = segment[end..].trim_start().to_ascii_uppercase();
    if unit.starts_with("TB") {
        n.checked_mul(1024)
    } else if unit.starts_with("MB") {
        None
    } else {
        Some(n)
    }
}

fn parse_inches(segment: &str) -> Option<f64> {
    let lower = segment.to_ascii_lowercase();
    if lower.contains("cm") || lower.contains("mm") {
        return None;
    }

    let bytes = segment.as_bytes();
    let (start, mut end) = first_digit_run(segment)?;
    if followed_by_separated_digit(bytes, end, b",") {
        return None;
    }
    if followed_by_separated_digit(bytes, end, b".") {
        let frac_len = bytes[end + 1..]
            .iter()
            .position(|b| !b.is_ascii_digit())
            .unwrap_or(bytes.len() - end - 1);
        let after = end + 1 + frac_len;
        if followed_by_separated_digit(bytes, after, b".") {
            return None;
        }
        end = after;
    }

    let v: f64 = segment[start..end].parse().ok()?;
    (v.is_finite() && v > 0.0).then_some(v)
}
