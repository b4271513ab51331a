//! Terminal rendering for devices, comparisons and recommendations.

use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use comparely_ai::{Analysis, Provenance};
use comparely_core::{Category, Device, format_thousands};
use comparely_service::{AnalyzedComparison, ComparisonResult, Recommendations};
use comparely_store::ImportReport;

// ── Devices ──

/// Print a single device as a vertical card.
pub fn print_device_card(device: &Device) {
    println!("=== {} ===", device.name);
    println!();

    println!("Identity");
    row("id", &device.id.to_string());
    row("brand", &device.brand);
    if let Some(category) = device.category_id {
        row("category", &category.to_string());
    }
    row("price", &price_label(device.price));
    if let Some(year) = device.release_year {
        row("release year", &year.to_string());
    }
    println!();

    let specs = [
        ("cpu", &device.cpu),
        ("gpu", &device.gpu),
        ("ram", &device.ram),
        ("storage", &device.storage),
        ("camera", &device.camera),
        ("battery", &device.battery),
        ("screen", &device.screen),
    ];
    print_optional_section("Specifications", &specs);

    let links = [
        ("image", &device.image_url),
        ("source", &device.source_url),
    ];
    print_optional_section("Links", &links);

    if let Some(description) = &device.description {
        println!("{description}");
    }
}

/// Print Arrow batches as a table.
pub fn print_table(batches: &[RecordBatch]) -> anyhow::Result<()> {
    let rows: usize = batches.iter().map(|b| b.num_rows()).sum();
    if rows == 0 {
        println!("No devices");
        return Ok(());
    }
    println!("{}", pretty_format_batches(batches)?);
    println!("{rows} device(s)");
    Ok(())
}

pub fn print_categories(categories: &[Category]) {
    if categories.is_empty() {
        println!("No categories");
        return;
    }
    for c in categories {
        match &c.description {
            Some(d) => println!("  {:<6} {:<20} {}", c.id, c.name, d),
            None => println!("  {:<6} {}", c.id, c.name),
        }
    }
}

pub fn print_import_report(report: &ImportReport) {
    println!(
        "Imported {} of {} row(s)",
        report.inserted,
        report.total()
    );
    for failure in &report.failed {
        println!("  record {:<6} {}", failure.record, failure.message);
    }
}

// ── Comparison ──

pub fn print_comparison(result: &ComparisonResult) {
    println!("=== {} vs {} ===", result.device_1.name, result.device_2.name);
    row(&result.device_1.name, &price_label(result.device_1.price));
    row(&result.device_2.name, &price_label(result.device_2.price));
    println!();

    let source = match result.provenance {
        Provenance::RuleBased => "spec comparison",
        Provenance::Augmented => "augmented",
    };
    println!("Highlights ({source})");
    if result.highlights.is_empty() {
        println!("  No differences found in the available specifications.");
    }
    for h in &result.highlights {
        row(&h.category, &h.reason);
    }
    println!();

    if !result.scores.is_empty() {
        println!("Scores");
        for (name, score) in &result.scores {
            row(name, &format!("{score:.1}"));
        }
        println!();
    }

    if let Some(summary) = &result.summary {
        println!("{summary}");
    }
}

pub fn print_comparison_analysis(analyzed: &AnalyzedComparison) {
    println!();
    match (&analyzed.ai_analysis, &analyzed.ai_unavailable) {
        (Some(Analysis::Structured(a)), _) => {
            println!("AI analysis");
            row("performance", &a.performance);
            row("camera", &a.camera);
            row("battery", &a.battery);
            row("value for money", &a.value_for_money);
            row("recommendation", &a.recommendation);
        }
        (Some(Analysis::Raw(text)), _) => {
            println!("AI analysis");
            println!("{text}");
        }
        (None, Some(message)) => println!("AI analysis unavailable: {message}"),
        (None, None) => {}
    }
}

// ── Recommendations ──

pub fn print_recommendations(recs: &Recommendations) {
    if recs.devices.is_empty() {
        println!("No devices match the given criteria.");
    }
    for (i, ranked) in recs.devices.iter().enumerate() {
        let d = &ranked.device;
        let year = d
            .release_year
            .map_or_else(|| "-".to_string(), |y| y.to_string());
        println!(
            "{:>2}. {:<32} {:<18} {:<6} score {:>5.1}",
            i + 1,
            d.name,
            price_label(d.price),
            year,
            ranked.score
        );
    }

    match (&recs.ai_analysis, &recs.ai_unavailable) {
        (Some(Analysis::Structured(a)), _) => {
            println!();
            println!("AI recommendation");
            for (rank, pick) in [("1", &a.top_1), ("2", &a.top_2), ("3", &a.top_3)] {
                if let Some(pick) = pick {
                    row(rank, pick);
                }
            }
            println!("{}", a.summary);
        }
        (Some(Analysis::Raw(text)), _) => {
            println!();
            println!("AI recommendation");
            println!("{text}");
        }
        (None, Some(message)) => {
            println!();
            println!("AI recommendation unavailable: {message}");
        }
        (None, None) => {}
    }
}

// ── Helpers ──

fn row(label: &str, value: &str) {
    println!("  {:<26} {}", label, value);
}

fn print_optional_section(header: &str, fields: &[(&str, &Option<String>)]) {
    let present: Vec<(&str, &str)> = fields
        .iter()
        .filter_map(|(label, value)| value.as_deref().map(|v| (*label, v)))
        .filter(|(_, v)| !v.trim().is_empty())
        .collect();
    if present.is_empty() {
        return;
    }
    println!("{header}");
    for (label, value) in present {
        row(label, value);
    }
    println!();
}

fn price_label(price: Option<f64>) -> String {
    match price {
        Some(p) => format!("Rp {}", format_thousands(p)),
        None => "-".to_string(),
    }
}
