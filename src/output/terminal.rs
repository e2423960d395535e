// Colored terminal output for predictions.

use std::collections::HashMap;

use colored::Colorize;

use crate::corpus::AbstractRecord;
use crate::pipeline::predict::Prediction;

/// Characters of abstract text shown next to each result.
const PREVIEW_CHARS: usize = 80;

/// Display the query PMID and its ranked neighbours.
///
/// `records` supplies abstract previews; PMIDs missing from it are shown
/// without one.
pub fn display_prediction(prediction: &Prediction, records: &[AbstractRecord]) {
    let texts: HashMap<String, &str> = records
        .iter()
        .map(|r| (r.pmid.to_string(), r.text.as_str()))
        .collect();

    println!(
        "\n{}",
        format!("PMID of random abstract: {}", prediction.query_tag).bold()
    );
    if let Some(text) = texts.get(&prediction.query_tag) {
        println!("  {}", super::truncate_chars(text, PREVIEW_CHARS * 2).dimmed());
    }

    if prediction.neighbours.is_empty() {
        println!("No similar abstracts found.");
        return;
    }

    println!();
    println!(
        "  {:>4}  {:<10} {:>7}  {}",
        "Rank".dimmed(),
        "PMID".dimmed(),
        "Score".dimmed(),
        "Abstract".dimmed(),
    );
    println!("  {}", "-".repeat(30 + PREVIEW_CHARS).dimmed());

    for (i, hit) in prediction.neighbours.iter().enumerate() {
        let preview = texts
            .get(&hit.tag)
            .map(|t| super::truncate_chars(t, PREVIEW_CHARS))
            .unwrap_or_default();
        let tag = if hit.tag == prediction.query_tag {
            hit.tag.green().bold()
        } else {
            hit.tag.normal()
        };
        println!(
            "  {:>4}. {:<10} {}  {}",
            i + 1,
            tag,
            colorize_score(hit.score),
            preview.dimmed(),
        );
    }
}

/// Colorize a cosine similarity score.
fn colorize_score(score: f32) -> colored::ColoredString {
    let formatted = format!("{score:>7.4}");
    if score >= 0.9 {
        formatted.green().bold()
    } else if score >= 0.7 {
        formatted.green()
    } else if score >= 0.4 {
        formatted.yellow()
    } else {
        formatted.dimmed()
    }
}
