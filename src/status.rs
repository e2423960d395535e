// Cache status display: what is on disk and whether it lines up.

use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Local};
use colored::Colorize;

use crate::config::Config;
use crate::corpus::store::count_lines;

/// Display the state of the data directory.
pub fn show(config: &Config) -> Result<()> {
    println!("Data directory: {}", config.data_dir().display());

    let abstracts = describe_text_file("Abstracts", &config.abstracts_path())?;
    let pmids = describe_text_file("PMIDs", &config.pmids_path())?;

    match (abstracts, pmids) {
        (Some(a), Some(p)) if a == p => {
            println!("Alignment: {} ({a} records)", "ok".green());
        }
        (Some(a), Some(p)) => {
            println!(
                "Alignment: {} ({a} abstracts vs {p} PMIDs)",
                "MISALIGNED".red().bold()
            );
            println!("  Run `pubvec fetch` to rebuild the cache");
        }
        _ => {
            println!("Cache: not fetched yet");
            println!("  Run `pubvec fetch` to download abstracts");
        }
    }

    let model_path = config.model_path();
    match std::fs::metadata(&model_path) {
        Ok(meta) => {
            let modified = meta
                .modified()
                .map(|t| DateTime::<Local>::from(t).format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|_| "unknown".to_string());
            println!(
                "Model: {} ({}, trained {})",
                model_path.display(),
                format_bytes(meta.len()),
                modified
            );
        }
        Err(_) => {
            println!("Model: not trained yet");
            println!("  Run `pubvec train` to build it");
        }
    }

    Ok(())
}

/// Print one cache file's line; returns its line count if it exists.
fn describe_text_file(label: &str, path: &Path) -> Result<Option<usize>> {
    if !path.exists() {
        println!("{label}: {} (missing)", path.display());
        return Ok(None);
    }
    let size = std::fs::metadata(path)
        .map(|m| format_bytes(m.len()))
        .unwrap_or_else(|_| "unknown".to_string());
    let lines = count_lines(path)?;
    println!("{label}: {} ({size}, {lines} lines)", path.display());
    Ok(Some(lines))
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
