// Two-file abstract cache.
//
// Abstracts and PMIDs live in separate UTF-8 text files, one entry per line,
// aligned by position. Both files are written to `.tmp` siblings first and
// renamed into place only once both are complete, so a failed write leaves
// the previous pair untouched.

use std::collections::HashSet;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use super::{AbstractRecord, Pmid};

/// Write abstracts and PMIDs to their two files, one per line, same order.
///
/// Creates parent directories as needed. Any newline inside an abstract is
/// folded into a space so the line alignment always holds.
pub fn write_records(
    records: &[AbstractRecord],
    abstracts_path: &Path,
    pmids_path: &Path,
) -> Result<()> {
    let abstracts_tmp = staging_path(abstracts_path);
    let pmids_tmp = staging_path(pmids_path);

    if let Err(e) = stage_records(records, abstracts_path, &abstracts_tmp, pmids_path, &pmids_tmp) {
        let _ = fs::remove_file(&abstracts_tmp);
        let _ = fs::remove_file(&pmids_tmp);
        return Err(e);
    }

    fs::rename(&abstracts_tmp, abstracts_path)
        .with_context(|| format!("Failed to move {} into place", abstracts_path.display()))?;
    fs::rename(&pmids_tmp, pmids_path)
        .with_context(|| format!("Failed to move {} into place", pmids_path.display()))?;

    info!(
        records = records.len(),
        abstracts = %abstracts_path.display(),
        pmids = %pmids_path.display(),
        "Wrote abstract cache"
    );

    Ok(())
}

/// Write both files in full to their staging paths.
fn stage_records(
    records: &[AbstractRecord],
    abstracts_path: &Path,
    abstracts_tmp: &Path,
    pmids_path: &Path,
    pmids_tmp: &Path,
) -> Result<()> {
    let mut abstracts = create_writer(abstracts_tmp)?;
    let mut pmids = create_writer(pmids_tmp)?;

    for record in records {
        writeln!(abstracts, "{}", single_line(&record.text))
            .with_context(|| format!("Failed to write {}", abstracts_path.display()))?;
        writeln!(pmids, "{}", record.pmid)
            .with_context(|| format!("Failed to write {}", pmids_path.display()))?;
    }

    abstracts
        .flush()
        .with_context(|| format!("Failed to flush {}", abstracts_path.display()))?;
    pmids
        .flush()
        .with_context(|| format!("Failed to flush {}", pmids_path.display()))?;
    Ok(())
}

/// Read the two cache files back into an ordered list of records.
///
/// Fails when the files are not line-aligned, when a PMID line is not an
/// unsigned integer, or when a PMID repeats.
pub fn load_records(abstracts_path: &Path, pmids_path: &Path) -> Result<Vec<AbstractRecord>> {
    let pmids = read_pmids(pmids_path)?;
    let abstracts = read_lines(abstracts_path)?;

    if pmids.len() != abstracts.len() {
        anyhow::bail!(
            "Cache files are misaligned: {} has {} PMIDs but {} has {} abstracts",
            pmids_path.display(),
            pmids.len(),
            abstracts_path.display(),
            abstracts.len()
        );
    }

    let mut seen = HashSet::with_capacity(pmids.len());
    for (line, pmid) in pmids.iter().enumerate() {
        if !seen.insert(*pmid) {
            anyhow::bail!(
                "Duplicate PMID {pmid} at line {} of {}",
                line + 1,
                pmids_path.display()
            );
        }
    }

    let records: Vec<AbstractRecord> = pmids
        .into_iter()
        .zip(abstracts)
        .map(|(pmid, text)| AbstractRecord { pmid, text })
        .collect();

    info!(records = records.len(), "Loaded abstract cache");

    Ok(records)
}

/// Count the lines of a text file (no trailing-newline artefact).
pub fn count_lines(path: &Path) -> Result<usize> {
    Ok(read_lines(path)?.len())
}

fn read_pmids(path: &Path) -> Result<Vec<Pmid>> {
    read_lines(path)?
        .iter()
        .enumerate()
        .map(|(i, line)| {
            line.parse::<Pmid>().with_context(|| {
                format!(
                    "Invalid PMID {line:?} at line {} of {}",
                    i + 1,
                    path.display()
                )
            })
        })
        .collect()
}

/// Read a file as trimmed lines. `str::lines` already drops the empty
/// string after a final newline.
fn read_lines(path: &Path) -> Result<Vec<String>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(contents.lines().map(|l| l.trim().to_string()).collect())
}

/// `PubMed_ids.txt` -> `PubMed_ids.txt.tmp`, in the same directory.
fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn create_writer(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// Collapse all whitespace runs (including newlines) into single spaces.
pub fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
