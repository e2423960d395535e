// Fetch pipeline: sample PMIDs, page through efetch, keep records that have
// an abstract, and write the two cache files.
//
// Pages are requested one at a time. Collection stops as soon as the quota
// is met, including mid-page, and no further pages are requested. Both files
// are written only after the last page so a failed run leaves no half-written
// pair behind.

use std::collections::HashSet;
use std::ops::RangeInclusive;
use std::path::Path;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use crate::corpus::sample::{pages, sample_pmids};
use crate::corpus::store::{single_line, write_records};
use crate::corpus::{AbstractRecord, Pmid};
use crate::entrez::medline::MedlineRecord;
use crate::entrez::traits::RecordSource;

/// Seed used when none is configured.
pub const DEFAULT_SEED: u64 = 4;

/// How many PMIDs to sample, from where, and how many abstracts to keep.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchPlan {
    pub seed: u64,
    pub id_range: RangeInclusive<Pmid>,
    pub sample_size: usize,
    pub page_size: usize,
    pub quota: usize,
}

impl Default for FetchPlan {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            id_range: 1..=33_499_999,
            sample_size: 20_000,
            page_size: 10_000,
            quota: 10_000,
        }
    }
}

impl FetchPlan {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }
}

/// Run the fetch and write the cache. Returns the accepted PMIDs in order.
pub async fn run(
    source: &dyn RecordSource,
    plan: &FetchPlan,
    abstracts_path: &Path,
    pmids_path: &Path,
) -> Result<Vec<Pmid>> {
    let records = collect(source, plan).await?;
    write_records(&records, abstracts_path, pmids_path)?;
    Ok(records.into_iter().map(|r| r.pmid).collect())
}

/// Fetch and filter records without touching the filesystem.
pub async fn collect(source: &dyn RecordSource, plan: &FetchPlan) -> Result<Vec<AbstractRecord>> {
    if plan.page_size == 0 {
        anyhow::bail!("page_size must be positive");
    }

    let ids = sample_pmids(plan.seed, plan.id_range.clone(), plan.sample_size)
        .context("Failed to sample PMIDs")?;
    info!(
        seed = plan.seed,
        sampled = ids.len(),
        quota = plan.quota,
        "Sampled candidate PMIDs"
    );

    let mut accepted: Vec<AbstractRecord> = Vec::with_capacity(plan.quota.min(ids.len()));
    let mut seen: HashSet<Pmid> = HashSet::new();

    for page in pages(ids.len(), plan.page_size) {
        if accepted.len() >= plan.quota {
            break;
        }

        println!("Batch {}", page.index + 1);
        let records = source
            .fetch_records(&ids, page.start, page.len)
            .await
            .with_context(|| format!("Failed to fetch batch {}", page.index + 1))?;

        let pb = ProgressBar::new(page.len as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  Progress [{bar:30}] {pos}/{len} ({eta})")?,
        );

        let before = accepted.len();
        for record in &records {
            pb.inc(1);
            if accepted.len() >= plan.quota {
                break;
            }
            if let Some(abstract_record) = accept(record, &seen) {
                seen.insert(abstract_record.pmid);
                accepted.push(abstract_record);
            }
        }
        pb.finish_and_clear();

        debug!(
            batch = page.index + 1,
            returned = records.len(),
            kept = accepted.len() - before,
            "Processed batch"
        );
        println!("  Collected abstracts: {}", accepted.len());
    }

    info!(collected = accepted.len(), "Fetch complete");
    Ok(accepted)
}

/// Keep a record if it has a PMID not seen before and a non-blank abstract.
fn accept(record: &MedlineRecord, seen: &HashSet<Pmid>) -> Option<AbstractRecord> {
    let pmid = record.pmid()?;
    if seen.contains(&pmid) {
        debug!(pmid = pmid, "Duplicate PMID in response, skipping");
        return None;
    }
    let text = single_line(record.abstract_text()?);
    if text.is_empty() {
        return None;
    }
    Some(AbstractRecord { pmid, text })
}
