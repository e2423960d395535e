// In-memory record source for driving the fetch pipeline without network.

#![allow(dead_code)]

use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use pubvec::corpus::Pmid;
use pubvec::entrez::medline::{self, MedlineRecord};
use pubvec::entrez::traits::RecordSource;

/// Serves MEDLINE records for whatever ids are requested.
///
/// `has_abstract` decides which PMIDs come back with an AB field.
pub struct FakeSource {
    has_abstract: fn(Pmid) -> bool,
    duplicate_first: bool,
    pub calls: Mutex<Vec<(usize, usize)>>,
}

impl FakeSource {
    pub fn new(has_abstract: fn(Pmid) -> bool) -> Self {
        Self {
            has_abstract,
            duplicate_first: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Repeat the first record of every page, as a merged-citation response might.
    pub fn with_duplicates(mut self) -> Self {
        self.duplicate_first = true;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

/// Deterministic abstract text for a PMID, drawn from a few topics.
pub fn abstract_for(pmid: Pmid) -> String {
    match pmid % 3 {
        0 => format!(
            "Insulin resistance and glucose metabolism in type 2 diabetes cohort {pmid}.\n      Fasting glucose improved."
        ),
        1 => format!("Tumor response to chemotherapy in an oncology trial {pmid}. Cancer cells regressed."),
        _ => format!("Cardiac output and blood pressure in heart failure patients {pmid}. Artery stiffness rose."),
    }
}

pub fn medline_text(pmid: Pmid, with_abstract: bool) -> String {
    let mut text = format!("PMID- {pmid}\nTI  - Study {pmid}\n");
    if with_abstract {
        let body = abstract_for(pmid);
        let mut lines = body.lines();
        if let Some(first) = lines.next() {
            text.push_str(&format!("AB  - {first}\n"));
        }
        for rest in lines {
            text.push_str(&format!("{rest}\n"));
        }
    }
    text.push('\n');
    text
}

#[async_trait]
impl RecordSource for FakeSource {
    async fn fetch_records(
        &self,
        ids: &[Pmid],
        retstart: usize,
        retmax: usize,
    ) -> Result<Vec<MedlineRecord>> {
        self.calls.lock().unwrap().push((retstart, retmax));

        let end = (retstart + retmax).min(ids.len());
        let mut payload = String::from("\n");
        for (i, &id) in ids[retstart..end].iter().enumerate() {
            payload.push_str(&medline_text(id, (self.has_abstract)(id)));
            if i == 0 && self.duplicate_first {
                payload.push_str(&medline_text(id, true));
            }
        }
        Ok(medline::parse(&payload))
    }
}

/// Always fails, like an unreachable E-utilities endpoint.
pub struct FailingSource;

#[async_trait]
impl RecordSource for FailingSource {
    async fn fetch_records(
        &self,
        _ids: &[Pmid],
        _retstart: usize,
        _retmax: usize,
    ) -> Result<Vec<MedlineRecord>> {
        anyhow::bail!("efetch returned 429 Too Many Requests")
    }
}
