// Record source trait: the seam between the fetch pipeline and the network.
//
// The live implementation is EntrezClient. Tests drive the fetcher with an
// in-memory source so no network access is needed.

use anyhow::Result;
use async_trait::async_trait;

use super::medline::MedlineRecord;
use crate::corpus::Pmid;

/// Anything that can return MEDLINE records for a page of a PMID list.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch records for `ids[retstart..retstart + retmax]`.
    ///
    /// The whole id list is passed along with the page window, matching how
    /// efetch paginates a posted id list.
    async fn fetch_records(
        &self,
        ids: &[Pmid],
        retstart: usize,
        retmax: usize,
    ) -> Result<Vec<MedlineRecord>>;
}
