// Corpus handling: PMID sampling, the two-file cache and tokenization.

pub mod preprocess;
pub mod sample;
pub mod store;

/// A PubMed identifier.
pub type Pmid = u32;

/// One accepted abstract and the PMID it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbstractRecord {
    pub pmid: Pmid,
    pub text: String,
}
