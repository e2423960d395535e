use std::env;
use std::path::{Path, PathBuf};

use anyhow::Result;

/// File name of the cached abstracts, one per line.
pub const ABSTRACTS_FILE: &str = "PubMed_abstracts.txt";
/// File name of the cached PMIDs, aligned line-by-line with the abstracts.
pub const PMIDS_FILE: &str = "PubMed_ids.txt";
/// File name of the trained Doc2Vec model.
pub const MODEL_FILE: &str = "doc2vec.model";

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy.
pub struct Config {
    /// Contact address sent with every E-utilities request (NCBI requires one).
    pub entrez_email: String,
    /// Optional NCBI API key. Raises the rate limit from 3 to 10 requests/s.
    pub ncbi_api_key: Option<String>,
    /// E-utilities base URL (defaults to the public NCBI endpoint).
    pub eutils_url: String,
    /// Directory holding the abstracts, PMIDs and model files.
    pub data_dir: PathBuf,
    /// Seed for the PMID sample.
    pub sample_seed: u64,
    /// Seed for the predictor's random pick. Unset means a fresh pick each run.
    pub predict_seed: Option<u64>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Everything has a default except the contact email, which is only
    /// checked (via `require_contact`) before talking to NCBI.
    pub fn load() -> Result<Self> {
        let sample_seed = match env::var("PUBVEC_SEED") {
            Ok(raw) => raw
                .trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("PUBVEC_SEED must be an integer, got {raw:?}: {e}"))?,
            Err(_) => crate::pipeline::fetch::DEFAULT_SEED,
        };

        let predict_seed = match env::var("PUBVEC_PREDICT_SEED") {
            Ok(raw) => Some(raw.trim().parse().map_err(|e| {
                anyhow::anyhow!("PUBVEC_PREDICT_SEED must be an integer, got {raw:?}: {e}")
            })?),
            Err(_) => None,
        };

        Ok(Self {
            entrez_email: env::var("ENTREZ_EMAIL").unwrap_or_default(),
            ncbi_api_key: env::var("NCBI_API_KEY").ok().filter(|k| !k.trim().is_empty()),
            eutils_url: env::var("EUTILS_URL")
                .unwrap_or_else(|_| crate::entrez::client::DEFAULT_EUTILS_URL.to_string()),
            data_dir: env::var("PUBVEC_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data")),
            sample_seed,
            predict_seed,
        })
    }

    pub fn abstracts_path(&self) -> PathBuf {
        self.data_dir.join(ABSTRACTS_FILE)
    }

    pub fn pmids_path(&self) -> PathBuf {
        self.data_dir.join(PMIDS_FILE)
    }

    pub fn model_path(&self) -> PathBuf {
        self.data_dir.join(MODEL_FILE)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Check that a contact email is configured.
    /// Call this before any operation that queries E-utilities.
    pub fn require_contact(&self) -> Result<()> {
        if self.entrez_email.trim().is_empty() {
            anyhow::bail!(
                "ENTREZ_EMAIL not set. NCBI requires a contact address for E-utilities.\n\
                 Add it to your .env file."
            );
        }
        Ok(())
    }
}
