// E-utilities HTTP client: efetch over POST.
//
// efetch accepts the id list either in the query string or as a POSTed form.
// The sample is 20 000 PMIDs, far beyond practical URL lengths, so every call
// is a form POST. `tool` and `email` identify the caller to NCBI.

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

use super::medline::{self, MedlineRecord};
use super::rate_limiter::RateLimiter;
use super::traits::RecordSource;
use crate::corpus::Pmid;

/// Default public E-utilities endpoint.
pub const DEFAULT_EUTILS_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

/// Tool name reported to NCBI alongside the contact email.
pub const TOOL_NAME: &str = "pubvec";

/// Who is calling: NCBI asks every client to send a tool name and an email.
#[derive(Debug, Clone)]
pub struct ClientIdentity {
    pub email: String,
    pub api_key: Option<String>,
}

/// Thin reqwest wrapper around the E-utilities endpoints pubvec uses.
pub struct EntrezClient {
    client: reqwest::Client,
    base_url: String,
    identity: ClientIdentity,
    limiter: RateLimiter,
}

impl EntrezClient {
    /// Create a client pointing at the given E-utilities base URL.
    pub fn new(base_url: &str, identity: ClientIdentity) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("pubvec/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        let limiter = RateLimiter::for_api_key(identity.api_key.is_some());

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            identity,
            limiter,
        })
    }

    /// Fetch one page of PubMed records as raw MEDLINE text.
    pub async fn efetch_medline(
        &self,
        ids: &[Pmid],
        retstart: usize,
        retmax: usize,
    ) -> Result<String> {
        let url = format!("{}/efetch.fcgi", self.base_url);
        let form = self.efetch_form(ids, retstart, retmax);

        self.limiter.acquire().await;
        debug!(
            ids = ids.len(),
            retstart = retstart,
            retmax = retmax,
            "efetch request"
        );

        let response = self
            .client
            .post(&url)
            .form(&form)
            .send()
            .await
            .with_context(|| format!("efetch request failed (retstart={retstart})"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("efetch returned {status}: {body}");
        }

        response
            .text()
            .await
            .context("Failed to read efetch response body")
    }

    /// Build the form parameters for an efetch call.
    fn efetch_form(&self, ids: &[Pmid], retstart: usize, retmax: usize) -> Vec<(&'static str, String)> {
        let id_list = ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");

        let mut form = vec![
            ("db", "pubmed".to_string()),
            ("id", id_list),
            ("rettype", "medline".to_string()),
            ("retmode", "text".to_string()),
            ("retstart", retstart.to_string()),
            ("retmax", retmax.to_string()),
            ("tool", TOOL_NAME.to_string()),
            ("email", self.identity.email.clone()),
        ];
        if let Some(ref key) = self.identity.api_key {
            form.push(("api_key", key.clone()));
        }
        form
    }
}

#[async_trait]
impl RecordSource for EntrezClient {
    async fn fetch_records(
        &self,
        ids: &[Pmid],
        retstart: usize,
        retmax: usize,
    ) -> Result<Vec<MedlineRecord>> {
        let body = self.efetch_medline(ids, retstart, retmax).await?;
        Ok(medline::parse(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(api_key: Option<&str>) -> EntrezClient {
        EntrezClient::new(
            "https://example.org/eutils/",
            ClientIdentity {
                email: "someone@example.org".to_string(),
                api_key: api_key.map(str::to_string),
            },
        )
        .unwrap()
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        assert_eq!(client(None).base_url, "https://example.org/eutils");
    }

    #[test]
    fn test_efetch_form_fields() {
        let form = client(None).efetch_form(&[3, 1, 2], 10, 5);
        let get = |k: &str| form.iter().find(|(key, _)| *key == k).map(|(_, v)| v.as_str());
        assert_eq!(get("db"), Some("pubmed"));
        assert_eq!(get("id"), Some("3,1,2"));
        assert_eq!(get("rettype"), Some("medline"));
        assert_eq!(get("retmode"), Some("text"));
        assert_eq!(get("retstart"), Some("10"));
        assert_eq!(get("retmax"), Some("5"));
        assert_eq!(get("tool"), Some(TOOL_NAME));
        assert_eq!(get("email"), Some("someone@example.org"));
        assert_eq!(get("api_key"), None);
    }

    #[test]
    fn test_efetch_form_includes_api_key() {
        let form = client(Some("secret")).efetch_form(&[1], 0, 1);
        assert!(form.contains(&("api_key", "secret".to_string())));
    }
}
