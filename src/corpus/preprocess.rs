// Tokenization into tagged documents.
//
// Tokens are plain whitespace splits of the abstract, punctuation included.
// Each document carries exactly one tag: its PMID as a string.

use super::AbstractRecord;

/// A token sequence plus the tags that identify it in the embedding model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedDocument {
    pub words: Vec<String>,
    pub tags: Vec<String>,
}

impl TaggedDocument {
    pub fn new(words: Vec<String>, tag: impl Into<String>) -> Self {
        Self {
            words,
            tags: vec![tag.into()],
        }
    }

    /// The document's primary tag.
    pub fn tag(&self) -> &str {
        self.tags.first().map(String::as_str).unwrap_or_default()
    }
}

/// Turn loaded records into the training corpus, preserving order.
pub fn preprocess(records: &[AbstractRecord]) -> Vec<TaggedDocument> {
    records
        .iter()
        .map(|record| TaggedDocument::new(tokenize(&record.text), record.pmid.to_string()))
        .collect()
}

/// Split on any whitespace.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preprocess_tags_with_pmid() {
        let records = vec![
            AbstractRecord {
                pmid: 42,
                text: "Aspirin reduces  risk.".to_string(),
            },
            AbstractRecord {
                pmid: 7,
                text: "".to_string(),
            },
        ];
        let docs = preprocess(&records);
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].words, vec!["Aspirin", "reduces", "risk."]);
        assert_eq!(docs[0].tags, vec!["42".to_string()]);
        assert_eq!(docs[1].tag(), "7");
        assert!(docs[1].words.is_empty());
    }

    #[test]
    fn test_tokenize_mixed_whitespace() {
        assert_eq!(tokenize("\ta b\n c  "), vec!["a", "b", "c"]);
    }
}
