// Vocabulary: word counts, min_count pruning, subsampling and the
// negative-sampling distribution.

use std::collections::HashMap;

use anyhow::Result;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::corpus::preprocess::TaggedDocument;

/// Exponent applied to word counts for the negative-sampling distribution.
const NEGATIVE_POWER: f64 = 0.75;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Vocabulary {
    words: Vec<String>,
    counts: Vec<u64>,
    #[serde(skip)]
    index: HashMap<String, usize>,
    #[serde(skip)]
    cumulative: Vec<f64>,
}

impl Vocabulary {
    /// Count words across the corpus and keep those seen at least `min_count` times.
    ///
    /// Words are ordered by descending count, then alphabetically, so the
    /// layout does not depend on hash iteration order.
    pub fn build(documents: &[TaggedDocument], min_count: u64) -> Self {
        let mut raw: HashMap<&str, u64> = HashMap::new();
        for doc in documents {
            for word in &doc.words {
                *raw.entry(word.as_str()).or_default() += 1;
            }
        }

        let mut kept: Vec<(&str, u64)> = raw
            .into_iter()
            .filter(|&(_, count)| count >= min_count.max(1))
            .collect();
        kept.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        let (words, counts): (Vec<String>, Vec<u64>) = kept
            .into_iter()
            .map(|(w, c)| (w.to_string(), c))
            .unzip();

        Self::from_parts(words, counts)
    }

    /// Rebuild the lookup tables from persisted words and counts.
    pub fn from_parts(words: Vec<String>, counts: Vec<u64>) -> Self {
        let mut vocab = Self {
            words,
            counts,
            index: HashMap::new(),
            cumulative: Vec::new(),
        };
        vocab.rebuild_tables();
        vocab
    }

    /// Restore the `serde(skip)` fields after deserialization.
    pub(crate) fn rebuild_tables(&mut self) {
        self.index = self
            .words
            .iter()
            .enumerate()
            .map(|(i, w)| (w.clone(), i))
            .collect();

        let mut running = 0.0;
        self.cumulative = self
            .counts
            .iter()
            .map(|&c| {
                running += (c as f64).powf(NEGATIVE_POWER);
                running
            })
            .collect();
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Check that persisted words and counts describe the same entries.
    pub fn validate(&self) -> Result<()> {
        if self.words.len() != self.counts.len() {
            anyhow::bail!(
                "Vocabulary has {} words but {} counts",
                self.words.len(),
                self.counts.len()
            );
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn index_of(&self, word: &str) -> Option<usize> {
        self.index.get(word).copied()
    }

    pub fn word(&self, index: usize) -> Option<&str> {
        self.words.get(index).map(String::as_str)
    }

    pub fn count(&self, index: usize) -> u64 {
        self.counts.get(index).copied().unwrap_or(0)
    }

    /// Total number of in-vocabulary word occurrences.
    pub fn total_words(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Map a token sequence to vocabulary indices, dropping unknown words.
    pub fn encode(&self, words: &[String]) -> Vec<usize> {
        words.iter().filter_map(|w| self.index_of(w)).collect()
    }

    /// Per-word keep probabilities for frequent-word downsampling.
    ///
    /// Uses the word2vec formula with threshold `sample * total_words`.
    /// A `sample` of zero disables downsampling.
    pub fn keep_probabilities(&self, sample: f64) -> Vec<f64> {
        let total = self.total_words() as f64;
        if sample <= 0.0 || total == 0.0 {
            return vec![1.0; self.len()];
        }
        let threshold = sample * total;
        self.counts
            .iter()
            .map(|&c| {
                let c = c as f64;
                (((c / threshold).sqrt() + 1.0) * threshold / c).min(1.0)
            })
            .collect()
    }

    /// Draw a word index from the unigram^0.75 distribution.
    pub fn sample_negative<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let total = self.cumulative.last().copied().unwrap_or(0.0);
        if total <= 0.0 {
            return 0;
        }
        let target = rng.random::<f64>() * total;
        self.cumulative
            .partition_point(|&c| c <= target)
            .min(self.len().saturating_sub(1))
    }
}
