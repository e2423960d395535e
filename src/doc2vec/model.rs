// Doc2Vec (PV-DM) with negative sampling.
//
// Each training step averages the document's tag vector(s) with the word
// vectors in a context window and learns to predict the centre word against
// `negative` noise words drawn from the unigram^0.75 distribution. The error
// is pushed back into the output weights, the tag vectors and the context
// word vectors.
//
// Inference runs the same step with words and output weights frozen, so only
// the new document's vector moves.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::shared::{FrozenMatrix, SharedMatrix, WeightRows};
use super::similarity::cosine_similarity;
use super::vocab::Vocabulary;
use crate::corpus::preprocess::TaggedDocument;

/// Version written into every saved model. Bump when the layout changes.
pub const FORMAT_VERSION: u32 = 1;

/// Dot products beyond this are treated as saturated by the sigmoid.
const MAX_EXP: f32 = 6.0;

/// Training hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Doc2VecParams {
    /// Dimensionality of word and document vectors.
    pub vector_size: usize,
    /// Maximum distance between the centre word and a context word.
    pub window: usize,
    /// Words seen fewer times than this are dropped from the vocabulary.
    pub min_count: u64,
    /// Noise words drawn per positive example.
    pub negative: usize,
    /// Downsampling threshold for frequent words (0 disables it).
    pub sample: f64,
    /// Initial learning rate.
    pub alpha: f32,
    /// Learning rate reached at the end of training.
    pub min_alpha: f32,
    pub epochs: usize,
    /// Training threads.
    pub workers: usize,
    pub seed: u64,
}

impl Default for Doc2VecParams {
    fn default() -> Self {
        Self {
            vector_size: 100,
            window: 5,
            min_count: 5,
            negative: 5,
            sample: 1e-3,
            alpha: 0.025,
            min_alpha: 0.0001,
            epochs: 10,
            workers: 3,
            seed: 1,
        }
    }
}

/// One ranked neighbour from a similarity query.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarDocument {
    pub tag: String,
    /// Cosine similarity in [-1, 1].
    pub score: f32,
}

/// A trained paragraph-vector model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doc2Vec {
    version: u32,
    params: Doc2VecParams,
    vocab: Vocabulary,
    /// vocab.len() × vector_size, row-major.
    word_vectors: Vec<f32>,
    /// Negative-sampling output layer, vocab.len() × vector_size.
    output_weights: Vec<f32>,
    doc_tags: Vec<String>,
    /// doc_tags.len() × vector_size, row-major.
    doc_vectors: Vec<f32>,
    #[serde(skip)]
    tag_index: HashMap<String, usize>,
}

impl Doc2Vec {
    /// Build a vocabulary and train document and word vectors.
    pub fn train(documents: &[TaggedDocument], params: Doc2VecParams) -> Result<Self> {
        Self::train_with_progress(documents, params, |_| {})
    }

    /// Like `train`, calling `on_epoch(epoch)` after each completed epoch.
    pub fn train_with_progress(
        documents: &[TaggedDocument],
        params: Doc2VecParams,
        mut on_epoch: impl FnMut(usize),
    ) -> Result<Self> {
        if params.vector_size == 0 {
            anyhow::bail!("vector_size must be positive");
        }
        if params.epochs == 0 {
            anyhow::bail!("epochs must be positive");
        }
        if documents.is_empty() {
            anyhow::bail!("No documents to train on");
        }

        let vocab = Vocabulary::build(documents, params.min_count);
        if vocab.is_empty() {
            anyhow::bail!(
                "No word occurs at least {} times across {} documents, vocabulary is empty",
                params.min_count,
                documents.len()
            );
        }

        let mut doc_tags: Vec<String> = Vec::new();
        let mut tag_index: HashMap<String, usize> = HashMap::new();
        for tag in documents.iter().flat_map(|d| d.tags.iter()) {
            if !tag_index.contains_key(tag) {
                tag_index.insert(tag.clone(), doc_tags.len());
                doc_tags.push(tag.clone());
            }
        }

        let dim = params.vector_size;
        let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
        let words = SharedMatrix::from_vec(random_vectors(&mut rng, vocab.len(), dim), dim);
        let docs = SharedMatrix::from_vec(random_vectors(&mut rng, doc_tags.len(), dim), dim);
        let output = SharedMatrix::from_vec(vec![0.0; vocab.len() * dim], dim);

        let encoded: Vec<EncodedDocument> = documents
            .iter()
            .map(|d| EncodedDocument {
                words: vocab.encode(&d.words),
                tags: d.tags.iter().filter_map(|t| tag_index.get(t).copied()).collect(),
            })
            .collect();
        let keep = vocab.keep_probabilities(params.sample);

        let workers = params.workers.clamp(1, encoded.len());
        let chunk_size = encoded.len().div_ceil(workers);

        info!(
            documents = documents.len(),
            vocab = vocab.len(),
            tags = doc_tags.len(),
            dim = dim,
            epochs = params.epochs,
            workers = workers,
            "Training Doc2Vec"
        );

        let step = SgdStep {
            params: &params,
            vocab: &vocab,
            keep: &keep,
            words: &words,
            output: &output,
            docs: &docs,
        };

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .context("Failed to build training thread pool")?;

        for epoch in 0..params.epochs {
            // One chunk per worker; each chunk seeds its own RNG so a
            // single-worker run is reproducible.
            pool.install(|| {
                encoded
                    .par_chunks(chunk_size)
                    .enumerate()
                    .for_each(|(worker, chunk)| {
                        let mut rng =
                            ChaCha8Rng::seed_from_u64(worker_seed(params.seed, epoch, worker));
                        let mut scratch = Scratch::new(dim);
                        for (i, doc) in chunk.iter().enumerate() {
                            let progress = (epoch as f32 + i as f32 / chunk.len() as f32)
                                / params.epochs as f32;
                            let alpha = decayed_alpha(params.alpha, params.min_alpha, progress);
                            step.train_document(&doc.words, &doc.tags, alpha, &mut rng, &mut scratch);
                        }
                    });
            });
            debug!(epoch = epoch + 1, "Doc2Vec epoch complete");
            on_epoch(epoch);
        }

        Ok(Self {
            version: FORMAT_VERSION,
            params,
            vocab,
            word_vectors: words.into_vec(),
            output_weights: output.into_vec(),
            doc_tags,
            doc_vectors: docs.into_vec(),
            tag_index,
        })
    }

    /// Infer a vector for an unseen (or seen) token sequence.
    ///
    /// Deterministic: the starting vector and all sampling are seeded from
    /// the words themselves and the model seed. Unknown words are ignored;
    /// if none are known the starting vector is returned as-is.
    pub fn infer_vector(&self, words: &[String]) -> Vec<f32> {
        let dim = self.params.vector_size;
        let mut rng = ChaCha8Rng::seed_from_u64(inference_seed(self.params.seed, words));
        let doc = SharedMatrix::from_vec(random_vectors(&mut rng, 1, dim), dim);

        let encoded = self.vocab.encode(words);
        if encoded.is_empty() {
            return doc.into_vec();
        }

        let keep = self.vocab.keep_probabilities(self.params.sample);
        let frozen_words = FrozenMatrix::new(&self.word_vectors, dim);
        let frozen_output = FrozenMatrix::new(&self.output_weights, dim);
        let step = SgdStep {
            params: &self.params,
            vocab: &self.vocab,
            keep: &keep,
            words: &frozen_words,
            output: &frozen_output,
            docs: &doc,
        };

        let mut scratch = Scratch::new(dim);
        for epoch in 0..self.params.epochs {
            let progress = epoch as f32 / self.params.epochs as f32;
            let alpha = decayed_alpha(self.params.alpha, self.params.min_alpha, progress);
            step.train_document(&encoded, &[0], alpha, &mut rng, &mut scratch);
        }

        doc.into_vec()
    }

    /// The `topn` trained document vectors closest to `vector` by cosine
    /// similarity, best first. Ties are broken by tag.
    pub fn most_similar(&self, vector: &[f32], topn: usize) -> Vec<SimilarDocument> {
        let mut scored: Vec<SimilarDocument> = self
            .doc_tags
            .iter()
            .enumerate()
            .map(|(i, tag)| SimilarDocument {
                tag: tag.clone(),
                score: cosine_similarity(vector, self.doc_row(i)),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.tag.cmp(&b.tag))
        });
        scored.truncate(topn);
        scored
    }

    /// The trained vector for a document tag.
    pub fn doc_vector(&self, tag: &str) -> Option<&[f32]> {
        self.tag_index.get(tag).map(|&i| self.doc_row(i))
    }

    /// The trained vector for a vocabulary word.
    pub fn word_vector(&self, word: &str) -> Option<&[f32]> {
        let dim = self.params.vector_size;
        self.vocab
            .index_of(word)
            .map(|i| &self.word_vectors[i * dim..(i + 1) * dim])
    }

    pub fn params(&self) -> &Doc2VecParams {
        &self.params
    }

    pub fn vector_size(&self) -> usize {
        self.params.vector_size
    }

    pub fn vocab_len(&self) -> usize {
        self.vocab.len()
    }

    pub fn doc_count(&self) -> usize {
        self.doc_tags.len()
    }

    pub fn tags(&self) -> &[String] {
        &self.doc_tags
    }

    /// Write the model to `path` as JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        let file = File::create(path)
            .with_context(|| format!("Failed to create model file {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, self)
            .with_context(|| format!("Failed to serialize model to {}", path.display()))?;
        writer
            .flush()
            .with_context(|| format!("Failed to flush model file {}", path.display()))?;

        info!(path = %path.display(), "Saved Doc2Vec model");
        Ok(())
    }

    /// Read a model written by `save`.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open model file {}", path.display()))?;
        let mut model: Self = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse model file {}", path.display()))?;

        if model.version != FORMAT_VERSION {
            anyhow::bail!(
                "Model file {} has format version {}, expected {}",
                path.display(),
                model.version,
                FORMAT_VERSION
            );
        }
        model.validate_shapes()?;

        model.vocab.rebuild_tables();
        model.tag_index = model
            .doc_tags
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();

        debug!(
            path = %path.display(),
            vocab = model.vocab.len(),
            docs = model.doc_tags.len(),
            "Loaded Doc2Vec model"
        );
        Ok(model)
    }

    fn validate_shapes(&self) -> Result<()> {
        let dim = self.params.vector_size;
        if dim == 0 {
            anyhow::bail!("Model has vector_size 0");
        }
        self.vocab.validate()?;
        let vocab_cells = self.vocab.len() * dim;
        if self.word_vectors.len() != vocab_cells || self.output_weights.len() != vocab_cells {
            anyhow::bail!(
                "Model word matrices do not match vocabulary size {} × {}",
                self.vocab.len(),
                dim
            );
        }
        if self.doc_vectors.len() != self.doc_tags.len() * dim {
            anyhow::bail!(
                "Model document matrix does not match {} tags × {}",
                self.doc_tags.len(),
                dim
            );
        }
        Ok(())
    }

    fn doc_row(&self, i: usize) -> &[f32] {
        let dim = self.params.vector_size;
        &self.doc_vectors[i * dim..(i + 1) * dim]
    }
}

struct EncodedDocument {
    words: Vec<usize>,
    tags: Vec<usize>,
}

/// Reusable buffers for one worker.
struct Scratch {
    neu1: Vec<f32>,
    neu1e: Vec<f32>,
    row: Vec<f32>,
    sentence: Vec<usize>,
}

impl Scratch {
    fn new(dim: usize) -> Self {
        Self {
            neu1: vec![0.0; dim],
            neu1e: vec![0.0; dim],
            row: vec![0.0; dim],
            sentence: Vec::new(),
        }
    }
}

/// Everything one PV-DM update touches.
struct SgdStep<'a, W: WeightRows, O: WeightRows, D: WeightRows> {
    params: &'a Doc2VecParams,
    vocab: &'a Vocabulary,
    keep: &'a [f64],
    words: &'a W,
    output: &'a O,
    docs: &'a D,
}

impl<W: WeightRows, O: WeightRows, D: WeightRows> SgdStep<'_, W, O, D> {
    /// One pass over a document's words.
    fn train_document<R: Rng>(
        &self,
        words: &[usize],
        doc_rows: &[usize],
        alpha: f32,
        rng: &mut R,
        scratch: &mut Scratch,
    ) {
        if doc_rows.is_empty() {
            return;
        }

        scratch.sentence.clear();
        scratch.sentence.extend(
            words
                .iter()
                .copied()
                .filter(|&w| self.keep[w] >= 1.0 || rng.random::<f64>() < self.keep[w]),
        );
        let sentence = std::mem::take(&mut scratch.sentence);
        let n = sentence.len();
        let window = self.params.window;

        for pos in 0..n {
            let reduced = if window > 0 { rng.random_range(0..window) } else { 0 };
            let span = window - reduced;
            let lo = pos.saturating_sub(span);
            let hi = (pos + span + 1).min(n);

            // neu1 = mean of tag vectors and context word vectors
            scratch.neu1.iter_mut().for_each(|v| *v = 0.0);
            let mut count = 0usize;
            for &d in doc_rows {
                self.docs.read_row(d, &mut scratch.row);
                add_into(&mut scratch.neu1, &scratch.row);
                count += 1;
            }
            for (j, &w) in sentence.iter().enumerate().take(hi).skip(lo) {
                if j == pos {
                    continue;
                }
                self.words.read_row(w, &mut scratch.row);
                add_into(&mut scratch.neu1, &scratch.row);
                count += 1;
            }
            let inv = 1.0 / count as f32;
            scratch.neu1.iter_mut().for_each(|v| *v *= inv);

            scratch.neu1e.iter_mut().for_each(|v| *v = 0.0);
            let centre = sentence[pos];
            for d in 0..=self.params.negative {
                let (target, label) = if d == 0 {
                    (centre, 1.0)
                } else {
                    let noise = self.vocab.sample_negative(rng);
                    if noise == centre {
                        continue;
                    }
                    (noise, 0.0)
                };

                let f = self.output.dot_row(target, &scratch.neu1);
                let g = (label - sigmoid(f)) * alpha;
                self.output.read_row(target, &mut scratch.row);
                for (e, o) in scratch.neu1e.iter_mut().zip(&scratch.row) {
                    *e += g * o;
                }
                self.output.add_scaled(target, g, &scratch.neu1);
            }

            for &d in doc_rows {
                self.docs.add_scaled(d, 1.0, &scratch.neu1e);
            }
            for (j, &w) in sentence.iter().enumerate().take(hi).skip(lo) {
                if j != pos {
                    self.words.add_scaled(w, 1.0, &scratch.neu1e);
                }
            }
        }

        scratch.sentence = sentence;
    }
}

fn add_into(acc: &mut [f32], row: &[f32]) {
    for (a, r) in acc.iter_mut().zip(row) {
        *a += r;
    }
}

fn sigmoid(x: f32) -> f32 {
    let x = x.clamp(-MAX_EXP, MAX_EXP);
    1.0 / (1.0 + (-x).exp())
}

/// Linear decay from `alpha` to `min_alpha` as `progress` goes 0 → 1.
fn decayed_alpha(alpha: f32, min_alpha: f32, progress: f32) -> f32 {
    (alpha - (alpha - min_alpha) * progress.clamp(0.0, 1.0)).max(min_alpha)
}

/// Small random vectors in [-0.5/dim, 0.5/dim).
fn random_vectors<R: Rng>(rng: &mut R, rows: usize, dim: usize) -> Vec<f32> {
    (0..rows * dim)
        .map(|_| (rng.random::<f32>() - 0.5) / dim as f32)
        .collect()
}

fn worker_seed(seed: u64, epoch: usize, worker: usize) -> u64 {
    seed.wrapping_mul(0x9E37_79B9_7F4A_7C15)
        .wrapping_add((epoch as u64) << 32)
        .wrapping_add(worker as u64)
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// FNV-1a over the model seed and the words, each word followed by a 0xff
/// separator. Fixed so a saved model infers the same vectors on any build.
fn inference_seed(seed: u64, words: &[String]) -> u64 {
    let mut hash = FNV_OFFSET;
    let mut feed = |bytes: &[u8]| {
        for &b in bytes {
            hash ^= u64::from(b);
            hash = hash.wrapping_mul(FNV_PRIME);
        }
    };
    feed(&seed.to_le_bytes());
    for word in words {
        feed(word.as_bytes());
        feed(&[0xff]);
    }
    hash
}
