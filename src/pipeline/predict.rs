// Prediction demo: pick a random corpus document, infer its vector with the
// saved model, and rank the documents closest to it.

use std::path::Path;

use anyhow::Result;
use rand::seq::IndexedRandom;
use rand::Rng;
use tracing::info;

use crate::corpus::preprocess::TaggedDocument;
use crate::doc2vec::{Doc2Vec, SimilarDocument};

/// Neighbours reported per query.
pub const TOP_N: usize = 10;

/// The randomly chosen query and its ranked neighbours.
#[derive(Debug, Clone)]
pub struct Prediction {
    pub query_tag: String,
    pub neighbours: Vec<SimilarDocument>,
}

/// Load the model at `model_path` and run `predict` against it.
pub fn run<R: Rng + ?Sized>(
    documents: &[TaggedDocument],
    model_path: &Path,
    rng: &mut R,
) -> Result<Prediction> {
    let model = Doc2Vec::load(model_path)?;
    predict(documents, &model, rng)
}

/// Choose one document uniformly at random and find its nearest neighbours.
pub fn predict<R: Rng + ?Sized>(
    documents: &[TaggedDocument],
    model: &Doc2Vec,
    rng: &mut R,
) -> Result<Prediction> {
    let query = documents
        .choose(rng)
        .ok_or_else(|| anyhow::anyhow!("Corpus is empty, nothing to predict on"))?;

    let vector = model.infer_vector(&query.words);
    let neighbours = model.most_similar(&vector, TOP_N);

    info!(
        query = query.tag(),
        neighbours = neighbours.len(),
        "Ranked neighbours for random abstract"
    );

    Ok(Prediction {
        query_tag: query.tag().to_string(),
        neighbours,
    })
}
