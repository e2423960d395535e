// Training pipeline: fit Doc2Vec on the tagged corpus and save it.
//
// Hyperparameters are fixed. Training is CPU-bound, so it runs on the
// blocking pool to keep the async runtime free.

use std::path::Path;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::corpus::preprocess::TaggedDocument;
use crate::doc2vec::{Doc2Vec, Doc2VecParams};

pub const VECTOR_SIZE: usize = 10;
pub const WORKERS: usize = 8;
pub const EPOCHS: usize = 20;

/// The hyperparameters every pipeline run trains with.
pub fn training_params() -> Doc2VecParams {
    Doc2VecParams {
        vector_size: VECTOR_SIZE,
        workers: WORKERS,
        epochs: EPOCHS,
        ..Doc2VecParams::default()
    }
}

/// Train with the fixed hyperparameters and write the model to `model_path`.
pub async fn run(documents: Vec<TaggedDocument>, model_path: &Path) -> Result<Doc2Vec> {
    train_and_save(documents, training_params(), model_path).await
}

/// Train with explicit hyperparameters and write the model to `model_path`.
pub async fn train_and_save(
    documents: Vec<TaggedDocument>,
    params: Doc2VecParams,
    model_path: &Path,
) -> Result<Doc2Vec> {
    println!("Training the model on {} documents...", documents.len());

    let pb = ProgressBar::new(params.epochs as u64);
    pb.set_style(ProgressStyle::default_bar().template("  Epochs [{bar:30}] {pos}/{len} ({eta})")?);

    let epoch_bar = pb.clone();
    let model = tokio::task::spawn_blocking(move || {
        Doc2Vec::train_with_progress(&documents, params, |_| epoch_bar.inc(1))
    })
    .await
    .context("spawn_blocking panicked")??;
    pb.finish_and_clear();

    model.save(model_path)?;

    info!(
        docs = model.doc_count(),
        vocab = model.vocab_len(),
        path = %model_path.display(),
        "Training complete"
    );
    println!("Done training the model.");

    Ok(model)
}
