// End-to-end composition: fetch into a temp data directory, load, preprocess,
// train a small model, save it, reload it and predict.

mod common;

use std::collections::HashSet;

use common::FakeSource;
use pubvec::corpus::preprocess::{preprocess, tokenize, TaggedDocument};
use pubvec::corpus::store::load_records;
use pubvec::doc2vec::{Doc2Vec, Doc2VecParams};
use pubvec::pipeline::fetch::{self, FetchPlan};
use pubvec::pipeline::{predict, train};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn every_record(_: u32) -> bool {
    true
}

fn small_params() -> Doc2VecParams {
    Doc2VecParams {
        vector_size: 8,
        min_count: 1,
        epochs: 5,
        workers: 1,
        ..Doc2VecParams::default()
    }
}

#[test]
fn training_params_use_fixed_hyperparameters() {
    let params = train::training_params();
    assert_eq!(params.vector_size, 10);
    assert_eq!(params.workers, 8);
    assert_eq!(params.epochs, 20);
}

#[tokio::test]
async fn fetch_load_train_predict() {
    let dir = tempfile::tempdir().unwrap();
    let abstracts = dir.path().join("PubMed_abstracts.txt");
    let pmids = dir.path().join("PubMed_ids.txt");
    let model_path = dir.path().join("doc2vec.model");

    let plan = FetchPlan {
        seed: 4,
        id_range: 1..=1_000,
        sample_size: 40,
        page_size: 10,
        quota: 15,
    };
    let written = fetch::run(&FakeSource::new(every_record), &plan, &abstracts, &pmids)
        .await
        .unwrap();
    assert_eq!(written.len(), 15);

    let records = load_records(&abstracts, &pmids).unwrap();
    let documents = preprocess(&records);
    assert_eq!(documents.len(), records.len());
    for (doc, pmid) in documents.iter().zip(&written) {
        assert_eq!(doc.tags, vec![pmid.to_string()]);
    }

    let model = train::train_and_save(documents.clone(), small_params(), &model_path)
        .await
        .unwrap();
    assert!(model_path.exists());
    assert_eq!(model.doc_count(), 15);

    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let prediction = predict::run(&documents, &model_path, &mut rng).unwrap();

    let tags: HashSet<String> = documents.iter().map(|d| d.tag().to_string()).collect();
    assert!(tags.contains(&prediction.query_tag));
    assert_eq!(prediction.neighbours.len(), predict::TOP_N);
    assert!(prediction.neighbours.iter().all(|n| tags.contains(&n.tag)));
    for pair in prediction.neighbours.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
    for hit in &prediction.neighbours {
        assert!((-1.0..=1.0).contains(&hit.score));
    }
}

#[test]
fn reloaded_model_predicts_like_the_trained_one() {
    let dir = tempfile::tempdir().unwrap();
    let model_path = dir.path().join("model").join("doc2vec.model");

    let documents = toy_corpus();
    let model = Doc2Vec::train(&documents, small_params()).unwrap();
    model.save(&model_path).unwrap();
    let reloaded = Doc2Vec::load(&model_path).unwrap();

    let a = predict::predict(&documents, &model, &mut ChaCha8Rng::seed_from_u64(5)).unwrap();
    let b = predict::predict(&documents, &reloaded, &mut ChaCha8Rng::seed_from_u64(5)).unwrap();
    assert_eq!(a.query_tag, b.query_tag);
    let a_tags: Vec<&str> = a.neighbours.iter().map(|n| n.tag.as_str()).collect();
    let b_tags: Vec<&str> = b.neighbours.iter().map(|n| n.tag.as_str()).collect();
    assert_eq!(a_tags, b_tags);
}

#[test]
fn three_document_corpus_returns_all_three() {
    let documents = toy_corpus();
    let model = Doc2Vec::train(&documents, small_params()).unwrap();

    let prediction =
        predict::predict(&documents, &model, &mut ChaCha8Rng::seed_from_u64(1)).unwrap();

    assert!(["1", "2", "3"].contains(&prediction.query_tag.as_str()));
    // Fewer documents than TOP_N: every document is ranked once.
    let ranked: HashSet<&str> = prediction.neighbours.iter().map(|n| n.tag.as_str()).collect();
    assert_eq!(ranked, HashSet::from(["1", "2", "3"]));
}

#[test]
fn empty_corpus_cannot_predict() {
    let model = Doc2Vec::train(&toy_corpus(), small_params()).unwrap();
    let result = predict::predict(&[], &model, &mut ChaCha8Rng::seed_from_u64(1));
    assert!(result.is_err());
}

#[test]
fn predicting_with_missing_model_fails() {
    let dir = tempfile::tempdir().unwrap();
    let result = predict::run(
        &toy_corpus(),
        &dir.path().join("missing.model"),
        &mut ChaCha8Rng::seed_from_u64(1),
    );
    assert!(result.is_err());
}

fn toy_corpus() -> Vec<TaggedDocument> {
    [
        (1, "insulin glucose diabetes insulin glucose metabolism"),
        (2, "tumor chemotherapy cancer tumor oncology cells"),
        (3, "heart artery blood pressure cardiac heart"),
    ]
    .into_iter()
    .map(|(pmid, text)| TaggedDocument::new(tokenize(text), pmid.to_string()))
    .collect()
}
