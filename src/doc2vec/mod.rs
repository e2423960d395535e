// Paragraph-vector embeddings: vocabulary, PV-DM training, inference,
// nearest-neighbour lookup and model persistence.

pub mod model;
mod shared;
pub mod similarity;
pub mod vocab;

pub use model::{Doc2Vec, Doc2VecParams, SimilarDocument};
