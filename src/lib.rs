// pubvec: paragraph embeddings over a random sample of PubMed abstracts.
//
// This is the library root. Each module corresponds to one stage or
// supporting subsystem of the fetch → train → predict pipeline.

pub mod config;
pub mod corpus;
pub mod doc2vec;
pub mod entrez;
pub mod output;
pub mod pipeline;
pub mod status;
