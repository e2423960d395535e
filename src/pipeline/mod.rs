// Pipeline stages, run in order: fetch → (load, preprocess) → train → predict.

pub mod fetch;
pub mod predict;
pub mod train;
