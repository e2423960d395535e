// Lock-free shared weight matrix for parallel SGD.
//
// Training workers read and update the same rows concurrently without
// locking (the Hogwild! scheme every word2vec implementation uses). Storing
// the f32 bits in relaxed atomics keeps that race well-defined in safe Rust;
// an update may interleave with another worker's, which SGD tolerates.

use std::sync::atomic::{AtomicU32, Ordering};

/// Row-addressed weights the SGD step reads from and writes to.
pub(crate) trait WeightRows: Sync {
    fn read_row(&self, row: usize, out: &mut [f32]);
    fn dot_row(&self, row: usize, other: &[f32]) -> f32;
    fn add_scaled(&self, row: usize, scale: f32, delta: &[f32]);
}

pub(crate) struct SharedMatrix {
    data: Vec<AtomicU32>,
    dim: usize,
}

impl SharedMatrix {
    pub fn from_vec(values: Vec<f32>, dim: usize) -> Self {
        debug_assert!(dim > 0 && values.len() % dim == 0);
        Self {
            data: values.into_iter().map(|v| AtomicU32::new(v.to_bits())).collect(),
            dim,
        }
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
            .into_iter()
            .map(|cell| f32::from_bits(cell.into_inner()))
            .collect()
    }
}

impl WeightRows for SharedMatrix {
    fn read_row(&self, row: usize, out: &mut [f32]) {
        let start = row * self.dim;
        for (slot, cell) in out.iter_mut().zip(&self.data[start..start + self.dim]) {
            *slot = f32::from_bits(cell.load(Ordering::Relaxed));
        }
    }

    fn add_scaled(&self, row: usize, scale: f32, delta: &[f32]) {
        let start = row * self.dim;
        for (cell, d) in self.data[start..start + self.dim].iter().zip(delta) {
            let current = f32::from_bits(cell.load(Ordering::Relaxed));
            cell.store((current + scale * d).to_bits(), Ordering::Relaxed);
        }
    }

    fn dot_row(&self, row: usize, other: &[f32]) -> f32 {
        let start = row * self.dim;
        self.data[start..start + self.dim]
            .iter()
            .zip(other)
            .map(|(cell, o)| f32::from_bits(cell.load(Ordering::Relaxed)) * o)
            .sum()
    }
}

/// Read-only weights: updates are dropped. Used when inferring a new
/// document vector against a trained model.
pub(crate) struct FrozenMatrix<'a> {
    data: &'a [f32],
    dim: usize,
}

impl<'a> FrozenMatrix<'a> {
    pub fn new(data: &'a [f32], dim: usize) -> Self {
        Self { data, dim }
    }
}

impl WeightRows for FrozenMatrix<'_> {
    fn read_row(&self, row: usize, out: &mut [f32]) {
        let start = row * self.dim;
        out.copy_from_slice(&self.data[start..start + self.dim]);
    }

    fn dot_row(&self, row: usize, other: &[f32]) -> f32 {
        let start = row * self.dim;
        self.data[start..start + self.dim]
            .iter()
            .zip(other)
            .map(|(w, o)| w * o)
            .sum()
    }

    fn add_scaled(&self, _row: usize, _scale: f32, _delta: &[f32]) {}
}
