//! Batch analysis across many kernels.
//!
//! Every kernel is independent, so work fans out over the rayon pool; indexed
//! parallel iterators keep results in input order.

use rayon::prelude::*;
use tracing::info;

use super::condition::{condition_number, recondition, Reconditioned};
use super::symmetry::symmetry_score;
use crate::error::KernelResult;
use crate::kernel::Kernel;

pub fn score_all(kernels: &[Kernel]) -> Vec<f64> {
    kernels.par_iter().map(symmetry_score).collect()
}

pub fn condition_numbers(kernels: &[Kernel]) -> KernelResult<Vec<f64>> {
    kernels.par_iter().map(condition_number).collect()
}

pub fn recondition_all(kernels: &[Kernel], ceiling: f64) -> KernelResult<Vec<Reconditioned>> {
    let results: Vec<Reconditioned> = kernels
        .par_iter()
        .map(|k| recondition(k, ceiling))
        .collect::<KernelResult<_>>()?;

    let adjusted = results.iter().filter(|r| r.adjusted).count();
    info!(
        "Reconditioned {} of {} kernels (ceiling {})",
        adjusted,
        results.len(),
        ceiling
    );
    Ok(results)
}
