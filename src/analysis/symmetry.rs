//! Symmetry scoring under the dihedral group.

use ndarray::Array2;
use serde::Serialize;

use crate::kernel::{frobenius_distance, frobenius_norm, max_abs, Kernel, Transformation};

/// Per-transformation distances together with the resulting score.
#[derive(Debug, Clone, Serialize)]
pub struct SymmetryProfile {
    pub distances: Vec<(Transformation, f64)>,
    pub score: f64,
}

impl SymmetryProfile {
    /// Mean of the per-transformation distances.
    pub fn mean_distance(&self) -> f64 {
        self.distances.iter().map(|(_, d)| d).sum::<f64>() / self.distances.len() as f64
    }
}

/// Score in `[0, 1]`; `1.0` means invariant under every rotation and reflection.
pub fn symmetry_score(kernel: &Kernel) -> f64 {
    symmetry_profile(kernel).score
}

pub fn symmetry_profile(kernel: &Kernel) -> SymmetryProfile {
    let normalized = normalize(kernel);
    let distances: Vec<(Transformation, f64)> = Transformation::ALL
        .iter()
        .map(|&t| (t, frobenius_distance(t.apply(normalized.view()), normalized.view())))
        .collect();

    let avg = distances.iter().map(|(_, d)| d).sum::<f64>() / distances.len() as f64;
    let score = (1.0 - 0.5 * avg).clamp(0.0, 1.0);

    SymmetryProfile { distances, score }
}

/// Unit Frobenius norm copy; the zero matrix is returned as is.
///
/// Divides by the largest entry first so the norm of the rescaled copy is
/// always representable.
fn normalize(kernel: &Kernel) -> Array2<f64> {
    let scale = max_abs(kernel.view());
    if scale == 0.0 {
        return kernel.as_array().clone();
    }
    let rescaled = kernel.as_array() / scale;
    let norm = frobenius_norm(rescaled.view());
    rescaled / norm
}
