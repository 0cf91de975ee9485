//! Kernel Lab
//!
//! Single-kernel sandbox: draw a random kernel or take a typed one, then
//! report how reconditioning changes it.

use ndarray_rand::rand_distr::Normal;
use ndarray_rand::RandomExt;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;

use crate::analysis::{recondition, symmetry_profile, symmetry_score, SymmetryProfile};
use crate::error::{KernelError, KernelResult};
use crate::kernel::Kernel;

pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// `order`×`order` kernel with entries drawn from `Normal(mean, std_dev)`.
pub fn random_kernel<R: Rng + ?Sized>(order: usize, mean: f64, std_dev: f64, rng: &mut R) -> KernelResult<Kernel> {
    if order == 0 {
        return Err(KernelError::InvalidParameter("order must be at least 1".to_string()));
    }
    if !(std_dev > 0.0) || !std_dev.is_finite() {
        return Err(KernelError::InvalidParameter(format!("stddev must be > 0, got {}", std_dev)));
    }
    let normal = Normal::new(mean, std_dev).map_err(|e| KernelError::InvalidParameter(e.to_string()))?;
    Kernel::new(ndarray::Array2::random_using((order, order), normal, rng))
}

/// Everything shown for one analysed kernel.
#[derive(Debug, Clone, Serialize)]
pub struct KernelReport {
    pub input: Kernel,
    pub output: Kernel,
    /// Frobenius distance between input and output.
    pub distance: f64,
    pub condition_before: f64,
    pub condition_after: f64,
    pub score_before: f64,
    pub score_after: f64,
    pub sigma_before: Vec<f64>,
    pub sigma_after: Vec<f64>,
    pub adjusted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<SymmetryProfile>,
}

impl KernelReport {
    /// Attach the per-transformation distances of the input kernel.
    pub fn with_profile(mut self) -> Self {
        self.profile = Some(symmetry_profile(&self.input));
        self
    }
}

pub fn analyze(kernel: Kernel, ceiling: f64) -> KernelResult<KernelReport> {
    let result = recondition(&kernel, ceiling)?;
    Ok(KernelReport {
        distance: kernel.distance(&result.kernel),
        score_before: symmetry_score(&kernel),
        score_after: symmetry_score(&result.kernel),
        condition_before: result.condition_before,
        condition_after: result.condition_after,
        sigma_before: result.sigma_before,
        sigma_after: result.sigma_after,
        adjusted: result.adjusted,
        output: result.kernel,
        input: kernel,
        profile: None,
    })
}
