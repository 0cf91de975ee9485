//! Condition Numbers and SVD Reconditioning
//!
//! Caps the condition number of a kernel by lifting only the tail of its
//! singular value spectrum, keeping both singular vector bases untouched.

use nalgebra::{linalg::SVD, DMatrix};
use ndarray::{Array1, Array2};
use serde::Serialize;
use tracing::debug;

use crate::error::{KernelError, KernelResult};
use crate::kernel::Kernel;

const SVD_MAX_ITERATIONS: usize = 10_000;

/// `M = U · diag(σ) · Vᵗ` with `σ` sorted in descending order.
#[derive(Debug, Clone)]
pub struct Svd {
    pub u: Array2<f64>,
    pub sigma: Vec<f64>,
    pub v_t: Array2<f64>,
}

impl Svd {
    pub fn decompose(kernel: &Kernel) -> KernelResult<Self> {
        let n = kernel.order();
        let matrix = DMatrix::from_row_iterator(n, n, kernel.view().iter().copied());

        let svd = SVD::try_new(matrix, true, true, f64::EPSILON, SVD_MAX_ITERATIONS)
            .ok_or(KernelError::SvdNotConverged(n))?;
        let (u, v_t) = svd.u.zip(svd.v_t).ok_or(KernelError::SvdNotConverged(n))?;
        let values = svd.singular_values;

        let mut order: Vec<usize> = (0..values.len()).collect();
        order.sort_by(|&a, &b| values[b].total_cmp(&values[a]));

        let sigma = order.iter().map(|&k| values[k]).collect();
        let u = Array2::from_shape_fn((u.nrows(), order.len()), |(r, k)| u[(r, order[k])]);
        let v_t = Array2::from_shape_fn((order.len(), v_t.ncols()), |(k, c)| v_t[(order[k], c)]);

        Ok(Self { u, sigma, v_t })
    }

    /// `U · diag(sigma) · Vᵗ` for a replacement spectrum.
    pub fn recompose(&self, sigma: &[f64]) -> Array2<f64> {
        let scaled = &self.u * &Array1::from(sigma.to_vec());
        scaled.dot(&self.v_t)
    }

    pub fn condition_number(&self) -> f64 {
        spectrum_condition(&self.sigma)
    }
}

/// `σ_max / σ_min`, or `+∞` for a singular matrix.
pub fn condition_number(kernel: &Kernel) -> KernelResult<f64> {
    Ok(Svd::decompose(kernel)?.condition_number())
}

fn spectrum_condition(sigma: &[f64]) -> f64 {
    match (sigma.first(), sigma.last()) {
        (Some(&max), Some(&min)) if min != 0.0 => max / min,
        _ => f64::INFINITY,
    }
}

/// Outcome of [`recondition`].
#[derive(Debug, Clone, Serialize)]
pub struct Reconditioned {
    pub kernel: Kernel,
    pub condition_before: f64,
    pub condition_after: f64,
    pub sigma_before: Vec<f64>,
    pub sigma_after: Vec<f64>,
    /// Whether the spectrum was modified. When false, `kernel` is a copy of the input.
    pub adjusted: bool,
}

impl Reconditioned {
    fn unchanged(kernel: &Kernel, condition: f64, sigma: Vec<f64>) -> Self {
        Self {
            kernel: kernel.clone(),
            condition_before: condition,
            condition_after: condition,
            sigma_before: sigma.clone(),
            sigma_after: sigma,
            adjusted: false,
        }
    }
}

/// Limit the condition number of `kernel` to `ceiling` (values below 1 are raised to 1).
///
/// Singular values below `σ_max / ceiling` are raised to that floor, then the
/// raised run is blended upward with its larger neighbour so the spectrum
/// stays non-increasing. Kernels already within the ceiling are returned
/// bit-for-bit.
pub fn recondition(kernel: &Kernel, ceiling: f64) -> KernelResult<Reconditioned> {
    let ceiling = ceiling.max(1.0);
    let svd = Svd::decompose(kernel)?;
    let sigma = svd.sigma.clone();

    let Some(&sigma_max) = sigma.first() else {
        return Ok(Reconditioned::unchanged(kernel, f64::INFINITY, sigma));
    };
    let before = spectrum_condition(&sigma);
    if before <= ceiling || sigma_max == 0.0 {
        return Ok(Reconditioned::unchanged(kernel, before, sigma));
    }

    let lifted = lift_spectrum(&sigma, sigma_max / ceiling);
    let after = spectrum_condition(&lifted);
    debug!(
        "Reconditioned {}x{} kernel: cond {:.6} -> {:.6} (ceiling {})",
        kernel.order(),
        kernel.order(),
        before,
        after,
        ceiling
    );

    Ok(Reconditioned {
        kernel: Kernel::new(svd.recompose(&lifted))?,
        condition_before: before,
        condition_after: after,
        sigma_before: sigma,
        sigma_after: lifted,
        adjusted: true,
    })
}

/// Clamp the tail below `floor` and smooth the clamped run from the top down.
fn lift_spectrum(sigma: &[f64], floor: f64) -> Vec<f64> {
    let mut lifted = sigma.to_vec();

    // `first_clamped` ends as the index of the largest value that was raised.
    let mut first_clamped = lifted.len();
    while first_clamped > 0 && lifted[first_clamped - 1] < floor {
        first_clamped -= 1;
        lifted[first_clamped] = floor;
    }

    // sigma[0] == sigma_max >= floor, so index 0 is never clamped.
    for i in first_clamped.max(1)..lifted.len() {
        lifted[i] = 0.5 * (lifted[i - 1] + lifted[i]);
    }
    lifted
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn kernel(m: Array2<f64>) -> Kernel {
        Kernel::new(m).unwrap()
    }

    fn assert_close(a: f64, b: f64, tol: f64) {
        assert!((a - b).abs() <= tol, "{} != {} (tol {})", a, b, tol);
    }

    #[test]
    fn test_svd_sorted_and_reconstructs() {
        let k = kernel(array![[0.2, 3.0, -1.0], [4.0, 0.5, 0.0], [-2.0, 1.0, 6.0]]);
        let svd = Svd::decompose(&k).unwrap();
        assert_eq!(svd.sigma.len(), 3);
        assert!(svd.sigma.windows(2).all(|w| w[0] >= w[1]));
        assert!(svd.sigma.iter().all(|&s| s >= 0.0));

        let rebuilt = svd.recompose(&svd.sigma);
        for (a, b) in rebuilt.iter().zip(k.view().iter()) {
            assert_close(*a, *b, 1e-10);
        }
    }

    #[test]
    fn test_identity_passes_through() {
        let identity = kernel(Array2::eye(2));
        assert_close(condition_number(&identity).unwrap(), 1.0, 1e-12);

        let result = recondition(&identity, 5.0).unwrap();
        assert!(!result.adjusted);
        assert_eq!(result.kernel, identity);
        assert_eq!(result.condition_before, result.condition_after);
        assert_close(result.condition_before, 1.0, 1e-12);
    }

    #[test]
    fn test_diagonal_spectrum_is_lifted() {
        let k = kernel(array![[10.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 0.001]]);
        let result = recondition(&k, 5.0).unwrap();

        assert!(result.adjusted);
        assert_close(result.condition_before, 10_000.0, 1e-6);
        // floor = 2: [10, 1, 0.001] -> [10, 2, 2] -> [10, 6, 4]
        let expected = [10.0, 6.0, 4.0];
        for (a, b) in result.sigma_after.iter().zip(expected) {
            assert_close(*a, b, 1e-9);
        }
        assert_close(result.condition_after, 2.5, 1e-9);
        assert_close(result.kernel.as_array()[[0, 0]], 10.0, 1e-9);
        assert_close(result.kernel.as_array()[[1, 1]], 6.0, 1e-9);
        assert_close(result.kernel.as_array()[[2, 2]], 4.0, 1e-9);
    }

    #[test]
    fn test_lift_spectrum_single_tail_value() {
        // Only the last value falls under the floor of 2.
        let lifted = lift_spectrum(&[10.0, 5.0, 0.5], 2.0);
        assert_eq!(lifted, vec![10.0, 5.0, 3.5]);
    }

    #[test]
    fn test_lift_spectrum_ceiling_one() {
        let lifted = lift_spectrum(&[4.0, 1.0, 0.0], 4.0);
        assert_eq!(lifted, vec![4.0, 4.0, 4.0]);
    }

    #[test]
    fn test_singular_matrix() {
        // Rank one; sigma_min is zero up to rounding.
        let k = kernel(array![[1.0, 2.0], [2.0, 4.0]]);
        assert!(condition_number(&k).unwrap() > 1e12);

        let result = recondition(&k, 10.0).unwrap();
        assert!(result.adjusted);
        assert!(result.condition_before > 1e12);
        assert!(result.condition_after <= 10.0 * (1.0 + 1e-12));
        assert!(result.condition_after.is_finite());
    }

    #[test]
    fn test_zero_matrix_unchanged() {
        let zero = kernel(Array2::zeros((3, 3)));
        let result = recondition(&zero, 2.0).unwrap();
        assert!(!result.adjusted);
        assert_eq!(result.kernel, zero);
        assert_eq!(result.condition_before, f64::INFINITY);
        assert_eq!(result.condition_after, f64::INFINITY);
    }

    #[test]
    fn test_ceiling_below_one_is_clamped() {
        let k = kernel(array![[3.0, 0.0], [0.0, 1.0]]);
        let result = recondition(&k, 0.25).unwrap();
        assert!(result.adjusted);
        assert_close(result.condition_after, 1.0, 1e-12);
        assert_close(result.sigma_after[1], 3.0, 1e-12);
    }

    #[test]
    fn test_bases_preserved() {
        let k = kernel(array![[1.0, 0.9, 0.0], [0.9, 0.81, 0.001], [0.3, 0.2, 0.1]]);
        let svd = Svd::decompose(&k).unwrap();
        let result = recondition(&k, 3.0).unwrap();
        assert!(result.adjusted);
        assert_eq!(result.kernel.as_array(), &svd.recompose(&result.sigma_after));
    }
}
