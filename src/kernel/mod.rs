//! Kernel Module
//!
//! A validated square matrix of finite reals, typically one spatial slice of a
//! convolution filter, plus the dihedral transformations applied to it.

pub mod transform;

pub use transform::Transformation;

use ndarray::{Array2, ArrayView2, Zip};
use serde::ser::{Serialize, Serializer};

use crate::error::{KernelError, KernelResult};

/// Square n×n matrix with finite entries.
///
/// Construction is the only place shape and finiteness are checked; every
/// analysis routine takes a `&Kernel` and returns new values, never mutating
/// its input.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel(Array2<f64>);

impl Kernel {
    pub fn new(values: Array2<f64>) -> KernelResult<Self> {
        let (rows, cols) = values.dim();
        if rows == 0 || cols == 0 {
            return Err(KernelError::Empty);
        }
        if rows != cols {
            return Err(KernelError::NotSquare { rows, cols });
        }
        if let Some(((row, col), _)) = values.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(KernelError::NonFinite { row, col });
        }
        Ok(Self(values))
    }

    /// Build from a row-major flat buffer of `order * order` values.
    pub fn from_flat(order: usize, values: &[f64]) -> KernelResult<Self> {
        let expected = order * order;
        if values.len() != expected {
            return Err(KernelError::ElementCount { order, expected, actual: values.len() });
        }
        Self::new(Array2::from_shape_vec((order, order), values.to_vec())?)
    }

    pub fn from_rows(rows: Vec<Vec<f64>>) -> KernelResult<Self> {
        let height = rows.len();
        let width = rows.first().map(Vec::len).unwrap_or(0);
        for (row, values) in rows.iter().enumerate() {
            if values.len() != width {
                return Err(KernelError::RaggedRows { row: row + 1, expected: width, actual: values.len() });
            }
        }
        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        Self::new(Array2::from_shape_vec((height, width), flat)?)
    }

    /// The side length n.
    pub fn order(&self) -> usize {
        self.0.nrows()
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.0.view()
    }

    pub fn as_array(&self) -> &Array2<f64> {
        &self.0
    }

    pub fn into_inner(self) -> Array2<f64> {
        self.0
    }

    /// Row-major values, the layout used by kernel CSV files.
    pub fn flatten(&self) -> Vec<f64> {
        self.0.iter().copied().collect()
    }

    pub fn frobenius_norm(&self) -> f64 {
        frobenius_norm(self.view())
    }

    /// Frobenius norm of `self - other`.
    pub fn distance(&self, other: &Kernel) -> f64 {
        frobenius_distance(self.view(), other.view())
    }

    /// Element-wise mean of equally sized kernels.
    pub fn mean_of(kernels: &[Kernel]) -> Option<Kernel> {
        let first = kernels.first()?;
        if kernels.iter().any(|k| k.order() != first.order()) {
            return None;
        }
        let mut sum = Array2::<f64>::zeros(first.0.dim());
        for kernel in kernels {
            sum += &kernel.0;
        }
        Some(Kernel(sum / kernels.len() as f64))
    }
}

impl Serialize for Kernel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.rows().into_iter().map(|row| row.to_vec()))
    }
}

/// Largest absolute entry, `0.0` for the zero matrix.
pub(crate) fn max_abs(m: ArrayView2<'_, f64>) -> f64 {
    m.iter().fold(0.0, |acc: f64, v| acc.max(v.abs()))
}

/// Sum of squares accumulated relative to the largest entry, so it neither
/// underflows for tiny kernels nor overflows for huge ones.
pub(crate) fn frobenius_norm(m: ArrayView2<'_, f64>) -> f64 {
    let scale = max_abs(m);
    if scale == 0.0 {
        return 0.0;
    }
    let sum: f64 = m.iter().map(|v| (v / scale) * (v / scale)).sum();
    scale * sum.sqrt()
}

pub(crate) fn frobenius_distance(a: ArrayView2<'_, f64>, b: ArrayView2<'_, f64>) -> f64 {
    Zip::from(&a)
        .and(&b)
        .fold(0.0, |acc, &x, &y| acc + (x - y) * (x - y))
        .sqrt()
}
