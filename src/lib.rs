//! Kernel Lab
//!
//! Analysis of small square kernels, typically convolution filters:
//! - Symmetry score under the rotations and reflections of the square
//! - SVD reconditioning that caps the condition number
//! - Kernel CSV, typed matrix and image inputs
//! - Layer inspection and kernel export for `.safetensors` weight files

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod io;
pub mod kernel;
pub mod lab;
pub mod model;

// Re-exports for convenience
pub use analysis::{condition_number, recondition, symmetry_score, Reconditioned};
pub use config::LabConfig;
pub use error::{KernelError, KernelResult};
pub use kernel::{Kernel, Transformation};
