//! Analysis Module
//!
//! Symmetry scoring, condition numbers and SVD reconditioning, plus the batch
//! and distribution helpers built on top of them.

pub mod batch;
pub mod condition;
pub mod stats;
pub mod symmetry;

pub use batch::{condition_numbers, recondition_all, score_all};
pub use condition::{condition_number, recondition, Reconditioned, Svd};
pub use stats::{Distribution, Histogram};
pub use symmetry::{symmetry_profile, symmetry_score, SymmetryProfile};
