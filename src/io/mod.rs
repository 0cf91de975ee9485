//! File formats: kernel CSVs, typed matrices and images.

pub mod csv;
pub mod image;
pub mod text;

pub use self::csv::{
    read_condition_numbers, read_kernels, status_label, write_condition_numbers, write_kernels, write_reconditioned,
    write_side_by_side, KernelBatch, FLAG_HIGHER, FLAG_LOWER_OR_EQUAL, STATUS_RECONDITIONED, STATUS_UNCHANGED,
};
pub use self::image::SymmetryMap;
pub use self::text::{parse_matrix, parse_matrix_of_order};
