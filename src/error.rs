//! Error types for kernel analysis.

use thiserror::Error;

/// Errors raised while building, analysing or (de)serialising kernels.
#[derive(Debug, Error)]
pub enum KernelError {
    /// The matrix has no elements.
    #[error("Matrix is empty")]
    Empty,

    /// The matrix is not square.
    #[error("Matrix is not square: {rows}x{cols}")]
    NotSquare { rows: usize, cols: usize },

    /// A NaN or infinite entry was found.
    #[error("Matrix contains a non-finite value at ({row}, {col})")]
    NonFinite { row: usize, col: usize },

    /// A flat buffer does not hold `order * order` values.
    #[error("Expected {expected} values for a {order}x{order} matrix, got {actual}")]
    ElementCount {
        order: usize,
        expected: usize,
        actual: usize,
    },

    /// Typed matrix rows have different lengths.
    #[error("Row {row} has {actual} values, expected {expected}")]
    RaggedRows {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// A CSV row length is not `n * n` for an allowed `n`.
    #[error("Unsupported row length {len}: each row must be a flattened n×n matrix with n in {allowed:?}")]
    UnsupportedShape { len: usize, allowed: Vec<usize> },

    /// The kernel order differs from the one requested.
    #[error("Matrix must be {expected}x{expected}, but got {actual}x{actual}")]
    OrderMismatch { expected: usize, actual: usize },

    /// A headered CSV has the wrong number of columns.
    #[error("Expected {expected} column(s), found {actual}")]
    ColumnCount { expected: usize, actual: usize },

    /// A token could not be read as a number.
    #[error("Invalid number '{token}' on line {line}")]
    Parse { line: usize, token: String },

    /// The input held no kernels or values.
    #[error("Input contains no data: {0}")]
    EmptyInput(String),

    /// A caller-supplied parameter is out of range.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The singular value decomposition did not converge.
    #[error("SVD did not converge for a {0}x{0} matrix")]
    SvdNotConverged(usize),

    /// The image is too small to hold a single 3×3 patch.
    #[error("Image must be at least 3x3, got {width}x{height}")]
    ImageTooSmall { width: u32, height: u32 },

    /// The tensor is not a 4-D convolution kernel.
    #[error("Tensor '{name}' has shape {shape:?}, expected a 4-D convolution kernel")]
    NotAKernelTensor { name: String, shape: Vec<usize> },

    /// No tensor with this name exists in the weight file.
    #[error("Tensor not found: {0}")]
    TensorNotFound(String),

    /// The tensor element type cannot be converted to `f64`.
    #[error("Unsupported tensor dtype: {0}")]
    UnsupportedDtype(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Safetensors error: {0}")]
    SafeTensors(#[from] safetensors::SafeTensorError),

    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

/// Result type alias for kernel operations.
pub type KernelResult<T> = Result<T, KernelError>;
