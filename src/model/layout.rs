//! Convolution weight layouts and per-layer summaries.

use std::fmt;

use ndarray::{s, ArrayView4};
use serde::Serialize;

use crate::error::{KernelError, KernelResult};
use crate::kernel::Kernel;

/// Largest spatial side treated as `(h, w, ...)` when guessing the layout.
pub const MAX_KERNEL_SIDE: usize = 11;

/// Axis order of a 4-D convolution weight tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelLayout {
    /// `(height, width, in_channels, out_channels)`, as saved by Keras.
    Hwio,
    /// `(out_channels, in_channels, height, width)`, as saved by PyTorch.
    Oihw,
}

impl KernelLayout {
    /// Guess from the leading axes; `None` unless the tensor is 4-D.
    pub fn detect(shape: &[usize]) -> Option<Self> {
        match shape {
            [a, b, _, _] if *a <= MAX_KERNEL_SIDE && *b <= MAX_KERNEL_SIDE => Some(KernelLayout::Hwio),
            [_, _, _, _] => Some(KernelLayout::Oihw),
            _ => None,
        }
    }

    pub fn dims(self, shape: &[usize]) -> Option<KernelDims> {
        let &[a, b, c, d] = shape else {
            return None;
        };
        Some(match self {
            KernelLayout::Hwio => KernelDims { height: a, width: b, in_channels: c, out_channels: d },
            KernelLayout::Oihw => KernelDims { height: c, width: d, in_channels: b, out_channels: a },
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KernelDims {
    pub height: usize,
    pub width: usize,
    pub in_channels: usize,
    pub out_channels: usize,
}

impl KernelDims {
    /// One matrix per (input channel, output channel) pair.
    pub fn matrix_count(&self) -> usize {
        self.in_channels * self.out_channels
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerStatus {
    /// Square kernel of one of the requested sizes.
    Matched,
    /// 4-D kernel of another size (including 1×1 and 2×2).
    IgnoredSize,
    /// Not a convolution kernel.
    NoMatrices,
}

impl LayerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerStatus::Matched => "matched",
            LayerStatus::IgnoredSize => "ignored_size",
            LayerStatus::NoMatrices => "no_matrices",
        }
    }
}

impl fmt::Display for LayerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One row of the layer table.
#[derive(Debug, Clone, Serialize)]
pub struct LayerSummary {
    pub index: usize,
    pub name: String,
    pub layout: Option<KernelLayout>,
    pub dims: Option<KernelDims>,
    pub num_matrices: usize,
    pub status: LayerStatus,
}

impl LayerSummary {
    /// Classify a tensor; `layout` overrides the shape-based guess.
    pub fn describe(
        index: usize,
        name: &str,
        shape: &[usize],
        sizes: &[usize],
        layout: Option<KernelLayout>,
    ) -> Self {
        let layout = layout.filter(|_| shape.len() == 4).or_else(|| KernelLayout::detect(shape));
        let dims = layout.and_then(|l| l.dims(shape));

        let status = match dims {
            Some(d) if d.height == d.width && d.height > 2 && sizes.contains(&d.height) => LayerStatus::Matched,
            Some(_) => LayerStatus::IgnoredSize,
            None => LayerStatus::NoMatrices,
        };

        Self {
            index,
            name: name.to_string(),
            layout,
            dims,
            num_matrices: dims.map(|d| d.matrix_count()).unwrap_or(0),
            status,
        }
    }

    pub fn is_selectable(&self) -> bool {
        self.status != LayerStatus::NoMatrices
    }

    /// `layer{index:03}_{name}_{h}x{w}.csv`
    pub fn export_file_name(&self) -> Option<String> {
        let dims = self.dims?;
        let name = self.name.replace(['/', '\\'], "_");
        Some(format!("layer{:03}_{}_{}x{}.csv", self.index, name, dims.height, dims.width))
    }
}

/// Split a weight tensor into square kernels, input channel major.
pub fn kernels_to_matrices(tensor: ArrayView4<'_, f64>, layout: KernelLayout) -> KernelResult<Vec<Kernel>> {
    let by_channel = match layout {
        KernelLayout::Hwio => tensor.permuted_axes([2, 3, 0, 1]),
        KernelLayout::Oihw => tensor.permuted_axes([1, 0, 2, 3]),
    };
    let (in_channels, out_channels, height, width) = by_channel.dim();
    if height != width {
        return Err(KernelError::NotSquare { rows: height, cols: width });
    }

    let mut kernels = Vec::with_capacity(in_channels * out_channels);
    for i in 0..in_channels {
        for o in 0..out_channels {
            kernels.push(Kernel::new(by_channel.slice(s![i, o, .., ..]).to_owned())?);
        }
    }
    Ok(kernels)
}
