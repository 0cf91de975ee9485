//! Model Module
//!
//! Lists the convolution layers stored in a `.safetensors` weight file and
//! extracts their kernels as square matrices. Header parsing is left to the
//! `safetensors` crate.

mod layout;

pub use layout::{kernels_to_matrices, KernelDims, KernelLayout, LayerStatus, LayerSummary, MAX_KERNEL_SIDE};

use std::path::Path;

use half::{bf16, f16};
use ndarray::ArrayView4;
use safetensors::{tensor::TensorView, Dtype, SafeTensors};
use tracing::{debug, info};

use crate::error::{KernelError, KernelResult};
use crate::kernel::Kernel;

/// An in-memory weight file. Tensors are indexed in name order.
pub struct WeightFile {
    bytes: Vec<u8>,
    names: Vec<String>,
}

impl WeightFile {
    pub fn from_bytes(bytes: Vec<u8>) -> KernelResult<Self> {
        let mut names: Vec<String> = SafeTensors::deserialize(&bytes)?
            .names()
            .into_iter()
            .cloned()
            .collect();
        names.sort();
        info!("Loaded weight file with {} tensors", names.len());
        Ok(Self { bytes, names })
    }

    pub fn open(path: impl AsRef<Path>) -> KernelResult<Self> {
        Self::from_bytes(std::fs::read(path)?)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn name_at(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Summaries for every tensor; `layout` forces the axis order of 4-D tensors.
    pub fn layers(&self, sizes: &[usize], layout: Option<KernelLayout>) -> KernelResult<Vec<LayerSummary>> {
        let tensors = SafeTensors::deserialize(&self.bytes)?;
        self.names
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let view = tensors.tensor(name)?;
                Ok(LayerSummary::describe(index, name, view.shape(), sizes, layout))
            })
            .collect()
    }

    /// All kernels of one tensor, input channel major.
    pub fn kernels(&self, name: &str, layout: Option<KernelLayout>) -> KernelResult<Vec<Kernel>> {
        if !self.names.iter().any(|n| n == name) {
            return Err(KernelError::TensorNotFound(name.to_string()));
        }
        let tensors = SafeTensors::deserialize(&self.bytes)?;
        let view = tensors.tensor(name)?;

        let shape = view.shape().to_vec();
        let not_a_kernel = || KernelError::NotAKernelTensor { name: name.to_string(), shape: shape.clone() };
        let &[a, b, c, d] = shape.as_slice() else {
            return Err(not_a_kernel());
        };
        let layout = layout.or_else(|| KernelLayout::detect(&shape)).ok_or_else(not_a_kernel)?;

        let values = decode(&view)?;
        let tensor = ArrayView4::from_shape((a, b, c, d), &values)?;
        let kernels = kernels_to_matrices(tensor, layout)?;
        debug!("Extracted {} kernels from '{}' ({:?})", kernels.len(), name, layout);
        Ok(kernels)
    }
}

fn decode(view: &TensorView<'_>) -> KernelResult<Vec<f64>> {
    let data = view.data();
    let values = match view.dtype() {
        Dtype::F64 => data.chunks_exact(8).map(|b| f64::from_le_bytes(le(b))).collect(),
        Dtype::F32 => data.chunks_exact(4).map(|b| f64::from(f32::from_le_bytes(le(b)))).collect(),
        Dtype::F16 => data.chunks_exact(2).map(|b| f16::from_le_bytes(le(b)).to_f64()).collect(),
        Dtype::BF16 => data.chunks_exact(2).map(|b| bf16::from_le_bytes(le(b)).to_f64()).collect(),
        other => return Err(KernelError::UnsupportedDtype(format!("{:?}", other))),
    };
    Ok(values)
}

fn le<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f32_bytes(values: impl Iterator<Item = f32>) -> Vec<u8> {
        values.flat_map(f32::to_le_bytes).collect()
    }

    fn sample_file() -> WeightFile {
        let conv = f32_bytes((0..72).map(|v| v as f32));
        let bias = f32_bytes([0.5f32, -0.5, 1.0, 2.0].into_iter());
        let half_conv: Vec<u8> = (0..9).flat_map(|v| f16::from_f32(v as f32).to_le_bytes()).collect();

        let tensors = vec![
            ("conv1.weight", TensorView::new(Dtype::F32, vec![3, 3, 2, 4], &conv).unwrap()),
            ("conv1.bias", TensorView::new(Dtype::F32, vec![4], &bias).unwrap()),
            ("conv2.weight", TensorView::new(Dtype::F16, vec![1, 1, 3, 3], &half_conv).unwrap()),
        ];
        let bytes = safetensors::serialize(tensors, &None).unwrap();
        WeightFile::from_bytes(bytes).unwrap()
    }

    #[test]
    fn test_layers_sorted_by_name() {
        let file = sample_file();
        assert_eq!(file.names(), &["conv1.bias", "conv1.weight", "conv2.weight"]);

        let layers = file.layers(&[3, 5], None).unwrap();
        let statuses: Vec<LayerStatus> = layers.iter().map(|l| l.status).collect();
        assert_eq!(statuses, vec![LayerStatus::NoMatrices, LayerStatus::Matched, LayerStatus::IgnoredSize]);
        assert_eq!(layers[1].num_matrices, 8);
    }

    #[test]
    fn test_extract_f32_kernels() {
        let file = sample_file();
        let kernels = file.kernels("conv1.weight", None).unwrap();
        assert_eq!(kernels.len(), 8);
        assert_eq!(kernels[0].order(), 3);
        // HWIO index of (h 0, w 1, in 0, out 0) is 8.
        assert_eq!(kernels[0].as_array()[[0, 1]], 8.0);
    }

    #[test]
    fn test_extract_f16_with_layout_override() {
        let file = sample_file();
        let kernels = file.kernels("conv2.weight", Some(KernelLayout::Oihw)).unwrap();
        assert_eq!(kernels.len(), 1);
        assert_eq!(kernels[0].flatten(), (0..9).map(f64::from).collect::<Vec<_>>());
    }

    #[test]
    fn test_extract_errors() {
        let file = sample_file();
        assert!(matches!(file.kernels("missing", None), Err(KernelError::TensorNotFound(_))));
        assert!(matches!(
            file.kernels("conv1.bias", None),
            Err(KernelError::NotAKernelTensor { .. })
        ));
        assert!(WeightFile::from_bytes(b"not a weight file".to_vec()).is_err());
    }
}
