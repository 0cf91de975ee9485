//! Symmetry Map From Image
//!
//! Scores the 3×3 neighbourhood of every interior pixel of a grayscale image.
//! Border pixels have no full neighbourhood, so an H×W image yields an
//! (H−2)×(W−2) map.

use ::image::{GrayImage, Luma};
use ndarray::{s, Array2};
use rayon::prelude::*;
use tracing::info;

use crate::analysis::symmetry_score;
use crate::error::{KernelError, KernelResult};
use crate::kernel::Kernel;

const PATCH: usize = 3;

/// Per-pixel symmetry scores, row-major.
#[derive(Debug, Clone)]
pub struct SymmetryMap {
    scores: Array2<f64>,
}

impl SymmetryMap {
    pub fn compute(image: &GrayImage) -> KernelResult<Self> {
        let (width, height) = image.dimensions();
        if width < PATCH as u32 || height < PATCH as u32 {
            return Err(KernelError::ImageTooSmall { width, height });
        }

        let pixels = Array2::from_shape_fn((height as usize, width as usize), |(y, x)| {
            f64::from(image.get_pixel(x as u32, y as u32)[0])
        });
        let out_h = height as usize - (PATCH - 1);
        let out_w = width as usize - (PATCH - 1);

        let rows: Vec<Vec<f64>> = (0..out_h)
            .into_par_iter()
            .map(|y| {
                (0..out_w)
                    .map(|x| {
                        let patch = pixels.slice(s![y..y + PATCH, x..x + PATCH]).to_owned();
                        Kernel::new(patch).map(|k| symmetry_score(&k))
                    })
                    .collect::<KernelResult<Vec<f64>>>()
            })
            .collect::<KernelResult<_>>()?;

        let scores = Array2::from_shape_vec((out_h, out_w), rows.into_iter().flatten().collect())?;
        info!("Computed {}x{} symmetry map from {}x{} image", out_w, out_h, width, height);
        Ok(Self { scores })
    }

    pub fn scores(&self) -> &Array2<f64> {
        &self.scores
    }

    /// `(width, height)` of the map.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.scores.ncols() as u32, self.scores.nrows() as u32)
    }

    /// Grayscale rendering: score `s` becomes intensity `floor(s * 255)`.
    pub fn to_image(&self) -> GrayImage {
        let (width, height) = self.dimensions();
        GrayImage::from_fn(width, height, |x, y| {
            let s = self.scores[[y as usize, x as usize]].clamp(0.0, 1.0);
            Luma([(s * 255.0) as u8])
        })
    }

    /// White where the score reaches `threshold`, black elsewhere.
    pub fn highlight(&self, threshold: f64) -> GrayImage {
        let (width, height) = self.dimensions();
        GrayImage::from_fn(width, height, |x, y| {
            if self.scores[[y as usize, x as usize]] >= threshold {
                Luma([255])
            } else {
                Luma([0])
            }
        })
    }

    /// Fraction of pixels scoring at least `threshold`.
    pub fn coverage(&self, threshold: f64) -> f64 {
        let hits = self.scores.iter().filter(|&&s| s >= threshold).count();
        hits as f64 / self.scores.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_image_is_fully_symmetric() {
        let image = GrayImage::from_pixel(64, 64, Luma([128]));
        let map = SymmetryMap::compute(&image).unwrap();
        assert_eq!(map.dimensions(), (62, 62));
        assert!(map.scores().iter().all(|&s| s == 1.0));

        let rendered = map.to_image();
        assert_eq!(rendered.dimensions(), (62, 62));
        assert!(rendered.pixels().all(|p| p[0] == 255));
        assert_eq!(map.coverage(0.99), 1.0);
    }

    #[test]
    fn test_rectangular_image_and_gradient() {
        // Horizontal ramp: every patch is mirror-symmetric top to bottom only.
        let image = GrayImage::from_fn(10, 5, |x, _| Luma([(x * 20) as u8]));
        let map = SymmetryMap::compute(&image).unwrap();
        assert_eq!(map.dimensions(), (8, 3));
        assert!(map.scores().iter().all(|&s| s < 1.0 && s >= 0.0));

        let mask = map.highlight(1.0);
        assert!(mask.pixels().all(|p| p[0] == 0));
        assert_eq!(map.coverage(1.0), 0.0);
    }

    #[test]
    fn test_patch_centred_on_pixel() {
        // A single bright pixel at (2, 2) sits at the centre of output pixel (1, 1).
        let mut image = GrayImage::from_pixel(5, 5, Luma([0]));
        image.put_pixel(2, 2, Luma([200]));
        let map = SymmetryMap::compute(&image).unwrap();
        assert_eq!(map.scores()[[1, 1]], 1.0);
        assert!(map.scores()[[0, 1]] < 1.0);
    }

    #[test]
    fn test_too_small() {
        let image = GrayImage::new(2, 8);
        let err = SymmetryMap::compute(&image).unwrap_err();
        assert!(matches!(err, KernelError::ImageTooSmall { width: 2, height: 8 }));
    }
}
