//! Dihedral transformations of a square matrix.
//!
//! Every variant is a pure re-indexing, so `apply` returns a strided view of the
//! input instead of copying it.

use std::fmt;

use ndarray::{ArrayView2, Axis};
use serde::{Serialize, Serializer};

use super::Kernel;

/// The non-identity elements of the dihedral group of the square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transformation {
    /// Counter-clockwise quarter turn.
    Rotate90,
    Rotate180,
    Rotate270,
    /// Mirror across the vertical axis (left-right flip).
    ReflectVertical,
    /// Mirror across the horizontal axis (up-down flip).
    ReflectHorizontal,
    /// Mirror across the top-left to bottom-right diagonal (transpose).
    ReflectMainDiagonal,
    /// Mirror across the top-right to bottom-left diagonal.
    ReflectAntiDiagonal,
}

impl Transformation {
    pub const ALL: [Transformation; 7] = [
        Transformation::Rotate90,
        Transformation::Rotate180,
        Transformation::Rotate270,
        Transformation::ReflectVertical,
        Transformation::ReflectHorizontal,
        Transformation::ReflectMainDiagonal,
        Transformation::ReflectAntiDiagonal,
    ];

    pub fn apply<'a>(self, m: ArrayView2<'a, f64>) -> ArrayView2<'a, f64> {
        match self {
            // out[i][j] = m[j][n-1-i]
            Transformation::Rotate90 => {
                let mut v = m.reversed_axes();
                v.invert_axis(Axis(0));
                v
            }
            Transformation::Rotate180 => {
                let mut v = m;
                v.invert_axis(Axis(0));
                v.invert_axis(Axis(1));
                v
            }
            // out[i][j] = m[n-1-j][i]
            Transformation::Rotate270 => {
                let mut v = m.reversed_axes();
                v.invert_axis(Axis(1));
                v
            }
            Transformation::ReflectVertical => {
                let mut v = m;
                v.invert_axis(Axis(1));
                v
            }
            Transformation::ReflectHorizontal => {
                let mut v = m;
                v.invert_axis(Axis(0));
                v
            }
            Transformation::ReflectMainDiagonal => m.reversed_axes(),
            // out[i][j] = m[n-1-j][n-1-i]
            Transformation::ReflectAntiDiagonal => {
                let mut v = m.reversed_axes();
                v.invert_axis(Axis(0));
                v.invert_axis(Axis(1));
                v
            }
        }
    }

    /// Owned copy of the transformed kernel.
    pub fn apply_to(self, kernel: &Kernel) -> Kernel {
        Kernel(self.apply(kernel.view()).to_owned())
    }

    pub fn name(&self) -> &'static str {
        match self {
            Transformation::Rotate90 => "rotate_90",
            Transformation::Rotate180 => "rotate_180",
            Transformation::Rotate270 => "rotate_270",
            Transformation::ReflectVertical => "reflect_vertical",
            Transformation::ReflectHorizontal => "reflect_horizontal",
            Transformation::ReflectMainDiagonal => "reflect_main_diagonal",
            Transformation::ReflectAntiDiagonal => "reflect_anti_diagonal",
        }
    }
}

impl fmt::Display for Transformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Serialize for Transformation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    fn sample() -> Array2<f64> {
        array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]
    }

    #[test]
    fn test_rotations() {
        let m = sample();
        assert_eq!(
            Transformation::Rotate90.apply(m.view()),
            array![[3.0, 6.0, 9.0], [2.0, 5.0, 8.0], [1.0, 4.0, 7.0]]
        );
        assert_eq!(
            Transformation::Rotate180.apply(m.view()),
            array![[9.0, 8.0, 7.0], [6.0, 5.0, 4.0], [3.0, 2.0, 1.0]]
        );
        assert_eq!(
            Transformation::Rotate270.apply(m.view()),
            array![[7.0, 4.0, 1.0], [8.0, 5.0, 2.0], [9.0, 6.0, 3.0]]
        );
    }

    #[test]
    fn test_reflections() {
        let m = sample();
        assert_eq!(
            Transformation::ReflectVertical.apply(m.view()),
            array![[3.0, 2.0, 1.0], [6.0, 5.0, 4.0], [9.0, 8.0, 7.0]]
        );
        assert_eq!(
            Transformation::ReflectHorizontal.apply(m.view()),
            array![[7.0, 8.0, 9.0], [4.0, 5.0, 6.0], [1.0, 2.0, 3.0]]
        );
        assert_eq!(
            Transformation::ReflectMainDiagonal.apply(m.view()),
            array![[1.0, 4.0, 7.0], [2.0, 5.0, 8.0], [3.0, 6.0, 9.0]]
        );
        assert_eq!(
            Transformation::ReflectAntiDiagonal.apply(m.view()),
            array![[9.0, 6.0, 3.0], [8.0, 5.0, 2.0], [7.0, 4.0, 1.0]]
        );
    }

    #[test]
    fn test_all_variants_distinct() {
        let m = sample();
        for (i, a) in Transformation::ALL.iter().enumerate() {
            assert_ne!(a.apply(m.view()), m.view(), "{} acted as identity", a);
            for b in &Transformation::ALL[i + 1..] {
                assert_ne!(a.apply(m.view()), b.apply(m.view()), "{} == {}", a, b);
            }
        }
    }

    #[test]
    fn test_quarter_turn_composition() {
        let kernel = Kernel::new(sample()).unwrap();
        let mut turned = kernel.clone();
        for _ in 0..4 {
            turned = Transformation::Rotate90.apply_to(&turned);
        }
        assert_eq!(turned, kernel);

        let twice = Transformation::Rotate90.apply_to(&Transformation::Rotate90.apply_to(&kernel));
        assert_eq!(twice, Transformation::Rotate180.apply_to(&kernel));
    }
}
