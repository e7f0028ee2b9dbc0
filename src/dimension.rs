//! Integer grid coordinates for 1D, 2D and 3D simulations.
//!
//! Simulations are compiled for one dimensionality. Instead of carrying the
//! dimension around at runtime, every geometry type is generic over a
//! [`GridIndex`], which is implemented for `i32` (1D), [`IVec2`] and [`IVec3`].
//! All arithmetic is elementwise.

use glam::{IVec2, IVec3};
use std::fmt::Debug;
use std::ops::{Add, Mul};

/// A cell coordinate, offset or extent on the simulation grid.
pub trait GridIndex:
    Copy + Debug + PartialEq + Add<Output = Self> + Mul<Output = Self> + Send + Sync + 'static
{
    /// Number of axes.
    const DIM: usize;

    /// All components zero.
    const ZERO: Self;

    /// All components one.
    const ONE: Self;

    /// Component along `axis`.
    ///
    /// `axis` must be `< DIM`.
    fn component(self, axis: usize) -> i32;

    /// Build a value by evaluating `f` for the axes `0..DIM` in order.
    fn from_fn(f: impl FnMut(usize) -> i32) -> Self;

    /// Product of all components (number of cells of an extent).
    fn volume(self) -> i32 {
        (0..Self::DIM).map(|axis| self.component(axis)).product()
    }

    /// `true` if every component lies in `0..extent` on its axis.
    fn is_inside(self, extent: Self) -> bool {
        (0..Self::DIM).all(|axis| {
            let c = self.component(axis);
            c >= 0 && c < extent.component(axis)
        })
    }

    /// Map a linear index into a coordinate inside `extent`.
    ///
    /// The x axis runs fastest: `x = i % ex`, `y = (i / ex) % ey`,
    /// `z = i / (ex * ey)`. The last axis takes the remaining quotient.
    fn unravel(linear: u32, extent: Self) -> Self {
        let mut rest = linear as i32;
        Self::from_fn(|axis| {
            if axis + 1 == Self::DIM {
                rest
            } else {
                let e = extent.component(axis);
                let c = rest % e;
                rest /= e;
                c
            }
        })
    }

    /// Inverse of [`GridIndex::unravel`].
    fn ravel(self, extent: Self) -> u32 {
        let mut linear = 0;
        let mut stride = 1;
        for axis in 0..Self::DIM {
            linear += self.component(axis) * stride;
            stride *= extent.component(axis);
        }
        linear as u32
    }

    /// Widen to four components, filling missing axes with `fill`.
    ///
    /// Used for GPU uniforms, which are always `vec4<i32>`.
    fn to_array4(self, fill: i32) -> [i32; 4] {
        let mut out = [fill; 4];
        for (axis, slot) in out.iter_mut().enumerate().take(Self::DIM) {
            *slot = self.component(axis);
        }
        out
    }
}

impl GridIndex for i32 {
    const DIM: usize = 1;
    const ZERO: Self = 0;
    const ONE: Self = 1;

    #[inline]
    fn component(self, axis: usize) -> i32 {
        debug_assert!(axis == 0, "axis {axis} out of range for 1D");
        self
    }

    #[inline]
    fn from_fn(mut f: impl FnMut(usize) -> i32) -> Self {
        f(0)
    }
}

impl GridIndex for IVec2 {
    const DIM: usize = 2;
    const ZERO: Self = IVec2::ZERO;
    const ONE: Self = IVec2::ONE;

    #[inline]
    fn component(self, axis: usize) -> i32 {
        self[axis]
    }

    #[inline]
    fn from_fn(mut f: impl FnMut(usize) -> i32) -> Self {
        let x = f(0);
        let y = f(1);
        IVec2::new(x, y)
    }
}

impl GridIndex for IVec3 {
    const DIM: usize = 3;
    const ZERO: Self = IVec3::ZERO;
    const ONE: Self = IVec3::ONE;

    #[inline]
    fn component(self, axis: usize) -> i32 {
        self[axis]
    }

    #[inline]
    fn from_fn(mut f: impl FnMut(usize) -> i32) -> Self {
        let x = f(0);
        let y = f(1);
        let z = f(2);
        IVec3::new(x, y, z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unravel_x_fastest_3d() {
        let extent = IVec3::new(8, 8, 4);
        assert_eq!(IVec3::unravel(0, extent), IVec3::ZERO);
        assert_eq!(IVec3::unravel(3, extent), IVec3::new(3, 0, 0));
        assert_eq!(IVec3::unravel(8, extent), IVec3::new(0, 1, 0));
        assert_eq!(IVec3::unravel(64, extent), IVec3::new(0, 0, 1));
        assert_eq!(IVec3::unravel(8 * 8 * 4 - 1, extent), IVec3::new(7, 7, 3));
    }

    #[test]
    fn test_unravel_2d_and_1d() {
        let extent = IVec2::new(8, 8);
        assert_eq!(IVec2::unravel(19, extent), IVec2::new(3, 2));
        assert_eq!(i32::unravel(5, 10), 5);
    }

    #[test]
    fn test_ravel_inverts_unravel() {
        let extent = IVec3::new(4, 3, 2);
        for linear in 0..extent.volume() as u32 {
            let cell = IVec3::unravel(linear, extent);
            assert!(cell.is_inside(extent));
            assert_eq!(cell.ravel(extent), linear);
        }
    }

    #[test]
    fn test_volume_and_inside() {
        assert_eq!(IVec3::new(8, 8, 4).volume(), 256);
        assert_eq!(IVec2::new(3, 5).volume(), 15);
        assert_eq!(7i32.volume(), 7);

        let extent = IVec2::new(4, 4);
        assert!(IVec2::new(3, 0).is_inside(extent));
        assert!(!IVec2::new(4, 0).is_inside(extent));
        assert!(!IVec2::new(0, -1).is_inside(extent));
    }

    #[test]
    fn test_to_array4_fills_missing_axes() {
        assert_eq!(IVec2::new(3, 4).to_array4(1), [3, 4, 1, 1]);
        assert_eq!(9i32.to_array4(0), [9, 0, 0, 0]);
        assert_eq!(IVec3::new(1, 2, 3).to_array4(0), [1, 2, 3, 0]);
    }
}
