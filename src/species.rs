//! The species trait produced by `#[derive(Species)]`.

use crate::dimension::GridIndex;
use crate::identifier::{Get, HasIdentifier, LocalCellIdx, Weighting};

/// Trait automatically implemented by `#[derive(Species)]`.
///
/// A species is a particle struct plus the compile-time traits shared by all
/// its particles: supercell size, base charge and mass per unit weighting, and
/// the set of attributes it declares (see [`identifier`](crate::identifier)).
///
/// # Example
///
/// ```ignore
/// #[derive(Species, Clone, Copy)]
/// #[species(super_cell = [8, 8, 4], charge = 1.0, mass = 1836.15)]
/// struct Ion {
///     local_cell_idx: u32,   // Required
///     weighting: f32,        // Required
///     charge_state: f32,     // Optional: binds `ChargeState`
///     #[mask]
///     multi_mask: u32,       // Optional: 0 marks an empty slot
/// }
/// ```
///
/// Literal supercell extents must be positive:
///
/// ```compile_fail
/// use supercell::prelude::*;
///
/// #[derive(Species, Clone, Copy)]
/// #[species(super_cell = [4, 0], charge = 1.0)]
/// struct Sheet {
///     local_cell_idx: u32,
///     weighting: f32,
/// }
/// ```
///
/// # Do Not Implement Manually
///
/// The GPU layout and identifier impls must agree with each other; the derive
/// keeps them in sync.
pub trait Species:
    Copy
    + Send
    + Sync
    + 'static
    + HasIdentifier<LocalCellIdx>
    + HasIdentifier<Weighting>
    + Get<LocalCellIdx>
    + Get<Weighting>
{
    /// Grid coordinate type, which fixes the simulation dimensionality.
    type Cell: GridIndex;

    /// GPU-compatible representation with WGSL alignment padding.
    type Gpu: Copy + bytemuck::Pod + bytemuck::Zeroable + Send + Sync;

    /// Human readable species name.
    const NAME: &'static str;

    /// Cells per axis of one supercell.
    const SUPER_CELL_SIZE: Self::Cell;

    /// Charge of a macro-particle with weighting 1.
    const CHARGE: f32;

    /// Mass of a macro-particle with weighting 1.
    const MASS: f32;

    /// WGSL struct definition matching [`Species::Gpu`].
    const WGSL_STRUCT: &'static str;

    /// Field holding the slot mask, if the species has one.
    const MASK_FIELD: Option<&'static str>;

    /// `false` for empty slots.
    fn is_valid(&self) -> bool;

    /// Store the linear cell index inside the supercell.
    fn set_local_cell_idx(&mut self, idx: u32);

    fn to_gpu(&self) -> Self::Gpu;

    fn from_gpu(gpu: &Self::Gpu) -> Self;

    /// Linear cell index inside the supercell.
    #[inline]
    fn local_cell_idx(&self) -> u32 {
        <Self as Get<LocalCellIdx>>::get(self)
    }

    #[inline]
    fn weighting(&self) -> f32 {
        <Self as Get<Weighting>>::get(self)
    }
}

/// Number of cells in one supercell of `P`.
#[inline]
pub fn super_cell_volume<P: Species>() -> i32 {
    P::SUPER_CELL_SIZE.volume()
}

/// Mass of a macro-particle with the given weighting.
#[inline]
pub fn mass<P: Species>(weighting: f32) -> f32 {
    P::MASS * weighting
}
