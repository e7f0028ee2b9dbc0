//! # supercell - particle kernels for supercell-decomposed PIC codes
//!
//! Building blocks for the per-particle work of a distributed particle-in-cell
//! simulation: compile-time dispatch on the attributes a species declares, and
//! filters that select particles by their position in the *global* domain while
//! each process only sees its own local domain.
//!
//! ## Quick Start
//!
//! ```ignore
//! use supercell::prelude::*;
//!
//! #[derive(Species, Clone, Copy)]
//! #[species(super_cell = [8, 8, 4], charge = 1.0, mass = 1836.15)]
//! struct Ion {
//!     local_cell_idx: u32,
//!     weighting: f32,
//!     charge_state: f32,
//! }
//!
//! filter_params!(FrontSlab { dimension: 0, lower: 0.0, upper: 0.25 });
//!
//! fn main() -> Result<(), DomainError> {
//!     let sub_grid = SubGrid::single(IVec3::new(128, 64, 64))?;
//!     let mut ions = ParticleBox::<Ion>::new(sub_grid)?;
//!     ions.insert(IVec3::new(3, 5, 7), Ion { local_cell_idx: 0, weighting: 10.0, charge_state: 2.0 })?;
//!
//!     let slab = RelativeGlobalDomainPosition::<FrontSlab, _>::new(&sub_grid);
//!     println!("charge in slab: {}", ions.total_charge(&slab));
//!     Ok(())
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Species and identifiers
//!
//! `#[derive(Species)]` turns a particle struct into a species. The fields it
//! declares decide which [identifiers](identifier) the species carries, and
//! quantities with optional corrections are specialized per species through
//! [`dispatch`]. [`charge::get_charge`] is the canonical example: the charge
//! state factor only exists in the code of species that declare one.
//!
//! ### Filters
//!
//! A [`filter::Filter`] is built once per run and instantiated per supercell;
//! the instance tests single particles. [`filter::RelativeGlobalDomainPosition`]
//! reconstructs a particle's global cell from the domain decomposition
//! ([`domain::SubGrid`]), the supercell offset and the particle's cell index.
//!
//! ### Execution
//!
//! [`ParticleBox`] runs filters and reductions over supercells in parallel on
//! the CPU. [`kernel`] generates the equivalent WGSL compute shader and
//! [`gpu::GpuContext`] runs it.

extern crate self as supercell;

pub mod charge;
pub mod dimension;
pub mod dispatch;
pub mod domain;
pub mod error;
pub mod filter;
pub mod functor;
pub mod gpu;
pub mod identifier;
pub mod kernel;
mod particles;
mod species;

pub use bytemuck;
pub use glam;
pub use glam::{IVec2, IVec3, Vec2, Vec3, Vec4};

pub use charge::{get_charge, GetCharge};
pub use dimension::GridIndex;
pub use domain::{Selection, SubGrid};
pub use error::{DomainError, GpuError};
pub use particles::ParticleBox;
pub use species::{mass, super_cell_volume, Species};
pub use supercell_derive::Species;

/// Convenient re-exports for common usage.
///
/// # Usage
///
/// ```ignore
/// use supercell::prelude::*;
/// ```
pub mod prelude {
    pub use crate::charge::{get_charge, GetCharge};
    pub use crate::dimension::GridIndex;
    pub use crate::domain::{Selection, SubGrid};
    pub use crate::error::DomainError;
    pub use crate::filter::{AccFilter, All, Filter, FilterParams, IsHandleValid, RelativeGlobalDomainPosition, WorkerCfg};
    pub use crate::functor::{Add, Functor, Max, Min};
    pub use crate::identifier::{has_identifier, ChargeState, Get, HasIdentifier, LocalCellIdx, Momentum, Weighting};
    pub use crate::particles::ParticleBox;
    pub use crate::species::Species;
    pub use crate::{filter_params, identifier};
    pub use crate::{IVec2, IVec3, Vec2, Vec3, Vec4};
    pub use supercell_derive::Species;
}
