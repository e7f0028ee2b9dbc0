//! Particle filters.
//!
//! A filter has two stages:
//!
//! - the host filter ([`Filter`]) is built once per run and captures
//!   whatever global state it needs;
//! - for every supercell it is [instantiated](Filter::instantiate) into a small
//!   `Copy` value ([`AccFilter`]) that is evaluated once per particle.
//!
//! Instances hold no references and share nothing, so supercells can be
//! processed concurrently in any order.

mod relative_global_domain_position;

pub use relative_global_domain_position::{acc, FilterParams, RelativeGlobalDomainPosition};

use crate::species::Species;

/// Worker executing a supercell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerCfg {
    /// Index of this worker.
    pub worker_idx: usize,
    /// Number of workers in the pool.
    pub num_workers: usize,
}

impl WorkerCfg {
    pub fn new(worker_idx: usize, num_workers: usize) -> Self {
        Self { worker_idx, num_workers }
    }

    /// The rayon worker running the caller, or worker 0 of 1 outside a pool.
    pub fn current() -> Self {
        match rayon::current_thread_index() {
            Some(idx) => Self::new(idx, rayon::current_num_threads()),
            None => Self::new(0, 1),
        }
    }
}

/// Host-side filter for particles of species `P`.
pub trait Filter<P: Species>: Send + Sync {
    /// Per-supercell filter evaluated for each particle.
    type Acc: AccFilter<P>;

    /// Create the filter for one supercell.
    ///
    /// `local_super_cell_offset` is in supercells, relative to the origin of
    /// the local domain, without guards.
    fn instantiate(&self, local_super_cell_offset: P::Cell, worker: &WorkerCfg) -> Self::Acc;
}

/// Per-supercell filter.
pub trait AccFilter<P>: Copy + Send + Sync {
    fn test(&self, particle: &P) -> bool;
}

/// Accepts every particle.
#[derive(Debug, Clone, Copy, Default)]
pub struct All;

impl<P: Species> Filter<P> for All {
    type Acc = All;

    #[inline]
    fn instantiate(&self, _: P::Cell, _: &WorkerCfg) -> All {
        All
    }
}

impl<P> AccFilter<P> for All {
    #[inline]
    fn test(&self, _: &P) -> bool {
        true
    }
}

/// Accepts particles in occupied slots.
#[derive(Debug, Clone, Copy, Default)]
pub struct IsHandleValid;

impl<P: Species> Filter<P> for IsHandleValid {
    type Acc = IsHandleValid;

    #[inline]
    fn instantiate(&self, _: P::Cell, _: &WorkerCfg) -> IsHandleValid {
        IsHandleValid
    }
}

impl<P: Species> AccFilter<P> for IsHandleValid {
    #[inline]
    fn test(&self, particle: &P) -> bool {
        particle.is_valid()
    }
}
