//! Domain decomposition geometry.
//!
//! The global domain is split into local domains, one per process. Filters
//! only consume the result: the global extent and where this process's local
//! domain starts inside it. All values are in cells and exclude guard cells.

use crate::dimension::GridIndex;
use crate::error::DomainError;

/// An axis-aligned box of cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection<C: GridIndex> {
    /// First cell of the box.
    pub offset: C,
    /// Cells per axis.
    pub size: C,
}

impl<C: GridIndex> Selection<C> {
    pub fn new(offset: C, size: C) -> Self {
        Self { offset, size }
    }

    /// `true` if `cell` (in the same frame as `offset`) lies inside the box.
    pub fn contains(&self, cell: C) -> bool {
        (0..C::DIM).all(|axis| {
            let c = cell.component(axis) - self.offset.component(axis);
            c >= 0 && c < self.size.component(axis)
        })
    }
}

/// The decomposition record of one process.
///
/// Immutable after construction; filters copy what they need out of it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubGrid<C: GridIndex> {
    global: Selection<C>,
    local: Selection<C>,
}

impl<C: GridIndex> SubGrid<C> {
    /// A process owning the local domain `[local_offset, local_offset + local_size)`.
    pub fn new(global_size: C, local_offset: C, local_size: C) -> Result<Self, DomainError> {
        for axis in 0..C::DIM {
            let global = global_size.component(axis);
            if global <= 0 {
                return Err(DomainError::EmptyGlobalDomain { axis, size: global });
            }
            let offset = local_offset.component(axis);
            let size = local_size.component(axis);
            if offset < 0 || size <= 0 || offset + size > global {
                return Err(DomainError::LocalDomainOutside { axis, offset, size, global });
            }
        }

        Ok(Self {
            global: Selection::new(C::ZERO, global_size),
            local: Selection::new(local_offset, local_size),
        })
    }

    /// A single process owning the whole global domain.
    pub fn single(global_size: C) -> Result<Self, DomainError> {
        Self::new(global_size, C::ZERO, global_size)
    }

    /// Regular block decomposition of `global_size` over a grid of `ranks`.
    ///
    /// Returns the record of the process at grid position `rank`. When an axis
    /// does not divide evenly, the lowest ranks get one extra cell each.
    pub fn uniform(global_size: C, ranks: C, rank: C) -> Result<Self, DomainError> {
        let mut offset = [0i32; 3];
        let mut size = [0i32; 3];

        for axis in 0..C::DIM {
            let global = global_size.component(axis);
            if global <= 0 {
                return Err(DomainError::EmptyGlobalDomain { axis, size: global });
            }
            let n = ranks.component(axis);
            let r = rank.component(axis);
            if n <= 0 || r < 0 || r >= n || n > global {
                return Err(DomainError::InvalidRank { axis, rank: r, ranks: n });
            }

            let base = global / n;
            let extra = global % n;
            size[axis] = base + i32::from(r < extra);
            offset[axis] = r * base + r.min(extra);
        }

        Self::new(
            global_size,
            C::from_fn(|axis| offset[axis]),
            C::from_fn(|axis| size[axis]),
        )
    }

    pub fn global_domain(&self) -> Selection<C> {
        self.global
    }

    pub fn local_domain(&self) -> Selection<C> {
        self.local
    }
}
