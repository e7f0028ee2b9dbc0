//! Select particles by their relative position in the global domain.
//!
//! The range `[LOWER_BOUND, UPPER_BOUND)` is given in units of the global
//! domain extent along one axis. Lower bounds are inclusive and upper bounds
//! exclusive, so filters with `upper == next.lower` tile the domain without
//! gap or overlap.
//!
//! ```ignore
//! supercell::filter_params!(pub LeftHalf { dimension: 0, lower: 0.0, upper: 0.5 });
//!
//! let filter = RelativeGlobalDomainPosition::<LeftHalf, IVec3>::new(&sub_grid);
//! let count = particles.count(&filter);
//! ```

use std::fmt;
use std::marker::PhantomData;

use super::{Filter, WorkerCfg};
use crate::dimension::GridIndex;
use crate::domain::SubGrid;
use crate::species::Species;

/// Compile-time configuration of a [`RelativeGlobalDomainPosition`] filter.
///
/// Requires `0 <= LOWER_BOUND < UPPER_BOUND <= 1` and `DIMENSION` smaller than
/// the simulation dimension; violations fail to compile when the filter is
/// constructed.
pub trait FilterParams: Send + Sync + 'static {
    /// Axis the range applies to.
    const DIMENSION: usize;
    /// Inclusive lower bound, relative to the global extent.
    const LOWER_BOUND: f32;
    /// Exclusive upper bound, relative to the global extent.
    const UPPER_BOUND: f32;
}

/// Declare a [`FilterParams`] type.
///
/// ```ignore
/// supercell::filter_params!(pub Slab { dimension: 1, lower: 0.25, upper: 0.75 });
/// ```
#[macro_export]
macro_rules! filter_params {
    ($(#[$meta:meta])* $vis:vis $name:ident { dimension: $dim:expr, lower: $lower:expr, upper: $upper:expr $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default)]
        $vis struct $name;

        impl $crate::filter::FilterParams for $name {
            const DIMENSION: usize = $dim;
            const LOWER_BOUND: f32 = $lower;
            const UPPER_BOUND: f32 = $upper;
        }
    };
}

struct Check<Params, C>(PhantomData<(Params, C)>);

impl<Params: FilterParams, C: GridIndex> Check<Params, C> {
    const VALID: () = {
        assert!(Params::DIMENSION < C::DIM, "filter dimension exceeds the simulation dimension");
        assert!(Params::LOWER_BOUND >= 0.0, "lower bound must not be negative");
        assert!(Params::LOWER_BOUND < Params::UPPER_BOUND, "lower bound must be below upper bound");
        assert!(Params::UPPER_BOUND <= 1.0, "upper bound must not exceed 1");
    };
}

/// Host-side filter, built once per run from the decomposition record.
pub struct RelativeGlobalDomainPosition<Params, C: GridIndex> {
    local_domain_offset: C,
    global_domain_size: C,
    _params: PhantomData<fn() -> Params>,
}

impl<Params: FilterParams, C: GridIndex> RelativeGlobalDomainPosition<Params, C> {
    pub fn new(sub_grid: &SubGrid<C>) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Check::<Params, C>::VALID;

        let filter = Self {
            local_domain_offset: sub_grid.local_domain().offset,
            global_domain_size: sub_grid.global_domain().size,
            _params: PhantomData,
        };
        log::debug!(
            "RelativeGlobalDomainPosition: axis {} in [{}, {}), global size {:?}, local offset {:?}",
            Params::DIMENSION,
            Params::LOWER_BOUND,
            Params::UPPER_BOUND,
            filter.global_domain_size,
            filter.local_domain_offset
        );
        filter
    }

    pub fn local_domain_offset(&self) -> C {
        self.local_domain_offset
    }

    pub fn global_domain_size(&self) -> C {
        self.global_domain_size
    }

    /// Instance for the supercell at `local_super_cell_offset`.
    ///
    /// Same as [`Filter::instantiate`], without naming a species.
    #[inline]
    pub fn at(&self, local_super_cell_offset: C) -> acc::RelativeGlobalDomainPosition<Params, C> {
        acc::RelativeGlobalDomainPosition::new(
            self.local_domain_offset,
            self.global_domain_size,
            local_super_cell_offset,
        )
    }

    /// WGSL `filter_particle(p, local_super_cell_offset)` for this filter.
    ///
    /// Expects the `domain` uniform, `map_cell_idx`, an `is_valid(p)` function and the particle
    /// struct to be in scope; see [`kernel`](crate::kernel).
    pub fn to_wgsl(&self) -> String {
        let dim = Params::DIMENSION;
        format!(
            r#"const FILTER_DIMENSION: u32 = {dim}u;
const FILTER_LOWER_BOUND: f32 = {lower:?};
const FILTER_UPPER_BOUND: f32 = {upper:?};

fn filter_particle(p: Particle, local_super_cell_offset: vec4<i32>) -> bool {{
    if !is_valid(p) {{
        return false;
    }}
    let global_super_cell_offset = domain.local_domain_offset + local_super_cell_offset * domain.super_cell_size;
    let cell_in_super_cell = map_cell_idx(p.local_cell_idx, domain.super_cell_size);
    let global_cell = global_super_cell_offset + cell_in_super_cell;
    let relative_position = f32(global_cell[FILTER_DIMENSION]) / f32(domain.global_domain_size[FILTER_DIMENSION]);
    return FILTER_LOWER_BOUND <= relative_position && relative_position < FILTER_UPPER_BOUND;
}}"#,
            lower = Params::LOWER_BOUND,
            upper = Params::UPPER_BOUND,
        )
    }
}

impl<Params, C: GridIndex> Clone for RelativeGlobalDomainPosition<Params, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Params, C: GridIndex> Copy for RelativeGlobalDomainPosition<Params, C> {}

impl<Params, C: GridIndex> fmt::Debug for RelativeGlobalDomainPosition<Params, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelativeGlobalDomainPosition")
            .field("local_domain_offset", &self.local_domain_offset)
            .field("global_domain_size", &self.global_domain_size)
            .finish()
    }
}

impl<Params, P> Filter<P> for RelativeGlobalDomainPosition<Params, P::Cell>
where
    Params: FilterParams,
    P: Species,
{
    type Acc = acc::RelativeGlobalDomainPosition<Params, P::Cell>;

    #[inline]
    fn instantiate(&self, local_super_cell_offset: P::Cell, _worker: &WorkerCfg) -> Self::Acc {
        self.at(local_super_cell_offset)
    }
}

/// Per-supercell instances.
pub mod acc {
    use std::fmt;
    use std::marker::PhantomData;

    use super::FilterParams;
    use crate::dimension::GridIndex;
    use crate::filter::AccFilter;
    use crate::species::Species;

    /// Filter instance for one supercell.
    pub struct RelativeGlobalDomainPosition<Params, C: GridIndex> {
        local_domain_offset: C,
        global_domain_size: C,
        local_super_cell_offset: C,
        _params: PhantomData<fn() -> Params>,
    }

    impl<Params: FilterParams, C: GridIndex> RelativeGlobalDomainPosition<Params, C> {
        /// Instance from raw geometry. Parameters are validated at compile time
        /// as for the host filter:
        ///
        /// ```compile_fail
        /// use supercell::filter::acc::RelativeGlobalDomainPosition;
        /// use supercell::IVec2;
        ///
        /// supercell::filter_params!(Depth { dimension: 2, lower: 0.0, upper: 0.5 });
        ///
        /// let _ = RelativeGlobalDomainPosition::<Depth, IVec2>::new(IVec2::ZERO, IVec2::ONE, IVec2::ZERO);
        /// ```
        #[inline]
        pub fn new(local_domain_offset: C, global_domain_size: C, local_super_cell_offset: C) -> Self {
            #[allow(clippy::let_unit_value)]
            let () = super::Check::<Params, C>::VALID;

            Self {
                local_domain_offset,
                global_domain_size,
                local_super_cell_offset,
                _params: PhantomData,
            }
        }

        /// Offset of the supercell (in cells, without guards) to the origin
        /// of the global domain.
        #[inline]
        pub fn global_super_cell_offset(&self, super_cell_size: C) -> C {
            self.local_domain_offset + self.local_super_cell_offset * super_cell_size
        }

        /// Global cell of the cell with linear index `local_cell_idx` in this
        /// supercell.
        #[inline]
        pub fn global_cell(&self, local_cell_idx: u32, super_cell_size: C) -> C {
            let cell_in_super_cell = C::unravel(local_cell_idx, super_cell_size);
            self.global_super_cell_offset(super_cell_size) + cell_in_super_cell
        }

        /// Position of `global_cell` along the filter axis, relative to the
        /// global extent.
        #[inline]
        pub fn relative_position(&self, global_cell: C) -> f32 {
            global_cell.component(Params::DIMENSION) as f32
                / self.global_domain_size.component(Params::DIMENSION) as f32
        }

        /// Whether `global_cell` lies in the configured range.
        #[inline]
        pub fn contains_cell(&self, global_cell: C) -> bool {
            let relative_position = self.relative_position(global_cell);
            Params::LOWER_BOUND <= relative_position && relative_position < Params::UPPER_BOUND
        }
    }

    impl<Params, P> AccFilter<P> for RelativeGlobalDomainPosition<Params, P::Cell>
    where
        Params: FilterParams,
        P: Species,
    {
        #[inline]
        fn test(&self, particle: &P) -> bool {
            if !particle.is_valid() {
                return false;
            }
            let global_cell = self.global_cell(particle.local_cell_idx(), P::SUPER_CELL_SIZE);
            self.contains_cell(global_cell)
        }
    }

    impl<Params, C: GridIndex> Clone for RelativeGlobalDomainPosition<Params, C> {
        fn clone(&self) -> Self {
            *self
        }
    }

    impl<Params, C: GridIndex> Copy for RelativeGlobalDomainPosition<Params, C> {}

    impl<Params, C: GridIndex> fmt::Debug for RelativeGlobalDomainPosition<Params, C> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("RelativeGlobalDomainPosition")
                .field("local_domain_offset", &self.local_domain_offset)
                .field("global_domain_size", &self.global_domain_size)
                .field("local_super_cell_offset", &self.local_super_cell_offset)
                .finish()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{IVec2, IVec3};

    crate::filter_params!(Band { dimension: 0, lower: 0.2, upper: 0.5 });
    crate::filter_params!(Lower { dimension: 1, lower: 0.0, upper: 0.5 });
    crate::filter_params!(Upper { dimension: 1, lower: 0.5, upper: 1.0 });

    #[test]
    fn test_boundary_inclusion() {
        let grid = SubGrid::single(IVec2::new(100, 10)).unwrap();
        let acc = RelativeGlobalDomainPosition::<Band, _>::new(&grid).at(IVec2::ZERO);

        assert!(acc.contains_cell(IVec2::new(20, 0)));
        assert!(acc.contains_cell(IVec2::new(49, 0)));
        assert!(!acc.contains_cell(IVec2::new(50, 0)));
        assert!(!acc.contains_cell(IVec2::new(19, 0)));
    }

    #[test]
    fn test_offset_composition() {
        let grid = SubGrid::new(IVec2::new(64, 8), IVec2::new(10, 0), IVec2::new(32, 8)).unwrap();
        let acc = RelativeGlobalDomainPosition::<Band, _>::new(&grid).at(IVec2::new(2, 0));
        let super_cell = IVec2::new(8, 8);

        assert_eq!(acc.global_super_cell_offset(super_cell), IVec2::new(26, 0));
        let idx = IVec2::new(3, 0).ravel(super_cell);
        assert_eq!(acc.global_cell(idx, super_cell), IVec2::new(29, 0));
    }

    #[test]
    fn test_adjacent_ranges_tile() {
        for size in [1, 2, 3, 7, 10, 64, 99, 100, 1000] {
            let grid = SubGrid::single(IVec3::new(4, size, 2)).unwrap();
            let lower = RelativeGlobalDomainPosition::<Lower, _>::new(&grid).at(IVec3::ZERO);
            let upper = RelativeGlobalDomainPosition::<Upper, _>::new(&grid).at(IVec3::ZERO);
            for y in 0..size {
                let cell = IVec3::new(0, y, 0);
                assert!(lower.contains_cell(cell) ^ upper.contains_cell(cell), "size {size}, cell {y}");
            }
        }
    }

    #[test]
    fn test_instance_from_raw_geometry_matches_host() {
        let grid = SubGrid::new(100, 40, 20).unwrap();
        let host = RelativeGlobalDomainPosition::<Band, i32>::new(&grid).at(1);
        let raw = acc::RelativeGlobalDomainPosition::<Band, i32>::new(40, 100, 1);
        for idx in 0..10 {
            assert_eq!(host.global_cell(idx, 10), raw.global_cell(idx, 10));
        }
        assert_eq!(raw.global_cell(3, 10), 53);
    }

    #[test]
    fn test_relative_position_uses_filter_axis() {
        let grid = SubGrid::single(IVec3::new(4, 200, 2)).unwrap();
        let acc = RelativeGlobalDomainPosition::<Lower, _>::new(&grid).at(IVec3::ZERO);
        assert_eq!(acc.relative_position(IVec3::new(3, 50, 1)), 0.25);
    }

    #[test]
    fn test_host_filter_captures_geometry() {
        let grid = SubGrid::uniform(IVec2::new(100, 10), IVec2::new(2, 1), IVec2::new(1, 0)).unwrap();
        let filter = RelativeGlobalDomainPosition::<Band, _>::new(&grid);
        assert_eq!(filter.local_domain_offset(), IVec2::new(50, 0));
        assert_eq!(filter.global_domain_size(), IVec2::new(100, 10));
    }

    #[test]
    fn test_wgsl_bakes_params() {
        let grid = SubGrid::single(IVec2::new(100, 10)).unwrap();
        let wgsl = RelativeGlobalDomainPosition::<Band, _>::new(&grid).to_wgsl();
        assert!(wgsl.contains("const FILTER_DIMENSION: u32 = 0u;"));
        assert!(wgsl.contains("const FILTER_LOWER_BOUND: f32 = 0.2;"));
        assert!(wgsl.contains("const FILTER_UPPER_BOUND: f32 = 0.5;"));
    }
}
