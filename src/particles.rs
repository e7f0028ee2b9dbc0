//! Supercell-major particle storage and the per-supercell dispatch loop.

use rayon::prelude::*;

use crate::charge::GetCharge;
use crate::dimension::GridIndex;
use crate::domain::SubGrid;
use crate::error::DomainError;
use crate::filter::{AccFilter, Filter, WorkerCfg};
use crate::functor::{Add, Functor};
use crate::species::Species;

/// Particles of one species in the local domain, grouped by supercell.
///
/// Supercells are stored x-fastest. Inside a supercell particles keep
/// insertion order; a particle's cell is encoded in its `local_cell_idx`.
///
/// Every loop instantiates the filter once per supercell and tests each of its
/// particles. Supercells are processed in parallel, and all results are
/// independent of scheduling.
pub struct ParticleBox<P: Species> {
    sub_grid: SubGrid<P::Cell>,
    super_cells: P::Cell,
    frames: Vec<Vec<P>>,
}

impl<P: Species> ParticleBox<P> {
    /// Empty storage covering the local domain of `sub_grid`.
    pub fn new(sub_grid: SubGrid<P::Cell>) -> Result<Self, DomainError> {
        let local_size = sub_grid.local_domain().size;
        for axis in 0..P::Cell::DIM {
            let size = local_size.component(axis);
            let super_cell = P::SUPER_CELL_SIZE.component(axis);
            if super_cell <= 0 {
                return Err(DomainError::EmptySuperCell { axis, super_cell });
            }
            if size % super_cell != 0 {
                return Err(DomainError::NotSuperCellAligned { axis, size, super_cell });
            }
        }

        let super_cells = P::Cell::from_fn(|axis| local_size.component(axis) / P::SUPER_CELL_SIZE.component(axis));
        let count = super_cells.volume() as usize;
        log::debug!(
            "ParticleBox<{}>: {:?} supercells of {:?} cells",
            P::NAME,
            super_cells,
            P::SUPER_CELL_SIZE
        );

        Ok(Self {
            sub_grid,
            super_cells,
            frames: vec![Vec::new(); count],
        })
    }

    pub fn sub_grid(&self) -> &SubGrid<P::Cell> {
        &self.sub_grid
    }

    /// Supercells per axis.
    pub fn super_cells(&self) -> P::Cell {
        self.super_cells
    }

    /// Number of stored particles, including empty slots.
    pub fn len(&self) -> usize {
        self.frames.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.iter().all(Vec::is_empty)
    }

    /// Offset (in supercells) of supercell `index` to the local domain origin.
    pub fn super_cell_offset(&self, index: usize) -> P::Cell {
        P::Cell::unravel(index as u32, self.super_cells)
    }

    /// Particles of supercell `index`.
    pub fn frame(&self, index: usize) -> &[P] {
        &self.frames[index]
    }

    /// Iterate all particles with the offset of their supercell.
    pub fn iter(&self) -> impl Iterator<Item = (P::Cell, &P)> + '_ {
        self.frames
            .iter()
            .enumerate()
            .flat_map(move |(index, frame)| {
                let offset = self.super_cell_offset(index);
                frame.iter().map(move |p| (offset, p))
            })
    }

    /// Store `particle` in local cell `local_cell`.
    ///
    /// Overwrites the particle's `local_cell_idx`.
    pub fn insert(&mut self, local_cell: P::Cell, mut particle: P) -> Result<(), DomainError> {
        let local_size = self.sub_grid.local_domain().size;
        for axis in 0..P::Cell::DIM {
            let cell = local_cell.component(axis);
            let size = local_size.component(axis);
            if cell < 0 || cell >= size {
                return Err(DomainError::CellOutside { axis, cell, size });
            }
        }

        let super_cell = P::Cell::from_fn(|axis| local_cell.component(axis) / P::SUPER_CELL_SIZE.component(axis));
        let in_super_cell = P::Cell::from_fn(|axis| local_cell.component(axis) % P::SUPER_CELL_SIZE.component(axis));

        particle.set_local_cell_idx(in_super_cell.ravel(P::SUPER_CELL_SIZE));
        let index = super_cell.ravel(self.super_cells) as usize;
        self.frames[index].push(particle);
        Ok(())
    }

    /// Store `particle` in global cell `global_cell`, which must belong to
    /// this process's local domain.
    pub fn insert_global(&mut self, global_cell: P::Cell, particle: P) -> Result<(), DomainError> {
        let offset = self.sub_grid.local_domain().offset;
        let local_cell = P::Cell::from_fn(|axis| global_cell.component(axis) - offset.component(axis));
        self.insert(local_cell, particle)
    }

    /// Copies of all particles accepted by `filter`, in storage order.
    pub fn select<F: Filter<P>>(&self, filter: &F) -> Vec<P> {
        self.frames
            .par_iter()
            .enumerate()
            .flat_map_iter(|(index, frame)| {
                let acc = filter.instantiate(self.super_cell_offset(index), &WorkerCfg::current());
                frame.iter().filter(move |p| acc.test(p)).copied()
            })
            .collect()
    }

    /// Number of particles accepted by `filter`.
    pub fn count<F: Filter<P>>(&self, filter: &F) -> usize {
        self.frames
            .par_iter()
            .enumerate()
            .map(|(index, frame)| {
                let acc = filter.instantiate(self.super_cell_offset(index), &WorkerCfg::current());
                frame.iter().filter(|p| acc.test(p)).count()
            })
            .sum()
    }

    /// Filter mask in storage order.
    pub fn mask<F: Filter<P>>(&self, filter: &F) -> Vec<bool> {
        self.frames
            .par_iter()
            .enumerate()
            .flat_map_iter(|(index, frame)| {
                let acc = filter.instantiate(self.super_cell_offset(index), &WorkerCfg::current());
                frame.iter().map(move |p| acc.test(p))
            })
            .collect()
    }

    /// Map accepted particles with `map` and combine the results with `functor`.
    ///
    /// Returns `None` when no particle is accepted. `functor` must be
    /// associative; the combination order is unspecified.
    pub fn reduce<F, M, R, T>(&self, filter: &F, map: M, functor: R) -> Option<T>
    where
        F: Filter<P>,
        M: Fn(&P) -> T + Sync + Send,
        R: Functor<T, T, Output = T> + Sync + Send,
        T: Send,
    {
        self.frames
            .par_iter()
            .enumerate()
            .flat_map_iter(|(index, frame)| {
                let acc = filter.instantiate(self.super_cell_offset(index), &WorkerCfg::current());
                frame.iter().filter(move |p| acc.test(p))
            })
            .map(&map)
            .reduce_with(|a, b| functor.apply(a, b))
    }

    /// Summed charge of all particles accepted by `filter`.
    pub fn total_charge<F: Filter<P>>(&self, filter: &F) -> f32
    where
        P: GetCharge,
    {
        self.reduce(filter, |p| p.charge(p.weighting()), Add).unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{All, IsHandleValid, RelativeGlobalDomainPosition};
    use crate::functor::{Max, Min};
    use crate::Species as DeriveSpecies;
    use glam::IVec2;

    #[derive(DeriveSpecies, Clone, Copy, Debug, PartialEq)]
    #[species(super_cell = [4, 2], charge = 2.0)]
    struct Ion {
        local_cell_idx: u32,
        weighting: f32,
        charge_state: f32,
        #[mask]
        multi_mask: u32,
    }

    const FLAT: i32 = 0;

    #[derive(DeriveSpecies, Clone, Copy)]
    #[species(super_cell = [4, FLAT], charge = 1.0)]
    struct Sheet {
        local_cell_idx: u32,
        weighting: f32,
    }

    fn ion(weighting: f32, charge_state: f32) -> Ion {
        Ion { local_cell_idx: 0, weighting, charge_state, multi_mask: 1 }
    }

    crate::filter_params!(LeftHalf { dimension: 0, lower: 0.0, upper: 0.5 });

    #[test]
    fn test_rejects_unaligned_local_domain() {
        let grid = SubGrid::single(IVec2::new(10, 4)).unwrap();
        assert!(matches!(
            ParticleBox::<Ion>::new(grid),
            Err(DomainError::NotSuperCellAligned { axis: 0, size: 10, super_cell: 4 })
        ));
    }

    #[test]
    fn test_rejects_empty_super_cell() {
        let grid = SubGrid::single(IVec2::new(8, 8)).unwrap();
        assert!(matches!(
            ParticleBox::<Sheet>::new(grid),
            Err(DomainError::EmptySuperCell { axis: 1, super_cell: 0 })
        ));
    }

    #[test]
    fn test_insert_sets_cell_index() {
        let grid = SubGrid::single(IVec2::new(8, 4)).unwrap();
        let mut ions = ParticleBox::<Ion>::new(grid).unwrap();
        assert_eq!(ions.super_cells(), IVec2::new(2, 2));

        ions.insert(IVec2::new(5, 3), ion(1.0, 1.0)).unwrap();

        // supercell (1, 1), cell (1, 1) inside it
        assert_eq!(ions.frame(3).len(), 1);
        assert_eq!(ions.frame(3)[0].local_cell_idx, 1 + 4);
        assert_eq!(ions.super_cell_offset(3), IVec2::new(1, 1));
        assert_eq!(ions.len(), 1);
    }

    #[test]
    fn test_insert_rejects_cells_outside() {
        let grid = SubGrid::single(IVec2::new(8, 4)).unwrap();
        let mut ions = ParticleBox::<Ion>::new(grid).unwrap();
        let err = ions.insert(IVec2::new(8, 0), ion(1.0, 1.0)).unwrap_err();
        assert_eq!(err, DomainError::CellOutside { axis: 0, cell: 8, size: 8 });
        assert!(ions.is_empty());
    }

    #[test]
    fn test_insert_global_uses_local_offset() {
        let grid = SubGrid::new(IVec2::new(16, 4), IVec2::new(8, 0), IVec2::new(8, 4)).unwrap();
        let mut ions = ParticleBox::<Ion>::new(grid).unwrap();
        ions.insert_global(IVec2::new(9, 0), ion(1.0, 1.0)).unwrap();
        assert!(ions.insert_global(IVec2::new(7, 0), ion(1.0, 1.0)).is_err());
        let (offset, p) = ions.iter().next().unwrap();
        assert_eq!(offset, IVec2::ZERO);
        assert_eq!(p.local_cell_idx, 1);
    }

    #[test]
    fn test_filters_and_reductions() {
        let grid = SubGrid::single(IVec2::new(8, 2)).unwrap();
        let mut ions = ParticleBox::<Ion>::new(grid).unwrap();
        for x in 0..8 {
            ions.insert(IVec2::new(x, 0), ion(x as f32 + 1.0, 1.0)).unwrap();
        }
        let mut empty = ion(100.0, 1.0);
        empty.multi_mask = 0;
        ions.insert(IVec2::new(0, 1), empty).unwrap();

        let left = RelativeGlobalDomainPosition::<LeftHalf, _>::new(&grid);

        assert_eq!(ions.count(&All), 9);
        assert_eq!(ions.count(&IsHandleValid), 8);
        assert_eq!(ions.count(&left), 4);
        assert_eq!(ions.mask(&left).iter().filter(|&&m| m).count(), 4);

        let selected = ions.select(&left);
        let weights: Vec<f32> = selected.iter().map(|p| p.weighting).collect();
        assert_eq!(weights, vec![1.0, 2.0, 3.0, 4.0]);

        assert_eq!(ions.reduce(&left, |p| p.weighting, Min), Some(1.0));
        assert_eq!(ions.reduce(&left, |p| p.weighting, Max), Some(4.0));
        assert_eq!(ions.total_charge(&left), 2.0 * (1.0 + 2.0 + 3.0 + 4.0));
    }

    #[test]
    fn test_empty_reduction() {
        let grid = SubGrid::single(IVec2::new(8, 2)).unwrap();
        let ions = ParticleBox::<Ion>::new(grid).unwrap();
        assert_eq!(ions.reduce(&All, |p| p.weighting, Min), None);
        assert_eq!(ions.total_charge(&All), 0.0);
        assert!(ions.select(&All).is_empty());
    }
}
