//! Benchmarks for CPU filter evaluation and reductions.
//!
//! Run with: `cargo bench --bench filter_throughput`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use supercell::prelude::*;

#[derive(Species, Clone, Copy)]
#[species(super_cell = [8, 8, 4], charge = 1.0, mass = 1836.15)]
struct Ion {
    local_cell_idx: u32,
    weighting: f32,
    charge_state: f32,
    #[mask]
    multi_mask: u32,
}

#[derive(Species, Clone, Copy)]
#[species(super_cell = [8, 8, 4], charge = -1.0)]
struct Electron {
    local_cell_idx: u32,
    weighting: f32,
    momentum: Vec3,
}

filter_params!(Slab { dimension: 0, lower: 0.3, upper: 0.6 });

/// One particle per cell of a `size`-cube local domain.
fn fill<P: Species<Cell = IVec3>>(size: i32, make: impl Fn(IVec3) -> P) -> ParticleBox<P> {
    let grid = SubGrid::single(IVec3::splat(size)).unwrap();
    let mut particles = ParticleBox::new(grid).unwrap();
    for z in 0..size {
        for y in 0..size {
            for x in 0..size {
                let cell = IVec3::new(x, y, z);
                particles.insert(cell, make(cell)).unwrap();
            }
        }
    }
    particles
}

fn bench_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("count");

    for size in [16, 32, 64] {
        let ions = fill(size, |cell| Ion {
            local_cell_idx: 0,
            weighting: 1.0,
            charge_state: (cell.x % 4) as f32,
            multi_mask: 1,
        });
        let slab = RelativeGlobalDomainPosition::<Slab, _>::new(ions.sub_grid());
        group.throughput(Throughput::Elements(ions.len() as u64));

        group.bench_with_input(BenchmarkId::new("slab", size), &ions, |b, ions| {
            b.iter(|| black_box(ions.count(&slab)))
        });
        group.bench_with_input(BenchmarkId::new("all", size), &ions, |b, ions| {
            b.iter(|| black_box(ions.count(&All)))
        });
    }

    group.finish();
}

fn bench_total_charge(c: &mut Criterion) {
    let mut group = c.benchmark_group("total_charge");
    let size = 32;

    let ions = fill(size, |cell| Ion {
        local_cell_idx: 0,
        weighting: 10.0,
        charge_state: (cell.y % 3) as f32,
        multi_mask: 1,
    });
    let electrons = fill(size, |_| Electron {
        local_cell_idx: 0,
        weighting: 10.0,
        momentum: Vec3::ZERO,
    });
    let ion_slab = RelativeGlobalDomainPosition::<Slab, _>::new(ions.sub_grid());
    let electron_slab = RelativeGlobalDomainPosition::<Slab, _>::new(electrons.sub_grid());

    group.throughput(Throughput::Elements(ions.len() as u64));
    group.bench_function("with_charge_state", |b| {
        b.iter(|| black_box(ions.total_charge(&ion_slab)))
    });
    group.bench_function("without_charge_state", |b| {
        b.iter(|| black_box(electrons.total_charge(&electron_slab)))
    });

    group.finish();
}

fn bench_select(c: &mut Criterion) {
    let ions = fill(32, |_| Ion {
        local_cell_idx: 0,
        weighting: 1.0,
        charge_state: 1.0,
        multi_mask: 1,
    });
    let slab = RelativeGlobalDomainPosition::<Slab, _>::new(ions.sub_grid());

    c.bench_function("select_slab", |b| b.iter(|| black_box(ions.select(&slab))));
}

criterion_group!(benches, bench_count, bench_total_charge, bench_select);
criterion_main!(benches);
