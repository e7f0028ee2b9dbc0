//! Benchmarks for WGSL kernel generation.
//!
//! Run with: `cargo bench --bench kernel_gen`

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use supercell::kernel;
use supercell::prelude::*;

#[derive(Species, Clone, Copy)]
#[species(super_cell = [8, 8, 4], charge = 1.0)]
struct Ion {
    local_cell_idx: u32,
    weighting: f32,
    charge_state: f32,
    #[mask]
    multi_mask: u32,
}

#[derive(Species, Clone, Copy)]
#[species(super_cell = [16, 16], charge = -1.0)]
struct Electron {
    local_cell_idx: u32,
    weighting: f32,
    momentum: Vec3,
}

filter_params!(Slab { dimension: 0, lower: 0.3, upper: 0.6 });

fn bench_pieces(c: &mut Criterion) {
    let mut group = c.benchmark_group("wgsl_pieces");

    group.bench_function("charge_with_state", |b| {
        b.iter(|| black_box(supercell::charge::to_wgsl::<Ion>()))
    });
    group.bench_function("charge_without_state", |b| {
        b.iter(|| black_box(supercell::charge::to_wgsl::<Electron>()))
    });
    group.bench_function("validity", |b| b.iter(|| black_box(kernel::validity_wgsl::<Ion>())));

    let grid = SubGrid::single(IVec3::new(256, 128, 128)).unwrap();
    let filter = RelativeGlobalDomainPosition::<Slab, _>::new(&grid);
    group.bench_function("filter", |b| b.iter(|| black_box(filter.to_wgsl())));

    group.finish();
}

fn bench_compute_shader(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_shader");

    let grid = SubGrid::single(IVec3::new(256, 128, 128)).unwrap();
    let filter = RelativeGlobalDomainPosition::<Slab, _>::new(&grid);
    group.bench_function("ion_3d", |b| {
        b.iter(|| black_box(kernel::compute_shader::<Ion, Slab>(&filter)))
    });

    let grid = SubGrid::single(IVec2::new(512, 512)).unwrap();
    let filter = RelativeGlobalDomainPosition::<Slab, _>::new(&grid);
    group.bench_function("electron_2d", |b| {
        b.iter(|| black_box(kernel::compute_shader::<Electron, Slab>(&filter)))
    });

    group.finish();
}

fn bench_naga_validation(c: &mut Criterion) {
    let grid = SubGrid::single(IVec3::new(256, 128, 128)).unwrap();
    let filter = RelativeGlobalDomainPosition::<Slab, _>::new(&grid);
    let shader = kernel::compute_shader::<Ion, Slab>(&filter);

    c.bench_function("naga_parse_validate", |b| {
        b.iter(|| {
            let module = naga::front::wgsl::parse_str(black_box(&shader)).unwrap();
            let mut validator = naga::valid::Validator::new(
                naga::valid::ValidationFlags::all(),
                naga::valid::Capabilities::all(),
            );
            black_box(validator.validate(&module).unwrap())
        })
    });
}

criterion_group!(benches, bench_pieces, bench_compute_shader, bench_naga_validation);
criterion_main!(benches);
