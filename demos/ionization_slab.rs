//! # Ionization Slab
//!
//! A plasma column split over four processes. Ions closer to the back of the
//! domain carry a higher charge state. Three adjacent slab filters partition
//! the domain along x, and every process sums the charge of its own particles
//! per slab, which is all a distributed reduction needs.
//!
//! Finally the kernel runs on the GPU for one process, if an adapter exists.
//!
//! Run with: `cargo run --example ionization_slab`

use supercell::gpu::GpuContext;
use supercell::prelude::*;

#[derive(Species, Clone, Copy)]
#[species(super_cell = [8, 4, 4], charge = 1.0, mass = 1836.15)]
struct Ion {
    local_cell_idx: u32,
    weighting: f32,
    charge_state: f32,
    #[mask]
    multi_mask: u32,
}

#[derive(Species, Clone, Copy)]
#[species(super_cell = [8, 4, 4], charge = -1.0)]
struct Electron {
    local_cell_idx: u32,
    weighting: f32,
    momentum: Vec3,
}

filter_params!(Front { dimension: 0, lower: 0.0, upper: 0.25 });
filter_params!(Middle { dimension: 0, lower: 0.25, upper: 0.75 });
filter_params!(Back { dimension: 0, lower: 0.75, upper: 1.0 });

const GLOBAL: IVec3 = IVec3::new(128, 16, 16);
const RANKS: IVec3 = IVec3::new(4, 1, 1);

fn populate(sub_grid: SubGrid<IVec3>) -> Result<(ParticleBox<Ion>, ParticleBox<Electron>), DomainError> {
    let mut ions = ParticleBox::new(sub_grid)?;
    let mut electrons = ParticleBox::new(sub_grid)?;
    let local = sub_grid.local_domain();

    for z in 0..local.size.z {
        for y in 0..local.size.y {
            for x in 0..local.size.x {
                let cell = IVec3::new(x, y, z);
                let global_x = local.offset.x + x;
                let charge_state = 1.0 + (4 * global_x / GLOBAL.x) as f32;

                ions.insert(
                    cell,
                    Ion {
                        local_cell_idx: 0,
                        weighting: 100.0,
                        charge_state,
                        // every 7th slot is empty
                        multi_mask: u32::from((x + y + z) % 7 != 0),
                    },
                )?;
                electrons.insert(
                    cell,
                    Electron {
                        local_cell_idx: 0,
                        weighting: 100.0 * charge_state,
                        momentum: Vec3::ZERO,
                    },
                )?;
            }
        }
    }
    Ok((ions, electrons))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut totals = [0.0f32; 3];

    for rank in 0..RANKS.x {
        let sub_grid = SubGrid::uniform(GLOBAL, RANKS, IVec3::new(rank, 0, 0))?;
        let (ions, electrons) = populate(sub_grid)?;

        let front = RelativeGlobalDomainPosition::<Front, _>::new(&sub_grid);
        let middle = RelativeGlobalDomainPosition::<Middle, _>::new(&sub_grid);
        let back = RelativeGlobalDomainPosition::<Back, _>::new(&sub_grid);

        let local = [
            ions.total_charge(&front) + electrons.total_charge(&front),
            ions.total_charge(&middle) + electrons.total_charge(&middle),
            ions.total_charge(&back) + electrons.total_charge(&back),
        ];
        println!(
            "rank {}: offset {:>3}, {} valid ions, net charge per slab {:?}",
            rank,
            sub_grid.local_domain().offset.x,
            ions.count(&IsHandleValid),
            local
        );
        for (total, value) in totals.iter_mut().zip(local) {
            *total += value;
        }
    }
    println!("net charge front/middle/back: {:?}", totals);

    // GPU evaluation of the middle slab for rank 1
    let sub_grid = SubGrid::uniform(GLOBAL, RANKS, IVec3::new(1, 0, 0))?;
    let (ions, _) = populate(sub_grid)?;
    let middle = RelativeGlobalDomainPosition::<Middle, _>::new(&sub_grid);

    match GpuContext::new() {
        Ok(gpu) => {
            let outputs = gpu.evaluate(&ions, &middle)?;
            let accepted = outputs.iter().filter(|o| o.accepted).count();
            let charge: f32 = outputs.iter().filter(|o| o.accepted).map(|o| o.charge).sum();
            println!(
                "GPU rank 1 middle slab: {} accepted (CPU {}), ion charge {} (CPU {})",
                accepted,
                ions.count(&middle),
                charge,
                ions.total_charge(&middle)
            );
        }
        Err(e) => println!("skipping GPU evaluation: {}", e),
    }

    Ok(())
}
