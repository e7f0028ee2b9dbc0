//! WGSL generation for the particle filter kernel.
//!
//! The generated compute shader evaluates a [`RelativeGlobalDomainPosition`]
//! filter and the charge of every particle of a [`ParticleBox`], one
//! invocation per particle. Filter bounds and the species' charge are baked
//! into the shader as constants, and the charge-state factor is only emitted
//! for species that declare it.
//!
//! [`ParticleBox`]: crate::ParticleBox

use crate::dimension::GridIndex;
use crate::filter::{FilterParams, RelativeGlobalDomainPosition};
use crate::identifier::{ChargeState, HasIdentifier};
use crate::species::Species;

/// Workgroup size of the generated kernel.
pub const WORKGROUP_SIZE: u32 = 256;

/// WGSL declaration of the domain uniform.
///
/// All vectors are `vec4<i32>`; unused axes hold offset 0 and size 1.
pub const DOMAIN_WGSL: &str = r#"
struct DomainParams {
    local_domain_offset: vec4<i32>,
    global_domain_size: vec4<i32>,
    super_cell_size: vec4<i32>,
    num_particles: u32,
    _pad0: u32,
    _pad1: u32,
    _pad2: u32,
};
"#;

/// WGSL `map_cell_idx(idx, size)` for cell type `C`.
///
/// Same convention as [`GridIndex::unravel`]: x runs fastest and the last
/// axis of `C` takes the remaining quotient.
pub fn map_cell_idx_wgsl<C: GridIndex>() -> String {
    let body = match C::DIM {
        1 => "    return vec4<i32>(i, 0, 0, 0);",
        2 => "    return vec4<i32>(i % size.x, i / size.x, 0, 0);",
        _ => {
            "    let x = i % size.x;
    let y = (i / size.x) % size.y;
    let z = i / (size.x * size.y);
    return vec4<i32>(x, y, z, 0);"
        }
    };
    format!(
        r#"fn map_cell_idx(idx: u32, size: vec4<i32>) -> vec4<i32> {{
    let i = i32(idx);
{body}
}}"#
    )
}

/// Uniform block matching `DomainParams` in [`DOMAIN_WGSL`].
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DomainParams {
    pub local_domain_offset: [i32; 4],
    pub global_domain_size: [i32; 4],
    pub super_cell_size: [i32; 4],
    pub num_particles: u32,
    pub _pad: [u32; 3],
}

impl DomainParams {
    pub fn new<Params, P>(filter: &RelativeGlobalDomainPosition<Params, P::Cell>, num_particles: u32) -> Self
    where
        Params: FilterParams,
        P: Species,
    {
        Self {
            local_domain_offset: filter.local_domain_offset().to_array4(0),
            global_domain_size: filter.global_domain_size().to_array4(1),
            super_cell_size: P::SUPER_CELL_SIZE.to_array4(1),
            num_particles,
            _pad: [0; 3],
        }
    }
}

/// WGSL `is_valid(p)` for species `P`.
pub fn validity_wgsl<P: Species>() -> String {
    let body = match P::MASK_FIELD {
        Some(field) => format!("p.{field} != 0u"),
        None => "true".to_string(),
    };
    format!(
        r#"fn is_valid(p: Particle) -> bool {{
    return {body};
}}"#
    )
}

/// Complete compute shader for species `P` and the given filter.
///
/// Bindings (group 0):
/// 0. `particles: array<Particle>` (read)
/// 1. `super_cell_offsets: array<vec4<i32>>` (read), local supercell offset per particle
/// 2. `domain: DomainParams` (uniform)
/// 3. `accepted: array<u32>` (write), 1 if the filter accepts the particle
/// 4. `charges: array<f32>` (write)
pub fn compute_shader<P, Params>(filter: &RelativeGlobalDomainPosition<Params, P::Cell>) -> String
where
    P: Species + HasIdentifier<ChargeState>,
    Params: FilterParams,
{
    let particle_struct = P::WGSL_STRUCT;
    let map_cell_idx = map_cell_idx_wgsl::<P::Cell>();
    let validity = validity_wgsl::<P>();
    let filter_code = filter.to_wgsl();
    let charge_code = crate::charge::to_wgsl::<P>();

    format!(
        r#"{particle_struct}
{DOMAIN_WGSL}
{map_cell_idx}

@group(0) @binding(0) var<storage, read> particles: array<Particle>;
@group(0) @binding(1) var<storage, read> super_cell_offsets: array<vec4<i32>>;
@group(0) @binding(2) var<uniform> domain: DomainParams;
@group(0) @binding(3) var<storage, read_write> accepted: array<u32>;
@group(0) @binding(4) var<storage, read_write> charges: array<f32>;

{validity}

{filter_code}

{charge_code}

@compute @workgroup_size({WORKGROUP_SIZE})
fn main(@builtin(global_invocation_id) global_id: vec3<u32>) {{
    let index = global_id.x;
    if index >= domain.num_particles {{
        return;
    }}

    let p = particles[index];
    accepted[index] = select(0u, 1u, filter_particle(p, super_cell_offsets[index]));
    charges[index] = get_charge(p.weighting, p);
}}
"#
    )
}
