//! Charge of a macro-particle.

use crate::dispatch::{load_attribute, LoadAttribute};
use crate::identifier::{ChargeState, FlagOf, HasIdentifier};
use crate::species::Species;

/// Charge of a macro-particle of `P` with weighting 1.
#[inline(always)]
pub fn frame_charge<P: Species>() -> f32 {
    P::CHARGE
}

/// Charge of a macro-particle.
///
/// `frame_charge::<P>() * weighting`, multiplied by the particle's charge state
/// when `P` declares one. `weighting` is not validated.
#[inline(always)]
pub fn get_charge<P>(weighting: f32, particle: &P) -> f32
where
    P: Species + HasIdentifier<ChargeState>,
    FlagOf<P, ChargeState>: LoadAttribute<ChargeState, P>,
{
    load_attribute::<ChargeState, P>(frame_charge::<P>() * weighting, particle)
}

/// Species whose charge can be computed, i.e. every derived species.
///
/// Lets generic code ask for `P: GetCharge` instead of repeating the
/// dispatch bounds of [`get_charge`].
pub trait GetCharge: Species {
    fn charge(&self, weighting: f32) -> f32;
}

impl<P> GetCharge for P
where
    P: Species + HasIdentifier<ChargeState>,
    FlagOf<P, ChargeState>: LoadAttribute<ChargeState, P>,
{
    #[inline(always)]
    fn charge(&self, weighting: f32) -> f32 {
        get_charge(weighting, self)
    }
}

/// WGSL `get_charge(weighting, p)` for species `P`.
///
/// The charge-state factor is emitted only for species that declare it, so
/// the shader carries the same specialization as the CPU path.
pub fn to_wgsl<P>() -> String
where
    P: Species + HasIdentifier<ChargeState>,
{
    let correction = if crate::identifier::has_identifier::<P, ChargeState>() {
        " * p.charge_state"
    } else {
        ""
    };
    format!(
        r#"const FRAME_CHARGE: f32 = {charge:?};

fn get_charge(weighting: f32, p: Particle) -> f32 {{
    return FRAME_CHARGE * weighting{correction};
}}"#,
        charge = frame_charge::<P>(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Species as DeriveSpecies;

    #[derive(DeriveSpecies, Clone, Copy, Debug)]
    #[species(super_cell = [4, 4], charge = -2.0, mass = 1.0)]
    struct Electron {
        local_cell_idx: u32,
        weighting: f32,
    }

    #[derive(DeriveSpecies, Clone, Copy, Debug)]
    #[species(super_cell = [4, 4], charge = 1.5, mass = 1836.0)]
    struct Ion {
        local_cell_idx: u32,
        weighting: f32,
        charge_state: f32,
    }

    #[test]
    fn test_charge_without_charge_state() {
        let e = Electron { local_cell_idx: 0, weighting: 3.0 };
        for w in [0.5f32, 1.0, 3.0, 1.0e6] {
            assert_eq!(get_charge(w, &e), -2.0 * w);
        }
    }

    #[test]
    fn test_charge_with_charge_state() {
        let ion = Ion { local_cell_idx: 0, weighting: 3.0, charge_state: 4.0 };
        for w in [0.5f32, 1.0, 3.0, 1.0e6] {
            assert_eq!(get_charge(w, &ion), 1.5 * w * 4.0);
        }
    }

    #[test]
    fn test_neutral_charge_state() {
        let ion = Ion { local_cell_idx: 0, weighting: 1.0, charge_state: 0.0 };
        assert_eq!(ion.charge(ion.weighting), 0.0);
    }

    #[test]
    fn test_wgsl_follows_declaration() {
        assert!(!to_wgsl::<Electron>().contains("charge_state"));
        assert!(to_wgsl::<Ion>().contains("* p.charge_state"));
        assert!(to_wgsl::<Ion>().contains("const FRAME_CHARGE: f32 = 1.5;"));
    }
}
