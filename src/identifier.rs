//! Per-particle attribute identifiers.
//!
//! An identifier names an attribute a particle species may carry, such as its
//! weighting or its charge state. Whether a species carries an identifier is a
//! property of its type: `#[derive(Species)]` implements [`HasIdentifier`] for
//! every built-in identifier, with [`Present`] as flag for the attributes the
//! struct declares and [`Absent`] for all others.
//!
//! ```ignore
//! use supercell::identifier::{has_identifier, ChargeState};
//!
//! // Evaluated during monomorphization, no particle data involved.
//! let ionizable = has_identifier::<Ion, ChargeState>();
//! ```
//!
//! Custom identifiers are declared with [`identifier!`](crate::identifier!)
//! and bound to a field with `#[identifier(Path)]`.

use glam::Vec3;

/// Marker type naming a per-particle attribute.
pub trait Identifier: Send + Sync + 'static {
    /// Value type stored per particle.
    type Value: Copy;

    /// Attribute name, also used as the WGSL field name.
    const NAME: &'static str;
}

/// Type-level boolean describing whether a species carries an identifier.
pub trait Flag: Send + Sync + 'static {
    const VALUE: bool;
}

/// The species declares the attribute.
#[derive(Debug, Clone, Copy, Default)]
pub struct Present;

/// The species does not declare the attribute.
#[derive(Debug, Clone, Copy, Default)]
pub struct Absent;

impl Flag for Present {
    const VALUE: bool = true;
}

impl Flag for Absent {
    const VALUE: bool = false;
}

/// Declares whether `Self` carries identifier `I`.
///
/// Generated by `#[derive(Species)]`; implement manually only for custom
/// identifiers a species does not carry.
pub trait HasIdentifier<I: Identifier> {
    type Flag: Flag;
}

/// Read access to the attribute named by `I`.
pub trait Get<I: Identifier> {
    fn get(&self) -> I::Value;
}

/// Shorthand for the presence flag of `I` on `P`.
pub type FlagOf<P, I> = <P as HasIdentifier<I>>::Flag;

/// Whether species `P` declares identifier `I`.
///
/// A `const fn` over associated constants only, so it folds away entirely.
#[inline(always)]
pub const fn has_identifier<P, I>() -> bool
where
    P: HasIdentifier<I>,
    I: Identifier,
{
    <FlagOf<P, I> as Flag>::VALUE
}

/// Declare a custom attribute identifier.
///
/// ```ignore
/// supercell::identifier!(pub BoundElectrons: f32 = "bound_electrons");
/// ```
#[macro_export]
macro_rules! identifier {
    ($(#[$meta:meta])* $vis:vis $name:ident : $value:ty = $field:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default)]
        $vis struct $name;

        impl $crate::identifier::Identifier for $name {
            type Value = $value;
            const NAME: &'static str = $field;
        }
    };
}

identifier!(
    /// Linear index of the particle's cell inside its supercell.
    pub LocalCellIdx: u32 = "local_cell_idx"
);
identifier!(
    /// Number of physical particles represented by a macro-particle.
    pub Weighting: f32 = "weighting"
);
identifier!(
    /// Ionization level multiplying the species' base charge.
    pub ChargeState: f32 = "charge_state"
);
identifier!(
    /// Macro-particle momentum.
    pub Momentum: Vec3 = "momentum"
);

#[cfg(test)]
mod tests {
    use super::*;

    identifier!(pub Spin: f32 = "spin");

    #[derive(Clone, Copy)]
    struct Spinning {
        spin: f32,
    }

    impl HasIdentifier<Spin> for Spinning {
        type Flag = Present;
    }

    impl Get<Spin> for Spinning {
        fn get(&self) -> f32 {
            self.spin
        }
    }

    impl HasIdentifier<ChargeState> for Spinning {
        type Flag = Absent;
    }

    #[test]
    fn test_has_identifier_resolves_from_flags() {
        assert!(has_identifier::<Spinning, Spin>());
        assert!(!has_identifier::<Spinning, ChargeState>());
    }

    #[test]
    fn test_has_identifier_is_const() {
        const SPINS: bool = has_identifier::<Spinning, Spin>();
        assert!(SPINS);
    }

    #[test]
    fn test_custom_identifier_access() {
        let p = Spinning { spin: 0.5 };
        assert_eq!(<Spinning as Get<Spin>>::get(&p), 0.5);
        assert_eq!(Spin::NAME, "spin");
    }

    #[test]
    fn test_builtin_names() {
        assert_eq!(LocalCellIdx::NAME, "local_cell_idx");
        assert_eq!(Weighting::NAME, "weighting");
        assert_eq!(ChargeState::NAME, "charge_state");
        assert_eq!(Momentum::NAME, "momentum");
    }
}
