//! Compile-time selection of per-species code paths.
//!
//! A quantity with an optional species-dependent correction is computed in two
//! steps: the part every species shares, then a correction strategy picked by
//! the species' [`Flag`] for the attribute. The strategy is a trait implemented
//! on the flag types themselves, so the choice is made by trait resolution and
//! each species gets exactly one monomorphized path.
//!
//! Supporting another kind of attribute state means adding a flag type and a
//! [`LoadAttribute`] impl for it.

use crate::identifier::{Absent, Flag, FlagOf, Get, HasIdentifier, Identifier, Present};

/// Correction applied to a partial result for attribute `I` of particle `P`.
pub trait LoadAttribute<I: Identifier, P>: Flag {
    fn apply(partial: f32, particle: &P) -> f32;
}

/// Multiply by the attribute value.
impl<I, P> LoadAttribute<I, P> for Present
where
    I: Identifier<Value = f32>,
    P: Get<I>,
{
    #[inline(always)]
    fn apply(partial: f32, particle: &P) -> f32 {
        partial * particle.get()
    }
}

/// Fallback for species without the attribute: the partial result is final.
impl<I, P> LoadAttribute<I, P> for Absent
where
    I: Identifier,
{
    #[inline(always)]
    fn apply(partial: f32, _particle: &P) -> f32 {
        partial
    }
}

/// Apply the correction for `I` selected by `P`'s declaration.
#[inline(always)]
pub fn load_attribute<I, P>(partial: f32, particle: &P) -> f32
where
    I: Identifier,
    P: HasIdentifier<I>,
    FlagOf<P, I>: LoadAttribute<I, P>,
{
    <FlagOf<P, I> as LoadAttribute<I, P>>::apply(partial, particle)
}
