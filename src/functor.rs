//! Stateless binary operators for reductions.
//!
//! A functor's result type is tied to the operator and its operand types
//! through [`Functor::Output`]; generic reductions name it as
//! [`ResultOf<F, A, B>`].

use std::ops;

/// A stateless binary operator.
pub trait Functor<A, B = A> {
    type Output;

    fn apply(&self, a: A, b: B) -> Self::Output;
}

/// Result type of functor `F` applied to `A` and `B`.
pub type ResultOf<F, A, B = A> = <F as Functor<A, B>>::Output;

/// Smaller of two values. Returns `a` when they compare equal or unordered.
#[derive(Debug, Clone, Copy, Default)]
pub struct Min;

/// Larger of two values. Returns `a` when they compare equal or unordered.
#[derive(Debug, Clone, Copy, Default)]
pub struct Max;

/// Sum of two values.
#[derive(Debug, Clone, Copy, Default)]
pub struct Add;

impl<T: PartialOrd> Functor<T, T> for Min {
    type Output = T;

    #[inline]
    fn apply(&self, a: T, b: T) -> T {
        if b < a {
            b
        } else {
            a
        }
    }
}

impl<T: PartialOrd> Functor<T, T> for Max {
    type Output = T;

    #[inline]
    fn apply(&self, a: T, b: T) -> T {
        if b > a {
            b
        } else {
            a
        }
    }
}

impl<A, B> Functor<A, B> for Add
where
    A: ops::Add<B>,
{
    type Output = A::Output;

    #[inline]
    fn apply(&self, a: A, b: B) -> A::Output {
        a + b
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::IVec3;

    fn fold<F, T>(functor: F, values: &[T]) -> Option<T>
    where
        F: Functor<T, T, Output = T>,
        T: Copy,
    {
        values.iter().copied().reduce(|a, b| functor.apply(a, b))
    }

    #[test]
    fn test_min_max_scalars() {
        assert_eq!(Min.apply(3, 7), 3);
        assert_eq!(Min.apply(-1.5f32, 2.0), -1.5);
        assert_eq!(Max.apply(3, 7), 7);
        assert_eq!(fold(Min, &[4.0f32, 0.25, 9.0]), Some(0.25));
        assert_eq!(fold(Max, &[4u32, 11, 9]), Some(11));
        assert_eq!(fold::<Min, i32>(Min, &[]), None);
    }

    #[test]
    fn test_min_keeps_first_on_nan() {
        assert_eq!(Min.apply(1.0f32, f32::NAN), 1.0);
    }

    #[test]
    fn test_add_result_type() {
        let sum: ResultOf<Add, IVec3> = Add.apply(IVec3::new(1, 2, 3), IVec3::ONE);
        assert_eq!(sum, IVec3::new(2, 3, 4));
        let total: ResultOf<Add, f32> = Add.apply(0.5f32, 0.25);
        assert_eq!(total, 0.75);
    }

    #[test]
    fn test_min_result_type_is_operand_type() {
        let m: ResultOf<Min, u8> = Min.apply(200u8, 7u8);
        assert_eq!(m, 7);
    }
}
