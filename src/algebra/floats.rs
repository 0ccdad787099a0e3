use num_traits::{Float, FromPrimitive, NumAssign};

/// Scalar type the solver computes over.
///
/// Everything numeric in this crate is generic over `FloatT`, which
/// collects the arithmetic, conversion and formatting abilities the
/// iteration needs from its scalars: IEEE float behaviour and the
/// assignment operators for the vector kernels, construction from
/// primitives for literal parameters, and `Display`/`LowerExp` so the
/// diagnostic printing can format residuals.  Implementations are
/// provided for `f32` and `f64`; any other type meeting the bounds
/// behaves identically.
pub trait FloatT:
    'static
    + Float
    + NumAssign
    + FromPrimitive
    + std::fmt::Debug
    + std::fmt::Display
    + std::fmt::LowerExp
{
}

impl FloatT for f32 {}
impl FloatT for f64 {}

/// Conversion of literal constants into a [`FloatT`].
///
/// Tolerances and parameter defaults read much better as
/// `(0.99).as_T()` than as the unwrapped `num_traits` conversion they
/// expand to, so the solver uses this everywhere a constant meets a
/// generic scalar.
#[allow(non_snake_case)]
pub trait AsFloatT<T>: 'static {
    fn as_T(&self) -> T;
}

macro_rules! impl_as_T {
    ($($ty:ty => $from:ident),* $(,)?) => {
        $(
            impl<T: FloatT> AsFloatT<T> for $ty {
                #[inline]
                fn as_T(&self) -> T {
                    T::$from(*self).unwrap()
                }
            }
        )*
    };
}

impl_as_T!(f32 => from_f32, f64 => from_f64, usize => from_usize);
