//! Coercion of host values into the exact ranges and shapes native slots
//! accept.
//!
//! Two policies live here and they are deliberately different: magnitudes are
//! clamped silently and totally, while sequence arity is a hard precondition
//! that fails with `LengthMismatch`.

use std::{
    error::Error,
    fmt::{self, Formatter, Display},
};


/// Clamp an integer channel into `[0, 255]`.
pub fn clamp_channel(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

/// Saturate a float channel into `[0.0, 1.0]`. NaN saturates to 0.
pub fn saturate(v: f32) -> f32 {
    let v = if 1.0 < v { 1.0 } else { v };
    if 0.0 < v { v } else { 0.0 }
}

/// Saturate a float channel and scale it to a byte, truncating.
pub fn channel_from_f32(v: f32) -> u8 {
    (saturate(v) * 255.0) as u8
}

/// Conversion of an arbitrary host integer into a fixed-width slot, capping
/// at the slot's bounds rather than wrapping.
pub trait SaturatingFrom<T>: Sized {
    fn saturating_from(v: T) -> Self;
}

macro_rules! saturating_from_wide {
    ($($slot:ty),*$(,)?)=>{
        $(
        impl SaturatingFrom<i128> for $slot {
            fn saturating_from(v: i128) -> Self {
                v.clamp(<$slot>::MIN as i128, <$slot>::MAX as i128) as $slot
            }
        }
        )*
    };
}

saturating_from_wide!(i8, u8, i16, u16, i32, u32, i64, u64, isize, usize);

/// Saturate any integer that widens losslessly into `i128` into slot type
/// `T`.
pub fn saturating<T, V>(v: V) -> T
where
    T: SaturatingFrom<i128>,
    V: Into<i128>,
{
    T::saturating_from(v.into())
}


/// A sequence was supplied for a fixed-arity field with the wrong number of
/// elements.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LengthMismatch {
    pub expected: usize,
    pub actual: usize,
}

impl Display for LengthMismatch {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "expected a sequence of exactly {} elements, got {}",
            self.expected,
            self.actual,
        )
    }
}

impl Error for LengthMismatch {}

/// Convert a slice into a fixed-size array. Never truncates or pads.
pub fn fixed_array<T, const N: usize>(seq: &[T]) -> Result<[T; N], LengthMismatch>
where
    T: Copy,
{
    <[T; N]>::try_from(seq)
        .map_err(|_| LengthMismatch {
            expected: N,
            actual: seq.len(),
        })
}


#[test]
fn test_clamp_channel() {
    assert_eq!(clamp_channel(-1), 0);
    assert_eq!(clamp_channel(i32::MIN), 0);
    assert_eq!(clamp_channel(0), 0);
    assert_eq!(clamp_channel(100), 100);
    assert_eq!(clamp_channel(255), 255);
    assert_eq!(clamp_channel(256), 255);
    assert_eq!(clamp_channel(i32::MAX), 255);
}

#[test]
fn test_saturate() {
    assert_eq!(saturate(-0.1), 0.0);
    assert_eq!(saturate(1.1), 1.0);
    assert_eq!(saturate(0.5), 0.5);
    assert_eq!(saturate(f32::NAN), 0.0);
    assert_eq!(saturate(f32::INFINITY), 1.0);
    assert_eq!(saturate(f32::NEG_INFINITY), 0.0);
    assert_eq!(channel_from_f32(100.0 / 255.0), 100);
    assert_eq!(channel_from_f32(-0.1), 0);
    assert_eq!(channel_from_f32(1.1), 255);
}

#[test]
fn test_saturating_width() {
    assert_eq!(saturating::<i16, i64>(40_000), i16::MAX);
    assert_eq!(saturating::<i16, i64>(-40_000), i16::MIN);
    assert_eq!(saturating::<i16, i32>(-12), -12);
    assert_eq!(saturating::<u32, i64>(-1), 0);
    assert_eq!(saturating::<u32, u64>(u64::MAX), u32::MAX);
    assert_eq!(saturating::<u16, u8>(200), 200);
}

#[test]
fn test_fixed_array_arity() {
    let arr: [i32; 3] = fixed_array(&[1, 2, 3]).unwrap();
    assert_eq!(arr, [1, 2, 3]);

    let err = fixed_array::<i32, 3>(&[1, 2, 3, 4]).unwrap_err();
    assert_eq!(err, LengthMismatch { expected: 3, actual: 4 });

    let err = fixed_array::<f32, 4>(&[1.0]).unwrap_err();
    assert_eq!(err, LengthMismatch { expected: 4, actual: 1 });
    assert!(fixed_array::<u8, 4>(&[]).is_err());
}
