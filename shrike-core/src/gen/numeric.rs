//! Integer and float generators.
//!
//! Every integer width reduces to a canonical `u64` or `i64` draw and is
//! converted with a mapper, so all widths share one shrinker. Floats draw an
//! IEEE bit pattern and reinterpret it.

use super::Generator;
use crate::arbitrary::Arbitrary;
use crate::constraints::{Range, Weights};
use crate::convert::{IntoValue, Typed};
use crate::data::{Bias, RandomSource};
use crate::error::{Error, Result};
use crate::shrink::{FloatWidth, Shrinker};
use crate::types::Type;
use crate::value::{Func, Value};
use num_traits::{NumCast, PrimInt, Signed, ToPrimitive, Unsigned};
use std::fmt;

/// Unsigned integers of any width over `range`.
pub fn unsigned<T>(range: Range<T>) -> Generator
where
    T: PrimInt + Unsigned + Typed + IntoValue + fmt::Debug + Send + Sync + 'static,
{
    let canonical = Range::ordered(
        range.min().to_u64().unwrap_or(0),
        range.max().to_u64().unwrap_or(u64::MAX),
    );
    let generator = Generator::Unsigned(canonical);
    if T::type_of() == Type::U64 {
        return generator;
    }
    generator.map(Func::try_new(cast::<u64, T>))
}

/// Signed integers of any width over `range`.
pub fn signed<T>(range: Range<T>) -> Generator
where
    T: PrimInt + Signed + Typed + IntoValue + fmt::Debug + Send + Sync + 'static,
{
    let canonical = Range::ordered(
        range.min().to_i64().unwrap_or(i64::MIN),
        range.max().to_i64().unwrap_or(i64::MAX),
    );
    let generator = Generator::Signed(canonical);
    if T::type_of() == Type::I64 {
        return generator;
    }
    generator.map(Func::try_new(cast::<i64, T>))
}

pub fn float32(range: Range<f32>) -> Generator {
    Generator::Float32(range)
}

pub fn float64(range: Range<f64>) -> Generator {
    Generator::Float64(range)
}

fn cast<A, T>(value: A) -> Result<T>
where
    A: ToPrimitive + Typed + fmt::Display + Copy,
    T: NumCast + Typed,
{
    <T as NumCast>::from(value)
        .ok_or_else(|| Error::conversion(T::type_of(), format!("{} {value}", A::type_of())))
}

fn expect(component: &'static str, expected: Type, target: &Type) -> Result<()> {
    if &expected == target {
        Ok(())
    } else {
        Err(Error::mismatch(component, expected, target))
    }
}

pub(super) fn generate_unsigned(
    range: Range<u64>,
    target: &Type,
    bias: Bias,
    source: &mut RandomSource,
) -> Result<Arbitrary> {
    expect("unsigned generator", Type::U64, target)?;
    let (min, max) = (range.min(), range.max());
    let value = source.uniform(min, min + bias.scale(max - min));
    Ok(Arbitrary::new(Value::U64(value)).with_shrinker(Some(Shrinker::unsigned(min))))
}

pub(super) fn generate_signed(
    range: Range<i64>,
    target: &Type,
    bias: Bias,
    source: &mut RandomSource,
) -> Result<Arbitrary> {
    expect("signed generator", Type::I64, target)?;
    let (min, max) = (range.min() as i128, range.max() as i128);
    let origin = 0i128.clamp(min, max);
    let lo = origin - bias.scale((origin - min) as u64) as i128;
    let hi = origin + bias.scale((max - origin) as u64) as i128;

    let value = if lo >= 0 || hi < 0 {
        lo + source.uniform(0, (hi - lo) as u64) as i128
    } else {
        // Pick a half by population so the whole range stays uniform.
        let weights = Weights::new(&[(-lo) as u64, hi as u64 + 1])?;
        match weights.pick(source) {
            0 => lo + source.uniform(0, (-1 - lo) as u64) as i128,
            _ => source.uniform(0, hi as u64) as i128,
        }
    };
    Ok(Arbitrary::new(Value::I64(value as i64))
        .with_shrinker(Some(Shrinker::signed(range.min(), range.max()))))
}

pub(super) fn generate_f32(
    range: Range<f32>,
    target: &Type,
    source: &mut RandomSource,
) -> Result<Arbitrary> {
    expect("float generator", Type::F32, target)?;
    let (min, max) = (range.min() as f64, range.max() as f64);
    let value = draw_float(FloatWidth::F32, min, max, source)? as f32;
    Ok(Arbitrary::new(Value::F32(value))
        .with_shrinker(Some(Shrinker::float(FloatWidth::F32, min, max))))
}

pub(super) fn generate_f64(
    range: Range<f64>,
    target: &Type,
    source: &mut RandomSource,
) -> Result<Arbitrary> {
    expect("float generator", Type::F64, target)?;
    let (min, max) = (range.min(), range.max());
    let value = draw_float(FloatWidth::F64, min, max, source)?;
    Ok(Arbitrary::new(Value::F64(value))
        .with_shrinker(Some(Shrinker::float(FloatWidth::F64, min, max))))
}

/// Draw a float in `[min, max]` through its bit pattern.
///
/// Non-negative magnitudes order the same way as their bit patterns, so a
/// uniform draw over the bit range stays inside the value range.
fn draw_float(width: FloatWidth, min: f64, max: f64, source: &mut RandomSource) -> Result<f64> {
    let mut magnitude = |lo: f64, hi: f64| width.from_bits(source.uniform(width.bits(lo), width.bits(hi)));
    if min >= 0.0 {
        return Ok(magnitude(min, max));
    }
    if max <= 0.0 {
        return Ok(-magnitude(-max, -min));
    }
    let weights = Weights::new(&[width.bits(-min) + 1, width.bits(max) + 1])?;
    let negative = weights.pick(source) == 0;
    let mut magnitude = |hi: f64| width.from_bits(source.uniform(0, width.bits(hi)));
    Ok(if negative {
        -magnitude(-min)
    } else {
        magnitude(max)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draws<T>(generator: &Generator, target: Type, count: u64) -> Vec<T>
    where
        T: crate::convert::FromValue,
    {
        let mut source = RandomSource::from_u64(0x5eed);
        (0..count)
            .map(|i| {
                let bias = Bias::for_iteration((i % 100) as usize, 100);
                let arb = generator.generate(&target, bias, &mut source).unwrap();
                arb.value().to::<T>().unwrap()
            })
            .collect()
    }

    #[test]
    fn integers_stay_in_range() {
        let range = Range::new(-7i8, 90).unwrap();
        for v in draws::<i8>(&signed(range), Type::I8, 10_000) {
            assert!(range.contains(v), "{v}");
        }
        let range = Range::new(1000u16, 1010).unwrap();
        for v in draws::<u16>(&unsigned(range), Type::U16, 10_000) {
            assert!(range.contains(v), "{v}");
        }
        let range = Range::new(i64::MIN, -5).unwrap();
        for v in draws::<i64>(&signed(range), Type::I64, 10_000) {
            assert!(range.contains(v), "{v}");
        }
    }

    #[test]
    fn full_width_ranges_reach_their_extremes() {
        let values = draws::<u8>(&unsigned(Range::<u8>::full()), Type::U8, 10_000);
        assert!(values.contains(&0));
        assert!(values.contains(&255));
    }

    #[test]
    fn straddling_signed_ranges_are_uniform() {
        let mut source = RandomSource::from_u64(17);
        let generator = signed(Range::new(-100i64, 299).unwrap());
        let negative = (0..10_000)
            .filter(|_| {
                let arb = generator.generate(&Type::I64, Bias::full(), &mut source).unwrap();
                arb.value().as_i64().unwrap() < 0
            })
            .count();
        let ratio = negative as f64 / 10_000.0;
        assert!((0.22..0.28).contains(&ratio), "ratio {ratio}");
    }

    #[test]
    fn early_iterations_stay_near_the_origin() {
        let mut source = RandomSource::from_u64(1);
        let generator = unsigned(Range::new(10u64, 1_000_010).unwrap());
        let arb = generator
            .generate(&Type::U64, Bias::for_iteration(0, 100), &mut source)
            .unwrap();
        assert!(arb.value().as_u64().unwrap() <= 10 + 10_000);
    }

    #[test]
    fn floats_stay_in_range() {
        let range = Range::new(-2.5f64, 1.0e10).unwrap();
        for v in draws::<f64>(&float64(range), Type::F64, 10_000) {
            assert!(range.contains(v), "{v}");
        }
        let range = Range::new(-30.0f32, -0.5).unwrap();
        for v in draws::<f32>(&float32(range), Type::F32, 10_000) {
            assert!(range.contains(v), "{v}");
        }
    }

    #[test]
    fn integer_generators_reject_other_targets() {
        let mut source = RandomSource::from_u64(0);
        let err = Generator::Unsigned(Range::full())
            .generate(&Type::I64, Bias::full(), &mut source)
            .unwrap_err();
        assert!(matches!(err, Error::TargetMismatch { .. }));
        assert!(signed(Range::<i32>::full()).check(&Type::I32).is_ok());
        assert!(signed(Range::<i32>::full()).check(&Type::U32).is_err());
    }
}
