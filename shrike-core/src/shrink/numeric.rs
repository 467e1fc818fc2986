//! Bisection shrinkers for integers and floats.

use super::{Shrinker, Shrunk};
use crate::arbitrary::Arbitrary;
use crate::error::{Error, Result};
use crate::value::Value;

/// A bisection over distances `[lo, hi]`.
///
/// `hi` is the smallest distance known to fail, `lo` the smallest distance not
/// yet known to pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bisection {
    lo: u64,
    hi: u64,
}

pub(crate) enum Probe {
    Next(u64, Bisection),
    Settled(u64),
}

impl Bisection {
    pub fn new(lo: u64) -> Self {
        Bisection { lo, hi: u64::MAX }
    }

    /// Record the verdict on `observed` and choose the next probe.
    pub(crate) fn step(mut self, observed: u64, failed: bool) -> Probe {
        if failed {
            self.hi = observed;
        } else {
            self.lo = observed.saturating_add(1);
        }
        if self.lo >= self.hi {
            Probe::Settled(self.hi)
        } else {
            Probe::Next(self.lo + (self.hi - self.lo) / 2, self)
        }
    }
}

/// Shrinks a `u64` toward the minimum of its range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedShrink {
    bisection: Bisection,
}

impl UnsignedShrink {
    pub fn new(min: u64) -> Self {
        UnsignedShrink {
            bisection: Bisection::new(min),
        }
    }

    pub(crate) fn shrink(self, current: Arbitrary, failed: bool) -> Result<Shrunk> {
        let observed = match current.value() {
            Value::U64(v) => *v,
            _ => return Err(Error::mismatch("unsigned shrinker", "u64", current.type_of())),
        };
        Ok(match self.bisection.step(observed, failed) {
            Probe::Next(probe, bisection) => Shrunk::more(
                Arbitrary::new(Value::U64(probe)),
                Shrinker::Unsigned(UnsignedShrink { bisection }),
            ),
            Probe::Settled(v) => Shrunk::done(Arbitrary::new(Value::U64(v))),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Side {
    target: i64,
    negative: bool,
}

/// Shrinks an `i64` toward `max(0, min)` when non-negative and toward
/// `min(0, max)` when negative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedShrink {
    min: i64,
    max: i64,
    side: Option<Side>,
    bisection: Bisection,
}

impl SignedShrink {
    pub fn new(min: i64, max: i64) -> Self {
        SignedShrink {
            min,
            max,
            side: None,
            bisection: Bisection::new(0),
        }
    }

    pub(crate) fn shrink(self, current: Arbitrary, failed: bool) -> Result<Shrunk> {
        let observed = match current.value() {
            Value::I64(v) => *v,
            _ => return Err(Error::mismatch("signed shrinker", "i64", current.type_of())),
        };
        let side = self.side.unwrap_or(if observed >= 0 {
            Side {
                target: self.min.max(0),
                negative: false,
            }
        } else {
            Side {
                target: self.max.min(0),
                negative: true,
            }
        });
        let distance = (observed as i128 - side.target as i128).unsigned_abs() as u64;
        let at = |d: u64| {
            let v = if side.negative {
                side.target as i128 - d as i128
            } else {
                side.target as i128 + d as i128
            };
            Arbitrary::new(Value::I64(v as i64))
        };
        Ok(match self.bisection.step(distance, failed) {
            Probe::Next(probe, bisection) => Shrunk::more(
                at(probe),
                Shrinker::Signed(SignedShrink {
                    side: Some(side),
                    bisection,
                    ..self
                }),
            ),
            Probe::Settled(d) => Shrunk::done(at(d)),
        })
    }
}

/// Float width handled by a [`FloatShrink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatWidth {
    F32,
    F64,
}

impl FloatWidth {
    /// Bit pattern of a non-negative magnitude; monotone in the magnitude.
    pub(crate) fn bits(self, magnitude: f64) -> u64 {
        match self {
            FloatWidth::F32 => (magnitude.abs() as f32).to_bits() as u64,
            FloatWidth::F64 => magnitude.abs().to_bits(),
        }
    }

    pub(crate) fn from_bits(self, bits: u64) -> f64 {
        match self {
            FloatWidth::F32 => f32::from_bits(bits as u32) as f64,
            FloatWidth::F64 => f64::from_bits(bits),
        }
    }

    fn read(self, value: &Value) -> Option<f64> {
        match (self, value) {
            (FloatWidth::F32, Value::F32(v)) => Some(*v as f64),
            (FloatWidth::F64, Value::F64(v)) => Some(*v),
            _ => None,
        }
    }

    fn write(self, v: f64) -> Value {
        match self {
            FloatWidth::F32 => Value::F32(v as f32),
            FloatWidth::F64 => Value::F64(v),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct FloatSide {
    /// Magnitude the bisection converges to.
    target: f64,
    negative: bool,
}

/// Shrinks a float by bisecting its bit pattern toward zero or the nearest
/// bound. Negative values mirror the positive case. Zero and NaN are
/// terminal.
#[derive(Debug, Clone, PartialEq)]
pub struct FloatShrink {
    width: FloatWidth,
    min: f64,
    max: f64,
    side: Option<FloatSide>,
    bisection: Bisection,
}

impl FloatShrink {
    pub fn new(width: FloatWidth, min: f64, max: f64) -> Self {
        FloatShrink {
            width,
            min,
            max,
            side: None,
            bisection: Bisection::new(0),
        }
    }

    pub(crate) fn shrink(self, current: Arbitrary, failed: bool) -> Result<Shrunk> {
        let width = self.width;
        let observed = width.read(current.value()).ok_or_else(|| {
            let expected = match width {
                FloatWidth::F32 => "f32",
                FloatWidth::F64 => "f64",
            };
            Error::mismatch("float shrinker", expected, current.type_of())
        })?;
        let side = match self.side {
            Some(side) => side,
            None if observed.is_nan() || observed == 0.0 => return Ok(Shrunk::done(current)),
            None if observed > 0.0 => FloatSide {
                target: self.min.max(0.0),
                negative: false,
            },
            None => FloatSide {
                target: -self.max.min(0.0),
                negative: true,
            },
        };
        let origin = width.bits(side.target);
        let distance = width.bits(observed).saturating_sub(origin);
        let at = |d: u64| {
            let magnitude = width.from_bits(origin + d);
            let v = if side.negative { -magnitude } else { magnitude };
            Arbitrary::new(width.write(v))
        };
        Ok(match self.bisection.step(distance, failed) {
            Probe::Next(probe, bisection) => Shrunk::more(
                at(probe),
                Shrinker::Float(FloatShrink {
                    side: Some(side),
                    bisection,
                    ..self
                }),
            ),
            Probe::Settled(d) => Shrunk::done(at(d)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shrink::minimize;

    fn u64_arb(v: u64, min: u64) -> Arbitrary {
        Arbitrary::new(Value::U64(v)).with_shrinker(Some(Shrinker::unsigned(min)))
    }

    #[test]
    fn unsigned_converges_to_the_boundary() {
        let (minimal, steps) = minimize(u64_arb(1000, 0), |v| Ok(v.as_u64() > Some(100))).unwrap();
        assert_eq!(minimal.value(), &Value::U64(101));
        assert!(steps <= 64);
    }

    #[test]
    fn unsigned_respects_the_range_minimum() {
        let (minimal, _) = minimize(u64_arb(500, 40), |_| Ok(true)).unwrap();
        assert_eq!(minimal.value(), &Value::U64(40));
        let (minimal, _) = minimize(u64_arb(u64::MAX, 0), |_| Ok(true)).unwrap();
        assert_eq!(minimal.value(), &Value::U64(0));
    }

    #[test]
    fn signed_shrinks_toward_zero_from_both_sides() {
        let arb = |v: i64| {
            Arbitrary::new(Value::I64(v)).with_shrinker(Some(Shrinker::signed(i64::MIN, i64::MAX)))
        };
        let (minimal, _) = minimize(arb(-900), |v| Ok(v.as_i64() < Some(-17))).unwrap();
        assert_eq!(minimal.value(), &Value::I64(-18));
        let (minimal, _) = minimize(arb(i64::MIN), |_| Ok(true)).unwrap();
        assert_eq!(minimal.value(), &Value::I64(0));
        let (minimal, _) = minimize(arb(i64::MAX), |v| Ok(v.as_i64() > Some(5))).unwrap();
        assert_eq!(minimal.value(), &Value::I64(6));
    }

    #[test]
    fn signed_stops_at_the_nearest_bound() {
        let arb = Arbitrary::new(Value::I64(-50)).with_shrinker(Some(Shrinker::signed(-100, -10)));
        let (minimal, _) = minimize(arb, |_| Ok(true)).unwrap();
        assert_eq!(minimal.value(), &Value::I64(-10));
    }

    #[test]
    fn floats_bisect_their_bit_patterns() {
        let arb = Arbitrary::new(Value::F64(1.0e6))
            .with_shrinker(Some(Shrinker::float(FloatWidth::F64, f64::MIN, f64::MAX)));
        let (minimal, _) = minimize(arb, |v| match v {
            Value::F64(x) => Ok(*x >= 2.5),
            _ => Ok(false),
        })
        .unwrap();
        assert_eq!(minimal.value(), &Value::F64(2.5));

        let negative = Arbitrary::new(Value::F32(-3.75))
            .with_shrinker(Some(Shrinker::float(FloatWidth::F32, -10.0, 10.0)));
        let (minimal, _) = minimize(negative, |_| Ok(true)).unwrap();
        assert_eq!(minimal.value(), &Value::F32(-0.0));
    }

    #[test]
    fn float_zero_and_nan_are_terminal() {
        for v in [0.0, f64::NAN] {
            let arb = Arbitrary::new(Value::F64(v))
                .with_shrinker(Some(Shrinker::float(FloatWidth::F64, f64::MIN, f64::MAX)));
            let (minimal, steps) = minimize(arb, |_| Ok(true)).unwrap();
            assert_eq!(minimal.value(), &Value::F64(v));
            assert_eq!(steps, 0);
        }
    }
}
