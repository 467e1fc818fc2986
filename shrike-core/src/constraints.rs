//! Constraint records that parameterise generators and shrinkers.

use crate::data::RandomSource;
use crate::error::{Error, Result};
use num_traits::Bounded;
use std::fmt;

/// An inclusive numeric range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range<T> {
    min: T,
    max: T,
}

impl<T> Range<T>
where
    T: PartialOrd + Copy + fmt::Debug,
{
    /// Create a range, rejecting `min > max` (and unordered float bounds).
    pub fn new(min: T, max: T) -> Result<Self> {
        // Written as a negation so NaN bounds are rejected too.
        if !(min <= max) {
            return Err(Error::InvalidRange {
                min: format!("{min:?}"),
                max: format!("{max:?}"),
            });
        }
        Ok(Range { min, max })
    }

    /// Build a range whose bounds are already known to be ordered.
    pub(crate) fn ordered(min: T, max: T) -> Self {
        debug_assert!(min <= max);
        Range { min, max }
    }

    /// A range holding a single value.
    pub fn singleton(value: T) -> Self {
        Range {
            min: value,
            max: value,
        }
    }

    pub fn min(&self) -> T {
        self.min
    }

    pub fn max(&self) -> T {
        self.max
    }

    pub fn contains(&self, value: T) -> bool {
        self.min <= value && value <= self.max
    }
}

impl<T: Bounded> Range<T> {
    /// The full representable range of `T`.
    pub fn full() -> Self {
        Range {
            min: T::min_value(),
            max: T::max_value(),
        }
    }
}

impl<T: Bounded> Default for Range<T> {
    fn default() -> Self {
        Range::full()
    }
}

impl<T: fmt::Display> fmt::Display for Range<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// Inclusive bounds on a collection's length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthRange {
    min: usize,
    max: usize,
}

impl LengthRange {
    pub fn new(min: usize, max: usize) -> Result<Self> {
        if min > max {
            return Err(Error::InvalidRange {
                min: min.to_string(),
                max: max.to_string(),
            });
        }
        Ok(LengthRange { min, max })
    }

    pub fn exactly(len: usize) -> Self {
        LengthRange { min: len, max: len }
    }

    pub fn min(&self) -> usize {
        self.min
    }

    pub fn max(&self) -> usize {
        self.max
    }

    pub fn contains(&self, len: usize) -> bool {
        self.min <= len && len <= self.max
    }
}

impl Default for LengthRange {
    fn default() -> Self {
        LengthRange { min: 0, max: 32 }
    }
}

const SURROGATE_START: u32 = 0xD800;
const SURROGATE_LEN: u32 = 0x800;

/// Inclusive bounds on Unicode scalar values.
///
/// Generation works in an index space that skips the surrogate block, so every
/// index maps to a valid `char`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodePointRange {
    min: char,
    max: char,
}

impl CodePointRange {
    pub fn new(min: u32, max: u32) -> Result<Self> {
        let low = char::from_u32(min).or_else(|| char::from_u32(SURROGATE_START + SURROGATE_LEN));
        let high = char::from_u32(max).or_else(|| char::from_u32(SURROGATE_START - 1));
        match (low, high) {
            (Some(low), Some(high)) if min <= max && low <= high && max <= char::MAX as u32 => {
                Ok(CodePointRange {
                    min: low,
                    max: high,
                })
            }
            _ => Err(Error::InvalidRange {
                min: format!("U+{min:04X}"),
                max: format!("U+{max:04X}"),
            }),
        }
    }

    /// Printable ASCII, space through tilde.
    pub fn ascii() -> Self {
        CodePointRange { min: ' ', max: '~' }
    }

    pub fn min(&self) -> char {
        self.min
    }

    pub fn max(&self) -> char {
        self.max
    }

    /// The index-space range for this code point range.
    pub fn indices(&self) -> Range<u64> {
        Range {
            min: char_to_index(self.min),
            max: char_to_index(self.max),
        }
    }
}

impl Default for CodePointRange {
    fn default() -> Self {
        CodePointRange {
            min: '\0',
            max: char::MAX,
        }
    }
}

pub(crate) fn char_to_index(c: char) -> u64 {
    let code = c as u32;
    if code < SURROGATE_START {
        code as u64
    } else {
        (code - SURROGATE_LEN) as u64
    }
}

pub(crate) fn index_to_char(index: u64) -> Option<char> {
    let index = u32::try_from(index).ok()?;
    if index < SURROGATE_START {
        char::from_u32(index)
    } else {
        char::from_u32(index.checked_add(SURROGATE_LEN)?)
    }
}

/// Cumulative weight buckets for weighted choice.
///
/// Bucket `i` covers the half-open interval `[cum(i-1), cum(i))` of a draw
/// in `[0, total - 1]`. The table stores each bucket's inclusive upper bound
/// `cum(i) - 1`, which lets the total reach exactly 2^64.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Weights {
    bounds: Vec<u64>,
}

impl Weights {
    pub fn new(weights: &[u64]) -> Result<Self> {
        if weights.is_empty() {
            return Err(Error::InvalidWeights {
                message: "at least one weight is required".to_string(),
            });
        }
        let mut total: u128 = 0;
        let mut bounds = Vec::with_capacity(weights.len());
        for (index, &weight) in weights.iter().enumerate() {
            if weight < 1 {
                return Err(Error::InvalidWeights {
                    message: format!("weight {index} is {weight}, weights must be at least 1"),
                });
            }
            total += weight as u128;
            if total > 1u128 << 64 {
                return Err(Error::InvalidWeights {
                    message: format!("sum of weights overflows u64 at weight {index}"),
                });
            }
            bounds.push((total - 1) as u64);
        }
        Ok(Weights { bounds })
    }

    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    /// Bucket index selected by a draw in `[0, total - 1]`.
    pub fn bucket(&self, draw: u64) -> usize {
        self.bounds
            .partition_point(|&bound| bound < draw)
            .min(self.bounds.len() - 1)
    }

    /// Draw a bucket index with probability proportional to its weight.
    pub fn pick(&self, source: &mut RandomSource) -> usize {
        let last = self.bounds[self.bounds.len() - 1];
        self.bucket(source.uniform(0, last))
    }
}
