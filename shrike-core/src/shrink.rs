//! Shrinker combinator algebra.
//!
//! A [`Shrinker`] is an explicit state machine. Each call to
//! [`Shrinker::shrink`] receives the candidate it proposed last time (the
//! original failing value on the first call) and whether the property failed
//! on it, and returns the next candidate plus the next state.
//!
//! When the returned `next` is `None` the candidate is the last value known
//! to fail; callers do not need to evaluate it again.

use crate::arbitrary::Arbitrary;
use crate::error::Result;
use crate::types::Kind;
use crate::value::Func;
use std::collections::VecDeque;

mod collection;
mod combinator;
mod numeric;

pub use collection::{ElementShrink, ResizeShrink};
pub use combinator::{BindShrink, FilterShrink, Hook, MapShrink, RetryShrink, TransformShrink};
pub use numeric::{Bisection, FloatShrink, FloatWidth, SignedShrink, UnsignedShrink};

/// Result of one shrink step.
#[derive(Debug, Clone)]
pub struct Shrunk {
    pub candidate: Arbitrary,
    pub next: Option<Shrinker>,
}

impl Shrunk {
    pub fn more(candidate: Arbitrary, next: Shrinker) -> Self {
        Shrunk {
            candidate,
            next: Some(next),
        }
    }

    pub fn done(candidate: Arbitrary) -> Self {
        Shrunk {
            candidate,
            next: None,
        }
    }
}

/// A shrink state machine.
#[derive(Debug, Clone)]
pub enum Shrinker {
    /// Bisection of a `u64` toward the range minimum.
    Unsigned(UnsignedShrink),
    /// Bisection of an `i64` toward zero or the nearest bound.
    Signed(SignedShrink),
    /// Bit-pattern bisection of a float toward zero or the nearest bound.
    Float(FloatShrink),
    /// Shrink composite elements in place, one position at a time.
    Elements(ElementShrink),
    /// Remove entries from alternating ends of a collection.
    Resize(ResizeShrink),
    /// Try the absent form of an optional, falling back if it passes.
    Absent,
    /// Shrink a precursor and re-apply a mapping.
    Map(MapShrink),
    /// Only surface candidates accepted by a predicate.
    Filter(FilterShrink),
    /// Shrink a bind source, regenerating the bound value each time.
    Bind(BindShrink),
    /// Re-offer a passing candidate before letting the inner state advance.
    Retry(RetryShrink),
    /// First branch when the property failed, second when it held.
    Or(Box<Shrinker>, Box<Shrinker>),
    /// Exhaust each shrinker in turn.
    Chain(VecDeque<Shrinker>),
    /// Hooks around an inner shrinker.
    Transform(TransformShrink),
    /// Kind precondition around an inner shrinker.
    Validate { inner: Box<Shrinker>, kind: Kind },
    /// Terminal: return a fixed, known failing envelope.
    Settle(Arbitrary),
}

impl Shrinker {
    /// Run one shrink step.
    pub fn shrink(self, current: Arbitrary, failed: bool) -> Result<Shrunk> {
        match self {
            Shrinker::Unsigned(s) => s.shrink(current, failed),
            Shrinker::Signed(s) => s.shrink(current, failed),
            Shrinker::Float(s) => s.shrink(current, failed),
            Shrinker::Elements(s) => s.shrink(current, failed),
            Shrinker::Resize(s) => s.shrink(current),
            Shrinker::Absent => collection::absent(current),
            Shrinker::Map(s) => s.shrink(current, failed),
            Shrinker::Filter(s) => s.shrink(current, failed),
            Shrinker::Bind(s) => s.shrink(current, failed),
            Shrinker::Retry(s) => s.shrink(current, failed),
            Shrinker::Or(on_fail, on_pass) => {
                if failed {
                    on_fail.shrink(current, true)
                } else {
                    on_pass.shrink(current, false)
                }
            }
            Shrinker::Chain(queue) => combinator::chain(queue, current, failed),
            Shrinker::Transform(s) => s.shrink(current, failed),
            Shrinker::Validate { inner, kind } => combinator::validate(*inner, kind, current, failed),
            Shrinker::Settle(fixed) => Ok(Shrunk::done(fixed)),
        }
    }

    pub fn unsigned(min: u64) -> Self {
        Shrinker::Unsigned(UnsignedShrink::new(min))
    }

    pub fn signed(min: i64, max: i64) -> Self {
        Shrinker::Signed(SignedShrink::new(min, max))
    }

    pub fn float(width: FloatWidth, min: f64, max: f64) -> Self {
        Shrinker::Float(FloatShrink::new(width, min, max))
    }

    /// Shrink every element in place.
    pub fn elements() -> Self {
        Shrinker::Elements(ElementShrink::new(0, 1))
    }

    /// Collection shrinking: elements in place, then length.
    pub fn slice(min_len: usize) -> Self {
        Shrinker::validate(
            Shrinker::chain(vec![Shrinker::elements(), Shrinker::resize(1, min_len)]),
            Kind::Slice,
        )
    }

    /// Map shrinking: entry count, then values, then keys.
    pub fn map_entries(min_len: usize) -> Self {
        Shrinker::validate(
            Shrinker::chain(vec![
                Shrinker::resize(2, min_len),
                Shrinker::Elements(ElementShrink::new(1, 2)),
                Shrinker::Elements(ElementShrink::new(0, 2).distinct()),
            ]),
            Kind::Map,
        )
    }

    /// Optional shrinking: pointee first, then absence.
    pub fn optional() -> Self {
        Shrinker::chain(vec![Shrinker::elements(), Shrinker::Absent])
    }

    pub fn resize(chunk: usize, min_len: usize) -> Self {
        Shrinker::Resize(ResizeShrink::new(chunk, min_len))
    }

    pub fn map(inner: Shrinker, mapper: Func) -> Self {
        Shrinker::Map(MapShrink::new(inner, mapper))
    }

    pub fn filter(inner: Shrinker, predicate: Func) -> Self {
        Shrinker::Filter(FilterShrink::new(inner, predicate))
    }

    pub fn retry(inner: Shrinker, retries: usize) -> Self {
        Shrinker::Retry(RetryShrink::new(inner, retries))
    }

    pub fn or(on_fail: Shrinker, on_pass: Shrinker) -> Self {
        Shrinker::Or(Box::new(on_fail), Box::new(on_pass))
    }

    pub fn chain(shrinkers: Vec<Shrinker>) -> Self {
        Shrinker::Chain(shrinkers.into())
    }

    pub fn transform(inner: Shrinker, before: Option<Hook>, after: Option<Hook>) -> Self {
        Shrinker::Transform(TransformShrink::new(inner, before, after))
    }

    pub fn validate(inner: Shrinker, kind: Kind) -> Self {
        Shrinker::Validate {
            inner: Box::new(inner),
            kind,
        }
    }

    /// Short name of the outermost state.
    pub fn name(&self) -> &'static str {
        match self {
            Shrinker::Unsigned(_) => "unsigned",
            Shrinker::Signed(_) => "signed",
            Shrinker::Float(_) => "float",
            Shrinker::Elements(_) => "elements",
            Shrinker::Resize(_) => "resize",
            Shrinker::Absent => "absent",
            Shrinker::Map(_) => "map",
            Shrinker::Filter(_) => "filter",
            Shrinker::Bind(_) => "bind",
            Shrinker::Retry(_) => "retry",
            Shrinker::Or(..) => "or",
            Shrinker::Chain(_) => "chain",
            Shrinker::Transform(_) => "transform",
            Shrinker::Validate { .. } => "validate",
            Shrinker::Settle(_) => "settle",
        }
    }

    /// Advance any random state so that re-running the same step draws
    /// fresh values.
    pub(crate) fn reroll(&mut self) {
        match self {
            Shrinker::Bind(s) => s.reroll(),
            Shrinker::Retry(s) => s.reroll(),
            Shrinker::Map(s) => s.reroll(),
            Shrinker::Filter(s) => s.reroll(),
            Shrinker::Elements(s) => s.reroll(),
            Shrinker::Transform(s) => s.reroll(),
            Shrinker::Validate { inner, .. } => inner.reroll(),
            Shrinker::Or(a, b) => {
                a.reroll();
                b.reroll();
            }
            Shrinker::Chain(queue) => queue.iter_mut().for_each(Shrinker::reroll),
            Shrinker::Unsigned(_)
            | Shrinker::Signed(_)
            | Shrinker::Float(_)
            | Shrinker::Resize(_)
            | Shrinker::Absent
            | Shrinker::Settle(_) => {}
        }
    }
}

/// Drive a shrinker to exhaustion against a predicate on values.
///
/// Returns the minimal failing candidate and the number of steps taken. The
/// initial candidate must fail.
pub fn minimize<F>(initial: Arbitrary, mut fails: F) -> Result<(Arbitrary, usize)>
where
    F: FnMut(&crate::value::Value) -> Result<bool>,
{
    let mut state = initial.shrinker().cloned();
    let mut candidate = initial;
    let mut failed = true;
    let mut steps = 0;
    while let Some(shrinker) = state {
        let step = shrinker.shrink(candidate, failed)?;
        candidate = step.candidate;
        state = step.next;
        if state.is_some() {
            steps += 1;
            failed = fails(candidate.value())?;
        }
    }
    Ok((candidate, steps))
}
