//! Shrinker combinators: map, filter, bind, retry, chain, transform and
//! validate.

use super::{Shrinker, Shrunk};
use crate::arbitrary::Arbitrary;
use crate::data::{Bias, RandomSource};
use crate::error::{Error, Result};
use crate::gen::Binder;
use crate::types::{Kind, Type};
use crate::value::Func;
use rand::RngCore;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

/// Shrinks the first precursor and re-applies `mapper` to each candidate.
#[derive(Debug, Clone)]
pub struct MapShrink {
    inner: Box<Shrinker>,
    mapper: Func,
}

impl MapShrink {
    pub fn new(inner: Shrinker, mapper: Func) -> Self {
        MapShrink {
            inner: Box::new(inner),
            mapper,
        }
    }

    pub(crate) fn reroll(&mut self) {
        self.inner.reroll();
    }

    pub(crate) fn shrink(self, current: Arbitrary, failed: bool) -> Result<Shrunk> {
        let source = current.precursor(0)?.clone();
        self.mapper
            .expect_unary("shrink mapper", &source.type_of())?;
        let step = self.inner.shrink(source, failed)?;
        let value = self.mapper.apply(step.candidate.value().clone())?;
        let candidate = Arbitrary::derived(value, vec![step.candidate]);
        let mapper = self.mapper;
        Ok(Shrunk {
            candidate,
            next: step
                .next
                .map(|inner| Shrinker::Map(MapShrink::new(inner, mapper))),
        })
    }
}

/// Surfaces only candidates the predicate accepts.
///
/// Rejected candidates are fed back to the inner shrinker as passing. When the
/// inner shrinker is exhausted the last failing candidate is returned.
#[derive(Debug, Clone)]
pub struct FilterShrink {
    inner: Box<Shrinker>,
    predicate: Func,
    last_failing: Option<Arbitrary>,
}

impl FilterShrink {
    pub fn new(inner: Shrinker, predicate: Func) -> Self {
        FilterShrink {
            inner: Box::new(inner),
            predicate,
            last_failing: None,
        }
    }

    pub(crate) fn reroll(&mut self) {
        self.inner.reroll();
    }

    pub(crate) fn shrink(self, current: Arbitrary, failed: bool) -> Result<Shrunk> {
        let last_failing = match self.last_failing {
            Some(last) if !failed => last,
            _ => current.clone(),
        };
        let (mut shrinker, mut candidate, mut feedback) = (*self.inner, current, failed);
        loop {
            let step = shrinker.shrink(candidate, feedback)?;
            let Some(next) = step.next else {
                return Ok(Shrunk::done(last_failing));
            };
            if self.predicate.test(step.candidate.value().clone())? {
                return Ok(Shrunk::more(
                    step.candidate,
                    Shrinker::Filter(FilterShrink {
                        inner: Box::new(next),
                        predicate: self.predicate,
                        last_failing: Some(last_failing),
                    }),
                ));
            }
            shrinker = next;
            candidate = step.candidate;
            feedback = false;
        }
    }
}

#[derive(Debug, Clone)]
enum BindPhase {
    /// Shrinking the source; every candidate regenerates the bound value.
    Source(Box<Shrinker>),
    /// Source exhausted; shrinking the bound value of the last failure.
    Target {
        inner: Box<Shrinker>,
        source: Arbitrary,
    },
}

/// Shrinks values produced by a generator bind.
///
/// Candidates carry precursors `[source, target]`. The shrinker remembers the
/// last failing candidate separately from its current state so that, once the
/// source is exhausted, it resumes from the bound value that last failed.
/// Determinism relies on the binder being pure for a given input.
#[derive(Debug, Clone)]
pub struct BindShrink {
    binder: Binder,
    target: Type,
    bias: Bias,
    source: RandomSource,
    phase: BindPhase,
    last_failing: Option<Arbitrary>,
}

impl BindShrink {
    pub(crate) fn new(
        binder: Binder,
        target: Type,
        bias: Bias,
        source: RandomSource,
        source_shrinker: Shrinker,
    ) -> Self {
        BindShrink {
            binder,
            target,
            bias,
            source,
            phase: BindPhase::Source(Box::new(source_shrinker)),
            last_failing: None,
        }
    }

    pub(crate) fn reroll(&mut self) {
        self.source.next_u64();
    }

    pub(crate) fn shrink(mut self, current: Arbitrary, failed: bool) -> Result<Shrunk> {
        if failed || self.last_failing.is_none() {
            self.last_failing = Some(current.clone());
        }
        match self.phase.clone() {
            BindPhase::Source(inner) => {
                let source = current.precursor(0)?.clone();
                let step = inner
                    .shrink(source, failed)
                    .map_err(|err| Error::shrinking("bind source", err))?;
                let Some(next) = step.next else {
                    return self.resume_target();
                };
                let generator = self.binder.apply(step.candidate.value())?;
                let mut rng = self.source.split();
                let bound = generator
                    .generate(&self.target, self.bias, &mut rng)
                    .map_err(|err| Error::generation("bind target", err))?;
                let candidate =
                    Arbitrary::derived(bound.value().clone(), vec![step.candidate, bound]);
                self.phase = BindPhase::Source(Box::new(next));
                Ok(Shrunk::more(candidate, Shrinker::Bind(self)))
            }
            BindPhase::Target { inner, source } => {
                let bound = current.precursor(1)?.clone();
                let step = inner
                    .shrink(bound, failed)
                    .map_err(|err| Error::shrinking("bind target", err))?;
                let candidate = Arbitrary::derived(
                    step.candidate.value().clone(),
                    vec![source.clone(), step.candidate],
                );
                Ok(match step.next {
                    Some(next) => {
                        self.phase = BindPhase::Target {
                            inner: Box::new(next),
                            source,
                        };
                        Shrunk::more(candidate, Shrinker::Bind(self))
                    }
                    None => Shrunk::done(candidate),
                })
            }
        }
    }

    fn resume_target(mut self) -> Result<Shrunk> {
        let Some(last) = self.last_failing.clone() else {
            return Err(Error::config("bind shrinker has no failing candidate"));
        };
        let bound = last.precursor(1)?;
        match bound.shrinker() {
            None => Ok(Shrunk::done(last)),
            Some(inner) => {
                self.phase = BindPhase::Target {
                    inner: Box::new(inner.clone()),
                    source: last.precursor(0)?.clone(),
                };
                Shrinker::Bind(self).shrink(last, true)
            }
        }
    }
}

#[derive(Debug, Clone)]
struct Replay {
    state: Shrinker,
    current: Arbitrary,
    failed: bool,
}

/// Re-offers the last step up to `retries` times while it keeps passing.
///
/// Each replay re-runs the previous inner state with its random state
/// advanced, so a bind gets fresh chances to fail on the same source.
#[derive(Debug, Clone)]
pub struct RetryShrink {
    inner: Box<Shrinker>,
    retries: usize,
    remaining: usize,
    replay: Option<Box<Replay>>,
}

impl RetryShrink {
    pub fn new(inner: Shrinker, retries: usize) -> Self {
        RetryShrink {
            inner: Box::new(inner),
            retries,
            remaining: retries,
            replay: None,
        }
    }

    pub(crate) fn reroll(&mut self) {
        self.inner.reroll();
    }

    pub(crate) fn shrink(self, current: Arbitrary, failed: bool) -> Result<Shrunk> {
        let RetryShrink {
            inner,
            retries,
            remaining,
            replay,
        } = self;
        if let (false, true, Some(replay)) = (failed, remaining > 0, replay) {
            let Replay {
                mut state,
                current,
                failed,
            } = *replay;
            state.reroll();
            let step = state.clone().shrink(current.clone(), failed)?;
            return Ok(RetryShrink::wrap(
                step,
                retries,
                remaining - 1,
                Replay {
                    state,
                    current,
                    failed,
                },
            ));
        }
        let state = (*inner).clone();
        let step = inner.shrink(current.clone(), failed)?;
        Ok(RetryShrink::wrap(
            step,
            retries,
            retries,
            Replay {
                state,
                current,
                failed,
            },
        ))
    }

    fn wrap(step: Shrunk, retries: usize, remaining: usize, replay: Replay) -> Shrunk {
        Shrunk {
            candidate: step.candidate,
            next: step.next.map(|inner| {
                Shrinker::Retry(RetryShrink {
                    inner: Box::new(inner),
                    retries,
                    remaining,
                    replay: Some(Box::new(replay)),
                })
            }),
        }
    }
}

/// Envelope hook run by a [`TransformShrink`].
pub type Hook = Arc<dyn Fn(Arbitrary) -> Result<Arbitrary> + Send + Sync>;

/// Runs `before` on the incoming candidate and `after` on each outgoing one.
#[derive(Clone)]
pub struct TransformShrink {
    inner: Box<Shrinker>,
    before: Option<Hook>,
    after: Option<Hook>,
}

impl TransformShrink {
    pub fn new(inner: Shrinker, before: Option<Hook>, after: Option<Hook>) -> Self {
        TransformShrink {
            inner: Box::new(inner),
            before,
            after,
        }
    }

    pub(crate) fn reroll(&mut self) {
        self.inner.reroll();
    }

    pub(crate) fn shrink(self, current: Arbitrary, failed: bool) -> Result<Shrunk> {
        let current = match &self.before {
            Some(before) => before(current)?,
            None => current,
        };
        let step = self.inner.shrink(current, failed)?;
        let candidate = match &self.after {
            Some(after) => after(step.candidate)?,
            None => step.candidate,
        };
        let (before, after) = (self.before, self.after);
        Ok(Shrunk {
            candidate,
            next: step.next.map(|inner| {
                Shrinker::Transform(TransformShrink {
                    inner: Box::new(inner),
                    before,
                    after,
                })
            }),
        })
    }
}

impl fmt::Debug for TransformShrink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformShrink")
            .field("inner", &self.inner)
            .field("before", &self.before.is_some())
            .field("after", &self.after.is_some())
            .finish()
    }
}

pub(crate) fn chain(
    mut queue: VecDeque<Shrinker>,
    current: Arbitrary,
    failed: bool,
) -> Result<Shrunk> {
    let Some(first) = queue.pop_front() else {
        return Ok(Shrunk::done(current));
    };
    let mut step = first.shrink(current, failed)?;
    loop {
        if let Some(next) = step.next {
            queue.push_front(next);
            return Ok(Shrunk::more(step.candidate, Shrinker::Chain(queue)));
        }
        match queue.pop_front() {
            // The exhausted shrinker's candidate is known to fail.
            Some(following) => step = following.shrink(step.candidate, true)?,
            None => return Ok(Shrunk::done(step.candidate)),
        }
    }
}

pub(crate) fn validate(
    inner: Shrinker,
    kind: Kind,
    current: Arbitrary,
    failed: bool,
) -> Result<Shrunk> {
    if current.kind() != kind {
        return Err(Error::mismatch("validated shrinker", kind, current.type_of()));
    }
    let step = inner.shrink(current, failed)?;
    if step.candidate.kind() != kind {
        return Err(Error::mismatch(
            "validated shrinker",
            kind,
            step.candidate.type_of(),
        ));
    }
    Ok(Shrunk {
        candidate: step.candidate,
        next: step.next.map(|inner| Shrinker::validate(inner, kind)),
    })
}
