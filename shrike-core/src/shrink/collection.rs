//! Structural shrinkers for collections, records, maps and optionals.

use super::{Shrinker, Shrunk};
use crate::arbitrary::Arbitrary;
use crate::error::{Error, Result};
use crate::value::Value;

/// Shrinks the elements at `start, start + step, ...` in place, left to
/// right, moving on only once an element's own shrinker is exhausted.
///
/// With `distinct` set (map keys) a candidate equal to another selected
/// element is treated as passing, so the element shrinker moves on instead.
#[derive(Debug, Clone)]
pub struct ElementShrink {
    start: usize,
    step: usize,
    index: usize,
    distinct: bool,
    active: Option<Box<Shrinker>>,
    base: Option<Arbitrary>,
}

impl ElementShrink {
    pub fn new(start: usize, step: usize) -> Self {
        ElementShrink {
            start,
            step: step.max(1),
            index: start,
            distinct: false,
            active: None,
            base: None,
        }
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub(crate) fn reroll(&mut self) {
        if let Some(active) = self.active.as_mut() {
            active.reroll();
        }
    }

    pub(crate) fn shrink(mut self, current: Arbitrary, failed: bool) -> Result<Shrunk> {
        let mut base = match self.base.take() {
            Some(base) if !failed => base,
            _ => current.clone(),
        };
        let mut feedback = match self.active {
            Some(_) => Some((current.element(self.index)?.clone(), failed)),
            None => None,
        };

        loop {
            let (shrinker, element, element_failed) = match (self.active.take(), feedback.take()) {
                (Some(active), Some((element, element_failed))) => {
                    (*active, element, element_failed)
                }
                _ => {
                    if self.index >= base.elements().len() {
                        return Ok(Shrunk::done(base));
                    }
                    let element = &base.elements()[self.index];
                    match element.shrinker() {
                        Some(shrinker) => (shrinker.clone(), element.clone(), true),
                        None => {
                            self.index += self.step;
                            continue;
                        }
                    }
                }
            };

            let step = shrinker.shrink(element, element_failed)?;
            match step.next {
                Some(next) if self.distinct && self.collides(&base, step.candidate.value()) => {
                    self.active = Some(Box::new(next));
                    feedback = Some((step.candidate, false));
                }
                Some(next) => {
                    let proposal = base.replace_element(self.index, step.candidate)?;
                    self.active = Some(Box::new(next));
                    self.base = Some(base);
                    return Ok(Shrunk::more(proposal, Shrinker::Elements(self)));
                }
                None => {
                    // The element settled on its last failing value.
                    base = base.replace_element(self.index, step.candidate)?;
                    self.index += self.step;
                }
            }
        }
    }

    fn collides(&self, base: &Arbitrary, candidate: &Value) -> bool {
        base.elements()
            .iter()
            .enumerate()
            .skip(self.start)
            .step_by(self.step)
            .any(|(i, other)| i != self.index && other.value() == candidate)
    }
}

/// Removes one entry (`chunk` elements) at a time from alternating ends.
///
/// A removal that still fails becomes the new base; a removal that passes
/// marks that end's entry as needed and the next attempt moves inward.
#[derive(Debug, Clone)]
pub struct ResizeShrink {
    chunk: usize,
    min_len: usize,
    front: usize,
    back: usize,
    toward_back: bool,
    base: Option<Arbitrary>,
}

impl ResizeShrink {
    pub fn new(chunk: usize, min_len: usize) -> Self {
        ResizeShrink {
            chunk: chunk.max(1),
            min_len,
            front: 0,
            back: 0,
            toward_back: true,
            base: None,
        }
    }

    pub(crate) fn shrink(self, current: Arbitrary) -> Result<Shrunk> {
        let base = self.base.clone().unwrap_or(current);
        let total = base.elements().len();
        if total % self.chunk != 0 {
            return Err(Error::config(format!(
                "{} has {total} elements, not a multiple of {}",
                base.type_of(),
                self.chunk
            )));
        }
        let entries = total / self.chunk;
        if entries <= self.min_len || self.front + self.back >= entries {
            return Ok(Shrunk::done(base));
        }

        let position = if self.toward_back {
            entries - 1 - self.back
        } else {
            self.front
        };
        let mut elements = base.elements().to_vec();
        elements.drain(position * self.chunk..(position + 1) * self.chunk);
        let proposal = base.with_elements(elements)?;

        let removed = ResizeShrink {
            toward_back: !self.toward_back,
            base: None,
            ..self.clone()
        };
        let kept = ResizeShrink {
            front: self.front + usize::from(!self.toward_back),
            back: self.back + usize::from(self.toward_back),
            toward_back: !self.toward_back,
            base: Some(base),
            ..self
        };
        Ok(Shrunk::more(
            proposal,
            Shrinker::or(Shrinker::Resize(removed), Shrinker::Resize(kept)),
        ))
    }
}

/// Propose the absent form of an optional. If absence makes the property
/// pass, settle on the last failing present value.
pub(crate) fn absent(current: Arbitrary) -> Result<Shrunk> {
    match current.value() {
        Value::Optional { value: None, .. } => Ok(Shrunk::done(current)),
        Value::Optional { .. } => {
            let absent = current.with_elements(Vec::new())?.with_shrinker(None);
            Ok(Shrunk::more(
                absent.clone(),
                Shrinker::or(Shrinker::Settle(absent), Shrinker::Settle(current)),
            ))
        }
        _ => Err(Error::mismatch(
            "absent shrinker",
            "an optional",
            current.type_of(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::{FromValue, IntoValue};
    use crate::shrink::minimize;
    use std::collections::BTreeMap;

    fn leaf(v: u64) -> Arbitrary {
        Arbitrary::new(Value::U64(v)).with_shrinker(Some(Shrinker::unsigned(0)))
    }

    fn slice(values: &[u64], min_len: usize) -> Arbitrary {
        Arbitrary::assemble(
            &Vec::<u64>::new().into_value(),
            values.iter().map(|&v| leaf(v)).collect(),
        )
        .unwrap()
        .with_shrinker(Some(Shrinker::slice(min_len)))
    }

    fn contains(v: &Value, needle: u64) -> bool {
        Vec::<u64>::from_value(v.clone()).unwrap().contains(&needle)
    }

    #[test]
    fn slice_shrinks_to_the_single_needed_element() {
        let arb = slice(&[12, 5, 900, 5, 3], 0);
        let (minimal, _) = minimize(arb, |v| Ok(contains(v, 5))).unwrap();
        assert_eq!(minimal.value(), &vec![5u64].into_value());
    }

    #[test]
    fn slice_length_never_drops_below_minimum() {
        let arb = slice(&[7, 8, 9, 10], 2);
        let (minimal, _) = minimize(arb, |_| Ok(true)).unwrap();
        assert_eq!(minimal.value(), &vec![0u64, 0].into_value());
    }

    #[test]
    fn removal_retreats_when_the_smaller_slice_passes() {
        // Needs both the first and the last element.
        let arb = slice(&[1, 0, 0, 2], 0);
        let (minimal, _) = minimize(arb, |v| {
            let items = Vec::<u64>::from_value(v.clone())?;
            Ok(items.first() == Some(&1) && items.last() == Some(&2))
        })
        .unwrap();
        assert_eq!(minimal.value(), &vec![1u64, 2].into_value());
    }

    #[test]
    fn map_keys_never_collide() {
        let template = BTreeMap::<u64, u64>::new().into_value();
        let arb = Arbitrary::assemble(&template, vec![leaf(10), leaf(1), leaf(20), leaf(2)])
            .unwrap()
            .with_shrinker(Some(Shrinker::map_entries(2)));
        let (minimal, _) = minimize(arb, |_| Ok(true)).unwrap();
        let map = BTreeMap::<u64, u64>::from_value(minimal.value().clone()).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![0, 1]);
        assert!(map.values().all(|&v| v == 0));
    }

    #[test]
    fn optional_prefers_absent_when_it_still_fails() {
        let present = Arbitrary::assemble(&Some(0u64).into_value(), vec![leaf(40)])
            .unwrap()
            .with_shrinker(Some(Shrinker::optional()));
        let (minimal, _) = minimize(present.clone(), |_| Ok(true)).unwrap();
        assert_eq!(minimal.value(), &None::<u64>.into_value());

        let (minimal, _) = minimize(present, |v| {
            Ok(Option::<u64>::from_value(v.clone())?.is_some_and(|x| x >= 3))
        })
        .unwrap();
        assert_eq!(minimal.value(), &Some(3u64).into_value());
    }

    #[test]
    fn record_fields_shrink_in_order() {
        let template = (0u64, 0u64).into_value();
        let arb = Arbitrary::assemble(&template, vec![leaf(80), leaf(3)])
            .unwrap()
            .with_shrinker(Some(Shrinker::elements()));
        let mut seen = Vec::new();
        let (minimal, _) = minimize(arb, |v| {
            seen.push(<(u64, u64)>::from_value(v.clone())?);
            Ok(true)
        })
        .unwrap();
        assert_eq!(minimal.value(), &(0u64, 0u64).into_value());
        // The second field does not move until the first has settled.
        let first_settled = seen.iter().position(|(a, _)| *a == 0).unwrap();
        assert!(seen[..first_settled].iter().all(|(_, b)| *b == 3));
    }
}
