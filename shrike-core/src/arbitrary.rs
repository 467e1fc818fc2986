//! The generated-value envelope passed from generators to shrinkers.

use crate::error::{Error, Result};
use crate::shrink::Shrinker;
use crate::types::{Kind, Type};
use crate::value::Value;
use std::sync::Arc;

pub mod render;

#[derive(Debug, Clone)]
struct Node {
    value: Value,
    elements: Vec<Arbitrary>,
    precursors: Vec<Arbitrary>,
    shrinker: Option<Shrinker>,
}

/// A generated value together with the structure it was built from.
///
/// * `elements` are the independently generated parts of a composite, in
///   fixed order. Maps flatten their entries as key, value, key, value.
/// * `precursors` are the envelopes a derived value was computed from by a
///   map or bind.
/// * `shrinker` is absent for terminal values.
///
/// Envelopes are immutable and cheap to clone; a shrink step that replaces
/// one element shares every other node with the previous candidate.
#[derive(Debug, Clone)]
pub struct Arbitrary(Arc<Node>);

impl Arbitrary {
    /// A leaf envelope.
    pub fn new(value: Value) -> Self {
        Arbitrary(Arc::new(Node {
            value,
            elements: Vec::new(),
            precursors: Vec::new(),
            shrinker: None,
        }))
    }

    /// A composite envelope. `value` must agree with `elements`.
    pub fn composite(value: Value, elements: Vec<Arbitrary>) -> Self {
        Arbitrary(Arc::new(Node {
            value,
            elements,
            precursors: Vec::new(),
            shrinker: None,
        }))
    }

    /// A composite envelope whose value is built from its elements.
    pub fn assemble(template: &Value, elements: Vec<Arbitrary>) -> Result<Self> {
        let value = rebuild(template, &elements)?;
        Ok(Arbitrary::composite(value, elements))
    }

    /// An envelope derived from `precursors` by a transformation.
    pub fn derived(value: Value, precursors: Vec<Arbitrary>) -> Self {
        Arbitrary(Arc::new(Node {
            value,
            elements: Vec::new(),
            precursors,
            shrinker: None,
        }))
    }

    /// Attach (or replace) the shrinker.
    pub fn with_shrinker(self, shrinker: Option<Shrinker>) -> Self {
        let mut node = Arc::unwrap_or_clone(self.0);
        node.shrinker = shrinker;
        Arbitrary(Arc::new(node))
    }

    pub fn value(&self) -> &Value {
        &self.0.value
    }

    pub fn into_value(self) -> Value {
        Arc::unwrap_or_clone(self.0).value
    }

    pub fn elements(&self) -> &[Arbitrary] {
        &self.0.elements
    }

    pub fn element(&self, index: usize) -> Result<&Arbitrary> {
        self.0.elements.get(index).ok_or_else(|| {
            Error::config(format!(
                "{} has no element {index} (it has {})",
                self.type_of(),
                self.0.elements.len()
            ))
        })
    }

    pub fn precursors(&self) -> &[Arbitrary] {
        &self.0.precursors
    }

    pub fn precursor(&self, index: usize) -> Result<&Arbitrary> {
        self.0.precursors.get(index).ok_or_else(|| {
            Error::config(format!(
                "{} was not derived from precursor {index}",
                self.type_of()
            ))
        })
    }

    pub fn shrinker(&self) -> Option<&Shrinker> {
        self.0.shrinker.as_ref()
    }

    pub fn type_of(&self) -> Type {
        self.0.value.type_of()
    }

    pub fn kind(&self) -> Kind {
        self.0.value.kind()
    }

    /// A copy with one element replaced, the value rebuilt to match.
    pub fn replace_element(&self, index: usize, element: Arbitrary) -> Result<Self> {
        self.element(index)?;
        let mut elements = self.0.elements.clone();
        elements[index] = element;
        self.with_elements(elements)
    }

    /// A copy with new elements, the value rebuilt to match.
    ///
    /// Precursors and the attached shrinker carry over unchanged.
    pub fn with_elements(&self, elements: Vec<Arbitrary>) -> Result<Self> {
        let value = rebuild(&self.0.value, &elements)?;
        Ok(Arbitrary(Arc::new(Node {
            value,
            elements,
            precursors: self.0.precursors.clone(),
            shrinker: self.0.shrinker.clone(),
        })))
    }
}

/// The type an element at `position` of `template` must have.
fn element_type(template: &Value, position: usize) -> Option<Type> {
    match template {
        Value::Array { element, .. } | Value::Slice { element, .. } => Some(element.clone()),
        Value::Map { key, value, .. } => Some(if position % 2 == 0 {
            key.clone()
        } else {
            value.clone()
        }),
        Value::Optional { inner, .. } => Some(inner.clone()),
        Value::Record { ty, .. } => ty.fields.get(position).map(|field| field.ty.clone()),
        Value::Tuple(members) => members.get(position).map(Value::type_of),
        _ => None,
    }
}

/// Rebuild a composite value of the same shape as `template` from elements.
fn rebuild(template: &Value, elements: &[Arbitrary]) -> Result<Value> {
    for (position, element) in elements.iter().enumerate() {
        let actual = element.type_of();
        match element_type(template, position) {
            Some(expected) if expected == actual => {}
            Some(expected) => {
                return Err(Error::mismatch(
                    "element rebuild",
                    format!("{expected} at position {position}"),
                    actual,
                ))
            }
            None => {
                return Err(Error::mismatch(
                    "element rebuild",
                    format!("{} with an element at position {position}", template.type_of()),
                    actual,
                ))
            }
        }
    }
    let items = || elements.iter().map(|e| e.value().clone()).collect::<Vec<_>>();
    let value = match template {
        Value::Array { element, items: old } => {
            if old.len() != elements.len() {
                return Err(Error::mismatch(
                    "array rebuild",
                    format!("{} elements", old.len()),
                    format!("{} elements", elements.len()),
                ));
            }
            Value::Array {
                element: element.clone(),
                items: items(),
            }
        }
        Value::Slice { element, .. } => Value::Slice {
            element: element.clone(),
            items: items(),
        },
        Value::Map { key, value, .. } => {
            if elements.len() % 2 != 0 {
                return Err(Error::config(format!(
                    "map elements must come in key/value pairs, found {}",
                    elements.len()
                )));
            }
            Value::Map {
                key: key.clone(),
                value: value.clone(),
                entries: elements
                    .chunks(2)
                    .map(|pair| (pair[0].value().clone(), pair[1].value().clone()))
                    .collect(),
            }
        }
        Value::Optional { inner, .. } => match elements {
            [] => Value::Optional {
                inner: inner.clone(),
                value: None,
            },
            [present] => Value::Optional {
                inner: inner.clone(),
                value: Some(Box::new(present.value().clone())),
            },
            _ => {
                return Err(Error::config(format!(
                    "optional holds at most one element, found {}",
                    elements.len()
                )))
            }
        },
        Value::Record { ty, fields } => {
            if fields.len() != elements.len() {
                return Err(Error::mismatch(
                    "record rebuild",
                    format!("{} fields", fields.len()),
                    format!("{} fields", elements.len()),
                ));
            }
            Value::Record {
                ty: ty.clone(),
                fields: items(),
            }
        }
        Value::Tuple(members) => {
            if members.len() != elements.len() {
                return Err(Error::mismatch(
                    "tuple rebuild",
                    format!("{} members", members.len()),
                    format!("{} members", elements.len()),
                ));
            }
            Value::Tuple(items())
        }
        other => {
            return Err(Error::mismatch(
                "element rebuild",
                "a composite value",
                other.type_of(),
            ))
        }
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::IntoValue;

    fn leaf(v: u64) -> Arbitrary {
        Arbitrary::new(Value::U64(v))
    }

    #[test]
    fn replacing_an_element_rebuilds_the_value() {
        let slice = Arbitrary::assemble(
            &vec![0u64; 0].into_value(),
            vec![leaf(1), leaf(2), leaf(3)],
        )
        .unwrap();
        let next = slice.replace_element(1, leaf(0)).unwrap();
        assert_eq!(next.value(), &vec![1u64, 0, 3].into_value());
        // The previous candidate is untouched.
        assert_eq!(slice.value(), &vec![1u64, 2, 3].into_value());
    }

    #[test]
    fn map_elements_are_flattened_pairs() {
        let template = std::collections::BTreeMap::<u64, u64>::new().into_value();
        let map = Arbitrary::assemble(&template, vec![leaf(1), leaf(10), leaf(2), leaf(20)]).unwrap();
        let Value::Map { entries, .. } = map.value() else {
            panic!("expected a map");
        };
        assert_eq!(entries.len(), 2);
        assert!(Arbitrary::assemble(&template, vec![leaf(1)]).is_err());
    }

    #[test]
    fn element_types_are_preserved() {
        let template = vec![0u64].into_value();
        let wrong = Arbitrary::new(Value::U8(1));
        assert!(Arbitrary::assemble(&template, vec![wrong]).is_err());
        assert!(Arbitrary::assemble(&Value::U64(3), vec![]).is_err());
    }

    #[test]
    fn optional_rebuilds_present_and_absent() {
        let template = Some(5u64).into_value();
        let absent = Arbitrary::assemble(&template, vec![]).unwrap();
        assert_eq!(absent.value(), &None::<u64>.into_value());
        let present = Arbitrary::assemble(&template, vec![leaf(7)]).unwrap();
        assert_eq!(present.value(), &Some(7u64).into_value());
    }
}
