//! Generator combinator algebra.
//!
//! A [`Generator`] is a description of how to produce values. Calling
//! [`Generator::generate`] with a target [`Type`], a [`Bias`] and a
//! [`RandomSource`] yields an [`Arbitrary`]: the value plus the shrinker that
//! knows how to simplify it.
//!
//! Generators are plain data. They can be cloned, inspected and checked
//! against a target before anything is drawn:
//!
//! ```
//! use shrike_core::constraints::Range;
//! use shrike_core::data::{Bias, RandomSource};
//! use shrike_core::gen;
//! use shrike_core::types::Type;
//! use shrike_core::value::{Func, Value};
//!
//! let evens = gen::unsigned(Range::new(0u64, 50).unwrap()).map(Func::new(|x: u64| x * 2));
//! evens.check(&Type::U64).unwrap();
//!
//! let mut source = RandomSource::from_u64(7);
//! let arb = evens.generate(&Type::U64, Bias::full(), &mut source).unwrap();
//! assert!(matches!(arb.value(), Value::U64(v) if v % 2 == 0 && *v <= 100));
//! ```

use crate::arbitrary::Arbitrary;
use crate::constraints::{CodePointRange, LengthRange, Range, Weights};
use crate::convert::{FromValue, IntoValue, Typed};
use crate::data::{Bias, RandomSource};
use crate::error::{Error, Result};
use crate::registry::Registry;
use crate::shrink::{BindShrink, Shrinker};
use crate::types::Type;
use crate::value::{Func, Value};
use std::fmt;
use std::sync::Arc;
use tracing::trace;

mod numeric;
mod structure;

pub use numeric::{float32, float64, signed, unsigned};

/// Default number of draws a filtered generator makes before giving up.
pub const DEFAULT_FILTER_ATTEMPTS: usize = 1000;

/// Default number of times a bind shrinker re-offers a passing candidate.
pub const DEFAULT_BIND_RETRIES: usize = 1;

/// Builds a generator from the one-level-shallower recursive generator.
pub type Build = Arc<dyn Fn(Generator) -> Generator + Send + Sync>;

/// Element generators for a fixed-length array.
#[derive(Clone)]
pub enum ArrayElements {
    /// One generator for every position.
    Shared(Box<Generator>),
    /// One generator per position.
    PerPosition(Vec<Generator>),
}

/// Turns a generated value into the generator for a dependent value.
#[derive(Clone)]
pub struct Binder {
    input: Type,
    f: Arc<dyn Fn(&Value) -> Result<Generator> + Send + Sync>,
}

impl Binder {
    pub fn new<A, F>(f: F) -> Binder
    where
        A: FromValue + Typed,
        F: Fn(A) -> Generator + Send + Sync + 'static,
    {
        Binder::dynamic(A::type_of(), move |value| Ok(f(A::from_value(value.clone())?)))
    }

    pub fn dynamic<F>(input: Type, f: F) -> Binder
    where
        F: Fn(&Value) -> Result<Generator> + Send + Sync + 'static,
    {
        Binder {
            input,
            f: Arc::new(f),
        }
    }

    pub fn input(&self) -> &Type {
        &self.input
    }

    pub(crate) fn apply(&self, value: &Value) -> Result<Generator> {
        let actual = value.type_of();
        if actual != self.input {
            return Err(Error::ParameterType {
                context: "binder".to_string(),
                index: 0,
                expected: self.input.to_string(),
                actual: actual.to_string(),
            });
        }
        (self.f)(value)
    }
}

impl fmt::Debug for Binder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Binder({} -> ..)", self.input)
    }
}

/// A generator: a recipe for values of some target type.
#[derive(Clone)]
pub enum Generator {
    /// `u64` over a range, scaled toward the minimum by the bias.
    Unsigned(Range<u64>),
    /// `i64` over a range, scaled toward zero (or the nearest bound).
    Signed(Range<i64>),
    Float32(Range<f32>),
    Float64(Range<f64>),
    /// `Vec<T>` with a length from `length`.
    Slice {
        element: Box<Generator>,
        length: LengthRange,
    },
    /// `[T; N]`.
    Array(ArrayElements),
    /// `Map<K, V>` with unique keys.
    Map {
        key: Box<Generator>,
        value: Box<Generator>,
        length: LengthRange,
    },
    /// A record; `None` fields (or an empty list) use [`Generator::Any`].
    Record(Vec<Option<Generator>>),
    Tuple(Vec<Generator>),
    /// `Option<T>` that is always `Some`.
    Present(Box<Generator>),
    /// Bounded-depth recursion; depth zero produces the zero value.
    Recursive { build: Build, depth: usize },
    /// Choose one generator with probability proportional to its weight.
    Weighted {
        choices: Vec<Generator>,
        weights: Weights,
    },
    Constant(Value),
    /// The zero value of the target type.
    Zero,
    /// A pure function stub; empty `outputs` uses [`Generator::Any`] per output.
    Function { outputs: Vec<Generator> },
    /// A buffered channel prefilled with generated elements.
    Channel {
        element: Box<Generator>,
        length: LengthRange,
    },
    /// Dispatch on the target kind through a registry (the standard one when
    /// `None`).
    Any(Option<Arc<Registry>>),
    Mapped {
        inner: Box<Generator>,
        mapper: Func,
    },
    Filtered {
        inner: Box<Generator>,
        predicate: Func,
        attempts: usize,
    },
    Bound {
        source: Box<Generator>,
        binder: Binder,
        retries: usize,
    },
}

impl Generator {
    /// Generate one value of type `target`.
    pub fn generate(&self, target: &Type, bias: Bias, source: &mut RandomSource) -> Result<Arbitrary> {
        match self {
            Generator::Unsigned(range) => numeric::generate_unsigned(*range, target, bias, source),
            Generator::Signed(range) => numeric::generate_signed(*range, target, bias, source),
            Generator::Float32(range) => numeric::generate_f32(*range, target, source),
            Generator::Float64(range) => numeric::generate_f64(*range, target, source),
            Generator::Slice { element, length } => {
                structure::generate_slice(element, *length, target, bias, source)
            }
            Generator::Array(elements) => structure::generate_array(elements, target, bias, source),
            Generator::Map { key, value, length } => {
                structure::generate_map(key, value, *length, target, bias, source)
            }
            Generator::Record(fields) => structure::generate_record(fields, target, bias, source),
            Generator::Tuple(members) => structure::generate_tuple(members, target, bias, source),
            Generator::Present(inner) => structure::generate_present(inner, target, bias, source),
            Generator::Recursive { build, depth } => {
                Generator::unfold(build, *depth).generate(target, bias, source)
            }
            Generator::Weighted { choices, weights } => {
                let index = weights.pick(source);
                choices[index].generate(target, bias, source)
            }
            Generator::Constant(value) => {
                if &value.type_of() != target {
                    return Err(Error::mismatch("constant generator", target, value.type_of()));
                }
                Ok(Arbitrary::new(value.clone()))
            }
            Generator::Zero => Ok(Arbitrary::new(Value::zero(target))),
            Generator::Function { outputs } => {
                structure::generate_function(outputs, target, bias, source)
            }
            Generator::Channel { element, length } => {
                structure::generate_channel(element, *length, target, bias, source)
            }
            Generator::Any(registry) => Generator::resolve(registry, target)?
                .generate(target, bias, source)
                .map_err(|err| Error::generation(format!("default generator for {target}"), err)),
            Generator::Mapped { inner, mapper } => {
                let (input, _) = Generator::mapping(mapper, target)?;
                let arb = inner
                    .generate(&input, bias, source)
                    .map_err(|err| Error::generation("mapped generator", err))?;
                let value = mapper.apply(arb.value().clone())?;
                let shrinker = arb
                    .shrinker()
                    .cloned()
                    .map(|inner| Shrinker::map(inner, mapper.clone()));
                Ok(Arbitrary::derived(value, vec![arb]).with_shrinker(shrinker))
            }
            Generator::Filtered {
                inner,
                predicate,
                attempts,
            } => {
                Generator::filtering(predicate, target)?;
                for attempt in 0..*attempts {
                    let arb = inner
                        .generate(target, bias, source)
                        .map_err(|err| Error::generation("filtered generator", err))?;
                    if predicate.test(arb.value().clone())? {
                        let shrinker = arb
                            .shrinker()
                            .cloned()
                            .map(|inner| Shrinker::filter(inner, predicate.clone()));
                        return Ok(arb.with_shrinker(shrinker));
                    }
                    trace!(attempt, "filter rejected a generated value");
                }
                Err(Error::FilterExhausted {
                    attempts: *attempts,
                })
            }
            Generator::Bound {
                source: origin,
                binder,
                retries,
            } => {
                let from = origin
                    .generate(binder.input(), bias, &mut source.split())
                    .map_err(|err| Error::generation("bind source", err))?;
                let generator = binder.apply(from.value())?;
                let bound = generator
                    .generate(target, bias, &mut source.split())
                    .map_err(|err| Error::generation("bind target", err))?;
                let source_shrinker = from
                    .shrinker()
                    .cloned()
                    .unwrap_or_else(|| Shrinker::Settle(from.clone()));
                let shrinker = Shrinker::retry(
                    Shrinker::Bind(BindShrink::new(
                        binder.clone(),
                        target.clone(),
                        bias,
                        source.split(),
                        source_shrinker,
                    )),
                    *retries,
                );
                Ok(Arbitrary::derived(bound.value().clone(), vec![from, bound])
                    .with_shrinker(Some(shrinker)))
            }
        }
    }

    /// Check statically that this generator can produce `target`.
    ///
    /// Catches wiring mistakes (mapper signatures, arities, target kinds)
    /// before anything is drawn. Bound generators only check their source:
    /// the dependent generator does not exist until a source value does.
    pub fn check(&self, target: &Type) -> Result<()> {
        match (self, target) {
            (Generator::Unsigned(_), Type::U64)
            | (Generator::Signed(_), Type::I64)
            | (Generator::Float32(_), Type::F32)
            | (Generator::Float64(_), Type::F64)
            | (Generator::Zero, _) => Ok(()),
            (Generator::Unsigned(_), _) => Err(Error::mismatch("unsigned generator", Type::U64, target)),
            (Generator::Signed(_), _) => Err(Error::mismatch("signed generator", Type::I64, target)),
            (Generator::Float32(_), _) => Err(Error::mismatch("float generator", Type::F32, target)),
            (Generator::Float64(_), _) => Err(Error::mismatch("float generator", Type::F64, target)),
            (Generator::Slice { element, .. }, Type::Slice(ty)) => element.check(ty),
            (Generator::Slice { .. }, _) => Err(Error::mismatch("slice generator", "a slice", target)),
            (Generator::Array(ArrayElements::Shared(element)), Type::Array(ty, _)) => {
                element.check(ty)
            }
            (Generator::Array(ArrayElements::PerPosition(elements)), Type::Array(ty, len)) => {
                if elements.len() != *len {
                    return Err(Error::Arity {
                        context: format!("array generator for {target}"),
                        expected: *len,
                        actual: elements.len(),
                    });
                }
                elements.iter().try_for_each(|element| element.check(ty))
            }
            (Generator::Array(_), _) => Err(Error::mismatch("array generator", "an array", target)),
            (Generator::Map { key, value, .. }, Type::Map(k, v)) => {
                key.check(k)?;
                value.check(v)
            }
            (Generator::Map { .. }, _) => Err(Error::mismatch("map generator", "a map", target)),
            (Generator::Record(fields), Type::Record(record)) => {
                let fields = structure::record_fields(fields, record)?;
                for (generator, field) in fields.iter().zip(&record.fields) {
                    generator
                        .check(&field.ty)
                        .map_err(|err| Error::generation(format!("field {}", field.name), err))?;
                }
                Ok(())
            }
            (Generator::Record(_), _) => Err(Error::mismatch("record generator", "a record", target)),
            (Generator::Tuple(members), Type::Tuple(types)) => {
                if members.len() != types.len() {
                    return Err(Error::Arity {
                        context: format!("tuple generator for {target}"),
                        expected: types.len(),
                        actual: members.len(),
                    });
                }
                members
                    .iter()
                    .zip(types)
                    .try_for_each(|(member, ty)| member.check(ty))
            }
            (Generator::Tuple(_), _) => Err(Error::mismatch("tuple generator", "a tuple", target)),
            (Generator::Present(inner), Type::Optional(ty)) => inner.check(ty),
            (Generator::Present(_), _) => {
                Err(Error::mismatch("present generator", "an optional", target))
            }
            // Checking the shallowest unfolding covers every level.
            (Generator::Recursive { build, .. }, _) => build(Generator::Zero).check(target),
            (Generator::Weighted { choices, .. }, _) => {
                choices.iter().try_for_each(|choice| choice.check(target))
            }
            (Generator::Constant(value), _) => {
                let actual = value.type_of();
                if &actual == target {
                    Ok(())
                } else {
                    Err(Error::mismatch("constant generator", target, actual))
                }
            }
            (Generator::Function { outputs }, Type::Function(signature)) => {
                if outputs.is_empty() {
                    return signature
                        .outputs
                        .iter()
                        .try_for_each(|ty| Generator::Any(None).check(ty));
                }
                structure::check_outputs(outputs, &signature.outputs)?;
                outputs
                    .iter()
                    .zip(&signature.outputs)
                    .try_for_each(|(output, ty)| output.check(ty))
            }
            (Generator::Function { .. }, _) => {
                Err(Error::mismatch("function generator", "a function", target))
            }
            (Generator::Channel { element, .. }, Type::Channel(ty)) => element.check(ty),
            (Generator::Channel { .. }, _) => {
                Err(Error::mismatch("channel generator", "a channel", target))
            }
            (Generator::Any(registry), _) => Generator::resolve(registry, target)?.check(target),
            (Generator::Mapped { inner, mapper }, _) => {
                let (input, _) = Generator::mapping(mapper, target)?;
                inner.check(&input)
            }
            (Generator::Filtered { inner, predicate, .. }, _) => {
                Generator::filtering(predicate, target)?;
                inner.check(target)
            }
            (Generator::Bound { source, binder, .. }, _) => source.check(binder.input()),
        }
    }

    /// Convert generated values with `mapper`.
    ///
    /// The mapper must take exactly the inner generator's output and return
    /// the target type. Shrinking continues on the unmapped value.
    pub fn map(self, mapper: Func) -> Generator {
        Generator::Mapped {
            inner: Box::new(self),
            mapper,
        }
    }

    /// Keep only values accepted by `predicate`, retrying up to
    /// [`DEFAULT_FILTER_ATTEMPTS`] times per value.
    pub fn filter(self, predicate: Func) -> Generator {
        Generator::Filtered {
            inner: Box::new(self),
            predicate,
            attempts: DEFAULT_FILTER_ATTEMPTS,
        }
    }

    /// Set the retry cap of a filtered generator. Other generators are
    /// returned unchanged.
    pub fn with_attempts(self, attempts: usize) -> Generator {
        match self {
            Generator::Filtered {
                inner, predicate, ..
            } => Generator::Filtered {
                inner,
                predicate,
                attempts,
            },
            other => other,
        }
    }

    /// Generate a value, then generate the final value from the generator
    /// `binder` returns for it.
    pub fn bind(self, binder: Binder) -> Generator {
        Generator::Bound {
            source: Box::new(self),
            binder,
            retries: DEFAULT_BIND_RETRIES,
        }
    }

    /// Set how often a bind shrinker re-offers a passing candidate. Other
    /// generators are returned unchanged.
    pub fn with_retries(self, retries: usize) -> Generator {
        match self {
            Generator::Bound { source, binder, .. } => Generator::Bound {
                source,
                binder,
                retries,
            },
            other => other,
        }
    }

    /// Short name of the outermost combinator.
    pub fn name(&self) -> &'static str {
        match self {
            Generator::Unsigned(_) => "unsigned",
            Generator::Signed(_) => "signed",
            Generator::Float32(_) => "float32",
            Generator::Float64(_) => "float64",
            Generator::Slice { .. } => "slice",
            Generator::Array(_) => "array",
            Generator::Map { .. } => "map",
            Generator::Record(_) => "record",
            Generator::Tuple(_) => "tuple",
            Generator::Present(_) => "present",
            Generator::Recursive { .. } => "recursive",
            Generator::Weighted { .. } => "weighted",
            Generator::Constant(_) => "constant",
            Generator::Zero => "zero",
            Generator::Function { .. } => "function",
            Generator::Channel { .. } => "channel",
            Generator::Any(_) => "any",
            Generator::Mapped { .. } => "mapped",
            Generator::Filtered { .. } => "filtered",
            Generator::Bound { .. } => "bound",
        }
    }

    fn unfold(build: &Build, depth: usize) -> Generator {
        match depth {
            0 => Generator::Zero,
            _ => build(Generator::Recursive {
                build: build.clone(),
                depth: depth - 1,
            }),
        }
    }

    fn resolve(registry: &Option<Arc<Registry>>, target: &Type) -> Result<Generator> {
        match registry {
            Some(registry) => registry.resolve_with(target, &Generator::Any(Some(registry.clone()))),
            None => Registry::standard().resolve(target),
        }
    }

    /// Validate a mapper producing `target`; returns its input and output.
    fn mapping(mapper: &Func, target: &Type) -> Result<(Type, Type)> {
        let input = mapper
            .signature()
            .inputs
            .first()
            .cloned()
            .unwrap_or_else(|| Type::Tuple(Vec::new()));
        let output = mapper.expect_unary("mapper", &input)?.clone();
        if &output != target {
            return Err(Error::mismatch("mapped generator", target, output));
        }
        Ok((input, output))
    }

    fn filtering(predicate: &Func, target: &Type) -> Result<()> {
        let output = predicate.expect_unary("filter predicate", target)?;
        if output != &Type::Bool {
            return Err(Error::mismatch("filter predicate", Type::Bool, output));
        }
        Ok(())
    }
}

impl fmt::Debug for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Generator::Unsigned(range) => write!(f, "Unsigned({range})"),
            Generator::Signed(range) => write!(f, "Signed({range})"),
            Generator::Float32(range) => write!(f, "Float32({range})"),
            Generator::Float64(range) => write!(f, "Float64({range})"),
            Generator::Slice { element, length } => {
                write!(f, "Slice({element:?}, {}..={})", length.min(), length.max())
            }
            Generator::Array(ArrayElements::Shared(element)) => write!(f, "Array({element:?})"),
            Generator::Array(ArrayElements::PerPosition(elements)) => {
                f.debug_tuple("Array").field(elements).finish()
            }
            Generator::Map { key, value, .. } => write!(f, "Map({key:?}, {value:?})"),
            Generator::Record(fields) => f.debug_tuple("Record").field(fields).finish(),
            Generator::Tuple(members) => f.debug_tuple("Tuple").field(members).finish(),
            Generator::Present(inner) => write!(f, "Present({inner:?})"),
            Generator::Recursive { depth, .. } => write!(f, "Recursive(depth {depth})"),
            Generator::Weighted { choices, .. } => f.debug_tuple("Weighted").field(choices).finish(),
            Generator::Constant(value) => write!(f, "Constant({value:?})"),
            Generator::Zero => write!(f, "Zero"),
            Generator::Function { outputs } => f.debug_tuple("Function").field(outputs).finish(),
            Generator::Channel { element, .. } => write!(f, "Channel({element:?})"),
            Generator::Any(registry) => match registry {
                Some(_) => write!(f, "Any(custom)"),
                None => write!(f, "Any"),
            },
            Generator::Mapped { inner, mapper } => write!(f, "Mapped({inner:?}, {mapper:?})"),
            Generator::Filtered {
                inner, attempts, ..
            } => write!(f, "Filtered({inner:?}, {attempts} attempts)"),
            Generator::Bound { source, binder, .. } => write!(f, "Bound({source:?}, {binder:?})"),
        }
    }
}

/// `bool` as an unsigned draw over `[0, 1]`.
pub fn bool() -> Generator {
    Generator::Unsigned(Range::ordered(0, 1)).map(Func::new(|x: u64| x == 1))
}

/// A Unicode scalar value from `range`, skipping surrogates.
pub fn rune(range: CodePointRange) -> Generator {
    Generator::Unsigned(range.indices()).map(Func::try_new(|index: u64| {
        crate::constraints::index_to_char(index)
            .ok_or_else(|| Error::conversion(Type::Char, format!("code point index {index}")))
    }))
}

/// A `String` of runes from `code_points` with a length in `length`.
pub fn string(code_points: CodePointRange, length: LengthRange) -> Generator {
    slice(rune(code_points), length).map(Func::new(|chars: Vec<char>| {
        chars.into_iter().collect::<String>()
    }))
}

pub fn slice(element: Generator, length: LengthRange) -> Generator {
    Generator::Slice {
        element: Box::new(element),
        length,
    }
}

/// An array filled by one shared element generator.
pub fn array(element: Generator) -> Generator {
    Generator::Array(ArrayElements::Shared(Box::new(element)))
}

/// An array with one generator per position.
pub fn array_of(elements: Vec<Generator>) -> Generator {
    Generator::Array(ArrayElements::PerPosition(elements))
}

pub fn map(key: Generator, value: Generator, length: LengthRange) -> Generator {
    Generator::Map {
        key: Box::new(key),
        value: Box::new(value),
        length,
    }
}

/// A record with explicit generators for some fields.
///
/// Pass one entry per declared field; `None` uses the default generator for
/// the field's type. An empty list defaults every field.
pub fn record(fields: Vec<Option<Generator>>) -> Generator {
    Generator::Record(fields)
}

pub fn tuple(members: Vec<Generator>) -> Generator {
    Generator::Tuple(members)
}

/// `None` one time in four, otherwise `Some` from `inner`.
pub fn optional(inner: Generator) -> Generator {
    weighted_unchecked(vec![(1, Generator::Zero), (3, present(inner))])
}

/// An optional with explicit weights for the absent and present cases.
pub fn optional_weighted(absent: u64, present_weight: u64, inner: Generator) -> Result<Generator> {
    weighted(vec![(absent, Generator::Zero), (present_weight, present(inner))])
}

pub fn present(inner: Generator) -> Generator {
    Generator::Present(Box::new(inner))
}

/// A generator that may refer to itself up to `depth` levels deep.
///
/// `build` receives the one-level-shallower generator. At the bottom it
/// receives a generator of zero values, which guarantees termination.
pub fn recursive<F>(depth: usize, build: F) -> Generator
where
    F: Fn(Generator) -> Generator + Send + Sync + 'static,
{
    Generator::Recursive {
        build: Arc::new(build),
        depth,
    }
}

/// Choose among generators with probability proportional to their weights.
pub fn weighted(choices: Vec<(u64, Generator)>) -> Result<Generator> {
    let weights: Vec<u64> = choices.iter().map(|(weight, _)| *weight).collect();
    let weights = Weights::new(&weights)?;
    Ok(Generator::Weighted {
        choices: choices.into_iter().map(|(_, choice)| choice).collect(),
        weights,
    })
}

fn weighted_unchecked(choices: Vec<(u64, Generator)>) -> Generator {
    let (weights, choices): (Vec<u64>, Vec<Generator>) = choices.into_iter().unzip();
    match Weights::new(&weights) {
        Ok(weights) => Generator::Weighted { choices, weights },
        Err(_) => Generator::Zero,
    }
}

/// Choose uniformly among generators.
pub fn one_of(choices: Vec<Generator>) -> Result<Generator> {
    weighted(choices.into_iter().map(|choice| (1, choice)).collect())
}

pub fn constant(value: impl IntoValue) -> Generator {
    Generator::Constant(value.into_value())
}

pub fn zero() -> Generator {
    Generator::Zero
}

/// Pure function stubs whose outputs use the default generators.
pub fn function() -> Generator {
    Generator::Function {
        outputs: Vec::new(),
    }
}

/// Pure function stubs with one generator per output.
pub fn function_with(outputs: Vec<Generator>) -> Generator {
    Generator::Function { outputs }
}

/// A channel buffering `length` generated elements; its capacity is the
/// maximum length.
pub fn channel(element: Generator, length: LengthRange) -> Generator {
    Generator::Channel {
        element: Box::new(element),
        length,
    }
}

/// Dispatch on the target type through the standard registry.
pub fn any() -> Generator {
    Generator::Any(None)
}

/// Dispatch on the target type through `registry`.
pub fn any_from(registry: Arc<Registry>) -> Generator {
    Generator::Any(Some(registry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shrink::minimize;
    use std::collections::BTreeMap;

    fn draw(generator: &Generator, target: &Type, seed: u64) -> Arbitrary {
        let mut source = RandomSource::from_u64(seed);
        generator
            .generate(target, Bias::full(), &mut source)
            .unwrap_or_else(|err| panic!("generation failed: {err}"))
    }

    #[test]
    fn bool_covers_both_values() {
        let values: Vec<bool> = (0..64)
            .map(|seed| draw(&bool(), &Type::Bool, seed).value().to().unwrap())
            .collect();
        assert!(values.contains(&true));
        assert!(values.contains(&false));
    }

    #[test]
    fn string_respects_code_points_and_length() {
        let length = LengthRange::new(2, 6).unwrap();
        let generator = string(CodePointRange::ascii(), length);
        for seed in 0..200 {
            let s: String = draw(&generator, &Type::String, seed).value().to().unwrap();
            let count = s.chars().count();
            assert!(length.contains(count), "{s:?}");
            assert!(s.chars().all(|c| (' '..='~').contains(&c)), "{s:?}");
        }
    }

    #[test]
    fn mapper_signature_is_checked_before_generation() {
        let generator = unsigned(Range::new(0u64, 9).unwrap()).map(Func::new(|x: u8| x));
        let err = generator.check(&Type::U8).unwrap_err();
        assert!(matches!(err, Error::TargetMismatch { .. } | Error::ParameterType { .. }));

        let wrong_output = unsigned(Range::new(0u64, 9).unwrap()).map(Func::new(|x: u64| x));
        assert!(matches!(
            wrong_output.check(&Type::String),
            Err(Error::TargetMismatch { .. })
        ));
    }

    #[test]
    fn optional_weights_are_configurable() {
        let target = Type::optional(Type::U8);
        let always = optional_weighted(1, u64::MAX - 1, constant(4u8)).unwrap();
        for seed in 0..50 {
            assert_eq!(draw(&always, &target, seed).value(), &Some(4u8).into_value());
        }
        assert!(matches!(
            optional_weighted(0, 1, constant(4u8)),
            Err(Error::InvalidWeights { .. })
        ));
    }

    #[test]
    fn slice_generator_rejects_other_targets() {
        let generator = slice(any(), LengthRange::default());
        let err = generator.check(&Type::U64).unwrap_err();
        assert!(err.to_string().contains("slice"));
        let mut source = RandomSource::from_u64(1);
        assert!(generator
            .generate(&Type::U64, Bias::full(), &mut source)
            .is_err());
    }

    #[test]
    fn weighted_follows_the_weights() {
        let generator = weighted(vec![
            (1, constant(false)),
            (9, constant(true)),
        ])
        .unwrap();
        let mut source = RandomSource::from_u64(99);
        let draws = 10_000;
        let hits = (0..draws)
            .filter(|_| {
                let arb = generator.generate(&Type::Bool, Bias::full(), &mut source).unwrap();
                arb.value() == &Value::Bool(true)
            })
            .count();
        let ratio = hits as f64 / draws as f64;
        assert!((0.87..0.93).contains(&ratio), "ratio {ratio}");
    }

    #[test]
    fn weighted_rejects_bad_tables() {
        assert!(matches!(
            weighted(vec![(0, zero()), (1, zero())]),
            Err(Error::InvalidWeights { .. })
        ));
        assert!(matches!(
            weighted(vec![(u64::MAX, zero()), (2, zero())]),
            Err(Error::InvalidWeights { .. })
        ));
        assert!(one_of(Vec::new()).is_err());
    }

    #[test]
    fn filter_gives_up_after_its_attempts() {
        let generator = unsigned(Range::new(0u64, 10).unwrap())
            .filter(Func::predicate(|x: &u64| *x > 100))
            .with_attempts(50);
        let mut source = RandomSource::from_u64(3);
        let err = generator
            .generate(&Type::U64, Bias::full(), &mut source)
            .unwrap_err();
        assert!(matches!(err, Error::FilterExhausted { attempts: 50 }));
    }

    #[test]
    fn recursion_is_bounded_by_depth() {
        let generator = recursive(3, |deeper| {
            one_of(vec![
                constant(0u64),
                deeper.map(Func::new(|x: u64| x + 1)),
            ])
            .unwrap_or(Generator::Zero)
        });
        generator.check(&Type::U64).unwrap();
        for seed in 0..100 {
            let depth: u64 = draw(&generator, &Type::U64, seed).value().to().unwrap();
            assert!(depth <= 3, "depth {depth}");
        }
        assert_eq!(draw(&recursive(0, |g| g), &Type::U64, 0).value(), &Value::U64(0));
    }

    #[test]
    fn function_stubs_are_pure() {
        let ty = Type::function(vec![Type::U8, Type::String], vec![Type::I32]);
        let arb = draw(&function(), &ty, 11);
        let Value::Function(f) = arb.value() else {
            panic!("expected a function");
        };
        let args = [Value::U8(4), Value::String("x".to_string())];
        let first = f.call(&args).unwrap();
        assert_eq!(f.call(&args).unwrap(), first);
        let outputs: Vec<_> = (0..32u8)
            .map(|i| f.call(&[Value::U8(i), Value::String(String::new())]).unwrap())
            .collect();
        assert!(outputs.iter().any(|o| o != &outputs[0]));
        assert!(arb.shrinker().is_none());
    }

    #[test]
    fn bind_records_source_and_target() {
        let generator = unsigned(Range::new(3u64, 8).unwrap()).bind(Binder::new(|len: u64| {
            slice(
                unsigned(Range::new(0u64, 100).unwrap()),
                LengthRange::exactly(len as usize),
            )
        }));
        let target = Type::slice(Type::U64);
        generator.check(&target).unwrap();
        let arb = draw(&generator, &target, 5);
        let len = arb.precursors()[0].value().as_u64().unwrap() as usize;
        let items: Vec<u64> = arb.value().to().unwrap();
        assert_eq!(items.len(), len);
        assert_eq!(arb.precursors()[1].value(), arb.value());

        // Every shrink candidate keeps the dependency between length and source.
        let (minimal, _) = minimize(arb, |v| {
            let items: Vec<u64> = v.to()?;
            Ok(items.len() >= 3)
        })
        .unwrap();
        let items: Vec<u64> = minimal.value().to().unwrap();
        assert_eq!(items, vec![0, 0, 0]);
    }

    #[test]
    fn map_generator_keys_are_unique() {
        let generator = map(
            unsigned(Range::new(0u64, 5).unwrap()),
            any(),
            LengthRange::new(6, 6).unwrap(),
        );
        let target = Type::map(Type::U64, Type::Bool);
        let arb = draw(&generator, &target, 21);
        let map: BTreeMap<u64, bool> = arb.value().to().unwrap();
        assert_eq!(map.len(), 6);
    }

    #[test]
    fn any_dispatches_on_the_target() {
        let target = Type::record("Point", vec![("x", Type::I16), ("tags", Type::slice(Type::Char))]);
        any().check(&target).unwrap();
        let arb = draw(&any(), &target, 8);
        assert_eq!(arb.type_of(), target);
        assert_eq!(arb.elements().len(), 2);
    }
}
