//! Generators for composite values: collections, records, optionals,
//! function stubs and channels.

use super::{ArrayElements, Generator};
use crate::arbitrary::Arbitrary;
use crate::constraints::LengthRange;
use crate::data::{Bias, RandomSource};
use crate::error::{Error, Result};
use crate::shrink::Shrinker;
use crate::types::{RecordType, Type};
use crate::value::{Channel, Func, Value};
use rand::RngCore;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Draw a length, scaled toward the minimum by the bias.
fn draw_length(length: LengthRange, bias: Bias, source: &mut RandomSource) -> usize {
    let span = (length.max() - length.min()) as u64;
    let hi = length.min() as u64 + bias.scale(span);
    source.uniform(length.min() as u64, hi) as usize
}

/// Generate each element from its own split of the source.
fn generate_all<'a>(
    generators: impl Iterator<Item = (&'a Generator, &'a Type)>,
    bias: Bias,
    source: &mut RandomSource,
    context: impl Fn(usize) -> String,
) -> Result<Vec<Arbitrary>> {
    generators
        .enumerate()
        .map(|(index, (generator, ty))| {
            generator
                .generate(ty, bias, &mut source.split())
                .map_err(|err| Error::generation(context(index), err))
        })
        .collect()
}

pub(super) fn generate_slice(
    element: &Generator,
    length: LengthRange,
    target: &Type,
    bias: Bias,
    source: &mut RandomSource,
) -> Result<Arbitrary> {
    let Type::Slice(ty) = target else {
        return Err(Error::mismatch("slice generator", "a slice", target));
    };
    let len = draw_length(length, bias, source);
    let elements = generate_all(
        std::iter::repeat((element, &**ty)).take(len),
        bias,
        source,
        |index| format!("slice element {index}"),
    )?;
    Ok(Arbitrary::assemble(&Value::zero(target), elements)?
        .with_shrinker(Some(Shrinker::slice(length.min()))))
}

pub(super) fn generate_array(
    elements: &ArrayElements,
    target: &Type,
    bias: Bias,
    source: &mut RandomSource,
) -> Result<Arbitrary> {
    let Type::Array(ty, len) = target else {
        return Err(Error::mismatch("array generator", "an array", target));
    };
    let context = |index: usize| format!("array element {index}");
    let elements = match elements {
        ArrayElements::Shared(element) => generate_all(
            std::iter::repeat((&**element, &**ty)).take(*len),
            bias,
            source,
            context,
        )?,
        ArrayElements::PerPosition(generators) => {
            if generators.len() != *len {
                return Err(Error::Arity {
                    context: format!("array generator for {target}"),
                    expected: *len,
                    actual: generators.len(),
                });
            }
            generate_all(
                generators.iter().zip(std::iter::repeat(&**ty)),
                bias,
                source,
                context,
            )?
        }
    };
    Ok(Arbitrary::assemble(&Value::zero(target), elements)?
        .with_shrinker(Some(Shrinker::elements())))
}

pub(super) fn generate_map(
    key: &Generator,
    value: &Generator,
    length: LengthRange,
    target: &Type,
    bias: Bias,
    source: &mut RandomSource,
) -> Result<Arbitrary> {
    let Type::Map(key_ty, value_ty) = target else {
        return Err(Error::mismatch("map generator", "a map", target));
    };
    let len = draw_length(length, bias, source);
    let attempts = 100 + len * 10;
    let mut keys: Vec<Arbitrary> = Vec::with_capacity(len);
    for _ in 0..attempts {
        if keys.len() == len {
            break;
        }
        let candidate = key
            .generate(key_ty, bias, &mut source.split())
            .map_err(|err| Error::generation("map key", err))?;
        if keys.iter().all(|k| k.value() != candidate.value()) {
            keys.push(candidate);
        }
    }
    // Small key spaces may not hold `len` distinct keys; the minimum must fit.
    if keys.len() < length.min() {
        return Err(Error::generation(
            format!("map of {target}"),
            Error::FilterExhausted { attempts },
        ));
    }
    let mut elements = Vec::with_capacity(keys.len() * 2);
    for (index, k) in keys.into_iter().enumerate() {
        let v = value
            .generate(value_ty, bias, &mut source.split())
            .map_err(|err| Error::generation(format!("map value {index}"), err))?;
        elements.push(k);
        elements.push(v);
    }
    Ok(Arbitrary::assemble(&Value::zero(target), elements)?
        .with_shrinker(Some(Shrinker::map_entries(length.min()))))
}

/// Resolve per-field generators, defaulting missing ones.
pub(super) fn record_fields(fields: &[Option<Generator>], record: &RecordType) -> Result<Vec<Generator>> {
    if fields.is_empty() {
        return Ok(vec![Generator::Any(None); record.fields.len()]);
    }
    if fields.len() != record.fields.len() {
        return Err(Error::Arity {
            context: format!("record generator for {}", record.name),
            expected: record.fields.len(),
            actual: fields.len(),
        });
    }
    Ok(fields
        .iter()
        .map(|field| field.clone().unwrap_or(Generator::Any(None)))
        .collect())
}

pub(super) fn generate_record(
    fields: &[Option<Generator>],
    target: &Type,
    bias: Bias,
    source: &mut RandomSource,
) -> Result<Arbitrary> {
    let Type::Record(record) = target else {
        return Err(Error::mismatch("record generator", "a record", target));
    };
    let generators = record_fields(fields, record)?;
    let elements = generate_all(
        generators.iter().zip(record.fields.iter().map(|field| &field.ty)),
        bias,
        source,
        |index| format!("field {}", record.fields[index].name),
    )?;
    Ok(Arbitrary::assemble(&Value::zero(target), elements)?
        .with_shrinker(Some(Shrinker::elements())))
}

pub(super) fn generate_tuple(
    members: &[Generator],
    target: &Type,
    bias: Bias,
    source: &mut RandomSource,
) -> Result<Arbitrary> {
    let Type::Tuple(types) = target else {
        return Err(Error::mismatch("tuple generator", "a tuple", target));
    };
    if members.len() != types.len() {
        return Err(Error::Arity {
            context: format!("tuple generator for {target}"),
            expected: types.len(),
            actual: members.len(),
        });
    }
    let elements = generate_all(members.iter().zip(types), bias, source, |index| {
        format!("tuple member {index}")
    })?;
    Ok(Arbitrary::assemble(&Value::zero(target), elements)?
        .with_shrinker(Some(Shrinker::elements())))
}

pub(super) fn generate_present(
    inner: &Generator,
    target: &Type,
    bias: Bias,
    source: &mut RandomSource,
) -> Result<Arbitrary> {
    let Type::Optional(ty) = target else {
        return Err(Error::mismatch("present generator", "an optional", target));
    };
    let pointee = inner
        .generate(ty, bias, source)
        .map_err(|err| Error::generation("optional pointee", err))?;
    Ok(Arbitrary::assemble(&Value::zero(target), vec![pointee])?
        .with_shrinker(Some(Shrinker::optional())))
}

pub(super) fn check_outputs(outputs: &[Generator], expected: &[Type]) -> Result<()> {
    if outputs.len() != expected.len() {
        return Err(Error::Arity {
            context: "function generator outputs".to_string(),
            expected: expected.len(),
            actual: outputs.len(),
        });
    }
    Ok(())
}

/// A pure function stub.
///
/// Each call hashes its arguments and mixes the hash into a seed drawn at
/// generation time, so equal arguments always produce equal outputs and no
/// table of results is kept.
pub(super) fn generate_function(
    outputs: &[Generator],
    target: &Type,
    bias: Bias,
    source: &mut RandomSource,
) -> Result<Arbitrary> {
    let Type::Function(signature) = target else {
        return Err(Error::mismatch("function generator", "a function", target));
    };
    let outputs = if outputs.is_empty() {
        vec![Generator::Any(None); signature.outputs.len()]
    } else {
        check_outputs(outputs, &signature.outputs)?;
        outputs.to_vec()
    };
    let base = source.next_u64();
    let output_types = signature.outputs.clone();
    let func = Func::with_signature(signature.clone(), move |args| {
        let mut hasher = DefaultHasher::new();
        args.hash(&mut hasher);
        let mut source = RandomSource::from_u64(base ^ hasher.finish());
        outputs
            .iter()
            .zip(&output_types)
            .map(|(generator, ty)| {
                generator
                    .generate(ty, bias, &mut source.split())
                    .map(Arbitrary::into_value)
                    .map_err(|err| Error::generation("function stub output", err))
            })
            .collect()
    })
    .with_id(base);
    Ok(Arbitrary::new(Value::Function(func)))
}

/// A channel buffering the generated elements. Channels do not shrink.
pub(super) fn generate_channel(
    element: &Generator,
    length: LengthRange,
    target: &Type,
    bias: Bias,
    source: &mut RandomSource,
) -> Result<Arbitrary> {
    let Type::Channel(ty) = target else {
        return Err(Error::mismatch("channel generator", "a channel", target));
    };
    let len = draw_length(length, bias, source);
    let channel = Channel::new((**ty).clone(), length.max()).with_id(source.next_u64());
    for index in 0..len {
        let item = element
            .generate(ty, bias, &mut source.split())
            .map_err(|err| Error::generation(format!("channel element {index}"), err))?;
        channel.send(item.into_value())?;
    }
    Ok(Arbitrary::new(Value::Channel(channel)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::Range;
    use crate::gen::{self, unsigned};

    fn draw(generator: &Generator, target: &Type, seed: u64) -> Result<Arbitrary> {
        generator.generate(target, Bias::full(), &mut RandomSource::from_u64(seed))
    }

    #[test]
    fn slices_respect_their_length_range() {
        let length = LengthRange::new(3, 7).unwrap();
        let generator = gen::slice(unsigned(Range::<u64>::full()), length);
        let target = Type::slice(Type::U64);
        for seed in 0..300 {
            let arb = draw(&generator, &target, seed).unwrap();
            assert!(length.contains(arb.elements().len()));
            assert_eq!(arb.type_of(), target);
        }
    }

    #[test]
    fn arrays_match_their_declared_length() {
        let target = Type::array(Type::U64, 3);
        let per_position = gen::array_of(vec![
            gen::constant(1u64),
            gen::constant(2u64),
            gen::constant(3u64),
        ]);
        let arb = draw(&per_position, &target, 0).unwrap();
        assert_eq!(arb.value().to::<[u64; 3]>().unwrap(), [1, 2, 3]);

        let short = gen::array_of(vec![gen::zero()]);
        assert!(matches!(
            draw(&short, &target, 0),
            Err(Error::Arity { expected: 3, actual: 1, .. })
        ));
    }

    #[test]
    fn maps_fail_when_the_key_space_is_too_small() {
        let generator = gen::map(
            unsigned(Range::new(0u64, 1).unwrap()),
            gen::zero(),
            LengthRange::new(3, 3).unwrap(),
        );
        let err = draw(&generator, &Type::map(Type::U64, Type::U64), 4).unwrap_err();
        assert!(matches!(err, Error::Generation { .. }));
    }

    #[test]
    fn records_use_explicit_and_default_field_generators() {
        let target = Type::record("Pair", vec![("x", Type::U64), ("y", Type::Bool)]);
        let generator = gen::record(vec![Some(gen::constant(42u64)), None]);
        let arb = draw(&generator, &target, 3).unwrap();
        assert_eq!(arb.elements()[0].value(), &Value::U64(42));
        assert_eq!(arb.elements()[1].type_of(), Type::Bool);

        let wrong = gen::record(vec![None]);
        assert!(wrong.check(&target).is_err());
    }

    #[test]
    fn optional_produces_both_forms() {
        let generator = gen::optional(gen::constant(5u64));
        let target = Type::optional(Type::U64);
        let values: Vec<Option<u64>> = (0..100)
            .map(|seed| draw(&generator, &target, seed).unwrap().value().to().unwrap())
            .collect();
        assert!(values.contains(&None));
        assert!(values.contains(&Some(5)));
        let present = draw(&gen::present(gen::zero()), &target, 0).unwrap();
        assert_eq!(present.value().to::<Option<u64>>().unwrap(), Some(0));
    }

    #[test]
    fn channels_are_prefilled() {
        let generator = gen::channel(gen::constant(7u8), LengthRange::new(2, 4).unwrap());
        let arb = draw(&generator, &Type::channel(Type::U8), 12).unwrap();
        let Value::Channel(channel) = arb.value() else {
            panic!("expected a channel");
        };
        assert_eq!(channel.capacity(), 4);
        let items = channel.drain();
        assert!((2..=4).contains(&items.len()));
        assert!(items.iter().all(|v| v == &Value::U8(7)));
        assert!(arb.shrinker().is_none());
    }

    #[test]
    fn function_outputs_must_match_the_signature() {
        let target = Type::function(vec![Type::U8], vec![Type::U64, Type::U64]);
        let generator = gen::function_with(vec![gen::zero()]);
        assert!(generator.check(&target).is_err());
        assert!(draw(&generator, &target, 0).is_err());
    }
}
