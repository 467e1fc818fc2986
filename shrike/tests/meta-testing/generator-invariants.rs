//! Generator invariant properties
//!
//! Every value a constrained generator produces must respect its constraint,
//! whatever the seed or bias.

use crate::{arbitrary_seed, fast_config};
use shrike::*;

const DRAWS_PER_SEED: usize = 400;

/// Draw `DRAWS_PER_SEED` values with a ramping bias and check each one.
fn draws_hold<F>(generator: &Generator, target: &Type, seed: u64, holds: F) -> Result<()>
where
    F: Fn(&Value) -> Result<bool>,
{
    let mut source = RandomSource::from_u64(seed);
    for index in 0..DRAWS_PER_SEED {
        let bias = Bias::for_iteration(index, DRAWS_PER_SEED);
        let arb = generator.generate(target, bias, &mut source)?;
        if !holds(arb.value())? {
            return Err(Error::Function {
                message: format!("draw {index} produced {:?}", arb.value()),
            });
        }
    }
    Ok(())
}

/// Property: integer generators stay inside `[min, max]` (25 seeds x 400
/// draws per generator).
pub fn test_integer_ranges_hold() {
    let unsigned = gen::unsigned(Range::new(17u16, 923).unwrap());
    let signed = gen::signed(Range::new(-40i32, 7).unwrap());
    let negative = gen::signed(Range::new(i64::MIN, -3).unwrap());

    let prop = for_all(vec![arbitrary_seed()], move |seed: u64| -> Result<()> {
        draws_hold(&unsigned, &Type::U16, seed, |v| Ok((17..=923).contains(&v.to::<u16>()?)))?;
        draws_hold(&signed, &Type::I32, seed, |v| Ok((-40..=7).contains(&v.to::<i32>()?)))?;
        draws_hold(&negative, &Type::I64, seed, |v| Ok(v.to::<i64>()? <= -3))
    })
    .unwrap()
    .named("integer ranges");

    match prop.check(&fast_config()).unwrap() {
        TestResult::Pass { .. } => {}
        result => panic!("Integer range property failed: {result}"),
    }
}

/// Property: float generators stay inside their bounds and never yield NaN.
pub fn test_float_ranges_hold() {
    let narrow = gen::float64(Range::new(-1.5f64, 2.5).unwrap());
    let positive = gen::float32(Range::new(0.25f32, 1e6).unwrap());

    let prop = for_all(vec![arbitrary_seed()], move |seed: u64| -> Result<()> {
        draws_hold(&narrow, &Type::F64, seed, |v| {
            let x = v.to::<f64>()?;
            Ok((-1.5..=2.5).contains(&x))
        })?;
        draws_hold(&positive, &Type::F32, seed, |v| {
            let x = v.to::<f32>()?;
            Ok((0.25..=1e6).contains(&x))
        })
    })
    .unwrap();

    let result = prop.check(&fast_config()).unwrap();
    assert!(result.is_pass(), "Float range property failed: {result}");
}

/// Property: collection lengths stay inside their length range.
pub fn test_length_ranges_hold() {
    let slices = gen::slice(gen::bool(), LengthRange::new(2, 6).unwrap());
    let strings = gen::string(CodePointRange::ascii(), LengthRange::new(0, 8).unwrap());
    let slice_type = Type::slice(Type::Bool);

    let prop = for_all(vec![arbitrary_seed()], move |seed: u64| -> Result<()> {
        draws_hold(&slices, &slice_type, seed, |v| {
            Ok((2..=6).contains(&v.to::<Vec<bool>>()?.len()))
        })?;
        draws_hold(&strings, &Type::String, seed, |v| {
            let s = v.to::<String>()?;
            Ok(s.chars().count() <= 8 && s.is_ascii())
        })
    })
    .unwrap();

    let result = prop.check(&fast_config()).unwrap();
    assert!(result.is_pass(), "Length range property failed: {result}");
}

/// Property: `weighted([1, 9])` picks the heavy choice about 90% of the time.
pub fn test_weighted_selection_ratio() {
    let generator = gen::weighted(vec![(1, gen::constant(0u8)), (9, gen::constant(1u8))]).unwrap();
    let mut source = RandomSource::from_u64(99);
    let draws = 10_000;
    let heavy = (0..draws)
        .filter(|_| {
            let arb = generator.generate(&Type::U8, Bias::full(), &mut source).unwrap();
            arb.value() == &Value::U8(1)
        })
        .count();

    let ratio = heavy as f64 / draws as f64;
    assert!(
        (0.87..=0.93).contains(&ratio),
        "Heavy choice selected {ratio:.3} of the time"
    );
}

/// Zero weights and overflowing totals are configuration errors.
pub fn test_invalid_weights_are_rejected() {
    let zero = gen::weighted(vec![(0, gen::bool()), (1, gen::bool())]).unwrap_err();
    assert!(matches!(zero, Error::InvalidWeights { .. }));
    assert!(zero.is_configuration());

    let overflow = gen::weighted(vec![(u64::MAX, gen::bool()), (2, gen::bool())]).unwrap_err();
    assert!(matches!(overflow, Error::InvalidWeights { .. }));

    // A total of exactly 2^64 still fits.
    assert!(gen::weighted(vec![(u64::MAX, gen::bool()), (1, gen::bool())]).is_ok());
    assert!(gen::one_of(vec![]).is_err());
}

/// An unsatisfiable filter aborts the run with a generation error instead of
/// producing a counterexample.
pub fn test_unsatisfiable_filter_is_an_error() {
    let generator = gen::unsigned(Range::new(0u64, 10).unwrap())
        .filter(Func::predicate(|x: &u64| *x > 100))
        .with_attempts(200);

    let err = check(vec![generator], |_: u64| true, &fast_config()).unwrap_err();
    match err {
        Error::Generation { source, .. } => {
            assert!(matches!(*source, Error::FilterExhausted { attempts: 200 }));
        }
        other => panic!("expected a generation error, got {other}"),
    }
}
