//! Shrinking correctness properties
//!
//! Shrinking must terminate, keep every candidate's type, and land on the
//! minimal counterexample for the classic scenarios.

use crate::{arbitrary_seed, fast_config};
use shrike::*;
use std::sync::{Arc, Mutex};

/// Find the first failing evaluation across consecutive seeds.
fn first_failure(property: &Property) -> Details {
    (0..1_000)
        .map(|seed| {
            property
                .evaluate(&mut RandomSource::from_u64(seed), Bias::full())
                .unwrap()
        })
        .find(|details| !details.passed())
        .expect("no seed produced a failure")
}

/// Property: `[0, 1000]` against `x <= 100` always shrinks to exactly 101.
pub fn test_unsigned_boundary() {
    for seed in 0..8 {
        let generators = vec![gen::unsigned(Range::new(0u64, 1000).unwrap())];
        let config = Config::default().with_seed(seed);
        let result = check(generators, |x: u64| x <= 100, &config).unwrap();
        match result {
            TestResult::Fail { inputs, .. } => {
                assert_eq!(inputs.len(), 1);
                assert_eq!(inputs[0].value, "101", "seed {seed}");
            }
            result => panic!("Boundary property unexpectedly passed: {result}"),
        }
    }
}

/// Property: shrinking ends on shrinker exhaustion well before the limit, and
/// the final candidate still fails.
pub fn test_shrinking_terminates() {
    let prop = for_all(vec![arbitrary_seed()], |seed: u64| {
        let property = Property::define(
            vec![gen::slice(
                gen::signed(Range::new(-100i64, 100).unwrap()),
                LengthRange::new(0, 20).unwrap(),
            )],
            |xs: Vec<i64>| xs.iter().sum::<i64>() < 50,
        )
        .unwrap();
        let details = property
            .evaluate(&mut RandomSource::from_u64(seed), Bias::full())
            .unwrap();
        if details.passed() {
            return true;
        }
        let minimal = details.inputs[0].to::<Vec<i64>>().unwrap();
        details.shrinks < 10_000 && minimal.iter().sum::<i64>() >= 50
    })
    .unwrap();

    let result = prop.check(&fast_config()).unwrap();
    assert!(result.is_pass(), "Shrinking termination property failed: {result}");
}

/// Property: every candidate offered while shrinking has the original type.
pub fn test_candidates_keep_their_type() {
    let element = gen::optional(gen::signed(Range::new(-300i16, 300).unwrap()));
    let generator = gen::tuple(vec![
        gen::slice(element, LengthRange::new(1, 6).unwrap()),
        gen::string(CodePointRange::ascii(), LengthRange::new(0, 5).unwrap()),
        gen::unsigned(Range::new(3u8, 90).unwrap()).map(Func::new(|x: u8| x as u64 * 1_000)),
    ]);
    let target = Type::Tuple(vec![
        Type::slice(Type::optional(Type::I16)),
        Type::String,
        Type::U64,
    ]);

    let prop = for_all(vec![arbitrary_seed()], move |seed: u64| {
        let initial = generator
            .generate(&target, Bias::full(), &mut RandomSource::from_u64(seed))
            .unwrap();
        let mut preserved = true;
        shrink::minimize(initial, |candidate| {
            preserved &= candidate.type_of() == target;
            Ok(true)
        })
        .unwrap();
        preserved
    })
    .unwrap();

    let result = prop.check(&fast_config()).unwrap();
    assert!(result.is_pass(), "Type preservation property failed: {result}");
}

/// A slice of `[0, 10]` values that must not contain 5 shrinks to `[5]`.
pub fn test_slice_shrinks_to_single_element() {
    let property = Property::define(
        vec![gen::slice(
            gen::unsigned(Range::new(0u64, 10).unwrap()),
            LengthRange::new(0, 10).unwrap(),
        )],
        |xs: Vec<u64>| !xs.contains(&5),
    )
    .unwrap();

    let details = first_failure(&property);
    assert_eq!(details.inputs[0].to::<Vec<u64>>().unwrap(), vec![5]);
    assert_eq!(details.rendered()[0].type_name, "Vec<u64>");
}

/// An always-failing two-field record shrinks both fields to zero.
pub fn test_record_shrinks_to_zero() {
    let target = Type::record("Pair", vec![("x", Type::U64), ("y", Type::U64)]);
    let generator = gen::record(vec![
        Some(gen::unsigned(Range::<u64>::full())),
        Some(gen::unsigned(Range::<u64>::full())),
    ]);
    let property = Property::dynamic(vec![generator], vec![target], |_| {
        Ok(Some("always fails".to_string()))
    })
    .unwrap();

    let details = first_failure(&property);
    assert_eq!(details.failure.as_deref(), Some("always fails"));
    match &details.inputs[0] {
        Value::Record { ty, fields } => {
            assert_eq!(ty.name, "Pair");
            assert_eq!(fields, &vec![Value::U64(0), Value::U64(0)]);
        }
        other => panic!("expected a record, got {other:?}"),
    }
}

/// The same seed yields the same inputs and the same minimal counterexample.
pub fn test_runs_are_reproducible() {
    let generators = || {
        vec![
            gen::slice(gen::any(), LengthRange::new(0, 8).unwrap()),
            gen::string(CodePointRange::default(), LengthRange::default()),
        ]
    };
    let config = Config::default().with_seed(0xdecade).with_tests(60);

    let observe = || {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        stream(
            generators(),
            move |xs: Vec<u32>, s: String| sink.lock().unwrap().push((xs, s)),
            &config,
        )
        .unwrap();
        let seen = seen.lock().unwrap().clone();
        seen
    };
    assert_eq!(observe(), observe());

    let run = || {
        check(
            generators(),
            |xs: Vec<u32>, s: String| xs.len() + s.len() < 9,
            &config,
        )
        .unwrap()
    };
    let first = run();
    assert!(first.is_fail());
    assert_eq!(first, run());
}
