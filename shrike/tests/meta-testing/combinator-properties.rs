//! Combinator law properties
//!
//! Map, filter and bind must shrink the way their inner generators do, seen
//! through the transformation.

use crate::{arbitrary_seed, fast_config};
use shrike::*;

/// Property: shrinking `map(f)` lands on `f` of the unmapped minimum for a
/// bijective `f`.
pub fn test_map_round_trip() {
    let inner = gen::unsigned(Range::new(500u64, 1000).unwrap());
    let mapped = inner.clone().map(Func::new(|x: u64| x + 7));

    let prop = for_all(vec![arbitrary_seed()], move |seed: u64| {
        let direct = inner
            .generate(&Type::U64, Bias::full(), &mut RandomSource::from_u64(seed))
            .unwrap();
        let through = mapped
            .generate(&Type::U64, Bias::full(), &mut RandomSource::from_u64(seed))
            .unwrap();

        let (direct, _) =
            shrink::minimize(direct, |v| Ok(v.as_u64().unwrap_or(0) > 100)).unwrap();
        let (through, _) =
            shrink::minimize(through, |v| Ok(v.as_u64().unwrap_or(0) > 107)).unwrap();

        direct.value().as_u64().map(|x| x + 7) == through.value().as_u64()
            && through.precursors()[0].value() == direct.value()
    })
    .unwrap();

    let result = prop.check(&fast_config()).unwrap();
    assert!(result.is_pass(), "Map round trip property failed: {result}");
}

/// Property: a filtered generator only ever offers accepted candidates.
pub fn test_filter_candidates_satisfy_predicate() {
    let generator = gen::unsigned(Range::new(0u64, 5_000).unwrap())
        .filter(Func::predicate(|x: &u64| x % 2 == 0));

    let prop = for_all(vec![arbitrary_seed()], move |seed: u64| {
        let initial = generator
            .generate(&Type::U64, Bias::full(), &mut RandomSource::from_u64(seed))
            .unwrap();
        let Some(start) = initial.value().as_u64() else {
            return false;
        };
        if start < 20 {
            return start % 2 == 0;
        }
        let mut even = true;
        let (minimal, _) = shrink::minimize(initial, |v| {
            let x = v.as_u64().unwrap_or(1);
            even &= x % 2 == 0;
            Ok(x >= 20)
        })
        .unwrap();
        let last = minimal.value().as_u64().unwrap_or(1);
        even && last % 2 == 0 && (20..=start).contains(&last)
    })
    .unwrap();

    let result = prop.check(&fast_config()).unwrap();
    assert!(result.is_pass(), "Filter property failed: {result}");
}

/// A bound generator shrinks its source first, then the target built from it.
pub fn test_bind_respects_source() {
    let generator = gen::unsigned(Range::new(1u64, 10).unwrap()).bind(Binder::new(|len: u64| {
        gen::slice(
            gen::unsigned(Range::new(0u64, 100).unwrap()),
            LengthRange::exactly(len as usize),
        )
    }));
    let property = Property::define(vec![generator], |xs: Vec<u64>| xs.len() < 4).unwrap();

    let details = (0..1_000)
        .map(|seed| {
            property
                .evaluate(&mut RandomSource::from_u64(seed), Bias::full())
                .unwrap()
        })
        .find(|details| !details.passed())
        .expect("no seed produced a failure");

    assert_eq!(details.inputs[0].to::<Vec<u64>>().unwrap(), vec![0, 0, 0, 0]);
    assert!(details.shrinks > 0);
}
