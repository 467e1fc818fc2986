//! Example showing how different generators shrink their counterexamples.

use shrike::*;

fn report(label: &str, result: TestResult) {
    match result {
        TestResult::Fail {
            inputs,
            reason,
            shrinks_performed,
            ..
        } => {
            let inputs: Vec<String> = inputs.iter().map(ToString::to_string).collect();
            println!("{label}: {} ({reason}, {shrinks_performed} shrinks)", inputs.join(", "));
        }
        result => println!("{label}: unexpected result: {result}"),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::default().with_seed(42).with_tests(200);

    // Integers shrink toward the origin of their range
    let result = check(
        vec![gen::signed(Range::new(-1_000i32, 1_000)?)],
        |x: i32| x.abs() < 300,
        &config,
    )?;
    report("signed integers", result);

    // Slices drop elements, then shrink the survivors
    let result = check(
        vec![gen::slice(
            gen::unsigned(Range::new(0u64, 10)?),
            LengthRange::new(0, 10)?,
        )],
        |xs: Vec<u64>| !xs.contains(&5),
        &config,
    )?;
    report("slice containing 5", result);

    // Strings shrink both length and code points
    let result = check(
        vec![gen::string(CodePointRange::ascii(), LengthRange::new(0, 20)?)],
        |s: String| !s.contains('z'),
        &config,
    )?;
    report("string containing 'z'", result);

    // Optionals try the absent state only when it keeps the failure
    let result = check(
        vec![gen::optional(gen::unsigned(Range::new(0u16, 500)?))],
        |x: Option<u16>| x.map_or(true, |v| v < 250),
        &config,
    )?;
    report("optional above 250", result);

    // Two inputs shrink independently
    let result = check(
        vec![gen::any(), gen::any()],
        |a: u8, b: u8| (a as u16 + b as u16) < 300,
        &config,
    )?;
    report("pair summing to 300", result);

    // Filters only ever offer accepted candidates
    let even = gen::unsigned(Range::new(0u64, 10_000)?)
        .filter(Func::predicate(|x: &u64| x % 2 == 0));
    let result = check(vec![even], |x: u64| x < 1_000, &config)?;
    report("even values below 1000", result);

    Ok(())
}
