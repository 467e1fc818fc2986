//! Basic example demonstrating Shrike property-based testing.
//!
//! Run with `SHRIKE_SEED=<n>` to replay a particular run.

use shrike::*;

fn main() -> Result<()> {
    let config = Config::from_env()?;
    let seed = config.seed.unwrap_or_else(random_seed);
    let config = config.with_seed(seed);
    println!("Shrike property-based testing examples (seed {seed})");
    println!();

    // Example 1: a property that holds
    println!("Testing boolean property: every boolean is true or false");
    let result = check(vec![gen::bool()], |b: bool| b || !b, &config)?;
    println!("  {result}");
    println!();

    // Example 2: a failing property, shrunk to its boundary
    println!("Testing property that should fail: every value is at most 100");
    let bounded = gen::unsigned(Range::new(0u64, 1000)?);
    match check(vec![bounded], |x: u64| x <= 100, &config)? {
        TestResult::Fail {
            inputs,
            iteration,
            shrinks_performed,
            ..
        } => {
            println!("  Counterexample: {}", inputs[0]);
            println!("  Found at iteration: {iteration}");
            println!("  Shrinks performed: {shrinks_performed}");
        }
        result => println!("  Unexpected result: {result}"),
    }
    println!();

    // Example 3: mapped generators keep shrinking through the mapping
    println!("Testing mapped generator: doubled values are even");
    let doubled = gen::signed(Range::new(-50i64, 50)?).map(Func::new(|x: i64| x * 2));
    let result = Property::define(vec![doubled], |x: i64| x % 2 == 0)?
        .named("doubled values are even")
        .check(&config)?;
    println!("  {result}");
    println!();

    // Example 4: weighted choices
    println!("Testing weighted generator: small values dominate");
    let skewed = gen::weighted(vec![
        (9, gen::unsigned(Range::new(0u32, 9)?)),
        (1, gen::unsigned(Range::new(1_000u32, 2_000)?)),
    ])?;
    let result = check(vec![skewed], |x: u32| x < 10 || x >= 1_000, &config)?;
    println!("  {result}");

    Ok(())
}
