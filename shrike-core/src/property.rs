//! Property definitions and the generate / evaluate / shrink loop.

use crate::arbitrary::Arbitrary;
use crate::convert::{FromValue, Typed};
use crate::data::{random_seed, Bias, Config, RandomSource};
use crate::error::{Error, Result, TestResult};
use crate::gen::Generator;
use crate::report::{encode, render, RenderedInput};
use crate::shrink::Shrinker;
use crate::types::Type;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Explicit pass / fail outcome for predicates that want to build their own
/// failure messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail(String),
}

impl Verdict {
    pub fn fail(reason: impl Into<String>) -> Self {
        Verdict::Fail(reason.into())
    }
}

/// A predicate return value: `None` is a pass, `Some(reason)` a failure.
pub trait IntoVerdict {
    fn into_verdict(self) -> Option<String>;
}

impl IntoVerdict for bool {
    fn into_verdict(self) -> Option<String> {
        (!self).then(|| "predicate returned false".to_string())
    }
}

impl IntoVerdict for () {
    fn into_verdict(self) -> Option<String> {
        None
    }
}

impl IntoVerdict for Verdict {
    fn into_verdict(self) -> Option<String> {
        match self {
            Verdict::Pass => None,
            Verdict::Fail(reason) => Some(reason),
        }
    }
}

impl<E: fmt::Display> IntoVerdict for std::result::Result<(), E> {
    fn into_verdict(self) -> Option<String> {
        self.err().map(|err| err.to_string())
    }
}

/// A typed predicate over the inputs of a property.
///
/// Implemented for closures of up to six arguments whose parameters convert
/// from [`Value`]s and whose result is an [`IntoVerdict`].
pub trait Predicate<Args>: Send + Sync + 'static {
    fn parameters() -> Vec<Type>;

    fn evaluate(&self, inputs: Vec<Value>) -> Result<Option<String>>;
}

macro_rules! impl_predicate {
    ($($arg:ident),*) => {
        impl<F, R, $($arg,)*> Predicate<($($arg,)*)> for F
        where
            F: Fn($($arg),*) -> R + Send + Sync + 'static,
            R: IntoVerdict,
            $($arg: FromValue + Typed,)*
        {
            fn parameters() -> Vec<Type> {
                vec![$($arg::type_of()),*]
            }

            #[allow(non_snake_case, unused_mut, unused_variables)]
            fn evaluate(&self, inputs: Vec<Value>) -> Result<Option<String>> {
                let expected = <Self as Predicate<($($arg,)*)>>::parameters().len();
                if inputs.len() != expected {
                    return Err(Error::Arity {
                        context: "predicate arguments".to_string(),
                        expected,
                        actual: inputs.len(),
                    });
                }
                let mut inputs = inputs.into_iter();
                $(
                    let $arg = $arg::from_value(
                        inputs.next().ok_or_else(|| Error::config("missing predicate argument"))?,
                    )?;
                )*
                Ok((self)($($arg),*).into_verdict())
            }
        }
    };
}

impl_predicate!();
impl_predicate!(A);
impl_predicate!(A, B);
impl_predicate!(A, B, C);
impl_predicate!(A, B, C, D);
impl_predicate!(A, B, C, D, E);
impl_predicate!(A, B, C, D, E, G);

type Body = dyn Fn(Vec<Value>) -> Result<Option<String>> + Send + Sync;

/// Outcome of one property evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Details {
    /// The inputs evaluated; the minimal counterexample on failure.
    pub inputs: Vec<Value>,
    /// The predicate's failure reason, `None` when it held.
    pub failure: Option<String>,
    /// Shrink steps performed.
    pub shrinks: usize,
}

impl Details {
    pub fn passed(&self) -> bool {
        self.failure.is_none()
    }

    pub fn rendered(&self) -> Vec<RenderedInput> {
        render(&self.inputs)
    }
}

/// A predicate together with one generator per input.
#[derive(Clone)]
pub struct Property {
    generators: Vec<Generator>,
    parameters: Vec<Type>,
    predicate: Arc<Body>,
    name: Option<String>,
    shrink_limit: usize,
}

impl Property {
    /// Pair generators with a typed predicate.
    ///
    /// Arity and every generator's target are checked here, before anything
    /// is generated.
    pub fn define<Args, P>(generators: Vec<Generator>, predicate: P) -> Result<Property>
    where
        P: Predicate<Args>,
    {
        Property::dynamic(generators, P::parameters(), move |inputs| {
            predicate.evaluate(inputs)
        })
    }

    /// Pair generators with an untyped predicate over explicit parameter types.
    pub fn dynamic<F>(generators: Vec<Generator>, parameters: Vec<Type>, predicate: F) -> Result<Property>
    where
        F: Fn(Vec<Value>) -> Result<Option<String>> + Send + Sync + 'static,
    {
        if generators.len() != parameters.len() {
            return Err(Error::Arity {
                context: "predicate parameters".to_string(),
                expected: parameters.len(),
                actual: generators.len(),
            });
        }
        for (generator, parameter) in generators.iter().zip(&parameters) {
            generator.check(parameter)?;
        }
        Ok(Property {
            generators,
            parameters,
            predicate: Arc::new(predicate),
            name: None,
            shrink_limit: Config::default().shrink_limit,
        })
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_shrink_limit(mut self, shrink_limit: usize) -> Self {
        self.shrink_limit = shrink_limit;
        self
    }

    pub fn parameters(&self) -> &[Type] {
        &self.parameters
    }

    /// Generate one input tuple, evaluate it and shrink any failure.
    pub fn evaluate(&self, source: &mut RandomSource, bias: Bias) -> Result<Details> {
        let inputs = self.generate(source, bias)?;
        let Some(reason) = self.verdict(&inputs)? else {
            return Ok(Details {
                inputs: members(inputs.value()),
                failure: None,
                shrinks: 0,
            });
        };
        debug!(reason = %reason, "property failed, shrinking");
        let (minimal, reason, shrinks) = self.shrink(inputs, reason)?;
        Ok(Details {
            inputs: members(minimal.value()),
            failure: Some(reason),
            shrinks,
        })
    }

    /// Run the configured number of iterations.
    pub fn check(&self, config: &Config) -> Result<TestResult> {
        let seed = config.seed.unwrap_or_else(random_seed);
        let mut source = RandomSource::from_u64(seed);
        let property = self
            .clone()
            .with_shrink_limit(self.shrink_limit.min(config.shrink_limit));
        debug!(seed, tests = config.test_limit, "checking property");

        for index in 0..config.test_limit {
            let bias = Bias::for_iteration(index, config.test_limit);
            let details = property.evaluate(&mut source.split(), bias)?;
            if let Some(reason) = details.failure {
                debug!(iteration = index + 1, shrinks = details.shrinks, "counterexample found");
                let result = TestResult::Fail {
                    inputs: render(&details.inputs),
                    reason,
                    iteration: index + 1,
                    shrinks_performed: details.shrinks,
                    seed,
                    property_name: None,
                };
                return Ok(result.named(self.name.clone()));
            }
        }

        debug!(tests = config.test_limit, "property passed");
        Ok(TestResult::Pass {
            tests_run: config.test_limit,
            property_name: None,
        }
        .named(self.name.clone()))
    }

    fn generate(&self, source: &mut RandomSource, bias: Bias) -> Result<Arbitrary> {
        let elements = self
            .generators
            .iter()
            .zip(&self.parameters)
            .enumerate()
            .map(|(index, (generator, parameter))| {
                generator
                    .generate(parameter, bias, &mut source.split())
                    .map_err(|err| Error::generation(format!("input {index}"), err))
            })
            .collect::<Result<Vec<_>>>()?;
        let template = Value::Tuple(elements.iter().map(|e| e.value().clone()).collect());
        Ok(Arbitrary::composite(template, elements).with_shrinker(Some(Shrinker::elements())))
    }

    fn verdict(&self, inputs: &Arbitrary) -> Result<Option<String>> {
        (self.predicate)(members(inputs.value()))
    }

    /// Drive the aggregate shrinker until it is exhausted or the shrink limit
    /// is reached. Returns the smallest failing inputs and their reason.
    fn shrink(&self, failing: Arbitrary, reason: String) -> Result<(Arbitrary, String, usize)> {
        let mut state = failing.shrinker().cloned();
        let mut candidate = failing.clone();
        let mut last = (failing, reason);
        let mut failed = true;
        let mut steps = 0;

        while let Some(shrinker) = state.take() {
            if steps >= self.shrink_limit {
                warn!(limit = self.shrink_limit, "shrink limit reached before the shrinker was exhausted");
                return Ok((last.0, last.1, steps));
            }
            let step = shrinker
                .shrink(candidate, failed)
                .map_err(|err| Error::shrinking(format!("shrink step {}", steps + 1), err))?;
            candidate = step.candidate;
            state = step.next;
            if state.is_none() {
                break;
            }
            steps += 1;
            match self
                .verdict(&candidate)
                .map_err(|err| Error::shrinking(format!("shrink step {steps}"), err))?
            {
                Some(reason) => {
                    trace!(step = steps, candidate = %encode(candidate.value()), "candidate failed");
                    failed = true;
                    last = (candidate.clone(), reason);
                }
                None => {
                    trace!(step = steps, candidate = %encode(candidate.value()), "candidate passed");
                    failed = false;
                }
            }
        }

        // The exhausted shrinker hands back the last failing value; it only
        // needs evaluating when it was never offered as a candidate.
        if candidate.value() != last.0.value() {
            if let Some(reason) = self
                .verdict(&candidate)
                .map_err(|err| Error::shrinking("final candidate", err))?
            {
                return Ok((candidate, reason, steps));
            }
        }
        Ok((last.0, last.1, steps))
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("generators", &self.generators)
            .field("parameters", &self.parameters)
            .field("shrink_limit", &self.shrink_limit)
            .finish()
    }
}

fn members(value: &Value) -> Vec<Value> {
    match value {
        Value::Tuple(members) => members.clone(),
        other => vec![other.clone()],
    }
}

/// Define a property; shorthand for [`Property::define`].
pub fn for_all<Args, P>(generators: Vec<Generator>, predicate: P) -> Result<Property>
where
    P: Predicate<Args>,
{
    Property::define(generators, predicate)
}

/// Define and check a property in one call.
pub fn check<Args, P>(generators: Vec<Generator>, predicate: P, config: &Config) -> Result<TestResult>
where
    P: Predicate<Args>,
{
    Property::define(generators, predicate)?.check(config)
}

/// Feed `config.test_limit` generated input tuples to `callback`.
///
/// Nothing is shrunk and the callback's return value is ignored; use this to
/// print or collect example values. The callback's arity must match the
/// number of generators.
pub fn stream<Args, P>(generators: Vec<Generator>, callback: P, config: &Config) -> Result<()>
where
    P: Predicate<Args>,
{
    let property = Property::define(generators, callback)?;
    let mut source = RandomSource::from_u64(config.seed.unwrap_or_else(random_seed));
    for index in 0..config.test_limit {
        let bias = Bias::for_iteration(index, config.test_limit);
        let inputs = property.generate(&mut source.split(), bias)?;
        property.verdict(&inputs)?;
    }
    Ok(())
}
