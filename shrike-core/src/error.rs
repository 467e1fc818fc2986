//! Error and outcome types for Shrike property-based testing.

use crate::report::RenderedInput;
use crate::types::Kind;
use std::fmt;
use thiserror::Error;

/// Main error type for Shrike.
///
/// A predicate counterexample is never an `Error`; it is reported through
/// [`TestResult::Fail`]. Errors are reserved for wiring mistakes and failures
/// that abort a run.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// A constraint was built with `min > max`.
    #[error("Invalid range: min {min} is greater than max {max}")]
    InvalidRange { min: String, max: String },

    /// A weight table contained a zero weight or its sum overflowed.
    #[error("Invalid weights: {message}")]
    InvalidWeights { message: String },

    /// A function or predicate was wired with the wrong number of parameters.
    #[error("{context}: expected {expected} parameter(s), found {actual}")]
    Arity {
        context: String,
        expected: usize,
        actual: usize,
    },

    /// A function or predicate parameter has the wrong type.
    #[error("{context}: parameter {index} expects {expected}, found {actual}")]
    ParameterType {
        context: String,
        index: usize,
        expected: String,
        actual: String,
    },

    /// A generator or shrinker was asked for a type it cannot produce.
    #[error("{component} cannot produce {actual}: expected {expected}")]
    TargetMismatch {
        component: &'static str,
        expected: String,
        actual: String,
    },

    /// No default generator is registered for a kind.
    #[error("No default generator registered for kind {kind}")]
    UnsupportedKind { kind: Kind },

    /// A filtered generator rejected every candidate it was allowed to draw.
    #[error("Filter rejected {attempts} consecutive values")]
    FilterExhausted { attempts: usize },

    /// A value could not be converted into the requested Rust type.
    #[error("Cannot convert {actual} into {expected}")]
    Conversion { expected: String, actual: String },

    /// A user supplied function reported an error.
    #[error("{message}")]
    Function { message: String },

    /// A nested generator failed.
    #[error("{context}: {source}")]
    Generation {
        context: String,
        #[source]
        source: Box<Error>,
    },

    /// A nested shrinker failed.
    #[error("{context}: {source}")]
    Shrinking {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wrap a generation failure with context.
    pub fn generation(context: impl Into<String>, source: Error) -> Self {
        Error::Generation {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Wrap a shrinking failure with context.
    pub fn shrinking(context: impl Into<String>, source: Error) -> Self {
        Error::Shrinking {
            context: context.into(),
            source: Box::new(source),
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Error::InvalidConfig {
            message: message.into(),
        }
    }

    pub(crate) fn mismatch(
        component: &'static str,
        expected: impl fmt::Display,
        actual: impl fmt::Display,
    ) -> Self {
        Error::TargetMismatch {
            component,
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    pub(crate) fn conversion(expected: impl fmt::Display, actual: impl fmt::Display) -> Self {
        Error::Conversion {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// True for errors caused by wiring rather than by a failing nested run.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::InvalidConfig { .. }
                | Error::InvalidRange { .. }
                | Error::InvalidWeights { .. }
                | Error::Arity { .. }
                | Error::ParameterType { .. }
                | Error::TargetMismatch { .. }
                | Error::UnsupportedKind { .. }
        )
    }
}

/// Result type for Shrike operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Outcome of checking a property.
#[derive(Debug, Clone, PartialEq)]
pub enum TestResult {
    /// Every iteration passed.
    Pass {
        tests_run: usize,
        property_name: Option<String>,
    },

    /// The predicate failed; `inputs` holds the minimal counterexample.
    Fail {
        inputs: Vec<RenderedInput>,
        reason: String,
        /// One-based iteration at which the first failure was observed.
        iteration: usize,
        shrinks_performed: usize,
        seed: u64,
        property_name: Option<String>,
    },
}

impl TestResult {
    pub fn is_pass(&self) -> bool {
        matches!(self, TestResult::Pass { .. })
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, TestResult::Fail { .. })
    }

    pub(crate) fn named(mut self, name: Option<String>) -> Self {
        match &mut self {
            TestResult::Pass { property_name, .. } | TestResult::Fail { property_name, .. } => {
                *property_name = name
            }
        }
        self
    }
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestResult::Pass {
                tests_run,
                property_name,
            } => {
                let prop_name = property_name.as_deref().unwrap_or("property");
                write!(f, "  ✓ {} passed {} tests.", prop_name, tests_run)
            }
            TestResult::Fail {
                inputs,
                reason,
                iteration,
                shrinks_performed,
                seed,
                property_name,
            } => {
                let prop_name = property_name.as_deref().unwrap_or("property");
                writeln!(
                    f,
                    "  ✗ {} failed after {} tests and {} shrinks.",
                    prop_name, iteration, shrinks_performed
                )?;
                writeln!(f)?;
                writeln!(f, "    Minimal counterexample:")?;
                for (index, input) in inputs.iter().enumerate() {
                    writeln!(f, "      │ #{} {}", index, input)?;
                }
                writeln!(f)?;
                writeln!(f, "    === {} ===", reason)?;
                write!(f, "    Replay with seed {}", seed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_errors_keep_their_source() {
        let err = Error::generation(
            "input 0",
            Error::FilterExhausted { attempts: 10 },
        );
        assert_eq!(
            err.to_string(),
            "input 0: Filter rejected 10 consecutive values"
        );
        assert!(std::error::Error::source(&err).is_some());
        assert!(!err.is_configuration());
    }

    #[test]
    fn failure_display_lists_inputs_and_seed() {
        let result = TestResult::Fail {
            inputs: vec![RenderedInput {
                type_name: "u64".to_string(),
                value: "101".to_string(),
            }],
            reason: "predicate returned false".to_string(),
            iteration: 3,
            shrinks_performed: 9,
            seed: 42,
            property_name: Some("bounded".to_string()),
        };
        let text = result.to_string();
        assert!(text.contains("✗ bounded failed after 3 tests and 9 shrinks."));
        assert!(text.contains("│ #0 u64 = 101"));
        assert!(text.contains("Replay with seed 42"));
        archetype::snap("failure_display", text);
    }
}
