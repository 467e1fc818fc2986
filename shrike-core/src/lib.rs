//! Core functionality for Shrike property-based testing.
//!
//! This crate provides the generation and shrinking engine: constraint
//! records, the dynamic value model, generators, shrinkers and the property
//! loop that ties them together.

pub mod arbitrary;
pub mod constraints;
pub mod convert;
pub mod data;
pub mod error;
pub mod gen;
pub mod property;
pub mod registry;
pub mod report;
pub mod shrink;
pub mod types;
pub mod value;

// Re-export the main types
pub use arbitrary::Arbitrary;
pub use constraints::{CodePointRange, LengthRange, Range, Weights};
pub use convert::{FromValue, IntoValue, Typed};
pub use data::{random_seed, Bias, Config, RandomSource};
pub use error::{Error, Result, TestResult};
pub use gen::{Binder, Generator};
pub use property::{check, for_all, stream, Details, IntoVerdict, Predicate, Property, Verdict};
pub use registry::Registry;
pub use report::RenderedInput;
pub use shrink::{Shrinker, Shrunk};
pub use types::{Field, Kind, RecordType, Signature, Type};
pub use value::{Channel, Func, Value};
