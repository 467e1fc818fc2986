//! Shrike property-based testing library.
//!
//! This is the main entry point for the Shrike library, providing
//! a convenient API for property-based testing in Rust.
//!
//! ```
//! use shrike::{check, gen, Config, Range, TestResult};
//!
//! let result = check(
//!     vec![gen::unsigned(Range::new(0u64, 1000).unwrap())],
//!     |x: u64| x <= 100,
//!     &Config::default().with_seed(1),
//! )
//! .unwrap();
//! assert!(matches!(result, TestResult::Fail { .. }));
//! ```

pub use shrike_core::*;

// Re-export derive macros when available
#[cfg(feature = "derive")]
pub use shrike_derive::*;
