//! Default generators keyed by type kind.

use crate::constraints::{CodePointRange, LengthRange, Range};
use crate::error::{Error, Result};
use crate::gen::{self, Generator};
use crate::types::{Kind, Type};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Builds the default generator for a target. The second argument is the
/// generator to use for nested values, so composites keep resolving through
/// the same registry.
pub type Constructor = Arc<dyn Fn(&Type, &Generator) -> Result<Generator> + Send + Sync>;

/// Maps each [`Kind`] to a default generator constructor.
#[derive(Clone, Default)]
pub struct Registry {
    entries: HashMap<Kind, Constructor>,
}

impl Registry {
    /// An empty registry; every lookup fails.
    pub fn new() -> Self {
        Registry::default()
    }

    /// The shared registry covering every kind.
    pub fn standard() -> Arc<Registry> {
        static STANDARD: OnceLock<Arc<Registry>> = OnceLock::new();
        STANDARD.get_or_init(|| Arc::new(Registry::builtin())).clone()
    }

    /// Install (or replace) the constructor for `kind`.
    pub fn register<F>(&mut self, kind: Kind, constructor: F)
    where
        F: Fn(&Type, &Generator) -> Result<Generator> + Send + Sync + 'static,
    {
        self.entries.insert(kind, Arc::new(constructor));
    }

    pub fn with<F>(mut self, kind: Kind, constructor: F) -> Self
    where
        F: Fn(&Type, &Generator) -> Result<Generator> + Send + Sync + 'static,
    {
        self.register(kind, constructor);
        self
    }

    pub fn contains(&self, kind: Kind) -> bool {
        self.entries.contains_key(&kind)
    }

    /// The default generator for `target`, with nested values resolved
    /// through the standard registry.
    pub fn resolve(&self, target: &Type) -> Result<Generator> {
        self.resolve_with(target, &Generator::Any(None))
    }

    pub(crate) fn resolve_with(&self, target: &Type, nested: &Generator) -> Result<Generator> {
        let kind = target.kind();
        match self.entries.get(&kind) {
            Some(constructor) => constructor(target, nested),
            None => Err(Error::UnsupportedKind { kind }),
        }
    }

    fn builtin() -> Registry {
        let mut registry = Registry::new();
        registry.register(Kind::Bool, |_, _| Ok(gen::bool()));
        registry.register(Kind::I8, |_, _| Ok(gen::signed(Range::<i8>::full())));
        registry.register(Kind::I16, |_, _| Ok(gen::signed(Range::<i16>::full())));
        registry.register(Kind::I32, |_, _| Ok(gen::signed(Range::<i32>::full())));
        registry.register(Kind::I64, |_, _| Ok(gen::signed(Range::<i64>::full())));
        registry.register(Kind::Isize, |_, _| Ok(gen::signed(Range::<isize>::full())));
        registry.register(Kind::U8, |_, _| Ok(gen::unsigned(Range::<u8>::full())));
        registry.register(Kind::U16, |_, _| Ok(gen::unsigned(Range::<u16>::full())));
        registry.register(Kind::U32, |_, _| Ok(gen::unsigned(Range::<u32>::full())));
        registry.register(Kind::U64, |_, _| Ok(gen::unsigned(Range::<u64>::full())));
        registry.register(Kind::Usize, |_, _| Ok(gen::unsigned(Range::<usize>::full())));
        registry.register(Kind::F32, |_, _| Ok(gen::float32(Range::full())));
        registry.register(Kind::F64, |_, _| Ok(gen::float64(Range::full())));
        registry.register(Kind::Char, |_, _| Ok(gen::rune(CodePointRange::default())));
        registry.register(Kind::String, |_, _| {
            Ok(gen::string(CodePointRange::default(), LengthRange::default()))
        });
        registry.register(Kind::Array, |_, nested| Ok(gen::array(nested.clone())));
        registry.register(Kind::Slice, |_, nested| {
            Ok(gen::slice(nested.clone(), LengthRange::default()))
        });
        registry.register(Kind::Map, |_, nested| {
            Ok(gen::map(nested.clone(), nested.clone(), LengthRange::default()))
        });
        registry.register(Kind::Optional, |_, nested| Ok(gen::optional(nested.clone())));
        registry.register(Kind::Record, |target, nested| match target {
            Type::Record(record) => Ok(gen::record(vec![Some(nested.clone()); record.fields.len()])),
            _ => Err(Error::mismatch("record default", "a record", target)),
        });
        registry.register(Kind::Tuple, |target, nested| match target {
            Type::Tuple(members) => Ok(gen::tuple(vec![nested.clone(); members.len()])),
            _ => Err(Error::mismatch("tuple default", "a tuple", target)),
        });
        registry.register(Kind::Function, |target, nested| match target {
            Type::Function(signature) => Ok(gen::function_with(vec![
                nested.clone();
                signature.outputs.len()
            ])),
            _ => Err(Error::mismatch("function default", "a function", target)),
        });
        registry.register(Kind::Channel, |_, nested| {
            Ok(gen::channel(nested.clone(), LengthRange::default()))
        });
        registry
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<String> = self.entries.keys().map(Kind::to_string).collect();
        kinds.sort();
        f.debug_struct("Registry").field("kinds", &kinds).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Bias, RandomSource};
    use crate::value::Value;

    #[test]
    fn standard_registry_covers_every_kind() {
        let registry = Registry::standard();
        for kind in Kind::ALL {
            assert!(registry.contains(kind), "missing {kind}");
        }
    }

    #[test]
    fn missing_kinds_are_reported() {
        let err = Registry::new().resolve(&Type::U8).unwrap_err();
        assert!(matches!(err, Error::UnsupportedKind { kind: Kind::U8 }));
        assert!(err.to_string().contains("u8"));
    }

    #[test]
    fn custom_registries_reach_nested_values() {
        let registry = Arc::new(
            Registry::standard()
                .as_ref()
                .clone()
                .with(Kind::U64, |_, _| Ok(gen::constant(9u64))),
        );
        let target = Type::slice(Type::U64);
        let mut source = RandomSource::from_u64(4);
        let arb = gen::any_from(registry)
            .generate(&target, Bias::full(), &mut source)
            .unwrap();
        assert!(arb.elements().iter().all(|e| e.value() == &Value::U64(9)));
    }
}
