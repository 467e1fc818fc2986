//! Conversions between Rust types and [`Value`]s.

use crate::error::{Error, Result};
use crate::report::encode;
use crate::types::Type;
use crate::value::{Channel, Func, Value};
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

/// A Rust type with a static [`Type`] descriptor.
pub trait Typed {
    fn type_of() -> Type;
}

/// Extract a Rust value from a [`Value`].
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self>;
}

/// Wrap a Rust value as a [`Value`].
pub trait IntoValue {
    fn into_value(self) -> Value;
}

macro_rules! impl_scalar {
    ($($rust:ty => $variant:ident),* $(,)?) => {
        $(
            impl Typed for $rust {
                fn type_of() -> Type {
                    Type::$variant
                }
            }

            impl FromValue for $rust {
                fn from_value(value: Value) -> Result<Self> {
                    match value {
                        Value::$variant(v) => Ok(v),
                        other => Err(Error::conversion(Type::$variant, other.type_of())),
                    }
                }
            }

            impl IntoValue for $rust {
                fn into_value(self) -> Value {
                    Value::$variant(self)
                }
            }
        )*
    };
}

impl_scalar! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    usize => Usize,
    f32 => F32,
    f64 => F64,
    char => Char,
    String => String,
}

impl<T: Typed> Typed for Vec<T> {
    fn type_of() -> Type {
        Type::slice(T::type_of())
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Slice { items, .. } => items.into_iter().map(T::from_value).collect(),
            other => Err(Error::conversion("Vec", other.type_of())),
        }
    }
}

impl<T: IntoValue + Typed> IntoValue for Vec<T> {
    fn into_value(self) -> Value {
        Value::Slice {
            element: T::type_of(),
            items: self.into_iter().map(IntoValue::into_value).collect(),
        }
    }
}

impl<T: Typed, const N: usize> Typed for [T; N] {
    fn type_of() -> Type {
        Type::array(T::type_of(), N)
    }
}

impl<T: FromValue, const N: usize> FromValue for [T; N] {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Array { items, element } if items.len() == N => {
                let actual = Type::array(element, N);
                let items = items
                    .into_iter()
                    .map(T::from_value)
                    .collect::<Result<Vec<T>>>()?;
                items
                    .try_into()
                    .map_err(|_| Error::conversion(format!("array of {N}"), actual))
            }
            other => Err(Error::conversion(format!("array of {N}"), other.type_of())),
        }
    }
}

impl<T: IntoValue + Typed, const N: usize> IntoValue for [T; N] {
    fn into_value(self) -> Value {
        Value::Array {
            element: T::type_of(),
            items: self.into_iter().map(IntoValue::into_value).collect(),
        }
    }
}

impl<T: Typed> Typed for Option<T> {
    fn type_of() -> Type {
        Type::optional(T::type_of())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Optional { value, .. } => value.map(|v| T::from_value(*v)).transpose(),
            other => Err(Error::conversion("Option", other.type_of())),
        }
    }
}

impl<T: IntoValue + Typed> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        Value::Optional {
            inner: T::type_of(),
            value: self.map(|v| Box::new(v.into_value())),
        }
    }
}

impl<K: Typed, V: Typed> Typed for BTreeMap<K, V> {
    fn type_of() -> Type {
        Type::map(K::type_of(), V::type_of())
    }
}

impl<K: FromValue + Ord, V: FromValue> FromValue for BTreeMap<K, V> {
    fn from_value(value: Value) -> Result<Self> {
        map_entries(value)?
            .into_iter()
            .map(|(k, v)| Ok((K::from_value(k)?, V::from_value(v)?)))
            .collect()
    }
}

impl<K: IntoValue + Typed, V: IntoValue + Typed> IntoValue for BTreeMap<K, V> {
    fn into_value(self) -> Value {
        Value::Map {
            key: K::type_of(),
            value: V::type_of(),
            entries: self
                .into_iter()
                .map(|(k, v)| (k.into_value(), v.into_value()))
                .collect(),
        }
    }
}

impl<K: Typed, V: Typed> Typed for HashMap<K, V> {
    fn type_of() -> Type {
        Type::map(K::type_of(), V::type_of())
    }
}

impl<K: FromValue + Eq + Hash, V: FromValue> FromValue for HashMap<K, V> {
    fn from_value(value: Value) -> Result<Self> {
        map_entries(value)?
            .into_iter()
            .map(|(k, v)| Ok((K::from_value(k)?, V::from_value(v)?)))
            .collect()
    }
}

impl<K: IntoValue + Typed, V: IntoValue + Typed> IntoValue for HashMap<K, V> {
    /// Entries are ordered by their encoded key so the result does not depend
    /// on hash iteration order.
    fn into_value(self) -> Value {
        let mut entries: Vec<(Value, Value)> = self
            .into_iter()
            .map(|(k, v)| (k.into_value(), v.into_value()))
            .collect();
        entries.sort_by_cached_key(|(k, _)| encode(k));
        Value::Map {
            key: K::type_of(),
            value: V::type_of(),
            entries,
        }
    }
}

fn map_entries(value: Value) -> Result<Vec<(Value, Value)>> {
    match value {
        Value::Map { entries, .. } => Ok(entries),
        other => Err(Error::conversion("map", other.type_of())),
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl FromValue for Func {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Function(func) => Ok(func),
            other => Err(Error::conversion("function", other.type_of())),
        }
    }
}

impl IntoValue for Func {
    fn into_value(self) -> Value {
        Value::Function(self)
    }
}

impl FromValue for Channel {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Channel(chan) => Ok(chan),
            other => Err(Error::conversion("channel", other.type_of())),
        }
    }
}

impl IntoValue for Channel {
    fn into_value(self) -> Value {
        Value::Channel(self)
    }
}

macro_rules! impl_tuple {
    ($(($($name:ident),+)),* $(,)?) => {
        $(
            impl<$($name: Typed),+> Typed for ($($name,)+) {
                fn type_of() -> Type {
                    Type::Tuple(vec![$($name::type_of()),+])
                }
            }

            impl<$($name: FromValue),+> FromValue for ($($name,)+) {
                #[allow(non_snake_case)]
                fn from_value(value: Value) -> Result<Self> {
                    let expected = [$(stringify!($name)),+].len();
                    match value {
                        Value::Tuple(members) if members.len() == expected => {
                            let mut members = members.into_iter();
                            $(
                                let $name = match members.next() {
                                    Some(member) => $name::from_value(member)?,
                                    None => return Err(Error::conversion("tuple", "short tuple")),
                                };
                            )+
                            Ok(($($name,)+))
                        }
                        other => Err(Error::conversion(
                            format!("tuple of {expected}"),
                            other.type_of(),
                        )),
                    }
                }
            }

            impl<$($name: IntoValue),+> IntoValue for ($($name,)+) {
                #[allow(non_snake_case)]
                fn into_value(self) -> Value {
                    let ($($name,)+) = self;
                    Value::Tuple(vec![$($name.into_value()),+])
                }
            }
        )*
    };
}

impl_tuple! {
    (A),
    (A, B),
    (A, B, C),
    (A, B, C, D),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_containers_convert_both_ways() {
        let original: Vec<Option<[u8; 2]>> = vec![Some([1, 2]), None];
        let value = original.clone().into_value();
        assert_eq!(
            value.type_of().to_string(),
            "Vec<Option<[u8; 2]>>"
        );
        let back: Vec<Option<[u8; 2]>> = Vec::from_value(value).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn empty_vec_keeps_element_type() {
        let value = Vec::<String>::new().into_value();
        assert_eq!(value.type_of(), Vec::<String>::type_of());
    }

    #[test]
    fn hash_map_entries_are_ordered() {
        let mut map = HashMap::new();
        for k in [30u8, 10, 20] {
            map.insert(k, k as u64);
        }
        let Value::Map { entries, .. } = map.into_value() else {
            panic!("expected a map");
        };
        let keys: Vec<Value> = entries.into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![Value::U8(10), Value::U8(20), Value::U8(30)]);
    }

    #[test]
    fn wrong_type_is_a_conversion_error() {
        let err = u32::from_value(Value::I32(4)).unwrap_err();
        assert!(matches!(err, Error::Conversion { .. }));
        assert!(<(u8, bool)>::from_value(Value::Tuple(vec![Value::U8(1)])).is_err());
    }
}
