//! Type descriptors for generated values.
//!
//! A [`Type`] fully describes the runtime shape of a [`Value`](crate::Value):
//! empty collections still know their element type, records know their field
//! names, and functions carry their signature.

use std::fmt;
use std::sync::Arc;

/// The closed set of type kinds the engine knows how to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    Isize,
    U8,
    U16,
    U32,
    U64,
    Usize,
    F32,
    F64,
    Char,
    String,
    Array,
    Slice,
    Map,
    Optional,
    Record,
    Function,
    Channel,
    Tuple,
}

impl Kind {
    pub const ALL: [Kind; 23] = [
        Kind::Bool,
        Kind::I8,
        Kind::I16,
        Kind::I32,
        Kind::I64,
        Kind::Isize,
        Kind::U8,
        Kind::U16,
        Kind::U32,
        Kind::U64,
        Kind::Usize,
        Kind::F32,
        Kind::F64,
        Kind::Char,
        Kind::String,
        Kind::Array,
        Kind::Slice,
        Kind::Map,
        Kind::Optional,
        Kind::Record,
        Kind::Function,
        Kind::Channel,
        Kind::Tuple,
    ];

    pub fn is_unsigned(self) -> bool {
        matches!(
            self,
            Kind::U8 | Kind::U16 | Kind::U32 | Kind::U64 | Kind::Usize
        )
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            Kind::I8 | Kind::I16 | Kind::I32 | Kind::I64 | Kind::Isize
        )
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Bool => "bool",
            Kind::I8 => "i8",
            Kind::I16 => "i16",
            Kind::I32 => "i32",
            Kind::I64 => "i64",
            Kind::Isize => "isize",
            Kind::U8 => "u8",
            Kind::U16 => "u16",
            Kind::U32 => "u32",
            Kind::U64 => "u64",
            Kind::Usize => "usize",
            Kind::F32 => "f32",
            Kind::F64 => "f64",
            Kind::Char => "char",
            Kind::String => "string",
            Kind::Array => "array",
            Kind::Slice => "slice",
            Kind::Map => "map",
            Kind::Optional => "optional",
            Kind::Record => "record",
            Kind::Function => "function",
            Kind::Channel => "channel",
            Kind::Tuple => "tuple",
        };
        f.write_str(name)
    }
}

/// A named field of a record type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    pub name: String,
    pub ty: Type,
}

/// A record (named struct) type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordType {
    pub name: String,
    pub fields: Vec<Field>,
}

impl RecordType {
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }
}

/// A function signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    pub inputs: Vec<Type>,
    pub outputs: Vec<Type>,
}

/// A type descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Bool,
    I8,
    I16,
    I32,
    I64,
    Isize,
    U8,
    U16,
    U32,
    U64,
    Usize,
    F32,
    F64,
    Char,
    String,
    Array(Box<Type>, usize),
    Slice(Box<Type>),
    Map(Box<Type>, Box<Type>),
    Optional(Box<Type>),
    Record(Arc<RecordType>),
    Function(Arc<Signature>),
    Channel(Box<Type>),
    Tuple(Vec<Type>),
}

impl Type {
    pub fn array(element: Type, len: usize) -> Type {
        Type::Array(Box::new(element), len)
    }

    pub fn slice(element: Type) -> Type {
        Type::Slice(Box::new(element))
    }

    pub fn map(key: Type, value: Type) -> Type {
        Type::Map(Box::new(key), Box::new(value))
    }

    pub fn optional(inner: Type) -> Type {
        Type::Optional(Box::new(inner))
    }

    pub fn record<N: Into<String>>(name: &str, fields: Vec<(N, Type)>) -> Type {
        Type::Record(Arc::new(RecordType {
            name: name.to_string(),
            fields: fields
                .into_iter()
                .map(|(name, ty)| Field {
                    name: name.into(),
                    ty,
                })
                .collect(),
        }))
    }

    pub fn function(inputs: Vec<Type>, outputs: Vec<Type>) -> Type {
        Type::Function(Arc::new(Signature { inputs, outputs }))
    }

    pub fn channel(element: Type) -> Type {
        Type::Channel(Box::new(element))
    }

    pub fn kind(&self) -> Kind {
        match self {
            Type::Bool => Kind::Bool,
            Type::I8 => Kind::I8,
            Type::I16 => Kind::I16,
            Type::I32 => Kind::I32,
            Type::I64 => Kind::I64,
            Type::Isize => Kind::Isize,
            Type::U8 => Kind::U8,
            Type::U16 => Kind::U16,
            Type::U32 => Kind::U32,
            Type::U64 => Kind::U64,
            Type::Usize => Kind::Usize,
            Type::F32 => Kind::F32,
            Type::F64 => Kind::F64,
            Type::Char => Kind::Char,
            Type::String => Kind::String,
            Type::Array(..) => Kind::Array,
            Type::Slice(_) => Kind::Slice,
            Type::Map(..) => Kind::Map,
            Type::Optional(_) => Kind::Optional,
            Type::Record(_) => Kind::Record,
            Type::Function(_) => Kind::Function,
            Type::Channel(_) => Kind::Channel,
            Type::Tuple(_) => Kind::Tuple,
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, types: &[Type]) -> fmt::Result {
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{ty}")?;
    }
    Ok(())
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::String => f.write_str("String"),
            Type::Array(element, len) => write!(f, "[{element}; {len}]"),
            Type::Slice(element) => write!(f, "Vec<{element}>"),
            Type::Map(key, value) => write!(f, "Map<{key}, {value}>"),
            Type::Optional(inner) => write!(f, "Option<{inner}>"),
            Type::Record(record) => f.write_str(&record.name),
            Type::Function(signature) => {
                f.write_str("fn(")?;
                write_list(f, &signature.inputs)?;
                f.write_str(")")?;
                match signature.outputs.as_slice() {
                    [] => Ok(()),
                    [single] => write!(f, " -> {single}"),
                    many => {
                        f.write_str(" -> (")?;
                        write_list(f, many)?;
                        f.write_str(")")
                    }
                }
            }
            Type::Channel(element) => write!(f, "Channel<{element}>"),
            Type::Tuple(members) => {
                f.write_str("(")?;
                write_list(f, members)?;
                if members.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
            scalar => write!(f, "{}", scalar.kind()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_reads_like_rust() {
        assert_eq!(Type::slice(Type::U64).to_string(), "Vec<u64>");
        assert_eq!(Type::array(Type::Char, 4).to_string(), "[char; 4]");
        assert_eq!(
            Type::map(Type::String, Type::optional(Type::I8)).to_string(),
            "Map<String, Option<i8>>"
        );
        assert_eq!(
            Type::function(vec![Type::U8, Type::Bool], vec![Type::F64]).to_string(),
            "fn(u8, bool) -> f64"
        );
        assert_eq!(Type::Tuple(vec![Type::U8]).to_string(), "(u8,)");
    }

    #[test]
    fn records_compare_structurally() {
        let a = Type::record("Point", vec![("x", Type::U64), ("y", Type::U64)]);
        let b = Type::record("Point", vec![("x", Type::U64), ("y", Type::U64)]);
        assert_eq!(a, b);
        assert_eq!(a.kind(), Kind::Record);
        assert_eq!(a.to_string(), "Point");
    }
}
