//! Type-erased generated values.

use crate::convert::{FromValue, IntoValue, Typed};
use crate::error::{Error, Result};
use crate::types::{Kind, RecordType, Signature, Type};
use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A generated datum that knows its own [`Type`].
///
/// Equality is structural. Floats compare by bit pattern, so `NaN == NaN`
/// and `0.0 != -0.0`; functions and channels compare by identity.
#[derive(Debug, Clone)]
pub enum Value {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Isize(isize),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Usize(usize),
    F32(f32),
    F64(f64),
    Char(char),
    String(String),
    Array { element: Type, items: Vec<Value> },
    Slice { element: Type, items: Vec<Value> },
    Map {
        key: Type,
        value: Type,
        entries: Vec<(Value, Value)>,
    },
    Optional { inner: Type, value: Option<Box<Value>> },
    Record { ty: Arc<RecordType>, fields: Vec<Value> },
    Function(Func),
    Channel(Channel),
    Tuple(Vec<Value>),
}

impl Value {
    /// The runtime type of this value.
    pub fn type_of(&self) -> Type {
        match self {
            Value::Bool(_) => Type::Bool,
            Value::I8(_) => Type::I8,
            Value::I16(_) => Type::I16,
            Value::I32(_) => Type::I32,
            Value::I64(_) => Type::I64,
            Value::Isize(_) => Type::Isize,
            Value::U8(_) => Type::U8,
            Value::U16(_) => Type::U16,
            Value::U32(_) => Type::U32,
            Value::U64(_) => Type::U64,
            Value::Usize(_) => Type::Usize,
            Value::F32(_) => Type::F32,
            Value::F64(_) => Type::F64,
            Value::Char(_) => Type::Char,
            Value::String(_) => Type::String,
            Value::Array { element, items } => Type::array(element.clone(), items.len()),
            Value::Slice { element, .. } => Type::slice(element.clone()),
            Value::Map { key, value, .. } => Type::map(key.clone(), value.clone()),
            Value::Optional { inner, .. } => Type::optional(inner.clone()),
            Value::Record { ty, .. } => Type::Record(ty.clone()),
            Value::Function(func) => Type::Function(func.signature.clone()),
            Value::Channel(chan) => Type::channel(chan.element.clone()),
            Value::Tuple(members) => Type::Tuple(members.iter().map(Value::type_of).collect()),
        }
    }

    pub fn kind(&self) -> Kind {
        match self {
            Value::Bool(_) => Kind::Bool,
            Value::I8(_) => Kind::I8,
            Value::I16(_) => Kind::I16,
            Value::I32(_) => Kind::I32,
            Value::I64(_) => Kind::I64,
            Value::Isize(_) => Kind::Isize,
            Value::U8(_) => Kind::U8,
            Value::U16(_) => Kind::U16,
            Value::U32(_) => Kind::U32,
            Value::U64(_) => Kind::U64,
            Value::Usize(_) => Kind::Usize,
            Value::F32(_) => Kind::F32,
            Value::F64(_) => Kind::F64,
            Value::Char(_) => Kind::Char,
            Value::String(_) => Kind::String,
            Value::Array { .. } => Kind::Array,
            Value::Slice { .. } => Kind::Slice,
            Value::Map { .. } => Kind::Map,
            Value::Optional { .. } => Kind::Optional,
            Value::Record { .. } => Kind::Record,
            Value::Function(_) => Kind::Function,
            Value::Channel(_) => Kind::Channel,
            Value::Tuple(_) => Kind::Tuple,
        }
    }

    /// The zero value of a type: numeric zero, empty collections, absent
    /// optionals, and functions returning zero values.
    pub fn zero(ty: &Type) -> Value {
        match ty {
            Type::Bool => Value::Bool(false),
            Type::I8 => Value::I8(0),
            Type::I16 => Value::I16(0),
            Type::I32 => Value::I32(0),
            Type::I64 => Value::I64(0),
            Type::Isize => Value::Isize(0),
            Type::U8 => Value::U8(0),
            Type::U16 => Value::U16(0),
            Type::U32 => Value::U32(0),
            Type::U64 => Value::U64(0),
            Type::Usize => Value::Usize(0),
            Type::F32 => Value::F32(0.0),
            Type::F64 => Value::F64(0.0),
            Type::Char => Value::Char('\0'),
            Type::String => Value::String(String::new()),
            Type::Array(element, len) => Value::Array {
                element: (**element).clone(),
                items: vec![Value::zero(element); *len],
            },
            Type::Slice(element) => Value::Slice {
                element: (**element).clone(),
                items: Vec::new(),
            },
            Type::Map(key, value) => Value::Map {
                key: (**key).clone(),
                value: (**value).clone(),
                entries: Vec::new(),
            },
            Type::Optional(inner) => Value::Optional {
                inner: (**inner).clone(),
                value: None,
            },
            Type::Record(record) => Value::Record {
                ty: record.clone(),
                fields: record.fields.iter().map(|f| Value::zero(&f.ty)).collect(),
            },
            Type::Function(signature) => {
                let outputs: Vec<Value> = signature.outputs.iter().map(Value::zero).collect();
                Value::Function(Func::with_signature(
                    signature.clone(),
                    move |_| Ok(outputs.clone()),
                ))
            }
            Type::Channel(element) => Value::Channel(Channel::new((**element).clone(), 0)),
            Type::Tuple(members) => Value::Tuple(members.iter().map(Value::zero).collect()),
        }
    }

    /// Widen an unsigned integer to `u64`.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::U8(v) => Some(v as u64),
            Value::U16(v) => Some(v as u64),
            Value::U32(v) => Some(v as u64),
            Value::U64(v) => Some(v),
            Value::Usize(v) => Some(v as u64),
            _ => None,
        }
    }

    /// Widen a signed integer to `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::I8(v) => Some(v as i64),
            Value::I16(v) => Some(v as i64),
            Value::I32(v) => Some(v as i64),
            Value::I64(v) => Some(v),
            Value::Isize(v) => Some(v as i64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }

    /// Extract a typed Rust value.
    pub fn to<T: FromValue>(&self) -> Result<T> {
        T::from_value(self.clone())
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Bool(a), Bool(b)) => a == b,
            (I8(a), I8(b)) => a == b,
            (I16(a), I16(b)) => a == b,
            (I32(a), I32(b)) => a == b,
            (I64(a), I64(b)) => a == b,
            (Isize(a), Isize(b)) => a == b,
            (U8(a), U8(b)) => a == b,
            (U16(a), U16(b)) => a == b,
            (U32(a), U32(b)) => a == b,
            (U64(a), U64(b)) => a == b,
            (Usize(a), Usize(b)) => a == b,
            (F32(a), F32(b)) => a.to_bits() == b.to_bits(),
            (F64(a), F64(b)) => a.to_bits() == b.to_bits(),
            (Char(a), Char(b)) => a == b,
            (String(a), String(b)) => a == b,
            (
                Array {
                    element: ea,
                    items: a,
                },
                Array {
                    element: eb,
                    items: b,
                },
            )
            | (
                Slice {
                    element: ea,
                    items: a,
                },
                Slice {
                    element: eb,
                    items: b,
                },
            ) => ea == eb && a == b,
            (
                Map {
                    key: ka,
                    value: va,
                    entries: a,
                },
                Map {
                    key: kb,
                    value: vb,
                    entries: b,
                },
            ) => ka == kb && va == vb && a == b,
            (
                Optional {
                    inner: ia,
                    value: a,
                },
                Optional {
                    inner: ib,
                    value: b,
                },
            ) => ia == ib && a == b,
            (Record { ty: ta, fields: a }, Record { ty: tb, fields: b }) => ta == tb && a == b,
            (Function(a), Function(b)) => a.id == b.id,
            (Channel(a), Channel(b)) => a.id == b.id,
            (Tuple(a), Tuple(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind().hash(state);
        match self {
            Value::Bool(v) => v.hash(state),
            Value::I8(v) => v.hash(state),
            Value::I16(v) => v.hash(state),
            Value::I32(v) => v.hash(state),
            Value::I64(v) => v.hash(state),
            Value::Isize(v) => v.hash(state),
            Value::U8(v) => v.hash(state),
            Value::U16(v) => v.hash(state),
            Value::U32(v) => v.hash(state),
            Value::U64(v) => v.hash(state),
            Value::Usize(v) => v.hash(state),
            Value::F32(v) => v.to_bits().hash(state),
            Value::F64(v) => v.to_bits().hash(state),
            Value::Char(v) => v.hash(state),
            Value::String(v) => v.hash(state),
            Value::Array { items, .. } | Value::Slice { items, .. } => items.hash(state),
            Value::Map { entries, .. } => entries.hash(state),
            Value::Optional { value, .. } => value.hash(state),
            Value::Record { fields, .. } => fields.hash(state),
            Value::Function(func) => func.id.hash(state),
            Value::Channel(chan) => chan.id.hash(state),
            Value::Tuple(members) => members.hash(state),
        }
    }
}

static NEXT_ID: AtomicU64 = AtomicU64::new(1 << 32);

fn fresh_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

type Body = dyn Fn(&[Value]) -> Result<Vec<Value>> + Send + Sync;

/// A first-class function value with a checked signature.
///
/// Used for generator mappers and filters, generated function stubs and
/// dynamic predicates.
#[derive(Clone)]
pub struct Func {
    id: u64,
    signature: Arc<Signature>,
    body: Arc<Body>,
}

impl Func {
    /// Wrap a typed unary function.
    pub fn new<A, B, F>(f: F) -> Func
    where
        A: FromValue + Typed,
        B: IntoValue + Typed,
        F: Fn(A) -> B + Send + Sync + 'static,
    {
        Func::dynamic(vec![A::type_of()], vec![B::type_of()], move |args| {
            Ok(vec![f(A::from_value(args[0].clone())?).into_value()])
        })
    }

    /// Wrap a typed unary function that may fail.
    pub fn try_new<A, B, F>(f: F) -> Func
    where
        A: FromValue + Typed,
        B: IntoValue + Typed,
        F: Fn(A) -> Result<B> + Send + Sync + 'static,
    {
        Func::dynamic(vec![A::type_of()], vec![B::type_of()], move |args| {
            Ok(vec![f(A::from_value(args[0].clone())?)?.into_value()])
        })
    }

    /// Wrap a typed binary function.
    pub fn binary<A, B, C, F>(f: F) -> Func
    where
        A: FromValue + Typed,
        B: FromValue + Typed,
        C: IntoValue + Typed,
        F: Fn(A, B) -> C + Send + Sync + 'static,
    {
        Func::dynamic(
            vec![A::type_of(), B::type_of()],
            vec![C::type_of()],
            move |args| {
                let a = A::from_value(args[0].clone())?;
                let b = B::from_value(args[1].clone())?;
                Ok(vec![f(a, b).into_value()])
            },
        )
    }

    /// Wrap a typed predicate for use with [`Generator::filter`](crate::Generator::filter).
    pub fn predicate<A, F>(f: F) -> Func
    where
        A: FromValue + Typed,
        F: Fn(&A) -> bool + Send + Sync + 'static,
    {
        Func::new(move |a: A| f(&a))
    }

    /// Wrap an untyped function with an explicit signature.
    pub fn dynamic<F>(inputs: Vec<Type>, outputs: Vec<Type>, body: F) -> Func
    where
        F: Fn(&[Value]) -> Result<Vec<Value>> + Send + Sync + 'static,
    {
        Func::with_signature(Arc::new(Signature { inputs, outputs }), body)
    }

    pub(crate) fn with_signature<F>(signature: Arc<Signature>, body: F) -> Func
    where
        F: Fn(&[Value]) -> Result<Vec<Value>> + Send + Sync + 'static,
    {
        Func {
            id: fresh_id(),
            signature,
            body: Arc::new(body),
        }
    }

    /// Replace the identity token.
    pub fn with_id(mut self, id: u64) -> Func {
        self.id = id;
        self
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn type_of(&self) -> Type {
        Type::Function(self.signature.clone())
    }

    /// Call the function, checking argument and result types.
    pub fn call(&self, args: &[Value]) -> Result<Vec<Value>> {
        check_values("function arguments", &self.signature.inputs, args)?;
        let outputs = (self.body)(args)?;
        check_values("function results", &self.signature.outputs, &outputs)?;
        Ok(outputs)
    }

    /// Call a single-input, single-output function.
    pub fn apply(&self, arg: Value) -> Result<Value> {
        let mut outputs = self.call(std::slice::from_ref(&arg))?;
        match outputs.pop() {
            Some(output) if outputs.is_empty() => Ok(output),
            _ => Err(Error::Arity {
                context: "function results".to_string(),
                expected: 1,
                actual: self.signature.outputs.len(),
            }),
        }
    }

    /// Call a predicate and read its boolean result.
    pub fn test(&self, arg: Value) -> Result<bool> {
        let output = self.apply(arg)?;
        output
            .as_bool()
            .ok_or_else(|| Error::conversion(Type::Bool, output.type_of()))
    }

    /// Check this is a one-in, one-out function taking `input`.
    pub(crate) fn expect_unary(&self, context: &str, input: &Type) -> Result<&Type> {
        let signature = &self.signature;
        if signature.inputs.len() != 1 {
            return Err(Error::Arity {
                context: format!("{context} inputs"),
                expected: 1,
                actual: signature.inputs.len(),
            });
        }
        if signature.outputs.len() != 1 {
            return Err(Error::Arity {
                context: format!("{context} outputs"),
                expected: 1,
                actual: signature.outputs.len(),
            });
        }
        if &signature.inputs[0] != input {
            return Err(Error::ParameterType {
                context: context.to_string(),
                index: 0,
                expected: signature.inputs[0].to_string(),
                actual: input.to_string(),
            });
        }
        Ok(&signature.outputs[0])
    }
}

pub(crate) fn check_values(context: &str, expected: &[Type], values: &[Value]) -> Result<()> {
    if expected.len() != values.len() {
        return Err(Error::Arity {
            context: context.to_string(),
            expected: expected.len(),
            actual: values.len(),
        });
    }
    for (index, (ty, value)) in expected.iter().zip(values).enumerate() {
        let actual = value.type_of();
        if &actual != ty {
            return Err(Error::ParameterType {
                context: context.to_string(),
                index,
                expected: ty.to_string(),
                actual: actual.to_string(),
            });
        }
    }
    Ok(())
}

impl fmt::Debug for Func {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Func(#{:x}: {})", self.id, self.type_of())
    }
}

/// A buffered channel of values.
///
/// Clones share the same underlying queue.
#[derive(Clone)]
pub struct Channel {
    id: u64,
    element: Type,
    capacity: usize,
    sender: Sender<Value>,
    receiver: Receiver<Value>,
}

impl Channel {
    pub fn new(element: Type, capacity: usize) -> Channel {
        let (sender, receiver) = channel::bounded(capacity);
        Channel {
            id: fresh_id(),
            element,
            capacity,
            sender,
            receiver,
        }
    }

    pub(crate) fn with_id(mut self, id: u64) -> Channel {
        self.id = id;
        self
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn element_type(&self) -> &Type {
        &self.element
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Push a value without blocking.
    pub fn send(&self, value: Value) -> Result<()> {
        let actual = value.type_of();
        if actual != self.element {
            return Err(Error::ParameterType {
                context: "channel send".to_string(),
                index: 0,
                expected: self.element.to_string(),
                actual: actual.to_string(),
            });
        }
        self.sender.try_send(value).map_err(|err| match err {
            TrySendError::Full(_) => Error::config(format!(
                "channel #{:x} is full (capacity {})",
                self.id, self.capacity
            )),
            TrySendError::Disconnected(_) => {
                Error::config(format!("channel #{:x} is disconnected", self.id))
            }
        })
    }

    /// Pop a value without blocking.
    pub fn try_recv(&self) -> Option<Value> {
        self.receiver.try_recv().ok()
    }

    /// Drain every buffered value.
    pub fn drain(&self) -> Vec<Value> {
        self.receiver.try_iter().collect()
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Channel(#{:x}: {}, {}/{})",
            self.id,
            self.element,
            self.len(),
            self.capacity
        )
    }
}
