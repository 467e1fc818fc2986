//! Deterministic rendering of values for failure reports.

use crate::value::Value;
use std::fmt::{self, Write};

/// One input of a failing case, rendered for humans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedInput {
    pub type_name: String,
    pub value: String,
}

impl RenderedInput {
    pub fn of(value: &Value) -> Self {
        RenderedInput {
            type_name: value.type_of().to_string(),
            value: encode(value),
        }
    }
}

impl fmt::Display for RenderedInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.type_name, self.value)
    }
}

/// Render each value of an input tuple.
pub fn render(values: &[Value]) -> Vec<RenderedInput> {
    values.iter().map(RenderedInput::of).collect()
}

/// Encode a value as a deterministic, Rust-like string.
///
/// Map entries are sorted by their encoded key. Functions and channels are
/// shown by identity token only.
pub fn encode(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

fn write_value(out: &mut String, value: &Value) {
    // Writing into a String cannot fail.
    let _ = match value {
        Value::Bool(v) => write!(out, "{v}"),
        Value::I8(v) => write!(out, "{v}"),
        Value::I16(v) => write!(out, "{v}"),
        Value::I32(v) => write!(out, "{v}"),
        Value::I64(v) => write!(out, "{v}"),
        Value::Isize(v) => write!(out, "{v}"),
        Value::U8(v) => write!(out, "{v}"),
        Value::U16(v) => write!(out, "{v}"),
        Value::U32(v) => write!(out, "{v}"),
        Value::U64(v) => write!(out, "{v}"),
        Value::Usize(v) => write!(out, "{v}"),
        Value::F32(v) => write!(out, "{v:?}"),
        Value::F64(v) => write!(out, "{v:?}"),
        Value::Char(v) => write!(out, "{v:?}"),
        Value::String(v) => write!(out, "{v:?}"),
        Value::Array { items, .. } | Value::Slice { items, .. } => {
            out.push('[');
            write_seq(out, items);
            out.push(']');
            Ok(())
        }
        Value::Map { entries, .. } => {
            let mut rendered: Vec<(String, String)> = entries
                .iter()
                .map(|(k, v)| (encode(k), encode(v)))
                .collect();
            rendered.sort();
            out.push('{');
            for (i, (k, v)) in rendered.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(k);
                out.push_str(": ");
                out.push_str(v);
            }
            out.push('}');
            Ok(())
        }
        Value::Optional { value: None, .. } => write!(out, "None"),
        Value::Optional {
            value: Some(inner), ..
        } => {
            out.push_str("Some(");
            write_value(out, inner);
            out.push(')');
            Ok(())
        }
        Value::Record { ty, fields } => {
            out.push_str(&ty.name);
            out.push_str(" { ");
            for (i, (field, value)) in ty.fields.iter().zip(fields).enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&field.name);
                out.push_str(": ");
                write_value(out, value);
            }
            out.push_str(" }");
            Ok(())
        }
        Value::Function(func) => write!(out, "<fn#{:x}>", func.id()),
        Value::Channel(chan) => write!(out, "<chan#{:x}>", chan.id()),
        Value::Tuple(members) => {
            out.push('(');
            write_seq(out, members);
            if members.len() == 1 {
                out.push(',');
            }
            out.push(')');
            Ok(())
        }
    };
}

fn write_seq(out: &mut String, items: &[Value]) {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_value(out, item);
    }
}
