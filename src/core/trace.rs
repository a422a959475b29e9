//! Purpose: Breadcrumbs attached to load failures.
//! Exports: `Annotation`, `TraceItem`, `render_path`.
//! Role: Lets callers pinpoint where in a nested value a load failed.
//! Invariants: Traces are root-first and only ever grow at the front while unwinding.

use std::fmt::Write as _;

use crate::core::types::Type;
use crate::core::value::Value;

/// Position of a nested load relative to its parent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Annotation {
    Index(usize),
    /// Loading a mapping key.
    Key(Value),
    /// Loading the value stored under the given mapping key.
    MapValue(Value),
    Field(String),
    /// Attempting one alternative of a union, or one type hint of an enum.
    Union(Type),
    ForwardRef(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct TraceItem {
    pub value: Value,
    pub ty: Type,
    pub annotation: Option<Annotation>,
}

impl TraceItem {
    pub fn new(value: Value, ty: Type, annotation: Option<Annotation>) -> Self {
        Self {
            value,
            ty,
            annotation,
        }
    }
}

pub fn render_path(trace: &[TraceItem]) -> String {
    let mut path = String::new();
    for item in trace {
        let Some(annotation) = &item.annotation else {
            continue;
        };
        let _ = match annotation {
            Annotation::Index(index) => write!(path, "[{index}]"),
            Annotation::Key(key) => write!(path, ".key({key})"),
            Annotation::MapValue(key) => write!(path, "[{key}]"),
            Annotation::Field(name) => write!(path, ".{name}"),
            Annotation::Union(ty) => write!(path, "<{ty}>"),
            Annotation::ForwardRef(name) => write!(path, "<'{name}'>"),
        };
    }
    path
}
