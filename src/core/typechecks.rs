//! Purpose: Shape predicates over target-type descriptors.
//! Exports: One `is_*` predicate per dispatch-table entry.
//! Role: Classification oracle consulted by the dispatch table on a cache miss.
//! Invariants: Predicates are pure and never inspect values, only types.
//! Invariants: Predicates may overlap; the dispatch table order decides the winner.

use crate::core::config::LoaderConfig;
use crate::core::types::{RecordKind, Scalar, Type};

pub fn is_none(ty: &Type) -> bool {
    matches!(ty, Type::Scalar(Scalar::None))
}

pub fn is_union(ty: &Type) -> bool {
    matches!(ty, Type::Union(_))
}

/// Scalar type listed in the configured basic set.
pub fn is_basic(config: &LoaderConfig, ty: &Type) -> bool {
    match ty {
        Type::Scalar(scalar) => config.is_basic(*scalar),
        _ => false,
    }
}

pub fn is_enum(ty: &Type) -> bool {
    matches!(ty, Type::Enum(_))
}

pub fn is_tuple(ty: &Type) -> bool {
    matches!(ty, Type::Tuple(_) | Type::VarTuple(_))
}

pub fn is_list(ty: &Type) -> bool {
    matches!(ty, Type::List(_))
}

pub fn is_dict(ty: &Type) -> bool {
    matches!(ty, Type::Dict(_, _))
}

pub fn is_set(ty: &Type) -> bool {
    matches!(ty, Type::Set(_))
}

pub fn is_frozen_set(ty: &Type) -> bool {
    matches!(ty, Type::FrozenSet(_))
}

pub fn is_named_tuple(ty: &Type) -> bool {
    record_kind(ty).is_some_and(|kind| matches!(kind, RecordKind::NamedTuple))
}

pub fn is_dataclass(ty: &Type) -> bool {
    record_kind(ty).is_some_and(|kind| matches!(kind, RecordKind::DataClass))
}

pub fn is_forward_ref(ty: &Type) -> bool {
    matches!(ty, Type::ForwardRef(_))
}

pub fn is_literal(ty: &Type) -> bool {
    matches!(ty, Type::Literal(_))
}

pub fn is_typed_dict(ty: &Type) -> bool {
    record_kind(ty).is_some_and(|kind| matches!(kind, RecordKind::TypedDict(_)))
}

pub fn is_temporal(ty: &Type) -> bool {
    matches!(ty, Type::Date | Type::Time | Type::DateTime)
}

/// External type whose name is in the configured string-constructed set.
pub fn is_str_constructed(config: &LoaderConfig, ty: &Type) -> bool {
    match ty {
        Type::External(def) => config.str_constructed.contains(def.name()),
        _ => false,
    }
}

pub fn is_attrs(ty: &Type) -> bool {
    record_kind(ty).is_some_and(|kind| matches!(kind, RecordKind::Attrs))
}

pub fn is_any(ty: &Type) -> bool {
    matches!(ty, Type::Any)
}

pub fn is_new_type(ty: &Type) -> bool {
    matches!(ty, Type::NewType(_))
}

fn record_kind(ty: &Type) -> Option<&RecordKind> {
    match ty {
        Type::Record(def) => Some(def.kind()),
        _ => None,
    }
}
