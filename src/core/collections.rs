//! Purpose: Routines for sequence, set, tuple and mapping targets.
//! Exports: `load_list`, `load_set`, `load_frozen_set`, `load_tuple`, `load_dict`.
//! Role: Recurse into the loader once per element with a positional annotation.
//! Invariants: Mappings are never accepted where a sequence is expected.
//! Invariants: Strings are scalars here; they are not iterated as characters.

use std::collections::{BTreeMap, BTreeSet};

use crate::core::error::{Error, ErrorKind};
use crate::core::loaded::Loaded;
use crate::core::loader::Loader;
use crate::core::trace::Annotation;
use crate::core::types::Type;
use crate::core::value::Value;

fn sequence<'v>(value: &'v Value, ty: &Type, shape: &str) -> Result<&'v [Value], Error> {
    match value {
        Value::Seq(items) => Ok(items),
        Value::Map(_) => Err(Error::new(ErrorKind::TypeMismatch)
            .with_message(format!("unable to load mapping as a {shape}"))),
        other => Err(Error::new(ErrorKind::TypeMismatch).with_message(format!(
            "{} is not a sequence and cannot be loaded into {ty}",
            other.type_label()
        ))),
    }
}

fn load_items<'a>(
    loader: &mut Loader,
    items: &[Value],
    types: impl Iterator<Item = &'a Type>,
) -> Result<Vec<Loaded>, Error> {
    items
        .iter()
        .zip(types)
        .enumerate()
        .map(|(idx, (item, ty))| loader.load_annotated(item, ty, Some(Annotation::Index(idx))))
        .collect()
}

pub fn load_list(loader: &mut Loader, value: &Value, ty: &Type) -> Result<Loaded, Error> {
    let Type::List(inner) = ty else {
        return Err(not_shape(ty, "list"));
    };
    let items = sequence(value, ty, "list")?;
    load_items(loader, items, std::iter::repeat(inner.as_ref())).map(Loaded::List)
}

pub fn load_set(loader: &mut Loader, value: &Value, ty: &Type) -> Result<Loaded, Error> {
    let Type::Set(inner) = ty else {
        return Err(not_shape(ty, "set"));
    };
    let items = sequence(value, ty, "set")?;
    let loaded = load_items(loader, items, std::iter::repeat(inner.as_ref()))?;
    Ok(Loaded::Set(loaded.into_iter().collect::<BTreeSet<_>>()))
}

pub fn load_frozen_set(loader: &mut Loader, value: &Value, ty: &Type) -> Result<Loaded, Error> {
    let Type::FrozenSet(inner) = ty else {
        return Err(not_shape(ty, "frozenset"));
    };
    let items = sequence(value, ty, "frozenset")?;
    let loaded = load_items(loader, items, std::iter::repeat(inner.as_ref()))?;
    Ok(Loaded::FrozenSet(loaded.into_iter().collect()))
}

/// Fixed tuples need at least one item per slot; surplus items are dropped unless
/// `fail_on_extra` is set.
pub fn load_tuple(loader: &mut Loader, value: &Value, ty: &Type) -> Result<Loaded, Error> {
    let items = sequence(value, ty, "tuple")?;
    match ty {
        Type::VarTuple(inner) => {
            load_items(loader, items, std::iter::repeat(inner.as_ref())).map(Loaded::Tuple)
        }
        Type::Tuple(slots) => {
            if loader.config().fail_on_extra && items.len() > slots.len() {
                return Err(Error::new(ErrorKind::Value)
                    .with_message(format!("value is too long for type {ty}")));
            }
            if items.len() < slots.len() {
                return Err(Error::new(ErrorKind::Value)
                    .with_message(format!("value is too short for type {ty}")));
            }
            load_items(loader, items, slots.iter()).map(Loaded::Tuple)
        }
        _ => Err(not_shape(ty, "tuple")),
    }
}

pub fn load_dict(loader: &mut Loader, value: &Value, ty: &Type) -> Result<Loaded, Error> {
    let Type::Dict(key_ty, value_ty) = ty else {
        return Err(not_shape(ty, "dict"));
    };
    let map = loader.mapping_view(value, ty)?;
    let mut loaded = BTreeMap::new();
    for (key, item) in map.iter() {
        let k = loader.load_annotated(key, key_ty, Some(Annotation::Key(key.clone())))?;
        let v = loader.load_annotated(item, value_ty, Some(Annotation::MapValue(key.clone())))?;
        loaded.insert(k, v);
    }
    Ok(Loaded::Dict(loaded))
}

fn not_shape(ty: &Type, shape: &str) -> Error {
    Error::new(ErrorKind::TypeMismatch).with_message(format!("{ty} is not a {shape} type"))
}
