//! Purpose: Load mappings into record types.
//! Exports: `RecordSchema`, `load_object`, `load_named_tuple`, `load_dataclass`,
//!   `load_typed_dict`, `load_attrs`.
//! Role: Shared field loader behind every record-like dispatch routine; public so custom
//!   handlers can reuse it for their own record shapes.
//! Invariants: The caller's mapping is never modified; aliasing and projection work on copies.
//! Invariants: Required fields are checked before any field is decoded.
//! Invariants: Constructor failures surface as engine error kinds, never foreign errors.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

use crate::core::error::{ConstructError, Error, ErrorKind};
use crate::core::loaded::Loaded;
use crate::core::loader::Loader;
use crate::core::trace::Annotation;
use crate::core::types::{RecordDef, Type};
use crate::core::value::Value;

/// Field layout of a record-like type as seen by `load_object`.
#[derive(Clone, Debug, Default)]
pub struct RecordSchema<'a> {
    hints: BTreeMap<&'a str, &'a Type>,
    required: BTreeSet<&'a str>,
    /// External name to field name.
    aliases: BTreeMap<&'a str, &'a str>,
}

impl<'a> RecordSchema<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: &'a str, ty: &'a Type, required: bool) -> Self {
        self.hints.insert(name, ty);
        if required {
            self.required.insert(name);
        }
        self
    }

    pub fn alias(mut self, external: &'a str, field: &'a str) -> Self {
        self.aliases.insert(external, field);
        self
    }

    /// Schema of a declared record; aliases come from `metadata[mangle_key]`.
    pub fn from_record(def: &'a RecordDef, mangle_key: &str) -> Result<Self, Error> {
        let aliases = def
            .aliases(mangle_key)
            .map_err(|message| Error::new(ErrorKind::Value).with_message(message))?;
        Ok(Self {
            hints: def
                .fields()
                .iter()
                .map(|field| (field.name(), field.ty()))
                .collect(),
            required: def.required_fields(),
            aliases,
        })
    }

    pub fn fields(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.hints.keys().copied()
    }

    pub fn required(&self) -> &BTreeSet<&'a str> {
        &self.required
    }

    /// Copy of `map` with external names rewritten to field names. Field names that are
    /// also alias targets are dropped, or rejected under `fail_on_extra`.
    fn mangle<'v>(
        &self,
        map: Cow<'v, BTreeMap<Value, Value>>,
        fail_on_extra: bool,
    ) -> Result<Cow<'v, BTreeMap<Value, Value>>, String> {
        if self.aliases.is_empty() {
            return Ok(map);
        }
        let shadowed: BTreeSet<&str> = self.aliases.values().copied().collect();
        let mut mangled = BTreeMap::new();
        for (key, value) in map.iter() {
            let key = match key {
                Value::Str(name) if self.aliases.contains_key(name.as_str()) => {
                    Value::from(self.aliases[name.as_str()])
                }
                Value::Str(name) if shadowed.contains(name.as_str()) => {
                    if fail_on_extra {
                        return Err(format!("extra field: {name}"));
                    }
                    continue;
                }
                other => other.clone(),
            };
            mangled.insert(key, value.clone());
        }
        Ok(Cow::Owned(mangled))
    }
}

/// Loads a mapping (or dict-equivalent object) into a record through `construct`.
pub fn load_object<F>(
    loader: &mut Loader,
    schema: &RecordSchema<'_>,
    value: &Value,
    ty: &Type,
    construct: F,
) -> Result<Loaded, Error>
where
    F: FnOnce(BTreeMap<String, Loaded>) -> Result<Loaded, ConstructError>,
{
    let map = loader.mapping_view(value, ty)?;
    let map = schema
        .mangle(map, loader.config().fail_on_extra)
        .map_err(|message| Error::new(ErrorKind::Value).with_message(message))?;

    let present: BTreeSet<&str> = map.keys().filter_map(Value::as_str).collect();
    let missing: Vec<&str> = schema.required.difference(&present).copied().collect();
    if !missing.is_empty() {
        return Err(Error::new(ErrorKind::Value).with_message(format!(
            "value does not contain fields: {} which are necessary for type {ty}",
            missing.join(", ")
        )));
    }

    if loader.config().fail_on_extra {
        let extra: Vec<String> = map
            .keys()
            .filter(|key| !key.as_str().is_some_and(|name| schema.hints.contains_key(name)))
            .map(|key| match key {
                Value::Str(name) => name.clone(),
                other => other.to_string(),
            })
            .collect();
        if !extra.is_empty() {
            return Err(Error::new(ErrorKind::Value).with_message(format!(
                "dictionary has unrecognized fields: {} and cannot be loaded into {ty}",
                extra.join(", ")
            )));
        }
    }

    let mut params = BTreeMap::new();
    for (key, item) in map.iter() {
        let Some((name, hint)) = key
            .as_str()
            .and_then(|name| schema.hints.get_key_value(name))
        else {
            continue;
        };
        let loaded =
            loader.load_annotated(item, hint, Some(Annotation::Field((*name).to_string())))?;
        params.insert((*name).to_string(), loaded);
    }

    tracing::trace!(%ty, fields = params.len(), "constructing record");
    construct(params).map_err(Error::from)
}

fn load_declared(loader: &mut Loader, value: &Value, ty: &Type) -> Result<Loaded, Error> {
    let Type::Record(def) = ty else {
        return Err(Error::new(ErrorKind::TypeMismatch).with_message(format!("{ty} is not a record")));
    };
    let mangle_key = loader.config().mangle_key.clone();
    let schema = RecordSchema::from_record(def, &mangle_key)?;
    load_object(loader, &schema, value, ty, |params| def.construct(params))
}

pub fn load_named_tuple(loader: &mut Loader, value: &Value, ty: &Type) -> Result<Loaded, Error> {
    load_declared(loader, value, ty)
}

pub fn load_dataclass(loader: &mut Loader, value: &Value, ty: &Type) -> Result<Loaded, Error> {
    load_declared(loader, value, ty)
}

pub fn load_typed_dict(loader: &mut Loader, value: &Value, ty: &Type) -> Result<Loaded, Error> {
    load_declared(loader, value, ty)
}

pub fn load_attrs(loader: &mut Loader, value: &Value, ty: &Type) -> Result<Loaded, Error> {
    load_declared(loader, value, ty)
}
