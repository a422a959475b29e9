//! Purpose: Recursive, type-directed decoding entry point.
//! Exports: `Loader`, `DictEquivalent`.
//! Role: Owns the dispatch table, handler cache, forward-reference table and config.
//! Invariants: Handler cache and forward-reference table only grow for a loader's lifetime.
//! Invariants: Every failure leaving `load_annotated` carries one more trace entry at the front.
//! Invariants: Parse failures returned by handlers surface as `Internal`, wrapping the parse error.
//! Invariants: Input values and type descriptors are only borrowed.
//! Notes: Build a fresh `Loader` to reset caches or change configuration.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::core::config::LoaderConfig;
use crate::core::dispatch::{self, Handler};
use crate::core::error::{Error, ErrorKind};
use crate::core::loaded::Loaded;
use crate::core::trace::{Annotation, TraceItem};
use crate::core::types::Type;
use crate::core::value::{Namespace, Value};
use crate::json;

/// Projects a dict-like foreign object to a plain mapping; `None` when it does not apply.
pub type DictEquivalent = Arc<dyn Fn(&Value) -> Option<BTreeMap<Value, Value>> + Send + Sync>;

pub struct Loader {
    config: LoaderConfig,
    handlers: Vec<Handler>,
    dict_equivalents: Vec<DictEquivalent>,
    index_cache: HashMap<Type, usize>,
    frefs: Option<HashMap<String, Type>>,
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

impl Loader {
    pub fn new() -> Self {
        Self::with_config(LoaderConfig::default())
    }

    pub fn with_config(config: LoaderConfig) -> Self {
        let frefs = config.forward_refs.then(HashMap::new);
        Self {
            config,
            handlers: dispatch::default_handlers(),
            dict_equivalents: vec![Arc::new(project_namespace)],
            index_cache: HashMap::new(),
            frefs,
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn handlers(&self) -> &[Handler] {
        &self.handlers
    }

    /// Appends a handler after the built-in ones.
    pub fn push_handler(&mut self, handler: Handler) {
        self.handlers.push(handler);
    }

    pub fn push_dict_equivalent(
        &mut self,
        projector: impl Fn(&Value) -> Option<BTreeMap<Value, Value>> + Send + Sync + 'static,
    ) {
        self.dict_equivalents.push(Arc::new(projector));
    }

    /// Seeds the forward-reference table; replaces any earlier entry for `name`.
    pub fn register_forward_ref(
        &mut self,
        name: impl Into<String>,
        ty: Type,
    ) -> Result<Option<Type>, Error> {
        let Some(frefs) = self.frefs.as_mut() else {
            return Err(Error::new(ErrorKind::UnresolvedReference)
                .with_message("forward reference resolving is disabled for the loader")
                .with_hint("build the loader with forward_refs enabled"));
        };
        Ok(frefs.insert(name.into(), ty))
    }

    /// `None` when forward references are disabled.
    pub fn forward_refs(&self) -> Option<&HashMap<String, Type>> {
        self.frefs.as_ref()
    }

    pub(crate) fn resolve_forward_ref(&self, name: &str) -> Option<Option<&Type>> {
        self.frefs.as_ref().map(|frefs| frefs.get(name))
    }

    /// Position of the first handler whose condition accepts `ty`.
    pub fn index(&self, ty: &Type) -> Result<Option<usize>, Error> {
        for (idx, handler) in self.handlers.iter().enumerate() {
            let matched = match handler.matches(&self.config, ty) {
                Ok(matched) => matched,
                Err(err) if self.config.raise_condition_errors => return Err(err),
                Err(err) => {
                    tracing::debug!(handler = handler.name(), %ty, error = %err, "condition failed; treated as no match");
                    false
                }
            };
            if matched {
                return Ok(Some(idx));
            }
        }
        Ok(None)
    }

    pub fn load(&mut self, value: &Value, ty: &Type) -> Result<Loaded, Error> {
        self.load_annotated(value, ty, None)
    }

    /// Loads `value` into `ty`; `annotation` positions this call relative to its parent.
    /// Custom handlers recursing into nested values should call this.
    pub fn load_annotated(
        &mut self,
        value: &Value,
        ty: &Type,
        annotation: Option<Annotation>,
    ) -> Result<Loaded, Error> {
        self.dispatch(value, ty).map_err(|err| {
            let err = match err.kind() {
                ErrorKind::Parse => {
                    tracing::debug!(%ty, "handler returned a parse failure");
                    Error::new(ErrorKind::Internal)
                        .with_message(format!("handler for {ty} returned a parse failure"))
                        .with_hint("custom handlers must map parse failures to a load error kind")
                        .with_causes(vec![err])
                }
                _ => err,
            };
            err.fill_context(value, ty)
                .with_trace_front(TraceItem::new(value.clone(), ty.clone(), annotation))
        })
    }

    fn dispatch(&mut self, value: &Value, ty: &Type) -> Result<Loaded, Error> {
        let index = match self.index_cache.get(ty) {
            Some(index) => *index,
            None => self.resolve(ty)?,
        };
        let load = self.handlers[index].load_fn();
        load(self, value, ty)
    }

    fn resolve(&mut self, ty: &Type) -> Result<usize, Error> {
        let Some(index) = self.index(ty)? else {
            return Err(Error::new(ErrorKind::TypeSupport)
                .with_message(format!("cannot deal with value of type {ty}"))
                .with_hint("append a Handler with Loader::push_handler to support this type"));
        };
        tracing::trace!(%ty, handler = self.handlers[index].name(), "resolved handler");
        self.index_cache.insert(ty.clone(), index);
        if let (Some(frefs), Some(name)) = (self.frefs.as_mut(), ty.name()) {
            if !frefs.contains_key(name) {
                tracing::trace!(name, "registered forward reference");
                frefs.insert(name.to_string(), ty.clone());
            }
        }
        Ok(index)
    }

    /// Snapshot of a dict-equivalent object as a mapping, when projection is enabled.
    pub fn project(&self, value: &Value) -> Option<BTreeMap<Value, Value>> {
        if !self.config.dict_equivalence {
            return None;
        }
        self.dict_equivalents
            .iter()
            .find_map(|projector| projector(value))
    }

    /// Mapping access to `value`: borrowed for mappings, projected for dict equivalents.
    pub fn mapping_view<'v>(
        &self,
        value: &'v Value,
        ty: &Type,
    ) -> Result<Cow<'v, BTreeMap<Value, Value>>, Error> {
        if let Value::Map(map) = value {
            return Ok(Cow::Borrowed(map));
        }
        match self.project(value) {
            Some(map) => Ok(Cow::Owned(map)),
            None => Err(Error::new(ErrorKind::Attribute)
                .with_message(format!(
                    "{} has no mapping access and cannot be loaded into {ty}",
                    value.type_label()
                ))
                .with_value(value.clone())
                .with_type(ty.clone())),
        }
    }

    /// Parses JSON text and loads it into `ty`.
    pub fn load_json(&mut self, input: &str, ty: &Type) -> Result<Loaded, Error> {
        let value = json::parse::from_str(input)?;
        self.load(&value, ty)
    }
}

impl fmt::Debug for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loader")
            .field("config", &self.config)
            .field("handlers", &self.handlers)
            .field("cached_types", &self.index_cache.len())
            .field("forward_refs", &self.frefs.as_ref().map(HashMap::len))
            .finish()
    }
}

fn project_namespace(value: &Value) -> Option<BTreeMap<Value, Value>> {
    let Value::Object(object) = value else {
        return None;
    };
    let namespace = object.downcast_ref::<Namespace>()?;
    Some(
        namespace
            .kwargs()
            .map(|(key, value)| (Value::from(key), value.clone()))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::Loader;
    use crate::core::config::LoaderConfig;
    use crate::core::dispatch::Handler;
    use crate::core::error::{Error, ErrorKind};
    use crate::core::loaded::Loaded;
    use crate::core::types::{FieldDef, RecordDef, Type};
    use crate::core::value::{Namespace, Opaque, Value};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn point() -> Type {
        RecordDef::data_class("Point")
            .field(FieldDef::new("x", Type::int()))
            .field(FieldDef::new("y", Type::int()))
            .into_type()
    }

    #[test]
    fn unsupported_type_is_a_type_support_error() {
        let mut loader = Loader::new();
        let err = loader
            .load(&Value::Int(1), &Type::custom("Matrix", [Type::float()]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeSupport);
        assert!(err.message().expect("message").contains("Matrix<float>"));
        assert!(err.hint().is_some());
        assert_eq!(err.trace().len(), 1);
    }

    #[test]
    fn named_types_are_registered_once() {
        let mut loader = Loader::new();
        let value = Value::from(json!({"x": 1, "y": 2}));
        loader.load(&value, &point()).expect("load");
        let frefs = loader.forward_refs().expect("enabled");
        assert_eq!(frefs.get("Point"), Some(&point()));
        assert!(frefs.contains_key("int"));
        assert!(!frefs.values().any(|ty| matches!(ty, Type::List(_))));

        let before = frefs.len();
        loader.load(&value, &point()).expect("load again");
        assert_eq!(loader.forward_refs().expect("enabled").len(), before);
    }

    #[test]
    fn registration_never_overwrites() {
        let mut loader = Loader::new();
        loader
            .register_forward_ref("Point", Type::str())
            .expect("register");
        loader
            .load(&Value::from(json!({"x": 1, "y": 2})), &point())
            .expect("load");
        assert_eq!(
            loader.forward_refs().expect("enabled").get("Point"),
            Some(&Type::str())
        );
    }

    #[test]
    fn disabled_table_refuses_registration() {
        let mut loader = Loader::with_config(LoaderConfig::default().with_forward_refs(false));
        assert!(loader.forward_refs().is_none());
        let err = loader
            .register_forward_ref("Point", point())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnresolvedReference);
    }

    #[test]
    fn custom_handler_is_used_after_builtins() {
        let mut loader = Loader::new();
        loader.push_handler(Handler::new(
            "matrix",
            |_, ty| Ok(matches!(ty, Type::Custom(def) if def.name() == "Matrix")),
            |_, value, _| Ok(Loaded::Raw(value.clone())),
        ));
        let ty = Type::custom("Matrix", []);
        let loaded = loader.load(&Value::Int(4), &ty).expect("load");
        assert_eq!(loaded, Loaded::Raw(Value::Int(4)));
        assert_eq!(loader.index(&ty).expect("index"), Some(loader.handlers().len() - 1));
    }

    #[test]
    fn condition_errors_follow_config() {
        let failing = || {
            Handler::new(
                "broken",
                |_, _| Err(Error::new(ErrorKind::TypeSupport).with_message("boom")),
                |_, _, _| Ok(Loaded::None),
            )
        };
        let ty = Type::custom("Unknown", []);

        let mut strict = Loader::new();
        strict.push_handler(failing());
        let err = strict.load(&Value::Null, &ty).unwrap_err();
        assert_eq!(err.message(), Some("boom"));

        let mut lenient =
            Loader::with_config(LoaderConfig::default().with_raise_condition_errors(false));
        lenient.push_handler(failing());
        let err = lenient.load(&Value::Null, &ty).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeSupport);
        assert_ne!(err.message(), Some("boom"));
    }

    #[test]
    fn mapping_view_projects_namespaces_only_when_enabled() {
        let namespace = Value::from(Namespace::new().with("x", 1).with("y", 2));
        let loader = Loader::new();
        let view = loader.mapping_view(&namespace, &point()).expect("projected");
        assert_eq!(view.get(&Value::from("x")), Some(&Value::Int(1)));

        let loader = Loader::with_config(LoaderConfig::default().with_dict_equivalence(false));
        let err = loader.mapping_view(&namespace, &point()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Attribute);
    }

    #[test]
    fn load_json_reports_parse_errors() {
        let mut loader = Loader::new();
        let loaded = loader.load_json("[1, 2]", &Type::list(Type::int())).expect("load");
        assert_eq!(loaded, Loaded::List(vec![Loaded::Int(1), Loaded::Int(2)]));
        let err = loader.load_json("[1, 2", &Type::list(Type::int())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    struct Pixel {
        x: i64,
        y: i64,
    }

    fn project_pixel(value: &Value) -> Option<BTreeMap<Value, Value>> {
        let Value::Object(object) = value else {
            return None;
        };
        let pixel = object.downcast_ref::<Pixel>()?;
        Some(BTreeMap::from([
            (Value::from("x"), Value::Int(pixel.x)),
            (Value::from("y"), Value::Int(pixel.y)),
        ]))
    }

    #[test]
    fn pushed_dict_equivalent_projects_foreign_objects() {
        let pixel = Value::from(Opaque::new(Pixel { x: 3, y: 4 }));

        let mut loader = Loader::new();
        let err = loader.load(&pixel, &point()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Attribute);

        loader.push_dict_equivalent(project_pixel);
        let loaded = loader.load(&pixel, &point()).expect("projected");
        let record = loaded.as_record().expect("record");
        assert_eq!(record.get("x"), Some(&Loaded::Int(3)));
        assert_eq!(record.get("y"), Some(&Loaded::Int(4)));
        let namespace = Value::from(Namespace::new().with("x", 1).with("y", 2));
        assert!(loader.load(&namespace, &point()).is_ok());

        let mut disabled =
            Loader::with_config(LoaderConfig::default().with_dict_equivalence(false));
        disabled.push_dict_equivalent(project_pixel);
        let err = disabled.load(&pixel, &point()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Attribute);
        assert!(disabled.project(&pixel).is_none());
    }

    #[test]
    fn parse_failures_inside_handlers_become_internal() {
        let mut loader = Loader::new();
        loader.push_handler(Handler::new(
            "embedded",
            |_, ty| Ok(matches!(ty, Type::Custom(def) if def.name() == "Embedded")),
            |loader, value, _| {
                let text = value.as_str().unwrap_or_default();
                let inner = crate::json::parse::from_str(text)?;
                loader.load(&inner, &Type::list(Type::int()))
            },
        ));
        let ty = Type::dict(Type::str(), Type::custom("Embedded", []));

        let loaded = loader
            .load(&Value::from(json!({"a": "[1, 2]"})), &ty)
            .expect("load");
        assert_eq!(
            loaded,
            Loaded::Dict(BTreeMap::from([(
                Loaded::from("a"),
                Loaded::List(vec![Loaded::Int(1), Loaded::Int(2)])
            )]))
        );

        let err = loader
            .load(&Value::from(json!({"a": "[1,"})), &ty)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.causes()[0].kind(), ErrorKind::Parse);
        assert_eq!(err.path(), r#"["a"]"#);
    }
}
