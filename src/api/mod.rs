//! Purpose: Define the stable public Rust API boundary for typedload.
//! Exports: Loader, configuration, type descriptors, values, errors and one-shot helpers.
//! Role: Public, additive-only surface; the only path most callers need.
//! Invariants: One-shot helpers build a fresh default `Loader` per call.
//! Invariants: Custom handlers reach engine internals through `crate::core`, not here.

pub use crate::core::config::LoaderConfig;
pub use crate::core::dispatch::Handler;
pub use crate::core::error::{ConstructError, Error, ErrorKind};
pub use crate::core::loaded::{EnumMember, Loaded, Record};
pub use crate::core::loader::Loader;
pub use crate::core::record::{RecordSchema, load_object};
pub use crate::core::trace::{Annotation, TraceItem};
pub use crate::core::types::{
    EnumDef, ExternalDef, FieldDef, RecordDef, RecordKind, Scalar, Totality, Type,
};
pub use crate::core::value::{Namespace, Opaque, Value};

/// Loads `value` into `ty` with a default loader.
pub fn load(value: &Value, ty: &Type) -> Result<Loaded, Error> {
    Loader::new().load(value, ty)
}

/// Parses JSON text and loads it into `ty` with a default loader.
pub fn loads(input: &str, ty: &Type) -> Result<Loaded, Error> {
    Loader::new().load_json(input, ty)
}

#[cfg(test)]
mod tests {
    use super::{ErrorKind, Loaded, Type, Value, load, loads};

    #[test]
    fn one_shot_helpers() {
        assert_eq!(load(&Value::from("5"), &Type::int()).expect("load"), Loaded::Int(5));
        assert_eq!(
            loads(r#"{"a": 1}"#, &Type::dict(Type::str(), Type::float())).expect("loads"),
            Loaded::Dict([(Loaded::from("a"), Loaded::Float(1.0))].into_iter().collect())
        );
        assert_eq!(loads("nope", &Type::int()).unwrap_err().kind(), ErrorKind::Parse);
    }
}
