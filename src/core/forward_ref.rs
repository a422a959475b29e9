//! Purpose: Resolve types referenced by name.
//! Exports: `load_forward_ref`.
//! Role: Dispatch-table routine for `Type::ForwardRef`; enables self-referential schemas.
//! Invariants: Resolution only reads the loader's table; registration happens in the engine.

use crate::core::error::{Error, ErrorKind};
use crate::core::loaded::Loaded;
use crate::core::loader::Loader;
use crate::core::trace::Annotation;
use crate::core::types::Type;
use crate::core::value::Value;

pub fn load_forward_ref(loader: &mut Loader, value: &Value, ty: &Type) -> Result<Loaded, Error> {
    let Type::ForwardRef(name) = ty else {
        return Err(Error::new(ErrorKind::TypeMismatch)
            .with_message(format!("{ty} is not a forward reference")));
    };
    let target = match loader.resolve_forward_ref(name) {
        None => {
            return Err(Error::new(ErrorKind::UnresolvedReference)
                .with_message("forward reference resolving is disabled for the loader"));
        }
        Some(None) => {
            return Err(Error::new(ErrorKind::Value)
                .with_message(format!("forward reference '{name}' unknown"))
                .with_hint("load the referenced type once or seed it with Loader::register_forward_ref"));
        }
        Some(Some(target)) => target.clone(),
    };
    loader.load_annotated(value, &target, Some(Annotation::ForwardRef(name.clone())))
}

#[cfg(test)]
mod tests {
    use crate::core::config::LoaderConfig;
    use crate::core::error::ErrorKind;
    use crate::core::loaded::{Loaded, Record};
    use crate::core::loader::Loader;
    use crate::core::trace::Annotation;
    use crate::core::types::{FieldDef, RecordDef, Type};
    use crate::core::value::Value;
    use serde_json::json;

    fn node() -> Type {
        RecordDef::named_tuple("Node")
            .field(FieldDef::new("value", Type::int()))
            .field(
                FieldDef::new("next", Type::optional(Type::forward_ref("Node")))
                    .with_default(Loaded::None),
            )
            .into_type()
    }

    #[test]
    fn self_referential_record_resolves() {
        let mut loader = Loader::new();
        let value = Value::from(json!({"value": 1, "next": {"value": 2, "next": null}}));
        let loaded = loader.load(&value, &node()).expect("load");
        let expected = Record::new("Node").with("value", 1).with(
            "next",
            Record::new("Node").with("value", 2).with("next", Loaded::None),
        );
        assert_eq!(loaded, Loaded::Record(expected));
    }

    #[test]
    fn unknown_name_is_a_value_error() {
        let mut loader = Loader::new();
        let err = loader
            .load(&Value::Int(1), &Type::forward_ref("Missing"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Value);
        assert_eq!(err.message(), Some("forward reference 'Missing' unknown"));
    }

    #[test]
    fn disabled_table_is_a_distinct_failure() {
        let mut loader = Loader::with_config(LoaderConfig::default().with_forward_refs(false));
        let err = loader
            .load(&Value::from(json!({"value": 1, "next": {"value": 2}})), &node())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Value);
        assert_eq!(err.path(), ".next");
        assert_eq!(err.causes()[0].kind(), ErrorKind::UnresolvedReference);
        let direct = loader
            .load(&Value::Int(1), &Type::forward_ref("Node"))
            .unwrap_err();
        assert_eq!(direct.kind(), ErrorKind::UnresolvedReference);
    }

    #[test]
    fn seeded_reference_is_annotated_in_traces() {
        let mut loader = Loader::new();
        loader
            .register_forward_ref("Id", Type::int())
            .expect("register");
        let err = loader
            .load(&Value::from(json!([1, "x"])), &Type::list(Type::forward_ref("Id")))
            .unwrap_err();
        assert_eq!(err.path(), "[1]<'Id'>");
        assert_eq!(
            err.trace().last().and_then(|item| item.annotation.clone()),
            Some(Annotation::ForwardRef("Id".into()))
        );
    }
}
