//! Purpose: Resolve a value against the alternatives of a union type.
//! Exports: `load_union`.
//! Role: Dispatch-table routine for `Type::Union`.
//! Invariants: A basic scalar that is itself an alternative is returned unchanged.
//! Invariants: Non-basic alternatives are tried before basic ones; order is otherwise kept.
//! Invariants: Debug-conflict mode tries every alternative and rejects more than one success.

use crate::core::error::{Error, ErrorKind};
use crate::core::loaded::Loaded;
use crate::core::loader::Loader;
use crate::core::trace::Annotation;
use crate::core::typechecks;
use crate::core::types::Type;
use crate::core::value::Value;

enum Outcome {
    Loaded(Loaded),
    Failed(Error),
}

pub fn load_union(loader: &mut Loader, value: &Value, ty: &Type) -> Result<Loaded, Error> {
    let Type::Union(alternatives) = ty else {
        return Err(Error::new(ErrorKind::TypeMismatch).with_message(format!("{ty} is not a union")));
    };

    if let Some(kind) = value.scalar_kind() {
        if loader.config().is_basic(kind) && alternatives.contains(&Type::Scalar(kind)) {
            return Ok(Loaded::from_value(value));
        }
    }

    let mut ordered: Vec<&Type> = alternatives.iter().collect();
    ordered.sort_by_key(|alt| typechecks::is_basic(loader.config(), alt));

    let debug_conflict = loader.config().union_debug_conflict;
    let mut outcomes = Vec::with_capacity(ordered.len());
    for alt in ordered {
        let outcome = match loader.load_annotated(value, alt, Some(Annotation::Union(alt.clone()))) {
            Ok(loaded) => Outcome::Loaded(loaded),
            Err(err) => Outcome::Failed(err),
        };
        let stop = matches!(outcome, Outcome::Loaded(_)) && !debug_conflict;
        outcomes.push(outcome);
        if stop {
            break;
        }
    }

    let mut loaded = Vec::new();
    let mut failures = Vec::new();
    for outcome in outcomes {
        match outcome {
            Outcome::Loaded(result) => loaded.push(result),
            Outcome::Failed(err) => failures.push(err),
        }
    }

    match loaded.len() {
        1 => Ok(loaded.remove(0)),
        0 => Err(Error::new(ErrorKind::Value)
            .with_message(format!(
                "value of {} could not be loaded into {ty}",
                value.type_label()
            ))
            .with_causes(failures)),
        count => {
            tracing::debug!(%ty, count, "union alternatives conflict");
            Err(Error::new(ErrorKind::AmbiguousUnion)
                .with_message(format!(
                    "value of {} could be loaded into {ty} {count} times",
                    value.type_label()
                ))
                .with_causes(failures))
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::core::config::LoaderConfig;
    use crate::core::error::ErrorKind;
    use crate::core::loaded::Loaded;
    use crate::core::loader::Loader;
    use crate::core::trace::Annotation;
    use crate::core::types::{FieldDef, RecordDef, Type};
    use crate::core::value::Value;
    use serde_json::json;

    #[test]
    fn basic_value_matching_an_alternative_is_kept() {
        let mut loader = Loader::new();
        let ty = Type::union([Type::float(), Type::int()]);
        assert_eq!(loader.load(&Value::Int(3), &ty).expect("load"), Loaded::Int(3));
        assert_eq!(
            loader.load(&Value::Float(3.5), &ty).expect("load"),
            Loaded::Float(3.5)
        );
    }

    #[test]
    fn non_basic_alternatives_win_over_casts() {
        let mut loader = Loader::new();
        let ty = Type::union([Type::str(), Type::list(Type::int())]);
        let loaded = loader
            .load(&Value::from(json!([1, 2])), &ty)
            .expect("load");
        assert_eq!(loaded, Loaded::List(vec![Loaded::Int(1), Loaded::Int(2)]));

        let ty = Type::union([Type::int(), Type::str()]);
        assert_eq!(
            loader.load(&Value::Float(1.5), &ty).expect("load"),
            Loaded::Int(1)
        );
    }

    #[test]
    fn no_match_collects_every_failure() {
        let mut loader = Loader::with_config(LoaderConfig::default().with_basic_cast(false));
        let ty = Type::union([Type::int(), Type::list(Type::int())]);
        let err = loader.load(&Value::from("x"), &ty).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Value);
        assert_eq!(err.causes().len(), 2);
        let first = &err.causes()[0];
        assert_eq!(
            first.trace()[0].annotation,
            Some(Annotation::Union(Type::list(Type::int())))
        );
    }

    #[test]
    fn debug_conflict_rejects_ambiguous_matches() {
        let a = RecordDef::data_class("A")
            .field(FieldDef::new("x", Type::int()))
            .into_type();
        let b = RecordDef::data_class("B")
            .field(FieldDef::new("x", Type::int()))
            .into_type();
        let ty = Type::union([a.clone(), b]);
        let value = Value::from(json!({"x": 1}));

        let mut loader = Loader::new();
        let loaded = loader.load(&value, &ty).expect("first wins");
        assert_eq!(loaded.as_record().map(|r| r.name()), Some("A"));

        let mut debug =
            Loader::with_config(LoaderConfig::default().with_union_debug_conflict(true));
        let err = debug.load(&value, &ty).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AmbiguousUnion);
        assert!(err.message().expect("message").contains("2 times"));
        assert!(err.is_type_error());

        let only_a = Value::from(json!({"x": 1, "y": 2}));
        let strict = LoaderConfig::default()
            .with_union_debug_conflict(true)
            .with_fail_on_extra(true);
        let mut debug = Loader::with_config(strict);
        let ty = Type::union([
            a,
            RecordDef::data_class("C")
                .field(FieldDef::new("z", Type::int()))
                .into_type(),
        ]);
        assert!(debug.load(&only_a, &ty).is_err());
    }
}
