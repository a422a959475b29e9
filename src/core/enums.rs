//! Purpose: Load values into enumeration members.
//! Exports: `load_enum`.
//! Role: Dispatch-table routine for `Type::Enum`.
//! Invariants: Direct member match first, then each type hint in declaration order.

use crate::core::error::{Error, ErrorKind};
use crate::core::loaded::{EnumMember, Loaded};
use crate::core::loader::Loader;
use crate::core::trace::Annotation;
use crate::core::types::{EnumDef, Type};
use crate::core::value::Value;

const LISTED_MEMBERS_MAX: usize = 10;

pub fn load_enum(loader: &mut Loader, value: &Value, ty: &Type) -> Result<Loaded, Error> {
    let Type::Enum(def) = ty else {
        return Err(Error::new(ErrorKind::TypeMismatch).with_message(format!("{ty} is not an enum")));
    };

    if let Some(member) = member(def, &Loaded::from_value(value)) {
        return Ok(member);
    }

    let mut failures = Vec::new();
    for hint in def.hints() {
        match loader.load_annotated(value, hint, Some(Annotation::Union(hint.clone()))) {
            Ok(loaded) => match member(def, &loaded) {
                Some(member) => return Ok(member),
                None => failures.push(
                    Error::new(ErrorKind::Value)
                        .with_message(format!("{loaded} is not a valid {}", def.name())),
                ),
            },
            Err(err) => failures.push(err),
        }
    }

    let basic = def.members().iter().all(|(_, member)| {
        member
            .scalar_kind()
            .is_some_and(|kind| loader.config().is_basic(kind))
    });
    let allowed = if def.members().len() <= LISTED_MEMBERS_MAX && basic {
        let listed: Vec<String> = def.members().iter().map(|(_, v)| v.to_string()).collect();
        format!("\nvalue {value} not between: {}", listed.join(", "))
    } else {
        String::new()
    };
    Err(Error::new(ErrorKind::Value)
        .with_message(format!(
            "value of {} could not be loaded into {ty}{allowed}",
            value.type_label()
        ))
        .with_causes(failures))
}

fn member(def: &EnumDef, value: &Loaded) -> Option<Loaded> {
    let (name, declared) = def.member_by_value(value)?;
    Some(Loaded::Enum(EnumMember {
        enum_name: def.name().to_string(),
        name: name.to_string(),
        value: Box::new(declared.clone()),
    }))
}

#[cfg(test)]
mod tests {
    use crate::core::error::ErrorKind;
    use crate::core::loaded::Loaded;
    use crate::core::loader::Loader;
    use crate::core::types::{EnumDef, Type};
    use crate::core::value::Value;

    fn hair() -> Type {
        EnumDef::new("Hair")
            .member("BROWN", "brown")
            .member("RED", "red")
            .member("BLOND", "blond")
            .into_type()
    }

    #[test]
    fn direct_member_match() {
        let mut loader = Loader::new();
        let loaded = loader.load(&Value::from("red"), &hair()).expect("load");
        let member = loaded.as_enum().expect("enum");
        assert_eq!(member.enum_name, "Hair");
        assert_eq!(member.name, "RED");
        assert_eq!(*member.value, Loaded::from("red"));
    }

    #[test]
    fn numerically_equal_input_selects_the_member() {
        let level = EnumDef::new("Level")
            .member("ONE", 1)
            .member("HALF", 0.5)
            .into_type();
        let mut loader = Loader::new();
        let loaded = loader.load(&Value::Float(1.0), &level).expect("load");
        let member = loaded.as_enum().expect("enum");
        assert_eq!(member.name, "ONE");
        assert_eq!(*member.value, Loaded::Int(1));
        assert_eq!(
            loader.load(&Value::Float(0.5), &level).expect("half").as_enum().map(|m| m.name.as_str()),
            Some("HALF")
        );
        assert_eq!(loader.load(&Value::Float(1.5), &level).unwrap_err().kind(), ErrorKind::Value);
        assert_eq!(loader.load(&Value::from("1"), &level).unwrap_err().kind(), ErrorKind::Value);
    }

    #[test]
    fn unknown_value_lists_allowed_members() {
        let mut loader = Loader::new();
        let err = loader.load(&Value::from("green"), &hair()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Value);
        assert!(err
            .message()
            .expect("message")
            .contains(r#"not between: "brown", "red", "blond""#));
    }

    #[test]
    fn hints_are_tried_in_declaration_order() {
        let level = EnumDef::new("Level")
            .member("ONE", 1)
            .member("ONE_STR", "1")
            .hint(Type::int())
            .hint(Type::str())
            .into_type();
        let mut loader = Loader::new();
        let loaded = loader.load(&Value::Float(1.0), &level).expect("load");
        assert_eq!(loaded.as_enum().map(|m| m.name.as_str()), Some("ONE"));
        let loaded = loader.load(&Value::Bytes(b"1".to_vec()), &level).expect("load");
        assert_eq!(loaded.as_enum().map(|m| m.name.as_str()), Some("ONE"));

        let reversed = EnumDef::new("Level2")
            .member("ONE", 1)
            .member("ONE_STR", "1")
            .hint(Type::str())
            .hint(Type::int())
            .into_type();
        let loaded = loader.load(&Value::Float(1.0), &reversed).expect("load");
        assert_eq!(loaded.as_enum().map(|m| m.name.as_str()), Some("ONE"));
        let loaded = loader.load(&Value::Bytes(b"1".to_vec()), &reversed).expect("load");
        assert_eq!(loaded.as_enum().map(|m| m.name.as_str()), Some("ONE_STR"));
    }

    #[test]
    fn many_members_are_not_listed() {
        let many = (0..11)
            .fold(EnumDef::new("Many"), |def, n| def.member(format!("N{n}"), n))
            .into_type();
        let mut loader = Loader::new();
        let err = loader.load(&Value::Int(99), &many).unwrap_err();
        assert!(!err.message().expect("message").contains("not between"));
        let hinted_failure = EnumDef::new("Hinted")
            .member("A", 1)
            .hint(Type::int())
            .into_type();
        let err = loader.load(&Value::from("2"), &hinted_failure).unwrap_err();
        assert_eq!(err.causes().len(), 1);
    }
}
