//! Purpose: Strictly-typed values produced by a successful load.
//! Exports: `Loaded`, `Record`, `EnumMember`.
//! Role: Output side of the loader; mirrors the shapes `Type` can describe.
//! Invariants: Ordering is total so results can populate sets and mapping keys.
//! Invariants: `Raw` carries the untouched input for `any`; `Native` carries constructor output.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use ipnet::IpNet;

use crate::core::types::Scalar;
use crate::core::value::{Opaque, Value};

#[derive(Clone, Debug)]
pub enum Loaded {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Loaded>),
    Tuple(Vec<Loaded>),
    Set(BTreeSet<Loaded>),
    FrozenSet(BTreeSet<Loaded>),
    Dict(BTreeMap<Loaded, Loaded>),
    Enum(EnumMember),
    Record(Record),
    Date(time::Date),
    Time(time::Time),
    DateTime(time::PrimitiveDateTime),
    Path(PathBuf),
    Ip(IpAddr),
    /// Network address; host bits are zero.
    Network(IpNet),
    /// Host address with its network prefix.
    Interface(IpNet),
    Socket(SocketAddr),
    Url(url::Url),
    Raw(Value),
    Native(Opaque),
}

impl Loaded {
    /// Structural mirror of a dynamic value: sequences become lists, mappings become dicts.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => Self::None,
            Value::Bool(b) => Self::Bool(*b),
            Value::Int(n) => Self::Int(*n),
            Value::Float(n) => Self::Float(*n),
            Value::Str(s) => Self::Str(s.clone()),
            Value::Bytes(b) => Self::Bytes(b.clone()),
            Value::Seq(items) => Self::List(items.iter().map(Self::from_value).collect()),
            Value::Map(map) => Self::Dict(
                map.iter()
                    .map(|(k, v)| (Self::from_value(k), Self::from_value(v)))
                    .collect(),
            ),
            Value::Object(opaque) => Self::Native(opaque.clone()),
        }
    }

    pub fn scalar_kind(&self) -> Option<Scalar> {
        match self {
            Self::None => Some(Scalar::None),
            Self::Bool(_) => Some(Scalar::Bool),
            Self::Int(_) => Some(Scalar::Int),
            Self::Float(_) => Some(Scalar::Float),
            Self::Str(_) => Some(Scalar::Str),
            Self::Bytes(_) => Some(Scalar::Bytes),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Loaded]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumMember> {
        match self {
            Self::Enum(member) => Some(member),
            _ => None,
        }
    }

    fn kind_rank(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::Bool(_) => 1,
            Self::Int(_) => 2,
            Self::Float(_) => 3,
            Self::Str(_) => 4,
            Self::Bytes(_) => 5,
            Self::List(_) => 6,
            Self::Tuple(_) => 7,
            Self::Set(_) => 8,
            Self::FrozenSet(_) => 9,
            Self::Dict(_) => 10,
            Self::Enum(_) => 11,
            Self::Record(_) => 12,
            Self::Date(_) => 13,
            Self::Time(_) => 14,
            Self::DateTime(_) => 15,
            Self::Path(_) => 16,
            Self::Ip(_) => 17,
            Self::Network(_) => 18,
            Self::Interface(_) => 19,
            Self::Socket(_) => 20,
            Self::Url(_) => 21,
            Self::Raw(_) => 22,
            Self::Native(_) => 23,
        }
    }
}

impl fmt::Display for Loaded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n:?}"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Bytes(b) => write!(f, "b\"{}\"", b.escape_ascii()),
            Self::List(items) => write_items(f, "[", items.iter(), "]"),
            Self::Tuple(items) => write_items(f, "(", items.iter(), ")"),
            Self::Set(items) | Self::FrozenSet(items) => write_items(f, "{", items.iter(), "}"),
            Self::Dict(map) => {
                write!(f, "{{")?;
                for (idx, (k, v)) in map.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            Self::Enum(member) => write!(f, "{}.{}", member.enum_name, member.name),
            Self::Record(record) => write!(f, "{record}"),
            Self::Date(date) => write!(f, "{date}"),
            Self::Time(time) => write!(f, "{time}"),
            Self::DateTime(datetime) => write!(f, "{datetime}"),
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Ip(addr) => write!(f, "{addr}"),
            Self::Network(net) | Self::Interface(net) => write!(f, "{net}"),
            Self::Socket(addr) => write!(f, "{addr}"),
            Self::Url(url) => write!(f, "{url}"),
            Self::Raw(value) => write!(f, "{value}"),
            Self::Native(opaque) => write!(f, "<{}>", opaque.type_name()),
        }
    }
}

fn write_items<'a>(
    f: &mut fmt::Formatter<'_>,
    open: &str,
    items: impl Iterator<Item = &'a Loaded>,
    close: &str,
) -> fmt::Result {
    write!(f, "{open}")?;
    for (idx, item) in items.enumerate() {
        if idx > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    write!(f, "{close}")
}

impl From<bool> for Loaded {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Loaded {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Loaded {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Loaded {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Loaded {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Loaded {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<Vec<Loaded>> for Loaded {
    fn from(value: Vec<Loaded>) -> Self {
        Self::List(value)
    }
}

impl From<Record> for Loaded {
    fn from(value: Record) -> Self {
        Self::Record(value)
    }
}

impl From<EnumMember> for Loaded {
    fn from(value: EnumMember) -> Self {
        Self::Enum(value)
    }
}

impl<T: Into<Loaded>> From<Option<T>> for Loaded {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::None, Into::into)
    }
}

impl PartialEq for Loaded {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Loaded {}

impl PartialOrd for Loaded {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Loaded {
    fn cmp(&self, other: &Self) -> Ordering {
        let ka = self.kind_rank();
        let kb = other.kind_rank();
        if ka != kb {
            return ka.cmp(&kb);
        }
        match (self, other) {
            (Self::None, Self::None) => Ordering::Equal,
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b),
            (Self::Str(a), Self::Str(b)) => a.cmp(b),
            (Self::Bytes(a), Self::Bytes(b)) => a.cmp(b),
            (Self::List(a), Self::List(b)) | (Self::Tuple(a), Self::Tuple(b)) => a.cmp(b),
            (Self::Set(a), Self::Set(b)) | (Self::FrozenSet(a), Self::FrozenSet(b)) => a.cmp(b),
            (Self::Dict(a), Self::Dict(b)) => a.cmp(b),
            (Self::Enum(a), Self::Enum(b)) => a.cmp(b),
            (Self::Record(a), Self::Record(b)) => a.cmp(b),
            (Self::Date(a), Self::Date(b)) => a.cmp(b),
            (Self::Time(a), Self::Time(b)) => a.cmp(b),
            (Self::DateTime(a), Self::DateTime(b)) => a.cmp(b),
            (Self::Path(a), Self::Path(b)) => a.cmp(b),
            (Self::Ip(a), Self::Ip(b)) => a.cmp(b),
            (Self::Network(a), Self::Network(b)) | (Self::Interface(a), Self::Interface(b)) => {
                a.cmp(b)
            }
            (Self::Socket(a), Self::Socket(b)) => a.cmp(b),
            (Self::Url(a), Self::Url(b)) => a.cmp(b),
            (Self::Raw(a), Self::Raw(b)) => a.cmp(b),
            (Self::Native(a), Self::Native(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

/// Instance of a record type built by the default constructor.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Record {
    name: String,
    fields: BTreeMap<String, Loaded>,
}

impl Record {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Loaded>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Loaded>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, field: &str) -> Option<&Loaded> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> &BTreeMap<String, Loaded> {
        &self.fields
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (idx, (name, value)) in self.fields.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        write!(f, ")")
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct EnumMember {
    pub enum_name: String,
    pub name: String,
    pub value: Box<Loaded>,
}

#[cfg(test)]
mod tests {
    use super::{Loaded, Record};
    use crate::core::value::Value;
    use serde_json::json;
    use std::collections::BTreeSet;

    #[test]
    fn from_value_mirrors_structure() {
        let loaded = Loaded::from_value(&Value::from(json!({"a": [1, null]})));
        let Loaded::Dict(map) = loaded else {
            panic!("expected dict");
        };
        assert_eq!(
            map.get(&Loaded::from("a")),
            Some(&Loaded::List(vec![Loaded::Int(1), Loaded::None]))
        );
    }

    #[test]
    fn floats_are_orderable_in_sets() {
        let set: BTreeSet<Loaded> = [Loaded::Float(2.5), Loaded::Float(f64::NAN), Loaded::Float(2.5)]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn record_display_lists_fields_in_order() {
        let record = Record::new("Person").with("name", "Alfio").with("address", Option::<&str>::None);
        assert_eq!(record.to_string(), r#"Person(address=none, name="Alfio")"#);
    }
}
