//! Purpose: Describe the shapes the loader can produce.
//! Exports: `Type`, `Scalar`, `RecordDef`, `RecordKind`, `Totality`, `FieldDef`, `FieldDefault`,
//!   `EnumDef`, `ExternalDef`, `NewTypeDef`, `CustomDef`, `Constructor`.
//! Role: Caller-owned target-type descriptors; the loader only reads them.
//! Invariants: Containers compare structurally; records, enums, external, new and custom
//!   types compare by name. That equality keys the handler cache.
//! Invariants: Descriptors are immutable once wrapped in `Type`.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use ipnet::IpNet;
use serde::{Deserialize, Serialize};

use crate::core::error::ConstructError;
use crate::core::loaded::{Loaded, Record};
use crate::core::value::Value;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scalar {
    None,
    Bool,
    Int,
    Float,
    Str,
    Bytes,
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "str",
            Self::Bytes => "bytes",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Any,
    Scalar(Scalar),
    Union(Vec<Type>),
    Enum(Arc<EnumDef>),
    /// Fixed-arity tuple.
    Tuple(Vec<Type>),
    /// Homogeneous tuple of any length (`tuple[T, ...]`).
    VarTuple(Box<Type>),
    List(Box<Type>),
    Dict(Box<Type>, Box<Type>),
    Set(Box<Type>),
    FrozenSet(Box<Type>),
    Record(Arc<RecordDef>),
    ForwardRef(String),
    Literal(Vec<Value>),
    Date,
    Time,
    DateTime,
    External(Arc<ExternalDef>),
    NewType(Arc<NewTypeDef>),
    Custom(Arc<CustomDef>),
}

impl Type {
    pub fn none() -> Self {
        Self::Scalar(Scalar::None)
    }

    pub fn bool() -> Self {
        Self::Scalar(Scalar::Bool)
    }

    pub fn int() -> Self {
        Self::Scalar(Scalar::Int)
    }

    pub fn float() -> Self {
        Self::Scalar(Scalar::Float)
    }

    pub fn str() -> Self {
        Self::Scalar(Scalar::Str)
    }

    pub fn bytes() -> Self {
        Self::Scalar(Scalar::Bytes)
    }

    pub fn list(item: Type) -> Self {
        Self::List(Box::new(item))
    }

    pub fn set(item: Type) -> Self {
        Self::Set(Box::new(item))
    }

    pub fn frozen_set(item: Type) -> Self {
        Self::FrozenSet(Box::new(item))
    }

    pub fn dict(key: Type, value: Type) -> Self {
        Self::Dict(Box::new(key), Box::new(value))
    }

    pub fn tuple(items: impl IntoIterator<Item = Type>) -> Self {
        Self::Tuple(items.into_iter().collect())
    }

    pub fn var_tuple(item: Type) -> Self {
        Self::VarTuple(Box::new(item))
    }

    pub fn forward_ref(name: impl Into<String>) -> Self {
        Self::ForwardRef(name.into())
    }

    pub fn literal<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::Literal(values.into_iter().map(Into::into).collect())
    }

    /// Builds a union, flattening nested unions and dropping repeated alternatives.
    /// A single remaining alternative is returned as-is.
    pub fn union(alternatives: impl IntoIterator<Item = Type>) -> Self {
        let mut flat: Vec<Type> = Vec::new();
        for alternative in alternatives {
            let nested = match alternative {
                Self::Union(inner) => inner,
                other => vec![other],
            };
            for ty in nested {
                if !flat.contains(&ty) {
                    flat.push(ty);
                }
            }
        }
        if flat.len() == 1 {
            return flat.remove(0);
        }
        Self::Union(flat)
    }

    pub fn optional(inner: Type) -> Self {
        Self::union([inner, Self::none()])
    }

    pub fn path() -> Self {
        Self::External(Arc::new(ExternalDef::path()))
    }

    pub fn ip_address() -> Self {
        Self::External(Arc::new(ExternalDef::ip_address()))
    }

    pub fn ipv4_address() -> Self {
        Self::External(Arc::new(ExternalDef::ipv4_address()))
    }

    pub fn ipv6_address() -> Self {
        Self::External(Arc::new(ExternalDef::ipv6_address()))
    }

    pub fn ip_network() -> Self {
        Self::External(Arc::new(ExternalDef::ip_network()))
    }

    pub fn ipv4_network() -> Self {
        Self::External(Arc::new(ExternalDef::ipv4_network()))
    }

    pub fn ipv6_network() -> Self {
        Self::External(Arc::new(ExternalDef::ipv6_network()))
    }

    pub fn ipv4_interface() -> Self {
        Self::External(Arc::new(ExternalDef::ipv4_interface()))
    }

    pub fn ipv6_interface() -> Self {
        Self::External(Arc::new(ExternalDef::ipv6_interface()))
    }

    pub fn socket_address() -> Self {
        Self::External(Arc::new(ExternalDef::socket_address()))
    }

    pub fn url() -> Self {
        Self::External(Arc::new(ExternalDef::url()))
    }

    pub fn new_type(name: impl Into<String>, supertype: Type) -> Self {
        Self::NewType(Arc::new(NewTypeDef {
            name: name.into(),
            supertype,
        }))
    }

    pub fn custom(name: impl Into<String>, params: impl IntoIterator<Item = Type>) -> Self {
        Self::Custom(Arc::new(CustomDef {
            name: name.into(),
            params: params.into_iter().collect(),
        }))
    }

    /// Name under which the type is registered for forward references.
    /// Containers, unions and literals are anonymous.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Any => Some("any"),
            Self::Scalar(Scalar::None) => Some("none"),
            Self::Scalar(Scalar::Bool) => Some("bool"),
            Self::Scalar(Scalar::Int) => Some("int"),
            Self::Scalar(Scalar::Float) => Some("float"),
            Self::Scalar(Scalar::Str) => Some("str"),
            Self::Scalar(Scalar::Bytes) => Some("bytes"),
            Self::Enum(def) => Some(def.name.as_str()),
            Self::Record(def) => Some(def.name()),
            Self::Date => Some("date"),
            Self::Time => Some("time"),
            Self::DateTime => Some("datetime"),
            Self::External(def) => Some(def.name.as_str()),
            Self::NewType(def) => Some(def.name.as_str()),
            Self::Custom(def) => Some(def.name.as_str()),
            Self::Union(_)
            | Self::Tuple(_)
            | Self::VarTuple(_)
            | Self::List(_)
            | Self::Dict(_, _)
            | Self::Set(_)
            | Self::FrozenSet(_)
            | Self::ForwardRef(_)
            | Self::Literal(_) => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "any"),
            Self::Scalar(scalar) => write!(f, "{scalar}"),
            Self::Union(items) => write_params(f, "union", items),
            Self::Enum(def) => write!(f, "{}", def.name),
            Self::Tuple(items) => write_params(f, "tuple", items),
            Self::VarTuple(item) => write!(f, "tuple<{item}, ...>"),
            Self::List(item) => write!(f, "list<{item}>"),
            Self::Dict(key, value) => write!(f, "dict<{key}, {value}>"),
            Self::Set(item) => write!(f, "set<{item}>"),
            Self::FrozenSet(item) => write!(f, "frozenset<{item}>"),
            Self::Record(def) => write!(f, "{}", def.name()),
            Self::ForwardRef(name) => write!(f, "'{name}'"),
            Self::Literal(values) => {
                write!(f, "literal<")?;
                for (idx, value) in values.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{value}")?;
                }
                write!(f, ">")
            }
            Self::Date => write!(f, "date"),
            Self::Time => write!(f, "time"),
            Self::DateTime => write!(f, "datetime"),
            Self::External(def) => write!(f, "{}", def.name),
            Self::NewType(def) => write!(f, "{}", def.name),
            Self::Custom(def) if def.params.is_empty() => write!(f, "{}", def.name),
            Self::Custom(def) => write_params(f, &def.name, &def.params),
        }
    }
}

fn write_params(f: &mut fmt::Formatter<'_>, name: &str, items: &[Type]) -> fmt::Result {
    write!(f, "{name}<")?;
    for (idx, item) in items.iter().enumerate() {
        if idx > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    write!(f, ">")
}

/// Builds a record value from decoded field values.
pub type Constructor =
    Arc<dyn Fn(&RecordDef, BTreeMap<String, Loaded>) -> Result<Loaded, ConstructError> + Send + Sync>;

pub type Factory = Arc<dyn Fn() -> Loaded + Send + Sync>;

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum RecordKind {
    /// Positional record; every field without a default is required.
    NamedTuple,
    /// Field-based record with per-field defaults, factories, `init` flags and metadata.
    DataClass,
    /// Attribute-class record; same field model as `DataClass`, factories count as defaults.
    Attrs,
    /// Mapping with a fixed key schema.
    TypedDict(Totality),
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Totality {
    /// Every declared key is required.
    Total,
    /// No key is required.
    Partial,
    /// Exactly these keys are required.
    Keys(BTreeSet<String>),
}

#[derive(Clone, Default)]
pub enum FieldDefault {
    #[default]
    Missing,
    Value(Loaded),
    Factory(Factory),
}

impl fmt::Debug for FieldDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "Missing"),
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Factory(_) => write!(f, "Factory(..)"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct FieldDef {
    name: String,
    ty: Type,
    default: FieldDefault,
    init: bool,
    metadata: BTreeMap<String, String>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            default: FieldDefault::Missing,
            init: true,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_default(mut self, value: impl Into<Loaded>) -> Self {
        self.default = FieldDefault::Value(value.into());
        self
    }

    pub fn with_factory(mut self, factory: impl Fn() -> Loaded + Send + Sync + 'static) -> Self {
        self.default = FieldDefault::Factory(Arc::new(factory));
        self
    }

    /// Fields with `init = false` are not accepted as constructor input.
    pub fn with_init(mut self, init: bool) -> Self {
        self.init = init;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Shorthand for aliasing under the default mangle key.
    pub fn with_alias(self, external: impl Into<String>) -> Self {
        self.with_metadata("name", external)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn default(&self) -> &FieldDefault {
        &self.default
    }

    pub fn init(&self) -> bool {
        self.init
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    pub fn has_default(&self) -> bool {
        !matches!(self.default, FieldDefault::Missing)
    }

    fn default_value(&self) -> Option<Loaded> {
        match &self.default {
            FieldDefault::Missing => None,
            FieldDefault::Value(value) => Some(value.clone()),
            FieldDefault::Factory(factory) => Some(factory()),
        }
    }
}

#[derive(Clone)]
pub struct RecordDef {
    name: String,
    kind: RecordKind,
    fields: Vec<FieldDef>,
    constructor: Option<Constructor>,
}

impl RecordDef {
    pub fn new(name: impl Into<String>, kind: RecordKind) -> Self {
        Self {
            name: name.into(),
            kind,
            fields: Vec::new(),
            constructor: None,
        }
    }

    pub fn named_tuple(name: impl Into<String>) -> Self {
        Self::new(name, RecordKind::NamedTuple)
    }

    pub fn data_class(name: impl Into<String>) -> Self {
        Self::new(name, RecordKind::DataClass)
    }

    pub fn attrs(name: impl Into<String>) -> Self {
        Self::new(name, RecordKind::Attrs)
    }

    pub fn typed_dict(name: impl Into<String>, totality: Totality) -> Self {
        Self::new(name, RecordKind::TypedDict(totality))
    }

    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_constructor(
        mut self,
        constructor: impl Fn(&RecordDef, BTreeMap<String, Loaded>) -> Result<Loaded, ConstructError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.constructor = Some(Arc::new(constructor));
        self
    }

    pub fn into_type(self) -> Type {
        Type::Record(Arc::new(self))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &RecordKind {
        &self.kind
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Fields that must be present in the input, computed per record kind.
    pub fn required_fields(&self) -> BTreeSet<&str> {
        match &self.kind {
            RecordKind::NamedTuple => self
                .fields
                .iter()
                .filter(|field| !field.has_default())
                .map(|field| field.name.as_str())
                .collect(),
            RecordKind::DataClass | RecordKind::Attrs => self
                .fields
                .iter()
                .filter(|field| field.init && !field.has_default())
                .map(|field| field.name.as_str())
                .collect(),
            RecordKind::TypedDict(Totality::Total) => {
                self.fields.iter().map(|field| field.name.as_str()).collect()
            }
            RecordKind::TypedDict(Totality::Partial) => BTreeSet::new(),
            RecordKind::TypedDict(Totality::Keys(keys)) => self
                .fields
                .iter()
                .filter(|field| keys.contains(&field.name))
                .map(|field| field.name.as_str())
                .collect(),
        }
    }

    /// External-name to field-name table built from `metadata[mangle_key]`.
    /// Only field-based kinds (data class, attrs) support aliasing.
    pub fn aliases(&self, mangle_key: &str) -> Result<BTreeMap<&str, &str>, String> {
        let mut table = BTreeMap::new();
        if !matches!(self.kind, RecordKind::DataClass | RecordKind::Attrs) {
            return Ok(table);
        }
        for field in &self.fields {
            let Some(external) = field.metadata.get(mangle_key) else {
                continue;
            };
            if external.is_empty() {
                continue;
            }
            if let Some(previous) = table.insert(external.as_str(), field.name.as_str()) {
                return Err(format!(
                    "external name '{external}' is claimed by both '{previous}' and '{}' in {}",
                    field.name, self.name
                ));
            }
        }
        Ok(table)
    }

    /// Runs the custom constructor, or the default one that builds `Loaded::Record`.
    pub fn construct(&self, params: BTreeMap<String, Loaded>) -> Result<Loaded, ConstructError> {
        match &self.constructor {
            Some(constructor) => constructor(self, params),
            None => self.default_construct(params).map(Loaded::Record),
        }
    }

    /// Default construction: fills defaults and rejects unknown, non-init or missing arguments.
    pub fn default_construct(
        &self,
        mut params: BTreeMap<String, Loaded>,
    ) -> Result<Record, ConstructError> {
        let mut record = Record::new(&self.name);
        let is_typed_dict = matches!(self.kind, RecordKind::TypedDict(_));
        for field in &self.fields {
            let accepts_input = field.init || self.kind == RecordKind::NamedTuple || is_typed_dict;
            match params.remove(&field.name) {
                Some(_) if !accepts_input => {
                    return Err(ConstructError::Shape(format!(
                        "{}() got an unexpected keyword argument '{}'",
                        self.name, field.name
                    )));
                }
                Some(value) => record.insert(&field.name, value),
                None if is_typed_dict => {}
                None => match field.default_value() {
                    Some(value) => record.insert(&field.name, value),
                    None if accepts_input => {
                        return Err(ConstructError::Shape(format!(
                            "{}() missing required argument '{}'",
                            self.name, field.name
                        )));
                    }
                    None => {}
                },
            }
        }
        if let Some(extra) = params.keys().next() {
            return Err(ConstructError::Shape(format!(
                "{}() got an unexpected keyword argument '{extra}'",
                self.name
            )));
        }
        Ok(record)
    }
}

impl fmt::Debug for RecordDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordDef")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("fields", &self.fields)
            .field("custom_constructor", &self.constructor.is_some())
            .finish()
    }
}

impl PartialEq for RecordDef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for RecordDef {}

impl Hash for RecordDef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

#[derive(Clone, Debug)]
pub struct EnumDef {
    name: String,
    members: Vec<(String, Loaded)>,
    hints: Vec<Type>,
}

impl EnumDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
            hints: Vec::new(),
        }
    }

    pub fn member(mut self, name: impl Into<String>, value: impl Into<Loaded>) -> Self {
        self.members.push((name.into(), value.into()));
        self
    }

    /// Declares a type the raw value may be loaded into before member lookup.
    /// Hints are tried in declaration order.
    pub fn hint(mut self, ty: Type) -> Self {
        self.hints.push(ty);
        self
    }

    pub fn into_type(self) -> Type {
        Type::Enum(Arc::new(self))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &[(String, Loaded)] {
        &self.members
    }

    pub fn hints(&self) -> &[Type] {
        &self.hints
    }

    /// Member whose value equals `value`; ints and floats match when numerically equal.
    pub fn member_by_value(&self, value: &Loaded) -> Option<(&str, &Loaded)> {
        self.members
            .iter()
            .find(|(_, member)| member == value || numerically_equal(member, value))
            .map(|(name, member)| (name.as_str(), member))
    }
}

fn numerically_equal(a: &Loaded, b: &Loaded) -> bool {
    match (a, b) {
        (Loaded::Int(n), Loaded::Float(f)) | (Loaded::Float(f), Loaded::Int(n)) => {
            f.fract() == 0.0 && *f == *n as f64 && *f as i64 == *n
        }
        _ => false,
    }
}

impl PartialEq for EnumDef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for EnumDef {}

impl Hash for EnumDef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

pub type StrParser = Arc<dyn Fn(&str) -> Result<Loaded, ConstructError> + Send + Sync>;

/// A type constructed directly from a string.
#[derive(Clone)]
pub struct ExternalDef {
    name: String,
    parse: StrParser,
}

impl ExternalDef {
    pub fn new(
        name: impl Into<String>,
        parse: impl Fn(&str) -> Result<Loaded, ConstructError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            parse: Arc::new(parse),
        }
    }

    pub fn path() -> Self {
        Self::new("path", |text| Ok(Loaded::Path(PathBuf::from(text))))
    }

    pub fn ip_address() -> Self {
        Self::new("ip_address", |text| {
            text.parse::<IpAddr>()
                .map(Loaded::Ip)
                .map_err(|err| ConstructError::Rejected(format!("{text:?}: {err}")))
        })
    }

    pub fn ipv4_address() -> Self {
        Self::new("ipv4_address", |text| {
            text.parse::<Ipv4Addr>()
                .map(|addr| Loaded::Ip(IpAddr::V4(addr)))
                .map_err(|err| ConstructError::Rejected(format!("{text:?}: {err}")))
        })
    }

    pub fn ipv6_address() -> Self {
        Self::new("ipv6_address", |text| {
            text.parse::<Ipv6Addr>()
                .map(|addr| Loaded::Ip(IpAddr::V6(addr)))
                .map_err(|err| ConstructError::Rejected(format!("{text:?}: {err}")))
        })
    }

    /// Any-family network; host bits must be zero.
    pub fn ip_network() -> Self {
        Self::new("ip_network", |text| {
            parse_ip_net(text, "IP", |_| true, true).map(Loaded::Network)
        })
    }

    pub fn ipv4_network() -> Self {
        Self::new("ipv4_network", |text| {
            parse_ip_net(text, "IPv4", |net| net.addr().is_ipv4(), true).map(Loaded::Network)
        })
    }

    pub fn ipv6_network() -> Self {
        Self::new("ipv6_network", |text| {
            parse_ip_net(text, "IPv6", |net| net.addr().is_ipv6(), true).map(Loaded::Network)
        })
    }

    /// Address plus prefix; host bits are kept.
    pub fn ipv4_interface() -> Self {
        Self::new("ipv4_interface", |text| {
            parse_ip_net(text, "IPv4", |net| net.addr().is_ipv4(), false).map(Loaded::Interface)
        })
    }

    pub fn ipv6_interface() -> Self {
        Self::new("ipv6_interface", |text| {
            parse_ip_net(text, "IPv6", |net| net.addr().is_ipv6(), false).map(Loaded::Interface)
        })
    }

    pub fn socket_address() -> Self {
        Self::new("socket_address", |text| {
            text.parse::<SocketAddr>()
                .map(Loaded::Socket)
                .map_err(|err| ConstructError::Rejected(format!("{text:?}: {err}")))
        })
    }

    pub fn url() -> Self {
        Self::new("url", |text| {
            url::Url::parse(text)
                .map(Loaded::Url)
                .map_err(|err| ConstructError::Rejected(format!("{text:?}: {err}")))
        })
    }

    pub fn into_type(self) -> Type {
        Type::External(Arc::new(self))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parse(&self, text: &str) -> Result<Loaded, ConstructError> {
        (self.parse)(text)
    }
}

/// Parses `addr/prefix` or a bare address (full-length prefix).
fn parse_ip_net(
    text: &str,
    family: &str,
    accepts: fn(&IpNet) -> bool,
    strict: bool,
) -> Result<IpNet, ConstructError> {
    let rejected = |reason: String| ConstructError::Rejected(format!("{text:?}: {reason}"));
    let net = if text.contains('/') {
        text.parse::<IpNet>().map_err(|err| rejected(err.to_string()))?
    } else {
        let addr = text.parse::<IpAddr>().map_err(|err| rejected(err.to_string()))?;
        let prefix = match addr {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };
        IpNet::new(addr, prefix).map_err(|err| rejected(err.to_string()))?
    };
    if !accepts(&net) {
        return Err(rejected(format!("not an {family} network")));
    }
    if strict && net.trunc() != net {
        return Err(rejected("has host bits set".to_string()));
    }
    Ok(net)
}

impl fmt::Debug for ExternalDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalDef")
            .field("name", &self.name)
            .finish()
    }
}

impl PartialEq for ExternalDef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for ExternalDef {}

impl Hash for ExternalDef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// Named alias of another type; loads exactly like its supertype.
#[derive(Clone, Debug)]
pub struct NewTypeDef {
    name: String,
    supertype: Type,
}

impl NewTypeDef {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn supertype(&self) -> &Type {
        &self.supertype
    }
}

impl PartialEq for NewTypeDef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for NewTypeDef {}

impl Hash for NewTypeDef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// Shape with no built-in handler; supported by appending a custom `Handler`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CustomDef {
    name: String,
    params: Vec<Type>,
}

impl CustomDef {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[Type] {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldDef, RecordDef, Scalar, Totality, Type};
    use crate::core::error::ConstructError;
    use crate::core::loaded::Loaded;
    use std::collections::{BTreeMap, BTreeSet};

    #[test]
    fn union_flattens_and_dedups() {
        let ty = Type::union([
            Type::int(),
            Type::union([Type::str(), Type::int()]),
            Type::none(),
        ]);
        assert_eq!(ty, Type::Union(vec![Type::int(), Type::str(), Type::none()]));
        assert_eq!(Type::union([Type::int(), Type::int()]), Type::int());
        assert_eq!(ty.to_string(), "union<int, str, none>");
    }

    #[test]
    fn records_compare_by_name() {
        let a = RecordDef::data_class("Point")
            .field(FieldDef::new("x", Type::int()))
            .into_type();
        let b = RecordDef::data_class("Point").into_type();
        let c = RecordDef::data_class("Other").into_type();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.name(), Some("Point"));
        assert_eq!(Type::list(Type::int()).name(), None);
        assert_eq!(Type::Scalar(Scalar::Float).name(), Some("float"));
    }

    #[test]
    fn required_fields_follow_record_kind() {
        let fields = || {
            vec![
                FieldDef::new("a", Type::int()),
                FieldDef::new("b", Type::int()).with_default(1),
                FieldDef::new("c", Type::list(Type::int())).with_factory(|| Loaded::List(Vec::new())),
                FieldDef::new("d", Type::str()).with_init(false),
            ]
        };
        let build = |def: RecordDef| fields().into_iter().fold(def, RecordDef::field);

        let named = build(RecordDef::named_tuple("N"));
        assert_eq!(named.required_fields(), BTreeSet::from(["a", "d"]));

        let data = build(RecordDef::data_class("D"));
        assert_eq!(data.required_fields(), BTreeSet::from(["a"]));

        let attrs = build(RecordDef::attrs("A"));
        assert_eq!(attrs.required_fields(), BTreeSet::from(["a"]));

        let total = build(RecordDef::typed_dict("T", Totality::Total));
        assert_eq!(total.required_fields().len(), 4);

        let partial = build(RecordDef::typed_dict("P", Totality::Partial));
        assert!(partial.required_fields().is_empty());

        let keys = BTreeSet::from(["b".to_string(), "zz".to_string()]);
        let explicit = build(RecordDef::typed_dict("K", Totality::Keys(keys)));
        assert_eq!(explicit.required_fields(), BTreeSet::from(["b"]));
    }

    #[test]
    fn conflicting_aliases_are_rejected() {
        let def = RecordDef::data_class("Clash")
            .field(FieldDef::new("a", Type::int()).with_alias("x"))
            .field(FieldDef::new("b", Type::int()).with_alias("x"));
        let err = def.aliases("name").unwrap_err();
        assert!(err.contains("'x'"));
    }

    #[test]
    fn default_construct_fills_defaults_and_rejects_unknown() {
        let def = RecordDef::attrs("Person")
            .field(FieldDef::new("name", Type::str()).with_default("Turiddu"))
            .field(FieldDef::new("id", Type::str()).with_init(false).with_factory(|| "generated".into()));

        let record = def.default_construct(BTreeMap::new()).expect("construct");
        assert_eq!(record.get("name"), Some(&Loaded::from("Turiddu")));
        assert_eq!(record.get("id"), Some(&Loaded::from("generated")));

        let params = BTreeMap::from([("id".to_string(), Loaded::from("x"))]);
        assert!(matches!(
            def.default_construct(params),
            Err(ConstructError::Shape(_))
        ));

        let params = BTreeMap::from([("nope".to_string(), Loaded::Int(1))]);
        assert!(matches!(
            def.default_construct(params),
            Err(ConstructError::Shape(_))
        ));
    }
}
