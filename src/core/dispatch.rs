//! Purpose: Ordered predicate/routine table that decides who loads a type.
//! Exports: `Handler`, `Condition`, `LoadFn`, `default_handlers`.
//! Role: The only place where the built-in shape priority is spelled out.
//! Invariants: First matching condition wins; built-in order is a contract.
//! Invariants: Callers extend the table by appending, never by reordering.

use std::fmt;
use std::sync::Arc;

use crate::core::collections;
use crate::core::config::LoaderConfig;
use crate::core::enums;
use crate::core::error::Error;
use crate::core::forward_ref;
use crate::core::loaded::Loaded;
use crate::core::loader::Loader;
use crate::core::record;
use crate::core::scalar;
use crate::core::typechecks;
use crate::core::types::Type;
use crate::core::union;
use crate::core::value::Value;

/// Decides whether a handler owns a type. Errors are propagated or treated as
/// a non-match depending on `LoaderConfig::raise_condition_errors`.
pub type Condition = Arc<dyn Fn(&LoaderConfig, &Type) -> Result<bool, Error> + Send + Sync>;

pub type LoadFn = Arc<dyn Fn(&mut Loader, &Value, &Type) -> Result<Loaded, Error> + Send + Sync>;

#[derive(Clone)]
pub struct Handler {
    name: String,
    condition: Condition,
    load: LoadFn,
}

impl Handler {
    pub fn new(
        name: impl Into<String>,
        condition: impl Fn(&LoaderConfig, &Type) -> Result<bool, Error> + Send + Sync + 'static,
        load: impl Fn(&mut Loader, &Value, &Type) -> Result<Loaded, Error> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            condition: Arc::new(condition),
            load: Arc::new(load),
        }
    }

    /// Handler whose condition is an infallible predicate on the type alone.
    pub fn for_shape(
        name: impl Into<String>,
        shape: fn(&Type) -> bool,
        load: impl Fn(&mut Loader, &Value, &Type) -> Result<Loaded, Error> + Send + Sync + 'static,
    ) -> Self {
        Self::new(name, move |_, ty| Ok(shape(ty)), load)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn matches(&self, config: &LoaderConfig, ty: &Type) -> Result<bool, Error> {
        (self.condition)(config, ty)
    }

    pub(crate) fn load_fn(&self) -> LoadFn {
        Arc::clone(&self.load)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler").field("name", &self.name).finish()
    }
}

/// Built-in handlers in priority order.
pub fn default_handlers() -> Vec<Handler> {
    vec![
        Handler::for_shape("none", typechecks::is_none, scalar::load_none),
        Handler::for_shape("union", typechecks::is_union, union::load_union),
        Handler::new(
            "basic",
            |config, ty| Ok(typechecks::is_basic(config, ty)),
            scalar::load_basic,
        ),
        Handler::for_shape("enum", typechecks::is_enum, enums::load_enum),
        Handler::for_shape("tuple", typechecks::is_tuple, collections::load_tuple),
        Handler::for_shape("list", typechecks::is_list, collections::load_list),
        Handler::for_shape("dict", typechecks::is_dict, collections::load_dict),
        Handler::for_shape("set", typechecks::is_set, collections::load_set),
        Handler::for_shape(
            "frozenset",
            typechecks::is_frozen_set,
            collections::load_frozen_set,
        ),
        Handler::for_shape(
            "namedtuple",
            typechecks::is_named_tuple,
            record::load_named_tuple,
        ),
        Handler::for_shape("dataclass", typechecks::is_dataclass, record::load_dataclass),
        Handler::for_shape(
            "forwardref",
            typechecks::is_forward_ref,
            forward_ref::load_forward_ref,
        ),
        Handler::for_shape("literal", typechecks::is_literal, scalar::load_literal),
        Handler::for_shape(
            "typeddict",
            typechecks::is_typed_dict,
            record::load_typed_dict,
        ),
        Handler::for_shape("temporal", typechecks::is_temporal, scalar::load_temporal),
        Handler::new(
            "str_constructed",
            |config, ty| Ok(typechecks::is_str_constructed(config, ty)),
            scalar::load_str_constructed,
        ),
        Handler::for_shape("attrs", typechecks::is_attrs, record::load_attrs),
        Handler::for_shape("any", typechecks::is_any, scalar::load_any),
        Handler::for_shape("newtype", typechecks::is_new_type, scalar::load_new_type),
    ]
}
