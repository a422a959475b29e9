//! Purpose: Session-scoped loader options.
//! Exports: `LoaderConfig`.
//! Role: Single place for the flags that shape dispatch, coercion and strictness.
//! Invariants: Defaults are lenient: extras ignored, scalar casts on, projections on.
//! Invariants: Unknown keys are preserved in `extra` for custom handlers.
//! Notes: Options are read while resolving handlers, so changing them requires a new `Loader`.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::core::error::Error;
use crate::core::types::Scalar;
use crate::json;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Scalar kinds that load without further conversion.
    pub basic_types: BTreeSet<Scalar>,
    /// Attempt best-effort scalar conversion instead of rejecting mismatches.
    pub basic_cast: bool,
    /// Reject mapping keys and tuple items the target type does not use.
    pub fail_on_extra: bool,
    /// Propagate handler condition failures instead of treating them as no match.
    pub raise_condition_errors: bool,
    /// Project dict-like foreign objects to mappings before loading.
    pub dict_equivalence: bool,
    /// Metadata key holding a field's external name.
    pub mangle_key: String,
    /// Try every union alternative and fail when more than one succeeds.
    pub union_debug_conflict: bool,
    /// Names of external types constructed directly from strings.
    pub str_constructed: BTreeSet<String>,
    /// Keep a name-to-type table for forward references.
    pub forward_refs: bool,
    /// Options for custom handlers; ignored by the built-in ones.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            basic_types: BTreeSet::from([
                Scalar::Int,
                Scalar::Bool,
                Scalar::Float,
                Scalar::Str,
                Scalar::None,
            ]),
            basic_cast: true,
            fail_on_extra: false,
            raise_condition_errors: true,
            dict_equivalence: true,
            mangle_key: "name".to_string(),
            union_debug_conflict: false,
            str_constructed: [
                "path",
                "ip_address",
                "ipv4_address",
                "ipv6_address",
                "ip_network",
                "ipv4_network",
                "ipv6_network",
                "ipv4_interface",
                "ipv6_interface",
                "socket_address",
                "url",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
            forward_refs: true,
            extra: BTreeMap::new(),
        }
    }
}

impl LoaderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON config document; absent keys keep their defaults.
    pub fn from_json_str(input: &str) -> Result<Self, Error> {
        json::parse::from_str_typed::<Self>(input, "loader config")
    }

    pub fn with_basic_cast(mut self, enabled: bool) -> Self {
        self.basic_cast = enabled;
        self
    }

    pub fn with_fail_on_extra(mut self, enabled: bool) -> Self {
        self.fail_on_extra = enabled;
        self
    }

    pub fn with_raise_condition_errors(mut self, enabled: bool) -> Self {
        self.raise_condition_errors = enabled;
        self
    }

    pub fn with_dict_equivalence(mut self, enabled: bool) -> Self {
        self.dict_equivalence = enabled;
        self
    }

    pub fn with_mangle_key(mut self, key: impl Into<String>) -> Self {
        self.mangle_key = key.into();
        self
    }

    pub fn with_union_debug_conflict(mut self, enabled: bool) -> Self {
        self.union_debug_conflict = enabled;
        self
    }

    pub fn with_forward_refs(mut self, enabled: bool) -> Self {
        self.forward_refs = enabled;
        self
    }

    pub fn with_basic_type(mut self, scalar: Scalar) -> Self {
        self.basic_types.insert(scalar);
        self
    }

    pub fn with_str_constructed(mut self, name: impl Into<String>) -> Self {
        self.str_constructed.insert(name.into());
        self
    }

    pub fn option(&self, key: &str) -> Option<&serde_json::Value> {
        self.extra.get(key)
    }

    pub fn is_basic(&self, scalar: Scalar) -> bool {
        self.basic_types.contains(&scalar)
    }
}
