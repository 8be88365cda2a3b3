//! Marker registry mapping marker type names to the role they play.
//!
//! The registry is the single place where the generator learns which markers
//! declare a union, which declare a serialization factory, and which already
//! wire a type into a framework. Built-in identities are registered by
//! [`MarkerRegistry::with_builtins`]; callers can add aliases for re-exported
//! or renamed markers.

use std::collections::HashMap;

use crate::types::Framework;

/// What a recognized marker means to the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerRole {
    /// Declares a tagged union; generic or `typeof` arguments list the ad hoc
    /// variant types.
    Union,
    /// Declares a value factory with a key type and a `UseForSerialization` setting.
    Factory,
    /// An existing converter/formatter registration for a framework.
    Wiring(Framework),
}

/// A registry of marker type name -> [`MarkerRole`] associations.
///
/// # Built-in identities
///
/// | Marker | Role |
/// |--------|------|
/// | `UnionKit.UnionAttribute` | union |
/// | `UnionKit.AdHocUnionAttribute` | union |
/// | `UnionKit.ObjectFactoryAttribute` | factory |
/// | `System.Text.Json.Serialization.JsonConverterAttribute` | Json wiring |
/// | `MessagePack.MessagePackFormatterAttribute` | MessagePack wiring |
/// | `Newtonsoft.Json.JsonConverterAttribute` | NewtonsoftJson wiring |
///
/// Names are compared after [`normalize_marker_name`], so `global::` prefixes,
/// the `Attribute` suffix and generic arity are irrelevant.
///
/// ```
/// use unionkit_codegen::registry::{MarkerRegistry, MarkerRole};
///
/// let mut registry = MarkerRegistry::with_builtins();
/// registry.register("Acme.Types.Factory", MarkerRole::Factory);
/// assert_eq!(registry.get("global::Acme.Types.FactoryAttribute`1"), Some(MarkerRole::Factory));
/// ```
#[derive(Debug, Clone)]
pub struct MarkerRegistry {
    roles: HashMap<String, MarkerRole>,
}

impl MarkerRegistry {
    /// Create an empty registry that recognizes nothing.
    pub fn new() -> Self {
        Self {
            roles: HashMap::new(),
        }
    }

    /// Create a registry pre-populated with the built-in marker identities.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_builtins();
        registry
    }

    /// Register the built-in marker identities.
    pub fn register_builtins(&mut self) {
        self.register("UnionKit.UnionAttribute", MarkerRole::Union);
        self.register("UnionKit.AdHocUnionAttribute", MarkerRole::Union);
        self.register("UnionKit.ObjectFactoryAttribute", MarkerRole::Factory);

        // System.Text.Json and Newtonsoft share the simple name, so only the
        // qualified form identifies the framework.
        self.register(
            "System.Text.Json.Serialization.JsonConverterAttribute",
            MarkerRole::Wiring(Framework::Json),
        );
        self.register(
            "MessagePack.MessagePackFormatterAttribute",
            MarkerRole::Wiring(Framework::MessagePack),
        );
        self.register(
            "Newtonsoft.Json.JsonConverterAttribute",
            MarkerRole::Wiring(Framework::NewtonsoftJson),
        );
    }

    /// Register a role for a marker type name, replacing any existing role.
    pub fn register(&mut self, name: impl AsRef<str>, role: MarkerRole) {
        self.roles.insert(normalize_marker_name(name.as_ref()), role);
    }

    /// Remove a marker identity.
    pub fn unregister(&mut self, name: &str) -> Option<MarkerRole> {
        self.roles.remove(&normalize_marker_name(name))
    }

    /// Look up the role of a marker type name.
    pub fn get(&self, name: &str) -> Option<MarkerRole> {
        self.roles.get(&normalize_marker_name(name)).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.roles.contains_key(&normalize_marker_name(name))
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

impl Default for MarkerRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Canonical form of a marker type name used for identity comparison.
///
/// Strips a leading `global::`, generic arguments or arity (`<T>`, `` `1``) and
/// a trailing `Attribute` suffix:
/// `global::UnionKit.UnionAttribute<string, int>` -> `UnionKit.Union`.
pub fn normalize_marker_name(name: &str) -> String {
    let name = name.trim();
    let name = name.strip_prefix("global::").unwrap_or(name);
    let name = match name.find(['<', '`']) {
        Some(pos) => &name[..pos],
        None => name,
    };
    let name = name.trim_end();
    match name.strip_suffix("Attribute") {
        Some(stem) if !stem.is_empty() && !stem.ends_with('.') => stem.to_string(),
        _ => name.to_string(),
    }
}
