//! Marker extraction: turns a declaration's raw marker list into typed facts.
//!
//! Facts are computed once per declaration and per pass. Anything that cannot
//! be interpreted (a factory without a usable key type, an unknown framework
//! flag) degrades the declaration to "no factory" and is reported as a
//! diagnostic; extraction never fails the pass.

use crate::diagnostics::{Diagnostic, DiagnosticId};
use crate::registry::{MarkerRegistry, MarkerRole};
use crate::types::{
    DeclarationView, Framework, Marker, MarkerValue, PerFramework, SerializationFrameworks,
    TypeRef,
};

/// Name of the factory marker's framework-enablement setting.
pub const USE_FOR_SERIALIZATION: &str = "UseForSerialization";

/// Union status of a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UnionFact {
    pub is_union: bool,
    /// Ordered variant types of an ad hoc union; empty for a regular union.
    pub variant_types: Vec<TypeRef>,
}

impl UnionFact {
    /// Whether this is an ad hoc union over a closed list of types.
    pub fn is_ad_hoc(&self) -> bool {
        self.is_union && !self.variant_types.is_empty()
    }
}

/// A usable serialization factory marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactoryFact {
    pub key_type: TypeRef,
    pub enabled_frameworks: SerializationFrameworks,
}

/// Frameworks that already carry a converter/formatter registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExistingWiringFact(PerFramework<bool>);

impl ExistingWiringFact {
    pub fn is_wired(&self, framework: Framework) -> bool {
        self.0[framework]
    }

    pub fn mark_wired(&mut self, framework: Framework) {
        self.0[framework] = true;
    }
}

/// Everything the resolver needs to know about one declaration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MarkerFacts {
    pub union: UnionFact,
    /// `None` when there is no factory marker or it could not be interpreted.
    pub factory: Option<FactoryFact>,
    pub wiring: ExistingWiringFact,
}

impl MarkerFacts {
    pub fn has_factory_marker(&self) -> bool {
        self.factory.is_some()
    }
}

/// Facts plus any diagnostics raised while reading the markers.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub facts: MarkerFacts,
    pub diagnostics: Vec<Diagnostic>,
}

/// Extract typed facts from a declaration's markers.
pub fn extract_facts<V: DeclarationView + ?Sized>(
    view: &V,
    registry: &MarkerRegistry,
) -> Extraction {
    let mut extraction = Extraction::default();
    let mut factories = Vec::new();

    for marker in view.markers() {
        match registry.get(&marker.name) {
            Some(MarkerRole::Union) => {
                // A second union marker only matters if the first had no variants.
                if !extraction.facts.union.is_union
                    || extraction.facts.union.variant_types.is_empty()
                {
                    extraction.facts.union = UnionFact {
                        is_union: true,
                        variant_types: union_variants(marker),
                    };
                }
            }
            Some(MarkerRole::Factory) => factories.push(marker),
            Some(MarkerRole::Wiring(framework)) => extraction.facts.wiring.mark_wired(framework),
            None => {}
        }
    }

    match factories.as_slice() {
        [] => {}
        [marker] => {
            extraction.facts.factory = read_factory(view, marker, &mut extraction.diagnostics);
        }
        [first, rest @ ..] => {
            for extra in rest {
                extraction.diagnostics.push(Diagnostic::for_marker(
                    DiagnosticId::MultipleFactoryMarkers,
                    view,
                    extra,
                    format!(
                        "`{}` has more than one factory marker (first is `{}`); \
                         serializer wiring is not generated for ambiguous factories",
                        view.qualified_name(),
                        first.name,
                    ),
                ));
            }
        }
    }

    extraction
}

/// Variant types from generic arguments, or else from `typeof(..)` arguments.
fn union_variants(marker: &Marker) -> Vec<TypeRef> {
    if !marker.type_arguments.is_empty() {
        return marker.type_arguments.clone();
    }
    marker
        .arguments
        .iter()
        .filter_map(|arg| match arg {
            MarkerValue::Type(ty) => Some(ty.clone()),
            _ => None,
        })
        .collect()
}

fn read_factory<V: DeclarationView + ?Sized>(
    view: &V,
    marker: &Marker,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<FactoryFact> {
    let key_type = match factory_key_type(marker) {
        Ok(key_type) => key_type,
        Err(problem) => {
            diagnostics.push(Diagnostic::for_marker(
                DiagnosticId::UnresolvedKeyType,
                view,
                marker,
                format!(
                    "factory marker on `{}` {problem}; no serializer wiring is generated",
                    view.qualified_name()
                ),
            ));
            return None;
        }
    };

    let enabled_frameworks = match marker.named_arguments.get(USE_FOR_SERIALIZATION) {
        None => SerializationFrameworks::all(),
        Some(value) => match framework_flags(value) {
            Some(flags) => flags,
            None => {
                diagnostics.push(Diagnostic::for_marker(
                    DiagnosticId::InvalidFrameworkFlags,
                    view,
                    marker,
                    format!(
                        "`{USE_FOR_SERIALIZATION}` on `{}` is not a valid framework combination: {value:?}",
                        view.qualified_name()
                    ),
                ));
                return None;
            }
        },
    };

    Some(FactoryFact {
        key_type,
        enabled_frameworks,
    })
}

/// The single key type of a factory marker: `ObjectFactory<TKey>` or
/// `ObjectFactory(typeof(TKey))`.
fn factory_key_type(marker: &Marker) -> Result<TypeRef, &'static str> {
    let candidates: Vec<&TypeRef> = if marker.type_arguments.is_empty() {
        marker
            .arguments
            .iter()
            .filter_map(|arg| match arg {
                MarkerValue::Type(ty) => Some(ty),
                _ => None,
            })
            .collect()
    } else {
        marker.type_arguments.iter().collect()
    };

    match candidates.as_slice() {
        [] => Err("has no key type"),
        [key] if key.is_blank() => Err("has an empty key type"),
        [key] => Ok(TypeRef::new(key.as_str().trim())),
        _ => Err("has more than one key type"),
    }
}

fn framework_flags(value: &MarkerValue) -> Option<SerializationFrameworks> {
    match value {
        MarkerValue::Flags(text) | MarkerValue::String(text) => SerializationFrameworks::parse(text),
        MarkerValue::Int(raw) => SerializationFrameworks::from_raw(*raw),
        MarkerValue::Type(_) | MarkerValue::Bool(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SourceLocation, TypeDeclaration};

    fn factory(key: &str) -> Marker {
        Marker::new("UnionKit.ObjectFactoryAttribute").with_type_argument(key)
    }

    fn extract(decl: &TypeDeclaration) -> Extraction {
        extract_facts(decl, &MarkerRegistry::with_builtins())
    }

    #[test]
    fn test_no_markers() {
        let extraction = extract(&TypeDeclaration::new("Plain"));
        assert_eq!(extraction.facts, MarkerFacts::default());
        assert!(extraction.diagnostics.is_empty());
    }

    #[test]
    fn test_regular_union() {
        let decl = TypeDeclaration::new("Shape").with_marker(Marker::new("UnionKit.UnionAttribute"));
        let facts = extract(&decl).facts;
        assert!(facts.union.is_union);
        assert!(!facts.union.is_ad_hoc());
        assert!(!facts.has_factory_marker());
    }

    #[test]
    fn test_ad_hoc_union_generic_arguments() {
        let decl = TypeDeclaration::new("TextOrNumber").with_marker(
            Marker::new("UnionKit.UnionAttribute`2")
                .with_type_argument("string")
                .with_type_argument("int"),
        );
        let facts = extract(&decl).facts;
        assert!(facts.union.is_ad_hoc());
        assert_eq!(
            facts.union.variant_types,
            vec![TypeRef::new("string"), TypeRef::new("int")]
        );
    }

    #[test]
    fn test_ad_hoc_union_typeof_arguments() {
        let decl = TypeDeclaration::new("TextOrNumber").with_marker(
            Marker::new("UnionKit.AdHocUnionAttribute")
                .with_argument(MarkerValue::Type("string".into()))
                .with_argument(MarkerValue::Type("int".into()))
                .with_argument(MarkerValue::Bool(true)),
        );
        let facts = extract(&decl).facts;
        assert_eq!(
            facts.union.variant_types,
            vec![TypeRef::new("string"), TypeRef::new("int")]
        );
    }

    #[test]
    fn test_factory_defaults_to_all_frameworks() {
        let decl = TypeDeclaration::new("Amount").with_marker(factory("decimal"));
        let facts = extract(&decl).facts;
        assert_eq!(
            facts.factory,
            Some(FactoryFact {
                key_type: TypeRef::new("decimal"),
                enabled_frameworks: SerializationFrameworks::all(),
            })
        );
    }

    #[test]
    fn test_factory_with_typeof_key_and_flags() {
        let decl = TypeDeclaration::new("Amount").with_marker(
            Marker::new("global::UnionKit.ObjectFactory")
                .with_argument(MarkerValue::Type("string".into()))
                .with_named_argument(
                    USE_FOR_SERIALIZATION,
                    MarkerValue::Flags("SerializationFrameworks.Json | SerializationFrameworks.MessagePack".into()),
                ),
        );
        let factory = extract(&decl).facts.factory.unwrap();
        assert_eq!(factory.key_type, TypeRef::new("string"));
        assert_eq!(
            factory.enabled_frameworks,
            SerializationFrameworks::JSON | SerializationFrameworks::MESSAGE_PACK
        );
    }

    #[test]
    fn test_factory_with_raw_flags() {
        let decl = TypeDeclaration::new("Amount").with_marker(
            factory("string").with_named_argument(USE_FOR_SERIALIZATION, MarkerValue::Int(4)),
        );
        let factory = extract(&decl).facts.factory.unwrap();
        assert_eq!(factory.enabled_frameworks, SerializationFrameworks::NEWTONSOFT_JSON);
    }

    #[test]
    fn test_factory_without_key_is_not_eligible() {
        let decl = TypeDeclaration::new("Amount")
            .with_marker(Marker::new("UnionKit.ObjectFactoryAttribute"));
        let extraction = extract(&decl);
        assert!(!extraction.facts.has_factory_marker());
        assert_eq!(extraction.diagnostics.len(), 1);
        assert_eq!(extraction.diagnostics[0].id, DiagnosticId::UnresolvedKeyType);
        assert!(!extraction.diagnostics[0].is_error());
    }

    #[test]
    fn test_factory_with_blank_or_multiple_keys() {
        let blank = TypeDeclaration::new("A").with_marker(factory("  "));
        assert!(!extract(&blank).facts.has_factory_marker());

        let multiple = TypeDeclaration::new("B")
            .with_marker(factory("string").with_type_argument("int"));
        let extraction = extract(&multiple);
        assert!(!extraction.facts.has_factory_marker());
        assert!(extraction.diagnostics[0].message.contains("more than one key type"));
    }

    #[test]
    fn test_invalid_flags_are_reported() {
        let decl = TypeDeclaration::new("Amount").with_marker(
            factory("string")
                .with_named_argument(USE_FOR_SERIALIZATION, MarkerValue::Flags("Xml".into())),
        );
        let extraction = extract(&decl);
        assert!(!extraction.facts.has_factory_marker());
        assert_eq!(extraction.diagnostics[0].id, DiagnosticId::InvalidFrameworkFlags);
    }

    #[test]
    fn test_multiple_factories_are_rejected() {
        let decl = TypeDeclaration::new("Amount")
            .with_location(SourceLocation::new("Amount.cs", 4, 1))
            .with_marker(factory("string"))
            .with_marker(factory("int").with_location(SourceLocation::new("Amount.cs", 5, 2)));
        let extraction = extract(&decl);
        assert!(!extraction.facts.has_factory_marker());
        assert_eq!(extraction.diagnostics.len(), 1);
        let diag = &extraction.diagnostics[0];
        assert_eq!(diag.id, DiagnosticId::MultipleFactoryMarkers);
        assert!(diag.is_error());
        assert_eq!(diag.location, Some(SourceLocation::new("Amount.cs", 5, 2)));
    }

    #[test]
    fn test_existing_wiring_per_framework() {
        let decl = TypeDeclaration::new("Amount")
            .with_marker(factory("string"))
            .with_marker(Marker::new("Newtonsoft.Json.JsonConverterAttribute"))
            .with_marker(Marker::new("global::MessagePack.MessagePackFormatter"));
        let wiring = extract(&decl).facts.wiring;
        assert!(!wiring.is_wired(Framework::Json));
        assert!(wiring.is_wired(Framework::MessagePack));
        assert!(wiring.is_wired(Framework::NewtonsoftJson));
    }

    #[test]
    fn test_custom_registered_factory_alias() {
        let mut registry = MarkerRegistry::with_builtins();
        registry.register("Acme.ValueFactory", MarkerRole::Factory);
        let decl = TypeDeclaration::new("Amount")
            .with_marker(Marker::new("Acme.ValueFactoryAttribute").with_type_argument("long"));
        let facts = extract_facts(&decl, &registry).facts;
        assert_eq!(facts.factory.unwrap().key_type, TypeRef::new("long"));
    }

    #[test]
    fn test_unknown_markers_are_ignored() {
        let decl = TypeDeclaration::new("Amount")
            .with_marker(Marker::new("System.SerializableAttribute"))
            .with_marker(Marker::new("JsonConverterAttribute"));
        let extraction = extract(&decl);
        assert_eq!(extraction.facts, MarkerFacts::default());
    }
}
