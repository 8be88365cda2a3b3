//! Declaration model consumed by the generator.
//!
//! The host front end owns the declaration graph; the generator only reads it
//! through [`DeclarationView`]. [`TypeDeclaration`] is the owned implementation
//! used by the builder API and by declaration manifests.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Index, IndexMut};

bitflags! {
    /// Serialization frameworks a factory marker enables (`UseForSerialization`).
    ///
    /// The bit values match the `SerializationFrameworks` enum of the C# runtime,
    /// so raw integer values coming from a host round-trip unchanged.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct SerializationFrameworks: u8 {
        /// System.Text.Json
        const JSON = 1;
        /// MessagePack-CSharp
        const MESSAGE_PACK = 2;
        /// Newtonsoft.Json
        const NEWTONSOFT_JSON = 4;
    }
}

impl SerializationFrameworks {
    /// Parse the C# spelling of a flag combination.
    ///
    /// Accepts member names (`Json`, `MessagePack`, `NewtonsoftJson`, `All`,
    /// `None`), optionally qualified (`SerializationFrameworks.Json`) and joined
    /// with `|` or `,`, as well as a raw integer value. Unknown names or bits
    /// yield `None`.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Ok(raw) = text.parse::<i64>() {
            return Self::from_raw(raw);
        }

        let mut flags = Self::empty();
        for part in text.split(['|', ',']) {
            let name = part.trim();
            let name = name.rsplit('.').next().unwrap_or(name);
            flags |= match name {
                "Json" => Self::JSON,
                "MessagePack" => Self::MESSAGE_PACK,
                "NewtonsoftJson" => Self::NEWTONSOFT_JSON,
                "All" => Self::all(),
                "None" => Self::empty(),
                _ => return None,
            };
        }
        Some(flags)
    }

    /// Interpret a raw enum value, rejecting bits outside the known set.
    pub fn from_raw(raw: i64) -> Option<Self> {
        let bits = u8::try_from(raw).ok()?;
        Self::from_bits(bits)
    }
}

/// One of the three supported serialization frameworks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Framework {
    /// System.Text.Json, the current JSON stack.
    Json,
    /// MessagePack-CSharp, the binary stack.
    MessagePack,
    /// Newtonsoft.Json, the legacy JSON stack.
    NewtonsoftJson,
}

impl Framework {
    /// All frameworks in their fixed evaluation order.
    pub const ALL: [Framework; 3] = [
        Framework::Json,
        Framework::MessagePack,
        Framework::NewtonsoftJson,
    ];

    /// The enablement flag for this framework.
    pub fn flag(self) -> SerializationFrameworks {
        match self {
            Framework::Json => SerializationFrameworks::JSON,
            Framework::MessagePack => SerializationFrameworks::MESSAGE_PACK,
            Framework::NewtonsoftJson => SerializationFrameworks::NEWTONSOFT_JSON,
        }
    }

    /// Suffix appended to the qualified type name to form the output key.
    pub fn suffix(self) -> &'static str {
        match self {
            Framework::Json => "Json",
            Framework::MessagePack => "MessagePack",
            Framework::NewtonsoftJson => "NewtonsoftJson",
        }
    }

    fn index(self) -> usize {
        match self {
            Framework::Json => 0,
            Framework::MessagePack => 1,
            Framework::NewtonsoftJson => 2,
        }
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.suffix())
    }
}

/// A fixed-size table holding one value per [`Framework`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PerFramework<T>([T; 3]);

impl<T> PerFramework<T> {
    /// Build the table by evaluating `f` once per framework.
    pub fn from_fn(mut f: impl FnMut(Framework) -> T) -> Self {
        Self(Framework::ALL.map(&mut f))
    }

    /// Iterate `(framework, value)` pairs in the fixed framework order.
    pub fn iter(&self) -> impl Iterator<Item = (Framework, &T)> {
        Framework::ALL.into_iter().zip(self.0.iter())
    }
}

impl<T> Index<Framework> for PerFramework<T> {
    type Output = T;

    fn index(&self, framework: Framework) -> &T {
        &self.0[framework.index()]
    }
}

impl<T> IndexMut<Framework> for PerFramework<T> {
    fn index_mut(&mut self, framework: Framework) -> &mut T {
        &mut self.0[framework.index()]
    }
}

/// A type reference exactly as written in the host language (e.g. `string`,
/// `global::System.Guid`, `List<int>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeRef(String);

impl TypeRef {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the reference carries no usable text.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeRef {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

/// Declaration keyword of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TypeKind {
    #[default]
    #[serde(rename = "class")]
    Class,
    #[serde(rename = "struct")]
    Struct,
    #[serde(rename = "record")]
    Record,
    #[serde(rename = "record struct")]
    RecordStruct,
    #[serde(rename = "interface")]
    Interface,
}

impl TypeKind {
    /// The keyword(s) used to re-declare the type in a fragment.
    pub fn keyword(self) -> &'static str {
        match self {
            TypeKind::Class => "class",
            TypeKind::Struct => "struct",
            TypeKind::Record => "record",
            TypeKind::RecordStruct => "record struct",
            TypeKind::Interface => "interface",
        }
    }
}

/// Where a declaration or marker appears in host source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceLocation {
    pub path: String,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub column: u32,
}

impl SourceLocation {
    pub fn new(path: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            path: path.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.path, self.line, self.column)
    }
}

/// A marker argument value.
///
/// In manifests each value is tagged with its kind: `{"type": "string"}` for a
/// `typeof(string)` argument, `{"flags": "Json | MessagePack"}` or `{"int": 3}`
/// for enum values, `{"string": ".."}` and `{"bool": true}` for the rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerValue {
    Type(TypeRef),
    Flags(String),
    Int(i64),
    String(String),
    Bool(bool),
}

/// A raw marker (attribute) record attached to a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Marker {
    /// Fully-qualified marker type name, e.g. `UnionKit.ObjectFactoryAttribute`.
    pub name: String,
    /// Generic type arguments, e.g. `["string", "int"]` for `Union<string, int>`.
    #[serde(default)]
    pub type_arguments: Vec<TypeRef>,
    /// Positional constructor arguments.
    #[serde(default)]
    pub arguments: Vec<MarkerValue>,
    /// Named settings, e.g. `UseForSerialization`.
    #[serde(default)]
    pub named_arguments: BTreeMap<String, MarkerValue>,
    #[serde(default)]
    pub location: Option<SourceLocation>,
}

impl Marker {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_arguments: Vec::new(),
            arguments: Vec::new(),
            named_arguments: BTreeMap::new(),
            location: None,
        }
    }

    pub fn with_type_argument(mut self, ty: impl Into<TypeRef>) -> Self {
        self.type_arguments.push(ty.into());
        self
    }

    pub fn with_argument(mut self, value: MarkerValue) -> Self {
        self.arguments.push(value);
        self
    }

    pub fn with_named_argument(mut self, name: impl Into<String>, value: MarkerValue) -> Self {
        self.named_arguments.insert(name.into(), value);
        self
    }

    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }
}

/// One link of the enclosing-type chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContainingType {
    pub name: String,
    #[serde(default)]
    pub kind: TypeKind,
    #[serde(default)]
    pub type_parameters: Vec<String>,
    /// Whether the declaration is `partial`.
    #[serde(default = "default_partial")]
    pub partial: bool,
}

impl ContainingType {
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            type_parameters: Vec::new(),
            partial: true,
        }
    }

    pub fn with_type_parameters(mut self, params: &[&str]) -> Self {
        self.type_parameters = params.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn non_partial(mut self) -> Self {
        self.partial = false;
        self
    }
}

fn default_partial() -> bool {
    true
}

/// Read-only projection of a host type declaration.
///
/// Implementations must be cheap to query; the generator may call any method
/// several times per pass and never mutates the view.
pub trait DeclarationView {
    /// Simple (unqualified) type name.
    fn name(&self) -> &str;

    fn namespace(&self) -> Option<&str>;

    fn kind(&self) -> TypeKind;

    fn type_parameters(&self) -> &[String];

    /// Enclosing types, outermost first.
    fn containing_types(&self) -> &[ContainingType];

    /// Whether further declaration fragments may be attached to the type.
    fn is_extensible(&self) -> bool;

    fn markers(&self) -> &[Marker];

    fn location(&self) -> Option<&SourceLocation>;

    /// Metadata-style qualified name: `Ns.Outer.Inner`, with `` `N`` arity
    /// suffixes on generic links (`Ns.Box`1`).
    fn qualified_name(&self) -> String {
        let mut parts = Vec::with_capacity(self.containing_types().len() + 2);
        if let Some(ns) = self.namespace().filter(|ns| !ns.is_empty()) {
            parts.push(ns.to_string());
        }
        for outer in self.containing_types() {
            parts.push(metadata_name(&outer.name, outer.type_parameters.len()));
        }
        parts.push(metadata_name(self.name(), self.type_parameters().len()));
        parts.join(".")
    }
}

fn metadata_name(name: &str, arity: usize) -> String {
    if arity == 0 {
        name.to_string()
    } else {
        format!("{name}`{arity}")
    }
}

/// Owned type declaration, as built by hand or loaded from a manifest.
///
/// # Example
///
/// ```
/// use unionkit_codegen::{DeclarationView, Marker, TypeDeclaration};
///
/// let decl = TypeDeclaration::new("TextOrNumber")
///     .with_namespace("Demo.Models")
///     .with_marker(Marker::new("UnionKit.UnionAttribute").with_type_argument("string"));
/// assert_eq!(decl.qualified_name(), "Demo.Models.TextOrNumber");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeDeclaration {
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub kind: TypeKind,
    #[serde(default)]
    pub type_parameters: Vec<String>,
    /// Whether the declaration is `partial`.
    #[serde(default = "default_partial")]
    pub partial: bool,
    #[serde(default)]
    pub containing_types: Vec<ContainingType>,
    #[serde(default)]
    pub markers: Vec<Marker>,
    #[serde(default)]
    pub location: Option<SourceLocation>,
}

impl TypeDeclaration {
    /// A `partial class` with no namespace, no markers and no enclosing types.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            kind: TypeKind::Class,
            type_parameters: Vec::new(),
            partial: true,
            containing_types: Vec::new(),
            markers: Vec::new(),
            location: None,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_kind(mut self, kind: TypeKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_type_parameters(mut self, params: &[&str]) -> Self {
        self.type_parameters = params.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn non_partial(mut self) -> Self {
        self.partial = false;
        self
    }

    /// Append an enclosing type; call outermost first.
    pub fn nested_in(mut self, outer: ContainingType) -> Self {
        self.containing_types.push(outer);
        self
    }

    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }

    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }
}

impl DeclarationView for TypeDeclaration {
    fn name(&self) -> &str {
        &self.name
    }

    fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    fn kind(&self) -> TypeKind {
        self.kind
    }

    fn type_parameters(&self) -> &[String] {
        &self.type_parameters
    }

    fn containing_types(&self) -> &[ContainingType] {
        &self.containing_types
    }

    fn is_extensible(&self) -> bool {
        self.partial
    }

    fn markers(&self) -> &[Marker] {
        &self.markers
    }

    fn location(&self) -> Option<&SourceLocation> {
        self.location.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag_names() {
        assert_eq!(
            SerializationFrameworks::parse("Json"),
            Some(SerializationFrameworks::JSON)
        );
        assert_eq!(
            SerializationFrameworks::parse("SerializationFrameworks.Json | SerializationFrameworks.NewtonsoftJson"),
            Some(SerializationFrameworks::JSON | SerializationFrameworks::NEWTONSOFT_JSON)
        );
        assert_eq!(
            SerializationFrameworks::parse("Json, MessagePack"),
            Some(SerializationFrameworks::JSON | SerializationFrameworks::MESSAGE_PACK)
        );
        assert_eq!(
            SerializationFrameworks::parse("All"),
            Some(SerializationFrameworks::all())
        );
        assert_eq!(
            SerializationFrameworks::parse("None"),
            Some(SerializationFrameworks::empty())
        );
    }

    #[test]
    fn test_parse_flag_raw_values() {
        assert_eq!(
            SerializationFrameworks::parse("7"),
            Some(SerializationFrameworks::all())
        );
        assert_eq!(
            SerializationFrameworks::parse("2"),
            Some(SerializationFrameworks::MESSAGE_PACK)
        );
        assert_eq!(SerializationFrameworks::parse("8"), None);
        assert_eq!(SerializationFrameworks::parse("-1"), None);
        assert_eq!(SerializationFrameworks::parse("Xml"), None);
    }

    #[test]
    fn test_framework_flags_are_disjoint() {
        for a in Framework::ALL {
            for b in Framework::ALL {
                assert_eq!(a.flag().intersects(b.flag()), a == b);
            }
        }
    }

    #[test]
    fn test_per_framework_indexing() {
        let mut table = PerFramework::from_fn(|fw| fw == Framework::MessagePack);
        assert!(!table[Framework::Json]);
        assert!(table[Framework::MessagePack]);
        table[Framework::NewtonsoftJson] = true;
        let set: Vec<_> = table.iter().filter(|(_, v)| **v).map(|(fw, _)| fw).collect();
        assert_eq!(set, vec![Framework::MessagePack, Framework::NewtonsoftJson]);
    }

    #[test]
    fn test_qualified_name() {
        let decl = TypeDeclaration::new("Inner")
            .with_namespace("Demo")
            .nested_in(ContainingType::new("Outer", TypeKind::Class).with_type_parameters(&["T"]))
            .with_type_parameters(&["A", "B"]);
        assert_eq!(decl.qualified_name(), "Demo.Outer`1.Inner`2");

        let global = TypeDeclaration::new("Plain");
        assert_eq!(global.qualified_name(), "Plain");
    }

    #[test]
    fn test_manifest_defaults() {
        let decl: TypeDeclaration = serde_json::from_str(r#"{ "name": "Foo" }"#).unwrap();
        assert_eq!(decl.kind, TypeKind::Class);
        assert!(decl.partial);
        assert!(decl.markers.is_empty());

        let kind: TypeKind = serde_json::from_str(r#""record struct""#).unwrap();
        assert_eq!(kind, TypeKind::RecordStruct);
    }

    #[test]
    fn test_marker_value_tagging() {
        let value: MarkerValue = serde_json::from_str(r#"{ "type": "string" }"#).unwrap();
        assert_eq!(value, MarkerValue::Type(TypeRef::new("string")));
        let value: MarkerValue = serde_json::from_str(r#"{ "int": 3 }"#).unwrap();
        assert_eq!(value, MarkerValue::Int(3));
    }
}
