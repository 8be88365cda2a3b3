//! C# fragment emission.
//!
//! A fragment re-declares the target type (and its enclosing types) as
//! `partial` and attaches the framework's converter registration attribute.
//! Output depends only on the declaration, the framework and the key type.

use crate::diagnostics::{Diagnostic, DiagnosticId};
use crate::types::{DeclarationView, Framework, TypeRef};

/// Default root namespace of the converter runtime referenced by fragments.
pub const DEFAULT_RUNTIME_NAMESPACE: &str = "UnionKit";

const INDENT: &str = "   ";

/// A generated source fragment and its stable output key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub key: String,
    pub content: String,
}

/// Settings shared by every fragment of a pass.
#[derive(Debug, Clone, Copy)]
pub struct EmitOptions<'a> {
    /// Extra comment lines placed under `// <auto-generated />`.
    pub header: Option<&'a str>,
    /// Root namespace of the converter/formatter runtime.
    pub runtime_namespace: &'a str,
}

impl Default for EmitOptions<'_> {
    fn default() -> Self {
        Self {
            header: None,
            runtime_namespace: DEFAULT_RUNTIME_NAMESPACE,
        }
    }
}

/// The stable output key: `<qualified name>.<framework suffix>`.
pub fn output_key<V: DeclarationView + ?Sized>(view: &V, framework: Framework) -> String {
    format!("{}.{}", view.qualified_name(), framework.suffix())
}

/// File name used when a fragment is written to disk.
///
/// Generic arity markers are kept; characters that are not portable in file
/// names are replaced with `_`.
pub fn file_name(key: &str) -> String {
    let stem: String = key
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' | ' ' => '_',
            c => c,
        })
        .collect();
    format!("{stem}.g.cs")
}

/// The framework's converter registration attribute for `target` keyed by `key_type`.
pub fn wiring_attribute(
    framework: Framework,
    target: &str,
    key_type: &TypeRef,
    runtime_namespace: &str,
) -> String {
    let (attribute, converter) = match framework {
        Framework::Json => (
            "global::System.Text.Json.Serialization.JsonConverterAttribute",
            format!(
                "global::{runtime_namespace}.Text.Json.Serialization.{prefix}JsonConverterFactory",
                prefix = runtime_prefix(runtime_namespace)
            ),
        ),
        Framework::MessagePack => (
            "global::MessagePack.MessagePackFormatterAttribute",
            format!(
                "global::{runtime_namespace}.Formatters.{prefix}MessagePackFormatter",
                prefix = runtime_prefix(runtime_namespace)
            ),
        ),
        Framework::NewtonsoftJson => (
            "global::Newtonsoft.Json.JsonConverterAttribute",
            format!(
                "global::{runtime_namespace}.Json.{prefix}NewtonsoftJsonConverter",
                prefix = runtime_prefix(runtime_namespace)
            ),
        ),
    };
    format!("[{attribute}(typeof({converter}<{target}, {key_type}>))]")
}

/// Converter type names are prefixed with the last runtime namespace segment
/// (`UnionKit` -> `UnionKitJsonConverterFactory`).
fn runtime_prefix(runtime_namespace: &str) -> &str {
    runtime_namespace
        .rsplit('.')
        .next()
        .unwrap_or(runtime_namespace)
}

/// Fully-qualified C# reference to the target type, e.g.
/// `global::Demo.Outer.Inner`.
pub fn global_type_name<V: DeclarationView + ?Sized>(view: &V) -> String {
    let mut name = String::from("global::");
    if let Some(ns) = view.namespace().filter(|ns| !ns.is_empty()) {
        name.push_str(ns);
        name.push('.');
    }
    for outer in view.containing_types() {
        name.push_str(&outer.name);
        name.push('.');
    }
    name.push_str(view.name());
    name
}

/// Check that the type and every enclosing type accept additional fragments.
pub fn check_extensible<V: DeclarationView + ?Sized>(view: &V) -> Result<(), Diagnostic> {
    if !view.is_extensible() {
        return Err(Diagnostic::for_type(
            DiagnosticId::NonExtensibleType,
            view,
            format!(
                "`{}` must be declared `partial` to receive generated serializer wiring",
                view.qualified_name()
            ),
        ));
    }
    if let Some(outer) = view.containing_types().iter().find(|outer| !outer.partial) {
        return Err(Diagnostic::for_type(
            DiagnosticId::NonExtensibleType,
            view,
            format!(
                "enclosing type `{}` of `{}` must be declared `partial` to receive generated serializer wiring",
                outer.name,
                view.qualified_name()
            ),
        ));
    }
    Ok(())
}

/// Check that neither the type nor any enclosing type is generic.
///
/// The wiring attribute names the target inside `typeof(..)`, and C# rejects
/// type parameters there (CS0416), so an open generic target has no valid
/// fragment.
pub fn check_closed<V: DeclarationView + ?Sized>(view: &V) -> Result<(), Diagnostic> {
    let generic_link = if view.type_parameters().is_empty() {
        view.containing_types()
            .iter()
            .find(|outer| !outer.type_parameters.is_empty())
            .map(|outer| outer.name.as_str())
    } else {
        Some(view.name())
    };
    match generic_link {
        None => Ok(()),
        Some(name) => Err(Diagnostic::for_type(
            DiagnosticId::GenericTarget,
            view,
            format!(
                "`{}` cannot receive serializer wiring because `{name}` is generic; \
                 attach the converter attribute by hand to a closed type",
                view.qualified_name()
            ),
        )),
    }
}

/// Render the fragment wiring `view` into `framework` with `key_type`.
///
/// Fails with a [`DiagnosticId::NonExtensibleType`] diagnostic when the type
/// or any enclosing type is not `partial`, and with
/// [`DiagnosticId::GenericTarget`] when any of them is generic.
pub fn emit<V: DeclarationView + ?Sized>(
    view: &V,
    framework: Framework,
    key_type: &TypeRef,
    options: &EmitOptions<'_>,
) -> Result<Fragment, Diagnostic> {
    check_extensible(view)?;
    check_closed(view)?;

    let mut out = String::new();
    out.push_str("// <auto-generated />\n");
    if let Some(header) = options.header {
        for line in header.lines() {
            if line.is_empty() {
                out.push_str("//\n");
            } else {
                out.push_str("// ");
                out.push_str(line);
                out.push('\n');
            }
        }
    }
    out.push_str("#nullable enable\n\n");

    if let Some(ns) = view.namespace().filter(|ns| !ns.is_empty()) {
        out.push_str(&format!("namespace {ns};\n\n"));
    }

    let mut depth = 0;
    for outer in view.containing_types() {
        push_line(
            &mut out,
            depth,
            &format!("partial {} {}", outer.kind.keyword(), outer.name),
        );
        push_line(&mut out, depth, "{");
        depth += 1;
    }

    let attribute = wiring_attribute(
        framework,
        &global_type_name(view),
        key_type,
        options.runtime_namespace,
    );
    push_line(&mut out, depth, &attribute);
    push_line(
        &mut out,
        depth,
        &format!("partial {} {}", view.kind().keyword(), view.name()),
    );
    push_line(&mut out, depth, "{");
    push_line(&mut out, depth, "}");

    while depth > 0 {
        depth -= 1;
        push_line(&mut out, depth, "}");
    }

    Ok(Fragment {
        key: output_key(view, framework),
        content: out,
    })
}

fn push_line(out: &mut String, depth: usize, line: &str) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
    out.push_str(line);
    out.push('\n');
}
