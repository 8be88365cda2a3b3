//! Example crate demonstrating unionkit-codegen usage.
//!
//! The C# declarations this crate stands in for are described by the JSON
//! manifests under `declarations/`. `build.rs` turns them into `.g.cs`
//! fragments in `$OUT_DIR/generated`; [`demo_generator`] builds the same kind
//! of declarations in code.

use std::fs;
use std::path::Path;
use unionkit_codegen::{
    CodeGenerator, ContainingType, Marker, MarkerValue, TypeDeclaration, TypeKind,
    USE_FOR_SERIALIZATION,
};

/// Directory the build script writes fragments to.
pub const GENERATED_DIR: &str = concat!(env!("OUT_DIR"), "/generated");

/// Read a fragment produced by the build script.
pub fn generated_fragment(key: &str) -> Option<String> {
    let path = Path::new(GENERATED_DIR).join(unionkit_codegen::file_name(key));
    fs::read_to_string(path).ok()
}

fn union(variants: &[&str]) -> Marker {
    variants
        .iter()
        .fold(Marker::new("UnionKit.UnionAttribute"), |marker, ty| {
            marker.with_type_argument(*ty)
        })
}

fn factory(key: &str, use_for: &str) -> Marker {
    Marker::new("UnionKit.ObjectFactoryAttribute")
        .with_type_argument(key)
        .with_named_argument(USE_FOR_SERIALIZATION, MarkerValue::Flags(use_for.to_string()))
}

/// A generator loaded with a handful of representative declarations.
pub fn demo_generator() -> CodeGenerator {
    let mut codegen = CodeGenerator::new();

    // Ad hoc union wired into every framework
    codegen.add_declaration(
        TypeDeclaration::new("TextOrNumber")
            .with_namespace("Demo.Models")
            .with_marker(union(&["string", "int"]))
            .with_marker(factory("string", "All")),
    );

    // Regular union, System.Text.Json only
    codegen.add_declaration(
        TypeDeclaration::new("Shape")
            .with_namespace("Demo.Models")
            .with_kind(TypeKind::Record)
            .with_marker(union(&[]))
            .with_marker(factory("string", "Json")),
    );

    // Nested value object that already has a Newtonsoft converter
    codegen.add_declaration(
        TypeDeclaration::new("Amount")
            .with_namespace("Demo.Billing")
            .with_kind(TypeKind::RecordStruct)
            .nested_in(ContainingType::new("Invoice", TypeKind::Class))
            .with_marker(factory("decimal", "All"))
            .with_marker(
                Marker::new("Newtonsoft.Json.JsonConverterAttribute")
                    .with_argument(MarkerValue::Type("AmountConverter".into())),
            ),
    );

    // Union without a factory: nothing to generate
    codegen.add_declaration(
        TypeDeclaration::new("Result")
            .with_namespace("Demo.Models")
            .with_marker(union(&[])),
    );

    codegen
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_generator_keys() {
        let output = demo_generator().generate();
        assert_eq!(
            output.keys().collect::<Vec<_>>(),
            [
                "Demo.Billing.Invoice.Amount.Json",
                "Demo.Billing.Invoice.Amount.MessagePack",
                "Demo.Models.Shape.Json",
                "Demo.Models.TextOrNumber.Json",
                "Demo.Models.TextOrNumber.MessagePack",
                "Demo.Models.TextOrNumber.NewtonsoftJson",
            ]
        );
        assert!(output.diagnostics().is_empty());
    }

    #[test]
    fn test_nested_amount_fragment() {
        let output = demo_generator().generate();
        let code = output.get("Demo.Billing.Invoice.Amount.MessagePack").unwrap();
        assert!(code.contains("namespace Demo.Billing;\n"));
        assert!(code.contains("partial class Invoice\n{\n"));
        assert!(code.contains(
            "   [global::MessagePack.MessagePackFormatterAttribute(typeof(global::UnionKit.Formatters.UnionKitMessagePackFormatter<global::Demo.Billing.Invoice.Amount, decimal>))]\n   partial record struct Amount\n"
        ));
    }

    #[test]
    fn test_manifests_have_no_blocking_diagnostics() {
        // build.rs fails the build on any error-severity diagnostic
        let mut codegen = CodeGenerator::new();
        codegen
            .add_manifest_dir(concat!(env!("CARGO_MANIFEST_DIR"), "/declarations"))
            .unwrap();
        let output = codegen.generate();
        assert!(!output.has_errors());
        assert_eq!(
            output.keys().collect::<Vec<_>>(),
            demo_generator().generate().keys().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_build_script_output_matches_manifests() {
        // The manifests describe the same declarations as `demo_generator`,
        // only the header differs.
        let output = demo_generator().generate();
        for (key, content) in output.fragments() {
            let generated = generated_fragment(key)
                .unwrap_or_else(|| panic!("build script did not write {key}"));
            let body = |text: &str| {
                text.split_once("#nullable enable\n")
                    .map(|(_, body)| body.to_string())
                    .unwrap()
            };
            assert_eq!(body(&generated), body(content), "fragment {key}");
        }
        assert!(generated_fragment("Demo.Models.Result.Json").is_none());
    }
}
