//! Declaration manifest loading.
//!
//! A host front end describes its candidate declarations as JSON, either as a
//! document `{ "types": [...] }` or as a bare array of types:
//!
//! ```json
//! { "types": [ {
//!     "name": "TextOrNumber",
//!     "namespace": "Demo.Models",
//!     "markers": [
//!       { "name": "UnionKit.UnionAttribute", "type_arguments": ["string", "int"] },
//!       { "name": "UnionKit.ObjectFactoryAttribute", "type_arguments": ["string"],
//!         "named_arguments": { "UseForSerialization": { "flags": "Json" } } }
//!     ]
//! } ] }
//! ```
//!
//! Unknown fields are rejected so that typos in a manifest surface as errors
//! instead of silently changing eligibility.

use crate::CodeGenerator;
use crate::error::{Error, Result};
use crate::types::TypeDeclaration;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestDocument {
    #[serde(default)]
    types: Vec<TypeDeclaration>,
}

/// Parse a manifest into declarations, in document order.
///
/// `origin` names the manifest in error messages.
pub fn parse_manifest(source: &str, origin: &str) -> Result<Vec<TypeDeclaration>> {
    let manifest_error = |source| Error::Manifest {
        origin: origin.to_string(),
        source,
    };
    let value: serde_json::Value = serde_json::from_str(source).map_err(manifest_error)?;
    if value.is_array() {
        serde_json::from_value(value).map_err(manifest_error)
    } else {
        let document: ManifestDocument = serde_json::from_value(value).map_err(manifest_error)?;
        Ok(document.types)
    }
}

fn is_manifest(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

impl CodeGenerator {
    /// Load declarations from a JSON manifest file.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # fn main() -> Result<(), unionkit_codegen::Error> {
    /// use unionkit_codegen::CodeGenerator;
    ///
    /// let mut generator = CodeGenerator::new();
    /// generator.add_manifest_file("obj/declarations.json")?;
    /// generator.write_to_dir("obj/generated")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn add_manifest_file(&mut self, path: impl AsRef<Path>) -> Result<&mut Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        self.add_declarations(parse_manifest(&source, &format!("`{}`", path.display()))?);
        Ok(self)
    }

    /// Load declarations from manifest text.
    pub fn add_manifest_str(&mut self, source: &str) -> Result<&mut Self> {
        self.add_declarations(parse_manifest(source, "<string>")?);
        Ok(self)
    }

    /// Recursively scan a directory for `.json` manifests and load them all.
    ///
    /// Files are visited in file-name order so the candidate order, and with
    /// it the report and diagnostic order, is stable across runs.
    pub fn add_manifest_dir(&mut self, path: impl AsRef<Path>) -> Result<&mut Self> {
        let root = path.as_ref();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|source| Error::Walk {
                path: root.to_path_buf(),
                source,
            })?;
            if entry.file_type().is_file() && is_manifest(entry.path()) {
                self.add_manifest_file(entry.path())?;
            }
        }
        Ok(self)
    }

    fn add_declarations(&mut self, declarations: Vec<TypeDeclaration>) {
        debug!(count = declarations.len(), "loaded declarations");
        for declaration in declarations {
            self.add_declaration(declaration);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DeclarationView, MarkerValue, SourceLocation, TypeKind};

    const TEXT_OR_NUMBER: &str = r#"
        {
          "types": [
            {
              "name": "TextOrNumber",
              "namespace": "Demo.Models",
              "location": { "path": "Models/TextOrNumber.cs", "line": 6, "column": 1 },
              "markers": [
                { "name": "UnionKit.UnionAttribute`2", "type_arguments": ["string", "int"] },
                {
                  "name": "UnionKit.ObjectFactoryAttribute`1",
                  "type_arguments": ["string"],
                  "named_arguments": { "UseForSerialization": { "flags": "Json | MessagePack" } }
                }
              ]
            }
          ]
        }
    "#;

    #[test]
    fn test_parse_document() {
        let types = parse_manifest(TEXT_OR_NUMBER, "test").unwrap();
        assert_eq!(types.len(), 1);
        let decl = &types[0];
        assert_eq!(decl.qualified_name(), "Demo.Models.TextOrNumber");
        assert_eq!(decl.location, Some(SourceLocation::new("Models/TextOrNumber.cs", 6, 1)));
        assert_eq!(
            decl.markers[1].named_arguments["UseForSerialization"],
            MarkerValue::Flags("Json | MessagePack".to_string())
        );
    }

    #[test]
    fn test_parse_bare_array() {
        let types = parse_manifest(
            r#"[
                { "name": "A", "kind": "record struct" },
                { "name": "B", "partial": false,
                  "containing_types": [ { "name": "Outer", "kind": "struct" } ] }
            ]"#,
            "test",
        )
        .unwrap();
        assert_eq!(types[0].kind, TypeKind::RecordStruct);
        assert!(!types[1].is_extensible());
        assert!(types[1].containing_types[0].partial);
        assert_eq!(types[1].qualified_name(), "Outer.B");
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let err = parse_manifest(r#"{ "types": [ { "name": "A", "partail": true } ] }"#, "`bad.json`")
            .unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("invalid declaration manifest `bad.json`"));
        assert!(message.contains("partail"));
    }

    #[test]
    fn test_invalid_json_is_rejected() {
        let mut codegen = CodeGenerator::new();
        assert!(matches!(
            codegen.add_manifest_str("{ not json"),
            Err(Error::Manifest { .. })
        ));
        assert!(codegen.declarations().is_empty());
    }

    #[test]
    fn test_add_manifest_str_generates() {
        let mut codegen = CodeGenerator::new();
        codegen.add_manifest_str(TEXT_OR_NUMBER).unwrap();
        let output = codegen.generate();
        assert_eq!(
            output.keys().collect::<Vec<_>>(),
            [
                "Demo.Models.TextOrNumber.Json",
                "Demo.Models.TextOrNumber.MessagePack",
            ]
        );
    }

    #[test]
    fn test_add_manifest_file_missing() {
        let mut codegen = CodeGenerator::new();
        let err = codegen.add_manifest_file("does/not/exist.json").unwrap_err();
        assert!(matches!(err, Error::Read { .. }));
        assert!(err.to_string().contains("does/not/exist.json"));
    }

    #[test]
    fn test_add_manifest_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("b.json"), r#"[ { "name": "B" } ]"#).unwrap();
        fs::write(nested.join("a.json"), r#"{ "types": [ { "name": "A" } ] }"#).unwrap();
        fs::write(dir.path().join("notes.txt"), "not a manifest").unwrap();

        let mut codegen = CodeGenerator::new();
        codegen.add_manifest_dir(dir.path()).unwrap();
        let names: Vec<_> = codegen.declarations().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["B", "A"]);
    }
}
