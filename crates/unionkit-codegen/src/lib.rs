//! # unionkit-codegen
//!
//! Serializer-wiring generator for UnionKit unions and value objects. For every
//! candidate C# type carrying an `ObjectFactory<TKey>` marker, this crate emits
//! one `partial` fragment per enabled serialization framework that registers
//! the UnionKit converter with that framework:
//!
//! | Framework | Output key suffix | Wiring attribute |
//! |-----------|-------------------|------------------|
//! | System.Text.Json | `Json` | `JsonConverterAttribute(typeof(UnionKitJsonConverterFactory<T, TKey>))` |
//! | MessagePack | `MessagePack` | `MessagePackFormatterAttribute(typeof(UnionKitMessagePackFormatter<T, TKey>))` |
//! | Newtonsoft.Json | `NewtonsoftJson` | `JsonConverterAttribute(typeof(UnionKitNewtonsoftJsonConverter<T, TKey>))` |
//!
//! A framework is skipped when the type has no usable factory marker, when the
//! factory's `UseForSerialization` excludes it, or when the type already
//! carries that framework's converter attribute.
//!
//! ## Quick Start
//!
//! ```rust
//! use unionkit_codegen::{CodeGenerator, Marker, MarkerValue, TypeDeclaration};
//!
//! let mut generator = CodeGenerator::new();
//! generator.add_declaration(
//!     TypeDeclaration::new("TextOrNumber")
//!         .with_namespace("Demo.Models")
//!         .with_marker(
//!             Marker::new("UnionKit.UnionAttribute")
//!                 .with_type_argument("string")
//!                 .with_type_argument("int"),
//!         )
//!         .with_marker(Marker::new("UnionKit.ObjectFactoryAttribute").with_type_argument("string")),
//! );
//!
//! let output = generator.generate();
//! assert_eq!(output.len(), 3);
//! assert!(output.diagnostics().is_empty());
//! ```
//!
//! ## From a build script
//!
//! ```no_run
//! use unionkit_codegen::CodeGenerator;
//!
//! fn main() {
//!     let mut generator = CodeGenerator::new();
//!     generator.add_manifest_dir("declarations").unwrap();
//!
//!     let output = generator.write_to_dir("generated").unwrap();
//!     output.emit_cargo_warnings();
//!
//!     println!("cargo:rerun-if-changed=declarations");
//! }
//! ```
//!
//! Declarations can also be supplied by any host type implementing
//! [`DeclarationView`], via [`CodeGenerator::generate_for`].

mod diagnostics;
mod emitter;
mod error;
mod generator;
mod manifest;
mod markers;
pub mod registry;
mod resolver;
mod types;

pub use diagnostics::{Diagnostic, DiagnosticId, Severity};
pub use emitter::{
    emit, file_name, global_type_name, output_key, wiring_attribute, EmitOptions, Fragment,
    DEFAULT_RUNTIME_NAMESPACE,
};
pub use error::{Error, Result};
pub use generator::{CodeGenerator, GenerationOutcome, GenerationOutput, TypeReport};
pub use manifest::parse_manifest;
pub use markers::{
    extract_facts, ExistingWiringFact, Extraction, FactoryFact, MarkerFacts, UnionFact,
    USE_FOR_SERIALIZATION,
};
pub use registry::{MarkerRegistry, MarkerRole};
pub use resolver::{decide, resolve, Decision, SkipReason};
pub use types::{
    ContainingType, DeclarationView, Framework, Marker, MarkerValue, PerFramework,
    SerializationFrameworks, SourceLocation, TypeDeclaration, TypeKind, TypeRef,
};
