//! Generation pass orchestration.

use crate::diagnostics::{Diagnostic, DiagnosticId};
use crate::emitter::{self, EmitOptions, Fragment, DEFAULT_RUNTIME_NAMESPACE};
use crate::error::{Error, Result};
use crate::markers::extract_facts;
use crate::registry::{MarkerRegistry, MarkerRole};
use crate::resolver::{resolve, Decision, SkipReason};
use crate::types::{DeclarationView, Framework, PerFramework, SourceLocation, TypeDeclaration};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::{debug, debug_span, warn};

/// Outcome of one (type, framework) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Skipped(SkipReason),
    /// A fragment was produced under this output key.
    Emitted { key: String },
    /// The pair was eligible but emission was blocked by an error diagnostic.
    Failed(DiagnosticId),
}

/// Per-type summary of a generation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeReport {
    pub qualified_name: String,
    pub outcomes: PerFramework<GenerationOutcome>,
}

/// Result of a generation pass.
///
/// Fragments are keyed by output key and kept in key order, so two passes
/// over the same declarations compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationOutput {
    fragments: BTreeMap<String, String>,
    reports: Vec<TypeReport>,
    diagnostics: Vec<Diagnostic>,
}

impl GenerationOutput {
    /// Output key -> fragment text.
    pub fn fragments(&self) -> &BTreeMap<String, String> {
        &self.fragments
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fragments.get(key).map(String::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fragments.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// One report per candidate declaration, in input order.
    pub fn reports(&self) -> &[TypeReport] {
        &self.reports
    }

    pub fn report(&self, qualified_name: &str) -> Option<&TypeReport> {
        self.reports
            .iter()
            .find(|report| report.qualified_name == qualified_name)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn into_fragments(self) -> BTreeMap<String, String> {
        self.fragments
    }

    /// Print diagnostics as `cargo:warning=` lines for use from a build script.
    pub fn emit_cargo_warnings(&self) {
        for diagnostic in &self.diagnostics {
            println!("cargo:warning=unionkit-codegen: {diagnostic}");
        }
    }

    /// Write every fragment to `dir` as `<output key>.g.cs`.
    pub fn write_to_dir(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|source| Error::Write {
            path: dir.to_path_buf(),
            source,
        })?;
        for (key, content) in &self.fragments {
            let path = dir.join(emitter::file_name(key));
            fs::write(&path, content).map_err(|source| Error::Write { path, source })?;
        }
        Ok(())
    }

    /// Write all fragments to a writer, in key order, each preceded by a
    /// `// ---- <key> ----` separator line.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        for (key, content) in &self.fragments {
            writeln!(writer, "// ---- {key} ----")?;
            writer.write_all(content.as_bytes())?;
        }
        Ok(())
    }
}

/// Evaluation of a single declaration, before cross-type merging.
struct TypeEvaluation {
    report: TypeReport,
    location: Option<SourceLocation>,
    fragments: Vec<Fragment>,
    diagnostics: Vec<Diagnostic>,
}

/// Generator that collects declarations and produces serializer-wiring fragments.
///
/// # Example
///
/// ```
/// use unionkit_codegen::{CodeGenerator, Marker, MarkerValue, TypeDeclaration};
///
/// let mut generator = CodeGenerator::new();
/// generator.add_declaration(
///     TypeDeclaration::new("TextOrNumber")
///         .with_namespace("Demo")
///         .with_marker(
///             Marker::new("UnionKit.UnionAttribute")
///                 .with_type_argument("string")
///                 .with_type_argument("int"),
///         )
///         .with_marker(
///             Marker::new("UnionKit.ObjectFactoryAttribute")
///                 .with_type_argument("string")
///                 .with_named_argument("UseForSerialization", MarkerValue::Flags("Json".into())),
///         ),
/// );
///
/// let output = generator.generate();
/// assert_eq!(output.keys().collect::<Vec<_>>(), ["Demo.TextOrNumber.Json"]);
/// ```
#[derive(Debug)]
pub struct CodeGenerator {
    /// Candidate declarations, in insertion order.
    declarations: Vec<TypeDeclaration>,

    /// Custom header comment
    header: Option<String>,

    /// Root namespace of the converter runtime referenced by fragments.
    runtime_namespace: String,

    /// Marker identities
    pub(crate) registry: MarkerRegistry,
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self {
            declarations: Vec::new(),
            header: None,
            runtime_namespace: DEFAULT_RUNTIME_NAMESPACE.to_string(),
            registry: MarkerRegistry::with_builtins(),
        }
    }
}

impl CodeGenerator {
    /// Create a new code generator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set extra header comment lines for every fragment.
    pub fn set_header(&mut self, header: impl Into<String>) -> &mut Self {
        self.header = Some(header.into());
        self
    }

    /// Set the root namespace of the converter runtime (default `UnionKit`).
    pub fn set_runtime_namespace(&mut self, namespace: impl Into<String>) -> &mut Self {
        self.runtime_namespace = namespace.into();
        self
    }

    /// Recognize an additional marker name, e.g. an alias of the factory marker.
    pub fn register_marker(&mut self, name: impl AsRef<str>, role: MarkerRole) -> &mut Self {
        self.registry.register(name, role);
        self
    }

    /// Stop recognizing a marker name.
    pub fn unregister_marker(&mut self, name: &str) -> &mut Self {
        self.registry.unregister(name);
        self
    }

    pub fn registry(&self) -> &MarkerRegistry {
        &self.registry
    }

    /// Add a candidate declaration.
    pub fn add_declaration(&mut self, declaration: TypeDeclaration) -> &mut Self {
        self.declarations.push(declaration);
        self
    }

    pub fn declarations(&self) -> &[TypeDeclaration] {
        &self.declarations
    }

    /// Run a pass over the collected declarations.
    pub fn generate(&self) -> GenerationOutput {
        let views: Vec<&TypeDeclaration> = self.declarations.iter().collect();
        self.generate_for(&views)
    }

    /// Run a pass over host-provided declaration views.
    ///
    /// Each view is evaluated independently; a failing type never prevents the
    /// others from producing output.
    pub fn generate_for<V>(&self, views: &[&V]) -> GenerationOutput
    where
        V: DeclarationView + Sync + ?Sized,
    {
        let _span = debug_span!("generate", candidates = views.len()).entered();

        #[cfg(feature = "parallel")]
        let evaluations = if views.len() > 1 {
            self.evaluate_parallel(views)
        } else {
            self.evaluate_serial(views)
        };
        #[cfg(not(feature = "parallel"))]
        let evaluations = self.evaluate_serial(views);

        merge(evaluations)
    }

    fn evaluate_serial<V>(&self, views: &[&V]) -> Vec<TypeEvaluation>
    where
        V: DeclarationView + ?Sized,
    {
        views.iter().map(|view| self.evaluate(*view)).collect()
    }

    /// Evaluate on the rayon pool; `collect` keeps input order.
    #[cfg(feature = "parallel")]
    fn evaluate_parallel<V>(&self, views: &[&V]) -> Vec<TypeEvaluation>
    where
        V: DeclarationView + Sync + ?Sized,
    {
        use rayon::prelude::*;
        views.par_iter().map(|view| self.evaluate(*view)).collect()
    }

    /// Write the fragments of a pass over the collected declarations to `dir`.
    pub fn write_to_dir(&self, dir: impl AsRef<Path>) -> Result<GenerationOutput> {
        let output = self.generate();
        output.write_to_dir(dir)?;
        Ok(output)
    }

    /// Write the fragments of a pass over the collected declarations to a writer.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<GenerationOutput> {
        let output = self.generate();
        output.write_to(writer)?;
        Ok(output)
    }

    fn emit_options(&self) -> EmitOptions<'_> {
        EmitOptions {
            header: self.header.as_deref(),
            runtime_namespace: &self.runtime_namespace,
        }
    }

    fn evaluate<V: DeclarationView + ?Sized>(&self, view: &V) -> TypeEvaluation {
        let qualified_name = view.qualified_name();
        let extraction = extract_facts(view, &self.registry);
        let decisions = resolve(&extraction.facts);
        let mut diagnostics = extraction.diagnostics;
        let mut fragments = Vec::new();
        let options = self.emit_options();
        let mut blocked = false;

        let outcomes = PerFramework::from_fn(|framework| match decisions[framework] {
            Decision::Skipped(reason) => {
                debug!(type_name = %qualified_name, %framework, %reason, "skipped");
                GenerationOutcome::Skipped(reason)
            }
            Decision::Eligible => {
                let Some(factory) = &extraction.facts.factory else {
                    return GenerationOutcome::Skipped(SkipReason::NotEligible);
                };
                match emitter::emit(view, framework, &factory.key_type, &options) {
                    Ok(fragment) => {
                        debug!(type_name = %qualified_name, %framework, key = %fragment.key, "emitted");
                        let key = fragment.key.clone();
                        fragments.push(fragment);
                        GenerationOutcome::Emitted { key }
                    }
                    Err(diagnostic) => {
                        // One diagnostic per type, however many frameworks are blocked.
                        if !blocked {
                            diagnostics.push(diagnostic.clone());
                            blocked = true;
                        }
                        GenerationOutcome::Failed(diagnostic.id)
                    }
                }
            }
        });

        for diagnostic in &diagnostics {
            warn!(type_name = %qualified_name, "{diagnostic}");
        }

        TypeEvaluation {
            report: TypeReport {
                qualified_name,
                outcomes,
            },
            location: view.location().cloned(),
            fragments,
            diagnostics,
        }
    }
}

/// Merge per-type evaluations, dropping every fragment whose key is produced
/// by more than one candidate.
fn merge(evaluations: Vec<TypeEvaluation>) -> GenerationOutput {
    let mut owners: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (index, evaluation) in evaluations.iter().enumerate() {
        for fragment in &evaluation.fragments {
            owners.entry(fragment.key.clone()).or_default().push(index);
        }
    }

    let mut output = GenerationOutput::default();
    let mut collisions: Vec<Diagnostic> = Vec::new();

    let mut reports = Vec::with_capacity(evaluations.len());
    for (index, evaluation) in evaluations.into_iter().enumerate() {
        let TypeEvaluation {
            mut report,
            location,
            fragments,
            diagnostics,
        } = evaluation;
        output.diagnostics.extend(diagnostics);

        for fragment in fragments {
            let sharing = &owners[&fragment.key];
            if sharing.len() == 1 {
                output.fragments.insert(fragment.key, fragment.content);
                continue;
            }

            let colliding = Framework::ALL.into_iter().find(|framework| {
                matches!(
                    &report.outcomes[*framework],
                    GenerationOutcome::Emitted { key } if *key == fragment.key
                )
            });
            if let Some(framework) = colliding {
                report.outcomes[framework] =
                    GenerationOutcome::Failed(DiagnosticId::OutputKeyCollision);
            }
            let diagnostic = Diagnostic {
                id: DiagnosticId::OutputKeyCollision,
                message: format!(
                    "output key `{}` is produced by {} declarations of `{}`; none of them is emitted",
                    fragment.key,
                    sharing.len(),
                    report.qualified_name,
                ),
                type_name: report.qualified_name.clone(),
                location: location.clone(),
            };
            warn!(key = %fragment.key, candidate = index, "output key collision");
            collisions.push(diagnostic);
        }
        reports.push(report);
    }

    output.reports = reports;
    output.diagnostics.extend(collisions);
    output
}
