//! Generates serializer-wiring fragments from declaration manifests.
//!
//! Usage: `generate-fragments [MANIFEST_DIR] [OUT_DIR]`
//! (defaults: `declarations`, `generated`).

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use unionkit_codegen::{CodeGenerator, GenerationOutcome};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut args = env::args().skip(1);
    let manifest_dir = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("declarations"));
    let out_dir = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("generated"));

    let mut codegen = CodeGenerator::new();
    if let Err(err) = codegen.add_manifest_dir(&manifest_dir) {
        error!("{err}");
        return ExitCode::FAILURE;
    }
    info!(
        candidates = codegen.declarations().len(),
        dir = %manifest_dir.display(),
        "loaded declarations"
    );

    let output = match codegen.write_to_dir(&out_dir) {
        Ok(output) => output,
        Err(err) => {
            error!("{err}");
            return ExitCode::FAILURE;
        }
    };

    for report in output.reports() {
        for (framework, outcome) in report.outcomes.iter() {
            match outcome {
                GenerationOutcome::Emitted { key } => {
                    println!("  {:<40} {:<15} -> {}", report.qualified_name, framework, key)
                }
                GenerationOutcome::Skipped(reason) => {
                    println!("  {:<40} {:<15} skipped ({})", report.qualified_name, framework, reason)
                }
                GenerationOutcome::Failed(id) => {
                    println!("  {:<40} {:<15} failed ({})", report.qualified_name, framework, id)
                }
            }
        }
    }

    for diagnostic in output.diagnostics() {
        eprintln!("{diagnostic}");
    }

    info!(
        fragments = output.len(),
        dir = %out_dir.display(),
        "wrote fragments"
    );

    if output.has_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
