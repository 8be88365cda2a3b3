use std::env;
use std::path::PathBuf;
use unionkit_codegen::CodeGenerator;

fn main() {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    let mut codegen = CodeGenerator::new();

    codegen.set_header(
        "Serializer wiring for unionkit-example\n\
         Source: declarations/*.json",
    );

    // Every manifest under declarations/ describes candidate C# types
    codegen
        .add_manifest_dir(manifest_dir.join("declarations"))
        .expect("Failed to load declaration manifests");

    // Write to OUT_DIR (standard cargo location)
    let output = codegen
        .write_to_dir(out_dir.join("generated"))
        .expect("Failed to write fragments");
    output.emit_cargo_warnings();
    if output.has_errors() {
        panic!(
            "unionkit-codegen reported {} error(s); see the warnings above",
            output.diagnostics().iter().filter(|d| d.is_error()).count()
        );
    }

    // Also write to a more accessible location during development
    output.write_to_dir(manifest_dir.join("generated")).ok();

    println!("cargo:rerun-if-changed=declarations");
    println!("cargo:rerun-if-changed=build.rs");
}
