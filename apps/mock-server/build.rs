//! Build script for compiling Protocol Buffer definitions.
//!
//! Generates the server traits for every engine service. The generated code
//! goes to `$OUT_DIR` and is included via `tonic::include_proto!`.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=../../proto/octane_api.proto");
    println!("cargo:rerun-if-changed=../../proto");

    tonic_build::configure()
        .build_server(true)
        .build_client(false)
        .compile_protos(&["../../proto/octane_api.proto"], &["../../proto"])?;

    Ok(())
}
