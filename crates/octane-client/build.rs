//! Build script for octane-client
//!
//! Compiles `proto/octane_api.proto` into client stubs and message types.
//! Server code is not generated here; the mock server builds its own.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let proto_file = "../../proto/octane_api.proto";

    println!("cargo:rerun-if-changed={}", proto_file);

    tonic_build::configure()
        .build_server(false)
        .build_client(true)
        .compile_protos(&[proto_file], &["../../proto"])?;

    Ok(())
}
