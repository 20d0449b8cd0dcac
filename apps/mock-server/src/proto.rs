//! Generated gRPC server code for the engine API.

tonic::include_proto!("octane.api.v1");
