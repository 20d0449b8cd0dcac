//! Generated gRPC client code for the engine API.
//!
//! ## Services Available
//! - `ApiItemServiceClient` - Name, position, attributes, destroy
//! - `ApiNodeServiceClient` - Node creation, pins, connections
//! - `ApiNodeGraphServiceClient` - Graph creation, owned items, lookups
//! - `ApiProjectManagerServiceClient` - Load/save/reset projects
//! - `ApiRenderEngineServiceClient` - Render control and callbacks
//! - `ApiChangeManagerServiceClient` - Flush pending changes
//! - `ApiInfoServiceClient` - Engine version
//! - `CallbackStreamServiceClient` - Callback invocations (server streaming)

tonic::include_proto!("octane.api.v1");
