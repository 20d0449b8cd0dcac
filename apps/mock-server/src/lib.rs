//! # Octane Mock Server
//!
//! In-memory simulation of the engine's gRPC API. It keeps a real object
//! model (graphs, nodes, pins, attributes), renders by counting samples and
//! streams callback events, which is enough to test the SDK end to end.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  services/*  ──►  EngineState  ──►  Scene (RwLock)                      │
//! │                        │        └─►  RenderSim (Mutex)                  │
//! │                        │                   ▲                            │
//! │                        │             render ticker                      │
//! │                        ▼                                                │
//! │                broadcast events ──► CallbackStream subscribers          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```no_run
//! # async fn demo() -> Result<(), octane_mock_server::ServerError> {
//! use octane_mock_server::{spawn, ServerConfig};
//!
//! let server = spawn(ServerConfig::default()).await?;
//! println!("engine at {}", server.url());
//! server.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
mod convert;
pub mod error;
pub mod proto;
pub mod render;
pub mod scene;
pub mod server;
mod services;
pub mod state;

pub use config::{ConfigError, ServerConfig};
pub use error::{SceneError, SceneResult};
pub use scene::Scene;
pub use server::{spawn, RunningServer, ServerError};
pub use state::EngineState;
