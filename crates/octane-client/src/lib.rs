//! # Octane Client
//!
//! gRPC client SDK for the Octane render engine.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         octane-client                                   │
//! │                                                                         │
//! │  ┌─────────────────┐       ┌───────────────────────────────────────┐   │
//! │  │  ClientConfig   │──────►│            OctaneClient               │   │
//! │  │  (TOML + env)   │       │  Channel + registries + interner      │   │
//! │  └─────────────────┘       └──────────────────┬────────────────────┘   │
//! │                                               │                         │
//! │              ┌────────────────────────────────┼──────────────────┐     │
//! │              ▼                                ▼                  ▼     │
//! │  ┌─────────────────────┐   ┌─────────────────────────┐  ┌───────────┐ │
//! │  │  Object proxies     │   │  Service proxies        │  │ Callback  │ │
//! │  │  Item, Node,        │   │  ProjectManager,        │  │ stream    │ │
//! │  │  NodeGraph          │   │  RenderEngine, Info ... │  │ task      │ │
//! │  └─────────────────────┘   └─────────────────────────┘  └───────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```no_run
//! use octane_client::{ClientConfig, OctaneClient};
//! use octane_core::{NodeType, PinId};
//!
//! # async fn demo() -> octane_client::ClientResult<()> {
//! let client = OctaneClient::connect(ClientConfig::default()).await?;
//! let root = client.project_manager().root_node_graph().await?;
//!
//! let target = root.create_node(NodeType::RenderTarget).await?;
//! let camera = root.create_node(NodeType::ThinLensCamera).await?;
//! target.connect_to(PinId::CAMERA, Some(&camera)).await?;
//!
//! let render = client.render_engine();
//! render.set_on_new_image_callback(|event| println!("{:?}", event)).await?;
//! render.set_render_target_node(Some(&target)).await?;
//! render.restart_rendering().await?;
//! # Ok(())
//! # }
//! ```

mod callbacks;
mod client;
pub mod config;
mod convert;
pub mod error;
pub mod proto;
pub mod proxies;

#[cfg(test)]
mod test_support;

pub use client::OctaneClient;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use proxies::{
    ChangeManagerProxy, EngineInfo, InfoProxy, ItemProxy, NodeGraphProxy, NodeProxy,
    ProjectManagerProxy, RenderEngineProxy,
};
