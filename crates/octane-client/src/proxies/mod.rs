//! # Proxies
//!
//! Client-side stand-ins for engine objects. Every operation follows the
//! same steps:
//!
//! ```text
//! build request ──► stub.method(request).await ──► unpack response
//!                          │
//!                          └── non-OK status ──► ClientError (via From<Status>)
//! ```
//!
//! Object proxies ([`ItemProxy`], [`NodeProxy`], [`NodeGraphProxy`]) carry an
//! [`ObjectRef`](octane_core::ObjectRef); node and graph proxies dereference
//! to [`ItemProxy`] for the operations every item supports. Service proxies
//! ([`ProjectManagerProxy`], [`RenderEngineProxy`], [`ChangeManagerProxy`],
//! [`InfoProxy`]) wrap engine-wide singletons.

mod change_manager;
mod info;
mod item;
mod node;
mod node_graph;
mod project_manager;
mod render_engine;

pub use change_manager::ChangeManagerProxy;
pub use info::{EngineInfo, InfoProxy};
pub use item::ItemProxy;
pub use node::NodeProxy;
pub use node_graph::NodeGraphProxy;
pub use project_manager::ProjectManagerProxy;
pub use render_engine::RenderEngineProxy;
