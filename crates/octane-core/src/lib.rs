//! # octane-core: Pure Types for the Octane gRPC SDK
//!
//! Everything both ends of the wire agree on, with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Octane SDK Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 octane-client (proxies, CLI)                    │   │
//! │  │   ItemProxy ──► NodeProxy ──► NodeGraphProxy ──► RenderEngine   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ tonic stubs                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ octane-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  object   │  │   types   │  │ registry  │  │ callbacks │  │   │
//! │  │   │ ObjectRef │  │ NodeType  │  │ handle →  │  │  id → fn  │  │   │
//! │  │   │ObjectType │  │ AttrValue │  │   kind    │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO ASYNC                               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                ▲                                        │
//! │  ┌─────────────────────────────┴───────────────────────────────────┐   │
//! │  │              octane-mock-server (engine simulator)              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`object`] - `ObjectRef` and `ObjectType`, the remote object handle
//! - [`types`] - Node/graph types, pins, attributes, values, render statistics
//! - [`nodes`] - Static pin tables per node type
//! - [`registry`] - Remote handle → proxy kind bookkeeping
//! - [`callbacks`] - Remote callback id → local function bookkeeping
//! - [`interner`] - Shared storage for strings returned by the engine
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use octane_core::{ObjectKind, ObjectRef, ObjectRegistry, ObjectType};
//!
//! let registry = ObjectRegistry::new();
//! let node = ObjectRef::new(ObjectType::Node, 42);
//! registry.track(node);
//!
//! assert!(registry.expect(node, ObjectKind::Node).is_ok());
//! assert!(registry.expect(node, ObjectKind::Graph).is_err());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod callbacks;
pub mod error;
pub mod interner;
pub mod nodes;
pub mod object;
pub mod registry;
pub mod types;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use callbacks::{CallbackEvent, CallbackId, CallbackKind, CallbackRegistry};
pub use error::{CoreError, CoreResult};
pub use interner::StringInterner;
pub use nodes::PinInfo;
pub use object::{ObjectRef, ObjectType};
pub use registry::{ObjectKind, ObjectRegistry};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Engine version reported by API-compatible servers (major * 1_000_000 +
/// minor * 10_000 + patch * 100).
pub const API_VERSION: u32 = 14_000_000;

/// Human-readable form of [`API_VERSION`].
pub const API_VERSION_NAME: &str = "2024.1";
