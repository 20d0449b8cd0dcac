//! # Error Types
//!
//! Domain-specific error types for octane-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  octane-core errors (this file)                                        │
//! │  └── CoreError        - Wire decoding + proxy kind violations          │
//! │                                                                         │
//! │  octane-client errors (separate crate)                                 │
//! │  └── ClientError      - gRPC status, transport, config                 │
//! │                                                                         │
//! │  octane-mock-server errors                                             │
//! │  └── SceneError       - Object model violations → tonic::Status        │
//! │                                                                         │
//! │  Flow: CoreError → ClientError → caller                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::object::ObjectType;
use crate::registry::ObjectKind;
use crate::types::{NodeType, PinId};

// =============================================================================
// Core Error
// =============================================================================

/// Core errors raised while decoding wire values or checking object kinds.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Wire object type is not one we know.
    #[error("Unknown object type: {0}")]
    UnknownObjectType(i32),

    /// Wire node type is not one we know.
    #[error("Unknown node type: {0}")]
    UnknownNodeType(u32),

    /// Wire graph type is not one we know.
    #[error("Unknown graph type: {0}")]
    UnknownGraphType(u32),

    /// Wire render state is not one we know.
    #[error("Unknown render state: {0}")]
    UnknownRenderState(i32),

    /// Wire image type is not one we know.
    #[error("Unknown image type: {0}")]
    UnknownImageType(i32),

    /// A null reference was used where a live object is required.
    ///
    /// ## When This Occurs
    /// - Wrapping the result of `GraphOwner` on the root graph
    /// - Wrapping `ConnectedNode` of an unconnected pin as a `NodeProxy`
    #[error("Null object where {expected} was expected")]
    NullObject { expected: ObjectKind },

    /// The referenced object cannot back a proxy of the requested kind.
    #[error("Object {handle} is {actual}, cannot be used as {expected}")]
    TypeMismatch {
        handle: u64,
        expected: ObjectKind,
        actual: ObjectType,
    },

    /// Node type has no such pin.
    #[error("{node_type} has no pin {pin}")]
    UnknownPin { node_type: NodeType, pin: PinId },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::TypeMismatch {
            handle: 7,
            expected: ObjectKind::Node,
            actual: ObjectType::NodeGraph,
        };
        assert_eq!(
            err.to_string(),
            "Object 7 is ApiNodeGraph, cannot be used as node"
        );

        let err = CoreError::UnknownPin {
            node_type: NodeType::RenderTarget,
            pin: PinId(999),
        };
        assert_eq!(err.to_string(), "RenderTarget has no pin 999");
    }

    #[test]
    fn test_null_object_message() {
        let err = CoreError::NullObject {
            expected: ObjectKind::Graph,
        };
        assert_eq!(err.to_string(), "Null object where graph was expected");
    }
}
