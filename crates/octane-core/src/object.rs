//! # Remote Object References
//!
//! Every engine object a client can touch is named by an [`ObjectRef`]: the
//! object's API type plus an opaque 64-bit handle assigned by the server.
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ ObjectRef                    │
//! │  object_type: ApiNode        │──► proxy kind is chosen from the type
//! │  handle:      42             │──► unique for the server's lifetime
//! └──────────────────────────────┘
//!   handle 0 = null object
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

// =============================================================================
// Object Type
// =============================================================================

/// API type of a remote object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectType {
    /// Generic item (base of nodes and graphs).
    Item,
    /// A node inside a graph.
    Node,
    /// A nested node graph.
    NodeGraph,
    /// The project's root graph.
    RootNodeGraph,
}

impl ObjectType {
    /// Value used in the protobuf `ObjectType` enum.
    pub const fn wire(self) -> i32 {
        match self {
            ObjectType::Item => 1,
            ObjectType::Node => 2,
            ObjectType::NodeGraph => 3,
            ObjectType::RootNodeGraph => 4,
        }
    }

    /// Decodes a protobuf `ObjectType` value. `0` (unspecified) is rejected.
    pub fn from_wire(value: i32) -> CoreResult<Self> {
        match value {
            1 => Ok(ObjectType::Item),
            2 => Ok(ObjectType::Node),
            3 => Ok(ObjectType::NodeGraph),
            4 => Ok(ObjectType::RootNodeGraph),
            other => Err(CoreError::UnknownObjectType(other)),
        }
    }

    /// True for both nested and root graphs.
    pub const fn is_graph(self) -> bool {
        matches!(self, ObjectType::NodeGraph | ObjectType::RootNodeGraph)
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObjectType::Item => write!(f, "ApiItem"),
            ObjectType::Node => write!(f, "ApiNode"),
            ObjectType::NodeGraph => write!(f, "ApiNodeGraph"),
            ObjectType::RootNodeGraph => write!(f, "ApiRootNodeGraph"),
        }
    }
}

// =============================================================================
// Object Ref
// =============================================================================

/// Handle to a server-side object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    /// API type of the object.
    pub object_type: ObjectType,
    /// Server-assigned handle, `0` for the null object.
    pub handle: u64,
}

impl ObjectRef {
    /// Handle value reserved for "no object".
    pub const NULL_HANDLE: u64 = 0;

    /// Creates a reference.
    #[inline]
    pub const fn new(object_type: ObjectType, handle: u64) -> Self {
        ObjectRef {
            object_type,
            handle,
        }
    }

    /// The null reference.
    #[inline]
    pub const fn null() -> Self {
        ObjectRef::new(ObjectType::Item, Self::NULL_HANDLE)
    }

    /// True if this references no object.
    #[inline]
    pub const fn is_null(&self) -> bool {
        self.handle == Self::NULL_HANDLE
    }

    /// True if this references a node.
    #[inline]
    pub const fn is_node(&self) -> bool {
        !self.is_null() && matches!(self.object_type, ObjectType::Node)
    }

    /// True if this references a nested or root graph.
    #[inline]
    pub const fn is_graph(&self) -> bool {
        !self.is_null() && self.object_type.is_graph()
    }

    /// Decodes a wire reference. Null handles decode to [`ObjectRef::null`]
    /// whatever their type field says.
    pub fn from_wire(object_type: i32, handle: u64) -> CoreResult<Self> {
        if handle == Self::NULL_HANDLE {
            return Ok(Self::null());
        }
        Ok(ObjectRef::new(ObjectType::from_wire(object_type)?, handle))
    }

    /// Wire type value; null references travel as unspecified (0).
    pub const fn wire_type(&self) -> i32 {
        if self.is_null() {
            0
        } else {
            self.object_type.wire()
        }
    }
}

impl Default for ObjectRef {
    fn default() -> Self {
        ObjectRef::null()
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_null() {
            write!(f, "null")
        } else {
            write!(f, "{}#{}", self.object_type, self.handle)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_ref() {
        let null = ObjectRef::null();
        assert!(null.is_null());
        assert!(!null.is_node());
        assert!(!null.is_graph());
        assert_eq!(null.wire_type(), 0);
        assert_eq!(null.to_string(), "null");
        assert_eq!(ObjectRef::default(), null);
    }

    #[test]
    fn test_wire_decoding() {
        let node = ObjectRef::from_wire(2, 17).unwrap();
        assert_eq!(node, ObjectRef::new(ObjectType::Node, 17));
        assert!(node.is_node());

        // Null handles ignore the type field
        assert!(ObjectRef::from_wire(0, 0).unwrap().is_null());
        assert!(ObjectRef::from_wire(3, 0).unwrap().is_null());

        // Unspecified type with a live handle is rejected
        assert_eq!(
            ObjectRef::from_wire(0, 5),
            Err(CoreError::UnknownObjectType(0))
        );
    }

    #[test]
    fn test_graph_kinds() {
        assert!(ObjectRef::new(ObjectType::NodeGraph, 1).is_graph());
        assert!(ObjectRef::new(ObjectType::RootNodeGraph, 1).is_graph());
        assert!(!ObjectRef::new(ObjectType::Node, 1).is_graph());
    }

    #[test]
    fn test_wire_values_round_trip() {
        for ty in [
            ObjectType::Item,
            ObjectType::Node,
            ObjectType::NodeGraph,
            ObjectType::RootNodeGraph,
        ] {
            assert_eq!(ObjectType::from_wire(ty.wire()).unwrap(), ty);
        }
    }

    #[test]
    fn test_display() {
        let root = ObjectRef::new(ObjectType::RootNodeGraph, 1);
        assert_eq!(root.to_string(), "ApiRootNodeGraph#1");
    }
}
