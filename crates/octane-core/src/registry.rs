//! # Object Registry
//!
//! Maps remote object handles to the API type the server reported for them,
//! so a raw handle can be turned back into the right proxy kind.
//!
//! ## Flow
//! ```text
//! server response ──► ObjectRef { Node, 42 } ──► registry.track()
//!                                                     │
//! user: client.node(ObjectRef) ──► registry.expect(ref, ObjectKind::Node)
//!                                                     │
//! item.destroy() ──────────────────────────────► registry.forget(42)
//! ```

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::object::{ObjectRef, ObjectType};

/// Kind of proxy that can wrap a remote object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    /// Any item (nodes and graphs included).
    Item,
    /// Nodes only.
    Node,
    /// Nested or root graphs.
    Graph,
}

impl ObjectKind {
    /// True if an object of `object_type` may back a proxy of this kind.
    pub const fn admits(self, object_type: ObjectType) -> bool {
        match self {
            ObjectKind::Item => true,
            ObjectKind::Node => matches!(object_type, ObjectType::Node),
            ObjectKind::Graph => object_type.is_graph(),
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObjectKind::Item => write!(f, "item"),
            ObjectKind::Node => write!(f, "node"),
            ObjectKind::Graph => write!(f, "graph"),
        }
    }
}

/// Handle → object type table shared by every proxy of one client.
#[derive(Debug, Default)]
pub struct ObjectRegistry {
    objects: DashMap<u64, ObjectType>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a reference returned by the server. Null references are
    /// ignored; a handle seen again with a more specific type is updated.
    pub fn track(&self, object: ObjectRef) {
        if object.is_null() {
            return;
        }
        self.objects.insert(object.handle, object.object_type);
    }

    /// Records every reference in `objects`.
    pub fn track_all<'a>(&self, objects: impl IntoIterator<Item = &'a ObjectRef>) {
        for object in objects {
            self.track(*object);
        }
    }

    /// The recorded type of `handle`, if known.
    pub fn kind_of(&self, handle: u64) -> Option<ObjectType> {
        self.objects.get(&handle).map(|entry| *entry.value())
    }

    pub fn contains(&self, handle: u64) -> bool {
        self.objects.contains_key(&handle)
    }

    /// Drops a handle, returning the type it had.
    pub fn forget(&self, handle: u64) -> Option<ObjectType> {
        self.objects.remove(&handle).map(|(_, ty)| ty)
    }

    /// Drops every handle (used after a project reset or load, where all
    /// previous handles die).
    pub fn clear(&self) {
        self.objects.clear();
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Checks that `object` can back a proxy of `kind`.
    ///
    /// The recorded type wins over the type carried by the reference, since
    /// callers may hand in references they built themselves. Unknown handles
    /// are judged by the reference's own type.
    pub fn expect(&self, object: ObjectRef, kind: ObjectKind) -> CoreResult<ObjectRef> {
        if object.is_null() {
            return Err(CoreError::NullObject { expected: kind });
        }

        let actual = self.kind_of(object.handle).unwrap_or(object.object_type);
        if !kind.admits(actual) {
            return Err(CoreError::TypeMismatch {
                handle: object.handle,
                expected: kind,
                actual,
            });
        }

        Ok(ObjectRef::new(actual, object.handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_and_forget() {
        let registry = ObjectRegistry::new();
        registry.track(ObjectRef::new(ObjectType::Node, 3));
        registry.track(ObjectRef::null());

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.kind_of(3), Some(ObjectType::Node));
        assert!(!registry.contains(0));

        assert_eq!(registry.forget(3), Some(ObjectType::Node));
        assert!(registry.is_empty());
        assert_eq!(registry.forget(3), None);
    }

    #[test]
    fn test_expect_kinds() {
        let registry = ObjectRegistry::new();
        let node = ObjectRef::new(ObjectType::Node, 1);
        let root = ObjectRef::new(ObjectType::RootNodeGraph, 2);
        registry.track_all([&node, &root]);

        assert!(registry.expect(node, ObjectKind::Item).is_ok());
        assert!(registry.expect(node, ObjectKind::Node).is_ok());
        assert!(registry.expect(root, ObjectKind::Graph).is_ok());
        assert_eq!(
            registry.expect(root, ObjectKind::Node),
            Err(CoreError::TypeMismatch {
                handle: 2,
                expected: ObjectKind::Node,
                actual: ObjectType::RootNodeGraph,
            })
        );
    }

    #[test]
    fn test_expect_prefers_recorded_type() {
        let registry = ObjectRegistry::new();
        registry.track(ObjectRef::new(ObjectType::NodeGraph, 9));

        // Caller claims it is a plain item; the registry knows better
        let claimed = ObjectRef::new(ObjectType::Item, 9);
        let resolved = registry.expect(claimed, ObjectKind::Graph).unwrap();
        assert_eq!(resolved.object_type, ObjectType::NodeGraph);
    }

    #[test]
    fn test_expect_null() {
        let registry = ObjectRegistry::new();
        assert_eq!(
            registry.expect(ObjectRef::null(), ObjectKind::Item),
            Err(CoreError::NullObject {
                expected: ObjectKind::Item
            })
        );
    }
}
