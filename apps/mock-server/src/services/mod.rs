//! gRPC service implementations, one per engine API object.

pub mod callback_stream;
pub mod change_manager;
pub mod info;
pub mod item;
pub mod node;
pub mod node_graph;
pub mod project_manager;
pub mod render_engine;

use octane_core::ObjectRef;
use tonic::Status;

use crate::convert;
use crate::proto;
use crate::scene::Scene;

/// Resolves a request reference to a live handle.
pub(crate) fn resolve(scene: &Scene, wire: Option<proto::ObjectRef>) -> Result<u64, Status> {
    let object = convert::object_ref(wire)?;
    Ok(scene.resolve(object)?.handle)
}

/// Like [`resolve`], but the null reference yields `None`.
pub(crate) fn resolve_optional(scene: &Scene, wire: Option<proto::ObjectRef>) -> Result<Option<u64>, Status> {
    let object = convert::object_ref(wire)?;
    if object.is_null() {
        return Ok(None);
    }
    Ok(Some(scene.resolve(object)?.handle))
}

pub(crate) fn ref_response(object: ObjectRef) -> proto::ObjectRefResponse {
    proto::ObjectRefResponse {
        result: Some(convert::wire_ref(object)),
    }
}

pub(crate) fn list_response(objects: Vec<ObjectRef>) -> proto::ItemListResponse {
    proto::ItemListResponse {
        items: objects.into_iter().map(convert::wire_ref).collect(),
    }
}
