//! Error types for the mock engine.

use octane_core::{CoreError, NodeType, PinId, ValueKind};
use tonic::Status;

pub type SceneResult<T> = Result<T, SceneError>;

/// Scene and engine errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    #[error("Null {0} reference")]
    NullObject(&'static str),

    #[error("Unknown object handle {0}")]
    UnknownHandle(u64),

    #[error("Object {handle} is a {actual}, not a {expected}")]
    WrongObjectType {
        handle: u64,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Pin index {index} out of range for a node with {count} pins")]
    PinIndexOutOfRange { index: u32, count: u32 },

    #[error("Pin {pin} does not accept {source_type} nodes")]
    IncompatibleSource { pin: PinId, source_type: NodeType },

    #[error("Pin {pin} cannot hold a {actual:?} value")]
    ValueKindMismatch { pin: PinId, actual: ValueKind },

    #[error("Unknown attribute {0}")]
    UnknownAttribute(u32),

    #[error("Attribute {id} cannot hold a {actual:?} value")]
    AttributeKindMismatch { id: u32, actual: ValueKind },

    #[error("Root graphs cannot be created, each project has exactly one")]
    CannotCreateRoot,

    #[error("The root graph cannot be destroyed")]
    CannotDestroyRoot,

    #[error("Nodes {source_node} and {target} live in different graphs")]
    DifferentGraphs { source_node: u64, target: u64 },

    #[error("Node {0} cannot be connected to itself")]
    SelfConnection(u64),

    /// Only produced while loading a project, which reports it as a `false`
    /// result rather than a status.
    #[error("Corrupt project file: {0}")]
    CorruptProject(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl From<SceneError> for Status {
    fn from(error: SceneError) -> Self {
        let message = error.to_string();
        match error {
            SceneError::CannotDestroyRoot
            | SceneError::DifferentGraphs { .. }
            | SceneError::SelfConnection(_) => Status::failed_precondition(message),
            SceneError::Io(_) => Status::internal(message),
            _ => Status::invalid_argument(message),
        }
    }
}

impl From<std::io::Error> for SceneError {
    fn from(err: std::io::Error) -> Self {
        SceneError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SceneError {
    fn from(err: serde_json::Error) -> Self {
        SceneError::CorruptProject(err.to_string())
    }
}
