//! # Node Pin Tables
//!
//! Static description of the input pins each node type carries.
//!
//! A pin either takes a connection from a node of an accepted type, holds a
//! plain value of its [`ValueKind`], or both. Connecting a node to a pin drops
//! any value stored on it and vice versa.
//!
//! ```text
//! RenderTarget
//!   ├── camera         ◄── ThinLensCamera
//!   ├── environment    ◄── DaylightEnvironment
//!   ├── kernel         ◄── DirectLightingKernel | PathTracingKernel
//!   ├── mesh           ◄── Mesh
//!   └── film_settings  ◄── FilmSettings
//! ```

use crate::error::{CoreError, CoreResult};
use crate::types::{NodeType, PinId, ValueKind};

/// Description of one input pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinInfo {
    pub id: PinId,
    pub name: &'static str,
    /// Node types that may be connected to this pin.
    pub accepts: &'static [NodeType],
    /// Kind of value the pin can hold directly, if any.
    pub value_kind: Option<ValueKind>,
}

impl PinInfo {
    const fn link(id: PinId, name: &'static str, accepts: &'static [NodeType]) -> Self {
        PinInfo {
            id,
            name,
            accepts,
            value_kind: None,
        }
    }

    const fn value(
        id: PinId,
        name: &'static str,
        accepts: &'static [NodeType],
        kind: ValueKind,
    ) -> Self {
        PinInfo {
            id,
            name,
            accepts,
            value_kind: Some(kind),
        }
    }

    /// True if a node of `node_type` may be connected to this pin.
    pub fn accepts(&self, node_type: NodeType) -> bool {
        self.accepts.contains(&node_type)
    }
}

const FLOAT_SOURCE: &[NodeType] = &[NodeType::FloatValue];
const COLOR_SOURCE: &[NodeType] = &[NodeType::RgbColor];
const NO_SOURCE: &[NodeType] = &[];

const RENDER_TARGET_PINS: &[PinInfo] = &[
    PinInfo::link(PinId::CAMERA, "camera", &[NodeType::ThinLensCamera]),
    PinInfo::link(
        PinId::ENVIRONMENT,
        "environment",
        &[NodeType::DaylightEnvironment],
    ),
    PinInfo::link(
        PinId::KERNEL,
        "kernel",
        &[NodeType::DirectLightingKernel, NodeType::PathTracingKernel],
    ),
    PinInfo::link(PinId::MESH, "mesh", &[NodeType::Mesh]),
    PinInfo::link(
        PinId::FILM_SETTINGS,
        "film_settings",
        &[NodeType::FilmSettings],
    ),
];

const CAMERA_PINS: &[PinInfo] = &[
    PinInfo::value(PinId::FOV, "fov", FLOAT_SOURCE, ValueKind::Float),
    PinInfo::value(PinId::POSITION, "position", NO_SOURCE, ValueKind::Float3),
    PinInfo::value(PinId::TARGET, "target", NO_SOURCE, ValueKind::Float3),
];

const DAYLIGHT_PINS: &[PinInfo] = &[
    PinInfo::value(
        PinId::SUN_DIRECTION,
        "sun_direction",
        NO_SOURCE,
        ValueKind::Float3,
    ),
    PinInfo::value(PinId::POWER, "power", FLOAT_SOURCE, ValueKind::Float),
];

const DIRECT_LIGHTING_PINS: &[PinInfo] = &[PinInfo::value(
    PinId::MAX_SAMPLES,
    "max_samples",
    NO_SOURCE,
    ValueKind::Int,
)];

const PATH_TRACING_PINS: &[PinInfo] = &[
    PinInfo::value(PinId::MAX_SAMPLES, "max_samples", NO_SOURCE, ValueKind::Int),
    PinInfo::value(PinId::MAX_DEPTH, "max_depth", NO_SOURCE, ValueKind::Int),
];

const DIFFUSE_PINS: &[PinInfo] = &[
    PinInfo::value(PinId::DIFFUSE, "diffuse", COLOR_SOURCE, ValueKind::Float3),
    PinInfo::value(PinId::ROUGHNESS, "roughness", FLOAT_SOURCE, ValueKind::Float),
];

const GLOSSY_PINS: &[PinInfo] = &[
    PinInfo::value(PinId::DIFFUSE, "diffuse", COLOR_SOURCE, ValueKind::Float3),
    PinInfo::value(PinId::SPECULAR, "specular", COLOR_SOURCE, ValueKind::Float3),
    PinInfo::value(PinId::ROUGHNESS, "roughness", FLOAT_SOURCE, ValueKind::Float),
];

const MESH_PINS: &[PinInfo] = &[PinInfo::link(
    PinId::MATERIAL,
    "material",
    &[NodeType::DiffuseMaterial, NodeType::GlossyMaterial],
)];

const FILM_PINS: &[PinInfo] = &[
    PinInfo::value(PinId::WIDTH, "width", NO_SOURCE, ValueKind::Int),
    PinInfo::value(PinId::HEIGHT, "height", NO_SOURCE, ValueKind::Int),
];

impl NodeType {
    /// Input pins of this node type, in pin index order.
    pub const fn pins(self) -> &'static [PinInfo] {
        match self {
            NodeType::RenderTarget => RENDER_TARGET_PINS,
            NodeType::ThinLensCamera => CAMERA_PINS,
            NodeType::DaylightEnvironment => DAYLIGHT_PINS,
            NodeType::DirectLightingKernel => DIRECT_LIGHTING_PINS,
            NodeType::PathTracingKernel => PATH_TRACING_PINS,
            NodeType::DiffuseMaterial => DIFFUSE_PINS,
            NodeType::GlossyMaterial => GLOSSY_PINS,
            NodeType::Mesh => MESH_PINS,
            NodeType::FilmSettings => FILM_PINS,
            NodeType::FloatValue | NodeType::RgbColor => &[],
        }
    }

    /// Looks up a pin by id.
    pub fn pin(self, id: PinId) -> CoreResult<&'static PinInfo> {
        self.pins()
            .iter()
            .find(|pin| pin.id == id)
            .ok_or(CoreError::UnknownPin {
                node_type: self,
                pin: id,
            })
    }

    /// Index of a pin within [`NodeType::pins`].
    pub fn pin_index(self, id: PinId) -> CoreResult<usize> {
        self.pins()
            .iter()
            .position(|pin| pin.id == id)
            .ok_or(CoreError::UnknownPin {
                node_type: self,
                pin: id,
            })
    }
}
