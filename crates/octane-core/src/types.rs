//! # Domain Types
//!
//! Value types that travel through the engine API.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    NodeType     │   │    GraphType    │   │   AttrValue     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  RenderTarget   │   │  Standard       │   │  Bool / Int     │       │
//! │  │  ThinLensCamera │   │  Root           │   │  Float / String │       │
//! │  │  Mesh, ...      │   └─────────────────┘   │  Float3         │       │
//! │  └─────────────────┘                         └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  PinId (u32)    │   │ AttributeId(u32)│   │RenderStatistics │       │
//! │  │  CAMERA, MESH.. │   │  VALUE, ...     │   │  samples, state │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Node type values follow the engine's own numbering so projects saved by
//! one client load unchanged in another.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

// =============================================================================
// Node Type
// =============================================================================

/// Type of a node, as numbered by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Mesh,
    FloatValue,
    ThinLensCamera,
    DaylightEnvironment,
    GlossyMaterial,
    DiffuseMaterial,
    DirectLightingKernel,
    PathTracingKernel,
    RgbColor,
    RenderTarget,
    FilmSettings,
}

impl NodeType {
    /// Every node type the API exposes.
    pub const ALL: [NodeType; 11] = [
        NodeType::Mesh,
        NodeType::FloatValue,
        NodeType::ThinLensCamera,
        NodeType::DaylightEnvironment,
        NodeType::GlossyMaterial,
        NodeType::DiffuseMaterial,
        NodeType::DirectLightingKernel,
        NodeType::PathTracingKernel,
        NodeType::RgbColor,
        NodeType::RenderTarget,
        NodeType::FilmSettings,
    ];

    /// Engine id of this node type.
    pub const fn wire(self) -> u32 {
        match self {
            NodeType::Mesh => 1,
            NodeType::FloatValue => 6,
            NodeType::ThinLensCamera => 13,
            NodeType::DaylightEnvironment => 14,
            NodeType::GlossyMaterial => 16,
            NodeType::DiffuseMaterial => 17,
            NodeType::DirectLightingKernel => 24,
            NodeType::PathTracingKernel => 25,
            NodeType::RgbColor => 33,
            NodeType::RenderTarget => 56,
            NodeType::FilmSettings => 100,
        }
    }

    /// Decodes an engine node type id.
    pub fn from_wire(value: u32) -> CoreResult<Self> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.wire() == value)
            .ok_or(CoreError::UnknownNodeType(value))
    }

    /// Default item name given to freshly created nodes.
    pub const fn default_name(self) -> &'static str {
        match self {
            NodeType::Mesh => "Mesh",
            NodeType::FloatValue => "Float value",
            NodeType::ThinLensCamera => "Thin lens camera",
            NodeType::DaylightEnvironment => "Daylight environment",
            NodeType::GlossyMaterial => "Glossy material",
            NodeType::DiffuseMaterial => "Diffuse material",
            NodeType::DirectLightingKernel => "Direct lighting kernel",
            NodeType::PathTracingKernel => "Path tracing kernel",
            NodeType::RgbColor => "RGB color",
            NodeType::RenderTarget => "Render target",
            NodeType::FilmSettings => "Film settings",
        }
    }

    /// True for the two render kernels.
    pub const fn is_kernel(self) -> bool {
        matches!(
            self,
            NodeType::DirectLightingKernel | NodeType::PathTracingKernel
        )
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

// =============================================================================
// Graph Type
// =============================================================================

/// Type of a node graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphType {
    /// Plain nested graph.
    #[default]
    Standard,
    /// The project's root graph. Exactly one exists per project.
    Root,
}

impl GraphType {
    /// Engine id of this graph type.
    pub const fn wire(self) -> u32 {
        match self {
            GraphType::Standard => 1,
            GraphType::Root => 2,
        }
    }

    /// Decodes an engine graph type id.
    pub fn from_wire(value: u32) -> CoreResult<Self> {
        match value {
            1 => Ok(GraphType::Standard),
            2 => Ok(GraphType::Root),
            other => Err(CoreError::UnknownGraphType(other)),
        }
    }
}

// =============================================================================
// Pin & Attribute Ids
// =============================================================================

/// Identifier of a node input pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PinId(pub u32);

impl PinId {
    pub const CAMERA: PinId = PinId(15);
    pub const ENVIRONMENT: PinId = PinId(37);
    pub const KERNEL: PinId = PinId(86);
    pub const MESH: PinId = PinId(104);
    pub const FILM_SETTINGS: PinId = PinId(469);
    pub const MATERIAL: PinId = PinId(100);
    pub const DIFFUSE: PinId = PinId(31);
    pub const SPECULAR: PinId = PinId(193);
    pub const ROUGHNESS: PinId = PinId(184);
    pub const FOV: PinId = PinId(58);
    pub const POSITION: PinId = PinId(151);
    pub const TARGET: PinId = PinId(244);
    pub const SUN_DIRECTION: PinId = PinId(240);
    pub const POWER: PinId = PinId(152);
    pub const MAX_SAMPLES: PinId = PinId(98);
    pub const MAX_DEPTH: PinId = PinId(97);
    pub const WIDTH: PinId = PinId(292);
    pub const HEIGHT: PinId = PinId(293);
}

impl std::fmt::Display for PinId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an item attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AttributeId(pub u32);

impl AttributeId {
    /// Value of value nodes (float, color).
    pub const VALUE: AttributeId = AttributeId(185);
    /// File backing an item (mesh files, images).
    pub const FILENAME: AttributeId = AttributeId(51);
    /// Whether the item takes part in evaluation.
    pub const ENABLED: AttributeId = AttributeId(40);
}

impl std::fmt::Display for AttributeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Values
// =============================================================================

/// Two-component float vector (node graph positions).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Float2 {
    pub x: f32,
    pub y: f32,
}

impl Float2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Float2 { x, y }
    }
}

/// Three-component float vector (colors, directions, positions).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Float3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Float3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Float3 { x, y, z }
    }
}

/// Kind of value a pin or attribute stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Bool,
    Int,
    Float,
    String,
    Float3,
}

/// A value stored in an attribute or directly on a pin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Float3(Float3),
}

impl AttrValue {
    /// The kind of this value.
    pub const fn kind(&self) -> ValueKind {
        match self {
            AttrValue::Bool(_) => ValueKind::Bool,
            AttrValue::Int(_) => ValueKind::Int,
            AttrValue::Float(_) => ValueKind::Float,
            AttrValue::String(_) => ValueKind::String,
            AttrValue::Float3(_) => ValueKind::Float3,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            AttrValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::String(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Bool(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Float(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::String(v.to_string())
    }
}

impl From<Float3> for AttrValue {
    fn from(v: Float3) -> Self {
        AttrValue::Float3(v)
    }
}

// =============================================================================
// Rendering
// =============================================================================

/// State of the render engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderState {
    #[default]
    Stopped,
    Rendering,
    Paused,
    Finished,
    Failed,
}

impl RenderState {
    pub const fn wire(self) -> i32 {
        match self {
            RenderState::Stopped => 0,
            RenderState::Rendering => 1,
            RenderState::Paused => 2,
            RenderState::Finished => 3,
            RenderState::Failed => 4,
        }
    }

    pub fn from_wire(value: i32) -> CoreResult<Self> {
        match value {
            0 => Ok(RenderState::Stopped),
            1 => Ok(RenderState::Rendering),
            2 => Ok(RenderState::Paused),
            3 => Ok(RenderState::Finished),
            4 => Ok(RenderState::Failed),
            other => Err(CoreError::UnknownRenderState(other)),
        }
    }
}

/// Snapshot of render progress.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RenderStatistics {
    /// Samples per pixel rendered so far.
    pub samples: u32,
    /// Samples per pixel at which rendering finishes.
    pub max_samples: u32,
    /// `samples / max_samples`, clamped to `0.0..=1.0`.
    pub progress: f64,
    pub state: RenderState,
    pub width: u32,
    pub height: u32,
    /// Render time, excluding paused time.
    pub elapsed: Duration,
}

impl RenderStatistics {
    /// Computes progress for the given sample counts.
    pub fn progress_of(samples: u32, max_samples: u32) -> f64 {
        if max_samples == 0 {
            return 0.0;
        }
        (f64::from(samples) / f64::from(max_samples)).clamp(0.0, 1.0)
    }

    /// True once every sample has been rendered.
    pub fn is_complete(&self) -> bool {
        self.max_samples > 0 && self.samples >= self.max_samples
    }
}

/// File format for saved render results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageType {
    #[default]
    Png8,
    Png16,
    Exr,
    Tiff8,
}

impl ImageType {
    pub const fn wire(self) -> i32 {
        match self {
            ImageType::Png8 => 0,
            ImageType::Png16 => 1,
            ImageType::Exr => 2,
            ImageType::Tiff8 => 3,
        }
    }

    pub fn from_wire(value: i32) -> CoreResult<Self> {
        match value {
            0 => Ok(ImageType::Png8),
            1 => Ok(ImageType::Png16),
            2 => Ok(ImageType::Exr),
            3 => Ok(ImageType::Tiff8),
            other => Err(CoreError::UnknownImageType(other)),
        }
    }

    /// Conventional file extension, without the dot.
    pub const fn extension(self) -> &'static str {
        match self {
            ImageType::Png8 | ImageType::Png16 => "png",
            ImageType::Exr => "exr",
            ImageType::Tiff8 => "tif",
        }
    }
}

impl std::str::FromStr for ImageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "png" | "png8" => Ok(ImageType::Png8),
            "png16" => Ok(ImageType::Png16),
            "exr" => Ok(ImageType::Exr),
            "tif" | "tiff" | "tiff8" => Ok(ImageType::Tiff8),
            other => Err(format!(
                "Unknown image type: '{}'. Valid options: png8, png16, exr, tiff8",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_type_ids() {
        assert_eq!(NodeType::RenderTarget.wire(), 56);
        assert_eq!(NodeType::from_wire(13).unwrap(), NodeType::ThinLensCamera);
        assert_eq!(NodeType::from_wire(2), Err(CoreError::UnknownNodeType(2)));
    }

    #[test]
    fn test_node_type_ids_are_unique() {
        let mut ids: Vec<u32> = NodeType::ALL.iter().map(|t| t.wire()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), NodeType::ALL.len());
    }

    #[test]
    fn test_graph_type_decoding() {
        assert_eq!(GraphType::from_wire(2).unwrap(), GraphType::Root);
        assert!(GraphType::from_wire(0).is_err());
    }

    #[test]
    fn test_attr_value_kinds() {
        assert_eq!(AttrValue::from(true).kind(), ValueKind::Bool);
        assert_eq!(AttrValue::from(3_i64).as_int(), Some(3));
        assert_eq!(AttrValue::from(0.5).as_float(), Some(0.5));
        assert_eq!(AttrValue::from("a.obj").as_str(), Some("a.obj"));
        assert_eq!(AttrValue::from(1.0).as_int(), None);
    }

    #[test]
    fn test_attr_value_json_shape() {
        let json = serde_json::to_string(&AttrValue::Int(7)).unwrap();
        assert_eq!(json, r#"{"kind":"int","value":7}"#);
    }

    #[test]
    fn test_progress() {
        assert_eq!(RenderStatistics::progress_of(0, 0), 0.0);
        assert_eq!(RenderStatistics::progress_of(16, 64), 0.25);
        assert_eq!(RenderStatistics::progress_of(80, 64), 1.0);

        let stats = RenderStatistics {
            samples: 64,
            max_samples: 64,
            ..Default::default()
        };
        assert!(stats.is_complete());
        assert!(!RenderStatistics::default().is_complete());
    }

    #[test]
    fn test_image_type_parsing() {
        assert_eq!("PNG".parse::<ImageType>().unwrap(), ImageType::Png8);
        assert_eq!("tiff".parse::<ImageType>().unwrap(), ImageType::Tiff8);
        assert!("gif".parse::<ImageType>().is_err());
        assert_eq!(ImageType::Exr.extension(), "exr");
    }
}
