//! Conversions between generated messages and `octane-core` types.

use octane_core::{AttrValue, Float2, Float3, ObjectRef, RenderStatistics};

use crate::error::{SceneError, SceneResult};
use crate::proto;

/// Decodes a reference from a request; an absent field is the null object.
pub fn object_ref(wire: Option<proto::ObjectRef>) -> SceneResult<ObjectRef> {
    match wire {
        Some(wire) => Ok(ObjectRef::from_wire(wire.object_type, wire.handle)?),
        None => Ok(ObjectRef::null()),
    }
}

pub fn wire_ref(object: ObjectRef) -> proto::ObjectRef {
    proto::ObjectRef {
        object_type: object.wire_type(),
        handle: object.handle,
    }
}

pub fn float2(wire: Option<proto::Float2>) -> Float2 {
    wire.map(|v| Float2::new(v.x, v.y)).unwrap_or_default()
}

pub fn wire_float2(v: Float2) -> proto::Float2 {
    proto::Float2 { x: v.x, y: v.y }
}

/// Decodes a value that must be present.
pub fn attr_value(wire: Option<proto::AttrValue>, field: &'static str) -> SceneResult<AttrValue> {
    use proto::attr_value::Value;

    let value = wire
        .and_then(|v| v.value)
        .ok_or(SceneError::NullObject(field))?;
    Ok(match value {
        Value::BoolValue(v) => AttrValue::Bool(v),
        Value::IntValue(v) => AttrValue::Int(v),
        Value::FloatValue(v) => AttrValue::Float(v),
        Value::StringValue(v) => AttrValue::String(v),
        Value::Float3Value(v) => AttrValue::Float3(Float3::new(v.x, v.y, v.z)),
    })
}

pub fn wire_attr_value(value: AttrValue) -> proto::AttrValue {
    use proto::attr_value::Value;

    let value = match value {
        AttrValue::Bool(v) => Value::BoolValue(v),
        AttrValue::Int(v) => Value::IntValue(v),
        AttrValue::Float(v) => Value::FloatValue(v),
        AttrValue::String(v) => Value::StringValue(v),
        AttrValue::Float3(v) => Value::Float3Value(proto::Float3 {
            x: v.x,
            y: v.y,
            z: v.z,
        }),
    };
    proto::AttrValue { value: Some(value) }
}

pub fn wire_statistics(stats: &RenderStatistics) -> proto::RenderStatistics {
    proto::RenderStatistics {
        samples: stats.samples,
        max_samples: stats.max_samples,
        progress: stats.progress,
        state: stats.state.wire(),
        width: stats.width,
        height: stats.height,
        elapsed: prost_types::Duration::try_from(stats.elapsed).ok(),
    }
}
