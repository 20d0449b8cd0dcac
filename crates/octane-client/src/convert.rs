//! # Wire Conversions
//!
//! Mapping between generated protobuf messages and `octane-core` types.
//!
//! ```text
//! octane_core::ObjectRef      ⇄  proto::ObjectRef { object_type, handle }
//! octane_core::AttrValue      ⇄  proto::AttrValue { oneof value }
//! octane_core::Float2/Float3  ⇄  proto::Float2/Float3
//! proto::RenderStatistics     →  octane_core::RenderStatistics
//! proto::CallbackEvent        →  (CallbackId, octane_core::CallbackEvent)
//! ```

use std::time::Duration;

use octane_core::{
    AttrValue, CallbackEvent, CallbackId, Float2, Float3, ObjectRef, RenderState,
    RenderStatistics,
};

use crate::error::{ClientError, ClientResult};
use crate::proto;

// =============================================================================
// Object References
// =============================================================================

impl From<ObjectRef> for proto::ObjectRef {
    fn from(object: ObjectRef) -> Self {
        proto::ObjectRef {
            object_type: object.wire_type(),
            handle: object.handle,
        }
    }
}

/// Decodes an optional wire reference; an absent message is the null object.
pub(crate) fn object_ref(wire: Option<proto::ObjectRef>) -> ClientResult<ObjectRef> {
    match wire {
        Some(wire) => Ok(ObjectRef::from_wire(wire.object_type, wire.handle)?),
        None => Ok(ObjectRef::null()),
    }
}

// =============================================================================
// Vectors
// =============================================================================

impl From<Float2> for proto::Float2 {
    fn from(v: Float2) -> Self {
        proto::Float2 { x: v.x, y: v.y }
    }
}

impl From<proto::Float2> for Float2 {
    fn from(v: proto::Float2) -> Self {
        Float2::new(v.x, v.y)
    }
}

impl From<Float3> for proto::Float3 {
    fn from(v: Float3) -> Self {
        proto::Float3 {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

impl From<proto::Float3> for Float3 {
    fn from(v: proto::Float3) -> Self {
        Float3::new(v.x, v.y, v.z)
    }
}

// =============================================================================
// Attribute Values
// =============================================================================

impl From<AttrValue> for proto::AttrValue {
    fn from(value: AttrValue) -> Self {
        use proto::attr_value::Value;

        let value = match value {
            AttrValue::Bool(v) => Value::BoolValue(v),
            AttrValue::Int(v) => Value::IntValue(v),
            AttrValue::Float(v) => Value::FloatValue(v),
            AttrValue::String(v) => Value::StringValue(v),
            AttrValue::Float3(v) => Value::Float3Value(v.into()),
        };
        proto::AttrValue { value: Some(value) }
    }
}

/// Decodes an optional wire value; an absent message or empty oneof means
/// "no value stored".
pub(crate) fn attr_value(wire: Option<proto::AttrValue>) -> Option<AttrValue> {
    use proto::attr_value::Value;

    let value = match wire?.value? {
        Value::BoolValue(v) => AttrValue::Bool(v),
        Value::IntValue(v) => AttrValue::Int(v),
        Value::FloatValue(v) => AttrValue::Float(v),
        Value::StringValue(v) => AttrValue::String(v),
        Value::Float3Value(v) => AttrValue::Float3(v.into()),
    };
    Some(value)
}

// =============================================================================
// Render Statistics
// =============================================================================

/// Decodes render statistics. Negative or missing durations read as zero.
pub(crate) fn render_statistics(wire: proto::RenderStatistics) -> ClientResult<RenderStatistics> {
    let elapsed = wire
        .elapsed
        .and_then(|d| Duration::try_from(d).ok())
        .unwrap_or_default();

    Ok(RenderStatistics {
        samples: wire.samples,
        max_samples: wire.max_samples,
        progress: wire.progress,
        state: RenderState::from_wire(wire.state)?,
        width: wire.width,
        height: wire.height,
        elapsed,
    })
}

// =============================================================================
// Callback Events
// =============================================================================

/// Decodes a streamed callback invocation.
pub(crate) fn callback_event(
    wire: proto::CallbackEvent,
) -> ClientResult<(CallbackId, CallbackEvent)> {
    use proto::callback_event::Payload;

    let event = match wire.payload {
        Some(Payload::NewImage(image)) => {
            let stats = image
                .statistics
                .ok_or(ClientError::MissingField("new_image.statistics"))?;
            CallbackEvent::NewImage(render_statistics(stats)?)
        }
        Some(Payload::RenderFailure(failure)) => CallbackEvent::RenderFailure {
            reason: failure.reason,
        },
        // `subscribed` only opens a stream
        Some(Payload::Subscribed(_)) | None => return Err(ClientError::MissingField("payload")),
    };

    Ok((CallbackId(wire.callback_id), event))
}

/// Reads the subscriber id the engine sends first on a callback stream.
pub(crate) fn subscriber_id(wire: proto::CallbackEvent) -> ClientResult<u64> {
    match wire.payload {
        Some(proto::callback_event::Payload::Subscribed(subscribed)) if subscribed.subscriber_id != 0 => {
            Ok(subscribed.subscriber_id)
        }
        _ => Err(ClientError::MissingField("subscribed")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use octane_core::ObjectType;

    #[test]
    fn test_null_ref_on_the_wire() {
        let wire: proto::ObjectRef = ObjectRef::null().into();
        assert_eq!(wire.object_type, 0);
        assert_eq!(wire.handle, 0);

        assert!(object_ref(None).unwrap().is_null());
    }

    #[test]
    fn test_object_ref_decoding() {
        let wire = proto::ObjectRef {
            object_type: proto::ObjectType::NodeGraph as i32,
            handle: 12,
        };
        assert_eq!(
            object_ref(Some(wire)).unwrap(),
            ObjectRef::new(ObjectType::NodeGraph, 12)
        );

        let bogus = proto::ObjectRef {
            object_type: 77,
            handle: 12,
        };
        assert!(matches!(object_ref(Some(bogus)), Err(ClientError::Core(_))));
    }

    #[test]
    fn test_empty_attr_value() {
        assert_eq!(attr_value(None), None);
        assert_eq!(attr_value(Some(proto::AttrValue { value: None })), None);

        let wire: proto::AttrValue = AttrValue::Float3(Float3::new(1.0, 0.5, 0.0)).into();
        assert_eq!(
            attr_value(Some(wire)),
            Some(AttrValue::Float3(Float3::new(1.0, 0.5, 0.0)))
        );
    }

    #[test]
    fn test_render_statistics_decoding() {
        let wire = proto::RenderStatistics {
            samples: 32,
            max_samples: 64,
            progress: 0.5,
            state: proto::RenderState::Rendering as i32,
            width: 320,
            height: 180,
            elapsed: Some(prost_types::Duration {
                seconds: 2,
                nanos: 500_000_000,
            }),
        };
        let stats = render_statistics(wire).unwrap();
        assert_eq!(stats.state, RenderState::Rendering);
        assert_eq!(stats.elapsed, Duration::from_millis(2500));
    }

    #[test]
    fn test_callback_event_decoding() {
        let wire = proto::CallbackEvent {
            callback_id: 4,
            payload: Some(proto::callback_event::Payload::RenderFailure(
                proto::RenderFailure {
                    reason: "no render target".into(),
                },
            )),
        };
        let (id, event) = callback_event(wire).unwrap();
        assert_eq!(id, CallbackId(4));
        assert_eq!(
            event,
            CallbackEvent::RenderFailure {
                reason: "no render target".into()
            }
        );

        let empty = proto::CallbackEvent {
            callback_id: 4,
            payload: None,
        };
        assert!(matches!(
            callback_event(empty),
            Err(ClientError::MissingField("payload"))
        ));
    }

    #[test]
    fn test_stream_opens_with_subscriber_id() {
        let hello = proto::CallbackEvent {
            callback_id: 0,
            payload: Some(proto::callback_event::Payload::Subscribed(proto::Subscribed {
                subscriber_id: 7,
            })),
        };
        assert_eq!(subscriber_id(hello.clone()).unwrap(), 7);
        // Never dispatched as a callback
        assert!(callback_event(hello).is_err());

        let unnamed = proto::CallbackEvent {
            callback_id: 0,
            payload: Some(proto::callback_event::Payload::Subscribed(proto::Subscribed {
                subscriber_id: 0,
            })),
        };
        assert!(matches!(
            subscriber_id(unnamed),
            Err(ClientError::MissingField("subscribed"))
        ));
    }
}
