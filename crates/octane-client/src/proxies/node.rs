//! Proxy for `ApiNode`.

use std::ops::Deref;
use std::sync::Arc;

use octane_core::{AttrValue, NodeType, ObjectRef, PinId};
use tracing::debug;

use crate::client::OctaneClient;
use crate::convert;
use crate::error::ClientResult;
use crate::proto::api_node_service_client::ApiNodeServiceClient;
use crate::proto::{ConnectToRequest, CreateNodeRequest, PinIndexRequest, PinRequest, SetPinValueRequest};
use crate::proxies::{ItemProxy, NodeGraphProxy};

/// A remote node. Dereferences to [`ItemProxy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeProxy {
    item: ItemProxy,
}

impl NodeProxy {
    pub(crate) fn new(client: OctaneClient, object: ObjectRef) -> Self {
        NodeProxy {
            item: ItemProxy::new(client, object),
        }
    }

    /// Creates a node of `node_type` inside `owner`.
    ///
    /// With `configure_pins` set the engine fills every pin with a default
    /// value or a freshly created source node, the way the editor does.
    pub async fn create(
        owner: &NodeGraphProxy,
        node_type: NodeType,
        configure_pins: bool,
    ) -> ClientResult<NodeProxy> {
        let client = owner.client().clone();
        let response = ApiNodeServiceClient::new(client.channel())
            .create(CreateNodeRequest {
                node_type: node_type.wire(),
                owner_graph: Some(owner.object().into()),
                configure_pins,
            })
            .await?
            .into_inner();

        let object = client.track(response.result)?;
        debug!(node = %object, %node_type, graph = %owner.object(), "Node created");
        client.node(object)
    }

    fn stub(&self) -> ApiNodeServiceClient<tonic::transport::Channel> {
        ApiNodeServiceClient::new(self.client().channel())
    }

    fn pin_request(&self, pin: PinId) -> PinRequest {
        PinRequest {
            item: Some(self.object().into()),
            pin_id: pin.0,
        }
    }

    pub async fn node_type(&self) -> ClientResult<NodeType> {
        let response = self.stub().get_node_type(self.request()).await?.into_inner();
        Ok(NodeType::from_wire(response.node_type)?)
    }

    pub async fn pin_count(&self) -> ClientResult<u32> {
        let response = self.stub().pin_count(self.request()).await?.into_inner();
        Ok(response.count)
    }

    /// Name of the pin at `index` (0-based, in pin table order).
    pub async fn pin_name(&self, index: u32) -> ClientResult<Arc<str>> {
        let response = self
            .stub()
            .pin_name(PinIndexRequest {
                item: Some(self.object().into()),
                index,
            })
            .await?
            .into_inner();
        Ok(self.client().strings().intern(&response.name))
    }

    /// Connects `source` to `pin`, or disconnects it when `source` is `None`.
    ///
    /// Source and target must live in the same graph and the pin must accept
    /// the source's node type.
    pub async fn connect_to(&self, pin: PinId, source: Option<&NodeProxy>) -> ClientResult<()> {
        let source = source.map(|node| node.object()).unwrap_or_default();
        debug!(node = %self.object(), %pin, %source, "Connecting pin");
        self.stub()
            .connect_to(ConnectToRequest {
                item: Some(self.object().into()),
                pin_id: pin.0,
                source: Some(source.into()),
            })
            .await?;
        Ok(())
    }

    pub async fn disconnect(&self, pin: PinId) -> ClientResult<()> {
        self.connect_to(pin, None).await
    }

    /// The node connected to `pin`, if any.
    pub async fn connected_node(&self, pin: PinId) -> ClientResult<Option<NodeProxy>> {
        let response = self
            .stub()
            .connected_node(self.pin_request(pin))
            .await?
            .into_inner();
        let object = self.client().track(response.result)?;
        if object.is_null() {
            return Ok(None);
        }
        Ok(Some(NodeProxy::new(self.client().clone(), object)))
    }

    /// The value stored directly on `pin`; `None` when the pin is empty or
    /// connected.
    pub async fn pin_value(&self, pin: PinId) -> ClientResult<Option<AttrValue>> {
        let response = self
            .stub()
            .get_pin_value(self.pin_request(pin))
            .await?
            .into_inner();
        Ok(convert::attr_value(response.value))
    }

    /// Stores a value on `pin`, replacing any connection.
    pub async fn set_pin_value(&self, pin: PinId, value: impl Into<AttrValue>) -> ClientResult<()> {
        self.stub()
            .set_pin_value(SetPinValueRequest {
                item: Some(self.object().into()),
                pin_id: pin.0,
                value: Some(value.into().into()),
            })
            .await?;
        Ok(())
    }
}

impl Deref for NodeProxy {
    type Target = ItemProxy;

    fn deref(&self) -> &ItemProxy {
        &self.item
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::TestEngine;
    use crate::ClientError;
    use octane_core::{AttrValue, Float3, NodeType, PinId};

    #[tokio::test]
    async fn test_node_type_and_pins() {
        let engine = TestEngine::start().await;
        let client = engine.client().await;
        let root = client.project_manager().root_node_graph().await.unwrap();

        let target = root.create_node(NodeType::RenderTarget).await.unwrap();
        assert_eq!(target.node_type().await.unwrap(), NodeType::RenderTarget);
        assert_eq!(target.pin_count().await.unwrap(), 5);
        assert_eq!(&*target.pin_name(0).await.unwrap(), "camera");
        assert_eq!(&*target.pin_name(2).await.unwrap(), "kernel");

        let err = target.pin_name(5).await.unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[tokio::test]
    async fn test_connect_and_disconnect() {
        let engine = TestEngine::start().await;
        let client = engine.client().await;
        let root = client.project_manager().root_node_graph().await.unwrap();

        let target = root.create_node(NodeType::RenderTarget).await.unwrap();
        let camera = root.create_node(NodeType::ThinLensCamera).await.unwrap();

        assert!(target.connected_node(PinId::CAMERA).await.unwrap().is_none());
        target.connect_to(PinId::CAMERA, Some(&camera)).await.unwrap();
        assert_eq!(
            target.connected_node(PinId::CAMERA).await.unwrap(),
            Some(camera.clone())
        );

        target.disconnect(PinId::CAMERA).await.unwrap();
        assert!(target.connected_node(PinId::CAMERA).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_connect_rejects_wrong_source_type() {
        let engine = TestEngine::start().await;
        let client = engine.client().await;
        let root = client.project_manager().root_node_graph().await.unwrap();

        let target = root.create_node(NodeType::RenderTarget).await.unwrap();
        let mesh = root.create_node(NodeType::Mesh).await.unwrap();

        let err = target.connect_to(PinId::CAMERA, Some(&mesh)).await.unwrap_err();
        assert!(err.is_invalid_argument());

        let err = target.connect_to(PinId::FOV, Some(&mesh)).await.unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[tokio::test]
    async fn test_connect_across_graphs_fails() {
        let engine = TestEngine::start().await;
        let client = engine.client().await;
        let root = client.project_manager().root_node_graph().await.unwrap();
        let nested = root.create_graph().await.unwrap();

        let target = root.create_node(NodeType::RenderTarget).await.unwrap();
        let camera = nested.create_node(NodeType::ThinLensCamera).await.unwrap();

        let err = target.connect_to(PinId::CAMERA, Some(&camera)).await.unwrap_err();
        assert!(matches!(err, ClientError::Rpc { code: tonic::Code::FailedPrecondition, .. }));
    }

    #[tokio::test]
    async fn test_pin_values() {
        let engine = TestEngine::start().await;
        let client = engine.client().await;
        let root = client.project_manager().root_node_graph().await.unwrap();

        let camera = root.create_node(NodeType::ThinLensCamera).await.unwrap();
        assert_eq!(camera.pin_value(PinId::FOV).await.unwrap(), None);

        camera.set_pin_value(PinId::FOV, 39.6).await.unwrap();
        camera
            .set_pin_value(PinId::POSITION, Float3::new(0.0, 1.5, 5.0))
            .await
            .unwrap();
        assert_eq!(
            camera.pin_value(PinId::FOV).await.unwrap(),
            Some(AttrValue::Float(39.6))
        );

        // Value kind must match the pin
        let err = camera.set_pin_value(PinId::FOV, "wide").await.unwrap_err();
        assert!(err.is_invalid_argument());

        // Connecting a source replaces the stored value
        let fov = root.create_node(NodeType::FloatValue).await.unwrap();
        camera.connect_to(PinId::FOV, Some(&fov)).await.unwrap();
        assert_eq!(camera.pin_value(PinId::FOV).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_configure_pins() {
        let engine = TestEngine::start().await;
        let client = engine.client().await;
        let root = client.project_manager().root_node_graph().await.unwrap();

        let kernel = super::NodeProxy::create(&root, NodeType::PathTracingKernel, true)
            .await
            .unwrap();
        assert!(kernel.pin_value(PinId::MAX_SAMPLES).await.unwrap().is_some());

        let material = super::NodeProxy::create(&root, NodeType::DiffuseMaterial, true)
            .await
            .unwrap();
        let color = material.connected_node(PinId::DIFFUSE).await.unwrap().unwrap();
        assert_eq!(color.node_type().await.unwrap(), NodeType::RgbColor);
    }

    #[tokio::test]
    async fn test_destroy_clears_connections() {
        let engine = TestEngine::start().await;
        let client = engine.client().await;
        let root = client.project_manager().root_node_graph().await.unwrap();

        let mesh = root.create_node(NodeType::Mesh).await.unwrap();
        let material = root.create_node(NodeType::GlossyMaterial).await.unwrap();
        mesh.connect_to(PinId::MATERIAL, Some(&material)).await.unwrap();

        material.destroy().await.unwrap();
        assert!(mesh.connected_node(PinId::MATERIAL).await.unwrap().is_none());
    }
}
