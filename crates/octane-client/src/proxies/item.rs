//! Proxy for `ApiItem`, the base of every object in a node graph.

use std::sync::Arc;

use octane_core::{AttrValue, AttributeId, Float2, ObjectRef};
use tracing::debug;

use crate::client::OctaneClient;
use crate::convert;
use crate::error::{ClientError, ClientResult};
use crate::proto::api_item_service_client::ApiItemServiceClient;
use crate::proto::{GetAttributeRequest, ItemRequest, SetAttributeRequest, SetNameRequest, SetPositionRequest};
use crate::proxies::{NodeGraphProxy, NodeProxy};

/// A remote item.
#[derive(Debug, Clone)]
pub struct ItemProxy {
    client: OctaneClient,
    object: ObjectRef,
}

impl ItemProxy {
    pub(crate) fn new(client: OctaneClient, object: ObjectRef) -> Self {
        ItemProxy { client, object }
    }

    /// The wrapped reference.
    pub fn object(&self) -> ObjectRef {
        self.object
    }

    pub fn handle(&self) -> u64 {
        self.object.handle
    }

    pub fn client(&self) -> &OctaneClient {
        &self.client
    }

    fn stub(&self) -> ApiItemServiceClient<tonic::transport::Channel> {
        ApiItemServiceClient::new(self.client.channel())
    }

    pub(crate) fn request(&self) -> ItemRequest {
        ItemRequest {
            item: Some(self.object.into()),
        }
    }

    pub async fn name(&self) -> ClientResult<Arc<str>> {
        let response = self.stub().name(self.request()).await?.into_inner();
        Ok(self.client.strings().intern(&response.name))
    }

    pub async fn set_name(&self, name: &str) -> ClientResult<()> {
        debug!(item = %self.object, name, "Renaming item");
        self.stub()
            .set_name(SetNameRequest {
                item: Some(self.object.into()),
                name: name.to_string(),
            })
            .await?;
        Ok(())
    }

    /// Engine-wide id that survives project save and load, unlike the handle.
    pub async fn unique_id(&self) -> ClientResult<u64> {
        let response = self.stub().unique_id(self.request()).await?.into_inner();
        Ok(response.unique_id)
    }

    /// Position in the node graph editor.
    pub async fn position(&self) -> ClientResult<Float2> {
        let response = self.stub().position(self.request()).await?.into_inner();
        let position = response.position.ok_or(ClientError::MissingField("position"))?;
        Ok(position.into())
    }

    pub async fn set_position(&self, position: Float2) -> ClientResult<()> {
        self.stub()
            .set_position(SetPositionRequest {
                item: Some(self.object.into()),
                position: Some(position.into()),
            })
            .await?;
        Ok(())
    }

    /// The graph owning this item; `None` for the root graph.
    pub async fn graph_owner(&self) -> ClientResult<Option<NodeGraphProxy>> {
        let response = self.stub().graph_owner(self.request()).await?.into_inner();
        let owner = self.client.track(response.result)?;
        if owner.is_null() {
            return Ok(None);
        }
        Ok(Some(NodeGraphProxy::new(self.client.clone(), owner)))
    }

    /// Reads an attribute; `None` when it holds no value.
    pub async fn attribute(&self, id: AttributeId) -> ClientResult<Option<AttrValue>> {
        let response = self
            .stub()
            .get_attribute(GetAttributeRequest {
                item: Some(self.object.into()),
                attribute_id: id.0,
            })
            .await?
            .into_inner();
        Ok(convert::attr_value(response.value))
    }

    pub async fn set_attribute(&self, id: AttributeId, value: impl Into<AttrValue>) -> ClientResult<()> {
        let value = value.into();
        debug!(item = %self.object, attribute = %id, ?value, "Setting attribute");
        self.stub()
            .set_attribute(SetAttributeRequest {
                item: Some(self.object.into()),
                attribute_id: id.0,
                value: Some(value.into()),
            })
            .await?;
        Ok(())
    }

    /// Destroys the item on the engine and forgets its handle.
    ///
    /// Destroying a graph destroys everything it owns; handles of those
    /// items stay in the registry until they are used and rejected.
    pub async fn destroy(&self) -> ClientResult<()> {
        debug!(item = %self.object, "Destroying item");
        self.stub().destroy(self.request()).await?;
        self.client.objects().forget(self.object.handle);
        Ok(())
    }

    // =========================================================================
    // Casts
    // =========================================================================

    pub fn is_node(&self) -> bool {
        self.client
            .objects()
            .kind_of(self.object.handle)
            .unwrap_or(self.object.object_type)
            == octane_core::ObjectType::Node
    }

    pub fn is_graph(&self) -> bool {
        self.client
            .objects()
            .kind_of(self.object.handle)
            .unwrap_or(self.object.object_type)
            .is_graph()
    }

    pub fn as_node(&self) -> ClientResult<NodeProxy> {
        self.client.node(self.object)
    }

    pub fn as_graph(&self) -> ClientResult<NodeGraphProxy> {
        self.client.graph(self.object)
    }
}

impl PartialEq for ItemProxy {
    fn eq(&self, other: &Self) -> bool {
        self.object.handle == other.object.handle
    }
}

impl Eq for ItemProxy {}

#[cfg(test)]
mod tests {
    use crate::test_support::TestEngine;
    use octane_core::{AttrValue, AttributeId, Float2, NodeType};

    #[tokio::test]
    async fn test_name_roundtrip_is_interned() {
        let engine = TestEngine::start().await;
        let client = engine.client().await;
        let root = client.project_manager().root_node_graph().await.unwrap();

        let node = root.create_node(NodeType::ThinLensCamera).await.unwrap();
        assert_eq!(&*node.name().await.unwrap(), "Thin lens camera");

        node.set_name("Hero cam").await.unwrap();
        let a = node.name().await.unwrap();
        let b = node.name().await.unwrap();
        assert_eq!(&*a, "Hero cam");
        assert!(std::sync::Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn test_position_and_attributes() {
        let engine = TestEngine::start().await;
        let client = engine.client().await;
        let root = client.project_manager().root_node_graph().await.unwrap();
        let value = root.create_node(NodeType::FloatValue).await.unwrap();

        assert_eq!(value.position().await.unwrap(), Float2::default());
        value.set_position(Float2::new(120.0, -40.0)).await.unwrap();
        assert_eq!(value.position().await.unwrap(), Float2::new(120.0, -40.0));

        assert_eq!(value.attribute(AttributeId::VALUE).await.unwrap(), None);
        value.set_attribute(AttributeId::VALUE, 0.75).await.unwrap();
        assert_eq!(
            value.attribute(AttributeId::VALUE).await.unwrap(),
            Some(AttrValue::Float(0.75))
        );
    }

    #[tokio::test]
    async fn test_graph_owner() {
        let engine = TestEngine::start().await;
        let client = engine.client().await;
        let root = client.project_manager().root_node_graph().await.unwrap();
        assert!(root.graph_owner().await.unwrap().is_none());

        let node = root.create_node(NodeType::Mesh).await.unwrap();
        let owner = node.graph_owner().await.unwrap().unwrap();
        assert_eq!(owner.object(), root.object());
    }

    #[tokio::test]
    async fn test_destroy_forgets_handle() {
        let engine = TestEngine::start().await;
        let client = engine.client().await;
        let root = client.project_manager().root_node_graph().await.unwrap();

        let node = root.create_node(NodeType::RgbColor).await.unwrap();
        let handle = node.handle();
        assert!(client.objects().contains(handle));

        node.destroy().await.unwrap();
        assert!(!client.objects().contains(handle));

        // The engine no longer knows the handle either
        let err = node.name().await.unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[tokio::test]
    async fn test_root_graph_cannot_be_destroyed() {
        let engine = TestEngine::start().await;
        let client = engine.client().await;
        let root = client.project_manager().root_node_graph().await.unwrap();

        let err = root.destroy().await.unwrap_err();
        assert!(err.is_runtime());
        assert_eq!(err.code(), Some(tonic::Code::FailedPrecondition));
    }

    #[tokio::test]
    async fn test_casts() {
        let engine = TestEngine::start().await;
        let client = engine.client().await;
        let root = client.project_manager().root_node_graph().await.unwrap();
        root.create_node(NodeType::Mesh).await.unwrap();
        root.create_graph().await.unwrap();

        let items = root.owned_items().await.unwrap();
        assert_eq!(items.len(), 2);
        assert!(items[0].is_node());
        assert!(items[0].as_node().is_ok());
        assert!(items[0].as_graph().is_err());
        assert!(items[1].is_graph());
        assert!(items[1].as_graph().is_ok());
    }
}
