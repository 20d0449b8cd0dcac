//! Proxy for `ApiNodeGraph` and `ApiRootNodeGraph`.

use std::ops::Deref;

use octane_core::{GraphType, NodeType, ObjectRef};
use tracing::debug;

use crate::client::OctaneClient;
use crate::error::ClientResult;
use crate::proto::api_node_graph_service_client::ApiNodeGraphServiceClient;
use crate::proto::{CreateGraphRequest, FindNodesRequest};
use crate::proxies::{ItemProxy, NodeProxy};

/// A remote node graph. Dereferences to [`ItemProxy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeGraphProxy {
    item: ItemProxy,
}

impl NodeGraphProxy {
    pub(crate) fn new(client: OctaneClient, object: ObjectRef) -> Self {
        NodeGraphProxy {
            item: ItemProxy::new(client, object),
        }
    }

    /// Creates an empty graph inside `owner`. Only standard graphs can be
    /// created; the root graph belongs to the project.
    pub async fn create(owner: &NodeGraphProxy, graph_type: GraphType) -> ClientResult<NodeGraphProxy> {
        let client = owner.client().clone();
        let response = ApiNodeGraphServiceClient::new(client.channel())
            .create(CreateGraphRequest {
                graph_type: graph_type.wire(),
                owner_graph: Some(owner.object().into()),
            })
            .await?
            .into_inner();

        let object = client.track(response.result)?;
        debug!(graph = %object, owner = %owner.object(), "Graph created");
        client.graph(object)
    }

    fn stub(&self) -> ApiNodeGraphServiceClient<tonic::transport::Channel> {
        ApiNodeGraphServiceClient::new(self.client().channel())
    }

    pub fn is_root(&self) -> bool {
        self.object().object_type == octane_core::ObjectType::RootNodeGraph
    }

    pub async fn graph_type(&self) -> ClientResult<GraphType> {
        let response = self.stub().get_graph_type(self.request()).await?.into_inner();
        Ok(GraphType::from_wire(response.graph_type)?)
    }

    /// Items directly owned by this graph, in creation order.
    pub async fn owned_items(&self) -> ClientResult<Vec<ItemProxy>> {
        let response = self.stub().get_owned_items(self.request()).await?.into_inner();
        let client = self.client();
        Ok(client
            .track_list(response.items)?
            .into_iter()
            .map(|object| ItemProxy::new(client.clone(), object))
            .collect())
    }

    /// Nodes of `node_type` in this graph, and in nested graphs when
    /// `recurse` is set.
    pub async fn find_nodes(&self, node_type: NodeType, recurse: bool) -> ClientResult<Vec<NodeProxy>> {
        let response = self
            .stub()
            .find_nodes(FindNodesRequest {
                graph: Some(self.object().into()),
                node_type: node_type.wire(),
                recurse,
            })
            .await?
            .into_inner();
        let client = self.client();
        Ok(client
            .track_list(response.items)?
            .into_iter()
            .map(|object| NodeProxy::new(client.clone(), object))
            .collect())
    }

    /// Destroys every item in the graph.
    pub async fn clear(&self) -> ClientResult<()> {
        let owned = self.owned_items().await?;
        self.stub().clear(self.request()).await?;
        for item in &owned {
            self.client().objects().forget(item.handle());
        }
        debug!(graph = %self.object(), destroyed = owned.len(), "Graph cleared");
        Ok(())
    }

    // =========================================================================
    // Convenience
    // =========================================================================

    /// Creates a node in this graph with unconfigured pins.
    pub async fn create_node(&self, node_type: NodeType) -> ClientResult<NodeProxy> {
        NodeProxy::create(self, node_type, false).await
    }

    /// Creates a nested standard graph.
    pub async fn create_graph(&self) -> ClientResult<NodeGraphProxy> {
        NodeGraphProxy::create(self, GraphType::Standard).await
    }
}

impl Deref for NodeGraphProxy {
    type Target = ItemProxy;

    fn deref(&self) -> &ItemProxy {
        &self.item
    }
}
