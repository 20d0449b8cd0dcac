//! ApiNodeGraph service.

use std::sync::Arc;

use octane_core::{GraphType, NodeType};
use tonic::{Request, Response, Status};
use tracing::info;

use crate::error::SceneError;
use crate::proto::{
    api_node_graph_service_server::ApiNodeGraphService, CreateGraphRequest, Empty, FindNodesRequest,
    GraphTypeResponse, ItemListResponse, ItemRequest, ObjectRefResponse,
};
use crate::services::{list_response, ref_response, resolve};
use crate::state::EngineState;

pub struct NodeGraphServiceImpl {
    state: Arc<EngineState>,
}

impl NodeGraphServiceImpl {
    pub fn new(state: Arc<EngineState>) -> Self {
        NodeGraphServiceImpl { state }
    }
}

#[tonic::async_trait]
impl ApiNodeGraphService for NodeGraphServiceImpl {
    async fn create(&self, request: Request<CreateGraphRequest>) -> Result<Response<ObjectRefResponse>, Status> {
        let req = request.into_inner();
        let graph_type = GraphType::from_wire(req.graph_type).map_err(SceneError::from)?;

        let mut scene = self.state.scene.write().await;
        let owner = resolve(&scene, req.owner_graph)?;
        let handle = scene.create_graph(owner, graph_type)?;
        info!(handle, owner, ?graph_type, "Graph created");
        Ok(Response::new(ref_response(scene.item(handle)?.object_ref())))
    }

    async fn get_graph_type(&self, request: Request<ItemRequest>) -> Result<Response<GraphTypeResponse>, Status> {
        let scene = self.state.scene.read().await;
        let handle = resolve(&scene, request.into_inner().item)?;
        Ok(Response::new(GraphTypeResponse {
            graph_type: scene.graph_type(handle)?.wire(),
        }))
    }

    async fn get_owned_items(&self, request: Request<ItemRequest>) -> Result<Response<ItemListResponse>, Status> {
        let scene = self.state.scene.read().await;
        let handle = resolve(&scene, request.into_inner().item)?;
        Ok(Response::new(list_response(scene.owned_items(handle)?)))
    }

    async fn find_nodes(&self, request: Request<FindNodesRequest>) -> Result<Response<ItemListResponse>, Status> {
        let req = request.into_inner();
        let node_type = NodeType::from_wire(req.node_type).map_err(SceneError::from)?;
        let scene = self.state.scene.read().await;
        let handle = resolve(&scene, req.graph)?;
        Ok(Response::new(list_response(
            scene.find_nodes(handle, node_type, req.recurse)?,
        )))
    }

    async fn clear(&self, request: Request<ItemRequest>) -> Result<Response<Empty>, Status> {
        let mut scene = self.state.scene.write().await;
        let handle = resolve(&scene, request.into_inner().item)?;
        scene.clear_graph(handle)?;
        info!(handle, "Graph cleared");
        Ok(Response::new(Empty {}))
    }
}
