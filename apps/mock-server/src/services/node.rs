//! ApiNode service.

use std::sync::Arc;

use octane_core::{NodeType, PinId};
use tonic::{Request, Response, Status};
use tracing::{debug, info};

use crate::convert;
use crate::error::SceneError;
use crate::proto::{
    api_node_service_server::ApiNodeService, AttributeResponse, ConnectToRequest, CountResponse,
    CreateNodeRequest, Empty, ItemRequest, NameResponse, NodeTypeResponse, ObjectRefResponse,
    PinIndexRequest, PinRequest, SetPinValueRequest,
};
use crate::services::{ref_response, resolve, resolve_optional};
use crate::state::EngineState;

pub struct NodeServiceImpl {
    state: Arc<EngineState>,
}

impl NodeServiceImpl {
    pub fn new(state: Arc<EngineState>) -> Self {
        NodeServiceImpl { state }
    }
}

#[tonic::async_trait]
impl ApiNodeService for NodeServiceImpl {
    async fn create(&self, request: Request<CreateNodeRequest>) -> Result<Response<ObjectRefResponse>, Status> {
        let req = request.into_inner();
        let node_type = NodeType::from_wire(req.node_type).map_err(SceneError::from)?;

        let mut scene = self.state.scene.write().await;
        let owner = resolve(&scene, req.owner_graph)?;
        let handle = scene.create_node(owner, node_type, req.configure_pins)?;
        info!(handle, owner, %node_type, configure_pins = req.configure_pins, "Node created");
        Ok(Response::new(ref_response(scene.item(handle)?.object_ref())))
    }

    async fn get_node_type(&self, request: Request<ItemRequest>) -> Result<Response<NodeTypeResponse>, Status> {
        let scene = self.state.scene.read().await;
        let handle = resolve(&scene, request.into_inner().item)?;
        Ok(Response::new(NodeTypeResponse {
            node_type: scene.node_type(handle)?.wire(),
        }))
    }

    async fn pin_count(&self, request: Request<ItemRequest>) -> Result<Response<CountResponse>, Status> {
        let scene = self.state.scene.read().await;
        let handle = resolve(&scene, request.into_inner().item)?;
        Ok(Response::new(CountResponse {
            count: scene.pin_count(handle)?,
        }))
    }

    async fn pin_name(&self, request: Request<PinIndexRequest>) -> Result<Response<NameResponse>, Status> {
        let req = request.into_inner();
        let scene = self.state.scene.read().await;
        let handle = resolve(&scene, req.item)?;
        Ok(Response::new(NameResponse {
            name: scene.pin_name(handle, req.index)?.to_string(),
        }))
    }

    async fn connect_to(&self, request: Request<ConnectToRequest>) -> Result<Response<Empty>, Status> {
        let req = request.into_inner();
        let pin = PinId(req.pin_id);
        let mut scene = self.state.scene.write().await;
        let target = resolve(&scene, req.item)?;
        let source = resolve_optional(&scene, req.source)?;
        scene.connect(target, pin, source)?;
        debug!(target, %pin, ?source, "Pin connected");
        Ok(Response::new(Empty {}))
    }

    async fn connected_node(&self, request: Request<PinRequest>) -> Result<Response<ObjectRefResponse>, Status> {
        let req = request.into_inner();
        let scene = self.state.scene.read().await;
        let handle = resolve(&scene, req.item)?;
        Ok(Response::new(ref_response(
            scene.connected_node(handle, PinId(req.pin_id))?,
        )))
    }

    async fn get_pin_value(&self, request: Request<PinRequest>) -> Result<Response<AttributeResponse>, Status> {
        let req = request.into_inner();
        let scene = self.state.scene.read().await;
        let handle = resolve(&scene, req.item)?;
        let value = scene.pin_value(handle, PinId(req.pin_id))?;
        Ok(Response::new(AttributeResponse {
            value: value.map(convert::wire_attr_value),
        }))
    }

    async fn set_pin_value(&self, request: Request<SetPinValueRequest>) -> Result<Response<Empty>, Status> {
        let req = request.into_inner();
        let value = convert::attr_value(req.value, "value")?;
        let mut scene = self.state.scene.write().await;
        let handle = resolve(&scene, req.item)?;
        scene.set_pin_value(handle, PinId(req.pin_id), value)?;
        Ok(Response::new(Empty {}))
    }
}
