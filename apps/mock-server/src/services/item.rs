//! ApiItem service.

use std::sync::Arc;

use octane_core::AttributeId;
use tonic::{Request, Response, Status};
use tracing::{debug, info};

use crate::convert;
use crate::proto::{
    api_item_service_server::ApiItemService, AttributeResponse, Empty, GetAttributeRequest,
    ItemRequest, NameResponse, ObjectRefResponse, PositionResponse, SetAttributeRequest,
    SetNameRequest, SetPositionRequest, UniqueIdResponse,
};
use crate::services::{ref_response, resolve};
use crate::state::EngineState;

/// Generic item operations shared by nodes and graphs.
pub struct ItemServiceImpl {
    state: Arc<EngineState>,
}

impl ItemServiceImpl {
    pub fn new(state: Arc<EngineState>) -> Self {
        ItemServiceImpl { state }
    }
}

#[tonic::async_trait]
impl ApiItemService for ItemServiceImpl {
    async fn name(&self, request: Request<ItemRequest>) -> Result<Response<NameResponse>, Status> {
        let scene = self.state.scene.read().await;
        let handle = resolve(&scene, request.into_inner().item)?;
        Ok(Response::new(NameResponse {
            name: scene.item(handle)?.name.clone(),
        }))
    }

    async fn set_name(&self, request: Request<SetNameRequest>) -> Result<Response<Empty>, Status> {
        let req = request.into_inner();
        let mut scene = self.state.scene.write().await;
        let handle = resolve(&scene, req.item)?;
        scene.set_name(handle, &req.name)?;
        debug!(handle, name = %req.name, "Item renamed");
        Ok(Response::new(Empty {}))
    }

    async fn unique_id(&self, request: Request<ItemRequest>) -> Result<Response<UniqueIdResponse>, Status> {
        let scene = self.state.scene.read().await;
        let handle = resolve(&scene, request.into_inner().item)?;
        Ok(Response::new(UniqueIdResponse {
            unique_id: scene.item(handle)?.unique_id,
        }))
    }

    async fn position(&self, request: Request<ItemRequest>) -> Result<Response<PositionResponse>, Status> {
        let scene = self.state.scene.read().await;
        let handle = resolve(&scene, request.into_inner().item)?;
        Ok(Response::new(PositionResponse {
            position: Some(convert::wire_float2(scene.item(handle)?.position)),
        }))
    }

    async fn set_position(&self, request: Request<SetPositionRequest>) -> Result<Response<Empty>, Status> {
        let req = request.into_inner();
        let mut scene = self.state.scene.write().await;
        let handle = resolve(&scene, req.item)?;
        scene.set_position(handle, convert::float2(req.position))?;
        Ok(Response::new(Empty {}))
    }

    async fn graph_owner(&self, request: Request<ItemRequest>) -> Result<Response<ObjectRefResponse>, Status> {
        let scene = self.state.scene.read().await;
        let handle = resolve(&scene, request.into_inner().item)?;
        Ok(Response::new(ref_response(scene.graph_owner(handle)?)))
    }

    async fn get_attribute(
        &self,
        request: Request<GetAttributeRequest>,
    ) -> Result<Response<AttributeResponse>, Status> {
        let req = request.into_inner();
        let scene = self.state.scene.read().await;
        let handle = resolve(&scene, req.item)?;
        let value = scene.attribute(handle, AttributeId(req.attribute_id))?;
        Ok(Response::new(AttributeResponse {
            value: value.map(convert::wire_attr_value),
        }))
    }

    async fn set_attribute(&self, request: Request<SetAttributeRequest>) -> Result<Response<Empty>, Status> {
        let req = request.into_inner();
        let value = convert::attr_value(req.value, "value")?;
        let mut scene = self.state.scene.write().await;
        let handle = resolve(&scene, req.item)?;
        scene.set_attribute(handle, AttributeId(req.attribute_id), value)?;
        Ok(Response::new(Empty {}))
    }

    async fn destroy(&self, request: Request<ItemRequest>) -> Result<Response<Empty>, Status> {
        let mut scene = self.state.scene.write().await;
        let handle = resolve(&scene, request.into_inner().item)?;
        scene.destroy(handle)?;
        info!(handle, remaining = scene.len(), "Item destroyed");
        Ok(Response::new(Empty {}))
    }
}
