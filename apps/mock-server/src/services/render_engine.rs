//! ApiRenderEngine service.

use std::path::PathBuf;
use std::sync::Arc;

use octane_core::ImageType;
use tonic::{Request, Response, Status};
use tracing::{debug, info, warn};

use crate::convert;
use crate::error::SceneError;
use crate::proto::{
    api_render_engine_service_server::ApiRenderEngineService, BoolResponse, Empty, ItemRequest,
    ObjectRefResponse, RenderStatistics, SaveImageRequest, SetCallbackRequest,
};
use crate::render::{placeholder_ppm, set_callback, InstalledCallback};
use crate::services::{ref_response, resolve_optional};
use crate::state::EngineState;

pub struct RenderEngineServiceImpl {
    state: Arc<EngineState>,
}

impl RenderEngineServiceImpl {
    pub fn new(state: Arc<EngineState>) -> Self {
        RenderEngineServiceImpl { state }
    }
}

/// Applies a `SetCallbackRequest` to one callback slot.
fn apply_callback(slot: &mut Option<InstalledCallback>, req: &SetCallbackRequest, kind: &str) -> Result<(), Status> {
    if req.callback_id != 0 && req.subscriber_id == 0 {
        return Err(Status::invalid_argument("Installing a callback requires a subscriber id"));
    }
    let changed = set_callback(slot, req.subscriber_id, req.callback_id);
    debug!(
        kind,
        callback_id = req.callback_id,
        subscriber_id = req.subscriber_id,
        changed,
        "Callback slot updated"
    );
    Ok(())
}

#[tonic::async_trait]
impl ApiRenderEngineService for RenderEngineServiceImpl {
    async fn set_render_target_node(&self, request: Request<ItemRequest>) -> Result<Response<BoolResponse>, Status> {
        let mut scene = self.state.scene.write().await;
        let target = resolve_optional(&scene, request.into_inner().item)?;
        let accepted = scene.set_render_target(target)?;
        debug!(?target, accepted, "Render target selected");
        Ok(Response::new(BoolResponse { value: accepted }))
    }

    async fn get_render_target_node(&self, _request: Request<Empty>) -> Result<Response<ObjectRefResponse>, Status> {
        let scene = self.state.scene.read().await;
        let object = match scene.render_target() {
            Some(handle) => scene.item(handle)?.object_ref(),
            None => octane_core::ObjectRef::null(),
        };
        Ok(Response::new(ref_response(object)))
    }

    async fn restart_rendering(&self, _request: Request<Empty>) -> Result<Response<Empty>, Status> {
        self.state.restart_rendering().await;
        Ok(Response::new(Empty {}))
    }

    async fn stop_rendering(&self, _request: Request<Empty>) -> Result<Response<Empty>, Status> {
        self.state.stop_rendering().await;
        info!("Rendering stopped");
        Ok(Response::new(Empty {}))
    }

    async fn pause_rendering(&self, _request: Request<Empty>) -> Result<Response<Empty>, Status> {
        self.state.render.lock().await.pause();
        Ok(Response::new(Empty {}))
    }

    async fn continue_rendering(&self, _request: Request<Empty>) -> Result<Response<Empty>, Status> {
        self.state.render.lock().await.resume();
        Ok(Response::new(Empty {}))
    }

    async fn is_rendering_paused(&self, _request: Request<Empty>) -> Result<Response<BoolResponse>, Status> {
        let paused = self.state.render.lock().await.is_paused();
        Ok(Response::new(BoolResponse { value: paused }))
    }

    async fn get_render_statistics(&self, _request: Request<Empty>) -> Result<Response<RenderStatistics>, Status> {
        let stats = self.state.render.lock().await.statistics();
        Ok(Response::new(convert::wire_statistics(&stats)))
    }

    async fn save_image(&self, request: Request<SaveImageRequest>) -> Result<Response<BoolResponse>, Status> {
        let req = request.into_inner();
        let image_type = ImageType::from_wire(req.image_type).map_err(SceneError::from)?;
        let path = PathBuf::from(req.path);

        let settings = {
            let render = self.state.render.lock().await;
            if !render.has_image() {
                return Ok(Response::new(BoolResponse { value: false }));
            }
            render.settings()
        };
        let Some(settings) = settings else {
            return Ok(Response::new(BoolResponse { value: false }));
        };

        // The payload is a PPM whatever the requested type
        let Some(data) = placeholder_ppm(settings.width, settings.height) else {
            warn!(width = settings.width, height = settings.height, "Image too large to save");
            return Ok(Response::new(BoolResponse { value: false }));
        };
        let saved = match tokio::fs::write(&path, data).await {
            Ok(()) => {
                info!(?path, ?image_type, "Image saved");
                true
            }
            Err(e) => {
                warn!(?path, error = %e, "Failed to save image");
                false
            }
        };
        Ok(Response::new(BoolResponse { value: saved }))
    }

    async fn set_on_new_image_callback(&self, request: Request<SetCallbackRequest>) -> Result<Response<Empty>, Status> {
        let req = request.into_inner();
        let mut render = self.state.render.lock().await;
        apply_callback(&mut render.new_image_callback, &req, "new_image")?;
        Ok(Response::new(Empty {}))
    }

    async fn set_on_render_failure_callback(
        &self,
        request: Request<SetCallbackRequest>,
    ) -> Result<Response<Empty>, Status> {
        let req = request.into_inner();
        let mut render = self.state.render.lock().await;
        apply_callback(&mut render.render_failure_callback, &req, "render_failure")?;
        Ok(Response::new(Empty {}))
    }
}
