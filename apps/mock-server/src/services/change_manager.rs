//! ApiChangeManager service.

use std::sync::Arc;

use tonic::{Request, Response, Status};

use crate::proto::{api_change_manager_service_server::ApiChangeManagerService, Empty};
use crate::state::EngineState;

pub struct ChangeManagerServiceImpl {
    state: Arc<EngineState>,
}

impl ChangeManagerServiceImpl {
    pub fn new(state: Arc<EngineState>) -> Self {
        ChangeManagerServiceImpl { state }
    }
}

#[tonic::async_trait]
impl ApiChangeManagerService for ChangeManagerServiceImpl {
    /// Pushes pending scene edits to the renderer.
    async fn update(&self, _request: Request<Empty>) -> Result<Response<Empty>, Status> {
        self.state.apply_changes().await;
        Ok(Response::new(Empty {}))
    }
}
