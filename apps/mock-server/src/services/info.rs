//! ApiInfo service.

use std::sync::Arc;

use octane_core::API_VERSION;
use tonic::{Request, Response, Status};

use crate::proto::{api_info_service_server::ApiInfoService, Empty, InfoResponse};
use crate::state::EngineState;

pub struct InfoServiceImpl {
    state: Arc<EngineState>,
}

impl InfoServiceImpl {
    pub fn new(state: Arc<EngineState>) -> Self {
        InfoServiceImpl { state }
    }
}

#[tonic::async_trait]
impl ApiInfoService for InfoServiceImpl {
    async fn info(&self, _request: Request<Empty>) -> Result<Response<InfoResponse>, Status> {
        Ok(Response::new(InfoResponse {
            version: API_VERSION,
            version_name: self.state.config.version_name.clone(),
            is_demo: self.state.config.is_demo,
        }))
    }
}
