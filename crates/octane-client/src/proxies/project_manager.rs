//! Proxy for `ApiProjectManager`.
//!
//! Loading or resetting a project replaces the engine's whole object model,
//! so the client drops every handle it knows on success.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::client::OctaneClient;
use crate::error::{ClientError, ClientResult};
use crate::proto::api_project_manager_service_client::ApiProjectManagerServiceClient;
use crate::proto::{Empty, LoadProjectRequest, SaveProjectAsRequest};
use crate::proxies::NodeGraphProxy;

/// The engine's project manager.
#[derive(Debug, Clone)]
pub struct ProjectManagerProxy {
    client: OctaneClient,
}

impl ProjectManagerProxy {
    pub(crate) fn new(client: OctaneClient) -> Self {
        ProjectManagerProxy { client }
    }

    fn stub(&self) -> ApiProjectManagerServiceClient<tonic::transport::Channel> {
        ApiProjectManagerServiceClient::new(self.client.channel())
    }

    pub async fn root_node_graph(&self) -> ClientResult<NodeGraphProxy> {
        let response = self.stub().root_node_graph(Empty {}).await?.into_inner();
        let object = self.client.track(response.result)?;
        if object.is_null() {
            return Err(ClientError::MissingField("result"));
        }
        self.client.graph(object)
    }

    pub async fn is_valid(&self) -> ClientResult<bool> {
        Ok(self.stub().is_valid(Empty {}).await?.into_inner().value)
    }

    /// Path of the current project; `None` if it was never saved or loaded.
    pub async fn current_project(&self) -> ClientResult<Option<PathBuf>> {
        let path = self.stub().current_project(Empty {}).await?.into_inner().path;
        Ok((!path.is_empty()).then(|| PathBuf::from(path)))
    }

    /// Loads a project file. Returns false if the engine could not read it;
    /// the current project is then left untouched.
    pub async fn load_project(&self, path: impl AsRef<Path>) -> ClientResult<bool> {
        let path = path.as_ref();
        let loaded = self
            .stub()
            .load_project(LoadProjectRequest {
                path: path.display().to_string(),
            })
            .await?
            .into_inner()
            .value;

        if loaded {
            self.client.forget_all_objects();
            info!(?path, "Project loaded");
        } else {
            warn!(?path, "Engine could not load project");
        }
        Ok(loaded)
    }

    /// Saves to the current project path. Returns false when there is none.
    pub async fn save_project(&self) -> ClientResult<bool> {
        Ok(self.stub().save_project(Empty {}).await?.into_inner().value)
    }

    pub async fn save_project_as(&self, path: impl AsRef<Path>) -> ClientResult<bool> {
        let path = path.as_ref();
        let saved = self
            .stub()
            .save_project_as(SaveProjectAsRequest {
                path: path.display().to_string(),
            })
            .await?
            .into_inner()
            .value;
        if saved {
            info!(?path, "Project saved");
        }
        Ok(saved)
    }

    /// Replaces the project with an empty one.
    pub async fn reset_project(&self) -> ClientResult<bool> {
        let reset = self.stub().reset_project(Empty {}).await?.into_inner().value;
        if reset {
            self.client.forget_all_objects();
            info!("Project reset");
        }
        Ok(reset)
    }
}
