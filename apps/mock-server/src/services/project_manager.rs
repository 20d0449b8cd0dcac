//! ApiProjectManager service.
//!
//! Projects are stored as pretty-printed JSON [`ProjectSnapshot`]s. Load and
//! save report failures as `false` rather than as errors.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tonic::{Request, Response, Status};
use tracing::{info, warn};

use crate::error::SceneResult;
use crate::proto::{
    api_project_manager_service_server::ApiProjectManagerService, BoolResponse, Empty,
    LoadProjectRequest, ObjectRefResponse, PathResponse, SaveProjectAsRequest,
};
use crate::scene::ProjectSnapshot;
use crate::services::ref_response;
use crate::state::EngineState;

pub struct ProjectManagerServiceImpl {
    state: Arc<EngineState>,
}

impl ProjectManagerServiceImpl {
    pub fn new(state: Arc<EngineState>) -> Self {
        ProjectManagerServiceImpl { state }
    }

    async fn read_snapshot(path: &Path) -> SceneResult<ProjectSnapshot> {
        let data = tokio::fs::read(path).await?;
        Ok(serde_json::from_slice(&data)?)
    }

    /// Writes the current scene to `path` and makes it the project path.
    async fn save_to(&self, path: PathBuf) -> bool {
        let snapshot = self.state.scene.read().await.snapshot();
        let written = match serde_json::to_vec_pretty(&snapshot) {
            Ok(data) => tokio::fs::write(&path, data).await.map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        match written {
            Ok(()) => {
                info!(?path, items = snapshot.items.len(), "Project saved");
                self.state.scene.write().await.set_project_path(Some(path));
                true
            }
            Err(e) => {
                warn!(?path, error = %e, "Failed to save project");
                false
            }
        }
    }
}

fn bool_response(value: bool) -> Response<BoolResponse> {
    Response::new(BoolResponse { value })
}

#[tonic::async_trait]
impl ApiProjectManagerService for ProjectManagerServiceImpl {
    async fn root_node_graph(&self, _request: Request<Empty>) -> Result<Response<ObjectRefResponse>, Status> {
        let scene = self.state.scene.read().await;
        Ok(Response::new(ref_response(scene.root())))
    }

    async fn is_valid(&self, _request: Request<Empty>) -> Result<Response<BoolResponse>, Status> {
        let scene = self.state.scene.read().await;
        Ok(bool_response(scene.item(scene.root().handle).is_ok()))
    }

    async fn current_project(&self, _request: Request<Empty>) -> Result<Response<PathResponse>, Status> {
        let scene = self.state.scene.read().await;
        Ok(Response::new(PathResponse {
            path: scene
                .project_path()
                .map(|path| path.display().to_string())
                .unwrap_or_default(),
        }))
    }

    async fn load_project(&self, request: Request<LoadProjectRequest>) -> Result<Response<BoolResponse>, Status> {
        let path = PathBuf::from(request.into_inner().path);
        let snapshot = match Self::read_snapshot(&path).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(?path, error = %e, "Failed to load project");
                return Ok(bool_response(false));
            }
        };

        let mut scene = self.state.scene.write().await;
        if let Err(e) = scene.restore(snapshot) {
            warn!(?path, error = %e, "Rejected project file");
            return Ok(bool_response(false));
        }
        scene.set_project_path(Some(path.clone()));
        self.state.render.lock().await.stop();
        info!(?path, items = scene.len(), "Project loaded");
        Ok(bool_response(true))
    }

    async fn save_project(&self, _request: Request<Empty>) -> Result<Response<BoolResponse>, Status> {
        let path = self.state.scene.read().await.project_path().cloned();
        match path {
            Some(path) => Ok(bool_response(self.save_to(path).await)),
            None => {
                warn!("Save requested for a project without a path");
                Ok(bool_response(false))
            }
        }
    }

    async fn save_project_as(&self, request: Request<SaveProjectAsRequest>) -> Result<Response<BoolResponse>, Status> {
        let path = request.into_inner().path;
        if path.is_empty() {
            return Ok(bool_response(false));
        }
        Ok(bool_response(self.save_to(PathBuf::from(path)).await))
    }

    async fn reset_project(&self, _request: Request<Empty>) -> Result<Response<BoolResponse>, Status> {
        let mut scene = self.state.scene.write().await;
        scene.reset();
        self.state.render.lock().await.stop();
        info!("Project reset");
        Ok(bool_response(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::proto::ObjectRef as WireRef;
    use octane_core::NodeType;

    fn service() -> (ProjectManagerServiceImpl, Arc<EngineState>) {
        let state = EngineState::new(ServerConfig::default());
        (ProjectManagerServiceImpl::new(state.clone()), state)
    }

    async fn load(service: &ProjectManagerServiceImpl, path: &Path) -> bool {
        service
            .load_project(Request::new(LoadProjectRequest {
                path: path.to_string_lossy().into_owned(),
            }))
            .await
            .unwrap()
            .into_inner()
            .value
    }

    async fn root_ref(service: &ProjectManagerServiceImpl) -> Option<WireRef> {
        service
            .root_node_graph(Request::new(Empty {}))
            .await
            .unwrap()
            .into_inner()
            .result
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.json");
        let (service, state) = service();
        {
            let mut scene = state.scene.write().await;
            let root = scene.root().handle;
            let mesh = scene.create_node(root, NodeType::Mesh, false).unwrap();
            scene.set_name(mesh, "Teapot").unwrap();
        }

        let saved = service
            .save_project_as(Request::new(SaveProjectAsRequest {
                path: path.to_string_lossy().into_owned(),
            }))
            .await
            .unwrap()
            .into_inner();
        assert!(saved.value);

        service.reset_project(Request::new(Empty {})).await.unwrap();
        assert_eq!(state.scene.read().await.len(), 1);

        assert!(load(&service, &path).await);
        let scene = state.scene.read().await;
        let meshes = scene.find_nodes(scene.root().handle, NodeType::Mesh, false).unwrap();
        assert_eq!(meshes.len(), 1);
        assert_eq!(scene.item(meshes[0].handle).unwrap().name, "Teapot");
        assert_eq!(scene.project_path(), Some(&path));
    }

    #[tokio::test]
    async fn test_bad_project_files_keep_scene() {
        let dir = tempfile::tempdir().unwrap();
        let (service, state) = service();
        {
            let mut scene = state.scene.write().await;
            let root = scene.root().handle;
            scene.create_node(root, NodeType::Mesh, false).unwrap();
        }
        let before = root_ref(&service).await;
        let items = state.scene.read().await.len();

        // Unparsable JSON
        let garbage = dir.path().join("garbage.json");
        std::fs::write(&garbage, b"{ not json").unwrap();

        // A version this engine does not read
        let mut snapshot = state.scene.read().await.snapshot();
        snapshot.format_version += 1;
        let future = dir.path().join("future.json");
        std::fs::write(&future, serde_json::to_vec(&snapshot).unwrap()).unwrap();

        // A graph that owns itself instead of hanging off the root
        let mut snapshot = state.scene.read().await.snapshot();
        let root = snapshot.root;
        let graph = snapshot.items.iter().map(|i| i.handle).max().unwrap() + 1;
        let mut looped = snapshot.items[0].clone();
        looped.handle = graph;
        looped.unique_id = 9_000;
        looped.owner = Some(graph);
        looped.kind = crate::scene::ItemKind::Graph {
            graph_type: octane_core::GraphType::Standard,
            owned: vec![graph],
        };
        snapshot.items.push(looped);
        assert_eq!(snapshot.root, root);
        let cyclic = dir.path().join("cyclic.json");
        std::fs::write(&cyclic, serde_json::to_vec(&snapshot).unwrap()).unwrap();

        for path in [&garbage, &future, &cyclic] {
            assert!(!load(&service, path).await, "{:?} loaded", path);
            assert_eq!(root_ref(&service).await, before);
            assert_eq!(state.scene.read().await.len(), items);
        }

        // The scene still walks
        let scene = state.scene.read().await;
        assert_eq!(scene.find_nodes(scene.root().handle, NodeType::Mesh, true).unwrap().len(), 1);
        assert!(scene.project_path().is_none());
    }
}
