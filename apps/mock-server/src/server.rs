//! Server bootstrap.
//!
//! [`spawn`] binds, starts the render ticker and serves every engine
//! service on a background task. Binding port 0 picks a free port, which is
//! how tests run one engine each.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tracing::{debug, info};

use crate::config::{ConfigError, ServerConfig};
use crate::proto::{
    api_change_manager_service_server::ApiChangeManagerServiceServer,
    api_info_service_server::ApiInfoServiceServer, api_item_service_server::ApiItemServiceServer,
    api_node_graph_service_server::ApiNodeGraphServiceServer,
    api_node_service_server::ApiNodeServiceServer,
    api_project_manager_service_server::ApiProjectManagerServiceServer,
    api_render_engine_service_server::ApiRenderEngineServiceServer,
    callback_stream_service_server::CallbackStreamServiceServer,
};
use crate::services::{
    callback_stream::CallbackStreamServiceImpl, change_manager::ChangeManagerServiceImpl,
    info::InfoServiceImpl, item::ItemServiceImpl, node::NodeServiceImpl,
    node_graph::NodeGraphServiceImpl, project_manager::ProjectManagerServiceImpl,
    render_engine::RenderEngineServiceImpl,
};
use crate::state::{shutdown_requested, EngineState};

/// Server startup and shutdown errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("Transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    #[error("Server task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// A server running in the background. Dropping it shuts the server down.
pub struct RunningServer {
    local_addr: SocketAddr,
    state: Arc<EngineState>,
    serve: Option<JoinHandle<Result<(), tonic::transport::Error>>>,
    ticker: Option<JoinHandle<()>>,
}

impl RunningServer {
    /// Address actually bound, with the real port when 0 was requested.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Endpoint URL clients connect to.
    pub fn url(&self) -> String {
        format!("http://{}", self.local_addr)
    }

    pub fn state(&self) -> &Arc<EngineState> {
        &self.state
    }

    /// Stops serving and waits for the background tasks to finish.
    pub async fn shutdown(mut self) -> Result<(), ServerError> {
        self.state.begin_shutdown();
        if let Some(ticker) = self.ticker.take() {
            ticker.await?;
        }
        if let Some(serve) = self.serve.take() {
            serve.await??;
        }
        info!(addr = %self.local_addr, "Server shutdown complete");
        Ok(())
    }
}

impl Drop for RunningServer {
    fn drop(&mut self) {
        self.state.begin_shutdown();
    }
}

/// Starts a mock engine.
pub async fn spawn(config: ServerConfig) -> Result<RunningServer, ServerError> {
    config.validate()?;

    let addr = config.bind_addr;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    let local_addr = listener
        .local_addr()
        .map_err(|source| ServerError::Bind { addr, source })?;

    let state = EngineState::new(config);
    let ticker = tokio::spawn(state.clone().run_ticker());

    let mut shutdown = state.shutdown_signal();
    let router = Server::builder()
        .add_service(ApiItemServiceServer::new(ItemServiceImpl::new(state.clone())))
        .add_service(ApiNodeServiceServer::new(NodeServiceImpl::new(state.clone())))
        .add_service(ApiNodeGraphServiceServer::new(NodeGraphServiceImpl::new(state.clone())))
        .add_service(ApiProjectManagerServiceServer::new(ProjectManagerServiceImpl::new(state.clone())))
        .add_service(ApiRenderEngineServiceServer::new(RenderEngineServiceImpl::new(state.clone())))
        .add_service(ApiChangeManagerServiceServer::new(ChangeManagerServiceImpl::new(state.clone())))
        .add_service(ApiInfoServiceServer::new(InfoServiceImpl::new(state.clone())))
        .add_service(CallbackStreamServiceServer::new(CallbackStreamServiceImpl::new(state.clone())));

    let serve = tokio::spawn(async move {
        let result = router
            .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async move {
                // A dropped sender also ends the server
                shutdown_requested(&mut shutdown).await;
            })
            .await;
        debug!("gRPC server task finished");
        result
    });

    info!(addr = %local_addr, "Mock engine listening");
    Ok(RunningServer {
        local_addr,
        state,
        serve: Some(serve),
        ticker: Some(ticker),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ephemeral() -> ServerConfig {
        ServerConfig {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            ..ServerConfig::default()
        }
    }

    #[tokio::test]
    async fn test_spawn_picks_free_port() {
        let server = spawn(ephemeral()).await.unwrap();
        assert_ne!(server.local_addr().port(), 0);
        assert!(server.url().starts_with("http://127.0.0.1:"));
        server.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let config = ServerConfig {
            samples_per_tick: 0,
            ..ephemeral()
        };
        assert!(matches!(spawn(config).await, Err(ServerError::Config(_))));
    }
}
