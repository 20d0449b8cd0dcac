//! In-process engine for tests.

use std::net::SocketAddr;

use octane_mock_server::{spawn, RunningServer, ServerConfig};

use crate::{ClientConfig, OctaneClient};

/// A mock engine on a free local port, shut down on drop.
pub(crate) struct TestEngine {
    server: RunningServer,
}

impl TestEngine {
    pub(crate) async fn start() -> Self {
        let config = ServerConfig {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            tick_interval_ms: 2,
            samples_per_tick: 8,
            ..ServerConfig::default()
        };
        let server = spawn(config).await.expect("mock engine failed to start");
        TestEngine { server }
    }

    pub(crate) fn config(&self) -> ClientConfig {
        let mut config = ClientConfig::with_url(self.server.url());
        config.callbacks.client_name = "sdk-tests".to_string();
        config
    }

    /// Client with the callback stream running.
    pub(crate) async fn client(&self) -> OctaneClient {
        OctaneClient::connect(self.config())
            .await
            .expect("failed to connect to mock engine")
    }

    pub(crate) async fn client_without_stream(&self) -> OctaneClient {
        let mut config = self.config();
        config.callbacks.enabled = false;
        OctaneClient::connect(config)
            .await
            .expect("failed to connect to mock engine")
    }
}
