//! Proxy for `ApiChangeManager`.

use crate::client::OctaneClient;
use crate::error::ClientResult;
use crate::proto::api_change_manager_service_client::ApiChangeManagerServiceClient;
use crate::proto::Empty;

/// Flushes pending scene edits to the engine's evaluation.
#[derive(Debug, Clone)]
pub struct ChangeManagerProxy {
    client: OctaneClient,
}

impl ChangeManagerProxy {
    pub(crate) fn new(client: OctaneClient) -> Self {
        ChangeManagerProxy { client }
    }

    /// Applies pending changes. A running render restarts if the scene it
    /// renders changed since the last update.
    pub async fn update(&self) -> ClientResult<()> {
        ApiChangeManagerServiceClient::new(self.client.channel())
            .update(Empty {})
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::TestEngine;

    #[tokio::test]
    async fn test_update_is_idempotent() {
        let engine = TestEngine::start().await;
        let client = engine.client().await;
        client.change_manager().update().await.unwrap();
        client.change_manager().update().await.unwrap();
    }
}
