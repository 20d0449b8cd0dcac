//! Proxy for `ApiInfo`.

use serde::Serialize;

use crate::client::OctaneClient;
use crate::error::ClientResult;
use crate::proto::api_info_service_client::ApiInfoServiceClient;
use crate::proto::Empty;

/// Engine build information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineInfo {
    /// Numeric API version, e.g. `14000000`.
    pub version: u32,
    pub version_name: String,
    pub is_demo: bool,
}

impl EngineInfo {
    /// True if the engine speaks the API version this SDK was built for.
    pub fn is_compatible(&self) -> bool {
        self.version / 1_000_000 == octane_core::API_VERSION / 1_000_000
    }
}

#[derive(Debug, Clone)]
pub struct InfoProxy {
    client: OctaneClient,
}

impl InfoProxy {
    pub(crate) fn new(client: OctaneClient) -> Self {
        InfoProxy { client }
    }

    pub async fn get(&self) -> ClientResult<EngineInfo> {
        let response = ApiInfoServiceClient::new(self.client.channel())
            .info(Empty {})
            .await?
            .into_inner();
        Ok(EngineInfo {
            version: response.version,
            version_name: response.version_name,
            is_demo: response.is_demo,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compatibility_checks_major_version() {
        let mut info = EngineInfo {
            version: 14_000_500,
            version_name: "2024.1.1".into(),
            is_demo: false,
        };
        assert!(info.is_compatible());
        info.version = 13_000_000;
        assert!(!info.is_compatible());
    }
}
