//! # Octane Client
//!
//! The shared connection every proxy talks through.
//!
//! ## Ownership
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          OctaneClient                                   │
//! │                  (cheap Clone, Arc<ClientInner>)                        │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐  ┌────────────┐  │
//! │  │   Channel    │  │ObjectRegistry│  │  Callback    │  │  String    │  │
//! │  │  (HTTP/2,    │  │ handle→type  │  │  Registry    │  │  Interner  │  │
//! │  │  multiplexed)│  │              │  │  id → fn     │  │            │  │
//! │  └──────┬───────┘  └──────────────┘  └──────────────┘  └────────────┘  │
//! │         │                                                               │
//! │         │ one stub per call, same channel                              │
//! │         ▼                                                               │
//! │  ItemProxy / NodeProxy / NodeGraphProxy / ProjectManagerProxy / ...    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every proxy holds a clone of the client, so dropping the last proxy and
//! the last client closes the channel and stops the callback stream.

use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use octane_core::{CallbackId, CallbackRegistry, ObjectKind, ObjectRef, ObjectRegistry, StringInterner};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tonic::transport::{Channel, Endpoint};
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::convert;
use crate::error::{ClientError, ClientResult};
use crate::proto;
use crate::proxies::{
    ChangeManagerProxy, InfoProxy, ItemProxy, NodeGraphProxy, NodeProxy, ProjectManagerProxy,
    RenderEngineProxy,
};

/// Callback ids currently installed on the render engine.
#[derive(Debug, Default)]
pub(crate) struct RenderCallbackSlots {
    pub(crate) new_image: Option<CallbackId>,
    pub(crate) render_failure: Option<CallbackId>,
}

pub(crate) struct ClientInner {
    pub(crate) channel: Channel,
    pub(crate) config: ClientConfig,
    pub(crate) objects: ObjectRegistry,
    pub(crate) callbacks: CallbackRegistry,
    pub(crate) strings: StringInterner,
    pub(crate) stream_task: Mutex<Option<JoinHandle<()>>>,
    /// Id the engine gave the current callback stream, 0 without one.
    pub(crate) subscriber_id: AtomicU64,
    pub(crate) render_slots: Mutex<RenderCallbackSlots>,
}

impl Drop for ClientInner {
    fn drop(&mut self) {
        if let Some(task) = self.stream_task.get_mut().take() {
            task.abort();
        }
    }
}

/// Connection to a render engine.
#[derive(Clone)]
pub struct OctaneClient {
    pub(crate) inner: Arc<ClientInner>,
}

impl OctaneClient {
    /// Connects to the engine described by `config`.
    ///
    /// Opens the callback stream too when `config.callbacks.enabled` is set.
    pub async fn connect(config: ClientConfig) -> ClientResult<Self> {
        config.validate()?;

        info!(url = %config.url(), "Connecting to render engine");

        let endpoint = Endpoint::from_shared(config.url().to_string())
            .map_err(|e| ClientError::InvalidEndpoint(e.to_string()))?
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout());

        let channel = endpoint
            .connect()
            .await
            .map_err(|e| ClientError::Connection(format!("{}: {}", config.url(), e)))?;

        let client = Self::from_channel(channel, config);

        if client.inner.config.callbacks.enabled {
            client.start_callback_stream().await?;
        }

        info!(url = %client.inner.config.url(), "Connected to render engine");
        Ok(client)
    }

    /// Wraps an already established channel. The callback stream is not
    /// started.
    pub fn from_channel(channel: Channel, config: ClientConfig) -> Self {
        OctaneClient {
            inner: Arc::new(ClientInner {
                channel,
                config,
                objects: ObjectRegistry::new(),
                callbacks: CallbackRegistry::new(),
                strings: StringInterner::new(),
                stream_task: Mutex::new(None),
                subscriber_id: AtomicU64::new(0),
                render_slots: Mutex::new(RenderCallbackSlots::default()),
            }),
        }
    }

    // =========================================================================
    // Shared State
    // =========================================================================

    pub(crate) fn channel(&self) -> Channel {
        self.inner.channel.clone()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Handles this client has seen.
    pub fn objects(&self) -> &ObjectRegistry {
        &self.inner.objects
    }

    /// Locally registered callbacks.
    pub fn callbacks(&self) -> &CallbackRegistry {
        &self.inner.callbacks
    }

    /// Pool of strings returned by the engine.
    pub fn strings(&self) -> &StringInterner {
        &self.inner.strings
    }

    /// Decodes and records a reference returned by the server.
    pub(crate) fn track(&self, wire: Option<proto::ObjectRef>) -> ClientResult<ObjectRef> {
        let object = convert::object_ref(wire)?;
        self.inner.objects.track(object);
        Ok(object)
    }

    /// Decodes and records a list of references returned by the server.
    pub(crate) fn track_list(&self, wire: Vec<proto::ObjectRef>) -> ClientResult<Vec<ObjectRef>> {
        wire.into_iter().map(|object| self.track(Some(object))).collect()
    }

    /// Drops every handle the client knows about. Called when the engine
    /// replaces its whole object model (project reset or load).
    pub(crate) fn forget_all_objects(&self) {
        debug!(count = self.inner.objects.len(), "Forgetting all object handles");
        self.inner.objects.clear();
    }

    // =========================================================================
    // Service Proxies
    // =========================================================================

    pub fn project_manager(&self) -> ProjectManagerProxy {
        ProjectManagerProxy::new(self.clone())
    }

    pub fn render_engine(&self) -> RenderEngineProxy {
        RenderEngineProxy::new(self.clone())
    }

    pub fn change_manager(&self) -> ChangeManagerProxy {
        ChangeManagerProxy::new(self.clone())
    }

    pub fn info(&self) -> InfoProxy {
        InfoProxy::new(self.clone())
    }

    // =========================================================================
    // Object Proxies
    // =========================================================================

    /// Wraps any non-null object as an item.
    pub fn item(&self, object: ObjectRef) -> ClientResult<ItemProxy> {
        let object = self.inner.objects.expect(object, ObjectKind::Item)?;
        Ok(ItemProxy::new(self.clone(), object))
    }

    /// Wraps a node.
    pub fn node(&self, object: ObjectRef) -> ClientResult<NodeProxy> {
        let object = self.inner.objects.expect(object, ObjectKind::Node)?;
        Ok(NodeProxy::new(self.clone(), object))
    }

    /// Wraps a nested or root graph.
    pub fn graph(&self, object: ObjectRef) -> ClientResult<NodeGraphProxy> {
        let object = self.inner.objects.expect(object, ObjectKind::Graph)?;
        Ok(NodeGraphProxy::new(self.clone(), object))
    }
}

impl std::fmt::Debug for OctaneClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OctaneClient")
            .field("url", &self.inner.config.url())
            .field("objects", &self.inner.objects.len())
            .field("callbacks", &self.inner.callbacks.len())
            .finish()
    }
}
