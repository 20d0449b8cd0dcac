//! Proxy for `ApiRenderEngine`.
//!
//! ## Callbacks
//! ```text
//! set_on_new_image_callback(f)
//!   1. CallbackRegistry::register(NewImage, f)   ──► id
//!   2. SetOnNewImageCallback(id, subscriber_id)  ──► engine
//!   3. previous id (if any) unregistered locally
//! ```
//! If step 2 fails the new registration is rolled back and the previous
//! callback stays active. The engine holds one callback per kind, so a
//! client installing its own replaces another client's.

use std::path::Path;
use std::sync::atomic::Ordering;

use octane_core::{CallbackEvent, CallbackId, CallbackKind, ImageType, RenderStatistics};
use tracing::{debug, info};

use crate::client::OctaneClient;
use crate::convert;
use crate::error::ClientResult;
use crate::proto::api_render_engine_service_client::ApiRenderEngineServiceClient;
use crate::proto::{Empty, ItemRequest, SaveImageRequest, SetCallbackRequest};
use crate::proxies::NodeProxy;

/// The engine's render engine.
#[derive(Debug, Clone)]
pub struct RenderEngineProxy {
    client: OctaneClient,
}

impl RenderEngineProxy {
    pub(crate) fn new(client: OctaneClient) -> Self {
        RenderEngineProxy { client }
    }

    fn stub(&self) -> ApiRenderEngineServiceClient<tonic::transport::Channel> {
        ApiRenderEngineServiceClient::new(self.client.channel())
    }

    // =========================================================================
    // Render Target
    // =========================================================================

    /// Selects the render target node, or clears it with `None`. Returns
    /// false if the engine refused the node.
    pub async fn set_render_target_node(&self, node: Option<&NodeProxy>) -> ClientResult<bool> {
        let object = node.map(|node| node.object()).unwrap_or_default();
        let accepted = self
            .stub()
            .set_render_target_node(ItemRequest {
                item: Some(object.into()),
            })
            .await?
            .into_inner()
            .value;
        debug!(target = %object, accepted, "Render target set");
        Ok(accepted)
    }

    pub async fn render_target_node(&self) -> ClientResult<Option<NodeProxy>> {
        let response = self.stub().get_render_target_node(Empty {}).await?.into_inner();
        let object = self.client.track(response.result)?;
        if object.is_null() {
            return Ok(None);
        }
        Ok(Some(self.client.node(object)?))
    }

    // =========================================================================
    // Render Control
    // =========================================================================

    /// Restarts rendering from sample zero.
    pub async fn restart_rendering(&self) -> ClientResult<()> {
        self.stub().restart_rendering(Empty {}).await?;
        info!("Rendering restarted");
        Ok(())
    }

    pub async fn stop_rendering(&self) -> ClientResult<()> {
        self.stub().stop_rendering(Empty {}).await?;
        info!("Rendering stopped");
        Ok(())
    }

    pub async fn pause_rendering(&self) -> ClientResult<()> {
        self.stub().pause_rendering(Empty {}).await?;
        Ok(())
    }

    pub async fn continue_rendering(&self) -> ClientResult<()> {
        self.stub().continue_rendering(Empty {}).await?;
        Ok(())
    }

    pub async fn is_rendering_paused(&self) -> ClientResult<bool> {
        Ok(self.stub().is_rendering_paused(Empty {}).await?.into_inner().value)
    }

    pub async fn render_statistics(&self) -> ClientResult<RenderStatistics> {
        let response = self.stub().get_render_statistics(Empty {}).await?.into_inner();
        convert::render_statistics(response)
    }

    /// Writes the current render result. Returns false when nothing has been
    /// rendered yet or the file could not be written.
    pub async fn save_image(&self, path: impl AsRef<Path>, image_type: ImageType) -> ClientResult<bool> {
        let path = path.as_ref();
        let saved = self
            .stub()
            .save_image(SaveImageRequest {
                path: path.display().to_string(),
                image_type: image_type.wire(),
            })
            .await?
            .into_inner()
            .value;
        if saved {
            info!(?path, ?image_type, "Render result saved");
        }
        Ok(saved)
    }

    // =========================================================================
    // Callbacks
    // =========================================================================

    /// Runs `callback` every time the engine has a new image.
    pub async fn set_on_new_image_callback<F>(&self, callback: F) -> ClientResult<CallbackId>
    where
        F: Fn(&CallbackEvent) + Send + Sync + 'static,
    {
        self.install_callback(CallbackKind::NewImage, callback).await
    }

    /// Runs `callback` when rendering cannot start or is aborted.
    pub async fn set_on_render_failure_callback<F>(&self, callback: F) -> ClientResult<CallbackId>
    where
        F: Fn(&CallbackEvent) + Send + Sync + 'static,
    {
        self.install_callback(CallbackKind::RenderFailure, callback).await
    }

    pub async fn clear_on_new_image_callback(&self) -> ClientResult<()> {
        self.remove_callback(CallbackKind::NewImage).await
    }

    pub async fn clear_on_render_failure_callback(&self) -> ClientResult<()> {
        self.remove_callback(CallbackKind::RenderFailure).await
    }

    async fn send_callback_id(&self, kind: CallbackKind, id: CallbackId) -> ClientResult<()> {
        let request = SetCallbackRequest {
            callback_id: id.0,
            subscriber_id: self.client.inner.subscriber_id.load(Ordering::Relaxed),
        };
        match kind {
            CallbackKind::NewImage => self.stub().set_on_new_image_callback(request).await?,
            CallbackKind::RenderFailure => self.stub().set_on_render_failure_callback(request).await?,
        };
        Ok(())
    }

    async fn install_callback<F>(&self, kind: CallbackKind, callback: F) -> ClientResult<CallbackId>
    where
        F: Fn(&CallbackEvent) + Send + Sync + 'static,
    {
        let mut slots = self.client.inner.render_slots.lock().await;
        let id = self.client.register_callback(kind, callback).await?;

        if let Err(e) = self.send_callback_id(kind, id).await {
            self.client.callbacks().unregister(id);
            return Err(e);
        }

        let slot = match kind {
            CallbackKind::NewImage => &mut slots.new_image,
            CallbackKind::RenderFailure => &mut slots.render_failure,
        };
        if let Some(previous) = slot.replace(id) {
            self.client.callbacks().unregister(previous);
        }

        debug!(callback_id = %id, ?kind, "Render callback installed");
        Ok(id)
    }

    async fn remove_callback(&self, kind: CallbackKind) -> ClientResult<()> {
        let mut slots = self.client.inner.render_slots.lock().await;
        self.send_callback_id(kind, CallbackId::NONE).await?;

        let slot = match kind {
            CallbackKind::NewImage => &mut slots.new_image,
            CallbackKind::RenderFailure => &mut slots.render_failure,
        };
        if let Some(previous) = slot.take() {
            self.client.callbacks().unregister(previous);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::sync::mpsc;

    use crate::test_support::TestEngine;
    use octane_core::{CallbackEvent, ImageType, NodeType, PinId, RenderState};

    async fn scene_with_target(client: &crate::OctaneClient, max_samples: i64) -> crate::NodeProxy {
        let root = client.project_manager().root_node_graph().await.unwrap();
        let target = root.create_node(NodeType::RenderTarget).await.unwrap();
        let kernel = root.create_node(NodeType::DirectLightingKernel).await.unwrap();
        let film = root.create_node(NodeType::FilmSettings).await.unwrap();
        kernel.set_pin_value(PinId::MAX_SAMPLES, max_samples).await.unwrap();
        film.set_pin_value(PinId::WIDTH, 64_i64).await.unwrap();
        film.set_pin_value(PinId::HEIGHT, 32_i64).await.unwrap();
        target.connect_to(PinId::KERNEL, Some(&kernel)).await.unwrap();
        target.connect_to(PinId::FILM_SETTINGS, Some(&film)).await.unwrap();
        target
    }

    #[tokio::test]
    async fn test_render_target_selection() {
        let engine = TestEngine::start().await;
        let client = engine.client().await;
        let render = client.render_engine();
        let root = client.project_manager().root_node_graph().await.unwrap();

        assert!(render.render_target_node().await.unwrap().is_none());

        let mesh = root.create_node(NodeType::Mesh).await.unwrap();
        assert!(!render.set_render_target_node(Some(&mesh)).await.unwrap());

        let target = root.create_node(NodeType::RenderTarget).await.unwrap();
        assert!(render.set_render_target_node(Some(&target)).await.unwrap());
        assert_eq!(render.render_target_node().await.unwrap(), Some(target));

        assert!(render.set_render_target_node(None).await.unwrap());
        assert!(render.render_target_node().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_render_to_completion_with_callbacks() {
        let engine = TestEngine::start().await;
        let client = engine.client().await;
        let render = client.render_engine();
        let target = scene_with_target(&client, 64).await;

        let (tx, mut rx) = mpsc::unbounded_channel();
        render
            .set_on_new_image_callback(move |event| {
                if let CallbackEvent::NewImage(stats) = event {
                    let _ = tx.send(stats.clone());
                }
            })
            .await
            .unwrap();

        assert!(render.set_render_target_node(Some(&target)).await.unwrap());
        render.restart_rendering().await.unwrap();

        let last = tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                let stats = rx.recv().await.unwrap();
                if stats.state == RenderState::Finished {
                    return stats;
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(last.samples, 64);
        assert_eq!(last.max_samples, 64);
        assert_eq!(last.progress, 1.0);
        assert_eq!((last.width, last.height), (64, 32));

        let stats = render.render_statistics().await.unwrap();
        assert!(stats.is_complete());
    }

    #[tokio::test]
    async fn test_failure_callback_without_target() {
        let engine = TestEngine::start().await;
        let client = engine.client().await;
        let render = client.render_engine();

        let (tx, mut rx) = mpsc::unbounded_channel();
        render
            .set_on_render_failure_callback(move |event| {
                if let CallbackEvent::RenderFailure { reason } = event {
                    let _ = tx.send(reason.clone());
                }
            })
            .await
            .unwrap();

        render.restart_rendering().await.unwrap();
        let reason = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(reason.contains("render target"));
        assert_eq!(
            render.render_statistics().await.unwrap().state,
            RenderState::Failed
        );
    }

    #[tokio::test]
    async fn test_pause_and_stop() {
        let engine = TestEngine::start().await;
        let client = engine.client().await;
        let render = client.render_engine();
        let target = scene_with_target(&client, 1_000_000).await;
        render.set_render_target_node(Some(&target)).await.unwrap();

        render.restart_rendering().await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        render.pause_rendering().await.unwrap();
        assert!(render.is_rendering_paused().await.unwrap());

        let paused = render.render_statistics().await.unwrap();
        assert_eq!(paused.state, RenderState::Paused);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(render.render_statistics().await.unwrap().samples, paused.samples);

        render.continue_rendering().await.unwrap();
        assert!(!render.is_rendering_paused().await.unwrap());

        render.stop_rendering().await.unwrap();
        let stopped = render.render_statistics().await.unwrap();
        assert_eq!(stopped.state, RenderState::Stopped);
        assert_eq!(stopped.samples, 0);
    }

    #[tokio::test]
    async fn test_replacing_callback_unregisters_previous() {
        let engine = TestEngine::start().await;
        let client = engine.client().await;
        let render = client.render_engine();

        let first = render.set_on_new_image_callback(|_| {}).await.unwrap();
        let second = render.set_on_new_image_callback(|_| {}).await.unwrap();
        assert_ne!(first, second);
        assert!(!client.callbacks().contains(first));
        assert!(client.callbacks().contains(second));

        render.clear_on_new_image_callback().await.unwrap();
        assert!(client.callbacks().is_empty());
    }

    #[tokio::test]
    async fn test_cleared_callback_stops_firing() {
        let engine = TestEngine::start().await;
        let client = engine.client().await;
        let render = client.render_engine();

        let hits = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&hits);
        render
            .set_on_render_failure_callback(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .await
            .unwrap();
        render.clear_on_render_failure_callback().await.unwrap();

        // No render target, so this would report a failure
        render.restart_rendering().await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(
            render.render_statistics().await.unwrap().state,
            RenderState::Failed
        );
    }

    #[tokio::test]
    async fn test_callback_replaced_by_other_client() {
        let engine = TestEngine::start().await;
        let first = engine.client().await;
        let second = engine.client().await;

        let first_hits = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&first_hits);
        let first_id = first
            .render_engine()
            .set_on_new_image_callback(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .await
            .unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let second_id = second
            .render_engine()
            .set_on_new_image_callback(move |event| {
                if let CallbackEvent::NewImage(stats) = event {
                    let _ = tx.send(stats.state);
                }
            })
            .await
            .unwrap();
        // Both registries hand out the same local id
        assert_eq!(first_id, second_id);

        let render = second.render_engine();
        let target = scene_with_target(&second, 32).await;
        render.set_render_target_node(Some(&target)).await.unwrap();
        render.restart_rendering().await.unwrap();

        tokio::time::timeout(Duration::from_secs(10), async {
            while rx.recv().await.unwrap() != RenderState::Finished {}
        })
        .await
        .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(first_hits.load(Ordering::SeqCst), 0);

        // The replaced client clearing its slot leaves the engine's callback alone
        first.render_engine().clear_on_new_image_callback().await.unwrap();
        while rx.try_recv().is_ok() {}
        render.restart_rendering().await.unwrap();
        tokio::time::timeout(Duration::from_secs(10), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first_hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_save_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("beauty.png");

        let engine = TestEngine::start().await;
        let client = engine.client().await;
        let render = client.render_engine();

        // Nothing rendered yet
        assert!(!render.save_image(&path, ImageType::Png8).await.unwrap());
        assert!(!path.exists());

        let target = scene_with_target(&client, 16).await;
        render.set_render_target_node(Some(&target)).await.unwrap();
        render.restart_rendering().await.unwrap();
        tokio::time::timeout(Duration::from_secs(10), async {
            while !render.render_statistics().await.unwrap().is_complete() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();

        assert!(render.save_image(&path, ImageType::Png8).await.unwrap());
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"P6\n64 32\n255\n"));
        assert_eq!(bytes.len(), "P6\n64 32\n255\n".len() + 64 * 32 * 3);
    }
}
