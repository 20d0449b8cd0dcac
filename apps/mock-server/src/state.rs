//! Shared engine state behind every service.
//!
//! Lock order is always `scene` before `render`; the ticker only takes
//! `render`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use octane_core::{AttrValue, PinId, RenderState};
use tokio::sync::{broadcast, watch, Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::convert;
use crate::proto;
use crate::render::{InstalledCallback, RenderSettings, RenderSim, MAX_IMAGE_DIMENSION};
use crate::scene::Scene;

/// A callback event and the subscriber it belongs to.
#[derive(Debug, Clone)]
pub struct RoutedEvent {
    pub subscriber_id: u64,
    pub event: proto::CallbackEvent,
}

/// State of the simulated engine.
pub struct EngineState {
    pub config: ServerConfig,
    pub scene: RwLock<Scene>,
    pub render: Mutex<RenderSim>,
    events: broadcast::Sender<RoutedEvent>,
    next_subscriber: AtomicU64,
    shutdown: watch::Sender<bool>,
}

/// Resolves once `begin_shutdown` has been called.
///
/// The `watch::Ref` from `wait_for` is dropped here so callers can use this
/// in a `select!` inside a spawned task.
pub async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stopping| *stopping).await;
}

impl EngineState {
    pub fn new(config: ServerConfig) -> Arc<Self> {
        let (events, _) = broadcast::channel(config.event_buffer);
        let (shutdown, _) = watch::channel(false);
        Arc::new(EngineState {
            config,
            scene: RwLock::new(Scene::new()),
            render: Mutex::new(RenderSim::default()),
            events,
            next_subscriber: AtomicU64::new(1),
            shutdown,
        })
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Registers a new subscriber. Ids start at 1 and are never reused.
    pub fn subscribe(&self) -> (u64, broadcast::Receiver<RoutedEvent>) {
        let subscriber_id = self.next_subscriber.fetch_add(1, Ordering::Relaxed);
        (subscriber_id, self.events.subscribe())
    }

    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    /// Ends the ticker and every callback stream.
    pub fn begin_shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    fn emit(&self, target: Option<InstalledCallback>, payload: proto::callback_event::Payload) {
        let Some(target) = target else {
            return;
        };
        // No subscribers is not an error
        let receivers = self
            .events
            .send(RoutedEvent {
                subscriber_id: target.subscriber_id,
                event: proto::CallbackEvent {
                    callback_id: target.callback_id,
                    payload: Some(payload),
                },
            })
            .unwrap_or(0);
        debug!(
            callback_id = target.callback_id,
            subscriber_id = target.subscriber_id,
            receivers,
            "Callback event emitted"
        );
    }

    fn emit_new_image(&self, render: &RenderSim) {
        let statistics = convert::wire_statistics(&render.statistics());
        self.emit(
            render.new_image_callback,
            proto::callback_event::Payload::NewImage(proto::NewImage {
                statistics: Some(statistics),
            }),
        );
    }

    fn emit_failure(&self, render: &RenderSim, reason: &str) {
        self.emit(
            render.render_failure_callback,
            proto::callback_event::Payload::RenderFailure(proto::RenderFailure {
                reason: reason.to_string(),
            }),
        );
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Reads render settings from the render target's kernel and film pins.
    /// Film sizes are clamped to [`MAX_IMAGE_DIMENSION`].
    fn render_settings(&self, scene: &Scene, target: u64) -> RenderSettings {
        let int_pin = |node: Option<u64>, pin: PinId| -> Option<u32> {
            match scene.evaluate_pin(node?, pin)? {
                AttrValue::Int(v) if v > 0 => u32::try_from(v).ok(),
                _ => None,
            }
        };

        let kernel = scene.source_of(target, PinId::KERNEL);
        let film = scene.source_of(target, PinId::FILM_SETTINGS);
        let width = int_pin(film, PinId::WIDTH).unwrap_or(self.config.default_width);
        let height = int_pin(film, PinId::HEIGHT).unwrap_or(self.config.default_height);
        if width > MAX_IMAGE_DIMENSION || height > MAX_IMAGE_DIMENSION {
            warn!(width, height, max = MAX_IMAGE_DIMENSION, "Film size clamped");
        }
        RenderSettings {
            max_samples: int_pin(kernel, PinId::MAX_SAMPLES).unwrap_or(self.config.default_max_samples),
            width: width.min(MAX_IMAGE_DIMENSION),
            height: height.min(MAX_IMAGE_DIMENSION),
        }
    }

    /// Restarts rendering, or reports a failure when there is no target.
    pub async fn restart_rendering(&self) {
        let scene = self.scene.read().await;
        let mut render = self.render.lock().await;

        match scene.render_target() {
            Some(target) => {
                let settings = self.render_settings(&scene, target);
                info!(
                    target,
                    max_samples = settings.max_samples,
                    width = settings.width,
                    height = settings.height,
                    "Rendering started"
                );
                render.restart(settings, scene.revision());
            }
            None => {
                warn!("Restart requested without a render target");
                render.fail();
                self.emit_failure(&render, "No render target node is set");
            }
        }
    }

    /// Restarts a render whose scene changed since it started.
    pub async fn apply_changes(&self) {
        let stale = {
            let scene = self.scene.read().await;
            let render = self.render.lock().await;
            render.state() != RenderState::Stopped
                && render.state() != RenderState::Failed
                && render.rendered_revision != scene.revision()
        };
        if stale {
            debug!("Scene changed, restarting render");
            self.restart_rendering().await;
        }
    }

    /// Stops rendering and forgets the render target's progress. Used when
    /// the whole project is replaced.
    pub async fn stop_rendering(&self) {
        self.render.lock().await.stop();
    }

    /// One simulation step.
    pub async fn tick(&self) {
        let mut render = self.render.lock().await;
        if render.tick(self.config.samples_per_tick) {
            self.emit_new_image(&render);
            if render.state() == RenderState::Finished {
                info!(samples = render.statistics().samples, "Rendering finished");
            }
        }
    }

    /// Runs the render ticker until shutdown.
    pub async fn run_ticker(self: Arc<Self>) {
        let mut interval = tokio::time::interval(self.config.tick_interval());
        let mut shutdown = self.shutdown_signal();
        loop {
            tokio::select! {
                _ = interval.tick() => self.tick().await,
                _ = shutdown_requested(&mut shutdown) => break,
            }
        }
        debug!("Render ticker stopped");
    }
}
