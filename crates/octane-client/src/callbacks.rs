//! # Callback Stream
//!
//! Receives callback invocations from the engine and runs the matching
//! local closures.
//!
//! ## Flow
//! ```text
//! ┌──────────────┐   Subscribe(client_name)   ┌──────────────────────┐
//! │ OctaneClient │ ─────────────────────────► │ CallbackStreamService│
//! │              │ ◄───── stream CallbackEvent│                      │
//! └──────┬───────┘                            └──────────────────────┘
//!        │ spawned task
//!        ▼
//! convert::callback_event ──► CallbackRegistry::dispatch(id, event)
//! ```
//!
//! The subscription is active once [`OctaneClient::start_callback_stream`]
//! returns, so events fired by later calls are never missed.
//!
//! The engine opens every stream with a subscriber id. Installing a
//! callback sends that id along, and the engine routes the callback's
//! events to this stream only, so callback ids of different clients never
//! collide. Callbacks installed before a stream restart stay bound to the
//! old subscriber and need to be installed again.

use std::sync::atomic::Ordering;

use octane_core::{CallbackEvent, CallbackId, CallbackKind};
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

use crate::client::OctaneClient;
use crate::convert;
use crate::error::{ClientError, ClientResult};
use crate::proto::callback_stream_service_client::CallbackStreamServiceClient;
use crate::proto::SubscribeRequest;

impl OctaneClient {
    /// Opens the callback stream. Does nothing if it is already running.
    pub async fn start_callback_stream(&self) -> ClientResult<()> {
        let mut task = self.inner.stream_task.lock().await;
        if task.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return Ok(());
        }

        let client_name = self.inner.config.callbacks.client_name.clone();
        let mut stub = CallbackStreamServiceClient::new(self.channel());
        let mut stream = stub
            .subscribe(SubscribeRequest {
                client_name: client_name.clone(),
            })
            .await?
            .into_inner();

        let first = stream.message().await?.ok_or(ClientError::MissingField("subscribed"))?;
        let subscriber_id = convert::subscriber_id(first)?;
        self.inner.subscriber_id.store(subscriber_id, Ordering::Relaxed);

        info!(client_name = %client_name, subscriber_id, "Callback stream opened");

        // The task holds only a weak reference so an idle stream does not keep
        // the client alive.
        let weak = std::sync::Arc::downgrade(&self.inner);
        *task = Some(tokio::spawn(async move {
            loop {
                let message = match stream.next().await {
                    Some(Ok(message)) => message,
                    Some(Err(status)) => {
                        warn!(code = ?status.code(), message = %status.message(), "Callback stream failed");
                        break;
                    }
                    None => {
                        info!("Callback stream closed by engine");
                        break;
                    }
                };

                let Some(inner) = weak.upgrade() else {
                    break;
                };

                match convert::callback_event(message) {
                    Ok((id, event)) => {
                        if !inner.callbacks.dispatch(id, &event) {
                            debug!(callback_id = %id, kind = ?event.kind(), "No callback registered for event");
                        }
                    }
                    Err(e) => warn!(error = %e, "Dropping undecodable callback event"),
                }
            }
        }));

        Ok(())
    }

    /// Stops the callback stream. Registered closures are kept.
    pub async fn stop_callback_stream(&self) {
        if let Some(task) = self.inner.stream_task.lock().await.take() {
            task.abort();
            info!("Callback stream stopped");
        }
        self.inner.subscriber_id.store(0, Ordering::Relaxed);
    }

    /// True while the stream task is alive.
    pub async fn is_callback_stream_running(&self) -> bool {
        self.inner
            .stream_task
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Registers `callback` locally, failing if it could never fire.
    pub(crate) async fn register_callback<F>(
        &self,
        kind: CallbackKind,
        callback: F,
    ) -> ClientResult<CallbackId>
    where
        F: Fn(&CallbackEvent) + Send + Sync + 'static,
    {
        if !self.is_callback_stream_running().await {
            return Err(ClientError::StreamNotRunning);
        }
        Ok(self.inner.callbacks.register(kind, callback))
    }
}
