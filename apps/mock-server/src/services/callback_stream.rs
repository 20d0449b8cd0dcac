//! Callback event stream.
//!
//! Each subscription gets its own subscriber id, sent as the first message.
//! Clients pass it back when installing callbacks and the stream only
//! forwards events for callbacks its own subscriber installed.

use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio_stream::{wrappers::ReceiverStream, Stream};
use tonic::{Request, Response, Status};
use tracing::{debug, info, warn};

use crate::proto::{
    callback_event::Payload, callback_stream_service_server::CallbackStreamService, CallbackEvent, SubscribeRequest,
    Subscribed,
};
use crate::state::{shutdown_requested, EngineState};

const STREAM_BUFFER: usize = 64;

pub struct CallbackStreamServiceImpl {
    state: Arc<EngineState>,
}

impl CallbackStreamServiceImpl {
    pub fn new(state: Arc<EngineState>) -> Self {
        CallbackStreamServiceImpl { state }
    }
}

#[tonic::async_trait]
impl CallbackStreamService for CallbackStreamServiceImpl {
    type SubscribeStream = Pin<Box<dyn Stream<Item = Result<CallbackEvent, Status>> + Send>>;

    async fn subscribe(&self, request: Request<SubscribeRequest>) -> Result<Response<Self::SubscribeStream>, Status> {
        let client_name = request.into_inner().client_name;

        // Subscribe before returning so no event emitted after this call is missed
        let (subscriber_id, mut events) = self.state.subscribe();
        let mut shutdown = self.state.shutdown_signal();
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        info!(client_name = %client_name, subscriber_id, "Callback subscriber connected");

        let hello = CallbackEvent {
            callback_id: 0,
            payload: Some(Payload::Subscribed(Subscribed { subscriber_id })),
        };
        tx.send(Ok(hello))
            .await
            .map_err(|_| Status::internal("Callback stream closed before it opened"))?;

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    received = events.recv() => match received {
                        Ok(routed) if routed.subscriber_id == subscriber_id => {
                            if tx.send(Ok(routed.event)).await.is_err() {
                                debug!(client_name = %client_name, "Subscriber went away");
                                break;
                            }
                        }
                        Ok(_) => {}
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(client_name = %client_name, skipped, "Subscriber lagging, events dropped");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    _ = tx.closed() => {
                        debug!(client_name = %client_name, "Subscriber went away");
                        break;
                    }
                    _ = shutdown_requested(&mut shutdown) => break,
                }
            }
            info!(client_name = %client_name, subscriber_id, "Callback subscription ended");
        });

        Ok(Response::new(Box::pin(ReceiverStream::new(rx))))
    }
}
