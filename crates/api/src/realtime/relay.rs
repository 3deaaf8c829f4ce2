use std::sync::Arc;

use axum::extract::ws::Message;
use cad_events::DispatchEvent;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::ws::WsManager;

/// Forwards every [`DispatchEvent`] to every WebSocket client as a JSON
/// text frame.
pub struct EventRelay {
    ws_manager: Arc<WsManager>,
}

impl EventRelay {
    pub fn new(ws_manager: Arc<WsManager>) -> Self {
        Self { ws_manager }
    }

    /// Relay until `cancel` fires or the [`EventBus`](cad_events::EventBus)
    /// is dropped.
    pub async fn run(
        self,
        mut receiver: broadcast::Receiver<DispatchEvent>,
        cancel: CancellationToken,
    ) {
        loop {
            let received = tokio::select! {
                () = cancel.cancelled() => {
                    tracing::info!("Event relay cancelled");
                    break;
                }
                received = receiver.recv() => received,
            };
            match received {
                Ok(event) => self.relay(&event).await,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Event relay lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, event relay shutting down");
                    break;
                }
            }
        }
    }

    async fn relay(&self, event: &DispatchEvent) {
        let json = match event.to_json() {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, event_type = event.event_type(), "Failed to serialize event");
                return;
            }
        };
        let delivered = self.ws_manager.broadcast(Message::Text(json.into())).await;
        tracing::debug!(event_type = event.event_type(), delivered, "Dispatch event relayed");
    }
}
