//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is shared via `Arc<EventBus>` between the engine and the
//! WebSocket relay.

use cad_core::types::DbId;
use cad_db::models::bolo::Bolo;
use cad_db::models::call::Call911;
use cad_db::models::incident::Incident;
use tokio::sync::broadcast;

use crate::event::DispatchEvent;

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// Fire-and-forget fan-out of [`DispatchEvent`]s.
///
/// ```rust
/// use cad_events::{DispatchEvent, EventBus};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.emit_update_officer_status();
/// assert_eq!(rx.try_recv().unwrap(), DispatchEvent::OfficerStatusUpdated);
/// ```
pub struct EventBus {
    sender: broadcast::Sender<DispatchEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest messages are dropped and slow
    /// receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: DispatchEvent) {
        tracing::trace!(event_type = event.event_type(), "Publishing dispatch event");
        // SendError only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DispatchEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    // ── Typed emitters ───────────────────────────────────────────────────

    pub fn emit_update_officer_status(&self) {
        self.publish(DispatchEvent::OfficerStatusUpdated);
    }

    pub fn emit_update_deputy_status(&self) {
        self.publish(DispatchEvent::DeputyStatusUpdated);
    }

    /// Both unit families in one go, officer list first.
    pub fn emit_update_unit_statuses(&self) {
        self.emit_update_officer_status();
        self.emit_update_deputy_status();
    }

    pub fn emit_update_911_call(&self, call: Call911) {
        self.publish(DispatchEvent::Call911Updated(call));
    }

    pub fn emit_update_active_incident(&self, incident: Incident) {
        self.publish(DispatchEvent::ActiveIncidentUpdated(incident));
    }

    pub fn emit_create_bolo(&self, bolo: Bolo) {
        self.publish(DispatchEvent::BoloCreated(bolo));
    }

    pub fn emit_update_bolo(&self, bolo: Bolo) {
        self.publish(DispatchEvent::BoloUpdated(bolo));
    }

    pub fn emit_delete_bolo(&self, id: DbId) {
        self.publish(DispatchEvent::BoloDeleted { id });
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::TryRecvError;

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.emit_delete_bolo(3);

        let e1 = rx1.recv().await.expect("subscriber 1 should receive");
        let e2 = rx2.recv().await.expect("subscriber 2 should receive");
        assert_eq!(e1, DispatchEvent::BoloDeleted { id: 3 });
        assert_eq!(e1, e2);
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::default();
        assert_eq!(bus.subscriber_count(), 0);
        bus.emit_update_deputy_status();
    }

    #[test]
    fn unit_statuses_emit_officer_then_deputy() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.emit_update_unit_statuses();

        assert_eq!(rx.try_recv().unwrap(), DispatchEvent::OfficerStatusUpdated);
        assert_eq!(rx.try_recv().unwrap(), DispatchEvent::DeputyStatusUpdated);
        assert_matches_empty(rx.try_recv());
    }

    #[test]
    fn slow_receiver_observes_lag() {
        let bus = EventBus::new(2);
        let mut rx = bus.subscribe();

        for _ in 0..3 {
            bus.emit_update_officer_status();
        }

        assert!(matches!(rx.try_recv(), Err(TryRecvError::Lagged(1))));
    }

    fn assert_matches_empty(result: Result<DispatchEvent, TryRecvError>) {
        assert!(matches!(result, Err(TryRecvError::Empty)), "got {result:?}");
    }
}
