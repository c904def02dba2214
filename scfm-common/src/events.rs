//! Event types and broadcast bus
//!
//! Workflow services emit an [`ScfmEvent`] after every successful write. The
//! SSE endpoint forwards them to connected clients, which replaces periodic
//! polling. Every event names the user it concerns so artists only receive
//! their own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::{DistributionStatus, ReleaseStatus, TicketStatus};

/// Events broadcast to SSE subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ScfmEvent {
    /// New release created by its artist
    ReleaseSubmitted {
        release_id: Uuid,
        user_id: Uuid,
        song_title: String,
        timestamp: DateTime<Utc>,
    },

    /// Artist edited a release; it is back in review
    ReleaseUpdated {
        release_id: Uuid,
        user_id: Uuid,
        version: i64,
        timestamp: DateTime<Utc>,
    },

    /// Admin approved or rejected a release
    ReleaseStatusChanged {
        release_id: Uuid,
        user_id: Uuid,
        old_status: ReleaseStatus,
        new_status: ReleaseStatus,
        note: String,
        timestamp: DateTime<Utc>,
    },

    FinancialsUpdated {
        release_id: Uuid,
        user_id: Uuid,
        streams: u64,
        revenue: f64,
        timestamp: DateTime<Utc>,
    },

    /// One platform advanced in the simulated delivery pipeline
    DistributionProgress {
        release_id: Uuid,
        user_id: Uuid,
        service: String,
        status: DistributionStatus,
        timestamp: DateTime<Utc>,
    },

    /// Ticket created, replied to, re-statused or read
    TicketUpdated {
        ticket_id: Uuid,
        user_id: Uuid,
        status: TicketStatus,
        read_by_artist: bool,
        read_by_admin: bool,
        timestamp: DateTime<Utc>,
    },

    /// Admin edited or banned an account
    UserUpdated {
        user_id: Uuid,
        is_banned: bool,
        timestamp: DateTime<Utc>,
    },
}

impl ScfmEvent {
    /// Event type name, also used as the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            ScfmEvent::ReleaseSubmitted { .. } => "ReleaseSubmitted",
            ScfmEvent::ReleaseUpdated { .. } => "ReleaseUpdated",
            ScfmEvent::ReleaseStatusChanged { .. } => "ReleaseStatusChanged",
            ScfmEvent::FinancialsUpdated { .. } => "FinancialsUpdated",
            ScfmEvent::DistributionProgress { .. } => "DistributionProgress",
            ScfmEvent::TicketUpdated { .. } => "TicketUpdated",
            ScfmEvent::UserUpdated { .. } => "UserUpdated",
        }
    }

    /// User the event concerns
    pub fn user_id(&self) -> Uuid {
        match self {
            ScfmEvent::ReleaseSubmitted { user_id, .. }
            | ScfmEvent::ReleaseUpdated { user_id, .. }
            | ScfmEvent::ReleaseStatusChanged { user_id, .. }
            | ScfmEvent::FinancialsUpdated { user_id, .. }
            | ScfmEvent::DistributionProgress { user_id, .. }
            | ScfmEvent::TicketUpdated { user_id, .. }
            | ScfmEvent::UserUpdated { user_id, .. } => *user_id,
        }
    }

    /// Whether a subscriber may see this event
    pub fn visible_to(&self, user_id: Uuid, is_admin: bool) -> bool {
        is_admin || self.user_id() == user_id
    }
}

/// Broadcast channel shared by the workflow services
///
/// Slow receivers lag and lose the oldest events; senders never block.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ScfmEvent>,
    capacity: usize,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Receiver for all events emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<ScfmEvent> {
        self.tx.subscribe()
    }

    /// Emit an event; errors when nobody is subscribed
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: ScfmEvent) -> Result<usize, broadcast::error::SendError<ScfmEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring the no-subscriber case
    pub fn emit_lossy(&self, event: ScfmEvent) {
        let kind = event.event_type();
        if self.tx.send(event).is_err() {
            tracing::debug!(event = kind, "No subscribers for event");
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket_event(user_id: Uuid) -> ScfmEvent {
        ScfmEvent::TicketUpdated {
            ticket_id: Uuid::new_v4(),
            user_id,
            status: TicketStatus::Resolved,
            read_by_artist: false,
            read_by_admin: true,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_subscriber_receives_event() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let owner = Uuid::new_v4();

        assert_eq!(bus.emit(ticket_event(owner)).unwrap(), 1);

        let received = rx.recv().await.unwrap();
        assert_eq!(received.event_type(), "TicketUpdated");
        assert_eq!(received.user_id(), owner);
    }

    #[test]
    fn test_emit_without_subscribers() {
        let bus = EventBus::new(4);
        assert!(bus.emit(ticket_event(Uuid::new_v4())).is_err());
        bus.emit_lossy(ticket_event(Uuid::new_v4()));
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.capacity(), 4);
    }

    #[test]
    fn test_visibility() {
        let owner = Uuid::new_v4();
        let event = ticket_event(owner);
        assert!(event.visible_to(owner, false));
        assert!(!event.visible_to(Uuid::new_v4(), false));
        assert!(event.visible_to(Uuid::new_v4(), true));
    }

    #[test]
    fn test_serialized_with_type_tag() {
        let json = serde_json::to_value(ScfmEvent::UserUpdated {
            user_id: Uuid::new_v4(),
            is_banned: true,
            timestamp: Utc::now(),
        })
        .unwrap();
        assert_eq!(json["type"], "UserUpdated");
        assert_eq!(json["is_banned"], true);
    }
}
