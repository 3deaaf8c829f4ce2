use cad_core::types::DbId;
use cad_db::models::bolo::Bolo;
use cad_db::models::call::Call911;
use cad_db::models::incident::Incident;
use serde::Serialize;

/// A notification for dispatch clients.
///
/// Serialized as `{"type": "...", "payload": ...}`. The two status events
/// carry no payload: clients refetch the unit lists when they see them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum DispatchEvent {
    OfficerStatusUpdated,
    DeputyStatusUpdated,
    Call911Updated(Call911),
    ActiveIncidentUpdated(Incident),
    BoloCreated(Bolo),
    BoloUpdated(Bolo),
    BoloDeleted { id: DbId },
}

impl DispatchEvent {
    /// The `type` tag as it appears on the wire.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::OfficerStatusUpdated => "officer_status_updated",
            Self::DeputyStatusUpdated => "deputy_status_updated",
            Self::Call911Updated(_) => "call911_updated",
            Self::ActiveIncidentUpdated(_) => "active_incident_updated",
            Self::BoloCreated(_) => "bolo_created",
            Self::BoloUpdated(_) => "bolo_updated",
            Self::BoloDeleted { .. } => "bolo_deleted",
        }
    }

    /// Serialize to the JSON text frame sent over the socket.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn status_events_have_no_payload() {
        let json = serde_json::to_value(DispatchEvent::OfficerStatusUpdated).unwrap();
        assert_eq!(json, serde_json::json!({"type": "officer_status_updated"}));
    }

    #[test]
    fn bolo_deleted_carries_id() {
        let json = serde_json::to_value(DispatchEvent::BoloDeleted { id: 9 }).unwrap();
        assert_eq!(json["type"], "bolo_deleted");
        assert_eq!(json["payload"]["id"], 9);
    }

    #[test]
    fn event_type_matches_serialized_tag() {
        let now = Utc::now();
        let bolo = Bolo {
            id: 1,
            bolo_type: "person".to_string(),
            description: None,
            plate: None,
            name: Some("John Doe".to_string()),
            created_at: now,
            updated_at: now,
        };
        for event in [
            DispatchEvent::OfficerStatusUpdated,
            DispatchEvent::DeputyStatusUpdated,
            DispatchEvent::BoloCreated(bolo.clone()),
            DispatchEvent::BoloUpdated(bolo),
            DispatchEvent::BoloDeleted { id: 1 },
        ] {
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["type"], event.event_type());
        }
    }
}
