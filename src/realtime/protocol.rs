//! Wire format shared by the relay and the API's emitter.
//!
//! Every frame is a JSON object `{ "event": "<name>", "data": { ... } }`.
//! Rooms are named `trip:{tripId}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Display;

/// Path the relay accepts WebSocket upgrades on
pub const RELAY_PATH: &str = "/api/socketio";

pub fn room_for_trip(trip_id: impl Display) -> String {
    format!("trip:{}", trip_id)
}

/// Named relay events, both client-sent and server-sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelayEvent {
    // Room membership
    JoinTrip,
    LeaveTrip,
    // Rebroadcast to the rest of the room
    MessageSent,
    MessageDeleted,
    ActivityCreated,
    EventUpdated,
    ExpenseUpdated,
    CollaboratorUpdated,
    PollUpdated,
    IdeaUpdated,
    TripUpdated,
    TypingStart,
    TypingStop,
    PresenceUpdate,
    // Server replies
    Connected,
    Joined,
    Left,
    UserJoined,
    UserLeft,
    Error,
}

impl RelayEvent {
    pub fn from_str(s: &str) -> Option<Self> {
        let event = match s {
            "join-trip" => RelayEvent::JoinTrip,
            "leave-trip" => RelayEvent::LeaveTrip,
            "message-sent" => RelayEvent::MessageSent,
            "message-deleted" => RelayEvent::MessageDeleted,
            "activity-created" => RelayEvent::ActivityCreated,
            "event-updated" => RelayEvent::EventUpdated,
            "expense-updated" => RelayEvent::ExpenseUpdated,
            "collaborator-updated" => RelayEvent::CollaboratorUpdated,
            "poll-updated" => RelayEvent::PollUpdated,
            "idea-updated" => RelayEvent::IdeaUpdated,
            "trip-updated" => RelayEvent::TripUpdated,
            "typing-start" => RelayEvent::TypingStart,
            "typing-stop" => RelayEvent::TypingStop,
            "presence-update" => RelayEvent::PresenceUpdate,
            "connected" => RelayEvent::Connected,
            "joined" => RelayEvent::Joined,
            "left" => RelayEvent::Left,
            "user-joined" => RelayEvent::UserJoined,
            "user-left" => RelayEvent::UserLeft,
            "error" => RelayEvent::Error,
            _ => return None,
        };
        Some(event)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RelayEvent::JoinTrip => "join-trip",
            RelayEvent::LeaveTrip => "leave-trip",
            RelayEvent::MessageSent => "message-sent",
            RelayEvent::MessageDeleted => "message-deleted",
            RelayEvent::ActivityCreated => "activity-created",
            RelayEvent::EventUpdated => "event-updated",
            RelayEvent::ExpenseUpdated => "expense-updated",
            RelayEvent::CollaboratorUpdated => "collaborator-updated",
            RelayEvent::PollUpdated => "poll-updated",
            RelayEvent::IdeaUpdated => "idea-updated",
            RelayEvent::TripUpdated => "trip-updated",
            RelayEvent::TypingStart => "typing-start",
            RelayEvent::TypingStop => "typing-stop",
            RelayEvent::PresenceUpdate => "presence-update",
            RelayEvent::Connected => "connected",
            RelayEvent::Joined => "joined",
            RelayEvent::Left => "left",
            RelayEvent::UserJoined => "user-joined",
            RelayEvent::UserLeft => "user-left",
            RelayEvent::Error => "error",
        }
    }

    /// Events that are forwarded verbatim to the other members of a room
    pub fn is_room_broadcast(&self) -> bool {
        matches!(
            self,
            RelayEvent::MessageSent
                | RelayEvent::MessageDeleted
                | RelayEvent::ActivityCreated
                | RelayEvent::EventUpdated
                | RelayEvent::ExpenseUpdated
                | RelayEvent::CollaboratorUpdated
                | RelayEvent::PollUpdated
                | RelayEvent::IdeaUpdated
                | RelayEvent::TripUpdated
                | RelayEvent::TypingStart
                | RelayEvent::TypingStop
                | RelayEvent::PresenceUpdate
        )
    }
}

/// One JSON frame on the socket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl Frame {
    pub fn new(event: RelayEvent, data: Value) -> Self {
        Self {
            event: event.as_str().to_string(),
            data,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(
            RelayEvent::Error,
            serde_json::json!({ "message": message.into() }),
        )
    }

    pub fn to_text(&self) -> String {
        // A Frame is always representable as JSON
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"))
    }

    /// `data.tripId` as a string, whether sent as a string or a number
    pub fn trip_id(&self) -> Option<String> {
        match self.data.get("tripId") {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Payload of `join-trip`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinPayload {
    pub user_id: Option<String>,
    pub user_name: Option<String>,
}

/// Body of the relay's internal `POST /emit`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmitRequest {
    pub trip_id: String,
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_names_round_trip() {
        for name in ["join-trip", "message-sent", "typing-stop", "presence-update", "user-left"] {
            assert_eq!(RelayEvent::from_str(name).unwrap().as_str(), name);
        }
        assert_eq!(RelayEvent::from_str("drop-table"), None);
    }

    #[test]
    fn only_payload_events_are_rebroadcast() {
        assert!(RelayEvent::MessageSent.is_room_broadcast());
        assert!(RelayEvent::TypingStart.is_room_broadcast());
        assert!(!RelayEvent::JoinTrip.is_room_broadcast());
        assert!(!RelayEvent::Error.is_room_broadcast());
    }

    #[test]
    fn frames_read_trip_ids() {
        let frame: Frame =
            serde_json::from_str(r#"{"event":"join-trip","data":{"tripId":"abc"}}"#).unwrap();
        assert_eq!(frame.trip_id().as_deref(), Some("abc"));
        assert_eq!(room_for_trip("abc"), "trip:abc");

        let frame = Frame::new(RelayEvent::TypingStart, json!({"tripId": "  "}));
        assert_eq!(frame.trip_id(), None);
    }

    #[test]
    fn frame_without_data_defaults_to_null() {
        let frame: Frame = serde_json::from_str(r#"{"event":"leave-trip"}"#).unwrap();
        assert_eq!(frame.data, Value::Null);
    }
}
