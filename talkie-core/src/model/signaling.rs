use crate::model::peer::UserId;
use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One signaling frame. Offer/answer/candidate payloads stay opaque
/// `Value`s end to end; the relay stamps `from` when forwarding so the
/// receiver knows which room member produced the payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum SignalMessage {
    Join {
        room_id: RoomId,
        user_id: UserId,
    },
    Joined {
        room_id: RoomId,
        user_id: UserId,
        room_size: usize,
    },
    UserJoined {
        user_id: UserId,
        room_size: usize,
    },
    UserLeft {
        user_id: UserId,
        room_size: usize,
    },
    Offer {
        room_id: RoomId,
        offer: Value,
        #[serde(skip_serializing_if = "Option::is_none")]
        from: Option<UserId>,
    },
    Answer {
        room_id: RoomId,
        answer: Value,
        #[serde(skip_serializing_if = "Option::is_none")]
        from: Option<UserId>,
    },
    IceCandidate {
        room_id: RoomId,
        candidate: Value,
        #[serde(skip_serializing_if = "Option::is_none")]
        from: Option<UserId>,
    },
    Leave,
    Error {
        message: String,
    },
}

impl SignalMessage {
    /// Stamps the sender id onto a forwardable frame. Non-forwardable
    /// kinds pass through unchanged.
    pub fn stamped_from(self, sender: &UserId) -> Self {
        match self {
            SignalMessage::Offer { room_id, offer, .. } => SignalMessage::Offer {
                room_id,
                offer,
                from: Some(sender.clone()),
            },
            SignalMessage::Answer {
                room_id, answer, ..
            } => SignalMessage::Answer {
                room_id,
                answer,
                from: Some(sender.clone()),
            },
            SignalMessage::IceCandidate {
                room_id, candidate, ..
            } => SignalMessage::IceCandidate {
                room_id,
                candidate,
                from: Some(sender.clone()),
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn join_uses_wire_field_names() {
        let msg = SignalMessage::Join {
            room_id: "R1".into(),
            user_id: "alice".into(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            json,
            json!({"type": "join", "roomId": "R1", "userId": "alice"})
        );
    }

    #[test]
    fn ice_candidate_round_trips_opaque_payload() {
        let frame = r#"{"type":"ice-candidate","roomId":"R1","candidate":{"candidate":"candidate:0 1 UDP 2122252543 192.0.2.1 54321 typ host","sdpMid":"0"}}"#;
        let msg: SignalMessage = serde_json::from_str(frame).unwrap();
        let SignalMessage::IceCandidate {
            candidate, from, ..
        } = &msg
        else {
            panic!("wrong variant");
        };
        assert!(from.is_none());
        assert_eq!(candidate["sdpMid"], "0");
    }

    #[test]
    fn stamping_sets_from_on_forwarded_offer() {
        let msg = SignalMessage::Offer {
            room_id: "R1".into(),
            offer: json!({"type": "offer", "sdp": "v=0"}),
            from: None,
        };
        let stamped = msg.stamped_from(&"alice".into());
        let json = serde_json::to_value(&stamped).unwrap();
        assert_eq!(json["from"], "alice");
    }

    #[test]
    fn leave_is_a_bare_tag() {
        let msg: SignalMessage = serde_json::from_str(r#"{"type":"leave"}"#).unwrap();
        assert_eq!(msg, SignalMessage::Leave);
    }
}
