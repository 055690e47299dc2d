use crate::registry::{ClientHandle, ConnectionRegistry};
use std::sync::Arc;
use talkie_core::{ProtocolError, RoomId, SignalMessage, UserId};
use tracing::{debug, info, warn};

/// Where one inbound connection sits in its lifecycle. `Left` is terminal:
/// frames arriving afterwards are dropped on the floor.
enum ConnectionPhase {
    Unjoined,
    Joined { room_id: RoomId, user_id: UserId },
    Left,
}

/// Per-connection signaling state machine. All handling is synchronous:
/// outbound frames go through unbounded handles, so nothing here awaits and
/// registry mutations stay serialized per connection task.
pub struct Connection {
    registry: Arc<ConnectionRegistry>,
    handle: ClientHandle,
    phase: ConnectionPhase,
}

impl Connection {
    pub fn new(registry: Arc<ConnectionRegistry>, handle: ClientHandle) -> Self {
        Self {
            registry,
            handle,
            phase: ConnectionPhase::Unjoined,
        }
    }

    /// Parses one text frame and dispatches it. Protocol violations are
    /// answered with an `error` frame; the connection is never closed for
    /// them.
    pub fn handle_frame(&mut self, text: &str) {
        match serde_json::from_str::<SignalMessage>(text) {
            Ok(msg) => self.handle_message(msg),
            Err(e) => {
                let err = if serde_json::from_str::<serde_json::Value>(text).is_ok() {
                    ProtocolError::UnsupportedType
                } else {
                    ProtocolError::MalformedFrame(e.to_string())
                };
                warn!("Bad frame: {}", err);
                self.send_error(&err);
            }
        }
    }

    pub fn handle_message(&mut self, msg: SignalMessage) {
        match &self.phase {
            ConnectionPhase::Unjoined => match msg {
                SignalMessage::Join { room_id, user_id } => self.handle_join(room_id, user_id),
                _ => self.send_error(&ProtocolError::NotJoined),
            },

            ConnectionPhase::Joined { room_id, user_id } => {
                let (room_id, user_id) = (room_id.clone(), user_id.clone());
                match msg {
                    SignalMessage::Offer { .. }
                    | SignalMessage::Answer { .. }
                    | SignalMessage::IceCandidate { .. } => {
                        // Payloads are routed, never inspected; WebRTC
                        // semantics live entirely on the clients.
                        let stamped = msg.stamped_from(&user_id);
                        self.registry.broadcast(&room_id, &stamped, &user_id);
                    }
                    SignalMessage::Leave => self.disconnect(),
                    SignalMessage::Join { .. } => {
                        self.send_error(&ProtocolError::AlreadyJoined)
                    }
                    _ => self.send_error(&ProtocolError::UnsupportedType),
                }
            }

            ConnectionPhase::Left => {
                debug!("Frame after leave ignored");
            }
        }
    }

    fn handle_join(&mut self, room_id: RoomId, user_id: UserId) {
        if room_id.is_empty() || user_id.is_empty() {
            self.send_error(&ProtocolError::InvalidJoin);
            return;
        }

        let room_size = self
            .registry
            .join(&room_id, &user_id, self.handle.clone());

        let _ = self.handle.send(SignalMessage::Joined {
            room_id: room_id.clone(),
            user_id: user_id.clone(),
            room_size,
        });

        self.registry.broadcast(
            &room_id,
            &SignalMessage::UserJoined {
                user_id: user_id.clone(),
                room_size,
            },
            &user_id,
        );

        self.phase = ConnectionPhase::Joined { room_id, user_id };
    }

    /// Runs the leave path. Invoked by an explicit `leave` frame or by the
    /// transport on socket close; idempotent, so both may fire.
    pub fn disconnect(&mut self) {
        let ConnectionPhase::Joined { room_id, user_id } =
            std::mem::replace(&mut self.phase, ConnectionPhase::Left)
        else {
            return;
        };

        // A connection replaced by a same-id rejoin reports None here and
        // must not announce a departure the room never saw.
        let Some(room_size) = self
            .registry
            .leave_if_current(&room_id, &user_id, &self.handle)
        else {
            return;
        };

        info!("{} left room {} ({} remaining)", user_id, room_id, room_size);

        self.registry.broadcast(
            &room_id,
            &SignalMessage::UserLeft {
                user_id: user_id.clone(),
                room_size,
            },
            &user_id,
        );
    }

    fn send_error(&self, err: &ProtocolError) {
        let _ = self.handle.send(SignalMessage::Error {
            message: err.to_string(),
        });
    }
}
