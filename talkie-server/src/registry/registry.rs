use dashmap::DashMap;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use talkie_core::{RoomId, SignalMessage, UserId};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Outbound side of one connection. Frames pushed here are serialized and
/// written to the socket by the connection's send task.
pub type ClientHandle = mpsc::UnboundedSender<SignalMessage>;

pub struct Participant {
    handle: ClientHandle,
    joined_at: Instant,
}

#[derive(Default)]
struct RoomState {
    participants: HashMap<UserId, Participant>,
}

/// In-memory room map. Rooms are created lazily on first join and deleted
/// the moment they empty; nothing is persisted, so a process restart drops
/// every room and clients rejoin on reconnect.
pub struct ConnectionRegistry {
    rooms: DashMap<RoomId, RoomState>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
        }
    }

    /// Adds a participant, creating the room if needed, and returns the
    /// resulting room size. A duplicate `user_id` silently replaces the
    /// prior handle (last-writer-wins) so a page refresh rejoins cleanly.
    pub fn join(&self, room_id: &RoomId, user_id: &UserId, handle: ClientHandle) -> usize {
        let mut room = self.rooms.entry(room_id.clone()).or_default();

        let replaced = room
            .participants
            .insert(
                user_id.clone(),
                Participant {
                    handle,
                    joined_at: Instant::now(),
                },
            )
            .is_some();

        if replaced {
            debug!("Replaced existing handle for {} in room {}", user_id, room_id);
        } else {
            info!("{} joined room {}", user_id, room_id);
        }

        room.participants.len()
    }

    /// Removes a participant and returns the new room size, or `None` if
    /// the room does not exist. An emptied room is deleted immediately.
    pub fn leave(&self, room_id: &RoomId, user_id: &UserId) -> Option<usize> {
        let size = {
            let mut room = self.rooms.get_mut(room_id)?;
            room.participants.remove(user_id);
            room.participants.len()
        };

        if size == 0 {
            self.rooms
                .remove_if(room_id, |_, room| room.participants.is_empty());
            info!("Room {} emptied and deleted", room_id);
        }

        Some(size)
    }

    /// Like `leave`, but only removes the slot if `handle` is still the
    /// registered one. A connection that was replaced by a same-id rejoin
    /// must not evict its successor on teardown.
    pub fn leave_if_current(
        &self,
        room_id: &RoomId,
        user_id: &UserId,
        handle: &ClientHandle,
    ) -> Option<usize> {
        let current = self
            .rooms
            .get(room_id)?
            .participants
            .get(user_id)
            .is_some_and(|p| p.handle.same_channel(handle));

        if !current {
            debug!("Stale handle for {} in room {}; leave skipped", user_id, room_id);
            return None;
        }

        self.leave(room_id, user_id)
    }

    /// Delivers `msg` to every participant in the room except `exclude`.
    /// Closed handles are skipped, never errored on and never removed here;
    /// removal happens on the close/leave path or in the sweep.
    pub fn broadcast(&self, room_id: &RoomId, msg: &SignalMessage, exclude: &UserId) {
        let Some(room) = self.rooms.get(room_id) else {
            return;
        };

        for (user_id, participant) in &room.participants {
            if user_id == exclude || participant.handle.is_closed() {
                continue;
            }
            if participant.handle.send(msg.clone()).is_err() {
                warn!("Dropped frame for {} in room {}", user_id, room_id);
            }
        }
    }

    pub fn room_size(&self, room_id: &RoomId) -> Option<usize> {
        self.rooms.get(room_id).map(|r| r.participants.len())
    }

    /// Safety net against handles that closed without a leave notification:
    /// drops every closed handle past the `max_age` grace window (so a
    /// freshly joined connection is never raced) and deletes emptied rooms.
    /// Returns the number of rooms removed.
    pub fn sweep_idle(&self, max_age: Duration) -> usize {
        let before = self.rooms.len();

        self.rooms.retain(|room_id, room| {
            room.participants.retain(|user_id, p| {
                let keep = !p.handle.is_closed() || p.joined_at.elapsed() < max_age;
                if !keep {
                    debug!("Sweeping dead handle {} from room {}", user_id, room_id);
                }
                keep
            });
            !room.participants.is_empty()
        });

        before - self.rooms.len()
    }

    /// Active rooms with their participant counts, for the debug API.
    pub fn snapshot(&self) -> Vec<(RoomId, usize)> {
        self.rooms
            .iter()
            .map(|entry| (entry.key().clone(), entry.participants.len()))
            .collect()
    }

    /// One room's participants as (id, handle open, seconds since join).
    pub fn room_detail(&self, room_id: &RoomId) -> Option<Vec<(UserId, bool, u64)>> {
        let room = self.rooms.get(room_id)?;
        Some(
            room.participants
                .iter()
                .map(|(user_id, p)| {
                    (
                        user_id.clone(),
                        !p.handle.is_closed(),
                        p.joined_at.elapsed().as_secs(),
                    )
                })
                .collect(),
        )
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
