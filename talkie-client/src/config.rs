use serde::{Deserialize, Serialize};
use talkie_core::{RoomId, UserId};

pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_2: &str = "stun:stun1.l.google.com:19302";

/// Connect timeout for the signaling transport.
pub const CONNECT_TIMEOUT_MS: i32 = 10_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

/// Client-side input for one call session.
#[derive(Debug, Clone)]
pub struct CallConfig {
    /// Signaling endpoint, e.g. `wss://host/voice`.
    pub url: String,
    pub room_id: RoomId,
    pub user_id: UserId,
    /// Empty means the default public STUN servers.
    pub ice_servers: Vec<IceServerConfig>,
}

impl CallConfig {
    pub fn new(url: impl Into<String>, room_id: RoomId, user_id: UserId) -> Self {
        Self {
            url: url.into(),
            room_id,
            user_id,
            ice_servers: Vec::new(),
        }
    }
}
