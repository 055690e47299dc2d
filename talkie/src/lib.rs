pub use talkie_core::{RoomId, SignalMessage, UserId};

pub mod model {
    pub use talkie_core::model::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use talkie_server::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use talkie_client::*;
}
