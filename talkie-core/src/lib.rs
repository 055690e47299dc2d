mod error;
pub mod model;

pub use error::ProtocolError;
pub use model::{RoomId, SignalMessage, UserId};
