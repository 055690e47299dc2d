use thiserror::Error;

/// Protocol-level faults. None of these close the connection; the router
/// answers each with an `error` frame and keeps listening.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProtocolError {
    #[error("join requires a non-empty roomId and userId")]
    InvalidJoin,

    #[error("already joined a room")]
    AlreadyJoined,

    #[error("join required before signaling")]
    NotJoined,

    #[error("unsupported message type")]
    UnsupportedType,

    #[error("malformed frame: {0}")]
    MalformedFrame(String),
}
