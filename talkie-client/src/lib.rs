pub mod backoff;
pub mod candidates;
pub mod config;
pub mod error;
pub mod logger;
pub mod machine;
pub mod ptt;
pub mod session;

pub use backoff::ReconnectBackoff;
pub use candidates::CandidateBuffer;
pub use config::{CallConfig, IceServerConfig};
pub use error::CallError;
pub use machine::{CallEvent, CallPhase, CallState, Effect, Role, transition};
pub use ptt::PushToTalkController;
pub use session::CallSession;
