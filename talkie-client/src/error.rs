use thiserror::Error;
use wasm_bindgen::JsValue;

/// Human-readable call failures surfaced to the host UI. Everything here
/// degrades to "voice unavailable" for one session; nothing is fatal to the
/// page.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CallError {
    #[error("microphone access denied")]
    PermissionDenied,

    #[error("no usable microphone found")]
    NoDevice,

    #[error("media capture failed: {0}")]
    Media(String),

    #[error("signaling connection lost; retrying")]
    TransportLost,

    #[error("voice connection interrupted; waiting for it to recover")]
    TemporarilyDisconnected,

    #[error("signaling reconnect attempts exhausted")]
    ReconnectExhausted,

    #[error("voice negotiation failed: {0}")]
    Negotiation(String),
}

impl CallError {
    /// Classifies a getUserMedia rejection by its DOMException name.
    pub fn from_media_failure(err: &JsValue) -> Self {
        let name = js_sys::Reflect::get(err, &JsValue::from_str("name"))
            .ok()
            .and_then(|v| v.as_string())
            .unwrap_or_default();

        match name.as_str() {
            "NotAllowedError" | "SecurityError" => CallError::PermissionDenied,
            "NotFoundError" | "OverconstrainedError" => CallError::NoDevice,
            _ => CallError::Media(format!("{:?}", err)),
        }
    }
}

impl From<CallError> for JsValue {
    fn from(err: CallError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}
