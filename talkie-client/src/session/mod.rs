//! web-sys boundary layer: executes the pure machine's effects against the
//! browser (WebSocket, RtcPeerConnection, getUserMedia, timers).

use crate::backoff::ReconnectBackoff;
use crate::candidates::CandidateBuffer;
use crate::config::CallConfig;
use crate::error::CallError;
use crate::logger::Logger;
use crate::machine::{CallEvent, CallPhase, CallState, Effect, Role, transition};
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use talkie_core::SignalMessage;
use wasm_bindgen::JsValue;

mod capture_impl;
mod create_pc_impl;
mod handle_signal_impl;
mod negotiate_impl;
mod reconnect_impl;
mod ws_setup_impl;

pub(crate) struct SessionInner {
    config: CallConfig,
    state: CallState,
    ws: Option<web_sys::WebSocket>,
    pc: Option<web_sys::RtcPeerConnection>,
    local_stream: Option<web_sys::MediaStream>,
    audio_sender: Option<web_sys::RtcRtpSender>,
    candidates: CandidateBuffer,
    backoff: ReconnectBackoff,
    offer_outstanding: bool,
    recording: bool,
    connected: bool,
    torn_down: bool,
    room_size: usize,
    connect_timer: Option<i32>,
    reconnect_timer: Option<i32>,
    on_error: Option<js_sys::Function>,
    on_connected_change: Option<js_sys::Function>,
    on_remote_stream: Option<js_sys::Function>,
}

impl SessionInner {
    fn transport_open(&self) -> bool {
        self.ws
            .as_ref()
            .is_some_and(|ws| ws.ready_state() == web_sys::WebSocket::OPEN)
    }
}

/// One voice session for a (room, user) pair. Owns the signaling socket,
/// the peer connection, and the local capture exclusively; created when the
/// owning UI mounts and torn down on unmount.
#[derive(Clone)]
pub struct CallSession {
    inner: Rc<RefCell<SessionInner>>,
}

/// Externally observable session state, serializable for the host UI.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallStats {
    pub connected: bool,
    pub recording: bool,
    pub room_size: usize,
    pub reconnect_attempts: u32,
}

impl CallSession {
    /// Opens the signaling transport and starts the join handshake. The
    /// microphone is not touched until the first push-to-talk press.
    pub fn connect(config: CallConfig) -> Self {
        let inner = Rc::new(RefCell::new(SessionInner {
            config,
            state: CallState::new(),
            ws: None,
            pc: None,
            local_stream: None,
            audio_sender: None,
            candidates: CandidateBuffer::new(),
            backoff: ReconnectBackoff::default(),
            offer_outstanding: false,
            recording: false,
            connected: false,
            torn_down: false,
            room_size: 0,
            connect_timer: None,
            reconnect_timer: None,
            on_error: None,
            on_connected_change: None,
            on_remote_stream: None,
        }));

        dispatch(&inner, CallEvent::Mounted);

        Self { inner }
    }

    /// Push-to-talk press: capture, peer connection, and (for the
    /// initiator on a clean connection) the offer.
    pub async fn start_talking(&self) -> Result<(), JsValue> {
        {
            let inner = self.inner.borrow();
            if inner.torn_down {
                return Err(JsValue::from_str("session is torn down"));
            }
            if !inner.transport_open() {
                return Err(CallError::TransportLost.into());
            }
        }

        let effects = dispatch(&self.inner, CallEvent::PttPressed);
        if !effects.contains(&Effect::StartCapture) {
            return Err(JsValue::from_str("not joined to a room yet"));
        }

        let stream = match capture_impl::acquire_capture(&self.inner).await {
            Ok(stream) => stream,
            Err(err) => {
                surface_error(&self.inner, &err);
                return Err(err.into());
            }
        };

        let pc = create_pc_impl::ensure_pc(&self.inner)?;
        capture_impl::attach_local_tracks(&self.inner, &pc, &stream).await?;
        self.inner.borrow_mut().recording = true;

        if effects.contains(&Effect::SendOfferIfClean) {
            negotiate_impl::send_offer_if_clean(&self.inner).await;
        }

        Ok(())
    }

    /// Push-to-talk release: stops capture tracks, keeps the peer
    /// connection alive for the next press.
    pub fn stop_talking(&self) {
        dispatch(&self.inner, CallEvent::PttReleased);
    }

    /// Unmount path. Idempotent.
    pub fn teardown(&self) {
        if self.inner.borrow().torn_down {
            return;
        }
        self.inner.borrow_mut().torn_down = true;
        dispatch(&self.inner, CallEvent::TornDown);
    }

    pub fn is_connected(&self) -> bool {
        self.inner.borrow().connected
    }

    pub fn is_recording(&self) -> bool {
        self.inner.borrow().recording
    }

    pub fn is_transport_connected(&self) -> bool {
        let inner = self.inner.borrow();
        !inner.torn_down
            && inner.transport_open()
            && !matches!(inner.state.phase, CallPhase::Idle | CallPhase::Failed)
    }

    pub fn role(&self) -> Role {
        self.inner.borrow().state.role
    }

    pub fn phase(&self) -> CallPhase {
        self.inner.borrow().state.phase
    }

    pub fn stats(&self) -> CallStats {
        let inner = self.inner.borrow();
        CallStats {
            connected: inner.connected,
            recording: inner.recording,
            room_size: inner.room_size,
            reconnect_attempts: inner.backoff.attempts(),
        }
    }

    pub fn stats_js(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.stats()).unwrap_or(JsValue::NULL)
    }

    pub fn set_on_error(&self, callback: js_sys::Function) {
        self.inner.borrow_mut().on_error = Some(callback);
    }

    pub fn set_on_connected_change(&self, callback: js_sys::Function) {
        self.inner.borrow_mut().on_connected_change = Some(callback);
    }

    /// Called with the remote `MediaStream` when the peer's audio arrives;
    /// the host app is responsible for wiring it to an `<audio>` element.
    pub fn set_on_remote_stream(&self, callback: js_sys::Function) {
        self.inner.borrow_mut().on_remote_stream = Some(callback);
    }
}

/// Applies one event to the machine and executes the resulting effects.
/// Returns the effects so call sites holding a payload can branch on them.
pub(crate) fn dispatch(inner: &Rc<RefCell<SessionInner>>, event: CallEvent) -> Vec<Effect> {
    let effects = {
        let mut s = inner.borrow_mut();
        let (next, effects) = transition(s.state, event);
        s.state = next;
        effects
    };
    run_effects(inner, &effects);
    effects
}

fn run_effects(inner: &Rc<RefCell<SessionInner>>, effects: &[Effect]) {
    for effect in effects {
        match effect {
            Effect::OpenTransport => {
                if let Err(e) = ws_setup_impl::ws_setup(inner) {
                    Logger::error(&e);
                    reconnect_impl::schedule_reconnect(inner);
                }
            }
            Effect::StartConnectTimer => reconnect_impl::start_connect_timer(inner),
            Effect::CancelConnectTimer => reconnect_impl::cancel_connect_timer(inner),
            Effect::SendJoin => {
                let (room_id, user_id) = {
                    let s = inner.borrow();
                    (s.config.room_id.clone(), s.config.user_id.clone())
                };
                send_frame(inner, &SignalMessage::Join { room_id, user_id });
            }
            Effect::ResetBackoff => inner.borrow_mut().backoff.reset(),
            Effect::StopCapture => capture_impl::stop_capture(inner),
            Effect::RestartIce => {
                let inner = inner.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    negotiate_impl::restart_ice(&inner).await;
                });
            }
            Effect::TeardownPeer => teardown_peer(inner),
            Effect::ScheduleReconnect => reconnect_impl::schedule_reconnect(inner),
            Effect::CancelReconnect => reconnect_impl::cancel_reconnect(inner),
            Effect::CloseTransport => close_transport(inner),
            Effect::SetConnected(connected) => set_connected(inner, *connected),
            Effect::SurfaceRecoverableError => {
                surface_error(inner, &CallError::TemporarilyDisconnected)
            }
            Effect::SurfaceFatalError => surface_error(inner, &CallError::ReconnectExhausted),
            // Flow effects carry payloads the dispatching site already
            // holds; it drives them itself.
            Effect::StartCapture
            | Effect::SendOfferIfClean
            | Effect::ApplyRemoteOffer
            | Effect::ApplyRemoteAnswer => {}
        }
    }
}

pub(crate) fn send_frame(inner: &Rc<RefCell<SessionInner>>, msg: &SignalMessage) {
    let json = match serde_json::to_string(msg) {
        Ok(json) => json,
        Err(e) => {
            Logger::warn(&format!("Failed to serialize frame: {}", e));
            return;
        }
    };

    let ws = inner.borrow().ws.clone();
    match ws {
        Some(ws) if ws.ready_state() == web_sys::WebSocket::OPEN => {
            if let Err(e) = ws.send_with_str(&json) {
                Logger::error(&e);
            }
        }
        _ => Logger::warn("Dropping frame: transport not open"),
    }
}

fn teardown_peer(inner: &Rc<RefCell<SessionInner>>) {
    let mut s = inner.borrow_mut();
    if let Some(pc) = s.pc.take() {
        pc.close();
    }
    s.audio_sender = None;
    s.offer_outstanding = false;
    s.candidates.reset();
}

fn close_transport(inner: &Rc<RefCell<SessionInner>>) {
    let ws = inner.borrow_mut().ws.take();
    if let Some(ws) = ws {
        // Normal closure so the server takes the clean leave path.
        let _ = ws.close_with_code(1000);
    }
}

fn set_connected(inner: &Rc<RefCell<SessionInner>>, connected: bool) {
    let callback = {
        let mut s = inner.borrow_mut();
        if s.connected == connected {
            return;
        }
        s.connected = connected;
        s.on_connected_change.clone()
    };

    if let Some(cb) = callback {
        let _ = cb.call1(&JsValue::NULL, &JsValue::from_bool(connected));
    }
}

pub(crate) fn surface_error(inner: &Rc<RefCell<SessionInner>>, err: &CallError) {
    Logger::warn(&err.to_string());
    let callback = inner.borrow().on_error.clone();
    if let Some(cb) = callback {
        let _ = cb.call1(&JsValue::NULL, &JsValue::from_str(&err.to_string()));
    }
}
