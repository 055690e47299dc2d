use crate::error::CallError;
use crate::logger::Logger;
use crate::session::SessionInner;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsValue;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{MediaStream, MediaStreamTrack};

/// Acquires the local microphone stream. Idempotent: a still-live capture
/// is reused, so a press while already recording never re-prompts.
pub(crate) async fn acquire_capture(
    inner_rc: &Rc<RefCell<SessionInner>>,
) -> Result<MediaStream, CallError> {
    if let Some(stream) = inner_rc.borrow().local_stream.clone() {
        if stream_is_live(&stream) {
            return Ok(stream);
        }
    }

    let media_devices = web_sys::window()
        .and_then(|w| w.navigator().media_devices().ok())
        .ok_or_else(|| CallError::Media("mediaDevices unavailable".to_string()))?;

    let constraints = web_sys::MediaStreamConstraints::new();
    constraints.set_audio(&JsValue::TRUE);
    constraints.set_video(&JsValue::FALSE);

    let promise = media_devices
        .get_user_media_with_constraints(&constraints)
        .map_err(|e| CallError::from_media_failure(&e))?;

    let stream = JsFuture::from(promise)
        .await
        .map_err(|e| CallError::from_media_failure(&e))?
        .dyn_into::<MediaStream>()
        .map_err(|_| CallError::Media("getUserMedia returned a non-stream".to_string()))?;

    // A permission prompt can outlive the session; a stream resolving after
    // teardown is stopped, not adopted.
    if inner_rc.borrow().torn_down {
        stop_tracks(&stream);
        return Err(CallError::Media("session closed during capture".to_string()));
    }

    inner_rc.borrow_mut().local_stream = Some(stream.clone());
    Ok(stream)
}

/// Routes the capture's audio track into the peer connection, reusing the
/// existing sender across press/release cycles.
pub(crate) async fn attach_local_tracks(
    inner_rc: &Rc<RefCell<SessionInner>>,
    pc: &web_sys::RtcPeerConnection,
    stream: &MediaStream,
) -> Result<(), JsValue> {
    let track = stream
        .get_audio_tracks()
        .get(0)
        .dyn_into::<MediaStreamTrack>()
        .map_err(|_| JsValue::from_str("capture has no audio track"))?;

    let sender = inner_rc.borrow().audio_sender.clone();
    match sender {
        Some(sender) => {
            JsFuture::from(sender.replace_track(Some(&track))).await?;
        }
        None => {
            let sender = pc.add_track(&track, stream, &js_sys::Array::new());
            inner_rc.borrow_mut().audio_sender = Some(sender);
        }
    }

    Ok(())
}

/// Push-to-talk release: stop every capture track and drop the stream. The
/// peer connection and its sender stay for the next press.
pub(crate) fn stop_capture(inner_rc: &Rc<RefCell<SessionInner>>) {
    let stream = {
        let mut inner = inner_rc.borrow_mut();
        inner.recording = false;
        inner.local_stream.take()
    };

    if let Some(stream) = stream {
        Logger::info("Stopping local capture");
        stop_tracks(&stream);
    }
}

pub(crate) fn stop_tracks(stream: &MediaStream) {
    for track in stream.get_tracks().iter() {
        if let Ok(track) = track.dyn_into::<MediaStreamTrack>() {
            track.stop();
        }
    }
}

fn stream_is_live(stream: &MediaStream) -> bool {
    stream.get_audio_tracks().iter().any(|track| {
        track
            .dyn_into::<MediaStreamTrack>()
            .map(|t| t.ready_state() == web_sys::MediaStreamTrackState::Live)
            .unwrap_or(false)
    })
}
