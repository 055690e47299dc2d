use crate::error::CallError;
use crate::logger::Logger;
use crate::session::{SessionInner, capture_impl, create_pc_impl, send_frame, surface_error};
use serde_json::{Value, json};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use web_sys::{RtcSdpType, RtcSessionDescriptionInit};

/// Creates and transmits the initial offer, but only from a clean slate:
/// never while another negotiation is in flight.
pub(crate) async fn send_offer_if_clean(inner_rc: &Rc<RefCell<SessionInner>>) {
    let pc = {
        let inner = inner_rc.borrow();
        if inner.offer_outstanding {
            return;
        }
        match inner.pc.clone() {
            Some(pc) => pc,
            None => return,
        }
    };

    if pc.signaling_state() != web_sys::RtcSignalingState::Stable {
        Logger::info("Negotiation already in progress; waiting for inbound offer");
        return;
    }

    let sdp = match create_local_description(&pc, None).await {
        Ok(sdp) => sdp,
        Err(e) => {
            Logger::error(&e);
            surface_error(inner_rc, &CallError::Negotiation("offer failed".to_string()));
            return;
        }
    };

    let room_id = inner_rc.borrow().config.room_id.clone();
    inner_rc.borrow_mut().offer_outstanding = true;
    send_frame(
        inner_rc,
        &talkie_core::SignalMessage::Offer {
            room_id,
            offer: json!({"type": "offer", "sdp": sdp}),
            from: None,
        },
    );
}

/// Responder path: capture, peer connection, remote offer in, answer out.
/// Every failure is surfaced and swallowed; negotiation must never throw
/// into the caller.
pub(crate) async fn handle_remote_offer(inner_rc: &Rc<RefCell<SessionInner>>, offer: Value) {
    let Some(sdp) = offer["sdp"].as_str().map(str::to_string) else {
        Logger::warn("Offer payload without sdp ignored");
        return;
    };

    let stream = match capture_impl::acquire_capture(inner_rc).await {
        Ok(stream) => stream,
        Err(err) => {
            surface_error(inner_rc, &err);
            return;
        }
    };

    let pc = match create_pc_impl::ensure_pc(inner_rc) {
        Ok(pc) => pc,
        Err(e) => {
            Logger::error(&e);
            return;
        }
    };

    if pc.signaling_state() != web_sys::RtcSignalingState::Stable {
        Logger::warn("Offer arrived mid-negotiation; ignored");
        return;
    }

    if let Err(e) = capture_impl::attach_local_tracks(inner_rc, &pc, &stream).await {
        Logger::error(&e);
        return;
    }

    let desc = RtcSessionDescriptionInit::new(RtcSdpType::Offer);
    desc.set_sdp(&sdp);
    if let Err(e) = JsFuture::from(pc.set_remote_description(&desc)).await {
        Logger::error(&e);
        surface_error(
            inner_rc,
            &CallError::Negotiation("remote offer rejected".to_string()),
        );
        return;
    }

    flush_candidates(inner_rc).await;

    let answer_sdp = match create_answer(&pc).await {
        Ok(sdp) => sdp,
        Err(e) => {
            Logger::error(&e);
            surface_error(inner_rc, &CallError::Negotiation("answer failed".to_string()));
            return;
        }
    };

    let room_id = inner_rc.borrow().config.room_id.clone();
    send_frame(
        inner_rc,
        &talkie_core::SignalMessage::Answer {
            room_id,
            answer: json!({"type": "answer", "sdp": answer_sdp}),
            from: None,
        },
    );
}

pub(crate) async fn handle_remote_answer(inner_rc: &Rc<RefCell<SessionInner>>, answer: Value) {
    let Some(sdp) = answer["sdp"].as_str().map(str::to_string) else {
        Logger::warn("Answer payload without sdp ignored");
        return;
    };

    let pc = match inner_rc.borrow().pc.clone() {
        Some(pc) => pc,
        None => return,
    };

    let desc = RtcSessionDescriptionInit::new(RtcSdpType::Answer);
    desc.set_sdp(&sdp);
    if let Err(e) = JsFuture::from(pc.set_remote_description(&desc)).await {
        Logger::error(&e);
        surface_error(
            inner_rc,
            &CallError::Negotiation("remote answer rejected".to_string()),
        );
        return;
    }

    inner_rc.borrow_mut().offer_outstanding = false;
    flush_candidates(inner_rc).await;
}

pub(crate) async fn apply_candidate(inner_rc: &Rc<RefCell<SessionInner>>, candidate: Value) {
    let pc = match inner_rc.borrow().pc.clone() {
        Some(pc) => pc,
        None => return,
    };

    let Some(candidate_str) = candidate["candidate"].as_str() else {
        Logger::warn("Candidate payload without candidate string ignored");
        return;
    };

    let init = web_sys::RtcIceCandidateInit::new(candidate_str);
    if let Some(mid) = candidate["sdpMid"].as_str() {
        init.set_sdp_mid(Some(mid));
    }
    if let Some(index) = candidate["sdpMLineIndex"].as_u64() {
        init.set_sdp_m_line_index(Some(index as u16));
    }

    if let Err(e) = JsFuture::from(pc.add_ice_candidate_with_opt_rtc_ice_candidate_init(Some(&init))).await
    {
        Logger::warn(&format!("Error adding ICE candidate: {:?}", e));
    }
}

/// One cheap recovery attempt before the failed-state teardown: re-offer
/// with the iceRestart flag so new candidate pairs are gathered.
pub(crate) async fn restart_ice(inner_rc: &Rc<RefCell<SessionInner>>) {
    let pc = match inner_rc.borrow().pc.clone() {
        Some(pc) => pc,
        None => return,
    };

    Logger::warn("ICE failed; attempting ICE restart");

    let options = web_sys::RtcOfferOptions::new();
    options.set_ice_restart(true);

    let sdp = match create_local_description(&pc, Some(&options)).await {
        Ok(sdp) => sdp,
        Err(e) => {
            Logger::error(&e);
            return;
        }
    };

    let room_id = inner_rc.borrow().config.room_id.clone();
    inner_rc.borrow_mut().offer_outstanding = true;
    send_frame(
        inner_rc,
        &talkie_core::SignalMessage::Offer {
            room_id,
            offer: json!({"type": "offer", "sdp": sdp}),
            from: None,
        },
    );
}

async fn flush_candidates(inner_rc: &Rc<RefCell<SessionInner>>) {
    let buffered = inner_rc.borrow_mut().candidates.remote_description_set();
    if buffered.is_empty() {
        return;
    }

    Logger::info(&format!("Flushing {} buffered ICE candidate(s)", buffered.len()));
    for candidate in buffered {
        apply_candidate(inner_rc, candidate).await;
    }
}

async fn create_local_description(
    pc: &web_sys::RtcPeerConnection,
    options: Option<&web_sys::RtcOfferOptions>,
) -> Result<String, JsValue> {
    let promise = match options {
        Some(options) => pc.create_offer_with_rtc_offer_options(options),
        None => pc.create_offer(),
    };
    let offer_val = JsFuture::from(promise).await?;
    let sdp = js_sys::Reflect::get(&offer_val, &"sdp".into())?
        .as_string()
        .ok_or_else(|| JsValue::from_str("offer without sdp"))?;

    let desc = RtcSessionDescriptionInit::new(RtcSdpType::Offer);
    desc.set_sdp(&sdp);
    JsFuture::from(pc.set_local_description(&desc)).await?;

    Ok(sdp)
}

async fn create_answer(pc: &web_sys::RtcPeerConnection) -> Result<String, JsValue> {
    let answer_val = JsFuture::from(pc.create_answer()).await?;
    let sdp = js_sys::Reflect::get(&answer_val, &"sdp".into())?
        .as_string()
        .ok_or_else(|| JsValue::from_str("answer without sdp"))?;

    let desc = RtcSessionDescriptionInit::new(RtcSdpType::Answer);
    desc.set_sdp(&sdp);
    JsFuture::from(pc.set_local_description(&desc)).await?;

    Ok(sdp)
}
