use crate::config::{DEFAULT_STUN_ADDR, DEFAULT_STUN_ADDR_2};
use crate::logger::Logger;
use crate::machine::CallEvent;
use crate::session::{SessionInner, dispatch, send_frame};
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsValue;
use wasm_bindgen::prelude::Closure;
use wasm_bindgen::JsCast;

/// Returns the session's peer connection, creating and wiring it on first
/// use. The connection outlives individual push-to-talk presses.
pub(crate) fn ensure_pc(
    inner_rc: &Rc<RefCell<SessionInner>>,
) -> Result<web_sys::RtcPeerConnection, JsValue> {
    if let Some(pc) = inner_rc.borrow().pc.clone() {
        return Ok(pc);
    }

    let rtc_config = web_sys::RtcConfiguration::new();
    let ice_servers_arr = js_sys::Array::new();

    let configured = inner_rc.borrow().config.ice_servers.clone();
    if configured.is_empty() {
        let stun_urls = js_sys::Array::new();
        stun_urls.push(&JsValue::from_str(DEFAULT_STUN_ADDR));
        stun_urls.push(&JsValue::from_str(DEFAULT_STUN_ADDR_2));

        let stun_server = web_sys::RtcIceServer::new();
        stun_server.set_urls(&stun_urls);
        ice_servers_arr.push(&stun_server);
    } else {
        for server_config in &configured {
            let ice_server = web_sys::RtcIceServer::new();

            let urls = js_sys::Array::new();
            for url in &server_config.urls {
                urls.push(&JsValue::from_str(url));
            }
            ice_server.set_urls(&urls);

            if let Some(username) = &server_config.username {
                ice_server.set_username(username);
            }
            if let Some(credential) = &server_config.credential {
                ice_server.set_credential(credential);
            }

            ice_servers_arr.push(&ice_server);
        }
    }

    rtc_config.set_ice_servers(&ice_servers_arr);

    let pc = web_sys::RtcPeerConnection::new_with_configuration(&rtc_config)?;

    let onice = {
        let inner = inner_rc.clone();
        Closure::wrap(Box::new(move |ev: web_sys::RtcPeerConnectionIceEvent| {
            if let Some(candidate) = ev.candidate() {
                let room_id = inner.borrow().config.room_id.clone();
                send_frame(
                    &inner,
                    &talkie_core::SignalMessage::IceCandidate {
                        room_id,
                        candidate: json!({
                            "candidate": candidate.candidate(),
                            "sdpMid": candidate.sdp_mid(),
                            "sdpMLineIndex": candidate.sdp_m_line_index(),
                        }),
                        from: None,
                    },
                );
            }
        }) as Box<dyn FnMut(web_sys::RtcPeerConnectionIceEvent)>)
    };
    pc.set_onicecandidate(Some(onice.as_ref().unchecked_ref()));
    onice.forget();

    let onstate = {
        let inner = inner_rc.clone();
        let pc = pc.clone();
        Closure::wrap(Box::new(move |_: JsValue| {
            let state = pc.connection_state();
            Logger::info(&format!("Peer connection state: {:?}", state));
            match state {
                web_sys::RtcPeerConnectionState::Connected => {
                    dispatch(&inner, CallEvent::PeerConnected);
                }
                web_sys::RtcPeerConnectionState::Disconnected => {
                    dispatch(&inner, CallEvent::PeerDisconnected);
                }
                web_sys::RtcPeerConnectionState::Failed => {
                    dispatch(&inner, CallEvent::PeerFailed);
                }
                _ => {}
            }
        }) as Box<dyn FnMut(JsValue)>)
    };
    pc.set_onconnectionstatechange(Some(onstate.as_ref().unchecked_ref()));
    onstate.forget();

    let onicestate = {
        let inner = inner_rc.clone();
        let pc = pc.clone();
        Closure::wrap(Box::new(move |_: JsValue| {
            if pc.ice_connection_state() == web_sys::RtcIceConnectionState::Failed {
                dispatch(&inner, CallEvent::IceFailed);
            }
        }) as Box<dyn FnMut(JsValue)>)
    };
    pc.set_oniceconnectionstatechange(Some(onicestate.as_ref().unchecked_ref()));
    onicestate.forget();

    let ontrack = {
        let inner = inner_rc.clone();
        Closure::wrap(Box::new(move |ev: web_sys::RtcTrackEvent| {
            Logger::info("Remote audio track arrived");
            let callback = inner.borrow().on_remote_stream.clone();
            if let Some(cb) = callback {
                if let Some(stream) = ev.streams().get(0).dyn_ref::<web_sys::MediaStream>() {
                    let _ = cb.call1(&JsValue::NULL, stream);
                }
            }
        }) as Box<dyn FnMut(web_sys::RtcTrackEvent)>)
    };
    pc.set_ontrack(Some(ontrack.as_ref().unchecked_ref()));
    ontrack.forget();

    inner_rc.borrow_mut().pc = Some(pc.clone());
    Ok(pc)
}
