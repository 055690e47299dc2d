use crate::logger::Logger;
use crate::machine::{CallEvent, Effect};
use crate::session::{SessionInner, dispatch, negotiate_impl};
use std::cell::RefCell;
use std::rc::Rc;
use talkie_core::SignalMessage;

pub(crate) fn handle_signal(inner_rc: &Rc<RefCell<SessionInner>>, text: String) {
    let msg: SignalMessage = match serde_json::from_str(&text) {
        Ok(msg) => msg,
        Err(e) => {
            Logger::warn(&format!("Signal parse error: {}", e));
            return;
        }
    };

    match msg {
        SignalMessage::Joined { room_size, .. } => {
            Logger::info(&format!("Joined room ({} present)", room_size));
            inner_rc.borrow_mut().room_size = room_size;
            dispatch(inner_rc, CallEvent::JoinAccepted { room_size });
        }

        SignalMessage::UserJoined { user_id, room_size } => {
            Logger::info(&format!("{} joined ({} present)", user_id, room_size));
            inner_rc.borrow_mut().room_size = room_size;
        }

        SignalMessage::UserLeft { user_id, room_size } => {
            Logger::info(&format!("{} left ({} present)", user_id, room_size));
            inner_rc.borrow_mut().room_size = room_size;
        }

        SignalMessage::Offer { offer, from, .. } => {
            let effects = dispatch(inner_rc, CallEvent::OfferReceived);
            if effects.contains(&Effect::ApplyRemoteOffer) {
                let inner = inner_rc.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    negotiate_impl::handle_remote_offer(&inner, offer).await;
                });
            } else {
                // Perfect-negotiation collision: both sides offered. Drop
                // the inbound one; ours is already on the wire.
                Logger::warn(&format!(
                    "Ignoring colliding offer from {:?}",
                    from.map(|u| u.to_string())
                ));
            }
        }

        SignalMessage::Answer { answer, .. } => {
            let effects = dispatch(inner_rc, CallEvent::AnswerReceived);
            if effects.contains(&Effect::ApplyRemoteAnswer) {
                let inner = inner_rc.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    negotiate_impl::handle_remote_answer(&inner, answer).await;
                });
            } else {
                Logger::warn("Ignoring answer with no offer outstanding");
            }
        }

        SignalMessage::IceCandidate { candidate, .. } => {
            let ready = inner_rc.borrow_mut().candidates.accept(candidate);
            match ready {
                Some(candidate) => {
                    let inner = inner_rc.clone();
                    wasm_bindgen_futures::spawn_local(async move {
                        negotiate_impl::apply_candidate(&inner, candidate).await;
                    });
                }
                None => Logger::info("Buffered ICE candidate until remote description"),
            }
        }

        SignalMessage::Error { message } => {
            Logger::warn(&format!("Server error: {}", message));
        }

        // Client-bound traffic only; join/leave never arrive here.
        other => Logger::warn(&format!("Unexpected frame: {:?}", other)),
    }
}
