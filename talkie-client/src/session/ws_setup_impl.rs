use crate::logger::Logger;
use crate::machine::CallEvent;
use crate::session::{SessionInner, dispatch, handle_signal_impl};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsValue;
use wasm_bindgen::prelude::Closure;
use wasm_bindgen::JsCast;
use web_sys::WebSocket;

pub(crate) fn ws_setup(inner_rc: &Rc<RefCell<SessionInner>>) -> Result<(), JsValue> {
    let url = inner_rc.borrow().config.url.clone();
    let ws = WebSocket::new(&url)?;

    let onopen_callback = {
        let inner = inner_rc.clone();
        Closure::<dyn FnMut(JsValue)>::wrap(Box::new(move |_| {
            Logger::info("Signaling transport open");
            dispatch(&inner, CallEvent::TransportOpen);
        }))
    };
    ws.set_onopen(Some(onopen_callback.as_ref().unchecked_ref()));
    onopen_callback.forget();

    let onmessage_callback = {
        let inner = inner_rc.clone();
        Closure::<dyn FnMut(web_sys::MessageEvent)>::wrap(Box::new(
            move |e: web_sys::MessageEvent| {
                if let Ok(text) = e.data().dyn_into::<js_sys::JsString>() {
                    handle_signal_impl::handle_signal(&inner, text.into());
                }
            },
        ))
    };
    ws.set_onmessage(Some(onmessage_callback.as_ref().unchecked_ref()));
    onmessage_callback.forget();

    let onclose_callback = {
        let inner = inner_rc.clone();
        Closure::<dyn FnMut(web_sys::CloseEvent)>::wrap(Box::new(move |e: web_sys::CloseEvent| {
            if inner.borrow().torn_down {
                return;
            }
            Logger::warn(&format!("Signaling transport closed (code {})", e.code()));
            dispatch(&inner, CallEvent::TransportClosed);
        }))
    };
    ws.set_onclose(Some(onclose_callback.as_ref().unchecked_ref()));
    onclose_callback.forget();

    // The close event follows every error; logging is enough here.
    let onerror_callback = Closure::<dyn FnMut(web_sys::ErrorEvent)>::wrap(Box::new(
        move |e: web_sys::ErrorEvent| {
            Logger::warn(&format!("Signaling transport error: {}", e.message()));
        },
    ));
    ws.set_onerror(Some(onerror_callback.as_ref().unchecked_ref()));
    onerror_callback.forget();

    inner_rc.borrow_mut().ws = Some(ws);
    Ok(())
}
