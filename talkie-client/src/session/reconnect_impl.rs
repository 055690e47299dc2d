use crate::config::CONNECT_TIMEOUT_MS;
use crate::logger::Logger;
use crate::machine::{CallEvent, CallPhase};
use crate::session::{SessionInner, dispatch};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::Closure;

/// Arms the next reconnect attempt. A no-op while torn down or while a
/// timer is already pending; exhausting the budget dispatches the fatal
/// path instead.
pub(crate) fn schedule_reconnect(inner_rc: &Rc<RefCell<SessionInner>>) {
    let delay = {
        let mut inner = inner_rc.borrow_mut();
        if inner.torn_down || inner.reconnect_timer.is_some() {
            return;
        }
        inner.backoff.next_delay()
    };

    let Some(delay) = delay else {
        dispatch(inner_rc, CallEvent::ReconnectExhausted);
        return;
    };

    let attempt = inner_rc.borrow().backoff.attempts();
    Logger::warn(&format!(
        "Reconnect attempt {} in {}ms",
        attempt,
        delay.as_millis()
    ));

    let callback = {
        let inner = inner_rc.clone();
        Closure::once(move || {
            inner.borrow_mut().reconnect_timer = None;
            if inner.borrow().torn_down {
                return;
            }
            dispatch(&inner, CallEvent::ReconnectFired);
        })
    };

    match set_timeout(&callback, delay.as_millis() as i32) {
        Ok(id) => {
            inner_rc.borrow_mut().reconnect_timer = Some(id);
            callback.forget();
        }
        Err(_) => Logger::warn("Failed to arm reconnect timer"),
    }
}

pub(crate) fn cancel_reconnect(inner_rc: &Rc<RefCell<SessionInner>>) {
    let id = inner_rc.borrow_mut().reconnect_timer.take();
    if let Some(id) = id {
        clear_timeout(id);
    }
}

/// Bounds the initial transport connect. If the socket has not opened by
/// the deadline the attempt is abandoned and the backoff path takes over.
pub(crate) fn start_connect_timer(inner_rc: &Rc<RefCell<SessionInner>>) {
    cancel_connect_timer(inner_rc);

    let callback = {
        let inner = inner_rc.clone();
        Closure::once(move || {
            inner.borrow_mut().connect_timer = None;
            let still_connecting = {
                let s = inner.borrow();
                !s.torn_down && s.state.phase == CallPhase::ConnectingTransport
            };
            if !still_connecting {
                return;
            }

            Logger::warn("Signaling connect timed out");
            let ws = inner.borrow_mut().ws.take();
            if let Some(ws) = ws {
                let _ = ws.close();
            }
            dispatch(&inner, CallEvent::ConnectTimeout);
        })
    };

    match set_timeout(&callback, CONNECT_TIMEOUT_MS) {
        Ok(id) => {
            inner_rc.borrow_mut().connect_timer = Some(id);
            callback.forget();
        }
        Err(_) => Logger::warn("Failed to arm connect timer"),
    }
}

pub(crate) fn cancel_connect_timer(inner_rc: &Rc<RefCell<SessionInner>>) {
    let id = inner_rc.borrow_mut().connect_timer.take();
    if let Some(id) = id {
        clear_timeout(id);
    }
}

// Closure::once hands back a Closure<dyn FnMut()> despite the FnOnce bound.
fn set_timeout(callback: &Closure<dyn FnMut()>, millis: i32) -> Result<i32, ()> {
    web_sys::window()
        .ok_or(())?
        .set_timeout_with_callback_and_timeout_and_arguments_0(
            callback.as_ref().unchecked_ref(),
            millis,
        )
        .map_err(|_| ())
}

fn clear_timeout(id: i32) {
    if let Some(window) = web_sys::window() {
        window.clear_timeout_with_handle(id);
    }
}
