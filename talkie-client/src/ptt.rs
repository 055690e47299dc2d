//! Push-to-talk on top of a [`CallSession`]: hold to transmit, release to
//! stop. Guards against key repeat and overlapping presses.

use crate::logger::Logger;
use crate::session::CallSession;
use std::cell::Cell;
use std::rc::Rc;
use wasm_bindgen::JsValue;

#[derive(Clone)]
pub struct PushToTalkController {
    session: CallSession,
    pressed: Rc<Cell<bool>>,
    press_in_flight: Rc<Cell<bool>>,
}

impl PushToTalkController {
    pub fn new(session: CallSession) -> Self {
        Self {
            session,
            pressed: Rc::new(Cell::new(false)),
            press_in_flight: Rc::new(Cell::new(false)),
        }
    }

    /// Whether a press would currently do anything. Disabled until the
    /// signaling transport is up and the room join has been accepted.
    pub fn is_enabled(&self) -> bool {
        self.session.is_transport_connected()
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed.get()
    }

    /// Key-down path. Capture acquisition is async, so a second press
    /// arriving before the first resolves (key repeat does this) is
    /// dropped rather than stacked.
    pub async fn press(&self) -> Result<(), JsValue> {
        if self.pressed.get() || self.press_in_flight.get() {
            return Ok(());
        }
        if !self.is_enabled() {
            return Err(JsValue::from_str("not connected to a room"));
        }

        self.press_in_flight.set(true);
        let result = self.session.start_talking().await;
        self.press_in_flight.set(false);

        match result {
            Ok(()) => {
                self.pressed.set(true);
                Ok(())
            }
            Err(e) => {
                Logger::warn("Push-to-talk press failed");
                Err(e)
            }
        }
    }

    /// Key-up path. Ignores releases with no matching press.
    pub fn release(&self) {
        if !self.pressed.get() {
            return;
        }
        self.pressed.set(false);
        self.session.stop_talking();
    }
}
