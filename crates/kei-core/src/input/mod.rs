// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Keyboard and mouse state, fed by the platform layer.
//!
//! The platform reports raw transitions through the `process_*` methods. Each
//! change is stored and fired on the [`EventBus`] right away; the previous
//! frame's state is kept so callers can detect edges after [`InputState::update`].

use crate::error::EventError;
use crate::event::{EventBus, EventCode, EventContext};

/// A keyboard key, identified by its virtual-key code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key(pub u8);

#[allow(missing_docs)]
impl Key {
    pub const BACKSPACE: Self = Self(0x08);
    pub const TAB: Self = Self(0x09);
    pub const ENTER: Self = Self(0x0D);
    pub const SHIFT: Self = Self(0x10);
    pub const CONTROL: Self = Self(0x11);
    pub const ALT: Self = Self(0x12);
    pub const ESCAPE: Self = Self(0x1B);
    pub const SPACE: Self = Self(0x20);
    pub const LEFT: Self = Self(0x25);
    pub const UP: Self = Self(0x26);
    pub const RIGHT: Self = Self(0x27);
    pub const DOWN: Self = Self(0x28);
    pub const A: Self = Self(0x41);
    pub const D: Self = Self(0x44);
    pub const S: Self = Self(0x53);
    pub const W: Self = Self(0x57);
    pub const F1: Self = Self(0x70);
}

/// A mouse button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    /// Primary button.
    Left = 0,
    /// Secondary button.
    Right = 1,
    /// Wheel button.
    Middle = 2,
}

impl Button {
    /// Number of tracked buttons.
    pub const COUNT: usize = 3;

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct KeyboardState {
    keys: [bool; 256],
}

impl Default for KeyboardState {
    fn default() -> Self {
        Self { keys: [false; 256] }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct MouseState {
    x: i16,
    y: i16,
    buttons: [bool; Button::COUNT],
}

/// Current and previous-frame input state.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    keyboard_current: KeyboardState,
    keyboard_previous: KeyboardState,
    mouse_current: MouseState,
    mouse_previous: MouseState,
}

impl InputState {
    /// All keys and buttons up, cursor at the origin.
    pub fn new() -> Self {
        log::info!("Input subsystem initialized.");
        Self::default()
    }

    /// Ends the frame: the current state becomes the previous state.
    pub fn update(&mut self) {
        self.keyboard_previous = self.keyboard_current;
        self.mouse_previous = self.mouse_current;
    }

    /// Records a key transition and fires `KEY_PRESSED` or `KEY_RELEASED` if
    /// the key's state changed.
    pub fn process_key(&mut self, bus: &EventBus, key: Key, pressed: bool) -> Result<(), EventError> {
        let slot = &mut self.keyboard_current.keys[usize::from(key.0)];
        if *slot == pressed {
            return Ok(());
        }
        *slot = pressed;

        let code = if pressed {
            EventCode::KEY_PRESSED
        } else {
            EventCode::KEY_RELEASED
        };
        bus.fire(code, None, EventContext::with_u16(u16::from(key.0)))?;
        Ok(())
    }

    /// Records a button transition and fires `BUTTON_PRESSED` or
    /// `BUTTON_RELEASED` if the button's state changed.
    pub fn process_button(
        &mut self,
        bus: &EventBus,
        button: Button,
        pressed: bool,
    ) -> Result<(), EventError> {
        let slot = &mut self.mouse_current.buttons[button.index()];
        if *slot == pressed {
            return Ok(());
        }
        *slot = pressed;

        let code = if pressed {
            EventCode::BUTTON_PRESSED
        } else {
            EventCode::BUTTON_RELEASED
        };
        bus.fire(code, None, EventContext::with_u16(button as u16))?;
        Ok(())
    }

    /// Records the cursor position and fires `MOUSE_MOVED` if it changed.
    pub fn process_mouse_move(&mut self, bus: &EventBus, x: i16, y: i16) -> Result<(), EventError> {
        if (self.mouse_current.x, self.mouse_current.y) == (x, y) {
            return Ok(());
        }
        log::debug!("Mouse position: {x}, {y}");
        self.mouse_current.x = x;
        self.mouse_current.y = y;

        let context = EventContext::from_i16([x, y, 0, 0, 0, 0, 0, 0]);
        bus.fire(EventCode::MOUSE_MOVED, None, context)?;
        Ok(())
    }

    /// Fires `MOUSE_WHEEL` with the delta reduced to its sign.
    ///
    /// The wheel has no stored state.
    pub fn process_mouse_wheel(&mut self, bus: &EventBus, z_delta: i32) -> Result<(), EventError> {
        let mut values = [0i8; 16];
        values[0] = z_delta.signum() as i8;
        bus.fire(EventCode::MOUSE_WHEEL, None, EventContext::from_i8(values))?;
        Ok(())
    }

    /// Returns `true` if `key` is held this frame.
    pub fn is_key_down(&self, key: Key) -> bool {
        self.keyboard_current.keys[usize::from(key.0)]
    }

    /// Returns `true` if `key` is released this frame.
    pub fn is_key_up(&self, key: Key) -> bool {
        !self.is_key_down(key)
    }

    /// Returns `true` if `key` was held last frame.
    pub fn was_key_down(&self, key: Key) -> bool {
        self.keyboard_previous.keys[usize::from(key.0)]
    }

    /// Returns `true` if `key` was released last frame.
    pub fn was_key_up(&self, key: Key) -> bool {
        !self.was_key_down(key)
    }

    /// Returns `true` if `button` is held this frame.
    pub fn is_button_down(&self, button: Button) -> bool {
        self.mouse_current.buttons[button.index()]
    }

    /// Returns `true` if `button` is released this frame.
    pub fn is_button_up(&self, button: Button) -> bool {
        !self.is_button_down(button)
    }

    /// Returns `true` if `button` was held last frame.
    pub fn was_button_down(&self, button: Button) -> bool {
        self.mouse_previous.buttons[button.index()]
    }

    /// Returns `true` if `button` was released last frame.
    pub fn was_button_up(&self, button: Button) -> bool {
        !self.was_button_down(button)
    }

    /// The cursor position this frame.
    pub fn mouse_position(&self) -> (i16, i16) {
        (self.mouse_current.x, self.mouse_current.y)
    }

    /// The cursor position last frame.
    pub fn previous_mouse_position(&self) -> (i16, i16) {
        (self.mouse_previous.x, self.mouse_previous.y)
    }
}
