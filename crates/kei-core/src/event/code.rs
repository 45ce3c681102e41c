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

use std::fmt;

/// A numeric event code.
///
/// Codes `0x00..=0xFF` are reserved for system events. Application-defined
/// codes must start at [`EventCode::USER_BASE`]; the bus does not enforce this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventCode(pub u16);

impl EventCode {
    /// Shuts the application down on the next frame.
    pub const APPLICATION_QUIT: Self = Self(0x01);

    /// Keyboard key pressed. Context: `u16[0]` = key code.
    pub const KEY_PRESSED: Self = Self(0x02);

    /// Keyboard key released. Context: `u16[0]` = key code.
    pub const KEY_RELEASED: Self = Self(0x03);

    /// Mouse button pressed. Context: `u16[0]` = button.
    pub const BUTTON_PRESSED: Self = Self(0x04);

    /// Mouse button released. Context: `u16[0]` = button.
    pub const BUTTON_RELEASED: Self = Self(0x05);

    /// Mouse moved. Context: `i16[0]` = x, `i16[1]` = y.
    pub const MOUSE_MOVED: Self = Self(0x06);

    /// Mouse wheel turned. Context: `i8[0]` = z delta.
    pub const MOUSE_WHEEL: Self = Self(0x07);

    /// Window resized by the OS. Context: `u16[0]` = width, `u16[1]` = height.
    pub const RESIZED: Self = Self(0x08);

    /// The last reserved system code.
    pub const MAX_SYSTEM: Self = Self(0xFF);

    /// First code available to applications.
    pub const USER_BASE: u16 = 0x100;

    /// Returns the application code `USER_BASE + offset`, or `None` if it
    /// overflows the 16-bit code space.
    pub const fn user(offset: u16) -> Option<Self> {
        match Self::USER_BASE.checked_add(offset) {
            Some(raw) => Some(Self(raw)),
            None => None,
        }
    }

    /// The raw code value.
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Returns `true` if the code lies in the reserved system range.
    pub const fn is_system(self) -> bool {
        self.0 <= Self::MAX_SYSTEM.0
    }
}

impl fmt::Display for EventCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

impl From<u16> for EventCode {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_and_user_ranges() {
        assert!(EventCode::RESIZED.is_system());
        assert!(EventCode::MAX_SYSTEM.is_system());

        let first_user = EventCode::user(0).unwrap();
        assert_eq!(first_user.raw(), 0x100);
        assert!(!first_user.is_system());
        assert_eq!(EventCode::user(u16::MAX), None);
    }

    #[test]
    fn displays_as_hex() {
        assert_eq!(EventCode::KEY_PRESSED.to_string(), "0x0002");
    }
}
