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

use bytemuck::{Pod, Zeroable};

/// The fixed 128-bit payload carried by every event.
///
/// The same sixteen bytes can be read as pairs of 64-bit values, quads of
/// 32-bit values, octets of 16-bit values or sixteen bytes. Which view a code
/// uses is agreed between the sender and its listeners; the bus never looks
/// inside.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct EventContext {
    data: [u8; 16],
}

macro_rules! context_views {
    ($($from:ident, $view:ident => [$ty:ty; $n:literal];)*) => {
        impl EventContext {
            $(
                #[doc = concat!("Builds a context from `", stringify!($n), "` `", stringify!($ty), "` values.")]
                pub fn $from(values: [$ty; $n]) -> Self {
                    Self { data: bytemuck::cast(values) }
                }

                #[doc = concat!("Reads the context as `", stringify!($n), "` `", stringify!($ty), "` values.")]
                pub fn $view(&self) -> [$ty; $n] {
                    bytemuck::cast(self.data)
                }
            )*
        }
    };
}

context_views! {
    from_i64, as_i64 => [i64; 2];
    from_u64, as_u64 => [u64; 2];
    from_f64, as_f64 => [f64; 2];
    from_i32, as_i32 => [i32; 4];
    from_u32, as_u32 => [u32; 4];
    from_f32, as_f32 => [f32; 4];
    from_i16, as_i16 => [i16; 8];
    from_u16, as_u16 => [u16; 8];
    from_i8, as_i8 => [i8; 16];
}

impl EventContext {
    /// Size of the payload in bytes.
    pub const SIZE: usize = 16;

    /// Builds a context from raw bytes.
    pub const fn from_bytes(data: [u8; Self::SIZE]) -> Self {
        Self { data }
    }

    /// The raw bytes.
    pub const fn as_bytes(&self) -> &[u8; Self::SIZE] {
        &self.data
    }

    /// A context whose first `u16` is `value` and the rest zero.
    pub fn with_u16(value: u16) -> Self {
        let mut values = [0u16; 8];
        values[0] = value;
        Self::from_u16(values)
    }
}
