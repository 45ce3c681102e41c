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

//! Tagged memory allocation and accounting.
//!
//! Every allocation made through a [`TaggedAllocator`] is attributed to exactly
//! one [`MemoryTag`] and must be freed with the same tag and the same size. The
//! allocator keeps running sums only; it does not remember individual blocks.
//!
//! The raw allocation itself is delegated to a [`MemoryBackend`], the seam
//! between the core and the platform layer.

mod allocator;
mod backend;
mod tag;

pub use allocator::{MemoryStats, TaggedAllocator};
pub use backend::{BudgetedBackend, MemoryBackend, MemoryBlock, SystemBackend};
pub use tag::MemoryTag;

use crate::error::MemoryError;

/// Sets every byte of `bytes` to zero.
pub fn zero(bytes: &mut [u8]) {
    bytes.fill(0);
}

/// Copies `source` into the front of `destination`.
///
/// Fails with [`MemoryError::SizeMismatch`] if `destination` is shorter than
/// `source`. Bytes past `source.len()` are left untouched.
pub fn copy(destination: &mut [u8], source: &[u8]) -> Result<(), MemoryError> {
    let available = destination.len();
    let target = destination
        .get_mut(..source.len())
        .ok_or(MemoryError::SizeMismatch {
            destination: available,
            source: source.len(),
        })?;
    target.copy_from_slice(source);
    Ok(())
}

/// Sets every byte of `bytes` to `value`.
pub fn set(bytes: &mut [u8], value: u8) {
    bytes.fill(value);
}
