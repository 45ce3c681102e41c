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

//! Raw memory backends used by the [`TaggedAllocator`](super::TaggedAllocator).

use std::fmt::Debug;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};

/// An owned, zero-initialised block of bytes handed out by a [`MemoryBackend`].
///
/// The block does not know which tag it was allocated under; the caller must
/// free it with the same tag and size it was allocated with.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct MemoryBlock {
    bytes: Box<[u8]>,
}

impl MemoryBlock {
    /// Wraps bytes produced by a backend.
    pub fn from_boxed(bytes: Box<[u8]>) -> Self {
        Self { bytes }
    }

    /// Returns the backing bytes to the backend.
    pub fn into_boxed(self) -> Box<[u8]> {
        self.bytes
    }
}

impl Deref for MemoryBlock {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.bytes
    }
}

impl DerefMut for MemoryBlock {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

/// The platform seam for raw allocation.
///
/// Implementations return `None` when memory is exhausted instead of aborting,
/// so the failure can travel up as a [`MemoryError`](crate::MemoryError).
pub trait MemoryBackend: Send + Sync + Debug + 'static {
    /// Allocates `size` zeroed bytes, or returns `None` if the request cannot
    /// be satisfied.
    fn allocate_zeroed(&self, size: usize) -> Option<Box<[u8]>>;

    /// Releases a block previously returned by [`allocate_zeroed`](Self::allocate_zeroed).
    fn release(&self, block: Box<[u8]>) {
        drop(block);
    }
}

/// Backend on top of the process's global allocator.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBackend;

impl MemoryBackend for SystemBackend {
    fn allocate_zeroed(&self, size: usize) -> Option<Box<[u8]>> {
        let mut bytes = Vec::new();
        bytes.try_reserve_exact(size).ok()?;
        bytes.resize(size, 0);
        Some(bytes.into_boxed_slice())
    }
}

/// A wrapper around another backend that refuses allocations past a fixed
/// byte budget.
///
/// Useful for running a subsystem under a hard memory ceiling, and for
/// exercising allocation-failure paths.
#[derive(Debug)]
pub struct BudgetedBackend<B = SystemBackend> {
    inner: B,
    budget: usize,
    in_use: AtomicUsize,
}

impl<B> BudgetedBackend<B> {
    /// Wraps `inner` with a ceiling of `budget` live bytes.
    pub const fn new(inner: B, budget: usize) -> Self {
        Self {
            inner,
            budget,
            in_use: AtomicUsize::new(0),
        }
    }

    /// Bytes currently handed out through this backend.
    pub fn in_use(&self) -> usize {
        self.in_use.load(Ordering::Relaxed)
    }

    /// The configured ceiling.
    pub fn budget(&self) -> usize {
        self.budget
    }
}

impl<B: MemoryBackend> MemoryBackend for BudgetedBackend<B> {
    fn allocate_zeroed(&self, size: usize) -> Option<Box<[u8]>> {
        let budget = self.budget;
        self.in_use
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                current.checked_add(size).filter(|&total| total <= budget)
            })
            .ok()?;

        let block = self.inner.allocate_zeroed(size);
        if block.is_none() {
            self.in_use.fetch_sub(size, Ordering::Relaxed);
        }
        block
    }

    fn release(&self, block: Box<[u8]>) {
        self.in_use.fetch_sub(block.len(), Ordering::Relaxed);
        self.inner.release(block);
    }
}
