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

use super::backend::{MemoryBackend, MemoryBlock, SystemBackend};
use super::tag::MemoryTag;
use crate::config::MemoryConfig;
use crate::error::MemoryError;
use std::fmt::Write;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

const KIB: f64 = 1024.0;
const MIB: f64 = 1024.0 * 1024.0;
const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// An allocator that attributes every byte it hands out to a [`MemoryTag`].
///
/// The counters are atomics so the allocator can be shared behind an `Arc`
/// by every list and subsystem of a context. Counters are signed: freeing with
/// the wrong tag or size drives them below zero, which is logged as an error
/// but cannot be prevented since no per-block record is kept.
#[derive(Debug)]
pub struct TaggedAllocator {
    backend: Box<dyn MemoryBackend>,
    config: MemoryConfig,
    total_allocated: AtomicI64,
    peak_allocated: AtomicI64,
    allocation_count: AtomicU64,
    free_count: AtomicU64,
    tagged: [AtomicI64; MemoryTag::COUNT],
}

/// A snapshot of a [`TaggedAllocator`]'s counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryStats {
    /// Bytes currently attributed across all tags.
    pub total_allocated: i64,
    /// The highest value `total_allocated` has reached.
    pub peak_allocated: i64,
    /// Number of successful `allocate` calls.
    pub allocation_count: u64,
    /// Number of `free` calls.
    pub free_count: u64,
    /// Bytes currently attributed to each tag, indexed by [`MemoryTag::index`].
    pub tagged: [i64; MemoryTag::COUNT],
}

impl TaggedAllocator {
    /// Creates an allocator on top of the [`SystemBackend`].
    pub fn new(config: MemoryConfig) -> Self {
        Self::with_backend(SystemBackend, config)
    }

    /// Creates an allocator on top of a custom backend.
    pub fn with_backend(backend: impl MemoryBackend, config: MemoryConfig) -> Self {
        log::info!("Memory subsystem initialized.");
        Self {
            backend: Box::new(backend),
            config,
            total_allocated: AtomicI64::new(0),
            peak_allocated: AtomicI64::new(0),
            allocation_count: AtomicU64::new(0),
            free_count: AtomicU64::new(0),
            tagged: std::array::from_fn(|_| AtomicI64::new(0)),
        }
    }

    /// Allocates `size` zeroed bytes and attributes them to `tag`.
    ///
    /// If the backend cannot satisfy the request, the counters are left as
    /// they were and [`MemoryError::AllocationFailed`] is returned.
    pub fn allocate(&self, size: usize, tag: MemoryTag) -> Result<MemoryBlock, MemoryError> {
        if tag == MemoryTag::Unknown && self.config.warn_on_unknown_tag {
            log::warn!("allocate called using MemoryTag::Unknown. Re-class this allocation.");
        }

        let Some(bytes) = self.backend.allocate_zeroed(size) else {
            log::error!("Memory backend failed to provide {size} bytes for tag {tag}");
            return Err(MemoryError::AllocationFailed { size, tag });
        };

        let size = to_signed(size);
        let new_total = self.total_allocated.fetch_add(size, Ordering::Relaxed) + size;
        self.peak_allocated.fetch_max(new_total, Ordering::Relaxed);
        self.tagged[tag.index()].fetch_add(size, Ordering::Relaxed);
        self.allocation_count.fetch_add(1, Ordering::Relaxed);

        Ok(MemoryBlock::from_boxed(bytes))
    }

    /// Releases `block`, removing `size` bytes from `tag`'s total.
    ///
    /// `size` and `tag` must be the ones the block was allocated with.
    pub fn free(&self, block: MemoryBlock, size: usize, tag: MemoryTag) {
        if tag == MemoryTag::Unknown && self.config.warn_on_unknown_tag {
            log::warn!("free called using MemoryTag::Unknown. Re-class this allocation.");
        }

        let size = to_signed(size);
        let total = self.total_allocated.fetch_sub(size, Ordering::Relaxed) - size;
        let tagged = self.tagged[tag.index()].fetch_sub(size, Ordering::Relaxed) - size;
        self.free_count.fetch_add(1, Ordering::Relaxed);

        if total < 0 || tagged < 0 {
            log::error!(
                "Memory tracking counter underflowed during free! Tag: {tag}, size: {size}, \
                 tag total: {tagged}, total: {total}"
            );
        }

        self.backend.release(block.into_boxed());
    }

    /// Bytes currently attributed across all tags.
    pub fn total_allocated(&self) -> i64 {
        self.total_allocated.load(Ordering::Relaxed)
    }

    /// Bytes currently attributed to `tag`.
    pub fn tagged_bytes(&self, tag: MemoryTag) -> i64 {
        self.tagged[tag.index()].load(Ordering::Relaxed)
    }

    /// Takes a snapshot of all counters.
    pub fn stats(&self) -> MemoryStats {
        MemoryStats {
            total_allocated: self.total_allocated.load(Ordering::Relaxed),
            peak_allocated: self.peak_allocated.load(Ordering::Relaxed),
            allocation_count: self.allocation_count.load(Ordering::Relaxed),
            free_count: self.free_count.load(Ordering::Relaxed),
            tagged: std::array::from_fn(|i| self.tagged[i].load(Ordering::Relaxed)),
        }
    }

    /// Formats the per-tag breakdown of current usage.
    pub fn usage_report(&self) -> String {
        self.stats().usage_report()
    }
}

impl MemoryStats {
    /// Bytes attributed to `tag` at snapshot time.
    pub fn tag(&self, tag: MemoryTag) -> i64 {
        self.tagged[tag.index()]
    }

    /// Allocations not yet matched by a free.
    pub fn live_allocations(&self) -> i64 {
        self.allocation_count as i64 - self.free_count as i64
    }

    /// Formats one line per tag, each scaled on its own to B, KiB, MiB or GiB.
    ///
    /// ```text
    /// System memory use (tagged):
    ///   UNKNOWN    : 0.00B
    ///   DARRAY     : 1.50KiB
    ///   ...
    /// ```
    pub fn usage_report(&self) -> String {
        let mut report = String::from("System memory use (tagged):\n");
        for tag in MemoryTag::ALL {
            let (amount, unit) = scale_bytes(self.tag(tag));
            // Writing into a String cannot fail.
            let _ = writeln!(report, "  {:<11}: {amount:.2}{unit}", tag.label());
        }
        report
    }
}

/// Picks the largest binary unit that keeps the amount at or above one.
fn scale_bytes(bytes: i64) -> (f64, &'static str) {
    let magnitude = bytes.unsigned_abs() as f64;
    let value = bytes as f64;
    if magnitude >= GIB {
        (value / GIB, "GiB")
    } else if magnitude >= MIB {
        (value / MIB, "MiB")
    } else if magnitude >= KIB {
        (value / KIB, "KiB")
    } else {
        (value, "B")
    }
}

fn to_signed(size: usize) -> i64 {
    i64::try_from(size).unwrap_or(i64::MAX)
}
