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

use std::sync::Arc;
use std::thread;

use kei_core::config::MemoryConfig;
use kei_core::memory::{BudgetedBackend, SystemBackend};
use kei_core::{List, ListError, MemoryError, MemoryTag, TaggedAllocator};

#[test]
fn test_texture_round_trip_restores_totals() {
    let allocator = TaggedAllocator::new(MemoryConfig::default());
    let before = allocator.stats();

    let block = allocator.allocate(1024, MemoryTag::Texture).unwrap();
    assert_eq!(allocator.tagged_bytes(MemoryTag::Texture), 1024);
    assert_eq!(allocator.total_allocated(), 1024);
    assert!(allocator.usage_report().contains("TEXTURE    : 1.00KiB"));

    allocator.free(block, 1024, MemoryTag::Texture);
    let after = allocator.stats();

    assert_eq!(after.tag(MemoryTag::Texture), before.tag(MemoryTag::Texture));
    assert_eq!(after.total_allocated, before.total_allocated);
    assert_eq!(after.peak_allocated, 1024);
    assert_eq!(after.live_allocations(), 0);
}

#[test]
fn test_counters_are_shared_across_threads() {
    let allocator = Arc::new(TaggedAllocator::new(MemoryConfig::default()));

    let workers: Vec<_> = MemoryTag::ALL
        .into_iter()
        .map(|tag| {
            let allocator = Arc::clone(&allocator);
            thread::spawn(move || {
                for _ in 0..50 {
                    let block = allocator.allocate(64, tag).unwrap();
                    allocator.free(block, 64, tag);
                }
                allocator.allocate(32, tag).unwrap()
            })
        })
        .collect();
    let blocks: Vec<_> = workers
        .into_iter()
        .map(|worker| worker.join().unwrap())
        .collect();

    let stats = allocator.stats();
    assert_eq!(stats.total_allocated, 32 * MemoryTag::COUNT as i64);
    for tag in MemoryTag::ALL {
        assert_eq!(stats.tag(tag), 32, "tag {tag} should hold one live block");
    }

    for (block, tag) in blocks.into_iter().zip(MemoryTag::ALL) {
        allocator.free(block, 32, tag);
    }
    assert_eq!(allocator.total_allocated(), 0);
}

#[test]
fn test_list_growth_under_a_budget_fails_cleanly() {
    // Room for the first two capacities of a u32 list, not the third.
    let header = kei_core::containers::LIST_HEADER_SIZE;
    let budget = (header + 4) + (header + 8) + 4;
    let allocator = Arc::new(TaggedAllocator::with_backend(
        BudgetedBackend::new(SystemBackend, budget),
        MemoryConfig::default(),
    ));

    let mut list = List::<u32>::new(Arc::clone(&allocator)).unwrap();
    list.push(1).unwrap();
    list.push(2).unwrap();

    let err = list.push(3).unwrap_err();
    assert!(matches!(
        err,
        ListError::Memory(MemoryError::AllocationFailed {
            tag: MemoryTag::List,
            ..
        })
    ));
    assert_eq!(list.iter().collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(list.capacity(), 2);
}
