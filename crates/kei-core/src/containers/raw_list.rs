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

use crate::error::{ListError, MemoryError};
use crate::memory::{self, MemoryBlock, MemoryTag, TaggedAllocator};
use bytemuck::{Pod, Zeroable};
use std::fmt;
use std::ops::Range;
use std::slice::ChunksExact;
use std::sync::Arc;

/// Capacity used when a list is created without an explicit one.
pub const LIST_DEFAULT_CAPACITY: usize = 1;

/// Capacity multiplier applied on every resize.
pub const LIST_RESIZE_FACTOR: usize = 2;

/// Size in bytes of the header that precedes a list's elements.
pub const LIST_HEADER_SIZE: usize = std::mem::size_of::<ListHeader>();

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct ListHeader {
    capacity: u64,
    length: u64,
    stride: u64,
}

/// A type-erased growable list of fixed-stride elements.
///
/// The header and the element buffer live in one block allocated under
/// [`MemoryTag::List`]. Growth doubles the capacity by allocating a fresh
/// block, copying the used elements and releasing the old one; the list never
/// shrinks on its own. Dropping the list (or calling [`destroy`](Self::destroy))
/// releases the block with the exact size it was allocated with.
///
/// Every element access is bounds-checked and every element buffer must be
/// exactly `stride` bytes long.
pub struct RawList {
    allocator: Arc<TaggedAllocator>,
    block: MemoryBlock,
}

impl RawList {
    /// Creates a list with room for `capacity` elements of `stride` bytes.
    pub fn create(
        allocator: Arc<TaggedAllocator>,
        capacity: usize,
        stride: usize,
    ) -> Result<Self, ListError> {
        if capacity == 0 {
            return Err(ListError::ZeroCapacity);
        }
        if stride == 0 {
            return Err(ListError::ZeroStride);
        }

        let size = region_size(capacity, stride)?;
        let block = allocator.allocate(size, MemoryTag::List)?;
        let mut list = Self { allocator, block };
        list.write_header(ListHeader {
            capacity: capacity as u64,
            length: 0,
            stride: stride as u64,
        });
        Ok(list)
    }

    /// Releases the list's block.
    ///
    /// Equivalent to dropping the list; spelled out for call sites that want
    /// the release to be visible.
    pub fn destroy(self) {
        drop(self);
    }

    /// Number of elements in use.
    pub fn len(&self) -> usize {
        self.header().length as usize
    }

    /// Returns `true` if the list holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of element slots owned.
    pub fn capacity(&self) -> usize {
        self.header().capacity as usize
    }

    /// Size of one element in bytes.
    pub fn stride(&self) -> usize {
        self.header().stride as usize
    }

    /// Total size of the list's block, header included.
    pub fn allocated_bytes(&self) -> usize {
        self.block.len()
    }

    /// Appends `value`, doubling the capacity first if the list is full.
    pub fn push(&mut self, value: &[u8]) -> Result<(), ListError> {
        self.check_stride(value.len())?;

        let length = self.len();
        if length >= self.capacity() {
            self.resize()?;
        }

        let slot = self.slot(length);
        self.block[slot].copy_from_slice(value);
        self.set_length(length + 1);
        Ok(())
    }

    /// Removes the last element and copies it into `dest`.
    pub fn pop(&mut self, dest: &mut [u8]) -> Result<(), ListError> {
        self.check_stride(dest.len())?;

        let length = self.len();
        if length == 0 {
            return Err(ListError::Empty);
        }

        let slot = self.slot(length - 1);
        memory::copy(dest, &self.block[slot])?;
        self.set_length(length - 1);
        Ok(())
    }

    /// Removes the element at `index`, copying it into `dest` and shifting the
    /// following elements down by one slot.
    ///
    /// An out-of-range `index` is logged and leaves the list unchanged.
    pub fn pop_at(&mut self, index: usize, dest: &mut [u8]) -> Result<(), ListError> {
        self.check_stride(dest.len())?;

        let length = self.len();
        if index >= length {
            log::error!("Index outside the bounds of this list! Length: {length}, index: {index}");
            return Err(ListError::IndexOutOfBounds { index, length });
        }

        let slot = self.slot(index);
        memory::copy(dest, &self.block[slot.clone()])?;

        if index + 1 < length {
            let tail = self.slot(index + 1).start..self.slot(length - 1).end;
            self.block.copy_within(tail, slot.start);
        }

        self.set_length(length - 1);
        Ok(())
    }

    /// Inserts `value` at `index`, shifting the element at `index` and every
    /// element after it up by one slot.
    ///
    /// `index` must address an existing element (`index < len`). Appending
    /// through `insert_at(len, ..)` is rejected; use [`push`](Self::push).
    pub fn insert_at(&mut self, index: usize, value: &[u8]) -> Result<(), ListError> {
        self.check_stride(value.len())?;

        let length = self.len();
        if index >= length {
            log::error!("Index outside the bounds of this list! Length: {length}, index: {index}");
            return Err(ListError::IndexOutOfBounds { index, length });
        }

        if length >= self.capacity() {
            self.resize()?;
        }

        let slot = self.slot(index);
        let tail = slot.start..self.slot(length - 1).end;
        let shifted = self.slot(index + 1).start;
        self.block.copy_within(tail, shifted);
        self.block[slot].copy_from_slice(value);
        self.set_length(length + 1);
        Ok(())
    }

    /// Moves the elements into a fresh block with double the capacity and
    /// releases the old block.
    pub fn resize(&mut self) -> Result<(), ListError> {
        let header = self.header();
        let capacity = header.capacity as usize;
        let stride = header.stride as usize;
        let length = header.length as usize;

        let new_capacity = capacity
            .checked_mul(LIST_RESIZE_FACTOR)
            .ok_or(MemoryError::AllocationFailed {
                size: usize::MAX,
                tag: MemoryTag::List,
            })?;

        let mut resized = Self::create(Arc::clone(&self.allocator), new_capacity, stride)?;
        let used = LIST_HEADER_SIZE..LIST_HEADER_SIZE + length * stride;
        resized.block[used.clone()].copy_from_slice(&self.block[used]);
        resized.set_length(length);

        log::trace!("Resized list from {capacity} to {new_capacity} slots of {stride} bytes.");

        // The old block ends up in `resized` and is released when it drops.
        std::mem::swap(self, &mut resized);
        Ok(())
    }

    /// Drops every element without releasing memory.
    pub fn clear(&mut self) {
        self.set_length(0);
    }

    /// Returns the bytes of the element at `index`, if it exists.
    pub fn get(&self, index: usize) -> Option<&[u8]> {
        (index < self.len()).then(|| &self.block[self.slot(index)])
    }

    /// Returns the mutable bytes of the element at `index`, if it exists.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut [u8]> {
        if index < self.len() {
            let slot = self.slot(index);
            Some(&mut self.block[slot])
        } else {
            None
        }
    }

    /// Iterates over the element bytes in order.
    pub fn iter(&self) -> ChunksExact<'_, u8> {
        let header = self.header();
        let used = LIST_HEADER_SIZE..LIST_HEADER_SIZE + (header.length * header.stride) as usize;
        self.block[used].chunks_exact(header.stride as usize)
    }

    fn header(&self) -> ListHeader {
        bytemuck::pod_read_unaligned(&self.block[..LIST_HEADER_SIZE])
    }

    fn write_header(&mut self, header: ListHeader) {
        self.block[..LIST_HEADER_SIZE].copy_from_slice(bytemuck::bytes_of(&header));
    }

    fn set_length(&mut self, length: usize) {
        let mut header = self.header();
        header.length = length as u64;
        self.write_header(header);
    }

    fn slot(&self, index: usize) -> Range<usize> {
        let stride = self.stride();
        let start = LIST_HEADER_SIZE + index * stride;
        start..start + stride
    }

    fn check_stride(&self, actual: usize) -> Result<(), ListError> {
        let expected = self.stride();
        if actual == expected {
            Ok(())
        } else {
            Err(ListError::StrideMismatch { expected, actual })
        }
    }
}

impl Drop for RawList {
    fn drop(&mut self) {
        let size = self.block.len();
        let block = std::mem::take(&mut self.block);
        self.allocator.free(block, size, MemoryTag::List);
    }
}

impl fmt::Debug for RawList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header = self.header();
        f.debug_struct("RawList")
            .field("capacity", &header.capacity)
            .field("length", &header.length)
            .field("stride", &header.stride)
            .finish()
    }
}

fn region_size(capacity: usize, stride: usize) -> Result<usize, MemoryError> {
    capacity
        .checked_mul(stride)
        .and_then(|bytes| bytes.checked_add(LIST_HEADER_SIZE))
        .ok_or(MemoryError::AllocationFailed {
            size: usize::MAX,
            tag: MemoryTag::List,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryConfig;
    use crate::memory::{BudgetedBackend, SystemBackend};

    fn allocator() -> Arc<TaggedAllocator> {
        Arc::new(TaggedAllocator::new(MemoryConfig::default()))
    }

    fn list_of(alloc: &Arc<TaggedAllocator>, values: &[u32]) -> RawList {
        let mut list = RawList::create(Arc::clone(alloc), 1, 4).unwrap();
        for value in values {
            list.push(&value.to_ne_bytes()).unwrap();
        }
        list
    }

    fn contents(list: &RawList) -> Vec<u32> {
        list.iter()
            .map(|bytes| u32::from_ne_bytes(bytes.try_into().unwrap()))
            .collect()
    }

    #[test]
    fn create_accounts_header_and_elements_under_list_tag() {
        let alloc = allocator();
        let list = RawList::create(Arc::clone(&alloc), 4, 8).unwrap();

        assert_eq!(list.len(), 0);
        assert_eq!(list.capacity(), 4);
        assert_eq!(list.stride(), 8);
        assert_eq!(list.allocated_bytes(), LIST_HEADER_SIZE + 32);
        assert_eq!(alloc.tagged_bytes(MemoryTag::List), (LIST_HEADER_SIZE + 32) as i64);

        list.destroy();
        assert_eq!(alloc.tagged_bytes(MemoryTag::List), 0);
        assert_eq!(alloc.total_allocated(), 0);
    }

    #[test]
    fn header_is_three_words() {
        assert_eq!(LIST_HEADER_SIZE, 24);
    }

    #[test]
    fn create_rejects_zero_capacity_and_stride() {
        let alloc = allocator();
        assert_eq!(
            RawList::create(Arc::clone(&alloc), 0, 4).unwrap_err(),
            ListError::ZeroCapacity
        );
        assert_eq!(
            RawList::create(Arc::clone(&alloc), 4, 0).unwrap_err(),
            ListError::ZeroStride
        );
        assert_eq!(alloc.total_allocated(), 0);
    }

    #[test]
    fn push_doubles_capacity_when_full() {
        let alloc = allocator();
        let mut list = list_of(&alloc, &[1]);
        assert_eq!(list.capacity(), 1);

        list.push(&2u32.to_ne_bytes()).unwrap();
        assert_eq!(list.capacity(), 2);
        list.push(&3u32.to_ne_bytes()).unwrap();
        assert_eq!(list.capacity(), 4);

        assert_eq!(contents(&list), vec![1, 2, 3]);
        assert_eq!(
            alloc.tagged_bytes(MemoryTag::List),
            (LIST_HEADER_SIZE + 4 * 4) as i64
        );
    }

    #[test]
    fn push_rejects_wrong_stride() {
        let alloc = allocator();
        let mut list = list_of(&alloc, &[]);
        assert_eq!(
            list.push(&[1, 2]),
            Err(ListError::StrideMismatch {
                expected: 4,
                actual: 2
            })
        );
        assert!(list.is_empty());
    }

    #[test]
    fn pop_returns_last_and_empty_is_an_error() {
        let alloc = allocator();
        let mut list = list_of(&alloc, &[10, 20]);
        let mut out = [0u8; 4];

        list.pop(&mut out).unwrap();
        assert_eq!(u32::from_ne_bytes(out), 20);
        list.pop(&mut out).unwrap();
        assert_eq!(u32::from_ne_bytes(out), 10);
        assert_eq!(list.pop(&mut out), Err(ListError::Empty));
    }

    #[test]
    fn pop_at_closes_the_gap() {
        let alloc = allocator();
        let mut list = list_of(&alloc, &[1, 2, 3, 4, 5]);
        let mut out = [0u8; 4];

        list.pop_at(1, &mut out).unwrap();
        assert_eq!(u32::from_ne_bytes(out), 2);
        assert_eq!(contents(&list), vec![1, 3, 4, 5]);

        list.pop_at(3, &mut out).unwrap();
        assert_eq!(u32::from_ne_bytes(out), 5);
        assert_eq!(contents(&list), vec![1, 3, 4]);
    }

    #[test]
    fn pop_at_out_of_bounds_leaves_list_unchanged() {
        let alloc = allocator();
        let mut list = list_of(&alloc, &[1, 2]);
        let mut out = [7u8; 4];

        assert_eq!(
            list.pop_at(2, &mut out),
            Err(ListError::IndexOutOfBounds {
                index: 2,
                length: 2
            })
        );
        assert_eq!(out, [7; 4]);
        assert_eq!(contents(&list), vec![1, 2]);
    }

    #[test]
    fn insert_at_shifts_following_elements() {
        let alloc = allocator();
        let mut list = list_of(&alloc, &[1, 2, 3]);

        list.insert_at(0, &9u32.to_ne_bytes()).unwrap();
        assert_eq!(contents(&list), vec![9, 1, 2, 3]);

        list.insert_at(3, &8u32.to_ne_bytes()).unwrap();
        assert_eq!(contents(&list), vec![9, 1, 2, 8, 3]);
        assert_eq!(list.capacity(), 8);
    }

    #[test]
    fn insert_at_length_is_rejected() {
        let alloc = allocator();
        let mut list = list_of(&alloc, &[1]);
        assert_eq!(
            list.insert_at(1, &2u32.to_ne_bytes()),
            Err(ListError::IndexOutOfBounds {
                index: 1,
                length: 1
            })
        );
        assert_eq!(contents(&list), vec![1]);
    }

    #[test]
    fn resize_keeps_elements_and_releases_old_block() {
        let alloc = allocator();
        let mut list = list_of(&alloc, &[4, 5, 6]);
        assert_eq!(list.capacity(), 4);

        list.resize().unwrap();
        assert_eq!(list.capacity(), 8);
        assert_eq!(contents(&list), vec![4, 5, 6]);
        assert_eq!(
            alloc.tagged_bytes(MemoryTag::List),
            (LIST_HEADER_SIZE + 8 * 4) as i64
        );
    }

    #[test]
    fn failed_resize_keeps_the_list_intact() {
        let budget = LIST_HEADER_SIZE + 2 * 4;
        let alloc = Arc::new(TaggedAllocator::with_backend(
            BudgetedBackend::new(SystemBackend, budget),
            MemoryConfig::default(),
        ));
        let mut list = RawList::create(Arc::clone(&alloc), 2, 4).unwrap();
        list.push(&1u32.to_ne_bytes()).unwrap();
        list.push(&2u32.to_ne_bytes()).unwrap();

        let err = list.push(&3u32.to_ne_bytes()).unwrap_err();
        assert!(matches!(err, ListError::Memory(MemoryError::AllocationFailed { .. })));
        assert_eq!(contents(&list), vec![1, 2]);
        assert_eq!(list.capacity(), 2);
    }

    #[test]
    fn get_is_bounds_checked() {
        let alloc = allocator();
        let mut list = list_of(&alloc, &[1, 2]);

        assert_eq!(list.get(1), Some(&2u32.to_ne_bytes()[..]));
        assert_eq!(list.get(2), None);

        list.get_mut(0).unwrap().copy_from_slice(&7u32.to_ne_bytes());
        assert!(list.get_mut(5).is_none());
        assert_eq!(contents(&list), vec![7, 2]);
    }

    #[test]
    fn clear_keeps_capacity() {
        let alloc = allocator();
        let mut list = list_of(&alloc, &[1, 2, 3]);
        list.clear();
        assert!(list.is_empty());
        assert_eq!(list.capacity(), 4);
        assert_eq!(list.iter().count(), 0);
    }
}
