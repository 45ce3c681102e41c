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

use super::raw_list::{RawList, LIST_DEFAULT_CAPACITY};
use crate::error::ListError;
use crate::memory::TaggedAllocator;
use bytemuck::Pod;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// A typed view over a [`RawList`] whose stride is `size_of::<T>()`.
///
/// Elements are copied in and out by value, so `T` must be [`Pod`]. Reads go
/// through unaligned loads since elements sit right after the list header.
pub struct List<T: Pod> {
    raw: RawList,
    _marker: PhantomData<T>,
}

impl<T: Pod> List<T> {
    /// Creates a list with the default capacity of one element.
    pub fn new(allocator: Arc<TaggedAllocator>) -> Result<Self, ListError> {
        Self::with_capacity(allocator, LIST_DEFAULT_CAPACITY)
    }

    /// Creates a list with room for `capacity` elements.
    pub fn with_capacity(
        allocator: Arc<TaggedAllocator>,
        capacity: usize,
    ) -> Result<Self, ListError> {
        let raw = RawList::create(allocator, capacity, std::mem::size_of::<T>())?;
        Ok(Self {
            raw,
            _marker: PhantomData,
        })
    }

    /// Releases the list's block.
    pub fn destroy(self) {
        self.raw.destroy();
    }

    /// Appends `value`, growing the list if needed.
    pub fn push(&mut self, value: T) -> Result<(), ListError> {
        self.raw.push(bytemuck::bytes_of(&value))
    }

    /// Removes and returns the last element.
    pub fn pop(&mut self) -> Result<T, ListError> {
        let mut value = T::zeroed();
        self.raw.pop(bytemuck::bytes_of_mut(&mut value))?;
        Ok(value)
    }

    /// Removes and returns the element at `index`, preserving the order of the
    /// remaining elements.
    pub fn pop_at(&mut self, index: usize) -> Result<T, ListError> {
        let mut value = T::zeroed();
        self.raw.pop_at(index, bytemuck::bytes_of_mut(&mut value))?;
        Ok(value)
    }

    /// Inserts `value` before the element currently at `index`.
    ///
    /// See [`RawList::insert_at`] for the `index < len` requirement.
    pub fn insert_at(&mut self, index: usize, value: T) -> Result<(), ListError> {
        self.raw.insert_at(index, bytemuck::bytes_of(&value))
    }

    /// Returns a copy of the element at `index`, if it exists.
    pub fn get(&self, index: usize) -> Option<T> {
        self.raw.get(index).map(bytemuck::pod_read_unaligned)
    }

    /// Overwrites the element at `index`.
    pub fn set(&mut self, index: usize, value: T) -> Result<(), ListError> {
        let length = self.raw.len();
        let slot = self
            .raw
            .get_mut(index)
            .ok_or(ListError::IndexOutOfBounds { index, length })?;
        slot.copy_from_slice(bytemuck::bytes_of(&value));
        Ok(())
    }

    /// Iterates over copies of the elements in order.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.raw.iter().map(bytemuck::pod_read_unaligned)
    }

    /// Drops every element without releasing memory.
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Number of elements in use.
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if the list holds no elements.
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Number of element slots owned.
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }

    /// Size of one element in bytes, `size_of::<T>()`.
    pub fn stride(&self) -> usize {
        self.raw.stride()
    }

    /// The untyped list underneath.
    pub fn as_raw(&self) -> &RawList {
        &self.raw
    }
}

impl<T: Pod + fmt::Debug> fmt::Debug for List<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
