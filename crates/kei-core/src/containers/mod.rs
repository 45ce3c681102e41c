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

//! Growable containers built on the [`TaggedAllocator`](crate::TaggedAllocator).
//!
//! [`RawList`] is the type-erased list: one allocation holding a fixed header
//! (`capacity`, `length`, `stride`) followed by the element bytes. [`List`] is
//! the typed view over it for `Pod` element types.
//!
//! Memory layout of a list's single block:
//!
//! ```text
//! +----------+--------+--------+---------------------------------------+
//! | capacity | length | stride | capacity * stride element bytes       |
//! |   u64    |  u64   |  u64   |                                       |
//! +----------+--------+--------+---------------------------------------+
//! ```

mod list;
mod raw_list;

pub use list::List;
pub use raw_list::{RawList, LIST_DEFAULT_CAPACITY, LIST_HEADER_SIZE, LIST_RESIZE_FACTOR};
