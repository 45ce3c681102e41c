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

//! # Kei Core
//!
//! Foundation layer of the engine. Everything above it (window, input polling,
//! the application loop) calls into three pieces:
//!
//! * [`memory`]: a tagged allocator that attributes every byte to a category.
//! * [`containers`]: a header-prefixed, type-erased growable list built on the
//!   tagged allocator, with a typed view for `Pod` elements.
//! * [`event`]: a synchronous event bus whose per-code listener tables are lists.
//!
//! [`input`] and [`config`] are the thin glue that feeds and configures them.

#![warn(missing_docs)]

pub mod config;
pub mod containers;
pub mod error;
pub mod event;
pub mod input;
pub mod memory;

pub use config::CoreConfig;
pub use containers::{List, RawList};
pub use error::{ConfigError, EventError, ListError, MemoryError};
pub use event::{EventBus, EventCode, EventContext, EventHandler};
pub use input::{Button, InputState, Key};
pub use memory::{MemoryTag, TaggedAllocator};
