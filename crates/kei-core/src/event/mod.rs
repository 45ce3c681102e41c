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

//! Synchronous event dispatch.
//!
//! Events are identified by a 16-bit [`EventCode`] and carry a fixed 16-byte
//! [`EventContext`]. Callbacks are registered per code on an [`EventBus`] and
//! invoked in registration order when the code is fired, until one of them
//! reports the event as handled.

mod bus;
mod code;
mod context;
mod listener;

pub use self::bus::{EventBus, QueuedEvent};
pub use self::code::EventCode;
pub use self::context::EventContext;
pub use self::listener::{
    handler, Event, EventHandler, ListenerId, SenderId, Subscription, SubscriptionId,
};
