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

//! Identities used by the event bus: listeners, senders and subscriptions.

use super::bus::EventBus;
use super::code::EventCode;
use super::context::EventContext;
use std::num::NonZeroU64;
use std::rc::Rc;

macro_rules! object_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(NonZeroU64);

        impl $name {
            /// Wraps a raw id. Zero is reserved for "absent" and yields `None`.
            pub const fn new(raw: u64) -> Option<Self> {
                match NonZeroU64::new(raw) {
                    Some(id) => Some(Self(id)),
                    None => None,
                }
            }

            /// The raw, non-zero id.
            pub const fn get(self) -> u64 {
                self.0.get()
            }
        }

        impl From<NonZeroU64> for $name {
            fn from(id: NonZeroU64) -> Self {
                Self(id)
            }
        }
    };
}

object_id! {
    /// Opaque identity of the object a callback is registered on behalf of.
    ///
    /// Together with the callback it forms the key used to reject duplicate
    /// registrations and to target `unregister`.
    ListenerId
}

object_id! {
    /// Opaque identity of the object that fired an event.
    SenderId
}

object_id! {
    /// Token returned by a successful registration.
    SubscriptionId
}

/// A registration handle: the code it was made for and its token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription {
    /// The code the handler listens to.
    pub code: EventCode,
    /// The registration's token.
    pub id: SubscriptionId,
}

/// Everything a handler receives when an event is dispatched to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    /// The code that was fired.
    pub code: EventCode,
    /// The sender passed to `fire`, if any.
    pub sender: Option<SenderId>,
    /// The listener this handler was registered with, if any.
    pub listener: Option<ListenerId>,
    /// The payload.
    pub context: EventContext,
}

/// A shared event callback.
///
/// Returning `true` marks the event as handled and stops it from reaching the
/// remaining listeners. The bus is passed in so a handler can fire further
/// events.
///
/// Callback identity is the `Rc` allocation: registering two clones of the same
/// handler under the same listener is a duplicate, registering two separately
/// created handlers is not.
pub type EventHandler = Rc<dyn Fn(&EventBus, &Event) -> bool>;

/// Wraps a closure into an [`EventHandler`].
pub fn handler<F>(callback: F) -> EventHandler
where
    F: Fn(&EventBus, &Event) -> bool + 'static,
{
    Rc::new(callback)
}

/// The address that identifies a handler for duplicate detection.
pub(crate) fn handler_address(handler: &EventHandler) -> u64 {
    Rc::as_ptr(handler).cast::<()>() as usize as u64
}
