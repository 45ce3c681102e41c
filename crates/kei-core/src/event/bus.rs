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

use super::code::EventCode;
use super::context::EventContext;
use super::listener::{
    handler_address, Event, EventHandler, ListenerId, SenderId, Subscription, SubscriptionId,
};
use crate::config::EventBusConfig;
use crate::containers::List;
use crate::error::EventError;
use crate::memory::TaggedAllocator;
use bytemuck::{Pod, Zeroable};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroU64;
use std::rc::Rc;
use std::sync::Arc;

/// One entry of a per-code listener list.
///
/// Stored by value inside a [`List`], so every field is a plain integer. A
/// `listener` of zero means the registration was made without a listener.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
struct Registration {
    listener: u64,
    handler: u64,
    subscription: u64,
}

impl Registration {
    fn matches(&self, listener: Option<ListenerId>, handler: &EventHandler) -> bool {
        self.listener == listener.map_or(0, ListenerId::get)
            && self.handler == handler_address(handler)
    }
}

/// An event waiting in the cross-thread queue until the next [`EventBus::pump`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueuedEvent {
    /// The code to fire.
    pub code: EventCode,
    /// The sender to report to listeners.
    pub sender: Option<SenderId>,
    /// The payload.
    pub context: EventContext,
}

impl QueuedEvent {
    /// A queued event with no sender.
    pub fn new(code: EventCode, context: EventContext) -> Self {
        Self {
            code,
            sender: None,
            context,
        }
    }
}

struct BusState {
    initialized: bool,
    registered: Vec<Option<List<Registration>>>,
    handlers: HashMap<SubscriptionId, EventHandler>,
    next_subscription: NonZeroU64,
}

impl BusState {
    fn new() -> Self {
        Self {
            initialized: false,
            registered: Vec::new(),
            handlers: HashMap::new(),
            next_subscription: NonZeroU64::MIN,
        }
    }
}

fn next_subscription(counter: &mut NonZeroU64) -> SubscriptionId {
    let id = *counter;
    *counter = id.checked_add(1).unwrap_or(NonZeroU64::MIN);
    SubscriptionId::from(id)
}

/// A synchronous publish/subscribe bus keyed by 16-bit event codes.
///
/// Each code owns a lazily created [`List`] of registrations, allocated through
/// the bus's [`TaggedAllocator`] and therefore counted under
/// [`MemoryTag::List`](crate::memory::MemoryTag::List). [`fire`](Self::fire)
/// runs the callbacks on the calling thread in registration order and stops at
/// the first one that reports the event as handled.
///
/// Only the per-code lists go through the allocator. The code table itself and
/// the handler map are ordinary heap allocations and do not show up in the
/// usage report.
///
/// The bus is confined to its dispatch thread. Other threads post events
/// through [`sender`](Self::sender); they are dispatched by
/// [`pump`](Self::pump).
///
/// Callbacks may fire further events from inside a dispatch. Nothing bounds the
/// recursion: a callback that fires the code it is handling will overflow the
/// stack.
pub struct EventBus {
    allocator: Arc<TaggedAllocator>,
    config: EventBusConfig,
    state: RefCell<BusState>,
    sender: flume::Sender<QueuedEvent>,
    receiver: flume::Receiver<QueuedEvent>,
}

impl EventBus {
    /// Creates an uninitialized bus. Call [`initialize`](Self::initialize)
    /// before registering or firing.
    pub fn new(allocator: Arc<TaggedAllocator>, config: EventBusConfig) -> Self {
        let (sender, receiver) = flume::unbounded();
        Self {
            allocator,
            config,
            state: RefCell::new(BusState::new()),
            sender,
            receiver,
        }
    }

    /// Brings the bus up with an empty code table.
    ///
    /// Fails with [`EventError::AlreadyInitialized`] if the bus is running, in
    /// which case nothing changes.
    pub fn initialize(&self) -> Result<(), EventError> {
        let mut state = self.state.borrow_mut();
        if state.initialized {
            log::warn!("Event subsystem is already initialized.");
            return Err(EventError::AlreadyInitialized);
        }

        state.registered = std::iter::repeat_with(|| None)
            .take(self.config.max_codes)
            .collect();
        state.initialized = true;
        log::info!(
            "Event subsystem initialized with {} codes.",
            self.config.max_codes
        );
        Ok(())
    }

    /// Releases every listener list and returns to the uninitialized state.
    ///
    /// Events still waiting in the queue are discarded.
    pub fn shutdown(&self) {
        let mut state = self.state.borrow_mut();
        if !state.initialized {
            log::warn!("Event subsystem shutdown requested but it is not running.");
            return;
        }

        for list in state.registered.drain(..).flatten() {
            list.destroy();
        }
        state.handlers.clear();
        state.initialized = false;

        let discarded = self.receiver.drain().count();
        if discarded > 0 {
            log::debug!("Discarded {discarded} queued events on shutdown.");
        }
        log::info!("Event subsystem shut down.");
    }

    /// Returns `true` between `initialize` and `shutdown`.
    pub fn is_initialized(&self) -> bool {
        self.state.borrow().initialized
    }

    /// Registers `handler` for `code` on behalf of `listener`.
    ///
    /// The first registration for a code creates its list. Registering the same
    /// (listener, handler) pair twice for a code is rejected with
    /// [`EventError::DuplicateRegistration`].
    pub fn register(
        &self,
        code: EventCode,
        listener: Option<ListenerId>,
        handler: &EventHandler,
    ) -> Result<Subscription, EventError> {
        let mut state = self.state.borrow_mut();
        if !state.initialized {
            return Err(EventError::NotInitialized);
        }
        let slot = self.slot(code)?;

        let state = &mut *state;
        let entry = &mut state.registered[slot];
        let list = match entry {
            Some(list) => list,
            None => entry.insert(List::with_capacity(
                Arc::clone(&self.allocator),
                self.config.listener_capacity,
            )?),
        };

        if list.iter().any(|entry| entry.matches(listener, handler)) {
            log::warn!("Listener {listener:?} is already registered for event {code}.");
            return Err(EventError::DuplicateRegistration { code });
        }

        let id = next_subscription(&mut state.next_subscription);
        list.push(Registration {
            listener: listener.map_or(0, ListenerId::get),
            handler: handler_address(handler),
            subscription: id.get(),
        })?;
        state.handlers.insert(id, Rc::clone(handler));

        log::trace!("Registered subscription {} for event {code}.", id.get());
        Ok(Subscription { code, id })
    }

    /// Removes the first registration of (`listener`, `handler`) for `code`.
    ///
    /// The order of the remaining registrations is preserved. Fails with
    /// [`EventError::NotRegistered`] if there is no such registration, leaving
    /// the list untouched.
    pub fn unregister(
        &self,
        code: EventCode,
        listener: Option<ListenerId>,
        handler: &EventHandler,
    ) -> Result<(), EventError> {
        self.remove_where(code, |entry| entry.matches(listener, handler))
    }

    /// Removes the registration that produced `subscription`.
    pub fn unsubscribe(&self, subscription: Subscription) -> Result<(), EventError> {
        let id = subscription.id.get();
        self.remove_where(subscription.code, |entry| entry.subscription == id)
    }

    fn remove_where(
        &self,
        code: EventCode,
        predicate: impl Fn(&Registration) -> bool,
    ) -> Result<(), EventError> {
        let mut state = self.state.borrow_mut();
        if !state.initialized {
            return Err(EventError::NotInitialized);
        }
        let slot = self.slot(code)?;

        let Some(list) = state.registered[slot].as_mut() else {
            return Err(EventError::NotRegistered { code });
        };
        let Some(position) = list.iter().position(|entry| predicate(&entry)) else {
            return Err(EventError::NotRegistered { code });
        };

        let removed = list.pop_at(position)?;
        if let Some(id) = SubscriptionId::new(removed.subscription) {
            state.handlers.remove(&id);
        }
        log::trace!("Unregistered subscription {} from event {code}.", removed.subscription);
        Ok(())
    }

    /// Fires `code` synchronously.
    ///
    /// Callbacks run in registration order until one returns `true`. Returns
    /// whether the event was handled; `Ok(false)` if nobody is registered.
    ///
    /// The set of callbacks is captured when the call starts: registrations
    /// made or removed by a callback take effect from the next `fire`.
    pub fn fire(
        &self,
        code: EventCode,
        sender: Option<SenderId>,
        context: EventContext,
    ) -> Result<bool, EventError> {
        let snapshot: Vec<(Option<ListenerId>, EventHandler)> = {
            let state = self.state.borrow();
            if !state.initialized {
                return Err(EventError::NotInitialized);
            }
            let slot = self.slot(code)?;

            let Some(list) = &state.registered[slot] else {
                log::trace!("Event {code} fired with no listeners.");
                return Ok(false);
            };
            list.iter()
                .filter_map(|entry| {
                    let handler = state.handlers.get(&SubscriptionId::new(entry.subscription)?)?;
                    Some((ListenerId::new(entry.listener), Rc::clone(handler)))
                })
                .collect()
        };

        for (listener, handler) in snapshot {
            let event = Event {
                code,
                sender,
                listener,
                context,
            };
            if handler(self, &event) {
                log::trace!("Event {code} handled by {listener:?}.");
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Number of registrations for `code`. Zero when the bus is down or the
    /// code is out of range.
    pub fn listener_count(&self, code: EventCode) -> usize {
        let state = self.state.borrow();
        state
            .registered
            .get(usize::from(code.raw()))
            .and_then(Option::as_ref)
            .map_or(0, List::len)
    }

    /// Returns a clone of the queue's sending end.
    ///
    /// The sender is `Send` and can be moved to other threads; what it sends
    /// is dispatched by [`pump`](Self::pump).
    pub fn sender(&self) -> flume::Sender<QueuedEvent> {
        self.sender.clone()
    }

    /// Queues an event for the next [`pump`](Self::pump).
    pub fn post(&self, event: QueuedEvent) {
        log::trace!("Posting event {}.", event.code);
        if let Err(e) = self.sender.send(event) {
            log::error!("Failed to queue event: {e}. Receiver likely disconnected.");
        }
    }

    /// Number of events waiting in the queue.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// Fires every event queued before this call and returns how many were
    /// dispatched.
    ///
    /// Events posted by callbacks during the pump wait for the next one. If a
    /// fire fails, the error is returned and the events after it stay queued.
    pub fn pump(&self) -> Result<usize, EventError> {
        if !self.is_initialized() {
            return Err(EventError::NotInitialized);
        }

        let pending = self.receiver.len();
        let mut dispatched = 0;
        for event in self.receiver.try_iter().take(pending) {
            self.fire(event.code, event.sender, event.context)?;
            dispatched += 1;
        }
        Ok(dispatched)
    }

    fn slot(&self, code: EventCode) -> Result<usize, EventError> {
        let slot = usize::from(code.raw());
        let max = self.config.max_codes;
        if slot >= max {
            log::error!("Event code {code} is outside the table of {max} codes.");
            return Err(EventError::CodeOutOfRange { code, max });
        }
        Ok(slot)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        let codes_in_use = state.registered.iter().flatten().count();
        f.debug_struct("EventBus")
            .field("initialized", &state.initialized)
            .field("max_codes", &self.config.max_codes)
            .field("codes_in_use", &codes_in_use)
            .field("subscriptions", &state.handlers.len())
            .field("pending", &self.receiver.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryConfig;
    use crate::event::listener::handler;
    use crate::memory::{BudgetedBackend, MemoryTag, SystemBackend};
    use std::cell::{Cell, RefCell};
    use std::thread;

    const PING: EventCode = EventCode(0x100);

    fn allocator() -> Arc<TaggedAllocator> {
        Arc::new(TaggedAllocator::new(MemoryConfig::default()))
    }

    fn running_bus() -> EventBus {
        let bus = EventBus::new(allocator(), EventBusConfig::default());
        bus.initialize().unwrap();
        bus
    }

    fn listener(raw: u64) -> Option<ListenerId> {
        ListenerId::new(raw)
    }

    #[test]
    fn lifecycle() {
        let bus = EventBus::new(allocator(), EventBusConfig::default());
        assert!(!bus.is_initialized());
        assert_eq!(
            bus.fire(PING, None, EventContext::default()),
            Err(EventError::NotInitialized)
        );

        bus.initialize().unwrap();
        assert_eq!(bus.initialize(), Err(EventError::AlreadyInitialized));
        assert!(bus.is_initialized());

        bus.shutdown();
        assert!(!bus.is_initialized());
        bus.initialize().unwrap();
    }

    #[test]
    fn register_before_initialize_fails() {
        let bus = EventBus::new(allocator(), EventBusConfig::default());
        let h = handler(|_, _| true);
        assert_eq!(
            bus.register(PING, None, &h).unwrap_err(),
            EventError::NotInitialized
        );
    }

    #[test]
    fn lists_are_created_lazily_under_the_list_tag() {
        let alloc = allocator();
        let bus = EventBus::new(Arc::clone(&alloc), EventBusConfig::default());
        bus.initialize().unwrap();
        assert_eq!(alloc.tagged_bytes(MemoryTag::List), 0);

        let h = handler(|_, _| false);
        bus.register(PING, listener(1), &h).unwrap();
        assert!(alloc.tagged_bytes(MemoryTag::List) > 0);
        assert_eq!(bus.listener_count(PING), 1);

        bus.shutdown();
        assert_eq!(alloc.tagged_bytes(MemoryTag::List), 0);
    }

    #[test]
    fn duplicate_pair_is_rejected() {
        let bus = running_bus();
        let h = handler(|_, _| false);

        bus.register(PING, listener(7), &h).unwrap();
        assert_eq!(
            bus.register(PING, listener(7), &Rc::clone(&h)).unwrap_err(),
            EventError::DuplicateRegistration { code: PING }
        );
        assert_eq!(bus.listener_count(PING), 1);

        // Same callback under another listener is a separate registration.
        bus.register(PING, listener(8), &h).unwrap();
        assert_eq!(bus.listener_count(PING), 2);
    }

    #[test]
    fn dispatch_stops_at_first_handler_that_handles() {
        let bus = running_bus();
        let calls = Rc::new(RefCell::new(Vec::new()));

        for (id, handles) in [(1, false), (2, true), (3, false)] {
            let calls = Rc::clone(&calls);
            let h = handler(move |_, event| {
                calls.borrow_mut().push(event.listener.map(ListenerId::get));
                handles
            });
            bus.register(PING, listener(id), &h).unwrap();
        }

        assert_eq!(bus.fire(PING, None, EventContext::default()), Ok(true));
        assert_eq!(*calls.borrow(), vec![Some(1), Some(2)]);
    }

    #[test]
    fn code_table_and_handlers_are_not_tagged() {
        let alloc = allocator();
        let bus = EventBus::new(Arc::clone(&alloc), EventBusConfig::default());
        bus.initialize().unwrap();
        assert_eq!(alloc.total_allocated(), 0);

        let h = handler(|_, _| false);
        bus.register(PING, None, &h).unwrap();
        assert_eq!(
            alloc.total_allocated(),
            alloc.tagged_bytes(MemoryTag::List)
        );
    }

    #[test]
    fn fire_without_listeners_is_not_handled() {
        let bus = running_bus();
        assert_eq!(bus.fire(PING, None, EventContext::default()), Ok(false));
    }

    #[test]
    fn handler_sees_sender_and_payload() {
        let bus = running_bus();
        let seen = Rc::new(Cell::new(None));
        let seen_in = Rc::clone(&seen);
        let h = handler(move |_, event| {
            seen_in.set(Some((event.sender, event.context.as_u16()[0])));
            true
        });
        bus.register(EventCode::RESIZED, None, &h).unwrap();

        let sender = SenderId::new(99);
        bus.fire(EventCode::RESIZED, sender, EventContext::with_u16(640))
            .unwrap();
        assert_eq!(seen.get(), Some((sender, 640)));
    }

    #[test]
    fn unregister_preserves_order_and_rejects_missing() {
        let bus = running_bus();
        let order = Rc::new(RefCell::new(Vec::new()));
        let handlers: Vec<EventHandler> = (1..=3)
            .map(|id| {
                let order = Rc::clone(&order);
                handler(move |_, _| {
                    order.borrow_mut().push(id);
                    false
                })
            })
            .collect();
        for (id, h) in (1..).zip(&handlers) {
            bus.register(PING, listener(id), h).unwrap();
        }

        bus.unregister(PING, listener(2), &handlers[1]).unwrap();
        assert_eq!(
            bus.unregister(PING, listener(2), &handlers[1]),
            Err(EventError::NotRegistered { code: PING })
        );
        assert_eq!(bus.listener_count(PING), 2);

        bus.fire(PING, None, EventContext::default()).unwrap();
        assert_eq!(*order.borrow(), vec![1, 3]);
    }

    #[test]
    fn unregister_on_unused_code_fails() {
        let bus = running_bus();
        let h = handler(|_, _| true);
        assert_eq!(
            bus.unregister(EventCode::KEY_PRESSED, None, &h),
            Err(EventError::NotRegistered {
                code: EventCode::KEY_PRESSED
            })
        );
    }

    #[test]
    fn unsubscribe_by_token() {
        let bus = running_bus();
        let h = handler(|_, _| true);
        let subscription = bus.register(PING, None, &h).unwrap();

        bus.unsubscribe(subscription).unwrap();
        assert_eq!(bus.listener_count(PING), 0);
        assert_eq!(bus.fire(PING, None, EventContext::default()), Ok(false));
        assert!(bus.unsubscribe(subscription).is_err());
    }

    #[test]
    fn codes_beyond_the_table_are_rejected() {
        let config = EventBusConfig {
            max_codes: 0x200,
            ..EventBusConfig::default()
        };
        let bus = EventBus::new(allocator(), config);
        bus.initialize().unwrap();

        let h = handler(|_, _| true);
        let code = EventCode(0x200);
        assert_eq!(
            bus.register(code, None, &h).unwrap_err(),
            EventError::CodeOutOfRange { code, max: 0x200 }
        );
        assert_eq!(bus.listener_count(code), 0);
    }

    #[test]
    fn handlers_can_fire_reentrantly() {
        let bus = running_bus();
        let quit = Rc::new(Cell::new(false));

        let quit_in = Rc::clone(&quit);
        let on_quit = handler(move |_, _| {
            quit_in.set(true);
            true
        });
        let on_key = handler(|bus, event| {
            if event.context.as_u16()[0] == 0x1B {
                bus.fire(EventCode::APPLICATION_QUIT, None, EventContext::default())
                    .unwrap_or(false)
            } else {
                false
            }
        });
        bus.register(EventCode::APPLICATION_QUIT, None, &on_quit)
            .unwrap();
        bus.register(EventCode::KEY_PRESSED, None, &on_key).unwrap();

        let handled = bus
            .fire(EventCode::KEY_PRESSED, None, EventContext::with_u16(0x1B))
            .unwrap();
        assert!(handled);
        assert!(quit.get());
    }

    #[test]
    fn registrations_made_during_dispatch_apply_to_the_next_fire() {
        let bus = running_bus();
        let late_calls = Rc::new(Cell::new(0));

        let late_calls_in = Rc::clone(&late_calls);
        let late = handler(move |_, _| {
            late_calls_in.set(late_calls_in.get() + 1);
            false
        });
        let registrar = handler(move |bus, _| {
            let _ = bus.register(PING, None, &late);
            false
        });
        bus.register(PING, listener(1), &registrar).unwrap();

        bus.fire(PING, None, EventContext::default()).unwrap();
        assert_eq!(late_calls.get(), 0);
        assert_eq!(bus.listener_count(PING), 2);

        bus.fire(PING, None, EventContext::default()).unwrap();
        assert_eq!(late_calls.get(), 1);
    }

    #[test]
    fn queued_events_from_other_threads_are_pumped() {
        let bus = running_bus();
        let sizes = Rc::new(RefCell::new(Vec::new()));
        let sizes_in = Rc::clone(&sizes);
        let h = handler(move |_, event| {
            let [width, height, ..] = event.context.as_u16();
            sizes_in.borrow_mut().push((width, height));
            true
        });
        bus.register(EventCode::RESIZED, None, &h).unwrap();

        let sender = bus.sender();
        thread::spawn(move || {
            for width in [800u16, 1024] {
                let context = EventContext::from_u16([width, 600, 0, 0, 0, 0, 0, 0]);
                sender
                    .send(QueuedEvent::new(EventCode::RESIZED, context))
                    .unwrap();
            }
        })
        .join()
        .unwrap();

        assert_eq!(bus.pending(), 2);
        assert_eq!(bus.pump(), Ok(2));
        assert_eq!(*sizes.borrow(), vec![(800, 600), (1024, 600)]);
        assert_eq!(bus.pump(), Ok(0));
    }

    #[test]
    fn shutdown_discards_queued_events() {
        let bus = running_bus();
        bus.post(QueuedEvent::new(PING, EventContext::default()));
        bus.shutdown();
        assert_eq!(bus.pending(), 0);
        assert_eq!(bus.pump(), Err(EventError::NotInitialized));
    }

    #[test]
    fn list_allocation_failure_surfaces_as_error() {
        let alloc = Arc::new(TaggedAllocator::with_backend(
            BudgetedBackend::new(SystemBackend, 8),
            MemoryConfig::default(),
        ));
        let bus = EventBus::new(alloc, EventBusConfig::default());
        bus.initialize().unwrap();

        let h = handler(|_, _| true);
        let err = bus.register(PING, None, &h).unwrap_err();
        assert!(matches!(err, EventError::List(_)));
        assert_eq!(bus.listener_count(PING), 0);
    }
}
