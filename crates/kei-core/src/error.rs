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

//! Defines the hierarchy of error types for the core subsystems.
//!
//! Errors flow upward: a [`MemoryError`] raised by the allocator becomes a
//! [`ListError`] inside a list operation, which becomes an [`EventError`] when
//! the list backs an event table.

use crate::event::EventCode;
use crate::memory::MemoryTag;
use std::fmt;

/// An error raised by the tagged allocator or its byte helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryError {
    /// The memory backend could not provide a block of the requested size.
    AllocationFailed {
        /// The number of bytes requested.
        size: usize,
        /// The category the allocation was attributed to.
        tag: MemoryTag,
    },
    /// A byte copy was given a destination too small for its source.
    SizeMismatch {
        /// Length of the destination buffer.
        destination: usize,
        /// Length of the source buffer.
        source: usize,
    },
}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryError::AllocationFailed { size, tag } => {
                write!(f, "Failed to allocate {size} bytes under tag {tag}")
            }
            MemoryError::SizeMismatch {
                destination,
                source,
            } => write!(
                f,
                "Cannot copy {source} bytes into a destination of {destination} bytes"
            ),
        }
    }
}

impl std::error::Error for MemoryError {}

/// An error raised by a generic list operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListError {
    /// The allocator failed while creating or growing the list.
    Memory(MemoryError),
    /// An index was outside `0..length`.
    IndexOutOfBounds {
        /// The offending index.
        index: usize,
        /// The list length at the time of the call.
        length: usize,
    },
    /// An element was requested from an empty list.
    Empty,
    /// An element buffer did not match the list's stride.
    StrideMismatch {
        /// The stride the list was created with.
        expected: usize,
        /// The length of the buffer that was supplied.
        actual: usize,
    },
    /// A list cannot be created with zero capacity.
    ZeroCapacity,
    /// A list cannot be created with a zero-byte stride.
    ZeroStride,
}

impl fmt::Display for ListError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListError::Memory(err) => write!(f, "List allocation failed: {err}"),
            ListError::IndexOutOfBounds { index, length } => write!(
                f,
                "Index outside the bounds of this list! Length: {length}, index: {index}"
            ),
            ListError::Empty => write!(f, "Cannot pop from an empty list."),
            ListError::StrideMismatch { expected, actual } => write!(
                f,
                "Element buffer of {actual} bytes does not match list stride of {expected} bytes"
            ),
            ListError::ZeroCapacity => write!(f, "A list needs a capacity of at least one."),
            ListError::ZeroStride => write!(f, "A list needs a stride of at least one byte."),
        }
    }
}

impl std::error::Error for ListError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ListError::Memory(err) => Some(err),
            _ => None,
        }
    }
}

impl From<MemoryError> for ListError {
    fn from(err: MemoryError) -> Self {
        ListError::Memory(err)
    }
}

/// An error raised by the event bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventError {
    /// The bus has not been initialized, or has been shut down.
    NotInitialized,
    /// `initialize` was called on a bus that is already running.
    AlreadyInitialized,
    /// The code does not fit in the bus's code table.
    CodeOutOfRange {
        /// The offending code.
        code: EventCode,
        /// The size of the code table.
        max: usize,
    },
    /// The same (listener, callback) pair is already registered for this code.
    DuplicateRegistration {
        /// The code the registration was attempted for.
        code: EventCode,
    },
    /// No matching registration exists for this code.
    NotRegistered {
        /// The code that was searched.
        code: EventCode,
    },
    /// The per-code listener list failed.
    List(ListError),
}

impl fmt::Display for EventError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventError::NotInitialized => write!(f, "The event bus is not initialized."),
            EventError::AlreadyInitialized => {
                write!(f, "The event bus is already initialized.")
            }
            EventError::CodeOutOfRange { code, max } => {
                write!(f, "Event code {code} is outside the table of {max} codes")
            }
            EventError::DuplicateRegistration { code } => {
                write!(f, "Listener/callback pair already registered for code {code}")
            }
            EventError::NotRegistered { code } => {
                write!(f, "No matching registration for code {code}")
            }
            EventError::List(err) => write!(f, "Listener table operation failed: {err}"),
        }
    }
}

impl std::error::Error for EventError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EventError::List(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ListError> for EventError {
    fn from(err: ListError) -> Self {
        EventError::List(err)
    }
}

impl From<MemoryError> for EventError {
    fn from(err: MemoryError) -> Self {
        EventError::List(ListError::Memory(err))
    }
}

/// An error raised while loading or validating a [`CoreConfig`](crate::CoreConfig).
#[derive(Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    Io(std::io::Error),
    /// The configuration text is not valid JSON for the expected schema.
    Parse(serde_json::Error),
    /// The configuration parsed but holds an unusable value.
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "Failed to read configuration: {err}"),
            ConfigError::Parse(err) => write!(f, "Failed to parse configuration: {err}"),
            ConfigError::Invalid(msg) => write!(f, "Invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Parse(err) => Some(err),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err)
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;

    #[test]
    fn list_error_display_reports_bounds() {
        let err = ListError::IndexOutOfBounds {
            index: 7,
            length: 3,
        };
        assert_eq!(
            err.to_string(),
            "Index outside the bounds of this list! Length: 3, index: 7"
        );
    }

    #[test]
    fn memory_error_chains_through_list_and_event() {
        let memory = MemoryError::AllocationFailed {
            size: 64,
            tag: MemoryTag::List,
        };
        let event: EventError = memory.into();
        assert_eq!(event, EventError::List(ListError::Memory(memory)));

        let list_source = event.source().expect("event error should have a source");
        assert!(list_source.to_string().contains("List allocation failed"));
        let memory_source = list_source.source().expect("list error should have a source");
        assert_eq!(memory_source.to_string(), "Failed to allocate 64 bytes under tag DARRAY");
    }

    #[test]
    fn config_error_wraps_parse_failures() {
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ConfigError::from(parse);
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.source().is_some());
    }
}
