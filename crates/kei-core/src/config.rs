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

//! Configuration for the core subsystems.
//!
//! Every field has a default, so a config file only needs to name the values
//! it overrides:
//!
//! ```json
//! { "events": { "max_codes": 1024 } }
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The default number of event codes in a bus's code table.
pub const DEFAULT_MAX_EVENT_CODES: usize = 16384;

/// The size of the full 16-bit event code space.
pub const EVENT_CODE_SPACE: usize = 1 << 16;

/// Top-level configuration for the core.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Tagged allocator settings.
    pub memory: MemoryConfig,
    /// Event bus settings.
    pub events: EventBusConfig,
}

/// Settings for the [`TaggedAllocator`](crate::TaggedAllocator).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Log a warning whenever memory is allocated or freed under
    /// [`MemoryTag::Unknown`](crate::MemoryTag::Unknown).
    pub warn_on_unknown_tag: bool,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            warn_on_unknown_tag: true,
        }
    }
}

/// Settings for the [`EventBus`](crate::EventBus).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventBusConfig {
    /// Number of entries in the code table. Codes at or above this value are
    /// rejected.
    pub max_codes: usize,
    /// Initial capacity of a per-code listener list.
    pub listener_capacity: usize,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            max_codes: DEFAULT_MAX_EVENT_CODES,
            listener_capacity: 1,
        }
    }
}

impl CoreConfig {
    /// Parses and validates a configuration from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: CoreConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&text)?;
        log::info!("Loaded core configuration from '{}'.", path.display());
        Ok(config)
    }

    /// Checks that every value is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let events = &self.events;
        if events.max_codes == 0 || events.max_codes > EVENT_CODE_SPACE {
            return Err(ConfigError::Invalid(format!(
                "events.max_codes must be within 1..={EVENT_CODE_SPACE}, got {}",
                events.max_codes
            )));
        }
        if events.listener_capacity == 0 {
            return Err(ConfigError::Invalid(
                "events.listener_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
