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

use std::fmt;

/// The category an allocation is attributed to.
///
/// The set is closed: adding a category means adding a variant here, which
/// also adds a line to the usage report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MemoryTag {
    /// Unclassified. Allocations under this tag log a warning so the call site
    /// gets re-classed.
    Unknown,
    /// Fixed-size arrays.
    Array,
    /// Generic growable lists (see [`crate::containers`]). Reported as
    /// `DARRAY`.
    List,
    /// Dictionaries and hash maps.
    Dictionary,
    /// Ring queues.
    RingQueue,
    /// Binary search trees.
    Bst,
    /// Strings.
    String,
    /// Application-level state.
    Application,
    /// Job system.
    Job,
    /// Textures.
    Texture,
    /// Material instances.
    MaterialInstance,
    /// Renderer internals.
    Renderer,
    /// Game-specific state.
    Game,
    /// Transforms.
    Transform,
    /// Entities.
    Entity,
    /// Entity graph nodes.
    EntityNode,
    /// Scenes.
    Scene,
}

impl MemoryTag {
    /// The number of tags.
    pub const COUNT: usize = 17;

    /// Every tag, in report order.
    pub const ALL: [MemoryTag; Self::COUNT] = [
        MemoryTag::Unknown,
        MemoryTag::Array,
        MemoryTag::List,
        MemoryTag::Dictionary,
        MemoryTag::RingQueue,
        MemoryTag::Bst,
        MemoryTag::String,
        MemoryTag::Application,
        MemoryTag::Job,
        MemoryTag::Texture,
        MemoryTag::MaterialInstance,
        MemoryTag::Renderer,
        MemoryTag::Game,
        MemoryTag::Transform,
        MemoryTag::Entity,
        MemoryTag::EntityNode,
        MemoryTag::Scene,
    ];

    /// Position of this tag in [`MemoryTag::ALL`] and in per-tag counters.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Short upper-case label used in the usage report.
    pub const fn label(self) -> &'static str {
        match self {
            MemoryTag::Unknown => "UNKNOWN",
            MemoryTag::Array => "ARRAY",
            MemoryTag::List => "DARRAY",
            MemoryTag::Dictionary => "DICT",
            MemoryTag::RingQueue => "RING_QUEUE",
            MemoryTag::Bst => "BST",
            MemoryTag::String => "STRING",
            MemoryTag::Application => "APPLICATION",
            MemoryTag::Job => "JOB",
            MemoryTag::Texture => "TEXTURE",
            MemoryTag::MaterialInstance => "MAT_INST",
            MemoryTag::Renderer => "RENDERER",
            MemoryTag::Game => "GAME",
            MemoryTag::Transform => "TRANSFORM",
            MemoryTag::Entity => "ENTITY",
            MemoryTag::EntityNode => "ENTITY_NODE",
            MemoryTag::Scene => "SCENE",
        }
    }
}

impl fmt::Display for MemoryTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
