//! Animation definitions.
//!
//! Each object kind declares a table of named keyframe animations. The table
//! is validated once, when the kind is first loaded, and then shared by every
//! entity of that kind through an [`Arc<AnimationSet>`].

use std::sync::Arc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::error::{EngineError, EngineResult};
use crate::resources::nametable::NameId;

/// Inline capacity for keyframes; longer animations spill to the heap.
pub const INLINE_KEYFRAMES: usize = 16;

/// One sprite shown for `duration` milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keyframe {
    pub sprite: u32,
    pub duration: u32,
}

impl Keyframe {
    pub fn new(sprite: u32, duration: u32) -> Self {
        Self { sprite, duration }
    }
}

/// What happens when the last keyframe of an animation elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EndPolicy {
    /// Restart at keyframe 0.
    #[default]
    Loop,
    /// Hold the final keyframe.
    Once,
    /// Switch to another animation of the same kind.
    Next(NameId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationDef {
    pub name: Arc<str>,
    pub atlas: NameId,
    pub keyframes: SmallVec<[Keyframe; INLINE_KEYFRAMES]>,
    pub policy: EndPolicy,
}

impl AnimationDef {
    pub fn new(name: &str, atlas: NameId, keyframes: &[Keyframe], policy: EndPolicy) -> Self {
        Self {
            name: Arc::from(name),
            atlas,
            keyframes: SmallVec::from_slice(keyframes),
            policy,
        }
    }

    pub fn id(&self) -> NameId {
        NameId::of(&self.name)
    }

    pub fn total_duration(&self) -> u64 {
        self.keyframes.iter().map(|k| k.duration as u64).sum()
    }

    /// Animations that can never advance: no keyframes, or zero total time.
    pub fn is_static(&self) -> bool {
        self.total_duration() == 0
    }
}

/// The validated animation table of one object kind.
#[derive(Debug, Clone, Default)]
pub struct AnimationSet {
    animations: FxHashMap<NameId, AnimationDef>,
}

impl AnimationSet {
    /// Validates and indexes `animations`. `kind` is only used in messages.
    pub fn new(kind: &str, animations: Vec<AnimationDef>) -> EngineResult<Self> {
        let mut map = FxHashMap::default();
        for def in animations {
            if def.keyframes.is_empty() {
                return Err(EngineError::definition(format!(
                    "kind '{}': animation '{}' has no keyframes",
                    kind, def.name
                )));
            }
            if map.insert(def.id(), def.clone()).is_some() {
                return Err(EngineError::definition(format!(
                    "kind '{}': animation '{}' is declared twice",
                    kind, def.name
                )));
            }
        }
        for def in map.values() {
            if let EndPolicy::Next(next) = def.policy
                && !map.contains_key(&next)
            {
                return Err(EngineError::definition(format!(
                    "kind '{}': animation '{}' chains to an unknown animation",
                    kind, def.name
                )));
            }
        }
        Ok(Self { animations: map })
    }

    pub fn get(&self, id: NameId) -> Option<&AnimationDef> {
        self.animations.get(&id)
    }

    pub fn contains(&self, id: NameId) -> bool {
        self.animations.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.animations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }
}
