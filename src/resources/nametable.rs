//! Interned names.
//!
//! Kinds, object names, atlases and animations are referred to by a
//! [`NameId`], the 32-bit FNV-1a hash of the string. The [`NameTable`]
//! resource maps ids back to display strings for the lifetime of a stage.

use bevy_ecs::prelude::Resource;
use log::warn;
use rustc_hash::FxHashMap;

const FNV_OFFSET: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Hashed identifier of a string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct NameId(pub u32);

impl NameId {
    pub const fn of(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut hash = FNV_OFFSET;
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i] as u32;
            hash = hash.wrapping_mul(FNV_PRIME);
            i += 1;
        }
        NameId(hash)
    }
}

impl From<&str> for NameId {
    fn from(name: &str) -> Self {
        NameId::of(name)
    }
}

/// Append-only id → string table scoped to one stage.
#[derive(Resource, Default, Debug)]
pub struct NameTable {
    names: FxHashMap<NameId, String>,
}

impl NameTable {
    /// Interns `name` and returns its id.
    pub fn intern(&mut self, name: &str) -> NameId {
        let id = NameId::of(name);
        match self.names.get(&id) {
            Some(existing) if existing != name => {
                warn!("name hash collision between '{}' and '{}'", existing, name);
            }
            Some(_) => {}
            None => {
                self.names.insert(id, name.to_owned());
            }
        }
        id
    }

    pub fn get(&self, id: NameId) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    /// Like [`get`](Self::get) but yields an empty string for unknown ids.
    pub fn display(&self, id: NameId) -> &str {
        self.get(id).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn clear(&mut self) {
        self.names.clear();
    }
}
