//! Sprite atlas metadata.
//!
//! Atlases are described by JSON files under `<assets>/atlases/`. The file
//! stem is the atlas id used by kind scripts:
//!
//! ```json
//! {
//!   "texture": "pickups.png",
//!   "sprites": [
//!     { "u0": 0.0, "v0": 0.0, "u1": 0.25, "v1": 1.0, "w": 16, "h": 16,
//!       "hitbox": { "x": 2, "y": 2, "w": 12, "h": 12 } }
//!   ]
//! }
//! ```
//!
//! Texture decoding is left to the compositor; only geometry lives here.

use std::path::Path;
use std::sync::Arc;

use bevy_ecs::prelude::Resource;
use log::info;
use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::error::{EngineError, EngineResult};
use crate::resources::nametable::NameId;

/// Hitbox rectangle relative to the sprite's top-left corner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct Hitbox {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

/// Immutable metadata of one sprite inside an atlas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct SpriteMeta {
    pub u0: f32,
    pub v0: f32,
    pub u1: f32,
    pub v1: f32,
    pub w: f32,
    pub h: f32,
    #[serde(default)]
    pub hitbox: Hitbox,
}

impl SpriteMeta {
    pub fn has_hitbox(&self) -> bool {
        self.hitbox.w > 0.0 && self.hitbox.h > 0.0
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Atlas {
    #[serde(default)]
    pub texture: Option<String>,
    pub sprites: Vec<SpriteMeta>,
}

impl Atlas {
    pub fn sprite(&self, index: u32) -> Option<&SpriteMeta> {
        self.sprites.get(index as usize)
    }
}

/// Registry of every atlas known to the game, shared by all stages.
#[derive(Resource, Debug, Clone, Default)]
pub struct AtlasRegistry {
    atlases: Arc<FxHashMap<NameId, Atlas>>,
}

impl AtlasRegistry {
    /// Build a registry from already-parsed atlases.
    pub fn from_atlases<I, S>(atlases: I) -> Self
    where
        I: IntoIterator<Item = (S, Atlas)>,
        S: AsRef<str>,
    {
        let map = atlases
            .into_iter()
            .map(|(id, atlas)| (NameId::of(id.as_ref()), atlas))
            .collect();
        Self {
            atlases: Arc::new(map),
        }
    }

    /// Loads every `*.json` file in `dir`. A missing directory yields an empty
    /// registry.
    pub fn load_dir(dir: &Path) -> EngineResult<Self> {
        let mut atlases = Vec::new();
        if !dir.is_dir() {
            return Ok(Self::default());
        }
        let entries = std::fs::read_dir(dir).map_err(|e| EngineError::io(dir, e))?;
        for entry in entries {
            let path = entry.map_err(|e| EngineError::io(dir, e))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let text = std::fs::read_to_string(&path).map_err(|e| EngineError::io(&path, e))?;
            let atlas: Atlas = serde_json::from_str(&text).map_err(|source| EngineError::Json {
                path: path.clone(),
                source,
            })?;
            info!("Loaded atlas '{}' ({} sprites)", stem, atlas.sprites.len());
            atlases.push((stem.to_owned(), atlas));
        }
        Ok(Self::from_atlases(atlases))
    }

    pub fn find(&self, atlas: NameId) -> Option<&Atlas> {
        self.atlases.get(&atlas)
    }

    pub fn sprite(&self, atlas: NameId, index: u32) -> Option<&SpriteMeta> {
        self.find(atlas).and_then(|a| a.sprite(index))
    }

    pub fn len(&self) -> usize {
        self.atlases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atlases.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sprite_without_hitbox() {
        let atlas: Atlas =
            serde_json::from_str(r#"{"sprites":[{"u0":0,"v0":0,"u1":1,"v1":1,"w":8,"h":8}]}"#)
                .unwrap();
        assert!(!atlas.sprites[0].has_hitbox());
        assert!(atlas.texture.is_none());
    }

    #[test]
    fn hitbox_requires_positive_extent() {
        let mut sprite = SpriteMeta {
            w: 16.0,
            h: 16.0,
            hitbox: Hitbox {
                x: 0.0,
                y: 0.0,
                w: 4.0,
                h: 0.0,
            },
            ..Default::default()
        };
        assert!(!sprite.has_hitbox());
        sprite.hitbox.h = 4.0;
        assert!(sprite.has_hitbox());
    }

    #[test]
    fn load_dir_reads_json_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("items.json"),
            r#"{"sprites":[{"u0":0,"v0":0,"u1":1,"v1":1,"w":16,"h":16,"hitbox":{"x":1,"y":1,"w":8,"h":8}}]}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let registry = AtlasRegistry::load_dir(dir.path()).unwrap();
        assert_eq!(registry.len(), 1);
        let sprite = registry.sprite(NameId::of("items"), 0).unwrap();
        assert!(sprite.has_hitbox());
        assert!(registry.sprite(NameId::of("items"), 1).is_none());
    }

    #[test]
    fn malformed_json_is_reported_with_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.json"), "{ nope").unwrap();
        let err = AtlasRegistry::load_dir(dir.path()).unwrap_err();
        assert!(err.to_string().contains("bad.json"));
    }
}
