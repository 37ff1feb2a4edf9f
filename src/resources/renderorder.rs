//! Render-order view.
//!
//! Holds the entities in the order the presenter draws them. Changing a sort
//! key only raises the dirty flag; the sort itself runs once per tick in
//! [`sort_render_order`](crate::systems::sort::sort_render_order).

use bevy_ecs::prelude::{Entity, Resource};

#[derive(Resource, Debug)]
pub struct RenderOrder {
    entities: Vec<Entity>,
    dirty: bool,
}

impl Default for RenderOrder {
    fn default() -> Self {
        // Starts dirty so the first tick always sorts.
        Self {
            entities: Vec::new(),
            dirty: true,
        }
    }
}

impl RenderOrder {
    pub fn push(&mut self, entity: Entity) {
        self.entities.push(entity);
        self.dirty = true;
    }

    pub fn remove(&mut self, entity: Entity) {
        self.entities.retain(|e| *e != entity);
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub(crate) fn entities_mut(&mut self) -> &mut Vec<Entity> {
        &mut self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
