//! Render-order sort pass.

use bevy_ecs::prelude::*;

use crate::components::sorteable::Sorteable;
use crate::resources::renderorder::RenderOrder;

/// Re-sort the render order by ascending [`Sorteable`] key when dirty.
///
/// Insertion sort: stable, and cheap when only a few keys moved since the
/// last pass. Entities that no longer exist are dropped from the order.
pub fn sort_render_order(world: &mut World) {
    if !world.resource::<RenderOrder>().is_dirty() {
        return;
    }
    world.resource_scope(|world, mut order: Mut<RenderOrder>| {
        let mut keyed: Vec<(i16, Entity)> = order
            .entities()
            .iter()
            .filter_map(|e| world.get::<Sorteable>(*e).map(|s| (s.0, *e)))
            .collect();

        for i in 1..keyed.len() {
            let mut j = i;
            while j > 0 && keyed[j - 1].0 > keyed[j].0 {
                keyed.swap(j - 1, j);
                j -= 1;
            }
        }

        let entities = order.entities_mut();
        entities.clear();
        entities.extend(keyed.into_iter().map(|(_, e)| e));
        order.clear_dirty();
    });
}
