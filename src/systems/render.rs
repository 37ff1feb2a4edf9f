//! Presenter.
//!
//! Walks the render order (ascending sort key, stable) and turns every shown
//! object into a [`DrawCommand::Sprite`]. With [`DebugMode`] present the
//! collision boxes overlapping the viewport are outlined on top.

use bevy_ecs::prelude::*;

use crate::compositor::{Compositor, DrawCommand, SpriteDraw};
use crate::components::animation::Renderable;
use crate::components::transform::Transform;
use crate::resources::debugmode::DebugMode;
use crate::resources::physics::{Aabb, PhysicsWorld};
use crate::resources::renderorder::RenderOrder;
use crate::resources::screensize::ScreenSize;
use crate::trigonometry::{lcos, lsin};

const HITBOX_COLOR: [u8; 4] = [255, 0, 0, 255];

pub fn present(world: &World, compositor: &mut dyn Compositor) {
    for &entity in world.resource::<RenderOrder>().entities() {
        let (Some(t), Some(r)) = (world.get::<Transform>(entity), world.get::<Renderable>(entity))
        else {
            continue;
        };
        if !t.shown {
            continue;
        }
        compositor.push(SpriteDraw {
            atlas: r.atlas,
            sprite: r.sprite,
            x: t.x,
            y: t.y,
            scale: t.scale,
            cos: lcos(t.angle),
            sin: lsin(t.angle),
            alpha: t.alpha,
        });
    }

    if world.contains_resource::<DebugMode>() {
        draw_hitboxes(world, compositor);
    }
}

fn draw_hitboxes(world: &World, compositor: &mut dyn Compositor) {
    let screen = world.resource::<ScreenSize>();
    let physics = world.resource::<PhysicsWorld>();
    let view = Aabb::new(0.0, 0.0, screen.w as f32, screen.h as f32);
    for shape in physics.overlap_aabb(&view) {
        let Some(aabb) = physics.shape_aabb(shape) else {
            continue;
        };
        compositor.submit(DrawCommand::Rect {
            x: aabb.min_x,
            y: aabb.min_y,
            w: aabb.width(),
            h: aabb.height(),
            color: HITBOX_COLOR,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::RecordingCompositor;
    use crate::resources::nametable::NameId;
    use crate::resources::physics::{BodyDef, ShapeDef};

    fn spawn(world: &mut World, x: f32, sprite: u32) -> Entity {
        let e = world
            .spawn((
                Transform::at(x, 0.0),
                Renderable::new(NameId::of("a"), NameId::of("idle"), sprite),
            ))
            .id();
        world.resource_mut::<RenderOrder>().push(e);
        e
    }

    fn world() -> World {
        let mut world = World::new();
        world.insert_resource(RenderOrder::default());
        world.insert_resource(PhysicsWorld::new());
        world.insert_resource(ScreenSize { w: 100, h: 100 });
        world
    }

    #[test]
    fn hidden_objects_are_skipped_and_order_kept() {
        let mut world = world();
        spawn(&mut world, 1.0, 3);
        let hidden = spawn(&mut world, 2.0, 4);
        spawn(&mut world, 3.0, 5);
        world.get_mut::<Transform>(hidden).unwrap().shown = false;

        let mut c = RecordingCompositor::new();
        present(&world, &mut c);
        c.draw();
        let sprites: Vec<u32> = c.sprites().map(|s| s.sprite).collect();
        assert_eq!(sprites, vec![3, 5]);
    }

    #[test]
    fn rotation_uses_trig_table() {
        let mut world = world();
        let e = spawn(&mut world, 0.0, 0);
        world.get_mut::<Transform>(e).unwrap().angle = 90.0;
        let mut c = RecordingCompositor::new();
        present(&world, &mut c);
        c.draw();
        let s = c.sprites().next().unwrap();
        assert!(s.cos.abs() < 1e-3);
        assert!((s.sin - 1.0).abs() < 1e-3);
    }

    #[test]
    fn hitbox_overlay_only_in_debug_mode() {
        let mut world = world();
        {
            let mut physics = world.resource_mut::<PhysicsWorld>();
            let inside = physics.create_body(BodyDef { x: 50.0, y: 50.0, ..Default::default() });
            physics.create_box_shape(inside, ShapeDef::default(), 5.0, 5.0);
            let outside = physics.create_body(BodyDef { x: 500.0, y: 50.0, ..Default::default() });
            physics.create_box_shape(outside, ShapeDef::default(), 5.0, 5.0);
        }

        let mut c = RecordingCompositor::new();
        present(&world, &mut c);
        c.draw();
        assert!(c.last_frame().is_empty());

        world.insert_resource(DebugMode {});
        present(&world, &mut c);
        c.draw();
        assert_eq!(
            c.last_frame(),
            &[DrawCommand::Rect { x: 45.0, y: 45.0, w: 10.0, h: 10.0, color: HITBOX_COLOR }]
        );
    }
}
