//! Stage tick integration tests: animation, collision, scripting and drawing
//! through real stage and kind scripts.

mod common;

use mlua::prelude::*;

use stagehand::components::animation::Renderable;
use stagehand::components::collidable::Collidable;
use stagehand::compositor::{Compositor, RecordingCompositor};
use stagehand::error::EngineError;
use stagehand::resources::nametable::NameId;
use stagehand::resources::physics::PhysicsWorld;
use stagehand::resources::renderorder::RenderOrder;
use stagehand::resources::worldtime::WorldTime;

use common::{Assets, approx_eq, component, eval, events, find};

const BLOCK: &str = r#"return { atlas = "items", animations = { still = { {0, 0} } } }"#;

fn is_true(value: LuaResult<LuaValue>) -> bool {
    matches!(value, Ok(LuaValue::Boolean(true)))
}

#[test]
fn coin_scenario_two_ticks() {
    let assets = Assets::new();
    assets.kind(
        "pickup",
        r#"return { atlas = "items", animations = { spin = { {0, 100}, {1, 100}, {2, 100}, {3, 100} } } }"#,
    );
    assets.stage_script(
        "level",
        r#"return { objects = { { kind = "pickup", name = "coin", x = 10, y = 10, animation = "spin" } } }"#,
    );
    let mut stage = assets.build("level").unwrap();
    stage.on_enter().unwrap();
    stage.on_loop(0.125).unwrap();
    stage.on_loop(0.125).unwrap();

    let r: Renderable = component(&stage, "coin");
    assert_eq!(r.current_frame, 2);
    assert_eq!(r.sprite, 2);
    assert!(approx_eq(r.counter, 50.0));
}

#[test]
fn once_animation_pins_last_frame_and_notifies_once() {
    let assets = Assets::new();
    assets.kind(
        "bomb",
        r#"return {
            atlas = "items",
            animations = { boom = { {0, 50}, {1, 50}, once = true } },
            on_animation_end = function(self, name) table.insert(events, "end " .. name) end,
        }"#,
    );
    assets.stage_script(
        "level",
        r#"events = {}
        return { objects = { { kind = "bomb", name = "bomb", animation = "boom" } } }"#,
    );
    let mut stage = assets.build("level").unwrap();
    for _ in 0..3 {
        stage.on_loop(0.2).unwrap();
    }

    let r: Renderable = component(&stage, "bomb");
    assert_eq!(r.current_frame, 1);
    assert_eq!(r.counter, 0.0);
    assert!(r.finished);
    assert_eq!(events(&stage), vec!["end boom"]);
}

#[test]
fn chained_animation_reports_finished_name() {
    let assets = Assets::new();
    assets.kind(
        "jumper",
        r#"return {
            atlas = "items",
            animations = {
                jump = { {0, 50}, next = "fall" },
                fall = { {1, 100} },
            },
            on_animation_end = function(self, name) table.insert(events, "end " .. name) end,
        }"#,
    );
    assets.stage_script(
        "level",
        r#"events = {}
        return { objects = { { kind = "jumper", name = "j", animation = "jump" } } }"#,
    );
    let mut stage = assets.build("level").unwrap();
    stage.on_loop(0.06).unwrap();

    let r: Renderable = component(&stage, "j");
    assert_eq!(r.animation, NameId::of("fall"));
    assert_eq!(r.current_frame, 0);
    assert_eq!(r.sprite, 1);
    assert_eq!(events(&stage), vec!["end jump"]);
    assert!(is_true(eval(&stage, "return pool.j.animation == 'fall'")));
}

#[test]
fn tick_runs_collision_animation_loop_then_stage_hook() {
    let assets = Assets::new();
    assets.kind("block", BLOCK);
    assets.kind(
        "watcher",
        r#"return {
            atlas = "items",
            animations = { idle = { {0, 10}, {1, 10} } },
            on_collision = function(self, name, kind)
                table.insert(events, "collision " .. name .. " " .. kind)
            end,
            on_animation_end = function(self, name) table.insert(events, "animation " .. name) end,
            on_loop = function(self, delta) table.insert(events, "loop") end,
        }"#,
    );
    assets.stage_script(
        "level",
        r#"events = {}
        return {
            objects = {
                { kind = "watcher", name = "a", x = 100, y = 100, animation = "idle" },
                { kind = "block", name = "b", x = 100, y = 100, animation = "still" },
            },
            on_enter = function() table.insert(events, "enter") end,
            on_loop = function(delta) table.insert(events, "stage loop") end,
        }"#,
    );
    let mut stage = assets.build("level").unwrap();
    stage.on_enter().unwrap();
    stage.on_loop(0.02).unwrap();

    assert_eq!(
        events(&stage),
        vec!["enter", "collision b block", "animation idle", "loop", "stage loop"]
    );
    assert_eq!(stage.world().borrow().resource::<PhysicsWorld>().step_count(), 1);
}

#[test]
fn collision_end_fires_once_per_side_after_separation() {
    let assets = Assets::new();
    assets.kind(
        "toucher",
        r#"return {
            atlas = "items",
            animations = { still = { {0, 0} } },
            on_collision = function(self, name, kind)
                table.insert(events, self.name .. " begin " .. name .. " " .. kind)
            end,
            on_collision_end = function(self, name, kind)
                table.insert(events, self.name .. " end " .. name .. " " .. kind)
            end,
        }"#,
    );
    assets.stage_script(
        "level",
        r#"events = {}
        return {
            objects = {
                { kind = "toucher", name = "a", x = 100, y = 100, animation = "still" },
                { kind = "toucher", name = "b", x = 104, y = 100, animation = "still" },
            },
        }"#,
    );
    let mut stage = assets.build("level").unwrap();
    stage.on_enter().unwrap();
    stage.on_loop(0.02).unwrap();
    assert_eq!(events(&stage), vec!["a begin b toucher", "b begin a toucher"]);

    eval(&stage, "pool.b.x = 200").unwrap();
    stage.on_loop(0.02).unwrap();
    stage.on_loop(0.02).unwrap();
    assert_eq!(
        events(&stage),
        vec![
            "a begin b toucher",
            "b begin a toucher",
            "a end b toucher",
            "b end a toucher",
        ]
    );
}

#[test]
fn fixed_step_count_follows_banked_time() {
    let assets = Assets::new();
    assets.stage_script("level", "return {}");
    let mut stage = assets.build("level").unwrap();
    stage.on_loop(0.06).unwrap();

    let world = stage.world().borrow();
    assert_eq!(world.resource::<PhysicsWorld>().step_count(), 3);
    assert_eq!(world.resource::<WorldTime>().frame_count, 1);
}

#[test]
fn destroyed_object_proxy_goes_inert() {
    let assets = Assets::new();
    assets.kind("block", BLOCK);
    assets.kind(
        "vanishing",
        r#"return {
            atlas = "items",
            animations = { still = { {0, 0} } },
            on_collision = function(self, name)
                table.insert(events, "hit " .. name)
                self:destroy()
            end,
        }"#,
    );
    assets.stage_script(
        "level",
        r#"events = {}
        return {
            objects = {
                { kind = "block", name = "player", x = 50, y = 50, animation = "still" },
                { kind = "vanishing", name = "coin", x = 52, y = 50, animation = "still" },
            },
            on_enter = function() held = pool.coin end,
        }"#,
    );
    let mut stage = assets.build("level").unwrap();
    stage.on_enter().unwrap();
    stage.on_loop(0.02).unwrap();

    assert_eq!(events(&stage), vec!["hit player"]);
    assert!(find(&stage, "coin").is_none());
    assert!(matches!(eval(&stage, "return held.x"), Ok(LuaValue::Nil)));
    assert!(matches!(eval(&stage, "return held:alive()"), Ok(LuaValue::Boolean(false))));
    assert!(matches!(eval(&stage, "return pool.coin"), Ok(LuaValue::Nil)));
    assert!(matches!(eval(&stage, "held.x = 5 return held.x"), Ok(LuaValue::Nil)));
    assert!(eval(&stage, "held:destroy()").is_ok());

    // The pending end events reference the dead shape and are skipped.
    stage.on_loop(0.02).unwrap();
    assert_eq!(events(&stage), vec!["hit player"]);
    assert_eq!(stage.world().borrow().resource::<PhysicsWorld>().body_count(), 1);
}

#[test]
fn screen_exit_and_enter_per_edge() {
    let assets = Assets::new();
    assets.kind(
        "walker",
        r#"return {
            atlas = "items",
            animations = { still = { {0, 0} } },
            on_screen_exit = function(self, edge) table.insert(events, "exit " .. edge) end,
            on_screen_enter = function(self, edge) table.insert(events, "enter " .. edge) end,
        }"#,
    );
    assets.stage_script(
        "level",
        r#"events = {}
        return { objects = { { kind = "walker", name = "w", x = 100, y = 100, animation = "still" } } }"#,
    );
    let mut stage = assets.build("level").unwrap();
    stage.on_loop(0.001).unwrap();
    assert!(events(&stage).is_empty());

    eval(&stage, "pool.w.x = -50").unwrap();
    stage.on_loop(0.001).unwrap();
    assert_eq!(events(&stage), vec!["exit left"]);

    eval(&stage, "pool.w.x = 100").unwrap();
    stage.on_loop(0.001).unwrap();
    eval(&stage, "pool.w.x = 400 pool.w.y = -50").unwrap();
    stage.on_loop(0.001).unwrap();
    assert_eq!(
        events(&stage),
        vec!["exit left", "enter left", "exit right", "exit top"]
    );
}

#[test]
fn z_change_resorts_render_order() {
    let assets = Assets::new();
    assets.kind("block", BLOCK);
    assets.stage_script(
        "level",
        r#"return { objects = {
            { kind = "block", name = "a", x = 1, animation = "still" },
            { kind = "block", name = "b", x = 2, animation = "still" },
            { kind = "block", name = "c", x = 3, animation = "still" },
        } }"#,
    );
    let mut stage = assets.build("level").unwrap();
    assert!(is_true(eval(&stage, "return pool.c.z == 2")));

    eval(&stage, "pool.a.z = 5").unwrap();
    stage.on_loop(0.001).unwrap();

    let expected = vec![
        find(&stage, "b").unwrap(),
        find(&stage, "c").unwrap(),
        find(&stage, "a").unwrap(),
    ];
    {
        let world = stage.world().borrow();
        let order = world.resource::<RenderOrder>();
        assert_eq!(order.entities(), expected.as_slice());
        assert!(!order.is_dirty());
    }

    let mut compositor = RecordingCompositor::new();
    stage.on_draw(&mut compositor);
    compositor.draw();
    let xs: Vec<f32> = compositor.sprites().map(|s| s.x).collect();
    assert_eq!(xs, vec![2.0, 3.0, 1.0]);
}

#[test]
fn sound_start_and_end_reach_handlers() {
    let assets = Assets::new();
    assets.stage_script(
        "level",
        r#"events = {}
        return {
            sounds = { "coin" },
            on_enter = function()
                pool.coin.on_start = function(s) table.insert(events, "start " .. s.name) end
                pool.coin.on_end = function(s) table.insert(events, "end " .. s.name) end
                pool.coin:play()
            end,
        }"#,
    );
    let mut stage = assets.build("level").unwrap();
    stage.on_enter().unwrap();
    stage.on_loop(0.01).unwrap();
    assert_eq!(events(&stage), vec!["start coin"]);

    eval(&stage, "pool.coin:stop()").unwrap();
    stage.on_loop(0.01).unwrap();
    stage.on_loop(0.01).unwrap();
    assert_eq!(events(&stage), vec!["start coin", "end coin"]);
}

#[test]
fn script_error_surfaces_as_single_line() {
    let assets = Assets::new();
    assets.kind(
        "faulty",
        r#"return {
            atlas = "items",
            animations = { still = { {0, 0} } },
            on_loop = function(self) error("boom") end,
        }"#,
    );
    assets.stage_script(
        "level",
        r#"return { objects = { { kind = "faulty", name = "f", animation = "still" } } }"#,
    );
    let mut stage = assets.build("level").unwrap();
    let err = stage.on_loop(0.01).unwrap_err();
    assert!(matches!(err, EngineError::Script(_)));
    let text = err.to_string();
    assert!(text.contains("boom"));
    assert!(!text.contains('\n'));
}

#[test]
fn spawn_hooks_run_in_listing_order() {
    let assets = Assets::new();
    assets.kind(
        "greeter",
        r#"return {
            atlas = "items",
            animations = { still = { {4, 0} } },
            on_spawn = function(self) table.insert(events, "spawn " .. self.name .. " " .. self.z) end,
        }"#,
    );
    assets.stage_script(
        "level",
        r#"events = {}
        return { objects = {
            { kind = "greeter", name = "a", animation = "still" },
            { kind = "greeter", name = "b", animation = "still" },
        } }"#,
    );
    let stage = assets.build("level").unwrap();
    assert_eq!(events(&stage), vec!["spawn a 0", "spawn b 1"]);

    // Sprite 4 has no hitbox: no body at all.
    let entity = find(&stage, "a").unwrap();
    assert!(stage.world().borrow().get::<Collidable>(entity).is_none());
    assert_eq!(stage.world().borrow().resource::<PhysicsWorld>().body_count(), 0);
}

#[test]
fn spawn_error_aborts_construction() {
    let assets = Assets::new();
    assets.kind(
        "grumpy",
        r#"return {
            atlas = "items",
            animations = { still = { {0, 0} } },
            on_spawn = function(self) error("refusing to spawn") end,
        }"#,
    );
    assets.stage_script(
        "level",
        r#"return { objects = { { kind = "grumpy", name = "g", animation = "still" } } }"#,
    );
    match assets.build("level") {
        Err(EngineError::Script(e)) => assert!(e.to_string().contains("refusing to spawn")),
        other => panic!("expected script error, got {:?}", other.err()),
    }
}

#[test]
fn definition_errors_are_reported() {
    let assets = Assets::new();
    assets.kind("block", BLOCK);
    assets.kind(
        "broken",
        r#"return { atlas = "items", animations = { a = { {0, 10}, next = "missing" } } }"#,
    );
    assets.kind("number", "return 42");
    assets.kind(
        "offatlas",
        r#"return { atlas = "items", animations = { a = { {99, 10} } } }"#,
    );
    assets.kind(
        "negative",
        r#"return { atlas = "items", animations = { a = { {0, -5} } } }"#,
    );
    assets.kind("tableatlas", r#"return { atlas = {}, animations = { a = { {0, 10} } } }"#);

    let cases = [
        ("block", "nope"),
        ("broken", "a"),
        ("number", "a"),
        ("offatlas", "a"),
        ("negative", "a"),
        ("tableatlas", "a"),
    ];
    for (kind, animation) in cases {
        assets.stage_script(
            "level",
            &format!(
                r#"return {{ objects = {{ {{ kind = "{kind}", name = "x", animation = "{animation}" }} }} }}"#
            ),
        );
        assert!(
            matches!(assets.build("level"), Err(EngineError::Definition(_))),
            "kind {kind} should be rejected"
        );
    }

    assets.stage_script(
        "level",
        r#"return { objects = { { kind = "negative", name = "x", animation = "a" } } }"#,
    );
    match assets.build("level") {
        Err(EngineError::Definition(msg)) => {
            assert!(msg.contains("kind 'negative'"), "{msg}");
            assert!(msg.contains("animation 'a'"), "{msg}");
        }
        other => panic!("expected definition error, got {:?}", other.err()),
    }
}

#[test]
fn hitbox_follows_keyframe() {
    let assets = Assets::new();
    assets.kind(
        "shifty",
        r#"return { atlas = "items", animations = { morph = { {0, 50}, {5, 50} } } }"#,
    );
    assets.stage_script(
        "level",
        r#"return { objects = { { kind = "shifty", name = "s", x = 100, y = 50, animation = "morph" } } }"#,
    );
    let mut stage = assets.build("level").unwrap();
    let before: Collidable = component(&stage, "s");
    assert!(approx_eq(before.hw, 16.0));

    stage.on_loop(0.06).unwrap();
    let c: Collidable = component(&stage, "s");
    assert!(approx_eq(c.hw, 8.0));
    assert!(approx_eq(c.hh, 4.0));
    assert!(approx_eq(c.ox, -2.0));
    assert!(approx_eq(c.oy, 4.0));
    assert_eq!(before.shape, c.shape);

    let world = stage.world().borrow();
    let (x, y) = world.resource::<PhysicsWorld>().body_position(c.body).unwrap();
    assert!(approx_eq(x, 98.0));
    assert!(approx_eq(y, 54.0));
}

#[test]
fn proxy_reads_and_writes() {
    let assets = Assets::new();
    assets.kind(
        "actor",
        r#"return {
            atlas = "items",
            speed = 3,
            animations = { idle = { {0, 0} }, alt = { {1, 0} } },
            on_jump = function(self) return "jumped" end,
        }"#,
    );
    assets.stage_script(
        "level",
        r#"return { objects = {
            { kind = "actor", name = "a", x = 20, y = 30, animation = "idle" },
            { kind = "actor", name = "b", animation = "idle" },
        } }"#,
    );
    let stage = assets.build("level").unwrap();

    assert!(is_true(eval(&stage, "return pool.a.speed == 3")));
    assert!(is_true(eval(&stage, "return pool.a:jump() == 'jumped'")));
    assert!(is_true(eval(&stage, "return pool.a.kind == 'actor' and pool.a.name == 'a'")));
    assert!(is_true(eval(&stage, "pool.a.hp = 1 return pool.a.hp == 1 and pool.b.hp == nil")));
    assert!(is_true(eval(&stage, "pool.a.alpha = 300 return pool.a.alpha == 255")));
    assert!(is_true(eval(&stage, "pool.a.animation = 'alt' return pool.a.animation == 'alt'")));
    assert_eq!(component::<Renderable>(&stage, "a").sprite, 1);

    assert!(eval(&stage, "pool.a.animation = 'nope'").is_err());
    assert!(eval(&stage, "pool.a.name = 'renamed'").is_err());

    eval(&stage, "pool.a.x = 10").unwrap();
    let c: Collidable = component(&stage, "a");
    let world = stage.world().borrow();
    assert_eq!(
        world.resource::<PhysicsWorld>().body_position(c.body),
        Some((10.0, 30.0))
    );
}
