//! Script callbacks attached to an object.
//!
//! Every lifecycle callback a kind may define has a fixed slot, addressed by
//! [`ScriptHook`]. Slots hold [`mlua::RegistryKey`]s, so dropping the
//! component releases each reference exactly once. Dropping it also cuts the
//! [`ProxyLink`], after which the script-side proxy reads `nil` and ignores
//! writes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bevy_ecs::prelude::Component;
use mlua::RegistryKey;

/// Per-entity callback slots, in the order kinds usually declare them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScriptHook {
    Spawn,
    Loop,
    AnimationEnd,
    Collision,
    CollisionEnd,
    ScreenExit,
    ScreenEnter,
}

impl ScriptHook {
    pub const COUNT: usize = 7;

    pub const ALL: [ScriptHook; Self::COUNT] = [
        ScriptHook::Spawn,
        ScriptHook::Loop,
        ScriptHook::AnimationEnd,
        ScriptHook::Collision,
        ScriptHook::CollisionEnd,
        ScriptHook::ScreenExit,
        ScriptHook::ScreenEnter,
    ];

    /// Name of the function in the kind table.
    pub fn field(self) -> &'static str {
        match self {
            ScriptHook::Spawn => "on_spawn",
            ScriptHook::Loop => "on_loop",
            ScriptHook::AnimationEnd => "on_animation_end",
            ScriptHook::Collision => "on_collision",
            ScriptHook::CollisionEnd => "on_collision_end",
            ScriptHook::ScreenExit => "on_screen_exit",
            ScriptHook::ScreenEnter => "on_screen_enter",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Liveness flag shared with the script proxy of an entity.
#[derive(Debug)]
pub struct ProxyLink(Arc<AtomicBool>);

impl ProxyLink {
    /// Returns the link and the flag the proxy should watch.
    pub fn new() -> (Self, Arc<AtomicBool>) {
        let alive = Arc::new(AtomicBool::new(true));
        (Self(alive.clone()), alive)
    }
}

impl Drop for ProxyLink {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Component, Debug)]
pub struct Scriptable {
    hooks: [Option<RegistryKey>; ScriptHook::COUNT],
    self_ref: RegistryKey,
    link: ProxyLink,
    /// Screen edges the collision box was entirely beyond at the last check.
    pub screen_previous: u8,
}

impl Scriptable {
    pub fn new(self_ref: RegistryKey, link: ProxyLink) -> Self {
        Self {
            hooks: Default::default(),
            self_ref,
            link,
            screen_previous: 0,
        }
    }

    pub fn set_hook(&mut self, hook: ScriptHook, key: RegistryKey) {
        self.hooks[hook.index()] = Some(key);
    }

    pub fn hook(&self, hook: ScriptHook) -> Option<&RegistryKey> {
        self.hooks[hook.index()].as_ref()
    }

    pub fn has_hook(&self, hook: ScriptHook) -> bool {
        self.hooks[hook.index()].is_some()
    }

    pub fn self_ref(&self) -> &RegistryKey {
        &self.self_ref
    }
}
