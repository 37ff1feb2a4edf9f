//! Keyframe animator.
//!
//! - [`advance`] runs the keyframe state machine of a single
//!   [`Renderable`] until it is idle or an animation sequence completes.
//! - [`update_animations`] drives it for every animated entity, adding the
//!   frame delta once and calling back into scripts whenever a sequence ends.
//!
//! # Animation Flow
//!
//! 1. Kind scripts declare animations, validated into an
//!    [`AnimationSet`](crate::resources::animationstore::AnimationSet)
//! 2. Entities carry a [`Renderable`] naming the active animation and an
//!    [`Animatable`] pointing at the kind's set
//! 3. Each frame the counter grows by the frame delta in milliseconds and
//!    whole keyframes are consumed from it
//! 4. At the end of a sequence the [`EndPolicy`] decides between looping,
//!    holding the last frame, or chaining to another animation; in every case
//!    the owner is notified with the name of the sequence that finished
//!
//! The world is never borrowed while a notification runs, so callbacks may
//! switch the animation, move or destroy the entity. Playback state is
//! re-resolved after every notification.

use std::cell::RefCell;
use std::sync::Arc;

use bevy_ecs::prelude::*;

use crate::components::animation::{Animatable, Renderable};
use crate::error::EngineResult;
use crate::resources::animationstore::{AnimationSet, EndPolicy};

/// Outcome of one [`advance`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    /// No further keyframe boundary is crossed with the time banked so far.
    Idle,
    /// A sequence finished. `resume` is false when playback must stop for
    /// this tick (held `once` frame, or chained into an unusable animation).
    Completed { finished: Arc<str>, resume: bool },
}

/// Consumes whole keyframes from `renderable.counter`.
///
/// Stops at the first completed sequence so the caller can notify before
/// continuing.
pub fn advance(renderable: &mut Renderable, animations: &AnimationSet) -> Advance {
    loop {
        let Some(anim) = animations.get(renderable.animation) else {
            return Advance::Idle;
        };
        let last = anim.keyframes.len() - 1;
        renderable.current_frame = renderable.current_frame.min(last);
        renderable.sprite = anim.keyframes[renderable.current_frame].sprite;

        if anim.is_static() {
            renderable.counter = 0.0;
            return Advance::Idle;
        }
        if renderable.finished {
            renderable.counter = 0.0;
            return Advance::Idle;
        }

        let duration = anim.keyframes[renderable.current_frame].duration as f32;
        if renderable.counter < duration {
            return Advance::Idle;
        }
        renderable.counter -= duration;

        if renderable.current_frame < last {
            renderable.current_frame += 1;
            continue;
        }

        let finished = anim.name.clone();
        match anim.policy {
            EndPolicy::Next(next) => {
                renderable.animation = next;
                renderable.current_frame = 0;
                renderable.counter = 0.0;
                let resume = match animations.get(next) {
                    Some(chained) => {
                        renderable.atlas = chained.atlas;
                        renderable.sprite = chained.keyframes[0].sprite;
                        true
                    }
                    None => false,
                };
                return Advance::Completed { finished, resume };
            }
            EndPolicy::Once => {
                renderable.counter = 0.0;
                renderable.finished = true;
                return Advance::Completed {
                    finished,
                    resume: false,
                };
            }
            EndPolicy::Loop => {
                renderable.current_frame = 0;
                renderable.sprite = anim.keyframes[0].sprite;
                return Advance::Completed {
                    finished,
                    resume: true,
                };
            }
        }
    }
}

/// Advance every animated entity by `delta` seconds.
///
/// `notify` is called with the entity and the name of each completed
/// sequence, once per completion, with no borrow of `world` held.
pub fn update_animations<F>(world: &RefCell<World>, delta: f32, mut notify: F) -> EngineResult<()>
where
    F: FnMut(Entity, &str) -> EngineResult<()>,
{
    let entities: Vec<Entity> = {
        let mut w = world.borrow_mut();
        let mut query = w.query_filtered::<Entity, (With<Renderable>, With<Animatable>)>();
        query.iter(&w).collect()
    };
    let elapsed_ms = delta * 1000.0;

    for entity in entities {
        let mut banked = false;
        loop {
            let outcome = {
                let mut w = world.borrow_mut();
                let Ok(mut e) = w.get_entity_mut(entity) else {
                    break;
                };
                let Some(animations) = e.get::<Animatable>().map(|a| a.animations.clone()) else {
                    break;
                };
                let Some(mut renderable) = e.get_mut::<Renderable>() else {
                    break;
                };
                if !animations.contains(renderable.animation) {
                    break;
                }
                if !banked {
                    renderable.counter += elapsed_ms;
                    banked = true;
                }
                advance(&mut renderable, &animations)
            };
            match outcome {
                Advance::Idle => break,
                Advance::Completed { finished, resume } => {
                    notify(entity, &finished)?;
                    if !resume {
                        break;
                    }
                }
            }
        }
    }
    Ok(())
}
