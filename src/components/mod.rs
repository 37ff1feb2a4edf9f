//! ECS components for stage objects.
//!
//! Every object spawned by a stage carries the same set of components; the
//! collider is only present for kinds whose initial sprite declares a hitbox.
//!
//! Submodules overview:
//! - [`animation`] – playback state ([`Renderable`](animation::Renderable)) and the kind's animation table
//! - [`collidable`] – physics body and lazily created sensor shape
//! - [`identifiable`] – interned kind and instance name
//! - [`scriptable`] – script callback slots and proxy liveness
//! - [`sorteable`] – draw-order key
//! - [`transform`] – position, scale, angle, alpha and visibility

pub mod animation;
pub mod collidable;
pub mod identifiable;
pub mod scriptable;
pub mod sorteable;
pub mod transform;
