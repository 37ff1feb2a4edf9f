use bevy_ecs::prelude::Component;

use crate::resources::nametable::NameId;

/// Kind and instance name of an object, resolved to strings through the
/// stage's [`NameTable`](crate::resources::nametable::NameTable).
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Identifiable {
    pub kind: NameId,
    pub name: NameId,
}
