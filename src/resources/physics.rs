//! Sensor physics world.
//!
//! A small physics world tailored to what stages need: bodies that are moved
//! explicitly by the collision synchroniser, axis-aligned box shapes attached
//! to them, and begin/end sensor events computed once per [`PhysicsWorld::step`].
//!
//! There is no gravity, velocity integration or rotation; every shape is an
//! AABB centred on its body. Overlap uses strict inequalities, so boxes that
//! merely touch edges do not collide (same rule as
//! [`Aabb::overlaps`]).
//!
//! Bodies and shapes are addressed by generational handles. A handle whose
//! slot has been freed (or reused) reports `false` from
//! [`PhysicsWorld::shape_is_valid`], which is how stale sensor events are
//! detected during dispatch.

use bevy_ecs::prelude::{Entity, Resource};
use log::debug;
use smallvec::SmallVec;

/// Generational index into one of the world's arenas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct Slot {
    index: u32,
    generation: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(Slot);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeHandle(Slot);

/// Axis-aligned bounding box in world units.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Aabb {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Aabb {
    pub fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min_x < other.max_x
            && self.max_x > other.min_x
            && self.min_y < other.max_y
            && self.max_y > other.min_y
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct BodyDef {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Copy, Debug)]
pub struct ShapeDef {
    pub sensor: bool,
    pub sensor_events: bool,
    pub user_data: Option<Entity>,
}

impl Default for ShapeDef {
    fn default() -> Self {
        Self {
            sensor: false,
            sensor_events: true,
            user_data: None,
        }
    }
}

/// One sensor overlap transition: `sensor` is the shape that reports it,
/// `visitor` the shape that entered or left.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SensorEvent {
    pub sensor: ShapeHandle,
    pub visitor: ShapeHandle,
}

#[derive(Debug, Default)]
pub struct SensorEvents {
    pub begin: Vec<SensorEvent>,
    pub end: Vec<SensorEvent>,
}

impl SensorEvents {
    pub fn is_empty(&self) -> bool {
        self.begin.is_empty() && self.end.is_empty()
    }
}

#[derive(Debug)]
struct Body {
    x: f32,
    y: f32,
    shapes: SmallVec<[ShapeHandle; 2]>,
}

#[derive(Debug)]
struct Shape {
    body: BodyHandle,
    half_w: f32,
    half_h: f32,
    def: ShapeDef,
}

#[derive(Debug)]
struct Arena<T> {
    entries: Vec<(u32, Option<T>)>,
    free: Vec<u32>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            free: Vec::new(),
        }
    }
}

impl<T> Arena<T> {
    fn insert(&mut self, value: T) -> Slot {
        if let Some(index) = self.free.pop() {
            let entry = &mut self.entries[index as usize];
            entry.0 = entry.0.wrapping_add(1);
            entry.1 = Some(value);
            Slot {
                index,
                generation: entry.0,
            }
        } else {
            self.entries.push((0, Some(value)));
            Slot {
                index: (self.entries.len() - 1) as u32,
                generation: 0,
            }
        }
    }

    fn get(&self, slot: Slot) -> Option<&T> {
        match self.entries.get(slot.index as usize) {
            Some((generation, Some(value))) if *generation == slot.generation => Some(value),
            _ => None,
        }
    }

    fn get_mut(&mut self, slot: Slot) -> Option<&mut T> {
        match self.entries.get_mut(slot.index as usize) {
            Some((generation, Some(value))) if *generation == slot.generation => Some(value),
            _ => None,
        }
    }

    fn remove(&mut self, slot: Slot) -> Option<T> {
        let entry = self.entries.get_mut(slot.index as usize)?;
        if entry.0 != slot.generation || entry.1.is_none() {
            return None;
        }
        self.free.push(slot.index);
        entry.1.take()
    }

    fn iter(&self) -> impl Iterator<Item = (Slot, &T)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(index, (generation, value))| {
                value.as_ref().map(|v| {
                    (
                        Slot {
                            index: index as u32,
                            generation: *generation,
                        },
                        v,
                    )
                })
            })
    }

    fn len(&self) -> usize {
        self.entries.len() - self.free.len()
    }
}

/// Stage-owned physics world.
#[derive(Resource, Debug, Default)]
pub struct PhysicsWorld {
    bodies: Arena<Body>,
    shapes: Arena<Shape>,
    /// Sorted (sensor, visitor) pairs overlapping as of the last step.
    contacts: Vec<(ShapeHandle, ShapeHandle)>,
    /// End events raised by shape destruction, delivered with the next step.
    pending_end: Vec<SensorEvent>,
    events: SensorEvents,
    step_count: u64,
}

impl PhysicsWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_body(&mut self, def: BodyDef) -> BodyHandle {
        BodyHandle(self.bodies.insert(Body {
            x: def.x,
            y: def.y,
            shapes: SmallVec::new(),
        }))
    }

    /// Destroys a body together with every shape attached to it.
    pub fn destroy_body(&mut self, body: BodyHandle) {
        let Some(removed) = self.bodies.remove(body.0) else {
            return;
        };
        for shape in removed.shapes {
            self.remove_shape_contacts(shape);
            self.shapes.remove(shape.0);
        }
    }

    pub fn body_is_valid(&self, body: BodyHandle) -> bool {
        self.bodies.get(body.0).is_some()
    }

    pub fn body_position(&self, body: BodyHandle) -> Option<(f32, f32)> {
        self.bodies.get(body.0).map(|b| (b.x, b.y))
    }

    /// Moves a body. Rotation is always identity.
    pub fn set_transform(&mut self, body: BodyHandle, x: f32, y: f32) {
        if let Some(b) = self.bodies.get_mut(body.0) {
            b.x = x;
            b.y = y;
        }
    }

    /// Attaches a box of the given half extents centred on `body`.
    pub fn create_box_shape(
        &mut self,
        body: BodyHandle,
        def: ShapeDef,
        half_w: f32,
        half_h: f32,
    ) -> Option<ShapeHandle> {
        self.bodies.get(body.0)?;
        let handle = ShapeHandle(self.shapes.insert(Shape {
            body,
            half_w,
            half_h,
            def,
        }));
        if let Some(b) = self.bodies.get_mut(body.0) {
            b.shapes.push(handle);
        }
        Some(handle)
    }

    /// Resizes a box shape in place.
    pub fn set_box(&mut self, shape: ShapeHandle, half_w: f32, half_h: f32) {
        if let Some(s) = self.shapes.get_mut(shape.0) {
            s.half_w = half_w;
            s.half_h = half_h;
        }
    }

    pub fn destroy_shape(&mut self, shape: ShapeHandle) {
        let Some(removed) = self.shapes.remove(shape.0) else {
            return;
        };
        if let Some(b) = self.bodies.get_mut(removed.body.0) {
            b.shapes.retain(|s| *s != shape);
        }
        self.remove_shape_contacts(shape);
    }

    pub fn shape_is_valid(&self, shape: ShapeHandle) -> bool {
        self.shapes.get(shape.0).is_some()
    }

    pub fn shape_user_data(&self, shape: ShapeHandle) -> Option<Entity> {
        self.shapes.get(shape.0).and_then(|s| s.def.user_data)
    }

    pub fn shape_aabb(&self, shape: ShapeHandle) -> Option<Aabb> {
        let s = self.shapes.get(shape.0)?;
        let b = self.bodies.get(s.body.0)?;
        Some(Aabb::new(
            b.x - s.half_w,
            b.y - s.half_h,
            b.x + s.half_w,
            b.y + s.half_h,
        ))
    }

    /// Every live shape whose box overlaps `aabb`, in handle order.
    pub fn overlap_aabb(&self, aabb: &Aabb) -> Vec<ShapeHandle> {
        self.shapes
            .iter()
            .map(|(slot, _)| ShapeHandle(slot))
            .filter(|h| self.shape_aabb(*h).is_some_and(|a| a.overlaps(aabb)))
            .collect()
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    /// Number of completed [`step`](Self::step) calls.
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Advances the world by `dt` seconds and recomputes sensor overlaps.
    ///
    /// Events from the previous step that were not drained are discarded.
    pub fn step(&mut self, dt: f32) {
        debug_assert!(dt > 0.0, "physics step must be positive");
        self.step_count += 1;

        let mut current = Vec::new();
        let shapes: Vec<(ShapeHandle, &Shape, Aabb)> = self
            .shapes
            .iter()
            .filter_map(|(slot, shape)| {
                let handle = ShapeHandle(slot);
                self.shape_aabb(handle).map(|aabb| (handle, shape, aabb))
            })
            .collect();

        for (sensor, sensor_shape, sensor_box) in &shapes {
            if !sensor_shape.def.sensor || !sensor_shape.def.sensor_events {
                continue;
            }
            for (visitor, visitor_shape, visitor_box) in &shapes {
                if sensor == visitor
                    || sensor_shape.body == visitor_shape.body
                    || !visitor_shape.def.sensor_events
                {
                    continue;
                }
                if sensor_box.overlaps(visitor_box) {
                    current.push((*sensor, *visitor));
                }
            }
        }
        current.sort_unstable();

        let mut events = SensorEvents {
            begin: Vec::new(),
            end: std::mem::take(&mut self.pending_end),
        };
        for pair in &current {
            if self.contacts.binary_search(pair).is_err() {
                events.begin.push(SensorEvent {
                    sensor: pair.0,
                    visitor: pair.1,
                });
            }
        }
        for pair in &self.contacts {
            if current.binary_search(pair).is_err() {
                events.end.push(SensorEvent {
                    sensor: pair.0,
                    visitor: pair.1,
                });
            }
        }
        if !events.is_empty() {
            debug!(
                "physics step {}: {} begin, {} end",
                self.step_count,
                events.begin.len(),
                events.end.len()
            );
        }
        self.contacts = current;
        self.events = events;
    }

    /// Takes the sensor events produced by the last step.
    pub fn take_sensor_events(&mut self) -> SensorEvents {
        std::mem::take(&mut self.events)
    }

    fn remove_shape_contacts(&mut self, shape: ShapeHandle) {
        let pending = &mut self.pending_end;
        self.contacts.retain(|(sensor, visitor)| {
            if *sensor == shape || *visitor == shape {
                pending.push(SensorEvent {
                    sensor: *sensor,
                    visitor: *visitor,
                });
                false
            } else {
                true
            }
        });
    }
}
