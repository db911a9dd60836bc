use bevy::prelude::*;
use rustc_hash::FxHashMap;

use crate::game::geometry::Aabb;
use crate::game::simulation::components::{Body, Dead, HitBox, SimPosition};

/// Query data the resolver needs for every object.
pub type BodyData = (
    &'static mut SimPosition,
    &'static HitBox,
    &'static Body,
    Has<Dead>,
);

/// Snapshot of one object's collision-relevant state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyView {
    pub position: IVec2,
    pub hit_box: HitBox,
    pub body: Body,
    pub dead: bool,
}

impl BodyView {
    pub fn new(position: IVec2, hit_box: HitBox, body: Body) -> Self {
        Self { position, hit_box, body, dead: false }
    }

    pub fn bounding_box(&self, entity: Entity) -> Aabb {
        self.hit_box.bounding_box(self.position, entity)
    }
}

/// Read access to object bodies by handle.
pub trait BodyLookup {
    fn body(&self, entity: Entity) -> Option<BodyView>;

    fn bounding_box(&self, entity: Entity) -> Option<Aabb> {
        self.body(entity).map(|view| view.bounding_box(entity))
    }
}

/// Write access for the resolver and registry. Only positions ever change.
pub trait BodyStore: BodyLookup {
    /// Returns false when the object has no body.
    fn set_position(&mut self, entity: Entity, position: IVec2) -> bool;
}

impl BodyLookup for Query<'_, '_, BodyData> {
    fn body(&self, entity: Entity) -> Option<BodyView> {
        let (position, hit_box, body, dead) = self.get(entity).ok()?;
        Some(BodyView {
            position: position.0,
            hit_box: *hit_box,
            body: *body,
            dead,
        })
    }
}

impl BodyStore for Query<'_, '_, BodyData> {
    fn set_position(&mut self, entity: Entity, position: IVec2) -> bool {
        match self.get_mut(entity) {
            Ok((mut current, ..)) => {
                current.0 = position;
                true
            }
            Err(_) => false,
        }
    }
}

/// Detached body storage for tools and tests that run without a `World`.
impl BodyLookup for FxHashMap<Entity, BodyView> {
    fn body(&self, entity: Entity) -> Option<BodyView> {
        self.get(&entity).copied()
    }
}

impl BodyStore for FxHashMap<Entity, BodyView> {
    fn set_position(&mut self, entity: Entity, position: IVec2) -> bool {
        match self.get_mut(&entity) {
            Some(view) => {
                view.position = position;
                true
            }
            None => false,
        }
    }
}
