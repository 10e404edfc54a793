//! Entity component: composition root linking an id to its components.

use crate::physics::collider::Collider;
use crate::physics::rigid_body::RigidBody;
use crate::registry::Handle;
use crate::scene::transform::Transform;

/// An entity is nothing but a bundle of optional component links.
///
/// Links are generational handles, not owning references; the component
/// tables own the data. A link to a deleted component simply resolves to
/// nothing, which makes the entity ineligible for simulation on the next
/// reconciliation sweep.
#[derive(Debug, Clone, Default)]
pub struct Entity {
    pub transform: Option<Handle<Transform>>,
    pub rigid_body: Option<Handle<RigidBody>>,
    pub collider: Option<Handle<Collider>>,
}

impl Entity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_transform(&self) -> Option<Handle<Transform>> {
        self.transform
    }

    pub fn get_rigid_body(&self) -> Option<Handle<RigidBody>> {
        self.rigid_body
    }

    pub fn get_collider(&self) -> Option<Handle<Collider>> {
        self.collider
    }

    pub fn clear_transform(&mut self) {
        self.transform = None;
    }

    pub fn clear_rigid_body(&mut self) {
        self.rigid_body = None;
    }

    pub fn clear_collider(&mut self) {
        self.collider = None;
    }
}
