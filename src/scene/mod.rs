//! Scene registry: the arena that owns every component table.
//!
//! One `Scene` replaces what would otherwise be process-wide static tables.
//! It is shared as `Arc<Scene>` between the main thread, the render thread
//! and the simulation thread; each table sits behind its own `RwLock` so
//! readers on different tables never contend.
//!
//! Lock discipline: public methods take at most one table lock at a time,
//! except the cross-table link setters which take two in a fixed order
//! (entity table last). Guards never escape this module.

pub mod entity;
pub mod transform;

use parking_lot::RwLock;

use crate::config::SceneConfig;
use crate::error::{EngineError, EngineResult};
use crate::physics::collider::{Collider, ColliderShape};
use crate::physics::constraint::Constraint;
use crate::physics::rigid_body::RigidBody;
use crate::registry::{ComponentTable, Handle};

pub use entity::Entity;
pub use transform::Transform;

/// Stable 32-bit entity id. Equal to the entity's slot index in the table.
pub type EntityId = u32;

/// Owns the component tables for one world.
pub struct Scene {
    pub(crate) entities: RwLock<ComponentTable<Entity>>,
    pub(crate) transforms: RwLock<ComponentTable<Transform>>,
    pub(crate) rigid_bodies: RwLock<ComponentTable<RigidBody>>,
    pub(crate) colliders: RwLock<ComponentTable<Collider>>,
    pub(crate) constraints: RwLock<ComponentTable<Constraint>>,
}

impl Scene {
    pub fn new(config: &SceneConfig) -> Self {
        Self {
            entities: RwLock::new(ComponentTable::new("entity", config.max_entities)),
            transforms: RwLock::new(ComponentTable::new("transform", config.max_transforms)),
            rigid_bodies: RwLock::new(ComponentTable::new(
                "rigid_body",
                config.max_rigid_bodies,
            )),
            colliders: RwLock::new(ComponentTable::new("collider", config.max_colliders)),
            constraints: RwLock::new(ComponentTable::new(
                "constraint",
                config.max_constraints,
            )),
        }
    }

    // === Entities ===

    pub fn create_entity(&self, name: &str) -> EngineResult<Handle<Entity>> {
        self.entities.write().create(name, Entity::new())
    }

    pub fn delete_entity(&self, handle: Handle<Entity>) -> EngineResult<()> {
        self.entities.write().remove(handle).map(|_| ())
    }

    pub fn entity_by_name(&self, name: &str) -> Option<Handle<Entity>> {
        self.entities.read().get_by_name(name)
    }

    /// Resolves a raw entity id back to a handle, if the slot is live.
    pub fn entity_at(&self, id: EntityId) -> Option<Handle<Entity>> {
        self.entities.read().handle_at(id)
    }

    pub fn with_entity<R>(&self, handle: Handle<Entity>, f: impl FnOnce(&Entity) -> R) -> Option<R> {
        self.entities.read().get(handle).map(f)
    }

    /// Links a transform to an entity. Both must be live.
    ///
    /// Lock order here and in the other link setters: entity table first,
    /// then the component table, matching the snapshot scan.
    pub fn set_entity_transform(
        &self,
        entity: Handle<Entity>,
        transform: Handle<Transform>,
    ) -> EngineResult<()> {
        let mut entities = self.entities.write();
        let e = entities
            .get_mut(entity)
            .ok_or(EngineError::StaleHandle { kind: "entity" })?;
        if self.transforms.read().get(transform).is_none() {
            return Err(EngineError::StaleHandle { kind: "transform" });
        }
        e.transform = Some(transform);
        Ok(())
    }

    /// Links a rigid body to an entity. Both must be live.
    pub fn set_entity_rigid_body(
        &self,
        entity: Handle<Entity>,
        rigid_body: Handle<RigidBody>,
    ) -> EngineResult<()> {
        let mut entities = self.entities.write();
        let e = entities
            .get_mut(entity)
            .ok_or(EngineError::StaleHandle { kind: "entity" })?;
        if self.rigid_bodies.read().get(rigid_body).is_none() {
            return Err(EngineError::StaleHandle { kind: "rigid_body" });
        }
        e.rigid_body = Some(rigid_body);
        Ok(())
    }

    /// Links a collider to an entity. Both must be live.
    pub fn set_entity_collider(
        &self,
        entity: Handle<Entity>,
        collider: Handle<Collider>,
    ) -> EngineResult<()> {
        let mut entities = self.entities.write();
        let e = entities
            .get_mut(entity)
            .ok_or(EngineError::StaleHandle { kind: "entity" })?;
        if self.colliders.read().get(collider).is_none() {
            return Err(EngineError::StaleHandle { kind: "collider" });
        }
        e.collider = Some(collider);
        Ok(())
    }

    /// Removes a component link from an entity, making it ineligible for
    /// simulation on the next sweep.
    pub fn clear_entity_rigid_body(&self, entity: Handle<Entity>) -> EngineResult<()> {
        let mut entities = self.entities.write();
        let e = entities
            .get_mut(entity)
            .ok_or(EngineError::StaleHandle { kind: "entity" })?;
        e.clear_rigid_body();
        Ok(())
    }

    pub fn clear_entity_collider(&self, entity: Handle<Entity>) -> EngineResult<()> {
        let mut entities = self.entities.write();
        let e = entities
            .get_mut(entity)
            .ok_or(EngineError::StaleHandle { kind: "entity" })?;
        e.clear_collider();
        Ok(())
    }

    pub fn clear_entity_transform(&self, entity: Handle<Entity>) -> EngineResult<()> {
        let mut entities = self.entities.write();
        let e = entities
            .get_mut(entity)
            .ok_or(EngineError::StaleHandle { kind: "entity" })?;
        e.clear_transform();
        Ok(())
    }

    // === Transforms ===

    pub fn create_transform(&self, name: &str, transform: Transform) -> EngineResult<Handle<Transform>> {
        self.transforms.write().create(name, transform)
    }

    pub fn delete_transform(&self, handle: Handle<Transform>) -> EngineResult<()> {
        self.transforms.write().remove(handle).map(|_| ())
    }

    /// Reads a transform through a closure; the read lock is held only for
    /// the closure's duration.
    pub fn with_transform<R>(
        &self,
        handle: Handle<Transform>,
        f: impl FnOnce(&Transform) -> R,
    ) -> Option<R> {
        self.transforms.read().get(handle).map(f)
    }

    pub fn with_transform_mut<R>(
        &self,
        handle: Handle<Transform>,
        f: impl FnOnce(&mut Transform) -> R,
    ) -> Option<R> {
        self.transforms.write().get_mut(handle).map(f)
    }

    // === Rigid bodies ===

    pub fn create_rigid_body(&self, name: &str, body: RigidBody) -> EngineResult<Handle<RigidBody>> {
        self.rigid_bodies.write().create(name, body)
    }

    pub fn delete_rigid_body(&self, handle: Handle<RigidBody>) -> EngineResult<()> {
        self.rigid_bodies.write().remove(handle).map(|_| ())
    }

    pub fn with_rigid_body<R>(
        &self,
        handle: Handle<RigidBody>,
        f: impl FnOnce(&RigidBody) -> R,
    ) -> Option<R> {
        self.rigid_bodies.read().get(handle).map(f)
    }

    pub fn with_rigid_body_mut<R>(
        &self,
        handle: Handle<RigidBody>,
        f: impl FnOnce(&mut RigidBody) -> R,
    ) -> Option<R> {
        self.rigid_bodies.write().get_mut(handle).map(f)
    }

    // === Colliders ===

    /// Creates a collider after validating the shape, so a bad shape never
    /// claims a table slot.
    pub fn create_collider(&self, name: &str, shape: ColliderShape) -> EngineResult<Handle<Collider>> {
        let collider = Collider::new(shape)?;
        self.colliders.write().create(name, collider)
    }

    pub fn delete_collider(&self, handle: Handle<Collider>) -> EngineResult<()> {
        self.colliders.write().remove(handle).map(|_| ())
    }

    pub fn with_collider<R>(
        &self,
        handle: Handle<Collider>,
        f: impl FnOnce(&Collider) -> R,
    ) -> Option<R> {
        self.colliders.read().get(handle).map(f)
    }

    pub fn with_collider_mut<R>(
        &self,
        handle: Handle<Collider>,
        f: impl FnOnce(&mut Collider) -> R,
    ) -> Option<R> {
        self.colliders.write().get_mut(handle).map(f)
    }

    // === Constraints ===

    pub fn create_constraint(&self, name: &str) -> EngineResult<Handle<Constraint>> {
        self.constraints.write().create(name, Constraint::new())
    }

    pub fn delete_constraint(&self, handle: Handle<Constraint>) -> EngineResult<()> {
        self.constraints.write().remove(handle).map(|_| ())
    }

    pub fn with_constraint<R>(
        &self,
        handle: Handle<Constraint>,
        f: impl FnOnce(&Constraint) -> R,
    ) -> Option<R> {
        self.constraints.read().get(handle).map(f)
    }

    pub fn with_constraint_mut<R>(
        &self,
        handle: Handle<Constraint>,
        f: impl FnOnce(&mut Constraint) -> R,
    ) -> Option<R> {
        self.constraints.write().get_mut(handle).map(f)
    }

    /// Points a constraint at its first participant. The entity must be live;
    /// a constraint may never reference a dead entity at assignment time.
    pub fn set_constraint_entity_a(
        &self,
        constraint: Handle<Constraint>,
        entity: Handle<Entity>,
    ) -> EngineResult<()> {
        if self.entities.read().get(entity).is_none() {
            return Err(EngineError::invariant(
                "constraint participant A must be a live entity",
            ));
        }
        let mut constraints = self.constraints.write();
        let c = constraints
            .get_mut(constraint)
            .ok_or(EngineError::StaleHandle { kind: "constraint" })?;
        c.entity_a = Some(entity);
        Ok(())
    }

    /// Points a constraint at its second participant. Same rules as
    /// [`set_constraint_entity_a`](Self::set_constraint_entity_a).
    pub fn set_constraint_entity_b(
        &self,
        constraint: Handle<Constraint>,
        entity: Handle<Entity>,
    ) -> EngineResult<()> {
        if self.entities.read().get(entity).is_none() {
            return Err(EngineError::invariant(
                "constraint participant B must be a live entity",
            ));
        }
        let mut constraints = self.constraints.write();
        let c = constraints
            .get_mut(constraint)
            .ok_or(EngineError::StaleHandle { kind: "constraint" })?;
        c.entity_b = Some(entity);
        Ok(())
    }

    pub fn clear_constraint_entity_a(&self, constraint: Handle<Constraint>) -> EngineResult<()> {
        let mut constraints = self.constraints.write();
        let c = constraints
            .get_mut(constraint)
            .ok_or(EngineError::StaleHandle { kind: "constraint" })?;
        c.entity_a = None;
        Ok(())
    }

    pub fn clear_constraint_entity_b(&self, constraint: Handle<Constraint>) -> EngineResult<()> {
        let mut constraints = self.constraints.write();
        let c = constraints
            .get_mut(constraint)
            .ok_or(EngineError::StaleHandle { kind: "constraint" })?;
        c.entity_b = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn scene() -> Scene {
        Scene::new(&SceneConfig::default())
    }

    #[test]
    fn test_entity_links_round_trip() {
        let s = scene();
        let e = s.create_entity("player").unwrap();
        let t = s
            .create_transform("player_t", Transform::from_position(Vec3::Y))
            .unwrap();
        s.set_entity_transform(e, t).unwrap();
        let linked = s.with_entity(e, |e| e.transform).unwrap();
        assert_eq!(linked, Some(t));
        assert_eq!(s.entity_by_name("player"), Some(e));
        let y = s.with_transform(t, |t| t.position.y).unwrap();
        assert!((y - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_link_to_dead_transform_rejected() {
        let s = scene();
        let e = s.create_entity("player").unwrap();
        let t = s
            .create_transform("player_t", Transform::default())
            .unwrap();
        s.delete_transform(t).unwrap();
        assert!(matches!(
            s.set_entity_transform(e, t),
            Err(EngineError::StaleHandle { kind: "transform" })
        ));
    }

    #[test]
    fn test_constraint_requires_live_entity() {
        let s = scene();
        let c = s.create_constraint("hinge").unwrap();
        let e = s.create_entity("door").unwrap();
        s.set_constraint_entity_a(c, e).unwrap();
        s.delete_entity(e).unwrap();
        let dead = e;
        assert!(matches!(
            s.set_constraint_entity_b(c, dead),
            Err(EngineError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_invalid_shape_leaves_no_slot_behind() {
        let s = scene();
        let result = s.create_collider("bad", ColliderShape::Sphere { radius: -1.0 });
        assert!(matches!(result, Err(EngineError::InvalidShape(_))));
        assert_eq!(s.colliders.read().len(), 0);
        // The name is still available for a valid retry.
        s.create_collider("bad", ColliderShape::Sphere { radius: 1.0 })
            .unwrap();
    }

    #[test]
    fn test_entity_id_matches_slot_index() {
        let s = scene();
        let a = s.create_entity("a").unwrap();
        let b = s.create_entity("b").unwrap();
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(s.entity_at(1), Some(b));
        s.delete_entity(a).unwrap();
        assert!(s.entity_at(0).is_none());
    }
}
