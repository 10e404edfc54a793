//! The live simulation world and its shadow state.
//!
//! `SimulationWorld` wraps the rapier3d world bundle and keeps the bridge
//! between authoring records and live engine objects: a per-entity shadow
//! record with the last values pushed to the engine, an inverse body-to-entity
//! index for contact and raycast resolution, and a constraint-to-joint map.
//! Change detection is a value comparison against the shadow record, so
//! authoring components never need dirty flags.
//!
//! Everything in this module runs on a single thread (the simulation thread,
//! or the caller in synchronous test mode); the locking lives one layer up.

use std::collections::HashMap;

use glam::{Quat, Vec3};
use rapier3d::dynamics::JointEnabled;
use rapier3d::math::{Point, Real, Rotation, Vector};
use rapier3d::na::Quaternion;
use rapier3d::prelude::*;

use crate::config::PhysicsConfig;
use crate::physics::collider::{Collider as ColliderRecord, ColliderShape};
use crate::physics::constraint::{Constraint, AXIS_COUNT};
use crate::physics::rigid_body::{RigidBody as RigidBodyRecord, RigidBodyMode};
use crate::scene::{EntityId, Transform};

// === glam <-> rapier conversions ===
//
// Kept in one place: rapier's math is nalgebra-based and the rest of the
// crate speaks glam.

fn to_vector(v: Vec3) -> Vector<Real> {
    Vector::new(v.x, v.y, v.z)
}

fn to_point(v: Vec3) -> Point<Real> {
    Point::new(v.x, v.y, v.z)
}

fn from_vector(v: Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

fn to_rotation(q: Quat) -> Rotation<Real> {
    // nalgebra quaternions are (w, x, y, z).
    Rotation::from_quaternion(Quaternion::new(q.w, q.x, q.y, q.z))
}

fn from_rotation(r: &Rotation<Real>) -> Quat {
    Quat::from_xyzw(r.i, r.j, r.k, r.w)
}

/// Authoring state of one entity, copied out of the scene at the top of a
/// step. The simulation only ever reads these copies, never live user state.
#[derive(Debug, Clone)]
pub struct BodyAuthoring {
    pub transform: Transform,
    pub body: RigidBodyRecord,
    pub collider: ColliderRecord,
}

/// Authoring state of one constraint, with participant references already
/// resolved to entity slots.
#[derive(Debug, Clone)]
pub struct ConstraintAuthoring {
    pub entity_a: EntityId,
    pub entity_b: EntityId,
    pub constraint: Constraint,
}

/// Shadow record for one entity admitted to simulation. Holds the engine
/// handles and the last authoring values pushed, for change detection.
struct PhysicsObject {
    body: RigidBodyHandle,
    collider: ColliderHandle,
    mode: RigidBodyMode,
    mass: f32,
    friction: f32,
    angular_damping: f32,
    shape: ColliderShape,
    scale: Vec3,
    margin: f32,
}

pub struct SimulationWorld {
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,

    objects: HashMap<EntityId, PhysicsObject>,
    body_to_entity: HashMap<RigidBodyHandle, EntityId>,
    joints: HashMap<u32, ImpulseJointHandle>,

    accumulator: f32,
    substep_dt: f32,
    max_substeps: u32,
}

impl SimulationWorld {
    pub fn new(config: &PhysicsConfig) -> Self {
        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.dt = config.fixed_timestep;
        Self {
            gravity: to_vector(config.gravity),
            integration_parameters,
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            objects: HashMap::new(),
            body_to_entity: HashMap::new(),
            joints: HashMap::new(),
            accumulator: 0.0,
            substep_dt: config.fixed_timestep,
            max_substeps: config.max_substeps,
        }
    }

    /// Advances the simulation by `dt` seconds using fixed substeps. The
    /// substep count is capped, and any unconsumed remainder beyond one
    /// substep is dropped, so a slow step can never snowball into more work
    /// the next step.
    pub fn step(&mut self, dt: f32) {
        self.accumulator += dt.max(0.0);
        let mut substeps = 0;
        while self.accumulator >= self.substep_dt && substeps < self.max_substeps {
            self.pipeline.step(
                &self.gravity,
                &self.integration_parameters,
                &mut self.island_manager,
                &mut self.broad_phase,
                &mut self.narrow_phase,
                &mut self.bodies,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                &mut self.ccd_solver,
                &(),
                &(),
            );
            self.accumulator -= self.substep_dt;
            substeps += 1;
        }
        if self.accumulator > self.substep_dt {
            self.accumulator = self.substep_dt;
        }
    }

    pub fn contains_entity(&self, entity: EntityId) -> bool {
        self.objects.contains_key(&entity)
    }

    pub fn contains_constraint(&self, constraint: u32) -> bool {
        self.joints.contains_key(&constraint)
    }

    /// Entity slots currently admitted to simulation.
    pub fn entity_slots(&self) -> Vec<EntityId> {
        self.objects.keys().copied().collect()
    }

    pub fn constraint_slots(&self) -> Vec<u32> {
        self.joints.keys().copied().collect()
    }

    // === Entities ===

    /// Admits an entity to the simulation, creating its engine body and
    /// collider from the authoring snapshot.
    ///
    /// Callers must have checked eligibility; admitting an entity twice is an
    /// invariant breach and panics.
    pub fn add_entity(&mut self, entity: EntityId, authoring: &BodyAuthoring) {
        assert!(
            !self.objects.contains_key(&entity),
            "entity {} is already in simulation",
            entity
        );
        let mode = effective_mode(&authoring.body);
        let builder = match mode {
            RigidBodyMode::Static => RigidBodyBuilder::fixed(),
            RigidBodyMode::Dynamic => RigidBodyBuilder::dynamic(),
            RigidBodyMode::Kinematic => RigidBodyBuilder::kinematic_position_based(),
        };
        let angular_damping = authoring.body.rolling_friction + authoring.body.spinning_friction;
        let body = builder
            .translation(to_vector(authoring.transform.position))
            .angular_damping(angular_damping)
            .build();
        let body_handle = self.bodies.insert(body);
        if let Some(rb) = self.bodies.get_mut(body_handle) {
            rb.set_rotation(to_rotation(authoring.transform.rotation), true);
        }

        let shape = build_shape(&authoring.collider);
        let collider = ColliderBuilder::new(shape)
            .mass(authoring.body.mass)
            .friction(authoring.body.friction)
            .build();
        let collider_handle = self
            .colliders
            .insert_with_parent(collider, body_handle, &mut self.bodies);

        self.body_to_entity.insert(body_handle, entity);
        self.objects.insert(
            entity,
            PhysicsObject {
                body: body_handle,
                collider: collider_handle,
                mode,
                mass: authoring.body.mass,
                friction: authoring.body.friction,
                angular_damping,
                shape: authoring.collider.shape,
                scale: authoring.collider.scale,
                margin: authoring.collider.margin,
            },
        );
    }

    /// Per-step update of an admitted entity. Pushes authoring changes to the
    /// engine (diffed against the shadow record), then either feeds the
    /// authored transform to a kinematic body or returns the engine-computed
    /// transform to write back for everything else.
    pub fn update_entity(
        &mut self,
        entity: EntityId,
        authoring: &BodyAuthoring,
    ) -> Option<(Vec3, Quat)> {
        let obj = match self.objects.get_mut(&entity) {
            Some(obj) => obj,
            None => panic!("update for entity {} not in simulation", entity),
        };

        if authoring.body.mass != obj.mass {
            if let Some(c) = self.colliders.get_mut(obj.collider) {
                c.set_mass(authoring.body.mass);
            }
            obj.mass = authoring.body.mass;
        }

        if authoring.collider.shape != obj.shape
            || authoring.collider.scale != obj.scale
            || authoring.collider.margin != obj.margin
        {
            if let Some(c) = self.colliders.get_mut(obj.collider) {
                c.set_shape(build_shape(&authoring.collider));
                // Reassigning the shape resets mass properties.
                c.set_mass(authoring.body.mass);
            }
            obj.shape = authoring.collider.shape;
            obj.scale = authoring.collider.scale;
            obj.margin = authoring.collider.margin;
        }

        if authoring.body.friction != obj.friction {
            if let Some(c) = self.colliders.get_mut(obj.collider) {
                c.set_friction(authoring.body.friction);
            }
            obj.friction = authoring.body.friction;
        }

        let angular_damping = authoring.body.rolling_friction + authoring.body.spinning_friction;
        let rb = match self.bodies.get_mut(obj.body) {
            Some(rb) => rb,
            None => panic!("engine body missing for entity {}", entity),
        };

        if angular_damping != obj.angular_damping {
            rb.set_angular_damping(angular_damping);
            obj.angular_damping = angular_damping;
        }

        let mode = effective_mode(&authoring.body);
        if mode != obj.mode {
            rb.set_body_type(map_mode(mode), true);
            obj.mode = mode;
        }

        if mode == RigidBodyMode::Kinematic {
            rb.set_next_kinematic_translation(to_vector(authoring.transform.position));
            rb.set_next_kinematic_rotation(to_rotation(authoring.transform.rotation));
            // Kinematic bodies never sleep; followers of an authored
            // transform must keep pushing.
            rb.wake_up(true);
            None
        } else {
            let pos = rb.position();
            Some((
                from_vector(pos.translation.vector),
                from_rotation(&pos.rotation),
            ))
        }
    }

    /// Evicts an entity, destroying its engine body, attached collider and
    /// any joints rapier cleans up with the body.
    pub fn remove_entity(&mut self, entity: EntityId) {
        let obj = match self.objects.remove(&entity) {
            Some(obj) => obj,
            None => panic!("remove for entity {} not in simulation", entity),
        };
        self.body_to_entity.remove(&obj.body);
        self.bodies.remove(
            obj.body,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
        // Rapier removed any joints attached to the body; drop their slots
        // from the shadow map so the next sweep can re-admit survivors.
        self.joints
            .retain(|_, handle| self.impulse_joints.get(*handle).is_some());
    }

    // === Constraints ===

    /// Creates the engine joint for an eligible constraint. Both participant
    /// entities must already have live bodies.
    pub fn add_constraint(&mut self, constraint: u32, authoring: &ConstraintAuthoring) {
        assert!(
            !self.joints.contains_key(&constraint),
            "constraint {} is already in simulation",
            constraint
        );
        let body_a = match self.objects.get(&authoring.entity_a) {
            Some(obj) => obj.body,
            None => panic!(
                "constraint {} participant A (entity {}) has no body",
                constraint, authoring.entity_a
            ),
        };
        let body_b = match self.objects.get(&authoring.entity_b) {
            Some(obj) => obj.body,
            None => panic!(
                "constraint {} participant B (entity {}) has no body",
                constraint, authoring.entity_b
            ),
        };
        let joint = build_joint(&authoring.constraint);
        let handle = self.impulse_joints.insert(body_a, body_b, joint, true);
        self.joints.insert(constraint, handle);
    }

    /// Re-pushes the whole joint description. Unconditional and idempotent;
    /// cheap enough that diffing is not worth it.
    pub fn update_constraint(&mut self, constraint: u32, authoring: &ConstraintAuthoring) {
        let handle = match self.joints.get(&constraint) {
            Some(h) => *h,
            None => panic!("update for constraint {} not in simulation", constraint),
        };
        if let Some(joint) = self.impulse_joints.get_mut(handle, true) {
            joint.data = build_joint(&authoring.constraint);
        }
    }

    pub fn remove_constraint(&mut self, constraint: u32) {
        let handle = match self.joints.remove(&constraint) {
            Some(h) => h,
            None => panic!("remove for constraint {} not in simulation", constraint),
        };
        self.impulse_joints.remove(handle, true);
    }

    // === Queries ===

    /// Harvests current contact manifolds into a fresh per-entity map. Both
    /// directions are recorded for every touching pair.
    pub fn harvest_contacts(&self) -> HashMap<EntityId, Vec<EntityId>> {
        let mut contacts: HashMap<EntityId, Vec<EntityId>> = HashMap::new();
        for pair in self.narrow_phase.contact_pairs() {
            if !pair.has_any_active_contact {
                continue;
            }
            let entity_a = self.entity_of_collider(pair.collider1);
            let entity_b = self.entity_of_collider(pair.collider2);
            if let (Some(a), Some(b)) = (entity_a, entity_b) {
                contacts.entry(a).or_default().push(b);
                contacts.entry(b).or_default().push(a);
            }
        }
        contacts
    }

    fn entity_of_collider(&self, handle: ColliderHandle) -> Option<EntityId> {
        let body = self.colliders.get(handle)?.parent()?;
        self.body_to_entity.get(&body).copied()
    }

    /// Closest-hit raycast resolved back to an entity id.
    pub fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<EntityId> {
        let dir = direction.try_normalize()?;
        let ray = Ray::new(to_point(origin), to_vector(dir));
        let query_pipeline = self.broad_phase.as_query_pipeline(
            self.narrow_phase.query_dispatcher(),
            &self.bodies,
            &self.colliders,
            QueryFilter::default(),
        );
        let (collider_handle, _toi) = query_pipeline.cast_ray(&ray, max_distance, true)?;
        self.entity_of_collider(collider_handle)
    }
}

/// The body type actually pushed to the engine: zero mass always means
/// static, whatever the authored mode says.
fn effective_mode(body: &RigidBodyRecord) -> RigidBodyMode {
    if body.mass == 0.0 && body.mode == RigidBodyMode::Dynamic {
        RigidBodyMode::Static
    } else {
        body.mode
    }
}

fn map_mode(mode: RigidBodyMode) -> RigidBodyType {
    match mode {
        RigidBodyMode::Static => RigidBodyType::Fixed,
        RigidBodyMode::Dynamic => RigidBodyType::Dynamic,
        RigidBodyMode::Kinematic => RigidBodyType::KinematicPositionBased,
    }
}

/// Builds the engine shape from the authoring record, applying scale and
/// margin. Round primitives take the largest applicable scale component
/// since the engine has no non-uniform primitive scaling.
fn build_shape(collider: &ColliderRecord) -> SharedShape {
    let scale = collider.scale;
    let margin = collider.margin;
    match collider.shape {
        ColliderShape::Box { half_extents } => {
            let h = half_extents * scale + Vec3::splat(margin);
            SharedShape::cuboid(h.x, h.y, h.z)
        }
        ColliderShape::Sphere { radius } => {
            SharedShape::ball(radius * scale.max_element() + margin)
        }
        ColliderShape::Capsule {
            radius,
            half_height,
        } => SharedShape::capsule_y(
            half_height * scale.y,
            radius * scale.x.max(scale.z) + margin,
        ),
        ColliderShape::Cylinder {
            radius,
            half_height,
        } => SharedShape::cylinder(
            half_height * scale.y + margin,
            radius * scale.x.max(scale.z) + margin,
        ),
        ColliderShape::Cone {
            radius,
            half_height,
        } => SharedShape::cone(
            half_height * scale.y + margin,
            radius * scale.x.max(scale.z) + margin,
        ),
    }
}

const JOINT_AXES: [JointAxis; AXIS_COUNT] = [
    JointAxis::LinX,
    JointAxis::LinY,
    JointAxis::LinZ,
    JointAxis::AngX,
    JointAxis::AngY,
    JointAxis::AngZ,
];

/// Builds the full engine joint from a constraint record. Per axis:
/// `lower <= upper` applies a limit, `lower > upper` leaves the axis free;
/// an enabled spring becomes a position motor holding the axis at rest,
/// undamped when bounce is on and critically damped otherwise.
fn build_joint(c: &Constraint) -> GenericJoint {
    let mut joint = GenericJointBuilder::new(JointAxesMask::empty())
        .local_anchor1(to_point(c.frame_a_offset))
        .local_anchor2(to_point(c.frame_b_offset))
        .build();
    joint.local_frame1.rotation = to_rotation(c.frame_a_rotation);
    joint.local_frame2.rotation = to_rotation(c.frame_b_rotation);

    for i in 0..3 {
        let (lo, hi) = (c.linear_lower_limit[i], c.linear_upper_limit[i]);
        if lo <= hi {
            joint.set_limits(JOINT_AXES[i], [lo, hi]);
        }
        let (lo, hi) = (c.angular_lower_limit[i], c.angular_upper_limit[i]);
        if lo <= hi {
            joint.set_limits(JOINT_AXES[i + 3], [lo, hi]);
        }
    }

    for axis in 0..AXIS_COUNT {
        if c.spring_enabled[axis] {
            let stiffness = c.stiffness[axis];
            let damping = if c.bounce_enabled[axis] {
                0.0
            } else {
                2.0 * stiffness.sqrt()
            };
            joint.set_motor_position(JOINT_AXES[axis], 0.0, stiffness, damping);
        }
    }

    joint.enabled = if c.enabled {
        JointEnabled::Enabled
    } else {
        JointEnabled::Disabled
    };
    joint
}
