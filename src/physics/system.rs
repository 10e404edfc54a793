//! Physics system: lifecycle state machine, simulation thread and the
//! per-step reconciliation of authoring state against the live world.
//!
//! The system owns the [`SimulationWorld`] behind a mutex (the edit lock)
//! and the published contact map behind a second mutex (the contact lock).
//! Every step copies the authoring state out of the scene under read locks
//! before touching the world, so the simulation never observes a
//! half-written user mutation.
//!
//! Lock order: edit lock, then scene table locks, then the contact lock.
//! No step path ever holds the contact lock together with the edit lock.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use glam::{Quat, Vec3};
use log::{debug, info, warn};
use parking_lot::Mutex;

use crate::config::PhysicsConfig;
use crate::error::{EngineError, EngineResult};
use crate::physics::constraint::Constraint;
use crate::physics::world::{BodyAuthoring, ConstraintAuthoring, SimulationWorld};
use crate::registry::Handle;
use crate::scene::{Entity, EntityId, Scene, Transform};

/// Lifecycle of the physics system.
///
/// `initialize` builds the world, `start` spawns the thread, `stop` joins it
/// and tears the world down. `step_once` runs a full step synchronously and
/// is only legal while initialized but not running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Created,
    Idle,
    Running,
    Stopped,
}

impl State {
    fn name(self) -> &'static str {
        match self {
            State::Created => "created",
            State::Idle => "idle",
            State::Running => "running",
            State::Stopped => "stopped",
        }
    }
}

struct SimThread {
    stop_tx: Sender<()>,
    handle: thread::JoinHandle<()>,
}

pub struct PhysicsSystem {
    scene: Arc<Scene>,
    config: PhysicsConfig,
    state: Mutex<State>,
    sim: Arc<Mutex<Option<SimulationWorld>>>,
    contacts: Arc<Mutex<HashMap<EntityId, Vec<EntityId>>>>,
    sim_thread: Mutex<Option<SimThread>>,
}

impl PhysicsSystem {
    pub fn new(scene: Arc<Scene>, config: PhysicsConfig) -> Self {
        Self {
            scene,
            config,
            state: Mutex::new(State::Created),
            sim: Arc::new(Mutex::new(None)),
            contacts: Arc::new(Mutex::new(HashMap::new())),
            sim_thread: Mutex::new(None),
        }
    }

    // === Lifecycle ===

    /// Builds the simulation world. Must be called exactly once, before
    /// `start` or `step_once`.
    pub fn initialize(&self) -> EngineResult<()> {
        let mut state = self.state.lock();
        if *state != State::Created {
            return Err(EngineError::StateError {
                expected: State::Created.name(),
                actual: state.name(),
            });
        }
        self.config.validate()?;
        *self.sim.lock() = Some(SimulationWorld::new(&self.config));
        *state = State::Idle;
        info!("physics system initialized");
        Ok(())
    }

    /// Spawns the simulation thread. Fails if already running or never
    /// initialized; never double-starts.
    pub fn start(&self) -> EngineResult<()> {
        let mut state = self.state.lock();
        if *state != State::Idle {
            return Err(EngineError::StateError {
                expected: State::Idle.name(),
                actual: state.name(),
            });
        }

        let (stop_tx, stop_rx) = bounded::<()>(1);
        let scene = Arc::clone(&self.scene);
        let sim = Arc::clone(&self.sim);
        let contacts = Arc::clone(&self.contacts);
        let poll = Duration::from_micros(self.config.stop_poll_micros);

        let handle = thread::Builder::new()
            .name("prism-physics".to_string())
            .spawn(move || {
                info!("simulation thread started");
                let mut last = Instant::now();
                loop {
                    // Bounded wait doubles as the stop check; shutdown
                    // latency is capped by the poll interval.
                    match stop_rx.recv_timeout(poll) {
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                        Err(RecvTimeoutError::Timeout) => {}
                    }
                    let now = Instant::now();
                    let dt = now.duration_since(last).as_secs_f32();
                    last = now;
                    run_step(&scene, &sim, &contacts, dt);
                }
                info!("simulation thread exiting");
            })?;

        *self.sim_thread.lock() = Some(SimThread { stop_tx, handle });
        *state = State::Running;
        Ok(())
    }

    /// Signals the simulation thread, joins it, and tears the world down.
    /// On return the engine world and every body in it are gone.
    pub fn stop(&self) -> EngineResult<()> {
        let mut state = self.state.lock();
        if *state != State::Running {
            return Err(EngineError::StateError {
                expected: State::Running.name(),
                actual: state.name(),
            });
        }
        let sim_thread = self
            .sim_thread
            .lock()
            .take()
            .ok_or_else(|| EngineError::ThreadError("simulation thread missing".to_string()))?;
        let _ = sim_thread.stop_tx.send(());
        sim_thread
            .handle
            .join()
            .map_err(|_| EngineError::ThreadError("simulation thread panicked".to_string()))?;
        *self.sim.lock() = None;
        self.contacts.lock().clear();
        *state = State::Stopped;
        info!("physics system stopped");
        Ok(())
    }

    /// Runs one full simulation step synchronously, without a thread.
    /// Only legal between `initialize` and `start` (or after construction in
    /// a test that never starts the thread).
    pub fn step_once(&self, dt: f32) -> EngineResult<()> {
        let state = *self.state.lock();
        if state != State::Idle {
            return Err(EngineError::StateError {
                expected: State::Idle.name(),
                actual: state.name(),
            });
        }
        run_step(&self.scene, &self.sim, &self.contacts, dt);
        Ok(())
    }

    // === Eligibility predicates ===

    /// True iff the entity is live and has live Transform, RigidBody and
    /// Collider components.
    pub fn should_have_physics(&self, entity: Handle<Entity>) -> bool {
        let entities = self.scene.entities.read();
        let e = match entities.get(entity) {
            Some(e) => e,
            None => return false,
        };
        let transform_live = e
            .transform
            .map(|h| self.scene.transforms.read().get(h).is_some())
            .unwrap_or(false);
        let body_live = e
            .rigid_body
            .map(|h| self.scene.rigid_bodies.read().get(h).is_some())
            .unwrap_or(false);
        let collider_live = e
            .collider
            .map(|h| self.scene.colliders.read().get(h).is_some())
            .unwrap_or(false);
        transform_live && body_live && collider_live
    }

    /// True iff the entity currently has a live engine body.
    pub fn does_have_physics(&self, entity: Handle<Entity>) -> bool {
        self.sim
            .lock()
            .as_ref()
            .map(|w| w.contains_entity(entity.index()))
            .unwrap_or(false)
    }

    /// True iff the constraint is live, both participants resolve to live
    /// entities, and both participants have live engine bodies. Re-evaluated
    /// continuously by the step loop, never a one-shot decision.
    pub fn should_constraint_exist(&self, constraint: Handle<Constraint>) -> bool {
        // Each lock is released before the next is taken; holding a table
        // lock while acquiring the edit lock would invert run_step's order.
        let refs = self
            .scene
            .constraints
            .read()
            .get(constraint)
            .map(|c| (c.entity_a, c.entity_b));
        let (a, b) = match refs {
            Some((Some(a), Some(b))) => (a, b),
            _ => return false,
        };
        {
            let entities = self.scene.entities.read();
            if entities.get(a).is_none() || entities.get(b).is_none() {
                return false;
            }
        }
        let sim = self.sim.lock();
        match sim.as_ref() {
            Some(w) => w.contains_entity(a.index()) && w.contains_entity(b.index()),
            None => false,
        }
    }

    // === Queries ===

    /// Closest-hit raycast against the live world, resolved to an entity id.
    /// Returns `None` on a miss or when the world does not exist yet.
    pub fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<EntityId> {
        self.sim
            .lock()
            .as_ref()
            .and_then(|w| w.raycast(origin, direction, max_distance))
    }

    /// Entities touching `entity` in the most recently published contact
    /// snapshot. Empty when there are none; never an error.
    pub fn get_contacting_entities(&self, entity: EntityId) -> Vec<EntityId> {
        self.contacts
            .lock()
            .get(&entity)
            .cloned()
            .unwrap_or_default()
    }
}

impl Drop for PhysicsSystem {
    fn drop(&mut self) {
        let running = { *self.state.lock() == State::Running };
        if running {
            warn!("physics system dropped while running; stopping");
            let _ = self.stop();
        }
    }
}

// === Per-step internals ===

struct EntitySnapshot {
    slot: EntityId,
    transform: Option<Handle<Transform>>,
    authoring: Option<BodyAuthoring>,
}

struct ConstraintSnapshot {
    slot: u32,
    authoring: Option<ConstraintAuthoring>,
}

/// Copies the authoring state of every live entity and constraint out of the
/// scene. `authoring` is populated exactly when the record is eligible as
/// far as the scene can tell; constraint eligibility is finalized against
/// the world during reconciliation.
fn snapshot_scene(scene: &Scene) -> (Vec<EntitySnapshot>, Vec<ConstraintSnapshot>) {
    let entities = scene.entities.read();
    let transforms = scene.transforms.read();
    let rigid_bodies = scene.rigid_bodies.read();
    let colliders = scene.colliders.read();
    let constraints = scene.constraints.read();

    let mut entity_snapshots = Vec::with_capacity(entities.len());
    for (handle, entity) in entities.iter() {
        let transform = entity.transform.and_then(|h| transforms.get(h).cloned());
        let body = entity.rigid_body.and_then(|h| rigid_bodies.get(h).cloned());
        let collider = entity.collider.and_then(|h| colliders.get(h).cloned());
        let authoring = match (transform, body, collider) {
            (Some(transform), Some(body), Some(collider)) => Some(BodyAuthoring {
                transform,
                body,
                collider,
            }),
            _ => None,
        };
        entity_snapshots.push(EntitySnapshot {
            slot: handle.index(),
            transform: entity.transform,
            authoring,
        });
    }

    let mut constraint_snapshots = Vec::with_capacity(constraints.len());
    for (handle, constraint) in constraints.iter() {
        let authoring = match (constraint.entity_a, constraint.entity_b) {
            (Some(a), Some(b)) if entities.get(a).is_some() && entities.get(b).is_some() => {
                Some(ConstraintAuthoring {
                    entity_a: a.index(),
                    entity_b: b.index(),
                    constraint: constraint.clone(),
                })
            }
            _ => None,
        };
        constraint_snapshots.push(ConstraintSnapshot {
            slot: handle.index(),
            authoring,
        });
    }

    (entity_snapshots, constraint_snapshots)
}

/// One full simulation step: advance the world, reconcile entities then
/// constraints against the authoring snapshot, write dynamic transforms
/// back, and publish a fresh contact map.
fn run_step(
    scene: &Scene,
    sim: &Mutex<Option<SimulationWorld>>,
    contacts: &Mutex<HashMap<EntityId, Vec<EntityId>>>,
    dt: f32,
) {
    let mut sim_guard = sim.lock();
    let world = match sim_guard.as_mut() {
        Some(world) => world,
        // stop() won the race and tore the world down; nothing to step.
        None => return,
    };

    world.step(dt);

    let (entity_snapshots, constraint_snapshots) = snapshot_scene(scene);

    // Entities. An entity entering the simulation is added but not updated
    // this step; one leaving is removed after any update it would have had.
    let mut writebacks: Vec<(Handle<Transform>, Vec3, Quat)> = Vec::new();
    let mut live = HashSet::new();
    for snapshot in &entity_snapshots {
        let does = world.contains_entity(snapshot.slot);
        match (&snapshot.authoring, does) {
            (Some(authoring), true) => {
                live.insert(snapshot.slot);
                if let Some((position, rotation)) = world.update_entity(snapshot.slot, authoring) {
                    if let Some(handle) = snapshot.transform {
                        writebacks.push((handle, position, rotation));
                    }
                }
            }
            (Some(authoring), false) => {
                debug!("admitting entity {} to simulation", snapshot.slot);
                world.add_entity(snapshot.slot, authoring);
                live.insert(snapshot.slot);
            }
            (None, true) => {
                debug!("evicting entity {} from simulation", snapshot.slot);
                world.remove_entity(snapshot.slot);
            }
            (None, false) => {}
        }
    }
    // Entities deleted from the scene entirely never appear in the snapshot.
    for slot in world.entity_slots() {
        if !live.contains(&slot) {
            debug!("evicting deleted entity {} from simulation", slot);
            world.remove_entity(slot);
        }
    }

    // Constraints, after entities so body admission this step counts.
    let mut live_constraints = HashSet::new();
    for snapshot in &constraint_snapshots {
        let should = snapshot
            .authoring
            .as_ref()
            .map(|a| world.contains_entity(a.entity_a) && world.contains_entity(a.entity_b))
            .unwrap_or(false);
        let does = world.contains_constraint(snapshot.slot);
        match (&snapshot.authoring, should, does) {
            (Some(authoring), true, true) => {
                live_constraints.insert(snapshot.slot);
                world.update_constraint(snapshot.slot, authoring);
            }
            (Some(authoring), true, false) => {
                debug!("admitting constraint {} to simulation", snapshot.slot);
                world.add_constraint(snapshot.slot, authoring);
                live_constraints.insert(snapshot.slot);
            }
            (_, false, true) => {
                debug!("evicting constraint {} from simulation", snapshot.slot);
                world.remove_constraint(snapshot.slot);
            }
            (_, false, false) => {}
            (None, true, _) => unreachable!("constraint eligible without authoring"),
        }
    }
    for slot in world.constraint_slots() {
        if !live_constraints.contains(&slot) {
            world.remove_constraint(slot);
        }
    }

    // Dynamic transform writeback. Last-write-wins against concurrent
    // authors; readers on other threads see either the previous or the
    // current step's value, never a torn one.
    if !writebacks.is_empty() {
        let mut transforms = scene.transforms.write();
        for (handle, position, rotation) in writebacks {
            if let Some(t) = transforms.get_mut(handle) {
                t.position = position;
                t.rotation = rotation;
            }
        }
    }

    let fresh_contacts = world.harvest_contacts();
    drop(sim_guard);

    // Swap, not merge: each step publishes a complete snapshot.
    *contacts.lock() = fresh_contacts;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneConfig;
    use crate::physics::collider::ColliderShape;
    use crate::physics::rigid_body::RigidBody;
    use glam::Vec3;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn system() -> (Arc<Scene>, PhysicsSystem) {
        init_logging();
        let scene = Arc::new(Scene::new(&SceneConfig::default()));
        let system = PhysicsSystem::new(Arc::clone(&scene), PhysicsConfig::default());
        (scene, system)
    }

    /// Creates an entity with the full component set at `position`.
    fn spawn_body(
        scene: &Scene,
        name: &str,
        position: Vec3,
        mass: f32,
        shape: ColliderShape,
    ) -> Handle<Entity> {
        let e = scene.create_entity(name).unwrap();
        let t = scene
            .create_transform(&format!("{}_t", name), Transform::from_position(position))
            .unwrap();
        let mut body = RigidBody::default();
        body.set_mass(mass).unwrap();
        let rb = scene
            .create_rigid_body(&format!("{}_rb", name), body)
            .unwrap();
        let c = scene.create_collider(&format!("{}_c", name), shape).unwrap();
        scene.set_entity_transform(e, t).unwrap();
        scene.set_entity_rigid_body(e, rb).unwrap();
        scene.set_entity_collider(e, c).unwrap();
        e
    }

    fn spawn_floor(scene: &Scene) -> Handle<Entity> {
        spawn_body(
            scene,
            "floor",
            Vec3::new(0.0, -56.0, 0.0),
            0.0,
            ColliderShape::Box {
                half_extents: Vec3::splat(50.0),
            },
        )
    }

    fn spawn_ball(scene: &Scene) -> Handle<Entity> {
        spawn_body(
            scene,
            "ball",
            Vec3::new(0.0, 10.0, 0.0),
            1.0,
            ColliderShape::Sphere { radius: 1.0 },
        )
    }

    fn ball_y(scene: &Scene, ball: Handle<Entity>) -> f32 {
        let t = scene.with_entity(ball, |e| e.transform).unwrap().unwrap();
        scene.with_transform(t, |t| t.position.y).unwrap()
    }

    // --- eligibility ---

    #[test]
    fn test_should_have_physics_truth_table() {
        // All 8 combinations of component presence; only the full set is
        // eligible.
        for bits in 0u32..8 {
            let (scene, system) = system();
            let e = scene.create_entity("e").unwrap();
            if bits & 1 != 0 {
                let t = scene.create_transform("t", Transform::default()).unwrap();
                scene.set_entity_transform(e, t).unwrap();
            }
            if bits & 2 != 0 {
                let rb = scene
                    .create_rigid_body("rb", RigidBody::default())
                    .unwrap();
                scene.set_entity_rigid_body(e, rb).unwrap();
            }
            if bits & 4 != 0 {
                let c = scene
                    .create_collider("c", ColliderShape::Sphere { radius: 1.0 })
                    .unwrap();
                scene.set_entity_collider(e, c).unwrap();
            }
            assert_eq!(
                system.should_have_physics(e),
                bits == 7,
                "combination {:03b}",
                bits
            );
        }
    }

    #[test]
    fn test_should_have_physics_false_for_deleted_entity() {
        let (scene, system) = system();
        let e = spawn_ball(&scene);
        scene.delete_entity(e).unwrap();
        assert!(!system.should_have_physics(e));
    }

    #[test]
    fn test_dead_component_link_makes_ineligible() {
        let (scene, system) = system();
        let e = spawn_ball(&scene);
        assert!(system.should_have_physics(e));
        let c = scene.with_entity(e, |e| e.collider).unwrap().unwrap();
        scene.delete_collider(c).unwrap();
        assert!(!system.should_have_physics(e));
    }

    #[test]
    fn test_constraint_needs_bodies_in_simulation() {
        let (scene, system) = system();
        system.initialize().unwrap();
        let a = spawn_ball(&scene);
        // b is fully configured except for a collider, so it never enters
        // the simulation.
        let b = scene.create_entity("b").unwrap();
        let t = scene.create_transform("b_t", Transform::default()).unwrap();
        let rb = scene
            .create_rigid_body("b_rb", RigidBody::default())
            .unwrap();
        scene.set_entity_transform(b, t).unwrap();
        scene.set_entity_rigid_body(b, rb).unwrap();

        let c = scene.create_constraint("link").unwrap();
        scene.set_constraint_entity_a(c, a).unwrap();
        scene.set_constraint_entity_b(c, b).unwrap();

        system.step_once(1.0 / 60.0).unwrap();
        assert!(system.does_have_physics(a));
        assert!(!system.does_have_physics(b));
        assert!(!system.should_constraint_exist(c));
    }

    // --- reconciliation ---

    #[test]
    fn test_entity_admitted_then_evicted() {
        let (scene, system) = system();
        system.initialize().unwrap();
        let e = spawn_ball(&scene);
        assert!(!system.does_have_physics(e));

        system.step_once(1.0 / 60.0).unwrap();
        assert!(system.does_have_physics(e));

        // Clearing any required link evicts on the next sweep.
        scene.clear_entity_rigid_body(e).unwrap();
        system.step_once(1.0 / 60.0).unwrap();
        assert!(!system.does_have_physics(e));
    }

    #[test]
    fn test_deleted_entity_evicted() {
        let (scene, system) = system();
        system.initialize().unwrap();
        let e = spawn_ball(&scene);
        system.step_once(1.0 / 60.0).unwrap();
        assert!(system.does_have_physics(e));
        scene.delete_entity(e).unwrap();
        system.step_once(1.0 / 60.0).unwrap();
        assert!(!system.does_have_physics(e));
    }

    #[test]
    fn test_constraint_admitted_and_removed_with_bodies() {
        let (scene, system) = system();
        system.initialize().unwrap();
        let a = spawn_ball(&scene);
        let b = spawn_body(
            &scene,
            "other",
            Vec3::new(0.0, 13.0, 0.0),
            1.0,
            ColliderShape::Sphere { radius: 1.0 },
        );
        let c = scene.create_constraint("link").unwrap();
        scene.set_constraint_entity_a(c, a).unwrap();
        scene.set_constraint_entity_b(c, b).unwrap();

        // First step admits the bodies; the constraint sees them the same
        // step because entities reconcile first.
        system.step_once(1.0 / 60.0).unwrap();
        assert!(system.should_constraint_exist(c));

        // Evicting one participant drags the constraint out next sweep.
        scene.clear_entity_collider(b).unwrap();
        system.step_once(1.0 / 60.0).unwrap();
        assert!(!system.should_constraint_exist(c));
    }

    // --- scenario: gravity and resting ---

    #[test]
    fn test_ball_falls_and_rests_on_floor() {
        let (scene, system) = system();
        system.initialize().unwrap();
        let ball = spawn_ball(&scene);
        spawn_floor(&scene);

        // ~10 simulated seconds.
        for _ in 0..600 {
            system.step_once(1.0 / 60.0).unwrap();
        }

        let y = ball_y(&scene, ball);
        assert!(y < 10.0, "ball never fell: y = {}", y);
        assert!(y > -55.0, "ball tunneled through the floor: y = {}", y);
    }

    #[test]
    fn test_kinematic_body_follows_authored_transform() {
        let (scene, system) = system();
        system.initialize().unwrap();
        let e = spawn_ball(&scene);
        let rb = scene.with_entity(e, |e| e.rigid_body).unwrap().unwrap();
        scene.with_rigid_body_mut(rb, |b| b.make_kinematic()).unwrap();

        for _ in 0..60 {
            system.step_once(1.0 / 60.0).unwrap();
        }
        // Gravity never writes back into a kinematic body's transform.
        assert!((ball_y(&scene, e) - 10.0).abs() < 1e-4);

        // Switch to dynamic: the engine takes over and the body falls.
        scene.with_rigid_body_mut(rb, |b| b.make_dynamic()).unwrap();
        for _ in 0..60 {
            system.step_once(1.0 / 60.0).unwrap();
        }
        assert!(ball_y(&scene, e) < 10.0);

        // And back to kinematic: the authored transform rules again.
        scene.with_rigid_body_mut(rb, |b| b.make_kinematic()).unwrap();
        let t = scene.with_entity(e, |e| e.transform).unwrap().unwrap();
        scene
            .with_transform_mut(t, |t| t.set_position(Vec3::new(0.0, 42.0, 0.0)))
            .unwrap();
        for _ in 0..10 {
            system.step_once(1.0 / 60.0).unwrap();
        }
        assert!((ball_y(&scene, e) - 42.0).abs() < 1e-4);
    }

    // --- queries ---

    #[test]
    fn test_raycast_hits_floor_entity() {
        let (scene, system) = system();
        system.initialize().unwrap();
        let floor = spawn_floor(&scene);

        // The world advances before reconciliation, so a body admitted on
        // the first step enters the query structures on the second.
        system.step_once(1.0 / 60.0).unwrap();
        assert_eq!(
            system.raycast(Vec3::new(0.0, 100.0, 0.0), Vec3::NEG_Y, 200.0),
            None
        );
        system.step_once(1.0 / 60.0).unwrap();

        let hit = system.raycast(Vec3::new(0.0, 100.0, 0.0), Vec3::NEG_Y, 200.0);
        assert_eq!(hit, Some(floor.index()));
    }

    #[test]
    fn test_raycast_without_world_or_bodies() {
        let (_scene, system) = system();
        // World does not exist yet.
        assert_eq!(system.raycast(Vec3::ZERO, Vec3::NEG_Y, 100.0), None);
        system.initialize().unwrap();
        // World exists but is empty.
        assert_eq!(system.raycast(Vec3::ZERO, Vec3::NEG_Y, 100.0), None);
    }

    #[test]
    fn test_contact_map_is_replaced_each_step() {
        let (scene, system) = system();
        system.initialize().unwrap();
        let ball = spawn_ball(&scene);
        spawn_floor(&scene);

        for _ in 0..600 {
            system.step_once(1.0 / 60.0).unwrap();
        }
        assert!(!system.get_contacting_entities(ball.index()).is_empty());

        // Teleport the ball far away; the stale pair must vanish, not linger.
        let t = scene.with_entity(ball, |e| e.transform).unwrap().unwrap();
        let rb = scene.with_entity(ball, |e| e.rigid_body).unwrap().unwrap();
        scene.with_rigid_body_mut(rb, |b| b.make_kinematic()).unwrap();
        scene
            .with_transform_mut(t, |t| t.set_position(Vec3::new(0.0, 500.0, 0.0)))
            .unwrap();
        for _ in 0..10 {
            system.step_once(1.0 / 60.0).unwrap();
        }
        assert!(system.get_contacting_entities(ball.index()).is_empty());
    }

    #[test]
    fn test_contacts_for_unknown_entity_empty() {
        let (_scene, system) = system();
        assert!(system.get_contacting_entities(999).is_empty());
    }

    // --- lifecycle ---

    #[test]
    fn test_start_requires_initialize() {
        let (_scene, system) = system();
        assert!(matches!(
            system.start(),
            Err(EngineError::StateError { .. })
        ));
    }

    #[test]
    fn test_double_start_fails() {
        let (_scene, system) = system();
        system.initialize().unwrap();
        system.start().unwrap();
        assert!(matches!(
            system.start(),
            Err(EngineError::StateError { .. })
        ));
        system.stop().unwrap();
    }

    #[test]
    fn test_stop_before_start_fails() {
        let (_scene, system) = system();
        system.initialize().unwrap();
        assert!(matches!(system.stop(), Err(EngineError::StateError { .. })));
    }

    #[test]
    fn test_step_once_while_running_fails() {
        let (_scene, system) = system();
        system.initialize().unwrap();
        system.start().unwrap();
        assert!(matches!(
            system.step_once(0.01),
            Err(EngineError::StateError { .. })
        ));
        system.stop().unwrap();
    }

    #[test]
    fn test_thread_simulates_and_stop_tears_down() {
        let (scene, system) = system();
        system.initialize().unwrap();
        let ball = spawn_ball(&scene);
        spawn_floor(&scene);

        system.start().unwrap();
        thread::sleep(Duration::from_millis(200));
        system.stop().unwrap();

        // The thread ran real steps: gravity moved the ball.
        assert!(ball_y(&scene, ball) < 10.0);
        // And stop() tore the world down.
        assert!(!system.does_have_physics(ball));
        assert!(system.get_contacting_entities(ball.index()).is_empty());
        // Stopped is terminal.
        assert!(matches!(
            system.step_once(0.01),
            Err(EngineError::StateError { .. })
        ));
    }
}
