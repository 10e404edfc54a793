// Prism Engine - scene and physics core
//
// The crate maintains a scene of entities with transforms and physics
// authoring components, and runs a physics simulation in lockstep with them
// on a dedicated thread. Rendering, windowing and asset loading live in the
// consuming application; this crate only owns the scene tables and the
// simulation.

// Foundation
pub mod config;
pub mod error;
pub mod registry;

// Scene and simulation
pub mod physics;
pub mod scene;

pub use config::{PhysicsConfig, SceneConfig};
pub use error::{EngineError, EngineResult};
pub use physics::{
    Collider, ColliderShape, Constraint, PhysicsSystem, RigidBody, RigidBodyMode,
};
pub use registry::{ComponentTable, Handle};
pub use scene::{Entity, EntityId, Scene, Transform};
