//! Physics simulation integration.
//!
//! Authoring records ([`RigidBody`], [`Collider`], [`Constraint`]) describe
//! desired behavior; [`PhysicsSystem`] reconciles them against the live
//! [`SimulationWorld`] once per step and publishes results back to the scene.

pub mod collider;
pub mod constraint;
pub mod rigid_body;
pub mod system;
pub mod world;

pub use collider::{Collider, ColliderShape};
pub use constraint::{Constraint, AXIS_COUNT};
pub use rigid_body::{RigidBody, RigidBodyMode};
pub use system::PhysicsSystem;
pub use world::SimulationWorld;
