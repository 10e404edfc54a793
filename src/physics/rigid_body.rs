//! Rigid body authoring record.
//!
//! Purely declarative: mass, friction and mode describe the desired physical
//! behavior of an entity. No live simulation handle lives here; the
//! simulation keeps its own shadow state and diffs against these values once
//! per step.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// How the simulation drives a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RigidBodyMode {
    /// Immovable. Participates in collisions but never integrates.
    Static,
    /// Fully simulated; the simulation writes the resulting transform back.
    Dynamic,
    /// Driven by the authored transform; pushes other bodies, is never pushed.
    Kinematic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RigidBody {
    pub mode: RigidBodyMode,
    pub mass: f32,
    pub friction: f32,
    pub rolling_friction: f32,
    pub spinning_friction: f32,
}

impl Default for RigidBody {
    fn default() -> Self {
        Self {
            mode: RigidBodyMode::Dynamic,
            mass: 1.0,
            friction: 0.5,
            rolling_friction: 0.0,
            spinning_friction: 0.0,
        }
    }
}

fn check_non_negative(name: &str, value: f32) -> EngineResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(EngineError::invariant(format!(
            "{} must be finite and non-negative, got {}",
            name, value
        )));
    }
    Ok(())
}

impl RigidBody {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the body mass in kilograms. Zero is legal and means the body
    /// behaves as static regardless of mode.
    pub fn set_mass(&mut self, mass: f32) -> EngineResult<()> {
        check_non_negative("mass", mass)?;
        self.mass = mass;
        Ok(())
    }

    pub fn set_friction(&mut self, friction: f32) -> EngineResult<()> {
        check_non_negative("friction", friction)?;
        self.friction = friction;
        Ok(())
    }

    pub fn set_rolling_friction(&mut self, friction: f32) -> EngineResult<()> {
        check_non_negative("rolling friction", friction)?;
        self.rolling_friction = friction;
        Ok(())
    }

    pub fn set_spinning_friction(&mut self, friction: f32) -> EngineResult<()> {
        check_non_negative("spinning friction", friction)?;
        self.spinning_friction = friction;
        Ok(())
    }

    pub fn make_static(&mut self) {
        self.mode = RigidBodyMode::Static;
    }

    pub fn make_dynamic(&mut self) {
        self.mode = RigidBodyMode::Dynamic;
    }

    pub fn make_kinematic(&mut self) {
        self.mode = RigidBodyMode::Kinematic;
    }

    pub fn is_static(&self) -> bool {
        self.mode == RigidBodyMode::Static
    }

    pub fn is_dynamic(&self) -> bool {
        self.mode == RigidBodyMode::Dynamic
    }

    pub fn is_kinematic(&self) -> bool {
        self.mode == RigidBodyMode::Kinematic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let rb = RigidBody::new();
        assert_eq!(rb.mode, RigidBodyMode::Dynamic);
        assert!((rb.mass - 1.0).abs() < f32::EPSILON);
        assert!((rb.friction - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_negative_mass_rejected() {
        let mut rb = RigidBody::new();
        assert!(rb.set_mass(-1.0).is_err());
        assert!(rb.set_mass(f32::NAN).is_err());
        // The stored value is untouched by a failed set.
        assert!((rb.mass - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_zero_mass_allowed() {
        let mut rb = RigidBody::new();
        rb.set_mass(0.0).unwrap();
        assert_eq!(rb.mass, 0.0);
    }

    #[test]
    fn test_mode_transitions_idempotent() {
        let mut rb = RigidBody::new();
        rb.make_kinematic();
        rb.make_dynamic();
        rb.make_kinematic();
        let twice = rb.mode;
        let mut direct = RigidBody::new();
        direct.make_kinematic();
        assert_eq!(twice, direct.mode);
    }
}
