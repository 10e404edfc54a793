//! Engine configuration structs.
//!
//! All configs are serde-compatible so the bootstrap layer can load them from
//! TOML; every field has a sensible default for programmatic construction.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Tuning parameters for the physics simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// World-space gravity vector.
    pub gravity: Vec3,
    /// Fixed substep duration in seconds. The solver never integrates a
    /// larger step than this.
    pub fixed_timestep: f32,
    /// Maximum substeps consumed per simulation step. Bounds the work done
    /// when the loop falls behind real time.
    pub max_substeps: u32,
    /// Interval in microseconds at which the simulation thread polls its
    /// stop signal. Bounds shutdown latency.
    pub stop_poll_micros: u64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            fixed_timestep: 1.0 / 120.0,
            max_substeps: 100,
            stop_poll_micros: 100,
        }
    }
}

impl PhysicsConfig {
    /// Parses a config from a TOML string.
    pub fn from_toml_str(input: &str) -> EngineResult<Self> {
        let config: Self =
            toml::from_str(input).map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects non-physical parameter combinations.
    pub fn validate(&self) -> EngineResult<()> {
        if !self.fixed_timestep.is_finite() || self.fixed_timestep <= 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "fixed_timestep must be positive, got {}",
                self.fixed_timestep
            )));
        }
        if self.max_substeps == 0 {
            return Err(EngineError::InvalidConfig(
                "max_substeps must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Capacities for the scene's fixed-size component tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub max_entities: usize,
    pub max_transforms: usize,
    pub max_rigid_bodies: usize,
    pub max_colliders: usize,
    pub max_constraints: usize,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            max_entities: 1024,
            max_transforms: 1024,
            max_rigid_bodies: 1024,
            max_colliders: 1024,
            max_constraints: 256,
        }
    }
}
