//! Constraint authoring record: a declarative 6-DOF joint between two
//! entities.
//!
//! Axes are indexed 0..6: 0-2 are linear x/y/z, 3-5 are angular x/y/z. Limit
//! conventions follow the usual 6-DOF joint rules per axis: `lower == upper`
//! locks the axis, `lower < upper` limits it, `lower > upper` frees it.

use glam::{Quat, Vec3};

use crate::error::{EngineError, EngineResult};
use crate::registry::Handle;
use crate::scene::Entity;

pub const AXIS_COUNT: usize = 6;

fn check_axis(axis: usize) -> EngineResult<()> {
    if axis >= AXIS_COUNT {
        return Err(EngineError::invariant(format!(
            "constraint axis must be in [0,6), got {}",
            axis
        )));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct Constraint {
    pub entity_a: Option<Handle<Entity>>,
    pub entity_b: Option<Handle<Entity>>,

    /// Linear limits default to locked (lower == upper == 0).
    pub linear_lower_limit: Vec3,
    pub linear_upper_limit: Vec3,
    /// Angular limits default to free (lower > upper).
    pub angular_lower_limit: Vec3,
    pub angular_upper_limit: Vec3,

    pub spring_enabled: [bool; AXIS_COUNT],
    pub bounce_enabled: [bool; AXIS_COUNT],
    pub stiffness: [f32; AXIS_COUNT],

    /// Joint frame relative to participant A, in A's local space.
    pub frame_a_offset: Vec3,
    pub frame_a_rotation: Quat,
    /// Joint frame relative to participant B, in B's local space.
    pub frame_b_offset: Vec3,
    pub frame_b_rotation: Quat,

    pub enabled: bool,
}

impl Default for Constraint {
    fn default() -> Self {
        Self {
            entity_a: None,
            entity_b: None,
            linear_lower_limit: Vec3::ZERO,
            linear_upper_limit: Vec3::ZERO,
            angular_lower_limit: Vec3::ONE,
            angular_upper_limit: Vec3::splat(-1.0),
            spring_enabled: [false; AXIS_COUNT],
            bounce_enabled: [false; AXIS_COUNT],
            stiffness: [0.0; AXIS_COUNT],
            frame_a_offset: Vec3::ZERO,
            frame_a_rotation: Quat::IDENTITY,
            frame_b_offset: Vec3::ZERO,
            frame_b_rotation: Quat::IDENTITY,
            enabled: true,
        }
    }
}

impl Constraint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_linear_limits(&mut self, lower: Vec3, upper: Vec3) {
        self.linear_lower_limit = lower;
        self.linear_upper_limit = upper;
    }

    pub fn set_angular_limits(&mut self, lower: Vec3, upper: Vec3) {
        self.angular_lower_limit = lower;
        self.angular_upper_limit = upper;
    }

    /// Turns an axis into a spring with the given stiffness.
    pub fn enable_spring(&mut self, axis: usize, stiffness: f32) -> EngineResult<()> {
        check_axis(axis)?;
        if !stiffness.is_finite() || stiffness < 0.0 {
            return Err(EngineError::invariant(format!(
                "spring stiffness must be finite and non-negative, got {}",
                stiffness
            )));
        }
        self.spring_enabled[axis] = true;
        self.stiffness[axis] = stiffness;
        Ok(())
    }

    pub fn disable_spring(&mut self, axis: usize) -> EngineResult<()> {
        check_axis(axis)?;
        self.spring_enabled[axis] = false;
        Ok(())
    }

    pub fn enable_bounce(&mut self, axis: usize) -> EngineResult<()> {
        check_axis(axis)?;
        self.bounce_enabled[axis] = true;
        Ok(())
    }

    pub fn disable_bounce(&mut self, axis: usize) -> EngineResult<()> {
        check_axis(axis)?;
        self.bounce_enabled[axis] = false;
        Ok(())
    }

    pub fn set_frame_a(&mut self, offset: Vec3, rotation: Quat) {
        self.frame_a_offset = offset;
        self.frame_a_rotation = rotation;
    }

    pub fn set_frame_b(&mut self, offset: Vec3, rotation: Quat) {
        self.frame_b_offset = offset;
        self.frame_b_rotation = rotation;
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}
