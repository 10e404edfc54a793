//! Transform component: position, rotation and scale of an entity.

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Where an entity sits in the world.
///
/// This is the single source of truth for entity placement. The simulation
/// writes dynamic-body results back here and reads kinematic targets from
/// here; the render side only reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn get_world_translation(&self) -> Vec3 {
        self.position
    }

    pub fn get_world_rotation(&self) -> Quat {
        self.rotation
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
    }

    /// Matrix taking local-space points into parent space.
    pub fn local_to_parent(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Inverse of [`local_to_parent`](Self::local_to_parent).
    pub fn parent_to_local(&self) -> Mat4 {
        self.local_to_parent().inverse()
    }
}
