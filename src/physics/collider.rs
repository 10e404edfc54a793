//! Collider authoring record: a collision shape plus scale and margin.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Supported collision shape primitives.
///
/// Dimensions are in local space, before the collider's scale is applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ColliderShape {
    Box { half_extents: Vec3 },
    Sphere { radius: f32 },
    Capsule { radius: f32, half_height: f32 },
    Cylinder { radius: f32, half_height: f32 },
    Cone { radius: f32, half_height: f32 },
}

impl ColliderShape {
    /// Rejects shapes with non-positive or non-finite dimensions.
    pub fn validate(&self) -> EngineResult<()> {
        let check = |name: &str, v: f32| -> EngineResult<()> {
            if !v.is_finite() || v <= 0.0 {
                return Err(EngineError::InvalidShape(format!(
                    "{} must be finite and positive, got {}",
                    name, v
                )));
            }
            Ok(())
        };
        match *self {
            ColliderShape::Box { half_extents } => {
                check("box half extent x", half_extents.x)?;
                check("box half extent y", half_extents.y)?;
                check("box half extent z", half_extents.z)
            }
            ColliderShape::Sphere { radius } => check("sphere radius", radius),
            ColliderShape::Capsule {
                radius,
                half_height,
            } => {
                check("capsule radius", radius)?;
                check("capsule half height", half_height)
            }
            ColliderShape::Cylinder {
                radius,
                half_height,
            } => {
                check("cylinder radius", radius)?;
                check("cylinder half height", half_height)
            }
            ColliderShape::Cone {
                radius,
                half_height,
            } => {
                check("cone radius", radius)?;
                check("cone half height", half_height)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    pub shape: ColliderShape,
    pub scale: Vec3,
    /// Extra shape inflation in meters. Zero by default.
    pub margin: f32,
}

impl Collider {
    /// Validates the shape up front so a bad description fails before any
    /// table slot is claimed.
    pub fn new(shape: ColliderShape) -> EngineResult<Self> {
        shape.validate()?;
        Ok(Self {
            shape,
            scale: Vec3::ONE,
            margin: 0.0,
        })
    }

    pub fn get_collision_shape(&self) -> ColliderShape {
        self.shape
    }

    pub fn set_shape(&mut self, shape: ColliderShape) -> EngineResult<()> {
        shape.validate()?;
        self.shape = shape;
        Ok(())
    }

    pub fn set_scale(&mut self, scale: Vec3) -> EngineResult<()> {
        if !scale.is_finite() || scale.min_element() <= 0.0 {
            return Err(EngineError::InvalidShape(format!(
                "collider scale must be finite and positive, got {:?}",
                scale
            )));
        }
        self.scale = scale;
        Ok(())
    }

    pub fn set_margin(&mut self, margin: f32) -> EngineResult<()> {
        if !margin.is_finite() || margin < 0.0 {
            return Err(EngineError::InvalidShape(format!(
                "collider margin must be finite and non-negative, got {}",
                margin
            )));
        }
        self.margin = margin;
        Ok(())
    }
}
