use bevy::prelude::*;

use crate::error::{Result, SimError};

/// A point mass with a collision radius.
///
/// `force` accumulates during a force-evaluation pass and is consumed by the
/// integrator; outside that window its value is stale.
#[derive(Clone, Debug, PartialEq)]
pub struct Body {
    pub position: Vec2,
    pub velocity: Vec2,
    pub mass: f32,
    pub radius: f32,
    pub force: Vec2,
    /// Render tint. The physics never reads it.
    pub color: Color,
}

impl Body {
    /// Creates a body at rest, rejecting non-positive mass or radius.
    pub fn new(position: Vec2, mass: f32, radius: f32) -> Result<Self> {
        if !(mass.is_finite() && mass > 0.0) {
            return Err(SimError::InvalidMass(mass));
        }
        if !(radius.is_finite() && radius > 0.0) {
            return Err(SimError::InvalidRadius(radius));
        }
        Ok(Self {
            position,
            velocity: Vec2::ZERO,
            mass,
            radius,
            force: Vec2::ZERO,
            color: Color::WHITE,
        })
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn reset_force(&mut self) {
        self.force = Vec2::ZERO;
    }

    pub fn apply_force(&mut self, force: Vec2) {
        self.force += force;
    }

    pub fn momentum(&self) -> Vec2 {
        self.velocity * self.mass
    }

    pub fn kinetic_energy(&self) -> f32 {
        0.5 * self.mass * self.velocity.length_squared()
    }

    pub fn distance_to(&self, other: &Body) -> f32 {
        self.position.distance(other.position)
    }

    /// True when the two disks overlap; touching disks do not collide.
    pub fn collides_with(&self, other: &Body) -> bool {
        self.distance_to(other) < self.radius + other.radius
    }

    pub fn contains_point(&self, point: Vec2) -> bool {
        self.position.distance_squared(point) < self.radius * self.radius
    }
}
