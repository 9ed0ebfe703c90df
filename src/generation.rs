use bevy::prelude::*;
use rand::Rng;

use crate::body::Body;
use crate::error::{Result, SimError};

/// Largest velocity component given to a generated body.
pub const GENERATED_SPEED: f32 = 50.0;
pub const GENERATED_MIN_MASS: f32 = 0.5;
pub const GENERATED_MAX_MASS: f32 = 2.0;
/// Radius per unit mass of a generated body.
pub const RADIUS_PER_MASS: f32 = 5.0;

/// Scatters `count` bodies uniformly over the square of half-width `spread` around `center`.
pub fn generate<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    center: Vec2,
    spread: f32,
) -> Result<Vec<Body>> {
    if !(spread.is_finite() && spread >= 0.0) {
        return Err(SimError::InvalidSpread(spread));
    }

    (0..count)
        .map(|_| -> Result<Body> {
            let offset = vec2(
                rng.random_range(-spread..=spread),
                rng.random_range(-spread..=spread),
            );
            let velocity = vec2(
                rng.random_range(-GENERATED_SPEED..=GENERATED_SPEED),
                rng.random_range(-GENERATED_SPEED..=GENERATED_SPEED),
            );
            let mass = rng.random_range(GENERATED_MIN_MASS..=GENERATED_MAX_MASS);

            Ok(Body::new(center + offset, mass, mass * RADIUS_PER_MASS)?
                .with_velocity(velocity)
                .with_color(Color::hsl(200.0 + mass * 40.0, 0.8, 0.6)))
        })
        .collect()
}
