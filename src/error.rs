use thiserror::Error;

/// Errors raised when constructing bodies or configuring a simulation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("mass must be positive and finite, got {0}")]
    InvalidMass(f32),
    #[error("radius must be positive and finite, got {0}")]
    InvalidRadius(f32),
    #[error("time step must be positive and finite, got {0}")]
    InvalidTimeStep(f32),
    #[error("gravitational constant must be positive and finite, got {0}")]
    InvalidGravity(f32),
    #[error("softening must be non-negative and finite, got {0}")]
    InvalidSoftening(f32),
    #[error("theta must be non-negative and finite, got {0}")]
    InvalidTheta(f32),
    #[error("restitution must lie in [0, 1], got {0}")]
    InvalidRestitution(f32),
    #[error("node capacity must be at least 1")]
    InvalidCapacity,
    #[error("time budget must be non-zero; use None to disable it")]
    ZeroTimeBudget,
    #[error("spread must be non-negative and finite, got {0}")]
    InvalidSpread(f32),
}

pub type Result<T> = std::result::Result<T, SimError>;
