//! Two-dimensional N-body gravity with collision response under a per-frame
//! time budget, plus the Bevy systems that host it.

pub mod body;
pub mod budget;
pub mod collisions;
pub mod error;
pub mod forces;
pub mod generation;
pub mod integrator;
pub mod quadtree;
pub mod resources;
pub mod simulation;
pub mod systems;

pub use body::Body;
pub use collisions::{CollisionMode, MergePlacement};
pub use error::{Result, SimError};
pub use forces::ForceMethod;
pub use quadtree::{Aggregation, QuadTree, Region};
pub use resources::SimConfig;
pub use simulation::{Simulation, StepReport};
