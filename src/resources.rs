use std::time::Duration;

use bevy::prelude::*;

use crate::collisions::{CollisionMode, MergePlacement};
use crate::error::{Result, SimError};
use crate::forces::ForceMethod;
use crate::quadtree::Aggregation;
use crate::simulation::StepReport;

// --- Simulation Defaults ---
/// Default gravitational constant, scaled down for screen-sized worlds.
pub const DEFAULT_G: f32 = 6.674_30e-17;
/// Default Barnes-Hut theta threshold.
pub const DEFAULT_THETA: f32 = 0.5;
/// Default fixed timestep for physics.
pub const DEFAULT_DT: f32 = 0.016;
/// Added to squared distance to bound the force between close bodies.
pub const DEFAULT_SOFTENING: f32 = 0.1;
/// Wall-clock allowance for each of the force and collision passes.
pub const DEFAULT_TIME_BUDGET: Duration = Duration::from_millis(16);
/// Fraction of normal relative velocity kept by an inelastic collision.
pub const DEFAULT_RESTITUTION: f32 = 0.5;
/// Bodies held directly by a quadtree node before it subdivides.
pub const DEFAULT_NODE_CAPACITY: usize = 4;

/// Mass of a body spawned by hand.
pub const DEFAULT_MASS: f32 = 1.0;
/// Radius of a body spawned by hand.
pub const DEFAULT_RADIUS: f32 = 5.0;
/// Center used by the bulk-generate controls.
pub const DEFAULT_SPAWN_CENTER: Vec2 = Vec2::ZERO;
/// Half-width of the square used by the bulk-generate controls.
pub const DEFAULT_SPREAD: f32 = 100.0;
/// Smallest quadtree node size that will be drawn as a gizmo.
pub const MIN_GIZMO_NODE_SIZE: f32 = 2.0;

/// Tunable simulation parameters threaded through every stage of a tick.
#[derive(Clone, Debug, PartialEq)]
pub struct SimConfig {
    pub g: f32,
    pub theta: f32,
    pub softening: f32,
    pub dt: f32,
    /// Per-pass limit for force evaluation and collision resolution.
    pub time_budget: Option<Duration>,
    pub force_method: ForceMethod,
    pub collision_mode: CollisionMode,
    pub restitution: f32,
    pub node_capacity: usize,
    pub aggregation: Aggregation,
    pub merge_placement: MergePlacement,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            g: DEFAULT_G,
            theta: DEFAULT_THETA,
            softening: DEFAULT_SOFTENING,
            dt: DEFAULT_DT,
            time_budget: Some(DEFAULT_TIME_BUDGET),
            force_method: ForceMethod::default(),
            collision_mode: CollisionMode::default(),
            restitution: DEFAULT_RESTITUTION,
            node_capacity: DEFAULT_NODE_CAPACITY,
            aggregation: Aggregation::default(),
            merge_placement: MergePlacement::default(),
        }
    }
}

impl SimConfig {
    pub fn with_g(mut self, g: f32) -> Self {
        self.g = g;
        self
    }

    pub fn with_theta(mut self, theta: f32) -> Self {
        self.theta = theta;
        self
    }

    pub fn with_softening(mut self, softening: f32) -> Self {
        self.softening = softening;
        self
    }

    pub fn with_dt(mut self, dt: f32) -> Self {
        self.dt = dt;
        self
    }

    pub fn with_time_budget(mut self, time_budget: Option<Duration>) -> Self {
        self.time_budget = time_budget;
        self
    }

    pub fn with_force_method(mut self, force_method: ForceMethod) -> Self {
        self.force_method = force_method;
        self
    }

    pub fn with_collision_mode(mut self, collision_mode: CollisionMode) -> Self {
        self.collision_mode = collision_mode;
        self
    }

    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }

    pub fn with_node_capacity(mut self, node_capacity: usize) -> Self {
        self.node_capacity = node_capacity;
        self
    }

    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    pub fn with_merge_placement(mut self, merge_placement: MergePlacement) -> Self {
        self.merge_placement = merge_placement;
        self
    }

    /// Rejects values that would otherwise leak NaN or infinity into body state.
    pub fn validate(&self) -> Result<()> {
        if !(self.g.is_finite() && self.g > 0.0) {
            return Err(SimError::InvalidGravity(self.g));
        }
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(SimError::InvalidTimeStep(self.dt));
        }
        if !(self.softening.is_finite() && self.softening >= 0.0) {
            return Err(SimError::InvalidSoftening(self.softening));
        }
        if !(self.theta.is_finite() && self.theta >= 0.0) {
            return Err(SimError::InvalidTheta(self.theta));
        }
        if !(0.0..=1.0).contains(&self.restitution) {
            return Err(SimError::InvalidRestitution(self.restitution));
        }
        if self.node_capacity == 0 {
            return Err(SimError::InvalidCapacity);
        }
        if self.time_budget == Some(Duration::ZERO) {
            return Err(SimError::ZeroTimeBudget);
        }
        Ok(())
    }
}

/// One-shot pointer action armed from the UI, consumed by the next click.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PointerTool {
    #[default]
    Pan,
    Spawn,
    Delete,
}

/// User-facing toggles that drive rendering and input behavior.
#[derive(Resource)]
pub struct SimSettings {
    pub follow_com: bool,
    pub show_gizmos: bool,
    pub pointer_tool: PointerTool,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            follow_com: false,
            show_gizmos: false,
            pointer_tool: PointerTool::Pan,
        }
    }
}

/// Outcome of the most recent physics tick, for display.
#[derive(Resource, Default)]
pub struct StepStats {
    pub last: Option<StepReport>,
    pub ticks: u64,
}
