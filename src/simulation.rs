use std::time::{Duration, Instant};

use bevy::log::{debug, info};
use bevy::prelude::*;
use rand::{SeedableRng, rngs::StdRng};

use crate::body::Body;
use crate::collisions::{self, CollisionMode, CollisionReport};
use crate::error::Result;
use crate::forces::{self, ForceReport};
use crate::generation;
use crate::integrator;
use crate::resources::{DEFAULT_MASS, DEFAULT_RADIUS, SimConfig};

/// Timing and outcome of one [`Simulation::step`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StepReport {
    pub forces: ForceReport,
    pub collisions: CollisionReport,
    pub elapsed: Duration,
}

/// The body collection together with the configuration that drives it.
#[derive(Resource)]
pub struct Simulation {
    bodies: Vec<Body>,
    config: SimConfig,
    rng: StdRng,
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            bodies: Vec::new(),
            config: SimConfig::default(),
            rng: StdRng::from_os_rng(),
        }
    }
}

impl Simulation {
    pub fn new(config: SimConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..default()
        })
    }

    /// Like [`Simulation::new`] but with a reproducible generator for [`Simulation::populate`].
    pub fn with_seed(config: SimConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            bodies: Vec::new(),
            config,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Replaces the configuration; the old one stays in place if the new one is invalid.
    pub fn set_config(&mut self, config: SimConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn set_collision_mode(&mut self, mode: CollisionMode) {
        self.config.collision_mode = mode;
    }

    /// Runs one tick: forces, then integration, then collisions.
    pub fn step(&mut self) -> StepReport {
        let started = Instant::now();
        let config = &self.config;

        let forces = forces::evaluate(
            &mut self.bodies,
            config.force_method,
            config,
            config.time_budget,
        );
        integrator::step(&mut self.bodies, config.dt);
        let collisions = collisions::resolve(
            &mut self.bodies,
            config.collision_mode,
            config,
            config.time_budget,
        );

        StepReport {
            forces,
            collisions,
            elapsed: started.elapsed(),
        }
    }

    pub fn add_body(&mut self, body: Body) -> Result<()> {
        // Fields are public, so re-check what `Body::new` guarantees.
        Body::new(body.position, body.mass, body.radius)?;
        self.bodies.push(body);
        Ok(())
    }

    /// Adds a body at rest with the default mass and radius.
    pub fn spawn_at(&mut self, position: Vec2) -> Result<()> {
        let body = Body::new(position, DEFAULT_MASS, DEFAULT_RADIUS)?;
        debug!(?position, "spawned body");
        self.bodies.push(body);
        Ok(())
    }

    /// Removes the body closest to `point` among those whose disk covers it.
    pub fn remove_at(&mut self, point: Vec2) -> Option<Body> {
        let index = self
            .bodies
            .iter()
            .enumerate()
            .filter(|(_, body)| body.contains_point(point))
            .min_by(|(_, a), (_, b)| {
                a.position
                    .distance_squared(point)
                    .total_cmp(&b.position.distance_squared(point))
            })
            .map(|(index, _)| index)?;
        debug!(?point, index, "removed body");
        Some(self.bodies.remove(index))
    }

    pub fn clear(&mut self) {
        info!(count = self.bodies.len(), "cleared bodies");
        self.bodies.clear();
    }

    /// Appends `count` generated bodies and returns the new total.
    pub fn populate(&mut self, count: usize, center: Vec2, spread: f32) -> Result<usize> {
        let generated = generation::generate(&mut self.rng, count, center, spread)?;
        self.bodies.extend(generated);
        info!(count, total = self.bodies.len(), "generated bodies");
        Ok(self.bodies.len())
    }

    pub fn total_mass(&self) -> f32 {
        self.bodies.iter().map(|body| body.mass).sum()
    }

    pub fn center_of_mass(&self) -> Option<Vec2> {
        let total_mass = self.total_mass();
        if total_mass <= 0.0 {
            return None;
        }
        let weighted: Vec2 = self
            .bodies
            .iter()
            .map(|body| body.position * body.mass)
            .sum();
        Some(weighted / total_mass)
    }

    pub fn total_momentum(&self) -> Vec2 {
        self.bodies.iter().map(Body::momentum).sum()
    }

    pub fn kinetic_energy(&self) -> f32 {
        self.bodies.iter().map(Body::kinetic_energy).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;
    use crate::forces::ForceMethod;

    fn seeded(config: SimConfig) -> Simulation {
        Simulation::with_seed(config, 42).unwrap()
    }

    #[test]
    fn new_rejects_invalid_config() {
        let config = SimConfig::default().with_dt(-0.1);
        assert!(matches!(
            Simulation::new(config),
            Err(SimError::InvalidTimeStep(_))
        ));
    }

    #[test]
    fn set_config_keeps_old_on_error() {
        let mut sim = seeded(SimConfig::default());
        let err = sim.set_config(SimConfig::default().with_restitution(2.0));
        assert!(err.is_err());
        assert_eq!(sim.config(), &SimConfig::default());
    }

    #[test]
    fn merge_step_combines_overlapping_pair() {
        let mut sim = seeded(
            SimConfig::default()
                .with_collision_mode(CollisionMode::Merge)
                .with_time_budget(None),
        );
        sim.add_body(
            Body::new(Vec2::ZERO, 1.0, 3.0)
                .unwrap()
                .with_velocity(vec2(2.0, 0.0)),
        )
        .unwrap();
        sim.add_body(
            Body::new(vec2(4.0, 0.0), 3.0, 3.0)
                .unwrap()
                .with_velocity(vec2(0.0, 4.0)),
        )
        .unwrap();
        let momentum = sim.total_momentum();

        let report = sim.step();

        assert_eq!(report.collisions.removed, 1);
        assert_eq!(sim.len(), 1);
        assert_eq!(sim.bodies()[0].mass, 4.0);
        assert!((sim.total_momentum() - momentum).length() < 1e-4);
        assert!((sim.bodies()[0].velocity - vec2(0.5, 3.0)).length() < 1e-4);
    }

    #[test]
    fn step_on_empty_simulation_is_a_no_op() {
        let mut sim = seeded(SimConfig::default());
        let report = sim.step();
        assert!(sim.is_empty());
        assert_eq!(report.forces, ForceReport::default());
        assert_eq!(report.collisions, CollisionReport::default());
    }

    #[test]
    fn distant_pair_drifts_toward_each_other() {
        let mut sim = seeded(SimConfig::default().with_g(1000.0));
        sim.spawn_at(Vec2::ZERO).unwrap();
        sim.spawn_at(vec2(100.0, 0.0)).unwrap();

        sim.step();

        assert!(sim.bodies()[0].velocity.x > 0.0);
        assert!(sim.bodies()[1].velocity.x < 0.0);
        assert!(sim.total_momentum().length() < 1e-4);
    }

    #[test]
    fn brute_force_step_matches_barnes_hut_for_a_pair() {
        let mut tree = seeded(SimConfig::default().with_g(1000.0));
        let mut exact = seeded(
            SimConfig::default()
                .with_g(1000.0)
                .with_force_method(ForceMethod::BruteForce),
        );
        for sim in [&mut tree, &mut exact] {
            sim.spawn_at(Vec2::ZERO).unwrap();
            sim.spawn_at(vec2(100.0, 0.0)).unwrap();
            sim.step();
        }

        assert_eq!(exact.config().force_method, ForceMethod::BruteForce);
        assert_eq!(tree.bodies(), exact.bodies());
    }

    #[test]
    fn remove_at_picks_nearest_covering_body() {
        let mut sim = seeded(SimConfig::default());
        sim.spawn_at(vec2(0.0, 0.0)).unwrap();
        sim.spawn_at(vec2(3.0, 0.0)).unwrap();
        sim.spawn_at(vec2(50.0, 0.0)).unwrap();

        let removed = sim.remove_at(vec2(2.0, 0.0)).unwrap();
        assert_eq!(removed.position, vec2(3.0, 0.0));
        assert_eq!(sim.len(), 2);

        assert!(sim.remove_at(vec2(25.0, 0.0)).is_none());
        assert_eq!(sim.len(), 2);
    }

    #[test]
    fn add_body_rejects_tampered_mass() {
        let mut sim = seeded(SimConfig::default());
        let mut body = Body::new(Vec2::ZERO, 1.0, 1.0).unwrap();
        body.mass = 0.0;
        assert_eq!(sim.add_body(body), Err(SimError::InvalidMass(0.0)));
        assert!(sim.is_empty());
    }

    #[test]
    fn populate_and_clear() {
        let mut sim = seeded(SimConfig::default());
        assert_eq!(sim.populate(100, Vec2::ZERO, 100.0).unwrap(), 100);
        assert_eq!(sim.populate(50, vec2(500.0, 0.0), 10.0).unwrap(), 150);
        assert!(sim.center_of_mass().is_some());

        sim.clear();
        assert!(sim.is_empty());
        assert_eq!(sim.center_of_mass(), None);
    }

    #[test]
    fn center_of_mass_is_mass_weighted() {
        let mut sim = seeded(SimConfig::default());
        sim.add_body(Body::new(Vec2::ZERO, 1.0, 1.0).unwrap()).unwrap();
        sim.add_body(Body::new(vec2(4.0, 8.0), 3.0, 1.0).unwrap())
            .unwrap();
        let com = sim.center_of_mass().unwrap();
        assert!((com - vec2(3.0, 6.0)).length() < 1e-6);
    }

    #[test]
    fn set_collision_mode_switches_response() {
        let mut sim = seeded(SimConfig::default());
        sim.set_collision_mode(CollisionMode::Inelastic);
        assert_eq!(sim.config().collision_mode, CollisionMode::Inelastic);
    }
}
