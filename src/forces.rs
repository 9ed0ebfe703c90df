use std::time::Duration;

use bevy::log::debug;
use bevy::prelude::*;

use crate::body::Body;
use crate::budget::StepBudget;
use crate::quadtree::{QuadTree, TreeEntry};
use crate::resources::SimConfig;

/// Strategy used to accumulate gravitational forces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ForceMethod {
    /// Quadtree approximation, O(n log n).
    #[default]
    BarnesHut,
    /// Exact pairwise sum, O(n²).
    BruteForce,
}

/// The subset of [`SimConfig`] a force query needs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ForceParams {
    pub g: f32,
    pub softening: f32,
    pub theta: f32,
}

impl From<&SimConfig> for ForceParams {
    fn from(config: &SimConfig) -> Self {
        Self {
            g: config.g,
            softening: config.softening,
            theta: config.theta,
        }
    }
}

/// Outcome of one force-evaluation pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ForceReport {
    /// Bodies that received at least part of their force this pass.
    pub visited: usize,
    pub truncated: bool,
}

/// Softened Newtonian pull on a body at `position` toward a mass at `source`.
///
/// Coincident positions yield zero rather than a division fault.
pub fn pairwise_attraction(
    position: Vec2,
    mass: f32,
    source: Vec2,
    source_mass: f32,
    params: &ForceParams,
) -> Vec2 {
    let delta = source - position;
    let distance_sq = delta.length_squared();
    if distance_sq == 0.0 {
        return Vec2::ZERO;
    }
    let distance = distance_sq.sqrt();
    let magnitude = params.g * source_mass * mass / (distance_sq + params.softening);
    delta / distance * magnitude
}

/// Resets every body's force, then accumulates gravity until done or out of time.
///
/// On truncation the bodies not yet reached keep a zero force for this pass.
pub fn evaluate(
    bodies: &mut [Body],
    method: ForceMethod,
    config: &SimConfig,
    time_limit: Option<Duration>,
) -> ForceReport {
    let budget = StepBudget::start(time_limit);
    let params = ForceParams::from(config);

    for body in bodies.iter_mut() {
        body.reset_force();
    }

    let report = match method {
        ForceMethod::BarnesHut => barnes_hut(bodies, config, &params, &budget),
        ForceMethod::BruteForce => brute_force(bodies, &params, &budget),
    };

    if report.truncated {
        debug!(
            visited = report.visited,
            total = bodies.len(),
            elapsed_us = budget.elapsed().as_micros() as u64,
            "force pass hit its time budget"
        );
    }
    report
}

fn barnes_hut(
    bodies: &mut [Body],
    config: &SimConfig,
    params: &ForceParams,
    budget: &StepBudget,
) -> ForceReport {
    let tree = QuadTree::build(bodies, config.node_capacity, config.aggregation);
    let mut report = ForceReport::default();

    for (index, body) in bodies.iter_mut().enumerate() {
        if budget.exhausted() {
            report.truncated = true;
            break;
        }
        let force = tree.compute_force(&TreeEntry::from_body(index, body), params);
        body.apply_force(force);
        report.visited += 1;
    }
    report
}

fn brute_force(bodies: &mut [Body], params: &ForceParams, budget: &StepBudget) -> ForceReport {
    let mut report = ForceReport::default();

    for i in 0..bodies.len() {
        if budget.exhausted() {
            report.truncated = true;
            break;
        }

        let (position, mass) = (bodies[i].position, bodies[i].mass);
        let mut force = Vec2::ZERO;
        for (j, other) in bodies.iter().enumerate() {
            if i == j {
                continue;
            }
            if budget.exhausted() {
                report.truncated = true;
                break;
            }
            force += pairwise_attraction(position, mass, other.position, other.mass, params);
        }

        bodies[i].apply_force(force);
        report.visited += 1;
        if report.truncated {
            break;
        }
    }
    report
}
