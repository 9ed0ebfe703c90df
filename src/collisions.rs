//! Pairwise overlap detection and the three collision response laws.
//!
//! Detection is an exact scan over index pairs `(i, j)` with `i < j`. Each
//! overlapping pair is resolved once per pass, in scan order, so a body's
//! velocity after an early pair feeds the later pairs it takes part in.

use std::time::Duration;

use bevy::log::debug;

use crate::body::Body;
use crate::budget::StepBudget;
use crate::resources::SimConfig;

/// Response applied to every overlapping pair.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CollisionMode {
    /// Impulse exchange along the contact normal with no energy loss.
    #[default]
    Elastic,
    /// Impulse scaled by `1 + restitution`; loses energy.
    Inelastic,
    /// The earlier body absorbs the later one.
    Merge,
}

impl CollisionMode {
    pub const ALL: [CollisionMode; 3] = [
        CollisionMode::Elastic,
        CollisionMode::Merge,
        CollisionMode::Inelastic,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CollisionMode::Elastic => "Elastic",
            CollisionMode::Inelastic => "Inelastic",
            CollisionMode::Merge => "Merge",
        }
    }
}

/// Where a merged body ends up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MergePlacement {
    /// Mass-weighted average of the two positions.
    #[default]
    CenterOfMass,
    /// `(p_a * M + p_b * m_b) / M` with `M` the combined mass: the survivor
    /// keeps its own position and is pushed by the absorbed body's share.
    ///
    /// The result depends on which body survives, so swapping input order
    /// moves the merged body.
    CombinedMassWeight,
}

/// Outcome of one collision pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CollisionReport {
    pub collisions: usize,
    pub removed: usize,
    pub truncated: bool,
}

/// Detects and resolves overlaps, then drops merged-away bodies in one pass.
///
/// Survivors keep their relative order.
pub fn resolve(
    bodies: &mut Vec<Body>,
    mode: CollisionMode,
    config: &SimConfig,
    time_limit: Option<Duration>,
) -> CollisionReport {
    let budget = StepBudget::start(time_limit);
    let mut removed = vec![false; bodies.len()];
    let mut report = CollisionReport::default();

    'outer: for i in 0..bodies.len() {
        if budget.exhausted() {
            report.truncated = true;
            break;
        }
        if removed[i] {
            continue;
        }

        for j in (i + 1)..bodies.len() {
            if budget.exhausted() {
                report.truncated = true;
                break 'outer;
            }
            if removed[j] {
                continue;
            }

            let (head, tail) = bodies.split_at_mut(j);
            let (a, b) = (&mut head[i], &mut tail[0]);
            if !a.collides_with(b) {
                continue;
            }

            report.collisions += 1;
            match mode {
                CollisionMode::Elastic => elastic_collide(a, b),
                CollisionMode::Inelastic => inelastic_collide(a, b, config.restitution),
                CollisionMode::Merge => {
                    merge_into(a, b, config.merge_placement);
                    removed[j] = true;
                    report.removed += 1;
                }
            }
        }
    }

    if report.removed > 0 {
        let mut index = 0;
        bodies.retain(|_| {
            let keep = !removed[index];
            index += 1;
            keep
        });
        debug!(removed = report.removed, remaining = bodies.len(), "merged bodies");
    }
    if report.truncated {
        debug!(
            collisions = report.collisions,
            elapsed_us = budget.elapsed().as_micros() as u64,
            "collision pass hit its time budget"
        );
    }
    report
}

/// Lossless impulse exchange along the line of centers.
pub fn elastic_collide(a: &mut Body, b: &mut Body) {
    exchange_impulse(a, b, 2.0);
}

/// Impulse exchange keeping `restitution` of the normal relative velocity.
pub fn inelastic_collide(a: &mut Body, b: &mut Body, restitution: f32) {
    exchange_impulse(a, b, 1.0 + restitution);
}

fn exchange_impulse(a: &mut Body, b: &mut Body, coefficient: f32) {
    let delta = b.position - a.position;
    let distance = delta.length();
    if distance == 0.0 {
        return;
    }
    let normal = delta / distance;

    let approach = (b.velocity - a.velocity).dot(normal);
    let impulse = coefficient * approach / (1.0 / a.mass + 1.0 / b.mass);
    a.velocity += normal * (impulse / a.mass);
    b.velocity -= normal * (impulse / b.mass);
}

/// Folds `absorbed` into `survivor`, conserving mass and momentum.
///
/// The radius grows so that disk area is conserved.
pub fn merge_into(survivor: &mut Body, absorbed: &Body, placement: MergePlacement) {
    let total_mass = survivor.mass + absorbed.mass;
    let velocity = (survivor.momentum() + absorbed.momentum()) / total_mass;
    let position = match placement {
        MergePlacement::CenterOfMass => {
            (survivor.position * survivor.mass + absorbed.position * absorbed.mass) / total_mass
        }
        MergePlacement::CombinedMassWeight => {
            (survivor.position * total_mass + absorbed.position * absorbed.mass) / total_mass
        }
    };

    survivor.radius = (survivor.radius.powi(2) + absorbed.radius.powi(2)).sqrt();
    survivor.mass = total_mass;
    survivor.velocity = velocity;
    survivor.position = position;
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::prelude::*;

    fn body(x: f32, y: f32, vx: f32, vy: f32, mass: f32, radius: f32) -> Body {
        Body::new(vec2(x, y), mass, radius)
            .unwrap()
            .with_velocity(vec2(vx, vy))
    }

    fn momentum(bodies: &[Body]) -> Vec2 {
        bodies.iter().map(Body::momentum).sum()
    }

    fn energy(bodies: &[Body]) -> f32 {
        bodies.iter().map(Body::kinetic_energy).sum()
    }

    fn head_on() -> Vec<Body> {
        vec![
            body(0.0, 0.0, 3.0, 0.5, 1.0, 1.0),
            body(1.5, 0.2, -1.0, 0.0, 3.0, 1.0),
        ]
    }

    fn run(bodies: &mut Vec<Body>, mode: CollisionMode) -> CollisionReport {
        resolve(bodies, mode, &SimConfig::default(), None)
    }

    #[test]
    fn elastic_conserves_momentum_and_energy() {
        let mut bodies = head_on();
        let (p0, e0) = (momentum(&bodies), energy(&bodies));

        let report = run(&mut bodies, CollisionMode::Elastic);

        assert_eq!(report.collisions, 1);
        assert_eq!(bodies.len(), 2);
        assert!((momentum(&bodies) - p0).length() < 1e-5);
        assert!((energy(&bodies) - e0).abs() < 1e-4);
        assert!(bodies[0].velocity.x < 3.0, "lighter body should be pushed back");
    }

    #[test]
    fn elastic_equal_masses_swap_normal_velocity() {
        let mut bodies = vec![
            body(0.0, 0.0, 1.0, 0.0, 1.0, 1.0),
            body(1.0, 0.0, -1.0, 0.0, 1.0, 1.0),
        ];
        run(&mut bodies, CollisionMode::Elastic);
        assert!((bodies[0].velocity - vec2(-1.0, 0.0)).length() < 1e-6);
        assert!((bodies[1].velocity - vec2(1.0, 0.0)).length() < 1e-6);
        // Positions are not separated.
        assert_eq!(bodies[0].position, Vec2::ZERO);
    }

    #[test]
    fn inelastic_conserves_momentum_and_loses_energy() {
        let mut bodies = head_on();
        let (p0, e0) = (momentum(&bodies), energy(&bodies));

        run(&mut bodies, CollisionMode::Inelastic);

        assert!((momentum(&bodies) - p0).length() < 1e-5);
        assert!(energy(&bodies) < e0);
    }

    #[test]
    fn zero_restitution_leaves_no_normal_separation_speed() {
        let mut bodies = head_on();
        let config = SimConfig::default().with_restitution(0.0);
        resolve(&mut bodies, CollisionMode::Inelastic, &config, None);

        let normal = (bodies[1].position - bodies[0].position).normalize();
        let separation = (bodies[1].velocity - bodies[0].velocity).dot(normal);
        assert!(separation.abs() < 1e-5);
    }

    #[test]
    fn coincident_bodies_are_left_alone() {
        let mut bodies = vec![
            body(2.0, 2.0, 1.0, 0.0, 1.0, 1.0),
            body(2.0, 2.0, -1.0, 0.0, 1.0, 1.0),
        ];
        let before = bodies.clone();
        for mode in [CollisionMode::Elastic, CollisionMode::Inelastic] {
            run(&mut bodies, mode);
            assert_eq!(bodies, before);
        }
    }

    #[test]
    fn swapping_input_order_gives_same_state() {
        for mode in [CollisionMode::Elastic, CollisionMode::Inelastic] {
            let mut forward = head_on();
            let mut backward: Vec<Body> = head_on().into_iter().rev().collect();

            run(&mut forward, mode);
            run(&mut backward, mode);

            assert!((forward[0].velocity - backward[1].velocity).length() < 1e-5);
            assert!((forward[1].velocity - backward[0].velocity).length() < 1e-5);
        }
    }

    #[test]
    fn merge_is_symmetric_under_input_order() {
        let pair = || {
            vec![
                body(0.0, 0.0, 1.0, 0.0, 1.0, 1.0),
                body(1.0, 0.0, 0.0, 2.0, 3.0, 1.0),
            ]
        };
        let mut forward = pair();
        let mut backward: Vec<Body> = pair().into_iter().rev().collect();

        run(&mut forward, CollisionMode::Merge);
        run(&mut backward, CollisionMode::Merge);

        assert_eq!((forward.len(), backward.len()), (1, 1));
        let (a, b) = (&forward[0], &backward[0]);
        assert_eq!(a.mass, b.mass);
        assert!((a.position - vec2(0.75, 0.0)).length() < 1e-6);
        assert!((a.position - b.position).length() < 1e-6);
        assert!((a.velocity - vec2(0.25, 1.5)).length() < 1e-6);
        assert!((a.velocity - b.velocity).length() < 1e-6);
        assert!((a.radius - b.radius).abs() < 1e-6);
    }

    #[test]
    fn combined_mass_weight_depends_on_survivor() {
        let config = SimConfig::default().with_merge_placement(MergePlacement::CombinedMassWeight);
        let pair = || {
            vec![
                body(0.0, 0.0, 0.0, 0.0, 1.0, 1.0),
                body(1.0, 0.0, 0.0, 0.0, 3.0, 1.0),
            ]
        };
        let mut forward = pair();
        let mut backward: Vec<Body> = pair().into_iter().rev().collect();

        resolve(&mut forward, CollisionMode::Merge, &config, None);
        resolve(&mut backward, CollisionMode::Merge, &config, None);

        assert!((forward[0].position - vec2(0.75, 0.0)).length() < 1e-6);
        assert!((backward[0].position - vec2(1.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn separated_bodies_are_untouched() {
        let mut bodies = vec![
            body(0.0, 0.0, 1.0, 0.0, 1.0, 1.0),
            body(2.0, 0.0, -1.0, 0.0, 1.0, 1.0),
        ];
        let before = bodies.clone();
        let report = run(&mut bodies, CollisionMode::Merge);
        assert_eq!(report, CollisionReport::default());
        assert_eq!(bodies, before);
    }

    #[test]
    fn merge_combines_pair_into_one() {
        let mut bodies = head_on();
        let (p0, e0) = (momentum(&bodies), energy(&bodies));

        let report = run(&mut bodies, CollisionMode::Merge);

        assert_eq!(report.removed, 1);
        assert_eq!(bodies.len(), 1);
        let merged = &bodies[0];
        assert_eq!(merged.mass, 4.0);
        assert!((merged.velocity - p0 / 4.0).length() < 1e-6);
        assert!((merged.radius - 2.0_f32.sqrt()).abs() < 1e-6);
        assert!(energy(&bodies) < e0);
    }

    #[test]
    fn merge_placement_variants() {
        let absorbed = body(4.0, 0.0, 0.0, 0.0, 3.0, 1.0);

        let mut survivor = body(0.0, 0.0, 0.0, 0.0, 1.0, 1.0);
        merge_into(&mut survivor, &absorbed, MergePlacement::CenterOfMass);
        assert!((survivor.position - vec2(3.0, 0.0)).length() < 1e-6);

        let mut survivor = body(1.0, 0.0, 0.0, 0.0, 1.0, 1.0);
        merge_into(&mut survivor, &absorbed, MergePlacement::CombinedMassWeight);
        assert!((survivor.position - vec2(4.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn merge_chains_through_a_cluster() {
        let mut bodies = vec![
            body(0.0, 0.0, 0.0, 0.0, 1.0, 2.0),
            body(1.0, 0.0, 0.0, 0.0, 1.0, 2.0),
            body(2.0, 0.0, 0.0, 0.0, 1.0, 2.0),
        ];
        let report = run(&mut bodies, CollisionMode::Merge);
        assert_eq!(report.removed, 2);
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0].mass, 3.0);
    }

    #[test]
    fn merge_keeps_survivor_order() {
        let mut bodies = vec![
            body(0.0, 0.0, 0.0, 0.0, 1.0, 1.0),
            body(100.0, 0.0, 0.0, 0.0, 2.0, 1.0),
            body(0.5, 0.0, 0.0, 0.0, 1.0, 1.0),
            body(200.0, 0.0, 0.0, 0.0, 5.0, 1.0),
        ];
        run(&mut bodies, CollisionMode::Merge);
        let masses: Vec<f32> = bodies.iter().map(|body| body.mass).collect();
        assert_eq!(masses, vec![2.0, 2.0, 5.0]);
    }

    #[test]
    fn collision_pass_respects_time_budget() {
        let mut bodies: Vec<Body> = (0..3000)
            .map(|i| body(i as f32 * 10.0, 0.0, 0.0, 0.0, 1.0, 1.0))
            .collect();
        let report = resolve(
            &mut bodies,
            CollisionMode::Merge,
            &SimConfig::default(),
            Some(Duration::from_millis(1)),
        );
        assert!(report.truncated);
        assert_eq!(bodies.len(), 3000);
    }
}
