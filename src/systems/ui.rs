use std::time::Duration;

use bevy::log::warn;
use bevy::prelude::*;
use bevy_egui::EguiContexts;
use bevy_egui::egui;

use crate::collisions::CollisionMode;
use crate::forces::ForceMethod;
use crate::resources::*;
use crate::simulation::Simulation;

/// Body counts offered by the bulk-generate buttons.
pub const BULK_COUNTS: [usize; 4] = [100, 500, 1000, 10_000];

pub fn ui_controls(
    mut contexts: EguiContexts,
    mut settings: ResMut<SimSettings>,
    mut sim: ResMut<Simulation>,
    stats: Res<StepStats>,
    mut frames_rendered: Local<usize>,
) {
    if *frames_rendered < 5 {
        *frames_rendered += 1;
        return;
    }

    let mut config = sim.config().clone();

    if let Ok(ctx) = contexts.ctx_mut() {
        egui::Window::new("Simulation Controls")
            .default_pos(egui::pos2(10.0, 10.0))
            .max_size([320.0, 560.0])
            .vscroll(true)
            .show(ctx, |ui| {
                ui.heading("Bodies");
                ui.label(format!("Count: {}", sim.len()));
                ui.horizontal(|ui| {
                    ui.selectable_value(&mut settings.pointer_tool, PointerTool::Spawn, "Spawn");
                    ui.selectable_value(&mut settings.pointer_tool, PointerTool::Delete, "Delete");
                    if ui.button("Clear").clicked() {
                        sim.clear();
                    }
                });
                ui.horizontal(|ui| {
                    for count in BULK_COUNTS {
                        if ui.button(count.to_string()).clicked()
                            && let Err(err) =
                                sim.populate(count, DEFAULT_SPAWN_CENTER, DEFAULT_SPREAD)
                        {
                            warn!("could not generate bodies: {err}");
                        }
                    }
                });

                ui.separator();
                ui.heading("Collisions");
                ui.horizontal(|ui| {
                    for mode in CollisionMode::ALL {
                        ui.radio_value(&mut config.collision_mode, mode, mode.label());
                    }
                });
                ui.add_enabled(
                    config.collision_mode == CollisionMode::Inelastic,
                    egui::Slider::new(&mut config.restitution, 0.0..=1.0).text("Restitution"),
                );

                ui.separator();
                ui.heading("Gravity");
                ui.add(
                    egui::Slider::new(&mut config.g, 1e-17..=1e3)
                        .logarithmic(true)
                        .text("G (Gravity)"),
                );
                ui.horizontal(|ui| {
                    ui.radio_value(&mut config.force_method, ForceMethod::BarnesHut, "Barnes-Hut");
                    ui.radio_value(&mut config.force_method, ForceMethod::BruteForce, "Brute force");
                });
                ui.add_enabled(
                    config.force_method == ForceMethod::BarnesHut,
                    egui::Slider::new(&mut config.theta, 0.0..=1.0).text("Theta (Approximation)"),
                );

                ui.add(
                    egui::Slider::new(&mut config.dt, 0.001..=0.05)
                        .logarithmic(true)
                        .text("Time step (s)"),
                );

                let mut budgeted = config.time_budget.is_some();
                let mut budget_ms = config
                    .time_budget
                    .unwrap_or(DEFAULT_TIME_BUDGET)
                    .as_secs_f32()
                    * 1000.0;
                ui.checkbox(&mut budgeted, "Per-pass time budget");
                ui.add_enabled(
                    budgeted,
                    egui::Slider::new(&mut budget_ms, 1.0..=50.0).text("Budget (ms)"),
                );
                config.time_budget =
                    budgeted.then(|| Duration::from_secs_f32(budget_ms.max(1.0) / 1000.0));

                ui.separator();
                ui.heading("Display");
                ui.checkbox(&mut settings.follow_com, "Follow Center of Mass");
                ui.checkbox(&mut settings.show_gizmos, "Show QuadTree Grid");
                ui.label("Pan: Arrow Keys / WASD / Drag");
                ui.label("Zoom: Scroll Wheel");

                if let Some(report) = stats.last {
                    ui.separator();
                    ui.heading("Last Step");
                    ui.label(format!(
                        "{:.2} ms, forces {}/{}{}",
                        report.elapsed.as_secs_f64() * 1000.0,
                        report.forces.visited,
                        sim.len() + report.collisions.removed,
                        if report.forces.truncated { " (truncated)" } else { "" },
                    ));
                    ui.label(format!(
                        "collisions {}, merged {}{}",
                        report.collisions.collisions,
                        report.collisions.removed,
                        if report.collisions.truncated { " (truncated)" } else { "" },
                    ));
                }
            });
    }

    if config != *sim.config()
        && let Err(err) = sim.set_config(config)
    {
        warn!("rejected configuration change: {err}");
    }
}
