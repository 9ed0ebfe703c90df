use std::time::Duration;

use bevy::input::mouse::{AccumulatedMouseMotion, MouseWheel};
use bevy::log::{debug, trace, warn};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_egui::input::EguiWantsInput;

use crate::quadtree::QuadTree;
use crate::resources::*;
use crate::simulation::Simulation;

/// Spawns the 2D camera. Bodies are drawn as gizmos, so nothing else is spawned.
pub fn setup_scene(mut commands: Commands) {
    commands.spawn(Camera2d);
}

/// Advances the simulation by one fixed step and records the report.
pub fn physics_tick(mut sim: ResMut<Simulation>, mut stats: ResMut<StepStats>) {
    let report = sim.step();
    stats.ticks += 1;
    trace!(
        bodies = sim.len(),
        visited = report.forces.visited,
        collisions = report.collisions.collisions,
        elapsed_us = report.elapsed.as_micros() as u64,
        "physics tick"
    );
    stats.last = Some(report);
}

/// Draws every body as a circle in its own color.
pub fn draw_bodies(mut gizmos: Gizmos, sim: Res<Simulation>) {
    for body in sim.bodies() {
        gizmos.circle_2d(
            Isometry2d::from_translation(body.position),
            body.radius,
            body.color,
        );
    }
}

/// Keeps the fixed-timestep clock in step with the configured `dt`.
pub fn sync_fixed_timestep(sim: Res<Simulation>, mut fixed: ResMut<Time<Fixed>>) {
    if !sim.is_changed() {
        return;
    }
    let Ok(dt) = Duration::try_from_secs_f32(sim.config().dt) else {
        return;
    };
    if !dt.is_zero() && fixed.timestep() != dt {
        debug!(dt_ms = dt.as_secs_f64() * 1000.0, "fixed timestep changed");
        fixed.set_timestep(dt);
    }
}

/// Quadtree kept for the overlay between physics ticks.
#[derive(Default)]
pub struct OverlayTree(Option<QuadTree>);

impl OverlayTree {
    /// Rebuilds from `sim` only when it changed or nothing is cached yet.
    pub fn refresh(&mut self, sim: &Simulation, changed: bool) -> &QuadTree {
        if changed {
            self.0 = None;
        }
        self.0.get_or_insert_with(|| {
            let config = sim.config();
            QuadTree::build(sim.bodies(), config.node_capacity, config.aggregation)
        })
    }

    pub fn clear(&mut self) {
        self.0 = None;
    }
}

/// Renders the bounds of subdivided quadtree nodes when gizmo display is enabled.
pub fn draw_quadtree_gizmos(
    mut gizmos: Gizmos,
    sim: Res<Simulation>,
    settings: Res<SimSettings>,
    mut overlay: Local<OverlayTree>,
) {
    if !settings.show_gizmos || sim.is_empty() {
        overlay.clear();
        return;
    }

    let tree = overlay.refresh(&sim, sim.is_changed());
    let color = Color::srgba(0.0, 1.0, 0.0, 0.1);
    let mut stack = vec![tree];

    while let Some(node) = stack.pop() {
        if let Some(children) = node.children() {
            let size = node.region().size();
            if size.x.max(size.y) >= MIN_GIZMO_NODE_SIZE {
                gizmos.rect_2d(Isometry2d::from_translation(node.region().center), size, color);
            }
            stack.extend(children.iter());
        }
    }
}

/// Moves the camera toward the weighted center of mass when follow mode is enabled.
pub fn update_camera_follow(
    mut camera_query: Query<&mut Transform, With<Camera>>,
    sim: Res<Simulation>,
    settings: Res<SimSettings>,
    time: Res<Time>,
) {
    if !settings.follow_com {
        return;
    }

    if let Some(com) = sim.center_of_mass()
        && let Ok(mut cam_transform) = camera_query.single_mut()
    {
        let target = com.extend(0.0);
        let current = cam_transform.translation;
        let smooth_speed = 5.0 * time.delta_secs();

        cam_transform.translation = current.lerp(target, smooth_speed);
    }
}

/// Handles pan (keys, right drag, left drag with no tool armed) and zoom unless the UI has focus.
#[allow(clippy::too_many_arguments)]
pub fn camera_controls(
    keyboard: Res<ButtonInput<KeyCode>>,
    buttons: Res<ButtonInput<MouseButton>>,
    motion: Res<AccumulatedMouseMotion>,
    mut mouse_wheel: MessageReader<MouseWheel>,
    mut query: Query<&mut Transform, With<Camera>>,
    time: Res<Time>,
    settings: Res<SimSettings>,
    egui_input: Res<EguiWantsInput>,
) {
    if egui_input.wants_any_pointer_input() {
        return;
    }

    let manual_pan_enabled = !settings.follow_com;

    if let Ok(mut transform) = query.single_mut() {
        let mut scale = transform.scale.x;

        if manual_pan_enabled {
            let mut direction = Vec3::ZERO;
            if keyboard.pressed(KeyCode::ArrowLeft) || keyboard.pressed(KeyCode::KeyA) {
                direction.x -= 1.0;
            }
            if keyboard.pressed(KeyCode::ArrowRight) || keyboard.pressed(KeyCode::KeyD) {
                direction.x += 1.0;
            }
            if keyboard.pressed(KeyCode::ArrowUp) || keyboard.pressed(KeyCode::KeyW) {
                direction.y += 1.0;
            }
            if keyboard.pressed(KeyCode::ArrowDown) || keyboard.pressed(KeyCode::KeyS) {
                direction.y -= 1.0;
            }

            if direction.length_squared() > 0.0 {
                transform.translation += direction.normalize() * 500.0 * scale * time.delta_secs();
            }

            let dragging = buttons.pressed(MouseButton::Right)
                || (settings.pointer_tool == PointerTool::Pan
                    && buttons.pressed(MouseButton::Left));
            if dragging {
                // Screen y grows downward.
                transform.translation.x -= motion.delta.x * scale;
                transform.translation.y += motion.delta.y * scale;
            }
        }

        for event in mouse_wheel.read() {
            if event.y.abs() == 0.0 {
                continue;
            }
            let zoom_factor = 1.1;
            if event.y > 0.0 {
                scale /= zoom_factor;
            } else {
                scale *= zoom_factor;
            }
        }

        scale = scale.clamp(0.1, 10.0);
        transform.scale = Vec3::splat(scale);
    }
}

/// Applies the armed pointer tool at the clicked world position, then disarms it.
pub fn pointer_actions(
    buttons: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform)>,
    egui_input: Res<EguiWantsInput>,
    mut settings: ResMut<SimSettings>,
    mut sim: ResMut<Simulation>,
) {
    if settings.pointer_tool == PointerTool::Pan
        || egui_input.wants_any_pointer_input()
        || !buttons.just_pressed(MouseButton::Left)
    {
        return;
    }

    let Ok(window) = windows.single() else {
        return;
    };
    let Ok((camera, camera_transform)) = cameras.single() else {
        return;
    };
    let Some(world_position) = window
        .cursor_position()
        .and_then(|cursor| camera.viewport_to_world_2d(camera_transform, cursor).ok())
    else {
        return;
    };

    match settings.pointer_tool {
        PointerTool::Spawn => {
            if let Err(err) = sim.spawn_at(world_position) {
                warn!("could not spawn body: {err}");
            }
        }
        PointerTool::Delete => {
            if sim.remove_at(world_position).is_none() {
                debug!(?world_position, "no body under cursor");
            }
        }
        PointerTool::Pan => {}
    }
    settings.pointer_tool = PointerTool::Pan;
}
