use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::window::WindowResolution;
use bevy_egui::{EguiPlugin, EguiPrimaryContextPass};

use nbody_sandbox::resources::{DEFAULT_DT, SimSettings, StepStats};
use nbody_sandbox::simulation::Simulation;
use nbody_sandbox::systems::*;

fn main() {
    App::new()
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "2D N-Body Sandbox".into(),
                        resolution: WindowResolution::new(1000, 800),
                        ..default()
                    }),
                    ..default()
                })
                .set(LogPlugin {
                    filter: "wgpu=error,naga=warn,nbody_sandbox=info".into(),
                    ..default()
                }),
        )
        .add_plugins(EguiPlugin::default())
        .insert_resource(ClearColor(Color::BLACK))
        .init_resource::<Simulation>()
        .init_resource::<SimSettings>()
        .init_resource::<StepStats>()
        .add_systems(EguiPrimaryContextPass, ui_controls)
        .add_systems(Startup, setup_scene)
        .add_systems(
            Update,
            (
                sync_fixed_timestep,
                pointer_actions,
                camera_controls,
                update_camera_follow,
                draw_bodies,
                draw_quadtree_gizmos,
            )
                .chain(),
        )
        .add_systems(FixedUpdate, physics_tick)
        .insert_resource(Time::<Fixed>::from_seconds(DEFAULT_DT as f64))
        .run();
}
