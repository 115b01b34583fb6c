use bevy::log::error;
use bevy::prelude::*;
use ribbit::BusyBees;

pub mod bee;
pub mod config;
pub mod drag;
pub mod hive;
pub mod schedule;
pub mod session;
pub mod slingshot;
pub mod tween;

mod audio;
mod input;
mod ribbit;
mod screens;
mod stage;
mod ui;

pub use config::{ConfigError, GameConfig};
pub use session::Session;

#[derive(States, Default, Debug, Clone, PartialEq, Eq, Hash)]
pub enum GameState {
    #[default]
    Welcome,
    Playing,
    Over,
}

pub fn run() {
    let session = match Session::new(GameConfig::default()) {
        Ok(session) => session,
        Err(err) => {
            error!("Busy Bees cannot start: {err}");
            return;
        }
    };

    bits_helpers::get_default_app::<BusyBees>(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
        .init_state::<GameState>()
        .insert_resource(session)
        .add_plugins(stage::StagePlugin)
        .add_plugins(input::InputPlugin)
        .add_plugins(audio::GameAudioPlugin)
        .add_plugins(ui::UiPlugin)
        .add_plugins(screens::ScreensPlugin)
        .add_systems(Startup, spawn_camera)
        .run();
}

fn spawn_camera(mut commands: Commands) {
    commands.spawn(Camera2d);
}
