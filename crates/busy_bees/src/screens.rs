use bevy::log::info;
use bevy::prelude::*;
use bits_helpers::restart::{
    CleanupMarker, Restartable, cleanup_marked_entities, handle_restart, spawn_restart_button,
};
use bits_helpers::welcome_screen::{despawn_welcome_screen, spawn_welcome_screen, tapped};

use crate::GameState;
use crate::session::Session;

const TITLE: &str = "Busy Bees";
const DISCLAIMER: &str = "Drag every bee into a honeycomb cell before the time runs out.\n\
     Watch out for the slingshot: it knocks bees out of their cells.\n\n\
     This game plays sound.";

impl Restartable for Session {
    fn reset(&mut self) {
        self.restart();
    }

    fn initial_state() -> Self::State {
        GameState::Welcome
    }

    type State = GameState;
}

pub struct ScreensPlugin;

impl Plugin for ScreensPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            OnEnter(GameState::Welcome),
            (cleanup_marked_entities, spawn_welcome),
        )
        .add_systems(OnExit(GameState::Welcome), despawn_welcome_screen)
        .add_systems(OnEnter(GameState::Playing), start_session)
        .add_systems(OnEnter(GameState::Over), spawn_end_screen)
        .add_systems(
            Update,
            (
                start_on_tap.run_if(in_state(GameState::Welcome)),
                handle_restart::<Session>.run_if(in_state(GameState::Over)),
            ),
        );
    }
}

fn spawn_welcome(mut commands: Commands) {
    spawn_welcome_screen(&mut commands, TITLE, DISCLAIMER);
}

fn start_on_tap(
    mouse: Res<ButtonInput<MouseButton>>,
    touches: Res<Touches>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if tapped(&mouse, &touches) {
        next_state.set(GameState::Playing);
    }
}

fn start_session(mut session: ResMut<Session>) {
    session.start();
}

fn spawn_end_screen(mut commands: Commands, session: Res<Session>) {
    info!("{}", session.final_message());
    commands
        .spawn((
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                flex_direction: FlexDirection::Column,
                align_items: AlignItems::Center,
                justify_content: JustifyContent::SpaceEvenly,
                ..default()
            },
            BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.7)),
            CleanupMarker,
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new(session.final_message()),
                TextFont {
                    font_size: 36.0,
                    ..default()
                },
                TextColor(Color::WHITE),
                TextLayout::new_with_justify(JustifyText::Center),
            ));
            spawn_restart_button(parent);
        });
}
