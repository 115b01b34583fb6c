use bevy::prelude::*;

use crate::GameState;
use crate::session::{EndReason, Session};

#[derive(Resource, Default)]
pub struct MatchUI {
    matched: u32,
    total: usize,
    visibility: Visibility,
    is_dirty: bool,
}

impl MatchUI {
    pub fn update(&mut self, matched: u32, total: usize) {
        if (matched, total) != (self.matched, self.total) {
            self.matched = matched;
            self.total = total;
            self.is_dirty = true;
        }
    }

    pub fn set_visibility(&mut self, new_visibility: Visibility) {
        self.visibility = new_visibility;
        self.is_dirty = true;
    }
}

#[derive(Resource, Default)]
pub struct ClockUI {
    seconds: u32,
    visibility: Visibility,
    is_dirty: bool,
}

impl ClockUI {
    pub fn update(&mut self, seconds: u32) {
        if seconds != self.seconds {
            self.seconds = seconds;
            self.is_dirty = true;
        }
    }

    pub fn set_visibility(&mut self, new_visibility: Visibility) {
        self.visibility = new_visibility;
        self.is_dirty = true;
    }
}

/// Minutes and zero padded seconds, like `2:05`.
pub fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

#[derive(Component)]
struct MatchText;

#[derive(Component)]
struct ClockText;

#[derive(Component)]
struct EscapeButton;

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MatchUI>()
            .init_resource::<ClockUI>()
            .add_systems(Startup, setup)
            .add_systems(OnEnter(GameState::Welcome), hide_hud)
            .add_systems(OnEnter(GameState::Playing), show_hud)
            .add_systems(OnEnter(GameState::Over), hide_escape_button)
            .add_systems(
                Update,
                (
                    press_escape.run_if(in_state(GameState::Playing)),
                    follow_session,
                    update_matches,
                    update_clock,
                )
                    .chain(),
            );
    }
}

fn setup(mut commands: Commands) {
    commands
        .spawn(Node {
            width: Val::Percent(100.),
            height: Val::Percent(100.),
            display: Display::Grid,
            grid_template_rows: vec![GridTrack::auto(), GridTrack::flex(1.), GridTrack::auto()],
            padding: UiRect::all(Val::Px(8.)),
            ..default()
        })
        .with_children(|parent| {
            parent
                .spawn(Node {
                    display: Display::Grid,
                    grid_template_columns: RepeatedGridTrack::fr(2, 1.),
                    ..default()
                })
                .with_children(|parent| {
                    parent.spawn((
                        Node {
                            justify_self: JustifySelf::Start,
                            ..default()
                        },
                        Text::new(""),
                        Visibility::Hidden,
                        MatchText,
                    ));
                    parent.spawn((
                        Node {
                            justify_self: JustifySelf::End,
                            ..default()
                        },
                        Text::new(""),
                        Visibility::Hidden,
                        ClockText,
                    ));
                });
            parent.spawn(Node::default());
            parent
                .spawn((
                    Button,
                    Node {
                        justify_self: JustifySelf::Center,
                        padding: UiRect::axes(Val::Px(16.), Val::Px(6.)),
                        ..default()
                    },
                    BackgroundColor(Color::srgba(0.25, 0.25, 0.25, 0.75)),
                    Visibility::Hidden,
                    EscapeButton,
                ))
                .with_children(|parent| {
                    parent.spawn((Text::new("Escape"), TextColor(Color::WHITE)));
                });
        });
}

fn hide_hud(
    mut matches: ResMut<MatchUI>,
    mut clock: ResMut<ClockUI>,
    mut escape: Query<&mut Visibility, With<EscapeButton>>,
) {
    matches.set_visibility(Visibility::Hidden);
    clock.set_visibility(Visibility::Hidden);
    for mut visibility in &mut escape {
        *visibility = Visibility::Hidden;
    }
}

fn show_hud(
    mut matches: ResMut<MatchUI>,
    mut clock: ResMut<ClockUI>,
    mut escape: Query<&mut Visibility, With<EscapeButton>>,
) {
    matches.set_visibility(Visibility::Inherited);
    clock.set_visibility(Visibility::Inherited);
    for mut visibility in &mut escape {
        *visibility = Visibility::Inherited;
    }
}

fn hide_escape_button(mut escape: Query<&mut Visibility, With<EscapeButton>>) {
    for mut visibility in &mut escape {
        *visibility = Visibility::Hidden;
    }
}

fn follow_session(session: Res<Session>, mut matches: ResMut<MatchUI>, mut clock: ResMut<ClockUI>) {
    matches.update(session.matched(), session.config().bee_count);
    clock.update(session.time_remaining());
}

fn press_escape(
    mut session: ResMut<Session>,
    interactions: Query<&Interaction, (Changed<Interaction>, With<EscapeButton>)>,
) {
    for interaction in &interactions {
        if *interaction == Interaction::Pressed {
            session.end(EndReason::Escaped);
        }
    }
}

fn update_matches(
    mut matches: ResMut<MatchUI>,
    mut query: Query<(&mut Text, &mut Visibility), With<MatchText>>,
) {
    if matches.is_dirty {
        for (mut text, mut visibility) in &mut query {
            *text = Text::new(format!("Bees {}/{}", matches.matched, matches.total));
            *visibility = matches.visibility;
        }
        matches.is_dirty = false;
    }
}

fn update_clock(
    mut clock: ResMut<ClockUI>,
    mut query: Query<(&mut Text, &mut Visibility), With<ClockText>>,
) {
    if clock.is_dirty {
        for (mut text, mut visibility) in &mut query {
            *text = Text::new(format_clock(clock.seconds));
            *visibility = clock.visibility;
        }
        clock.is_dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_shows_minutes_and_padded_seconds() {
        assert_eq!(format_clock(180), "3:00", "full game");
        assert_eq!(format_clock(125), "2:05", "padded seconds");
        assert_eq!(format_clock(9), "0:09", "last seconds");
        assert_eq!(format_clock(0), "0:00", "time is up");
    }

    #[test]
    fn unchanged_values_do_not_redraw() {
        let mut matches = MatchUI::default();
        matches.update(0, 0);
        assert!(!matches.is_dirty, "same values");
        matches.update(1, 25);
        assert!(matches.is_dirty, "new count");

        let mut clock = ClockUI::default();
        clock.update(0);
        assert!(!clock.is_dirty, "same time");
        clock.update(179);
        assert!(clock.is_dirty, "a second passed");
    }
}
