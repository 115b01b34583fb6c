use bevy::log::debug;
use bevy::prelude::*;
use bits_helpers::floating_text::spawn_floating_text;
use bits_helpers::input::{just_pressed_world_position, just_released, pressed_world_position};

use crate::GameState;
use crate::bee::BeeId;
use crate::session::{EndReason, Session};
use crate::stage::{BEE_RADIUS, BeeSprite, StageSet};

pub struct InputPlugin;

impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (drag_bees, escape_on_key)
                .before(StageSet)
                .run_if(in_state(GameState::Playing)),
        );
    }
}

/// Bees under `pointer`, closest first.
fn bees_under(pointer: Vec2, bees: &Query<(&BeeSprite, &Transform)>) -> Vec<(BeeId, Vec2)> {
    let mut hits: Vec<(BeeId, Vec2, f32)> = bees
        .iter()
        .filter_map(|(sprite, transform)| {
            let position = transform.translation.truncate();
            let distance = position.distance(pointer);
            (distance <= BEE_RADIUS * transform.scale.x).then_some((sprite.0, position, distance))
        })
        .collect();
    hits.sort_by(|a, b| a.2.total_cmp(&b.2));
    hits.into_iter()
        .map(|(bee, position, _)| (bee, position))
        .collect()
}

fn pick_up(
    commands: &mut Commands,
    session: &mut Session,
    pointer: Vec2,
    bees: &Query<(&BeeSprite, &Transform)>,
) {
    for (bee, position) in bees_under(pointer, bees) {
        match session.begin_drag(bee, pointer, position) {
            Ok(()) => {
                if let Some(emotion) = session.swarm().get(bee).map(|bee| bee.emotion) {
                    spawn_floating_text(
                        commands,
                        position + Vec2::new(0.0, BEE_RADIUS * 2.0),
                        emotion.message(),
                        emotion.color(),
                    );
                }
                return;
            }
            Err(rejected) => debug!("Press ignored: {rejected}"),
        }
    }
}

fn drag_bees(
    mut commands: Commands,
    mut session: ResMut<Session>,
    mouse: Res<ButtonInput<MouseButton>>,
    touches: Res<Touches>,
    windows: Query<&Window>,
    camera: Query<(&Camera, &GlobalTransform)>,
    bees: Query<(&BeeSprite, &Transform)>,
) {
    if !session.is_dragging() {
        if let Some(pointer) = just_pressed_world_position(&mouse, &touches, &windows, &camera) {
            pick_up(&mut commands, &mut session, pointer, &bees);
        }
    }
    if !session.is_dragging() {
        return;
    }

    if let Some(pointer) = pressed_world_position(&mouse, &touches, &windows, &camera) {
        session.drag_to(pointer);
    }
    if just_released(&mouse, &touches) {
        let outcome = session.end_drag();
        debug!("Drop: {outcome:?}");
    }
}

fn escape_on_key(keys: Res<ButtonInput<KeyCode>>, mut session: ResMut<Session>) {
    if keys.just_pressed(KeyCode::Escape) {
        session.end(EndReason::Escaped);
    }
}
