use core::time::Duration;

use bevy::prelude::*;

use crate::restart::CleanupMarker;

const RISE: f32 = 40.0;
const Z: f32 = 10.0;

#[derive(Component)]
pub struct FloatingText {
    timer: Timer,
    initial_position: Vec2,
}

/// Shows `text` at a world position, rising and fading for a second and a half.
pub fn spawn_floating_text(commands: &mut Commands, position: Vec2, text: &str, color: Color) {
    commands.spawn((
        Text2d::new(text),
        TextFont {
            font_size: 18.0,
            ..default()
        },
        TextColor(color),
        Transform::from_xyz(position.x, position.y, Z),
        FloatingText {
            timer: Timer::new(Duration::from_millis(1500), TimerMode::Once),
            initial_position: position,
        },
        CleanupMarker,
    ));
}

pub fn animate_floating_texts(
    mut commands: Commands,
    time: Res<Time>,
    mut query: Query<(Entity, &mut Transform, &mut TextColor, &mut FloatingText)>,
) {
    for (entity, mut transform, mut color, mut floating_text) in &mut query {
        floating_text.timer.tick(time.delta());
        let progress = floating_text.timer.fraction();

        transform.translation.y = RISE.mul_add(progress, floating_text.initial_position.y);
        color.0.set_alpha(1.0 - progress);

        if floating_text.timer.finished() {
            commands.entity(entity).despawn();
        }
    }
}

pub struct FloatingTextPlugin;

impl Plugin for FloatingTextPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, animate_floating_texts);
    }
}
