use bevy::prelude::*;

#[derive(Component)]
pub struct WelcomeScreenElement;

/// Full screen card with a title, a paragraph and the "Tap to start" prompt.
pub fn spawn_welcome_screen(commands: &mut Commands, title: &str, body: &str) {
    commands
        .spawn((
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                flex_direction: FlexDirection::Column,
                align_items: AlignItems::Center,
                justify_content: JustifyContent::SpaceEvenly,
                padding: UiRect::all(Val::Px(24.0)),
                ..default()
            },
            BackgroundColor(Color::BLACK),
            WelcomeScreenElement,
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new(title),
                TextFont {
                    font_size: 40.0,
                    ..default()
                },
                TextColor(Color::WHITE),
                TextLayout::new_with_justify(JustifyText::Center),
            ));
            parent.spawn((
                Text::new(body),
                TextFont {
                    font_size: 18.0,
                    ..default()
                },
                TextColor(Color::srgb(0.8, 0.8, 0.8)),
                TextLayout::new_with_justify(JustifyText::Center),
            ));
            parent.spawn((
                Text::new("Tap to start"),
                TextFont {
                    font_size: 30.0,
                    ..default()
                },
                TextColor(Color::WHITE),
                TextLayout::new_with_justify(JustifyText::Center),
            ));
        });
}

pub fn despawn_welcome_screen(
    mut commands: Commands,
    welcome_elements: Query<Entity, With<WelcomeScreenElement>>,
) {
    for entity in welcome_elements.iter() {
        commands.entity(entity).despawn_recursive();
    }
}

/// Any click or touch this frame.
pub fn tapped(button_input: &Res<ButtonInput<MouseButton>>, touch_input: &Res<Touches>) -> bool {
    button_input.just_pressed(MouseButton::Left) || touch_input.any_just_pressed()
}
