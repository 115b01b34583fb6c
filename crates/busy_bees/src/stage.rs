//! Puts the session on screen.
//!
//! Every frame the session is advanced, its intents are turned into entities, placements and
//! tweens, and finished tweens are reported back to it as completions.

use core::time::Duration;
use std::collections::HashMap;

use bevy::log::debug;
use bevy::prelude::*;
use bevy::sprite::AlphaMode2d;
use bits_helpers::restart::CleanupMarker;

use crate::GameState;
use crate::audio::{SoundQueue, SoundRequest};
use crate::bee::{Bee, BeeId};
use crate::session::{Intent, Session};
use crate::tween::{Completion, Pose, Target, Tween};

pub const BEE_RADIUS: f32 = 16.0;
const LIFT_SCALE: f32 = 1.2;

const HOLE_Z: f32 = 0.0;
const BEE_Z: f32 = 2.0;
const SLINGSHOT_Z: f32 = 3.0;
const STONE_Z: f32 = 4.0;
const LIFTED_Z: f32 = 5.0;

const HOLE_EMPTY: Color = Color::srgb(0.45, 0.3, 0.08);
const HOLE_FILLED: Color = Color::srgb(0.98, 0.78, 0.2);
const SLINGSHOT_COLOR: Color = Color::srgb(0.5, 0.32, 0.18);
const STONE_COLOR: Color = Color::srgb(0.55, 0.55, 0.58);

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct StageSet;

#[derive(Component, Debug, Clone, Copy)]
pub struct BeeSprite(pub BeeId);

#[derive(Component, Debug, Clone, Copy)]
struct HoleCell;

/// The bee currently held by the pointer.
#[derive(Component)]
struct Lifted;

#[derive(Component, Debug, Clone, Copy)]
struct Opacity(f32);

/// A pose to apply on the next frame without animating.
#[derive(Component, Debug, Clone, Copy)]
struct Placement(Pose);

#[derive(Debug, Clone, Copy)]
struct Snapshot {
    position: Vec2,
    scale: f32,
    rotation: f32,
    opacity: f32,
}

impl Snapshot {
    fn of(transform: &Transform, opacity: Option<&Opacity>) -> Self {
        Self {
            position: transform.translation.truncate(),
            scale: transform.scale.x,
            rotation: transform.rotation.to_euler(EulerRot::XYZ).2,
            opacity: opacity.map_or(1.0, |opacity| opacity.0),
        }
    }
}

/// A running tween. The start pose is taken on its first frame.
#[derive(Component, Debug)]
pub(crate) struct Tweening {
    tween: Tween,
    from: Option<Snapshot>,
    elapsed: Duration,
    on_complete: Option<Completion>,
}

#[derive(Event, Debug, Clone, Copy)]
struct AnimationFinished(Completion);

/// Which entity stands for which animation target.
#[derive(Resource, Default, Debug)]
pub struct Actors(HashMap<Target, Entity>);

impl Actors {
    pub fn get(&self, target: Target) -> Option<Entity> {
        self.0.get(&target).copied()
    }

    fn insert(&mut self, target: Target, entity: Entity) {
        if let Some(previous) = self.0.insert(target, entity) {
            debug!("{target:?} moved from {previous} to {entity}");
        }
    }

    fn remove(&mut self, target: Target) -> Option<Entity> {
        self.0.remove(&target)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

#[derive(Resource)]
struct StageAssets {
    bee: Handle<Mesh>,
    hole: Handle<Mesh>,
    slingshot: Handle<Mesh>,
    stone: Handle<Mesh>,
    hole_empty: Handle<ColorMaterial>,
    hole_filled: Handle<ColorMaterial>,
    stone_material: Handle<ColorMaterial>,
}

pub struct StagePlugin;

impl Plugin for StagePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Actors>()
            .add_event::<AnimationFinished>()
            .add_systems(Startup, load_stage_assets)
            .add_systems(OnEnter(GameState::Welcome), forget_actors)
            .add_systems(OnEnter(GameState::Over), flush_after_end)
            .add_systems(
                Update,
                (
                    advance_session,
                    apply_intents,
                    apply_placements,
                    run_tweens,
                    sync_opacity,
                    (raise_lifted, lower_dropped),
                    deliver_completions,
                )
                    .chain()
                    .in_set(StageSet)
                    .run_if(in_state(GameState::Playing)),
            );
    }
}

fn load_stage_assets(
    mut commands: Commands,
    session: Res<Session>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
) {
    // Pointy top hexagons touching their neighbours, with a small gap.
    let hole_radius = session.config().hole_spacing / 3f32.sqrt() * 0.92;
    commands.insert_resource(StageAssets {
        bee: meshes.add(Circle::new(BEE_RADIUS)),
        hole: meshes.add(RegularPolygon::new(hole_radius, 6)),
        slingshot: meshes.add(Capsule2d::new(8.0, 60.0)),
        stone: meshes.add(Circle::new(10.0)),
        hole_empty: materials.add(HOLE_EMPTY),
        hole_filled: materials.add(HOLE_FILLED),
        stone_material: materials.add(STONE_COLOR),
    });
}

fn fading_material(color: Color) -> ColorMaterial {
    ColorMaterial {
        color,
        alpha_mode: AlphaMode2d::Blend,
        ..default()
    }
}

fn forget_actors(mut actors: ResMut<Actors>) {
    actors.clear();
}

/// The host can end the session after this frame's stage already ran. Whatever `end` queued
/// still has to stop the sounds and the tweens.
pub(crate) fn flush_after_end(
    mut commands: Commands,
    mut session: ResMut<Session>,
    mut sounds: ResMut<SoundQueue>,
    animated: Query<Entity, With<Tweening>>,
) {
    for intent in session.drain_intents() {
        match intent {
            Intent::CancelAllAnimations => {
                for entity in &animated {
                    commands.entity(entity).remove::<Tweening>();
                }
            }
            Intent::Play(cue) => sounds.push(SoundRequest::Play(cue)),
            Intent::Loop(cue) => sounds.push(SoundRequest::Loop(cue)),
            Intent::Stop(cue) => sounds.push(SoundRequest::Stop(cue)),
            _ => {}
        }
    }
}

fn advance_session(time: Res<Time>, mut session: ResMut<Session>) {
    session.advance(time.delta());
}

fn spawn_bee(
    commands: &mut Commands,
    assets: &StageAssets,
    materials: &mut Assets<ColorMaterial>,
    bee: &Bee,
) -> Entity {
    commands
        .spawn((
            BeeSprite(bee.id),
            Mesh2d(assets.bee.clone()),
            MeshMaterial2d(materials.add(fading_material(bee.emotion.color()))),
            Transform::from_xyz(bee.position.x, bee.position.y, BEE_Z),
            Opacity(1.0),
            CleanupMarker,
        ))
        .id()
}

fn apply_intents(
    mut commands: Commands,
    mut session: ResMut<Session>,
    mut actors: ResMut<Actors>,
    assets: Res<StageAssets>,
    mut materials: ResMut<Assets<ColorMaterial>>,
    mut sounds: ResMut<SoundQueue>,
    animated: Query<Entity, With<Tweening>>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    let intents = session.drain_intents();
    if intents.is_empty() {
        return;
    }
    let mut placements: HashMap<Target, Pose> = HashMap::new();
    let mut started_now: Vec<Entity> = Vec::new();

    for intent in intents {
        match intent {
            Intent::SpawnHole { id, center } => {
                let entity = commands
                    .spawn((
                        HoleCell,
                        Mesh2d(assets.hole.clone()),
                        MeshMaterial2d(assets.hole_empty.clone()),
                        Transform::from_xyz(center.x, center.y, HOLE_Z),
                        CleanupMarker,
                    ))
                    .id();
                actors.insert(Target::Hole(id), entity);
            }
            Intent::MarkHole { id, filled } => {
                if let Some(entity) = actors.get(Target::Hole(id)) {
                    let material = if filled {
                        assets.hole_filled.clone()
                    } else {
                        assets.hole_empty.clone()
                    };
                    commands.entity(entity).try_insert(MeshMaterial2d(material));
                }
            }
            Intent::SpawnBee(bee) => {
                let entity = spawn_bee(&mut commands, &assets, &mut materials, &bee);
                actors.insert(Target::Bee(bee.id), entity);
            }
            Intent::DespawnBee(id) => {
                if let Some(entity) = actors.remove(Target::Bee(id)) {
                    commands.entity(entity).despawn_recursive();
                }
                placements.remove(&Target::Bee(id));
            }
            Intent::SetDragging { bee, dragging } => {
                let Some(entity) = actors.get(Target::Bee(bee)) else {
                    continue;
                };
                let scale = if dragging {
                    commands.entity(entity).try_insert(Lifted);
                    LIFT_SCALE
                } else {
                    commands.entity(entity).remove::<Lifted>();
                    1.0
                };
                let pose = placements.entry(Target::Bee(bee)).or_default();
                *pose = pose.then(Pose::default().scaled(scale));
            }
            Intent::SpawnSlingshot { at } => {
                let entity = commands
                    .spawn((
                        Mesh2d(assets.slingshot.clone()),
                        MeshMaterial2d(materials.add(fading_material(SLINGSHOT_COLOR))),
                        Transform::from_xyz(at.x, at.y, SLINGSHOT_Z),
                        Opacity(1.0),
                        CleanupMarker,
                    ))
                    .id();
                actors.insert(Target::Slingshot, entity);
            }
            Intent::DespawnSlingshot => {
                if let Some(entity) = actors.remove(Target::Slingshot) {
                    commands.entity(entity).despawn_recursive();
                }
            }
            Intent::SpawnStone { at } => {
                let entity = commands
                    .spawn((
                        Mesh2d(assets.stone.clone()),
                        MeshMaterial2d(assets.stone_material.clone()),
                        Transform::from_xyz(at.x, at.y, STONE_Z),
                        CleanupMarker,
                    ))
                    .id();
                actors.insert(Target::Stone, entity);
            }
            Intent::DespawnStone => {
                if let Some(entity) = actors.remove(Target::Stone) {
                    commands.entity(entity).despawn_recursive();
                }
            }
            Intent::Place { target, pose } => {
                let merged = placements.entry(target).or_default();
                *merged = merged.then(pose);
            }
            Intent::Animate {
                target,
                tween,
                on_complete,
            } => {
                if let Some(entity) = actors.get(target) {
                    commands.entity(entity).try_insert(Tweening {
                        tween,
                        from: None,
                        elapsed: Duration::ZERO,
                        on_complete,
                    });
                    started_now.push(entity);
                }
            }
            Intent::CancelAnimations(target) => {
                if let Some(entity) = actors.get(target) {
                    commands.entity(entity).remove::<Tweening>();
                }
            }
            Intent::CancelAllAnimations => {
                for entity in animated.iter().chain(started_now.drain(..)) {
                    commands.entity(entity).remove::<Tweening>();
                }
            }
            Intent::Play(cue) => sounds.push(SoundRequest::Play(cue)),
            Intent::Loop(cue) => sounds.push(SoundRequest::Loop(cue)),
            Intent::Stop(cue) => sounds.push(SoundRequest::Stop(cue)),
            Intent::ShowEndScreen { matched } => {
                debug!("Showing the end screen, {matched} bees matched");
                next_state.set(GameState::Over);
            }
        }
    }

    for (target, pose) in placements {
        if let Some(entity) = actors.get(target) {
            commands.entity(entity).try_insert(Placement(pose));
        }
    }
}

fn lerp(from: f32, to: f32, t: f32) -> f32 {
    (to - from).mul_add(t, from)
}

fn blend(from: Snapshot, to: Pose, t: f32) -> Pose {
    Pose {
        position: to.position.map(|position| from.position.lerp(position, t)),
        scale: to.scale.map(|scale| lerp(from.scale, scale, t)),
        rotation: to.rotation.map(|rotation| lerp(from.rotation, rotation, t)),
        opacity: to
            .opacity
            .map(|opacity| lerp(from.opacity, opacity, t).clamp(0.0, 1.0)),
    }
}

fn set_pose(transform: &mut Transform, opacity: Option<Mut<'_, Opacity>>, pose: Pose) {
    if let Some(position) = pose.position {
        transform.translation.x = position.x;
        transform.translation.y = position.y;
    }
    if let Some(scale) = pose.scale {
        transform.scale = Vec3::new(scale, scale, 1.0);
    }
    if let Some(rotation) = pose.rotation {
        transform.rotation = Quat::from_rotation_z(rotation);
    }
    if let (Some(alpha), Some(mut opacity)) = (pose.opacity, opacity) {
        opacity.0 = alpha;
    }
}

fn apply_placements(
    mut commands: Commands,
    mut placed: Query<(Entity, &Placement, &mut Transform, Option<&mut Opacity>)>,
) {
    for (entity, placement, mut transform, opacity) in &mut placed {
        set_pose(&mut transform, opacity, placement.0);
        commands.entity(entity).remove::<Placement>();
    }
}

fn run_tweens(
    mut commands: Commands,
    time: Res<Time>,
    mut tweens: Query<(Entity, &mut Tweening, &mut Transform, Option<&mut Opacity>)>,
    mut finished: EventWriter<AnimationFinished>,
) {
    for (entity, mut tweening, mut transform, opacity) in &mut tweens {
        let from = *tweening
            .from
            .get_or_insert_with(|| Snapshot::of(&transform, opacity.as_deref()));
        tweening.elapsed += time.delta();
        let tween = tweening.tween;
        let progress = tween.progress(tweening.elapsed);
        set_pose(&mut transform, opacity, blend(from, tween.to, progress));

        if tween.is_finished(tweening.elapsed) {
            commands.entity(entity).remove::<Tweening>();
            if let Some(completion) = tweening.on_complete {
                finished.send(AnimationFinished(completion));
            }
        }
    }
}

fn sync_opacity(
    faded: Query<(&Opacity, &MeshMaterial2d<ColorMaterial>), Changed<Opacity>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
) {
    for (opacity, material) in &faded {
        if let Some(material) = materials.get_mut(&material.0) {
            material.color.set_alpha(opacity.0);
        }
    }
}

fn raise_lifted(mut lifted: Query<&mut Transform, Added<Lifted>>) {
    for mut transform in &mut lifted {
        transform.translation.z = LIFTED_Z;
    }
}

fn lower_dropped(
    mut dropped: RemovedComponents<Lifted>,
    mut bees: Query<&mut Transform, With<BeeSprite>>,
) {
    for entity in dropped.read() {
        if let Ok(mut transform) = bees.get_mut(entity) {
            transform.translation.z = BEE_Z;
        }
    }
}

fn deliver_completions(
    mut finished: EventReader<AnimationFinished>,
    mut session: ResMut<Session>,
) {
    for AnimationFinished(completion) in finished.read() {
        session.on_animation_complete(*completion);
    }
}
