use std::collections::VecDeque;

use bevy::log::{debug, info};
use bevy::prelude::*;
use bevy_asset_loader::prelude::*;
use bevy_kira_audio::prelude::*;

use crate::GameState;
use crate::session::Cue;

const BACKGROUND_VOLUME: f64 = 0.3;
/// Requests kept while the sounds are still loading. The oldest one-shot cues go first.
const MAX_PENDING: usize = 32;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Default, States)]
enum AssetState {
    #[default]
    Loading,
    Loaded,
}

#[derive(AssetCollection, Resource)]
struct AudioAssets {
    #[asset(path = "audio/background_buzz.ogg")]
    background: Handle<bevy_kira_audio::prelude::AudioSource>,
    #[asset(path = "audio/bee_vibration.ogg")]
    vibration: Handle<bevy_kira_audio::prelude::AudioSource>,
    #[asset(path = "audio/fly_away.ogg")]
    fly_away: Handle<bevy_kira_audio::prelude::AudioSource>,
    #[asset(path = "audio/slingshot.ogg")]
    slingshot: Handle<bevy_kira_audio::prelude::AudioSource>,
}

impl AudioAssets {
    fn handle(&self, cue: Cue) -> Handle<bevy_kira_audio::prelude::AudioSource> {
        match cue {
            Cue::Background => self.background.clone_weak(),
            Cue::Vibration => self.vibration.clone_weak(),
            Cue::FlyAway => self.fly_away.clone_weak(),
            Cue::Slingshot => self.slingshot.clone_weak(),
        }
    }
}

/// Ambient music.
#[derive(Resource)]
struct BackgroundChannel;

/// The buzz of the bee being dragged.
#[derive(Resource)]
struct BuzzChannel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundRequest {
    Play(Cue),
    Loop(Cue),
    Stop(Cue),
}

impl SoundRequest {
    /// Music requests decide whether the background should be on at all.
    const fn is_background(self) -> bool {
        matches!(
            self,
            Self::Loop(Cue::Background) | Self::Stop(Cue::Background)
        )
    }
}

/// Sound requests waiting to be played.
#[derive(Resource, Debug, Default)]
pub struct SoundQueue {
    pending: VecDeque<SoundRequest>,
}

impl SoundQueue {
    pub fn push(&mut self, request: SoundRequest) {
        if self.pending.len() >= MAX_PENDING {
            let expendable = self
                .pending
                .iter()
                .position(|pending| !pending.is_background());
            match expendable {
                Some(index) => {
                    self.pending.remove(index);
                }
                None => {
                    self.pending.pop_front();
                }
            }
        }
        self.pending.push_back(request);
    }

    pub(crate) fn drain(&mut self) -> impl Iterator<Item = SoundRequest> + '_ {
        self.pending.drain(..)
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

/// Whether the background loop should be audible.
#[derive(Resource, Debug, Default)]
struct Soundscape {
    background: bool,
}

pub struct GameAudioPlugin;

impl Plugin for GameAudioPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(AudioPlugin)
            .add_audio_channel::<BackgroundChannel>()
            .add_audio_channel::<BuzzChannel>()
            .init_resource::<SoundQueue>()
            .init_resource::<Soundscape>()
            .init_state::<AssetState>()
            .add_loading_state(
                LoadingState::new(AssetState::Loading)
                    .continue_to_state(AssetState::Loaded)
                    .load_collection::<AudioAssets>(),
            )
            .add_systems(OnEnter(GameState::Welcome), silence)
            .add_systems(
                Update,
                (play_requested_sounds, retry_background)
                    .chain()
                    .run_if(in_state(AssetState::Loaded)),
            );
    }
}

fn play_requested_sounds(
    mut queue: ResMut<SoundQueue>,
    mut soundscape: ResMut<Soundscape>,
    assets: Res<AudioAssets>,
    audio: Res<Audio>,
    background: Res<AudioChannel<BackgroundChannel>>,
    buzz: Res<AudioChannel<BuzzChannel>>,
) {
    for request in queue.drain() {
        debug!("Sound {request:?}");
        match request {
            SoundRequest::Loop(Cue::Background) => {
                soundscape.background = true;
                background.stop();
                background
                    .play(assets.handle(Cue::Background))
                    .looped()
                    .with_volume(BACKGROUND_VOLUME);
            }
            SoundRequest::Stop(Cue::Background) => {
                soundscape.background = false;
                background.stop();
            }
            SoundRequest::Loop(Cue::Vibration) => {
                buzz.stop();
                buzz.play(assets.handle(Cue::Vibration)).looped();
            }
            SoundRequest::Stop(Cue::Vibration) => {
                buzz.stop();
            }
            SoundRequest::Play(cue) | SoundRequest::Loop(cue) => {
                audio.play(assets.handle(cue));
            }
            SoundRequest::Stop(_) => {}
        }
    }
}

/// Playback can be refused until the player interacts with the page. Try again on every
/// press while the music should be on but is not.
fn retry_background(
    soundscape: Res<Soundscape>,
    mouse: Res<ButtonInput<MouseButton>>,
    touches: Res<Touches>,
    assets: Res<AudioAssets>,
    background: Res<AudioChannel<BackgroundChannel>>,
) {
    let pressed = mouse.just_pressed(MouseButton::Left) || touches.any_just_pressed();
    if !pressed || !soundscape.background || background.is_playing_sound() {
        return;
    }
    info!("Retrying background music after user interaction");
    background
        .play(assets.handle(Cue::Background))
        .looped()
        .with_volume(BACKGROUND_VOLUME);
}

fn silence(
    mut queue: ResMut<SoundQueue>,
    mut soundscape: ResMut<Soundscape>,
    background: Res<AudioChannel<BackgroundChannel>>,
    buzz: Res<AudioChannel<BuzzChannel>>,
) {
    queue.clear();
    soundscape.background = false;
    background.stop();
    buzz.stop();
}
