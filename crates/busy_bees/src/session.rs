use core::time::Duration;
use std::collections::HashMap;

use bevy::log::info;
use bevy::prelude::*;

use crate::bee::{Bee, BeeId, BeeState, Swarm, random_point};
use crate::config::{ConfigError, GameConfig};
use crate::drag::Drag;
use crate::hive::{HoleId, Hive};
use crate::schedule::{Scheduler, Task, TaskId};
use crate::slingshot::Slingshot;
use crate::tween::{Completion, Easing, Pose, Target, Tween};

const TICK: Duration = Duration::from_secs(1);

/// Named sound effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cue {
    Background,
    Vibration,
    FlyAway,
    Slingshot,
}

/// Everything the session asks of the outside world, in the order it was decided.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    SpawnHole { id: HoleId, center: Vec2 },
    MarkHole { id: HoleId, filled: bool },
    SpawnBee(Bee),
    DespawnBee(BeeId),
    SetDragging { bee: BeeId, dragging: bool },
    SpawnSlingshot { at: Vec2 },
    DespawnSlingshot,
    SpawnStone { at: Vec2 },
    DespawnStone,
    /// Set properties immediately, without animating.
    Place { target: Target, pose: Pose },
    Animate {
        target: Target,
        tween: Tween,
        on_complete: Option<Completion>,
    },
    CancelAnimations(Target),
    CancelAllAnimations,
    Play(Cue),
    Loop(Cue),
    Stop(Cue),
    ShowEndScreen { matched: u32 },
}

/// Collects intents until the presentation layer drains them.
#[derive(Debug, Default)]
pub struct Outbox {
    intents: Vec<Intent>,
}

impl Outbox {
    pub fn push(&mut self, intent: Intent) {
        self.intents.push(intent);
    }

    pub fn animate(&mut self, target: Target, tween: Tween, on_complete: Option<Completion>) {
        self.push(Intent::Animate {
            target,
            tween,
            on_complete,
        });
    }

    pub fn cancel_animations(&mut self, target: Target) {
        self.push(Intent::CancelAnimations(target));
    }

    pub fn place(&mut self, target: Target, pose: Pose) {
        self.push(Intent::Place { target, pose });
    }

    pub fn drain(&mut self) -> Vec<Intent> {
        core::mem::take(&mut self.intents)
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    TimeUp,
    AllMatched,
    Escaped,
    /// The hosting page asked for the end.
    Host,
}

/// One game: the bees, the honeycomb, the clock and the slingshot.
#[derive(Resource, Debug)]
pub struct Session {
    pub(crate) config: GameConfig,
    pub(crate) rng: fastrand::Rng,
    pub(crate) swarm: Swarm,
    pub(crate) hive: Hive,
    pub(crate) scheduler: Scheduler,
    pub(crate) slingshot: Slingshot,
    pub(crate) drag: Option<Drag>,
    pub(crate) outbox: Outbox,
    /// Pending flight leg of every bee on ambient flight.
    ambient: HashMap<BeeId, TaskId>,
    pub(crate) matched: u32,
    time_remaining: u32,
    started: bool,
    ended: Option<EndReason>,
}

impl Session {
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        Self::with_rng(config, fastrand::Rng::new())
    }

    pub fn with_seed(config: GameConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::with_rng(config, fastrand::Rng::with_seed(seed))
    }

    fn with_rng(config: GameConfig, rng: fastrand::Rng) -> Result<Self, ConfigError> {
        config.validate()?;
        let hive = Hive::honeycomb(
            config.honeycomb_rows,
            config.honeycomb_cols,
            config.hole_spacing,
            config.hive_top(),
        );
        Ok(Self {
            time_remaining: config.game_duration,
            config,
            rng,
            swarm: Swarm::default(),
            hive,
            scheduler: Scheduler::default(),
            slingshot: Slingshot::Idle,
            drag: None,
            outbox: Outbox::default(),
            ambient: HashMap::new(),
            matched: 0,
            started: false,
            ended: None,
        })
    }

    /// A fresh, unstarted session with the same configuration.
    pub fn restart(&mut self) {
        let rng = fastrand::Rng::with_seed(self.rng.u64(..));
        if let Ok(fresh) = Self::with_rng(self.config.clone(), rng) {
            *self = fresh;
        }
    }

    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    pub const fn hive(&self) -> &Hive {
        &self.hive
    }

    pub const fn swarm(&self) -> &Swarm {
        &self.swarm
    }

    pub const fn matched(&self) -> u32 {
        self.matched
    }

    pub const fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    pub const fn is_started(&self) -> bool {
        self.started
    }

    pub const fn is_ended(&self) -> bool {
        self.ended.is_some()
    }

    pub const fn end_reason(&self) -> Option<EndReason> {
        self.ended
    }

    pub const fn slingshot(&self) -> Slingshot {
        self.slingshot
    }

    pub const fn is_disruption_active(&self) -> bool {
        self.slingshot.is_active()
    }

    pub fn disruption_due_in(&self) -> Option<Duration> {
        self.scheduler.due_in(Task::Disruption)
    }

    pub fn final_message(&self) -> String {
        format!("You matched {} bees!", self.matched)
    }

    pub fn drain_intents(&mut self) -> Vec<Intent> {
        self.outbox.drain()
    }

    /// Builds the honeycomb and the swarm, starts the clock, the music and the slingshot.
    pub fn start(&mut self) {
        if self.started || self.is_ended() {
            return;
        }
        self.started = true;

        for hole in self.hive.holes() {
            self.outbox.push(Intent::SpawnHole {
                id: hole.id,
                center: hole.center,
            });
        }
        let area = self.config.flight_area();
        for _ in 0..self.config.bee_count {
            let bee = self.swarm.spawn(&mut self.rng, area);
            let id = bee.id;
            self.outbox.push(Intent::SpawnBee(bee));
            self.fly(id);
        }

        self.scheduler.every(TICK, Task::Countdown);
        self.outbox.push(Intent::Loop(Cue::Background));
        self.schedule_disruption();
        info!(
            "Session started: {} bees, {} holes, {}s",
            self.config.bee_count,
            self.hive.len(),
            self.time_remaining
        );
    }

    /// Moves the session clock forward.
    pub fn advance(&mut self, delta: Duration) {
        if !self.started || self.is_ended() {
            return;
        }
        for task in self.scheduler.advance(delta) {
            if self.is_ended() {
                break;
            }
            match task {
                Task::Countdown => self.tick(),
                Task::Disruption => self.fire_disruption(),
                Task::FlightLeg(bee) => {
                    self.ambient.remove(&bee);
                    self.fly(bee);
                }
            }
        }
    }

    /// One second of the countdown.
    pub fn tick(&mut self) {
        if !self.started || self.is_ended() {
            return;
        }
        self.time_remaining = self.time_remaining.saturating_sub(1);
        if self.time_remaining == 0 {
            self.end(EndReason::TimeUp);
        }
    }

    /// Freezes the session. Returns `false` if it had already ended.
    pub fn end(&mut self, reason: EndReason) -> bool {
        if self.is_ended() {
            return false;
        }
        self.ended = Some(reason);
        self.scheduler.cancel_all();
        self.ambient.clear();
        self.drag = None;

        self.outbox.push(Intent::CancelAllAnimations);
        self.outbox.push(Intent::Stop(Cue::Background));
        self.outbox.push(Intent::Stop(Cue::Vibration));
        self.outbox.push(Intent::ShowEndScreen {
            matched: self.matched,
        });
        info!(
            "Session ended ({reason:?}) with {}/{} bees matched",
            self.matched, self.config.bee_count
        );
        true
    }

    pub fn on_animation_complete(&mut self, completion: Completion) {
        if self.is_ended() {
            return;
        }
        match completion {
            Completion::Settled(_) => self.outbox.push(Intent::Play(Cue::Vibration)),
            Completion::StoneLanded(hole) => self.land_stone(hole),
            Completion::HoleShaken(hole) => self.finish_shake(hole),
            Completion::SlingshotRetracted => self.finish_retract(),
            Completion::FlownAway(bee) => self.replace_bee(bee),
        }
    }

    /// Sends a flying bee on its next ambient leg and books the one after.
    pub(crate) fn fly(&mut self, id: BeeId) {
        let area = self.config.flight_area();
        let Some(bee) = self.swarm.get_mut(id) else {
            return;
        };
        if bee.state != BeeState::Flying {
            return;
        }
        let duration = Duration::from_secs_f32(self.rng.f32().mul_add(5.0, 5.0));
        let destination = random_point(&mut self.rng, area);
        bee.position = destination;

        self.outbox.animate(
            Target::Bee(id),
            Tween::new(Pose::at(destination), duration, Easing::QuadInOut),
            None,
        );
        let leg = self.scheduler.after(duration, Task::FlightLeg(id));
        if let Some(previous) = self.ambient.insert(id, leg) {
            self.scheduler.cancel(previous);
        }
    }

    /// Stops a bee's ambient flight where it is.
    pub(crate) fn ground(&mut self, id: BeeId) {
        if let Some(leg) = self.ambient.remove(&id) {
            self.scheduler.cancel(leg);
        }
        self.outbox.cancel_animations(Target::Bee(id));
    }

    pub(crate) fn is_flying_ambiently(&self, id: BeeId) -> bool {
        self.ambient.contains_key(&id)
    }

    /// Puts `bee` into `hole`: both flip together and the match count follows.
    pub(crate) fn commit(&mut self, bee_id: BeeId, hole_id: HoleId) -> bool {
        let Some(center) = self.hive.get(hole_id).map(|hole| hole.center) else {
            return false;
        };
        let Some(bee) = self.swarm.get_mut(bee_id) else {
            return false;
        };
        if !self.hive.fill(hole_id) {
            return false;
        }
        bee.state = BeeState::Inserted;
        bee.hole = Some(hole_id);
        bee.position = center;
        self.matched += 1;

        self.outbox.push(Intent::MarkHole {
            id: hole_id,
            filled: true,
        });
        let pose = Pose::at(center).scaled(0.6);
        if self.matched as usize >= self.config.bee_count {
            self.outbox.place(Target::Bee(bee_id), pose);
            self.end(EndReason::AllMatched);
        } else {
            self.outbox.animate(
                Target::Bee(bee_id),
                Tween::new(pose, Duration::from_millis(800), Easing::BackOut),
                Some(Completion::Settled(bee_id)),
            );
        }
        true
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn small_config(bees: usize, rows: usize, cols: usize) -> GameConfig {
        GameConfig {
            bee_count: bees,
            honeycomb_rows: rows,
            honeycomb_cols: cols,
            ..default()
        }
    }

    pub(crate) fn started(config: GameConfig, seed: u64) -> Session {
        let mut session = Session::with_seed(config, seed).expect("valid config");
        session.start();
        session
    }

    /// Checks the match count against the honeycomb.
    pub(crate) fn assert_consistent(session: &Session) {
        assert_eq!(
            session.matched() as usize,
            session.hive().filled_count(),
            "matched count drifted from the honeycomb"
        );
        assert!(
            session.matched() as usize <= session.config().bee_count,
            "matched more bees than exist"
        );
        for hole in session.hive().filled() {
            let occupants = session
                .swarm()
                .iter()
                .filter(|bee| bee.hole == Some(hole.id))
                .count();
            assert_eq!(occupants, 1, "{} must hold exactly one bee", hole.id);
        }
    }

    #[test]
    fn invalid_config_is_refused() {
        let result = Session::new(small_config(3, 1, 1));
        assert!(
            matches!(result, Err(ConfigError::TooManyBees { bees: 3, holes: 1 })),
            "three bees do not fit one hole"
        );
    }

    #[test]
    fn start_builds_the_board_once() {
        let mut session = started(GameConfig::default(), 1);
        let intents = session.drain_intents();

        let holes = intents
            .iter()
            .filter(|intent| matches!(intent, Intent::SpawnHole { .. }))
            .count();
        let bees = intents
            .iter()
            .filter(|intent| matches!(intent, Intent::SpawnBee(_)))
            .count();
        assert_eq!(holes, 25, "every hole is created");
        assert_eq!(bees, 25, "every bee is created");
        assert!(
            intents.contains(&Intent::Loop(Cue::Background)),
            "background music loops"
        );
        assert!(session.is_started(), "started");
        assert!(session.disruption_due_in().is_some(), "slingshot is booked");
        for bee in session.swarm().iter() {
            assert!(session.is_flying_ambiently(bee.id), "{} is idle", bee.id);
        }

        session.start();
        assert!(
            session.drain_intents().is_empty(),
            "second start has no effect"
        );
        assert_eq!(session.swarm().len(), 25, "no extra bees");
    }

    #[test]
    fn first_disruption_is_booked_between_ten_and_twenty_five_seconds() {
        for seed in 0..20 {
            let session = started(GameConfig::default(), seed);
            let due = session.disruption_due_in().expect("booked at start");
            assert!(
                (Duration::from_secs(10)..Duration::from_secs(25)).contains(&due),
                "{due:?} outside the window"
            );
        }
    }

    #[test]
    fn countdown_runs_out() {
        let config = GameConfig {
            game_duration: 1,
            ..small_config(3, 2, 2)
        };
        let mut session = started(config, 5);
        session.drain_intents();

        session.advance(Duration::from_secs(1));

        assert_eq!(session.time_remaining(), 0, "clock at zero");
        assert!(session.is_ended(), "time is up");
        assert_eq!(session.end_reason(), Some(EndReason::TimeUp), "timeout");
        assert_eq!(session.matched(), 0, "nothing matched");
        assert_eq!(session.final_message(), "You matched 0 bees!", "message");
        let intents = session.drain_intents();
        assert!(
            intents.contains(&Intent::ShowEndScreen { matched: 0 }),
            "end screen shown"
        );
        assert!(
            intents.contains(&Intent::Stop(Cue::Background)),
            "music stopped"
        );
    }

    #[test]
    fn countdown_is_one_second_per_tick() {
        let mut session = started(GameConfig::default(), 2);
        session.advance(Duration::from_millis(2500));
        assert_eq!(session.time_remaining(), 178, "two whole seconds passed");
        session.tick();
        assert_eq!(session.time_remaining(), 177, "manual tick");
    }

    #[test]
    fn end_is_idempotent() {
        let mut session = started(small_config(2, 1, 2), 9);
        session.drain_intents();

        assert!(session.end(EndReason::Escaped), "first end takes effect");
        let first = session.drain_intents();
        assert!(!session.end(EndReason::TimeUp), "second end is ignored");
        assert!(session.drain_intents().is_empty(), "no second set of effects");

        assert!(first.contains(&Intent::CancelAllAnimations), "animations halted");
        assert_eq!(session.end_reason(), Some(EndReason::Escaped), "first reason kept");
        assert!(session.scheduler.is_empty(), "no timer survives the end");
        assert!(!session.is_flying_ambiently(BeeId(0)), "ambient flight stopped");
    }

    #[test]
    fn nothing_moves_after_the_end() {
        let mut session = started(small_config(2, 1, 2), 4);
        session.end(EndReason::Escaped);
        session.drain_intents();
        let remaining = session.time_remaining();

        session.advance(Duration::from_secs(60));
        session.tick();
        session.on_animation_complete(Completion::SlingshotRetracted);
        session.on_animation_complete(Completion::FlownAway(BeeId(0)));

        assert_eq!(session.time_remaining(), remaining, "clock frozen");
        assert!(session.drain_intents().is_empty(), "no effects after end");
        assert_eq!(session.swarm().len(), 2, "no respawn after end");
    }

    #[test]
    fn ambient_flight_keeps_going_leg_after_leg() {
        let mut session = started(small_config(1, 1, 1), 6);
        session.drain_intents();

        session.advance(Duration::from_secs(11));

        let legs = session
            .drain_intents()
            .into_iter()
            .filter(|intent| {
                matches!(
                    intent,
                    Intent::Animate {
                        target: Target::Bee(BeeId(0)),
                        on_complete: None,
                        ..
                    }
                )
            })
            .count();
        assert!(legs >= 1, "a leg lasts at most ten seconds");
        assert!(session.is_flying_ambiently(BeeId(0)), "next leg is booked");
    }

    #[test]
    fn an_ended_session_cannot_start() {
        let mut session = Session::with_seed(small_config(2, 1, 2), 10).expect("valid config");
        session.end(EndReason::Host);
        session.drain_intents();

        session.start();

        assert!(!session.is_started(), "stays unstarted");
        assert_eq!(session.swarm().len(), 0, "no bees");
        assert!(session.drain_intents().is_empty(), "no board built");
    }

    #[test]
    fn restart_gives_a_fresh_unstarted_session() {
        let mut session = started(small_config(2, 1, 2), 8);
        session.end(EndReason::Host);
        session.restart();
        assert!(!session.is_started(), "not started");
        assert!(!session.is_ended(), "not ended");
        assert_eq!(session.swarm().len(), 0, "bees appear on start");
        assert_eq!(session.time_remaining(), 180, "full clock");
        assert!(session.drain_intents().is_empty(), "nothing pending");
    }
}
