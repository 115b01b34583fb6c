//! The slingshot: every now and then a stone knocks a bee out of its hole.

use core::f32::consts::TAU;
use core::time::Duration;

use bevy::log::{debug, info, warn};
use bevy::prelude::*;

use crate::bee::{BeeId, BeeState};
use crate::hive::HoleId;
use crate::schedule::Task;
use crate::session::{Cue, Intent, Session};
use crate::tween::{Completion, Easing, Pose, Target, Tween};

/// Where the disruption cycle stands. Anything but `Idle` counts as active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Slingshot {
    #[default]
    Idle,
    /// The stone is on its way to the hole.
    Targeting(HoleId),
    /// The hole shakes after the hit.
    Evicting(HoleId),
    /// The slingshot pulls back out of view.
    Cooldown,
}

impl Slingshot {
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Idle)
    }
}

impl Session {
    /// Books the next disruption somewhere in the configured delay window.
    pub(crate) fn schedule_disruption(&mut self) {
        let window = &self.config.disruption_delay;
        let start = window.start.as_millis() as u64;
        let end = window.end.as_millis() as u64;
        let delay = Duration::from_millis(self.rng.u64(start..end.max(start + 1)));
        self.scheduler.cancel_task(Task::Disruption);
        self.scheduler.after(delay, Task::Disruption);
        debug!("Next disruption in {:.1}s", delay.as_secs_f32());
    }

    pub(crate) fn fire_disruption(&mut self) {
        if self.is_ended() || self.slingshot.is_active() {
            return;
        }
        let filled: Vec<HoleId> = self.hive.filled().map(|hole| hole.id).collect();
        let Some(target) = self.rng.choice(filled) else {
            let retry = self.config.disruption_retry;
            self.scheduler.cancel_task(Task::Disruption);
            self.scheduler.after(retry, Task::Disruption);
            debug!("No bee at home, slingshot retries in {}s", retry.as_secs());
            return;
        };
        let Some(center) = self.hive.get(target).map(|hole| hole.center) else {
            return;
        };
        self.slingshot = Slingshot::Targeting(target);
        info!("Slingshot aims at {target}");

        let rest = self.config.slingshot_rest();
        let hidden = self.config.slingshot_hidden();
        self.outbox.push(Intent::SpawnSlingshot { at: hidden });
        self.outbox
            .place(Target::Slingshot, Pose::at(hidden).faded(0.0));
        self.outbox.animate(
            Target::Slingshot,
            Tween::new(
                Pose::at(rest).faded(1.0),
                Duration::from_secs(1),
                Easing::BounceOut,
            ),
            None,
        );

        self.outbox.push(Intent::SpawnStone {
            at: rest + Vec2::new(0.0, 40.0),
        });
        self.outbox.push(Intent::Play(Cue::Slingshot));
        self.outbox.animate(
            Target::Stone,
            Tween::new(
                Pose::at(center).scaled(0.5).rotated(TAU),
                Duration::from_millis(800),
                Easing::QuadIn,
            ),
            Some(Completion::StoneLanded(target)),
        );
    }

    /// Empties the targeted hole. The match count follows the hole, even when no bee is found
    /// in it.
    pub(crate) fn land_stone(&mut self, hole: HoleId) {
        if self.slingshot != Slingshot::Targeting(hole) {
            debug!("Stale stone landing on {hole} ignored");
            return;
        }
        self.outbox.push(Intent::DespawnStone);
        let occupant = self.swarm.occupant_of(hole);
        let was_filled = self.hive.vacate(hole);
        self.outbox.push(Intent::MarkHole {
            id: hole,
            filled: false,
        });
        if was_filled {
            self.matched = self.matched.saturating_sub(1);
        }

        match occupant {
            Some(bee) => self.evict(bee),
            None => warn!("No bee found in {hole}, nothing to evict"),
        }

        self.slingshot = Slingshot::Evicting(hole);
        self.outbox.animate(
            Target::Hole(hole),
            Tween::new(
                Pose::default().rotated(10f32.to_radians()),
                Duration::from_millis(500),
                Easing::QuadInOut,
            )
            .yoyo(3),
            Some(Completion::HoleShaken(hole)),
        );
    }

    /// Sends a bee off screen. It is replaced once it is gone.
    fn evict(&mut self, id: BeeId) {
        let exit_x = self.config.viewport.x * 0.5 + 100.0;
        let Some(bee) = self.swarm.get_mut(id) else {
            return;
        };
        if bee.state == BeeState::FlyingAway {
            return;
        }
        bee.state = BeeState::FlyingAway;
        bee.hole = None;
        let exit = Vec2::new(exit_x, bee.position.y + 100.0);
        bee.position = exit;

        self.ground(id);
        self.outbox.push(Intent::Play(Cue::FlyAway));
        self.outbox.animate(
            Target::Bee(id),
            Tween::new(
                Pose::at(exit).rotated(TAU).faded(0.0),
                Duration::from_secs(2),
                Easing::QuadIn,
            ),
            Some(Completion::FlownAway(id)),
        );
        info!("Bee {id} knocked out of its hole");
    }

    pub(crate) fn finish_shake(&mut self, hole: HoleId) {
        if self.slingshot != Slingshot::Evicting(hole) {
            return;
        }
        self.slingshot = Slingshot::Cooldown;
        let hidden = self.config.slingshot_hidden();
        self.outbox.animate(
            Target::Slingshot,
            Tween::new(Pose::at(hidden), Duration::from_secs(1), Easing::QuadIn),
            Some(Completion::SlingshotRetracted),
        );
    }

    pub(crate) fn finish_retract(&mut self) {
        if self.slingshot != Slingshot::Cooldown {
            return;
        }
        self.outbox.push(Intent::DespawnSlingshot);
        self.slingshot = Slingshot::Idle;
        self.schedule_disruption();
    }

    /// Swaps an evicted bee for a brand new one.
    pub(crate) fn replace_bee(&mut self, old: BeeId) {
        if self.swarm.get(old).map(|bee| bee.state) != Some(BeeState::FlyingAway) {
            return;
        }
        let area = self.config.flight_area();
        let Some(bee) = self.swarm.respawn(old, &mut self.rng, area) else {
            return;
        };
        let id = bee.id;
        self.outbox.push(Intent::DespawnBee(old));
        self.outbox.push(Intent::SpawnBee(bee));
        self.fly(id);
        debug!("Bee {old} replaced by bee {id}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::session::tests::{assert_consistent, small_config, started};

    /// Starts a session and puts the first `count` bees into the first `count` holes.
    fn with_filled_holes(config: GameConfig, count: usize, seed: u64) -> Session {
        let mut session = started(config, seed);
        for n in 0..count {
            let bee = BeeId(n as u32);
            let at = session.swarm().get(bee).expect("bee exists").position;
            let hole = session.hive().get(HoleId(n)).expect("hole exists").center;
            session.begin_drag(bee, at, at).expect("bee can be picked up");
            session.drag_to(at + (hole - at));
            session.end_drag();
        }
        // Only the freshly fired disruption should be pending.
        session.scheduler.cancel_task(Task::Disruption);
        session.drain_intents();
        session
    }

    fn completion_for(intents: &[Intent], target: Target) -> Option<Completion> {
        intents.iter().find_map(|intent| match intent {
            Intent::Animate {
                target: animated,
                on_complete,
                ..
            } if *animated == target => *on_complete,
            _ => None,
        })
    }

    #[test]
    fn three_filled_holes_lose_exactly_one_bee() {
        let mut session = with_filled_holes(small_config(4, 2, 2), 3, 21);
        assert_eq!(session.matched(), 3, "three bees home");

        session.fire_disruption();
        let Slingshot::Targeting(hole) = session.slingshot() else {
            panic!("slingshot should be aiming, got {:?}", session.slingshot());
        };
        assert!(
            session.hive().get(hole).expect("hole exists").filled,
            "only filled holes are targeted"
        );
        let occupant = session.swarm().occupant_of(hole).expect("hole has a bee");
        let intents = session.drain_intents();
        assert!(intents.contains(&Intent::Play(Cue::Slingshot)), "twang");
        assert_eq!(
            completion_for(&intents, Target::Stone),
            Some(Completion::StoneLanded(hole)),
            "stone reports its landing"
        );

        session.on_animation_complete(Completion::StoneLanded(hole));

        assert_eq!(session.matched(), 2, "one match lost");
        assert_eq!(session.hive().filled_count(), 2, "one hole vacated");
        assert!(
            !session.hive().get(hole).expect("hole exists").filled,
            "the target hole is empty"
        );
        let evicted = session.swarm().get(occupant).expect("still in the swarm");
        assert_eq!(evicted.state, BeeState::FlyingAway, "occupant flies away");
        assert_eq!(evicted.hole, None, "occupant lost its hole");
        assert_eq!(session.slingshot(), Slingshot::Evicting(hole), "hole shakes");
        assert_consistent(&session);
        let intents = session.drain_intents();
        assert!(intents.contains(&Intent::Play(Cue::FlyAway)), "whoosh");
        assert_eq!(
            completion_for(&intents, Target::Bee(occupant)),
            Some(Completion::FlownAway(occupant)),
            "exit reports back"
        );
    }

    #[test]
    fn full_cycle_returns_to_idle_and_rebooks() {
        let mut session = with_filled_holes(small_config(4, 2, 2), 2, 22);
        session.fire_disruption();
        let Slingshot::Targeting(hole) = session.slingshot() else {
            panic!("slingshot should be aiming");
        };
        let occupant = session.swarm().occupant_of(hole).expect("hole has a bee");

        session.on_animation_complete(Completion::StoneLanded(hole));
        assert!(session.is_disruption_active(), "still busy while evicting");
        session.on_animation_complete(Completion::HoleShaken(hole));
        assert_eq!(session.slingshot(), Slingshot::Cooldown, "pulling back");
        assert!(session.disruption_due_in().is_none(), "not rebooked yet");
        session.on_animation_complete(Completion::SlingshotRetracted);

        assert_eq!(session.slingshot(), Slingshot::Idle, "idle again");
        let due = session.disruption_due_in().expect("next one booked");
        assert!(
            (Duration::from_secs(10)..Duration::from_secs(25)).contains(&due),
            "{due:?} outside the window"
        );
        assert!(
            session.drain_intents().contains(&Intent::DespawnSlingshot),
            "slingshot removed"
        );

        session.on_animation_complete(Completion::FlownAway(occupant));
        assert_eq!(session.swarm().len(), 4, "swarm size unchanged");
        assert!(session.swarm().get(occupant).is_none(), "evicted bee retired");
        let newcomers: Vec<_> = session
            .swarm()
            .iter()
            .filter(|bee| bee.id.0 >= 4)
            .collect();
        assert_eq!(newcomers.len(), 1, "exactly one replacement");
        let newcomer = newcomers.first().expect("one newcomer");
        assert_eq!(newcomer.state, BeeState::Flying, "replacement flies");
        assert!(session.is_flying_ambiently(newcomer.id), "on ambient flight");
        let intents = session.drain_intents();
        assert!(intents.contains(&Intent::DespawnBee(occupant)), "old bee removed");
        assert_consistent(&session);
    }

    #[test]
    fn no_filled_hole_retries_after_five_seconds() {
        let mut session = with_filled_holes(small_config(2, 1, 2), 0, 23);

        session.fire_disruption();

        assert_eq!(session.slingshot(), Slingshot::Idle, "nothing to aim at");
        assert_eq!(
            session.disruption_due_in(),
            Some(Duration::from_secs(5)),
            "short retry"
        );
        assert!(session.drain_intents().is_empty(), "no slingshot shown");
    }

    #[test]
    fn an_active_disruption_blocks_another() {
        let mut session = with_filled_holes(small_config(3, 2, 2), 2, 24);
        session.fire_disruption();
        let first = session.slingshot();
        session.drain_intents();

        session.fire_disruption();

        assert_eq!(session.slingshot(), first, "still the first cycle");
        assert!(session.drain_intents().is_empty(), "second firing did nothing");
        assert!(session.disruption_due_in().is_none(), "nothing booked meanwhile");
    }

    #[test]
    fn disruption_fires_on_schedule_and_never_targets_an_empty_hole() {
        for seed in 0..10 {
            let mut session = with_filled_holes(small_config(4, 2, 2), 1, 100 + seed);
            session.schedule_disruption();
            session.advance(Duration::from_secs(25));

            assert_eq!(
                session.slingshot(),
                Slingshot::Targeting(HoleId(0)),
                "the only filled hole is the target"
            );
        }
    }

    #[test]
    fn missing_occupant_still_vacates_and_rebooks() {
        let mut session = with_filled_holes(small_config(2, 1, 2), 1, 25);
        session.fire_disruption();
        let Slingshot::Targeting(hole) = session.slingshot() else {
            panic!("slingshot should be aiming");
        };
        // Detach the bee behind the session's back.
        let occupant = session.swarm().occupant_of(hole).expect("hole has a bee");
        if let Some(bee) = session.swarm.get_mut(occupant) {
            bee.hole = None;
        }

        session.on_animation_complete(Completion::StoneLanded(hole));
        session.on_animation_complete(Completion::HoleShaken(hole));
        session.on_animation_complete(Completion::SlingshotRetracted);

        assert!(
            !session.hive().get(hole).expect("hole exists").filled,
            "hole cleared anyway"
        );
        assert_eq!(session.matched(), 0, "count follows the honeycomb");
        assert_eq!(session.slingshot(), Slingshot::Idle, "cycle completed");
        assert!(session.disruption_due_in().is_some(), "rebooked");
    }

    #[test]
    fn ending_mid_cycle_freezes_the_slingshot() {
        let mut session = with_filled_holes(small_config(3, 2, 2), 2, 26);
        session.fire_disruption();
        let Slingshot::Targeting(hole) = session.slingshot() else {
            panic!("slingshot should be aiming");
        };
        session.end(crate::session::EndReason::Escaped);
        session.drain_intents();

        session.on_animation_complete(Completion::StoneLanded(hole));

        assert_eq!(session.matched(), 2, "no eviction after the end");
        assert!(
            session.hive().get(hole).expect("hole exists").filled,
            "hole untouched"
        );
        assert!(session.drain_intents().is_empty(), "no effects");
    }

    #[test]
    fn stale_completions_are_ignored() {
        let mut session = with_filled_holes(small_config(3, 2, 2), 2, 27);
        session.on_animation_complete(Completion::StoneLanded(HoleId(0)));
        session.on_animation_complete(Completion::HoleShaken(HoleId(0)));
        session.on_animation_complete(Completion::SlingshotRetracted);
        session.on_animation_complete(Completion::FlownAway(BeeId(0)));

        assert_eq!(session.matched(), 2, "nothing evicted");
        assert_eq!(session.slingshot(), Slingshot::Idle, "no cycle running");
        assert_eq!(session.swarm().len(), 3, "no respawn");
        assert!(
            session.swarm().get(BeeId(0)).is_some(),
            "inserted bee is not replaced"
        );
    }
}
