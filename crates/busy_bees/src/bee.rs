use core::fmt::{self, Display, Formatter};

use bevy::prelude::*;
use strum::{EnumIter, IntoEnumIterator};

use crate::hive::HoleId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BeeId(pub u32);

impl Display for BeeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Emotion {
    Happy,
    Angry,
    Excited,
    Sleepy,
    Curious,
}

impl Emotion {
    pub fn random(rng: &mut fastrand::Rng) -> Self {
        rng.choice(Self::iter()).unwrap_or(Self::Happy)
    }

    pub const fn message(self) -> &'static str {
        match self {
            Self::Happy => "Hooray!",
            Self::Angry => "Leave me alone!",
            Self::Excited => "Let's go!",
            Self::Sleepy => "zzzz...",
            Self::Curious => "What's this?",
        }
    }

    pub const fn color(self) -> Color {
        match self {
            Self::Happy => Color::srgb(1.0, 0.82, 0.1),
            Self::Angry => Color::srgb(0.95, 0.35, 0.15),
            Self::Excited => Color::srgb(1.0, 0.6, 0.0),
            Self::Sleepy => Color::srgb(0.85, 0.8, 0.55),
            Self::Curious => Color::srgb(0.75, 0.9, 0.25),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BeeState {
    #[default]
    Flying,
    Dragging,
    Inserted,
    FlyingAway,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bee {
    pub id: BeeId,
    pub emotion: Emotion,
    /// Last position known to the session. While a flight leg runs this is the leg's
    /// destination, the renderer holds the in-between positions.
    pub position: Vec2,
    pub state: BeeState,
    /// Only set while `state` is `Inserted`.
    pub hole: Option<HoleId>,
}

/// Creates a flying bee with a random emotion somewhere inside `area`.
pub fn spawn_bee(id: BeeId, rng: &mut fastrand::Rng, area: Rect) -> Bee {
    Bee {
        id,
        emotion: Emotion::random(rng),
        position: random_point(rng, area),
        state: BeeState::Flying,
        hole: None,
    }
}

pub fn random_point(rng: &mut fastrand::Rng, area: Rect) -> Vec2 {
    Vec2::new(
        rng.f32().mul_add(area.width(), area.min.x),
        rng.f32().mul_add(area.height(), area.min.y),
    )
}

/// The active bees. Ids are handed out monotonically so a respawned bee never aliases a
/// live one.
#[derive(Debug, Default)]
pub struct Swarm {
    bees: Vec<Bee>,
    next_id: u32,
}

impl Swarm {
    pub fn spawn(&mut self, rng: &mut fastrand::Rng, area: Rect) -> Bee {
        let id = BeeId(self.next_id);
        self.next_id += 1;
        let bee = spawn_bee(id, rng, area);
        self.bees.push(bee.clone());
        bee
    }

    /// Retires `old` and spawns its replacement. `None` if `old` is not in the swarm.
    pub fn respawn(&mut self, old: BeeId, rng: &mut fastrand::Rng, area: Rect) -> Option<Bee> {
        let index = self.bees.iter().position(|bee| bee.id == old)?;
        self.bees.remove(index);
        Some(self.spawn(rng, area))
    }

    pub fn get(&self, id: BeeId) -> Option<&Bee> {
        self.bees.iter().find(|bee| bee.id == id)
    }

    pub fn get_mut(&mut self, id: BeeId) -> Option<&mut Bee> {
        self.bees.iter_mut().find(|bee| bee.id == id)
    }

    /// The bee sitting in `hole`, if any.
    pub fn occupant_of(&self, hole: HoleId) -> Option<BeeId> {
        self.bees
            .iter()
            .find(|bee| bee.state == BeeState::Inserted && bee.hole == Some(hole))
            .map(|bee| bee.id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bee> {
        self.bees.iter()
    }

    pub fn len(&self) -> usize {
        self.bees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bees.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area() -> Rect {
        Rect::new(-100.0, -200.0, 100.0, 0.0)
    }

    #[test]
    fn spawned_bees_fly_inside_the_area() {
        let mut rng = fastrand::Rng::with_seed(7);
        let mut swarm = Swarm::default();
        for _ in 0..50 {
            let bee = swarm.spawn(&mut rng, area());
            assert!(area().contains(bee.position), "{bee:?} outside the area");
            assert_eq!(bee.state, BeeState::Flying, "new bees fly");
            assert_eq!(bee.hole, None, "new bees have no hole");
        }
        assert_eq!(swarm.len(), 50, "every spawn is kept");
    }

    #[test]
    fn respawn_replaces_exactly_one_bee_with_a_fresh_id() {
        let mut rng = fastrand::Rng::with_seed(11);
        let mut swarm = Swarm::default();
        let first = swarm.spawn(&mut rng, area()).id;
        let second = swarm.spawn(&mut rng, area()).id;

        let replacement = swarm
            .respawn(first, &mut rng, area())
            .expect("first bee is in the swarm");

        assert_eq!(swarm.len(), 2, "swarm size is unchanged");
        assert!(swarm.get(first).is_none(), "old bee is gone");
        assert!(swarm.get(second).is_some(), "other bee untouched");
        assert_ne!(replacement.id, first, "replacement gets a new id");
        assert_ne!(replacement.id, second, "ids never alias");
        assert!(swarm.respawn(first, &mut rng, area()).is_none(), "unknown bee");
    }

    #[test]
    fn occupant_lookup_only_sees_inserted_bees() {
        let mut rng = fastrand::Rng::with_seed(3);
        let mut swarm = Swarm::default();
        let id = swarm.spawn(&mut rng, area()).id;
        assert_eq!(swarm.occupant_of(HoleId(2)), None, "nobody inserted yet");

        let bee = swarm.get_mut(id).expect("bee exists");
        bee.state = BeeState::Inserted;
        bee.hole = Some(HoleId(2));
        assert_eq!(swarm.occupant_of(HoleId(2)), Some(id), "bee sits in hole 2");
        assert_eq!(swarm.occupant_of(HoleId(3)), None, "hole 3 is empty");
    }

    #[test]
    fn every_emotion_has_a_message() {
        let mut rng = fastrand::Rng::with_seed(1);
        let seen: Vec<Emotion> = (0..200).map(|_| Emotion::random(&mut rng)).collect();
        for emotion in Emotion::iter() {
            assert!(seen.contains(&emotion), "{emotion:?} never drawn");
            assert!(!emotion.message().is_empty(), "{emotion:?} has no message");
        }
        assert_eq!(Emotion::Sleepy.message(), "zzzz...", "sleepy bees snore");
    }
}
