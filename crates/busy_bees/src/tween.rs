//! The animation capability the session talks to.
//!
//! The session never moves anything itself. It describes where a [`Target`] should end up
//! as a [`Pose`] and hands over a [`Tween`]; whoever renders the game interpolates, and
//! reports back the optional [`Completion`] once the tween has run its course.

use core::time::Duration;

use bevy::math::curve::{Curve, EaseFunction, EasingCurve};
use bevy::prelude::*;

use crate::bee::BeeId;
use crate::hive::HoleId;

/// Something the session can animate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Bee(BeeId),
    Hole(HoleId),
    Slingshot,
    Stone,
}

/// Properties a tween drives. `None` leaves the property where it is.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    pub position: Option<Vec2>,
    pub scale: Option<f32>,
    /// Radians, counter clockwise.
    pub rotation: Option<f32>,
    pub opacity: Option<f32>,
}

impl Pose {
    pub fn at(position: Vec2) -> Self {
        Self {
            position: Some(position),
            ..default()
        }
    }

    pub fn scaled(self, scale: f32) -> Self {
        Self {
            scale: Some(scale),
            ..self
        }
    }

    pub fn rotated(self, rotation: f32) -> Self {
        Self {
            rotation: Some(rotation),
            ..self
        }
    }

    pub fn faded(self, opacity: f32) -> Self {
        Self {
            opacity: Some(opacity),
            ..self
        }
    }

    /// `self` overridden by whatever `later` sets.
    pub fn then(self, later: Self) -> Self {
        Self {
            position: later.position.or(self.position),
            scale: later.scale.or(self.scale),
            rotation: later.rotation.or(self.rotation),
            opacity: later.opacity.or(self.opacity),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Easing {
    Linear,
    QuadIn,
    QuadInOut,
    /// Overshoots a little before settling.
    BackOut,
    BounceOut,
}

impl Easing {
    const fn curve(self) -> EaseFunction {
        match self {
            Self::Linear => EaseFunction::Linear,
            Self::QuadIn => EaseFunction::QuadraticIn,
            Self::QuadInOut => EaseFunction::QuadraticInOut,
            Self::BackOut => EaseFunction::BackOut,
            Self::BounceOut => EaseFunction::BounceOut,
        }
    }

    /// Eased progress for `t`, clamped to `0..=1`.
    pub fn apply(self, t: f32) -> f32 {
        EasingCurve::new(0.0, 1.0, self.curve()).sample_clamped(t)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    pub to: Pose,
    /// Length of one pass.
    pub duration: Duration,
    pub easing: Easing,
    /// Extra passes after the first one.
    pub repeat: u32,
    /// Every other pass runs backwards.
    pub yoyo: bool,
}

impl Tween {
    pub const fn new(to: Pose, duration: Duration, easing: Easing) -> Self {
        Self {
            to,
            duration,
            easing,
            repeat: 0,
            yoyo: false,
        }
    }

    pub const fn yoyo(self, repeat: u32) -> Self {
        Self {
            repeat,
            yoyo: true,
            ..self
        }
    }

    pub fn total_duration(&self) -> Duration {
        self.duration * (self.repeat + 1)
    }

    pub fn is_finished(&self, elapsed: Duration) -> bool {
        elapsed >= self.total_duration()
    }

    /// Eased interpolation factor between the start pose (0) and `to` (1).
    pub fn progress(&self, elapsed: Duration) -> f32 {
        let pass = self.duration.as_secs_f32();
        if pass <= 0.0 {
            return self.settled_progress();
        }
        let passes = elapsed.as_secs_f32() / pass;
        let mut cycle = passes.floor() as u32;
        let mut local = passes - passes.floor();
        if cycle > self.repeat {
            cycle = self.repeat;
            local = 1.0;
        }
        if self.yoyo && cycle % 2 == 1 {
            local = 1.0 - local;
        }
        self.easing.apply(local)
    }

    fn settled_progress(&self) -> f32 {
        if self.yoyo && self.repeat % 2 == 1 {
            0.0
        } else {
            1.0
        }
    }
}

/// What to tell the session when a tween finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Completion {
    /// A committed bee reached the center of its hole.
    Settled(BeeId),
    StoneLanded(HoleId),
    HoleShaken(HoleId),
    SlingshotRetracted,
    /// An evicted bee left the screen.
    FlownAway(BeeId),
}
