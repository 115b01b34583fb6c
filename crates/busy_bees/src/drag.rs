use bevy::log::debug;
use bevy::prelude::*;
use thiserror::Error;

use crate::bee::{BeeId, BeeState};
use crate::hive::HoleId;
use crate::session::{Cue, Intent, Session};
use crate::tween::{Pose, Target};

/// Why a drag did not start. None of these are failures, the press is simply ignored.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragRejected {
    #[error("the session has not started")]
    NotStarted,

    #[error("the session is over")]
    SessionEnded,

    #[error("bee {0} is not in the swarm")]
    UnknownBee(BeeId),

    #[error("bee {0} already sits in a hole")]
    Inserted(BeeId),

    #[error("bee {0} is flying away")]
    FlyingAway(BeeId),

    #[error("bee {0} is already being dragged")]
    InProgress(BeeId),
}

/// The drag in progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drag {
    pub bee: BeeId,
    last_pointer: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    Inserted { bee: BeeId, hole: HoleId },
    /// No free hole close enough, the bee flies off again.
    Released(BeeId),
    /// There was no drag to finish.
    Ignored,
}

impl Session {
    /// Picks up `bee`, currently drawn at `position`, under the pointer.
    pub fn begin_drag(
        &mut self,
        bee: BeeId,
        pointer: Vec2,
        position: Vec2,
    ) -> Result<(), DragRejected> {
        if !self.is_started() {
            return Err(DragRejected::NotStarted);
        }
        if self.is_ended() {
            return Err(DragRejected::SessionEnded);
        }
        if let Some(drag) = self.drag {
            return Err(DragRejected::InProgress(drag.bee));
        }
        let Some(state) = self.swarm.get(bee).map(|bee| bee.state) else {
            return Err(DragRejected::UnknownBee(bee));
        };
        match state {
            BeeState::Inserted => return Err(DragRejected::Inserted(bee)),
            BeeState::FlyingAway => return Err(DragRejected::FlyingAway(bee)),
            BeeState::Flying | BeeState::Dragging => {}
        }

        self.ground(bee);
        if let Some(dragged) = self.swarm.get_mut(bee) {
            dragged.state = BeeState::Dragging;
            dragged.position = position;
        }
        self.drag = Some(Drag {
            bee,
            last_pointer: pointer,
        });
        self.outbox.push(Intent::SetDragging {
            bee,
            dragging: true,
        });
        self.outbox.place(Target::Bee(bee), Pose::at(position));
        self.outbox.push(Intent::Loop(Cue::Vibration));
        debug!("Picked up bee {bee}");
        Ok(())
    }

    /// Moves the dragged bee by how far the pointer moved. Returns its new position.
    pub fn drag_to(&mut self, pointer: Vec2) -> Option<Vec2> {
        let drag = self.drag.as_mut()?;
        let delta = pointer - drag.last_pointer;
        drag.last_pointer = pointer;
        let id = drag.bee;

        let bee = self.swarm.get_mut(id)?;
        bee.position += delta;
        let position = bee.position;
        self.outbox.place(Target::Bee(id), Pose::at(position));
        Some(position)
    }

    /// Drops the dragged bee into the closest free hole in reach, or lets it fly again.
    pub fn end_drag(&mut self) -> DropOutcome {
        let Some(drag) = self.drag.take() else {
            return DropOutcome::Ignored;
        };
        let id = drag.bee;
        self.outbox.push(Intent::Stop(Cue::Vibration));
        self.outbox.push(Intent::SetDragging {
            bee: id,
            dragging: false,
        });
        let Some(center) = self.swarm.get(id).map(|bee| bee.position) else {
            return DropOutcome::Ignored;
        };

        let threshold = self.config.drop_threshold;
        let target = self
            .hive
            .nearest_unfilled(center)
            .filter(|hole| hole.center.distance(center) < threshold)
            .map(|hole| hole.id);

        if let Some(hole) = target {
            if self.commit(id, hole) {
                debug!("Bee {id} dropped into {hole}");
                return DropOutcome::Inserted { bee: id, hole };
            }
        }

        if let Some(bee) = self.swarm.get_mut(id) {
            bee.state = BeeState::Flying;
        }
        self.fly(id);
        DropOutcome::Released(id)
    }

    pub const fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn dragged_bee(&self) -> Option<BeeId> {
        self.drag.map(|drag| drag.bee)
    }
}
