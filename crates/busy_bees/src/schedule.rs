use core::time::Duration;

use bevy::prelude::*;

use crate::bee::BeeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

/// Work the session wants done later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    /// Once per second while the session runs.
    Countdown,
    Disruption,
    /// Next leg of a bee's ambient flight.
    FlightLeg(BeeId),
}

#[derive(Debug)]
struct Entry {
    id: TaskId,
    task: Task,
    timer: Timer,
}

/// Cancelable timers driven by frame time.
#[derive(Debug, Default)]
pub struct Scheduler {
    entries: Vec<Entry>,
    next_id: u64,
}

impl Scheduler {
    /// Fires `task` once after `delay`.
    pub fn after(&mut self, delay: Duration, task: Task) -> TaskId {
        self.push(task, Timer::new(delay, TimerMode::Once))
    }

    /// Fires `task` every `period` until cancelled.
    pub fn every(&mut self, period: Duration, task: Task) -> TaskId {
        self.push(task, Timer::new(period, TimerMode::Repeating))
    }

    fn push(&mut self, task: Task, timer: Timer) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry { id, task, timer });
        id
    }

    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }

    /// Cancels every pending occurrence of `task`.
    pub fn cancel_task(&mut self, task: Task) {
        self.entries.retain(|entry| entry.task != task);
    }

    pub fn cancel_all(&mut self) {
        self.entries.clear();
    }

    pub fn is_pending(&self, task: Task) -> bool {
        self.entries.iter().any(|entry| entry.task == task)
    }

    /// Time until the next firing of `task`.
    pub fn due_in(&self, task: Task) -> Option<Duration> {
        self.entries
            .iter()
            .filter(|entry| entry.task == task)
            .map(|entry| entry.timer.remaining())
            .min()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Moves time forward and returns what fired, earliest first. One shot tasks are
    /// dropped once they fire.
    pub fn advance(&mut self, delta: Duration) -> Vec<Task> {
        let mut fired: Vec<(Duration, u64, Task)> = Vec::new();
        for entry in &mut self.entries {
            let first = entry.timer.remaining();
            let period = entry.timer.duration();
            entry.timer.tick(delta);
            let times = match entry.timer.mode() {
                TimerMode::Once => u32::from(entry.timer.just_finished()),
                TimerMode::Repeating => entry.timer.times_finished_this_tick(),
            };
            for n in 0..times {
                fired.push((first + period * n, entry.id.0, entry.task));
            }
        }
        self.entries
            .retain(|entry| !(entry.timer.mode() == TimerMode::Once && entry.timer.finished()));
        fired.sort_by_key(|&(at, id, _)| (at, id));
        fired.into_iter().map(|(_, _, task)| task).collect()
    }
}
