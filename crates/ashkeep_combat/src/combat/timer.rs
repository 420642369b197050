//! Scoped timers (вместо корутин)
//!
//! Каждый таймер живёт внутри компонента своей entity, ключ = entity + purpose.
//! `start` заменяет pending таймер (никаких двух истечений параллельно),
//! деспавн entity уносит таймер с собой — stale callback невозможен.

use bevy::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum TimerPurpose {
    MitigationExpiry,
    RecoveryWindow,
    ActivationCycle,
}

#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct ScopedTimer {
    pub purpose: TimerPurpose,
    deadline: Option<f32>,
}

impl ScopedTimer {
    pub fn new(purpose: TimerPurpose) -> Self {
        Self { purpose, deadline: None }
    }

    /// Запускает (или перезапускает) таймер: сработает в `now + duration`
    pub fn start(&mut self, now: f32, duration: f32) {
        self.deadline = Some(now + duration.max(0.0));
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<f32> {
        self.deadline
    }

    /// Has the deadline passed (без сброса)
    pub fn is_elapsed(&self, now: f32) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    pub fn remaining(&self, now: f32) -> f32 {
        self.deadline.map_or(0.0, |deadline| (deadline - now).max(0.0))
    }

    /// Срабатывает ровно один раз: true при истечении, таймер сбрасывается
    pub fn poll(&mut self, now: f32) -> bool {
        if self.is_elapsed(now) {
            self.deadline = None;
            true
        } else {
            false
        }
    }
}
