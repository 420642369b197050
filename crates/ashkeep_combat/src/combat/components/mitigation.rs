//! Mitigation modifier — временное процентное снижение входящего урона.

use bevy::prelude::*;

use crate::combat::error::{validate_mitigation, MitigationRejection};
use crate::combat::timer::{ScopedTimer, TimerPurpose};

/// Активный модификатор снижения урона
///
/// - Максимум один на entity: повторное наложение заменяет (без стакания)
/// - После истечения effective percent = 0, даже если система ещё не почистила запись
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct Mitigation {
    percent: f32,
    expiry: ScopedTimer,
}

impl Default for Mitigation {
    fn default() -> Self {
        Self {
            percent: 0.0,
            expiry: ScopedTimer::new(TimerPurpose::MitigationExpiry),
        }
    }
}

impl Mitigation {
    /// Ставит/заменяет модификатор `{percent, now + duration}`, перезапуская expiry.
    pub fn install(&mut self, percent: f32, duration: f32, now: f32) -> Result<(), MitigationRejection> {
        validate_mitigation(percent, duration)?;
        self.percent = percent;
        self.expiry.start(now, duration);
        Ok(())
    }

    pub fn effective_percent(&self, now: f32) -> f32 {
        if self.expiry.is_pending() && !self.expiry.is_elapsed(now) {
            self.percent
        } else {
            0.0
        }
    }

    pub fn is_active(&self, now: f32) -> bool {
        self.effective_percent(now) > 0.0
    }

    pub fn expires_at(&self) -> Option<f32> {
        self.expiry.deadline()
    }

    /// raw × (1 − percent)
    pub fn mitigate(&self, raw: f32, now: f32) -> f32 {
        raw * (1.0 - self.effective_percent(now))
    }

    /// Чистит истёкший модификатор. Returns true ровно один раз при истечении.
    pub fn tick(&mut self, now: f32) -> bool {
        if self.expiry.poll(now) {
            self.percent = 0.0;
            true
        } else {
            false
        }
    }

    /// Отмена без события (disable/despawn)
    pub fn clear(&mut self) {
        self.percent = 0.0;
        self.expiry.cancel();
    }
}
