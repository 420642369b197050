//! Impact window — трекер частоты попаданий (Normal ⇄ Overwhelmed).
//!
//! Информационное состояние для AI/анимации (stagger), урон не гейтит.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::combat::timer::{ScopedTimer, TimerPurpose};

/// Параметры окна попаданий
#[derive(Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
pub struct ImpactConfig {
    /// Сколько быстрых попаданий подряд → Overwhelmed
    pub hit_threshold: u32,
    /// Макс. пауза между попаданиями, чтобы они считались серией (секунды)
    pub hit_count_window: f32,
    /// Сколько секунд без попаданий до Recovered
    pub recovery_no_hit_time: f32,
}

impl Default for ImpactConfig {
    fn default() -> Self {
        Self {
            hit_threshold: 3,
            hit_count_window: 1.2,
            recovery_no_hit_time: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum ImpactState {
    #[default]
    Normal,
    Overwhelmed,
}

/// Переход, который надо превратить в событие
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImpactTransition {
    Overwhelmed,
    Recovered,
}

#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct ImpactWindow {
    pub config: ImpactConfig,
    state: ImpactState,
    recent_hits: u32,
    last_hit_time: Option<f32>,
    recovery: ScopedTimer,
}

impl Default for ImpactWindow {
    fn default() -> Self {
        Self::new(ImpactConfig::default())
    }
}

impl ImpactWindow {
    pub fn new(config: ImpactConfig) -> Self {
        Self {
            config,
            state: ImpactState::Normal,
            recent_hits: 0,
            last_hit_time: None,
            recovery: ScopedTimer::new(TimerPurpose::RecoveryWindow),
        }
    }

    pub fn state(&self) -> ImpactState {
        self.state
    }

    pub fn recent_hits(&self) -> u32 {
        self.recent_hits
    }

    pub fn last_hit_time(&self) -> Option<f32> {
        self.last_hit_time
    }

    pub fn is_overwhelmed(&self) -> bool {
        self.state == ImpactState::Overwhelmed
    }

    /// Регистрирует принятое попадание.
    ///
    /// Попадание в пределах `hit_count_window` от предыдущего продолжает серию,
    /// иначе серия начинается заново с 1. Recovery таймер перезапускается всегда.
    pub fn register_hit(&mut self, now: f32) -> Option<ImpactTransition> {
        let in_window = self
            .last_hit_time
            .is_some_and(|last| now - last <= self.config.hit_count_window);

        self.recent_hits = if in_window { self.recent_hits.saturating_add(1) } else { 1 };
        self.last_hit_time = Some(now);
        self.recovery.start(now, self.config.recovery_no_hit_time);

        if self.state == ImpactState::Normal && self.recent_hits >= self.config.hit_threshold {
            self.state = ImpactState::Overwhelmed;
            return Some(ImpactTransition::Overwhelmed);
        }

        None
    }

    /// Проверяет recovery таймер. Recovered отдаётся только из Overwhelmed.
    pub fn tick(&mut self, now: f32) -> Option<ImpactTransition> {
        if !self.recovery.poll(now) {
            return None;
        }

        self.recent_hits = 0;
        if self.state == ImpactState::Overwhelmed {
            self.state = ImpactState::Normal;
            return Some(ImpactTransition::Recovered);
        }

        None
    }

    /// Отмена pending recovery (disable entity) — без событий
    pub fn cancel(&mut self) {
        self.recovery.cancel();
        self.recent_hits = 0;
        self.state = ImpactState::Normal;
    }

    pub fn has_pending_recovery(&self) -> bool {
        self.recovery.is_pending()
    }
}
