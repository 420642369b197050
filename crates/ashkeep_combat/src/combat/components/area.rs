//! Area effect controller (Idle → Active → Cooldown → Idle)
//!
//! Актор с аурой: при активации раздаёт mitigation себе и всем подходящим
//! entity в радиусе, новые вошедшие получают её один раз за активацию.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::combat::error::ActivationRejected;
use crate::combat::timer::{ScopedTimer, TimerPurpose};
use crate::components::CombatLayers;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect, Serialize, Deserialize)]
pub enum AreaPhase {
    #[default]
    Idle,
    Active,
    Cooldown,
}

/// Кого аура считает целью (относительно фракции владельца)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect, Serialize, Deserialize)]
pub enum FactionFilter {
    Allies,
    Hostiles,
    Everyone,
}

impl FactionFilter {
    /// Entity без фракции никому не союзник
    pub fn accepts(&self, owner: Option<u64>, other: Option<u64>) -> bool {
        let allied = matches!((owner, other), (Some(a), Some(b)) if a == b);
        match self {
            FactionFilter::Allies => allied,
            FactionFilter::Hostiles => !allied,
            FactionFilter::Everyone => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Reflect, Serialize, Deserialize)]
#[serde(default)]
pub struct AreaEffectConfig {
    /// Радиус spatial query (метры)
    pub activation_radius: f32,
    /// Снижение урона для затронутых (0..1)
    pub mitigation_percent: f32,
    /// Длительность Active фазы = длительность mitigation
    pub mitigation_duration: f32,
    pub cooldown_duration: f32,
    pub affected_layers: CombatLayers,
    pub mitigation_targets: FactionFilter,
    /// Макс. разница по высоте (другой этаж/уступ не задеваем)
    pub vertical_tolerance: f32,
    /// Вешать mitigation на самого владельца
    pub include_self: bool,
    /// Health-gated вариант: авто-активация при ratio ≤ threshold
    pub health_trigger: Option<f32>,
    /// Урон враждебным вошедшим (раз за активацию)
    pub contact_damage: Option<f32>,
}

impl Default for AreaEffectConfig {
    fn default() -> Self {
        Self {
            activation_radius: 8.0,
            mitigation_percent: 0.25,
            mitigation_duration: 10.0,
            cooldown_duration: 4.5,
            affected_layers: CombatLayers::ACTORS,
            mitigation_targets: FactionFilter::Allies,
            vertical_tolerance: 2.0,
            include_self: true,
            health_trigger: None,
            contact_damage: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum HealthMonitor {
    Watching,
    /// Пул владельца пропал — авто-активация выключена навсегда
    Stopped,
}

#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct AreaEffect {
    pub config: AreaEffectConfig,
    phase: AreaPhase,
    cycle: ScopedTimer,
    /// Кто уже получил mitigation в этой активации
    affected: Vec<Entity>,
    /// Кто уже получил contact damage в этой активации
    damaged: Vec<Entity>,
    monitor: HealthMonitor,
    activations: u32,
}

impl Default for AreaEffect {
    fn default() -> Self {
        Self::new(AreaEffectConfig::default())
    }
}

impl AreaEffect {
    pub fn new(config: AreaEffectConfig) -> Self {
        Self {
            config,
            phase: AreaPhase::Idle,
            cycle: ScopedTimer::new(TimerPurpose::ActivationCycle),
            affected: Vec::new(),
            damaged: Vec::new(),
            monitor: HealthMonitor::Watching,
            activations: 0,
        }
    }

    pub fn phase(&self) -> AreaPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == AreaPhase::Active
    }

    pub fn activations(&self) -> u32 {
        self.activations
    }

    pub fn monitor(&self) -> HealthMonitor {
        self.monitor
    }

    pub fn phase_remaining(&self, now: f32) -> f32 {
        self.cycle.remaining(now)
    }

    /// Idle → Active. Во время Active/Cooldown — отказ, если не `force`.
    pub fn try_activate(&mut self, now: f32, force: bool) -> Result<(), ActivationRejected> {
        if self.phase != AreaPhase::Idle && !force {
            return Err(ActivationRejected { phase: self.phase });
        }

        self.phase = AreaPhase::Active;
        self.cycle.start(now, self.config.mitigation_duration);
        self.affected.clear();
        self.damaged.clear();
        self.activations += 1;
        Ok(())
    }

    /// Продвигает цикл. Returns новую фазу при переходе.
    ///
    /// Следующая фаза отсчитывается от deadline предыдущей, не от `now`,
    /// поэтому длительности точные при любом шаге тика.
    pub fn tick(&mut self, now: f32) -> Option<AreaPhase> {
        let deadline = self.cycle.deadline()?;
        if now < deadline {
            return None;
        }

        match self.phase {
            AreaPhase::Active => {
                self.phase = AreaPhase::Cooldown;
                self.cycle.start(deadline, self.config.cooldown_duration);
                self.affected.clear();
                self.damaged.clear();
                Some(AreaPhase::Cooldown)
            }
            AreaPhase::Cooldown => {
                self.phase = AreaPhase::Idle;
                self.cycle.cancel();
                Some(AreaPhase::Idle)
            }
            AreaPhase::Idle => {
                self.cycle.cancel();
                None
            }
        }
    }

    /// true если entity получает mitigation впервые за эту активацию
    pub fn mark_affected(&mut self, entity: Entity) -> bool {
        if self.affected.contains(&entity) {
            return false;
        }
        self.affected.push(entity);
        true
    }

    pub fn mark_damaged(&mut self, entity: Entity) -> bool {
        if self.damaged.contains(&entity) {
            return false;
        }
        self.damaged.push(entity);
        true
    }

    pub fn affected(&self) -> &[Entity] {
        &self.affected
    }

    /// Health-gated авто-активация: только из Idle, только пока монитор жив
    pub fn health_gate_open(&self, health_ratio: f32) -> bool {
        self.phase == AreaPhase::Idle
            && self.monitor == HealthMonitor::Watching
            && self
                .config
                .health_trigger
                .is_some_and(|threshold| health_ratio <= threshold)
    }

    pub fn wants_health_monitor(&self) -> bool {
        self.config.health_trigger.is_some() && self.monitor == HealthMonitor::Watching
    }

    pub fn stop_monitor(&mut self) {
        self.monitor = HealthMonitor::Stopped;
    }

    /// Отмена цикла без событий (disable/death владельца)
    pub fn cancel(&mut self) {
        self.phase = AreaPhase::Idle;
        self.cycle.cancel();
        self.affected.clear();
        self.damaged.clear();
    }
}
