//! Базовые компоненты акторов: Actor, HealthPool, HealthProfile, CombatLayers

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::combat::{ImpactWindow, Mitigation};

/// Актор (игрок, враг, призванное существо) — базовый компонент для живых существ
///
/// Автоматически добавляет HealthPool, HealthProfile, Mitigation, ImpactWindow,
/// CombatLayers и Transform через Required Components.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
#[require(HealthPool, HealthProfile, Mitigation, ImpactWindow, CombatLayers, Transform)]
pub struct Actor {
    /// Stable ID фракции (friendly fire, area filters)
    pub faction_id: u64,
}

impl Actor {
    pub fn is_allied_with(&self, other: &Actor) -> bool {
        self.faction_id == other.faction_id
    }
}

/// Один ярус пула здоровья
///
/// Инвариант: 0 ≤ current ≤ max
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect, Serialize, Deserialize)]
pub struct Pool {
    pub current: u32,
    pub max: u32,
}

impl Pool {
    pub fn full(max: u32) -> Self {
        Self { current: max, max }
    }

    pub fn deficit(&self) -> u32 {
        self.max - self.current
    }

    /// Снимает до `amount`, возвращает сколько реально снято
    fn drain(&mut self, amount: u32) -> u32 {
        let taken = amount.min(self.current);
        self.current -= taken;
        taken
    }

    /// Заполняет до `amount`, возвращает сколько реально добавлено
    fn fill(&mut self, amount: u32) -> u32 {
        let added = amount.min(self.deficit());
        self.current += added;
        added
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize)]
pub enum PoolTier {
    /// Внешний слой (щит, броня) — тратится первым
    Primary,
    /// Внутренний слой (жизнь)
    Secondary,
}

/// Двухъярусный пул здоровья
///
/// Урон сначала полностью выжигает `primary`, остаток переходит в `secondary`.
/// Лечение наоборот заполняет `primary` первым.
/// Entity мертв iff `total_current() == 0`.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct HealthPool {
    pub primary: Pool,
    pub secondary: Pool,
}

impl Default for HealthPool {
    fn default() -> Self {
        Self::new(0, 100) // Default: без щита, 100 HP
    }
}

impl HealthPool {
    pub fn new(primary_max: u32, secondary_max: u32) -> Self {
        Self {
            primary: Pool::full(primary_max),
            secondary: Pool::full(secondary_max),
        }
    }

    /// Сумма ярусов в u64: каждый ярус может быть до `u32::MAX`
    pub fn total_current(&self) -> u64 {
        u64::from(self.primary.current) + u64::from(self.secondary.current)
    }

    pub fn total_max(&self) -> u64 {
        u64::from(self.primary.max) + u64::from(self.secondary.max)
    }

    pub fn is_alive(&self) -> bool {
        self.total_current() > 0
    }

    /// Доля оставшегося здоровья (0.0..=1.0), 0.0 для пустого пула
    pub fn ratio(&self) -> f32 {
        let max = self.total_max();
        if max == 0 {
            return 0.0;
        }
        (self.total_current() as f64 / max as f64) as f32
    }

    pub fn tier(&self, tier: PoolTier) -> Pool {
        match tier {
            PoolTier::Primary => self.primary,
            PoolTier::Secondary => self.secondary,
        }
    }

    /// Применяет уже смягчённый урон. Остаток сверх обоих пулов теряется.
    ///
    /// Returns `(from_primary, from_secondary)`.
    pub fn take_damage(&mut self, amount: u32) -> (u32, u32) {
        let from_primary = self.primary.drain(amount);
        let from_secondary = self.secondary.drain(amount - from_primary);
        (from_primary, from_secondary)
    }

    /// Лечение: сначала дефицит primary, потом secondary. Мёртвых не лечим.
    ///
    /// Returns сколько реально восстановлено.
    pub fn heal(&mut self, amount: u32) -> u32 {
        if !self.is_alive() {
            return 0;
        }
        let to_primary = self.primary.fill(amount);
        let to_secondary = self.secondary.fill(amount - to_primary);
        to_primary + to_secondary
    }
}

/// Что делать со entity после смерти
#[derive(Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
pub enum DeathPolicy {
    /// Деспавн (сразу при `delay <= 0`, иначе через DespawnAfter)
    Despawn { delay: f32 },
    /// Оставить труп: маркер Dead + bevy `Disabled`, все таймеры отменены
    Disable,
}

/// Когда слать DamageFeedback (числа урона, VFX)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect, Serialize, Deserialize)]
pub enum FeedbackRouting {
    Always,
    CriticalOnly,
    Off,
}

impl FeedbackRouting {
    pub fn should_emit(&self, is_critical: bool) -> bool {
        match self {
            FeedbackRouting::Always => true,
            FeedbackRouting::CriticalOnly => is_critical,
            FeedbackRouting::Off => false,
        }
    }
}

/// Per-entity параметры health-модели (заменяет три разные реализации здоровья)
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct HealthProfile {
    pub death_policy: DeathPolicy,
    pub feedback: FeedbackRouting,
}

impl Default for HealthProfile {
    fn default() -> Self {
        Self {
            death_policy: DeathPolicy::Disable,
            feedback: FeedbackRouting::Always,
        }
    }
}

/// Combat-слои (битовая маска): на каком слое entity для hitbox/area фильтров
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct CombatLayers(pub u32);

impl CombatLayers {
    pub const NONE: Self = Self(0);
    pub const ACTORS: Self = Self(0b1);
    pub const PLAYER: Self = Self(0b10);
    pub const ENEMY: Self = Self(0b100);
    pub const PROPS: Self = Self(0b1000);
    pub const ALL: Self = Self(u32::MAX);

    pub fn intersects(&self, other: CombatLayers) -> bool {
        self.0 & other.0 != 0
    }

    pub fn with(self, other: CombatLayers) -> Self {
        Self(self.0 | other.0)
    }
}

impl Default for CombatLayers {
    fn default() -> Self {
        Self::ACTORS
    }
}

/// Дочерний hurtbox → корневой актор (hit sources бьют root, не части тела)
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct HurtboxOf(pub Entity);
