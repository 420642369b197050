//! Combat events
//!
//! Inbound (hitboxes, areas, gameplay scripts → resolver):
//! DamageRequest, HealRequest, MitigationRequest, AreaEffectTrigger.
//!
//! Outbound (resolver → UI / VFX / AI / scene lifecycle):
//! HealthChanged, DamageFeedback, DamageDealt, EntityDied, Healed,
//! Overwhelmed, Recovered, MitigationApplied, MitigationExpired,
//! AreaPhaseChanged, AreaTriggerRejected.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::combat::{AppliedDamage, AreaPhase};
use crate::components::PoolTier;

/// Тип урона (для VFX/звука, на формулу не влияет)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize)]
pub enum DamageKind {
    Melee,
    Ranged,
    Area,
    Environmental,
}

/// Запрос: нанести урон `target`
#[derive(Event, Debug, Clone)]
pub struct DamageRequest {
    pub source: Option<Entity>,
    pub target: Entity,
    /// Сырой урон до mitigation (должен быть > 0)
    pub amount: f32,
    pub kind: DamageKind,
    pub is_critical: bool,
    /// Точка попадания для feedback (None → позиция target)
    pub impact_point: Option<Vec3>,
}

impl DamageRequest {
    pub fn new(target: Entity, amount: f32, kind: DamageKind) -> Self {
        Self {
            source: None,
            target,
            amount,
            kind,
            is_critical: false,
            impact_point: None,
        }
    }

    pub fn from_source(mut self, source: Entity) -> Self {
        self.source = Some(source);
        self
    }

    pub fn critical(mut self, is_critical: bool) -> Self {
        self.is_critical = is_critical;
        self
    }

    pub fn at(mut self, impact_point: Vec3) -> Self {
        self.impact_point = Some(impact_point);
        self
    }
}

/// Запрос: вылечить `target`
#[derive(Event, Debug, Clone)]
pub struct HealRequest {
    pub target: Entity,
    pub amount: u32,
}

/// Запрос: наложить mitigation через CapabilityBroadcaster
#[derive(Event, Debug, Clone)]
pub struct MitigationRequest {
    pub source: Entity,
    pub target: Entity,
    pub percent: f32,
    pub duration: f32,
}

/// Внешний trigger area effect (force = игнорировать Active/Cooldown)
#[derive(Event, Debug, Clone)]
pub struct AreaEffectTrigger {
    pub entity: Entity,
    pub force: bool,
}

/// Событие: изменился один ярус пула (для UI слайдеров)
#[derive(Event, Debug, Clone, PartialEq)]
pub struct HealthChanged {
    pub entity: Entity,
    pub tier: PoolTier,
    pub current: u32,
    pub max: u32,
}

/// Событие: показать число урона / VFX в точке
#[derive(Event, Debug, Clone, PartialEq)]
pub struct DamageFeedback {
    pub entity: Entity,
    pub position: Vec3,
    pub amount: u32,
    pub is_critical: bool,
}

/// Событие: урон нанесен
///
/// Генерируется после применения damage к HealthPool.
/// Используется для AI реакций, логов, статистики.
#[derive(Event, Debug, Clone)]
pub struct DamageDealt {
    pub attacker: Option<Entity>,
    pub target: Entity,
    pub kind: DamageKind,
    pub is_critical: bool,
    pub applied: AppliedDamage,
}

/// Событие: entity умер (TotalCurrent >0 → 0), ровно один раз
#[derive(Event, Debug, Clone, PartialEq)]
pub struct EntityDied {
    pub entity: Entity,
    pub killer: Option<Entity>,
}

#[derive(Event, Debug, Clone, PartialEq)]
pub struct Healed {
    pub entity: Entity,
    pub amount: u32,
}

/// Событие: entity перегружен частыми попаданиями (stagger)
#[derive(Event, Debug, Clone, PartialEq)]
pub struct Overwhelmed {
    pub entity: Entity,
}

/// Событие: entity восстановился после Overwhelmed
#[derive(Event, Debug, Clone, PartialEq)]
pub struct Recovered {
    pub entity: Entity,
}

/// Результат broadcast'а mitigation (applied = сработала прямая capability)
#[derive(Event, Debug, Clone, PartialEq)]
pub struct MitigationApplied {
    pub source: Entity,
    pub target: Entity,
    pub percent: f32,
    pub duration: f32,
    pub applied: bool,
}

#[derive(Event, Debug, Clone, PartialEq)]
pub struct MitigationExpired {
    pub entity: Entity,
}

/// Событие: area effect сменил фазу (включить/выключить volume и визуал)
#[derive(Event, Debug, Clone, PartialEq)]
pub struct AreaPhaseChanged {
    pub entity: Entity,
    pub phase: AreaPhase,
}

#[derive(Event, Debug, Clone, PartialEq)]
pub struct AreaTriggerRejected {
    pub entity: Entity,
    pub phase: AreaPhase,
}
