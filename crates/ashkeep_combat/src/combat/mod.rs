//! Combat module: урон, сопротивление, ауры, hitbox'ы
//!
//! ECS ответственность:
//! - Game state: HealthPool, Mitigation, ImpactWindow, AreaEffect, HitSource
//! - Combat rules: resolver (mitigation → primary → secondary), death policy
//! - Capability discovery: доставка эффектов на произвольные entity
//! - Events: DamageRequest → HealthChanged / DamageDealt / EntityDied / ...
//!
//! Все таймеры — scoped (внутри компонентов), считаются по fixed clock.

use bevy::prelude::*;

pub mod capability;
pub mod components;
pub mod error;
pub mod events;
pub mod spatial;
pub mod systems;
pub mod timer;


// Re-export основных типов
pub use capability::{
    broadcast_mitigation, deliver_damage, queue_mitigation, CapabilityAppExt, CapabilityMessage, CapabilityRegistry,
    CombatInbox, Damageable, Delivery, GenericReceiver, MitigationReceiver,
};
pub use components::*;
pub use error::{ActivationRejected, DamageRejection, MitigationRejection};
pub use events::*;
pub use spatial::{Occupant, SpatialIndex, SpatialQuery};
pub use systems::{disable_combatant, resolve_damage, resolve_heal, AppliedDamage, Dead, DespawnAfter};
pub use timer::{ScopedTimer, TimerPurpose};

use crate::components::HealthPool;
use crate::config::CombatTuning;
use crate::DeterministicRng;

/// Набор всех combat систем (для `.after(CombatSystems)` снаружи)
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct CombatSystems;

/// Combat Plugin
///
/// Регистрирует события, capability и системы в FixedUpdate.
///
/// Порядок выполнения:
/// 1. refresh_spatial_index — снапшот позиций на тик
/// 2. expire_mitigations — истёкшие модификаторы
/// 3. tick_impact_windows — Overwhelmed → Recovered
/// 4. process_mitigation_requests — MitigationRequest → broadcaster
/// 5. update_area_effects — фазы, триггеры, sweep
/// 6. detect_hit_source_overlaps / tick_hit_source_lifetimes — hitbox'ы
/// 7. apply_damage_requests / apply_heal_requests — resolver
/// 8. apply_death_policy / despawn_after_timeout — смерть
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        // Регистрация событий (inbound)
        app.add_event::<DamageRequest>()
            .add_event::<HealRequest>()
            .add_event::<MitigationRequest>()
            .add_event::<AreaEffectTrigger>();

        // Регистрация событий (outbound)
        app.add_event::<HealthChanged>()
            .add_event::<DamageFeedback>()
            .add_event::<DamageDealt>()
            .add_event::<EntityDied>()
            .add_event::<Healed>()
            .add_event::<Overwhelmed>()
            .add_event::<Recovered>()
            .add_event::<MitigationApplied>()
            .add_event::<MitigationExpired>()
            .add_event::<AreaPhaseChanged>()
            .add_event::<AreaTriggerRejected>();

        // Resources (host-provided RNG/tuning не перезаписываются)
        app.init_resource::<SpatialIndex>()
            .init_resource::<CombatTuning>()
            .init_resource::<DeterministicRng>();

        // Встроенные capability
        app.register_mitigation_receiver::<Mitigation>()
            .register_damageable::<HealthPool>()
            .register_generic_receiver::<CombatInbox>();

        // Регистрация систем в FixedUpdate
        app.add_systems(
            FixedUpdate,
            (
                // Фаза 1: снапшот мира + таймеры
                spatial::refresh_spatial_index,
                systems::expire_mitigations,
                systems::tick_impact_windows,

                // Фаза 2: источники эффектов
                systems::process_mitigation_requests,
                systems::update_area_effects,
                systems::detect_hit_source_overlaps,
                systems::tick_hit_source_lifetimes,

                // Фаза 3: resolver
                systems::apply_damage_requests,
                systems::apply_heal_requests,

                // Фаза 4: смерть
                systems::apply_death_policy,
                systems::despawn_after_timeout,
            )
                .chain() // Последовательное выполнение
                .in_set(CombatSystems),
        );
    }
}
