//! DamageResolver: применение урона/лечения к HealthPool, смерть, death policy.

use bevy::ecs::entity_disabling::Disabled;
use bevy::prelude::*;

use crate::combat::error::DamageRejection;
use crate::combat::{
    AreaEffect, DamageDealt, DamageFeedback, DamageRequest, EntityDied, HealRequest, Healed, HealthChanged,
    ImpactTransition, ImpactWindow, Mitigation, Overwhelmed,
};
use crate::components::{DeathPolicy, HealthPool, HealthProfile, PoolTier};
use crate::logger::{log, log_info};

/// Компонент-маркер: entity мертв (TotalCurrent == 0)
///
/// Используется для визуальных эффектов (death animation, fade-out)
/// и чтобы мёртвые не попадали в spatial query.
#[derive(Component, Debug)]
pub struct Dead;

/// Компонент-маркер: деспавн entity после указанного времени
///
/// Ставится death policy `Despawn { delay > 0 }`.
#[derive(Component, Debug)]
pub struct DespawnAfter {
    /// Время деспавна (в секундах fixed clock)
    pub despawn_time: f32,
}

/// Итог одного применения урона
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AppliedDamage {
    /// Сколько реально снято с пулов
    pub dealt: u32,
    /// Сколько срезал mitigation
    pub mitigated: u32,
    pub from_primary: u32,
    pub from_secondary: u32,
    /// TotalCurrent до/после
    pub pool_before: u64,
    pub pool_after: u64,
    /// Переход >0 → 0 случился именно этим ударом
    pub died: bool,
}

/// Ядро resolver'а: mitigation → drain primary → drain secondary.
///
/// - `raw` должен быть > 0 и конечным, иначе `InvalidAmount`
/// - мёртвая цель → `TargetDead` (повторный урон после смерти — no-op)
/// - effective = round(raw × (1 − mitigation_percent)), остаток сверх пулов теряется
pub fn resolve_damage(
    pool: &mut HealthPool,
    raw: f32,
    mitigation_percent: f32,
) -> Result<AppliedDamage, DamageRejection> {
    if !raw.is_finite() || raw <= 0.0 {
        return Err(DamageRejection::InvalidAmount(raw));
    }
    if !pool.is_alive() {
        return Err(DamageRejection::TargetDead);
    }

    let percent = if mitigation_percent.is_finite() {
        mitigation_percent.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let effective = (raw * (1.0 - percent)).round() as u32;
    let mitigated = (raw.round() as u32).saturating_sub(effective);

    let pool_before = pool.total_current();
    let (from_primary, from_secondary) = pool.take_damage(effective);
    let pool_after = pool.total_current();

    Ok(AppliedDamage {
        dealt: from_primary + from_secondary,
        mitigated,
        from_primary,
        from_secondary,
        pool_before,
        pool_after,
        died: pool_before > 0 && pool_after == 0,
    })
}

/// Лечение: primary deficit → secondary, clamp к max, мёртвых не лечим.
pub fn resolve_heal(pool: &mut HealthPool, amount: u32) -> u32 {
    if amount == 0 {
        return 0;
    }
    pool.heal(amount)
}

/// HealthChanged для каждого существующего яруса (primary первым)
fn write_pool_changes(entity: Entity, pool: &HealthPool, writer: &mut EventWriter<HealthChanged>) {
    for tier in [PoolTier::Primary, PoolTier::Secondary] {
        let values = pool.tier(tier);
        if values.max == 0 {
            continue;
        }
        writer.write(HealthChanged {
            entity,
            tier,
            current: values.current,
            max: values.max,
        });
    }
}

/// Система: apply DamageRequest события
///
/// Порядок уведомлений на один запрос:
/// 1. HealthChanged (primary, secondary)
/// 2. DamageFeedback (если разрешён routing)
/// 3. DamageDealt
/// 4. Overwhelmed (если серия попаданий дошла до порога)
/// 5. EntityDied (ровно один раз)
#[allow(clippy::too_many_arguments)]
pub fn apply_damage_requests(
    mut requests: EventReader<DamageRequest>,
    time: Res<Time>,
    mut targets: Query<(
        &mut HealthPool,
        Option<&Mitigation>,
        Option<&mut ImpactWindow>,
        Option<&HealthProfile>,
        Option<&Transform>,
    )>,
    mut health_changed: EventWriter<HealthChanged>,
    mut feedback_events: EventWriter<DamageFeedback>,
    mut damage_dealt: EventWriter<DamageDealt>,
    mut overwhelmed_events: EventWriter<Overwhelmed>,
    mut entity_died: EventWriter<EntityDied>,
) {
    let now = time.elapsed_secs();

    for request in requests.read() {
        let Ok((mut pool, mitigation, impact, profile, transform)) = targets.get_mut(request.target) else {
            log(&format!(
                "Damage dropped: {}",
                DamageRejection::MissingTarget(request.target)
            ));
            continue;
        };

        let mitigation_percent = mitigation.map_or(0.0, |m| m.effective_percent(now));
        let applied = match resolve_damage(&mut pool, request.amount, mitigation_percent) {
            Ok(applied) => applied,
            Err(err) => {
                log(&format!("Damage to {:?} rejected: {}", request.target, err));
                continue;
            }
        };

        write_pool_changes(request.target, &pool, &mut health_changed);

        let profile = profile.copied().unwrap_or_default();
        if profile.feedback.should_emit(request.is_critical) {
            let position = request
                .impact_point
                .or_else(|| transform.map(|t| t.translation))
                .unwrap_or(Vec3::ZERO);

            feedback_events.write(DamageFeedback {
                entity: request.target,
                position,
                amount: applied.dealt,
                is_critical: request.is_critical,
            });
        }

        damage_dealt.write(DamageDealt {
            attacker: request.source,
            target: request.target,
            kind: request.kind,
            is_critical: request.is_critical,
            applied,
        });

        if let Some(mut impact) = impact {
            if impact.register_hit(now) == Some(ImpactTransition::Overwhelmed) {
                overwhelmed_events.write(Overwhelmed { entity: request.target });
                log_info(&format!("😵 {:?} overwhelmed", request.target));
            }
        }

        if applied.died {
            entity_died.write(EntityDied {
                entity: request.target,
                killer: request.source,
            });
            log_info(&format!("INFO: Entity {:?} killed by {:?}", request.target, request.source));
        }
    }
}

/// Система: apply HealRequest события
pub fn apply_heal_requests(
    mut requests: EventReader<HealRequest>,
    mut targets: Query<&mut HealthPool>,
    mut health_changed: EventWriter<HealthChanged>,
    mut healed_events: EventWriter<Healed>,
) {
    for request in requests.read() {
        let Ok(mut pool) = targets.get_mut(request.target) else {
            continue;
        };

        let healed = resolve_heal(&mut pool, request.amount);
        if healed == 0 {
            continue;
        }

        write_pool_changes(request.target, &pool, &mut health_changed);
        healed_events.write(Healed {
            entity: request.target,
            amount: healed,
        });
    }
}

/// Отмена всех scoped таймеров entity (mitigation expiry, recovery, activation cycle)
pub fn cancel_scoped_tasks(
    mitigation: Option<Mut<Mitigation>>,
    impact: Option<Mut<ImpactWindow>>,
    area: Option<Mut<AreaEffect>>,
) {
    if let Some(mut mitigation) = mitigation {
        mitigation.clear();
    }
    if let Some(mut impact) = impact {
        impact.cancel();
    }
    if let Some(mut area) = area {
        area.cancel();
    }
}

/// Выключает entity (bevy `Disabled`) с отменой всех её таймеров.
///
/// После повторного включения никаких "хвостов" (Recovered, MitigationExpired,
/// смена фазы ауры) не прилетит.
pub fn disable_combatant(commands: &mut Commands, entity: Entity) {
    commands.queue(move |world: &mut World| {
        let Ok(mut entity_mut) = world.get_entity_mut(entity) else {
            return;
        };

        if let Some(mut mitigation) = entity_mut.get_mut::<Mitigation>() {
            mitigation.clear();
        }
        if let Some(mut impact) = entity_mut.get_mut::<ImpactWindow>() {
            impact.cancel();
        }
        if let Some(mut area) = entity_mut.get_mut::<AreaEffect>() {
            area.cancel();
        }
        entity_mut.insert(Disabled);
    });
}

/// Система: death policy (destroy vs disable)
///
/// Ставит маркер Dead, отменяет таймеры и либо деспавнит entity
/// (сразу или через DespawnAfter), либо выключает её.
pub fn apply_death_policy(
    mut commands: Commands,
    mut death_events: EventReader<EntityDied>,
    time: Res<Time>,
    mut actors: Query<(
        Option<&HealthProfile>,
        Option<&mut Mitigation>,
        Option<&mut ImpactWindow>,
        Option<&mut AreaEffect>,
    )>,
) {
    let now = time.elapsed_secs();

    for event in death_events.read() {
        let Ok((profile, mitigation, impact, area)) = actors.get_mut(event.entity) else {
            continue;
        };
        let policy = profile.copied().unwrap_or_default().death_policy;

        cancel_scoped_tasks(mitigation, impact, area);

        let Ok(mut entity_commands) = commands.get_entity(event.entity) else {
            continue;
        };

        match policy {
            DeathPolicy::Despawn { delay } if delay <= 0.0 => {
                entity_commands.despawn();
                log(&format!("⚰️ Despawning dead entity {:?}", event.entity));
            }
            DeathPolicy::Despawn { delay } => {
                entity_commands.insert((
                    Dead,
                    DespawnAfter {
                        despawn_time: now + delay,
                    },
                ));
            }
            DeathPolicy::Disable => {
                entity_commands.insert((Dead, Disabled));
                log(&format!("Disabled dead entity {:?}", event.entity));
            }
        }
    }
}

/// Система: деспавн entities с истёкшим DespawnAfter timeout
pub fn despawn_after_timeout(mut commands: Commands, query: Query<(Entity, &DespawnAfter)>, time: Res<Time>) {
    let current_time = time.elapsed_secs();

    for (entity, despawn_after) in query.iter() {
        if current_time >= despawn_after.despawn_time {
            log(&format!("⚰️ Despawning entity {:?} (timeout)", entity));
            commands.entity(entity).despawn();
        }
    }
}
