//! Area effect systems: триггеры, health-gated монитор, цикл фаз, sweep по радиусу.

use bevy::prelude::*;

use crate::combat::capability::{deliver_damage, queue_mitigation};
use crate::combat::spatial::{Occupant, SpatialIndex, SpatialQuery};
use crate::combat::{
    AreaEffect, AreaEffectConfig, AreaEffectTrigger, AreaPhase, AreaPhaseChanged, AreaTriggerRejected, DamageKind,
    DamageRequest, Dead, FactionFilter,
};
use crate::components::{Actor, HealthPool};
use crate::logger::{log, log_info, log_warning};

/// Подходит ли occupant под ауру: не владелец, нужный слой, тот же "этаж", фильтр фракции
pub fn qualifies(
    config: &AreaEffectConfig,
    owner: Entity,
    owner_faction: Option<u64>,
    center: Vec3,
    occupant: &Occupant,
    filter: FactionFilter,
) -> bool {
    occupant.root != owner
        && occupant.layers.intersects(config.affected_layers)
        && (occupant.position.y - center.y).abs() <= config.vertical_tolerance
        && filter.accepts(owner_faction, occupant.faction)
}

/// Вход в Active: событие для volume/визуала + mitigation на себя
fn enter_active(
    commands: &mut Commands,
    entity: Entity,
    area: &mut AreaEffect,
    now: f32,
    phase_events: &mut EventWriter<AreaPhaseChanged>,
) {
    phase_events.write(AreaPhaseChanged {
        entity,
        phase: AreaPhase::Active,
    });
    log_info(&format!("✨ Area effect {:?} activated (#{})", entity, area.activations()));

    if area.config.include_self && area.mark_affected(entity) {
        queue_mitigation(
            commands,
            entity,
            entity,
            area.config.mitigation_percent,
            area.config.mitigation_duration,
            now,
        );
    }
}

/// Sweep по радиусу: mitigation новым подходящим occupants, contact damage враждебным.
///
/// Каждый root получает эффект максимум один раз за активацию.
fn sweep_occupants(
    commands: &mut Commands,
    spatial: &impl SpatialQuery,
    owner: Entity,
    owner_faction: Option<u64>,
    center: Vec3,
    area: &mut AreaEffect,
    now: f32,
) {
    let config = area.config.clone();

    for occupant in spatial.overlap_sphere(center, config.activation_radius) {
        if qualifies(&config, owner, owner_faction, center, &occupant, config.mitigation_targets)
            && area.mark_affected(occupant.root)
        {
            queue_mitigation(
                commands,
                owner,
                occupant.root,
                config.mitigation_percent,
                config.mitigation_duration,
                now,
            );
        }

        let Some(amount) = config.contact_damage else {
            continue;
        };
        if qualifies(&config, owner, owner_faction, center, &occupant, FactionFilter::Hostiles)
            && area.mark_damaged(occupant.root)
        {
            let request = DamageRequest::new(occupant.root, amount, DamageKind::Area)
                .from_source(owner)
                .at(occupant.position);
            commands.queue(move |world: &mut World| {
                deliver_damage(world, request);
            });
        }
    }
}

/// Система: area effect state machine
///
/// 1. Таймеры фаз (Active → Cooldown → Idle)
/// 2. Внешние AreaEffectTrigger (во время Active/Cooldown — отказ, если не force)
/// 3. Health-gated монитор (пул пропал → монитор останавливается, без паники)
/// 4. Sweep по радиусу для всех Active
#[allow(clippy::too_many_arguments)]
pub fn update_area_effects(
    mut commands: Commands,
    time: Res<Time>,
    spatial: Res<SpatialIndex>,
    mut triggers: EventReader<AreaEffectTrigger>,
    mut areas: Query<(Entity, &mut AreaEffect, &Transform, Option<&HealthPool>, Option<&Actor>), Without<Dead>>,
    mut phase_events: EventWriter<AreaPhaseChanged>,
    mut rejected_events: EventWriter<AreaTriggerRejected>,
) {
    let now = time.elapsed_secs();

    // Фаза 1: таймеры
    for (entity, mut area, ..) in areas.iter_mut() {
        if let Some(phase) = area.tick(now) {
            phase_events.write(AreaPhaseChanged { entity, phase });
            log(&format!("Area effect {:?} → {:?}", entity, phase));
        }
    }

    // Фаза 2: внешние триггеры
    for trigger in triggers.read() {
        let Ok((entity, mut area, ..)) = areas.get_mut(trigger.entity) else {
            log(&format!("AreaEffectTrigger: {:?} has no AreaEffect", trigger.entity));
            continue;
        };

        match area.try_activate(now, trigger.force) {
            Ok(()) => enter_active(&mut commands, entity, &mut area, now, &mut phase_events),
            Err(err) => {
                rejected_events.write(AreaTriggerRejected {
                    entity,
                    phase: err.phase,
                });
                log(&format!("Area effect {:?}: {}", entity, err));
            }
        }
    }

    // Фаза 3: health-gated монитор
    for (entity, mut area, _, pool, _) in areas.iter_mut() {
        if !area.wants_health_monitor() {
            continue;
        }

        let Some(pool) = pool else {
            area.stop_monitor();
            log_warning(&format!(
                "Area effect {:?}: owner has no HealthPool — health monitor stopped",
                entity
            ));
            continue;
        };

        if pool.is_alive() && area.health_gate_open(pool.ratio()) && area.try_activate(now, false).is_ok() {
            enter_active(&mut commands, entity, &mut area, now, &mut phase_events);
        }
    }

    // Фаза 4: sweep (немедленный query при входе + новые вошедшие)
    for (entity, mut area, transform, _, actor) in areas.iter_mut() {
        if !area.is_active() {
            continue;
        }

        let owner_faction = actor.map(|a| a.faction_id);
        sweep_occupants(
            &mut commands,
            &*spatial,
            entity,
            owner_faction,
            transform.translation,
            &mut area,
            now,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::CombatLayers;

    fn occupant(index: u32, position: Vec3, faction: Option<u64>) -> Occupant {
        let entity = Entity::from_raw(index);
        Occupant {
            entity,
            root: entity,
            position,
            layers: CombatLayers::ACTORS,
            faction,
        }
    }

    #[test]
    fn test_qualifies_excludes_owner() {
        let config = AreaEffectConfig::default();
        let owner = Entity::from_raw(1);
        let me = occupant(1, Vec3::ZERO, Some(1));

        assert!(!qualifies(&config, owner, Some(1), Vec3::ZERO, &me, FactionFilter::Everyone));
    }

    #[test]
    fn test_qualifies_vertical_band() {
        let config = AreaEffectConfig {
            vertical_tolerance: 2.0,
            ..default()
        };
        let owner = Entity::from_raw(1);
        let same_floor = occupant(2, Vec3::new(3.0, 1.5, 0.0), Some(1));
        let upstairs = occupant(3, Vec3::new(3.0, 4.0, 0.0), Some(1));

        assert!(qualifies(&config, owner, Some(1), Vec3::ZERO, &same_floor, FactionFilter::Allies));
        assert!(!qualifies(&config, owner, Some(1), Vec3::ZERO, &upstairs, FactionFilter::Allies));
    }

    #[test]
    fn test_qualifies_layers_and_faction() {
        let config = AreaEffectConfig {
            affected_layers: CombatLayers::PLAYER,
            ..default()
        };
        let owner = Entity::from_raw(1);
        let mut ally = occupant(2, Vec3::X, Some(1));

        // Слой ACTORS не входит в PLAYER
        assert!(!qualifies(&config, owner, Some(1), Vec3::ZERO, &ally, FactionFilter::Allies));

        ally.layers = CombatLayers::ACTORS.with(CombatLayers::PLAYER);
        assert!(qualifies(&config, owner, Some(1), Vec3::ZERO, &ally, FactionFilter::Allies));
        assert!(!qualifies(&config, owner, Some(1), Vec3::ZERO, &ally, FactionFilter::Hostiles));
    }
}
