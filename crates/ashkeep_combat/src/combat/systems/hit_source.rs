//! Hit source systems: overlap detection + lifetime.
//!
//! Hitbox бьёт каждую корневую цель один раз. Доставка идёт через
//! capability discovery (`deliver_damage`) в очереди команд, поэтому
//! поглощение `destroy_on_hit` видят все следующие доставки этого тика.

use bevy::prelude::*;

use crate::combat::capability::{deliver_damage, Delivery};
use crate::combat::spatial::{Occupant, SpatialIndex, SpatialQuery};
use crate::combat::{DamageRequest, HitSource};
use crate::components::Actor;
use crate::logger::log;
use crate::DeterministicRng;

/// Может ли hitbox задеть occupant (без учёта уже задетых)
pub fn can_hit(hit: &HitSource, owner_faction: Option<u64>, occupant: &Occupant) -> bool {
    if occupant.root == hit.owner || !occupant.layers.intersects(hit.hit_layers) {
        return false;
    }

    // Friendly fire выключен: своих не бьём
    !matches!((owner_faction, occupant.faction), (Some(a), Some(b)) if a == b)
}

fn queue_hit_delivery(commands: &mut Commands, hitbox: Entity, request: DamageRequest) {
    commands.queue(move |world: &mut World| {
        let Some(hit) = world.get::<HitSource>(hitbox) else {
            return; // Поглощён раньше в этом тике
        };
        if hit.is_spent() {
            return;
        }
        let destroy = hit.destroy_on_hit;

        let target = request.target;
        let delivery = deliver_damage(world, request);
        if delivery == Delivery::Delivered && destroy {
            if let Some(mut hit) = world.get_mut::<HitSource>(hitbox) {
                hit.mark_spent();
            }
            world.despawn(hitbox);
            log(&format!("💥 Hitbox {:?} consumed on {:?}", hitbox, target));
        }
    });
}

/// Система: пересечения hitbox'ов с occupants
///
/// Порядок целей детерминирован (ближайшие первыми), crit через DeterministicRng.
pub fn detect_hit_source_overlaps(
    mut commands: Commands,
    spatial: Res<SpatialIndex>,
    mut rng: ResMut<DeterministicRng>,
    mut hit_sources: Query<(Entity, &mut HitSource, &Transform)>,
    actors: Query<&Actor>,
) {
    for (hitbox, mut hit, transform) in hit_sources.iter_mut() {
        if hit.is_spent() {
            continue;
        }

        let center = transform.translation;
        let owner_faction = actors.get(hit.owner).ok().map(|actor| actor.faction_id);

        for occupant in spatial.overlap_sphere(center, hit.radius) {
            if !can_hit(&hit, owner_faction, &occupant) || !hit.try_claim(occupant.root) {
                continue;
            }

            let (amount, is_critical) = hit.roll_damage(&mut rng.rng);
            let request = DamageRequest::new(occupant.root, amount, hit.kind)
                .from_source(hit.owner)
                .critical(is_critical)
                .at(occupant.position);

            log(&format!(
                "⚔️ Hitbox {:?} overlaps {:?} ({:.1} dmg{})",
                hitbox,
                occupant.root,
                amount,
                if is_critical { ", CRIT" } else { "" }
            ));
            queue_hit_delivery(&mut commands, hitbox, request);

            // Projectile: одна цель за тик, дальше решает доставка
            if hit.destroy_on_hit {
                break;
            }
        }
    }
}

/// Система: уменьшает lifetime, удаляет истёкшие hitbox'ы
pub fn tick_hit_source_lifetimes(
    mut commands: Commands,
    time: Res<Time>,
    mut hit_sources: Query<(Entity, &mut HitSource)>,
) {
    let delta = time.delta_secs();

    for (entity, mut hit) in hit_sources.iter_mut() {
        if hit.tick(delta) {
            commands.entity(entity).despawn();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::CombatLayers;

    fn occupant(index: u32, layers: CombatLayers, faction: Option<u64>) -> Occupant {
        let entity = Entity::from_raw(index);
        Occupant {
            entity,
            root: entity,
            position: Vec3::ZERO,
            layers,
            faction,
        }
    }

    #[test]
    fn test_can_hit_skips_owner_and_allies() {
        let owner = Entity::from_raw(1);
        let hit = HitSource::melee(owner, 10.0);

        assert!(!can_hit(&hit, Some(1), &occupant(1, CombatLayers::ACTORS, Some(1))));
        assert!(!can_hit(&hit, Some(1), &occupant(2, CombatLayers::ACTORS, Some(1))));
        assert!(can_hit(&hit, Some(1), &occupant(3, CombatLayers::ACTORS, Some(2))));
        assert!(can_hit(&hit, Some(1), &occupant(4, CombatLayers::ACTORS, None)));
    }

    #[test]
    fn test_can_hit_respects_layers() {
        let hit = HitSource::melee(Entity::from_raw(1), 10.0).with_layers(CombatLayers::ENEMY);

        assert!(!can_hit(&hit, None, &occupant(2, CombatLayers::ACTORS, None)));
        assert!(can_hit(
            &hit,
            None,
            &occupant(3, CombatLayers::ACTORS.with(CombatLayers::ENEMY), None)
        ));
    }
}
