//! Spatial query service (OverlapSphere-эквивалент)
//!
//! Area effects и hit sources не ищут соседей сами: они получают `SpatialIndex`
//! (снапшот позиций на текущий тик) через trait `SpatialQuery`.
//! Позиции — world-space `Transform.translation`.

use bevy::prelude::*;

use crate::combat::Dead;
use crate::components::{Actor, CombatLayers, HurtboxOf};

/// Один кандидат в spatial query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Occupant {
    pub entity: Entity,
    /// Корневой актор (для hurtbox'ов = HurtboxOf, иначе сам entity)
    pub root: Entity,
    pub position: Vec3,
    pub layers: CombatLayers,
    pub faction: Option<u64>,
}

pub trait SpatialQuery {
    /// Все occupants внутри сферы, ближайшие первыми (детерминированный порядок)
    fn overlap_sphere(&self, center: Vec3, radius: f32) -> Vec<Occupant>;
}

/// Point-in-time снапшот, перестраивается в начале каждого combat тика
#[derive(Resource, Debug, Default)]
pub struct SpatialIndex {
    occupants: Vec<Occupant>,
}

impl SpatialIndex {
    pub fn clear(&mut self) {
        self.occupants.clear();
    }

    pub fn insert(&mut self, occupant: Occupant) {
        self.occupants.push(occupant);
    }

    pub fn len(&self) -> usize {
        self.occupants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occupants.is_empty()
    }
}

impl SpatialQuery for SpatialIndex {
    fn overlap_sphere(&self, center: Vec3, radius: f32) -> Vec<Occupant> {
        let radius_sq = radius * radius;

        let mut hits: Vec<(f32, Occupant)> = self
            .occupants
            .iter()
            .filter_map(|occupant| {
                let distance_sq = occupant.position.distance_squared(center);
                (distance_sq <= radius_sq).then_some((distance_sq, *occupant))
            })
            .collect();

        // По дистанции, при равенстве по Entity index (детерминизм)
        hits.sort_by(|(a_dist, a), (b_dist, b)| {
            a_dist
                .total_cmp(b_dist)
                .then_with(|| a.entity.index().cmp(&b.entity.index()))
        });

        hits.into_iter().map(|(_, occupant)| occupant).collect()
    }
}

/// Система: перестроить SpatialIndex из Transform + CombatLayers
///
/// Мёртвые и disabled entity в индекс не попадают.
pub fn refresh_spatial_index(
    mut index: ResMut<SpatialIndex>,
    occupants: Query<(Entity, &Transform, &CombatLayers, Option<&HurtboxOf>), Without<Dead>>,
    actors: Query<&Actor>,
) {
    index.clear();

    for (entity, transform, layers, hurtbox) in occupants.iter() {
        let root = hurtbox.map_or(entity, |h| h.0);
        let faction = actors.get(root).ok().map(|actor| actor.faction_id);

        index.insert(Occupant {
            entity,
            root,
            position: transform.translation,
            layers: *layers,
            faction,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn occupant(index: u32, position: Vec3) -> Occupant {
        let entity = Entity::from_raw(index);
        Occupant {
            entity,
            root: entity,
            position,
            layers: CombatLayers::ACTORS,
            faction: None,
        }
    }

    #[test]
    fn test_overlap_sphere_filters_by_radius() {
        let mut index = SpatialIndex::default();
        index.insert(occupant(1, Vec3::new(1.0, 0.0, 0.0)));
        index.insert(occupant(2, Vec3::new(9.0, 0.0, 0.0)));
        index.insert(occupant(3, Vec3::new(0.0, 0.0, 8.0))); // ровно на границе

        let hits = index.overlap_sphere(Vec3::ZERO, 8.0);
        let ids: Vec<u32> = hits.iter().map(|o| o.entity.index()).collect();

        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_overlap_sphere_sorted_nearest_first() {
        let mut index = SpatialIndex::default();
        index.insert(occupant(5, Vec3::new(3.0, 0.0, 0.0)));
        index.insert(occupant(4, Vec3::new(-3.0, 0.0, 0.0)));
        index.insert(occupant(6, Vec3::new(0.5, 0.0, 0.0)));

        let ids: Vec<u32> = index
            .overlap_sphere(Vec3::ZERO, 5.0)
            .iter()
            .map(|o| o.entity.index())
            .collect();

        assert_eq!(ids, vec![6, 4, 5]);
    }
}
