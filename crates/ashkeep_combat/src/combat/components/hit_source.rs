//! Hit source — короткоживущий hitbox (melee swing, projectile, trap pulse).
//!
//! Живет не дольше `lifetime`, бьёт каждую корневую цель максимум один раз.
//! `destroy_on_hit` = поглощается после первой успешной доставки урона.

use bevy::prelude::*;
use rand::Rng;

use crate::combat::DamageKind;
use crate::components::CombatLayers;

#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct HitSource {
    /// Кто атакует (себя не бьём, фракцию владельца тоже)
    pub owner: Entity,
    /// Базовый урон (до crit и mitigation)
    pub damage: f32,
    pub kind: DamageKind,
    /// Радиус сферы hitbox (метры)
    pub radius: f32,
    pub hit_layers: CombatLayers,
    pub destroy_on_hit: bool,
    pub crit_chance: f32,
    pub crit_multiplier: f32,
    /// Оставшееся время жизни (секунды)
    lifetime: f32,
    /// Корневые entity, уже задетые этим hitbox
    hit_roots: Vec<Entity>,
    spent: bool,
}

impl HitSource {
    pub fn new(owner: Entity, damage: f32, kind: DamageKind) -> Self {
        Self {
            owner,
            damage,
            kind,
            radius: 1.5,
            hit_layers: CombatLayers::ACTORS,
            destroy_on_hit: false,
            crit_chance: 0.0,
            crit_multiplier: 2.0,
            lifetime: 0.2,
            hit_roots: Vec::new(),
            spent: false,
        }
    }

    /// Melee swing: широкая дуга, multi-target, живёт ~0.2 сек
    pub fn melee(owner: Entity, damage: f32) -> Self {
        Self::new(owner, damage, DamageKind::Melee)
    }

    /// Projectile: маленькая сфера, исчезает при первом попадании
    pub fn projectile(owner: Entity, damage: f32) -> Self {
        Self {
            radius: 0.3,
            destroy_on_hit: true,
            lifetime: 3.0,
            ..Self::new(owner, damage, DamageKind::Ranged)
        }
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    /// Не конечный lifetime → 0: hitbox удаляется на ближайшем тике
    pub fn with_lifetime(mut self, lifetime: f32) -> Self {
        self.lifetime = if lifetime.is_finite() { lifetime } else { 0.0 };
        self
    }

    pub fn with_layers(mut self, layers: CombatLayers) -> Self {
        self.hit_layers = layers;
        self
    }

    pub fn with_crit(mut self, chance: f32, multiplier: f32) -> Self {
        self.crit_chance = chance.clamp(0.0, 1.0);
        self.crit_multiplier = multiplier.max(1.0);
        self
    }

    pub fn destroy_on_hit(mut self, destroy: bool) -> Self {
        self.destroy_on_hit = destroy;
        self
    }

    pub fn remaining_lifetime(&self) -> f32 {
        self.lifetime
    }

    /// Уменьшает lifetime. Returns true когда hitbox пора удалить.
    pub fn tick(&mut self, delta: f32) -> bool {
        self.lifetime -= delta;
        !(self.lifetime > 0.0)
    }

    pub fn is_spent(&self) -> bool {
        self.spent
    }

    pub fn mark_spent(&mut self) {
        self.spent = true;
    }

    pub fn has_hit(&self, root: Entity) -> bool {
        self.hit_roots.contains(&root)
    }

    /// Резервирует цель. false если уже били или hitbox поглощён.
    pub fn try_claim(&mut self, root: Entity) -> bool {
        if self.spent || self.has_hit(root) {
            return false;
        }
        self.hit_roots.push(root);
        true
    }

    /// Бросок crit: (урон, is_critical)
    pub fn roll_damage(&self, rng: &mut impl Rng) -> (f32, bool) {
        if self.crit_chance > 0.0 && rng.gen::<f32>() < self.crit_chance {
            (self.damage * self.crit_multiplier, true)
        } else {
            (self.damage, false)
        }
    }
}
