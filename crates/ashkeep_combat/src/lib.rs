//! Ashkeep Combat Core
//!
//! ECS-движок урона и сопротивления на Bevy 0.16 (headless, без рендера):
//! двухъярусные пулы здоровья, временное снижение урона, impact window,
//! ауры с фазами и hitbox'ы, доставляющие эффекты через capability discovery.
//!
//! Хост (игровой клиент или headless runner) добавляет `SimulationPlugin`,
//! шлёт inbound события (DamageRequest, AreaEffectTrigger, ...) и читает
//! outbound (HealthChanged, DamageFeedback, EntityDied, ...).

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod combat;
pub mod components;
pub mod config;
pub mod logger;

// Re-export базовых типов для удобства
pub use combat::{
    AreaEffect, AreaEffectConfig, AreaEffectTrigger, AreaPhase, CombatPlugin, CombatSystems, DamageKind,
    DamageRequest, Dead, EntityDied, HitSource, ImpactWindow, Mitigation,
};
pub use components::*;
pub use config::{spawn_archetype, ArchetypeConfig, CombatTuning, ConfigError};
pub use logger::init_logger;

/// Главный plugin симуляции
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app
            // Fixed timestep 60Hz для simulation tick
            .insert_resource(Time::<Fixed>::from_hz(60.0))
            // Детерминистичный RNG (seed по умолчанию, если хост не поставил свой)
            .init_resource::<DeterministicRng>()
            .add_plugins(CombatPlugin);
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

impl Default for DeterministicRng {
    fn default() -> Self {
        Self::new(42)
    }
}

/// Создаёт minimal Bevy App для headless симуляции
///
/// Combat системы не добавлены: вызывающий решает, `SimulationPlugin` или
/// только `CombatPlugin` со своим timestep.
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_hz(60.0)); // 60Hz FixedUpdate

    app
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
