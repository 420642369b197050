//! ECS Components для боевых entity
//!
//! - actor: Actor, HealthPool, HealthProfile, CombatLayers, HurtboxOf
//!
//! Боевое состояние (Mitigation, ImpactWindow, AreaEffect, HitSource) — в `combat::components`.

pub mod actor;

// Re-exports для удобного импорта
pub use actor::*;
