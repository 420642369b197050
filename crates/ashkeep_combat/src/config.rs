//! Data-driven combat tuning (RON)
//!
//! Архетипы бойцов (пулы, death policy, impact window, опциональная аура)
//! описываются в `assets/config/combat.ron`, баланс правится без перекомпиляции.
//!
//! ```ignore
//! let tuning = CombatTuning::load("assets/config/combat.ron")?;
//! let entity = tuning.spawn_named(&mut commands, "sentinel", Transform::default(), 1)?;
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::combat::{AreaEffect, AreaEffectConfig, ImpactConfig, ImpactWindow};
use crate::components::{Actor, CombatLayers, HealthPool, HealthProfile};
use crate::logger::log_info;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("archetype '{archetype}': {reason}")]
    Invalid { archetype: String, reason: String },
    #[error("unknown archetype '{0}'")]
    UnknownArchetype(String),
}

/// Один архетип бойца
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchetypeConfig {
    /// Внешний ярус (щит/броня)
    pub primary: u32,
    /// Внутренний ярус (жизнь)
    pub secondary: u32,
    pub profile: HealthProfile,
    pub impact: ImpactConfig,
    pub layers: CombatLayers,
    /// Аура (например "Bulwark": mitigation союзникам в радиусе)
    pub area: Option<AreaEffectConfig>,
}

impl Default for ArchetypeConfig {
    fn default() -> Self {
        Self {
            primary: 0,
            secondary: 100,
            profile: HealthProfile::default(),
            impact: ImpactConfig::default(),
            layers: CombatLayers::ACTORS,
            area: None,
        }
    }
}

/// Конечное и > 0 (NaN не проходит)
fn positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

impl ArchetypeConfig {
    fn validate(&self) -> Result<(), String> {
        if self.primary == 0 && self.secondary == 0 {
            return Err("pools are empty (primary + secondary == 0)".into());
        }

        let impact = &self.impact;
        if impact.hit_threshold == 0 {
            return Err("impact.hit_threshold must be >= 1".into());
        }
        if !positive(impact.hit_count_window) || !positive(impact.recovery_no_hit_time) {
            return Err("impact windows must be positive".into());
        }

        let Some(area) = &self.area else {
            return Ok(());
        };
        if !positive(area.activation_radius) {
            return Err(format!("area.activation_radius must be positive, got {}", area.activation_radius));
        }
        if !positive(area.mitigation_percent) || area.mitigation_percent >= 1.0 {
            return Err(format!("area.mitigation_percent must be in (0, 1), got {}", area.mitigation_percent));
        }
        if !positive(area.mitigation_duration) || !(area.cooldown_duration.is_finite() && area.cooldown_duration >= 0.0) {
            return Err("area durations must be positive".into());
        }
        if !(area.vertical_tolerance.is_finite() && area.vertical_tolerance >= 0.0) {
            return Err("area.vertical_tolerance must be finite and >= 0".into());
        }
        if area.health_trigger.is_some_and(|t| !positive(t) || t > 1.0) {
            return Err("area.health_trigger must be in (0, 1]".into());
        }
        if area.contact_damage.is_some_and(|d| !positive(d)) {
            return Err("area.contact_damage must be positive".into());
        }

        Ok(())
    }
}

/// Resource: все архетипы по имени (BTreeMap — стабильный порядок обхода)
#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombatTuning {
    pub archetypes: BTreeMap<String, ArchetypeConfig>,
}

impl CombatTuning {
    pub fn from_ron_str(contents: &str) -> Result<Self, ConfigError> {
        let tuning: CombatTuning = ron::from_str(contents)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let tuning = Self::from_ron_str(&contents)?;

        log_info(&format!(
            "Loaded {} combat archetypes from {}",
            tuning.archetypes.len(),
            path.display()
        ));
        Ok(tuning)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, archetype) in &self.archetypes {
            archetype.validate().map_err(|reason| ConfigError::Invalid {
                archetype: name.clone(),
                reason,
            })?;
        }
        Ok(())
    }

    pub fn archetype(&self, name: &str) -> Option<&ArchetypeConfig> {
        self.archetypes.get(name)
    }

    /// Спавн архетипа по имени
    pub fn spawn_named(
        &self,
        commands: &mut Commands,
        name: &str,
        transform: Transform,
        faction_id: u64,
    ) -> Result<Entity, ConfigError> {
        let archetype = self
            .archetype(name)
            .ok_or_else(|| ConfigError::UnknownArchetype(name.to_string()))?;
        Ok(spawn_archetype(commands, archetype, transform, faction_id))
    }
}

/// Спавнит бойца из архетипа (Actor + пулы + профиль + опциональная аура)
pub fn spawn_archetype(
    commands: &mut Commands,
    archetype: &ArchetypeConfig,
    transform: Transform,
    faction_id: u64,
) -> Entity {
    let mut entity = commands.spawn((
        Actor { faction_id },
        HealthPool::new(archetype.primary, archetype.secondary),
        archetype.profile,
        ImpactWindow::new(archetype.impact),
        archetype.layers,
        transform,
    ));

    if let Some(area) = &archetype.area {
        entity.insert(AreaEffect::new(area.clone()));
    }

    entity.id()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::FactionFilter;
    use crate::components::DeathPolicy;

    const SAMPLE: &str = r#"
(
    archetypes: {
        "grunt": (
            secondary: 40,
        ),
        "sentinel": (
            primary: 30,
            secondary: 60,
            profile: (
                death_policy: Despawn(delay: 1.5),
                feedback: CriticalOnly,
            ),
            area: Some((
                activation_radius: 6.0,
                mitigation_percent: 0.3,
                mitigation_targets: Everyone,
            )),
        ),
    },
)
"#;

    #[test]
    fn test_parse_sample() {
        let tuning = CombatTuning::from_ron_str(SAMPLE).unwrap();
        assert_eq!(tuning.archetypes.len(), 2);

        let grunt = tuning.archetype("grunt").unwrap();
        assert_eq!((grunt.primary, grunt.secondary), (0, 40));
        assert_eq!(grunt.impact, ImpactConfig::default());
        assert!(grunt.area.is_none());

        let sentinel = tuning.archetype("sentinel").unwrap();
        assert_eq!(sentinel.profile.death_policy, DeathPolicy::Despawn { delay: 1.5 });
        let area = sentinel.area.as_ref().unwrap();
        assert_eq!(area.activation_radius, 6.0);
        assert_eq!(area.mitigation_targets, FactionFilter::Everyone);
        // Не указано → default
        assert_eq!(area.cooldown_duration, 4.5);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad = r#"(archetypes: { "ghost": (primary: 0, secondary: 0) })"#;
        assert!(matches!(
            CombatTuning::from_ron_str(bad),
            Err(ConfigError::Invalid { archetype, .. }) if archetype == "ghost"
        ));

        let bad_area = r#"(archetypes: { "x": (area: Some((mitigation_percent: 1.5))) })"#;
        assert!(matches!(CombatTuning::from_ron_str(bad_area), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_validate_rejects_non_finite_values() {
        let with_area = |area: AreaEffectConfig| ArchetypeConfig {
            area: Some(area),
            ..default()
        };

        let broken = [
            with_area(AreaEffectConfig {
                activation_radius: f32::NAN,
                ..default()
            }),
            with_area(AreaEffectConfig {
                mitigation_percent: f32::NAN,
                ..default()
            }),
            with_area(AreaEffectConfig {
                cooldown_duration: f32::NAN,
                ..default()
            }),
            with_area(AreaEffectConfig {
                mitigation_duration: f32::INFINITY,
                ..default()
            }),
            with_area(AreaEffectConfig {
                contact_damage: Some(f32::NAN),
                ..default()
            }),
            ArchetypeConfig {
                impact: ImpactConfig {
                    hit_count_window: f32::NAN,
                    ..default()
                },
                ..default()
            },
        ];

        for archetype in broken {
            assert!(archetype.validate().is_err(), "{:?}", archetype);
        }
        assert!(with_area(AreaEffectConfig::default()).validate().is_ok());
    }

    #[test]
    fn test_huge_pools_validate() {
        let archetype = ArchetypeConfig {
            primary: u32::MAX,
            secondary: u32::MAX,
            ..default()
        };
        assert!(archetype.validate().is_ok());
    }

    #[test]
    fn test_parse_error_is_reported() {
        assert!(matches!(
            CombatTuning::from_ron_str("(archetypes: {"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_spawn_named_unknown() {
        let tuning = CombatTuning::default();
        let mut world = World::new();
        let mut commands = world.commands();

        assert!(matches!(
            tuning.spawn_named(&mut commands, "nobody", Transform::default(), 1),
            Err(ConfigError::UnknownArchetype(_))
        ));
    }

    #[test]
    fn test_spawn_archetype_components() {
        let tuning = CombatTuning::from_ron_str(SAMPLE).unwrap();
        let mut world = World::new();

        let entity = {
            let mut commands = world.commands();
            tuning
                .spawn_named(&mut commands, "sentinel", Transform::from_xyz(1.0, 0.0, 0.0), 7)
                .unwrap()
        };
        world.flush();

        let pool = world.get::<HealthPool>(entity).unwrap();
        assert_eq!(pool.total_current(), 90);
        assert_eq!(world.get::<Actor>(entity).unwrap().faction_id, 7);
        assert!(world.get::<AreaEffect>(entity).is_some());
        assert_eq!(world.get::<Transform>(entity).unwrap().translation.x, 1.0);
    }

    #[test]
    fn test_bundled_config_is_valid() {
        let contents = include_str!("../assets/config/combat.ron");
        let tuning = CombatTuning::from_ron_str(contents).unwrap();
        assert!(tuning.archetype("bulwark").is_some());
    }
}
