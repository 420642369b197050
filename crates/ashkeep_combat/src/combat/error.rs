//! Отказы combat-операций
//!
//! Ничто здесь не фатально: системы превращают `Err` в debug-лог и идут дальше.

use bevy::prelude::*;
use thiserror::Error;

use crate::combat::AreaPhase;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DamageRejection {
    #[error("damage amount must be positive and finite, got {0}")]
    InvalidAmount(f32),
    #[error("target is already dead")]
    TargetDead,
    #[error("target {0:?} has no HealthPool")]
    MissingTarget(Entity),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MitigationRejection {
    #[error("mitigation percent must be in (0, 1), got {0}")]
    InvalidPercent(f32),
    #[error("mitigation duration must be positive and finite, got {0}")]
    InvalidDuration(f32),
    #[error("target {0:?} does not exist")]
    MissingTarget(Entity),
    #[error("target {0:?} is dead or disabled")]
    InactiveTarget(Entity),
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("area effect cannot activate while {phase:?}")]
pub struct ActivationRejected {
    pub phase: AreaPhase,
}

/// Проверка входа для mitigation (percent ∈ (0,1), duration > 0)
pub fn validate_mitigation(percent: f32, duration: f32) -> Result<(), MitigationRejection> {
    if !percent.is_finite() || percent <= 0.0 || percent >= 1.0 {
        return Err(MitigationRejection::InvalidPercent(percent));
    }
    if !duration.is_finite() || duration <= 0.0 {
        return Err(MitigationRejection::InvalidDuration(duration));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_mitigation() {
        assert!(validate_mitigation(0.25, 5.0).is_ok());
        assert_eq!(validate_mitigation(0.0, 5.0), Err(MitigationRejection::InvalidPercent(0.0)));
        assert_eq!(validate_mitigation(1.0, 5.0), Err(MitigationRejection::InvalidPercent(1.0)));
        assert_eq!(validate_mitigation(0.5, 0.0), Err(MitigationRejection::InvalidDuration(0.0)));
        assert!(validate_mitigation(f32::NAN, 1.0).is_err());
    }
}
