//! Impact window systems (recovery таймер).
//!
//! Попадания регистрирует `apply_damage_requests`, здесь только тишина → Recovered.

use bevy::prelude::*;

use crate::combat::{ImpactTransition, ImpactWindow, Recovered};
use crate::logger::log_info;

/// Система: Overwhelmed → Normal после `recovery_no_hit_time` без попаданий
pub fn tick_impact_windows(
    mut windows: Query<(Entity, &mut ImpactWindow)>,
    mut recovered: EventWriter<Recovered>,
    time: Res<Time>,
) {
    let now = time.elapsed_secs();

    for (entity, mut window) in windows.iter_mut() {
        if !window.has_pending_recovery() {
            continue;
        }

        if window.tick(now) == Some(ImpactTransition::Recovered) {
            recovered.write(Recovered { entity });
            log_info(&format!("{:?} recovered from overwhelm", entity));
        }
    }
}
