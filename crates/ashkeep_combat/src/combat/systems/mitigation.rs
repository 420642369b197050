//! Mitigation systems: входящие MitigationRequest и истечение модификаторов.

use bevy::prelude::*;

use crate::combat::capability::queue_mitigation;
use crate::combat::{Mitigation, MitigationExpired, MitigationRequest};

/// Система: MitigationRequest → CapabilityBroadcaster (через Commands, нужен &mut World)
pub fn process_mitigation_requests(
    mut commands: Commands,
    mut requests: EventReader<MitigationRequest>,
    time: Res<Time>,
) {
    let now = time.elapsed_secs();

    for request in requests.read() {
        queue_mitigation(
            &mut commands,
            request.source,
            request.target,
            request.percent,
            request.duration,
            now,
        );
    }
}

/// Система: снять истёкшие модификаторы (effective percent уже 0, тут только cleanup + событие)
pub fn expire_mitigations(
    mut query: Query<(Entity, &mut Mitigation)>,
    mut expired: EventWriter<MitigationExpired>,
    time: Res<Time>,
) {
    let now = time.elapsed_secs();

    for (entity, mut mitigation) in query.iter_mut() {
        // Не трогаем Mut без нужды (change detection)
        if !mitigation.expires_at().is_some_and(|deadline| now >= deadline) {
            continue;
        }

        if mitigation.tick(now) {
            expired.write(MitigationExpired { entity });
        }
    }
}
