//! Общие helpers для integration тестов
//!
//! 10Hz fixed step + ManualDuration(100ms): каждый `tick()` = ровно один
//! FixedUpdate, fixed clock = 0.1 × номер тика.

#![allow(dead_code)]

use std::time::Duration;

use ashkeep_combat::combat::*;
use ashkeep_combat::*;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;

/// Запись журнала (outbound события в порядке появления)
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Dealt { target: Entity, dealt: u32, critical: bool },
    Feedback { target: Entity, amount: u32 },
    Died(Entity),
    Overwhelmed(Entity),
    Recovered(Entity),
    Mitigation { target: Entity, applied: bool },
    MitigationExpired(Entity),
    Phase(Entity, AreaPhase),
    Rejected(Entity, AreaPhase),
}

#[derive(Resource, Debug, Default)]
pub struct Journal {
    pub entries: Vec<(f32, Entry)>,
}

impl Journal {
    pub fn count(&self, predicate: impl Fn(&Entry) -> bool) -> usize {
        self.entries.iter().filter(|(_, entry)| predicate(entry)).count()
    }

    pub fn has(&self, entry: &Entry) -> bool {
        self.entries.iter().any(|(_, e)| e == entry)
    }

    pub fn first_time(&self, entry: &Entry) -> Option<f32> {
        self.entries.iter().find(|(_, e)| e == entry).map(|(t, _)| *t)
    }

    pub fn dealt_to(&self, target: Entity) -> Vec<u32> {
        self.entries
            .iter()
            .filter_map(|(_, e)| match e {
                Entry::Dealt { target: t, dealt, .. } if *t == target => Some(*dealt),
                _ => None,
            })
            .collect()
    }
}

#[allow(clippy::too_many_arguments)]
fn record_journal(
    time: Res<Time>,
    mut journal: ResMut<Journal>,
    mut dealt: EventReader<DamageDealt>,
    mut feedback: EventReader<DamageFeedback>,
    mut died: EventReader<EntityDied>,
    mut overwhelmed: EventReader<Overwhelmed>,
    mut recovered: EventReader<Recovered>,
    mut mitigation: EventReader<MitigationApplied>,
    mut expired: EventReader<MitigationExpired>,
    mut phases: EventReader<AreaPhaseChanged>,
    mut rejected: EventReader<AreaTriggerRejected>,
) {
    let now = time.elapsed_secs();
    let mut push = |entry| journal.entries.push((now, entry));

    for e in dealt.read() {
        push(Entry::Dealt {
            target: e.target,
            dealt: e.applied.dealt,
            critical: e.is_critical,
        });
    }
    for e in feedback.read() {
        push(Entry::Feedback {
            target: e.entity,
            amount: e.amount,
        });
    }
    for e in died.read() {
        push(Entry::Died(e.entity));
    }
    for e in overwhelmed.read() {
        push(Entry::Overwhelmed(e.entity));
    }
    for e in recovered.read() {
        push(Entry::Recovered(e.entity));
    }
    for e in mitigation.read() {
        push(Entry::Mitigation {
            target: e.target,
            applied: e.applied,
        });
    }
    for e in expired.read() {
        push(Entry::MitigationExpired(e.entity));
    }
    for e in phases.read() {
        push(Entry::Phase(e.entity, e.phase));
    }
    for e in rejected.read() {
        push(Entry::Rejected(e.entity, e.phase));
    }
}

/// Headless App с CombatPlugin, 10Hz fixed step и журналом
pub fn create_test_app() -> App {
    let mut app = create_headless_app(42);
    app.insert_resource(Time::<Fixed>::from_hz(10.0))
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(100)))
        .add_plugins(CombatPlugin)
        .init_resource::<Journal>()
        .add_systems(FixedUpdate, record_journal.after(CombatSystems));

    // Первый update: нулевая delta, fixed tick не случается
    app.update();
    app
}

pub fn tick(app: &mut App, count: u32) {
    for _ in 0..count {
        app.update();
    }
}

/// Текущее время fixed clock
pub fn now(app: &App) -> f32 {
    app.world().resource::<Time<Fixed>>().elapsed_secs()
}

pub fn journal(app: &App) -> &Journal {
    app.world().resource::<Journal>()
}

pub fn spawn_actor(app: &mut App, faction_id: u64, pool: HealthPool, position: Vec3) -> Entity {
    app.world_mut()
        .spawn((Actor { faction_id }, pool, Transform::from_translation(position)))
        .id()
}

pub fn pool_of(app: &App, entity: Entity) -> HealthPool {
    *app.world()
        .get::<HealthPool>(entity)
        .expect("entity should have a HealthPool")
}

pub fn damage(app: &mut App, target: Entity, amount: f32) {
    app.world_mut()
        .send_event(DamageRequest::new(target, amount, DamageKind::Melee));
}
