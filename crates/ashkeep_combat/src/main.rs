//! Headless skirmish Ashkeep Combat
//!
//! Bulwark (аура при 50% HP) + skirmisher против двух grunt'ов.
//! Каждый `app.update()` = ровно один fixed tick, события печатаются в лог.

use std::time::Duration;

use ashkeep_combat::combat::{
    AreaPhaseChanged, DamageDealt, MitigationApplied, Overwhelmed, Recovered,
};
use ashkeep_combat::logger::{log_error, log_info, set_log_level, LogLevel};
use ashkeep_combat::{
    create_headless_app, Actor, CombatSystems, CombatTuning, ConfigError, Dead, EntityDied, HitSource,
    SimulationPlugin,
};
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;

const TICK_HZ: f64 = 60.0;
const TICKS: u32 = 900;

fn main() -> Result<(), ConfigError> {
    let seed = 42;
    let config_path = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/config/combat.ron");

    let mut app = create_headless_app(seed);
    set_log_level(LogLevel::Info);

    let tuning = CombatTuning::load(config_path).inspect_err(|err| log_error(&format!("{}", err)))?;

    app.insert_resource(tuning)
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(1.0 / TICK_HZ)))
        .add_plugins(SimulationPlugin)
        .add_systems(Startup, spawn_skirmish)
        .add_systems(FixedUpdate, scripted_attacks.before(CombatSystems))
        .add_systems(FixedUpdate, report_events.after(CombatSystems));

    log_info(&format!("Starting Ashkeep headless skirmish (seed: {})", seed));

    for tick in 0..TICKS {
        app.update();

        if tick % 120 == 0 {
            let alive = app
                .world_mut()
                .query_filtered::<&Actor, Without<Dead>>()
                .iter(app.world())
                .count();
            log_info(&format!("Tick {}: {} combatants standing", tick, alive));
        }
    }

    log_info("Skirmish complete!");
    Ok(())
}

fn spawn_skirmish(mut commands: Commands, tuning: Res<CombatTuning>) {
    let roster = [
        ("bulwark", Vec3::ZERO, 1),
        ("skirmisher", Vec3::new(3.0, 0.0, 0.0), 1),
        ("grunt", Vec3::new(1.5, 0.0, 1.0), 2),
        ("grunt", Vec3::new(-1.0, 0.0, 1.2), 2),
    ];

    for (name, position, faction) in roster {
        match tuning.spawn_named(&mut commands, name, Transform::from_translation(position), faction) {
            Ok(entity) => log_info(&format!("Spawned {} {:?} (faction {})", name, entity, faction)),
            Err(err) => log_error(&format!("Cannot spawn {}: {}", name, err)),
        }
    }
}

/// Grunt'ы бьют ближайшего врага, skirmisher стреляет
fn scripted_attacks(
    mut commands: Commands,
    mut tick: Local<u32>,
    actors: Query<(Entity, &Actor, &Transform), Without<Dead>>,
) {
    *tick += 1;

    for (attacker, actor, transform) in actors.iter() {
        let nearest_enemy = actors
            .iter()
            .filter(|(_, other, _)| !actor.is_allied_with(other))
            .min_by(|(_, _, a), (_, _, b)| {
                let da = a.translation.distance_squared(transform.translation);
                let db = b.translation.distance_squared(transform.translation);
                da.total_cmp(&db)
            });
        let Some((_, _, target)) = nearest_enemy else {
            continue;
        };

        let hitbox = match actor.faction_id {
            2 if *tick % 40 == 0 => HitSource::melee(attacker, 18.0).with_crit(0.2, 2.0),
            1 if *tick % 25 == 0 => HitSource::projectile(attacker, 9.0),
            _ => continue,
        };
        commands.spawn((hitbox, Transform::from_translation(target.translation)));
    }
}

fn report_events(
    mut damage: EventReader<DamageDealt>,
    mut deaths: EventReader<EntityDied>,
    mut overwhelmed: EventReader<Overwhelmed>,
    mut recovered: EventReader<Recovered>,
    mut phases: EventReader<AreaPhaseChanged>,
    mut mitigation: EventReader<MitigationApplied>,
) {
    for event in damage.read() {
        log_info(&format!(
            "  {:?} → {:?}: {} dmg ({} mitigated, {:?}), pool {} → {}",
            event.attacker,
            event.target,
            event.applied.dealt,
            event.applied.mitigated,
            event.kind,
            event.applied.pool_before,
            event.applied.pool_after
        ));
    }
    for event in deaths.read() {
        log_info(&format!("  ☠️ {:?} died (killer {:?})", event.entity, event.killer));
    }
    for event in overwhelmed.read() {
        log_info(&format!("  {:?} overwhelmed", event.entity));
    }
    for event in recovered.read() {
        log_info(&format!("  {:?} recovered", event.entity));
    }
    for event in phases.read() {
        log_info(&format!("  aura {:?} → {:?}", event.entity, event.phase));
    }
    for event in mitigation.read() {
        log_info(&format!(
            "  mitigation {:.0}% on {:?} (applied: {})",
            event.percent * 100.0,
            event.target,
            event.applied
        ));
    }
}
