//! Hit source integration tests: hitbox → capability discovery → resolver

mod common;

use ashkeep_combat::combat::*;
use ashkeep_combat::*;
use bevy::prelude::*;
use common::*;

fn spawn_hitbox(app: &mut App, hit: HitSource, position: Vec3) -> Entity {
    app.world_mut()
        .spawn((hit, Transform::from_translation(position)))
        .id()
}

#[test]
fn test_melee_hits_each_target_once() {
    let mut app = create_test_app();
    let attacker = spawn_actor(&mut app, 1, HealthPool::default(), Vec3::new(-2.0, 0.0, 0.0));
    let a = spawn_actor(&mut app, 2, HealthPool::new(0, 100), Vec3::new(0.3, 0.0, 0.0));
    let b = spawn_actor(&mut app, 2, HealthPool::new(0, 100), Vec3::new(-0.3, 0.0, 0.0));

    let hitbox = spawn_hitbox(&mut app, HitSource::melee(attacker, 10.0).with_lifetime(0.5), Vec3::ZERO);
    tick(&mut app, 8);

    // Цели стояли в hitbox всё время жизни, но урон по разу
    assert_eq!(journal(&app).dealt_to(a), vec![10]);
    assert_eq!(journal(&app).dealt_to(b), vec![10]);
    assert!(app.world().get_entity(hitbox).is_err(), "expired hitbox must be despawned");
}

#[test]
fn test_hitbox_skips_owner_and_allies() {
    let mut app = create_test_app();
    let attacker = spawn_actor(&mut app, 1, HealthPool::new(0, 100), Vec3::ZERO);
    let ally = spawn_actor(&mut app, 1, HealthPool::new(0, 100), Vec3::new(0.5, 0.0, 0.0));
    let enemy = spawn_actor(&mut app, 2, HealthPool::new(0, 100), Vec3::new(-0.5, 0.0, 0.0));

    spawn_hitbox(&mut app, HitSource::melee(attacker, 10.0), Vec3::ZERO);
    tick(&mut app, 3);

    assert!(journal(&app).dealt_to(attacker).is_empty());
    assert!(journal(&app).dealt_to(ally).is_empty());
    assert_eq!(journal(&app).dealt_to(enemy), vec![10]);
}

#[test]
fn test_projectile_consumed_on_first_hit() {
    let mut app = create_test_app();
    let shooter = spawn_actor(&mut app, 1, HealthPool::default(), Vec3::new(-10.0, 0.0, 0.0));
    let first = spawn_actor(&mut app, 2, HealthPool::new(0, 100), Vec3::new(0.05, 0.0, 0.0));
    let second = spawn_actor(&mut app, 2, HealthPool::new(0, 100), Vec3::new(0.1, 0.0, 0.0));

    let projectile = spawn_hitbox(&mut app, HitSource::projectile(shooter, 9.0), Vec3::ZERO);
    tick(&mut app, 3);

    // Ближайшая цель получила урон, projectile поглощён
    assert_eq!(journal(&app).dealt_to(first), vec![9]);
    assert!(journal(&app).dealt_to(second).is_empty());
    assert!(app.world().get_entity(projectile).is_err());
}

#[test]
fn test_projectile_expires_without_target() {
    let mut app = create_test_app();
    let shooter = spawn_actor(&mut app, 1, HealthPool::default(), Vec3::ZERO);

    let projectile = spawn_hitbox(
        &mut app,
        HitSource::projectile(shooter, 9.0).with_lifetime(0.35),
        Vec3::new(50.0, 0.0, 0.0),
    );
    tick(&mut app, 2);
    assert!(app.world().get_entity(projectile).is_ok());

    tick(&mut app, 3);
    assert!(app.world().get_entity(projectile).is_err());
}

#[test]
fn test_nan_lifetime_hitbox_is_despawned() {
    let mut app = create_test_app();
    let shooter = spawn_actor(&mut app, 1, HealthPool::default(), Vec3::ZERO);

    let hitbox = spawn_hitbox(
        &mut app,
        HitSource::projectile(shooter, 9.0).with_lifetime(f32::NAN),
        Vec3::new(50.0, 0.0, 0.0),
    );

    tick(&mut app, 2);
    assert!(app.world().get_entity(hitbox).is_err());
}

#[test]
fn test_hurtboxes_resolve_to_root_once() {
    let mut app = create_test_app();
    let attacker = spawn_actor(&mut app, 1, HealthPool::default(), Vec3::new(-5.0, 0.0, 0.0));
    let giant = spawn_actor(&mut app, 2, HealthPool::new(0, 200), Vec3::new(20.0, 0.0, 0.0));

    // Две части тела рядом с hitbox, сам root далеко
    for offset in [0.2, -0.2] {
        app.world_mut().spawn((
            HurtboxOf(giant),
            CombatLayers::ACTORS,
            Transform::from_xyz(offset, 0.0, 0.0),
        ));
    }

    spawn_hitbox(&mut app, HitSource::melee(attacker, 15.0), Vec3::ZERO);
    tick(&mut app, 3);

    assert_eq!(journal(&app).dealt_to(giant), vec![15]);
    assert_eq!(pool_of(&app, giant).total_current(), 185);
}

#[test]
fn test_hit_on_entity_without_pool_falls_back_to_inbox() {
    let mut app = create_test_app();
    let attacker = spawn_actor(&mut app, 1, HealthPool::default(), Vec3::new(-5.0, 0.0, 0.0));
    let dummy = app
        .world_mut()
        .spawn((CombatInbox::default(), CombatLayers::ACTORS, Transform::from_xyz(0.2, 0.0, 0.0)))
        .id();

    spawn_hitbox(&mut app, HitSource::melee(attacker, 7.0), Vec3::ZERO);
    tick(&mut app, 2);

    assert!(journal(&app).dealt_to(dummy).is_empty());
    let inbox = app.world().get::<CombatInbox>(dummy).unwrap();
    assert_eq!(inbox.messages.len(), 1);
    assert!(matches!(
        inbox.messages[0],
        CapabilityMessage::TakeDamage { amount, .. } if amount == 7.0
    ));
}

#[test]
fn test_guaranteed_crit_is_flagged() {
    let mut app = create_test_app();
    let attacker = spawn_actor(&mut app, 1, HealthPool::default(), Vec3::new(-5.0, 0.0, 0.0));
    let target = spawn_actor(&mut app, 2, HealthPool::new(0, 100), Vec3::new(0.2, 0.0, 0.0));

    spawn_hitbox(&mut app, HitSource::melee(attacker, 10.0).with_crit(1.0, 2.0), Vec3::ZERO);
    tick(&mut app, 2);

    assert!(journal(&app).has(&Entry::Dealt {
        target,
        dealt: 20,
        critical: true
    }));
}
