//! Capability discovery: доставка mitigation/урона без знания конкретного типа цели.
//!
//! Цель — любая entity. Источник (аура, hitbox) не знает, игрок это, враг
//! или бочка. Протокол:
//! 1. Ищем на цели компонент с прямой capability (`MitigationReceiver` /
//!    `Damageable`), зарегистрированный в `CapabilityRegistry`. Нашли — вызываем.
//! 2. Не нашли — best-effort `CapabilityMessage` всем `GenericReceiver` на цели.
//!    Fire-and-forget: результат доставки не подтверждается.
//!
//! Ничего здесь не паникует: отсутствующая цель/capability = "эффект не применён".

use std::collections::VecDeque;

use bevy::ecs::component::Mutable;
use bevy::ecs::entity_disabling::Disabled;
use bevy::prelude::*;

use crate::combat::error::{validate_mitigation, MitigationRejection};
use crate::combat::{DamageKind, DamageRequest, Dead, Mitigation, MitigationApplied};
use crate::components::HealthPool;
use crate::logger::{log, log_warning};

/// Прямая capability: "receive mitigation (percent, duration)"
pub trait MitigationReceiver: Component<Mutability = Mutable> {
    fn receive_mitigation(&mut self, percent: f32, duration: f32, now: f32) -> Result<(), MitigationRejection>;
}

/// Прямая capability: "take damage" (сам урон применяет DamageResolver)
pub trait Damageable: Component {
    /// false = capability есть, но урон сейчас не принимается (мертв)
    fn accepts_damage(&self) -> bool;
}

/// Opt-in fallback для best-effort сообщений
pub trait GenericReceiver: Component<Mutability = Mutable> {
    fn receive(&mut self, message: &CapabilityMessage);
}

/// Best-effort сообщение для `GenericReceiver`
#[derive(Debug, Clone, PartialEq)]
pub enum CapabilityMessage {
    ReceiveMitigation {
        source: Entity,
        percent: f32,
        duration: f32,
    },
    TakeDamage {
        source: Option<Entity>,
        amount: f32,
        kind: DamageKind,
        is_critical: bool,
    },
}

type MitigationHook = fn(&mut World, Entity, f32, f32, f32) -> Option<Result<(), MitigationRejection>>;
type DamageProbe = fn(&World, Entity) -> Option<bool>;
type MessageHook = fn(&mut World, Entity, &CapabilityMessage) -> bool;

/// Набор зарегистрированных capability (typed fn-pointer hooks, без reflection)
#[derive(Resource, Default)]
pub struct CapabilityRegistry {
    mitigation: Vec<(&'static str, MitigationHook)>,
    damageable: Vec<(&'static str, DamageProbe)>,
    generic: Vec<(&'static str, MessageHook)>,
}

impl CapabilityRegistry {
    pub fn register_mitigation_receiver<T: MitigationReceiver>(&mut self) {
        let name = std::any::type_name::<T>();
        if !self.mitigation.iter().any(|(n, _)| *n == name) {
            self.mitigation.push((name, mitigation_hook::<T>));
        }
    }

    pub fn register_damageable<T: Damageable>(&mut self) {
        let name = std::any::type_name::<T>();
        if !self.damageable.iter().any(|(n, _)| *n == name) {
            self.damageable.push((name, damage_probe::<T>));
        }
    }

    pub fn register_generic_receiver<T: GenericReceiver>(&mut self) {
        let name = std::any::type_name::<T>();
        if !self.generic.iter().any(|(n, _)| *n == name) {
            self.generic.push((name, message_hook::<T>));
        }
    }

    pub fn mitigation_receivers(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.mitigation.iter().map(|(name, _)| *name)
    }
}

fn mitigation_hook<T: MitigationReceiver>(
    world: &mut World,
    target: Entity,
    percent: f32,
    duration: f32,
    now: f32,
) -> Option<Result<(), MitigationRejection>> {
    let mut receiver = world.get_mut::<T>(target)?;
    Some(receiver.receive_mitigation(percent, duration, now))
}

fn damage_probe<T: Damageable>(world: &World, target: Entity) -> Option<bool> {
    world.get::<T>(target).map(|component| component.accepts_damage())
}

fn message_hook<T: GenericReceiver>(world: &mut World, target: Entity, message: &CapabilityMessage) -> bool {
    match world.get_mut::<T>(target) {
        Some(mut receiver) => {
            receiver.receive(message);
            true
        }
        None => false,
    }
}

/// Регистрация capability прямо на App
pub trait CapabilityAppExt {
    fn register_mitigation_receiver<T: MitigationReceiver>(&mut self) -> &mut Self;
    fn register_damageable<T: Damageable>(&mut self) -> &mut Self;
    fn register_generic_receiver<T: GenericReceiver>(&mut self) -> &mut Self;
}

impl CapabilityAppExt for App {
    fn register_mitigation_receiver<T: MitigationReceiver>(&mut self) -> &mut Self {
        self.init_resource::<CapabilityRegistry>();
        self.world_mut()
            .resource_mut::<CapabilityRegistry>()
            .register_mitigation_receiver::<T>();
        self
    }

    fn register_damageable<T: Damageable>(&mut self) -> &mut Self {
        self.init_resource::<CapabilityRegistry>();
        self.world_mut()
            .resource_mut::<CapabilityRegistry>()
            .register_damageable::<T>();
        self
    }

    fn register_generic_receiver<T: GenericReceiver>(&mut self) -> &mut Self {
        self.init_resource::<CapabilityRegistry>();
        self.world_mut()
            .resource_mut::<CapabilityRegistry>()
            .register_generic_receiver::<T>();
        self
    }
}

/// Dead/Disabled цель: новые scoped таймеры на ней не заводим
fn is_inactive(world: &World, target: Entity) -> bool {
    world.get::<Dead>(target).is_some() || world.get::<Disabled>(target).is_some()
}

/// Рассылает сообщение всем GenericReceiver на цели. Returns сколько получили.
fn notify_generic(world: &mut World, hooks: &[(&'static str, MessageHook)], target: Entity, message: &CapabilityMessage) -> usize {
    hooks
        .iter()
        .filter(|(_, hook)| hook(world, target, message))
        .count()
}

/// CapabilityBroadcaster: наложить mitigation на произвольную цель.
///
/// Returns `applied` — true только если сработала прямая capability (шаг 1).
pub fn broadcast_mitigation(
    world: &mut World,
    source: Entity,
    target: Entity,
    percent: f32,
    duration: f32,
    now: f32,
) -> bool {
    if let Err(err) = validate_mitigation(percent, duration) {
        log(&format!("Mitigation {:?} → {:?} rejected: {}", source, target, err));
        return false;
    }

    if world.get_entity(target).is_err() {
        log(&format!(
            "Mitigation {:?} → {:?} rejected: {}",
            source,
            target,
            MitigationRejection::MissingTarget(target)
        ));
        return false;
    }

    if is_inactive(world, target) {
        log(&format!(
            "Mitigation {:?} → {:?} rejected: {}",
            source,
            target,
            MitigationRejection::InactiveTarget(target)
        ));
        return false;
    }

    let applied = world.try_resource_scope(|world, registry: Mut<CapabilityRegistry>| {
        // Шаг 1: прямая capability
        for (name, hook) in &registry.mitigation {
            match hook(world, target, percent, duration, now) {
                Some(Ok(())) => {
                    log(&format!(
                        "🛡️ {:?} → {:?}: mitigation {:.0}% for {:.1}s via {}",
                        source,
                        target,
                        percent * 100.0,
                        duration,
                        name
                    ));
                    return true;
                }
                Some(Err(err)) => {
                    log(&format!("Mitigation refused by {} on {:?}: {}", name, target, err));
                    return false;
                }
                None => continue,
            }
        }

        // Шаг 2: best-effort fallback
        log_warning(&format!(
            "{:?} has no MitigationReceiver — falling back to generic notification",
            target
        ));
        let message = CapabilityMessage::ReceiveMitigation {
            source,
            percent,
            duration,
        };
        notify_generic(world, &registry.generic, target, &message);

        false
    });

    applied.unwrap_or_else(|| {
        log_warning("CapabilityRegistry missing — mitigation broadcast skipped");
        false
    })
}

/// Результат доставки урона hit source'ом
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Найдена Damageable capability, DamageRequest отправлен resolver'у
    Delivered,
    /// Capability есть, но цель урон не принимает (мертва) / невалидный урон
    Refused,
    /// Только best-effort сообщение GenericReceiver'ам
    Advisory,
    /// Цели нет или ей нечем принять урон
    Missing,
}

/// Доставка урона той же схемой discovery, что и mitigation.
pub fn deliver_damage(world: &mut World, request: DamageRequest) -> Delivery {
    if !request.amount.is_finite() || request.amount <= 0.0 {
        log(&format!("Damage to {:?} rejected: invalid amount {}", request.target, request.amount));
        return Delivery::Refused;
    }

    if world.get_entity(request.target).is_err() {
        return Delivery::Missing;
    }

    if is_inactive(world, request.target) {
        log(&format!("Damage to {:?} refused: target is dead or disabled", request.target));
        return Delivery::Refused;
    }

    let delivery = world.try_resource_scope(|world, registry: Mut<CapabilityRegistry>| {
        for (_, probe) in &registry.damageable {
            match probe(world, request.target) {
                Some(true) => {
                    world.send_event(request.clone());
                    return Delivery::Delivered;
                }
                Some(false) => return Delivery::Refused,
                None => continue,
            }
        }

        log_warning(&format!(
            "{:?} has no Damageable capability — falling back to generic notification",
            request.target
        ));
        let message = CapabilityMessage::TakeDamage {
            source: request.source,
            amount: request.amount,
            kind: request.kind,
            is_critical: request.is_critical,
        };

        if notify_generic(world, &registry.generic, request.target, &message) > 0 {
            Delivery::Advisory
        } else {
            Delivery::Missing
        }
    });

    delivery.unwrap_or_else(|| {
        log_warning("CapabilityRegistry missing — damage delivery skipped");
        Delivery::Missing
    })
}

/// Ставит broadcast в очередь команд (из обычной системы) + MitigationApplied событие
pub fn queue_mitigation(commands: &mut Commands, source: Entity, target: Entity, percent: f32, duration: f32, now: f32) {
    commands.queue(move |world: &mut World| {
        let applied = broadcast_mitigation(world, source, target, percent, duration, now);
        world.send_event(MitigationApplied {
            source,
            target,
            percent,
            duration,
            applied,
        });
    });
}

// ============================================================================
// Встроенные реализации capability
// ============================================================================

impl MitigationReceiver for Mitigation {
    fn receive_mitigation(&mut self, percent: f32, duration: f32, now: f32) -> Result<(), MitigationRejection> {
        self.install(percent, duration, now)
    }
}

impl Damageable for HealthPool {
    fn accepts_damage(&self) -> bool {
        self.is_alive()
    }
}

/// Почтовый ящик best-effort сообщений (для AI/скриптов, которые разбирают их сами)
///
/// Хранит последние `CombatInbox::CAPACITY` сообщений (старые вытесняются).
#[derive(Component, Debug, Clone, Default)]
pub struct CombatInbox {
    pub messages: VecDeque<CapabilityMessage>,
}

impl CombatInbox {
    pub const CAPACITY: usize = 16;

    pub fn drain(&mut self) -> Vec<CapabilityMessage> {
        self.messages.drain(..).collect()
    }
}

impl GenericReceiver for CombatInbox {
    fn receive(&mut self, message: &CapabilityMessage) {
        if self.messages.len() >= Self::CAPACITY {
            self.messages.pop_front();
        }
        self.messages.push_back(message.clone());
    }
}
