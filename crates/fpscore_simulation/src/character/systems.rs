//! Character systems (authority): команды → тик → урон

use bevy::prelude::*;
use std::collections::HashSet;

use crate::ammo::AmmoType;
use crate::character::player::{PlayerCharacter, PlayerCommand, PlayerAction, EYE_HEIGHT};
use crate::components::{Health, HitSphere, NetId, NetIdAllocator, Player};
use crate::inventory::WeaponPickup;
use crate::movement::MovementConfig;
use crate::weapon::{SphereHitScan, SurfaceTag, WeaponCatalog, WeaponCue};
use crate::DeterministicRng;
use crate::{log, log_warning};

/// Событие: пуля/дробина попала в entity
#[derive(Event, Debug, Clone)]
pub struct ShotHit {
    pub shooter: Entity,
    pub target: Entity,
    pub damage: f32,
    pub point: Vec3,
    pub normal: Vec3,
    pub surface: SurfaceTag,
}

/// Событие: cosmetic cue персонажа (уходит в net broadcast)
#[derive(Event, Debug, Clone)]
pub struct WeaponCueEvent {
    pub net_id: NetId,
    pub cue: WeaponCue,
}

/// Событие: entity умер (health <= 0)
#[derive(Event, Debug, Clone)]
pub struct EntityDied {
    pub entity: Entity,
    pub killer: Option<Entity>,
}

/// Событие: пополнение резерва (ammo pickup, authority)
#[derive(Event, Debug, Clone, Copy)]
pub struct AmmoResupply {
    pub net_id: NetId,
    pub ammo_type: AmmoType,
    pub amount: u32,
}

/// Компонент-маркер: entity мертв (Health <= 0)
#[derive(Component, Debug)]
pub struct Dead;

/// Плоскость земли для hit-scan (если нет - только сферы)
#[derive(Resource, Debug, Clone, Copy)]
pub struct GroundHeight(pub f32);

/// Spawn игрока: персонаж + цель для чужих выстрелов
pub fn spawn_player(
    commands: &mut Commands,
    character: PlayerCharacter,
    net_id: NetId,
    transform: Transform,
) -> Entity {
    commands
        .spawn((
            Player,
            net_id,
            character,
            transform,
            Health::default(),
            HitSphere {
                radius: 0.4,
                offset: Vec3::Y * 1.0,
                surface: SurfaceTag::Flesh,
            },
        ))
        .id()
}

fn eye_position(transform: &Transform) -> Vec3 {
    transform.translation + Vec3::Y * EYE_HEIGHT
}

/// System: PlayerCommand → PlayerCharacter
///
/// Movement команды тика применяются раньше fire/reload того же тика,
/// внутри группы порядок прихода сохраняется.
pub fn apply_player_commands(
    mut commands: Commands,
    mut command_events: EventReader<PlayerCommand>,
    mut characters: Query<(&NetId, &Transform, &mut PlayerCharacter)>,
    pickups: Query<(Entity, &NetId, &WeaponPickup)>,
    config: Res<MovementConfig>,
    catalog: Res<WeaponCatalog>,
    mut allocator: ResMut<NetIdAllocator>,
) {
    let mut pending: Vec<PlayerCommand> = command_events.read().copied().collect();
    pending.sort_by_key(|command| !command.action.is_movement());
    let mut taken: HashSet<NetId> = HashSet::new();

    for command in pending {
        let Some((_, transform, mut character)) = characters
            .iter_mut()
            .find(|(net_id, _, _)| **net_id == command.net_id)
        else {
            log_warning(&format!("PlayerCommand: нет персонажа {:?}", command.net_id));
            continue;
        };

        let PlayerAction::PickUp(pickup_id) = command.action else {
            character.handle_action(command.action, &config);
            continue;
        };

        // Despawn применится только после системы: взятый pickup виден query до конца тика
        if taken.contains(&pickup_id) {
            log(&format!("PickUp: pickup {:?} уже взят в этом тике", pickup_id));
            continue;
        }
        let Some((pickup_entity, _, pickup)) = pickups.iter().find(|(_, id, _)| **id == pickup_id) else {
            log(&format!("PickUp: pickup {:?} не найден", pickup_id));
            continue;
        };

        let dropped = match character.pick_up(pickup.clone(), &catalog, &config, eye_position(transform)) {
            Ok(dropped) => dropped,
            Err(rejected) => {
                log_warning(&format!("PickUp: pickup {:?} остаётся в мире ({:?})", pickup_id, rejected));
                continue;
            }
        };
        taken.insert(pickup_id);
        commands.entity(pickup_entity).despawn();

        if let Some(drop) = dropped {
            let net_id = allocator.allocate();
            log(&format!(
                "Weapon '{}' dropped as pickup {:?}",
                drop.pickup.weapon_key(),
                net_id
            ));
            commands.spawn((drop.pickup, drop.transform, net_id));
        }
    }
}

/// System: resupply резерва
pub fn apply_ammo_resupply(
    mut resupply_events: EventReader<AmmoResupply>,
    mut characters: Query<(&NetId, &mut PlayerCharacter)>,
) {
    for event in resupply_events.read() {
        let Some((_, mut character)) = characters
            .iter_mut()
            .find(|(net_id, _)| **net_id == event.net_id)
        else {
            continue;
        };
        character.add_ammo(event.ammo_type, event.amount);
    }
}

/// System: тик всех персонажей (таймеры → выстрелы → recovery)
///
/// Порядок по NetId, чтобы RNG расходовался детерминированно.
pub fn advance_characters(
    time: Res<Time>,
    config: Res<MovementConfig>,
    ground: Option<Res<GroundHeight>>,
    mut rng: ResMut<DeterministicRng>,
    mut characters: Query<(Entity, &NetId, &Transform, &mut PlayerCharacter)>,
    spheres: Query<(Entity, &Transform, &HitSphere), Without<Dead>>,
    mut hit_events: EventWriter<ShotHit>,
    mut cue_events: EventWriter<WeaponCueEvent>,
) {
    let dt = time.delta_secs_f64();

    let mut world_scan = SphereHitScan::from_query(spheres.iter());
    if let Some(ground) = ground {
        world_scan = world_scan.with_ground(ground.0);
    }

    let mut ordered: Vec<_> = characters.iter_mut().collect();
    ordered.sort_by_key(|(_, net_id, _, _)| **net_id);

    for (entity, net_id, transform, mut character) in ordered {
        let origin = eye_position(transform);
        let scan = world_scan.ignoring(entity);
        character.advance(dt, &config, origin, &scan, &mut rng.rng);

        for hit in character.drain_hits() {
            let Some(target) = hit.entity else {
                continue;
            };
            hit_events.write(ShotHit {
                shooter: entity,
                target,
                damage: hit.damage,
                point: hit.point,
                normal: hit.normal,
                surface: hit.surface,
            });
        }

        for cue in character.drain_cues() {
            cue_events.write(WeaponCueEvent { net_id: *net_id, cue });
        }
    }
}

/// System: ShotHit → Health (+ EntityDied / Dead)
pub fn apply_shot_damage(
    mut commands: Commands,
    mut hit_events: EventReader<ShotHit>,
    mut targets: Query<&mut Health, Without<Dead>>,
    mut died_events: EventWriter<EntityDied>,
) {
    for hit in hit_events.read() {
        if hit.shooter == hit.target {
            log(&format!("⚠️ SELF-HIT: {:?} попал в себя, пропускаем", hit.shooter));
            continue;
        }

        let Ok(mut health) = targets.get_mut(hit.target) else {
            continue;
        };
        if !health.is_alive() {
            continue;
        }

        let applied = health.take_damage(hit.damage);
        log(&format!(
            "🎯 ShotHit: {:?} → {:?} {:.1} dmg ({:?}), HP {:.1}",
            hit.shooter, hit.target, applied, hit.surface, health.current
        ));

        if !health.is_alive() {
            died_events.write(EntityDied {
                entity: hit.target,
                killer: Some(hit.shooter),
            });
            commands.entity(hit.target).insert(Dead);
        }
    }
}
