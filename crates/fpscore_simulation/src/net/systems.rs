//! Net systems: роутинг input по роли, приём команд, broadcast и replay

use bevy::prelude::*;

use crate::character::{PlayerCommand, WeaponCueEvent};
use crate::components::NetId;
use crate::net::{CommandChannel, CosmeticEvent, EventChannel, InputAction, NetRole};
use crate::net::replication::ReplicatedView;
use crate::SimulationTick;
use crate::log;

/// System: InputAction → PlayerCommand (authority) или outbox (proxy)
pub fn route_input_actions(
    role: Option<Res<NetRole>>,
    mut input_events: EventReader<InputAction>,
    mut command_events: EventWriter<PlayerCommand>,
    mut channel: ResMut<CommandChannel>,
) {
    let role = role.map(|role| *role).unwrap_or_default();

    for input in input_events.read() {
        let command = PlayerCommand {
            net_id: input.net_id,
            action: input.action,
        };
        match role {
            NetRole::Authority => {
                command_events.write(command);
            }
            NetRole::Proxy => channel.send(command),
        }
    }
}

/// System (authority): inbox → PlayerCommand events этого тика
pub fn receive_commands(
    mut channel: ResMut<CommandChannel>,
    mut command_events: EventWriter<PlayerCommand>,
) {
    for command in channel.take_incoming() {
        command_events.write(command);
    }
}

/// System (authority): WeaponCueEvent → EventChannel.outgoing
///
/// Outbox держит события одного тика: что host не забрал после прошлого
/// update, отбрасывается (без observers очередь не растёт).
pub fn broadcast_cues(
    tick: Res<SimulationTick>,
    mut cue_events: EventReader<WeaponCueEvent>,
    mut channel: ResMut<EventChannel>,
) {
    let stale = channel.take_outgoing().len();
    if stale > 0 {
        log(&format!("Broadcast: {} cosmetic событий не доставлено, отброшены", stale));
    }

    for event in cue_events.read() {
        channel.publish(CosmeticEvent {
            net_id: event.net_id,
            tick: tick.0,
            cue: event.cue.clone(),
        });
    }
}

/// System (proxy): EventChannel.incoming → ReplicatedView
///
/// Entity без ReplicatedView для NetId не создаётся: mirror спавнит тот,
/// кто знает про игрока (join / spawn replication).
pub fn replay_cosmetic_events(
    mut channel: ResMut<EventChannel>,
    mut mirrors: Query<(&NetId, &mut ReplicatedView)>,
) {
    for event in channel.take_incoming() {
        let Some((_, mut view)) = mirrors
            .iter_mut()
            .find(|(net_id, _)| **net_id == event.net_id)
        else {
            log(&format!("Replay: нет mirror для {:?}, cue пропущен", event.net_id));
            continue;
        };

        if !view.replay(event.tick, &event.cue) {
            log(&format!(
                "Replay: устаревший cue {:?} (tick {} < {})",
                event.net_id, event.tick, view.last_tick
            ));
        }
    }
}
