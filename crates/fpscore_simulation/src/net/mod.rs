//! Net boundary - логический контракт authority / proxy
//!
//! Транспорта здесь нет: каналы это очереди в ресурсах, доставку между
//! App делают `deliver_commands` / `deliver_events` (тесты, headless demo).
//!
//! ```text
//! Proxy:     InputAction → CommandChannel.outgoing ──┐
//!                                                    ▼
//! Authority: InputAction ─────────→ PlayerCommand ← CommandChannel.incoming
//!            WeaponCueEvent → EventChannel.outgoing ──┐
//!                                                     ▼
//! Proxy:     EventChannel.incoming → ReplicatedView (только mirror)
//! ```
//!
//! Proxy никогда не трогает PlayerCharacter / AmmoStore: все игровые
//! системы CharacterPlugin идут под `run_if(is_authority)`.

use bevy::prelude::*;

use crate::character::PlayerAction;
use crate::components::NetId;
use crate::SimulationSet;

pub mod channels;
pub mod replication;
pub mod systems;

pub use channels::*;
pub use replication::*;
pub use systems::*;

/// Роль этого instance в сессии (ровно один Authority)
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NetRole {
    #[default]
    Authority,
    Proxy,
}

/// Сырой input локального игрока (до роутинга по роли)
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct InputAction {
    pub net_id: NetId,
    pub action: PlayerAction,
}

/// Run condition: authority (ресурса нет → single-player, тоже authority)
pub fn is_authority(role: Option<Res<NetRole>>) -> bool {
    role.is_none_or(|role| *role == NetRole::Authority)
}

pub fn is_proxy(role: Option<Res<NetRole>>) -> bool {
    !is_authority(role)
}

/// Net Plugin
///
/// Порядок в FixedUpdate:
/// 1. SimulationSet::Input: route_input_actions → receive_commands (authority)
/// 2. SimulationSet::Replicate: broadcast_cues (authority), replay_cosmetic_events (proxy)
pub struct NetPlugin;

impl Plugin for NetPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<NetRole>()
            .init_resource::<CommandChannel>()
            .init_resource::<EventChannel>()
            .add_event::<InputAction>();

        app.add_systems(
            FixedUpdate,
            (
                (
                    route_input_actions,
                    receive_commands.run_if(is_authority),
                )
                    .chain()
                    .in_set(SimulationSet::Input),
                (
                    broadcast_cues.run_if(is_authority),
                    replay_cosmetic_events.run_if(is_proxy),
                )
                    .in_set(SimulationSet::Replicate),
            ),
        );
    }
}
