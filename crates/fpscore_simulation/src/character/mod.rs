//! Character domain - per-player aggregate + ECS системы authority
//!
//! - player: PlayerCharacter (inventory + movement + ammo + timers + view)
//! - systems: PlayerCommand → тик → ShotHit → Health
//!
//! Архитектура:
//! ```text
//! PlayerCommand → apply_player_commands → advance_characters
//!     → ShotHit → apply_shot_damage → EntityDied
//!     → WeaponCueEvent → (net) CosmeticEvent
//! ```

use bevy::prelude::*;

use crate::net::is_authority;
use crate::SimulationSet;

pub mod player;
pub mod systems;

// Tests (separate files with _tests suffix)
#[cfg(test)]
mod character_tests;

pub use player::*;
pub use systems::*;

/// Character Plugin (authority gameplay)
///
/// Порядок в FixedUpdate:
/// 1. apply_ammo_resupply, apply_player_commands (SimulationSet::Commands)
/// 2. advance_characters (SimulationSet::Simulate)
/// 3. apply_shot_damage (SimulationSet::Resolve)
pub struct CharacterPlugin;

impl Plugin for CharacterPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<PlayerCommand>()
            .add_event::<ShotHit>()
            .add_event::<WeaponCueEvent>()
            .add_event::<EntityDied>()
            .add_event::<AmmoResupply>();

        app.add_systems(
            FixedUpdate,
            (
                (apply_ammo_resupply, apply_player_commands)
                    .chain()
                    .in_set(SimulationSet::Commands),
                advance_characters.in_set(SimulationSet::Simulate),
                apply_shot_damage.in_set(SimulationSet::Resolve),
            )
                .chain()
                .run_if(is_authority),
        );
    }
}
