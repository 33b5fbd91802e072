//! Movement tunables по состояниям

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Состояние локомоции (ровно одно активное)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Reflect, Serialize, Deserialize,
)]
pub enum MovementState {
    #[default]
    Idle,
    Walk,
    Sprint,
    Crouch,
    Slide,
    Vault,
}

/// Параметры одного состояния
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovementTunables {
    pub max_walk_speed: f32,
    pub max_acceleration: f32,
    pub braking_deceleration: f32,
    pub ground_friction: f32,
    pub can_fire: bool,
    pub can_reload: bool,
}

impl MovementTunables {
    pub fn new(max_walk_speed: f32, can_fire: bool, can_reload: bool) -> Self {
        Self {
            max_walk_speed,
            max_acceleration: 20.0,
            braking_deceleration: 20.0,
            ground_friction: 8.0,
            can_fire,
            can_reload,
        }
    }
}

impl Default for MovementTunables {
    fn default() -> Self {
        Self::new(4.0, true, true)
    }
}

/// State → tunables (RON: `(states: { Walk: (...), ... })`)
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementConfig {
    pub states: BTreeMap<MovementState, MovementTunables>,
}

impl MovementConfig {
    pub fn empty() -> Self {
        Self {
            states: BTreeMap::new(),
        }
    }

    pub fn get(&self, state: MovementState) -> Option<&MovementTunables> {
        self.states.get(&state)
    }

    pub fn with(mut self, state: MovementState, tunables: MovementTunables) -> Self {
        self.states.insert(state, tunables);
        self
    }

    pub fn from_ron(text: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(text)
    }
}

impl Default for MovementConfig {
    fn default() -> Self {
        let slide = MovementTunables {
            max_acceleration: 5.0,
            braking_deceleration: 2.0,
            ground_friction: 0.5,
            ..MovementTunables::new(9.0, false, true)
        };
        let vault = MovementTunables {
            max_acceleration: 40.0,
            ..MovementTunables::new(3.0, false, false)
        };

        Self::empty()
            .with(MovementState::Idle, MovementTunables::new(4.0, true, true))
            .with(MovementState::Walk, MovementTunables::new(4.0, true, true))
            .with(MovementState::Sprint, MovementTunables::new(7.0, true, true))
            .with(MovementState::Crouch, MovementTunables::new(2.0, true, true))
            .with(MovementState::Slide, slide)
            .with(MovementState::Vault, vault)
    }
}
