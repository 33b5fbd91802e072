//! Player marker + сетевой идентификатор

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Marker component для player-controlled entity
///
/// Input systems используют `With<Player>` (локальный игрок этого instance).
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Player;

/// Сетевой ID entity (одинаковый на authority и proxy)
///
/// Entity ID локальны для каждого App, поэтому команды и cosmetic события
/// адресуются через NetId.
#[derive(
    Component, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Reflect, Serialize, Deserialize,
)]
#[reflect(Component)]
pub struct NetId(pub u64);

/// Аллокатор NetId (только authority раздаёт ID новым entity)
#[derive(Resource, Debug)]
pub struct NetIdAllocator {
    next: u64,
}

impl Default for NetIdAllocator {
    fn default() -> Self {
        // Диапазон 1..1000 зарезервирован под игроков
        Self { next: 1000 }
    }
}

impl NetIdAllocator {
    pub fn allocate(&mut self) -> NetId {
        let id = NetId(self.next);
        self.next += 1;
        id
    }
}
