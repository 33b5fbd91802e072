//! Патроны: типы и резерв игрока
//!
//! `AmmoStore` - authoritative резерв по типам патронов.
//! Принадлежит PlayerCharacter, в WeaponState передаётся по ссылке.
//! Мутируется только завершением перезарядки (`withdraw`) и resupply (`add`).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Тип патронов (общий резерв для всего оружия одного типа)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Reflect, Serialize, Deserialize,
)]
pub enum AmmoType {
    Pistol,
    #[default]
    Rifle,
    Shotgun,
    Special,
}

impl AmmoType {
    pub const ALL: [AmmoType; 4] = [
        AmmoType::Pistol,
        AmmoType::Rifle,
        AmmoType::Shotgun,
        AmmoType::Special,
    ];
}

/// Резерв патронов игрока
///
/// Инвариант: резерв ≥ 0 (u32 + saturating арифметика)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmmoStore {
    reserves: BTreeMap<AmmoType, u32>,
}

impl AmmoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder для стартового резерва
    pub fn with(mut self, ammo_type: AmmoType, amount: u32) -> Self {
        self.reserves.insert(ammo_type, amount);
        self
    }

    pub fn reserve(&self, ammo_type: AmmoType) -> u32 {
        self.reserves.get(&ammo_type).copied().unwrap_or(0)
    }

    pub fn set(&mut self, ammo_type: AmmoType, amount: u32) {
        self.reserves.insert(ammo_type, amount);
    }

    /// Resupply (pickup ящика с патронами)
    pub fn add(&mut self, ammo_type: AmmoType, amount: u32) {
        let entry = self.reserves.entry(ammo_type).or_insert(0);
        *entry = entry.saturating_add(amount);
    }

    /// Забрать до `wanted` патронов из резерва.
    ///
    /// Чтение и списание - одна операция над `&mut self`, так что два оружия
    /// с одним типом патронов не могут списать по устаревшему значению.
    /// Возвращает сколько реально выдано (`min(wanted, reserve)`).
    pub fn withdraw(&mut self, ammo_type: AmmoType, wanted: u32) -> u32 {
        let entry = self.reserves.entry(ammo_type).or_insert(0);
        let taken = wanted.min(*entry);
        *entry -= taken;
        taken
    }

    pub fn iter(&self) -> impl Iterator<Item = (AmmoType, u32)> + '_ {
        self.reserves.iter().map(|(ammo_type, amount)| (*ammo_type, *amount))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_withdraw_full() {
        let mut store = AmmoStore::new().with(AmmoType::Rifle, 90);

        assert_eq!(store.withdraw(AmmoType::Rifle, 30), 30);
        assert_eq!(store.reserve(AmmoType::Rifle), 60);
    }

    #[test]
    fn test_withdraw_partial() {
        let mut store = AmmoStore::new().with(AmmoType::Shotgun, 4);

        assert_eq!(store.withdraw(AmmoType::Shotgun, 6), 4);
        assert_eq!(store.reserve(AmmoType::Shotgun), 0);
        assert_eq!(store.withdraw(AmmoType::Shotgun, 6), 0);
    }

    #[test]
    fn test_unknown_type_is_empty() {
        let mut store = AmmoStore::new();
        assert_eq!(store.reserve(AmmoType::Special), 0);
        assert_eq!(store.withdraw(AmmoType::Special, 10), 0);
    }

    #[test]
    fn test_add_saturates() {
        let mut store = AmmoStore::new().with(AmmoType::Pistol, u32::MAX - 1);
        store.add(AmmoType::Pistol, 10);
        assert_eq!(store.reserve(AmmoType::Pistol), u32::MAX);
    }
}
