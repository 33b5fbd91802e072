//! CoreSettings - политика инвентаря, slide тайминги, tick rate, seed
//!
//! Загружается из RON (`config/core.ron`) или берётся `Default`.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::movement::SlideTiming;

/// Что делать со scroll input пока идёт unequip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WeaponSwapBehaviour {
    /// Перенацелить текущий свап на новый слот
    #[default]
    UseNewValue,
    /// Игнорировать ввод до конца свапа
    Ignore,
}

/// Реакция на неудачный Reload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReloadFailedBehaviour {
    /// Объявлено, но повтора нет: ведёт себя как Ignore
    Retry,
    /// Cue ReloadFailed (например переключиться на другое оружие снаружи)
    ChangeState,
    /// Cue ReloadFailed, решает внешний код
    HandleExternally,
    #[default]
    Ignore,
}

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreSettings {
    pub number_of_weapon_slots: usize,
    pub swap_behaviour: WeaponSwapBehaviour,
    pub reload_failed_behaviour: ReloadFailedBehaviour,
    /// Дистанция выброса pickup перед камерой
    pub weapon_spawn_distance: f32,
    pub slide_time: f32,
    pub slide_timeout: f32,
    /// Частота FixedUpdate
    pub tick_hz: f64,
    pub seed: u64,
}

impl Default for CoreSettings {
    fn default() -> Self {
        Self {
            number_of_weapon_slots: 2,
            swap_behaviour: WeaponSwapBehaviour::UseNewValue,
            reload_failed_behaviour: ReloadFailedBehaviour::Ignore,
            weapon_spawn_distance: 100.0,
            slide_time: 1.0,
            slide_timeout: 1.5,
            tick_hz: 60.0,
            seed: 42,
        }
    }
}

impl CoreSettings {
    pub fn from_ron(text: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(text)
    }

    pub fn slide_timing(&self) -> SlideTiming {
        SlideTiming {
            slide_time: self.slide_time,
            slide_timeout: self.slide_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = CoreSettings::default();
        assert_eq!(settings.number_of_weapon_slots, 2);
        assert_eq!(settings.weapon_spawn_distance, 100.0);
        assert_eq!(settings.tick_hz, 60.0);
    }

    #[test]
    fn test_partial_ron() {
        let settings = CoreSettings::from_ron("(number_of_weapon_slots: 3, swap_behaviour: Ignore)")
            .expect("valid RON");
        assert_eq!(settings.number_of_weapon_slots, 3);
        assert_eq!(settings.swap_behaviour, WeaponSwapBehaviour::Ignore);
        assert_eq!(settings.reload_failed_behaviour, ReloadFailedBehaviour::Ignore);
        assert_eq!(settings.seed, 42);
    }

    #[test]
    fn test_bundled_config_parses() {
        let settings = CoreSettings::from_ron(include_str!("../config/core.ron"))
            .expect("config/core.ron должен парситься");
        assert_eq!(settings.number_of_weapon_slots, 2);
        assert_eq!(settings.slide_timing().slide_time, settings.slide_time);
    }
}
