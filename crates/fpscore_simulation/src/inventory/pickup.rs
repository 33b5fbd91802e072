//! Pickup данные: стартовое оружие, pickup в мире, выброшенное оружие

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::weapon::{WeaponCatalog, WeaponRuntimeData};

/// Стартовое оружие слота
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarterWeapon {
    pub weapon_key: String,
    #[serde(default)]
    pub attachments: Vec<String>,
}

impl StarterWeapon {
    pub fn new(weapon_key: impl Into<String>) -> Self {
        Self {
            weapon_key: weapon_key.into(),
            attachments: Vec::new(),
        }
    }

    pub fn with_attachments(mut self, attachments: &[&str]) -> Self {
        self.attachments = attachments.iter().map(|key| key.to_string()).collect();
        self
    }
}

/// Оружие, лежащее в мире (несёт snapshot runtime данных)
#[derive(Component, Debug, Clone, PartialEq)]
pub struct WeaponPickup {
    pub runtime: WeaponRuntimeData,
    /// Static pickup не падает (physics off), стоит в заданном transform
    pub is_static: bool,
    /// Выброшено игроком (а не расставлено уровнем)
    pub runtime_spawned: bool,
}

impl WeaponPickup {
    /// Свежий pickup из каталога (полный магазин, health 100)
    pub fn from_catalog(catalog: &WeaponCatalog, weapon_key: &str, attachments: &[String]) -> Option<Self> {
        let runtime = catalog.fresh_runtime(weapon_key, attachments)?;
        Some(Self {
            runtime,
            is_static: false,
            runtime_spawned: false,
        })
    }

    pub fn weapon_key(&self) -> &str {
        &self.runtime.weapon_key
    }
}

/// Оружие, выброшенное при замене в активном слоте
#[derive(Debug, Clone, PartialEq)]
pub struct WeaponDrop {
    pub pickup: WeaponPickup,
    pub transform: Transform,
}
