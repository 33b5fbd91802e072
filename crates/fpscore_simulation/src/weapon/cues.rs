//! Cosmetic cues (анимации / эффекты / звук)
//!
//! Fire-and-forget: ядро не ждёт завершения анимаций. Если нужна пауза,
//! ядро само ставит таймер на `duration`.
//! Cue несёт ровно столько данных, чтобы proxy смог воспроизвести эффект.

use bevy::prelude::*;

use crate::weapon::hitscan::SurfaceTag;

/// Точка попадания для эффекта (decal / particles)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpactCue {
    pub point: Vec3,
    pub normal: Vec3,
    pub surface: SurfaceTag,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WeaponCue {
    /// Успешный выстрел (muzzle flash, звук, trace, impacts)
    Fired {
        clip_size: u32,
        impacts: Vec<ImpactCue>,
        /// Дробовик: вторая анимация выстрела
        alt_anim: bool,
        silenced: bool,
    },
    /// Щелчок пустого магазина
    DryFire,
    ReloadStarted { duration: f32, empty: bool },
    ReloadCompleted { clip_size: u32 },
    /// Reload не прошёл, а политика требует реакции снаружи
    ReloadFailed,
    Unequip { slot: usize, duration: f32 },
    /// Новый активный слот
    Equip { slot: usize, duration: Option<f32> },
    Inspect { duration: f32 },
    /// Оружие выброшено как pickup
    Dropped { weapon_key: String },
}

impl WeaponCue {
    pub fn is_fire(&self) -> bool {
        matches!(self, WeaponCue::Fired { .. } | WeaponCue::DryFire)
    }
}
