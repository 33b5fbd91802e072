//! Цели для hit-scan: Health + сферический hit volume

use bevy::prelude::*;
use crate::weapon::SurfaceTag;

/// Здоровье цели
///
/// Инвариант: 0 ≤ current ≤ max
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100.0)
    }
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0.0
    }

    /// Возвращает реально снятое здоровье
    pub fn take_damage(&mut self, amount: f32) -> f32 {
        let applied = amount.max(0.0).min(self.current);
        self.current -= applied;
        applied
    }
}

/// Сферический hit volume (world-geometry stand-in для headless симуляции)
///
/// Центр = `Transform.translation + offset`.
/// `surface` задаёт тип поверхности для всей сферы (голова → Headshot).
#[derive(Component, Debug, Clone, Copy)]
pub struct HitSphere {
    pub radius: f32,
    pub offset: Vec3,
    pub surface: SurfaceTag,
}

impl HitSphere {
    pub fn body(radius: f32) -> Self {
        Self {
            radius,
            offset: Vec3::ZERO,
            surface: SurfaceTag::Flesh,
        }
    }
}
