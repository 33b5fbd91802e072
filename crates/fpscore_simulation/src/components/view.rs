//! ViewRotation - направление взгляда (control rotation) в градусах

use bevy::prelude::*;

/// Контролирующий поворот взгляда
///
/// pitch > 0 → вверх, yaw > 0 → влево (поворот вокруг +Y).
/// Recoil добавляет input, recovery интерполирует обратно.
#[derive(Debug, Clone, Copy, Default, PartialEq, Reflect)]
pub struct ViewRotation {
    pub pitch: f32,
    pub yaw: f32,
}

impl ViewRotation {
    pub const PITCH_LIMIT: f32 = 89.0;

    pub fn new(pitch: f32, yaw: f32) -> Self {
        Self { pitch, yaw }
    }

    /// Добавить input (как AddPitchInput/AddYawInput контроллера)
    pub fn add_input(&mut self, pitch: f32, yaw: f32) {
        self.pitch = (self.pitch + pitch).clamp(-Self::PITCH_LIMIT, Self::PITCH_LIMIT);
        self.yaw += yaw;
    }

    pub fn lerp(self, target: ViewRotation, alpha: f32) -> ViewRotation {
        ViewRotation {
            pitch: self.pitch + (target.pitch - self.pitch) * alpha,
            yaw: self.yaw + (target.yaw - self.yaw) * alpha,
        }
    }

    /// Единичный вектор взгляда (forward = -Z при нулевом повороте)
    pub fn forward(&self) -> Vec3 {
        let rotation = Quat::from_euler(
            EulerRot::YXZ,
            self.yaw.to_radians(),
            self.pitch.to_radians(),
            0.0,
        );
        rotation * Vec3::NEG_Z
    }

    /// Тот же взгляд со смещением (jitter выстрела)
    pub fn offset(&self, pitch: f32, yaw: f32) -> ViewRotation {
        ViewRotation {
            pitch: self.pitch + pitch,
            yaw: self.yaw + yaw,
        }
    }
}
