//! Hit-scan контракт (world-geometry collaborator)
//!
//! Ядро только потребляет результат трассировки. В headless режиме
//! геометрию заменяют сферы `HitSphere` (см. `SphereHitScan`).

use bevy::prelude::*;

use crate::components::HitSphere;

/// Тип поверхности попадания (physical material)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect)]
pub enum SurfaceTag {
    /// Обычный урон по телу
    #[default]
    Flesh,
    /// Урон × headshot multiplier
    Headshot,
    Ground,
    Rock,
    Other,
}

/// Результат трассировки
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitResult {
    pub point: Vec3,
    pub normal: Vec3,
    pub surface: SurfaceTag,
    pub entity: Option<Entity>,
}

pub trait HitScan {
    /// Ближайшее попадание луча `origin + t·direction`, t ∈ [0, max_range]
    fn trace(&self, origin: Vec3, direction: Vec3, max_range: f32) -> Option<HitResult>;
}

/// Пустой мир: промах всегда
pub struct NoHitScan;

impl HitScan for NoHitScan {
    fn trace(&self, _origin: Vec3, _direction: Vec3, _max_range: f32) -> Option<HitResult> {
        None
    }
}

/// Snapshot одной сферы
#[derive(Debug, Clone, Copy)]
pub struct HitVolume {
    pub entity: Entity,
    pub center: Vec3,
    pub radius: f32,
    pub surface: SurfaceTag,
}

/// Мир из сфер + опциональная плоскость земли (y = ground_height)
#[derive(Debug, Clone, Default)]
pub struct SphereHitScan {
    pub volumes: Vec<HitVolume>,
    pub ground_height: Option<f32>,
    /// Entity, которую луч игнорирует (сам стрелок)
    pub ignore: Option<Entity>,
}

impl SphereHitScan {
    /// Snapshot всех HitSphere из мира (порядок по Entity для детерминизма)
    pub fn from_query<'a>(spheres: impl Iterator<Item = (Entity, &'a Transform, &'a HitSphere)>) -> Self {
        let mut volumes: Vec<HitVolume> = spheres
            .map(|(entity, transform, sphere)| HitVolume {
                entity,
                center: transform.translation + sphere.offset,
                radius: sphere.radius,
                surface: sphere.surface,
            })
            .collect();
        volumes.sort_by_key(|volume| volume.entity);

        Self {
            volumes,
            ground_height: None,
            ignore: None,
        }
    }

    pub fn with_ground(mut self, height: f32) -> Self {
        self.ground_height = Some(height);
        self
    }

    pub fn ignoring(&self, entity: Entity) -> IgnoringHitScan<'_> {
        IgnoringHitScan { inner: self, ignore: entity }
    }

    fn trace_filtered(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_range: f32,
        ignore: Option<Entity>,
    ) -> Option<HitResult> {
        let direction = direction.try_normalize()?;
        let mut best: Option<(f32, HitResult)> = None;

        for volume in &self.volumes {
            if Some(volume.entity) == ignore {
                continue;
            }
            let Some(distance) = ray_sphere(origin, direction, volume.center, volume.radius) else {
                continue;
            };
            if distance > max_range {
                continue;
            }
            if best.as_ref().is_some_and(|(closest, _)| *closest <= distance) {
                continue;
            }
            let point = origin + direction * distance;
            best = Some((
                distance,
                HitResult {
                    point,
                    normal: (point - volume.center).normalize_or_zero(),
                    surface: volume.surface,
                    entity: Some(volume.entity),
                },
            ));
        }

        if let Some(height) = self.ground_height {
            // Луч вниз пересекает плоскость земли
            if direction.y < -f32::EPSILON {
                let distance = (height - origin.y) / direction.y;
                let closer = best.as_ref().is_none_or(|(closest, _)| distance < *closest);
                if distance >= 0.0 && distance <= max_range && closer {
                    best = Some((
                        distance,
                        HitResult {
                            point: origin + direction * distance,
                            normal: Vec3::Y,
                            surface: SurfaceTag::Ground,
                            entity: None,
                        },
                    ));
                }
            }
        }

        best.map(|(_, hit)| hit)
    }
}

impl HitScan for SphereHitScan {
    fn trace(&self, origin: Vec3, direction: Vec3, max_range: f32) -> Option<HitResult> {
        self.trace_filtered(origin, direction, max_range, self.ignore)
    }
}

/// View на SphereHitScan без стрелка (без клонирования volumes)
pub struct IgnoringHitScan<'a> {
    inner: &'a SphereHitScan,
    ignore: Entity,
}

impl HitScan for IgnoringHitScan<'_> {
    fn trace(&self, origin: Vec3, direction: Vec3, max_range: f32) -> Option<HitResult> {
        self.inner
            .trace_filtered(origin, direction, max_range, Some(self.ignore))
    }
}

/// Расстояние до первого пересечения луча со сферой (direction нормализован)
fn ray_sphere(origin: Vec3, direction: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let to_origin = origin - center;
    let b = to_origin.dot(direction);
    let c = to_origin.length_squared() - radius * radius;
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }

    let root = discriminant.sqrt();
    let near = -b - root;
    if near >= 0.0 {
        return Some(near);
    }
    // Origin внутри сферы
    let far = -b + root;
    (far >= 0.0).then_some(0.0)
}
