//! WeaponState - fire/reload/recoil-gating state machine экземпляра оружия
//!
//! # Флаги
//!
//! - `can_fire` - разрешение от movement state / unequip / wait-for-anim
//! - `can_reload` - разрешение от movement state
//! - `ready` - anti-spam gate (false пока не истёк интервал после StopFire)
//! - `reloading` - идёт перезарядка (ровно одна на экземпляр)
//!
//! # Таймеры (owner = WeaponId)
//!
//! - ShotDelay → `fire` (repeat = 60 / rate для automatic)
//! - Reloading → `update_ammo`
//! - AnimationWait → `enable_fire`
//! - SpamFirePrevention → `ready_to_fire` (+ отложенный StartFire)

use bevy::prelude::*;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::ammo::AmmoStore;
use crate::components::ViewRotation;
use crate::movement::MovementState;
use crate::timers::{TimerKey, TimerQueue, TimerTag, WeaponId};
use crate::weapon::catalog::ResolvedWeapon;
use crate::weapon::cues::{ImpactCue, WeaponCue};
use crate::weapon::data::{AttachmentModifiers, WeaponRuntimeData, WeaponStaticData};
use crate::weapon::hitscan::{HitScan, SurfaceTag};
use crate::weapon::recoil::RecoilEngine;
use crate::{log, log_warning};

/// Длительность перезарядки, если у оружия нет reload анимации
pub const DEFAULT_RELOAD_DURATION: f32 = 2.0;

/// Темп по умолчанию при битом rate_of_fire
pub const FALLBACK_RATE_OF_FIRE: f32 = 600.0;

const TIME_EPSILON: f64 = 1e-6;

/// Всё, что оружие читает/мутирует у владельца
pub struct WeaponContext<'a> {
    pub ammo: &'a mut AmmoStore,
    pub timers: &'a mut TimerQueue,
    pub view: &'a mut ViewRotation,
    pub movement: MovementState,
    pub cues: &'a mut Vec<WeaponCue>,
}

/// Окружение выстрела (нужно только ShotDelay тику)
pub struct ShotEnv<'a> {
    pub origin: Vec3,
    pub hitscan: &'a dyn HitScan,
    pub rng: &'a mut ChaCha8Rng,
}

/// Попадание одной дробины/пули
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PelletHit {
    pub point: Vec3,
    pub normal: Vec3,
    pub surface: SurfaceTag,
    pub entity: Option<Entity>,
    pub damage: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FireOutcome {
    /// Выстрел прошёл: `pellets` трассировок, `hits` - те что попали
    Fired { pellets: u32, hits: Vec<PelletHit> },
    /// Пустой магазин: щелчок + fire timer снят
    DryFire,
    /// Guard не пройден (wait-for-anim, anti-spam, перезарядка)
    Skipped,
}

/// Наблюдаемая фаза (для HUD / тестов)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeaponPhase {
    Idle,
    Firing,
    Reloading,
    /// Anti-spam: ждём конца интервала
    Cooldown,
}

#[derive(Debug, Clone)]
pub struct WeaponState {
    id: WeaponId,
    data: WeaponStaticData,
    modifiers: AttachmentModifiers,
    runtime: WeaponRuntimeData,

    can_fire: bool,
    can_reload: bool,
    reloading: bool,
    ready: bool,
    fired_recently: bool,
    trigger_held: bool,
    /// StartFire пришёл пока !ready → выполнить в ready_to_fire
    deferred_fire: bool,
    last_fire_time: Option<f64>,
    /// Дробовик: следующий выстрел играет вторую анимацию
    alt_shot: bool,
    active: bool,

    recoil: RecoilEngine,
}

impl WeaponState {
    pub fn new(id: WeaponId, resolved: ResolvedWeapon, mut runtime: WeaponRuntimeData) -> Self {
        let max_clip = resolved.data.max_clip(runtime.clip_capacity);
        if runtime.clip_size > max_clip {
            log_warning(&format!(
                "Weapon '{}': clip {} > max {}, обрезаем",
                runtime.weapon_key, runtime.clip_size, max_clip
            ));
            runtime.clip_size = max_clip;
        }
        runtime.weapon_health = runtime.weapon_health.clamp(0.0, 100.0);

        Self {
            id,
            data: resolved.data,
            modifiers: resolved.modifiers,
            runtime,
            can_fire: true,
            can_reload: true,
            reloading: false,
            ready: true,
            fired_recently: false,
            trigger_held: false,
            deferred_fire: false,
            last_fire_time: None,
            alt_shot: false,
            active: false,
            recoil: RecoilEngine::default(),
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn id(&self) -> WeaponId {
        self.id
    }

    pub fn data(&self) -> &WeaponStaticData {
        &self.data
    }

    pub fn modifiers(&self) -> &AttachmentModifiers {
        &self.modifiers
    }

    pub fn runtime(&self) -> &WeaponRuntimeData {
        &self.runtime
    }

    pub fn clip_size(&self) -> u32 {
        self.runtime.clip_size
    }

    pub fn can_fire(&self) -> bool {
        self.can_fire
    }

    pub fn can_reload(&self) -> bool {
        self.can_reload
    }

    pub fn is_reloading(&self) -> bool {
        self.reloading
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn recoil(&self) -> &RecoilEngine {
        &self.recoil
    }

    pub fn phase(&self, timers: &TimerQueue) -> WeaponPhase {
        if self.reloading {
            WeaponPhase::Reloading
        } else if self.is_fire_timer_active(timers) {
            WeaponPhase::Firing
        } else if !self.ready {
            WeaponPhase::Cooldown
        } else {
            WeaponPhase::Idle
        }
    }

    pub fn is_fire_timer_active(&self, timers: &TimerQueue) -> bool {
        timers.is_active(self.key(TimerTag::ShotDelay))
    }

    /// Интервал между выстрелами (секунды)
    pub fn fire_interval(&self) -> f64 {
        let rate = self.data.rate_of_fire;
        if rate.is_finite() && rate > 0.0 {
            60.0 / rate as f64
        } else {
            log_warning(&format!(
                "Weapon '{}': rate_of_fire {} некорректен, берём {}",
                self.data.key, rate, FALLBACK_RATE_OF_FIRE
            ));
            60.0 / FALLBACK_RATE_OF_FIRE as f64
        }
    }

    fn key(&self, tag: TimerTag) -> TimerKey {
        TimerKey::weapon(self.id, tag)
    }

    // ========================================================================
    // Permissions (push из movement / inventory)
    // ========================================================================

    pub fn set_can_fire(&mut self, can_fire: bool) {
        self.can_fire = can_fire;
    }

    pub fn set_can_reload(&mut self, can_reload: bool) {
        self.can_reload = can_reload;
    }

    /// AnimationWait истёк
    pub fn enable_fire(&mut self) {
        self.can_fire = true;
    }

    pub fn activate(&mut self) {
        self.active = true;
    }

    /// Оружие убрали из рук: fire остановлен, suppression от unequip снят
    pub fn deactivate(&mut self, ctx: &mut WeaponContext) {
        self.can_fire = true;
        self.stop_fire(ctx);
        self.deferred_fire = false;
        self.recoil.cancel_recovery(ctx.timers.now());
        self.active = false;
    }

    /// Начало unequip анимации: стоп огня + запрет до конца свапа
    pub fn suppress_fire(&mut self, ctx: &mut WeaponContext) {
        self.stop_fire(ctx);
        self.can_fire = false;
    }

    // ========================================================================
    // Fire
    // ========================================================================

    /// StartFire: взводит fire timer и начинает recoil session.
    ///
    /// Возвращает false если огонь не начат (нет can_fire или отложен anti-spam).
    pub fn start_fire(&mut self, ctx: &mut WeaponContext) -> bool {
        if !self.can_fire {
            return false;
        }
        self.trigger_held = true;

        if !self.ready {
            // Выстрел произойдёт в ready_to_fire
            self.deferred_fire = true;
            log(&format!("Weapon {:?}: StartFire отложен (anti-spam)", self.id));
            return false;
        }

        let key = self.key(TimerTag::ShotDelay);
        let interval = self.fire_interval();
        let repeat = self.data.automatic.then_some(interval);

        // Уже стреляем → перевзводим тот же таймер, темп не ломаем
        if let Some(due) = ctx.timers.due(key) {
            ctx.timers.set_at(key, due, repeat);
            return true;
        }

        ctx.timers.set(key, 0.0, repeat);
        self.recoil.start_recoil(
            self.can_fire,
            self.reloading,
            ctx.timers.now(),
            *ctx.view,
            &self.data,
        );
        true
    }

    /// StopFire: снять fire timer, остановить отдачу, начать recovery.
    pub fn stop_fire(&mut self, ctx: &mut WeaponContext) {
        let now = ctx.timers.now();
        self.trigger_held = false;

        self.recoil.stop_recoil(now);
        self.recoil.begin_recovery(now, *ctx.view, &self.data);

        if self.data.prevent_rapid_manual_fire && self.fired_recently {
            self.arm_spam_prevention(ctx.timers);
        }
        ctx.timers.clear(self.key(TimerTag::ShotDelay));

        if self.data.automatic {
            self.deferred_fire = false;
        }
    }

    /// Тик fire timer
    pub fn fire(&mut self, ctx: &mut WeaponContext, env: &mut ShotEnv) -> FireOutcome {
        if self.can_fire && self.ready && self.runtime.clip_size > 0 && !self.reloading {
            self.runtime.clip_size -= 1;
            let hits = self.trace_pellets(ctx, env);
            let pellets = self.data.archetype.pellets();

            let now = ctx.timers.now();
            self.recoil
                .apply_shot(now, &self.data, &self.modifiers, ctx.view);

            self.runtime.weapon_health =
                (self.runtime.weapon_health - self.data.degradation_rate).max(0.0);

            if !self.data.automatic {
                self.recoil.stop_recoil(now);
                self.recoil.begin_recovery(now, *ctx.view, &self.data);
            }

            let alt_anim = self.data.archetype.is_shotgun() && self.alt_shot;
            if self.data.archetype.is_shotgun() {
                self.alt_shot = !self.alt_shot;
            }

            if self.data.wait_for_anim {
                let duration = if alt_anim {
                    self.data.cues.shot_alt.or(self.data.cues.shot)
                } else {
                    self.data.cues.shot
                };
                if let Some(duration) = duration {
                    self.can_fire = false;
                    ctx.timers
                        .set(self.key(TimerTag::AnimationWait), duration as f64, None);
                }
            }

            self.fired_recently = true;
            self.last_fire_time = Some(now);

            // Отложенный ручной выстрел после отпускания курка: cooldown сразу
            if !self.data.automatic && !self.trigger_held && self.data.prevent_rapid_manual_fire {
                self.arm_spam_prevention(ctx.timers);
            }

            ctx.cues.push(WeaponCue::Fired {
                clip_size: self.runtime.clip_size,
                impacts: hits
                    .iter()
                    .map(|hit| ImpactCue {
                        point: hit.point,
                        normal: hit.normal,
                        surface: hit.surface,
                    })
                    .collect(),
                alt_anim,
                silenced: self.data.silenced,
            });

            FireOutcome::Fired { pellets, hits }
        } else if self.can_fire && !self.reloading && self.runtime.clip_size == 0 {
            // automatic очередь сама останавливается на пустом магазине
            ctx.timers.clear(self.key(TimerTag::ShotDelay));
            ctx.cues.push(WeaponCue::DryFire);
            FireOutcome::DryFire
        } else {
            FireOutcome::Skipped
        }
    }

    /// `pellets` независимых трассировок со своим jitter
    fn trace_pellets(&self, ctx: &WeaponContext, env: &mut ShotEnv) -> Vec<PelletHit> {
        let accuracy = if ctx.movement == MovementState::Sprint {
            self.data.accuracy_debuff
        } else {
            1.0
        };
        let pitch_spread = ((self.data.pitch_variation + self.modifiers.pitch_variance) * accuracy).abs();
        let yaw_spread = ((self.data.yaw_variation + self.modifiers.yaw_variance) * accuracy).abs();

        let base_damage = (self.data.base_damage + self.modifiers.damage).max(0.0);
        let range = self.data.max_range();
        let pellets = self.data.archetype.pellets();

        let mut hits = Vec::new();
        for _ in 0..pellets {
            let pitch = jitter(env.rng, pitch_spread);
            let yaw = jitter(env.rng, yaw_spread);
            let direction = ctx.view.offset(pitch, yaw).forward();

            let Some(hit) = env.hitscan.trace(env.origin, direction, range) else {
                continue;
            };
            let damage = if hit.surface == SurfaceTag::Headshot {
                base_damage * self.data.headshot_multiplier
            } else {
                base_damage
            };
            hits.push(PelletHit {
                point: hit.point,
                normal: hit.normal,
                surface: hit.surface,
                entity: hit.entity,
                damage,
            });
        }
        hits
    }

    fn arm_spam_prevention(&mut self, timers: &mut TimerQueue) {
        self.fired_recently = false;
        let Some(last_fire) = self.last_fire_time else {
            return;
        };

        let remaining = last_fire + self.fire_interval() - timers.now();
        if remaining > TIME_EPSILON {
            self.ready = false;
            timers.set(self.key(TimerTag::SpamFirePrevention), remaining, None);
        }
    }

    /// Anti-spam cooldown истёк
    pub fn ready_to_fire(&mut self, ctx: &mut WeaponContext) {
        self.ready = true;
        if self.deferred_fire {
            self.deferred_fire = false;
            let held = self.trigger_held;
            self.start_fire(ctx);
            self.trigger_held = held;
        }
    }

    // ========================================================================
    // Reload
    // ========================================================================

    /// Reload: false если нельзя (нет разрешения, уже идёт, полный магазин, нет резерва)
    pub fn reload(&mut self, ctx: &mut WeaponContext) -> bool {
        if !self.can_reload || self.reloading {
            return false;
        }
        if self.runtime.clip_size >= self.data.max_clip(self.runtime.clip_capacity) {
            return false;
        }
        if ctx.ammo.reserve(self.runtime.ammo_type) == 0 {
            return false;
        }

        let empty = self.runtime.clip_size == 0;
        let duration = if empty {
            self.data.cues.empty_reload.or(self.data.cues.reload)
        } else {
            self.data.cues.reload
        }
        .unwrap_or(DEFAULT_RELOAD_DURATION)
        .max(0.0);

        self.reloading = true;
        self.can_fire = false;
        ctx.timers
            .set(self.key(TimerTag::Reloading), duration as f64, None);
        ctx.cues.push(WeaponCue::ReloadStarted { duration, empty });

        log(&format!(
            "Weapon {:?} ({}): reload {:.2}s (clip {}/{})",
            self.id, self.data.key, duration, self.runtime.clip_size, self.runtime.clip_capacity
        ));
        true
    }

    /// Reload timer истёк: перенести патроны из резерва в магазин
    pub fn update_ammo(&mut self, ctx: &mut WeaponContext) {
        let bonus = self.data.chamber_bonus(self.runtime.clip_size);
        let needed = self
            .runtime
            .clip_capacity
            .saturating_sub(self.runtime.clip_size)
            + bonus;

        // Одна операция над резервом: частичная перезарядка если патронов мало
        let transferred = ctx.ammo.withdraw(self.runtime.ammo_type, needed);
        self.runtime.clip_size += transferred;

        self.reloading = false;
        self.ready = true;
        if ctx.movement != MovementState::Slide {
            self.can_fire = true;
        }

        ctx.cues.push(WeaponCue::ReloadCompleted {
            clip_size: self.runtime.clip_size,
        });
    }

    // ========================================================================
    // Timers / recoil
    // ========================================================================

    /// Dispatch таймера этого оружия
    pub fn on_timer(
        &mut self,
        tag: TimerTag,
        ctx: &mut WeaponContext,
        env: &mut ShotEnv,
    ) -> Option<FireOutcome> {
        match tag {
            TimerTag::ShotDelay => return Some(self.fire(ctx, env)),
            TimerTag::Reloading => self.update_ammo(ctx),
            TimerTag::AnimationWait => self.enable_fire(),
            TimerTag::SpamFirePrevention => self.ready_to_fire(ctx),
            other => log_warning(&format!(
                "Weapon {:?}: таймер {:?} не принадлежит оружию",
                self.id, other
            )),
        }
        None
    }

    /// Покадровое обновление recovery (после dispatch таймеров)
    pub fn update_recoil(&mut self, ctx: &mut WeaponContext) {
        let fire_active = self.is_fire_timer_active(ctx.timers);
        self.recoil
            .update_recovery(ctx.timers.now(), fire_active, ctx.view, &self.data);
    }

    /// Look input
    pub fn cancel_recovery(&mut self, now: f64) {
        self.recoil.cancel_recovery(now);
    }

    /// Снимок runtime данных (для pickup)
    pub fn snapshot(&self) -> WeaponRuntimeData {
        self.runtime.clone()
    }

    /// Resupply в магазин минуя резерв (тесты / debug)
    pub fn set_clip_size(&mut self, clip_size: u32) {
        self.runtime.clip_size = clip_size.min(self.data.max_clip(self.runtime.clip_capacity));
    }
}

/// Равномерный jitter в [-spread, spread]
fn jitter(rng: &mut ChaCha8Rng, spread: f32) -> f32 {
    if spread > 0.0 {
        rng.gen_range(-spread..=spread)
    } else {
        0.0
    }
}
