//! MovementStateMachine - переходы + push can_fire/can_reload в оружие
//!
//! Переход безусловный: guard'ы (есть ли место встать и т.п.) проверяет
//! внешний physics collaborator до запроса.

use crate::log_warning;
use crate::movement::config::{MovementConfig, MovementState, MovementTunables};
use crate::timers::{TimerKey, TimerQueue, TimerTag};
use crate::weapon::WeaponState;

/// Длительности слайда
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlideTiming {
    /// Сколько длится слайд до автоматического выхода
    pub slide_time: f32,
    /// Cooldown до следующего слайда
    pub slide_timeout: f32,
}

impl Default for SlideTiming {
    fn default() -> Self {
        Self {
            slide_time: 1.0,
            slide_timeout: 1.5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MovementStateMachine {
    state: MovementState,
    /// Последние применённые tunables (stale если для state нет записи)
    tunables: MovementTunables,
    slide: SlideTiming,
    slide_ready: bool,

    // Внешние флаги (input / physics)
    crouch_held: bool,
    wants_walk: bool,
    can_stand: bool,
}

impl MovementStateMachine {
    pub fn new(slide: SlideTiming) -> Self {
        Self {
            state: MovementState::Idle,
            tunables: MovementTunables::default(),
            slide,
            slide_ready: true,
            crouch_held: false,
            wants_walk: false,
            can_stand: true,
        }
    }

    pub fn state(&self) -> MovementState {
        self.state
    }

    pub fn tunables(&self) -> &MovementTunables {
        &self.tunables
    }

    pub fn is_sprinting(&self) -> bool {
        self.state == MovementState::Sprint
    }

    pub fn can_slide(&self) -> bool {
        self.slide_ready && self.state != MovementState::Slide
    }

    pub fn set_crouch_held(&mut self, held: bool) {
        self.crouch_held = held;
    }

    pub fn set_wants_walk(&mut self, wants_walk: bool) {
        self.wants_walk = wants_walk;
    }

    /// Результат внешнего запроса "хватает ли места встать"
    pub fn set_can_stand(&mut self, can_stand: bool) {
        self.can_stand = can_stand;
    }

    /// Перейти в `requested` и сразу пересчитать разрешения оружия
    pub fn transition(
        &mut self,
        requested: MovementState,
        config: &MovementConfig,
        weapon: Option<&mut WeaponState>,
        timers: &mut TimerQueue,
    ) {
        self.state = requested;
        self.push_permissions(config, weapon, timers);
    }

    /// Применить tunables текущего состояния и протолкнуть флаги в оружие.
    ///
    /// Если от прошлого выстрела ещё идёт AnimationWait, can_fire не трогаем
    /// сейчас: ставим WaitForAnim на то же время (если ещё не стоит).
    pub fn push_permissions(
        &mut self,
        config: &MovementConfig,
        weapon: Option<&mut WeaponState>,
        timers: &mut TimerQueue,
    ) {
        let Some(tunables) = config.get(self.state) else {
            log_warning(&format!(
                "MovementConfig: нет tunables для {:?}, оставляем прежние",
                self.state
            ));
            return;
        };
        self.tunables = *tunables;

        let Some(weapon) = weapon else {
            return;
        };

        let animation_wait = TimerKey::weapon(weapon.id(), TimerTag::AnimationWait);
        let wait_for_anim = TimerKey::character(TimerTag::WaitForAnim);
        if let Some(due) = timers.due(animation_wait) {
            if !timers.is_active(wait_for_anim) {
                timers.set_at(wait_for_anim, due, None);
            }
        } else {
            weapon.set_can_fire(tunables.can_fire);
        }
        weapon.set_can_reload(tunables.can_reload);
    }

    /// WaitForAnim истёк: can_fire из текущего состояния
    pub fn enable_weapon_fire(&self, config: &MovementConfig, weapon: Option<&mut WeaponState>) {
        let Some(weapon) = weapon else {
            return;
        };
        match config.get(self.state) {
            Some(tunables) => weapon.set_can_fire(tunables.can_fire),
            None => log_warning(&format!(
                "MovementConfig: нет tunables для {:?} (WaitForAnim)",
                self.state
            )),
        }
    }

    /// Начать слайд. false если уже скользим или cooldown не прошёл.
    pub fn start_slide(
        &mut self,
        config: &MovementConfig,
        weapon: Option<&mut WeaponState>,
        timers: &mut TimerQueue,
    ) -> bool {
        if !self.can_slide() {
            return false;
        }

        self.transition(MovementState::Slide, config, weapon, timers);
        timers.set(
            TimerKey::character(TimerTag::SlideStop),
            self.slide.slide_time as f64,
            None,
        );
        timers.set(
            TimerKey::character(TimerTag::SlideCooldown),
            self.slide.slide_timeout as f64,
            None,
        );
        self.slide_ready = false;
        true
    }

    /// SlideStop: выход из слайда в Crouch / Walk / Sprint
    pub fn stop_slide(
        &mut self,
        config: &MovementConfig,
        weapon: Option<&mut WeaponState>,
        timers: &mut TimerQueue,
    ) {
        if self.state != MovementState::Slide {
            return;
        }
        timers.clear(TimerKey::character(TimerTag::SlideStop));

        let next = if !self.can_stand {
            MovementState::Crouch
        } else if self.wants_walk {
            MovementState::Walk
        } else if self.crouch_held {
            MovementState::Crouch
        } else {
            MovementState::Sprint
        };
        self.transition(next, config, weapon, timers);
    }

    pub fn slide_cooldown_elapsed(&mut self) {
        self.slide_ready = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timers::WeaponId;
    use crate::weapon::{preset_rifle, preset_shotgun, ResolvedWeapon, WeaponRuntimeData};
    use crate::weapon::AttachmentModifiers;

    fn weapon(data: crate::weapon::WeaponStaticData) -> WeaponState {
        let runtime = WeaponRuntimeData::from_static(&data, Vec::new());
        WeaponState::new(
            WeaponId(1),
            ResolvedWeapon {
                data,
                modifiers: AttachmentModifiers::default(),
            },
            runtime,
        )
    }

    fn drain(timers: &mut TimerQueue, horizon: f64) -> Vec<TimerKey> {
        let mut fired = Vec::new();
        while let Some(key) = timers.pop_due(horizon) {
            fired.push(key);
        }
        timers.settle(horizon);
        fired
    }

    #[test]
    fn test_transition_pushes_permissions() {
        let config = MovementConfig::default();
        let mut timers = TimerQueue::new();
        let mut machine = MovementStateMachine::new(SlideTiming::default());
        let mut rifle = weapon(preset_rifle());

        machine.transition(MovementState::Vault, &config, Some(&mut rifle), &mut timers);
        assert_eq!(machine.state(), MovementState::Vault);
        assert!(!rifle.can_fire());
        assert!(!rifle.can_reload());

        machine.transition(MovementState::Walk, &config, Some(&mut rifle), &mut timers);
        assert!(rifle.can_fire());
        assert!(rifle.can_reload());
        assert_eq!(machine.tunables().max_walk_speed, 4.0);
    }

    #[test]
    fn test_missing_tunables_keep_stale_values() {
        let config = MovementConfig::empty().with(
            MovementState::Slide,
            MovementTunables::new(9.0, false, true),
        );
        let mut timers = TimerQueue::new();
        let mut machine = MovementStateMachine::new(SlideTiming::default());
        let mut rifle = weapon(preset_rifle());

        machine.transition(MovementState::Slide, &config, Some(&mut rifle), &mut timers);
        assert!(!rifle.can_fire());

        // Нет записи для Sprint: state меняется, флаги и tunables прежние
        machine.transition(MovementState::Sprint, &config, Some(&mut rifle), &mut timers);
        assert_eq!(machine.state(), MovementState::Sprint);
        assert!(!rifle.can_fire());
        assert_eq!(machine.tunables().max_walk_speed, 9.0);
    }

    #[test]
    fn test_fire_push_deferred_while_animation_wait() {
        let config = MovementConfig::default();
        let mut timers = TimerQueue::new();
        let mut machine = MovementStateMachine::new(SlideTiming::default());
        let mut shotgun = weapon(preset_shotgun());

        // Выстрел поставил AnimationWait на 0.8s и запретил огонь
        shotgun.set_can_fire(false);
        timers.set(
            TimerKey::weapon(shotgun.id(), TimerTag::AnimationWait),
            0.8,
            None,
        );

        machine.transition(MovementState::Walk, &config, Some(&mut shotgun), &mut timers);
        assert!(!shotgun.can_fire(), "огонь не включаем посреди анимации");

        let wait = TimerKey::character(TimerTag::WaitForAnim);
        assert_eq!(timers.due(wait), Some(0.8));

        // Оба таймера срабатывают в одно время, AnimationWait первым
        let fired = drain(&mut timers, 1.0);
        assert_eq!(
            fired,
            vec![TimerKey::weapon(shotgun.id(), TimerTag::AnimationWait), wait]
        );
    }

    #[test]
    fn test_slide_exit_targets() {
        let config = MovementConfig::default();
        let mut timers = TimerQueue::new();

        let mut machine = MovementStateMachine::new(SlideTiming::default());
        assert!(machine.start_slide(&config, None, &mut timers));
        machine.stop_slide(&config, None, &mut timers);
        assert_eq!(machine.state(), MovementState::Sprint);

        let mut machine = MovementStateMachine::new(SlideTiming::default());
        machine.start_slide(&config, None, &mut timers);
        machine.set_can_stand(false);
        machine.set_wants_walk(true);
        machine.stop_slide(&config, None, &mut timers);
        assert_eq!(machine.state(), MovementState::Crouch);

        let mut machine = MovementStateMachine::new(SlideTiming::default());
        machine.start_slide(&config, None, &mut timers);
        machine.set_wants_walk(true);
        machine.stop_slide(&config, None, &mut timers);
        assert_eq!(machine.state(), MovementState::Walk);

        let mut machine = MovementStateMachine::new(SlideTiming::default());
        machine.start_slide(&config, None, &mut timers);
        machine.set_crouch_held(true);
        machine.stop_slide(&config, None, &mut timers);
        assert_eq!(machine.state(), MovementState::Crouch);
    }

    #[test]
    fn test_slide_cooldown() {
        let config = MovementConfig::default();
        let mut timers = TimerQueue::new();
        let mut machine = MovementStateMachine::new(SlideTiming {
            slide_time: 0.5,
            slide_timeout: 2.0,
        });

        assert!(machine.start_slide(&config, None, &mut timers));
        assert!(!machine.start_slide(&config, None, &mut timers));

        machine.stop_slide(&config, None, &mut timers);
        assert!(!machine.can_slide(), "cooldown ещё идёт");

        machine.slide_cooldown_elapsed();
        assert!(machine.can_slide());
    }

    #[test]
    fn test_stop_slide_outside_slide_is_noop() {
        let config = MovementConfig::default();
        let mut timers = TimerQueue::new();
        let mut machine = MovementStateMachine::new(SlideTiming::default());

        machine.transition(MovementState::Walk, &config, None, &mut timers);
        machine.stop_slide(&config, None, &mut timers);
        assert_eq!(machine.state(), MovementState::Walk);
    }
}
