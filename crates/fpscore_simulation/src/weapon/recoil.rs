//! RecoilEngine - кривые отдачи, timelines и recovery
//!
//! Timeline привязан к часам TimerQueue (`now`), а не к накоплению dt:
//! позиция = now - start, поэтому выстрел внутри тика видит точную позицию.

use serde::{Deserialize, Serialize};

use crate::components::ViewRotation;
use crate::weapon::data::{AttachmentModifiers, WeaponStaticData};

/// Кусочно-линейная кривая (time → value)
///
/// Вне диапазона ключей значение clamp'ится к крайним.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecoilCurve {
    pub keys: Vec<(f32, f32)>,
}

impl RecoilCurve {
    pub fn new(mut keys: Vec<(f32, f32)>) -> Self {
        keys.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { keys }
    }

    /// Прямая from → to за `duration` секунд
    pub fn linear(duration: f32, from: f32, to: f32) -> Self {
        Self::new(vec![(0.0, from), (duration.max(0.0), to)])
    }

    pub fn constant(value: f32) -> Self {
        Self::new(vec![(0.0, value)])
    }

    /// Время последнего ключа
    pub fn duration(&self) -> f32 {
        self.keys.last().map(|(time, _)| *time).unwrap_or(0.0)
    }

    pub fn sample(&self, time: f32) -> f32 {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return 0.0;
        };
        if time <= first.0 {
            return first.1;
        }
        if time >= last.0 {
            return last.1;
        }

        for pair in self.keys.windows(2) {
            let (t0, v0) = pair[0];
            let (t1, v1) = pair[1];
            if time <= t1 {
                let span = t1 - t0;
                if span <= f32::EPSILON {
                    return v1;
                }
                return v0 + (v1 - v0) * ((time - t0) / span);
            }
        }
        last.1
    }
}

/// Timeline: играет от 0 до length, останавливается в конце
#[derive(Debug, Clone, Copy, Default)]
pub struct Timeline {
    started_at: Option<f64>,
    frozen: f32,
    length: f32,
}

impl Timeline {
    /// PlayFromStart
    pub fn start(&mut self, now: f64, length: f32) {
        self.started_at = Some(now);
        self.frozen = 0.0;
        self.length = length.max(0.0);
    }

    pub fn stop(&mut self, now: f64) {
        self.frozen = self.position(now);
        self.started_at = None;
    }

    pub fn position(&self, now: f64) -> f32 {
        match self.started_at {
            Some(start) => ((now - start) as f32).clamp(0.0, self.length),
            None => self.frozen,
        }
    }

    pub fn is_playing(&self, now: f64) -> bool {
        self.started_at.is_some() && self.position(now) < self.length
    }
}

/// Отдача одного экземпляра оружия (RecoilSession + recovery)
#[derive(Debug, Clone, Default)]
pub struct RecoilEngine {
    vertical: Timeline,
    horizontal: Timeline,
    recovery: Timeline,
    shots_fired: u32,
    /// Поворот до начала очереди (цель recovery)
    origin: ViewRotation,
    /// Поворот в момент старта recovery
    recovery_from: ViewRotation,
    should_recover: bool,
    recovering: bool,
}

impl RecoilEngine {
    pub fn shots_fired(&self) -> u32 {
        self.shots_fired
    }

    pub fn should_recover(&self) -> bool {
        self.should_recover
    }

    pub fn is_recovering(&self) -> bool {
        self.recovering
    }

    pub fn origin(&self) -> ViewRotation {
        self.origin
    }

    /// StartRecoil: no-op пока нельзя стрелять или идёт перезарядка
    pub fn start_recoil(
        &mut self,
        can_fire: bool,
        reloading: bool,
        now: f64,
        view: ViewRotation,
        data: &WeaponStaticData,
    ) -> bool {
        if !can_fire || reloading {
            return false;
        }

        self.vertical.start(now, data.vertical_recoil.duration());
        self.horizontal.start(now, data.horizontal_recoil.duration());
        self.origin = view;
        self.should_recover = true;
        self.halt_recovery(now);
        true
    }

    /// Отдача одного выстрела (один раз за тик, не за дробину)
    ///
    /// Automatic после первого выстрела берёт значение по позиции timeline,
    /// первый выстрел и ручной огонь - значение в 0.
    pub fn apply_shot(
        &mut self,
        now: f64,
        data: &WeaponStaticData,
        modifiers: &AttachmentModifiers,
        view: &mut ViewRotation,
    ) -> (f32, f32) {
        let (vertical_at, horizontal_at) = if data.automatic && self.shots_fired > 0 {
            (self.vertical.position(now), self.horizontal.position(now))
        } else {
            (0.0, 0.0)
        };

        let pitch = data.vertical_recoil.sample(vertical_at) * modifiers.vertical_recoil;
        let yaw = data.horizontal_recoil.sample(horizontal_at) * modifiers.horizontal_recoil;
        view.add_input(pitch, yaw);

        self.shots_fired += 1;
        (pitch, yaw)
    }

    /// Остановить recoil timelines, сбросить счётчик очереди
    pub fn stop_recoil(&mut self, now: f64) {
        self.vertical.stop(now);
        self.horizontal.stop(now);
        self.shots_fired = 0;
    }

    /// Запустить recovery с текущего поворота (только если should_recover)
    pub fn begin_recovery(&mut self, now: f64, view: ViewRotation, data: &WeaponStaticData) {
        if !self.should_recover {
            return;
        }
        self.recovery_from = view;
        self.recovery.start(now, data.recovery.duration());
        self.recovering = true;
    }

    /// Look input игрока: recovery больше не тянет камеру
    pub fn cancel_recovery(&mut self, now: f64) {
        self.should_recover = false;
        self.halt_recovery(now);
    }

    /// Двигает взгляд по recovery кривой.
    ///
    /// Пока активен fire timer этого оружия recovery не применяется.
    pub fn update_recovery(
        &mut self,
        now: f64,
        fire_timer_active: bool,
        view: &mut ViewRotation,
        data: &WeaponStaticData,
    ) {
        if !self.recovering || fire_timer_active {
            return;
        }

        let position = self.recovery.position(now);
        let alpha = data.recovery.sample(position);
        *view = self.recovery_from.lerp(self.origin, alpha);

        if !self.recovery.is_playing(now) {
            self.recovering = false;
        }
    }

    fn halt_recovery(&mut self, now: f64) {
        self.recovery.stop(now);
        self.recovering = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kick_data(automatic: bool) -> WeaponStaticData {
        WeaponStaticData {
            automatic,
            vertical_recoil: RecoilCurve::linear(1.0, 1.0, 3.0),
            horizontal_recoil: RecoilCurve::constant(0.5),
            recovery: RecoilCurve::linear(0.5, 0.0, 1.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_curve_sample() {
        let curve = RecoilCurve::new(vec![(1.0, 10.0), (0.0, 0.0), (2.0, 0.0)]);
        assert_eq!(curve.sample(-1.0), 0.0);
        assert_eq!(curve.sample(0.5), 5.0);
        assert_eq!(curve.sample(1.0), 10.0);
        assert_eq!(curve.sample(1.5), 5.0);
        assert_eq!(curve.sample(9.0), 0.0);
        assert_eq!(curve.duration(), 2.0);
        assert_eq!(RecoilCurve::default().sample(0.3), 0.0);
    }

    #[test]
    fn test_timeline_clamps_at_length() {
        let mut timeline = Timeline::default();
        timeline.start(1.0, 0.5);
        assert_eq!(timeline.position(1.25), 0.25);
        assert!(timeline.is_playing(1.25));
        assert_eq!(timeline.position(3.0), 0.5);
        assert!(!timeline.is_playing(3.0));

        timeline.start(4.0, 0.5);
        timeline.stop(4.1);
        assert!((timeline.position(10.0) - 0.1).abs() < 1e-5);
    }

    #[test]
    fn test_start_recoil_gated() {
        let data = kick_data(true);
        let mut recoil = RecoilEngine::default();

        assert!(!recoil.start_recoil(false, false, 0.0, ViewRotation::default(), &data));
        assert!(!recoil.start_recoil(true, true, 0.0, ViewRotation::default(), &data));
        assert!(!recoil.should_recover());

        assert!(recoil.start_recoil(true, false, 0.0, ViewRotation::new(2.0, 3.0), &data));
        assert!(recoil.should_recover());
        assert_eq!(recoil.origin(), ViewRotation::new(2.0, 3.0));
    }

    #[test]
    fn test_automatic_samples_timeline_after_first_shot() {
        let data = kick_data(true);
        let modifiers = AttachmentModifiers::default();
        let mut recoil = RecoilEngine::default();
        let mut view = ViewRotation::default();

        recoil.start_recoil(true, false, 0.0, view, &data);
        // Первый выстрел → значение в 0
        assert_eq!(recoil.apply_shot(0.0, &data, &modifiers, &mut view), (1.0, 0.5));
        // Второй через 0.5s → позиция timeline 0.5
        assert_eq!(recoil.apply_shot(0.5, &data, &modifiers, &mut view), (2.0, 0.5));
        assert_eq!(recoil.shots_fired(), 2);
        assert_eq!(view, ViewRotation::new(3.0, 1.0));
    }

    #[test]
    fn test_manual_always_samples_zero() {
        let data = kick_data(false);
        let modifiers = AttachmentModifiers {
            vertical_recoil: 0.5,
            ..Default::default()
        };
        let mut recoil = RecoilEngine::default();
        let mut view = ViewRotation::default();

        recoil.start_recoil(true, false, 0.0, view, &data);
        recoil.apply_shot(0.0, &data, &modifiers, &mut view);
        assert_eq!(recoil.apply_shot(0.7, &data, &modifiers, &mut view), (0.5, 0.5));
    }

    #[test]
    fn test_recovery_returns_to_origin() {
        let data = kick_data(true);
        let mut recoil = RecoilEngine::default();
        let mut view = ViewRotation::default();

        recoil.start_recoil(true, false, 0.0, view, &data);
        recoil.apply_shot(0.0, &data, &AttachmentModifiers::default(), &mut view);
        recoil.stop_recoil(0.1);
        recoil.begin_recovery(0.1, view, &data);
        assert!(recoil.is_recovering());

        // Половина кривой → половина пути
        recoil.update_recovery(0.35, false, &mut view, &data);
        assert_eq!(view, ViewRotation::new(0.5, 0.25));

        recoil.update_recovery(0.6, false, &mut view, &data);
        assert_eq!(view, ViewRotation::default());
        assert!(!recoil.is_recovering());
    }

    #[test]
    fn test_recovery_paused_while_fire_timer_active() {
        let data = kick_data(true);
        let mut recoil = RecoilEngine::default();
        let mut view = ViewRotation::new(4.0, 0.0);

        recoil.start_recoil(true, false, 0.0, ViewRotation::default(), &data);
        recoil.begin_recovery(0.0, view, &data);

        recoil.update_recovery(0.3, true, &mut view, &data);
        assert_eq!(view, ViewRotation::new(4.0, 0.0));
    }

    #[test]
    fn test_look_input_cancels_recovery() {
        let data = kick_data(true);
        let mut recoil = RecoilEngine::default();
        let mut view = ViewRotation::new(4.0, 0.0);

        recoil.start_recoil(true, false, 0.0, ViewRotation::default(), &data);
        recoil.begin_recovery(0.0, view, &data);
        recoil.cancel_recovery(0.1);

        recoil.update_recovery(0.3, false, &mut view, &data);
        assert_eq!(view, ViewRotation::new(4.0, 0.0));
        assert!(!recoil.should_recover());

        // Без should_recover новая recovery не стартует
        recoil.begin_recovery(0.4, view, &data);
        assert!(!recoil.is_recovering());
    }
}
