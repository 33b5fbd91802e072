//! ReplicatedView - cosmetic mirror чужого (или своего) персонажа на proxy
//!
//! Обновляется только из CosmeticEvent. Authoritative clip / reserve / slot
//! здесь не живут: это последнее, что authority показал наблюдателям.

use bevy::prelude::*;

use crate::weapon::{ImpactCue, WeaponCue};

/// Сколько последних точек попадания держим для decals
pub const MAX_TRACKED_IMPACTS: usize = 32;

#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct ReplicatedView {
    /// Активный слот по последнему Equip
    pub slot: Option<usize>,
    /// Последний показанный магазин (None после Equip до первого выстрела/reload)
    pub clip_size: Option<u32>,
    pub shots: u32,
    pub dry_fires: u32,
    pub reloading: bool,
    pub swapping: bool,
    /// Последний проигранный tick (старые события игнорируются)
    pub last_tick: u64,
    pub impacts: Vec<ImpactCue>,
    pub last_cue: Option<WeaponCue>,
}

impl ReplicatedView {
    /// Проиграть cue. false если событие старше уже показанного тика.
    pub fn replay(&mut self, tick: u64, cue: &WeaponCue) -> bool {
        if tick < self.last_tick {
            return false;
        }
        self.last_tick = tick;

        match cue {
            WeaponCue::Fired {
                clip_size, impacts, ..
            } => {
                self.shots += 1;
                self.clip_size = Some(*clip_size);
                self.impacts.extend(impacts.iter().copied());
                if self.impacts.len() > MAX_TRACKED_IMPACTS {
                    let excess = self.impacts.len() - MAX_TRACKED_IMPACTS;
                    self.impacts.drain(..excess);
                }
            }
            WeaponCue::DryFire => self.dry_fires += 1,
            WeaponCue::ReloadStarted { .. } => self.reloading = true,
            WeaponCue::ReloadCompleted { clip_size } => {
                self.reloading = false;
                self.clip_size = Some(*clip_size);
            }
            WeaponCue::Unequip { .. } => self.swapping = true,
            WeaponCue::Equip { slot, .. } => {
                self.swapping = false;
                self.reloading = false;
                self.slot = Some(*slot);
                self.clip_size = None;
            }
            WeaponCue::ReloadFailed | WeaponCue::Inspect { .. } | WeaponCue::Dropped { .. } => {}
        }

        self.last_cue = Some(cue.clone());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weapon::SurfaceTag;

    fn fired(clip_size: u32, impacts: usize) -> WeaponCue {
        WeaponCue::Fired {
            clip_size,
            impacts: (0..impacts)
                .map(|i| ImpactCue {
                    point: Vec3::new(i as f32, 0.0, 0.0),
                    normal: Vec3::Y,
                    surface: SurfaceTag::Rock,
                })
                .collect(),
            alt_anim: false,
            silenced: false,
        }
    }

    #[test]
    fn test_replay_fire_reload_swap() {
        let mut view = ReplicatedView::default();

        assert!(view.replay(1, &fired(29, 1)));
        assert!(view.replay(2, &WeaponCue::ReloadStarted { duration: 2.2, empty: false }));
        assert!(view.reloading);
        assert!(view.replay(3, &WeaponCue::ReloadCompleted { clip_size: 30 }));
        assert!(!view.reloading);
        assert_eq!(view.clip_size, Some(30));

        view.replay(4, &WeaponCue::Unequip { slot: 0, duration: 0.4 });
        assert!(view.swapping);
        view.replay(5, &WeaponCue::Equip { slot: 1, duration: None });
        assert!(!view.swapping);
        assert_eq!(view.slot, Some(1));
        assert_eq!(view.clip_size, None);
        assert_eq!(view.shots, 1);
    }

    #[test]
    fn test_stale_tick_ignored() {
        let mut view = ReplicatedView::default();
        view.replay(10, &WeaponCue::DryFire);

        assert!(!view.replay(9, &WeaponCue::DryFire));
        assert_eq!(view.dry_fires, 1);
        // Тот же тик - не stale (несколько cues за тик)
        assert!(view.replay(10, &WeaponCue::DryFire));
        assert_eq!(view.dry_fires, 2);
    }

    #[test]
    fn test_impacts_bounded() {
        let mut view = ReplicatedView::default();
        for tick in 0..5 {
            view.replay(tick, &fired(6, 8));
        }
        assert_eq!(view.impacts.len(), MAX_TRACKED_IMPACTS);
        assert_eq!(view.shots, 5);
    }
}
