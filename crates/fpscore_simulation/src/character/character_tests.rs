//! Tests for PlayerCharacter (actions + timer dispatch без ECS).

#[cfg(test)]
mod tests {
    use bevy::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use crate::ammo::{AmmoStore, AmmoType};
    use crate::character::*;
    use crate::inventory::{StarterWeapon, WeaponPickup};
    use crate::movement::{MovementConfig, MovementState};
    use crate::settings::CoreSettings;
    use crate::timers::{TimerKey, TimerTag};
    use crate::weapon::{HitScan, HitVolume, NoHitScan, SphereHitScan, SurfaceTag, WeaponCatalog, WeaponCue};

    const EYE: Vec3 = Vec3::new(0.0, 1.6, 0.0);

    struct Rig {
        character: PlayerCharacter,
        config: MovementConfig,
        catalog: WeaponCatalog,
        rng: ChaCha8Rng,
    }

    impl Rig {
        fn new(keys: &[&str], ammo: AmmoStore) -> Self {
            let config = MovementConfig::default();
            let catalog = WeaponCatalog::default();
            let starters: Vec<Option<StarterWeapon>> =
                keys.iter().map(|key| Some(StarterWeapon::new(*key))).collect();
            let character =
                PlayerCharacter::with_starters(&CoreSettings::default(), ammo, &starters, &catalog, &config);
            Self {
                character,
                config,
                catalog,
                rng: ChaCha8Rng::seed_from_u64(7),
            }
        }

        fn stocked(keys: &[&str]) -> Self {
            Self::new(
                keys,
                AmmoStore::new()
                    .with(AmmoType::Rifle, 90)
                    .with(AmmoType::Pistol, 48)
                    .with(AmmoType::Shotgun, 24),
            )
        }

        fn act(&mut self, action: PlayerAction) {
            self.character.handle_action(action, &self.config);
        }

        fn advance(&mut self, dt: f64) {
            self.advance_with(dt, &NoHitScan);
        }

        fn advance_with(&mut self, dt: f64, scan: &dyn HitScan) {
            self.character
                .advance(dt, &self.config, EYE, scan, &mut self.rng);
        }

        fn can_fire(&self) -> bool {
            self.character
                .inventory()
                .current_weapon()
                .is_some_and(|weapon| weapon.can_fire())
        }
    }

    fn target_ahead() -> SphereHitScan {
        SphereHitScan {
            volumes: vec![HitVolume {
                entity: Entity::from_raw(7),
                center: Vec3::new(0.0, 1.6, -10.0),
                radius: 3.0,
                surface: SurfaceTag::Flesh,
            }],
            ..Default::default()
        }
    }

    // ========================================================================
    // Swap + movement permissions
    // ========================================================================

    #[test]
    fn test_swap_waits_for_unequip_and_rederives_permissions() {
        // pistol → slot 0, rifle → slot 1 (последний стартовый активен)
        let mut rig = Rig::stocked(&["pistol", "rifle"]);
        assert_eq!(rig.character.inventory().current_slot(), 1);

        rig.act(PlayerAction::Slide);
        assert_eq!(rig.character.movement().state(), MovementState::Slide);
        assert!(!rig.can_fire());

        rig.act(PlayerAction::SwapPrimary);
        assert!(rig.character.inventory().is_swap_pending());

        rig.advance(0.2);
        assert_eq!(rig.character.inventory().current_slot(), 1);

        // Unequip (0.4) → pistol в руках, но Slide всё ещё запрещает огонь
        rig.advance(0.25);
        assert_eq!(rig.character.inventory().current_slot(), 0);
        assert!(!rig.character.inventory().is_swap_pending());
        assert!(!rig.can_fire());

        // SlideStop (1.0) → Sprint → огонь разрешён
        rig.advance(0.7);
        assert_eq!(rig.character.movement().state(), MovementState::Sprint);
        assert!(rig.can_fire());
    }

    #[test]
    fn test_movement_change_during_shot_animation_waits() {
        let mut rig = Rig::stocked(&["shotgun"]);

        rig.act(PlayerAction::FireStart);
        rig.advance(0.01);
        rig.act(PlayerAction::FireStop);
        assert_eq!(rig.character.inventory().loaded_ammo(), Some(5));
        assert!(!rig.can_fire());

        // Анимация выстрела (0.8) ещё идёт → can_fire не трогаем
        rig.act(PlayerAction::Movement(MovementState::Walk));
        assert!(!rig.can_fire());
        assert!(rig
            .character
            .timers()
            .is_active(TimerKey::character(TimerTag::WaitForAnim)));

        rig.advance(0.5);
        assert!(!rig.can_fire());

        // Slide до конца анимации: WaitForAnim применит флаги Slide
        rig.act(PlayerAction::Movement(MovementState::Slide));
        rig.advance(0.4);
        assert!(!rig.can_fire());
        assert!(!rig
            .character
            .timers()
            .is_active(TimerKey::character(TimerTag::WaitForAnim)));

        rig.act(PlayerAction::Movement(MovementState::Idle));
        assert!(rig.can_fire());
    }

    #[test]
    fn test_slide_stops_by_timer_and_respects_cooldown() {
        let mut rig = Rig::stocked(&["rifle"]);

        rig.act(PlayerAction::CrouchHeld(true));
        rig.act(PlayerAction::Slide);
        assert_eq!(rig.character.movement().state(), MovementState::Slide);

        rig.advance(1.01);
        assert_eq!(rig.character.movement().state(), MovementState::Crouch);
        assert!(rig.can_fire());

        // Cooldown 1.5 ещё не прошёл
        rig.act(PlayerAction::Slide);
        assert_eq!(rig.character.movement().state(), MovementState::Crouch);

        rig.advance(0.5);
        rig.act(PlayerAction::Slide);
        assert_eq!(rig.character.movement().state(), MovementState::Slide);
    }

    #[test]
    fn test_slide_exit_crouches_without_headroom() {
        let mut rig = Rig::stocked(&["rifle"]);

        rig.act(PlayerAction::Slide);
        rig.act(PlayerAction::WantsWalk(true));
        rig.act(PlayerAction::CanStand(false));
        rig.advance(1.01);

        assert_eq!(rig.character.movement().state(), MovementState::Crouch);
    }

    // ========================================================================
    // Fire / hits / recoil
    // ========================================================================

    #[test]
    fn test_hits_collected_and_drained() {
        let mut rig = Rig::stocked(&["rifle"]);
        let scan = target_ahead();

        rig.act(PlayerAction::FireStart);
        rig.advance_with(0.25, &scan);

        let hits = rig.character.drain_hits();
        assert_eq!(hits.len(), 3);
        assert!(hits.iter().all(|hit| hit.entity == Some(Entity::from_raw(7))));
        assert!(hits.iter().all(|hit| (hit.damage - 22.0).abs() < 1e-4));

        let cues = rig.character.drain_cues();
        let fired = cues
            .iter()
            .filter(|cue| matches!(cue, WeaponCue::Fired { .. }))
            .count();
        assert_eq!(fired, 3);

        assert!(rig.character.drain_hits().is_empty());
        assert!(rig.character.drain_cues().is_empty());
        assert_eq!(rig.character.inventory().loaded_ammo(), Some(27));
    }

    #[test]
    fn test_recovery_returns_view_after_burst() {
        let mut rig = Rig::stocked(&["rifle"]);

        rig.act(PlayerAction::FireStart);
        rig.advance(0.15);
        assert_ne!(rig.character.view(), Default::default());

        rig.act(PlayerAction::FireStop);
        rig.advance(0.5);

        let view = rig.character.view();
        assert!(view.pitch.abs() < 1e-3, "pitch {}", view.pitch);
        assert!(view.yaw.abs() < 1e-3, "yaw {}", view.yaw);
    }

    #[test]
    fn test_look_input_cancels_recovery() {
        let mut rig = Rig::stocked(&["rifle"]);

        rig.act(PlayerAction::FireStart);
        rig.advance(0.15);
        rig.act(PlayerAction::FireStop);
        rig.act(PlayerAction::Look { pitch: 0.5, yaw: 0.0 });

        let after_look = rig.character.view();
        rig.advance(0.5);
        assert_eq!(rig.character.view(), after_look);
    }

    #[test]
    fn test_zero_look_keeps_recovery() {
        let mut rig = Rig::stocked(&["rifle"]);

        rig.act(PlayerAction::FireStart);
        rig.advance(0.15);
        rig.act(PlayerAction::FireStop);
        rig.act(PlayerAction::Look { pitch: 0.0, yaw: 0.0 });
        rig.advance(0.5);

        assert!(rig.character.view().pitch.abs() < 1e-3);
    }

    // ========================================================================
    // Reload / ammo
    // ========================================================================

    #[test]
    fn test_background_reload_completes_after_swap() {
        let mut rig = Rig::stocked(&["pistol", "rifle"]);

        rig.act(PlayerAction::FireStart);
        rig.advance(0.25);
        rig.act(PlayerAction::FireStop);
        assert_eq!(rig.character.inventory().loaded_ammo(), Some(27));

        rig.act(PlayerAction::Reload);
        rig.act(PlayerAction::SwapPrimary);
        rig.advance(3.0);

        assert_eq!(rig.character.inventory().current_slot(), 0);
        let rifle = rig.character.inventory().weapon_in(1).expect("rifle kept in slot");
        assert_eq!(rifle.clip_size(), 30);
        assert!(!rifle.is_reloading());
        assert_eq!(rig.character.ammo().reserve(AmmoType::Rifle), 87);
    }

    #[test]
    fn test_resupply_enables_reload() {
        let mut rig = Rig::new(&["rifle"], AmmoStore::new());

        rig.act(PlayerAction::FireStart);
        rig.advance(0.01);
        rig.act(PlayerAction::FireStop);

        rig.act(PlayerAction::Reload);
        assert!(!rig.character.inventory().current_weapon().is_some_and(|w| w.is_reloading()));

        rig.character.add_ammo(AmmoType::Rifle, 10);
        rig.act(PlayerAction::Reload);
        assert!(rig.character.inventory().current_weapon().is_some_and(|w| w.is_reloading()));

        rig.advance(2.3);
        assert_eq!(rig.character.inventory().loaded_ammo(), Some(30));
        assert_eq!(rig.character.ammo().reserve(AmmoType::Rifle), 9);
    }

    // ========================================================================
    // Pickup / HUD
    // ========================================================================

    #[test]
    fn test_pick_up_full_inventory_drops_current() {
        let mut rig = Rig::stocked(&["rifle", "pistol"]);
        rig.act(PlayerAction::Movement(MovementState::Slide));

        let pickup = WeaponPickup::from_catalog(&rig.catalog, "shotgun", &[]).expect("shotgun in catalog");
        let dropped = rig
            .character
            .pick_up(pickup, &rig.catalog, &rig.config, EYE)
            .expect("pickup accepted")
            .expect("current weapon dropped");

        assert_eq!(dropped.pickup.weapon_key(), "pistol");
        assert_eq!(rig.character.inventory().current_slot(), 1);
        assert_eq!(
            rig.character.inventory().current_weapon_name(),
            Some("Pump Shotgun")
        );
        // Новое оружие получило разрешения Slide
        assert!(!rig.can_fire());
    }

    #[test]
    fn test_hud_reflects_current_weapon() {
        let mut rig = Rig::stocked(&["rifle", "pistol"]);
        rig.act(PlayerAction::Movement(MovementState::Walk));

        let hud = rig.character.hud();
        assert_eq!(
            hud,
            HudState {
                slot: 1,
                weapon_name: Some("Pistol".to_string()),
                loaded_ammo: Some(12),
                remaining_ammo: Some(48),
                movement: MovementState::Walk,
            }
        );
    }

    #[test]
    fn test_movement_actions_sort_first() {
        assert!(PlayerAction::Slide.is_movement());
        assert!(PlayerAction::CanStand(true).is_movement());
        assert!(!PlayerAction::FireStart.is_movement());
        assert!(!PlayerAction::Look { pitch: 1.0, yaw: 0.0 }.is_movement());
    }
}
