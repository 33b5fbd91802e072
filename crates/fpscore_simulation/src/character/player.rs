//! PlayerCharacter - per-player aggregate (authority side)
//!
//! Владеет InventoryManager, MovementStateMachine, AmmoStore, TimerQueue и
//! ViewRotation. Снаружи приходят только `PlayerAction` и шаг времени.
//!
//! # Порядок внутри тика
//!
//! 1. `handle_action` (movement actions раньше fire/reload, сортирует система)
//! 2. `advance(dt)`: due таймеры по времени срабатывания → recovery
//! 3. drain cues / hits

use bevy::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::ammo::{AmmoStore, AmmoType};
use crate::components::{NetId, ViewRotation};
use crate::inventory::{
    InventoryManager, SpawnRejected, SpawnRequest, StarterWeapon, SwapOutcome, WeaponDrop, WeaponPickup,
};
use crate::movement::{MovementConfig, MovementState, MovementStateMachine};
use crate::settings::CoreSettings;
use crate::timers::{TimerKey, TimerOwner, TimerQueue, TimerTag};
use crate::weapon::{FireOutcome, HitScan, PelletHit, ShotEnv, WeaponCatalog, WeaponContext, WeaponCue};
use crate::{log, log_warning};

/// Высота глаз над Transform.translation (origin трассировки)
pub const EYE_HEIGHT: f32 = 1.6;

/// Дискретный input игрока (он же payload команды)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PlayerAction {
    FireStart,
    FireStop,
    Reload,
    SwapPrimary,
    SwapSecondary,
    SwapTo(usize),
    /// Колесо: < 0 от себя (следующий слот), иначе к себе
    Scroll(f32),
    Inspect,
    Look { pitch: f32, yaw: f32 },
    Movement(MovementState),
    Slide,
    CrouchHeld(bool),
    WantsWalk(bool),
    /// Результат внешней проверки "есть место встать"
    CanStand(bool),
    /// Подобрать pickup с этим NetId
    PickUp(NetId),
}

impl PlayerAction {
    /// Movement actions применяются раньше остальных в том же тике
    pub fn is_movement(&self) -> bool {
        matches!(
            self,
            PlayerAction::Movement(_)
                | PlayerAction::Slide
                | PlayerAction::CrouchHeld(_)
                | PlayerAction::WantsWalk(_)
                | PlayerAction::CanStand(_)
        )
    }
}

/// Команда client → authority
#[derive(Event, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerCommand {
    pub net_id: NetId,
    pub action: PlayerAction,
}

/// Снимок для HUD
#[derive(Debug, Clone, PartialEq)]
pub struct HudState {
    pub slot: usize,
    pub weapon_name: Option<String>,
    pub loaded_ammo: Option<u32>,
    pub remaining_ammo: Option<u32>,
    pub movement: MovementState,
}

/// Всё, что WeaponState получает по &mut (отделено от inventory для split borrow)
#[derive(Debug, Default)]
struct CharacterCore {
    ammo: AmmoStore,
    timers: TimerQueue,
    view: ViewRotation,
    cues: Vec<WeaponCue>,
    hits: Vec<PelletHit>,
}

impl CharacterCore {
    fn ctx(&mut self, movement: MovementState) -> WeaponContext<'_> {
        WeaponContext {
            ammo: &mut self.ammo,
            timers: &mut self.timers,
            view: &mut self.view,
            movement,
            cues: &mut self.cues,
        }
    }
}

#[derive(Component, Debug)]
pub struct PlayerCharacter {
    inventory: InventoryManager,
    movement: MovementStateMachine,
    core: CharacterCore,
}

impl PlayerCharacter {
    pub fn new(settings: &CoreSettings, ammo: AmmoStore) -> Self {
        Self {
            inventory: InventoryManager::new(settings),
            movement: MovementStateMachine::new(settings.slide_timing()),
            core: CharacterCore {
                ammo,
                ..Default::default()
            },
        }
    }

    /// Новый персонаж со стартовым оружием (разрешения уже из Idle)
    pub fn with_starters(
        settings: &CoreSettings,
        ammo: AmmoStore,
        starters: &[Option<StarterWeapon>],
        catalog: &WeaponCatalog,
        config: &MovementConfig,
    ) -> Self {
        let mut character = Self::new(settings, ammo);
        let state = character.movement.state();
        character
            .inventory
            .spawn_starters(starters, catalog, &mut character.core.ctx(state), Vec3::ZERO);
        character.refresh_permissions(config);
        character
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn inventory(&self) -> &InventoryManager {
        &self.inventory
    }

    pub fn movement(&self) -> &MovementStateMachine {
        &self.movement
    }

    pub fn ammo(&self) -> &AmmoStore {
        &self.core.ammo
    }

    pub fn view(&self) -> ViewRotation {
        self.core.view
    }

    pub fn timers(&self) -> &TimerQueue {
        &self.core.timers
    }

    /// Локальное время персонажа (секунды)
    pub fn now(&self) -> f64 {
        self.core.timers.now()
    }

    pub fn hud(&self) -> HudState {
        HudState {
            slot: self.inventory.current_slot(),
            weapon_name: self.inventory.current_weapon_name().map(str::to_string),
            loaded_ammo: self.inventory.loaded_ammo(),
            remaining_ammo: self.inventory.remaining_ammo(&self.core.ammo),
            movement: self.movement.state(),
        }
    }

    // ========================================================================
    // Actions
    // ========================================================================

    /// Применить action (кроме PickUp, которому нужен мир)
    pub fn handle_action(&mut self, action: PlayerAction, config: &MovementConfig) {
        let state = self.movement.state();
        match action {
            PlayerAction::FireStart => {
                if let Some(weapon) = self.inventory.current_weapon_mut() {
                    weapon.start_fire(&mut self.core.ctx(state));
                }
            }
            PlayerAction::FireStop => {
                if let Some(weapon) = self.inventory.current_weapon_mut() {
                    weapon.stop_fire(&mut self.core.ctx(state));
                }
            }
            PlayerAction::Reload => {
                self.inventory.reload(&mut self.core.ctx(state));
            }
            PlayerAction::SwapPrimary => self.swap_to(0, config),
            PlayerAction::SwapSecondary => self.swap_to(1, config),
            PlayerAction::SwapTo(slot) => self.swap_to(slot, config),
            PlayerAction::Scroll(value) => {
                let outcome = self.inventory.scroll_weapon(value, &mut self.core.ctx(state));
                self.after_swap(outcome, config);
            }
            PlayerAction::Inspect => {
                self.inventory.inspect(&mut self.core.ctx(state));
            }
            PlayerAction::Look { pitch, yaw } => self.look(pitch, yaw),
            PlayerAction::Movement(requested) => {
                self.movement.transition(
                    requested,
                    config,
                    self.inventory.current_weapon_mut(),
                    &mut self.core.timers,
                );
            }
            PlayerAction::Slide => {
                self.movement.start_slide(
                    config,
                    self.inventory.current_weapon_mut(),
                    &mut self.core.timers,
                );
            }
            PlayerAction::CrouchHeld(held) => self.movement.set_crouch_held(held),
            PlayerAction::WantsWalk(wants) => self.movement.set_wants_walk(wants),
            PlayerAction::CanStand(can_stand) => self.movement.set_can_stand(can_stand),
            PlayerAction::PickUp(net_id) => {
                log_warning(&format!(
                    "PlayerCharacter: PickUp({:?}) требует мир, используйте pick_up",
                    net_id
                ));
            }
        }
    }

    fn swap_to(&mut self, slot: usize, config: &MovementConfig) {
        let state = self.movement.state();
        let outcome = self.inventory.swap_weapon(slot, &mut self.core.ctx(state));
        self.after_swap(outcome, config);
    }

    fn after_swap(&mut self, outcome: SwapOutcome, config: &MovementConfig) {
        if outcome.changes_permissions() {
            self.refresh_permissions(config);
        }
    }

    /// Разрешения нового оружия из текущего movement state
    fn refresh_permissions(&mut self, config: &MovementConfig) {
        self.movement.push_permissions(
            config,
            self.inventory.current_weapon_mut(),
            &mut self.core.timers,
        );
    }

    fn look(&mut self, pitch: f32, yaw: f32) {
        if pitch == 0.0 && yaw == 0.0 {
            return;
        }
        self.core.view.add_input(pitch, yaw);
        let now = self.core.timers.now();
        if let Some(weapon) = self.inventory.current_weapon_mut() {
            weapon.cancel_recovery(now);
        }
    }

    /// Подобрать оружие; вернёт выброшенное (если слоты были заняты)
    pub fn pick_up(
        &mut self,
        pickup: WeaponPickup,
        catalog: &WeaponCatalog,
        config: &MovementConfig,
        eye: Vec3,
    ) -> Result<Option<WeaponDrop>, SpawnRejected> {
        let state = self.movement.state();
        let dropped = self
            .inventory
            .pick_up(pickup, catalog, &mut self.core.ctx(state), eye)?;
        self.refresh_permissions(config);
        Ok(dropped)
    }

    pub fn spawn_weapon(
        &mut self,
        request: SpawnRequest,
        catalog: &WeaponCatalog,
        config: &MovementConfig,
        eye: Vec3,
    ) -> Result<Option<WeaponDrop>, SpawnRejected> {
        let state = self.movement.state();
        let dropped = self
            .inventory
            .spawn_weapon(request, catalog, &mut self.core.ctx(state), eye)?;
        self.refresh_permissions(config);
        Ok(dropped)
    }

    /// Resupply резерва (ammo pickup)
    pub fn add_ammo(&mut self, ammo_type: AmmoType, amount: u32) {
        self.core.ammo.add(ammo_type, amount);
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Продвинуть время на `dt`: due таймеры по порядку, затем recovery
    pub fn advance(
        &mut self,
        dt: f64,
        config: &MovementConfig,
        origin: Vec3,
        hitscan: &dyn HitScan,
        rng: &mut ChaCha8Rng,
    ) {
        let horizon = self.core.timers.now() + dt.max(0.0);
        while let Some(key) = self.core.timers.pop_due(horizon) {
            self.dispatch(key, config, origin, hitscan, rng);
        }
        self.core.timers.settle(horizon);

        let state = self.movement.state();
        if let Some(weapon) = self.inventory.current_weapon_mut() {
            weapon.update_recoil(&mut self.core.ctx(state));
        }
    }

    fn dispatch(
        &mut self,
        key: TimerKey,
        config: &MovementConfig,
        origin: Vec3,
        hitscan: &dyn HitScan,
        rng: &mut ChaCha8Rng,
    ) {
        let state = self.movement.state();
        match key.owner {
            TimerOwner::Weapon(id) => {
                let Some(weapon) = self.inventory.weapon_by_id_mut(id) else {
                    log(&format!("PlayerCharacter: таймер {:?} для отсутствующего {:?}", key.tag, id));
                    return;
                };
                let mut env = ShotEnv { origin, hitscan, rng };
                let outcome = weapon.on_timer(key.tag, &mut self.core.ctx(state), &mut env);
                if let Some(FireOutcome::Fired { hits, .. }) = outcome {
                    self.core.hits.extend(hits);
                }
            }
            TimerOwner::Character => match key.tag {
                TimerTag::Unequip => {
                    let outcome = self.inventory.unequip_return(&mut self.core.ctx(state));
                    self.after_swap(outcome, config);
                }
                TimerTag::WaitForAnim => {
                    self.movement
                        .enable_weapon_fire(config, self.inventory.current_weapon_mut());
                }
                TimerTag::SlideStop => {
                    self.movement.stop_slide(
                        config,
                        self.inventory.current_weapon_mut(),
                        &mut self.core.timers,
                    );
                }
                TimerTag::SlideCooldown => self.movement.slide_cooldown_elapsed(),
                other => log_warning(&format!(
                    "PlayerCharacter: таймер {:?} не принадлежит персонажу",
                    other
                )),
            },
        }
    }

    // ========================================================================
    // Outputs
    // ========================================================================

    pub fn drain_cues(&mut self) -> Vec<WeaponCue> {
        std::mem::take(&mut self.core.cues)
    }

    pub fn drain_hits(&mut self) -> Vec<PelletHit> {
        std::mem::take(&mut self.core.hits)
    }
}
