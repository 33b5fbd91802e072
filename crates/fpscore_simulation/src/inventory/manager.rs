//! InventoryManager - слоты оружия и swap state machine
//!
//! # Состояния свапа
//!
//! `Equipped(slot)` → (если у оружия есть unequip анимация) `SwapPending(target)`
//! → `Equipped(target)`. Завершение unequip приходит таймером `Unequip`
//! (owner = Character) или явным `unequip_return`.
//!
//! Разрешения can_fire/can_reload после свапа пересчитывает владелец
//! (PlayerCharacter) через MovementStateMachine, см. `SwapOutcome`.

use bevy::prelude::*;
use std::collections::BTreeMap;

use crate::ammo::AmmoStore;
use crate::inventory::pickup::{StarterWeapon, WeaponDrop, WeaponPickup};
use crate::settings::{CoreSettings, ReloadFailedBehaviour, WeaponSwapBehaviour};
use crate::timers::{TimerKey, TimerOwner, TimerTag, WeaponId};
use crate::weapon::{WeaponCatalog, WeaponContext, WeaponCue, WeaponRuntimeData, WeaponState};
use crate::{log, log_error, log_warning};

/// Результат запроса на смену слота
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapOutcome {
    /// Слот сменён прямо сейчас
    Swapped,
    /// Идёт unequip анимация, смена позже
    Pending,
    /// Pending свап отменён (цель совпала с текущим слотом)
    Cancelled,
    /// Запрос проигнорирован
    Ignored,
}

impl SwapOutcome {
    /// Нужно ли пересчитать разрешения оружия из movement state
    pub fn changes_permissions(&self) -> bool {
        matches!(self, SwapOutcome::Swapped | SwapOutcome::Cancelled)
    }
}

/// Почему экземпляр оружия не создан (слоты не тронуты)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpawnRejected {
    SlotOutOfRange(usize),
    /// Ключа нет в каталоге
    UnknownWeapon(String),
}

/// Запрос на создание экземпляра оружия в слоте
#[derive(Debug, Clone)]
pub struct SpawnRequest {
    pub runtime: WeaponRuntimeData,
    pub slot: usize,
    /// Выбросить текущее оружие слота как pickup
    pub spawn_pickup: bool,
    /// Some → выброшенный pickup static в этом transform
    pub static_transform: Option<Transform>,
}

impl SpawnRequest {
    pub fn new(runtime: WeaponRuntimeData, slot: usize) -> Self {
        Self {
            runtime,
            slot,
            spawn_pickup: false,
            static_transform: None,
        }
    }

    pub fn dropping_current(mut self) -> Self {
        self.spawn_pickup = true;
        self
    }
}

#[derive(Debug)]
pub struct InventoryManager {
    slots: BTreeMap<usize, WeaponState>,
    current_slot: usize,
    number_of_slots: usize,
    swap_pending: bool,
    target_slot: usize,
    swap_behaviour: WeaponSwapBehaviour,
    reload_failed_behaviour: ReloadFailedBehaviour,
    weapon_spawn_distance: f32,
    next_weapon_id: u32,
}

impl InventoryManager {
    pub fn new(settings: &CoreSettings) -> Self {
        Self {
            slots: BTreeMap::new(),
            current_slot: 0,
            number_of_slots: settings.number_of_weapon_slots,
            swap_pending: false,
            target_slot: 0,
            swap_behaviour: settings.swap_behaviour,
            reload_failed_behaviour: settings.reload_failed_behaviour,
            weapon_spawn_distance: settings.weapon_spawn_distance,
            next_weapon_id: 1,
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn current_slot(&self) -> usize {
        self.current_slot
    }

    pub fn number_of_slots(&self) -> usize {
        self.number_of_slots
    }

    pub fn is_swap_pending(&self) -> bool {
        self.swap_pending
    }

    pub fn target_slot(&self) -> Option<usize> {
        self.swap_pending.then_some(self.target_slot)
    }

    pub fn current_weapon(&self) -> Option<&WeaponState> {
        self.slots.get(&self.current_slot)
    }

    pub fn current_weapon_mut(&mut self) -> Option<&mut WeaponState> {
        self.slots.get_mut(&self.current_slot)
    }

    pub fn weapon_in(&self, slot: usize) -> Option<&WeaponState> {
        self.slots.get(&slot)
    }

    /// Экземпляр по id (таймеры неактивного оружия тоже доходят до него)
    pub fn weapon_by_id_mut(&mut self, id: WeaponId) -> Option<&mut WeaponState> {
        self.slots.values_mut().find(|weapon| weapon.id() == id)
    }

    pub fn slots(&self) -> impl Iterator<Item = (usize, &WeaponState)> {
        self.slots.iter().map(|(slot, weapon)| (*slot, weapon))
    }

    /// Патронов в магазине текущего оружия
    pub fn loaded_ammo(&self) -> Option<u32> {
        self.current_weapon().map(WeaponState::clip_size)
    }

    /// Резерв под тип патронов текущего оружия
    pub fn remaining_ammo(&self, ammo: &AmmoStore) -> Option<u32> {
        self.current_weapon()
            .map(|weapon| ammo.reserve(weapon.runtime().ammo_type))
    }

    pub fn current_weapon_name(&self) -> Option<&str> {
        self.current_weapon()
            .map(|weapon| weapon.data().display_name.as_str())
    }

    // ========================================================================
    // Swap
    // ========================================================================

    /// SwapWeapon(target): no-op для текущего или пустого слота.
    pub fn swap_weapon(&mut self, target: usize, ctx: &mut WeaponContext) -> SwapOutcome {
        if target == self.current_slot || !self.slots.contains_key(&target) {
            return SwapOutcome::Ignored;
        }

        if !self.swap_pending {
            let current_slot = self.current_slot;
            if let Some(current) = self.slots.get_mut(&current_slot) {
                if let Some(duration) = current.data().cues.unequip {
                    current.suppress_fire(ctx);
                    self.swap_pending = true;
                    self.target_slot = target;

                    let duration = duration.max(0.0);
                    ctx.timers
                        .set(TimerKey::character(TimerTag::Unequip), duration as f64, None);
                    ctx.cues.push(WeaponCue::Unequip {
                        slot: current_slot,
                        duration,
                    });
                    log(&format!(
                        "Inventory: unequip slot {} → {} ({:.2}s)",
                        current_slot, target, duration
                    ));
                    return SwapOutcome::Pending;
                }
            }
        }

        self.equip_slot(target, ctx);
        SwapOutcome::Swapped
    }

    /// ScrollWeapon: value < 0 → следующий слот, иначе предыдущий (с wrap).
    pub fn scroll_weapon(&mut self, value: f32, ctx: &mut WeaponContext) -> SwapOutcome {
        let count = self.number_of_slots;
        if count == 0 {
            return SwapOutcome::Ignored;
        }

        let target = if value < 0.0 {
            (self.current_slot + 1) % count
        } else {
            (self.current_slot + count - 1) % count
        };

        if !self.swap_pending {
            return self.swap_weapon(target, ctx);
        }
        match self.swap_behaviour {
            WeaponSwapBehaviour::UseNewValue => {
                self.target_slot = target;
                SwapOutcome::Pending
            }
            WeaponSwapBehaviour::Ignore => SwapOutcome::Ignored,
        }
    }

    /// Unequip анимация закончилась: довести свап до target
    pub fn unequip_return(&mut self, ctx: &mut WeaponContext) -> SwapOutcome {
        if !self.swap_pending {
            return SwapOutcome::Ignored;
        }

        let target = self.target_slot;
        if target == self.current_slot || !self.slots.contains_key(&target) {
            // Retarget вернул на текущий слот: оружие остаётся в руках
            self.swap_pending = false;
            ctx.timers.clear(TimerKey::character(TimerTag::Unequip));
            if let Some(current) = self.current_weapon_mut() {
                current.set_can_fire(true);
            }
            return SwapOutcome::Cancelled;
        }

        self.swap_weapon(target, ctx)
    }

    /// Немедленная смена активного слота
    fn equip_slot(&mut self, slot: usize, ctx: &mut WeaponContext) {
        ctx.timers.clear(TimerKey::character(TimerTag::Unequip));
        self.swap_pending = false;

        if self.current_slot != slot {
            if let Some(previous) = self.slots.get_mut(&self.current_slot) {
                previous.deactivate(ctx);
            }
        }
        self.current_slot = slot;

        if let Some(weapon) = self.slots.get_mut(&slot) {
            weapon.activate();
            ctx.cues.push(WeaponCue::Equip {
                slot,
                duration: weapon.data().cues.equip,
            });
            log(&format!("Inventory: equipped slot {} ({})", slot, weapon.data().key));
        }
    }

    // ========================================================================
    // Spawn / pickup
    // ========================================================================

    /// Создать экземпляр в слоте и сделать слот активным.
    ///
    /// Если слот активный и занят, старое оружие уничтожается; с
    /// `spawn_pickup` оно возвращается как `WeaponDrop` перед камерой.
    pub fn spawn_weapon(
        &mut self,
        request: SpawnRequest,
        catalog: &WeaponCatalog,
        ctx: &mut WeaponContext,
        eye: Vec3,
    ) -> Result<Option<WeaponDrop>, SpawnRejected> {
        if request.slot >= self.number_of_slots {
            log_warning(&format!(
                "Inventory: slot {} вне диапазона 0..{}",
                request.slot, self.number_of_slots
            ));
            return Err(SpawnRejected::SlotOutOfRange(request.slot));
        }
        let Some(resolved) = catalog.resolve(&request.runtime.weapon_key, &request.runtime.attachments)
        else {
            log_warning(&format!(
                "Inventory: оружие '{}' не найдено в каталоге",
                request.runtime.weapon_key
            ));
            return Err(SpawnRejected::UnknownWeapon(request.runtime.weapon_key));
        };

        let mut dropped = None;
        if let Some(mut outgoing) = self.slots.remove(&request.slot) {
            outgoing.deactivate(ctx);
            ctx.timers.clear_owner(TimerOwner::Weapon(outgoing.id()));

            if request.spawn_pickup && request.slot == self.current_slot {
                let transform = request.static_transform.unwrap_or_else(|| {
                    Transform::from_translation(eye + ctx.view.forward() * self.weapon_spawn_distance)
                });
                ctx.cues.push(WeaponCue::Dropped {
                    weapon_key: outgoing.data().key.clone(),
                });
                dropped = Some(WeaponDrop {
                    pickup: WeaponPickup {
                        runtime: outgoing.snapshot(),
                        is_static: request.static_transform.is_some(),
                        runtime_spawned: true,
                    },
                    transform,
                });
            }
        }

        let id = WeaponId(self.next_weapon_id);
        self.next_weapon_id += 1;
        let weapon = WeaponState::new(id, resolved, request.runtime);
        log(&format!(
            "Inventory: spawned {:?} '{}' in slot {}",
            id,
            weapon.data().key,
            request.slot
        ));
        self.slots.insert(request.slot, weapon);
        self.equip_slot(request.slot, ctx);

        Ok(dropped)
    }

    /// Стартовое оружие по слотам (без pickup)
    pub fn spawn_starters(
        &mut self,
        starters: &[Option<StarterWeapon>],
        catalog: &WeaponCatalog,
        ctx: &mut WeaponContext,
        eye: Vec3,
    ) {
        for slot in 0..self.number_of_slots {
            let Some(Some(starter)) = starters.get(slot) else {
                continue;
            };
            let Some(runtime) = catalog.fresh_runtime(&starter.weapon_key, &starter.attachments) else {
                log_error(&format!(
                    "Inventory: starter '{}' для слота {} не найден",
                    starter.weapon_key, slot
                ));
                continue;
            };
            // Отказ уже залогирован в spawn_weapon
            let _ = self.spawn_weapon(SpawnRequest::new(runtime, slot), catalog, ctx, eye);
        }
    }

    /// Подобрать pickup: первый пустой слот, иначе замена текущего с выбросом
    ///
    /// `Err` → оружие не взято, pickup должен остаться в мире.
    pub fn pick_up(
        &mut self,
        pickup: WeaponPickup,
        catalog: &WeaponCatalog,
        ctx: &mut WeaponContext,
        eye: Vec3,
    ) -> Result<Option<WeaponDrop>, SpawnRejected> {
        let slot = (0..self.number_of_slots)
            .find(|slot| !self.slots.contains_key(slot))
            .unwrap_or(self.current_slot);

        self.spawn_weapon(
            SpawnRequest::new(pickup.runtime, slot).dropping_current(),
            catalog,
            ctx,
            eye,
        )
    }

    // ========================================================================
    // Passthrough
    // ========================================================================

    /// Reload текущего оружия + политика ReloadFailedBehaviour
    pub fn reload(&mut self, ctx: &mut WeaponContext) -> bool {
        let behaviour = self.reload_failed_behaviour;
        let Some(weapon) = self.current_weapon_mut() else {
            return false;
        };
        if weapon.reload(ctx) {
            return true;
        }

        match behaviour {
            ReloadFailedBehaviour::Retry | ReloadFailedBehaviour::Ignore => {
                log(&format!("Inventory: reload {:?} не выполнен", weapon.id()));
            }
            ReloadFailedBehaviour::ChangeState | ReloadFailedBehaviour::HandleExternally => {
                ctx.cues.push(WeaponCue::ReloadFailed);
            }
        }
        false
    }

    pub fn inspect(&self, ctx: &mut WeaponContext) -> bool {
        let Some(duration) = self.current_weapon().and_then(|weapon| weapon.data().cues.inspect) else {
            return false;
        };
        ctx.cues.push(WeaponCue::Inspect { duration });
        true
    }
}
