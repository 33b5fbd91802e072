//! TimerQueue - отложенные callbacks для weapon/character state machines
//!
//! # Архитектура
//!
//! - Min-heap по времени срабатывания (BinaryHeap + обратный Ord)
//! - Ключ таймера = (owner, tag): максимум один активный таймер на ключ
//! - `set` на уже активный ключ перевзводит таймер (старая запись в heap
//!   становится stale через generation и пропускается при pop)
//! - Время = локальные секунды (f64), двигается только через `pop_due`/`settle`
//!
//! # Использование
//!
//! ```ignore
//! let horizon = timers.now() + dt;
//! while let Some(key) = timers.pop_due(horizon) {
//!     dispatch(key); // callback может ставить/снимать другие таймеры
//! }
//! timers.settle(horizon);
//! ```

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

/// Погрешность сравнения времени (накопленная ошибка f64 при шаге 1/60)
const TIME_EPSILON: f64 = 1e-6;

/// Stable ID экземпляра оружия (выдаётся InventoryManager при spawn)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WeaponId(pub u32);

/// Владелец таймера
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerOwner {
    Weapon(WeaponId),
    Character,
}

/// Назначение таймера
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerTag {
    /// Интервал выстрела (repeat для automatic)
    ShotDelay,
    /// Завершение перезарядки → UpdateAmmo
    Reloading,
    /// Ожидание анимации выстрела → EnableFire
    AnimationWait,
    /// Anti-spam cooldown → ReadyToFire
    SpamFirePrevention,
    /// Завершение unequip анимации → UnequipReturn
    Unequip,
    /// Отложенный push can_fire из movement state
    WaitForAnim,
    SlideStop,
    SlideCooldown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerKey {
    pub owner: TimerOwner,
    pub tag: TimerTag,
}

impl TimerKey {
    pub fn weapon(id: WeaponId, tag: TimerTag) -> Self {
        Self { owner: TimerOwner::Weapon(id), tag }
    }

    pub fn character(tag: TimerTag) -> Self {
        Self { owner: TimerOwner::Character, tag }
    }
}

#[derive(Debug, Clone, Copy)]
struct ActiveTimer {
    due: f64,
    repeat: Option<f64>,
    generation: u64,
}

#[derive(Debug)]
struct Scheduled {
    due: f64,
    seq: u64,
    generation: u64,
    key: TimerKey,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    // Обратный порядок: BinaryHeap - max-heap, нам нужен самый ранний due сверху.
    // При равном due раньше срабатывает тот, кого поставили раньше (seq).
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .total_cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Очередь отложенных callbacks одного игрока
#[derive(Debug, Default)]
pub struct TimerQueue {
    now: f64,
    heap: BinaryHeap<Scheduled>,
    active: HashMap<TimerKey, ActiveTimer>,
    next_generation: u64,
    next_seq: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Текущее время очереди (секунды с создания)
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Взвести таймер через `delay` секунд; `repeat` → периодический.
    ///
    /// Повторный `set` того же ключа заменяет таймер (не дублирует).
    pub fn set(&mut self, key: TimerKey, delay: f64, repeat: Option<f64>) {
        let due = self.now + delay.max(0.0);
        self.set_at(key, due, repeat);
    }

    /// Взвести таймер на абсолютное время (не раньше `now`)
    pub fn set_at(&mut self, key: TimerKey, due: f64, repeat: Option<f64>) {
        let due = due.max(self.now);
        // Повтор с нулевым периодом зациклил бы pop_due
        let repeat = repeat.filter(|period| *period > TIME_EPSILON);

        self.next_generation += 1;
        let generation = self.next_generation;
        self.active.insert(key, ActiveTimer { due, repeat, generation });
        self.push(key, due, generation);
    }

    pub fn clear(&mut self, key: TimerKey) {
        self.active.remove(&key);
    }

    /// Снять все таймеры владельца (оружие уничтожено / выброшено)
    pub fn clear_owner(&mut self, owner: TimerOwner) {
        self.active.retain(|key, _| key.owner != owner);
    }

    pub fn is_active(&self, key: TimerKey) -> bool {
        self.active.contains_key(&key)
    }

    /// Абсолютное время срабатывания активного таймера
    pub fn due(&self, key: TimerKey) -> Option<f64> {
        self.active.get(&key).map(|timer| timer.due)
    }

    /// Сколько осталось до срабатывания (None если таймер не активен)
    pub fn remaining(&self, key: TimerKey) -> Option<f64> {
        self.due(key).map(|due| (due - self.now).max(0.0))
    }

    /// Достать следующий таймер с due ≤ horizon.
    ///
    /// Двигает `now` на время срабатывания. Периодический таймер
    /// перевзводится до возврата ключа, так что callback может его снять.
    pub fn pop_due(&mut self, horizon: f64) -> Option<TimerKey> {
        loop {
            let top = self.heap.peek()?;
            if top.due > horizon + TIME_EPSILON {
                return None;
            }
            let scheduled = self.heap.pop()?;

            // stale запись (таймер снят или перевзведён)
            let Some(timer) = self.active.get(&scheduled.key).copied() else {
                continue;
            };
            if timer.generation != scheduled.generation {
                continue;
            }

            self.now = self.now.max(scheduled.due);

            match timer.repeat {
                Some(period) => {
                    let next_due = scheduled.due + period;
                    self.active.insert(
                        scheduled.key,
                        ActiveTimer { due: next_due, ..timer },
                    );
                    self.push(scheduled.key, next_due, timer.generation);
                }
                None => {
                    self.active.remove(&scheduled.key);
                }
            }

            return Some(scheduled.key);
        }
    }

    /// Закрыть тик: время = horizon (после того как все due таймеры разобраны)
    pub fn settle(&mut self, horizon: f64) {
        self.now = self.now.max(horizon);
    }

    fn push(&mut self, key: TimerKey, due: f64, generation: u64) {
        self.next_seq += 1;
        self.heap.push(Scheduled {
            due,
            seq: self.next_seq,
            generation,
            key,
        });
    }
}
