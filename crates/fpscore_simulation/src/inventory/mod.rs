//! Inventory domain - слоты оружия, swap state machine, spawn/pickup/drop
//!
//! - manager: InventoryManager (владеет экземплярами WeaponState по слотам)
//! - pickup: StarterWeapon / WeaponPickup / WeaponDrop

pub mod manager;
pub mod pickup;


pub use manager::*;
pub use pickup::*;
