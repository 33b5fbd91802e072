//! Movement domain - тонкий gating слой над локомоцией
//!
//! Содержит:
//! - MovementState (Idle/Walk/Sprint/Crouch/Slide/Vault)
//! - MovementTunables / MovementConfig (скорости + can_fire/can_reload по state)
//! - MovementStateMachine (переходы, push разрешений в оружие, slide таймеры)
//!
//! Геометрия (можно ли встать, vault) - внешняя: сюда приходят только готовые запросы.

pub mod config;
pub mod machine;

pub use config::*;
pub use machine::*;
