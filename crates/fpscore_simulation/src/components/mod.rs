//! ECS Components общие для всех доменов
//!
//! Организация:
//! - actor: живые цели (Health, HitSphere)
//! - player: player marker + сетевой идентификатор (Player, NetId)
//! - view: направление взгляда (ViewRotation)

pub mod actor;
pub mod player;
pub mod view;

// Re-exports для удобного импорта
pub use actor::*;
pub use player::*;
pub use view::*;
