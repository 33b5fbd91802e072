//! Weapon domain - шаблоны, каталог, отдача и state machine экземпляра
//!
//! - data: WeaponStaticData / AttachmentData / WeaponRuntimeData
//! - catalog: WeaponCatalog (immutable lookup, RON)
//! - recoil: RecoilCurve / Timeline / RecoilEngine
//! - hitscan: HitScan контракт + SphereHitScan
//! - cues: WeaponCue (cosmetic notifications)
//! - state: WeaponState (fire / reload / anti-spam)

pub mod catalog;
pub mod cues;
pub mod data;
pub mod hitscan;
pub mod recoil;
pub mod state;


pub use catalog::*;
pub use cues::*;
pub use data::*;
pub use hitscan::*;
pub use recoil::*;
pub use state::*;
