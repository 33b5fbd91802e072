//! FPS gameplay core - weapon / recoil / inventory / movement gating
//!
//! ECS-симуляция на Bevy 0.16 (headless, fixed tick).
//!
//! Слои (снизу вверх):
//! - timers, ammo, weapon (WeaponState + RecoilEngine), movement, inventory
//! - character: PlayerCharacter aggregate + authority системы
//! - net: Command / Event каналы, роутинг по роли, cosmetic replay
//!
//! Service objects (WeaponState, InventoryManager, MovementStateMachine) не
//! знают про ECS: Bevy только раздаёт им команды и шаг времени.

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod ammo;
pub mod character;
pub mod components;
pub mod inventory;
pub mod logger;
pub mod movement;
pub mod net;
pub mod settings;
pub mod timers;
pub mod weapon;

// Re-export базовых типов для удобства
pub use ammo::{AmmoStore, AmmoType};
pub use character::{
    spawn_player, AmmoResupply, CharacterPlugin, Dead, EntityDied, HudState, PlayerAction, PlayerCharacter,
    PlayerCommand, ShotHit, WeaponCueEvent,
};
pub use components::*;
pub use inventory::{InventoryManager, StarterWeapon, SwapOutcome, WeaponPickup};
pub use logger::*;
pub use movement::{MovementConfig, MovementState};
pub use net::{CosmeticEvent, InputAction, NetPlugin, NetRole, ReplicatedView};
pub use settings::CoreSettings;
pub use weapon::{WeaponCatalog, WeaponCue};

/// Фазы fixed тика (конфигурируются цепочкой в SimulationPlugin)
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    /// Роутинг input / приём команд
    Input,
    /// PlayerCommand → персонажи
    Commands,
    /// Таймеры, выстрелы, recovery
    Simulate,
    /// Урон, смерти
    Resolve,
    /// Broadcast / replay cosmetic событий
    Replicate,
}

/// Номер текущего fixed тика (метка для CosmeticEvent)
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulationTick(pub u64);

fn advance_tick(mut tick: ResMut<SimulationTick>) {
    tick.0 += 1;
}

/// Главный plugin симуляции (объединяет все подсистемы)
#[derive(Default)]
pub struct SimulationPlugin {
    pub settings: CoreSettings,
}

impl SimulationPlugin {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            settings: CoreSettings {
                seed,
                ..Default::default()
            },
        }
    }
}

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app
            // Fixed timestep (60Hz по умолчанию)
            .insert_resource(Time::<Fixed>::from_hz(self.settings.tick_hz))
            // Детерминистичный RNG (jitter выстрелов)
            .insert_resource(DeterministicRng::new(self.settings.seed))
            .insert_resource(self.settings.clone())
            // Конфиги: если уже вставлены до plugin - не трогаем
            .init_resource::<WeaponCatalog>()
            .init_resource::<MovementConfig>()
            .init_resource::<NetIdAllocator>()
            .init_resource::<SimulationTick>();

        app.configure_sets(
            FixedUpdate,
            (
                SimulationSet::Input,
                SimulationSet::Commands,
                SimulationSet::Simulate,
                SimulationSet::Resolve,
                SimulationSet::Replicate,
            )
                .chain(),
        );
        app.add_systems(FixedUpdate, advance_tick.before(SimulationSet::Input));

        app.add_plugins((CharacterPlugin, NetPlugin));
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins((MinimalPlugins, SimulationPlugin::with_seed(seed)));

    app
}

/// Headless App, где каждый `app.update()` = ровно один fixed тик
///
/// Первый update только инициализирует часы (нулевой delta), поэтому
/// делаем его здесь.
pub fn create_stepped_app(seed: u64) -> App {
    let mut app = create_headless_app(seed);
    let step = app.world().resource::<Time<Fixed>>().timestep();
    app.insert_resource(TimeUpdateStrategy::ManualDuration(step));
    app.update();

    app
}

/// Прогнать `ticks` fixed тиков stepped App
pub fn run_ticks(app: &mut App, ticks: u32) {
    for _ in 0..ticks {
        app.update();
    }
}

/// Snapshot компонента по NetId (для сравнения детерминизма)
///
/// Entity ID могут отличаться между App, NetId одинаковые.
pub fn world_snapshot<T: Component + std::fmt::Debug>(world: &mut World) -> Vec<u8> {
    let mut query = world.query::<(&NetId, &T)>();
    let mut entries: Vec<_> = query.iter(world).collect();
    entries.sort_by_key(|(net_id, _)| **net_id);

    // Debug формат достаточно стабилен для сравнения в одном билде
    let mut snapshot = Vec::new();
    for (net_id, component) in entries {
        snapshot.extend_from_slice(&net_id.0.to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
