//! Headless демо FPS core
//!
//! Игрок с rifle + pistol стреляет по манекену, перезаряжается и свапает
//! оружие. Каждый `app.update()` - один fixed тик (60Hz).

use bevy::prelude::*;
use fpscore_simulation::character::{GroundHeight, EYE_HEIGHT};
use fpscore_simulation::net::EventChannel;
use fpscore_simulation::{
    create_stepped_app, log_info, run_ticks, spawn_player, AmmoStore, AmmoType, CoreSettings, Health,
    HitSphere, InputAction, MovementConfig, NetId, PlayerAction, PlayerCharacter, StarterWeapon,
    WeaponCatalog,
};

const PLAYER: NetId = NetId(1);
const DUMMY: NetId = NetId(2);

fn main() {
    let seed = 42;
    println!("Starting FPS core headless simulation (seed: {})", seed);

    let mut app = create_stepped_app(seed);
    app.insert_resource(GroundHeight(0.0));
    spawn_scene(&mut app);

    let script: [(u32, PlayerAction); 7] = [
        (1, PlayerAction::FireStart),
        (20, PlayerAction::FireStop),
        (30, PlayerAction::Reload),
        (200, PlayerAction::SwapPrimary),
        (260, PlayerAction::FireStart),
        (261, PlayerAction::FireStop),
        (300, PlayerAction::Inspect),
    ];

    let mut cue_count = 0usize;
    for tick in 1..=400u32 {
        for (_, action) in script.iter().filter(|(at, _)| *at == tick) {
            app.world_mut().send_event(InputAction {
                net_id: PLAYER,
                action: *action,
            });
        }
        run_ticks(&mut app, 1);

        cue_count += app.world_mut().resource_mut::<EventChannel>().take_outgoing().len();

        if tick % 100 == 0 {
            print_hud(&mut app, tick);
        }
    }

    let world = app.world_mut();
    let mut dummies = world.query::<(&NetId, &Health)>();
    for (net_id, health) in dummies.iter(world) {
        if *net_id == DUMMY {
            println!("Dummy health: {:.1}/{:.1}", health.current, health.max);
        }
    }
    println!("Cues emitted: {}", cue_count);
    println!("Simulation complete!");
}

fn spawn_scene(app: &mut App) {
    let settings = app.world().resource::<CoreSettings>().clone();
    let catalog = app.world().resource::<WeaponCatalog>().clone();
    let config = app.world().resource::<MovementConfig>().clone();

    let ammo = AmmoStore::new()
        .with(AmmoType::Rifle, 90)
        .with(AmmoType::Pistol, 36);
    // Последний стартовый слот активен: rifle в руках
    let starters = [Some(StarterWeapon::new("pistol")), Some(StarterWeapon::new("rifle"))];
    let character = PlayerCharacter::with_starters(&settings, ammo, &starters, &catalog, &config);
    log_info(&format!("Player HUD: {:?}", character.hud()));

    let world = app.world_mut();
    {
        let mut commands = world.commands();
        spawn_player(&mut commands, character, PLAYER, Transform::default());
        commands.spawn((
            DUMMY,
            Transform::from_xyz(0.0, EYE_HEIGHT, -15.0),
            Health::new(500.0),
            HitSphere::body(1.0),
        ));
    }
    world.flush();
}

fn print_hud(app: &mut App, tick: u32) {
    let world = app.world_mut();
    let mut players = world.query::<(&NetId, &PlayerCharacter)>();
    for (net_id, character) in players.iter(world) {
        let hud = character.hud();
        println!(
            "Tick {}: {:?} slot {} '{}' ammo {}/{} movement {:?}",
            tick,
            net_id,
            hud.slot,
            hud.weapon_name.unwrap_or_default(),
            hud.loaded_ammo.unwrap_or(0),
            hud.remaining_ammo.unwrap_or(0),
            hud.movement
        );
    }
}
