//! Lifecycle integration: character load/unload, costume swaps, dependency
//! propagation into weapon trees, save/restore.
//!
//! Runs the full plugin stack headless and asserts on component state
//! after stepping the fixed schedule.

use bevy::prelude::*;
use skyrend_simulation::character::SetCharacterCostumeIntent;
use skyrend_simulation::costume::WeaponCostume;
use skyrend_simulation::save::ActorSaveData;
use skyrend_simulation::weapon::{
    AkimboWeapon, SetWeaponCostumeIntent, SingleWeapon, SwitchWeaponIntent, WeaponKind,
    WeaponSize, WeaponUsage,
};
use skyrend_simulation::*;

fn create_sim_app() -> App {
    let mut app = create_headless_app();
    app.add_plugins(SimulationPlugin);
    app.update(); // prime the clock
    app
}

fn step(app: &mut App, ticks: usize) {
    for _ in 0..ticks {
        app.update();
    }
}

fn character_data() -> CharacterData {
    let mut data = CharacterData::new("Wanderer", "res://actors/wanderer_rig.tscn");
    data.base_costume = Some(CharacterCostume::new(
        "Wanderer Garb",
        "res://actors/wanderer_garb.tscn",
    ));
    data
}

fn weapon_data(name: &str) -> WeaponData {
    let mut data = WeaponData::new(
        name,
        WeaponKind::Sword,
        WeaponUsage::Slash,
        WeaponSize::OneHanded,
        2,
    );
    data.base_costume = Some(WeaponCostume::new(name, format!("res://weapons/{name}.tscn")));
    data
}

/// Actor with one weapon slot; the character arrives via intent.
fn spawn_armed_actor(app: &mut App) -> Entity {
    let mut inventory = WeaponInventory::new();
    inventory.add_weapon(weapon_data("ember_sword"), None);

    let actor = app
        .world_mut()
        .spawn((
            Actor::named("Wanderer"),
            Transform::from_translation(Vec3::ZERO),
            inventory,
        ))
        .id();

    app.world_mut().send_event(SetCharacterIntent {
        entity: actor,
        data: Some(character_data()),
        costume: None,
    });
    actor
}

#[test]
fn test_character_load_propagates_skeleton_into_weapons() {
    let mut app = create_sim_app();
    let actor = spawn_armed_actor(&mut app);

    step(&mut app, 2);

    let character = app.world().get::<character::Character>(actor).unwrap();
    assert!(character.is_loaded());
    assert!(character.active_skeleton().is_some());
    assert!(character.model().is_some());

    let inventory = app.world().get::<WeaponInventory>(actor).unwrap();
    assert!(inventory.skeleton().is_some());
    assert!(inventory.weapon_at(0).unwrap().is_loaded());
}

#[test]
fn test_character_removal_unloads_weapons() {
    let mut app = create_sim_app();
    let actor = spawn_armed_actor(&mut app);
    step(&mut app, 2);

    app.world_mut().send_event(SetCharacterIntent {
        entity: actor,
        data: None,
        costume: None,
    });
    step(&mut app, 2);

    assert!(app.world().get::<character::Character>(actor).is_none());
    let inventory = app.world().get::<WeaponInventory>(actor).unwrap();
    assert!(inventory.skeleton().is_none());
    assert!(!inventory.weapon_at(0).unwrap().is_loaded());
}

#[test]
fn test_weapon_costume_swap_replaces_model() {
    let mut app = create_sim_app();
    let actor = spawn_armed_actor(&mut app);
    step(&mut app, 2);

    app.world_mut().send_event(SetWeaponCostumeIntent {
        entity: actor,
        index: 0,
        costume: Some(WeaponCostume::new("Frost", "res://weapons/frost_sword.tscn")),
    });
    step(&mut app, 2);

    let inventory = app.world().get::<WeaponInventory>(actor).unwrap();
    let Weapon::Single(weapon) = inventory.weapon_at(0).unwrap() else {
        panic!("expected single weapon");
    };
    assert!(weapon.is_loaded());
    assert_eq!(
        weapon.model().unwrap().scene_path,
        "res://weapons/frost_sword.tscn"
    );
}

#[test]
fn test_unfinished_art_stays_unloaded_until_costume_arrives() {
    let mut app = create_sim_app();

    let mut bare = weapon_data("prototype");
    bare.base_costume = None;

    let mut inventory = WeaponInventory::new();
    inventory.add_weapon(bare, None);
    let actor = app
        .world_mut()
        .spawn((Actor::named("Tester"), Transform::default(), inventory))
        .id();
    app.world_mut().send_event(SetCharacterIntent {
        entity: actor,
        data: Some(character_data()),
        costume: None,
    });
    step(&mut app, 2);

    // Skeleton is there, art is not: recoverable, just unloaded.
    let inventory = app.world().get::<WeaponInventory>(actor).unwrap();
    assert!(inventory.skeleton().is_some());
    assert!(!inventory.weapon_at(0).unwrap().is_loaded());

    app.world_mut().send_event(SetWeaponCostumeIntent {
        entity: actor,
        index: 0,
        costume: Some(WeaponCostume::new("Proto", "res://weapons/proto.tscn")),
    });
    step(&mut app, 2);

    let inventory = app.world().get::<WeaponInventory>(actor).unwrap();
    assert!(inventory.weapon_at(0).unwrap().is_loaded());
}

#[test]
fn test_character_costume_swap_keeps_weapons_loaded() {
    let mut app = create_sim_app();
    let actor = spawn_armed_actor(&mut app);
    step(&mut app, 2);

    app.world_mut().send_event(SetCharacterCostumeIntent {
        entity: actor,
        costume: Some(CharacterCostume::new(
            "Festival Garb",
            "res://actors/festival_garb.tscn",
        )),
    });
    step(&mut app, 2);

    let character = app.world().get::<character::Character>(actor).unwrap();
    assert_eq!(
        character.model().unwrap().scene_path,
        "res://actors/festival_garb.tscn"
    );
    // Art swap does not touch the rig, so weapons stay bound.
    let inventory = app.world().get::<WeaponInventory>(actor).unwrap();
    assert!(inventory.weapon_at(0).unwrap().is_loaded());
}

#[test]
fn test_switch_weapon_enables_only_target() {
    let mut app = create_sim_app();
    let actor = spawn_armed_actor(&mut app);
    {
        let mut inventory = app.world_mut().get_mut::<WeaponInventory>(actor).unwrap();
        inventory.add_weapon(weapon_data("frost_sword"), None);
        inventory.add_weapon(weapon_data("gale_sword"), None);
    }
    step(&mut app, 2);

    app.world_mut().send_event(SwitchWeaponIntent {
        entity: actor,
        index: 2,
    });
    step(&mut app, 1);

    let inventory = app.world().get::<WeaponInventory>(actor).unwrap();
    assert_eq!(inventory.current_index(), 2);
    assert!(!inventory.weapon_at(0).unwrap().is_enabled());
    assert!(!inventory.weapon_at(1).unwrap().is_enabled());
    assert!(inventory.weapon_at(2).unwrap().is_enabled());
}

#[test]
fn test_akimbo_side_mirrors_actor_handedness() {
    let mut app = create_sim_app();

    let akimbo = AkimboWeapon::new(
        Weapon::Single(SingleWeapon::new(weapon_data("main_blade"), None)),
        Some(Weapon::Single(SingleWeapon::new(
            weapon_data("side_blade"),
            None,
        ))),
    );
    let mut inventory = WeaponInventory::new();
    inventory.add_composed(Weapon::Akimbo(akimbo));

    let actor = app
        .world_mut()
        .spawn((Actor::named("Twinblade"), Transform::default(), inventory))
        .id();
    app.world_mut().send_event(SetCharacterIntent {
        entity: actor,
        data: Some(character_data()),
        costume: None,
    });
    step(&mut app, 2);

    let read_hands = |app: &App| {
        let inventory = app.world().get::<WeaponInventory>(actor).unwrap();
        let Weapon::Akimbo(akimbo) = inventory.weapon_at(0).unwrap() else {
            panic!("expected akimbo");
        };
        let Weapon::Single(main) = akimbo.main() else {
            panic!()
        };
        let Weapon::Single(side) = akimbo.side().unwrap() else {
            panic!()
        };
        (main.handedness(), side.handedness())
    };

    let (main, side) = read_hands(&app);
    assert_eq!(main, Handedness::Right);
    assert_eq!(side, Handedness::Left);

    // Flip the actor's handedness: the mirror must follow.
    *app.world_mut().get_mut::<Handedness>(actor).unwrap() = Handedness::Left;
    step(&mut app, 1);

    let (main, side) = read_hands(&app);
    assert_eq!(main, Handedness::Left);
    assert_eq!(side, Handedness::Right);
}

#[test]
fn test_save_restore_round_trip_reloads_on_first_tick() {
    let mut app = create_sim_app();
    let actor = spawn_armed_actor(&mut app);
    step(&mut app, 2);

    let save = {
        let world = app.world();
        ActorSaveData::capture(
            world.get::<Actor>(actor).unwrap(),
            world.get::<EntityStats>(actor).unwrap(),
            world.get::<Health>(actor).unwrap(),
            *world.get::<Handedness>(actor).unwrap(),
            world.get::<character::Character>(actor),
            world.get::<WeaponInventory>(actor),
        )
    };

    let restored = {
        let world = app.world_mut();
        let mut commands = world.commands();
        save.load(&mut commands)
    };
    step(&mut app, 2);

    let character = app.world().get::<character::Character>(restored).unwrap();
    assert!(character.is_loaded());
    let inventory = app.world().get::<WeaponInventory>(restored).unwrap();
    assert_eq!(inventory.len(), 1);
    assert!(inventory.weapon_at(0).unwrap().is_loaded());
}
