//! Headless SKYREND simulation.
//!
//! Spawns a small demo scene and runs it for a fixed number of ticks:
//! smoke coverage for the full plugin stack without an engine attached.

use bevy::prelude::*;
use skyrend_simulation::costume::WeaponCostume;
use skyrend_simulation::weapon::{AttackData, WeaponKind, WeaponSize, WeaponUsage};
use skyrend_simulation::*;

fn demo_weapon() -> WeaponData {
    let mut data = WeaponData::new(
        "Ember Sword",
        WeaponKind::Sword,
        WeaponUsage::Slash,
        WeaponSize::OneHanded,
        2,
    );
    data.attacks.push(AttackData::new("ember_slash", 0, 15.0));
    data.attacks.push(AttackData::new("ember_riser", 1, 22.0));
    data.base_costume = Some(WeaponCostume::new("Ember", "res://weapons/ember_sword.tscn"));
    data
}

fn demo_character() -> CharacterData {
    let mut data = CharacterData::new("Wanderer", "res://actors/wanderer_rig.tscn");
    data.base_costume = Some(CharacterCostume::new(
        "Wanderer Garb",
        "res://actors/wanderer_garb.tscn",
    ));
    data
}

fn main() {
    println!("Starting SKYREND headless simulation");

    let mut app = create_headless_app();
    app.add_plugins(SimulationPlugin);

    // Warmup tick so the clock is primed before intents go out
    app.update();

    // Demo actor: player-controlled wanderer with one weapon
    let actor = app
        .world_mut()
        .spawn((
            Actor::named("Wanderer"),
            Player,
            Transform::from_translation(Vec3::ZERO),
        ))
        .id();

    app.world_mut().send_event(SetCharacterIntent {
        entity: actor,
        data: Some(demo_character()),
        costume: None,
    });
    app.world_mut().entity_mut(actor).insert({
        let mut inventory = WeaponInventory::new();
        inventory.add_weapon(demo_weapon(), None);
        inventory
    });
    app.world_mut().send_event(SetBehaviourIntent {
        entity: actor,
        request: BehaviourRequest::Biped,
    });

    for tick in 0..600 {
        app.update();

        if tick % 100 == 0 {
            let entity_count = app.world().entities().len();
            println!("Tick {tick}: {entity_count} entities");
        }
    }

    println!("Simulation complete!");
}
