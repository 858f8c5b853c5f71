//! Headless BRAWLER simulation
//!
//! Runs a Bevy App without a renderer: two fighters trading scripted
//! blows, mostly as a determinism smoke run.

use bevy::prelude::*;
use brawler_simulation::{create_headless_app, spawn_fighter, InputSnapshot, SimulationPlugin};

fn main() {
    let seed = 42;
    println!("Starting BRAWLER headless simulation (seed: {})", seed);

    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin);

    let left = spawn_fighter(&mut app.world_mut().commands(), Vec3::new(0.0, 0.0, 0.0), 1);
    let right = spawn_fighter(&mut app.world_mut().commands(), Vec3::new(0.0, 0.0, 1.2), 2);

    // Face each other
    app.update();
    if let Some(mut facing) = app.world_mut().get_mut::<brawler_simulation::Facing>(right) {
        facing.forward = -Vec3::Z;
    }

    // 1000 ticks, the left fighter mashes attack every half second
    for tick in 0..1000 {
        if tick % 30 == 0 {
            if let Some(mut input) = app.world_mut().get_mut::<InputSnapshot>(left) {
                input.attack_pressed = true;
            }
        }
        app.update();

        if tick % 100 == 0 {
            let entity_count = app.world().entities().len();
            println!("Tick {}: {} entities", tick, entity_count);
        }
    }

    println!("Simulation complete!");
}
