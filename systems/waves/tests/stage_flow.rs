use std::time::Duration;

use specter_defence_core::{Command, Event, SimulationConfig};
use specter_defence_system_waves::{Config, Waves};
use specter_defence_world::{self as world, query, World};

#[test]
fn first_stage_releases_its_total_then_clears_once_the_lane_is_empty() {
    let mut config = SimulationConfig::default();
    config.ledger.corruption_max = 10_000.0;
    let mut waves = Waves::new(Config::from_simulation(&config));
    let mut world = World::new(config);
    let mut events = Vec::new();
    world::apply(&mut world, Command::Start, &mut events);

    let mut commands = Vec::new();
    let mut announced = None;
    let mut spawned = 0;
    let mut cleared = false;

    for _ in 0..4_000 {
        world::apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(50),
            },
            &mut events,
        );
        let ledger = query::ledger(&world);
        waves.handle(
            &query::stage(&world),
            query::now(&world),
            &ledger.bonuses,
            &mut commands,
        );
        for command in commands.drain(..) {
            world::apply(&mut world, command, &mut events);
        }
        world::apply(&mut world, Command::AdvanceEnemies, &mut events);

        for event in events.drain(..) {
            match event {
                Event::CountdownStarted { stage: 1, total, .. } => announced = Some(total),
                Event::EnemySpawned { .. } => spawned += 1,
                Event::StageCleared { stage: 1 } => {
                    assert_eq!(query::stage(&world).live, 0);
                    cleared = true;
                }
                Event::CommandRejected { command, reason } => {
                    panic!("{command:?} rejected: {reason}");
                }
                _ => {}
            }
        }
        if cleared {
            break;
        }
    }

    let total = announced.expect("stage 1 announced");
    assert!((8..=12).contains(&total));
    assert!(cleared, "stage 1 never cleared");
    assert_eq!(spawned, total);
}
