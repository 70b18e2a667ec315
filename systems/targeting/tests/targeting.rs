use std::time::Duration;

use specter_defence_core::{
    Command, EnemyId, Event, GuardianTarget, Position, SimulationConfig, SlotId, SpawnOrder,
    SpecterKind,
};
use specter_defence_system_targeting::Targeting;
use specter_defence_world::{self as world, query, World};

fn spawn(world: &mut World, kind: SpecterKind, origin: Position, events: &mut Vec<Event>) {
    world::apply(
        world,
        Command::SpawnEnemy(SpawnOrder {
            kind,
            origin,
            hp_multiplier: 1.0,
            speed_multiplier: 1.0,
            wave_member: false,
        }),
        events,
    );
}

fn prepared_world() -> World {
    let mut config = SimulationConfig::default();
    config.combat.boarding_chance = 0.0;
    let mut world = World::new(config);
    let mut events = Vec::new();
    world::apply(&mut world, Command::Start, &mut events);
    world::apply(
        &mut world,
        Command::SummonGuardian {
            slot: Some(SlotId::new(2)),
        },
        &mut events,
    );

    let anchor = query::slots(&world)[2].position;
    spawn(
        &mut world,
        SpecterKind::Wisp,
        Position::new(20.0, anchor.y - 60.0),
        &mut events,
    );
    spawn(
        &mut world,
        SpecterKind::Shade,
        Position::new(40.0, anchor.y - 20.0),
        &mut events,
    );
    spawn(
        &mut world,
        SpecterKind::Wisp,
        Position::new(20.0, anchor.y + 400.0),
        &mut events,
    );
    world
}

#[test]
fn targets_are_identical_across_identical_worlds() {
    let first = prepared_world();
    let second = prepared_world();
    let mut system = Targeting::new();
    let mut first_targets = Vec::new();
    let mut second_targets = Vec::new();

    system.handle(
        &query::guardian_view(&first),
        &query::enemy_view(&first),
        &mut first_targets,
    );
    system.handle(
        &query::guardian_view(&second),
        &query::enemy_view(&second),
        &mut second_targets,
    );

    assert_eq!(first_targets, second_targets);
    assert_eq!(first_targets.len(), 1);
}

#[test]
fn lead_enemy_in_range_is_selected_and_followed() {
    let mut world = prepared_world();
    let mut system = Targeting::new();
    let mut targets = Vec::new();

    system.handle(
        &query::guardian_view(&world),
        &query::enemy_view(&world),
        &mut targets,
    );
    let initial = targets[0];
    assert_eq!(initial.enemy, EnemyId::new(1));

    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::FireProjectile {
            guardian: initial.guardian,
            target: initial.enemy,
        },
        &mut events,
    );
    assert!(matches!(events.as_slice(), [Event::ProjectileFired { .. }]));

    system.handle(
        &query::guardian_view(&world),
        &query::enemy_view(&world),
        &mut targets,
    );
    assert!(targets.is_empty(), "guardian is cooling down");

    world::apply(
        &mut world,
        Command::Tick {
            dt: Duration::from_secs(1),
        },
        &mut events,
    );
    system.handle(
        &query::guardian_view(&world),
        &query::enemy_view(&world),
        &mut targets,
    );
    assert_eq!(
        targets,
        vec![GuardianTarget {
            guardian: initial.guardian,
            enemy: EnemyId::new(1),
        }]
    );
}
