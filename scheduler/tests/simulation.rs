use std::{cell::RefCell, rc::Rc, time::Duration};

use specter_defence_core::{
    CommandError, Event, GlobalBonuses, GuardianId, ProgressSnapshot, Role, RunPhase,
    SimulationConfig, SlotId, SpecterKind, StagePhase,
};
use specter_defence_scheduler::{
    ProgressStore, PromotionTarget, Simulation, StoreError,
};

const TICK: Duration = Duration::from_millis(50);

#[derive(Clone, Default)]
struct RecordingStore {
    saved: Rc<RefCell<Vec<ProgressSnapshot>>>,
}

impl ProgressStore for RecordingStore {
    fn save(&mut self, progress: &ProgressSnapshot) -> Result<(), StoreError> {
        self.saved.borrow_mut().push(progress.clone());
        Ok(())
    }
}

fn started(config: SimulationConfig) -> Simulation {
    let mut simulation = Simulation::new(config);
    simulation.start();
    simulation
}

#[test]
fn stage_one_releases_only_base_species() {
    let mut simulation = started(SimulationConfig::default());
    let mut spawned = Vec::new();

    'run: for _ in 0..2_000 {
        simulation.step(TICK);
        for event in simulation.drain_events() {
            match event {
                Event::StageAdvanced { stage: 2 } => break 'run,
                Event::EnemySpawned { kind, .. } => spawned.push(kind),
                _ => {}
            }
        }
    }

    assert!(!spawned.is_empty());
    assert!(spawned
        .iter()
        .all(|kind| matches!(kind, SpecterKind::Wisp | SpecterKind::Shade)));
}

#[test]
fn stages_never_advance_before_they_resolve() {
    let mut config = SimulationConfig::default();
    config.ledger.corruption_max = 10_000.0;
    let mut simulation = started(config);
    let mut last_cleared = 0;
    let mut advances = 0;

    for _ in 0..4_000 {
        simulation.step(TICK);
        let stage = simulation.stage();
        if stage.phase == StagePhase::Cleared && stage.stage > 0 {
            assert!(stage.spawned >= stage.total, "cleared with enemies unreleased");
            assert_eq!(stage.live, 0, "cleared with enemies alive");
        }
        for event in simulation.drain_events() {
            match event {
                Event::StageCleared { stage } => last_cleared = stage,
                Event::StageAdvanced { stage } => {
                    assert_eq!(stage, last_cleared + 1, "stage {stage} began early");
                    advances += 1;
                }
                _ => {}
            }
        }
    }

    assert!(advances >= 3, "only {advances} stages began");
}

#[test]
fn speed_bonus_shortens_the_firing_interval() {
    let mut config = SimulationConfig::default();
    config.field.lane_width = 20.0;
    config.bonuses = GlobalBonuses {
        relic_speed: 0.2,
        ..GlobalBonuses::default()
    };
    let mut simulation = started(config);
    let guardian = simulation.summon(Some(SlotId::new(2))).expect("summon");
    let step = Duration::from_millis(10);
    let mut fired_at = Vec::new();

    for _ in 0..3_000 {
        simulation.step(step);
        for event in simulation.drain_events() {
            if let Event::ProjectileFired { guardian: shooter, .. } = event {
                if shooter == guardian {
                    fired_at.push(simulation.now());
                }
            }
        }
    }

    assert!(fired_at.len() >= 3, "guardian fired {} times", fired_at.len());
    let gaps: Vec<Duration> = fired_at.windows(2).map(|pair| pair[1] - pair[0]).collect();
    assert!(gaps.iter().all(|gap| *gap >= Duration::from_micros(833_333)));
    assert!(gaps.iter().any(|gap| *gap < Duration::from_millis(900)));
}

#[test]
fn sell_refunds_and_runs_the_removal_hook() {
    let removed = Rc::new(RefCell::new(Vec::new()));
    let seen = Rc::clone(&removed);
    let mut simulation = Simulation::new(SimulationConfig::default()).with_removal_hook(
        move |guardian| {
            seen.borrow_mut().push(guardian.id);
            Some(SpecterKind::Shade)
        },
    );
    simulation.start();
    let guardian = simulation.summon(Some(SlotId::new(0))).expect("summon");
    let slot_position = simulation.slots()[0].position;
    let _ = simulation.drain_events();

    let refund = simulation.sell(guardian).expect("sell");

    assert_eq!(refund, 35);
    assert_eq!(simulation.ledger().currency, 85);
    assert!(simulation.slots()[0].occupant.is_none());
    assert_eq!(*removed.borrow(), vec![guardian]);
    let replacement = simulation.enemies().iter().next().copied().expect("spawned");
    assert_eq!(replacement.kind, SpecterKind::Shade);
    assert_eq!(replacement.position, slot_position);
    assert_eq!(simulation.stage().spawned, 0);
}

#[test]
fn promotion_saves_progress_with_the_unlocked_class() {
    let store = RecordingStore::default();
    let saved = Rc::clone(&store.saved);
    let mut config = SimulationConfig::default();
    config.economy.starting_currency = 500;
    let mut simulation = Simulation::new(config).with_progress_store(store);
    simulation.start();
    let guardian = simulation.summon(None).expect("summon");

    let class = simulation
        .promote(guardian, PromotionTarget::Role(Some(Role::Attack)))
        .expect("promote");

    assert_eq!(class.role(), Some(Role::Attack));
    assert_eq!(simulation.ledger().currency, 350);
    let saved = saved.borrow();
    let last = saved.last().expect("progress saved");
    assert_eq!(last.unlocked_classes, vec![class]);
    assert_eq!(last.currency, 350);
}

#[test]
fn run_ends_at_max_corruption_and_rejects_further_commands() {
    let store = RecordingStore::default();
    let saved = Rc::clone(&store.saved);
    let mut config = SimulationConfig::default();
    config.ledger.corruption_max = 5.0;
    let mut simulation = Simulation::new(config).with_progress_store(store);
    simulation.start();

    let mut ended = false;
    for _ in 0..4_000 {
        simulation.step(TICK);
        if simulation
            .drain_events()
            .iter()
            .any(|event| matches!(event, Event::RunEnded { .. }))
        {
            ended = true;
            break;
        }
    }

    assert!(ended, "run never ended");
    assert_eq!(simulation.run_phase(), RunPhase::Ended);
    let now = simulation.now();
    simulation.step(TICK);
    assert_eq!(simulation.now(), now);
    assert_eq!(simulation.summon(None), Err(CommandError::RunOver));
    assert_eq!(
        simulation.promote(GuardianId::new(0), PromotionTarget::Role(None)),
        Err(CommandError::RunOver)
    );
    assert!(saved.borrow().len() >= 2, "stage advance and run end persist");
}

#[test]
fn identical_seeds_replay_identically() {
    fn replay() -> Vec<Event> {
        let mut config = SimulationConfig::default();
        config.seed = 0x5eed;
        config.economy.starting_currency = 400;
        let mut simulation = started(config);
        for slot in [1, 2, 6] {
            let _ = simulation.summon(Some(SlotId::new(slot))).expect("summon");
        }
        let mut events = Vec::new();
        for _ in 0..1_500 {
            simulation.step(Duration::from_millis(20));
            events.extend(simulation.drain_events());
        }
        events
    }

    let first = replay();
    let second = replay();
    assert_eq!(first, second);
    assert!(first
        .iter()
        .any(|event| matches!(event, Event::EnemyDied { .. })));
}
