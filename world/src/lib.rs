#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Specter Defence.
//!
//! The world is the only place state changes. Every mutation arrives as a
//! [`Command`] through [`apply`], and every outcome leaves as an [`Event`].
//! Systems observe the world exclusively through the [`query`] module.

mod commands;
mod damage;
mod field;
mod ledger;
mod registry;
mod stage;
mod status;

use std::{collections::BTreeSet, time::Duration};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use specter_defence_core::{
    Command, CommandError, CommandKind, Event, GuardianClass, RunPhase, SimulationConfig,
    SpecterKind, RNG_STREAM_WORLD,
};

use crate::{ledger::Ledger, registry::Registry, stage::StageState};

/// Represents the authoritative Specter Defence world state.
#[derive(Debug)]
pub struct World {
    config: SimulationConfig,
    phase: RunPhase,
    now: Duration,
    last_dt: Duration,
    ledger: Ledger,
    registry: Registry,
    stage: StageState,
    freeze_until: Option<Duration>,
    bestiary: BTreeSet<SpecterKind>,
    unlocked: BTreeSet<GuardianClass>,
    rng: ChaCha8Rng,
}

impl World {
    /// Creates a world in its initial, not yet started state.
    #[must_use]
    pub fn new(config: SimulationConfig) -> Self {
        let ledger = Ledger::new(&config.economy, &config.ledger, config.bonuses.clone());
        let registry = Registry::new(&config.field);
        let rng = ChaCha8Rng::seed_from_u64(config.stream_seed(RNG_STREAM_WORLD));
        Self {
            phase: RunPhase::NotStarted,
            now: Duration::ZERO,
            last_dt: Duration::ZERO,
            ledger,
            registry,
            stage: StageState::new(),
            freeze_until: None,
            bestiary: BTreeSet::new(),
            unlocked: BTreeSet::new(),
            rng,
            config,
        }
    }
}

fn report(command: CommandKind, result: Result<Event, CommandError>, out: &mut Vec<Event>) {
    match result {
        Ok(event) => out.push(event),
        Err(reason) => {
            tracing::debug!(
                target: "specter_defence::world",
                ?command,
                %reason,
                "command.rejected"
            );
            out.push(Event::CommandRejected { command, reason });
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Start => {
            if world.phase == RunPhase::NotStarted {
                world.phase = RunPhase::Running;
                out_events.push(Event::RunStarted);
            }
        }
        Command::Pause => {
            if world.phase == RunPhase::Running {
                world.phase = RunPhase::Paused;
                out_events.push(Event::RunPaused);
            }
        }
        Command::Resume => {
            if world.phase == RunPhase::Paused {
                world.phase = RunPhase::Running;
                out_events.push(Event::RunResumed);
            }
        }
        Command::Reset => {
            *world = World::new(world.config.clone());
            out_events.push(Event::RunReset);
        }
        Command::Tick { dt } => {
            if world.phase != RunPhase::Running {
                return;
            }
            world.now = world.now.saturating_add(dt);
            world.last_dt = dt;
            out_events.push(Event::TimeAdvanced { dt, now: world.now });
        }
        Command::RefreshStatuses => world.refresh_statuses(out_events),
        Command::ApplyBuffs { sheets } => {
            for index in 0..world.registry.guardians.len() {
                let id = world.registry.guardians[index].id;
                let sheet = sheets
                    .iter()
                    .find(|sheet| sheet.guardian == id)
                    .copied()
                    .unwrap_or_else(|| world.baseline_buffs(id));
                world.registry.guardians[index].buffs = sheet;
            }
        }
        Command::AdvanceGroundEffects => world.advance_ground_effects(),
        Command::BeginStage { stage, total } => {
            let ends_at = world.now + world.config.waves.countdown();
            match world.stage.begin(stage, total, ends_at) {
                Ok(()) => {
                    out_events.push(Event::StageAdvanced { stage });
                    out_events.push(Event::CountdownStarted {
                        stage,
                        total,
                        ends_at,
                    });
                }
                Err(reason) => report(CommandKind::Stage, Err(reason), out_events),
            }
        }
        Command::OpenSpawning => {
            let stage = world.stage.stage();
            let result = world
                .stage
                .open()
                .map(|()| Event::SpawningOpened { stage });
            report(CommandKind::Stage, result, out_events);
        }
        Command::SpawnEnemy(order) => {
            let _ = world.spawn_enemy(order, out_events);
        }
        Command::ClearStage => {
            let live = world.registry.enemies.len();
            let result = world
                .stage
                .clear(live)
                .map(|stage| Event::StageCleared { stage });
            report(CommandKind::Stage, result, out_events);
        }
        Command::AdvanceEnemies => world.advance_enemies(out_events),
        Command::AdvanceSummons => world.advance_summons(out_events),
        Command::ResolveProjectiles => world.resolve_projectiles(out_events),
        Command::ApplyHit(plan) => world.apply_hit(plan, out_events),
        Command::FireProjectile { guardian, target } => {
            let result = world.fire_projectile(guardian, target);
            report(CommandKind::Fire, result, out_events);
        }
        Command::EvaluateTerminal => {
            if world.phase == RunPhase::Running && world.ledger.corruption_maxed() {
                world.phase = RunPhase::Ended;
                let stage = world.stage.stage();
                let corruption = world.ledger.corruption();
                tracing::info!(
                    target: "specter_defence::world",
                    stage,
                    corruption,
                    "run.ended"
                );
                out_events.push(Event::RunEnded { stage, corruption });
            }
        }
        Command::SummonGuardian { slot } => {
            let result = world.summon_guardian(slot);
            report(CommandKind::Summon, result, out_events);
        }
        Command::PromoteGuardian { guardian, class } => {
            let result = world.promote_guardian(guardian, class);
            report(CommandKind::Promote, result, out_events);
        }
        Command::SellGuardian { guardian } => {
            let result = world.sell_guardian(guardian);
            report(CommandKind::Sell, result, out_events);
        }
        Command::MoveGuardian { guardian, slot } => {
            let result = world.move_guardian(guardian, slot);
            report(CommandKind::Move, result, out_events);
        }
        Command::SetShrineDemolishing {
            guardian,
            demolishing,
        } => {
            let result = world.set_shrine_demolishing(guardian, demolishing);
            report(CommandKind::Shrine, result, out_events);
        }
        Command::SetGlobalBonuses(bonuses) => world.ledger.set_bonuses(bonuses),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use specter_defence_core::{
        EnemySnapshot, EnemyView, GroundEffectSnapshot, GuardianSnapshot, GuardianView,
        LedgerSnapshot, ProgressSnapshot, RunPhase, SimulationConfig, SlotSnapshot, SpecterKind,
        StageSnapshot, SummonSnapshot,
    };

    use super::World;

    /// Lifecycle phase of the run.
    #[must_use]
    pub fn run_phase(world: &World) -> RunPhase {
        world.phase
    }

    /// Current value of the simulation clock.
    #[must_use]
    pub fn now(world: &World) -> Duration {
        world.now
    }

    /// Duration of the most recent tick.
    #[must_use]
    pub fn last_dt(world: &World) -> Duration {
        world.last_dt
    }

    /// Configuration the world was created with.
    #[must_use]
    pub fn config(world: &World) -> &SimulationConfig {
        &world.config
    }

    /// End of the active time freeze, if any.
    #[must_use]
    pub fn time_freeze(world: &World) -> Option<Duration> {
        world.freeze_until.filter(|until| world.now < *until)
    }

    /// Captures the resource ledger.
    #[must_use]
    pub fn ledger(world: &World) -> LedgerSnapshot {
        world.ledger.snapshot()
    }

    /// Captures the stage state.
    #[must_use]
    pub fn stage(world: &World) -> StageSnapshot {
        world
            .stage
            .snapshot(world.registry.enemies.len(), world.now)
    }

    /// Captures a read-only view of every guardian.
    #[must_use]
    pub fn guardian_view(world: &World) -> GuardianView {
        let now = world.now;
        let snapshots = world
            .registry
            .guardians
            .iter()
            .map(|guardian| {
                let cooldown = guardian.effective_cooldown();
                let elapsed = guardian.cooldown_elapsed(now);
                let cooldown_progress = if cooldown.is_zero() {
                    1.0
                } else {
                    (elapsed.as_secs_f32() / cooldown.as_secs_f32()).min(1.0)
                };
                GuardianSnapshot {
                    id: guardian.id,
                    class: guardian.class,
                    slot: guardian.slot,
                    coord: world.registry.slot_coord(guardian.slot),
                    position: world.registry.guardian_position(guardian),
                    spent: guardian.spent,
                    charges: guardian.charges,
                    buffs: guardian.buffs,
                    effective_range: guardian.effective_range(),
                    effective_cooldown: cooldown,
                    cooldown_progress,
                    ready: guardian.is_ready(now),
                    stunned: guardian.is_stunned(now),
                    frozen: guardian.is_frozen(now),
                    demolishing: guardian.demolishing,
                }
            })
            .collect();
        GuardianView::from_snapshots(snapshots)
    }

    /// Captures a read-only view of every live enemy.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        let now = world.now;
        let snapshots = world
            .registry
            .enemies
            .iter()
            .map(|enemy| EnemySnapshot {
                id: enemy.id,
                kind: enemy.kind,
                position: enemy.position,
                hp: enemy.hp,
                max_hp: enemy.max_hp,
                defense: enemy.defense,
                boss: enemy.is_boss(),
                burning: enemy.is_burning(now),
                silenced: enemy.is_silenced(now),
                slowed: enemy.slowed,
                stealthed: enemy.stealthed,
                boarded: enemy.boarded,
                link: enemy.active_link(now),
                banked: enemy.banked,
            })
            .collect();
        EnemyView::from_snapshots(snapshots)
    }

    /// Describes every lane slot in identifier order.
    #[must_use]
    pub fn slots(world: &World) -> Vec<SlotSnapshot> {
        world
            .registry
            .slots
            .iter()
            .map(|slot| SlotSnapshot {
                id: slot.id,
                coord: slot.coord,
                position: slot.position,
                occupant: slot.occupant,
            })
            .collect()
    }

    /// Describes every friendly summon.
    #[must_use]
    pub fn summons(world: &World) -> Vec<SummonSnapshot> {
        world
            .registry
            .summons
            .iter()
            .map(|summon| SummonSnapshot {
                id: summon.id,
                kind: summon.kind,
                position: summon.position,
                expires_at: summon.expires_at,
            })
            .collect()
    }

    /// Describes every active ground effect.
    #[must_use]
    pub fn ground_effects(world: &World) -> Vec<GroundEffectSnapshot> {
        world
            .registry
            .ground_effects
            .iter()
            .map(|effect| GroundEffectSnapshot {
                kind: effect.kind,
                position: effect.position,
                radius: effect.radius,
                ends_at: effect.ends_at,
            })
            .collect()
    }

    /// Number of shots still in flight.
    #[must_use]
    pub fn projectiles_in_flight(world: &World) -> usize {
        world.registry.projectiles.len()
    }

    /// Species killed at least once this run.
    #[must_use]
    pub fn bestiary(world: &World) -> Vec<SpecterKind> {
        world.bestiary.iter().copied().collect()
    }

    /// Progress handed to persistence collaborators.
    #[must_use]
    pub fn progress(world: &World) -> ProgressSnapshot {
        ProgressSnapshot {
            currency: world.ledger.currency(),
            stage: world.stage.stage(),
            unlocked_classes: world.unlocked.iter().copied().collect(),
            encountered: world.bestiary.iter().copied().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use specter_defence_core::{BuffSheet, GuardianId, StagePhase};

    fn started() -> World {
        let mut world = World::new(SimulationConfig::default());
        let mut events = Vec::new();
        apply(&mut world, Command::Start, &mut events);
        assert_eq!(events, vec![Event::RunStarted]);
        world
    }

    #[test]
    fn ticks_are_ignored_until_started_and_while_paused() {
        let mut world = World::new(SimulationConfig::default());
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(16),
            },
            &mut events,
        );
        assert!(events.is_empty());
        assert_eq!(query::now(&world), Duration::ZERO);

        apply(&mut world, Command::Start, &mut events);
        apply(&mut world, Command::Pause, &mut events);
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(16),
            },
            &mut events,
        );
        assert_eq!(query::now(&world), Duration::ZERO);

        apply(&mut world, Command::Resume, &mut events);
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(16),
            },
            &mut events,
        );
        assert_eq!(query::now(&world), Duration::from_millis(16));
        assert_eq!(
            events,
            vec![
                Event::RunStarted,
                Event::RunPaused,
                Event::RunResumed,
                Event::TimeAdvanced {
                    dt: Duration::from_millis(16),
                    now: Duration::from_millis(16),
                },
            ]
        );
    }

    #[test]
    fn buffs_not_resubmitted_fall_back_to_baseline() {
        let mut world = started();
        let mut events = Vec::new();
        apply(&mut world, Command::SummonGuardian { slot: None }, &mut events);
        let guardian = GuardianId::new(0);

        let mut sheet = BuffSheet::baseline(guardian);
        sheet.range_bonus = 20.0;
        apply(
            &mut world,
            Command::ApplyBuffs {
                sheets: vec![sheet],
            },
            &mut events,
        );
        assert_eq!(
            query::guardian_view(&world).get(guardian).map(|g| g.effective_range),
            Some(190.0)
        );

        apply(&mut world, Command::ApplyBuffs { sheets: Vec::new() }, &mut events);
        assert_eq!(
            query::guardian_view(&world).get(guardian).map(|g| g.effective_range),
            Some(170.0)
        );
    }

    #[test]
    fn stage_commands_follow_the_lifecycle() {
        let mut world = started();
        let mut events = Vec::new();

        apply(&mut world, Command::ClearStage, &mut events);
        apply(&mut world, Command::BeginStage { stage: 1, total: 8 }, &mut events);
        apply(&mut world, Command::OpenSpawning, &mut events);
        apply(&mut world, Command::ClearStage, &mut events);

        assert_eq!(
            events[0],
            Event::CommandRejected {
                command: CommandKind::Stage,
                reason: CommandError::StageUnresolved,
            }
        );
        assert_eq!(events[1], Event::StageAdvanced { stage: 1 });
        assert_eq!(events[3], Event::SpawningOpened { stage: 1 });
        assert_eq!(
            events[4],
            Event::CommandRejected {
                command: CommandKind::Stage,
                reason: CommandError::StageUnresolved,
            }
        );
        assert_eq!(query::stage(&world).phase, StagePhase::Spawning);
    }

    #[test]
    fn maxed_corruption_ends_the_run_and_rejects_commands() {
        let mut world = started();
        let mut events = Vec::new();
        world.ledger.add_corruption(1_000.0);

        apply(&mut world, Command::EvaluateTerminal, &mut events);
        apply(&mut world, Command::SummonGuardian { slot: None }, &mut events);

        assert_eq!(query::run_phase(&world), RunPhase::Ended);
        assert_eq!(
            events,
            vec![
                Event::RunEnded {
                    stage: 0,
                    corruption: 100.0,
                },
                Event::CommandRejected {
                    command: CommandKind::Summon,
                    reason: CommandError::RunOver,
                },
            ]
        );
    }

    #[test]
    fn reset_restores_the_initial_state() {
        let mut world = started();
        let mut events = Vec::new();
        apply(&mut world, Command::SummonGuardian { slot: None }, &mut events);
        apply(&mut world, Command::Reset, &mut events);

        assert_eq!(query::run_phase(&world), RunPhase::NotStarted);
        assert!(query::guardian_view(&world).is_empty());
        assert_eq!(query::ledger(&world).currency, 100);
        assert_eq!(events.last(), Some(&Event::RunReset));
    }
}
