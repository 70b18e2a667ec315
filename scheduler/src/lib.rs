#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Tick driver and command façade for Specter Defence.
//!
//! [`Simulation`] owns the world and every system. One call to
//! [`Simulation::step`] runs the eight tick phases in a fixed order:
//!
//! 1. refresh statuses (including the time-freeze release),
//! 2. recompute buffs,
//! 3. advance ground effects,
//! 4. run the stage orchestrator,
//! 5. advance enemies and resolve escapes,
//! 6. advance summons,
//! 7. resolve due projectiles, then fire every ready guardian,
//! 8. evaluate the terminal condition.
//!
//! Player commands are validated and applied immediately, between steps.

mod store;

use std::{mem, time::Duration};

use specter_defence_core::{
    BuffSheet, Command, CommandError, CommandKind, EnemyId, EnemyView, Event, GlobalBonuses,
    GroundEffectSnapshot, GuardianClass, GuardianId, GuardianSnapshot, GuardianTarget,
    GuardianView, LedgerSnapshot, ProgressSnapshot, RunPhase, SimulationConfig, SlotId,
    SlotSnapshot, SpawnOrder, SpecterKind, StageSnapshot, SummonSnapshot, RNG_STREAM_COMBAT,
    RNG_STREAM_PROMOTION,
};
use specter_defence_system_buffs::BuffPropagation;
use specter_defence_system_combat::Combat;
use specter_defence_system_promotion::Promotion;
use specter_defence_system_targeting::Targeting;
use specter_defence_system_waves::{self as waves, Waves};
use specter_defence_world::{self as world, query, World};

pub use specter_defence_system_promotion::PromotionTarget;
pub use store::{ProgressStore, StoreError};

/// Callback invoked with a sold guardian; returning a species spawns it where the guardian stood.
pub type RemovalHook = Box<dyn FnMut(&GuardianSnapshot) -> Option<SpecterKind>>;

/// Owns the world, the systems and the collaborators of one run.
pub struct Simulation {
    world: World,
    buffs: BuffPropagation,
    targeting: Targeting,
    combat: Combat,
    waves: Waves,
    promotion: Promotion,
    store: Option<Box<dyn ProgressStore>>,
    removal_hook: Option<RemovalHook>,
    events: Vec<Event>,
    scratch: Vec<Event>,
    commands: Vec<Command>,
    sheets: Vec<BuffSheet>,
    targets: Vec<GuardianTarget>,
}

impl Simulation {
    /// Creates a simulation that has not started yet.
    #[must_use]
    pub fn new(config: SimulationConfig) -> Self {
        let (combat, waves, promotion) = seeded_systems(&config);
        Self {
            world: World::new(config),
            buffs: BuffPropagation::new(),
            targeting: Targeting::new(),
            combat,
            waves,
            promotion,
            store: None,
            removal_hook: None,
            events: Vec::new(),
            scratch: Vec::new(),
            commands: Vec::new(),
            sheets: Vec::new(),
            targets: Vec::new(),
        }
    }

    /// Attaches the collaborator that persists progress.
    #[must_use]
    pub fn with_progress_store(mut self, store: impl ProgressStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    /// Attaches the hook invoked whenever a guardian is sold.
    #[must_use]
    pub fn with_removal_hook(
        mut self,
        hook: impl FnMut(&GuardianSnapshot) -> Option<SpecterKind> + 'static,
    ) -> Self {
        self.removal_hook = Some(Box::new(hook));
        self
    }

    /// Starts the run.
    pub fn start(&mut self) {
        self.dispatch(Command::Start);
    }

    /// Suspends the simulation clock.
    pub fn pause(&mut self) {
        self.dispatch(Command::Pause);
    }

    /// Resumes a paused run.
    pub fn resume(&mut self) {
        self.dispatch(Command::Resume);
    }

    /// Returns the world and every random stream to their initial state.
    pub fn reset(&mut self) {
        let (combat, waves, promotion) = seeded_systems(query::config(&self.world));
        self.combat = combat;
        self.waves = waves;
        self.promotion = promotion;
        tracing::info!(target: "specter_defence::scheduler", "simulation.reset");
        self.dispatch(Command::Reset);
    }

    /// Replaces the relic and meta bonuses.
    pub fn set_global_bonuses(&mut self, bonuses: GlobalBonuses) {
        self.dispatch(Command::SetGlobalBonuses(bonuses));
    }

    /// Advances the run by `dt`; a no-op unless the run is running.
    pub fn step(&mut self, dt: Duration) {
        if query::run_phase(&self.world) != RunPhase::Running {
            return;
        }
        let _span =
            tracing::trace_span!(target: "specter_defence::scheduler", "simulation.step", ?dt)
                .entered();

        self.dispatch(Command::Tick { dt });
        self.dispatch(Command::RefreshStatuses);

        let guardians = query::guardian_view(&self.world);
        let ledger = query::ledger(&self.world);
        let aura_radius = query::config(&self.world).field.aura_radius;
        self.buffs
            .handle(&guardians, &ledger, aura_radius, &mut self.sheets);
        let sheets = mem::take(&mut self.sheets);
        self.dispatch(Command::ApplyBuffs { sheets });

        self.dispatch(Command::AdvanceGroundEffects);

        let stage = query::stage(&self.world);
        let now = query::now(&self.world);
        self.waves
            .handle(&stage, now, &ledger.bonuses, &mut self.commands);
        self.flush_commands();

        self.dispatch(Command::AdvanceEnemies);
        self.dispatch(Command::AdvanceSummons);

        self.resolve_projectiles();
        self.fire_ready_guardians();

        self.dispatch(Command::EvaluateTerminal);
    }

    /// Summons a base guardian into `slot`, or the first free slot.
    pub fn summon(&mut self, slot: Option<SlotId>) -> Result<GuardianId, CommandError> {
        self.submit(Command::SummonGuardian { slot }, |event| match event {
            Event::GuardianSummoned { guardian, .. } => Some(*guardian),
            _ => None,
        })
    }

    /// Promotes a guardian into an explicit class or a drawn one.
    pub fn promote(
        &mut self,
        guardian: GuardianId,
        target: PromotionTarget,
    ) -> Result<GuardianClass, CommandError> {
        if query::run_phase(&self.world) == RunPhase::Ended {
            return self.reject(CommandKind::Promote, CommandError::RunOver);
        }

        let guardians = query::guardian_view(&self.world);
        let ledger = query::ledger(&self.world);
        let mut chosen = Vec::with_capacity(1);
        if let Err(reason) = self.promotion.handle(
            guardian,
            target,
            &guardians,
            &ledger,
            &query::config(&self.world).economy,
            &mut chosen,
        ) {
            return self.reject(CommandKind::Promote, reason);
        }

        let mut outcome = Err(CommandError::NoEligibleTarget);
        for command in chosen {
            outcome = self.submit(command, |event| match event {
                Event::GuardianPromoted { to, .. } => Some(*to),
                _ => None,
            });
        }
        outcome
    }

    /// Sells a guardian, returning the refund, and runs the removal hook.
    pub fn sell(&mut self, guardian: GuardianId) -> Result<u32, CommandError> {
        let removed = query::guardian_view(&self.world).get(guardian).copied();
        let refund = self.submit(Command::SellGuardian { guardian }, |event| match event {
            Event::GuardianSold { refund, .. } => Some(*refund),
            _ => None,
        })?;

        if let Some(snapshot) = removed {
            let replacement = self
                .removal_hook
                .as_mut()
                .and_then(|hook| hook(&snapshot));
            if let Some(kind) = replacement {
                self.spawn_replacement(kind, &snapshot);
            }
        }
        Ok(refund)
    }

    /// Moves a guardian into another free slot.
    pub fn move_guardian(&mut self, guardian: GuardianId, slot: SlotId) -> Result<(), CommandError> {
        self.submit(Command::MoveGuardian { guardian, slot }, |event| match event {
            Event::GuardianMoved { .. } => Some(()),
            _ => None,
        })
    }

    /// Toggles the demolishing state of a shrine guardian.
    pub fn set_shrine_demolishing(
        &mut self,
        guardian: GuardianId,
        demolishing: bool,
    ) -> Result<(), CommandError> {
        self.submit(
            Command::SetShrineDemolishing {
                guardian,
                demolishing,
            },
            |event| match event {
                Event::ShrineStateChanged { .. } => Some(()),
                _ => None,
            },
        )
    }

    /// Removes and returns every event produced since the last drain.
    pub fn drain_events(&mut self) -> Vec<Event> {
        mem::take(&mut self.events)
    }

    /// Lifecycle phase of the run.
    #[must_use]
    pub fn run_phase(&self) -> RunPhase {
        query::run_phase(&self.world)
    }

    /// Current simulation clock.
    #[must_use]
    pub fn now(&self) -> Duration {
        query::now(&self.world)
    }

    /// Resource snapshot.
    #[must_use]
    pub fn ledger(&self) -> LedgerSnapshot {
        query::ledger(&self.world)
    }

    /// Stage snapshot.
    #[must_use]
    pub fn stage(&self) -> StageSnapshot {
        query::stage(&self.world)
    }

    /// Guardians on the field.
    #[must_use]
    pub fn guardians(&self) -> GuardianView {
        query::guardian_view(&self.world)
    }

    /// Live enemies.
    #[must_use]
    pub fn enemies(&self) -> EnemyView {
        query::enemy_view(&self.world)
    }

    /// Lane slots.
    #[must_use]
    pub fn slots(&self) -> Vec<SlotSnapshot> {
        query::slots(&self.world)
    }

    /// Friendly summons.
    #[must_use]
    pub fn summons(&self) -> Vec<SummonSnapshot> {
        query::summons(&self.world)
    }

    /// Active ground effects.
    #[must_use]
    pub fn ground_effects(&self) -> Vec<GroundEffectSnapshot> {
        query::ground_effects(&self.world)
    }

    /// Progress as handed to the persistence collaborator.
    #[must_use]
    pub fn progress(&self) -> ProgressSnapshot {
        query::progress(&self.world)
    }

    /// Read-only access to the underlying world for custom queries.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    fn resolve_projectiles(&mut self) {
        let start = self.events.len();
        self.dispatch(Command::ResolveProjectiles);
        let landed: Vec<(GuardianId, EnemyId)> = self.events[start..]
            .iter()
            .filter_map(|event| match event {
                Event::ProjectileLanded {
                    guardian, target, ..
                } => Some((*guardian, *target)),
                _ => None,
            })
            .collect();

        for (guardian, target) in landed {
            let guardians = query::guardian_view(&self.world);
            let enemies = query::enemy_view(&self.world);
            let ledger = query::ledger(&self.world);
            match self
                .combat
                .resolve(guardian, target, &guardians, &enemies, &ledger)
            {
                Some(plan) => self.dispatch(Command::ApplyHit(plan)),
                None => tracing::trace!(
                    target: "specter_defence::scheduler",
                    ?guardian,
                    ?target,
                    "hit.dropped"
                ),
            }
        }
    }

    fn fire_ready_guardians(&mut self) {
        let guardians: GuardianView = query::guardian_view(&self.world);
        let enemies: EnemyView = query::enemy_view(&self.world);
        self.targeting
            .handle(&guardians, &enemies, &mut self.targets);
        self.combat
            .handle(&guardians, &self.targets, &mut self.commands);
        self.flush_commands();
    }

    fn spawn_replacement(&mut self, kind: SpecterKind, removed: &GuardianSnapshot) {
        let stage = query::stage(&self.world).stage;
        let bonuses = query::ledger(&self.world).bonuses;
        tracing::debug!(
            target: "specter_defence::scheduler",
            guardian = ?removed.id,
            ?kind,
            "removal.spawn"
        );
        self.dispatch(Command::SpawnEnemy(SpawnOrder {
            kind,
            origin: removed.position,
            hp_multiplier: waves::hp_multiplier(stage, bonuses.hp_mitigation),
            speed_multiplier: waves::speed_multiplier(stage, bonuses.speed_mitigation),
            wave_member: false,
        }));
    }

    fn flush_commands(&mut self) {
        let mut commands = mem::take(&mut self.commands);
        for command in commands.drain(..) {
            self.dispatch(command);
        }
        self.commands = commands;
    }

    /// Applies a player command and extracts its outcome from the reported events.
    fn submit<T>(
        &mut self,
        command: Command,
        extract: impl Fn(&Event) -> Option<T>,
    ) -> Result<T, CommandError> {
        let start = self.events.len();
        self.dispatch(command);
        for event in &self.events[start..] {
            if let Event::CommandRejected { reason, .. } = event {
                return Err(*reason);
            }
            if let Some(value) = extract(event) {
                return Ok(value);
            }
        }
        // The world reports every player command; silence only happens once the run is over.
        Err(CommandError::RunOver)
    }

    fn reject<T>(&mut self, command: CommandKind, reason: CommandError) -> Result<T, CommandError> {
        tracing::debug!(
            target: "specter_defence::scheduler",
            ?command,
            %reason,
            "command.rejected"
        );
        self.events.push(Event::CommandRejected { command, reason });
        Err(reason)
    }

    fn dispatch(&mut self, command: Command) {
        self.scratch.clear();
        world::apply(&mut self.world, command, &mut self.scratch);
        let persist = self.scratch.iter().any(|event| {
            matches!(
                event,
                Event::StageAdvanced { .. } | Event::GuardianPromoted { .. } | Event::RunEnded { .. }
            )
        });
        self.events.append(&mut self.scratch);
        if persist {
            self.persist();
        }
    }

    fn persist(&mut self) {
        let Some(store) = self.store.as_mut() else {
            return;
        };
        let progress = query::progress(&self.world);
        match store.save(&progress) {
            Ok(()) => tracing::debug!(
                target: "specter_defence::scheduler",
                stage = progress.stage,
                currency = progress.currency,
                "progress.saved"
            ),
            Err(error) => tracing::warn!(
                target: "specter_defence::scheduler",
                %error,
                "progress.save_failed"
            ),
        }
    }
}

fn seeded_systems(config: &SimulationConfig) -> (Combat, Waves, Promotion) {
    (
        Combat::new(config.stream_seed(RNG_STREAM_COMBAT)),
        Waves::new(waves::Config::from_simulation(config)),
        Promotion::new(config.stream_seed(RNG_STREAM_PROMOTION)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running(config: SimulationConfig) -> Simulation {
        let mut simulation = Simulation::new(config);
        simulation.start();
        let _ = simulation.drain_events();
        simulation
    }

    #[test]
    fn steps_are_ignored_until_started_and_while_paused() {
        let mut simulation = Simulation::new(SimulationConfig::default());
        simulation.step(Duration::from_millis(100));
        assert_eq!(simulation.now(), Duration::ZERO);

        simulation.start();
        simulation.step(Duration::from_millis(100));
        assert_eq!(simulation.now(), Duration::from_millis(100));

        simulation.pause();
        simulation.step(Duration::from_millis(100));
        assert_eq!(simulation.now(), Duration::from_millis(100));

        simulation.resume();
        simulation.step(Duration::from_millis(100));
        assert_eq!(simulation.now(), Duration::from_millis(200));
    }

    #[test]
    fn first_step_begins_stage_one() {
        let mut simulation = running(SimulationConfig::default());
        simulation.step(Duration::from_millis(16));

        let events = simulation.drain_events();
        assert!(events.contains(&Event::StageAdvanced { stage: 1 }));
        assert_eq!(simulation.stage().stage, 1);
    }

    #[test]
    fn promotion_rejections_surface_as_errors_and_events() {
        let mut simulation = running(SimulationConfig::default());
        let guardian = simulation.summon(None).expect("summon");
        let _ = simulation.drain_events();

        let result = simulation.promote(guardian, PromotionTarget::Role(None));

        assert_eq!(
            result,
            Err(CommandError::InsufficientResources {
                required: 100,
                available: 50,
            })
        );
        assert_eq!(
            simulation.drain_events(),
            vec![Event::CommandRejected {
                command: CommandKind::Promote,
                reason: CommandError::InsufficientResources {
                    required: 100,
                    available: 50,
                },
            }]
        );
    }

    #[test]
    fn reset_restores_the_initial_state() {
        let mut simulation = running(SimulationConfig::default());
        let _ = simulation.summon(None).expect("summon");
        simulation.step(Duration::from_millis(500));

        simulation.reset();

        assert_eq!(simulation.run_phase(), RunPhase::NotStarted);
        assert!(simulation.guardians().is_empty());
        assert_eq!(simulation.ledger().currency, 100);
        assert_eq!(simulation.now(), Duration::ZERO);
    }
}
