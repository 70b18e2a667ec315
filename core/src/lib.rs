#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Specter Defence engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and the scheduler submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems and presentation layers to react to. Systems consume event
//! streams, query immutable snapshots, and respond exclusively with new command
//! batches.

mod archetypes;
mod config;
mod geometry;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use archetypes::{
    AbilityHook, AdvancedClass, BaseClass, Behavior, DeathEffect, GroundEffectKind, GuardianClass,
    GuardianStats, HitEffect, PulseEffect, Role, ShrineEffect, ShrineReach, SpecializedClass,
    SpecterCategory, SpecterKind, SpecterStats, SummonKind, SummonStats, SupportAura, Tier,
    TranscendentClass,
};
pub use config::{
    CombatConfig, ConfigError, EconomyConfig, FieldConfig, GlobalBonuses, LedgerConfig,
    SimulationConfig, WaveConfig, RNG_STREAM_COMBAT, RNG_STREAM_PROMOTION, RNG_STREAM_WAVES,
    RNG_STREAM_WORLD,
};
pub use geometry::{LaneSide, Position, SlotCoord};

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(u32);

        impl $name {
            /// Creates a new identifier with the provided numeric value.
            #[must_use]
            pub const fn new(value: u32) -> Self {
                Self(value)
            }

            /// Retrieves the numeric representation of the identifier.
            #[must_use]
            pub const fn get(&self) -> u32 {
                self.0
            }
        }
    };
}

identifier!(
    /// Unique identifier assigned to a guardian.
    GuardianId
);
identifier!(
    /// Unique identifier assigned to an enemy.
    EnemyId
);
identifier!(
    /// Unique identifier of a lane slot.
    SlotId
);
identifier!(
    /// Unique identifier of an in-flight shot.
    ProjectileId
);
identifier!(
    /// Unique identifier of a friendly summon.
    SummonId
);

/// Lifecycle of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunPhase {
    /// Created or reset, waiting for `Start`.
    NotStarted,
    /// Ticks advance the simulation.
    Running,
    /// Ticks are ignored and the clock is frozen.
    Paused,
    /// Corruption reached its maximum; the run is over.
    Ended,
}

/// Lifecycle of a single stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StagePhase {
    /// The previous stage resolved; the next one has not begun.
    Cleared,
    /// Waiting for the countdown to elapse.
    Countdown,
    /// Enemies are being released.
    Spawning,
    /// Every enemy was released but the boss is still unresolved.
    BossPending,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Starts a fresh run.
    Start,
    /// Suspends the simulation clock.
    Pause,
    /// Resumes a paused run.
    Resume,
    /// Discards every entity and returns to the initial state.
    Reset,
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Expires timed statuses, applies burns, stealth cycles and enemy pulses.
    RefreshStatuses,
    /// Replaces every guardian's transient bonuses.
    ApplyBuffs {
        /// Freshly computed bonuses, one per guardian.
        sheets: Vec<BuffSheet>,
    },
    /// Expires ground effects and applies their area statuses.
    AdvanceGroundEffects,
    /// Enters the countdown of a new stage.
    BeginStage {
        /// Stage number being entered.
        stage: u32,
        /// Number of wave enemies the stage releases.
        total: u32,
    },
    /// Ends the countdown and starts releasing enemies.
    OpenSpawning,
    /// Creates an enemy.
    SpawnEnemy(SpawnOrder),
    /// Marks the current stage as resolved.
    ClearStage,
    /// Moves every enemy and resolves escapes.
    AdvanceEnemies,
    /// Moves every summon and resolves their attacks.
    AdvanceSummons,
    /// Resolves every shot whose delay elapsed.
    ResolveProjectiles,
    /// Applies a damage plan computed for a landed shot.
    ApplyHit(HitPlan),
    /// Fires a shot from a guardian at an enemy.
    FireProjectile {
        /// Guardian firing the shot.
        guardian: GuardianId,
        /// Enemy targeted by the shot.
        target: EnemyId,
    },
    /// Ends the run when corruption reached its maximum.
    EvaluateTerminal,
    /// Summons a base guardian, preferring the hinted slot.
    SummonGuardian {
        /// Slot requested by the player, if any.
        slot: Option<SlotId>,
    },
    /// Promotes a guardian into the provided class.
    PromoteGuardian {
        /// Guardian being promoted.
        guardian: GuardianId,
        /// Class the guardian becomes.
        class: GuardianClass,
    },
    /// Sells a guardian for a partial refund.
    SellGuardian {
        /// Guardian being sold.
        guardian: GuardianId,
    },
    /// Moves a guardian to a free slot.
    MoveGuardian {
        /// Guardian being moved.
        guardian: GuardianId,
        /// Destination slot.
        slot: SlotId,
    },
    /// Toggles a shrine's demolishing state, inverting its bonus.
    SetShrineDemolishing {
        /// Shrine guardian.
        guardian: GuardianId,
        /// Whether the shrine is being demolished.
        demolishing: bool,
    },
    /// Replaces the relic and meta bonuses.
    SetGlobalBonuses(GlobalBonuses),
}

/// Player command families used when reporting rejections.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// `SummonGuardian`.
    Summon,
    /// `PromoteGuardian`.
    Promote,
    /// `SellGuardian`.
    Sell,
    /// `MoveGuardian`.
    Move,
    /// `SetShrineDemolishing`.
    Shrine,
    /// `FireProjectile`.
    Fire,
    /// Stage lifecycle commands.
    Stage,
}

/// Limits a command may run into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CapacityLimit {
    /// Global guardian capacity.
    Guardians {
        /// Maximum guardians on the field.
        max: usize,
    },
    /// Per-class population cap.
    ClassPopulation {
        /// Class whose cap was reached.
        class: GuardianClass,
        /// Maximum concurrent instances.
        cap: usize,
    },
}

/// Reasons a command may be rejected; rejected commands leave state unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error)]
pub enum CommandError {
    /// The ledger cannot cover the cost.
    #[error("insufficient resources: {required} required, {available} available")]
    InsufficientResources {
        /// Cost of the command.
        required: u32,
        /// Currency held.
        available: u32,
    },
    /// A capacity invariant would be violated.
    #[error("capacity exceeded: {0:?}")]
    CapacityExceeded(CapacityLimit),
    /// The slot is unknown or occupied; `None` when no free slot exists.
    #[error("invalid slot: {0:?}")]
    InvalidSlot(Option<SlotId>),
    /// The targeted enemy is dead or disconnected.
    #[error("target is no longer valid")]
    InvalidTarget,
    /// The promotion filter left nothing to promote into.
    #[error("no eligible promotion target")]
    NoEligibleTarget,
    /// No guardian with the identifier exists.
    #[error("unknown guardian {0:?}")]
    UnknownGuardian(GuardianId),
    /// The guardian is frozen in place.
    #[error("guardian {0:?} is frozen in place")]
    GuardianLocked(GuardianId),
    /// The run has ended.
    #[error("the run is over")]
    RunOver,
    /// The current stage still has enemies to release or defeat.
    #[error("the current stage is not resolved")]
    StageUnresolved,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// A run started.
    RunStarted,
    /// The run was paused.
    RunPaused,
    /// The run resumed.
    RunResumed,
    /// The world returned to its initial state.
    RunReset,
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
        /// Simulation clock after the tick.
        now: Duration,
    },
    /// A guardian was summoned.
    GuardianSummoned {
        /// New guardian.
        guardian: GuardianId,
        /// Slot it occupies.
        slot: SlotId,
        /// Currency spent.
        cost: u32,
    },
    /// A guardian changed class.
    GuardianPromoted {
        /// Promoted guardian.
        guardian: GuardianId,
        /// Previous class.
        from: GuardianClass,
        /// New class.
        to: GuardianClass,
        /// Currency spent.
        cost: u32,
    },
    /// A guardian was sold.
    GuardianSold {
        /// Removed guardian.
        guardian: GuardianId,
        /// Class it had.
        class: GuardianClass,
        /// Slot freed by the sale.
        slot: SlotId,
        /// Currency refunded.
        refund: u32,
    },
    /// A guardian changed slot.
    GuardianMoved {
        /// Moved guardian.
        guardian: GuardianId,
        /// Slot vacated.
        from: SlotId,
        /// Slot occupied.
        to: SlotId,
    },
    /// A shrine's demolishing state changed.
    ShrineStateChanged {
        /// Shrine guardian.
        guardian: GuardianId,
        /// New state.
        demolishing: bool,
    },
    /// A guardian was frightened and cannot fire.
    GuardianStunned {
        /// Affected guardian.
        guardian: GuardianId,
        /// End of the stun.
        until: Duration,
    },
    /// A guardian was frozen in place.
    GuardianFrozen {
        /// Affected guardian.
        guardian: GuardianId,
        /// End of the freeze.
        until: Duration,
    },
    /// Reports that a command was rejected.
    CommandRejected {
        /// Family of the rejected command.
        command: CommandKind,
        /// Specific reason.
        reason: CommandError,
    },
    /// A stage's countdown began.
    CountdownStarted {
        /// Stage entered.
        stage: u32,
        /// Wave enemies the stage releases.
        total: u32,
        /// Clock value at which spawning begins.
        ends_at: Duration,
    },
    /// The run advanced to a new stage.
    StageAdvanced {
        /// Stage entered.
        stage: u32,
    },
    /// Enemies started spawning.
    SpawningOpened {
        /// Current stage.
        stage: u32,
    },
    /// Every enemy of the stage was resolved.
    StageCleared {
        /// Stage resolved.
        stage: u32,
    },
    /// An enemy appeared.
    EnemySpawned {
        /// New enemy.
        enemy: EnemyId,
        /// Species.
        kind: SpecterKind,
        /// Spawn position.
        position: Position,
    },
    /// A boss appeared.
    BossSpawned {
        /// Boss enemy.
        enemy: EnemyId,
        /// Boss species.
        kind: SpecterKind,
    },
    /// A minion boarded a carrier boss.
    EnemyBoarded {
        /// Passenger.
        enemy: EnemyId,
        /// Carrier boss.
        carrier: EnemyId,
    },
    /// An enemy died.
    EnemyDied {
        /// Dead enemy.
        enemy: EnemyId,
        /// Species.
        kind: SpecterKind,
        /// Currency granted.
        reward: u32,
        /// Guardian whose shot killed it, if any.
        killer: Option<GuardianId>,
    },
    /// An enemy reached the goal.
    EnemyEscaped {
        /// Escaped enemy.
        enemy: EnemyId,
        /// Species.
        kind: SpecterKind,
        /// Corruption added.
        corruption: f32,
    },
    /// A guardian spent a charge to banish an escaping enemy.
    EnemyBanished {
        /// Banished enemy.
        enemy: EnemyId,
        /// Guardian spending the charge.
        guardian: GuardianId,
    },
    /// Enemies were linked into a shared-damage group.
    EnemiesLinked {
        /// Group identifier.
        link: u32,
        /// Number of members.
        members: usize,
    },
    /// A shot was fired.
    ProjectileFired {
        /// Shot identifier.
        projectile: ProjectileId,
        /// Firing guardian.
        guardian: GuardianId,
        /// Targeted enemy.
        target: EnemyId,
    },
    /// A shot reached a valid target and awaits damage resolution.
    ProjectileLanded {
        /// Shot identifier.
        projectile: ProjectileId,
        /// Firing guardian.
        guardian: GuardianId,
        /// Hit enemy.
        target: EnemyId,
    },
    /// A shot's target vanished before resolution.
    ShotWasted {
        /// Shot identifier.
        projectile: ProjectileId,
        /// Firing guardian.
        guardian: GuardianId,
    },
    /// A global time freeze began.
    TimeFreezeStarted {
        /// End of the freeze.
        until: Duration,
    },
    /// A global time freeze ended and banked damage was released.
    TimeFreezeEnded {
        /// Total damage released.
        released: f32,
    },
    /// A ground effect was placed.
    GroundEffectPlaced {
        /// Kind of effect.
        kind: GroundEffectKind,
        /// Centre of the effect.
        position: Position,
        /// Radius of the effect.
        radius: f32,
    },
    /// A friendly summon was raised.
    SummonRaised {
        /// New summon.
        summon: SummonId,
        /// Kind of summon.
        kind: SummonKind,
    },
    /// A friendly summon left the field.
    SummonExpired {
        /// Removed summon.
        summon: SummonId,
    },
    /// Corruption reached its maximum and the run ended.
    RunEnded {
        /// Stage reached.
        stage: u32,
        /// Final corruption.
        corruption: f32,
    },
}

/// Transient bonuses computed for one guardian during a tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BuffSheet {
    /// Guardian receiving the bonuses.
    pub guardian: GuardianId,
    /// Additive attack speed bonus.
    pub speed_bonus: f32,
    /// Additive range bonus in logical units.
    pub range_bonus: f32,
    /// Additive damage bonus from support auras.
    pub damage_bonus: f32,
    /// Additive damage bonus from shrines.
    pub shrine_damage_bonus: f32,
}

impl BuffSheet {
    /// Creates an empty sheet for the guardian.
    #[must_use]
    pub const fn baseline(guardian: GuardianId) -> Self {
        Self {
            guardian,
            speed_bonus: 0.0,
            range_bonus: 0.0,
            damage_bonus: 0.0,
            shrine_damage_bonus: 0.0,
        }
    }
}

/// Everything required to create an enemy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnOrder {
    /// Species to create.
    pub kind: SpecterKind,
    /// Spawn position.
    pub origin: Position,
    /// Stage hp multiplier.
    pub hp_multiplier: f32,
    /// Stage speed multiplier.
    pub speed_multiplier: f32,
    /// Whether the enemy counts toward the stage total.
    pub wave_member: bool,
}

/// Guardian-to-enemy assignment produced by targeting.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GuardianTarget {
    /// Guardian that would fire.
    pub guardian: GuardianId,
    /// Enemy selected for the guardian.
    pub enemy: EnemyId,
}

/// Damage dealt to an enemy other than a shot's primary target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SecondaryHit {
    /// Enemy receiving the damage.
    pub enemy: EnemyId,
    /// Damage before bestiary bonuses.
    pub damage: f32,
}

/// Fully computed outcome of a landed shot.
#[derive(Clone, Debug, PartialEq)]
pub struct HitPlan {
    /// Guardian that fired the shot.
    pub guardian: GuardianId,
    /// Primary target.
    pub target: EnemyId,
    /// Damage dealt to the primary target before bestiary bonuses.
    pub damage: f32,
    /// Whether the shot was a critical strike.
    pub critical: bool,
    /// Splash and ricochet damage.
    pub secondary: Vec<SecondaryHit>,
    /// Non-damage effects triggered by the shot.
    pub effects: Vec<HitEffect>,
}

/// Immutable representation of a guardian's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GuardianSnapshot {
    /// Identifier allocated to the guardian.
    pub id: GuardianId,
    /// Current class.
    pub class: GuardianClass,
    /// Owning slot.
    pub slot: SlotId,
    /// Grid coordinate of the owning slot.
    pub coord: SlotCoord,
    /// Logical anchor of the guardian.
    pub position: Position,
    /// Currency spent on the guardian so far.
    pub spent: u32,
    /// Remaining banish charges.
    pub charges: Option<u32>,
    /// Transient bonuses computed this tick.
    pub buffs: BuffSheet,
    /// Range including bonuses.
    pub effective_range: f32,
    /// Cooldown including speed bonuses.
    pub effective_cooldown: Duration,
    /// Fraction of the cooldown elapsed, in `0.0..=1.0`.
    pub cooldown_progress: f32,
    /// Whether the cooldown elapsed.
    pub ready: bool,
    /// Frightened and unable to fire.
    pub stunned: bool,
    /// Frozen in place; cannot fire or move.
    pub frozen: bool,
    /// Shrine being demolished.
    pub demolishing: bool,
}

impl GuardianSnapshot {
    /// Reports whether the guardian can fire at all this tick.
    #[must_use]
    pub fn can_attack(&self) -> bool {
        self.class.shrine().is_none()
            && self.class.stats().damage > 0.0
            && !self.stunned
            && !self.frozen
    }
}

/// Immutable representation of an enemy's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Identifier allocated to the enemy.
    pub id: EnemyId,
    /// Species.
    pub kind: SpecterKind,
    /// Logical anchor of the enemy.
    pub position: Position,
    /// Remaining hit points.
    pub hp: f32,
    /// Maximum hit points.
    pub max_hp: f32,
    /// Fraction of shot damage ignored.
    pub defense: f32,
    /// Whether the enemy is a boss.
    pub boss: bool,
    /// Burning.
    pub burning: bool,
    /// Silenced.
    pub silenced: bool,
    /// Inside a slow field this tick.
    pub slowed: bool,
    /// Hidden from targeting this tick.
    pub stealthed: bool,
    /// Carrier boss the enemy rides, if boarded.
    pub boarded: Option<EnemyId>,
    /// Shared-damage group, if linked.
    pub link: Option<u32>,
    /// Damage banked during a time freeze.
    pub banked: f32,
}

impl EnemySnapshot {
    /// Reports whether guardians may select the enemy.
    #[must_use]
    pub fn targetable(&self) -> bool {
        self.hp > 0.0 && !self.stealthed && self.boarded.is_none()
    }

    /// Remaining hit points as a fraction of the maximum.
    #[must_use]
    pub fn hp_ratio(&self) -> f32 {
        if self.max_hp <= 0.0 {
            return 0.0;
        }
        (self.hp / self.max_hp).clamp(0.0, 1.0)
    }
}

macro_rules! snapshot_view {
    ($(#[$meta:meta])* $view:ident, $snapshot:ident, $id:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Default)]
        pub struct $view {
            snapshots: Vec<$snapshot>,
        }

        impl $view {
            /// Creates a new view from the provided snapshots.
            #[must_use]
            pub fn from_snapshots(mut snapshots: Vec<$snapshot>) -> Self {
                snapshots.sort_by_key(|snapshot| snapshot.id);
                Self { snapshots }
            }

            /// Iterator over the captured snapshots in deterministic order.
            pub fn iter(&self) -> impl Iterator<Item = &$snapshot> {
                self.snapshots.iter()
            }

            /// Looks up the snapshot with the provided identifier.
            #[must_use]
            pub fn get(&self, id: $id) -> Option<&$snapshot> {
                self.snapshots
                    .binary_search_by_key(&id, |snapshot| snapshot.id)
                    .ok()
                    .map(|index| &self.snapshots[index])
            }

            /// Number of captured snapshots.
            #[must_use]
            pub fn len(&self) -> usize {
                self.snapshots.len()
            }

            /// Reports whether the view is empty.
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.snapshots.is_empty()
            }

            /// Consumes the view, yielding the underlying snapshots.
            #[must_use]
            pub fn into_vec(self) -> Vec<$snapshot> {
                self.snapshots
            }
        }
    };
}

snapshot_view!(
    /// Read-only snapshot describing all guardians on the field.
    GuardianView,
    GuardianSnapshot,
    GuardianId
);
snapshot_view!(
    /// Read-only snapshot describing all live enemies.
    EnemyView,
    EnemySnapshot,
    EnemyId
);

/// Read-only copy of the resource ledger.
#[derive(Clone, Debug, PartialEq)]
pub struct LedgerSnapshot {
    /// Currency held.
    pub currency: u32,
    /// Ceiling currency is clamped to.
    pub currency_cap: u32,
    /// Corruption accumulated.
    pub corruption: f32,
    /// Corruption at which the run ends.
    pub corruption_max: f32,
    /// Damage multiplier applied to every shot.
    pub global_damage_mult: f32,
    /// Base crit chance.
    pub global_crit_chance: f32,
    /// Base crit multiplier.
    pub global_crit_mult: f32,
    /// Chance a kill drops a second reward.
    pub treasure_chance: f32,
    /// Relic and meta bonuses.
    pub bonuses: GlobalBonuses,
}

impl LedgerSnapshot {
    /// Corruption as a fraction of its maximum.
    #[must_use]
    pub fn corruption_ratio(&self) -> f32 {
        if self.corruption_max <= 0.0 {
            return 1.0;
        }
        (self.corruption / self.corruption_max).clamp(0.0, 1.0)
    }
}

/// Read-only copy of the stage state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StageSnapshot {
    /// Current stage number; zero before the first stage.
    pub stage: u32,
    /// Whether the stage is a boss stage.
    pub boss_stage: bool,
    /// Wave enemies the stage releases.
    pub total: u32,
    /// Wave enemies released so far.
    pub spawned: u32,
    /// Enemies alive on the field.
    pub live: usize,
    /// Lifecycle phase.
    pub phase: StagePhase,
    /// Time left in the countdown, while counting down.
    pub countdown_remaining: Option<Duration>,
    /// Clock value of the latest wave spawn.
    pub last_spawn_at: Option<Duration>,
    /// Boss of the stage, once spawned.
    pub boss: Option<EnemyId>,
    /// Whether the boss died or escaped.
    pub boss_resolved: bool,
}

impl StageSnapshot {
    /// Enemies still to be defeated: unreleased plus alive.
    #[must_use]
    pub fn remaining(&self) -> usize {
        let unreleased = self.total.saturating_sub(self.spawned) as usize;
        unreleased + self.live
    }

    /// Reports whether every advancement condition of the stage holds.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.spawned >= self.total && self.live == 0 && (!self.boss_stage || self.boss_resolved)
    }
}

/// Read-only description of a lane slot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlotSnapshot {
    /// Slot identifier.
    pub id: SlotId,
    /// Grid coordinate.
    pub coord: SlotCoord,
    /// Logical anchor.
    pub position: Position,
    /// Guardian occupying the slot.
    pub occupant: Option<GuardianId>,
}

/// Read-only description of a friendly summon.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SummonSnapshot {
    /// Summon identifier.
    pub id: SummonId,
    /// Kind of summon.
    pub kind: SummonKind,
    /// Logical anchor.
    pub position: Position,
    /// Clock value at which the summon crumbles.
    pub expires_at: Duration,
}

/// Read-only description of a ground effect.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroundEffectSnapshot {
    /// Kind of effect.
    pub kind: GroundEffectKind,
    /// Centre of the effect.
    pub position: Position,
    /// Radius of the effect.
    pub radius: f32,
    /// Clock value at which the effect expires.
    pub ends_at: Duration,
}

/// Progress handed to the external persistence collaborator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Currency held.
    pub currency: u32,
    /// Stage reached.
    pub stage: u32,
    /// Classes promoted into at least once.
    pub unlocked_classes: Vec<GuardianClass>,
    /// Species killed at least once.
    pub encountered: Vec<SpecterKind>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enemy(id: u32) -> EnemySnapshot {
        EnemySnapshot {
            id: EnemyId::new(id),
            kind: SpecterKind::Wisp,
            position: Position::new(0.0, 0.0),
            hp: 10.0,
            max_hp: 40.0,
            defense: 0.0,
            boss: false,
            burning: false,
            silenced: false,
            slowed: false,
            stealthed: false,
            boarded: None,
            link: None,
            banked: 0.0,
        }
    }

    #[test]
    fn views_are_sorted_and_searchable() {
        let view = EnemyView::from_snapshots(vec![enemy(9), enemy(2), enemy(5)]);
        let ids: Vec<u32> = view.iter().map(|snapshot| snapshot.id.get()).collect();
        assert_eq!(ids, vec![2, 5, 9]);
        assert!(view.get(EnemyId::new(5)).is_some());
        assert!(view.get(EnemyId::new(4)).is_none());
    }

    #[test]
    fn boarded_or_stealthed_enemies_are_not_targetable() {
        let mut snapshot = enemy(1);
        assert!(snapshot.targetable());
        assert!((snapshot.hp_ratio() - 0.25).abs() < f32::EPSILON);

        snapshot.stealthed = true;
        assert!(!snapshot.targetable());

        snapshot.stealthed = false;
        snapshot.boarded = Some(EnemyId::new(7));
        assert!(!snapshot.targetable());
    }

    #[test]
    fn boss_stage_needs_boss_resolution() {
        let mut stage = StageSnapshot {
            stage: 10,
            boss_stage: true,
            total: 15,
            spawned: 15,
            live: 0,
            phase: StagePhase::BossPending,
            countdown_remaining: None,
            last_spawn_at: None,
            boss: Some(EnemyId::new(1)),
            boss_resolved: false,
        };
        assert!(!stage.is_resolved());
        stage.boss_resolved = true;
        assert!(stage.is_resolved());
        stage.spawned = 14;
        assert!(!stage.is_resolved());
        assert_eq!(stage.remaining(), 1);
    }

    #[test]
    fn progress_snapshot_round_trips_through_bincode() {
        let snapshot = ProgressSnapshot {
            currency: 420,
            stage: 7,
            unlocked_classes: vec![GuardianClass::Specialized(SpecializedClass::Bard)],
            encountered: vec![SpecterKind::Wisp, SpecterKind::Phantom],
        };
        let bytes = bincode::serialize(&snapshot).expect("serialize");
        let restored: ProgressSnapshot = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(restored, snapshot);
    }
}
