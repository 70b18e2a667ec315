#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic stage orchestrator responsible for emitting stage and spawn commands.
//!
//! The orchestrator never mutates the world directly. Each tick it inspects the
//! latest [`StageSnapshot`] and pushes the commands that move the lifecycle
//! `Cleared → Countdown → Spawning → (BossPending) → Cleared` forward; the
//! world validates every transition.

use std::time::Duration;

use rand::{
    distributions::{Distribution, WeightedIndex},
    Rng, SeedableRng,
};
use rand_chacha::ChaCha8Rng;
use specter_defence_core::{
    Command, GlobalBonuses, Position, SimulationConfig, SpawnOrder, SpecterCategory, SpecterKind,
    StagePhase, StageSnapshot, RNG_STREAM_WAVES,
};

/// Largest batch released at once.
const MAX_BATCH: u32 = 5;

/// Per-stage hp growth before stage 5, until stage 15 and afterwards.
const HP_GROWTH: [f32; 3] = [0.08, 0.12, 0.15];

/// Per-stage speed growth in the same regimes as [`HP_GROWTH`].
const SPEED_GROWTH: [f32; 3] = [0.01, 0.02, 0.03];

/// Configuration parameters required to construct the orchestrator.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    spawn_interval: Duration,
    boss_stage_total: u32,
    lane_width: f32,
    rng_seed: u64,
}

impl Config {
    /// Creates a configuration from explicit pacing values.
    #[must_use]
    pub const fn new(
        spawn_interval: Duration,
        boss_stage_total: u32,
        lane_width: f32,
        rng_seed: u64,
    ) -> Self {
        Self {
            spawn_interval,
            boss_stage_total,
            lane_width,
            rng_seed,
        }
    }

    /// Derives the configuration and the wave random stream from a run configuration.
    #[must_use]
    pub fn from_simulation(config: &SimulationConfig) -> Self {
        Self::new(
            config.waves.spawn_interval(),
            config.waves.boss_stage_total,
            config.field.lane_width,
            config.stream_seed(RNG_STREAM_WAVES),
        )
    }
}

/// Pure system that advances stages and releases spawn batches.
#[derive(Debug)]
pub struct Waves {
    config: Config,
    rng: ChaCha8Rng,
    weights: Vec<u32>,
}

impl Waves {
    /// Creates a new orchestrator using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            weights: Vec::with_capacity(SpecterCategory::ALL.len()),
        }
    }

    /// Emits the commands the current stage phase calls for.
    pub fn handle(
        &mut self,
        stage: &StageSnapshot,
        now: Duration,
        bonuses: &GlobalBonuses,
        out: &mut Vec<Command>,
    ) {
        match stage.phase {
            StagePhase::Cleared => {
                let next = stage.stage.saturating_add(1);
                let total = self.roll_total(next);
                tracing::debug!(
                    target: "specter_defence::waves",
                    stage = next,
                    total,
                    "stage.begin"
                );
                out.push(Command::BeginStage { stage: next, total });
            }
            StagePhase::Countdown => {
                if stage.countdown_remaining.map_or(true, |left| left.is_zero()) {
                    out.push(Command::OpenSpawning);
                    self.release_batch(stage, bonuses, out);
                }
            }
            StagePhase::Spawning | StagePhase::BossPending => {
                if stage.is_resolved() {
                    out.push(Command::ClearStage);
                    return;
                }
                if stage.spawned >= stage.total {
                    return;
                }
                let due = stage
                    .last_spawn_at
                    .map_or(true, |last| now >= last + self.config.spawn_interval);
                if due || stage.live == 0 {
                    self.release_batch(stage, bonuses, out);
                }
            }
        }
    }

    fn roll_total(&mut self, stage: u32) -> u32 {
        if is_boss_stage(stage) {
            return self.config.boss_stage_total;
        }
        let range = if stage < 5 {
            8..=12
        } else if stage < 15 {
            12..=20
        } else {
            18..=30
        };
        self.rng.gen_range(range)
    }

    fn release_batch(
        &mut self,
        stage: &StageSnapshot,
        bonuses: &GlobalBonuses,
        out: &mut Vec<Command>,
    ) {
        let count = batch_size(stage.stage).min(stage.total.saturating_sub(stage.spawned));
        let hp_multiplier = hp_multiplier(stage.stage, bonuses.hp_mitigation);
        let speed_multiplier = speed_multiplier(stage.stage, bonuses.speed_mitigation);

        for index in 0..count {
            let boss_due = stage.boss_stage && stage.spawned == 0 && index == 0;
            let kind = if boss_due {
                boss_for(stage.stage)
            } else {
                match self.draw_species(stage.stage) {
                    Some(kind) => kind,
                    None => continue,
                }
            };
            let origin = Position::new(self.roll_lane_offset(), 0.0);
            out.push(Command::SpawnEnemy(SpawnOrder {
                kind,
                origin,
                hp_multiplier,
                speed_multiplier,
                wave_member: true,
            }));
        }
    }

    /// Draws a category by stage weight, then a species by its own weight.
    fn draw_species(&mut self, stage: u32) -> Option<SpecterKind> {
        self.weights.clear();
        self.weights.extend(
            SpecterCategory::ALL
                .iter()
                .map(|category| category_weight(*category, stage)),
        );
        let categories = WeightedIndex::new(&self.weights).ok()?;
        let category = SpecterCategory::ALL[categories.sample(&mut self.rng)];

        let members = category.members();
        let species = WeightedIndex::new(members.iter().map(|kind| kind.stats().weight)).ok()?;
        Some(members[species.sample(&mut self.rng)])
    }

    fn roll_lane_offset(&mut self) -> f32 {
        if self.config.lane_width > 0.0 {
            self.rng.gen_range(0.0..self.config.lane_width)
        } else {
            0.0
        }
    }
}

fn is_boss_stage(stage: u32) -> bool {
    stage > 0 && stage % 10 == 0
}

fn boss_for(stage: u32) -> SpecterKind {
    let bosses = SpecterKind::BOSSES;
    let index = (stage / 10).saturating_sub(1) as usize % bosses.len();
    bosses[index]
}

/// Number of enemies released per batch on `stage`.
#[must_use]
pub fn batch_size(stage: u32) -> u32 {
    (1 + stage / 4).min(MAX_BATCH)
}

/// Relative weight of `category` in the first draw on `stage`.
#[must_use]
pub fn category_weight(category: SpecterCategory, stage: u32) -> u32 {
    if stage <= 1 {
        return u32::from(category == SpecterCategory::Specter);
    }
    match category {
        SpecterCategory::Specter => 60u32.saturating_sub(stage.saturating_mul(2)).max(15),
        SpecterCategory::Wraith => 20 + stage.min(20),
        SpecterCategory::Spirit if stage >= 4 => 10 + stage.min(20),
        SpecterCategory::Demon if stage >= 6 => 8 + stage.min(25),
        SpecterCategory::Treasure if stage >= 3 => 4,
        _ => 0,
    }
}

/// Compounded hp multiplier for `stage`, with growth reduced by `mitigation`.
#[must_use]
pub fn hp_multiplier(stage: u32, mitigation: f32) -> f32 {
    compound(stage, HP_GROWTH, mitigation)
}

/// Compounded speed multiplier for `stage`, with growth reduced by `mitigation`.
#[must_use]
pub fn speed_multiplier(stage: u32, mitigation: f32) -> f32 {
    compound(stage, SPEED_GROWTH, mitigation)
}

fn compound(stage: u32, growth: [f32; 3], mitigation: f32) -> f32 {
    let keep = 1.0 - mitigation.clamp(0.0, 1.0);
    (2..=stage).fold(1.0, |multiplier, step| {
        let rate = if step <= 5 {
            growth[0]
        } else if step <= 15 {
            growth[1]
        } else {
            growth[2]
        };
        multiplier * (1.0 + rate * keep)
    })
}
