use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::archetypes::Tier;

/// Relic, equipment and meta-progression contributions layered over the ledger.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalBonuses {
    /// Additive damage bonus applied to every shot.
    pub relic_damage: f32,
    /// Additive crit chance.
    pub relic_crit_chance: f32,
    /// Additive crit multiplier.
    pub relic_crit_bonus: f32,
    /// Baseline attack speed bonus of every guardian.
    pub relic_speed: f32,
    /// Baseline range bonus of every guardian.
    pub relic_range: f32,
    /// Extra radius added to support auras.
    pub aura_radius: f32,
    /// Extends directional shrines to row neighbours and amplifies global shrines.
    pub shrine_mastery: bool,
    /// Enemies at or below this hp ratio after a hit are executed.
    pub execute_threshold: Option<f32>,
    /// Damage bonus against species already in the bestiary.
    pub bestiary_bonus: f32,
    /// Fraction removed from the stage hp multiplier growth.
    pub hp_mitigation: f32,
    /// Fraction removed from the stage speed multiplier growth.
    pub speed_mitigation: f32,
}

impl Default for GlobalBonuses {
    fn default() -> Self {
        Self {
            relic_damage: 0.0,
            relic_crit_chance: 0.0,
            relic_crit_bonus: 0.0,
            relic_speed: 0.0,
            relic_range: 0.0,
            aura_radius: 0.0,
            shrine_mastery: false,
            execute_threshold: None,
            bestiary_bonus: 0.1,
            hp_mitigation: 0.0,
            speed_mitigation: 0.0,
        }
    }
}

/// Currency, costs and refunds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Currency granted when a run starts.
    pub starting_currency: u32,
    /// Ceiling currency is clamped to.
    pub currency_cap: u32,
    /// Cost of summoning a base guardian.
    pub summon_cost: u32,
    /// Cost of promoting into tier two, three and four respectively.
    pub promotion_costs: [u32; 3],
    /// Fraction of the spent total returned on sale.
    pub refund_ratio: f32,
}

impl EconomyConfig {
    /// Cost of promoting into a class of `tier`; base classes are never promotion targets.
    #[must_use]
    pub fn promotion_cost(&self, tier: Tier) -> u32 {
        match tier {
            Tier::Base => 0,
            Tier::Specialized => self.promotion_costs[0],
            Tier::Advanced => self.promotion_costs[1],
            Tier::Transcendent => self.promotion_costs[2],
        }
    }

    /// Currency returned when selling a guardian that cost `spent` in total.
    #[must_use]
    pub fn refund_for(&self, spent: u32) -> u32 {
        let permille = (self.refund_ratio.clamp(0.0, 1.0) * 1_000.0).round() as u64;
        (u64::from(spent) * permille / 1_000) as u32
    }
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            starting_currency: 100,
            currency_cap: 99_999,
            summon_cost: 50,
            promotion_costs: [100, 250, 600],
            refund_ratio: 0.7,
        }
    }
}

/// Starting values of the resource ledger.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
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
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            corruption_max: 100.0,
            global_damage_mult: 1.0,
            global_crit_chance: 0.05,
            global_crit_mult: 1.5,
            treasure_chance: 0.05,
        }
    }
}

/// Battlefield geometry and capacity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Width of the lane enemies walk in.
    pub lane_width: f32,
    /// Progress at which an enemy escapes.
    pub lane_length: f32,
    /// Slot columns on each side of the lane.
    pub slot_columns: u32,
    /// Slot rows along the lane.
    pub slot_rows: u32,
    /// Distance between neighbouring slots.
    pub slot_spacing: f32,
    /// Maximum number of guardians on the field.
    pub max_guardians: usize,
    /// Base radius of support auras.
    pub aura_radius: f32,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            lane_width: 300.0,
            lane_length: 1_000.0,
            slot_columns: 2,
            slot_rows: 5,
            slot_spacing: 90.0,
            max_guardians: 16,
            aura_radius: 160.0,
        }
    }
}

/// Combat timing and status tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Delay between firing and resolving a shot, in milliseconds.
    pub projectile_delay_ms: u64,
    /// Fraction of max hp burned per second.
    pub burn_fraction_per_second: f32,
    /// Multiplier applied to banked damage when a time freeze ends.
    pub freeze_release_multiplier: f32,
    /// Fraction of non-shared damage propagated to linkmates.
    pub link_share: f32,
    /// Speed factor applied inside blizzards.
    pub slow_factor: f32,
    /// Chance a minion boards a living carrier boss.
    pub boarding_chance: f64,
    /// Burn refreshed on enemies standing in fire, in milliseconds.
    pub fire_linger_ms: u64,
}

impl CombatConfig {
    /// Delay between firing and resolving a shot.
    #[must_use]
    pub fn projectile_delay(&self) -> Duration {
        Duration::from_millis(self.projectile_delay_ms)
    }

    /// Burn refreshed on enemies standing in fire.
    #[must_use]
    pub fn fire_linger(&self) -> Duration {
        Duration::from_millis(self.fire_linger_ms)
    }
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            projectile_delay_ms: 120,
            burn_fraction_per_second: 0.04,
            freeze_release_multiplier: 2.0,
            link_share: 0.5,
            slow_factor: 0.5,
            boarding_chance: 0.3,
            fire_linger_ms: 1_000,
        }
    }
}

/// Stage pacing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveConfig {
    /// Countdown before spawning starts, in milliseconds.
    pub countdown_ms: u64,
    /// Interval between spawn batches, in milliseconds.
    pub spawn_interval_ms: u64,
    /// Number of enemies on boss stages.
    pub boss_stage_total: u32,
}

impl WaveConfig {
    /// Countdown before spawning starts.
    #[must_use]
    pub fn countdown(&self) -> Duration {
        Duration::from_millis(self.countdown_ms)
    }

    /// Interval between spawn batches.
    #[must_use]
    pub fn spawn_interval(&self) -> Duration {
        Duration::from_millis(self.spawn_interval_ms)
    }
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            countdown_ms: 3_000,
            spawn_interval_ms: 1_500,
            boss_stage_total: 15,
        }
    }
}

/// Complete tuning surface of a run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seed every random stream is derived from.
    pub seed: u64,
    /// Currency, costs and refunds.
    pub economy: EconomyConfig,
    /// Starting ledger values.
    pub ledger: LedgerConfig,
    /// Battlefield geometry.
    pub field: FieldConfig,
    /// Combat tuning.
    pub combat: CombatConfig,
    /// Stage pacing.
    pub waves: WaveConfig,
    /// Relic and meta bonuses active at start.
    pub bonuses: GlobalBonuses,
}

impl SimulationConfig {
    /// Parses a configuration from JSON; missing fields fall back to defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// Derives an independent seed for a named random stream.
    #[must_use]
    pub fn stream_seed(&self, stream: u64) -> u64 {
        let mut value = self.seed ^ stream.wrapping_mul(0x9e37_79b9_7f4a_7c15);
        value = (value ^ (value >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        value = (value ^ (value >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        value ^ (value >> 31)
    }
}

/// Random stream used by the world for treasure rolls and placement.
pub const RNG_STREAM_WORLD: u64 = 1;
/// Random stream used by combat for crits and on-hit rolls.
pub const RNG_STREAM_COMBAT: u64 = 2;
/// Random stream used by the wave orchestrator.
pub const RNG_STREAM_WAVES: u64 = 3;
/// Random stream used by promotion draws.
pub const RNG_STREAM_PROMOTION: u64 = 4;

/// Failures raised while loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The JSON payload was malformed.
    #[error("failed to parse simulation config: {0}")]
    Parse(#[from] serde_json::Error),
    /// The configuration file could not be read.
    #[error("failed to read simulation config from {path:?}: {source}")]
    ReadFailed {
        /// Path that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::SimulationConfig;
    use crate::archetypes::Tier;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = SimulationConfig::from_json_str(r#"{"seed": 9, "economy": {"summon_cost": 75}}"#)
            .expect("config parses");
        assert_eq!(config.seed, 9);
        assert_eq!(config.economy.summon_cost, 75);
        assert_eq!(config.economy.promotion_costs, [100, 250, 600]);
        assert_eq!(config.field.max_guardians, 16);
    }

    #[test]
    fn refunds_round_down_from_the_spent_total() {
        let economy = SimulationConfig::default().economy;
        assert_eq!(economy.refund_for(100), 70);
        assert_eq!(economy.refund_for(155), 108);
        assert_eq!(economy.promotion_cost(Tier::Advanced), 250);
    }

    #[test]
    fn malformed_json_is_reported() {
        assert!(SimulationConfig::from_json_str("{ seed: }").is_err());
    }

    #[test]
    fn stream_seeds_differ_per_stream() {
        let config = SimulationConfig::default();
        assert_ne!(config.stream_seed(1), config.stream_seed(2));
    }
}
