//! Resource ledger holding currency, corruption and global multipliers.

use specter_defence_core::{
    CommandError, EconomyConfig, GlobalBonuses, LedgerConfig, LedgerSnapshot,
};

/// Currency, corruption and multipliers; every setter clamps.
#[derive(Clone, Debug)]
pub(crate) struct Ledger {
    currency: u32,
    currency_cap: u32,
    corruption: f32,
    corruption_max: f32,
    global_damage_mult: f32,
    global_crit_chance: f32,
    global_crit_mult: f32,
    treasure_chance: f32,
    bonuses: GlobalBonuses,
}

impl Ledger {
    pub(crate) fn new(economy: &EconomyConfig, ledger: &LedgerConfig, bonuses: GlobalBonuses) -> Self {
        let currency_cap = economy.currency_cap;
        Self {
            currency: economy.starting_currency.min(currency_cap),
            currency_cap,
            corruption: 0.0,
            corruption_max: ledger.corruption_max.max(0.0),
            global_damage_mult: ledger.global_damage_mult.max(0.0),
            global_crit_chance: ledger.global_crit_chance.clamp(0.0, 1.0),
            global_crit_mult: ledger.global_crit_mult.max(1.0),
            treasure_chance: ledger.treasure_chance.clamp(0.0, 1.0),
            bonuses,
        }
    }

    pub(crate) fn currency(&self) -> u32 {
        self.currency
    }

    pub(crate) fn credit(&mut self, amount: u32) {
        self.currency = self.currency.saturating_add(amount).min(self.currency_cap);
    }

    /// Verifies the ledger can cover `cost` without mutating it.
    pub(crate) fn ensure_affordable(&self, cost: u32) -> Result<(), CommandError> {
        if self.currency < cost {
            return Err(CommandError::InsufficientResources {
                required: cost,
                available: self.currency,
            });
        }
        Ok(())
    }

    pub(crate) fn debit(&mut self, cost: u32) -> Result<(), CommandError> {
        self.ensure_affordable(cost)?;
        self.currency -= cost;
        Ok(())
    }

    pub(crate) fn corruption(&self) -> f32 {
        self.corruption
    }

    pub(crate) fn add_corruption(&mut self, amount: f32) {
        self.corruption = (self.corruption + amount.max(0.0)).clamp(0.0, self.corruption_max);
    }

    pub(crate) fn drain_corruption(&mut self, amount: f32) {
        self.corruption = (self.corruption - amount.max(0.0)).clamp(0.0, self.corruption_max);
    }

    pub(crate) fn corruption_maxed(&self) -> bool {
        self.corruption >= self.corruption_max
    }

    pub(crate) fn treasure_chance(&self) -> f32 {
        self.treasure_chance
    }

    pub(crate) fn bonuses(&self) -> &GlobalBonuses {
        &self.bonuses
    }

    pub(crate) fn set_bonuses(&mut self, bonuses: GlobalBonuses) {
        self.bonuses = bonuses;
    }

    pub(crate) fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            currency: self.currency,
            currency_cap: self.currency_cap,
            corruption: self.corruption,
            corruption_max: self.corruption_max,
            global_damage_mult: self.global_damage_mult,
            global_crit_chance: self.global_crit_chance,
            global_crit_mult: self.global_crit_mult,
            treasure_chance: self.treasure_chance,
            bonuses: self.bonuses.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger(starting: u32) -> Ledger {
        let economy = EconomyConfig {
            starting_currency: starting,
            currency_cap: 500,
            ..EconomyConfig::default()
        };
        Ledger::new(&economy, &LedgerConfig::default(), GlobalBonuses::default())
    }

    #[test]
    fn failed_debit_leaves_currency_untouched() {
        let mut ledger = ledger(40);
        assert_eq!(
            ledger.debit(50),
            Err(CommandError::InsufficientResources {
                required: 50,
                available: 40
            })
        );
        assert_eq!(ledger.currency(), 40);
    }

    #[test]
    fn credit_clamps_to_cap() {
        let mut ledger = ledger(450);
        ledger.credit(200);
        assert_eq!(ledger.currency(), 500);
    }

    #[test]
    fn corruption_is_clamped_on_both_ends() {
        let mut ledger = ledger(0);
        ledger.add_corruption(80.0);
        ledger.add_corruption(80.0);
        assert_eq!(ledger.corruption(), 100.0);
        assert!(ledger.corruption_maxed());
        ledger.drain_corruption(250.0);
        assert_eq!(ledger.corruption(), 0.0);
    }
}
