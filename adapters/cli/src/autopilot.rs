//! Simple scripted player used by the headless runner.

use specter_defence_core::{EconomyConfig, GuardianSnapshot, SimulationConfig};
use specter_defence_scheduler::{PromotionTarget, Simulation};

/// Spends currency greedily: fill free slots first, then promote the weakest guardian.
#[derive(Clone, Debug)]
pub(crate) struct Autopilot {
    economy: EconomyConfig,
}

impl Autopilot {
    pub(crate) fn new(config: &SimulationConfig) -> Self {
        Self {
            economy: config.economy.clone(),
        }
    }

    /// Issues at most one purchase per call.
    pub(crate) fn act(&self, simulation: &mut Simulation) {
        let currency = simulation.ledger().currency;
        let free_slot = simulation.slots().iter().any(|slot| slot.occupant.is_none());

        if free_slot && currency >= self.economy.summon_cost {
            if let Err(reason) = simulation.summon(None) {
                tracing::debug!(target: "specter_defence::cli", %reason, "autopilot.summon_skipped");
            }
            return;
        }

        let guardians = simulation.guardians();
        let candidate = guardians
            .iter()
            .filter(|guardian| self.affordable(guardian, currency))
            .min_by_key(|guardian| (guardian.class.tier(), guardian.id));
        if let Some(guardian) = candidate {
            match simulation.promote(guardian.id, PromotionTarget::Role(None)) {
                Ok(class) => tracing::info!(
                    target: "specter_defence::cli",
                    guardian = ?guardian.id,
                    ?class,
                    "autopilot.promoted"
                ),
                Err(reason) => tracing::debug!(
                    target: "specter_defence::cli",
                    %reason,
                    "autopilot.promotion_skipped"
                ),
            }
        }
    }

    fn affordable(&self, guardian: &GuardianSnapshot, currency: u32) -> bool {
        guardian
            .class
            .upgrade_targets()
            .first()
            .map_or(false, |next| self.economy.promotion_cost(next.tier()) <= currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use specter_defence_core::GuardianClass;

    #[test]
    fn summons_until_broke_then_waits() {
        let mut config = SimulationConfig::default();
        config.economy.starting_currency = 120;
        let autopilot = Autopilot::new(&config);
        let mut simulation = Simulation::new(config);
        simulation.start();

        autopilot.act(&mut simulation);
        autopilot.act(&mut simulation);
        autopilot.act(&mut simulation);

        assert_eq!(simulation.guardians().len(), 2);
        assert_eq!(simulation.ledger().currency, 20);
    }

    #[test]
    fn promotes_once_every_slot_is_taken() {
        let mut config = SimulationConfig::default();
        config.field.slot_columns = 1;
        config.field.slot_rows = 1;
        config.economy.starting_currency = 300;
        let autopilot = Autopilot::new(&config);
        let mut simulation = Simulation::new(config);
        simulation.start();

        for _ in 0..4 {
            autopilot.act(&mut simulation);
        }

        assert_eq!(simulation.guardians().len(), 2);
        assert!(simulation
            .guardians()
            .iter()
            .all(|guardian| guardian.class != GuardianClass::SUMMONED));
        assert_eq!(simulation.ledger().currency, 0);
    }
}
