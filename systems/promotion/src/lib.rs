#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Promotion state machine: validates requests and picks the class a guardian becomes.
//!
//! Validation runs eligibility first, then population caps, then affordability,
//! so the reported reason always names the earliest failing gate. A role or
//! open request resolves through a weighted draw that strongly favours classes
//! not yet on the field.

use rand::{
    distributions::{Distribution, WeightedIndex},
    SeedableRng,
};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use specter_defence_core::{
    CapacityLimit, Command, CommandError, EconomyConfig, GuardianClass, GuardianId, GuardianView,
    LedgerSnapshot, Role,
};

/// Draw weight of a class with no instance on the field.
const UNREPRESENTED_WEIGHT: u32 = 10;
/// Draw weight of a class already on the field.
const REPRESENTED_WEIGHT: u32 = 1;

/// What the player asked a guardian to become.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PromotionTarget {
    /// Draw among the eligible classes, optionally restricted to a role.
    Role(Option<Role>),
    /// Promote into exactly this class.
    Class(GuardianClass),
}

/// Promotion system owning the random stream used by weighted draws.
#[derive(Debug)]
pub struct Promotion {
    rng: ChaCha8Rng,
    candidates: Vec<GuardianClass>,
    weights: Vec<u32>,
}

impl Promotion {
    /// Creates a promotion system whose draws derive from `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            candidates: Vec::new(),
            weights: Vec::new(),
        }
    }

    /// Resolves `target` for `guardian` and emits the matching promote command.
    ///
    /// Nothing is emitted when the request is rejected.
    pub fn handle(
        &mut self,
        guardian: GuardianId,
        target: PromotionTarget,
        guardians: &GuardianView,
        ledger: &LedgerSnapshot,
        economy: &EconomyConfig,
        out: &mut Vec<Command>,
    ) -> Result<GuardianClass, CommandError> {
        let current = guardians
            .get(guardian)
            .ok_or(CommandError::UnknownGuardian(guardian))?
            .class;

        self.candidates.clear();
        match target {
            PromotionTarget::Class(class) => {
                if current.upgrade_targets().contains(&class) {
                    self.candidates.push(class);
                }
            }
            PromotionTarget::Role(role) => self.candidates.extend(
                current
                    .upgrade_targets()
                    .iter()
                    .copied()
                    .filter(|class| role.map_or(true, |role| class.role() == Some(role))),
            ),
        }
        let Some(&first) = self.candidates.first() else {
            return Err(CommandError::NoEligibleTarget);
        };

        self.candidates
            .retain(|class| below_cap(*class, population(guardians, *class)));
        if self.candidates.is_empty() {
            let cap = first.tier().population_cap().unwrap_or(0);
            return Err(CommandError::CapacityExceeded(
                CapacityLimit::ClassPopulation { class: first, cap },
            ));
        }

        let required = economy.promotion_cost(first.tier());
        if ledger.currency < required {
            return Err(CommandError::InsufficientResources {
                required,
                available: ledger.currency,
            });
        }

        let class = self.draw(guardians)?;
        tracing::debug!(
            target: "specter_defence::promotion",
            ?guardian,
            from = ?current,
            to = ?class,
            "promotion.chosen"
        );
        out.push(Command::PromoteGuardian { guardian, class });
        Ok(class)
    }

    fn draw(&mut self, guardians: &GuardianView) -> Result<GuardianClass, CommandError> {
        if let [only] = self.candidates.as_slice() {
            return Ok(*only);
        }

        self.weights.clear();
        self.weights.extend(self.candidates.iter().map(|class| {
            if population(guardians, *class) == 0 {
                UNREPRESENTED_WEIGHT
            } else {
                REPRESENTED_WEIGHT
            }
        }));
        let index = WeightedIndex::new(&self.weights)
            .map_err(|_| CommandError::NoEligibleTarget)?
            .sample(&mut self.rng);
        Ok(self.candidates[index])
    }
}

fn population(guardians: &GuardianView, class: GuardianClass) -> usize {
    guardians
        .iter()
        .filter(|snapshot| snapshot.class == class)
        .count()
}

fn below_cap(class: GuardianClass, population: usize) -> bool {
    class
        .tier()
        .population_cap()
        .map_or(true, |cap| population < cap)
}
