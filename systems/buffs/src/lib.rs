#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that recomputes every guardian's transient bonuses.
//!
//! Bonuses are never carried between ticks: each invocation starts from the
//! relic baseline and rescans every support aura and shrine pairwise, so a
//! support that moves away stops contributing on the very next tick.

use specter_defence_core::{
    BuffSheet, GuardianSnapshot, GuardianView, LedgerSnapshot, ShrineReach, SupportAura,
};

/// Amplification global shrines receive from shrine mastery.
const MASTERY_AMPLIFIER: f32 = 1.5;

/// Speed penalties applied once corruption reaches each ratio, highest first.
const CORRUPTION_PENALTIES: [(f32, f32); 3] = [(0.75, -0.35), (0.5, -0.2), (0.3, -0.1)];

/// Buff propagation system that reuses its scratch buffer between ticks.
#[derive(Debug, Default)]
pub struct BuffPropagation {
    guardians: Vec<GuardianSnapshot>,
}

impl BuffPropagation {
    /// Creates a new buff propagation system.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits one [`BuffSheet`] per guardian, in identifier order.
    ///
    /// `aura_radius` is the base support radius; the relic aura bonus from the
    /// ledger is added on top.
    pub fn handle(
        &mut self,
        guardians: &GuardianView,
        ledger: &LedgerSnapshot,
        aura_radius: f32,
        out: &mut Vec<BuffSheet>,
    ) {
        out.clear();
        self.guardians.clear();
        self.guardians.extend(guardians.iter().copied());
        if self.guardians.is_empty() {
            return;
        }

        let bonuses = &ledger.bonuses;
        let radius = aura_radius + bonuses.aura_radius;
        let penalty = corruption_penalty(ledger.corruption_ratio());

        for receiver in &self.guardians {
            let mut sheet = BuffSheet {
                speed_bonus: bonuses.relic_speed + penalty,
                range_bonus: bonuses.relic_range,
                ..BuffSheet::baseline(receiver.id)
            };

            for source in &self.guardians {
                if source.id == receiver.id {
                    continue;
                }

                if let Some(aura) = source.class.support_aura() {
                    if source.position.within(receiver.position, radius) {
                        match aura {
                            SupportAura::Range(bonus) | SupportAura::WideRange(bonus) => {
                                sheet.range_bonus += bonus;
                            }
                            SupportAura::Tempo { speed, damage } => {
                                sheet.speed_bonus += speed;
                                sheet.damage_bonus += damage;
                            }
                        }
                    }
                }

                if let Some(shrine) = source.class.shrine() {
                    let reaches = match shrine.reach {
                        ShrineReach::Directional => {
                            receiver.class.shrine().is_none()
                                && (source.coord.is_forward_of(receiver.coord)
                                    || (bonuses.shrine_mastery
                                        && source.coord.is_row_neighbour(receiver.coord)))
                        }
                        ShrineReach::Global => true,
                    };
                    if !reaches {
                        continue;
                    }
                    let mut scale = if source.demolishing { -1.0 } else { 1.0 };
                    if shrine.reach == ShrineReach::Global && bonuses.shrine_mastery {
                        scale *= MASTERY_AMPLIFIER;
                    }
                    sheet.shrine_damage_bonus += shrine.damage * scale;
                    sheet.speed_bonus += shrine.speed * scale;
                }
            }

            out.push(sheet);
        }
    }
}

/// Attack speed penalty for the provided corruption ratio.
#[must_use]
pub fn corruption_penalty(ratio: f32) -> f32 {
    CORRUPTION_PENALTIES
        .iter()
        .find(|(threshold, _)| ratio >= *threshold)
        .map_or(0.0, |(_, penalty)| *penalty)
}
