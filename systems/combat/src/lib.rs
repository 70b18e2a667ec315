#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that fires ready guardians and turns landed shots into hit plans.
//!
//! Firing mirrors the targeting output: every assignment whose guardian is
//! still ready becomes a `Command::FireProjectile`. Once the world reports a
//! landed projectile, [`Combat::resolve`] computes the damage pipeline
//!
//! 1. base damage scaled by the global multiplier and additive bonuses,
//! 2. a critical roll,
//! 3. the target's defense,
//! 4. the guardian's on-hit hooks,
//!
//! and packs the result into a [`HitPlan`] the world applies atomically.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use specter_defence_core::{
    AbilityHook, Command, EnemyId, EnemySnapshot, EnemyView, GuardianId, GuardianTarget,
    GuardianView, HitEffect, HitPlan, LedgerSnapshot, SecondaryHit,
};

/// Guardian combat system owning the random stream used for crits and hooks.
#[derive(Debug)]
pub struct Combat {
    scratch: Vec<Command>,
    effects: Vec<HitEffect>,
    rng: ChaCha8Rng,
}

impl Combat {
    /// Creates a combat system whose rolls derive from `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            scratch: Vec::new(),
            effects: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Emits `Command::FireProjectile` entries for guardians that are still ready.
    pub fn handle(
        &mut self,
        guardians: &GuardianView,
        targets: &[GuardianTarget],
        out: &mut Vec<Command>,
    ) {
        if targets.is_empty() || guardians.is_empty() {
            return;
        }

        self.scratch.clear();

        for target in targets {
            if let Some(snapshot) = guardians.get(target.guardian) {
                if snapshot.ready && snapshot.can_attack() {
                    self.scratch.push(Command::FireProjectile {
                        guardian: target.guardian,
                        target: target.enemy,
                    });
                }
            }
        }

        if self.scratch.is_empty() {
            return;
        }

        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }

    /// Computes the hit plan for a projectile that landed on `target`.
    ///
    /// Returns `None` when either the shooter or the target vanished between
    /// landing and resolution.
    pub fn resolve(
        &mut self,
        guardian: GuardianId,
        target: EnemyId,
        guardians: &GuardianView,
        enemies: &EnemyView,
        ledger: &LedgerSnapshot,
    ) -> Option<HitPlan> {
        let shooter = guardians.get(guardian)?;
        let victim = enemies.get(target)?;
        let stats = shooter.class.stats();
        let bonuses = &ledger.bonuses;

        let additive = 1.0
            + shooter.buffs.damage_bonus
            + bonuses.relic_damage
            + shooter.buffs.shrine_damage_bonus;
        let mut damage = stats.damage * ledger.global_damage_mult * additive.max(0.0);

        let crit_chance =
            (ledger.global_crit_chance + bonuses.relic_crit_chance + stats.innate_crit)
                .clamp(0.0, 1.0);
        let critical = self.rng.gen::<f32>() < crit_chance;
        if critical {
            damage *= ledger.global_crit_mult + bonuses.relic_crit_bonus;
        }

        damage *= (1.0 - victim.defense).max(0.0);

        self.effects.clear();
        shooter.class.on_hit(&mut self.rng, &mut self.effects);

        let mut secondary = Vec::new();
        let mut effects = Vec::with_capacity(self.effects.len());
        for effect in self.effects.drain(..) {
            match effect {
                HitEffect::Splash { radius, fraction } => {
                    secondary.extend(
                        enemies
                            .iter()
                            .filter(|enemy| enemy.id != target && splashable(enemy))
                            .filter(|enemy| enemy.position.within(victim.position, radius))
                            .map(|enemy| SecondaryHit {
                                enemy: enemy.id,
                                damage: damage * fraction,
                            }),
                    );
                }
                HitEffect::Retarget { fraction } => {
                    let range = shooter.effective_range;
                    let next = enemies
                        .iter()
                        .filter(|enemy| enemy.id != target && enemy.targetable())
                        .filter(|enemy| enemy.position.within(shooter.position, range))
                        .min_by(|a, b| {
                            let da = a.position.distance_sq(victim.position);
                            let db = b.position.distance_sq(victim.position);
                            da.total_cmp(&db).then(a.id.cmp(&b.id))
                        });
                    if let Some(next) = next {
                        secondary.push(SecondaryHit {
                            enemy: next.id,
                            damage: damage * fraction,
                        });
                    }
                }
                other => effects.push(other),
            }
        }

        tracing::trace!(
            target: "specter_defence::combat",
            ?guardian,
            ?target,
            damage,
            critical,
            secondary = secondary.len(),
            "hit.resolved"
        );

        Some(HitPlan {
            guardian,
            target,
            damage,
            critical,
            secondary,
            effects,
        })
    }
}

fn splashable(enemy: &EnemySnapshot) -> bool {
    enemy.hp > 0.0 && enemy.boarded.is_none()
}
