//! Validated player and combat commands.
//!
//! Every handler validates before mutating, so a rejected command leaves the
//! world untouched.

use specter_defence_core::{
    BuffSheet, CapacityLimit, CommandError, EnemyId, Event, GuardianClass, GuardianId, RunPhase,
    SlotId,
};

use crate::{
    registry::{GuardianState, Projectile},
    World,
};

impl World {
    fn ensure_active(&self) -> Result<(), CommandError> {
        if self.phase == RunPhase::Ended {
            return Err(CommandError::RunOver);
        }
        Ok(())
    }

    /// Bonuses a guardian has before auras and shrines are applied.
    pub(crate) fn baseline_buffs(&self, guardian: GuardianId) -> BuffSheet {
        let bonuses = self.ledger.bonuses();
        BuffSheet {
            speed_bonus: bonuses.relic_speed,
            range_bonus: bonuses.relic_range,
            ..BuffSheet::baseline(guardian)
        }
    }

    pub(crate) fn summon_guardian(&mut self, hint: Option<SlotId>) -> Result<Event, CommandError> {
        self.ensure_active()?;
        let cost = self.config.economy.summon_cost;
        self.ledger.ensure_affordable(cost)?;
        let slot = self.registry.claimable_slot(hint)?;
        self.ledger.debit(cost)?;

        let id = self.registry.allocate_guardian_id();
        let class = GuardianClass::SUMMONED;
        let buffs = self.baseline_buffs(id);
        self.registry.guardians.push(GuardianState {
            id,
            class,
            slot,
            last_fired_at: None,
            spent: cost,
            buffs,
            charges: class.initial_charges(),
            stunned_until: None,
            frozen_until: None,
            demolishing: false,
        });
        self.registry.set_occupant(slot, Some(id));

        Ok(Event::GuardianSummoned {
            guardian: id,
            slot,
            cost,
        })
    }

    pub(crate) fn promote_guardian(
        &mut self,
        guardian: GuardianId,
        class: GuardianClass,
    ) -> Result<Event, CommandError> {
        self.ensure_active()?;
        let from = self.registry.guardian(guardian)?.class;
        if !from.upgrade_targets().contains(&class) {
            return Err(CommandError::NoEligibleTarget);
        }
        if let Some(cap) = class.tier().population_cap() {
            if self.registry.population(class) >= cap {
                return Err(CommandError::CapacityExceeded(
                    CapacityLimit::ClassPopulation { class, cap },
                ));
            }
        }
        let cost = self.config.economy.promotion_cost(class.tier());
        self.ledger.debit(cost)?;

        let now = self.now;
        let buffs = self.baseline_buffs(guardian);
        if let Some(state) = self.registry.guardian_mut(guardian) {
            state.class = class;
            state.last_fired_at = Some(now);
            state.buffs = buffs;
            state.spent = state.spent.saturating_add(cost);
            state.charges = class.initial_charges();
            state.demolishing = false;
        }
        let _ = self.unlocked.insert(class);

        Ok(Event::GuardianPromoted {
            guardian,
            from,
            to: class,
            cost,
        })
    }

    pub(crate) fn sell_guardian(&mut self, guardian: GuardianId) -> Result<Event, CommandError> {
        self.ensure_active()?;
        let index = self
            .registry
            .guardians
            .iter()
            .position(|state| state.id == guardian)
            .ok_or(CommandError::UnknownGuardian(guardian))?;

        let state = self.registry.guardians.remove(index);
        let refund = self.config.economy.refund_for(state.spent);
        self.ledger.credit(refund);
        self.registry.set_occupant(state.slot, None);

        Ok(Event::GuardianSold {
            guardian,
            class: state.class,
            slot: state.slot,
            refund,
        })
    }

    pub(crate) fn move_guardian(
        &mut self,
        guardian: GuardianId,
        slot: SlotId,
    ) -> Result<Event, CommandError> {
        self.ensure_active()?;
        let state = self.registry.guardian(guardian)?;
        if state.is_frozen(self.now) {
            return Err(CommandError::GuardianLocked(guardian));
        }
        let from = state.slot;
        let to = self.registry.free_slot(slot)?;

        self.registry.set_occupant(from, None);
        self.registry.set_occupant(to, Some(guardian));
        if let Some(state) = self.registry.guardian_mut(guardian) {
            state.slot = to;
        }

        Ok(Event::GuardianMoved { guardian, from, to })
    }

    pub(crate) fn set_shrine_demolishing(
        &mut self,
        guardian: GuardianId,
        demolishing: bool,
    ) -> Result<Event, CommandError> {
        self.ensure_active()?;
        if self.registry.guardian(guardian)?.class.shrine().is_none() {
            return Err(CommandError::InvalidTarget);
        }
        if let Some(state) = self.registry.guardian_mut(guardian) {
            state.demolishing = demolishing;
        }
        Ok(Event::ShrineStateChanged {
            guardian,
            demolishing,
        })
    }

    /// Fires a shot if the guardian is ready and the target is valid and in range.
    pub(crate) fn fire_projectile(
        &mut self,
        guardian: GuardianId,
        target: EnemyId,
    ) -> Result<Event, CommandError> {
        self.ensure_active()?;
        let now = self.now;
        let state = self.registry.guardian(guardian)?;
        let attacks = state.class.shrine().is_none() && state.class.stats().damage > 0.0;
        if !attacks || state.is_stunned(now) || state.is_frozen(now) || !state.is_ready(now) {
            return Err(CommandError::GuardianLocked(guardian));
        }
        let origin = self.registry.guardian_position(state);
        let range = state.effective_range();
        let valid = self
            .registry
            .enemy(target)
            .is_some_and(|enemy| enemy.targetable() && origin.within(enemy.position, range));
        if !valid {
            return Err(CommandError::InvalidTarget);
        }

        let projectile = self.registry.allocate_projectile_id();
        let resolve_at = now + self.config.combat.projectile_delay();
        self.registry.projectiles.push(Projectile {
            id: projectile,
            guardian,
            target,
            resolve_at,
        });
        if let Some(state) = self.registry.guardian_mut(guardian) {
            state.last_fired_at = Some(now);
        }

        Ok(Event::ProjectileFired {
            projectile,
            guardian,
            target,
        })
    }

    /// Lands or wastes every shot whose delay has elapsed.
    pub(crate) fn resolve_projectiles(&mut self, out: &mut Vec<Event>) {
        let now = self.now;
        let (due, pending): (Vec<Projectile>, Vec<Projectile>) = self
            .registry
            .projectiles
            .drain(..)
            .partition(|projectile| projectile.resolve_at <= now);
        self.registry.projectiles = pending;

        for projectile in due {
            let shooter_alive = self.registry.guardian(projectile.guardian).is_ok();
            let target_alive = self
                .registry
                .enemy(projectile.target)
                .is_some_and(|enemy| enemy.hp > 0.0 && enemy.boarded.is_none());
            if shooter_alive && target_alive {
                out.push(Event::ProjectileLanded {
                    projectile: projectile.id,
                    guardian: projectile.guardian,
                    target: projectile.target,
                });
            } else {
                out.push(Event::ShotWasted {
                    projectile: projectile.id,
                    guardian: projectile.guardian,
                });
            }
        }
    }
}
