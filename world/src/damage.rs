//! Damage application, death handling and the time-freeze bank.

use std::time::Duration;

use rand::Rng;
use specter_defence_core::{
    AbilityHook, DeathEffect, EnemyId, Event, GuardianId, HitEffect, HitPlan, SpawnOrder,
};

use crate::World;

/// Attribution of a damage instance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct DamageSource {
    /// Guardian credited with the damage.
    pub(crate) killer: Option<GuardianId>,
    /// Shared damage never propagates through links and never triggers kill effects.
    pub(crate) shared: bool,
}

impl DamageSource {
    pub(crate) const fn primary(killer: Option<GuardianId>) -> Self {
        Self {
            killer,
            shared: false,
        }
    }

    pub(crate) const fn shared(killer: Option<GuardianId>) -> Self {
        Self {
            killer,
            shared: true,
        }
    }
}

pub(crate) fn extend(window: &mut Option<Duration>, until: Duration) {
    *window = Some(window.map_or(until, |current| current.max(until)));
}

impl World {
    pub(crate) fn freeze_active(&self) -> bool {
        self.freeze_until.is_some_and(|until| self.now < until)
    }

    /// Applies `amount` to an enemy, banking it during a time freeze.
    pub(crate) fn apply_damage(
        &mut self,
        enemy: EnemyId,
        amount: f32,
        source: DamageSource,
        out: &mut Vec<Event>,
    ) {
        let _ = self.deal_damage(enemy, amount, source, out);
    }

    /// Same as [`World::apply_damage`], returning the hp actually removed.
    ///
    /// Banked, ignored and overkill damage do not count.
    pub(crate) fn deal_damage(
        &mut self,
        enemy: EnemyId,
        amount: f32,
        source: DamageSource,
        out: &mut Vec<Event>,
    ) -> f32 {
        if amount <= 0.0 {
            return 0.0;
        }
        let now = self.now;
        let freeze_active = self.freeze_active();
        let bonuses = self.ledger.bonuses();
        let bestiary_bonus = bonuses.bestiary_bonus;
        let execute_threshold = bonuses.execute_threshold;

        let Some(state) = self.registry.enemy_mut(enemy) else {
            return 0.0;
        };
        if state.hp <= 0.0 || state.flush_guard == Some(now) {
            return 0.0;
        }
        if freeze_active && !state.is_boss() {
            state.banked += amount;
            return 0.0;
        }

        let before = state.hp;
        let mut scaled = amount;
        if self.bestiary.contains(&state.kind) {
            scaled *= 1.0 + bestiary_bonus;
        }
        state.hp = (state.hp - scaled).max(0.0);
        if let Some(threshold) = execute_threshold {
            if state.max_hp > 0.0 && state.hp / state.max_hp <= threshold {
                state.hp = 0.0;
            }
        }
        let died = state.hp <= 0.0;
        let dealt = before - state.hp;
        let link = if source.shared {
            None
        } else {
            state.active_link(now)
        };

        if let Some(link) = link {
            let share = amount * self.config.combat.link_share;
            let mates: Vec<EnemyId> = self
                .registry
                .enemies
                .iter()
                .filter(|mate| {
                    mate.id != enemy && mate.hp > 0.0 && mate.active_link(now) == Some(link)
                })
                .map(|mate| mate.id)
                .collect();
            for mate in mates {
                self.apply_damage(mate, share, DamageSource::shared(source.killer), out);
            }
        }

        if died {
            self.handle_death(enemy, source, out);
        }
        dealt
    }

    /// Removes a dead enemy and resolves every consequence exactly once.
    pub(crate) fn handle_death(&mut self, enemy: EnemyId, source: DamageSource, out: &mut Vec<Event>) {
        let Some(index) = self.registry.enemy_index(enemy) else {
            return;
        };
        let victim = self.registry.enemies.remove(index);

        let mut reward = victim.kind.stats().reward;
        let treasure_chance = f64::from(self.ledger.treasure_chance());
        if treasure_chance > 0.0 && self.rng.gen_bool(treasure_chance.min(1.0)) {
            reward = reward.saturating_mul(2);
        }
        self.ledger.credit(reward);
        let _ = self.bestiary.insert(victim.kind);
        self.stage.resolve_boss(enemy);

        for passenger in self
            .registry
            .enemies
            .iter_mut()
            .filter(|passenger| passenger.boarded == Some(enemy))
        {
            passenger.boarded = None;
            passenger.position = victim.position;
        }

        out.push(Event::EnemyDied {
            enemy,
            kind: victim.kind,
            reward,
            killer: source.killer,
        });

        let mut effects = Vec::new();
        victim.kind.on_death(&mut effects);
        if !source.shared {
            if let Some(killer) = source.killer {
                if let Ok(guardian) = self.registry.guardian(killer) {
                    guardian.class.on_death(&mut effects);
                }
            }
        }

        for effect in effects {
            match effect {
                DeathEffect::Split { kind, count } => {
                    for _ in 0..count {
                        let _ = self.spawn_enemy(
                            SpawnOrder {
                                kind,
                                origin: victim.position,
                                hp_multiplier: victim.hp_multiplier,
                                speed_multiplier: victim.speed_multiplier,
                                wave_member: false,
                            },
                            out,
                        );
                    }
                }
                DeathEffect::RaiseSummon(kind) => self.raise_summon(kind, victim.position, out),
                DeathEffect::Explode { radius, fraction } => {
                    let damage = victim.max_hp * fraction;
                    let caught: Vec<EnemyId> = self
                        .registry
                        .enemies
                        .iter()
                        .filter(|other| {
                            other.boarded.is_none() && victim.position.within(other.position, radius)
                        })
                        .map(|other| other.id)
                        .collect();
                    for other in caught {
                        self.apply_damage(other, damage, DamageSource::shared(source.killer), out);
                    }
                }
            }
        }
    }

    /// Applies a landed shot: modifiers, shared hits, primary hit, field effects, siphon.
    pub(crate) fn apply_hit(&mut self, plan: HitPlan, out: &mut Vec<Event>) {
        let now = self.now;
        let Some(target) = self.registry.enemy_mut(plan.target) else {
            return;
        };
        let origin = target.position;

        for effect in &plan.effects {
            match *effect {
                HitEffect::DefenseShred { amount } => {
                    target.defense = (target.defense - amount).max(0.0);
                }
                HitEffect::Ignite { duration } => {
                    extend(&mut target.burn_until, now + duration);
                    target.burn_source = Some(plan.guardian);
                }
                HitEffect::Silence { duration } => {
                    extend(&mut target.silenced_until, now + duration);
                }
                _ => {}
            }
        }

        for hit in &plan.secondary {
            self.apply_damage(
                hit.enemy,
                hit.damage,
                DamageSource::shared(Some(plan.guardian)),
                out,
            );
        }

        let dealt = self.deal_damage(
            plan.target,
            plan.damage,
            DamageSource::primary(Some(plan.guardian)),
            out,
        );

        for effect in &plan.effects {
            match *effect {
                HitEffect::Ground {
                    kind,
                    radius,
                    duration,
                } => self.place_ground_effect(kind, origin, radius, duration, out),
                HitEffect::TimeFreeze { duration } => self.start_time_freeze(duration, out),
                _ => {}
            }
        }

        for effect in &plan.effects {
            if let HitEffect::Siphon { fraction } = *effect {
                self.ledger.drain_corruption(dealt * fraction);
            }
        }
    }

    pub(crate) fn start_time_freeze(&mut self, duration: Duration, out: &mut Vec<Event>) {
        extend(&mut self.freeze_until, self.now + duration);
        if let Some(until) = self.freeze_until {
            out.push(Event::TimeFreezeStarted { until });
        }
    }

    /// Releases banked damage once the freeze window has elapsed.
    ///
    /// Released damage bypasses bestiary bonuses and links; every enemy hit by
    /// the release ignores further damage until the clock advances.
    pub(crate) fn release_time_freeze(&mut self, out: &mut Vec<Event>) {
        let Some(until) = self.freeze_until else {
            return;
        };
        if self.now < until {
            return;
        }
        self.freeze_until = None;

        let now = self.now;
        let multiplier = self.config.combat.freeze_release_multiplier;
        let mut released = 0.0;
        let mut dead = Vec::new();
        for enemy in self.registry.enemies.iter_mut() {
            if enemy.banked <= 0.0 {
                continue;
            }
            let damage = enemy.banked * multiplier;
            enemy.banked = 0.0;
            enemy.hp = (enemy.hp - damage).max(0.0);
            enemy.flush_guard = Some(now);
            released += damage;
            if enemy.hp <= 0.0 {
                dead.push(enemy.id);
            }
        }

        out.push(Event::TimeFreezeEnded { released });
        for enemy in dead {
            self.handle_death(enemy, DamageSource::shared(None), out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{apply, query};
    use specter_defence_core::{
        Command, Position, SecondaryHit, SimulationConfig, SpecterKind,
    };

    fn world_with_enemies(kinds: &[SpecterKind]) -> (World, Vec<EnemyId>) {
        world_from_config(SimulationConfig::default(), kinds)
    }

    fn world_from_config(
        mut config: SimulationConfig,
        kinds: &[SpecterKind],
    ) -> (World, Vec<EnemyId>) {
        config.ledger.treasure_chance = 0.0;
        config.combat.boarding_chance = 0.0;
        let mut world = World::new(config);
        let mut events = Vec::new();
        apply(&mut world, Command::Start, &mut events);
        let ids = kinds
            .iter()
            .enumerate()
            .map(|(index, kind)| {
                world.spawn_enemy(
                    SpawnOrder {
                        kind: *kind,
                        origin: Position::new(100.0 + index as f32 * 10.0, 100.0),
                        hp_multiplier: 1.0,
                        speed_multiplier: 1.0,
                        wave_member: false,
                    },
                    &mut events,
                )
            })
            .collect();
        (world, ids)
    }

    #[test]
    fn hp_is_clamped_and_death_fires_once() {
        let (mut world, ids) = world_with_enemies(&[SpecterKind::Wisp]);
        let mut events = Vec::new();

        world.apply_damage(ids[0], 1_000.0, DamageSource::primary(None), &mut events);
        world.apply_damage(ids[0], 1_000.0, DamageSource::primary(None), &mut events);
        world.handle_death(ids[0], DamageSource::primary(None), &mut events);

        let deaths = events
            .iter()
            .filter(|event| matches!(event, Event::EnemyDied { .. }))
            .count();
        assert_eq!(deaths, 1);
        assert!(query::enemy_view(&world).is_empty());
        assert_eq!(
            query::ledger(&world).currency,
            100 + SpecterKind::Wisp.stats().reward
        );
    }

    #[test]
    fn bestiary_amplifies_damage_against_known_species() {
        let (mut world, ids) = world_with_enemies(&[SpecterKind::Wisp, SpecterKind::Wisp]);
        let mut events = Vec::new();
        world.apply_damage(ids[0], 1_000.0, DamageSource::primary(None), &mut events);

        world.apply_damage(ids[1], 10.0, DamageSource::primary(None), &mut events);
        let survivor = *query::enemy_view(&world).get(ids[1]).expect("alive");
        assert!((survivor.hp - (40.0 - 11.0)).abs() < 1e-4);
    }

    #[test]
    fn frozen_damage_is_banked_and_released_doubled() {
        let (mut world, ids) = world_with_enemies(&[SpecterKind::Brute]);
        let mut events = Vec::new();
        world.start_time_freeze(Duration::from_secs(1), &mut events);

        world.apply_damage(ids[0], 12.0, DamageSource::primary(None), &mut events);
        world.apply_damage(ids[0], 30.0, DamageSource::primary(None), &mut events);
        let banked = *query::enemy_view(&world).get(ids[0]).expect("alive");
        assert_eq!(banked.hp, banked.max_hp);
        assert!((banked.banked - 42.0).abs() < 1e-4);

        world.now = Duration::from_secs(1);
        world.release_time_freeze(&mut events);
        world.apply_damage(ids[0], 50.0, DamageSource::primary(None), &mut events);

        let released = *query::enemy_view(&world).get(ids[0]).expect("alive");
        assert!((released.max_hp - released.hp - 84.0).abs() < 1e-3);
        assert!(events.contains(&Event::TimeFreezeEnded { released: 84.0 }));
    }

    #[test]
    fn bosses_ignore_the_freeze_bank() {
        let (mut world, ids) = world_with_enemies(&[SpecterKind::Colossus]);
        let mut events = Vec::new();
        world.start_time_freeze(Duration::from_secs(1), &mut events);
        world.apply_damage(ids[0], 100.0, DamageSource::primary(None), &mut events);

        let boss = *query::enemy_view(&world).get(ids[0]).expect("alive");
        assert_eq!(boss.banked, 0.0);
        assert!((boss.max_hp - boss.hp - 100.0).abs() < 1e-3);
    }

    #[test]
    fn links_share_half_of_primary_damage_once() {
        let (mut world, ids) = world_with_enemies(&[SpecterKind::Brute, SpecterKind::Brute]);
        let until = world.now + Duration::from_secs(5);
        for id in &ids {
            world.registry.enemy_mut(*id).expect("enemy").link = Some((7, until));
        }
        let mut events = Vec::new();
        world.apply_damage(ids[0], 40.0, DamageSource::primary(None), &mut events);
        world.apply_damage(ids[0], 40.0, DamageSource::shared(None), &mut events);

        let view = query::enemy_view(&world);
        let first = view.get(ids[0]).expect("alive");
        let second = view.get(ids[1]).expect("alive");
        assert!((first.max_hp - first.hp - 80.0).abs() < 1e-3);
        assert!((second.max_hp - second.hp - 20.0).abs() < 1e-3);
    }

    #[test]
    fn shared_kills_skip_killer_death_effects() {
        let (mut world, ids) = world_with_enemies(&[SpecterKind::Wisp, SpecterKind::Wisp]);
        let mut events = Vec::new();
        let summoned = world.summon_guardian(None).expect("summon");
        let Event::GuardianSummoned { guardian, .. } = summoned else {
            panic!("unexpected event {summoned:?}");
        };
        world
            .registry
            .guardian_mut(guardian)
            .expect("guardian")
            .class = specter_defence_core::GuardianClass::Advanced(
            specter_defence_core::AdvancedClass::Reaper,
        );

        world.apply_hit(
            HitPlan {
                guardian,
                target: ids[0],
                damage: 1_000.0,
                critical: false,
                secondary: vec![SecondaryHit {
                    enemy: ids[1],
                    damage: 1_000.0,
                }],
                effects: Vec::new(),
            },
            &mut events,
        );

        let raised = events
            .iter()
            .filter(|event| matches!(event, Event::SummonRaised { .. }))
            .count();
        assert_eq!(raised, 1);
        assert!(query::enemy_view(&world).is_empty());
    }

    #[test]
    fn revenant_splits_on_any_death() {
        let (mut world, ids) = world_with_enemies(&[SpecterKind::Revenant]);
        let mut events = Vec::new();
        world.apply_damage(ids[0], 1_000.0, DamageSource::shared(None), &mut events);

        let kinds: Vec<SpecterKind> = query::enemy_view(&world)
            .iter()
            .map(|enemy| enemy.kind)
            .collect();
        assert_eq!(kinds, vec![SpecterKind::Wisp, SpecterKind::Wisp]);
    }

    fn siphon_shot(target: EnemyId, damage: f32) -> HitPlan {
        HitPlan {
            guardian: GuardianId::new(0),
            target,
            damage,
            critical: false,
            secondary: Vec::new(),
            effects: vec![HitEffect::Siphon { fraction: 0.02 }],
        }
    }

    #[test]
    fn siphon_drains_only_damage_that_landed() {
        let (mut world, ids) = world_with_enemies(&[SpecterKind::Brute, SpecterKind::Wisp]);
        world.ledger.add_corruption(50.0);
        let mut events = Vec::new();

        world.start_time_freeze(Duration::from_secs(5), &mut events);
        world.apply_hit(siphon_shot(ids[0], 1_000.0), &mut events);
        let brute = *query::enemy_view(&world).get(ids[0]).expect("alive");
        assert_eq!(brute.hp, brute.max_hp);
        assert_eq!(brute.banked, 1_000.0);
        assert_eq!(query::ledger(&world).corruption, 50.0);

        world.freeze_until = None;
        world.apply_hit(siphon_shot(ids[1], 1_000.0), &mut events);
        let corruption = query::ledger(&world).corruption;
        assert!((corruption - (50.0 - 40.0 * 0.02)).abs() < 1e-4);
    }

    #[test]
    fn execute_threshold_kills_at_exactly_the_boundary() {
        let mut config = SimulationConfig::default();
        config.bonuses.execute_threshold = Some(0.5);
        let (mut world, ids) =
            world_from_config(config, &[SpecterKind::Brute, SpecterKind::Brute]);
        let mut events = Vec::new();

        world.apply_damage(ids[0], 129.0, DamageSource::primary(None), &mut events);
        world.apply_damage(ids[1], 130.0, DamageSource::primary(None), &mut events);

        let deaths: Vec<EnemyId> = events
            .iter()
            .filter_map(|event| match event {
                Event::EnemyDied { enemy, .. } => Some(*enemy),
                _ => None,
            })
            .collect();
        assert_eq!(deaths, vec![ids[1]]);
        let survivor = *query::enemy_view(&world).get(ids[0]).expect("alive");
        assert_eq!(survivor.hp, 131.0);
    }
}
