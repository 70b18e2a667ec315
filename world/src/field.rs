//! Enemy motion, escapes, summons and ground effects.

use std::time::Duration;

use rand::Rng;
use specter_defence_core::{
    Behavior, EnemyId, Event, GroundEffectKind, Position, SpawnOrder, SpecterKind, SummonKind,
};

use crate::{
    damage::{extend, DamageSource},
    registry::{EnemyState, GroundEffect, Summon},
    World,
};

impl World {
    /// Creates an enemy, possibly boarding it onto a living carrier boss.
    pub(crate) fn spawn_enemy(&mut self, order: SpawnOrder, out: &mut Vec<Event>) -> EnemyId {
        let now = self.now;
        let stats = order.kind.stats();
        let id = self.registry.allocate_enemy_id();
        let hp = (stats.hp * order.hp_multiplier).max(1.0);
        let next_pulse_at = match order.kind.behavior() {
            Behavior::Pulse { period } => Some(now + period),
            _ => None,
        };
        let carrier = if order.kind.is_boss() {
            None
        } else {
            self.boarding_carrier()
        };
        let position = carrier
            .and_then(|carrier| self.registry.enemy(carrier))
            .map_or(order.origin, |carrier| carrier.position);

        self.registry.enemies.push(EnemyState {
            id,
            kind: order.kind,
            position,
            hp,
            max_hp: hp,
            defense: stats.defense,
            speed: stats.speed * order.speed_multiplier.max(0.0),
            hp_multiplier: order.hp_multiplier,
            speed_multiplier: order.speed_multiplier,
            spawned_at: now,
            burn_until: None,
            burn_source: None,
            silenced_until: None,
            sealed: false,
            slowed: false,
            stealthed: false,
            boarded: carrier,
            link: None,
            banked: 0.0,
            flush_guard: None,
            next_pulse_at,
        });

        if order.wave_member {
            self.stage.record_spawn(now);
        }
        out.push(Event::EnemySpawned {
            enemy: id,
            kind: order.kind,
            position,
        });
        if order.kind.is_boss() && self.stage.record_boss(id) {
            out.push(Event::BossSpawned {
                enemy: id,
                kind: order.kind,
            });
        }
        if let Some(carrier) = carrier {
            out.push(Event::EnemyBoarded {
                enemy: id,
                carrier,
            });
        }
        id
    }

    fn boarding_carrier(&mut self) -> Option<EnemyId> {
        let chance = self.config.combat.boarding_chance;
        let carrier = self.registry.enemies.iter().find_map(|enemy| {
            let Behavior::Carrier { capacity } = enemy.kind.behavior() else {
                return None;
            };
            let passengers = self
                .registry
                .enemies
                .iter()
                .filter(|passenger| passenger.boarded == Some(enemy.id))
                .count();
            (enemy.hp > 0.0 && passengers < capacity as usize).then_some(enemy.id)
        })?;
        if chance <= 0.0 || !self.rng.gen_bool(chance.min(1.0)) {
            return None;
        }
        Some(carrier)
    }

    /// Moves enemies toward the goal and resolves escapes.
    pub(crate) fn advance_enemies(&mut self, out: &mut Vec<Event>) {
        let dt = self.last_dt.as_secs_f32();
        let frozen = self.freeze_active();
        let slow_factor = self.config.combat.slow_factor;
        let lane_length = self.config.field.lane_length;

        for enemy in self.registry.enemies.iter_mut() {
            if enemy.boarded.is_some() || (frozen && !enemy.is_boss()) {
                continue;
            }
            let factor = if enemy.slowed { slow_factor } else { 1.0 };
            enemy.position.y += enemy.speed * factor * dt;
        }

        let carriers: Vec<(EnemyId, Position)> = self
            .registry
            .enemies
            .iter()
            .filter(|enemy| matches!(enemy.kind.behavior(), Behavior::Carrier { .. }))
            .map(|enemy| (enemy.id, enemy.position))
            .collect();
        for enemy in self.registry.enemies.iter_mut() {
            if let Some(carrier) = enemy.boarded {
                if let Some((_, position)) = carriers.iter().find(|(id, _)| *id == carrier) {
                    enemy.position = *position;
                }
            }
        }

        let escaped: Vec<EnemyId> = self
            .registry
            .enemies
            .iter()
            .filter(|enemy| enemy.boarded.is_none() && enemy.position.y >= lane_length)
            .map(|enemy| enemy.id)
            .collect();
        for enemy in escaped {
            self.resolve_escape(enemy, out);
        }
    }

    /// Banishes an escaping minion with a spare charge, otherwise adds corruption.
    fn resolve_escape(&mut self, enemy: EnemyId, out: &mut Vec<Event>) {
        let Some(index) = self.registry.enemy_index(enemy) else {
            return;
        };

        if !self.registry.enemies[index].is_boss() {
            let banisher = self
                .registry
                .guardians
                .iter_mut()
                .find(|guardian| guardian.charges.is_some_and(|charges| charges > 0));
            if let Some(guardian) = banisher {
                guardian.charges = guardian.charges.map(|charges| charges - 1);
                let guardian = guardian.id;
                let _ = self.registry.enemies.remove(index);
                out.push(Event::EnemyBanished { enemy, guardian });
                return;
            }
        }

        let escapee = self.registry.enemies.remove(index);
        self.escape(escapee.id, escapee.kind, out);

        if escapee.is_boss() {
            self.stage.resolve_boss(enemy);
            let passengers: Vec<EnemyState> = self
                .registry
                .enemies
                .iter()
                .filter(|passenger| passenger.boarded == Some(enemy))
                .cloned()
                .collect();
            self.registry
                .enemies
                .retain(|passenger| passenger.boarded != Some(enemy));
            for passenger in passengers {
                self.escape(passenger.id, passenger.kind, out);
            }
        }
    }

    fn escape(&mut self, enemy: EnemyId, kind: SpecterKind, out: &mut Vec<Event>) {
        let corruption = kind.stats().corruption;
        self.ledger.add_corruption(corruption);
        out.push(Event::EnemyEscaped {
            enemy,
            kind,
            corruption,
        });
    }

    pub(crate) fn raise_summon(&mut self, kind: SummonKind, position: Position, out: &mut Vec<Event>) {
        let id = self.registry.allocate_summon_id();
        self.registry.summons.push(Summon {
            id,
            kind,
            position,
            last_attack_at: None,
            expires_at: self.now + kind.stats().lifetime,
        });
        out.push(Event::SummonRaised { summon: id, kind });
    }

    /// Moves summons, expires them and resolves their attacks.
    pub(crate) fn advance_summons(&mut self, out: &mut Vec<Event>) {
        let now = self.now;
        let dt = self.last_dt.as_secs_f32();
        let lane_length = self.config.field.lane_length;

        self.registry.summons.retain(|summon| {
            let keep = now < summon.expires_at && summon.position.y < lane_length;
            if !keep {
                out.push(Event::SummonExpired { summon: summon.id });
            }
            keep
        });

        let mut strikes = Vec::new();
        for summon in self.registry.summons.iter_mut() {
            let stats = summon.kind.stats();
            summon.position.y += stats.speed * dt;

            let ready = summon
                .last_attack_at
                .map_or(true, |last| now.saturating_sub(last) >= stats.attack_interval);
            if !ready {
                continue;
            }
            let origin = summon.position;
            let victim = self
                .registry
                .enemies
                .iter()
                .filter(|enemy| {
                    enemy.hp > 0.0
                        && enemy.boarded.is_none()
                        && origin.within(enemy.position, stats.radius)
                })
                .min_by(|a, b| {
                    origin
                        .distance_sq(a.position)
                        .total_cmp(&origin.distance_sq(b.position))
                        .then(a.id.cmp(&b.id))
                });
            if let Some(victim) = victim {
                summon.last_attack_at = Some(now);
                strikes.push((victim.id, stats.damage));
            }
        }

        for (enemy, damage) in strikes {
            self.apply_damage(enemy, damage, DamageSource::primary(None), out);
        }
    }

    pub(crate) fn place_ground_effect(
        &mut self,
        kind: GroundEffectKind,
        position: Position,
        radius: f32,
        duration: Duration,
        out: &mut Vec<Event>,
    ) {
        self.registry.ground_effects.push(GroundEffect {
            kind,
            position,
            radius,
            ends_at: self.now + duration,
        });
        out.push(Event::GroundEffectPlaced {
            kind,
            position,
            radius,
        });
    }

    /// Expires ground effects and recomputes the area statuses they grant.
    pub(crate) fn advance_ground_effects(&mut self) {
        let now = self.now;
        let linger = self.config.combat.fire_linger();
        self.registry
            .ground_effects
            .retain(|effect| now < effect.ends_at);

        for enemy in self.registry.enemies.iter_mut() {
            enemy.slowed = false;
            enemy.sealed = false;
            for effect in &self.registry.ground_effects {
                if !effect.position.within(enemy.position, effect.radius) {
                    continue;
                }
                match effect.kind {
                    GroundEffectKind::Seal => enemy.sealed = true,
                    GroundEffectKind::Fire => extend(&mut enemy.burn_until, now + linger),
                    GroundEffectKind::Blizzard => enemy.slowed = true,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{apply, query};
    use specter_defence_core::{Command, GuardianClass, SimulationConfig, SpecterKind};

    fn running_world(configure: impl FnOnce(&mut SimulationConfig)) -> World {
        let mut config = SimulationConfig::default();
        config.ledger.treasure_chance = 0.0;
        configure(&mut config);
        let mut world = World::new(config);
        let mut events = Vec::new();
        apply(&mut world, Command::Start, &mut events);
        world
    }

    fn order(kind: SpecterKind, y: f32) -> SpawnOrder {
        SpawnOrder {
            kind,
            origin: Position::new(150.0, y),
            hp_multiplier: 1.0,
            speed_multiplier: 1.0,
            wave_member: false,
        }
    }

    #[test]
    fn escapes_add_corruption_once() {
        let mut world = running_world(|_| {});
        let mut events = Vec::new();
        let _ = world.spawn_enemy(order(SpecterKind::Shade, 999.0), &mut events);
        world.last_dt = Duration::from_secs(1);

        world.advance_enemies(&mut events);
        world.advance_enemies(&mut events);

        assert_eq!(query::ledger(&world).corruption, 6.0);
        assert!(query::enemy_view(&world).is_empty());
    }

    #[test]
    fn charges_banish_minions_but_not_bosses() {
        let mut world = running_world(|_| {});
        let mut events = Vec::new();
        let summoned = world.summon_guardian(None).expect("summon");
        let Event::GuardianSummoned { guardian, .. } = summoned else {
            panic!("unexpected event {summoned:?}");
        };
        world.registry.guardian_mut(guardian).expect("guardian").charges = Some(1);

        let minion = world.spawn_enemy(order(SpecterKind::Wisp, 999.0), &mut events);
        let boss = world.spawn_enemy(order(SpecterKind::Ferryman, 999.9), &mut events);
        world.last_dt = Duration::from_secs(1);
        world.advance_enemies(&mut events);

        assert!(events.contains(&Event::EnemyBanished {
            enemy: minion,
            guardian
        }));
        assert!(events.iter().any(|event| matches!(
            event,
            Event::EnemyEscaped { enemy, .. } if *enemy == boss
        )));
        assert_eq!(
            query::ledger(&world).corruption,
            SpecterKind::Ferryman.stats().corruption
        );
        let charges = query::guardian_view(&world)
            .get(guardian)
            .and_then(|snapshot| snapshot.charges);
        assert_eq!(charges, Some(0));
        assert_eq!(
            query::guardian_view(&world).get(guardian).map(|g| g.class),
            Some(GuardianClass::SUMMONED)
        );
    }

    #[test]
    fn passengers_ride_and_escape_with_the_carrier() {
        let mut world = running_world(|config| config.combat.boarding_chance = 1.0);
        let mut events = Vec::new();
        let boss = world.spawn_enemy(order(SpecterKind::Ferryman, 990.0), &mut events);
        let passenger = world.spawn_enemy(order(SpecterKind::Wisp, 10.0), &mut events);

        let view = query::enemy_view(&world);
        let snapshot = view.get(passenger).expect("passenger");
        assert_eq!(snapshot.boarded, Some(boss));
        assert!(!snapshot.targetable());

        world.last_dt = Duration::from_secs(1);
        world.advance_enemies(&mut events);

        let escaped = events
            .iter()
            .filter(|event| matches!(event, Event::EnemyEscaped { .. }))
            .count();
        assert_eq!(escaped, 2);
        assert!(query::enemy_view(&world).is_empty());
    }

    #[test]
    fn blizzards_slow_only_while_inside() {
        let mut world = running_world(|_| {});
        let mut events = Vec::new();
        let enemy = world.spawn_enemy(order(SpecterKind::Wisp, 100.0), &mut events);
        world.place_ground_effect(
            GroundEffectKind::Blizzard,
            Position::new(150.0, 100.0),
            50.0,
            Duration::from_secs(2),
            &mut events,
        );

        world.advance_ground_effects();
        assert!(query::enemy_view(&world).get(enemy).expect("enemy").slowed);

        world.now = Duration::from_secs(2);
        world.advance_ground_effects();
        assert!(!query::enemy_view(&world).get(enemy).expect("enemy").slowed);
        assert!(query::ground_effects(&world).is_empty());
    }

    #[test]
    fn fire_keeps_burning_for_the_configured_linger() {
        let mut world = running_world(|config| config.combat.fire_linger_ms = 300);
        let mut events = Vec::new();
        let enemy = world.spawn_enemy(order(SpecterKind::Wisp, 100.0), &mut events);
        world.place_ground_effect(
            GroundEffectKind::Fire,
            Position::new(150.0, 100.0),
            50.0,
            Duration::from_secs(2),
            &mut events,
        );

        world.now = Duration::from_secs(1);
        world.advance_ground_effects();
        let burn_until = world.registry.enemy(enemy).and_then(|state| state.burn_until);
        assert_eq!(burn_until, Some(Duration::from_millis(1_300)));
    }
}
