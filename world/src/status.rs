//! Timed statuses: expiry, burns, stealth cycles and enemy pulses.

use std::time::Duration;

use specter_defence_core::{AbilityHook, Behavior, EnemyId, Event, GuardianId, Position, PulseEffect};

use crate::{
    damage::{extend, DamageSource},
    World,
};

fn expire(window: &mut Option<Duration>, now: Duration) {
    if window.is_some_and(|until| now >= until) {
        *window = None;
    }
}

impl World {
    /// Decays and refreshes every status; the freeze release runs first.
    pub(crate) fn refresh_statuses(&mut self, out: &mut Vec<Event>) {
        self.release_time_freeze(out);

        let now = self.now;
        for guardian in self.registry.guardians.iter_mut() {
            expire(&mut guardian.stunned_until, now);
            expire(&mut guardian.frozen_until, now);
        }
        for enemy in self.registry.enemies.iter_mut() {
            expire(&mut enemy.burn_until, now);
            if enemy.burn_until.is_none() {
                enemy.burn_source = None;
            }
            expire(&mut enemy.silenced_until, now);
            if enemy.link.is_some_and(|(_, until)| now >= until) {
                enemy.link = None;
            }
        }

        self.apply_burns(out);
        self.refresh_stealth();
        self.run_pulses(out);
    }

    fn apply_burns(&mut self, out: &mut Vec<Event>) {
        let now = self.now;
        let fraction = self.config.combat.burn_fraction_per_second * self.last_dt.as_secs_f32();
        let burns: Vec<(EnemyId, f32, Option<GuardianId>)> = self
            .registry
            .enemies
            .iter()
            .filter(|enemy| enemy.is_burning(now))
            .map(|enemy| (enemy.id, enemy.max_hp * fraction, enemy.burn_source))
            .collect();
        for (enemy, damage, source) in burns {
            self.apply_damage(enemy, damage, DamageSource::shared(source), out);
        }
    }

    /// Stealthed species hide during the second half of each cycle unless
    /// silenced or within range of a detector.
    fn refresh_stealth(&mut self) {
        let now = self.now;
        let detectors: Vec<(Position, f32)> = self
            .registry
            .guardians
            .iter()
            .filter(|guardian| guardian.class.is_detector())
            .map(|guardian| {
                (
                    self.registry.guardian_position(guardian),
                    guardian.effective_range(),
                )
            })
            .collect();

        for enemy in self.registry.enemies.iter_mut() {
            let Behavior::Stealth { visible, hidden } = enemy.kind.behavior() else {
                enemy.stealthed = false;
                continue;
            };
            let cycle = (visible + hidden).as_nanos().max(1);
            let phase = now.saturating_sub(enemy.spawned_at).as_nanos() % cycle;
            let hiding = phase >= visible.as_nanos();
            let revealed = detectors
                .iter()
                .any(|(position, range)| position.within(enemy.position, *range));
            enemy.stealthed = hiding && !revealed && !enemy.is_silenced(now);
        }
    }

    fn run_pulses(&mut self, out: &mut Vec<Event>) {
        let now = self.now;
        let frozen = self.freeze_active();
        let mut pulses = Vec::new();

        for enemy in self.registry.enemies.iter_mut() {
            let Behavior::Pulse { period } = enemy.kind.behavior() else {
                continue;
            };
            let Some(next) = enemy.next_pulse_at else {
                continue;
            };
            if now < next {
                continue;
            }
            enemy.next_pulse_at = Some(now + period);
            if enemy.is_silenced(now) || enemy.boarded.is_some() || (frozen && !enemy.is_boss())
            {
                continue;
            }
            let mut effects = Vec::new();
            enemy.kind.on_tick(&mut effects);
            pulses.extend(effects.into_iter().map(|effect| (enemy.position, effect)));
        }

        for (origin, effect) in pulses {
            self.apply_pulse(origin, effect, out);
        }
    }

    fn apply_pulse(&mut self, origin: Position, effect: PulseEffect, out: &mut Vec<Event>) {
        let now = self.now;
        let positions: Vec<(GuardianId, Position)> = self
            .registry
            .guardians
            .iter()
            .map(|guardian| (guardian.id, self.registry.guardian_position(guardian)))
            .collect();

        match effect {
            PulseEffect::Fear { radius, duration } => {
                for (id, position) in positions {
                    if !origin.within(position, radius) {
                        continue;
                    }
                    if let Some(guardian) = self.registry.guardian_mut(id) {
                        extend(&mut guardian.stunned_until, now + duration);
                        if let Some(until) = guardian.stunned_until {
                            out.push(Event::GuardianStunned {
                                guardian: id,
                                until,
                            });
                        }
                    }
                }
            }
            PulseEffect::Wail { radius, duration } => {
                let nearest = positions
                    .iter()
                    .filter(|(_, position)| origin.within(*position, radius))
                    .min_by(|a, b| {
                        origin
                            .distance_sq(a.1)
                            .total_cmp(&origin.distance_sq(b.1))
                            .then(a.0.cmp(&b.0))
                    })
                    .map(|(id, _)| *id);
                if let Some(guardian) = nearest.and_then(|id| self.registry.guardian_mut(id)) {
                    extend(&mut guardian.frozen_until, now + duration);
                    if let Some(until) = guardian.frozen_until {
                        out.push(Event::GuardianFrozen {
                            guardian: guardian.id,
                            until,
                        });
                    }
                }
            }
            PulseEffect::Link { radius, duration } => {
                let members: Vec<EnemyId> = self
                    .registry
                    .enemies
                    .iter()
                    .filter(|enemy| {
                        enemy.hp > 0.0
                            && enemy.boarded.is_none()
                            && origin.within(enemy.position, radius)
                    })
                    .map(|enemy| enemy.id)
                    .collect();
                if members.len() < 2 {
                    return;
                }
                let link = self.registry.allocate_link_id();
                for member in &members {
                    if let Some(enemy) = self.registry.enemy_mut(*member) {
                        enemy.link = Some((link, now + duration));
                    }
                }
                out.push(Event::EnemiesLinked {
                    link,
                    members: members.len(),
                });
            }
        }
    }
}
