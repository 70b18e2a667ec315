use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Promotion tier of a guardian class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    /// Freshly summoned guardians.
    Base,
    /// First promotion, one of six lineages.
    Specialized,
    /// Second promotion, one of two classes per lineage.
    Advanced,
    /// Final promotion, unique per lineage.
    Transcendent,
}

impl Tier {
    /// Numeric tier level starting at one.
    #[must_use]
    pub const fn level(self) -> u8 {
        match self {
            Self::Base => 1,
            Self::Specialized => 2,
            Self::Advanced => 3,
            Self::Transcendent => 4,
        }
    }

    /// Maximum number of concurrent instances of a single class of this tier.
    ///
    /// Base guardians are only bounded by the global guardian capacity.
    #[must_use]
    pub const fn population_cap(self) -> Option<usize> {
        match self {
            Self::Base => None,
            Self::Specialized => Some(2),
            Self::Advanced | Self::Transcendent => Some(1),
        }
    }
}

/// Functional role used to filter first promotions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Damage dealers.
    Attack,
    /// Aura emitters and detectors.
    Support,
    /// Status and field effect casters.
    Special,
}

/// Tier one classes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BaseClass {
    /// Generalist every summon starts as.
    Acolyte,
}

/// Tier two classes; each one heads a lineage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SpecializedClass {
    /// Critical-strike attacker.
    Slayer,
    /// Long range attacker.
    Marksman,
    /// Range aura support.
    Bard,
    /// Stealth detector support.
    Warden,
    /// Burning special.
    Pyromancer,
    /// Slowing special.
    Cryomancer,
}

/// Tier three classes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AdvancedClass {
    /// Slayer line, shreds defense.
    Executioner,
    /// Slayer line, raises skeletons from kills.
    Reaper,
    /// Marksman line, ricochets to a second target.
    Sniper,
    /// Marksman line, splash damage.
    Ranger,
    /// Bard line, tempo aura.
    Maestro,
    /// Bard line, wide range aura.
    Sage,
    /// Warden line, banishes escaping enemies.
    Sentinel,
    /// Warden line, directional shrine.
    Obelisk,
    /// Pyromancer line, fire fields.
    Inferno,
    /// Pyromancer line, silences and siphons corruption.
    Hexer,
    /// Cryomancer line, blizzard fields.
    Frostbinder,
    /// Cryomancer line, stops time.
    Chronomancer,
}

/// Tier four classes; one per lineage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TranscendentClass {
    /// Slayer line apex.
    Deathlord,
    /// Marksman line apex.
    Starfall,
    /// Bard line apex, global shrine.
    Archon,
    /// Warden line apex.
    Seraph,
    /// Pyromancer line apex.
    Phoenix,
    /// Cryomancer line apex.
    Eternity,
}

/// Immutable template a guardian instance currently uses, tagged by tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GuardianClass {
    /// Tier one.
    Base(BaseClass),
    /// Tier two.
    Specialized(SpecializedClass),
    /// Tier three.
    Advanced(AdvancedClass),
    /// Tier four.
    Transcendent(TranscendentClass),
}

const SPECIALIZED_TARGETS: [GuardianClass; 6] = [
    GuardianClass::Specialized(SpecializedClass::Slayer),
    GuardianClass::Specialized(SpecializedClass::Marksman),
    GuardianClass::Specialized(SpecializedClass::Bard),
    GuardianClass::Specialized(SpecializedClass::Warden),
    GuardianClass::Specialized(SpecializedClass::Pyromancer),
    GuardianClass::Specialized(SpecializedClass::Cryomancer),
];

/// Base combat numbers of a guardian class.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GuardianStats {
    /// Damage dealt by a single shot before any multiplier.
    pub damage: f32,
    /// Targeting radius in logical units.
    pub range: f32,
    /// Time between shots before speed bonuses.
    pub cooldown: Duration,
    /// Crit chance contributed by the class itself.
    pub innate_crit: f32,
}

const fn guardian_stats(damage: f32, range: f32, cooldown_ms: u64, innate_crit: f32) -> GuardianStats {
    GuardianStats {
        damage,
        range,
        cooldown: Duration::from_millis(cooldown_ms),
        innate_crit,
    }
}

/// Support effect applied to other guardians within the aura radius.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SupportAura {
    /// Flat range bonus.
    Range(f32),
    /// Larger flat range bonus.
    WideRange(f32),
    /// Attack speed and damage bonus.
    Tempo {
        /// Additive attack speed bonus.
        speed: f32,
        /// Additive damage bonus.
        damage: f32,
    },
}

/// Footprint of a shrine's bonus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShrineReach {
    /// Forward column, plus row neighbours with shrine mastery.
    Directional,
    /// Every other guardian on the field.
    Global,
}

/// Bonus emitted by a shrine class.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShrineEffect {
    /// Which guardians receive the bonus.
    pub reach: ShrineReach,
    /// Additive shrine damage bonus.
    pub damage: f32,
    /// Additive attack speed bonus.
    pub speed: f32,
}

impl GuardianClass {
    /// Class every summoned guardian starts as.
    pub const SUMMONED: GuardianClass = GuardianClass::Base(BaseClass::Acolyte);

    /// Tier the class belongs to.
    #[must_use]
    pub const fn tier(self) -> Tier {
        match self {
            Self::Base(_) => Tier::Base,
            Self::Specialized(_) => Tier::Specialized,
            Self::Advanced(_) => Tier::Advanced,
            Self::Transcendent(_) => Tier::Transcendent,
        }
    }

    /// Lineage head of the class, if it has been specialized.
    #[must_use]
    pub const fn lineage(self) -> Option<SpecializedClass> {
        use AdvancedClass as A;
        use SpecializedClass as S;
        use TranscendentClass as T;

        Some(match self {
            Self::Base(_) => return None,
            Self::Specialized(class) => class,
            Self::Advanced(A::Executioner | A::Reaper) | Self::Transcendent(T::Deathlord) => {
                S::Slayer
            }
            Self::Advanced(A::Sniper | A::Ranger) | Self::Transcendent(T::Starfall) => S::Marksman,
            Self::Advanced(A::Maestro | A::Sage) | Self::Transcendent(T::Archon) => S::Bard,
            Self::Advanced(A::Sentinel | A::Obelisk) | Self::Transcendent(T::Seraph) => S::Warden,
            Self::Advanced(A::Inferno | A::Hexer) | Self::Transcendent(T::Phoenix) => {
                S::Pyromancer
            }
            Self::Advanced(A::Frostbinder | A::Chronomancer) | Self::Transcendent(T::Eternity) => {
                S::Cryomancer
            }
        })
    }

    /// Role of the class; base guardians have none.
    #[must_use]
    pub const fn role(self) -> Option<Role> {
        match self.lineage() {
            None => None,
            Some(SpecializedClass::Slayer | SpecializedClass::Marksman) => Some(Role::Attack),
            Some(SpecializedClass::Bard | SpecializedClass::Warden) => Some(Role::Support),
            Some(SpecializedClass::Pyromancer | SpecializedClass::Cryomancer) => {
                Some(Role::Special)
            }
        }
    }

    /// Classes reachable by promoting this class once.
    #[must_use]
    pub fn upgrade_targets(self) -> &'static [GuardianClass] {
        use AdvancedClass as A;
        use GuardianClass as G;
        use SpecializedClass as S;
        use TranscendentClass as T;

        match self {
            G::Base(_) => &SPECIALIZED_TARGETS,
            G::Specialized(S::Slayer) => &[G::Advanced(A::Executioner), G::Advanced(A::Reaper)],
            G::Specialized(S::Marksman) => &[G::Advanced(A::Sniper), G::Advanced(A::Ranger)],
            G::Specialized(S::Bard) => &[G::Advanced(A::Maestro), G::Advanced(A::Sage)],
            G::Specialized(S::Warden) => &[G::Advanced(A::Sentinel), G::Advanced(A::Obelisk)],
            G::Specialized(S::Pyromancer) => &[G::Advanced(A::Inferno), G::Advanced(A::Hexer)],
            G::Specialized(S::Cryomancer) => {
                &[G::Advanced(A::Frostbinder), G::Advanced(A::Chronomancer)]
            }
            G::Advanced(A::Executioner | A::Reaper) => &[G::Transcendent(T::Deathlord)],
            G::Advanced(A::Sniper | A::Ranger) => &[G::Transcendent(T::Starfall)],
            G::Advanced(A::Maestro | A::Sage) => &[G::Transcendent(T::Archon)],
            G::Advanced(A::Sentinel | A::Obelisk) => &[G::Transcendent(T::Seraph)],
            G::Advanced(A::Inferno | A::Hexer) => &[G::Transcendent(T::Phoenix)],
            G::Advanced(A::Frostbinder | A::Chronomancer) => &[G::Transcendent(T::Eternity)],
            G::Transcendent(_) => &[],
        }
    }

    /// Base combat numbers.
    #[must_use]
    pub const fn stats(self) -> GuardianStats {
        use AdvancedClass as A;
        use SpecializedClass as S;
        use TranscendentClass as T;

        match self {
            Self::Base(BaseClass::Acolyte) => guardian_stats(10.0, 170.0, 1_000, 0.0),
            Self::Specialized(S::Slayer) => guardian_stats(22.0, 170.0, 900, 0.10),
            Self::Specialized(S::Marksman) => guardian_stats(18.0, 240.0, 1_100, 0.0),
            Self::Specialized(S::Bard) => guardian_stats(8.0, 160.0, 1_000, 0.0),
            Self::Specialized(S::Warden) => guardian_stats(10.0, 180.0, 1_000, 0.0),
            Self::Specialized(S::Pyromancer) => guardian_stats(12.0, 180.0, 1_000, 0.0),
            Self::Specialized(S::Cryomancer) => guardian_stats(11.0, 180.0, 1_000, 0.0),
            Self::Advanced(A::Executioner) => guardian_stats(40.0, 180.0, 850, 0.20),
            Self::Advanced(A::Reaper) => guardian_stats(36.0, 180.0, 800, 0.10),
            Self::Advanced(A::Sniper) => guardian_stats(70.0, 320.0, 1_600, 0.15),
            Self::Advanced(A::Ranger) => guardian_stats(28.0, 240.0, 900, 0.0),
            Self::Advanced(A::Maestro) => guardian_stats(14.0, 170.0, 900, 0.0),
            Self::Advanced(A::Sage) => guardian_stats(14.0, 190.0, 1_000, 0.0),
            Self::Advanced(A::Sentinel) => guardian_stats(20.0, 200.0, 1_000, 0.0),
            Self::Advanced(A::Obelisk) | Self::Transcendent(T::Archon) => {
                guardian_stats(0.0, 0.0, 1_000, 0.0)
            }
            Self::Advanced(A::Inferno) => guardian_stats(26.0, 190.0, 950, 0.0),
            Self::Advanced(A::Hexer) => guardian_stats(24.0, 190.0, 950, 0.0),
            Self::Advanced(A::Frostbinder) => guardian_stats(24.0, 190.0, 1_000, 0.0),
            Self::Advanced(A::Chronomancer) => guardian_stats(26.0, 200.0, 1_000, 0.0),
            Self::Transcendent(T::Deathlord) => guardian_stats(90.0, 200.0, 750, 0.25),
            Self::Transcendent(T::Starfall) => guardian_stats(80.0, 330.0, 1_200, 0.15),
            Self::Transcendent(T::Seraph) => guardian_stats(45.0, 220.0, 900, 0.0),
            Self::Transcendent(T::Phoenix) => guardian_stats(60.0, 210.0, 900, 0.0),
            Self::Transcendent(T::Eternity) => guardian_stats(55.0, 220.0, 1_000, 0.0),
        }
    }

    /// Aura this class projects onto nearby guardians.
    #[must_use]
    pub const fn support_aura(self) -> Option<SupportAura> {
        match self {
            Self::Specialized(SpecializedClass::Bard) => Some(SupportAura::Range(20.0)),
            Self::Advanced(AdvancedClass::Maestro) => Some(SupportAura::Tempo {
                speed: 0.2,
                damage: 0.15,
            }),
            Self::Advanced(AdvancedClass::Sage) => Some(SupportAura::WideRange(45.0)),
            _ => None,
        }
    }

    /// Shrine bonus emitted by this class; shrines never attack.
    #[must_use]
    pub const fn shrine(self) -> Option<ShrineEffect> {
        match self {
            Self::Advanced(AdvancedClass::Obelisk) => Some(ShrineEffect {
                reach: ShrineReach::Directional,
                damage: 0.25,
                speed: 0.1,
            }),
            Self::Transcendent(TranscendentClass::Archon) => Some(ShrineEffect {
                reach: ShrineReach::Global,
                damage: 0.15,
                speed: 0.1,
            }),
            _ => None,
        }
    }

    /// Reports whether the class reveals stealthed enemies within its range.
    #[must_use]
    pub const fn is_detector(self) -> bool {
        matches!(
            self,
            Self::Specialized(SpecializedClass::Warden)
                | Self::Advanced(AdvancedClass::Sentinel)
                | Self::Transcendent(TranscendentClass::Seraph)
        )
    }

    /// Banish charges granted when a guardian is promoted into this class.
    #[must_use]
    pub const fn initial_charges(self) -> Option<u32> {
        match self {
            Self::Advanced(AdvancedClass::Sentinel) => Some(3),
            Self::Transcendent(TranscendentClass::Seraph) => Some(5),
            _ => None,
        }
    }

    /// Short human readable description for presentation layers.
    #[must_use]
    pub const fn description(self) -> &'static str {
        use AdvancedClass as A;
        use SpecializedClass as S;
        use TranscendentClass as T;

        match self {
            Self::Base(BaseClass::Acolyte) => "Novice warder firing plain bolts.",
            Self::Specialized(S::Slayer) => "Strikes hard with a keen eye for weak points.",
            Self::Specialized(S::Marksman) => "Fires from afar, sometimes ricocheting.",
            Self::Specialized(S::Bard) => "Extends the reach of nearby guardians.",
            Self::Specialized(S::Warden) => "Reveals hidden specters nearby.",
            Self::Specialized(S::Pyromancer) => "Sets specters ablaze.",
            Self::Specialized(S::Cryomancer) => "Leaves patches of biting frost.",
            Self::Advanced(A::Executioner) => "Shreds defenses with every strike.",
            Self::Advanced(A::Reaper) => "Raises skeletons from the fallen.",
            Self::Advanced(A::Sniper) => "Heavy shots that ricochet often.",
            Self::Advanced(A::Ranger) => "Shots burst on impact.",
            Self::Advanced(A::Maestro) => "Quickens and empowers nearby guardians.",
            Self::Advanced(A::Sage) => "Greatly extends the reach of nearby guardians.",
            Self::Advanced(A::Sentinel) => "Banishes specters about to escape.",
            Self::Advanced(A::Obelisk) => "Shrine empowering the guardians ahead of it.",
            Self::Advanced(A::Inferno) => "Leaves burning ground behind.",
            Self::Advanced(A::Hexer) => "Silences specters and siphons corruption.",
            Self::Advanced(A::Frostbinder) => "Calls wide blizzards.",
            Self::Advanced(A::Chronomancer) => "May stop time for every lesser specter.",
            Self::Transcendent(T::Deathlord) => "Raises ghosts and tears through armor.",
            Self::Transcendent(T::Starfall) => "Bursting shots that seek a second victim.",
            Self::Transcendent(T::Archon) => "Shrine empowering every guardian.",
            Self::Transcendent(T::Seraph) => "Seals specters in holy light and banishes.",
            Self::Transcendent(T::Phoenix) => "Victims explode in flame.",
            Self::Transcendent(T::Eternity) => "Freezes time and weather alike.",
        }
    }
}

/// Kind of ephemeral friendly unit raised by guardian abilities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SummonKind {
    /// Slow melee ally.
    Skeleton,
    /// Fast, stronger ally.
    Ghost,
}

/// Numbers describing a summon kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SummonStats {
    /// Movement speed in units per second toward the goal side.
    pub speed: f32,
    /// Damage per attack.
    pub damage: f32,
    /// Time between attacks.
    pub attack_interval: Duration,
    /// Attack reach.
    pub radius: f32,
    /// Lifetime before the summon crumbles.
    pub lifetime: Duration,
}

impl SummonKind {
    /// Numbers describing the summon kind.
    #[must_use]
    pub const fn stats(self) -> SummonStats {
        match self {
            Self::Skeleton => SummonStats {
                speed: 60.0,
                damage: 15.0,
                attack_interval: Duration::from_millis(600),
                radius: 50.0,
                lifetime: Duration::from_secs(8),
            },
            Self::Ghost => SummonStats {
                speed: 90.0,
                damage: 35.0,
                attack_interval: Duration::from_millis(500),
                radius: 70.0,
                lifetime: Duration::from_secs(10),
            },
        }
    }
}

/// Area effect left on the ground.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroundEffectKind {
    /// Silences specters inside.
    Seal,
    /// Ignites specters inside.
    Fire,
    /// Slows specters inside.
    Blizzard,
}

/// Side effect produced when a guardian's shot lands.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HitEffect {
    /// Damages every other enemy near the target for a fraction of the hit.
    Splash {
        /// Radius around the target.
        radius: f32,
        /// Fraction of the primary damage dealt to each splashed enemy.
        fraction: f32,
    },
    /// Hits one other enemy in range for a fraction of the hit.
    Retarget {
        /// Fraction of the primary damage.
        fraction: f32,
    },
    /// Permanently lowers the target's defense.
    DefenseShred {
        /// Defense removed per hit.
        amount: f32,
    },
    /// Sets the target burning.
    Ignite {
        /// Burn duration measured from the hit.
        duration: Duration,
    },
    /// Silences the target.
    Silence {
        /// Silence duration measured from the hit.
        duration: Duration,
    },
    /// Drains corruption proportional to damage dealt.
    Siphon {
        /// Corruption removed per point of damage dealt.
        fraction: f32,
    },
    /// Places a ground effect at the target's position.
    Ground {
        /// Kind of effect.
        kind: GroundEffectKind,
        /// Radius of the effect.
        radius: f32,
        /// Lifetime of the effect.
        duration: Duration,
    },
    /// Starts a global time freeze.
    TimeFreeze {
        /// Freeze duration.
        duration: Duration,
    },
}

/// Side effect produced by a death.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DeathEffect {
    /// Raises a friendly summon where the victim fell.
    RaiseSummon(SummonKind),
    /// Damages enemies near the victim for a fraction of its max hp.
    Explode {
        /// Blast radius.
        radius: f32,
        /// Fraction of the victim's max hp.
        fraction: f32,
    },
    /// Spawns weaker specters where the victim fell.
    Split {
        /// Kind spawned.
        kind: SpecterKind,
        /// Number spawned.
        count: u32,
    },
}

/// Periodic ability produced by a specter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PulseEffect {
    /// Stuns every guardian within the radius.
    Fear {
        /// Reach of the pulse.
        radius: f32,
        /// Stun duration.
        duration: Duration,
    },
    /// Freezes the nearest guardian within the radius in place.
    Wail {
        /// Reach of the pulse.
        radius: f32,
        /// Freeze duration.
        duration: Duration,
    },
    /// Links every enemy within the radius into a shared-damage group.
    Link {
        /// Reach of the pulse.
        radius: f32,
        /// Link duration.
        duration: Duration,
    },
}

/// Capability interface implemented per archetype variant.
///
/// For guardians `on_death` describes what happens to enemies they kill with a
/// primary shot; for specters it describes their own death. `on_tick` is only
/// invoked when the archetype's pulse period elapses.
pub trait AbilityHook {
    /// Collects effects triggered by a landed shot.
    fn on_hit<R: Rng + ?Sized>(&self, _rng: &mut R, _out: &mut Vec<HitEffect>) {}

    /// Collects effects triggered by a death.
    fn on_death(&self, _out: &mut Vec<DeathEffect>) {}

    /// Collects effects triggered by a periodic pulse.
    fn on_tick(&self, _out: &mut Vec<PulseEffect>) {}
}

impl AbilityHook for GuardianClass {
    fn on_hit<R: Rng + ?Sized>(&self, rng: &mut R, out: &mut Vec<HitEffect>) {
        use AdvancedClass as A;
        use SpecializedClass as S;
        use TranscendentClass as T;

        let mut chance = |probability: f64| rng.gen_bool(probability);

        match *self {
            Self::Specialized(S::Marksman) => {
                if chance(0.10) {
                    out.push(HitEffect::Retarget { fraction: 0.5 });
                }
            }
            Self::Specialized(S::Pyromancer) => out.push(ignite(2_000)),
            Self::Specialized(S::Cryomancer) => {
                if chance(0.15) {
                    out.push(ground(GroundEffectKind::Blizzard, 50.0, 2_000));
                }
            }
            Self::Advanced(A::Executioner) | Self::Transcendent(T::Deathlord) => {
                out.push(HitEffect::DefenseShred { amount: 0.05 });
            }
            Self::Advanced(A::Sniper) => {
                if chance(0.25) {
                    out.push(HitEffect::Retarget { fraction: 0.6 });
                }
            }
            Self::Advanced(A::Ranger) => out.push(HitEffect::Splash {
                radius: 60.0,
                fraction: 0.4,
            }),
            Self::Advanced(A::Inferno) => {
                out.push(ignite(3_000));
                if chance(0.15) {
                    out.push(ground(GroundEffectKind::Fire, 60.0, 3_000));
                }
            }
            Self::Advanced(A::Hexer) => {
                out.push(HitEffect::Silence {
                    duration: Duration::from_secs(2),
                });
                out.push(HitEffect::Siphon { fraction: 0.02 });
            }
            Self::Advanced(A::Frostbinder) => {
                if chance(0.25) {
                    out.push(ground(GroundEffectKind::Blizzard, 80.0, 3_000));
                }
            }
            Self::Advanced(A::Chronomancer) => {
                if chance(0.04) {
                    out.push(HitEffect::TimeFreeze {
                        duration: Duration::from_secs(3),
                    });
                }
            }
            Self::Transcendent(T::Starfall) => {
                out.push(HitEffect::Splash {
                    radius: 80.0,
                    fraction: 0.5,
                });
                if chance(0.30) {
                    out.push(HitEffect::Retarget { fraction: 0.6 });
                }
            }
            Self::Transcendent(T::Seraph) => {
                if chance(0.20) {
                    out.push(ground(GroundEffectKind::Seal, 70.0, 2_500));
                }
            }
            Self::Transcendent(T::Phoenix) => out.push(ignite(4_000)),
            Self::Transcendent(T::Eternity) => {
                if chance(0.06) {
                    out.push(HitEffect::TimeFreeze {
                        duration: Duration::from_secs(4),
                    });
                }
                if chance(0.20) {
                    out.push(ground(GroundEffectKind::Blizzard, 90.0, 3_000));
                }
            }
            _ => {}
        }
    }

    fn on_death(&self, out: &mut Vec<DeathEffect>) {
        match *self {
            Self::Advanced(AdvancedClass::Reaper) => {
                out.push(DeathEffect::RaiseSummon(SummonKind::Skeleton));
            }
            Self::Transcendent(TranscendentClass::Deathlord) => {
                out.push(DeathEffect::RaiseSummon(SummonKind::Ghost));
            }
            Self::Transcendent(TranscendentClass::Phoenix) => out.push(DeathEffect::Explode {
                radius: 80.0,
                fraction: 0.3,
            }),
            _ => {}
        }
    }
}

fn ignite(millis: u64) -> HitEffect {
    HitEffect::Ignite {
        duration: Duration::from_millis(millis),
    }
}

fn ground(kind: GroundEffectKind, radius: f32, millis: u64) -> HitEffect {
    HitEffect::Ground {
        kind,
        radius,
        duration: Duration::from_millis(millis),
    }
}

/// Enemy category used by the first stage of the spawn draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SpecterCategory {
    /// Base category, the only one drawn on stage one.
    Specter,
    /// Elusive specters.
    Wraith,
    /// Binding and returning spirits.
    Spirit,
    /// Heavy hitters.
    Demon,
    /// Reward carriers.
    Treasure,
}

impl SpecterCategory {
    /// Every category in draw order.
    pub const ALL: [SpecterCategory; 5] = [
        Self::Specter,
        Self::Wraith,
        Self::Spirit,
        Self::Demon,
        Self::Treasure,
    ];

    /// Species that belong to the category.
    #[must_use]
    pub const fn members(self) -> &'static [SpecterKind] {
        match self {
            Self::Specter => &[SpecterKind::Wisp, SpecterKind::Shade],
            Self::Wraith => &[
                SpecterKind::Phantom,
                SpecterKind::Banshee,
                SpecterKind::Poltergeist,
            ],
            Self::Spirit => &[SpecterKind::Binder, SpecterKind::Revenant],
            Self::Demon => &[SpecterKind::Fiend, SpecterKind::Brute],
            Self::Treasure => &[SpecterKind::Goldling],
        }
    }
}

/// Behaviour tag of a specter species.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Behavior {
    /// Walks toward the goal.
    Plain,
    /// Alternates visible and stealthed windows.
    Stealth {
        /// Length of the visible window.
        visible: Duration,
        /// Length of the stealthed window.
        hidden: Duration,
    },
    /// Fires `on_tick` every period.
    Pulse {
        /// Time between pulses.
        period: Duration,
    },
    /// Splits on death.
    Splits,
    /// Boss that lets minions board it.
    Carrier {
        /// Maximum passengers.
        capacity: u32,
    },
}

/// Base numbers of a specter species.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpecterStats {
    /// Hit points at stage scaling 1.0.
    pub hp: f32,
    /// Units per second toward the goal at stage scaling 1.0.
    pub speed: f32,
    /// Fraction of incoming shot damage ignored.
    pub defense: f32,
    /// Currency granted on death.
    pub reward: u32,
    /// Corruption added on escape.
    pub corruption: f32,
    /// Relative weight within the category draw.
    pub weight: u32,
}

const fn specter(
    hp: f32,
    speed: f32,
    defense: f32,
    reward: u32,
    corruption: f32,
    weight: u32,
) -> SpecterStats {
    SpecterStats {
        hp,
        speed,
        defense,
        reward,
        corruption,
        weight,
    }
}

/// Species of an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SpecterKind {
    /// Weakest specter.
    Wisp,
    /// Slightly sturdier specter.
    Shade,
    /// Stealthy wraith.
    Phantom,
    /// Wraith whose wail freezes a guardian in place.
    Banshee,
    /// Fast, frail wraith.
    Poltergeist,
    /// Spirit that links nearby enemies.
    Binder,
    /// Spirit that splits on death.
    Revenant,
    /// Demon whose pulse frightens guardians.
    Fiend,
    /// Armored demon.
    Brute,
    /// Fleeing treasure carrier.
    Goldling,
    /// Boss that ferries passengers.
    Ferryman,
    /// Armored boss that frightens guardians.
    Colossus,
}

impl SpecterKind {
    /// Bosses in the order boss stages cycle through them.
    pub const BOSSES: [SpecterKind; 2] = [Self::Ferryman, Self::Colossus];

    /// Base numbers of the species.
    #[must_use]
    pub const fn stats(self) -> SpecterStats {
        match self {
            Self::Wisp => specter(40.0, 45.0, 0.0, 5, 5.0, 60),
            Self::Shade => specter(60.0, 55.0, 0.05, 7, 6.0, 40),
            Self::Phantom => specter(70.0, 50.0, 0.05, 10, 8.0, 35),
            Self::Banshee => specter(90.0, 40.0, 0.10, 12, 8.0, 25),
            Self::Poltergeist => specter(45.0, 80.0, 0.0, 9, 6.0, 40),
            Self::Binder => specter(110.0, 38.0, 0.10, 14, 10.0, 30),
            Self::Revenant => specter(120.0, 35.0, 0.10, 15, 10.0, 30),
            Self::Fiend => specter(150.0, 42.0, 0.15, 20, 12.0, 35),
            Self::Brute => specter(260.0, 28.0, 0.35, 25, 15.0, 25),
            Self::Goldling => specter(80.0, 90.0, 0.0, 60, 2.0, 100),
            Self::Ferryman => specter(2_200.0, 22.0, 0.20, 300, 50.0, 0),
            Self::Colossus => specter(3_200.0, 18.0, 0.40, 400, 60.0, 0),
        }
    }

    /// Category the species is drawn from; bosses are never drawn.
    #[must_use]
    pub const fn category(self) -> Option<SpecterCategory> {
        match self {
            Self::Wisp | Self::Shade => Some(SpecterCategory::Specter),
            Self::Phantom | Self::Banshee | Self::Poltergeist => Some(SpecterCategory::Wraith),
            Self::Binder | Self::Revenant => Some(SpecterCategory::Spirit),
            Self::Fiend | Self::Brute => Some(SpecterCategory::Demon),
            Self::Goldling => Some(SpecterCategory::Treasure),
            Self::Ferryman | Self::Colossus => None,
        }
    }

    /// Reports whether the species is a boss.
    #[must_use]
    pub const fn is_boss(self) -> bool {
        matches!(self, Self::Ferryman | Self::Colossus)
    }

    /// Behaviour tag of the species.
    #[must_use]
    pub const fn behavior(self) -> Behavior {
        match self {
            Self::Phantom => Behavior::Stealth {
                visible: Duration::from_secs(2),
                hidden: Duration::from_secs(2),
            },
            Self::Banshee => Behavior::Pulse {
                period: Duration::from_secs(5),
            },
            Self::Binder => Behavior::Pulse {
                period: Duration::from_secs(4),
            },
            Self::Fiend => Behavior::Pulse {
                period: Duration::from_secs(6),
            },
            Self::Colossus => Behavior::Pulse {
                period: Duration::from_secs(8),
            },
            Self::Revenant => Behavior::Splits,
            Self::Ferryman => Behavior::Carrier { capacity: 4 },
            _ => Behavior::Plain,
        }
    }
}

impl AbilityHook for SpecterKind {
    fn on_death(&self, out: &mut Vec<DeathEffect>) {
        if let Self::Revenant = self {
            out.push(DeathEffect::Split {
                kind: Self::Wisp,
                count: 2,
            });
        }
    }

    fn on_tick(&self, out: &mut Vec<PulseEffect>) {
        match self {
            Self::Banshee => out.push(PulseEffect::Wail {
                radius: 200.0,
                duration: Duration::from_millis(2_500),
            }),
            Self::Binder => out.push(PulseEffect::Link {
                radius: 120.0,
                duration: Duration::from_secs(4),
            }),
            Self::Fiend => out.push(PulseEffect::Fear {
                radius: 140.0,
                duration: Duration::from_millis(1_500),
            }),
            Self::Colossus => out.push(PulseEffect::Fear {
                radius: 220.0,
                duration: Duration::from_secs(2),
            }),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn every_upgrade_target_is_one_tier_higher() {
        let mut frontier = vec![GuardianClass::SUMMONED];
        let mut visited = 0;
        while let Some(class) = frontier.pop() {
            visited += 1;
            for target in class.upgrade_targets() {
                assert_eq!(target.tier().level(), class.tier().level() + 1);
                if class.tier() != Tier::Base {
                    assert_eq!(target.lineage(), class.lineage());
                }
                frontier.push(*target);
            }
        }
        assert_eq!(visited, 1 + 6 + 12 + 12);
    }

    #[test]
    fn shrines_do_not_attack() {
        for class in [
            GuardianClass::Advanced(AdvancedClass::Obelisk),
            GuardianClass::Transcendent(TranscendentClass::Archon),
        ] {
            assert!(class.shrine().is_some());
            assert_eq!(class.stats().damage, 0.0);
        }
    }

    #[test]
    fn stage_one_category_has_two_species() {
        assert_eq!(SpecterCategory::Specter.members().len(), 2);
        for category in SpecterCategory::ALL {
            for kind in category.members() {
                assert_eq!(kind.category(), Some(category));
                assert!(kind.stats().weight > 0);
            }
        }
    }

    #[test]
    fn ranger_always_splashes() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut effects = Vec::new();
        GuardianClass::Advanced(AdvancedClass::Ranger).on_hit(&mut rng, &mut effects);
        assert!(matches!(effects.as_slice(), [HitEffect::Splash { .. }]));
    }

    #[test]
    fn revenant_splits_into_wisps() {
        let mut effects = Vec::new();
        SpecterKind::Revenant.on_death(&mut effects);
        assert_eq!(
            effects,
            vec![DeathEffect::Split {
                kind: SpecterKind::Wisp,
                count: 2
            }]
        );
    }
}
