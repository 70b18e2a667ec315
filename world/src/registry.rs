//! Entity storage and identifier allocation.

use std::time::Duration;

use specter_defence_core::{
    BuffSheet, CapacityLimit, CommandError, EnemyId, FieldConfig, GroundEffectKind, GuardianClass,
    GuardianId, LaneSide, Position, ProjectileId, SlotCoord, SlotId, SpecterKind, SummonId,
    SummonKind,
};

/// Lane slot guardians are placed on.
#[derive(Clone, Debug)]
pub(crate) struct Slot {
    pub(crate) id: SlotId,
    pub(crate) coord: SlotCoord,
    pub(crate) position: Position,
    pub(crate) occupant: Option<GuardianId>,
}

/// Guardian stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct GuardianState {
    pub(crate) id: GuardianId,
    pub(crate) class: GuardianClass,
    pub(crate) slot: SlotId,
    pub(crate) last_fired_at: Option<Duration>,
    pub(crate) spent: u32,
    pub(crate) buffs: BuffSheet,
    pub(crate) charges: Option<u32>,
    pub(crate) stunned_until: Option<Duration>,
    pub(crate) frozen_until: Option<Duration>,
    pub(crate) demolishing: bool,
}

impl GuardianState {
    pub(crate) fn is_stunned(&self, now: Duration) -> bool {
        self.stunned_until.is_some_and(|until| now < until)
    }

    pub(crate) fn is_frozen(&self, now: Duration) -> bool {
        self.frozen_until.is_some_and(|until| now < until)
    }

    pub(crate) fn effective_range(&self) -> f32 {
        (self.class.stats().range + self.buffs.range_bonus).max(0.0)
    }

    /// Base cooldown divided by the attack speed multiplier, floored at 10%.
    pub(crate) fn effective_cooldown(&self) -> Duration {
        let base = self.class.stats().cooldown.as_secs_f32();
        let multiplier = (1.0 + self.buffs.speed_bonus).max(0.1);
        Duration::from_secs_f32(base / multiplier)
    }

    pub(crate) fn cooldown_elapsed(&self, now: Duration) -> Duration {
        match self.last_fired_at {
            Some(fired) => now.saturating_sub(fired),
            None => Duration::MAX,
        }
    }

    pub(crate) fn is_ready(&self, now: Duration) -> bool {
        self.cooldown_elapsed(now) >= self.effective_cooldown()
    }
}

/// Enemy stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct EnemyState {
    pub(crate) id: EnemyId,
    pub(crate) kind: SpecterKind,
    pub(crate) position: Position,
    pub(crate) hp: f32,
    pub(crate) max_hp: f32,
    pub(crate) defense: f32,
    pub(crate) speed: f32,
    pub(crate) hp_multiplier: f32,
    pub(crate) speed_multiplier: f32,
    pub(crate) spawned_at: Duration,
    pub(crate) burn_until: Option<Duration>,
    pub(crate) burn_source: Option<GuardianId>,
    pub(crate) silenced_until: Option<Duration>,
    pub(crate) sealed: bool,
    pub(crate) slowed: bool,
    pub(crate) stealthed: bool,
    pub(crate) boarded: Option<EnemyId>,
    pub(crate) link: Option<(u32, Duration)>,
    pub(crate) banked: f32,
    pub(crate) flush_guard: Option<Duration>,
    pub(crate) next_pulse_at: Option<Duration>,
}

impl EnemyState {
    pub(crate) fn is_boss(&self) -> bool {
        self.kind.is_boss()
    }

    pub(crate) fn is_burning(&self, now: Duration) -> bool {
        self.burn_until.is_some_and(|until| now < until)
    }

    pub(crate) fn is_silenced(&self, now: Duration) -> bool {
        self.sealed || self.silenced_until.is_some_and(|until| now < until)
    }

    pub(crate) fn active_link(&self, now: Duration) -> Option<u32> {
        self.link
            .and_then(|(link, until)| (now < until).then_some(link))
    }

    pub(crate) fn targetable(&self) -> bool {
        self.hp > 0.0 && !self.stealthed && self.boarded.is_none()
    }
}

/// Scheduling token for a shot in flight.
#[derive(Clone, Debug)]
pub(crate) struct Projectile {
    pub(crate) id: ProjectileId,
    pub(crate) guardian: GuardianId,
    pub(crate) target: EnemyId,
    pub(crate) resolve_at: Duration,
}

/// Friendly unit raised by guardian abilities.
#[derive(Clone, Debug)]
pub(crate) struct Summon {
    pub(crate) id: SummonId,
    pub(crate) kind: SummonKind,
    pub(crate) position: Position,
    pub(crate) last_attack_at: Option<Duration>,
    pub(crate) expires_at: Duration,
}

/// Area effect left on the ground.
#[derive(Clone, Debug)]
pub(crate) struct GroundEffect {
    pub(crate) kind: GroundEffectKind,
    pub(crate) position: Position,
    pub(crate) radius: f32,
    pub(crate) ends_at: Duration,
}

/// Owns every entity and hands out identifiers.
#[derive(Clone, Debug)]
pub(crate) struct Registry {
    pub(crate) slots: Vec<Slot>,
    pub(crate) guardians: Vec<GuardianState>,
    pub(crate) enemies: Vec<EnemyState>,
    pub(crate) projectiles: Vec<Projectile>,
    pub(crate) summons: Vec<Summon>,
    pub(crate) ground_effects: Vec<GroundEffect>,
    max_guardians: usize,
    next_guardian_id: u32,
    next_enemy_id: u32,
    next_projectile_id: u32,
    next_summon_id: u32,
    next_link_id: u32,
}

impl Registry {
    pub(crate) fn new(field: &FieldConfig) -> Self {
        Self {
            slots: layout_slots(field),
            guardians: Vec::new(),
            enemies: Vec::new(),
            projectiles: Vec::new(),
            summons: Vec::new(),
            ground_effects: Vec::new(),
            max_guardians: field.max_guardians,
            next_guardian_id: 0,
            next_enemy_id: 0,
            next_projectile_id: 0,
            next_summon_id: 0,
            next_link_id: 0,
        }
    }

    pub(crate) fn guardian(&self, id: GuardianId) -> Result<&GuardianState, CommandError> {
        self.guardians
            .iter()
            .find(|guardian| guardian.id == id)
            .ok_or(CommandError::UnknownGuardian(id))
    }

    pub(crate) fn guardian_mut(&mut self, id: GuardianId) -> Option<&mut GuardianState> {
        self.guardians.iter_mut().find(|guardian| guardian.id == id)
    }

    pub(crate) fn enemy_index(&self, id: EnemyId) -> Option<usize> {
        self.enemies.iter().position(|enemy| enemy.id == id)
    }

    pub(crate) fn enemy(&self, id: EnemyId) -> Option<&EnemyState> {
        self.enemies.iter().find(|enemy| enemy.id == id)
    }

    pub(crate) fn enemy_mut(&mut self, id: EnemyId) -> Option<&mut EnemyState> {
        self.enemies.iter_mut().find(|enemy| enemy.id == id)
    }

    pub(crate) fn slot(&self, id: SlotId) -> Option<&Slot> {
        self.slots.iter().find(|slot| slot.id == id)
    }

    /// Resolves the slot a new guardian would occupy.
    pub(crate) fn claimable_slot(&self, hint: Option<SlotId>) -> Result<SlotId, CommandError> {
        if self.guardians.len() >= self.max_guardians {
            return Err(CommandError::CapacityExceeded(CapacityLimit::Guardians {
                max: self.max_guardians,
            }));
        }
        match hint {
            Some(id) => self.free_slot(id),
            None => self
                .slots
                .iter()
                .find(|slot| slot.occupant.is_none())
                .map(|slot| slot.id)
                .ok_or(CommandError::InvalidSlot(None)),
        }
    }

    pub(crate) fn free_slot(&self, id: SlotId) -> Result<SlotId, CommandError> {
        match self.slot(id) {
            Some(slot) if slot.occupant.is_none() => Ok(slot.id),
            _ => Err(CommandError::InvalidSlot(Some(id))),
        }
    }

    pub(crate) fn set_occupant(&mut self, id: SlotId, occupant: Option<GuardianId>) {
        if let Some(slot) = self.slots.iter_mut().find(|slot| slot.id == id) {
            slot.occupant = occupant;
        }
    }

    pub(crate) fn slot_position(&self, id: SlotId) -> Position {
        self.slot(id).map(|slot| slot.position).unwrap_or_default()
    }

    pub(crate) fn slot_coord(&self, id: SlotId) -> SlotCoord {
        self.slot(id)
            .map(|slot| slot.coord)
            .unwrap_or(SlotCoord::new(LaneSide::Left, 0, 0))
    }

    pub(crate) fn guardian_position(&self, guardian: &GuardianState) -> Position {
        self.slot_position(guardian.slot)
    }

    pub(crate) fn population(&self, class: GuardianClass) -> usize {
        self.guardians
            .iter()
            .filter(|guardian| guardian.class == class)
            .count()
    }

    pub(crate) fn allocate_guardian_id(&mut self) -> GuardianId {
        let id = GuardianId::new(self.next_guardian_id);
        self.next_guardian_id = self.next_guardian_id.wrapping_add(1);
        id
    }

    pub(crate) fn allocate_enemy_id(&mut self) -> EnemyId {
        let id = EnemyId::new(self.next_enemy_id);
        self.next_enemy_id = self.next_enemy_id.wrapping_add(1);
        id
    }

    pub(crate) fn allocate_projectile_id(&mut self) -> ProjectileId {
        let id = ProjectileId::new(self.next_projectile_id);
        self.next_projectile_id = self.next_projectile_id.wrapping_add(1);
        id
    }

    pub(crate) fn allocate_summon_id(&mut self) -> SummonId {
        let id = SummonId::new(self.next_summon_id);
        self.next_summon_id = self.next_summon_id.wrapping_add(1);
        id
    }

    pub(crate) fn allocate_link_id(&mut self) -> u32 {
        let id = self.next_link_id;
        self.next_link_id = self.next_link_id.wrapping_add(1);
        id
    }
}

/// Lays out slots on both lane sides, nearest column first.
///
/// The lane spans `0..lane_width` across; left slots sit at negative `x` and
/// right slots beyond `lane_width`.
fn layout_slots(field: &FieldConfig) -> Vec<Slot> {
    let half = field.slot_spacing / 2.0;
    let row_step = field.lane_length / (field.slot_rows as f32 + 1.0);
    let mut slots = Vec::new();

    for side in [LaneSide::Left, LaneSide::Right] {
        for column in 0..field.slot_columns {
            for row in 0..field.slot_rows {
                let offset = half + column as f32 * field.slot_spacing;
                let x = match side {
                    LaneSide::Left => -offset,
                    LaneSide::Right => field.lane_width + offset,
                };
                let y = (row as f32 + 1.0) * row_step;
                slots.push(Slot {
                    id: SlotId::new(slots.len() as u32),
                    coord: SlotCoord::new(side, column, row),
                    position: Position::new(x, y),
                    occupant: None,
                });
            }
        }
    }

    slots
}
