//! Stage lifecycle bookkeeping.

use std::time::Duration;

use specter_defence_core::{CommandError, EnemyId, StagePhase, StageSnapshot};

#[derive(Clone, Debug)]
pub(crate) struct StageState {
    stage: u32,
    boss_stage: bool,
    total: u32,
    spawned: u32,
    phase: StagePhase,
    countdown_ends_at: Option<Duration>,
    last_spawn_at: Option<Duration>,
    boss: Option<EnemyId>,
    boss_resolved: bool,
}

impl StageState {
    pub(crate) fn new() -> Self {
        Self {
            stage: 0,
            boss_stage: false,
            total: 0,
            spawned: 0,
            phase: StagePhase::Cleared,
            countdown_ends_at: None,
            last_spawn_at: None,
            boss: None,
            boss_resolved: false,
        }
    }

    pub(crate) fn stage(&self) -> u32 {
        self.stage
    }

    /// Enters the countdown of `stage`; only legal once the previous stage cleared.
    pub(crate) fn begin(
        &mut self,
        stage: u32,
        total: u32,
        countdown_ends_at: Duration,
    ) -> Result<(), CommandError> {
        if self.phase != StagePhase::Cleared {
            return Err(CommandError::StageUnresolved);
        }
        *self = Self {
            stage,
            boss_stage: stage % 10 == 0,
            total,
            spawned: 0,
            phase: StagePhase::Countdown,
            countdown_ends_at: Some(countdown_ends_at),
            last_spawn_at: None,
            boss: None,
            boss_resolved: false,
        };
        Ok(())
    }

    pub(crate) fn open(&mut self) -> Result<(), CommandError> {
        if self.phase != StagePhase::Countdown {
            return Err(CommandError::StageUnresolved);
        }
        self.phase = StagePhase::Spawning;
        self.countdown_ends_at = None;
        Ok(())
    }

    pub(crate) fn record_spawn(&mut self, now: Duration) {
        self.spawned = self.spawned.saturating_add(1);
        self.last_spawn_at = Some(now);
        self.refresh_phase();
    }

    /// Remembers the first boss of a boss stage; returns whether it was recorded.
    pub(crate) fn record_boss(&mut self, id: EnemyId) -> bool {
        if !self.boss_stage || self.boss.is_some() {
            return false;
        }
        self.boss = Some(id);
        true
    }

    pub(crate) fn resolve_boss(&mut self, id: EnemyId) {
        if self.boss == Some(id) {
            self.boss_resolved = true;
            self.refresh_phase();
        }
    }

    fn refresh_phase(&mut self) {
        if self.phase == StagePhase::Spawning
            && self.spawned >= self.total
            && self.boss_stage
            && !self.boss_resolved
        {
            self.phase = StagePhase::BossPending;
        }
    }

    pub(crate) fn clear(&mut self, live: usize) -> Result<u32, CommandError> {
        if !self.snapshot(live, Duration::ZERO).is_resolved()
            || !matches!(self.phase, StagePhase::Spawning | StagePhase::BossPending)
        {
            return Err(CommandError::StageUnresolved);
        }
        self.phase = StagePhase::Cleared;
        Ok(self.stage)
    }

    pub(crate) fn snapshot(&self, live: usize, now: Duration) -> StageSnapshot {
        StageSnapshot {
            stage: self.stage,
            boss_stage: self.boss_stage,
            total: self.total,
            spawned: self.spawned,
            live,
            phase: self.phase,
            countdown_remaining: self
                .countdown_ends_at
                .map(|ends_at| ends_at.saturating_sub(now)),
            last_spawn_at: self.last_spawn_at,
            boss: self.boss,
            boss_resolved: self.boss_resolved,
        }
    }
}
