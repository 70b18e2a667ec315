#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that computes deterministic guardian targets from world snapshots.

use specter_defence_core::{EnemyId, EnemyView, GuardianId, GuardianTarget, GuardianView, Position};

/// Guardian targeting system that reuses scratch buffers to avoid repeated allocations.
#[derive(Debug, Default)]
pub struct Targeting {
    guardian_workspace: Vec<GuardianWorkspace>,
    enemy_workspace: Vec<EnemyCandidate>,
}

impl Targeting {
    /// Creates a new targeting system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes targets for every guardian that is ready to fire.
    ///
    /// The output buffer is cleared before populating it with the latest
    /// assignments. Each guardian picks the in-range enemy furthest along the
    /// lane; ties go to the lower enemy identifier.
    pub fn handle(
        &mut self,
        guardians: &GuardianView,
        enemies: &EnemyView,
        out: &mut Vec<GuardianTarget>,
    ) {
        out.clear();

        if guardians.is_empty() || enemies.is_empty() {
            return;
        }

        self.prepare_guardian_workspace(guardians);
        if self.guardian_workspace.is_empty() {
            return;
        }

        self.prepare_enemy_workspace(enemies);
        if self.enemy_workspace.is_empty() {
            return;
        }

        for guardian in &self.guardian_workspace {
            let mut best: Option<&EnemyCandidate> = None;

            for candidate in &self.enemy_workspace {
                if !guardian.position.within(candidate.position, guardian.range) {
                    continue;
                }

                match best {
                    Some(existing) if !candidate.precedes(existing) => {}
                    _ => best = Some(candidate),
                }
            }

            if let Some(best_candidate) = best {
                out.push(GuardianTarget {
                    guardian: guardian.id,
                    enemy: best_candidate.id,
                });
            }
        }
    }

    fn prepare_guardian_workspace(&mut self, guardians: &GuardianView) {
        self.guardian_workspace.clear();
        self.guardian_workspace.reserve(guardians.len());

        for snapshot in guardians.iter() {
            if !snapshot.ready || !snapshot.can_attack() {
                continue;
            }
            self.guardian_workspace.push(GuardianWorkspace {
                id: snapshot.id,
                position: snapshot.position,
                range: snapshot.effective_range,
            });
        }
    }

    fn prepare_enemy_workspace(&mut self, enemies: &EnemyView) {
        self.enemy_workspace.clear();
        self.enemy_workspace.reserve(enemies.len());

        for snapshot in enemies.iter() {
            if !snapshot.targetable() {
                continue;
            }
            self.enemy_workspace.push(EnemyCandidate {
                id: snapshot.id,
                position: snapshot.position,
            });
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct GuardianWorkspace {
    id: GuardianId,
    position: Position,
    range: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct EnemyCandidate {
    id: EnemyId,
    position: Position,
}

impl EnemyCandidate {
    fn precedes(&self, other: &Self) -> bool {
        if self.position.y != other.position.y {
            return self.position.y > other.position.y;
        }

        self.id < other.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use specter_defence_core::{
        BuffSheet, EnemySnapshot, GuardianClass, GuardianSnapshot, LaneSide, SlotCoord, SlotId,
        SpecterKind,
    };
    use std::time::Duration;

    fn guardian(id: u32, position: Position, range: f32, ready: bool) -> GuardianSnapshot {
        GuardianSnapshot {
            id: GuardianId::new(id),
            class: GuardianClass::SUMMONED,
            slot: SlotId::new(id),
            coord: SlotCoord::new(LaneSide::Left, 0, id),
            position,
            spent: 50,
            charges: None,
            buffs: BuffSheet::baseline(GuardianId::new(id)),
            effective_range: range,
            effective_cooldown: Duration::from_secs(1),
            cooldown_progress: if ready { 1.0 } else { 0.5 },
            ready,
            stunned: false,
            frozen: false,
            demolishing: false,
        }
    }

    fn enemy(id: u32, position: Position) -> EnemySnapshot {
        EnemySnapshot {
            id: EnemyId::new(id),
            kind: SpecterKind::Wisp,
            position,
            hp: 40.0,
            max_hp: 40.0,
            defense: 0.0,
            boss: false,
            burning: false,
            silenced: false,
            slowed: false,
            stealthed: false,
            boarded: None,
            link: None,
            banked: 0.0,
        }
    }

    #[test]
    fn furthest_enemy_in_range_wins() {
        let mut system = Targeting::new();
        let guardians = GuardianView::from_snapshots(vec![guardian(
            0,
            Position::new(0.0, 100.0),
            100.0,
            true,
        )]);
        let enemies = EnemyView::from_snapshots(vec![
            enemy(1, Position::new(10.0, 120.0)),
            enemy(2, Position::new(10.0, 180.0)),
            enemy(3, Position::new(10.0, 260.0)),
        ]);
        let mut out = Vec::new();

        system.handle(&guardians, &enemies, &mut out);

        assert_eq!(
            out,
            vec![GuardianTarget {
                guardian: GuardianId::new(0),
                enemy: EnemyId::new(2),
            }]
        );
    }

    #[test]
    fn ties_on_progress_prefer_lower_identifier() {
        let mut system = Targeting::new();
        let guardians = GuardianView::from_snapshots(vec![guardian(
            0,
            Position::new(0.0, 0.0),
            500.0,
            true,
        )]);
        let enemies = EnemyView::from_snapshots(vec![
            enemy(9, Position::new(50.0, 100.0)),
            enemy(4, Position::new(80.0, 100.0)),
        ]);
        let mut out = Vec::new();

        system.handle(&guardians, &enemies, &mut out);

        assert_eq!(out[0].enemy, EnemyId::new(4));
    }

    #[test]
    fn cooling_down_or_stunned_guardians_do_not_target() {
        let mut system = Targeting::new();
        let mut stunned = guardian(1, Position::new(0.0, 0.0), 500.0, true);
        stunned.stunned = true;
        let guardians = GuardianView::from_snapshots(vec![
            guardian(0, Position::new(0.0, 0.0), 500.0, false),
            stunned,
        ]);
        let enemies = EnemyView::from_snapshots(vec![enemy(1, Position::new(0.0, 10.0))]);
        let mut out = vec![GuardianTarget {
            guardian: GuardianId::new(7),
            enemy: EnemyId::new(7),
        }];

        system.handle(&guardians, &enemies, &mut out);

        assert!(out.is_empty());
    }

    #[test]
    fn hidden_and_boarded_enemies_are_skipped() {
        let mut system = Targeting::new();
        let guardians = GuardianView::from_snapshots(vec![guardian(
            0,
            Position::new(0.0, 0.0),
            500.0,
            true,
        )]);
        let mut hidden = enemy(1, Position::new(0.0, 300.0));
        hidden.stealthed = true;
        let mut boarded = enemy(2, Position::new(0.0, 290.0));
        boarded.boarded = Some(EnemyId::new(9));
        let enemies = EnemyView::from_snapshots(vec![
            hidden,
            boarded,
            enemy(3, Position::new(0.0, 20.0)),
        ]);
        let mut out = Vec::new();

        system.handle(&guardians, &enemies, &mut out);

        assert_eq!(out[0].enemy, EnemyId::new(3));
    }
}
