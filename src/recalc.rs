//! League-wide keeper recalculation as a pure delta pass.
//!
//! The sweep never writes. It reports what would change for every persisted
//! keeper, and failures are isolated per roster so one bad roster doesn't
//! discard results already computed for the others.

use crate::simulation::{LeagueSnapshot, evaluate_roster};
use crate::types::{KeeperIntent, KeeperSelection, PlayerId, RosterId, Round, Season};
use std::collections::BTreeMap;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecalcOutcome {
    Updated,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecalcEntry {
    pub player_id: PlayerId,
    pub roster_id: RosterId,
    pub old_cost: Round,
    pub new_cost: Round,
    pub years_held: u32,
    pub base_cost: Round,
    pub was_cascaded: bool,
    pub outcome: RecalcOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecalcFailure {
    pub roster_id: RosterId,
    pub player_id: Option<PlayerId>,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecalculationReport {
    pub season: Season,
    pub entries: Vec<RecalcEntry>,
    pub failures: Vec<RecalcFailure>,
}

impl RecalculationReport {
    /// Only the entries whose stored values would change.
    pub fn deltas(&self) -> impl Iterator<Item = &RecalcEntry> {
        self.entries
            .iter()
            .filter(|e| e.outcome == RecalcOutcome::Updated)
    }

    pub fn updated_count(&self) -> usize {
        self.deltas().count()
    }

    pub fn unchanged_count(&self) -> usize {
        self.entries.len() - self.updated_count()
    }
}

/// Re-resolves every persisted roster against `snapshot` and reports the
/// differences.
///
/// Failures are isolated per roster, not per player. Keepers of one roster
/// compete for the same draft slots, so when any of them fails (say a regular
/// keeper who now needs a franchise tag) the whole roster has no entries and
/// one [`RecalcFailure`] names the offending player.
pub fn recalculate_all(
    snapshot: &LeagueSnapshot,
    persisted: &BTreeMap<RosterId, Vec<KeeperIntent>>,
) -> RecalculationReport {
    let mut entries = Vec::new();
    let mut failures = Vec::new();

    for (roster_id, intents) in persisted {
        let selections: Vec<KeeperSelection> = intents.iter().map(KeeperSelection::from).collect();

        let evaluation = match evaluate_roster(snapshot, roster_id, &selections) {
            Ok(evaluation) => evaluation,
            Err(err) => {
                warn!(roster = %roster_id, error = %err, "recalculation failed for roster, skipping");
                failures.push(RecalcFailure {
                    roster_id: roster_id.clone(),
                    player_id: err.player_id().cloned(),
                    error: err.to_string(),
                });
                continue;
            }
        };

        for intent in intents {
            let Some(keeper) = evaluation.keeper(&intent.player_id) else {
                continue;
            };
            let changed = intent.final_cost != keeper.assigned_round
                || intent.base_cost != keeper.base_cost
                || intent.years_held != keeper.years_held
                || intent.was_cascaded != keeper.was_cascaded;

            entries.push(RecalcEntry {
                player_id: intent.player_id.clone(),
                roster_id: roster_id.clone(),
                old_cost: intent.final_cost,
                new_cost: keeper.assigned_round,
                years_held: keeper.years_held,
                base_cost: keeper.base_cost,
                was_cascaded: keeper.was_cascaded,
                outcome: if changed {
                    RecalcOutcome::Updated
                } else {
                    RecalcOutcome::Unchanged
                },
            });
        }
    }

    let report = RecalculationReport {
        season: snapshot.season,
        entries,
        failures,
    };
    info!(
        season = report.season,
        updated = report.updated_count(),
        unchanged = report.unchanged_count(),
        failed = report.failures.len(),
        "keeper recalculation"
    );
    report
}
