//! Service layer API for persisted keeper operations
use crate::config::ServiceConfig;
use crate::error::{DataQualityWarning, KeeperError};
use crate::recalc::{self, RecalcEntry, RecalcFailure, RecalculationReport};
use crate::simulation::{self, HypotheticalChange, LeagueSnapshot, SimulationResult, evaluate_roster};
use crate::store::{AuditEntry, RosterKeepers};
use crate::types::{KeeperIntent, KeeperSelection, PlayerId, RosterId, Season, TimeStamp};
use crate::utils::{self, audit_prefix, keepers_key, keepers_prefix};
use sled::IVec;
use sled::transaction::{ConflictableTransactionError, TransactionError};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

pub struct KeeperService {
    instance: Arc<sled::Db>,
}

/// A resolved roster, ready to be written if nobody else wrote first.
#[derive(Debug)]
pub struct StagedCommit {
    key: String,
    expected: Option<IVec>,
    record: RosterKeepers,
    warnings: Vec<DataQualityWarning>,
}

#[derive(Debug, Default)]
pub struct ApplySummary {
    pub applied: usize,
    pub audit_ids: Vec<String>,
    pub failures: Vec<RecalcFailure>,
}

impl StagedCommit {
    pub fn intents(&self) -> &[KeeperIntent] {
        &self.record.intents
    }
    pub fn warnings(&self) -> &[DataQualityWarning] {
        &self.warnings
    }
}

impl KeeperService {
    pub fn new(instance: Arc<sled::Db>) -> Self {
        Self { instance }
    }

    pub fn open(config: &ServiceConfig) -> anyhow::Result<Self> {
        let db = sled::open(&config.database_path)?;
        Ok(Self::new(Arc::new(db)))
    }

    /// Raw bytes (for the optimistic check) and the decoded record
    fn load_record(&self, season: Season, roster_id: &RosterId) -> anyhow::Result<(Option<IVec>, RosterKeepers)> {
        let raw = self.instance.get(keepers_key(season, roster_id))?;
        let record = match &raw {
            Some(bytes) => RosterKeepers::decode(bytes)?,
            None => RosterKeepers::empty(roster_id.clone(), season),
        };
        Ok((raw, record))
    }

    pub fn load_keepers(&self, season: Season, roster_id: &RosterId) -> anyhow::Result<Vec<KeeperIntent>> {
        Ok(self.load_record(season, roster_id)?.1.intents)
    }

    /// Every roster's keepers for a season
    pub fn load_league(&self, season: Season) -> anyhow::Result<BTreeMap<RosterId, Vec<KeeperIntent>>> {
        let mut league = BTreeMap::new();
        for item in self.instance.scan_prefix(keepers_prefix(season)) {
            let (_, bytes) = item?;
            let record = RosterKeepers::decode(&bytes)?;
            league.insert(record.roster_id, record.intents);
        }
        Ok(league)
    }

    /// What-if over the persisted keepers. Never writes.
    pub fn simulate_changes(
        &self,
        snapshot: &LeagueSnapshot,
        roster_id: &RosterId,
        changes: &[HypotheticalChange],
    ) -> anyhow::Result<SimulationResult> {
        let (_, record) = self.load_record(snapshot.season, roster_id)?;
        let selections = simulation::apply_changes(&record.intents, changes);
        Ok(simulation::simulate(snapshot, roster_id, &selections)?)
    }

    /// Preview of [`KeeperService::add_keeper`]
    pub fn preview_keeper(
        &self,
        snapshot: &LeagueSnapshot,
        roster_id: &RosterId,
        selection: KeeperSelection,
    ) -> anyhow::Result<SimulationResult> {
        self.simulate_changes(snapshot, roster_id, &[HypotheticalChange::Add(selection)])
    }

    /// Resolve a full keeper set for a roster against the current stored state.
    /// Fails with [`KeeperError::KeeperLocked`] if the set drops a locked keeper
    /// or changes its type.
    pub fn stage_keepers(
        &self,
        snapshot: &LeagueSnapshot,
        roster_id: &RosterId,
        selections: &[KeeperSelection],
    ) -> anyhow::Result<StagedCommit> {
        let (expected, current) = self.load_record(snapshot.season, roster_id)?;
        self.stage(snapshot, roster_id, expected, &current, selections)
    }

    fn stage(
        &self,
        snapshot: &LeagueSnapshot,
        roster_id: &RosterId,
        expected: Option<IVec>,
        current: &RosterKeepers,
        selections: &[KeeperSelection],
    ) -> anyhow::Result<StagedCommit> {
        // a locked keeper must stay, under the same designation
        for locked in current.intents.iter().filter(|i| i.is_locked) {
            let kept = selections
                .iter()
                .any(|s| s.player_id == locked.player_id && s.keeper_type == locked.keeper_type);
            if !kept {
                return Err(KeeperError::KeeperLocked {
                    player_id: locked.player_id.clone(),
                    roster_id: roster_id.clone(),
                }
                .into());
            }
        }

        let evaluation = evaluate_roster(snapshot, roster_id, selections)?;
        let intents = evaluation.to_intents(|p| current.intent(p).is_some_and(|i| i.is_locked));

        Ok(StagedCommit {
            key: keepers_key(snapshot.season, roster_id),
            expected,
            record: RosterKeepers {
                roster_id: roster_id.clone(),
                season: snapshot.season,
                version: current.version + 1,
                snapshot_digest: snapshot.digest()?,
                intents,
            },
            warnings: evaluation.warnings,
        })
    }

    /// Write a staged roster. Fails with [`KeeperError::ConcurrentModification`]
    /// if the roster changed since it was staged.
    pub fn commit(&self, staged: StagedCommit) -> anyhow::Result<Vec<KeeperIntent>> {
        self.write_roster(&staged.key, staged.expected.as_ref(), &staged.record, &[])?;
        info!(
            roster = %staged.record.roster_id,
            season = staged.record.season,
            version = staged.record.version,
            keepers = staged.record.intents.len(),
            "committed keepers"
        );
        Ok(staged.record.intents)
    }

    pub fn add_keeper(
        &self,
        snapshot: &LeagueSnapshot,
        roster_id: &RosterId,
        selection: KeeperSelection,
    ) -> anyhow::Result<Vec<KeeperIntent>> {
        let (expected, current) = self.load_record(snapshot.season, roster_id)?;
        let selections = simulation::apply_changes(&current.intents, &[HypotheticalChange::Add(selection)]);
        let staged = self.stage(snapshot, roster_id, expected, &current, &selections)?;
        self.commit(staged)
    }

    pub fn remove_keeper(
        &self,
        snapshot: &LeagueSnapshot,
        roster_id: &RosterId,
        player_id: &PlayerId,
    ) -> anyhow::Result<Vec<KeeperIntent>> {
        let (expected, current) = self.load_record(snapshot.season, roster_id)?;

        if current.intent(player_id).is_none() {
            return Err(KeeperError::KeeperNotFound {
                player_id: player_id.clone(),
                roster_id: roster_id.clone(),
            }
            .into());
        }

        let selections =
            simulation::apply_changes(&current.intents, &[HypotheticalChange::Remove(player_id.clone())]);
        let staged = self.stage(snapshot, roster_id, expected, &current, &selections)?;
        self.commit(staged)
    }

    pub fn lock_keeper(&self, season: Season, roster_id: &RosterId, player_id: &PlayerId) -> anyhow::Result<KeeperIntent> {
        self.set_lock(season, roster_id, player_id, true)
    }

    pub fn unlock_keeper(&self, season: Season, roster_id: &RosterId, player_id: &PlayerId) -> anyhow::Result<KeeperIntent> {
        self.set_lock(season, roster_id, player_id, false)
    }

    fn set_lock(
        &self,
        season: Season,
        roster_id: &RosterId,
        player_id: &PlayerId,
        locked: bool,
    ) -> anyhow::Result<KeeperIntent> {
        let (expected, mut record) = self.load_record(season, roster_id)?;

        let Some(intent) = record.intents.iter_mut().find(|i| &i.player_id == player_id) else {
            return Err(KeeperError::KeeperNotFound {
                player_id: player_id.clone(),
                roster_id: roster_id.clone(),
            }
            .into());
        };
        intent.is_locked = locked;
        let updated = intent.clone();

        record.version += 1;
        self.write_roster(&keepers_key(season, roster_id), expected.as_ref(), &record, &[])?;
        info!(roster = %roster_id, player = %player_id, locked, "keeper lock changed");
        Ok(updated)
    }

    /// Computes the league-wide deltas. Read-only.
    pub fn recalculate_all(&self, snapshot: &LeagueSnapshot) -> anyhow::Result<RecalculationReport> {
        let league = self.load_league(snapshot.season)?;
        Ok(recalc::recalculate_all(snapshot, &league))
    }

    /// Writes the deltas of a report and audit-logs each one. A delta whose
    /// stored cost no longer matches the report's `old_cost` is stale and
    /// fails its whole roster; other rosters are still applied.
    pub fn apply_recalculation(
        &self,
        snapshot: &LeagueSnapshot,
        report: &RecalculationReport,
    ) -> anyhow::Result<ApplySummary> {
        let mut by_roster: BTreeMap<&RosterId, Vec<&RecalcEntry>> = BTreeMap::new();
        for entry in report.deltas() {
            by_roster.entry(&entry.roster_id).or_default().push(entry);
        }

        let digest = snapshot.digest()?;
        let mut summary = ApplySummary::default();

        for (roster_id, entries) in by_roster {
            match self.apply_roster(report.season, roster_id, &entries, &digest) {
                Ok(mut ids) => {
                    summary.applied += entries.len();
                    summary.audit_ids.append(&mut ids);
                }
                Err(err) => {
                    warn!(roster = %roster_id, error = %err, "recalculation not applied for roster");
                    summary.failures.push(RecalcFailure {
                        roster_id: roster_id.clone(),
                        player_id: err
                            .downcast_ref::<KeeperError>()
                            .and_then(KeeperError::player_id)
                            .cloned(),
                        error: err.to_string(),
                    });
                }
            }
        }

        info!(
            season = report.season,
            applied = summary.applied,
            failed = summary.failures.len(),
            "applied keeper recalculation"
        );
        Ok(summary)
    }

    fn apply_roster(
        &self,
        season: Season,
        roster_id: &RosterId,
        entries: &[&RecalcEntry],
        digest: &str,
    ) -> anyhow::Result<Vec<String>> {
        let (expected, mut record) = self.load_record(season, roster_id)?;
        let mut audits = Vec::with_capacity(entries.len());

        for entry in entries {
            let Some(intent) = record.intents.iter_mut().find(|i| i.player_id == entry.player_id) else {
                return Err(KeeperError::KeeperNotFound {
                    player_id: entry.player_id.clone(),
                    roster_id: roster_id.clone(),
                }
                .into());
            };
            if intent.final_cost != entry.old_cost {
                return Err(KeeperError::ConcurrentModification(roster_id.clone()).into());
            }

            intent.final_cost = entry.new_cost;
            intent.base_cost = entry.base_cost;
            intent.years_held = entry.years_held;
            intent.was_cascaded = entry.was_cascaded;

            audits.push(AuditEntry {
                id: utils::new_uuid_to_bech32("audit_")?,
                recorded_at: TimeStamp::now(),
                season,
                roster_id: roster_id.clone(),
                player_id: entry.player_id.clone(),
                old_cost: entry.old_cost,
                new_cost: entry.new_cost,
                base_cost: entry.base_cost,
                years_held: entry.years_held,
            });
        }

        record.version += 1;
        record.snapshot_digest = digest.to_string();
        self.write_roster(&keepers_key(season, roster_id), expected.as_ref(), &record, &audits)?;

        Ok(audits.into_iter().map(|a| a.id).collect())
    }

    /// Applied recalculation changes for a season, oldest first
    pub fn audit_log(&self, season: Season) -> anyhow::Result<Vec<AuditEntry>> {
        let mut entries = Vec::new();
        for item in self.instance.scan_prefix(audit_prefix(season)) {
            let (_, bytes) = item?;
            entries.push(minicbor::decode::<AuditEntry>(&bytes)?);
        }
        entries.sort_by(|a, b| a.recorded_at.cmp(&b.recorded_at).then_with(|| a.id.cmp(&b.id)));
        Ok(entries)
    }

    // optimistic check-and-write: the roster record must still hold `expected`
    fn write_roster(
        &self,
        key: &str,
        expected: Option<&IVec>,
        record: &RosterKeepers,
        audits: &[AuditEntry],
    ) -> anyhow::Result<()> {
        let value = record.encode()?;
        let mut audit_rows = Vec::with_capacity(audits.len());
        for audit in audits {
            audit_rows.push((format!("{}{}", audit_prefix(audit.season), audit.id), minicbor::to_vec(audit)?));
        }

        let result = self.instance.transaction(|tx| {
            let current = tx.get(key.as_bytes())?;
            if current.as_ref() != expected {
                return Err(ConflictableTransactionError::Abort(KeeperError::ConcurrentModification(
                    record.roster_id.clone(),
                )));
            }
            tx.insert(key.as_bytes(), value.as_slice())?;
            for (audit_key, audit_value) in &audit_rows {
                tx.insert(audit_key.as_bytes(), audit_value.as_slice())?;
            }
            Ok(())
        });

        match result {
            Ok(()) => Ok(()),
            Err(TransactionError::Abort(err)) => Err(err.into()),
            Err(TransactionError::Storage(err)) => Err(err.into()),
        }
    }
}
