//! The shared keeper pipeline (origin, cost, slot cascade) and the what-if
//! simulator built on it. Nothing in this module writes anywhere; the persisted
//! path in [`crate::service`] calls [`evaluate_roster`] too, which is what keeps
//! previews and committed keepers identical.
use crate::cascade::{self, SlotClaim};
use crate::cost::{CostBreakdown, compute_cost};
use crate::error::{DataQualityWarning, KeeperError};
use crate::history::HistoryLedger;
use crate::origin::resolve_origin;
use crate::settings::KeeperSettings;
use crate::types::{DraftPickOwnership, KeeperIntent, KeeperSelection, KeeperType, PlayerId, RosterId, Round, Season};
use std::collections::{BTreeSet, HashMap};

/// Immutable inputs for one league season.
#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct LeagueSnapshot {
    #[n(0)]
    pub season: Season,
    #[n(1)]
    pub settings: KeeperSettings,
    #[n(2)]
    pub history: HistoryLedger,
    #[n(3)]
    pub draft_picks: Vec<DraftPickOwnership>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluatedKeeper {
    pub player_id: PlayerId,
    pub keeper_type: KeeperType,
    pub years_held: u32,
    pub base_cost: Round,
    pub requested_round: Round,
    pub assigned_round: Round,
    pub was_cascaded: bool,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEvaluation {
    pub roster_id: RosterId,
    pub season: Season,
    pub keepers: Vec<EvaluatedKeeper>,
    pub owned_rounds: BTreeSet<Round>,
    pub warnings: Vec<DataQualityWarning>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedKeeper {
    pub player_id: PlayerId,
    pub keeper_type: KeeperType,
    pub base_cost: Round,
    pub final_cost: Round,
    pub cascaded: bool,
    pub cascade_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationResult {
    pub roster_id: RosterId,
    pub keepers: Vec<SimulatedKeeper>,
    pub total_slots_taken: u32,
    /// Keeper slots still open under `max_keepers`.
    pub available_slots: u32,
    pub warnings: Vec<DataQualityWarning>,
}

/// An edit relative to a roster's persisted keepers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HypotheticalChange {
    Add(KeeperSelection),
    Remove(PlayerId),
    Substitute { out: PlayerId, keep: KeeperSelection },
}

impl LeagueSnapshot {
    pub fn new(
        season: Season,
        settings: KeeperSettings,
        history: HistoryLedger,
        draft_picks: Vec<DraftPickOwnership>,
    ) -> Self {
        Self {
            season,
            settings,
            history,
            draft_picks,
        }
    }

    /// Hex sha256 of the CBOR encoded snapshot. Identical inputs share a digest.
    pub fn digest(&self) -> anyhow::Result<String> {
        let contents = minicbor::to_vec(self)?;
        Ok(sha256::digest(&contents))
    }

    pub fn owned_rounds(&self, roster_id: &RosterId) -> BTreeSet<Round> {
        cascade::owned_rounds(&self.draft_picks, roster_id, self.season)
    }

    pub fn cost_of(&self, player_id: &PlayerId, roster_id: &RosterId) -> (CostBreakdown, Vec<DataQualityWarning>) {
        let resolution = resolve_origin(&self.history, player_id, roster_id, self.season, &self.settings);
        let breakdown = compute_cost(resolution.origin, self.season, &self.settings);
        (breakdown, resolution.warnings)
    }
}

pub fn evaluate_roster(
    snapshot: &LeagueSnapshot,
    roster_id: &RosterId,
    selections: &[KeeperSelection],
) -> Result<RosterEvaluation, KeeperError> {
    let settings = &snapshot.settings;
    settings.validate()?;

    let mut warnings = Vec::new();
    let mut claims = Vec::with_capacity(selections.len());
    let mut costs = HashMap::with_capacity(selections.len());

    for selection in selections {
        let (breakdown, mut found) = snapshot.cost_of(&selection.player_id, roster_id);
        warnings.append(&mut found);
        claims.push(SlotClaim {
            player_id: selection.player_id.clone(),
            keeper_type: selection.keeper_type,
            requested_round: breakdown.franchise.final_cost,
            years_held: breakdown.years_held,
        });
        costs.insert(selection.player_id.clone(), breakdown);
    }

    // limits first, then type eligibility, both before any slot is claimed
    cascade::check_limits(&claims, settings)?;
    for claim in &claims {
        if let Some(breakdown) = costs.get(&claim.player_id) {
            breakdown.cost_for(&claim.player_id, claim.keeper_type)?;
        }
    }

    let owned_rounds = snapshot.owned_rounds(roster_id);
    let placed = cascade::resolve_slots(roster_id, &claims, &owned_rounds, settings)?;

    let keepers = placed
        .into_iter()
        .map(|slot| {
            let breakdown = costs.get(&slot.player_id);
            EvaluatedKeeper {
                years_held: breakdown.map_or(0, |b| b.years_held),
                base_cost: breakdown.map_or(slot.requested_round, |b| b.franchise.base_cost),
                player_id: slot.player_id,
                keeper_type: slot.keeper_type,
                requested_round: slot.requested_round,
                assigned_round: slot.assigned_round,
                was_cascaded: slot.was_cascaded,
                reason: slot.reason,
            }
        })
        .collect();

    Ok(RosterEvaluation {
        roster_id: roster_id.clone(),
        season: snapshot.season,
        keepers,
        owned_rounds,
        warnings,
    })
}

impl RosterEvaluation {
    /// Intents as the keeper store records them. `locked` reports which
    /// players the commissioner has already locked.
    pub fn to_intents(&self, locked: impl Fn(&PlayerId) -> bool) -> Vec<KeeperIntent> {
        self.keepers
            .iter()
            .map(|k| KeeperIntent {
                player_id: k.player_id.clone(),
                roster_id: self.roster_id.clone(),
                season: self.season,
                keeper_type: k.keeper_type,
                base_cost: k.base_cost,
                final_cost: k.assigned_round,
                years_held: k.years_held,
                was_cascaded: k.was_cascaded,
                is_locked: locked(&k.player_id),
            })
            .collect()
    }

    pub fn keeper(&self, player_id: &PlayerId) -> Option<&EvaluatedKeeper> {
        self.keepers.iter().find(|k| &k.player_id == player_id)
    }
}

pub fn simulate(
    snapshot: &LeagueSnapshot,
    roster_id: &RosterId,
    hypothetical: &[KeeperSelection],
) -> Result<SimulationResult, KeeperError> {
    let evaluation = evaluate_roster(snapshot, roster_id, hypothetical)?;

    let total_slots_taken = evaluation.keepers.len() as u32;
    let keepers = evaluation
        .keepers
        .into_iter()
        .map(|k| SimulatedKeeper {
            player_id: k.player_id,
            keeper_type: k.keeper_type,
            base_cost: k.base_cost,
            final_cost: k.assigned_round,
            cascaded: k.was_cascaded,
            cascade_reason: k.reason,
        })
        .collect();

    Ok(SimulationResult {
        roster_id: evaluation.roster_id,
        keepers,
        total_slots_taken,
        available_slots: snapshot.settings.max_keepers.saturating_sub(total_slots_taken),
        warnings: evaluation.warnings,
    })
}

/// Applies `changes` in order to the persisted keepers, yielding the selection
/// list to simulate. Removing or substituting an absent player is a no-op
/// removal; adding an existing player replaces its designation.
pub fn apply_changes(persisted: &[KeeperIntent], changes: &[HypotheticalChange]) -> Vec<KeeperSelection> {
    let mut selections: Vec<KeeperSelection> = persisted.iter().map(KeeperSelection::from).collect();

    for change in changes {
        match change {
            HypotheticalChange::Add(keep) => upsert(&mut selections, keep.clone()),
            HypotheticalChange::Remove(player_id) => selections.retain(|s| &s.player_id != player_id),
            HypotheticalChange::Substitute { out, keep } => {
                selections.retain(|s| &s.player_id != out);
                upsert(&mut selections, keep.clone());
            }
        }
    }
    selections
}

fn upsert(selections: &mut Vec<KeeperSelection>, keep: KeeperSelection) {
    match selections.iter_mut().find(|s| s.player_id == keep.player_id) {
        Some(existing) => existing.keeper_type = keep.keeper_type,
        None => selections.push(keep),
    }
}
