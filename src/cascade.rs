//! Draft slot assignment for a roster's keepers.
//!
//! Each keeper claims the round equal to its cost. When that round is already
//! claimed, not owned, or earlier than the league minimum, the keeper slides to
//! the next later round the roster owns. Slides only ever move toward later
//! (cheaper) rounds and a keeper is never silently dropped: either every claim
//! is placed or the whole call fails.
use crate::error::{CascadeError, KeeperError, ValidationError};
use crate::settings::KeeperSettings;
use crate::types::{DraftPickOwnership, KeeperType, PlayerId, RosterId, Round, Season};
use std::cmp::Reverse;
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotClaim {
    pub player_id: PlayerId,
    pub keeper_type: KeeperType,
    pub requested_round: Round,
    pub years_held: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeResult {
    pub player_id: PlayerId,
    pub roster_id: RosterId,
    pub keeper_type: KeeperType,
    pub requested_round: Round,
    pub assigned_round: Round,
    pub was_cascaded: bool,
    pub reason: Option<String>,
}

/// Rounds of `season` currently held by `roster_id`.
pub fn owned_rounds(picks: &[DraftPickOwnership], roster_id: &RosterId, season: Season) -> BTreeSet<Round> {
    picks
        .iter()
        .filter(|p| p.season == season && &p.current_owner == roster_id)
        .map(|p| p.round)
        .collect()
}

pub fn check_limits(claims: &[SlotClaim], settings: &KeeperSettings) -> Result<(), ValidationError> {
    if claims.len() > settings.max_keepers as usize {
        return Err(ValidationError::TooManyKeepers {
            requested: claims.len(),
            max: settings.max_keepers,
        });
    }

    let franchise = claims
        .iter()
        .filter(|c| c.keeper_type == KeeperType::Franchise)
        .count();
    if franchise > settings.max_franchise_tags as usize {
        return Err(ValidationError::TooManyFranchiseTags {
            requested: franchise,
            max: settings.max_franchise_tags,
        });
    }

    let regular = claims.len() - franchise;
    if regular > settings.max_regular_keepers as usize {
        return Err(ValidationError::TooManyRegularKeepers {
            requested: regular,
            max: settings.max_regular_keepers,
        });
    }

    let mut seen = HashSet::new();
    for claim in claims {
        if !seen.insert(&claim.player_id) {
            return Err(ValidationError::DuplicatePlayer(claim.player_id.clone()));
        }
    }
    Ok(())
}

pub fn resolve_slots(
    roster_id: &RosterId,
    claims: &[SlotClaim],
    owned_rounds: &BTreeSet<Round>,
    settings: &KeeperSettings,
) -> Result<Vec<CascadeResult>, KeeperError> {
    check_limits(claims, settings)?;

    let mut ordered: Vec<&SlotClaim> = claims.iter().collect();
    // KeeperType orders Franchise first, so tags win ties on cost
    ordered.sort_by(|a, b| {
        (a.requested_round, a.keeper_type, Reverse(a.years_held), &a.player_id).cmp(&(
            b.requested_round,
            b.keeper_type,
            Reverse(b.years_held),
            &b.player_id,
        ))
    });

    let mut claimed: BTreeSet<Round> = BTreeSet::new();
    let mut results = Vec::with_capacity(ordered.len());

    for claim in ordered {
        let requested = claim.requested_round;
        let legal = |round: &Round| *round >= settings.minimum_round && !claimed.contains(round);

        let (assigned, reason) = if owned_rounds.contains(&requested) && legal(&requested) {
            (requested, None)
        } else {
            let next = owned_rounds
                .range(requested.saturating_add(1)..)
                .find(|r| legal(r))
                .copied()
                .ok_or_else(|| CascadeError::Unresolvable {
                    player_id: claim.player_id.clone(),
                    requested_round: requested,
                })?;
            let why = if claimed.contains(&requested) {
                "occupied"
            } else if requested < settings.minimum_round {
                "below the minimum round"
            } else {
                "not owned"
            };
            (next, Some(format!("round {requested} {why}, moved to {next}")))
        };

        if let Some(reason) = &reason {
            debug!(roster = %roster_id, player = %claim.player_id, "{reason}");
        }
        claimed.insert(assigned);
        results.push(CascadeResult {
            player_id: claim.player_id.clone(),
            roster_id: roster_id.clone(),
            keeper_type: claim.keeper_type,
            requested_round: requested,
            assigned_round: assigned,
            was_cascaded: reason.is_some(),
            reason,
        });
    }

    Ok(results)
}
