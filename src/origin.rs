//! Origin resolution: when did the current unbroken holding of a player begin,
//! and which draft round anchors its keeper cost.
//!
//! The walk goes backward through the player's acquisition events, hopping to
//! the counterparty roster on trades and to the dropping roster on same-season
//! pickups. Every roster is visited at most once per lookup, so malformed trade
//! loops terminate with the conservative fallback instead of spinning.
use crate::error::DataQualityWarning;
use crate::history::OwnershipHistory;
use crate::settings::KeeperSettings;
use crate::types::{AcquisitionEvent, EventKind, PlayerId, RosterId, Round, Season, TimeStamp};
use std::collections::HashSet;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Origin {
    pub origin_season: Season,
    pub base_round: Round,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginResolution {
    pub origin: Origin,
    pub warnings: Vec<DataQualityWarning>,
}

// which events a step of the walk may look at
#[derive(Debug, Clone, Copy)]
enum Cutoff {
    SeasonAtMost(Season),
    Before(TimeStamp),
}

impl Cutoff {
    fn admits(&self, event: &AcquisitionEvent, settings: &KeeperSettings) -> bool {
        match self {
            Cutoff::SeasonAtMost(season) => settings.season_of(&event.timestamp) <= *season,
            Cutoff::Before(at) => event.timestamp < *at,
        }
    }
}

pub fn resolve_origin(
    history: &dyn OwnershipHistory,
    player_id: &PlayerId,
    roster_id: &RosterId,
    as_of_season: Season,
    settings: &KeeperSettings,
) -> OriginResolution {
    let events = history.events_for(player_id);
    let mut warnings = Vec::new();

    let top = Cutoff::SeasonAtMost(as_of_season);
    if let Some((_, last)) = latest_event(events, roster_id, top, settings, |_| true) {
        if !last.kind.is_acquisition() {
            let warning = DataQualityWarning::ReleasedAfterAcquisition {
                player_id: player_id.clone(),
                roster_id: roster_id.clone(),
            };
            warn!(%warning, "ownership history");
            warnings.push(warning);
        }
    }

    let mut visited: HashSet<(&PlayerId, RosterId)> = HashSet::new();
    let mut roster = roster_id.clone();
    let mut cutoff = top;
    // fixed by the most recent offseason trade, the walk continues only for the base round
    let mut reset_season: Option<Season> = None;

    let origin = loop {
        if !visited.insert((player_id, roster.clone())) {
            let warning = DataQualityWarning::OwnershipCycle {
                player_id: player_id.clone(),
                roster_id: roster.clone(),
                as_of_season,
            };
            warn!(%warning, "ownership history");
            warnings.push(warning);
            break Origin {
                origin_season: as_of_season,
                base_round: settings.undrafted_round,
            };
        }

        let Some((position, event)) = latest_event(events, &roster, cutoff, settings, |k| k.is_acquisition()) else {
            let warning = DataQualityWarning::MissingHistory {
                player_id: player_id.clone(),
                roster_id: roster.clone(),
                as_of_season,
            };
            warn!(%warning, "ownership history");
            warnings.push(warning);
            break Origin {
                origin_season: reset_season.unwrap_or(as_of_season),
                base_round: settings.undrafted_round,
            };
        };

        let event_season = settings.season_of(&event.timestamp);
        match &event.kind {
            EventKind::Drafted { round } => {
                debug!(player = %player_id, roster = %roster, season = event_season, round, "reached draft");
                break Origin {
                    origin_season: reset_season.unwrap_or(event_season),
                    base_round: *round,
                };
            }
            EventKind::TradedIn { from } => {
                if settings.is_offseason(&event.timestamp) {
                    reset_season.get_or_insert(event_season);
                }
                debug!(player = %player_id, roster = %roster, from = %from, "following trade");
                roster = from.clone();
                cutoff = Cutoff::Before(event.timestamp);
            }
            EventKind::WaiverAdd | EventKind::FreeAgentAdd => {
                match latest_drop_before(events, position) {
                    Some(drop) if settings.season_of(&drop.timestamp) == event_season => {
                        debug!(player = %player_id, roster = %roster, dropped_by = %drop.roster_id, "pickup continues same-season drop");
                        roster = drop.roster_id.clone();
                        cutoff = Cutoff::Before(drop.timestamp);
                    }
                    _ => {
                        break Origin {
                            origin_season: reset_season.unwrap_or(event_season),
                            base_round: settings.undrafted_round,
                        };
                    }
                }
            }
            // releases are filtered out by latest_event above
            EventKind::TradedOut { .. } | EventKind::Dropped => {
                break Origin {
                    origin_season: as_of_season,
                    base_round: settings.undrafted_round,
                };
            }
        }
    };

    OriginResolution { origin, warnings }
}

// the matching event along with its position in `events`
fn latest_event<'a>(
    events: &'a [AcquisitionEvent],
    roster_id: &RosterId,
    cutoff: Cutoff,
    settings: &KeeperSettings,
    wanted: impl Fn(&EventKind) -> bool,
) -> Option<(usize, &'a AcquisitionEvent)> {
    events
        .iter()
        .enumerate()
        .rev()
        .filter(|(_, e)| &e.roster_id == roster_id && wanted(&e.kind))
        .find(|(_, e)| cutoff.admits(e, settings))
}

/// The last drop recorded ahead of `events[position]`. Goes by ledger order so
/// a release stamped at the same instant as the claim still counts.
fn latest_drop_before(events: &[AcquisitionEvent], position: usize) -> Option<&AcquisitionEvent> {
    events[..position]
        .iter()
        .rev()
        .find(|e| e.kind == EventKind::Dropped)
}
