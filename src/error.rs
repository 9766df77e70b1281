use crate::types::{PlayerId, RosterId, Round, Season};

/// Non-fatal gaps in ownership history. Resolution carries on with the
/// fail-open default and reports these back for auditing.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DataQualityWarning {
    #[error("no acquisition history for player {player_id} on roster {roster_id}, defaulting to undrafted as of {as_of_season}")]
    MissingHistory {
        player_id: PlayerId,
        roster_id: RosterId,
        as_of_season: Season,
    },
    #[error("ownership cycle for player {player_id} through roster {roster_id}, defaulting to undrafted as of {as_of_season}")]
    OwnershipCycle {
        player_id: PlayerId,
        roster_id: RosterId,
        as_of_season: Season,
    },
    #[error("player {player_id} was released by roster {roster_id} after their latest acquisition")]
    ReleasedAfterAcquisition {
        player_id: PlayerId,
        roster_id: RosterId,
    },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{requested} keepers requested, league allows at most {max}")]
    TooManyKeepers { requested: usize, max: u32 },
    #[error("{requested} franchise tags requested, league allows at most {max}")]
    TooManyFranchiseTags { requested: usize, max: u32 },
    #[error("{requested} regular keepers requested, league allows at most {max}")]
    TooManyRegularKeepers { requested: usize, max: u32 },
    #[error("player {player_id} has been held {years_held} years and can only be kept with a franchise tag")]
    FranchiseTagRequired { player_id: PlayerId, years_held: u32 },
    #[error("player {0} was selected more than once")]
    DuplicatePlayer(PlayerId),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CascadeError {
    #[error("cannot keep player {player_id}: no owned round at or after round {requested_round} is free")]
    Unresolvable {
        player_id: PlayerId,
        requested_round: Round,
    },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("minimum round must be at least 1")]
    MinimumRoundZero,
    #[error("undrafted round {undrafted} is earlier than minimum round {minimum}")]
    UndraftedBeforeMinimum { undrafted: Round, minimum: Round },
    #[error("{field} ({value}) exceeds max keepers ({max_keepers})")]
    LimitExceedsMaxKeepers {
        field: &'static str,
        value: u32,
        max_keepers: u32,
    },
    #[error("offseason window is invalid: {0}")]
    InvalidOffseasonWindow(String),
}

#[derive(thiserror::Error, Debug)]
pub enum KeeperError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Cascade(#[from] CascadeError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("roster {0} was modified concurrently, re-run resolution and retry")]
    ConcurrentModification(RosterId),
    #[error("keeper {player_id} on roster {roster_id} is locked")]
    KeeperLocked {
        player_id: PlayerId,
        roster_id: RosterId,
    },
    #[error("no keeper {player_id} on roster {roster_id}")]
    KeeperNotFound {
        player_id: PlayerId,
        roster_id: RosterId,
    },
}

impl KeeperError {
    /// The player a failure is about, when it names one.
    pub fn player_id(&self) -> Option<&PlayerId> {
        match self {
            KeeperError::Validation(ValidationError::FranchiseTagRequired { player_id, .. })
            | KeeperError::Validation(ValidationError::DuplicatePlayer(player_id))
            | KeeperError::Cascade(CascadeError::Unresolvable { player_id, .. })
            | KeeperError::KeeperLocked { player_id, .. }
            | KeeperError::KeeperNotFound { player_id, .. } => Some(player_id),
            KeeperError::Validation(_)
            | KeeperError::Settings(_)
            | KeeperError::ConcurrentModification(_) => None,
        }
    }
}
