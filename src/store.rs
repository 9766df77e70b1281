//! Persisted keeper records and their CBOR encoding
use crate::types::{KeeperIntent, PlayerId, RosterId, Round, Season, TimeStamp};

/// Every keeper of one roster for one season, stored under a single key so a
/// whole-roster commit is one check-and-write.
#[derive(Debug, Clone, PartialEq, Eq, Default, minicbor::Encode, minicbor::Decode)]
pub struct RosterKeepers {
    #[n(0)]
    pub roster_id: RosterId,
    #[n(1)]
    pub season: Season,
    #[n(2)]
    pub version: u64,
    #[n(3)]
    pub snapshot_digest: String, // digest of the snapshot the intents were resolved against
    #[n(4)]
    pub intents: Vec<KeeperIntent>,
}

/// One applied recalculation change.
#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct AuditEntry {
    #[n(0)]
    pub id: String, // bech32 encoded uuid7
    #[n(1)]
    pub recorded_at: TimeStamp,
    #[n(2)]
    pub season: Season,
    #[n(3)]
    pub roster_id: RosterId,
    #[n(4)]
    pub player_id: PlayerId,
    #[n(5)]
    pub old_cost: Round,
    #[n(6)]
    pub new_cost: Round,
    #[n(7)]
    pub base_cost: Round,
    #[n(8)]
    pub years_held: u32,
}

impl RosterKeepers {
    pub fn empty(roster_id: RosterId, season: Season) -> Self {
        Self {
            roster_id,
            season,
            ..Default::default()
        }
    }

    pub fn decode(bytes: &[u8]) -> anyhow::Result<Self> {
        Ok(minicbor::decode(bytes)?)
    }

    pub fn encode(&self) -> anyhow::Result<Vec<u8>> {
        Ok(minicbor::to_vec(self)?)
    }

    pub fn intent(&self, player_id: &PlayerId) -> Option<&KeeperIntent> {
        self.intents.iter().find(|i| &i.player_id == player_id)
    }
}
