//! Read-only view over the ownership history of every player in a league
use crate::types::{AcquisitionEvent, PlayerId};
use std::collections::BTreeMap;

pub trait OwnershipHistory {
    /// Every event recorded for the player, oldest first. Events sharing a
    /// timestamp keep the order they were recorded in.
    fn events_for(&self, player_id: &PlayerId) -> &[AcquisitionEvent];
}

/// In-memory history snapshot, indexed by player.
#[derive(Debug, Clone, Default, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct HistoryLedger {
    #[n(0)]
    events: BTreeMap<PlayerId, Vec<AcquisitionEvent>>,
}

impl HistoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_events(events: impl IntoIterator<Item = AcquisitionEvent>) -> Self {
        let mut ledger = Self::new();
        for event in events {
            ledger.record(event);
        }
        ledger
    }

    /// Appends an event, keeping the player's list ordered by timestamp.
    pub fn record(&mut self, event: AcquisitionEvent) {
        let list = self.events.entry(event.player_id.clone()).or_default();
        let at = list.partition_point(|e| e.timestamp <= event.timestamp);
        list.insert(at, event);
    }

    pub fn players(&self) -> impl Iterator<Item = &PlayerId> {
        self.events.keys()
    }

    pub fn len(&self) -> usize {
        self.events.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl OwnershipHistory for HistoryLedger {
    fn events_for(&self, player_id: &PlayerId) -> &[AcquisitionEvent] {
        self.events.get(player_id).map(Vec::as_slice).unwrap_or(&[])
    }
}
