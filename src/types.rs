//! Core league types: identifiers, ownership events and keeper intents
use chrono::{DateTime, TimeZone, Utc};
use std::fmt;

/// A league season, keyed by the calendar year the season kicks off in.
pub type Season = i32;

/// A draft round. Lower numbers are earlier, more expensive picks.
pub type Round = u32;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlayerId(pub String);

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RosterId(pub String);

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub struct TimeStamp(DateTime<Utc>);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl RosterId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for RosterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TimeStamp {
    pub fn now() -> Self {
        Self(Utc::now())
    }
    /// Returns `None` when the components don't form a valid UTC instant.
    pub fn new_with(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Option<Self> {
        Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
            .single()
            .map(Self)
    }
    pub fn to_datetime_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

impl From<DateTime<Utc>> for TimeStamp {
    fn from(value: DateTime<Utc>) -> Self {
        TimeStamp(value)
    }
}

/// How a roster came to hold (or stopped holding) a player.
#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub enum EventKind {
    #[n(0)]
    Drafted {
        #[n(0)]
        round: Round,
    },
    #[n(1)]
    TradedIn {
        #[n(0)]
        from: RosterId,
    },
    #[n(2)]
    TradedOut {
        #[n(0)]
        to: RosterId,
    },
    #[n(3)]
    WaiverAdd,
    #[n(4)]
    FreeAgentAdd,
    #[n(5)]
    Dropped,
}

impl EventKind {
    /// Events that start a holding for the roster they are recorded against.
    pub fn is_acquisition(&self) -> bool {
        match self {
            EventKind::Drafted { .. }
            | EventKind::TradedIn { .. }
            | EventKind::WaiverAdd
            | EventKind::FreeAgentAdd => true,
            EventKind::TradedOut { .. } | EventKind::Dropped => false,
        }
    }
}

// append-only, one per (player, roster) transaction
#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct AcquisitionEvent {
    #[n(0)]
    pub player_id: PlayerId,
    #[n(1)]
    pub roster_id: RosterId,
    #[n(2)]
    pub timestamp: TimeStamp,
    #[n(3)]
    pub kind: EventKind,
}

impl AcquisitionEvent {
    pub fn new(player_id: PlayerId, roster_id: RosterId, timestamp: TimeStamp, kind: EventKind) -> Self {
        Self {
            player_id,
            roster_id,
            timestamp,
            kind,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, minicbor::Encode, minicbor::Decode)]
pub enum KeeperType {
    #[n(0)]
    Franchise,
    #[n(1)]
    Regular,
}

impl fmt::Display for KeeperType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeeperType::Franchise => f.write_str("franchise"),
            KeeperType::Regular => f.write_str("regular"),
        }
    }
}

/// A persisted decision to keep a player into `season`.
#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct KeeperIntent {
    #[n(0)]
    pub player_id: PlayerId,
    #[n(1)]
    pub roster_id: RosterId,
    #[n(2)]
    pub season: Season,
    #[n(3)]
    pub keeper_type: KeeperType,
    #[n(4)]
    pub base_cost: Round,
    #[n(5)]
    pub final_cost: Round, // the round assigned after cascade
    #[n(6)]
    pub years_held: u32,
    #[n(7)]
    pub was_cascaded: bool,
    #[n(8)]
    pub is_locked: bool,
}

/// Caller-side keeper choice: who, and under which designation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeeperSelection {
    pub player_id: PlayerId,
    pub keeper_type: KeeperType,
}

impl KeeperSelection {
    pub fn new(player_id: PlayerId, keeper_type: KeeperType) -> Self {
        Self {
            player_id,
            keeper_type,
        }
    }
    pub fn regular(player_id: &str) -> Self {
        Self::new(PlayerId::new(player_id), KeeperType::Regular)
    }
    pub fn franchise(player_id: &str) -> Self {
        Self::new(PlayerId::new(player_id), KeeperType::Franchise)
    }
}

impl From<&KeeperIntent> for KeeperSelection {
    fn from(intent: &KeeperIntent) -> Self {
        Self::new(intent.player_id.clone(), intent.keeper_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct DraftPickOwnership {
    #[n(0)]
    pub season: Season,
    #[n(1)]
    pub round: Round,
    #[n(2)]
    pub original_owner: RosterId,
    #[n(3)]
    pub current_owner: RosterId,
}

impl DraftPickOwnership {
    pub fn new(season: Season, round: Round, original_owner: RosterId, current_owner: RosterId) -> Self {
        Self {
            season,
            round,
            original_owner,
            current_owner,
        }
    }
}

impl<C> minicbor::Encode<C> for TimeStamp {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        if let Some(nsec) = self.0.timestamp_nanos_opt() {
            return e.i64(nsec)?.ok();
        }

        Err(minicbor::encode::Error::message(
            "failed to encode timestamp. timestamp_nanos_opt returned None",
        ))
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TimeStamp {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let nsecs = d.i64()?;

        Ok(TimeStamp(DateTime::from_timestamp_nanos(nsecs)))
    }
}

impl<C> minicbor::Encode<C> for PlayerId {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.str(&self.0)?.ok()
    }
}

impl<'b, C> minicbor::Decode<'b, C> for PlayerId {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        Ok(PlayerId(d.str()?.to_owned()))
    }
}

impl<C> minicbor::Encode<C> for RosterId {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.str(&self.0)?.ok()
    }
}

impl<'b, C> minicbor::Decode<'b, C> for RosterId {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        Ok(RosterId(d.str()?.to_owned()))
    }
}
