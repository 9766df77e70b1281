//! Identifier helpers

use crate::types::{RosterId, Season};
use bech32::Bech32m;
use uuid7::uuid7;

// time-ordered uuid, bech32 encoded under the given prefix
pub fn new_uuid_to_bech32(hrp: &str) -> anyhow::Result<String> {
    let hrp = bech32::Hrp::parse(hrp)?;
    let encode = bech32::encode::<Bech32m>(hrp, uuid7().as_bytes())?;
    Ok(encode)
}

pub(crate) fn keepers_key(season: Season, roster_id: &RosterId) -> String {
    format!("keepers/{season}/{roster_id}")
}

pub(crate) fn keepers_prefix(season: Season) -> String {
    format!("keepers/{season}/")
}

pub(crate) fn audit_prefix(season: Season) -> String {
    format!("audit/{season}/")
}
