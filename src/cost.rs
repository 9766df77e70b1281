//! Keeper cost derivation from an origin and the league's decay rules
use crate::error::ValidationError;
use crate::origin::Origin;
use crate::settings::KeeperSettings;
use crate::types::{KeeperType, PlayerId, Round, Season};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeeperCost {
    pub base_cost: Round,
    pub final_cost: Round,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostBreakdown {
    pub years_held: u32,
    /// `None` once the player has to be franchise tagged.
    pub regular: Option<KeeperCost>,
    pub franchise: KeeperCost,
    pub must_franchise_tag: bool,
}

pub fn compute_cost(origin: Origin, current_season: Season, settings: &KeeperSettings) -> CostBreakdown {
    let years_held = current_season.saturating_sub(origin.origin_season).max(0) as u32;

    let reduction = i64::from(years_held) * i64::from(settings.cost_reduction_per_year);
    let decayed = i64::from(origin.base_round) - reduction;
    let final_cost = decayed.max(i64::from(settings.minimum_round)) as Round;

    let cost = KeeperCost {
        base_cost: origin.base_round,
        final_cost,
    };
    let must_franchise_tag = years_held >= settings.regular_keeper_max_years;

    CostBreakdown {
        years_held,
        regular: (!must_franchise_tag).then_some(cost),
        franchise: cost,
        must_franchise_tag,
    }
}

impl CostBreakdown {
    pub fn cost_for(&self, player_id: &PlayerId, keeper_type: KeeperType) -> Result<KeeperCost, ValidationError> {
        match keeper_type {
            KeeperType::Franchise => Ok(self.franchise),
            KeeperType::Regular => self.regular.ok_or_else(|| ValidationError::FranchiseTagRequired {
                player_id: player_id.clone(),
                years_held: self.years_held,
            }),
        }
    }
}
