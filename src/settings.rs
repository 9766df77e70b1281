//! Per-league keeper rules, passed by value into every resolver call
use crate::error::SettingsError;
use crate::types::{Round, Season, TimeStamp};
use chrono::{Datelike, NaiveDate};

/// Calendar span between the end of one season and the start of free agency
/// for the next. Trades inside it reset the held-years clock.
///
/// The window is `[start, end)` inside a single calendar year. Its start is also
/// the season rollover: instants before it belong to the previous season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct OffseasonWindow {
    #[n(0)]
    pub start_month: u32,
    #[n(1)]
    pub start_day: u32,
    #[n(2)]
    pub end_month: u32,
    #[n(3)]
    pub end_day: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct KeeperSettings {
    #[n(0)]
    pub max_keepers: u32,
    #[n(1)]
    pub max_franchise_tags: u32,
    #[n(2)]
    pub max_regular_keepers: u32,
    #[n(3)]
    pub regular_keeper_max_years: u32,
    #[n(4)]
    pub undrafted_round: Round,
    #[n(5)]
    pub minimum_round: Round,
    #[n(6)]
    pub cost_reduction_per_year: u32,
    #[n(7)]
    pub offseason_window: OffseasonWindow,
}

impl OffseasonWindow {
    pub fn new(start: (u32, u32), end: (u32, u32)) -> Self {
        Self {
            start_month: start.0,
            start_day: start.1,
            end_month: end.0,
            end_day: end.1,
        }
    }

    fn start(&self) -> (u32, u32) {
        (self.start_month, self.start_day)
    }

    fn end(&self) -> (u32, u32) {
        (self.end_month, self.end_day)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        // 2024 is a leap year so Feb 29 is accepted as a boundary
        for (month, day) in [self.start(), self.end()] {
            if NaiveDate::from_ymd_opt(2024, month, day).is_none() {
                return Err(SettingsError::InvalidOffseasonWindow(format!(
                    "{month:02}-{day:02} is not a calendar day"
                )));
            }
        }
        if self.start() >= self.end() {
            return Err(SettingsError::InvalidOffseasonWindow(format!(
                "start {:02}-{:02} must precede end {:02}-{:02}",
                self.start_month, self.start_day, self.end_month, self.end_day
            )));
        }
        Ok(())
    }

    pub fn contains(&self, at: &TimeStamp) -> bool {
        let at = month_day(at);
        self.start() <= at && at < self.end()
    }

    /// The season an instant counts toward.
    pub fn season_of(&self, at: &TimeStamp) -> Season {
        let year = at.to_datetime_utc().year();
        if month_day(at) >= self.start() {
            year
        } else {
            year - 1
        }
    }
}

fn month_day(at: &TimeStamp) -> (u32, u32) {
    let dt = at.to_datetime_utc();
    (dt.month(), dt.day())
}

impl Default for OffseasonWindow {
    // after the championship week, until waivers reopen ahead of the draft
    fn default() -> Self {
        Self::new((2, 1), (8, 15))
    }
}

impl Default for KeeperSettings {
    fn default() -> Self {
        Self {
            max_keepers: 3,
            max_franchise_tags: 1,
            max_regular_keepers: 3,
            regular_keeper_max_years: 2,
            undrafted_round: 10,
            minimum_round: 1,
            cost_reduction_per_year: 1,
            offseason_window: OffseasonWindow::default(),
        }
    }
}

impl KeeperSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.minimum_round < 1 {
            return Err(SettingsError::MinimumRoundZero);
        }
        if self.undrafted_round < self.minimum_round {
            return Err(SettingsError::UndraftedBeforeMinimum {
                undrafted: self.undrafted_round,
                minimum: self.minimum_round,
            });
        }
        if self.max_franchise_tags > self.max_keepers {
            return Err(SettingsError::LimitExceedsMaxKeepers {
                field: "max_franchise_tags",
                value: self.max_franchise_tags,
                max_keepers: self.max_keepers,
            });
        }
        if self.max_regular_keepers > self.max_keepers {
            return Err(SettingsError::LimitExceedsMaxKeepers {
                field: "max_regular_keepers",
                value: self.max_regular_keepers,
                max_keepers: self.max_keepers,
            });
        }
        self.offseason_window.validate()
    }

    pub fn season_of(&self, at: &TimeStamp) -> Season {
        self.offseason_window.season_of(at)
    }

    pub fn is_offseason(&self, at: &TimeStamp) -> bool {
        self.offseason_window.contains(at)
    }
}
