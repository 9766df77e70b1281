pub mod cascade;
pub mod config;
pub mod cost;
pub mod error;
pub mod history;
pub mod origin;
pub mod recalc;
pub mod service;
pub mod settings;
pub mod simulation;
pub mod store;
pub mod types;
pub mod utils;

pub use cascade::{CascadeResult, SlotClaim, owned_rounds, resolve_slots};
pub use cost::{CostBreakdown, KeeperCost, compute_cost};
pub use error::{CascadeError, DataQualityWarning, KeeperError, SettingsError, ValidationError};
pub use history::{HistoryLedger, OwnershipHistory};
pub use origin::{Origin, OriginResolution, resolve_origin};
pub use recalc::{RecalcOutcome, RecalculationReport, recalculate_all};
pub use settings::{KeeperSettings, OffseasonWindow};
pub use simulation::{LeagueSnapshot, SimulationResult, evaluate_roster, simulate};
