use crate::settings::{KeeperSettings, OffseasonWindow};
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub database_path: String,
    /// League defaults, used when a league has no settings of its own.
    pub default_settings: KeeperSettings,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let database_path = env_map
            .get("KEEPER_DB_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("KEEPER_DB_PATH".to_string()))?;

        let defaults = KeeperSettings::default();
        let default_settings = KeeperSettings {
            max_keepers: parse_or(&env_map, "KEEPER_MAX_KEEPERS", defaults.max_keepers)?,
            max_franchise_tags: parse_or(&env_map, "KEEPER_MAX_FRANCHISE_TAGS", defaults.max_franchise_tags)?,
            max_regular_keepers: parse_or(&env_map, "KEEPER_MAX_REGULAR_KEEPERS", defaults.max_regular_keepers)?,
            regular_keeper_max_years: parse_or(
                &env_map,
                "KEEPER_REGULAR_MAX_YEARS",
                defaults.regular_keeper_max_years,
            )?,
            undrafted_round: parse_or(&env_map, "KEEPER_UNDRAFTED_ROUND", defaults.undrafted_round)?,
            minimum_round: parse_or(&env_map, "KEEPER_MINIMUM_ROUND", defaults.minimum_round)?,
            cost_reduction_per_year: parse_or(
                &env_map,
                "KEEPER_COST_REDUCTION_PER_YEAR",
                defaults.cost_reduction_per_year,
            )?,
            offseason_window: match env_map.get("KEEPER_OFFSEASON_WINDOW") {
                Some(raw) => parse_window(raw)?,
                None => defaults.offseason_window,
            },
        };

        default_settings
            .validate()
            .map_err(|e| ConfigError::InvalidValue("KEEPER_*".to_string(), e.to_string()))?;

        Ok(ServiceConfig {
            database_path,
            default_settings,
        })
    }
}

fn parse_or<T: FromStr>(env_map: &HashMap<String, String>, key: &str, default: T) -> Result<T, ConfigError> {
    match env_map.get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue(key.to_string(), "must be a non-negative integer".to_string())),
        None => Ok(default),
    }
}

// "MM-DD..MM-DD", e.g. "02-01..08-15"
fn parse_window(raw: &str) -> Result<OffseasonWindow, ConfigError> {
    let invalid = || {
        ConfigError::InvalidValue(
            "KEEPER_OFFSEASON_WINDOW".to_string(),
            format!("expected MM-DD..MM-DD, got {raw}"),
        )
    };
    let month_day = |s: &str| -> Option<(u32, u32)> {
        let (m, d) = s.trim().split_once('-')?;
        Some((m.parse().ok()?, d.parse().ok()?))
    };

    let (start, end) = raw.split_once("..").ok_or_else(invalid)?;
    let window = OffseasonWindow::new(month_day(start).ok_or_else(invalid)?, month_day(end).ok_or_else(invalid)?);
    window
        .validate()
        .map_err(|e| ConfigError::InvalidValue("KEEPER_OFFSEASON_WINDOW".to_string(), e.to_string()))?;
    Ok(window)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_required_env() -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("KEEPER_DB_PATH".to_string(), "/tmp/keepers.db".to_string());
        map
    }

    #[test]
    fn test_defaults_apply() {
        let config = ServiceConfig::from_env_map(setup_required_env()).unwrap();
        assert_eq!(config.database_path, "/tmp/keepers.db");
        assert_eq!(config.default_settings, KeeperSettings::default());
    }

    #[test]
    fn test_missing_db_path() {
        let result = ServiceConfig::from_env_map(HashMap::new());
        match result {
            Err(ConfigError::MissingEnv(s)) => assert_eq!(s, "KEEPER_DB_PATH"),
            _ => panic!("Expected MissingEnv error"),
        }
    }

    #[test]
    fn test_overrides() {
        let mut env_map = setup_required_env();
        env_map.insert("KEEPER_MAX_KEEPERS".to_string(), "5".to_string());
        env_map.insert("KEEPER_UNDRAFTED_ROUND".to_string(), "12".to_string());
        env_map.insert("KEEPER_OFFSEASON_WINDOW".to_string(), "01-20..09-01".to_string());

        let config = ServiceConfig::from_env_map(env_map).unwrap();
        assert_eq!(config.default_settings.max_keepers, 5);
        assert_eq!(config.default_settings.undrafted_round, 12);
        assert_eq!(
            config.default_settings.offseason_window,
            OffseasonWindow::new((1, 20), (9, 1))
        );
    }

    #[test]
    fn test_invalid_number() {
        let mut env_map = setup_required_env();
        env_map.insert("KEEPER_MINIMUM_ROUND".to_string(), "-1".to_string());
        match ServiceConfig::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "KEEPER_MINIMUM_ROUND"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_invalid_window() {
        let mut env_map = setup_required_env();
        env_map.insert("KEEPER_OFFSEASON_WINDOW".to_string(), "08-15..02-01".to_string());
        match ServiceConfig::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "KEEPER_OFFSEASON_WINDOW"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_inconsistent_settings() {
        let mut env_map = setup_required_env();
        env_map.insert("KEEPER_MINIMUM_ROUND".to_string(), "4".to_string());
        env_map.insert("KEEPER_UNDRAFTED_ROUND".to_string(), "3".to_string());
        match ServiceConfig::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "KEEPER_*"),
            _ => panic!("Expected InvalidValue error"),
        }
    }
}
