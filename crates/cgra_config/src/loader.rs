//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::PlaceConfig;
use std::path::Path;

/// Loads and validates a `place.toml` configuration file.
pub fn load_config(path: &Path) -> Result<PlaceConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Parses and validates a configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<PlaceConfig, ConfigError> {
    let config: PlaceConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Rejects schedules and knobs the placers cannot run with.
fn validate_config(config: &PlaceConfig) -> Result<(), ConfigError> {
    let schedule = &config.schedule;
    if schedule.t_min <= 0.0 {
        return Err(ConfigError::ValidationError(
            "schedule.t_min must be positive".to_string(),
        ));
    }
    if schedule.t_max <= schedule.t_min {
        return Err(ConfigError::ValidationError(
            "schedule.t_max must exceed schedule.t_min".to_string(),
        ));
    }
    if schedule.steps == 0 {
        return Err(ConfigError::ValidationError(
            "schedule.steps must be positive".to_string(),
        ));
    }
    if config.cluster.place_factor == 0 {
        return Err(ConfigError::ValidationError(
            "cluster.place_factor must be positive".to_string(),
        ));
    }
    if config.anneal.chains == 0 {
        return Err(ConfigError::ValidationError(
            "anneal.chains must be positive".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = load_config_from_str("").unwrap();
        assert!(config.fold_reg);
        assert_eq!(config.schedule.steps, 50_000);
        assert_eq!(config.cluster.place_factor, 6);
        assert_eq!(config.anneal.seed, 0);
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
fold_reg = false

[schedule]
t_max = 100.0
t_min = 1.0
steps = 2000

[cluster]
place_factor = 4
squeeze_iter = 3

[anneal]
seed = 7
chains = 4
"#;
        let config = load_config_from_str(toml).unwrap();
        assert!(!config.fold_reg);
        assert_eq!(config.schedule.t_max, 100.0);
        assert_eq!(config.schedule.t_min, 1.0);
        assert_eq!(config.schedule.steps, 2000);
        assert_eq!(config.cluster.place_factor, 4);
        assert_eq!(config.cluster.squeeze_iter, 3);
        assert_eq!(config.anneal.seed, 7);
        assert_eq!(config.anneal.chains, 4);
    }

    #[test]
    fn inverted_schedule_rejected() {
        let toml = r#"
[schedule]
t_max = 1.0
t_min = 10.0
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn zero_steps_rejected() {
        let toml = r#"
[schedule]
steps = 0
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn zero_place_factor_rejected() {
        let toml = r#"
[cluster]
place_factor = 0
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn unknown_fields_rejected() {
        let err = load_config_from_str("not_a_knob = 1\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn malformed_toml_rejected() {
        let err = load_config_from_str("fold_reg = [").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }
}
