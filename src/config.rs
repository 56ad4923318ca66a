use crate::mode::{EnabledModes, GraphMode};
use std::{env, path::PathBuf};
use thiserror::Error;

pub const DEFAULT_CO2_PER_REFUSAL: f64 = 1.2;
pub const DEFAULT_CO2_PER_TREE_YEAR: f64 = 22_000.0;
pub const DEFAULT_CO2_PER_KM_DRIVEN: f64 = 120.0;
/// Okinawa Electric Power company-wide emission factor, 2024 edition (kg/kWh).
pub const DEFAULT_GRID_CO2_FACTOR: f64 = 0.677;
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be a number, got {value:?}")]
    NotANumber { name: &'static str, value: String },
    #[error("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: f64 },
    #[error("unknown graph mode {0:?} in GRAPH_MODES")]
    UnknownMode(String),
}

/// Grams of CO2 the derived metrics are expressed in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Co2Constants {
    /// Saved per refused item, also emitted per bought item.
    pub per_refusal: f64,
    /// Absorbed by one tree over a year.
    pub per_tree_year: f64,
    /// Emitted per km driven by car.
    pub per_km_driven: f64,
}

impl Default for Co2Constants {
    fn default() -> Self {
        Self {
            per_refusal: DEFAULT_CO2_PER_REFUSAL,
            per_tree_year: DEFAULT_CO2_PER_TREE_YEAR,
            per_km_driven: DEFAULT_CO2_PER_KM_DRIVEN,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    pub co2: Co2Constants,
    pub grid_co2_factor: f64,
    pub enabled_modes: EnabledModes,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            co2: Co2Constants::default(),
            grid_co2_factor: DEFAULT_GRID_CO2_FACTOR,
            enabled_modes: EnabledModes::all(),
        }
    }
}

impl TrackerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any variable source; unset variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let co2 = Co2Constants {
            per_refusal: positive(&lookup, "CO2_PER_REFUSAL", defaults.co2.per_refusal)?,
            per_tree_year: positive(&lookup, "CO2_PER_TREE_YEAR", defaults.co2.per_tree_year)?,
            per_km_driven: positive(&lookup, "CO2_PER_KM_DRIVEN", defaults.co2.per_km_driven)?,
        };
        let grid_co2_factor = positive(&lookup, "GRID_CO2_FACTOR", defaults.grid_co2_factor)?;

        let enabled_modes = match lookup("GRAPH_MODES") {
            Some(raw) if !raw.trim().is_empty() => {
                let mut modes = Vec::new();
                for name in raw.split(',').map(str::trim).filter(|name| !name.is_empty()) {
                    let mode = name
                        .parse::<GraphMode>()
                        .map_err(|_| ConfigError::UnknownMode(name.to_string()))?;
                    modes.push(mode);
                }
                EnabledModes::from_modes(modes)
            }
            _ => defaults.enabled_modes,
        };

        Ok(Self {
            co2,
            grid_co2_factor,
            enabled_modes,
        })
    }
}

pub fn resolve_port() -> u16 {
    env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT)
}

pub fn resolve_data_path() -> PathBuf {
    match env::var("APP_DATA_PATH") {
        Ok(path) => PathBuf::from(path),
        Err(_) => PathBuf::from("data/state.json"),
    }
}

fn positive<F>(lookup: &F, name: &'static str, default: f64) -> Result<f64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(name) else {
        return Ok(default);
    };
    let value = raw.trim().parse::<f64>().map_err(|_| ConfigError::NotANumber {
        name,
        value: raw.clone(),
    })?;
    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigError::NotPositive { name, value });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn unset_variables_keep_defaults() {
        let config = TrackerConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, TrackerConfig::default());
        assert_eq!(config.co2.per_refusal, 1.2);
    }

    #[test]
    fn overrides_constants_and_modes() {
        let config = TrackerConfig::from_lookup(lookup_from(&[
            ("CO2_PER_REFUSAL", "61"),
            ("GRAPH_MODES", "whatIf, impact"),
        ]))
        .unwrap();
        assert_eq!(config.co2.per_refusal, 61.0);
        assert!(config.enabled_modes.contains(GraphMode::Goal));
        assert!(config.enabled_modes.contains(GraphMode::WhatIf));
        assert!(config.enabled_modes.contains(GraphMode::Impact));

        let goal_only =
            TrackerConfig::from_lookup(lookup_from(&[("GRAPH_MODES", "goal")])).unwrap();
        assert!(!goal_only.enabled_modes.contains(GraphMode::WhatIf));
    }

    #[test]
    fn rejects_bad_values() {
        let err = TrackerConfig::from_lookup(lookup_from(&[("CO2_PER_REFUSAL", "abc")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::NotANumber { name: "CO2_PER_REFUSAL", .. }));

        let err = TrackerConfig::from_lookup(lookup_from(&[("GRID_CO2_FACTOR", "-1")]))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::NotPositive {
                name: "GRID_CO2_FACTOR",
                value: -1.0
            }
        );

        let err = TrackerConfig::from_lookup(lookup_from(&[("GRAPH_MODES", "goal,pie")]))
            .unwrap_err();
        assert_eq!(err, ConfigError::UnknownMode("pie".to_string()));
    }
}
