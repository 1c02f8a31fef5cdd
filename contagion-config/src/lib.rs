//! Configuration for the contagion simulator: file loading, validation,
//! command-line overrides and a menu-style builder.

use log::info;
use std::fs;
use std::path::Path;
use thiserror::Error;

mod builder;
mod overrides;
mod types;

pub use self::builder::{ConfigBuilder, MenuFields};
pub use self::overrides::{ConfigOverrides, GateArg};
pub use self::types::{Config, GateFormula, SenderType, SerializerType, SimulationConfig, TransportConfig};

// --- Error Type ---
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Unsupported config format '{0}', expected .json or .toml")]
    UnsupportedFormat(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Field '{field}' could not be read from '{value}'")]
    InvalidField { field: &'static str, value: String },
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidConfiguration(message.into())
}

// --- Loading ---

/// Load and validate a configuration file, picking the format by extension.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path)?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let config: Config = match extension.as_str() {
        "json" => serde_json::from_str(&content)?,
        "toml" => toml::from_str(&content)?,
        other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
    };

    validate(&config)?;
    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

// --- Validation ---

pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_simulation(&config.simulation)?;
    validate_transport(&config.transport)
}

fn check_probability(name: &str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(invalid(format!("{name} must be within [0, 1], got {value}")));
    }
    Ok(())
}

pub fn validate_simulation(sim: &SimulationConfig) -> Result<(), ConfigError> {
    if !(sim.width.is_finite() && sim.height.is_finite()) || sim.width <= 0.0 || sim.height <= 0.0 {
        return Err(invalid(format!(
            "arena dimensions must be positive, got {} x {}",
            sim.width, sim.height
        )));
    }

    for (name, count) in [
        ("n_susceptible", sim.n_susceptible),
        ("n_infected", sim.n_infected),
        ("n_quarantined", sim.n_quarantined),
    ] {
        if count < 0 {
            return Err(invalid(format!("{name} cannot be negative, got {count}")));
        }
    }
    if sim.initial_count() == 0 {
        return Err(invalid("population must contain at least one agent"));
    }

    if sim.infection_duration < 1 {
        return Err(invalid(format!(
            "infection_duration must be at least one tick, got {}",
            sim.infection_duration
        )));
    }

    check_probability("infection_probability", sim.infection_probability)?;
    check_probability("death_probability", sim.death_probability)?;
    check_probability("quarantine_fraction", sim.quarantine_fraction)?;

    if let GateFormula::Scaled { factor } = sim.gate {
        if !factor.is_finite() || factor < 0.0 {
            return Err(invalid(format!("gate factor must be non-negative, got {factor}")));
        }
    }

    for (name, speed) in [("normal_speed", sim.normal_speed), ("quarantine_speed", sim.quarantine_speed)] {
        if !speed.is_finite() || speed < 0.0 {
            return Err(invalid(format!("{name} must be non-negative, got {speed}")));
        }
    }
    if !sim.radius.is_finite() || sim.radius <= 0.0 {
        return Err(invalid(format!("radius must be positive, got {}", sim.radius)));
    }

    Ok(())
}

fn validate_transport(transport: &TransportConfig) -> Result<(), ConfigError> {
    if transport.output_frequency == 0 {
        return Err(invalid("output_frequency must be greater than 0"));
    }
    if transport.sender == SenderType::File && transport.output_path.is_none() {
        return Err(invalid("the file sender needs an output_path"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn write_config(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn load_valid_json_config() {
        let file = write_config(
            ".json",
            r#"{
              "simulation": {
                "width": 400.0,
                "height": 300.0,
                "n_susceptible": 50,
                "n_infected": 2,
                "n_quarantined": 0,
                "infection_duration": 100,
                "infection_probability": 0.5,
                "death_probability": 0.1,
                "quarantine_fraction": 0.0,
                "max_ticks": 500,
                "gate": { "formula": "scaled", "factor": 0.33 },
                "seed": 42
              },
              "transport": { "serializer": "binary", "sender": "null" }
            }"#,
        );
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.simulation.width, 400.0);
        assert_eq!(config.simulation.initial_count(), 52);
        assert_eq!(config.simulation.gate, GateFormula::Scaled { factor: 0.33 });
        assert_eq!(config.simulation.seed, Some(42));
        // Omitted fields fall back to defaults
        assert_eq!(config.simulation.normal_speed, 2.0);
        assert_eq!(config.transport.serializer, SerializerType::Binary);
        assert_eq!(config.transport.sender, SenderType::Null);
        assert_eq!(config.transport.output_frequency, 1);
    }

    #[test]
    fn load_valid_toml_config() {
        let file = write_config(
            ".toml",
            r#"
[simulation]
n_susceptible = 10
n_infected = 1
n_quarantined = 0
max_ticks = 100

[simulation.gate]
formula = "quartic"

[transport]
sender = "file"
output_path = "snapshots.jsonl"
output_frequency = 10
"#,
        );
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.simulation.gate, GateFormula::Quartic);
        assert_eq!(config.simulation.max_ticks, 100);
        assert_eq!(config.transport.output_path.as_deref(), Some("snapshots.jsonl"));
    }

    #[test]
    fn empty_file_yields_menu_defaults() {
        let file = write_config(".json", "{}");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.simulation, SimulationConfig::menu_defaults());
        assert_eq!(config.simulation.initial_count(), 1500);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let file = write_config(".yaml", "simulation: {}");
        assert!(matches!(load_config(file.path()), Err(ConfigError::UnsupportedFormat(ext)) if ext == "yaml"));
    }

    #[test]
    fn load_invalid_probability() {
        let file = write_config(".json", r#"{ "simulation": { "death_probability": 1.5 } }"#);
        assert!(matches!(load_config(file.path()), Err(ConfigError::InvalidConfiguration(_))));
    }

    #[test]
    fn validation_catches_domain_errors() {
        let base = SimulationConfig::default();

        let cases = [
            SimulationConfig { width: 0.0, ..base.clone() },
            SimulationConfig { height: -5.0, ..base.clone() },
            SimulationConfig { n_susceptible: -1, ..base.clone() },
            SimulationConfig { n_susceptible: 0, n_infected: 0, n_quarantined: 0, ..base.clone() },
            SimulationConfig { infection_duration: 0, ..base.clone() },
            SimulationConfig { infection_probability: -0.1, ..base.clone() },
            SimulationConfig { quarantine_fraction: f64::NAN, ..base.clone() },
            SimulationConfig { gate: GateFormula::Scaled { factor: -1.0 }, ..base.clone() },
            SimulationConfig { radius: 0.0, ..base.clone() },
        ];
        for sim in cases {
            assert!(
                matches!(validate_simulation(&sim), Err(ConfigError::InvalidConfiguration(_))),
                "expected rejection for {:?}",
                sim
            );
        }
        assert!(validate_simulation(&base).is_ok());
        assert!(validate_simulation(&SimulationConfig::classic()).is_ok());
        assert!(validate_simulation(&SimulationConfig::throttled()).is_ok());
    }

    #[test]
    fn zero_speeds_freeze_but_negative_speeds_fail() {
        let still = SimulationConfig {
            normal_speed: 0.0,
            quarantine_speed: 0.0,
            ..SimulationConfig::default()
        };
        assert!(validate_simulation(&still).is_ok());

        for sim in [
            SimulationConfig { normal_speed: -1.0, ..still.clone() },
            SimulationConfig { quarantine_speed: -0.01, ..still.clone() },
            SimulationConfig { normal_speed: f32::INFINITY, ..still.clone() },
        ] {
            assert!(matches!(validate_simulation(&sim), Err(ConfigError::InvalidConfiguration(_))));
        }
    }

    #[test]
    fn file_sender_requires_a_path() {
        let config = Config {
            transport: TransportConfig { sender: SenderType::File, ..TransportConfig::default() },
            ..Config::default()
        };
        assert!(matches!(validate(&config), Err(ConfigError::InvalidConfiguration(_))));
    }
}
