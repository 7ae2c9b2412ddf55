//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Ledger behaviour (reference numbering).
    #[serde(default)]
    pub ledger: LedgerConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Ledger configuration.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Fixed trailing segment of every assigned reference, e.g. `0001/2025/DTNDB`.
    #[serde(default = "default_reference_suffix")]
    pub reference_suffix: String,
    /// Historical minimum sequence numbers per operation kind and year.
    #[serde(default = "default_reference_floors")]
    pub reference_floors: Vec<ReferenceFloorConfig>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            reference_suffix: default_reference_suffix(),
            reference_floors: default_reference_floors(),
        }
    }
}

/// A configured minimum sequence number.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ReferenceFloorConfig {
    /// Operation kind: `collection` or `disbursement`.
    pub kind: String,
    /// Calendar year the floor applies to.
    pub year: i32,
    /// Smallest sequence number that may be assigned in that year.
    pub minimum: u32,
}

fn default_reference_suffix() -> String {
    "DTNDB".to_string()
}

fn default_reference_floors() -> Vec<ReferenceFloorConfig> {
    // Paper registers were kept before the system went live in 2024.
    vec![
        ReferenceFloorConfig {
            kind: "collection".to_string(),
            year: 2024,
            minimum: 216,
        },
        ReferenceFloorConfig {
            kind: "disbursement".to_string(),
            year: 2024,
            minimum: 465,
        },
    ]
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, later ones winning: `config/default`, `config/{RUN_MODE}`,
    /// then `TRESOR__*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("TRESOR")
                    .try_parsing(true)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        config.try_deserialize()
    }
}
