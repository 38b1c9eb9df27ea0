use std::env;
use std::path::PathBuf;

use serde::Deserialize;
use slotkeeper_desk_bus::BusConfig;
use slotkeeper_desk_clinic::ClinicConfig;
use slotkeeper_desk_school::SchoolConfig;

const CONFIG_PATH_VAR: &str = "SLOTKEEPER_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "slotkeeper";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub(crate) struct AppConfig {
    pub clinic: ClinicConfig,
    pub school: SchoolConfig,
    pub bus: BusConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub(crate) struct LoggingConfig {
    /// The terminal belongs to the UI, so logs go to a file.
    pub file: PathBuf,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("slotkeeper.log"),
            filter: "info".to_owned(),
        }
    }
}

impl AppConfig {
    pub(crate) fn load() -> Result<Self, config::ConfigError> {
        let path = env::var(CONFIG_PATH_VAR).unwrap_or_else(|_err| DEFAULT_CONFIG_PATH.into());

        config::Config::builder()
            // slotkeeper.toml (or $SLOTKEEPER_CONFIG) is optional; defaults cover everything
            .add_source(config::File::with_name(&path).required(false))
            // e.g. SLOTKEEPER__CLINIC__MAX_PER_SLOT=4
            .add_source(
                config::Environment::with_prefix("SLOTKEEPER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
