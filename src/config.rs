use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

/// Prefix of environment variables overriding settings
///
/// Nested keys are separated by `__`, e.g. `MEMBER_REGISTRY_CARD__FIRST_NUMBER`.
pub const ENV_PREFIX: &str = "MEMBER_REGISTRY";

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default)]
    pub card: CardSettings,
    #[serde(default)]
    pub hierarchy: HierarchySettings,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct CardSettings {
    /// First number handed out by the card allocator
    #[serde(default = "default_first_number")]
    pub first_number: u64,
}

impl Default for CardSettings {
    fn default() -> Self {
        Self {
            first_number: default_first_number(),
        }
    }
}

fn default_first_number() -> u64 {
    1
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct HierarchySettings {
    #[serde(default)]
    pub on_shutdown: ShutdownPolicy,
}

/// What happens to queued hierarchy builds when the dispatcher shuts down
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ShutdownPolicy {
    /// Build every member queued before shutdown
    #[default]
    Drain,
    /// Discard members whose build has not started yet
    Drop,
}

impl Settings {
    /// Load settings from the environment on top of the defaults
    pub fn load() -> Result<Self, ConfigError> {
        Self::build(None, environment())
    }

    /// Load settings from TOML text, still overridable from the environment
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        Self::build(Some(toml), environment())
    }

    fn build(toml: Option<&str>, env: Environment) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(toml) = toml {
            builder = builder.add_source(File::from_str(toml, FileFormat::Toml));
        }

        builder.add_source(env).build()?.try_deserialize()
    }
}

/// `MEMBER_REGISTRY_*` variables, `__` separating nested keys
fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
