use serde::Serialize;
use std::fmt;

/// Where the effective value of a configuration field came from
///
/// Layers apply in ascending [`precedence`](ConfigSource::precedence): defaults,
/// then the YAML file, then `FAIRY_*` variables, then values set in code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "layer", content = "origin", rename_all = "snake_case")]
pub enum ConfigSource {
    /// Built-in default, with its rendered value
    Default(String),
    /// YAML configuration file, by path
    File(String),
    /// Environment variable, by name
    EnvVar(String),
    /// Set through a `BootstrapConfig` builder method
    Programmatic,
}

impl ConfigSource {
    pub fn is_env_var(&self) -> bool {
        matches!(self, ConfigSource::EnvVar(_))
    }

    pub fn is_default(&self) -> bool {
        matches!(self, ConfigSource::Default(_))
    }

    pub fn is_file(&self) -> bool {
        matches!(self, ConfigSource::File(_))
    }

    /// Rank of the layer; a higher layer replaces values from lower ones
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default(_) => 0,
            ConfigSource::File(_) => 1,
            ConfigSource::EnvVar(_) => 2,
            ConfigSource::Programmatic => 3,
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Default(value) => write!(f, "default ({})", value),
            ConfigSource::File(path) => write!(f, "file {}", path),
            ConfigSource::EnvVar(name) => write!(f, "environment ${}", name),
            ConfigSource::Programmatic => f.write_str("set in code"),
        }
    }
}
