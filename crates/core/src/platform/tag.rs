use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::ConfigError;

/// Host runtime the framework is embedded in; exactly one is active per process
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PlatformTag {
    /// Standalone application process
    Application,
    /// Bukkit/Spigot/Paper server plugin
    Bukkit,
    /// Any other host, identified by a lowercase name
    Custom(String),
}

impl PlatformTag {
    pub fn as_str(&self) -> &str {
        match self {
            PlatformTag::Application => "application",
            PlatformTag::Bukkit => "bukkit",
            PlatformTag::Custom(name) => name,
        }
    }
}

impl FromStr for PlatformTag {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        match name.as_str() {
            "app" | "application" | "standalone" => Ok(PlatformTag::Application),
            "bukkit" | "spigot" | "paper" => Ok(PlatformTag::Bukkit),
            "" => Err(ConfigError::invalid_value("platform", s, "non-empty platform name")),
            _ if name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')) =>
            {
                Ok(PlatformTag::Custom(name))
            }
            _ => Err(ConfigError::invalid_value(
                "platform",
                s,
                "platform name made of letters, digits, '-', '_' or '.'",
            )),
        }
    }
}

impl TryFrom<String> for PlatformTag {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PlatformTag> for String {
    fn from(tag: PlatformTag) -> Self {
        tag.as_str().to_string()
    }
}

impl fmt::Display for PlatformTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("Standalone".parse::<PlatformTag>().unwrap(), PlatformTag::Application);
        assert_eq!("app".parse::<PlatformTag>().unwrap(), PlatformTag::Application);
        assert_eq!("PAPER".parse::<PlatformTag>().unwrap(), PlatformTag::Bukkit);
        assert_eq!(
            "Velocity".parse::<PlatformTag>().unwrap(),
            PlatformTag::Custom("velocity".to_string())
        );
        assert!("".parse::<PlatformTag>().is_err());
        assert!("two words".parse::<PlatformTag>().is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&PlatformTag::Bukkit).unwrap();
        assert_eq!(json, "\"bukkit\"");

        let tag: PlatformTag = serde_json::from_str("\"standalone\"").unwrap();
        assert_eq!(tag, PlatformTag::Application);
    }
}
