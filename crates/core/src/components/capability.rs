use serde::{Deserialize, Serialize};
use std::fmt;

/// Abstract role fulfilled by exactly one active component per platform
///
/// Tags may be qualified as `family:name` (for example `command:help`); the part
/// before the first `:` is the capability family used by
/// [`ComponentContainer::get_all`](crate::components::ComponentContainer::get_all).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capability(String);

impl Capability {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Family this capability belongs to
    pub fn family(&self) -> &str {
        match self.0.split_once(':') {
            Some((family, _)) => family,
            None => &self.0,
        }
    }

    /// Check if this capability belongs to `family`
    pub fn in_family(&self, family: &str) -> bool {
        self.family() == family
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::borrow::Borrow<str> for Capability {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Capability {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

impl From<String> for Capability {
    fn from(tag: String) -> Self {
        Self::new(tag)
    }
}

/// Identity of a component: a fully qualified name or a factory token
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(String);

impl ComponentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ComponentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ComponentId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_family() {
        assert_eq!(Capability::new("storage").family(), "storage");
        assert_eq!(Capability::new("command:help").family(), "command");
        assert_eq!(Capability::new("command:help:extra").family(), "command");
        assert!(Capability::new("command:reload").in_family("command"));
        assert!(!Capability::new("commands").in_family("command"));
    }

    #[test]
    fn test_capability_is_trimmed() {
        assert_eq!(Capability::new("  net ").as_str(), "net");
        assert!(Capability::new("   ").is_empty());
    }
}
