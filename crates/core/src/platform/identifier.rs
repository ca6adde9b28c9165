use std::collections::BTreeSet;

use crate::errors::BootstrapError;
use crate::platform::PlatformTag;

/// Marker announced by hosts running inside a Bukkit-compatible server
pub const BUKKIT_MARKER: &str = "org.bukkit.Bukkit";

/// Environment signals inspected by the [`PlatformIdentifier`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformSignals {
    markers: BTreeSet<String>,
    platform_override: Option<PlatformTag>,
}

impl PlatformSignals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.markers.insert(marker.into());
        self
    }

    pub fn with_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.markers.extend(markers.into_iter().map(Into::into));
        self
    }

    pub fn with_override(mut self, platform: Option<PlatformTag>) -> Self {
        self.platform_override = platform;
        self
    }

    pub fn has_marker(&self, marker: &str) -> bool {
        self.markers.contains(marker)
    }

    pub fn markers(&self) -> impl Iterator<Item = &str> {
        self.markers.iter().map(String::as_str)
    }

    pub fn platform_override(&self) -> Option<&PlatformTag> {
        self.platform_override.as_ref()
    }
}

/// Resolves the single active platform from host signals
#[derive(Debug, Clone)]
pub struct PlatformIdentifier {
    detectors: Vec<(PlatformTag, String)>,
    default_platform: Option<PlatformTag>,
}

impl PlatformIdentifier {
    /// Identifier with the built-in Bukkit detector, defaulting to the standalone application
    pub fn new() -> Self {
        Self {
            detectors: vec![(PlatformTag::Bukkit, BUKKIT_MARKER.to_string())],
            default_platform: Some(PlatformTag::Application),
        }
    }

    /// Platform returned when no marker matches; `None` turns that case into `UnknownPlatform`
    pub fn with_default(mut self, platform: Option<PlatformTag>) -> Self {
        self.default_platform = platform;
        self
    }

    /// Detect `platform` whenever `marker` is present
    pub fn with_detector(mut self, platform: PlatformTag, marker: impl Into<String>) -> Self {
        self.detectors.push((platform, marker.into()));
        self
    }

    pub fn default_platform(&self) -> Option<&PlatformTag> {
        self.default_platform.as_ref()
    }

    /// Return exactly one platform for `signals`
    pub fn identify(&self, signals: &PlatformSignals) -> Result<PlatformTag, BootstrapError> {
        if let Some(platform) = signals.platform_override() {
            tracing::info!(platform = %platform, "Platform set by override");
            return Ok(platform.clone());
        }

        let mut candidates: Vec<PlatformTag> = Vec::new();
        for (platform, marker) in &self.detectors {
            if signals.has_marker(marker) && !candidates.contains(platform) {
                tracing::debug!(platform = %platform, marker = %marker, "Host marker present");
                candidates.push(platform.clone());
            }
        }

        match candidates.len() {
            0 => match &self.default_platform {
                Some(platform) => {
                    tracing::info!(platform = %platform, "No host marker present; using default platform");
                    Ok(platform.clone())
                }
                None => Err(BootstrapError::UnknownPlatform),
            },
            1 => {
                let platform = candidates.remove(0);
                tracing::info!(platform = %platform, "Platform identified from host marker");
                Ok(platform)
            }
            _ => Err(BootstrapError::AmbiguousPlatform { candidates }),
        }
    }
}

impl Default for PlatformIdentifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FailureKind;

    fn velocity() -> PlatformTag {
        PlatformTag::Custom("velocity".to_string())
    }

    #[test]
    fn test_default_when_no_marker() {
        let identifier = PlatformIdentifier::new();
        let platform = identifier.identify(&PlatformSignals::new()).unwrap();
        assert_eq!(platform, PlatformTag::Application);
    }

    #[test]
    fn test_unknown_without_default() {
        let identifier = PlatformIdentifier::new().with_default(None);
        let err = identifier.identify(&PlatformSignals::new()).unwrap_err();
        assert_eq!(err.kind(), FailureKind::UnknownPlatform);
    }

    #[test]
    fn test_marker_detection() {
        let identifier = PlatformIdentifier::new();
        let signals = PlatformSignals::new().with_marker(BUKKIT_MARKER);
        assert_eq!(identifier.identify(&signals).unwrap(), PlatformTag::Bukkit);
    }

    #[test]
    fn test_ambiguous_markers() {
        let identifier = PlatformIdentifier::new().with_detector(velocity(), "com.velocitypowered.api.proxy.ProxyServer");
        let signals = PlatformSignals::new()
            .with_markers([BUKKIT_MARKER, "com.velocitypowered.api.proxy.ProxyServer"]);

        match identifier.identify(&signals).unwrap_err() {
            BootstrapError::AmbiguousPlatform { candidates } => {
                assert_eq!(candidates, vec![PlatformTag::Bukkit, velocity()]);
            }
            other => panic!("Expected AmbiguousPlatform, got {other}"),
        }
    }

    #[test]
    fn test_override_resolves_ambiguity() {
        let identifier = PlatformIdentifier::new().with_detector(velocity(), "proxy");
        let signals = PlatformSignals::new()
            .with_markers([BUKKIT_MARKER, "proxy"])
            .with_override(Some(velocity()));

        assert_eq!(identifier.identify(&signals).unwrap(), velocity());
    }

    #[test]
    fn test_two_markers_for_same_platform_are_not_ambiguous() {
        let identifier = PlatformIdentifier::new().with_detector(PlatformTag::Bukkit, "org.spigotmc.SpigotConfig");
        let signals = PlatformSignals::new().with_markers([BUKKIT_MARKER, "org.spigotmc.SpigotConfig"]);

        assert_eq!(identifier.identify(&signals).unwrap(), PlatformTag::Bukkit);
    }
}
