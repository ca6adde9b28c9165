use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::components::{Capability, ComponentId};
use crate::platform::PlatformTag;

/// Where a descriptor was discovered
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DescriptorSource {
    /// Display name of the classpath root
    pub root: String,
    /// Manifest file the descriptor was read from, if the root is on disk
    pub manifest: Option<PathBuf>,
}

impl DescriptorSource {
    pub fn new(root: impl Into<String>, manifest: Option<PathBuf>) -> Self {
        Self {
            root: root.into(),
            manifest,
        }
    }

    pub fn programmatic() -> Self {
        Self::new("<programmatic>", None)
    }
}

/// Discovered, unresolved metadata about one candidate component
///
/// Produced by the classpath scanner and never mutated afterwards; the
/// builder methods exist for hosts that declare components in code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentDescriptor {
    id: ComponentId,
    factory: String,
    capabilities: Vec<Capability>,
    order: i32,
    platform: Option<PlatformTag>,
    depends_on: Vec<Capability>,
    source: DescriptorSource,
    discovery_index: usize,
}

impl ComponentDescriptor {
    /// Create a descriptor whose factory token equals its identity
    pub fn new(id: impl Into<ComponentId>) -> Self {
        let id = id.into();
        Self {
            factory: id.as_str().to_string(),
            id,
            capabilities: Vec::new(),
            order: 0,
            platform: None,
            depends_on: Vec::new(),
            source: DescriptorSource::programmatic(),
            discovery_index: 0,
        }
    }

    pub fn with_factory(mut self, factory: impl Into<String>) -> Self {
        self.factory = factory.into();
        self
    }

    /// Add a declared capability; duplicates are ignored
    pub fn with_capability(mut self, capability: impl Into<Capability>) -> Self {
        let capability = capability.into();
        if !self.capabilities.contains(&capability) {
            self.capabilities.push(capability);
        }
        self
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn with_platform(mut self, platform: PlatformTag) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Declare a capability that must be active before this component activates
    pub fn with_dependency(mut self, capability: impl Into<Capability>) -> Self {
        let capability = capability.into();
        if !self.depends_on.contains(&capability) {
            self.depends_on.push(capability);
        }
        self
    }

    pub fn with_source(mut self, source: DescriptorSource) -> Self {
        self.source = source;
        self
    }

    pub(crate) fn with_discovery_index(mut self, index: usize) -> Self {
        self.discovery_index = index;
        self
    }

    pub fn id(&self) -> &ComponentId {
        &self.id
    }

    pub fn factory(&self) -> &str {
        &self.factory
    }

    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    pub fn provides(&self, capability: &Capability) -> bool {
        self.capabilities.contains(capability)
    }

    /// Activation order hint; lower values activate first
    pub fn order(&self) -> i32 {
        self.order
    }

    pub fn platform(&self) -> Option<&PlatformTag> {
        self.platform.as_ref()
    }

    pub fn depends_on(&self) -> &[Capability] {
        &self.depends_on
    }

    pub fn source(&self) -> &DescriptorSource {
        &self.source
    }

    pub fn manifest_path(&self) -> Option<&Path> {
        self.source.manifest.as_deref()
    }

    /// Position in scan output; breaks ties between equal order hints
    pub fn discovery_index(&self) -> usize {
        self.discovery_index
    }

    /// Check if this descriptor may be activated on `platform`
    pub fn is_eligible_on(&self, platform: &PlatformTag) -> bool {
        self.platform.as_ref().map_or(true, |p| p == platform)
    }

    /// Deterministic activation sort key
    pub(crate) fn activation_key(&self) -> (i32, usize) {
        (self.order, self.discovery_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_defaults_to_identity() {
        let descriptor = ComponentDescriptor::new("app.Storage");
        assert_eq!(descriptor.factory(), "app.Storage");

        let descriptor = descriptor.with_factory("file-storage");
        assert_eq!(descriptor.factory(), "file-storage");
        assert_eq!(descriptor.id().as_str(), "app.Storage");
    }

    #[test]
    fn test_platform_eligibility() {
        let unconstrained = ComponentDescriptor::new("a").with_capability("storage");
        let bukkit_only = ComponentDescriptor::new("b")
            .with_capability("net")
            .with_platform(PlatformTag::Bukkit);

        assert!(unconstrained.is_eligible_on(&PlatformTag::Application));
        assert!(unconstrained.is_eligible_on(&PlatformTag::Bukkit));
        assert!(bukkit_only.is_eligible_on(&PlatformTag::Bukkit));
        assert!(!bukkit_only.is_eligible_on(&PlatformTag::Application));
    }

    #[test]
    fn test_duplicate_capabilities_collapse() {
        let descriptor = ComponentDescriptor::new("a")
            .with_capability("storage")
            .with_capability("storage")
            .with_dependency("logging")
            .with_dependency("logging");

        assert_eq!(descriptor.capabilities().len(), 1);
        assert_eq!(descriptor.depends_on().len(), 1);
    }
}
