use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::components::{Capability, ComponentDescriptor, DescriptorSource};
use crate::platform::PlatformTag;

/// File names always treated as component manifests
const MANIFEST_FILE_NAMES: [&str; 3] = [
    "fairy-components.yaml",
    "fairy-components.yml",
    "fairy-components.json",
];

/// Suffixes of additional manifest files
const MANIFEST_SUFFIXES: [&str; 3] = [".components.yaml", ".components.yml", ".components.json"];

/// Declared components of one classpath entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentManifest {
    #[serde(default)]
    pub components: Vec<ManifestEntry>,
}

impl ComponentManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, entry: ManifestEntry) -> Self {
        self.components.push(entry);
        self
    }
}

/// One declared component, as written in a manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    #[serde(alias = "name", alias = "class")]
    pub id: String,
    #[serde(default)]
    pub factory: Option<String>,
    #[serde(default, alias = "provides", alias = "capability", with = "one_or_many")]
    pub capabilities: Vec<String>,
    #[serde(default, alias = "priority")]
    pub order: i32,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default, alias = "requires", with = "one_or_many")]
    pub depends_on: Vec<String>,
}

impl ManifestEntry {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_factory(mut self, factory: impl Into<String>) -> Self {
        self.factory = Some(factory.into());
        self
    }

    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.push(capability.into());
        self
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    pub fn with_dependency(mut self, capability: impl Into<String>) -> Self {
        self.depends_on.push(capability.into());
        self
    }

    /// Convert to a descriptor, rejecting malformed declarations
    pub(crate) fn to_descriptor(&self, source: DescriptorSource) -> Result<ComponentDescriptor, String> {
        let id = self.id.trim();
        if id.is_empty() {
            return Err("component declared without an id".to_string());
        }

        let mut descriptor = ComponentDescriptor::new(id)
            .with_order(self.order)
            .with_source(source);

        if let Some(factory) = self.factory.as_deref().map(str::trim) {
            if factory.is_empty() {
                return Err(format!("component '{}' declares an empty factory token", id));
            }
            descriptor = descriptor.with_factory(factory);
        }

        for tag in &self.capabilities {
            let capability = Capability::new(tag.as_str());
            if capability.is_empty() {
                return Err(format!("component '{}' declares an empty capability", id));
            }
            descriptor = descriptor.with_capability(capability);
        }

        for tag in &self.depends_on {
            let capability = Capability::new(tag.as_str());
            if capability.is_empty() {
                return Err(format!("component '{}' depends on an empty capability", id));
            }
            descriptor = descriptor.with_dependency(capability);
        }

        if let Some(platform) = &self.platform {
            let platform: PlatformTag = platform
                .parse()
                .map_err(|e| format!("component '{}' has an invalid platform: {}", id, e))?;
            descriptor = descriptor.with_platform(platform);
        }

        Ok(descriptor)
    }
}

/// Manifest layouts accepted from third-party artifacts
#[derive(Deserialize)]
#[serde(untagged)]
enum ManifestDocument {
    Wrapped(ComponentManifest),
    Bare(Vec<ManifestEntry>),
}

/// Check if `path` names a component manifest
pub(crate) fn is_manifest_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let name = name.to_lowercase();

    MANIFEST_FILE_NAMES.contains(&name.as_str())
        || MANIFEST_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

/// Decode manifest text; the format follows the file extension
pub(crate) fn decode(path: &Path, content: &str) -> Result<ComponentManifest, String> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    let document: ManifestDocument = if is_json {
        serde_json::from_str(content).map_err(|e| format!("invalid JSON manifest: {}", e))?
    } else if content.trim().is_empty() {
        return Ok(ComponentManifest::default());
    } else {
        serde_yaml::from_str(content).map_err(|e| format!("invalid YAML manifest: {}", e))?
    };

    Ok(match document {
        ManifestDocument::Wrapped(manifest) => manifest,
        ManifestDocument::Bare(components) => ComponentManifest { components },
    })
}

mod one_or_many {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    pub fn serialize<S: Serializer>(values: &[String], serializer: S) -> Result<S::Ok, S::Error> {
        values.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        Ok(match OneOrMany::deserialize(deserializer)? {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        })
    }
}
