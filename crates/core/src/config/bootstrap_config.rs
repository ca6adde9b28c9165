use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::components::Capability;
use crate::config::{
    CapabilityTagValidator, ConfigError, ConfigSource, ConfigValidator, LogLevelValidator,
    NonZeroValidator,
};
use crate::platform::PlatformTag;

pub const ENV_PLATFORM: &str = "FAIRY_PLATFORM";
pub const ENV_DEFAULT_PLATFORM: &str = "FAIRY_DEFAULT_PLATFORM";
pub const ENV_REQUIRED_CAPABILITIES: &str = "FAIRY_REQUIRED_CAPABILITIES";
pub const ENV_TEARDOWN_GRACE_MS: &str = "FAIRY_TEARDOWN_GRACE_MS";
pub const ENV_PARALLEL_ACTIVATION: &str = "FAIRY_PARALLEL_ACTIVATION";
pub const ENV_MAX_PARALLEL_ACTIVATIONS: &str = "FAIRY_MAX_PARALLEL_ACTIVATIONS";
pub const ENV_LOG_LEVEL: &str = "FAIRY_LOG_LEVEL";

const DEFAULT_TEARDOWN_GRACE_MS: u64 = 5_000;

/// Bootstrap configuration
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    /// Forces the active platform regardless of host markers
    pub platform_override: Option<PlatformTag>,
    /// Platform used when no host marker matches; `None` makes that a failure
    pub default_platform: Option<PlatformTag>,
    /// Capabilities that must have an activated binding before `Ready`
    pub required_capabilities: Vec<Capability>,
    /// Time each component gets to finish teardown
    pub teardown_grace: Duration,
    /// Activate independent components concurrently
    pub parallel_activation: bool,
    pub max_parallel_activations: usize,
    pub log_level: String,
    sources: HashMap<String, ConfigSource>,
}

/// On-disk layout of a bootstrap configuration file
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct BootstrapConfigFile {
    platform: Option<String>,
    default_platform: Option<String>,
    required_capabilities: Option<Vec<String>>,
    teardown_grace_ms: Option<u64>,
    parallel_activation: Option<bool>,
    max_parallel_activations: Option<usize>,
    log_level: Option<String>,
}

impl BootstrapConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        let mut sources = HashMap::new();
        sources.insert("platform".to_string(), ConfigSource::Default("none".to_string()));
        sources.insert(
            "default_platform".to_string(),
            ConfigSource::Default(PlatformTag::Application.to_string()),
        );
        sources.insert(
            "required_capabilities".to_string(),
            ConfigSource::Default("none".to_string()),
        );
        sources.insert(
            "teardown_grace_ms".to_string(),
            ConfigSource::Default(DEFAULT_TEARDOWN_GRACE_MS.to_string()),
        );
        sources.insert(
            "parallel_activation".to_string(),
            ConfigSource::Default("false".to_string()),
        );
        sources.insert(
            "max_parallel_activations".to_string(),
            ConfigSource::Default("cpu count".to_string()),
        );
        sources.insert("log_level".to_string(), ConfigSource::Default("info".to_string()));

        Self {
            platform_override: None,
            default_platform: Some(PlatformTag::Application),
            required_capabilities: Vec::new(),
            teardown_grace: Duration::from_millis(DEFAULT_TEARDOWN_GRACE_MS),
            parallel_activation: false,
            max_parallel_activations: num_cpus::get().max(1),
            log_level: "info".to_string(),
            sources,
        }
    }

    /// Configuration for tests: short grace period, quiet logging
    pub fn testing() -> Self {
        let mut config = Self::new();
        config.teardown_grace = Duration::from_millis(250);
        config.log_level = "warn".to_string();
        config
    }

    pub fn with_platform_override(mut self, platform: PlatformTag) -> Self {
        self.platform_override = Some(platform);
        self.mark_programmatic("platform");
        self
    }

    pub fn with_default_platform(mut self, platform: Option<PlatformTag>) -> Self {
        self.default_platform = platform;
        self.mark_programmatic("default_platform");
        self
    }

    pub fn with_required(mut self, capability: impl Into<Capability>) -> Self {
        let capability = capability.into();
        if !self.required_capabilities.contains(&capability) {
            self.required_capabilities.push(capability);
        }
        self.mark_programmatic("required_capabilities");
        self
    }

    pub fn with_teardown_grace(mut self, grace: Duration) -> Self {
        self.teardown_grace = grace;
        self.mark_programmatic("teardown_grace_ms");
        self
    }

    pub fn with_parallel_activation(mut self, parallel: bool) -> Self {
        self.parallel_activation = parallel;
        self.mark_programmatic("parallel_activation");
        self
    }

    pub fn with_max_parallel_activations(mut self, max: usize) -> Self {
        self.max_parallel_activations = max;
        self.mark_programmatic("max_parallel_activations");
        self
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::new().apply_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Self::new().apply_yaml(yaml, "<inline>")
    }

    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::new().apply_yaml(&content, &path.display().to_string())
    }

    /// Load the optional file, then layer environment variables on top
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::new(),
        };
        config.apply_vars(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a variable lookup, then validate
    pub fn apply_vars<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_PLATFORM) {
            self.platform_override = Some(parse_platform("platform", &value)?);
            self.mark_env("platform", ENV_PLATFORM);
        }

        if let Some(value) = lookup(ENV_DEFAULT_PLATFORM) {
            self.default_platform = parse_optional_platform(&value)?;
            self.mark_env("default_platform", ENV_DEFAULT_PLATFORM);
        }

        if let Some(value) = lookup(ENV_REQUIRED_CAPABILITIES) {
            self.required_capabilities = parse_capability_list(&value)?;
            self.mark_env("required_capabilities", ENV_REQUIRED_CAPABILITIES);
        }

        if let Some(value) = lookup(ENV_TEARDOWN_GRACE_MS) {
            let millis: u64 = value.trim().parse().map_err(|_| {
                ConfigError::invalid_value("teardown_grace_ms", &value, "duration in milliseconds")
            })?;
            self.teardown_grace = Duration::from_millis(millis);
            self.mark_env("teardown_grace_ms", ENV_TEARDOWN_GRACE_MS);
        }

        if let Some(value) = lookup(ENV_PARALLEL_ACTIVATION) {
            self.parallel_activation = parse_bool("parallel_activation", &value)?;
            self.mark_env("parallel_activation", ENV_PARALLEL_ACTIVATION);
        }

        if let Some(value) = lookup(ENV_MAX_PARALLEL_ACTIVATIONS) {
            self.max_parallel_activations = value.trim().parse().map_err(|_| {
                ConfigError::invalid_value("max_parallel_activations", &value, "positive integer")
            })?;
            self.mark_env("max_parallel_activations", ENV_MAX_PARALLEL_ACTIVATIONS);
        }

        if let Some(value) = lookup(ENV_LOG_LEVEL) {
            self.log_level = value.trim().to_lowercase();
            self.mark_env("log_level", ENV_LOG_LEVEL);
        }

        self.validate()?;
        Ok(self)
    }

    fn apply_yaml(mut self, yaml: &str, origin: &str) -> Result<Self, ConfigError> {
        let file: BootstrapConfigFile = serde_yaml::from_str(yaml)?;
        let source = ConfigSource::File(origin.to_string());

        if let Some(value) = file.platform {
            self.platform_override = Some(parse_platform("platform", &value)?);
            self.sources.insert("platform".to_string(), source.clone());
        }
        if let Some(value) = file.default_platform {
            self.default_platform = parse_optional_platform(&value)?;
            self.sources.insert("default_platform".to_string(), source.clone());
        }
        if let Some(values) = file.required_capabilities {
            self.required_capabilities = parse_capability_list(&values.join(","))?;
            self.sources
                .insert("required_capabilities".to_string(), source.clone());
        }
        if let Some(millis) = file.teardown_grace_ms {
            self.teardown_grace = Duration::from_millis(millis);
            self.sources.insert("teardown_grace_ms".to_string(), source.clone());
        }
        if let Some(parallel) = file.parallel_activation {
            self.parallel_activation = parallel;
            self.sources.insert("parallel_activation".to_string(), source.clone());
        }
        if let Some(max) = file.max_parallel_activations {
            self.max_parallel_activations = max;
            self.sources
                .insert("max_parallel_activations".to_string(), source.clone());
        }
        if let Some(level) = file.log_level {
            self.log_level = level.trim().to_lowercase();
            self.sources.insert("log_level".to_string(), source);
        }

        self.validate()?;
        Ok(self)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        NonZeroValidator {
            field: "teardown_grace_ms",
        }
        .validate(&(self.teardown_grace.as_millis() as u64))?;

        NonZeroValidator {
            field: "max_parallel_activations",
        }
        .validate(&(self.max_parallel_activations as u64))?;

        LogLevelValidator.validate(self.log_level.as_str())?;

        for capability in &self.required_capabilities {
            CapabilityTagValidator.validate(capability.as_str())?;
        }

        Ok(())
    }

    /// Get configuration source information for debugging
    pub fn config_sources(&self) -> &HashMap<String, ConfigSource> {
        &self.sources
    }

    pub fn source_of(&self, field: &str) -> Option<&ConfigSource> {
        self.sources.get(field)
    }

    fn mark_env(&mut self, field: &str, var: &str) {
        self.sources
            .insert(field.to_string(), ConfigSource::EnvVar(var.to_string()));
    }

    fn mark_programmatic(&mut self, field: &str) {
        self.sources
            .insert(field.to_string(), ConfigSource::Programmatic);
    }
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_platform(field: &str, value: &str) -> Result<PlatformTag, ConfigError> {
    value
        .parse::<PlatformTag>()
        .map_err(|_| ConfigError::invalid_value(field, value, "application, bukkit or a custom platform name"))
}

fn parse_optional_platform(value: &str) -> Result<Option<PlatformTag>, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "none" | "" => Ok(None),
        _ => parse_platform("default_platform", value).map(Some),
    }
}

fn parse_capability_list(value: &str) -> Result<Vec<Capability>, ConfigError> {
    let mut capabilities: Vec<Capability> = Vec::new();
    for tag in value.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        CapabilityTagValidator.validate(tag)?;
        let capability = Capability::new(tag);
        if !capabilities.contains(&capability) {
            capabilities.push(capability);
        }
    }
    Ok(capabilities)
}

fn parse_bool(field: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid_value(field, value, "true or false")),
    }
}
