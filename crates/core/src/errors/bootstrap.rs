use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::components::{Capability, ComponentId};
use crate::config::ConfigError;
use crate::foundation::{BootstrapPhase, BootstrapState};
use crate::platform::PlatformTag;
use crate::scanner::ScanIssue;

/// Core error type for the bootstrap sequence and the component container
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Scan failed: {message}")]
    ScanFailure {
        message: String,
        issues: Vec<ScanIssue>,
    },

    #[error("Ambiguous platform: markers for {} are present and no override is set", join_tags(.candidates))]
    AmbiguousPlatform { candidates: Vec<PlatformTag> },

    #[error("Unknown platform: no host marker matched and no default platform is configured")]
    UnknownPlatform,

    #[error("Capability '{capability}' is claimed by both '{first}' and '{second}' on platform '{platform}'")]
    CapabilityConflict {
        capability: Capability,
        first: ComponentId,
        second: ComponentId,
        platform: PlatformTag,
    },

    #[error("Missing capability '{capability}'{}", required_by_suffix(.required_by))]
    MissingCapability {
        capability: Capability,
        required_by: Option<ComponentId>,
    },

    #[error("Activation of component '{component}' failed: {source}")]
    ActivationFailure {
        component: ComponentId,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Capability not found: {capability}")]
    CapabilityNotFound { capability: Capability },

    #[error("Dependency cycle detected: {}", join_ids(.cycle))]
    DependencyCycle { cycle: Vec<ComponentId> },

    #[error("Hook rejected phase '{phase}': {message}")]
    HookRejected { phase: BootstrapPhase, message: String },

    #[error("Invalid bootstrap transition from {from} to {to}")]
    InvalidTransition {
        from: BootstrapState,
        to: BootstrapState,
    },

    #[error("Bootstrap already started (current state: {state})")]
    AlreadyStarted { state: BootstrapState },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
}

fn join_tags(tags: &[PlatformTag]) -> String {
    tags.iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn join_ids(ids: &[ComponentId]) -> String {
    ids.iter()
        .map(|id| id.as_str())
        .collect::<Vec<_>>()
        .join(" -> ")
}

fn required_by_suffix(required_by: &Option<ComponentId>) -> String {
    match required_by {
        Some(component) => format!(" (required by '{}')", component),
        None => String::new(),
    }
}

/// Failure kinds reported to the host launcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ScanFailure,
    AmbiguousPlatform,
    UnknownPlatform,
    CapabilityConflict,
    MissingCapability,
    ActivationFailure,
    CapabilityNotFound,
    DependencyCycle,
    HookRejected,
    InvalidTransition,
    AlreadyStarted,
    Configuration,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::ScanFailure => "scan_failure",
            FailureKind::AmbiguousPlatform => "ambiguous_platform",
            FailureKind::UnknownPlatform => "unknown_platform",
            FailureKind::CapabilityConflict => "capability_conflict",
            FailureKind::MissingCapability => "missing_capability",
            FailureKind::ActivationFailure => "activation_failure",
            FailureKind::CapabilityNotFound => "capability_not_found",
            FailureKind::DependencyCycle => "dependency_cycle",
            FailureKind::HookRejected => "hook_rejected",
            FailureKind::InvalidTransition => "invalid_transition",
            FailureKind::AlreadyStarted => "already_started",
            FailureKind::Configuration => "configuration",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl BootstrapError {
    /// Create a scan failure carrying the issues recorded while scanning
    pub fn scan_failure(message: impl Into<String>, issues: Vec<ScanIssue>) -> Self {
        Self::ScanFailure {
            message: message.into(),
            issues,
        }
    }

    /// Create a missing capability error for a framework-required capability
    pub fn missing_capability(capability: Capability) -> Self {
        Self::MissingCapability {
            capability,
            required_by: None,
        }
    }

    /// Create a missing capability error for an unsatisfied component dependency
    pub fn missing_dependency(capability: Capability, required_by: ComponentId) -> Self {
        Self::MissingCapability {
            capability,
            required_by: Some(required_by),
        }
    }

    /// Create an activation failure for a component
    pub fn activation_failure(
        component: ComponentId,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::ActivationFailure {
            component,
            source: source.into(),
        }
    }

    /// Create a capability-not-found lookup error
    pub fn capability_not_found(capability: Capability) -> Self {
        Self::CapabilityNotFound { capability }
    }

    /// Failure kind of this error
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::ScanFailure { .. } => FailureKind::ScanFailure,
            Self::AmbiguousPlatform { .. } => FailureKind::AmbiguousPlatform,
            Self::UnknownPlatform => FailureKind::UnknownPlatform,
            Self::CapabilityConflict { .. } => FailureKind::CapabilityConflict,
            Self::MissingCapability { .. } => FailureKind::MissingCapability,
            Self::ActivationFailure { .. } => FailureKind::ActivationFailure,
            Self::CapabilityNotFound { .. } => FailureKind::CapabilityNotFound,
            Self::DependencyCycle { .. } => FailureKind::DependencyCycle,
            Self::HookRejected { .. } => FailureKind::HookRejected,
            Self::InvalidTransition { .. } => FailureKind::InvalidTransition,
            Self::AlreadyStarted { .. } => FailureKind::AlreadyStarted,
            Self::Configuration(_) => FailureKind::Configuration,
        }
    }

    /// Identity of the offending component, if the error names one
    pub fn component(&self) -> Option<&ComponentId> {
        match self {
            Self::CapabilityConflict { second, .. } => Some(second),
            Self::MissingCapability { required_by, .. } => required_by.as_ref(),
            Self::ActivationFailure { component, .. } => Some(component),
            Self::DependencyCycle { cycle } => cycle.first(),
            _ => None,
        }
    }

    /// Check if the error is an ordinary post-ready lookup miss
    pub fn is_lookup_miss(&self) -> bool {
        matches!(self, Self::CapabilityNotFound { .. })
    }
}

pub type BootstrapResult<T> = Result<T, BootstrapError>;
