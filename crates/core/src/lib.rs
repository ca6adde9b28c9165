pub mod bootstrap;
pub mod components;
pub mod config;
pub mod errors;
pub mod foundation;
pub mod platform;
pub mod scanner;

// Re-export key types for convenience
pub use bootstrap::{ActivationContext, Bootstrap, BootstrapHook, BootstrapStats, LoggingHook};
pub use components::{
    register_builtins, Capability, ComponentCatalog, ComponentContainer, ComponentDescriptor,
    ComponentHandle, ComponentId, RegisteredComponent, TeardownReport,
};
pub use config::{BootstrapConfig, ConfigError, ConfigSource};
pub use errors::{BootstrapError, BootstrapFailure, BootstrapResult, FailureKind, FailureReport};
pub use foundation::{BootstrapPhase, BootstrapState, Component, ComponentError};
pub use platform::{
    ApplicationHost, BukkitHost, HostAdapter, PlatformIdentifier, PlatformRegistry, PlatformSignals,
    PlatformTag,
};
pub use scanner::{ClasspathRoot, ClasspathScanner, ComponentManifest, ManifestEntry, ScanIssue};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Framework information
pub const FRAMEWORK_NAME: &str = "fairy";

/// Get framework version
pub fn version() -> &'static str {
    VERSION
}

/// Get framework name
pub fn name() -> &'static str {
    FRAMEWORK_NAME
}
