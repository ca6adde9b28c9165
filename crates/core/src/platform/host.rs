use std::time::Duration;

use crate::bootstrap::BootstrapHook;
use crate::components::{ComponentContainer, TeardownReport};
use crate::errors::FailureReport;
use crate::foundation::BootstrapPhase;
use crate::platform::{PlatformSignals, PlatformTag, BUKKIT_MARKER};
use crate::scanner::ClasspathRoot;

/// Descriptor file that marks a directory root as a Bukkit plugin
pub const BUKKIT_PLUGIN_DESCRIPTOR: &str = "plugin.yml";

/// Entry point supplied by a concrete host process
///
/// The adapter contributes the platform signals the identifier inspects and
/// any lifecycle hooks specific to the host.
pub trait HostAdapter: Send + Sync {
    fn name(&self) -> &str;

    fn platform_signals(&self, roots: &[ClasspathRoot]) -> PlatformSignals;

    fn hooks(&self) -> Vec<Box<dyn BootstrapHook>> {
        Vec::new()
    }
}

/// Standalone application host
#[derive(Debug, Clone, Default)]
pub struct ApplicationHost {
    platform_override: Option<PlatformTag>,
}

impl ApplicationHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_override(mut self, platform: Option<PlatformTag>) -> Self {
        self.platform_override = platform;
        self
    }
}

impl HostAdapter for ApplicationHost {
    fn name(&self) -> &str {
        "application"
    }

    fn platform_signals(&self, _roots: &[ClasspathRoot]) -> PlatformSignals {
        PlatformSignals::new().with_override(self.platform_override.clone())
    }
}

/// Host embedded in a Bukkit-compatible server as a plugin
#[derive(Debug, Clone, Default)]
pub struct BukkitHost {
    plugin_name: String,
    embedded: bool,
}

impl BukkitHost {
    /// Host for a plugin that is known to run inside the server
    pub fn embedded(plugin_name: impl Into<String>) -> Self {
        Self {
            plugin_name: plugin_name.into(),
            embedded: true,
        }
    }

    /// Host that only reports Bukkit when a root ships a plugin descriptor
    pub fn detect(plugin_name: impl Into<String>) -> Self {
        Self {
            plugin_name: plugin_name.into(),
            embedded: false,
        }
    }

    pub fn plugin_name(&self) -> &str {
        &self.plugin_name
    }

    fn has_plugin_descriptor(roots: &[ClasspathRoot]) -> bool {
        roots.iter().any(|root| match root {
            ClasspathRoot::Directory(path) => path.join(BUKKIT_PLUGIN_DESCRIPTOR).is_file(),
            ClasspathRoot::Manifest(path) => path
                .parent()
                .is_some_and(|dir| dir.join(BUKKIT_PLUGIN_DESCRIPTOR).is_file()),
            ClasspathRoot::Embedded { .. } => false,
        })
    }
}

impl HostAdapter for BukkitHost {
    fn name(&self) -> &str {
        "bukkit"
    }

    fn platform_signals(&self, roots: &[ClasspathRoot]) -> PlatformSignals {
        let signals = PlatformSignals::new();
        if self.embedded || Self::has_plugin_descriptor(roots) {
            signals.with_marker(BUKKIT_MARKER)
        } else {
            signals
        }
    }

    fn hooks(&self) -> Vec<Box<dyn BootstrapHook>> {
        vec![Box::new(PluginLifecycleHook {
            plugin: self.plugin_name.clone(),
        })]
    }
}

/// Reports plugin enable and disable the way a server console expects
#[derive(Debug, Clone)]
struct PluginLifecycleHook {
    plugin: String,
}

impl BootstrapHook for PluginLifecycleHook {
    fn name(&self) -> &str {
        "bukkit-plugin"
    }

    fn after_phase(&self, phase: BootstrapPhase, duration: Duration) {
        if phase == BootstrapPhase::Shutdown {
            tracing::info!(plugin = %self.plugin, "Disabled {} in {:?}", self.plugin, duration);
        }
    }

    fn on_ready(&self, container: &ComponentContainer) {
        tracing::info!(
            plugin = %self.plugin,
            components = container.len(),
            "Enabled {}",
            self.plugin
        );
    }

    fn on_failure(&self, report: &FailureReport) {
        tracing::error!(
            plugin = %self.plugin,
            run_id = %report.run_id,
            "Could not enable {}: {}",
            self.plugin,
            report.root_cause()
        );
    }

    fn on_teardown(&self, report: &TeardownReport) {
        if !report.is_clean() {
            tracing::warn!(
                plugin = %self.plugin,
                "{} component(s) did not release cleanly while disabling {}",
                report.failed.len() + report.timed_out.len(),
                self.plugin
            );
        }
    }
}
