use std::time::Duration;

use crate::components::{ComponentContainer, RegisteredComponent, TeardownReport};
use crate::errors::FailureReport;
use crate::foundation::{BootstrapPhase, ComponentError};

/// Observer of bootstrap progress
///
/// Hosts use hooks to attach platform-specific behavior to the generic
/// sequence. Every method has a no-op default.
pub trait BootstrapHook: Send + Sync {
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Called before a phase starts; an error aborts the bootstrap
    fn before_phase(&self, phase: BootstrapPhase) -> Result<(), ComponentError> {
        let _ = phase;
        Ok(())
    }

    /// Called after a phase completed successfully
    fn after_phase(&self, phase: BootstrapPhase, duration: Duration) {
        let _ = (phase, duration);
    }

    /// Called once per component, in activation order
    fn on_activated(&self, component: &RegisteredComponent) {
        let _ = component;
    }

    /// Called when the container is ready
    fn on_ready(&self, container: &ComponentContainer) {
        let _ = container;
    }

    /// Called when the bootstrap fails, after already activated components were torn down
    fn on_failure(&self, report: &FailureReport) {
        let _ = report;
    }

    /// Called after a shutdown released the container
    fn on_teardown(&self, report: &TeardownReport) {
        let _ = report;
    }
}

/// Hook that reports progress through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHook;

impl BootstrapHook for LoggingHook {
    fn name(&self) -> &str {
        "logging"
    }

    fn before_phase(&self, phase: BootstrapPhase) -> Result<(), ComponentError> {
        tracing::debug!("Starting {} phase", phase);
        Ok(())
    }

    fn after_phase(&self, phase: BootstrapPhase, duration: Duration) {
        tracing::debug!("Phase {} completed in {:?}", phase, duration);
    }

    fn on_activated(&self, component: &RegisteredComponent) {
        tracing::info!(
            "Component '{}' activated (#{}) in {:?}",
            component.id(),
            component.sequence(),
            component.activation_duration()
        );
    }

    fn on_ready(&self, container: &ComponentContainer) {
        tracing::info!(
            "Platform {} ready with {} component(s)",
            container.platform(),
            container.len()
        );
    }

    fn on_failure(&self, report: &FailureReport) {
        tracing::error!("Bootstrap failed during {}: {}", report.phase, report.message);
    }

    fn on_teardown(&self, report: &TeardownReport) {
        if report.is_clean() {
            tracing::info!("Released {} component(s)", report.released.len());
        } else {
            tracing::warn!(
                "Teardown finished with {} failure(s) and {} timeout(s)",
                report.failed.len(),
                report.timed_out.len()
            );
        }
    }
}
