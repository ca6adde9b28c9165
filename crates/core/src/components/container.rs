use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::components::{Capability, ComponentDescriptor, ComponentHandle, ComponentId};
use crate::errors::BootstrapError;
use crate::platform::PlatformTag;

/// A descriptor together with its activated instance
#[derive(Debug)]
pub struct RegisteredComponent {
    descriptor: ComponentDescriptor,
    handle: ComponentHandle,
    sequence: usize,
    activated_at: DateTime<Utc>,
    activation_duration: Duration,
}

impl RegisteredComponent {
    pub fn descriptor(&self) -> &ComponentDescriptor {
        &self.descriptor
    }

    pub fn id(&self) -> &ComponentId {
        self.descriptor.id()
    }

    pub fn handle(&self) -> &ComponentHandle {
        &self.handle
    }

    /// Zero-based position in activation order
    pub fn sequence(&self) -> usize {
        self.sequence
    }

    pub fn activated_at(&self) -> DateTime<Utc> {
        self.activated_at
    }

    pub fn activation_duration(&self) -> Duration {
        self.activation_duration
    }

    pub fn downcast_ref<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.handle.downcast_ref::<T>()
    }
}

/// Outcome of tearing down a container
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeardownReport {
    /// Every component visited, in teardown order
    pub order: Vec<ComponentId>,
    /// Components released cleanly
    pub released: Vec<ComponentId>,
    /// Components whose teardown returned an error
    pub failed: Vec<(ComponentId, String)>,
    /// Components that overran their grace period
    pub timed_out: Vec<ComponentId>,
}

impl TeardownReport {
    pub fn visited(&self) -> usize {
        self.order.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.timed_out.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.visited() == 0
    }
}

/// Holds activated components for the rest of the process lifetime
///
/// The container is immutable once built, so it can be shared as
/// `Arc<ComponentContainer>` and read from any thread without locking.
#[derive(Debug)]
pub struct ComponentContainer {
    platform: PlatformTag,
    components: Vec<RegisteredComponent>,
    bindings: HashMap<Capability, usize>,
    torn_down: AtomicBool,
}

impl ComponentContainer {
    /// Platform the container was bootstrapped on
    pub fn platform(&self) -> &PlatformTag {
        &self.platform
    }

    /// Look up the single component bound to `capability`
    pub fn get(&self, capability: &str) -> Result<&RegisteredComponent, BootstrapError> {
        self.bindings
            .get(capability)
            .map(|&index| &self.components[index])
            .ok_or_else(|| BootstrapError::capability_not_found(Capability::new(capability)))
    }

    /// Look up the component bound to `capability` as its concrete type
    ///
    /// A component of a different type is reported as `CapabilityNotFound`.
    pub fn get_as<T: Send + Sync + 'static>(&self, capability: &str) -> Result<&T, BootstrapError> {
        self.get(capability)?
            .downcast_ref::<T>()
            .ok_or_else(|| BootstrapError::capability_not_found(Capability::new(capability)))
    }

    /// Components with a capability in `family`, in activation order
    pub fn get_all(&self, family: &str) -> Vec<&RegisteredComponent> {
        self.components
            .iter()
            .filter(|c| c.descriptor.capabilities().iter().any(|cap| cap.in_family(family)))
            .collect()
    }

    pub fn contains(&self, capability: &str) -> bool {
        self.bindings.contains_key(capability)
    }

    /// All components in activation order
    pub fn components(&self) -> &[RegisteredComponent] {
        &self.components
    }

    /// Bound capabilities, sorted
    pub fn capabilities(&self) -> Vec<&Capability> {
        let mut capabilities: Vec<&Capability> = self.bindings.keys().collect();
        capabilities.sort();
        capabilities
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::SeqCst)
    }

    /// Tear down every component in reverse activation order
    ///
    /// Each component gets `grace` to finish. Only the first call does any work;
    /// later calls return an empty report.
    pub async fn teardown(&self, grace: Duration) -> TeardownReport {
        if self.torn_down.swap(true, Ordering::SeqCst) {
            tracing::debug!("Container already torn down; skipping");
            return TeardownReport::default();
        }

        let mut report = TeardownReport::default();

        for registered in self.components.iter().rev() {
            let id = registered.id().clone();
            report.order.push(id.clone());
            let teardown = registered.handle.component().teardown();

            match tokio::time::timeout(grace, teardown).await {
                Ok(Ok(())) => {
                    tracing::debug!(component = %id, "Component torn down");
                    report.released.push(id);
                }
                Ok(Err(e)) => {
                    tracing::error!(component = %id, error = %e, "Component teardown failed");
                    report.failed.push((id, e.to_string()));
                }
                Err(_) => {
                    tracing::warn!(
                        component = %id,
                        grace_ms = grace.as_millis() as u64,
                        "Component did not finish teardown within its grace period; skipping"
                    );
                    report.timed_out.push(id);
                }
            }
        }

        report
    }
}

/// Mutable staging area used by the orchestrator while components activate
#[derive(Debug)]
pub(crate) struct ContainerBuilder {
    platform: PlatformTag,
    components: Vec<RegisteredComponent>,
    bindings: HashMap<Capability, usize>,
}

impl ContainerBuilder {
    pub(crate) fn new(platform: PlatformTag) -> Self {
        Self {
            platform,
            components: Vec::new(),
            bindings: HashMap::new(),
        }
    }

    /// Record an activated component; its sequence number is its insertion position
    pub(crate) fn push(
        &mut self,
        descriptor: ComponentDescriptor,
        handle: ComponentHandle,
        activated_at: DateTime<Utc>,
        activation_duration: Duration,
    ) {
        let index = self.components.len();
        for capability in descriptor.capabilities() {
            let previous = self.bindings.insert(capability.clone(), index);
            debug_assert!(previous.is_none(), "capability bound twice: {}", capability);
        }

        self.components.push(RegisteredComponent {
            descriptor,
            handle,
            sequence: index,
            activated_at,
            activation_duration,
        });
    }

    /// Handle of an already activated component bound to `capability`
    pub(crate) fn handle_for(&self, capability: &Capability) -> Option<&ComponentHandle> {
        self.bindings
            .get(capability)
            .map(|&index| &self.components[index].handle)
    }

    pub(crate) fn len(&self) -> usize {
        self.components.len()
    }

    pub(crate) fn build(self) -> ComponentContainer {
        ComponentContainer {
            platform: self.platform,
            components: self.components,
            bindings: self.bindings,
            torn_down: AtomicBool::new(false),
        }
    }
}
