use std::collections::HashMap;
use std::sync::Arc;

use crate::components::{Capability, ComponentHandle, ComponentId};
use crate::foundation::ComponentError;
use crate::platform::PlatformTag;

/// What a factory and `Component::activate` can see of the bootstrap
///
/// Only the capabilities the component declared in `depends_on` are visible,
/// and they are always activated before the component itself.
#[derive(Debug, Clone)]
pub struct ActivationContext {
    component: ComponentId,
    platform: PlatformTag,
    dependencies: HashMap<Capability, ComponentHandle>,
}

impl ActivationContext {
    pub fn new(component: ComponentId, platform: PlatformTag) -> Self {
        Self {
            component,
            platform,
            dependencies: HashMap::new(),
        }
    }

    pub(crate) fn with_dependency(mut self, capability: Capability, handle: ComponentHandle) -> Self {
        self.dependencies.insert(capability, handle);
        self
    }

    /// Identity of the component being activated
    pub fn component(&self) -> &ComponentId {
        &self.component
    }

    pub fn platform(&self) -> &PlatformTag {
        &self.platform
    }

    pub fn dependency(&self, capability: &str) -> Option<&ComponentHandle> {
        self.dependencies.get(capability)
    }

    pub fn dependency_as<T: Send + Sync + 'static>(&self, capability: &str) -> Option<Arc<T>> {
        self.dependency(capability)?.downcast_arc::<T>()
    }

    /// Like [`dependency_as`](Self::dependency_as) but failing the activation when absent
    pub fn require<T: Send + Sync + 'static>(&self, capability: &str) -> Result<Arc<T>, ComponentError> {
        self.dependency_as::<T>(capability).ok_or_else(|| {
            format!(
                "component '{}' requires capability '{}' as {}",
                self.component,
                capability,
                std::any::type_name::<T>()
            )
            .into()
        })
    }

    pub fn dependency_count(&self) -> usize {
        self.dependencies.len()
    }
}
