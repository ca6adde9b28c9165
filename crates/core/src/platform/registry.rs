use serde::Serialize;
use std::collections::BTreeMap;

use crate::components::{Capability, ComponentDescriptor, ComponentId};
use crate::errors::BootstrapError;
use crate::platform::PlatformTag;

/// Capability bound to the single component that fulfils it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapabilityBinding {
    pub capability: Capability,
    pub component: ComponentId,
}

/// Eligible descriptors and their capability bindings for one platform
#[derive(Debug, Clone)]
pub struct BindingSet {
    platform: PlatformTag,
    eligible: Vec<ComponentDescriptor>,
    bindings: BTreeMap<Capability, usize>,
    filtered: Vec<ComponentId>,
}

impl BindingSet {
    pub fn platform(&self) -> &PlatformTag {
        &self.platform
    }

    /// Descriptors eligible on the active platform, in discovery order
    pub fn eligible(&self) -> &[ComponentDescriptor] {
        &self.eligible
    }

    /// Identities filtered out by their platform constraint
    pub fn filtered(&self) -> &[ComponentId] {
        &self.filtered
    }

    /// Descriptor bound to `capability`
    pub fn provider_of(&self, capability: &Capability) -> Option<&ComponentDescriptor> {
        self.bindings.get(capability).map(|&i| &self.eligible[i])
    }

    pub(crate) fn provider_index(&self, capability: &Capability) -> Option<usize> {
        self.bindings.get(capability).copied()
    }

    /// All bindings, sorted by capability
    pub fn bindings(&self) -> Vec<CapabilityBinding> {
        self.bindings
            .iter()
            .map(|(capability, &i)| CapabilityBinding {
                capability: capability.clone(),
                component: self.eligible[i].id().clone(),
            })
            .collect()
    }

    pub fn is_bound(&self, capability: &Capability) -> bool {
        self.bindings.contains_key(capability)
    }
}

/// Maps the active platform to the implementations it activates for each capability
#[derive(Debug, Clone, Default)]
pub struct PlatformRegistry {
    required: Vec<Capability>,
}

impl PlatformRegistry {
    pub fn new(required: Vec<Capability>) -> Self {
        Self { required }
    }

    pub fn required(&self) -> &[Capability] {
        &self.required
    }

    /// Filter `descriptors` to `platform` and bind every declared capability
    ///
    /// Two eligible descriptors claiming one capability are a configuration error;
    /// order hints never decide between them.
    pub fn bind(
        &self,
        platform: &PlatformTag,
        descriptors: Vec<ComponentDescriptor>,
    ) -> Result<BindingSet, BootstrapError> {
        let mut eligible = Vec::with_capacity(descriptors.len());
        let mut filtered = Vec::new();

        for descriptor in descriptors {
            if descriptor.is_eligible_on(platform) {
                eligible.push(descriptor);
            } else {
                tracing::debug!(
                    component = %descriptor.id(),
                    constraint = ?descriptor.platform().map(|p| p.to_string()),
                    platform = %platform,
                    "Component filtered by platform constraint"
                );
                filtered.push(descriptor.id().clone());
            }
        }

        let mut bindings: BTreeMap<Capability, usize> = BTreeMap::new();
        for (index, descriptor) in eligible.iter().enumerate() {
            for capability in descriptor.capabilities() {
                if let Some(&existing) = bindings.get(capability) {
                    return Err(BootstrapError::CapabilityConflict {
                        capability: capability.clone(),
                        first: eligible[existing].id().clone(),
                        second: descriptor.id().clone(),
                        platform: platform.clone(),
                    });
                }
                bindings.insert(capability.clone(), index);
            }
        }

        for capability in &self.required {
            if !bindings.contains_key(capability) {
                return Err(BootstrapError::missing_capability(capability.clone()));
            }
        }

        for descriptor in &eligible {
            for dependency in descriptor.depends_on() {
                if !bindings.contains_key(dependency) {
                    return Err(BootstrapError::missing_dependency(
                        dependency.clone(),
                        descriptor.id().clone(),
                    ));
                }
            }
        }

        tracing::info!(
            platform = %platform,
            eligible = eligible.len(),
            filtered = filtered.len(),
            bindings = bindings.len(),
            "Capabilities bound"
        );

        Ok(BindingSet {
            platform: platform.clone(),
            eligible,
            bindings,
            filtered,
        })
    }
}
