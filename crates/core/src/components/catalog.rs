use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::bootstrap::ActivationContext;
use crate::foundation::{Component, ComponentError};

/// Activated component instance, usable both as a [`Component`] and as its concrete type
#[derive(Clone)]
pub struct ComponentHandle {
    component: Arc<dyn Component>,
    any: Arc<dyn Any + Send + Sync>,
}

impl ComponentHandle {
    pub fn new<T: Component>(instance: T) -> Self {
        Self::from_arc(Arc::new(instance))
    }

    pub fn from_arc<T: Component>(instance: Arc<T>) -> Self {
        Self {
            component: instance.clone(),
            any: instance,
        }
    }

    pub fn component(&self) -> &dyn Component {
        self.component.as_ref()
    }

    pub fn type_name(&self) -> &'static str {
        self.component.type_name()
    }

    pub fn downcast_ref<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.any.downcast_ref::<T>()
    }

    pub fn downcast_arc<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.any.clone().downcast::<T>().ok()
    }
}

impl std::fmt::Debug for ComponentHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentHandle")
            .field("type_name", &self.type_name())
            .finish()
    }
}

/// Factory function for creating component instances
pub type ComponentFactory =
    Arc<dyn Fn(&ActivationContext) -> Result<ComponentHandle, ComponentError> + Send + Sync>;

/// Table of factories compiled into the host, keyed by factory token
///
/// A descriptor is loadable when its factory token is present here. The scanner
/// only checks membership; factories run during activation.
#[derive(Default, Clone)]
pub struct ComponentCatalog {
    factories: HashMap<String, ComponentFactory>,
}

impl ComponentCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `token`
    pub fn register<T, F>(&mut self, token: impl Into<String>, factory: F) -> &mut Self
    where
        T: Component,
        F: Fn(&ActivationContext) -> Result<T, ComponentError> + Send + Sync + 'static,
    {
        let token = token.into();
        let factory: ComponentFactory =
            Arc::new(move |context| factory(context).map(ComponentHandle::new));

        if self.factories.insert(token.clone(), factory).is_some() {
            tracing::warn!(token = %token, "Factory token registered twice; keeping the latest factory");
        }
        self
    }

    /// Register a factory that builds the component with `Default`
    pub fn register_default<T>(&mut self, token: impl Into<String>) -> &mut Self
    where
        T: Component + Default,
    {
        self.register(token, |_| Ok(T::default()))
    }

    pub fn contains(&self, token: &str) -> bool {
        self.factories.contains_key(token)
    }

    pub(crate) fn factory(&self, token: &str) -> Option<ComponentFactory> {
        self.factories.get(token).cloned()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Registered tokens in sorted order
    pub fn tokens(&self) -> Vec<&str> {
        let mut tokens: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        tokens.sort_unstable();
        tokens
    }
}

impl std::fmt::Debug for ComponentCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentCatalog")
            .field("tokens", &self.tokens())
            .finish()
    }
}
