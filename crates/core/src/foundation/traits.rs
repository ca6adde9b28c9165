use async_trait::async_trait;

use crate::bootstrap::ActivationContext;

/// Error type returned by component activation and teardown logic
pub type ComponentError = Box<dyn std::error::Error + Send + Sync>;

/// Runtime instance of a discovered component
///
/// Instances are created by the factory registered in the
/// [`ComponentCatalog`](crate::components::ComponentCatalog) under the descriptor's
/// factory token, then activated exactly once. Every capability the component
/// depends on is already active when `activate` runs.
#[async_trait]
pub trait Component: Send + Sync + 'static {
    /// Get the type name of this component
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Initialize the component after construction
    async fn activate(&self, context: &ActivationContext) -> Result<(), ComponentError> {
        let _ = context;
        Ok(())
    }

    /// Release resources held by the component
    ///
    /// Bounded by the configured grace period; overruns are logged and skipped.
    async fn teardown(&self) -> Result<(), ComponentError> {
        Ok(())
    }
}

impl std::fmt::Debug for dyn Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Component")
            .field("type_name", &self.type_name())
            .finish()
    }
}
