use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::bootstrap::{
    ActivationContext, ActivationPlan, ActivationPlanner, BootstrapHook, BootstrapStats, LoggingHook,
};
use crate::components::{
    ComponentCatalog, ComponentContainer, ComponentFactory, ComponentHandle, ComponentId, ContainerBuilder,
    TeardownReport,
};
use crate::config::BootstrapConfig;
use crate::errors::{BootstrapError, BootstrapFailure, FailureReport};
use crate::foundation::{BootstrapPhase, BootstrapState};
use crate::platform::{BindingSet, HostAdapter, PlatformIdentifier, PlatformRegistry, PlatformSignals, PlatformTag};
use crate::scanner::{ClasspathRoot, ClasspathScanner};

/// One recorded state change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateTransition {
    pub from: BootstrapState,
    pub to: BootstrapState,
    pub at: DateTime<Utc>,
}

/// Drives the one-time startup sequence and owns the resulting container
///
/// Phases run strictly in order: identify the platform, scan the classpath,
/// bind capabilities, activate components, signal ready. Any failure tears
/// down what was already activated and leaves the machine in `Failed`.
pub struct Bootstrap {
    run_id: Uuid,
    config: BootstrapConfig,
    catalog: Arc<ComponentCatalog>,
    identifier: PlatformIdentifier,
    planner: ActivationPlanner,
    hooks: Vec<Box<dyn BootstrapHook>>,
    state: BootstrapState,
    history: Vec<StateTransition>,
    platform: Option<PlatformTag>,
    container: Option<Arc<ComponentContainer>>,
    stats: BootstrapStats,
}

/// Component activated during the current run, not yet registered
struct Activated {
    handle: ComponentHandle,
    activated_at: DateTime<Utc>,
    duration: Duration,
}

impl Bootstrap {
    pub fn new(config: BootstrapConfig, catalog: ComponentCatalog) -> Self {
        let identifier = PlatformIdentifier::new().with_default(config.default_platform.clone());

        Self {
            run_id: Uuid::new_v4(),
            config,
            catalog: Arc::new(catalog),
            identifier,
            planner: ActivationPlanner::new(),
            hooks: vec![Box::new(LoggingHook)],
            state: BootstrapState::Uninitialized,
            history: Vec::new(),
            platform: None,
            container: None,
            stats: BootstrapStats::new(),
        }
    }

    /// Replace the platform identifier, e.g. to register detectors for custom platforms
    pub fn with_identifier(mut self, identifier: PlatformIdentifier) -> Self {
        self.identifier = identifier;
        self
    }

    pub fn with_hook<H: BootstrapHook + 'static>(mut self, hook: H) -> Self {
        self.hooks.push(Box::new(hook));
        self
    }

    pub fn add_hook(&mut self, hook: Box<dyn BootstrapHook>) {
        self.hooks.push(hook);
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn state(&self) -> BootstrapState {
        self.state
    }

    pub fn history(&self) -> &[StateTransition] {
        &self.history
    }

    pub fn config(&self) -> &BootstrapConfig {
        &self.config
    }

    /// Platform chosen by the identification phase
    pub fn platform(&self) -> Option<&PlatformTag> {
        self.platform.as_ref()
    }

    /// The ready container; `None` before `Ready` and after a failed run
    pub fn container(&self) -> Option<Arc<ComponentContainer>> {
        self.container.clone()
    }

    pub fn stats(&self) -> &BootstrapStats {
        &self.stats
    }

    /// Run the bootstrap for a host adapter: its signals and hooks are used
    pub async fn launch(
        &mut self,
        host: &dyn HostAdapter,
        roots: Vec<ClasspathRoot>,
    ) -> Result<Arc<ComponentContainer>, BootstrapFailure> {
        tracing::info!(host = host.name(), "Launching bootstrap");
        for hook in host.hooks() {
            self.add_hook(hook);
        }
        let signals = host.platform_signals(&roots);
        self.run(roots, signals).await
    }

    /// Execute every startup phase and return the ready container
    ///
    /// May be called once. A second call fails with `AlreadyStarted` and leaves
    /// the current state untouched.
    pub async fn run(
        &mut self,
        roots: Vec<ClasspathRoot>,
        signals: PlatformSignals,
    ) -> Result<Arc<ComponentContainer>, BootstrapFailure> {
        if self.state != BootstrapState::Uninitialized {
            let error = BootstrapError::AlreadyStarted { state: self.state };
            let report = FailureReport::from_error(self.run_id, BootstrapPhase::PlatformIdentification, &error);
            return Err(BootstrapFailure::new(report, error));
        }

        let started = Instant::now();
        tracing::info!(run_id = %self.run_id, roots = roots.len(), "Starting bootstrap");

        // Platform identification
        let phase = BootstrapPhase::PlatformIdentification;
        let platform = match self.identify(&signals) {
            Ok(platform) => platform,
            Err(error) => return Err(self.fail(phase, error, None).await),
        };

        // Scan
        let phase = BootstrapPhase::Scan;
        let descriptors = match self.scan(roots, &platform) {
            Ok(descriptors) => descriptors,
            Err(error) => return Err(self.fail(phase, error, None).await),
        };

        // Registration
        let phase = BootstrapPhase::Registration;
        let (bindings, plan) = match self.register(&platform, descriptors) {
            Ok(registered) => registered,
            Err(error) => return Err(self.fail(phase, error, None).await),
        };

        // Activation
        let phase = BootstrapPhase::Activation;
        if let Err(error) = self.begin_phase(phase) {
            return Err(self.fail(phase, error, None).await);
        }
        if let Err(error) = self.transition(BootstrapState::Activating) {
            return Err(self.fail(phase, error, None).await);
        }
        let phase_start = Instant::now();
        let (builder, activation_error) = self.activate(&platform, &bindings, &plan).await;
        self.stats.activation_time = phase_start.elapsed();
        if let Some(error) = activation_error {
            return Err(self.fail(phase, error, Some(builder)).await);
        }
        self.end_phase(phase, self.stats.activation_time);

        // Readiness
        let phase = BootstrapPhase::Readiness;
        if let Err(error) = self.begin_phase(phase) {
            return Err(self.fail(phase, error, Some(builder)).await);
        }
        let phase_start = Instant::now();
        let missing = self
            .config
            .required_capabilities
            .iter()
            .find(|capability| builder.handle_for(capability).is_none())
            .cloned();
        if let Some(missing) = missing {
            let error = BootstrapError::missing_capability(missing);
            return Err(self.fail(phase, error, Some(builder)).await);
        }
        if let Err(error) = self.transition(BootstrapState::Ready) {
            return Err(self.fail(phase, error, Some(builder)).await);
        }

        let container = Arc::new(builder.build());
        self.container = Some(container.clone());
        self.stats.total_time = started.elapsed();

        for registered in container.components() {
            for hook in &self.hooks {
                hook.on_activated(registered);
            }
        }
        self.end_phase(phase, phase_start.elapsed());
        for hook in &self.hooks {
            hook.on_ready(&container);
        }

        tracing::info!(
            run_id = %self.run_id,
            platform = %platform,
            components = container.len(),
            total_ms = self.stats.total_time.as_millis() as u64,
            "Bootstrap ready"
        );

        Ok(container)
    }

    /// Tear down the ready container in reverse activation order
    ///
    /// Idempotent: once stopped or failed, further calls return an empty report.
    pub async fn shutdown(&mut self) -> Result<TeardownReport, BootstrapError> {
        match self.state {
            BootstrapState::Stopped | BootstrapState::Failed => {
                tracing::debug!(state = %self.state, "Shutdown requested after bootstrap ended; nothing to do");
                return Ok(TeardownReport::default());
            }
            BootstrapState::Ready => {}
            state => {
                return Err(BootstrapError::InvalidTransition {
                    from: state,
                    to: BootstrapState::ShuttingDown,
                })
            }
        }

        self.transition(BootstrapState::ShuttingDown)?;
        let started = Instant::now();

        let report = match self.container.take() {
            Some(container) => container.teardown(self.config.teardown_grace).await,
            None => TeardownReport::default(),
        };

        self.transition(BootstrapState::Stopped)?;
        for hook in &self.hooks {
            hook.after_phase(BootstrapPhase::Shutdown, started.elapsed());
            hook.on_teardown(&report);
        }

        Ok(report)
    }

    fn identify(&mut self, signals: &PlatformSignals) -> Result<PlatformTag, BootstrapError> {
        let phase = BootstrapPhase::PlatformIdentification;
        self.begin_phase(phase)?;
        let started = Instant::now();

        self.config.validate()?;

        let signals = match (signals.platform_override(), &self.config.platform_override) {
            (None, Some(platform)) => signals.clone().with_override(Some(platform.clone())),
            _ => signals.clone(),
        };
        let platform = self.identifier.identify(&signals)?;

        self.platform = Some(platform.clone());
        self.transition(BootstrapState::PlatformIdentified)?;
        self.stats.identification_time = started.elapsed();
        self.end_phase(phase, self.stats.identification_time);

        Ok(platform)
    }

    fn scan(
        &mut self,
        roots: Vec<ClasspathRoot>,
        platform: &PlatformTag,
    ) -> Result<Vec<crate::components::ComponentDescriptor>, BootstrapError> {
        let phase = BootstrapPhase::Scan;
        self.begin_phase(phase)?;
        let started = Instant::now();

        let outcome = ClasspathScanner::new(self.catalog.clone())
            .scan(roots, platform)
            .finish(&self.config.required_capabilities)?;

        self.stats.roots_scanned = outcome.roots_scanned;
        self.stats.descriptors_discovered = outcome.descriptors.len();
        self.stats.scan_issues = outcome.issues.len();

        self.transition(BootstrapState::Scanned)?;
        self.stats.scan_time = started.elapsed();
        self.end_phase(phase, self.stats.scan_time);

        Ok(outcome.descriptors)
    }

    fn register(
        &mut self,
        platform: &PlatformTag,
        descriptors: Vec<crate::components::ComponentDescriptor>,
    ) -> Result<(BindingSet, ActivationPlan), BootstrapError> {
        let phase = BootstrapPhase::Registration;
        self.begin_phase(phase)?;
        let started = Instant::now();

        let registry = PlatformRegistry::new(self.config.required_capabilities.clone());
        let bindings = registry.bind(platform, descriptors)?;
        let plan = self.planner.plan(&bindings)?;

        self.stats.descriptors_filtered = bindings.filtered().len();
        self.stats.activation_levels = plan.levels().len();

        self.transition(BootstrapState::Registered)?;
        self.stats.registration_time = started.elapsed();
        self.end_phase(phase, self.stats.registration_time);

        Ok((bindings, plan))
    }

    /// Activate every planned component
    ///
    /// Returns the staging container holding whatever was activated, plus the
    /// first error if activation stopped early. Components register in plan
    /// order whether or not activation ran in parallel; a wave only starts
    /// once every earlier wave has finished.
    async fn activate(
        &mut self,
        platform: &PlatformTag,
        bindings: &BindingSet,
        plan: &ActivationPlan,
    ) -> (ContainerBuilder, Option<BootstrapError>) {
        let width = if self.config.parallel_activation {
            self.config.max_parallel_activations.max(1)
        } else {
            1
        };
        let waves = plan.waves(width);
        let grace = self.config.teardown_grace;

        let mut activated: HashMap<usize, Activated> = HashMap::new();
        let mut failure: Option<BootstrapError> = None;

        for wave in waves {
            let mut jobs = Vec::with_capacity(wave.len());
            for &index in &wave {
                let descriptor = &bindings.eligible()[index];
                let Some(factory) = self.catalog.factory(descriptor.factory()) else {
                    failure = Some(BootstrapError::activation_failure(
                        descriptor.id().clone(),
                        format!("factory '{}' is not registered", descriptor.factory()),
                    ));
                    break;
                };

                let mut context = ActivationContext::new(descriptor.id().clone(), platform.clone());
                for capability in descriptor.depends_on() {
                    let provider = bindings
                        .provider_index(capability)
                        .and_then(|provider| activated.get(&provider));
                    if let Some(provider) = provider {
                        context = context.with_dependency(capability.clone(), provider.handle.clone());
                    }
                }

                jobs.push((index, descriptor.id().clone(), factory, context));
            }

            if failure.is_some() {
                break;
            }

            let results = if jobs.len() == 1 {
                let mut results = Vec::with_capacity(1);
                for (index, id, factory, context) in jobs {
                    results.push((index, activate_component(id, factory, context, grace).await));
                }
                results
            } else {
                let handles: Vec<_> = jobs
                    .into_iter()
                    .map(|(index, id, factory, context)| {
                        let task_id = id.clone();
                        (
                            index,
                            id,
                            tokio::spawn(activate_component(task_id, factory, context, grace)),
                        )
                    })
                    .collect();

                let mut results = Vec::with_capacity(handles.len());
                for (index, id, handle) in handles {
                    let result = match handle.await {
                        Ok(result) => result,
                        Err(e) => Err(BootstrapError::activation_failure(
                            id,
                            format!("activation task aborted: {}", e),
                        )),
                    };
                    results.push((index, result));
                }
                results
            };

            for (index, result) in results {
                match result {
                    Ok(component) => {
                        activated.insert(index, component);
                    }
                    Err(error) => {
                        if failure.is_none() {
                            failure = Some(error);
                        }
                    }
                }
            }

            if failure.is_some() {
                break;
            }
        }

        let mut builder = ContainerBuilder::new(platform.clone());
        for &index in plan.order() {
            if let Some(component) = activated.remove(&index) {
                let descriptor = bindings.eligible()[index].clone();
                self.stats
                    .record_activation(descriptor.id().as_str(), component.duration);
                builder.push(descriptor, component.handle, component.activated_at, component.duration);
            }
        }

        (builder, failure)
    }

    /// Move to `Failed`, unwind activated components and build the report
    async fn fail(
        &mut self,
        phase: BootstrapPhase,
        error: BootstrapError,
        builder: Option<ContainerBuilder>,
    ) -> BootstrapFailure {
        if let Err(e) = self.transition(BootstrapState::Failed) {
            tracing::warn!(error = %e, "Could not record failed state");
        }

        let mut torn_down = Vec::new();
        if let Some(builder) = builder {
            if builder.len() > 0 {
                tracing::warn!(
                    components = builder.len(),
                    "Tearing down components activated before the failure"
                );
                let partial = builder.build();
                let report = partial.teardown(self.config.teardown_grace).await;
                torn_down = report.order.iter().map(ToString::to_string).collect();
            }
        }

        let report = FailureReport::from_error(self.run_id, phase, &error).with_torn_down(torn_down);
        for hook in &self.hooks {
            hook.on_failure(&report);
        }

        BootstrapFailure::new(report, error)
    }

    fn transition(&mut self, next: BootstrapState) -> Result<(), BootstrapError> {
        if !self.state.can_transition_to(next) {
            return Err(BootstrapError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }

        tracing::debug!(from = %self.state, to = %next, "Bootstrap state transition");
        self.history.push(StateTransition {
            from: self.state,
            to: next,
            at: Utc::now(),
        });
        self.state = next;
        Ok(())
    }

    fn begin_phase(&self, phase: BootstrapPhase) -> Result<(), BootstrapError> {
        for hook in &self.hooks {
            hook.before_phase(phase)
                .map_err(|e| BootstrapError::HookRejected {
                    phase,
                    message: format!("{}: {}", hook.name(), e),
                })?;
        }
        Ok(())
    }

    fn end_phase(&self, phase: BootstrapPhase, duration: Duration) {
        for hook in &self.hooks {
            hook.after_phase(phase, duration);
        }
    }
}

impl std::fmt::Debug for Bootstrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bootstrap")
            .field("run_id", &self.run_id)
            .field("state", &self.state)
            .field("platform", &self.platform)
            .field("hooks", &self.hooks.iter().map(|h| h.name()).collect::<Vec<_>>())
            .finish()
    }
}

/// Build, activate and time one component
///
/// A component whose activation fails is never registered; it still gets a
/// best-effort teardown, bounded by `grace`, so partially acquired resources
/// are released.
async fn activate_component(
    id: ComponentId,
    factory: ComponentFactory,
    context: ActivationContext,
    grace: Duration,
) -> Result<Activated, BootstrapError> {
    let started = Instant::now();
    tracing::debug!(component = %id, "Activating component");

    let handle = factory(&context).map_err(|e| BootstrapError::activation_failure(id.clone(), e))?;

    if let Err(e) = handle.component().activate(&context).await {
        match tokio::time::timeout(grace, handle.component().teardown()).await {
            Ok(Ok(())) => {}
            Ok(Err(teardown_error)) => {
                tracing::warn!(
                    component = %id,
                    error = %teardown_error,
                    "Teardown of component with failed activation also failed"
                );
            }
            Err(_) => {
                tracing::warn!(
                    component = %id,
                    grace_ms = grace.as_millis() as u64,
                    "Component with failed activation did not finish teardown within its grace period; skipping"
                );
            }
        }
        return Err(BootstrapError::activation_failure(id, e));
    }

    Ok(Activated {
        handle,
        activated_at: Utc::now(),
        duration: started.elapsed(),
    })
}
