//! Integration tests for the full bootstrap sequence
//!
//! Covers platform selection, capability binding, activation order, failure
//! unwinding and shutdown through the public API only.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use fairy_core::bootstrap::ActivationContext;
use fairy_core::components::{MemoryStorage, TracingLogger, LOGGING_FACTORY, MEMORY_STORAGE_FACTORY};
use fairy_core::{
    register_builtins, Bootstrap, BootstrapConfig, BootstrapError, BootstrapHook, BootstrapPhase,
    BootstrapState, BukkitHost, ApplicationHost, ClasspathRoot, Component, ComponentCatalog,
    ComponentError, ComponentManifest, FailureKind, ManifestEntry, PlatformIdentifier,
    PlatformSignals, PlatformTag,
};

type Events = Arc<Mutex<Vec<String>>>;

/// Component that records its lifecycle into a shared event log
struct Recorder {
    name: String,
    events: Events,
    fail_activation: bool,
    hang_teardown: bool,
}

#[async_trait]
impl Component for Recorder {
    async fn activate(&self, context: &ActivationContext) -> Result<(), ComponentError> {
        if self.fail_activation {
            return Err(format!("{} refused to start", self.name).into());
        }
        self.events.lock().unwrap().push(format!(
            "activate:{}:{}",
            self.name,
            context.dependency_count()
        ));
        Ok(())
    }

    async fn teardown(&self) -> Result<(), ComponentError> {
        self.events
            .lock()
            .unwrap()
            .push(format!("teardown:{}", self.name));
        if self.hang_teardown {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        Ok(())
    }
}

fn catalog(events: &Events, tokens: &[&str], failing: &[&str]) -> ComponentCatalog {
    catalog_with_hangs(events, tokens, failing, &[])
}

fn catalog_with_hangs(
    events: &Events,
    tokens: &[&str],
    failing: &[&str],
    hanging: &[&str],
) -> ComponentCatalog {
    let mut catalog = ComponentCatalog::new();
    register_builtins(&mut catalog);

    for token in tokens {
        let name = token.to_string();
        let events = events.clone();
        let fail_activation = failing.contains(token);
        let hang_teardown = hanging.contains(token);
        catalog.register(*token, move |_: &ActivationContext| {
            Ok(Recorder {
                name: name.clone(),
                events: events.clone(),
                fail_activation,
                hang_teardown,
            })
        });
    }

    catalog
}

fn events_with_prefix(events: &Events, prefix: &str) -> Vec<String> {
    events
        .lock()
        .unwrap()
        .iter()
        .filter(|e| e.starts_with(prefix))
        .cloned()
        .collect()
}

fn app_manifest() -> ComponentManifest {
    ComponentManifest::new()
        .with_entry(
            ManifestEntry::new("app.Logger")
                .with_factory(LOGGING_FACTORY)
                .with_capability("logging")
                .with_order(-10),
        )
        .with_entry(
            ManifestEntry::new("app.Storage")
                .with_factory(MEMORY_STORAGE_FACTORY)
                .with_capability("storage:memory"),
        )
        .with_entry(
            ManifestEntry::new("cache")
                .with_capability("storage:cache")
                .with_dependency("storage:memory")
                .with_order(-20),
        )
        .with_entry(ManifestEntry::new("web").with_capability("net:http").with_order(5))
        .with_entry(
            ManifestEntry::new("bukkit-commands")
                .with_capability("commands")
                .with_platform("bukkit"),
        )
}

fn app_roots() -> Vec<ClasspathRoot> {
    vec![ClasspathRoot::embedded("app", app_manifest())]
}

#[tokio::test]
async fn test_application_bootstrap_reaches_ready() {
    let events = Events::default();
    let mut bootstrap = Bootstrap::new(
        BootstrapConfig::testing().with_required("logging"),
        catalog(&events, &["cache", "web", "bukkit-commands"], &[]),
    );

    let container = bootstrap
        .launch(&ApplicationHost::new(), app_roots())
        .await
        .unwrap();

    assert_eq!(bootstrap.state(), BootstrapState::Ready);
    assert_eq!(bootstrap.platform(), Some(&PlatformTag::Application));
    assert_eq!(container.platform(), &PlatformTag::Application);

    let order: Vec<&str> = container.components().iter().map(|c| c.id().as_str()).collect();
    assert_eq!(order, vec!["app.Logger", "app.Storage", "cache", "web"]);
    assert_eq!(
        container.components().iter().map(|c| c.sequence()).collect::<Vec<_>>(),
        vec![0, 1, 2, 3]
    );

    assert!(container.get_as::<TracingLogger>("logging").is_ok());
    assert!(container.get_as::<MemoryStorage>("storage:memory").is_ok());
    assert!(container.get("commands").unwrap_err().is_lookup_miss());

    let storage: Vec<&str> = container
        .get_all("storage")
        .iter()
        .map(|c| c.id().as_str())
        .collect();
    assert_eq!(storage, vec!["app.Storage", "cache"]);

    // cache saw its storage dependency during activation
    assert_eq!(
        events_with_prefix(&events, "activate:"),
        vec!["activate:cache:1", "activate:web:0"]
    );

    let states: Vec<BootstrapState> = bootstrap.history().iter().map(|t| t.to).collect();
    assert_eq!(
        states,
        vec![
            BootstrapState::PlatformIdentified,
            BootstrapState::Scanned,
            BootstrapState::Registered,
            BootstrapState::Activating,
            BootstrapState::Ready,
        ]
    );

    let stats = bootstrap.stats();
    assert_eq!(stats.components_activated, 4);
    assert_eq!(stats.descriptors_filtered, 1);
    assert_eq!(stats.activation_levels, 2);
}

#[tokio::test]
async fn test_bukkit_host_activates_platform_components() {
    let events = Events::default();
    let mut bootstrap = Bootstrap::new(
        BootstrapConfig::testing(),
        catalog(&events, &["cache", "web", "bukkit-commands"], &[]),
    );

    let container = bootstrap
        .launch(&BukkitHost::embedded("Demo"), app_roots())
        .await
        .unwrap();

    assert_eq!(container.platform(), &PlatformTag::Bukkit);
    assert!(container.contains("commands"));
    assert_eq!(container.len(), 5);
}

#[tokio::test]
async fn test_capability_conflict_fails_before_activation() {
    let events = Events::default();
    let manifest = ComponentManifest::new()
        .with_entry(ManifestEntry::new("a").with_capability("logging").with_order(-100))
        .with_entry(ManifestEntry::new("b").with_capability("logging").with_order(100));

    let mut bootstrap = Bootstrap::new(BootstrapConfig::testing(), catalog(&events, &["a", "b"], &[]));
    let failure = bootstrap
        .run(vec![ClasspathRoot::embedded("app", manifest)], PlatformSignals::new())
        .await
        .unwrap_err();

    assert_eq!(failure.kind(), FailureKind::CapabilityConflict);
    assert_eq!(failure.phase(), BootstrapPhase::Registration);
    assert_eq!(bootstrap.state(), BootstrapState::Failed);
    assert!(bootstrap.container().is_none());
    assert!(events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_activation_failure_tears_down_in_reverse_order() {
    let events = Events::default();
    let manifest = ComponentManifest::new()
        .with_entry(ManifestEntry::new("first").with_order(1))
        .with_entry(ManifestEntry::new("second").with_order(2))
        .with_entry(ManifestEntry::new("broken").with_order(3))
        .with_entry(ManifestEntry::new("never").with_order(4));

    let mut bootstrap = Bootstrap::new(
        BootstrapConfig::testing(),
        catalog(&events, &["first", "second", "broken", "never"], &["broken"]),
    );
    let failure = bootstrap
        .run(vec![ClasspathRoot::embedded("app", manifest)], PlatformSignals::new())
        .await
        .unwrap_err();

    assert_eq!(failure.kind(), FailureKind::ActivationFailure);
    assert_eq!(failure.phase(), BootstrapPhase::Activation);
    assert_eq!(failure.report.component.as_deref(), Some("broken"));
    assert_eq!(failure.report.root_cause(), "broken refused to start");
    assert_eq!(failure.report.torn_down, vec!["second", "first"]);
    assert_eq!(bootstrap.state(), BootstrapState::Failed);

    // the failed component gets a best-effort teardown of its own
    assert_eq!(
        events_with_prefix(&events, "teardown:"),
        vec!["teardown:broken", "teardown:second", "teardown:first"]
    );
    assert!(!events.lock().unwrap().iter().any(|e| e.contains("never")));
}

#[tokio::test]
async fn test_missing_required_capability() {
    let events = Events::default();
    let manifest = ComponentManifest::new().with_entry(ManifestEntry::new("web").with_capability("net:http"));

    let mut bootstrap = Bootstrap::new(
        BootstrapConfig::testing().with_required("storage:db"),
        catalog(&events, &["web"], &[]),
    );
    let failure = bootstrap
        .run(vec![ClasspathRoot::embedded("app", manifest)], PlatformSignals::new())
        .await
        .unwrap_err();

    assert_eq!(failure.kind(), FailureKind::MissingCapability);
    match failure.error {
        BootstrapError::MissingCapability { capability, .. } => assert_eq!(capability.as_str(), "storage:db"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_dependency_cycle_detected_during_registration() {
    let events = Events::default();
    let manifest = ComponentManifest::new()
        .with_entry(ManifestEntry::new("a").with_capability("svc:a").with_dependency("svc:b"))
        .with_entry(ManifestEntry::new("b").with_capability("svc:b").with_dependency("svc:a"));

    let mut bootstrap = Bootstrap::new(BootstrapConfig::testing(), catalog(&events, &["a", "b"], &[]));
    let failure = bootstrap
        .run(vec![ClasspathRoot::embedded("app", manifest)], PlatformSignals::new())
        .await
        .unwrap_err();

    assert_eq!(failure.kind(), FailureKind::DependencyCycle);
    assert_eq!(failure.phase(), BootstrapPhase::Registration);
    assert!(events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_ambiguous_platform() {
    let events = Events::default();
    let identifier = PlatformIdentifier::new().with_detector(PlatformTag::Custom("folia".into()), "io.folia");

    let mut bootstrap = Bootstrap::new(BootstrapConfig::testing(), catalog(&events, &["web"], &[]))
        .with_identifier(identifier);
    let signals = PlatformSignals::new().with_markers(["org.bukkit.Bukkit", "io.folia"]);

    let failure = bootstrap.run(app_roots(), signals).await.unwrap_err();

    assert_eq!(failure.kind(), FailureKind::AmbiguousPlatform);
    assert_eq!(failure.phase(), BootstrapPhase::PlatformIdentification);
}

#[tokio::test]
async fn test_activation_order_is_deterministic() {
    let mut orders = Vec::new();

    for parallel in [false, false, true, true] {
        let events = Events::default();
        let mut bootstrap = Bootstrap::new(
            BootstrapConfig::testing().with_parallel_activation(parallel),
            catalog(&events, &["cache", "web", "bukkit-commands"], &[]),
        );
        let container = bootstrap.run(app_roots(), PlatformSignals::new()).await.unwrap();

        let registered: Vec<String> = container.components().iter().map(|c| c.id().to_string()).collect();
        if !parallel {
            // only the recorder components log; built-ins activate silently
            let activated: Vec<String> = events_with_prefix(&events, "activate:")
                .iter()
                .map(|e| e.split(':').nth(1).unwrap_or_default().to_string())
                .collect();
            let expected: Vec<String> = registered
                .iter()
                .filter(|id| activated.contains(id))
                .cloned()
                .collect();
            assert_eq!(activated, expected);
        }
        orders.push(registered);
    }

    assert!(orders.windows(2).all(|pair| pair[0] == pair[1]));
}

fn hinted_manifest() -> ComponentManifest {
    ComponentManifest::new()
        .with_entry(ManifestEntry::new("a").with_order(100))
        .with_entry(ManifestEntry::new("b").with_capability("svc:b"))
        .with_entry(ManifestEntry::new("c").with_order(1).with_dependency("svc:b"))
}

#[tokio::test]
async fn test_parallel_activation_respects_order_hints() {
    for width in [1, 8] {
        let events = Events::default();
        let mut bootstrap = Bootstrap::new(
            BootstrapConfig::testing()
                .with_parallel_activation(true)
                .with_max_parallel_activations(width),
            catalog(&events, &["a", "b", "c"], &[]),
        );
        let container = bootstrap
            .run(vec![ClasspathRoot::embedded("app", hinted_manifest())], PlatformSignals::new())
            .await
            .unwrap();

        let registered: Vec<&str> = container.components().iter().map(|c| c.id().as_str()).collect();
        assert_eq!(registered, vec!["b", "c", "a"]);

        // `a` has the highest hint, so it never starts ahead of `b`
        let activated = events_with_prefix(&events, "activate:");
        assert_eq!(activated[0], "activate:b:0");
        if width == 1 {
            assert_eq!(activated, vec!["activate:b:0", "activate:c:1", "activate:a:0"]);
        } else {
            assert_eq!(activated.len(), 3);
            assert!(activated.contains(&"activate:c:1".to_string()));
            assert!(activated.contains(&"activate:a:0".to_string()));
        }

        let report = bootstrap.shutdown().await.unwrap();
        let order: Vec<&str> = report.order.iter().map(|id| id.as_str()).collect();
        assert_eq!(order, vec!["a", "c", "b"]);
        assert_eq!(
            events_with_prefix(&events, "teardown:"),
            vec!["teardown:a", "teardown:c", "teardown:b"]
        );
    }
}

#[tokio::test]
async fn test_failure_inside_parallel_wave_unwinds_siblings() {
    let events = Events::default();
    let manifest = ComponentManifest::new()
        .with_entry(ManifestEntry::new("base").with_capability("svc:base"))
        .with_entry(ManifestEntry::new("left").with_order(1))
        .with_entry(ManifestEntry::new("broken").with_order(2))
        .with_entry(ManifestEntry::new("right").with_order(3))
        .with_entry(ManifestEntry::new("after").with_order(4).with_dependency("svc:base"));

    let mut bootstrap = Bootstrap::new(
        BootstrapConfig::testing()
            .with_parallel_activation(true)
            .with_max_parallel_activations(4),
        catalog(&events, &["base", "left", "broken", "right", "after"], &["broken"]),
    );
    let failure = bootstrap
        .run(vec![ClasspathRoot::embedded("app", manifest)], PlatformSignals::new())
        .await
        .unwrap_err();

    assert_eq!(failure.kind(), FailureKind::ActivationFailure);
    assert_eq!(failure.report.component.as_deref(), Some("broken"));
    assert_eq!(failure.report.torn_down, vec!["right", "left", "base"]);
    assert_eq!(bootstrap.state(), BootstrapState::Failed);

    let teardowns = events_with_prefix(&events, "teardown:");
    assert_eq!(teardowns.len(), 4);
    assert!(teardowns.contains(&"teardown:broken".to_string()));
    let siblings: Vec<&String> = teardowns.iter().filter(|e| *e != "teardown:broken").collect();
    assert_eq!(siblings, vec!["teardown:right", "teardown:left", "teardown:base"]);
    assert!(!events.lock().unwrap().iter().any(|e| e.contains("after")));
}

#[tokio::test]
async fn test_hung_teardown_during_unwinding_is_bounded() {
    let events = Events::default();
    let manifest = ComponentManifest::new()
        .with_entry(ManifestEntry::new("slow").with_order(1))
        .with_entry(ManifestEntry::new("stuck").with_order(2));

    let mut bootstrap = Bootstrap::new(
        BootstrapConfig::testing().with_teardown_grace(Duration::from_millis(50)),
        catalog_with_hangs(&events, &["slow", "stuck"], &["stuck"], &["slow", "stuck"]),
    );

    let failure = tokio::time::timeout(
        Duration::from_secs(3),
        bootstrap.run(vec![ClasspathRoot::embedded("app", manifest)], PlatformSignals::new()),
    )
    .await
    .expect("bootstrap must not wait on a hung teardown")
    .unwrap_err();

    assert_eq!(failure.kind(), FailureKind::ActivationFailure);
    assert_eq!(failure.report.component.as_deref(), Some("stuck"));
    assert_eq!(failure.report.torn_down, vec!["slow"]);
    assert_eq!(bootstrap.state(), BootstrapState::Failed);
    assert_eq!(
        events_with_prefix(&events, "teardown:"),
        vec!["teardown:stuck", "teardown:slow"]
    );
}

#[tokio::test]
async fn test_shutdown_is_reverse_and_idempotent() {
    let events = Events::default();
    let mut bootstrap = Bootstrap::new(
        BootstrapConfig::testing(),
        catalog(&events, &["cache", "web", "bukkit-commands"], &[]),
    );
    bootstrap.run(app_roots(), PlatformSignals::new()).await.unwrap();

    let report = bootstrap.shutdown().await.unwrap();
    let order: Vec<&str> = report.order.iter().map(|id| id.as_str()).collect();
    assert_eq!(order, vec!["web", "cache", "app.Storage", "app.Logger"]);
    assert!(report.is_clean());
    assert_eq!(bootstrap.state(), BootstrapState::Stopped);

    let again = bootstrap.shutdown().await.unwrap();
    assert!(again.is_empty());
    assert_eq!(events_with_prefix(&events, "teardown:").len(), 2);
}

#[tokio::test]
async fn test_run_only_once() {
    let events = Events::default();
    let mut bootstrap = Bootstrap::new(BootstrapConfig::testing(), catalog(&events, &["cache", "web"], &[]));
    bootstrap.run(app_roots(), PlatformSignals::new()).await.unwrap();

    let failure = bootstrap.run(app_roots(), PlatformSignals::new()).await.unwrap_err();

    assert_eq!(failure.kind(), FailureKind::AlreadyStarted);
    assert_eq!(bootstrap.state(), BootstrapState::Ready);
}

#[tokio::test]
async fn test_scan_failure_on_empty_classpath() {
    let dir = tempfile::tempdir().unwrap();
    let events = Events::default();
    let mut bootstrap = Bootstrap::new(BootstrapConfig::testing(), catalog(&events, &[], &[]));

    let failure = bootstrap
        .run(vec![ClasspathRoot::from_path(dir.path())], PlatformSignals::new())
        .await
        .unwrap_err();

    assert_eq!(failure.kind(), FailureKind::ScanFailure);
    assert_eq!(failure.phase(), BootstrapPhase::Scan);
}

#[tokio::test]
async fn test_bootstrap_from_manifest_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("plugins")).unwrap();
    std::fs::write(
        dir.path().join("plugins/fairy-components.yaml"),
        r#"
components:
  - id: app.Logger
    factory: fairy.logging
    provides: logging
  - id: web
    provides: [net:http]
    requires: logging
"#,
    )
    .unwrap();
    std::fs::write(dir.path().join("plugins/broken.components.json"), "{ not json").unwrap();

    let events = Events::default();
    let mut bootstrap = Bootstrap::new(
        BootstrapConfig::testing().with_required("logging"),
        catalog(&events, &["web"], &[]),
    );

    let container = bootstrap
        .run(vec![ClasspathRoot::from_path(dir.path())], PlatformSignals::new())
        .await
        .unwrap();

    assert_eq!(container.len(), 2);
    assert_eq!(bootstrap.stats().scan_issues, 1);
    assert_eq!(events_with_prefix(&events, "activate:"), vec!["activate:web:1"]);
}

/// Hook that vetoes a single phase
struct Veto(BootstrapPhase);

impl BootstrapHook for Veto {
    fn before_phase(&self, phase: BootstrapPhase) -> Result<(), ComponentError> {
        if phase == self.0 {
            Err("maintenance window".into())
        } else {
            Ok(())
        }
    }
}

#[tokio::test]
async fn test_hook_can_abort_before_readiness() {
    let events = Events::default();
    let mut bootstrap = Bootstrap::new(
        BootstrapConfig::testing().with_teardown_grace(Duration::from_millis(100)),
        catalog(&events, &["cache", "web"], &[]),
    )
    .with_hook(Veto(BootstrapPhase::Readiness));

    let failure = bootstrap.run(app_roots(), PlatformSignals::new()).await.unwrap_err();

    assert_eq!(failure.kind(), FailureKind::HookRejected);
    assert_eq!(failure.report.torn_down, vec!["web", "cache", "app.Storage", "app.Logger"]);
    assert_eq!(bootstrap.state(), BootstrapState::Failed);
    assert!(bootstrap.shutdown().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_builtin_manifest_provides_shared_services() {
    use fairy_core::components::{builtin_manifest, MetadataKey, MetadataStore};

    let mut catalog = ComponentCatalog::new();
    register_builtins(&mut catalog);

    let mut bootstrap = Bootstrap::new(
        BootstrapConfig::testing()
            .with_required("logging")
            .with_required("metadata"),
        catalog,
    );
    let container = bootstrap
        .run(
            vec![ClasspathRoot::embedded("fairy", builtin_manifest())],
            PlatformSignals::new(),
        )
        .await
        .unwrap();

    let metadata = container.get_as::<MetadataStore>("metadata").unwrap();
    let key = MetadataKey::<u32>::new("players");
    metadata.put(&key, 12).unwrap();
    assert_eq!(metadata.get(&key), Some(12));

    assert_eq!(container.components()[0].id().as_str(), "fairy.Logging");
    assert_eq!(container.get_all("storage").len(), 1);
}
