mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use fairy_core::bootstrap::BootstrapHook;
use fairy_core::components::builtin_manifest;
use fairy_core::{
    register_builtins, ApplicationHost, Bootstrap, BootstrapConfig, BukkitHost, ClasspathRoot,
    ComponentCatalog, HostAdapter, PlatformSignals, PlatformTag,
};

use logging::{init_logging, LoggingConfig};

#[derive(Parser, Debug)]
#[command(name = "fairy")]
#[command(about = "Bootstrap a Fairy host from its classpath", version)]
struct Cli {
    /// Classpath roots: directories or manifest files (defaults to the current directory)
    #[arg(long = "root", value_name = "PATH")]
    roots: Vec<PathBuf>,

    /// Bootstrap configuration file (YAML)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Host process the launcher runs as
    #[arg(long, value_enum, default_value_t = HostKind::Application)]
    host: HostKind,

    /// Plugin name reported by the Bukkit host
    #[arg(long, default_value = "fairy")]
    plugin: String,

    /// Treat the Bukkit host as embedded in a running server instead of detecting plugin.yml
    #[arg(long)]
    embedded: bool,

    /// Force the active platform, bypassing detection
    #[arg(long, value_name = "TAG")]
    platform: Option<String>,

    /// Additional host markers to report (e.g. org.bukkit.Bukkit)
    #[arg(long = "marker", value_name = "MARKER")]
    markers: Vec<String>,

    /// Capability that must be bound before the host is ready (repeatable)
    #[arg(long = "require", value_name = "CAPABILITY")]
    required: Vec<String>,

    /// Add the built-in logging, metadata and storage components to the classpath
    #[arg(long)]
    builtins: bool,

    /// Activate independent components concurrently
    #[arg(long)]
    parallel: bool,

    /// Print the failure report as JSON
    #[arg(long)]
    json: bool,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    /// Emit multi-line human-readable logs
    #[arg(long, conflicts_with = "log_json")]
    log_pretty: bool,

    /// Log level, overriding the configuration
    #[arg(long)]
    log_level: Option<String>,

    /// Log filter directive (e.g. fairy_core=debug,warn), overriding the level
    #[arg(long, value_name = "DIRECTIVE")]
    log_filter: Option<String>,

    /// Shut down as soon as the host is ready instead of waiting for Ctrl-C
    #[arg(long)]
    once: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum HostKind {
    Application,
    Bukkit,
}

/// Host adapter that adds markers given on the command line
struct LauncherHost {
    inner: Box<dyn HostAdapter>,
    markers: Vec<String>,
}

impl HostAdapter for LauncherHost {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn platform_signals(&self, roots: &[ClasspathRoot]) -> PlatformSignals {
        self.inner
            .platform_signals(roots)
            .with_markers(self.markers.iter().cloned())
    }

    fn hooks(&self) -> Vec<Box<dyn BootstrapHook>> {
        self.inner.hooks()
    }
}

impl Cli {
    fn bootstrap_config(&self) -> anyhow::Result<BootstrapConfig> {
        let mut config = BootstrapConfig::load(self.config.as_deref())?;

        if let Some(platform) = &self.platform {
            config = config.with_platform_override(platform.parse::<PlatformTag>()?);
        }
        for capability in &self.required {
            config = config.with_required(capability.as_str());
        }
        if self.parallel {
            config = config.with_parallel_activation(true);
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.to_lowercase();
        }

        config.validate()?;
        Ok(config)
    }

    fn logging_config(&self, config: &BootstrapConfig) -> LoggingConfig {
        LoggingConfig::new(config.log_level.clone())
            .json(self.log_json)
            .pretty(self.log_pretty)
            .with_filter(self.log_filter.clone())
            .with_global_field("launcher_version", env!("CARGO_PKG_VERSION"))
            .with_global_field("framework_version", fairy_core::version())
    }

    fn host(&self) -> LauncherHost {
        let inner: Box<dyn HostAdapter> = match self.host {
            HostKind::Application => Box::new(ApplicationHost::new()),
            HostKind::Bukkit if self.embedded => Box::new(BukkitHost::embedded(self.plugin.as_str())),
            HostKind::Bukkit => Box::new(BukkitHost::detect(self.plugin.as_str())),
        };

        LauncherHost {
            inner,
            markers: self.markers.clone(),
        }
    }

    fn classpath(&self) -> anyhow::Result<Vec<ClasspathRoot>> {
        let mut roots = Vec::new();
        if self.builtins {
            roots.push(ClasspathRoot::embedded("fairy", builtin_manifest()));
        }
        if self.roots.is_empty() {
            roots.push(ClasspathRoot::from_path(std::env::current_dir()?));
        } else {
            roots.extend(self.roots.iter().cloned().map(ClasspathRoot::from_path));
        }
        Ok(roots)
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = cli.bootstrap_config()?;

    init_logging(cli.logging_config(&config))?;

    let mut catalog = ComponentCatalog::new();
    register_builtins(&mut catalog);

    let host = cli.host();
    let roots = cli.classpath()?;
    let mut bootstrap = Bootstrap::new(config, catalog);

    let container = match bootstrap.launch(&host, roots).await {
        Ok(container) => container,
        Err(failure) => {
            if cli.json {
                println!("{}", failure.report.to_json()?);
            } else {
                print!("{}", failure.report);
            }
            return Ok(ExitCode::FAILURE);
        }
    };

    tracing::info!("{}", bootstrap.stats());
    for capability in container.capabilities() {
        tracing::debug!(capability = %capability, "Capability bound");
    }

    if !cli.once {
        tracing::info!("Host ready; press Ctrl-C to shut down");
        tokio::signal::ctrl_c().await?;
    }

    let report = bootstrap.shutdown().await?;
    if report.is_clean() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("fairy: {:#}", e);
            ExitCode::from(2)
        }
    }
}
