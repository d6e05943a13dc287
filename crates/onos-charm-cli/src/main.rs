//! ONOS operator charm (onos-charm)

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use onos_charm::settings::DEFAULT_SETTINGS_PATH;
use onos_charm::{CharmContext, CharmSettings, HookTools};
use onos_charm_cli::commands::{
    report_failure, ActionCommand, CatalogCommand, GenerateSettingsCommand, HookCommand, StatusCommand,
};
use onos_charm_cli::ConfigSource;
use onos_client::Credentials;
use onos_shared_types::onos::ADMIN_USERNAME;
use onos_shared_types::CharmConfig;

#[derive(Parser)]
#[command(name = "onos-charm")]
#[command(about = "Operator charm for the ONOS SDN controller")]
#[command(version)]
#[command(long_about = "
Operator charm for the ONOS SDN controller

Handles one Juju event or action per invocation: actions become calls to the
ONOS REST API or service signals, configuration changes are reconciled into
the pebble layer, Karaf files and ingress relation data.

Examples:
  onos-charm config-changed                          # Reconcile the current config
  onos-charm pebble-ready                            # Workload container came up
  onos-charm action activate-app name=org.onosproject.acl
  onos-charm action add-user username=bob password=x group=admingroup
  onos-charm list-actions                            # Show the action catalog
  onos-charm status --check-api                      # Show recorded state
  onos-charm --juju-config config.json config-changed
  onos-charm generate-settings -o settings.toml
")]
struct Cli {
    /// Settings file
    #[arg(short, long, global = true, default_value = DEFAULT_SETTINGS_PATH)]
    settings: PathBuf,

    /// Read charm options from this JSON file instead of config-get
    #[arg(short, long, global = true)]
    juju_config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short = 'V', long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an action
    Action {
        /// Action name, e.g. activate-app
        name: String,

        /// Parameters as key=value
        params: Vec<String>,
    },

    /// Handle the config-changed event
    ConfigChanged,

    /// Handle the pebble-ready event of the ONOS container
    PebbleReady,

    /// List the actions and their parameters
    ListActions,

    /// Show the recorded charm state
    Status {
        /// Also check that the ONOS API answers
        #[arg(long)]
        check_api: bool,
    },

    /// Write the default settings
    GenerateSettings {
        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn load_settings(path: &Path) -> Result<CharmSettings> {
    CharmSettings::load(Some(path))
        .with_context(|| format!("Failed to load settings from {}", path.display()))
}

fn config_source(cli_path: Option<PathBuf>, settings: &CharmSettings) -> ConfigSource {
    match cli_path {
        Some(path) => ConfigSource::File(path),
        None => ConfigSource::HookTools(host_tools(settings)),
    }
}

fn host_tools(settings: &CharmSettings) -> HookTools {
    HookTools::new(settings.hook_tools_dir.clone(), settings.command_timeout())
}

async fn bootstrap(settings: CharmSettings, config: CharmConfig) -> Result<CharmContext> {
    CharmContext::bootstrap(settings, config)
        .await
        .context("Failed to initialise charm context")
}

async fn action_context(cli_path: Option<PathBuf>, settings: CharmSettings) -> Result<CharmContext> {
    let config = config_source(cli_path, &settings).load().await??;
    bootstrap(settings, config).await
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Action { name, params } => {
            let settings = load_settings(&cli.settings)?;
            let reporter = settings.report_to_host.then(|| host_tools(&settings));
            let context = match action_context(cli.juju_config, settings).await {
                Ok(context) => context,
                Err(err) => {
                    report_failure(reporter.as_ref(), &err).await;
                    return Err(err);
                }
            };
            ActionCommand::new(context, reporter)
                .execute(&name, &params)
                .await
                .map(|_| ())
        }

        Commands::ConfigChanged => {
            let settings = load_settings(&cli.settings)?;
            let config = config_source(cli.juju_config, &settings).load().await?;
            let context = bootstrap(settings, config.clone().unwrap_or_default()).await?;
            HookCommand::new(context)
                .config_changed(config)
                .await
                .map(|_| ())
        }

        Commands::PebbleReady => {
            let settings = load_settings(&cli.settings)?;
            let config = config_source(cli.juju_config, &settings).load().await?;
            let context = bootstrap(settings, config.clone().unwrap_or_default()).await?;
            HookCommand::new(context)
                .pebble_ready(config)
                .await
                .map(|_| ())
        }

        Commands::ListActions => CatalogCommand::new().execute().map(|_| ()),

        Commands::Status { check_api } => {
            let settings = load_settings(&cli.settings)?;
            let credentials = if check_api {
                let config = config_source(cli.juju_config, &settings)
                    .load()
                    .await??;
                config
                    .admin_password()
                    .ok()
                    .map(|password| Credentials::new(ADMIN_USERNAME, password))
            } else {
                None
            };
            StatusCommand::new(settings, credentials)
                .execute(check_api)
                .await
                .map(|_| ())
        }

        Commands::GenerateSettings { output } => GenerateSettingsCommand::new()
            .execute(output.as_deref())
            .map(|_| ()),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let quiet = cli.quiet;
    let show_chain = cli.verbose || cli.debug;

    // Handle errors with appropriate exit codes
    match run(cli).await {
        Ok(()) => {
            if !quiet {
                log::info!("Command completed successfully");
            }
            std::process::exit(0);
        }
        Err(e) => {
            if !quiet {
                eprintln!("Error: {}", e);

                // Print error chain if in verbose mode
                if show_chain {
                    for cause in e.chain().skip(1) {
                        eprintln!("  Caused by: {}", cause);
                    }
                }
            }
            std::process::exit(1);
        }
    }
}
