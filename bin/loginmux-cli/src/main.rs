//! loginmux CLI - configuration check and login diagnostics
//!
//! Loads a deployment config, registers its providers and either prints the
//! resulting provider lists or runs a single login through the dispatcher.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use loginmux_auth::{
    AuthConfig, AuthDispatcher, AuthErrorKind, ProviderCatalog, ProviderRegistry,
};
use std::process::exit;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const EXIT_DENIED: i32 = 1;
const EXIT_SYSTEM_ERROR: i32 = 2;
const EXIT_CONFIG_ERROR: i32 = 3;

#[derive(Parser, Debug)]
#[command(name = "loginmux-cli")]
#[command(about = "loginmux authentication diagnostics")]
#[command(version)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "/etc/loginmux/auth.toml")]
    config: String,

    /// Log level (overrides the config file)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate the config and list provider order per database
    Check,
    /// Run one login attempt through the dispatcher
    Login {
        /// Database identifier
        #[arg(short, long)]
        database: String,
        /// User name
        #[arg(short, long)]
        user: String,
        /// Password
        #[arg(short, long, env = "LOGINMUX_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = match AuthConfig::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config file {}: {}", args.config, e);
            exit(EXIT_CONFIG_ERROR);
        }
    };

    let log_level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Config file: {}", args.config);

    // Hosts embedding the dispatcher register their external factories here
    let catalog = ProviderCatalog::new();
    let registry = Arc::new(ProviderRegistry::new());
    if let Err(e) = registry.load_config(&config, &catalog) {
        error!("Failed to register providers: {}", e);
        exit(EXIT_CONFIG_ERROR);
    }

    match args.command {
        Commands::Check => check(&config, &registry),
        Commands::Login {
            database,
            user,
            password,
        } => login(&AuthDispatcher::new(registry), &database, &user, &password),
    }
}

fn check(config: &AuthConfig, registry: &ProviderRegistry) -> Result<()> {
    for database in registry.databases() {
        println!("{database}");

        let declared = config
            .databases
            .get(&database)
            .context("registered database missing from config")?;
        if declared.providers.is_empty() {
            println!("  (no providers: logins fail as unconfigured)");
        }
        for (position, provider) in declared.providers.iter().enumerate() {
            println!("  {}. {} ({})", position + 1, provider.name(), provider.kind());
        }
    }
    Ok(())
}

fn login(dispatcher: &AuthDispatcher, database: &str, user: &str, password: &str) -> Result<()> {
    match dispatcher.authenticate(database, user, password) {
        Ok(grant) => {
            println!("granted: {grant}");
            Ok(())
        }
        Err(e) => {
            println!("{}", e.host_message());
            eprintln!("{e}");
            exit(match e.kind() {
                AuthErrorKind::Denied => EXIT_DENIED,
                AuthErrorKind::SystemError => EXIT_SYSTEM_ERROR,
                AuthErrorKind::Configuration => EXIT_CONFIG_ERROR,
            });
        }
    }
}
