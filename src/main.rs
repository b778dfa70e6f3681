use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::bail;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use snowline::access;
use snowline::config::ServerConfig;
use snowline::error::Error;
use snowline::server::{AppState, create_router};
use snowline::store::{SqliteStore, Store};
use snowline::types::ReportKey;

#[derive(Parser)]
#[command(name = "snowline")]
#[command(about = "A career-growth report server", long_about = None)]
struct Cli {
    /// Data directory for the database
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(long, short)]
        port: Option<u16>,

        /// Request header carrying the authenticated username
        #[arg(long)]
        identity_header: Option<String>,

        /// Let admins grant and revoke access on any report
        #[arg(long)]
        admins_manage_access: bool,
    },

    /// Create the data directory and database
    Init,

    /// Manage users
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Manage the admin role
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Manage and inspect report access
    Access {
        #[command(subcommand)]
        command: AccessCommands,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Create a user
    Create {
        username: String,

        #[arg(long)]
        email: Option<String>,
    },
    /// List all usernames
    List,
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Grant the admin role, creating the user if needed
    Add { username: String },
    /// Revoke the admin role
    Revoke { username: String },
    /// List admins
    List,
}

#[derive(Subcommand)]
enum AccessCommands {
    /// Grant a user access to a report
    Grant { report_key: String, username: String },
    /// Revoke a user's grant on a report
    Revoke { report_key: String, username: String },
    /// Print whether a user may access a report
    Check { report_key: String, username: String },
    /// List the reports a user may access
    Keys { username: String },
    /// List the users who may access a report
    Users { report_key: String },
}

fn load_config(cli: &Cli) -> anyhow::Result<ServerConfig> {
    let mut config = match &cli.config {
        Some(path) => ServerConfig::from_file(path)?,
        None => ServerConfig::default(),
    };
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }
    Ok(config)
}

fn open_store(config: &ServerConfig) -> anyhow::Result<SqliteStore> {
    fs::create_dir_all(&config.data_dir)?;
    let store = SqliteStore::new(config.db_path())?;
    store.initialize()?;
    Ok(store)
}

fn run_user(store: &SqliteStore, command: UserCommands) -> anyhow::Result<()> {
    match command {
        UserCommands::Create { username, email } => {
            match store.create_user(&username, email.as_deref()) {
                Ok(username) => println!("Created user '{username}'"),
                Err(Error::AlreadyExists) => bail!("User '{}' already exists", username.trim()),
                Err(e) => return Err(e.into()),
            }
        }
        UserCommands::List => {
            for username in store.list_all_usernames()? {
                println!("{username}");
            }
        }
    }
    Ok(())
}

fn run_admin(store: &SqliteStore, command: AdminCommands) -> anyhow::Result<()> {
    match command {
        AdminCommands::Add { username } => {
            let username = store.add_admin(&username)?;
            println!("Granted admin role to '{username}'");
        }
        AdminCommands::Revoke { username } => {
            if store.revoke_admin(&username)? {
                println!("Revoked admin role from '{}'", username.trim());
            } else {
                println!("'{}' is not an admin", username.trim());
            }
        }
        AdminCommands::List => {
            for username in store.list_admins()? {
                println!("{username}");
            }
        }
    }
    Ok(())
}

fn run_access(store: &SqliteStore, command: AccessCommands) -> anyhow::Result<()> {
    match command {
        AccessCommands::Grant {
            report_key,
            username,
        } => {
            if !access::grant_access(store, &report_key, &username)? {
                bail!(
                    "Nothing granted: '{}' is not a known user or the report key is blank",
                    username.trim()
                );
            }
            println!(
                "Granted '{}' access to report '{}'",
                username.trim(),
                ReportKey::new(&report_key).map(ReportKey::into_string).unwrap_or_default()
            );
        }
        AccessCommands::Revoke {
            report_key,
            username,
        } => match access::revoke_access(store, &report_key, &username)? {
            Some(revocation) if revocation.removed => println!(
                "Revoked '{}' access to report '{}'",
                revocation.username, revocation.report_key
            ),
            Some(revocation) => println!(
                "'{}' had no grant on report '{}'",
                revocation.username, revocation.report_key
            ),
            None => bail!("Report key and username cannot be empty"),
        },
        AccessCommands::Check {
            report_key,
            username,
        } => {
            let allowed = access::is_allowed(store, &report_key, &username)?;
            println!("{}", if allowed { "allowed" } else { "denied" });
        }
        AccessCommands::Keys { username } => {
            for key in access::list_accessible_report_keys(store, &username)? {
                println!("{key}");
            }
        }
        AccessCommands::Users { report_key } => {
            for username in access::list_authorized_users(store, &report_key)? {
                println!("{username}");
            }
        }
    }
    Ok(())
}

async fn run_serve(store: SqliteStore, config: ServerConfig) -> anyhow::Result<()> {
    config.validate()?;

    for username in &config.bootstrap_admins {
        let username = store.add_admin(username)?;
        info!("Bootstrapped admin '{}'", username);
    }

    if store.list_admins()?.is_empty() {
        tracing::warn!("No admins configured. Run 'snowline admin add <username>' to add one.");
    }

    let state = Arc::new(AppState::new(Arc::new(store), &config)?);
    let app = create_router(state);
    let addr = config.socket_addr()?;

    info!(
        "Starting server on {} (identity header: {}, admins manage access: {})",
        addr, config.identity_header, config.admins_manage_access
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("snowline=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = load_config(&cli)?;

    match cli.command {
        Commands::Serve {
            host,
            port,
            identity_header,
            admins_manage_access,
        } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(identity_header) = identity_header {
                config.identity_header = identity_header;
            }
            if admins_manage_access {
                config.admins_manage_access = true;
            }

            let store = open_store(&config)?;
            run_serve(store, config).await?;
        }
        Commands::Init => {
            open_store(&config)?;
            println!("Initialized database at {}", config.db_path().display());
        }
        Commands::User { command } => run_user(&open_store(&config)?, command)?,
        Commands::Admin { command } => run_admin(&open_store(&config)?, command)?,
        Commands::Access { command } => run_access(&open_store(&config)?, command)?,
    }

    Ok(())
}
