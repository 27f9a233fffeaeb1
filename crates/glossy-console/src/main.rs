//! `glossy-admin` command-line console
//!
//! Signs operators in against the order-management API and exposes the
//! dashboard, order and user screens as subcommands.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

use clap::{Parser, Subcommand, ValueEnum};
use glossy_client::{ApiClient, ClientError, FileCredentialStore, Session};
use glossy_console::{Console, ConsoleError, Route, ScreenError, render};
use glossy_core::types::{LoginRequest, OrderFilter, ProfileUpdate, RegisterRequest, UserFilter};
use glossy_core::{Config, OrderStatus, PaymentStatus, Role};
use serde::Serialize;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

type Result<T> = std::result::Result<T, ConsoleError>;

/// Command line interface for the admin console
#[derive(Parser)]
#[command(
    name = "glossy-admin",
    version = env!("CARGO_PKG_VERSION"),
    about = "Administrative console for the Polaroid Glossy order-management API",
    long_about = "Sign in, browse and update orders, manage user roles and read the sales dashboard of a Polaroid Glossy shop from the terminal."
)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Log format (json, pretty)
    #[arg(long)]
    log_format: Option<String>,

    /// Enable structured JSON logging
    #[arg(long)]
    json: bool,

    /// Output format for records
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,

    /// Subcommand
    #[command(subcommand)]
    command: Commands,
}

/// How records are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Aligned text
    Table,
    /// Pretty-printed JSON
    Json,
}

/// Available subcommands
#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the credential
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Account password (read from stdin when omitted)
        #[arg(long, env = "GLOSSY_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Create an account and sign in as it
    Register {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Contact phone
        #[arg(long)]
        phone: Option<String>,

        /// Account password (read from stdin when omitted)
        #[arg(long, env = "GLOSSY_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Forget the stored credential
    Logout,

    /// Show the signed-in account
    Whoami,

    /// Update the signed-in account's name or phone
    Profile {
        /// New display name
        #[arg(long)]
        name: Option<String>,

        /// New contact phone
        #[arg(long)]
        phone: Option<String>,
    },

    /// Show the navigation entries available to your role
    Menu,

    /// Show the statistics dashboard
    Dashboard,

    /// Browse and update orders
    Orders {
        /// Order subcommand
        #[command(subcommand)]
        action: OrderCommands,
    },

    /// Browse users and change roles
    Users {
        /// User subcommand
        #[command(subcommand)]
        action: UserCommands,
    },

    /// Inspect configuration
    Config {
        /// Show resolved configuration
        #[arg(short, long)]
        show: bool,

        /// Validate configuration
        #[arg(short, long)]
        validate: bool,
    },
}

/// Order commands
#[derive(Subcommand)]
enum OrderCommands {
    /// List one page of orders
    List {
        /// Zero-based page index
        #[arg(short, long, default_value_t = 0)]
        page: u32,

        /// Only orders in this status
        #[arg(short, long)]
        status: Option<OrderStatus>,

        /// Only orders with this payment status
        #[arg(long)]
        payment_status: Option<PaymentStatus>,

        /// Only orders shipping to this state
        #[arg(long)]
        state: Option<String>,
    },

    /// Show one order
    Show {
        /// Order identifier
        id: Uuid,
    },

    /// Change an order's status
    SetStatus {
        /// Order identifier
        id: Uuid,

        /// New status
        status: OrderStatus,

        /// Message recorded in the status history
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Set an order's tracking number
    SetTracking {
        /// Order identifier
        id: Uuid,

        /// Courier tracking number
        tracking_number: String,
    },

    /// Replace an order's internal notes
    AddNotes {
        /// Order identifier
        id: Uuid,

        /// Notes text
        notes: String,
    },
}

/// User commands
#[derive(Subcommand)]
enum UserCommands {
    /// List one page of users
    List {
        /// Zero-based page index
        #[arg(short, long, default_value_t = 0)]
        page: u32,

        /// Only accounts with this role
        #[arg(short, long)]
        role: Option<Role>,

        /// Search name and email
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Show one user
    Show {
        /// User identifier
        id: Uuid,
    },

    /// Change a user's role
    SetRole {
        /// User identifier
        id: Uuid,

        /// New role
        role: Role,
    },
}

/// Main entry point for the admin console
///
/// # Errors
///
/// Returns error if configuration cannot be loaded or the command fails
#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (for development convenience)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut config = Config::load_from(cli.config.as_deref())?;
    if let Some(level) = &cli.log_level {
        config.logging.level.clone_from(level);
    }
    if cli.json {
        config.logging.format = "json".to_string();
    } else if let Some(format) = &cli.log_format {
        config.logging.format.clone_from(format);
    }
    glossy_core::init_logging(&config.logging.level, &config.logging.format)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        base_url = %config.api.base_url,
        "Glossy admin console starting"
    );

    if let Commands::Config { show, validate } = cli.command {
        return handle_config_command(&config, show, validate);
    }

    let mut console = build_console(&config)?;
    let output = cli.output;

    let result = run(&mut console, cli.command, output).await;
    if let Err(ConsoleError::Screen(e)) = &result
        && e.requires_login()
    {
        warn!(error = %e, "Signed out");
        eprintln!("Session ended: {e}. Sign in again with `glossy-admin login`.");
        eprintln!("-> {}", console.route());
    }
    result
}

/// Wire the credential store, HTTP client and console together
fn build_console(config: &Config) -> Result<Console> {
    let store = FileCredentialStore::new(config.session.resolved_credentials_path());
    let session = Arc::new(Session::new(Arc::new(store)));
    let client = ApiClient::from_config(&config.api, session)?;
    Ok(Console::new(Arc::new(client), config.api.page_size))
}

/// Execute one command
async fn run(console: &mut Console, command: Commands, output: OutputFormat) -> Result<()> {
    let needs_session = !matches!(
        command,
        Commands::Login { .. }
            | Commands::Register { .. }
            | Commands::Logout
            | Commands::Config { .. }
    );
    if needs_session {
        signed_in(console).await?;
    }

    match command {
        Commands::Login { email, password } => {
            let password = password_or_prompt(password)?;
            let user = console.login(&LoginRequest { email, password }).await?;
            println!("Signed in as {} ({})", user.name, user.role);
            Ok(())
        }
        Commands::Register {
            email,
            name,
            phone,
            password,
        } => {
            let password = password_or_prompt(password)?;
            let request = RegisterRequest {
                email,
                password,
                name,
                phone,
            };
            let user = console.register(&request).await?;
            println!("Registered and signed in as {} ({})", user.name, user.role);
            Ok(())
        }
        Commands::Logout => {
            console.logout();
            println!("Signed out.");
            Ok(())
        }
        Commands::Whoami => {
            let result = console.api().me().await.map_err(Into::into);
            let user = console.observe(result)?;
            print_record(output, &user, render::user_detail)
        }
        Commands::Profile { name, phone } => {
            let update = ProfileUpdate { name, phone };
            let result = console.api().update_profile(&update).await.map_err(Into::into);
            let user = console.observe(result)?;
            print_record(output, &user, render::user_detail)
        }
        Commands::Menu => {
            let items = console.menu();
            match output {
                OutputFormat::Json => print_json(&items),
                OutputFormat::Table => {
                    print!("{}", render::menu(&items, Some(console.route())));
                    Ok(())
                }
            }
        }
        Commands::Dashboard => {
            console.open(Route::Dashboard);
            let mut screen = console.dashboard();
            let result = screen.refresh().await;
            console.observe(result)?;
            print!(
                "{}",
                render::dashboard(&screen.cards(), screen.orders_by_status(), screen.top_sizes())
            );
            report_diagnostic(screen.diagnostic());
            Ok(())
        }
        Commands::Orders { action } => handle_order_command(console, action, output).await,
        Commands::Users { action } => handle_user_command(console, action, output).await,
        // Answered before the console is built
        Commands::Config { .. } => Ok(()),
    }
}

/// Resume the stored session, failing when there is none
async fn signed_in(console: &mut Console) -> Result<()> {
    let route = console.start().await?;
    if route == Route::Login {
        return Err(ScreenError::Client(ClientError::NotAuthenticated).into());
    }
    Ok(())
}

/// Handle order commands
async fn handle_order_command(
    console: &mut Console,
    action: OrderCommands,
    output: OutputFormat,
) -> Result<()> {
    if console.open(Route::Orders) != Route::Orders {
        return Err(ScreenError::Denied(glossy_core::Action::ViewOrdersMenu).into());
    }
    let mut screen = console.orders();

    match action {
        OrderCommands::List {
            page,
            status,
            payment_status,
            state,
        } => {
            let filter = OrderFilter {
                status,
                payment_status,
                customer_state: state,
            };
            let result = screen.query(filter, page).await;
            console.observe(result)?;

            match output {
                OutputFormat::Json => print_json(screen.orders()),
                OutputFormat::Table => {
                    print!("{}", render::orders_table(screen.orders()));
                    println!("{}", render::pager(screen.cursor(), screen.total_elements()));
                    Ok(())
                }
            }
        }
        OrderCommands::Show { id } => {
            let result = screen.select(id).await.cloned();
            let order = console.observe(result)?;
            print_record(output, &order, render::order_detail)
        }
        OrderCommands::SetStatus {
            id,
            status,
            message,
        } => {
            let result = screen.select(id).await.map(|_| ());
            console.observe(result)?;
            let result = screen.update_status(status, message).await.cloned();
            let order = console.observe(result)?;
            report_diagnostic(screen.diagnostic());
            print_record(output, &order, render::order_detail)
        }
        OrderCommands::SetTracking {
            id,
            tracking_number,
        } => {
            let result = screen.select(id).await.map(|_| ());
            console.observe(result)?;
            let result = screen.update_tracking(&tracking_number).await.cloned();
            let order = console.observe(result)?;
            report_diagnostic(screen.diagnostic());
            print_record(output, &order, render::order_detail)
        }
        OrderCommands::AddNotes { id, notes } => {
            let result = screen.select(id).await.map(|_| ());
            console.observe(result)?;
            let result = screen.update_notes(&notes).await.cloned();
            let order = console.observe(result)?;
            report_diagnostic(screen.diagnostic());
            print_record(output, &order, render::order_detail)
        }
    }
}

/// Handle user commands
async fn handle_user_command(
    console: &mut Console,
    action: UserCommands,
    output: OutputFormat,
) -> Result<()> {
    if console.open(Route::Users) != Route::Users {
        return Err(ScreenError::Denied(glossy_core::Action::ViewUsersMenu).into());
    }
    let mut screen = console.users();

    match action {
        UserCommands::List { page, role, search } => {
            let result = screen.query(UserFilter { role, search }, page).await;
            console.observe(result)?;

            match output {
                OutputFormat::Json => print_json(screen.users()),
                OutputFormat::Table => {
                    print!("{}", render::users_table(screen.users()));
                    println!("{}", render::pager(screen.cursor(), screen.total_elements()));
                    Ok(())
                }
            }
        }
        UserCommands::Show { id } => {
            let result = screen.select(id).await.cloned();
            let user = console.observe(result)?;
            print_record(output, &user, render::user_detail)
        }
        UserCommands::SetRole { id, role } => {
            let result = screen.select(id).await.map(|_| ());
            console.observe(result)?;
            let result = screen.update_role(role).await.cloned();
            let user = console.observe(result)?;
            report_diagnostic(screen.diagnostic());
            print_record(output, &user, render::user_detail)
        }
    }
}

fn report_diagnostic(diagnostic: Option<&str>) {
    if let Some(diagnostic) = diagnostic {
        eprintln!("warning: {diagnostic}");
    }
}

fn print_record<T: Serialize>(
    output: OutputFormat,
    record: &T,
    text: fn(&T) -> String,
) -> Result<()> {
    match output {
        OutputFormat::Json => print_json(record),
        OutputFormat::Table => {
            print!("{}", text(record));
            Ok(())
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json =
        serde_json::to_string_pretty(value).map_err(|e| ConsoleError::Output(e.to_string()))?;
    println!("{json}");
    Ok(())
}

/// Use the given password or read one line from stdin
fn password_or_prompt(password: Option<String>) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }

    eprint!("Password: ");
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        return Err(ConsoleError::Input("password must not be empty".to_string()));
    }
    Ok(password)
}

/// Show configuration as TOML
///
/// # Errors
///
/// Returns error if configuration cannot be serialized
fn show_config(config: &Config) -> Result<()> {
    let config_toml = toml::to_string_pretty(config)
        .map_err(|e| ConsoleError::Output(format!("Failed to serialize configuration: {e}")))?;
    println!("{config_toml}");
    Ok(())
}

/// Handle configuration commands
///
/// # Errors
///
/// Returns error if configuration is invalid or cannot be serialized
fn handle_config_command(config: &Config, show: bool, validate: bool) -> Result<()> {
    if validate {
        config.check()?;
        println!("Configuration is valid.");
        println!(
            "Credentials: {}",
            config.session.resolved_credentials_path().display()
        );
    }

    if show || !validate {
        show_config(config)?;
    }

    Ok(())
}
