//! `keyconsole` command-line front-end
//!
//! Drives the console view-models against a live backend: log in, manage
//! API keys, inspect users and items.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use keyconsole_client::KeyConsoleClient;
use keyconsole_console::key_table::render;
use keyconsole_console::{
    ConsoleState, DeleteStrategy, KeyManagementView, NotificationLevel, RegisterForm,
    RegisterOutcome, Resolution, register, sidebar,
};
use keyconsole_core::Config;
use std::path::PathBuf;
use tracing::info;
use uuid::Uuid;

/// Command line interface for the key console
#[derive(Parser)]
#[command(
    name = "keyconsole",
    version = env!("CARGO_PKG_VERSION"),
    about = "Administrative console for an API-key management platform"
)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); overrides the configuration
    #[arg(short, long)]
    log_level: Option<String>,

    /// Enable structured JSON logging
    #[arg(long)]
    json: bool,

    /// Subcommand
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
enum Commands {
    /// Log in and store the access token
    Login {
        /// Account email
        #[arg(short, long)]
        username: String,

        /// Account password
        #[arg(short, long, env = "KEYCONSOLE_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the stored access token
    Logout,

    /// Create an account with an invite code
    Register {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long, env = "KEYCONSOLE_PASSWORD", hide_env_values = true)]
        password: String,

        /// Password confirmation; defaults to the password
        #[arg(long)]
        confirm_password: Option<String>,

        /// Invite code
        #[arg(short, long)]
        invite_code: String,
    },

    /// Show the logged-in user
    Whoami,

    /// Resolve a console path and show the sidebar
    Nav {
        /// Path to resolve
        #[arg(default_value = "/")]
        path: String,
    },

    /// List users (administrators only)
    Users,

    /// List items keys can be bound to
    Items,

    /// Manage API keys
    Keys {
        /// Key management subcommand
        #[command(subcommand)]
        action: KeyCommands,
    },
}

/// Key management commands
#[derive(Subcommand)]
enum KeyCommands {
    /// List one page of keys
    List {
        /// Page number
        #[arg(long, default_value = "1")]
        page: u32,

        /// Rows per page; defaults to the configured size
        #[arg(long)]
        page_size: Option<u32>,

        /// Only keys owned by this user (administrators only)
        #[arg(long, value_name = "USER_ID")]
        user: Option<Uuid>,
    },

    /// Create keys
    Create {
        /// Number of keys, 1 to 100
        #[arg(short = 'n', long, default_value = "1")]
        count: u32,

        /// Bind the keys to this item
        #[arg(long, value_name = "ITEM_ID")]
        item: Option<Uuid>,
    },

    /// Delete keys
    Delete {
        /// Key ids
        #[arg(required = true, value_name = "KEY_ID")]
        ids: Vec<Uuid>,

        /// Send one request per key instead of using the batch endpoint
        #[arg(long)]
        parallel: bool,
    },

    /// Flip the active flag of keys
    Toggle {
        /// Key ids
        #[arg(required = true, value_name = "KEY_ID")]
        ids: Vec<Uuid>,
    },

    /// Activate keys
    Enable {
        /// Key ids
        #[arg(required = true, value_name = "KEY_ID")]
        ids: Vec<Uuid>,
    },

    /// Deactivate keys
    Disable {
        /// Key ids
        #[arg(required = true, value_name = "KEY_ID")]
        ids: Vec<Uuid>,
    },

    /// Copy a key's secret to the clipboard
    Copy {
        /// Key id
        #[arg(value_name = "KEY_ID")]
        id: Uuid,

        /// Page the key is on
        #[arg(long, default_value = "1")]
        page: u32,

        /// Rows per page
        #[arg(long)]
        page_size: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // a missing .env file is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if cli.json {
        config.logging.format = "json".to_string();
    }
    let _log_guard = keyconsole_core::init_logging(&config.logging)?;
    info!(version = env!("CARGO_PKG_VERSION"), "keyconsole starting");

    let state = ConsoleState::new(config)?;
    match cli.command {
        Commands::Login { username, password } => {
            state.client.login(&username, &password).await?;
            println!("Logged in as {username}");
            Ok(())
        }
        Commands::Logout => {
            state.client.logout()?;
            println!("Logged out");
            Ok(())
        }
        Commands::Register {
            email,
            password,
            confirm_password,
            invite_code,
        } => {
            let form = RegisterForm {
                email,
                confirm_password: confirm_password.unwrap_or_else(|| password.clone()),
                password,
                invite_code,
            };
            handle_register(&state.client, &form).await
        }
        Commands::Whoami => {
            let user = state.client.users().me().await?;
            println!(
                "{} ({}){}",
                user.display_name(),
                user.id,
                if user.is_superuser { " [admin]" } else { "" }
            );
            Ok(())
        }
        Commands::Nav { path } => handle_nav(&state, &path).await,
        Commands::Users => {
            for user in state.client.users().list().await? {
                println!("{}  {}", user.id, user.display_name());
            }
            Ok(())
        }
        Commands::Items => {
            for item in state.client.items().list().await? {
                println!("{}  {}", item.id, item.title);
            }
            Ok(())
        }
        Commands::Keys { action } => handle_keys(&state, action).await,
    }
}

async fn handle_register(client: &KeyConsoleClient, form: &RegisterForm) -> Result<()> {
    match register::submit(client, form).await {
        RegisterOutcome::Registered(next) => {
            println!("Account created; log in next ({next})");
            Ok(())
        }
        RegisterOutcome::Invalid(errors) => {
            for error in &errors {
                eprintln!("{}: {}", error.field, error.message);
            }
            bail!("registration form has {} invalid fields", errors.len())
        }
        RegisterOutcome::Failed(message) => bail!(message),
    }
}

async fn handle_nav(state: &ConsoleState, path: &str) -> Result<()> {
    let shell = state.navigation();
    match shell.resolve(path) {
        Resolution::Render(route) => println!("{} -> {}", path, route.title()),
        Resolution::Redirect(route) => println!("{path} -> redirect to {route}"),
    }

    let user = if state.client.session().is_authenticated() {
        state.client.users().me().await.ok()
    } else {
        None
    };
    for item in sidebar(user.as_ref()) {
        println!("  {:<16} {}", item.title, item.route);
    }
    Ok(())
}

async fn open_view(state: &ConsoleState, page: u32, page_size: Option<u32>) -> KeyManagementView {
    let mut view = state.key_view();
    view.load_context().await;
    if let Some(size) = page_size {
        view.set_page_size(size);
    }
    view.go_to_page(page);
    view
}

async fn handle_keys(state: &ConsoleState, action: KeyCommands) -> Result<()> {
    match action {
        KeyCommands::List {
            page,
            page_size,
            user,
        } => {
            let mut view = open_view(state, page, page_size).await;
            if user.is_some() && !view.set_user_filter(user) {
                eprintln!("--user is only available to administrators");
            }
            view.go_to_page(page);
            view.refresh().await;
            flush_notifications(state)?;

            print!("{}", render(&view.rows()));
            println!("{}  {}", view.pages().total_label(), view.pages().page_label());
        }
        KeyCommands::Create { count, item } => {
            let mut view = open_view(state, 1, None).await;
            view.set_create_count(count);
            view.set_create_item(item);
            view.create().await;
            flush_notifications(state)?;
            print!("{}", render(&view.rows()));
        }
        KeyCommands::Delete { ids, parallel } => {
            let mut view = state.key_view();
            for id in ids {
                view.toggle_row(id);
            }
            let strategy = if parallel {
                DeleteStrategy::Parallel
            } else {
                DeleteStrategy::BatchEndpoint
            };
            view.delete_selected(strategy).await;
            flush_notifications(state)?;
        }
        KeyCommands::Toggle { ids } => {
            let mut view = state.key_view();
            for id in ids {
                view.toggle(id).await;
            }
            flush_notifications(state)?;
        }
        KeyCommands::Enable { ids } => set_active(state, ids, true).await?,
        KeyCommands::Disable { ids } => set_active(state, ids, false).await?,
        KeyCommands::Copy {
            id,
            page,
            page_size,
        } => {
            let mut view = open_view(state, page, page_size).await;
            view.refresh().await;
            view.copy_key(id);
            flush_notifications(state)?;
        }
    }
    Ok(())
}

async fn set_active(state: &ConsoleState, ids: Vec<Uuid>, active: bool) -> Result<()> {
    let mut view = open_view(state, 1, None).await;
    view.refresh().await;
    for id in ids {
        view.toggle_row(id);
    }
    view.set_selected_active(active).await;
    flush_notifications(state)
}

/// Print pending notifications; fail when any of them reports an error
fn flush_notifications(state: &ConsoleState) -> Result<()> {
    let mut failed = false;
    for notification in state.notifications.drain() {
        match notification.level {
            NotificationLevel::Success => println!("{notification}"),
            NotificationLevel::Warning | NotificationLevel::Error => {
                failed = true;
                eprintln!("{notification}");
            }
        }
    }
    if failed {
        bail!("one or more actions failed");
    }
    Ok(())
}
