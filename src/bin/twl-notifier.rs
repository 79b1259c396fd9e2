//! twl-notifier CLI: feeds save events through the notification pipeline
//! and inspects per-user notification state.
//!
//! Usage:
//!   twl-notifier run [--events path] [--config path]
//!   twl-notifier check <user> [--config path]
//!   twl-notifier state get|set <user> [state] [--config path]
//!   twl-notifier registrations

use clap::{Parser, Subcommand};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use twl_notifier::{
    ContentSaved, GlobalAccountDirectory, HookResult, Hooks, InMemoryAccountDirectory,
    LogDispatcher, NotificationRegistry, NotificationState, NotificationStateStore, OpenStore,
    PreferenceRegistry, SaveEventHandler, SqliteStateStore, TwlConfig, UserId,
};

#[derive(Parser)]
#[command(
    name = "twl-notifier",
    version,
    about = "One-time eligibility notifications for wiki accounts"
)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate newline-delimited JSON save events
    Run {
        /// Event file (defaults to stdin)
        #[arg(long)]
        events: Option<PathBuf>,
    },
    /// Show whether a user is eligible and what has been recorded
    Check {
        user: UserId,
    },
    /// Read or overwrite a user's notification state
    State {
        #[command(subcommand)]
        action: StateAction,
    },
    /// Print preference and notification registrations as JSON
    Registrations,
}

#[derive(Subcommand)]
enum StateAction {
    /// Print the stored state
    Get { user: UserId },
    /// Overwrite the stored state (unset, no or yes)
    Set {
        user: UserId,
        state: NotificationState,
    },
}

fn open_store(config: &TwlConfig) -> Result<SqliteStateStore, String> {
    let path = config.database_path();
    SqliteStateStore::open(&path)
        .map_err(|e| format!("Failed to open database {}: {}", path.display(), e))
}

fn open_accounts(config: &TwlConfig) -> Result<InMemoryAccountDirectory, String> {
    match &config.accounts_file {
        Some(path) => InMemoryAccountDirectory::from_file(path)
            .map_err(|e| format!("Failed to load accounts: {}", e)),
        None => {
            tracing::warn!("no accounts_file configured; every user will be treated as unattached");
            Ok(InMemoryAccountDirectory::new())
        }
    }
}

fn read_events(path: Option<&Path>) -> Result<Box<dyn BufRead>, String> {
    match path {
        Some(path) => {
            let file = std::fs::File::open(path)
                .map_err(|e| format!("cannot open '{}': {}", path.display(), e))?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(BufReader::new(std::io::stdin()))),
    }
}

async fn cmd_run(config: &TwlConfig, events: Option<&Path>) -> i32 {
    let setup = open_accounts(config).and_then(|accounts| {
        open_store(config).map(|store| (accounts, store))
    });
    let (accounts, store) = match setup {
        Ok(parts) => parts,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let reader = match read_events(events) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let handler = Arc::new(SaveEventHandler::new(
        Arc::new(accounts),
        Arc::new(store),
        Arc::new(LogDispatcher),
        config.thresholds(),
    ));
    let hooks = Hooks::from_config(config, handler);

    let mut accepted = 0usize;
    let mut rejected = 0usize;
    for (index, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Error: failed to read events: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let event: ContentSaved = match serde_json::from_str(&line) {
            Ok(ev) => ev,
            Err(e) => {
                tracing::warn!(line = index + 1, error = %e, "skipping malformed event");
                rejected += 1;
                continue;
            }
        };
        match hooks.on_content_saved_wait(&event).await {
            HookResult::Deferred => accepted += 1,
            HookResult::Disabled => {
                println!("Notifications are disabled (send_notifications = false); nothing to do.");
                hooks.shutdown().await;
                return 0;
            }
            HookResult::Dropped(_) => rejected += 1,
        }
    }

    let stats = hooks.shutdown().await;
    println!(
        "{} events queued, {} rejected; {} evaluated, {} notified, {} failed",
        accepted, rejected, stats.evaluated, stats.notified, stats.failed
    );
    if stats.failed > 0 {
        1
    } else {
        0
    }
}

async fn cmd_check(config: &TwlConfig, user: UserId) -> i32 {
    let accounts = match open_accounts(config) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let store = match open_store(config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let account = match accounts.global_account(user).await {
        Ok(Some(account)) => account,
        Ok(None) => {
            println!("User {}: no global account", user);
            return 0;
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let state = match store.get(user) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let now = chrono::Utc::now();
    let thresholds = config.thresholds();
    println!("{:<12} {}", "user", user);
    println!("{:<12} {}", "name", account.name);
    println!("{:<12} {}", "attached", account.attached);
    println!(
        "{:<12} {} (minimum {})",
        "edits", account.global_edit_count, thresholds.min_edit_count
    );
    println!(
        "{:<12} {} days (minimum {})",
        "age",
        account.age_seconds(now) / twl_notifier::eligibility::SECONDS_PER_DAY,
        thresholds.min_age_days
    );
    println!("{:<12} {}", "eligible", account.attached && thresholds.is_met(&account, now));
    println!("{:<12} {}", "state", state);
    0
}

fn cmd_state(config: &TwlConfig, action: StateAction) -> i32 {
    let store = match open_store(config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    match action {
        StateAction::Get { user } => match store.get(user) {
            Ok(state) => {
                println!("{}", state);
                0
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        },
        StateAction::Set { user, state } => match store.set(user, state) {
            Ok(()) => {
                println!("User {} set to '{}'", user, state);
                0
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        },
    }
}

fn cmd_registrations() -> i32 {
    let mut preferences = PreferenceRegistry::new();
    let mut notifications = NotificationRegistry::new();
    Hooks::on_preference_registration(&mut preferences);
    Hooks::on_notification_registration(&mut notifications);

    let out = serde_json::json!({
        "preferences": preferences,
        "notifications": notifications,
    });
    match serde_json::to_string_pretty(&out) {
        Ok(text) => {
            println!("{}", text);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let config = match TwlConfig::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    twl_notifier::telemetry::init(&config.log_level);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };

    let code = match cli.command {
        Commands::Run { events } => rt.block_on(cmd_run(&config, events.as_deref())),
        Commands::Check { user } => rt.block_on(cmd_check(&config, user)),
        Commands::State { action } => cmd_state(&config, action),
        Commands::Registrations => cmd_registrations(),
    };
    std::process::exit(code);
}
