//! timesetor: command-line front end for the TimeSetor client.
//!
//! Drives the same stores the web views use. Each command prints one JSON
//! report `{"success": bool, "error"?: string, "data"?: ...}` on stdout and
//! exits non-zero when the operation failed.
//!
//! ## Subcommands
//!
//! - `login` / `register` / `logout` / `whoami`: session management
//! - `settings get|set`: user settings
//! - `time` / `wake` / `sleep` / `activity` / `watch`: virtual time
//! - `pomodoro`: run a focus session in the foreground
//! - `data daily|weekly|config` / `summaries` / `health`: history and backend info
//! - `open <path>`: resolve a view through the route guard

mod commands;
mod logging;

use chrono::{NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use serde_json::Value;
use timesetor_core::StorageConfig;
use timesetor_protocol::{ActivityType, SessionType};

#[derive(Parser)]
#[command(name = "timesetor")]
#[command(about = "TimeSetor virtual time and focus client")]
#[command(version)]
pub struct Cli {
    /// Backend API base URL (overrides config.toml and TIMESETOR_API_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and remember the session
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
    },

    /// Create an account and sign into it
    Register {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
    },

    /// Forget the stored session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Read or change user settings
    #[command(subcommand)]
    Settings(SettingsCommand),

    /// Fetch the current virtual time
    Time,

    /// Record waking up
    Wake {
        /// Local wake time (YYYY-MM-DD HH:MM[:SS]); defaults to now
        #[arg(long, value_name = "TIME", value_parser = parse_local_time)]
        at: Option<NaiveDateTime>,
    },

    /// Record going to sleep
    Sleep {
        /// Local sleep time (YYYY-MM-DD HH:MM[:SS]); defaults to now
        #[arg(long, value_name = "TIME", value_parser = parse_local_time)]
        at: Option<NaiveDateTime>,
    },

    /// Report the current activity
    Activity {
        /// rest, entertainment, study, pomodoro_break or sleep
        #[arg(value_name = "TYPE")]
        activity_type: ActivityType,

        /// Application that triggered the change
        #[arg(long)]
        app: Option<String>,
    },

    /// Poll the virtual time and print it until interrupted
    Watch {
        /// Stop after this many seconds
        #[arg(long)]
        seconds: Option<u64>,
    },

    /// Run a pomodoro session in the foreground (Ctrl-C interrupts it)
    Pomodoro {
        #[arg(short, long, default_value_t = 25)]
        minutes: u32,

        /// work, short_break or long_break
        #[arg(short = 't', long = "type", default_value = "work")]
        session_type: SessionType,
    },

    /// Recorded history
    #[command(subcommand)]
    Data(DataCommand),

    /// List or generate AI summaries
    Summaries {
        /// daily or weekly
        #[arg(short = 't', long = "type")]
        summary_type: Option<String>,

        #[arg(short, long)]
        limit: Option<u32>,

        /// Generate a new summary of the given type instead of listing
        #[arg(long, requires = "summary_type")]
        generate: bool,
    },

    /// Check that the backend is reachable
    Health,

    /// Navigate to a view path and print where the route guard lands
    Open {
        #[arg(value_name = "PATH")]
        path: String,
    },
}

#[derive(Subcommand)]
pub enum SettingsCommand {
    /// Print settings (local copy unless --refresh)
    Get {
        /// Reload from the backend first
        #[arg(long)]
        refresh: bool,
    },

    /// Update settings from KEY=VALUE pairs (VALUE parsed as JSON when possible)
    Set {
        #[arg(value_name = "KEY=VALUE", required = true, value_parser = parse_setting)]
        entries: Vec<(String, Value)>,
    },
}

#[derive(Subcommand)]
pub enum DataCommand {
    /// One day's record, time logs and pomodoro sessions
    Daily {
        /// YYYY-MM-DD; defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// The last seven daily records
    Weekly,

    /// Backend configuration (requires login)
    Config,
}

fn parse_local_time(value: &str) -> Result<NaiveDateTime, String> {
    let value = value.trim();
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .ok_or_else(|| format!("expected YYYY-MM-DD HH:MM[:SS], got {:?}", value))
}

fn parse_setting(entry: &str) -> Result<(String, Value), String> {
    let (key, raw) = entry
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got {:?}", entry))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in {:?}", entry));
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let storage = match StorageConfig::resolve() {
        Ok(storage) => storage,
        Err(err) => {
            eprintln!("timesetor: {}", err);
            std::process::exit(2);
        }
    };
    let logging_guard = logging::init(&storage);

    let code = match commands::run(cli, &storage).await {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(err) => {
            tracing::error!(error = %err, "timesetor setup failed");
            eprintln!("timesetor: {}", err);
            2
        }
    };

    drop(logging_guard);
    std::process::exit(code);
}
