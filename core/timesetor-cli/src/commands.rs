//! Command execution: build the app context, run one store operation, print
//! its report.

use crate::{Cli, Commands, DataCommand, SettingsCommand};
use serde::Serialize;
use serde_json::json;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use timesetor_core::{load_config, App, ClientError, Outcome, StorageConfig};
use timesetor_protocol::{PomodoroStatus, SessionType, Settings};
use tracing::{info, warn};

const POMODORO_TICK: Duration = Duration::from_secs(1);
const WATCH_MIN_PERIOD: Duration = Duration::from_millis(250);

/// `{success, error?, data?}` printed for every command.
#[derive(Serialize)]
struct Report<T: Serialize> {
    #[serde(flatten)]
    outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(err) => warn!(error = %err, "Failed to encode command output"),
    }
}

/// Prints the report for `result` and returns whether it succeeded.
fn emit<T: Serialize, E: Display>(result: Result<T, E>) -> bool {
    let outcome = Outcome::of(&result);
    let success = outcome.success;
    if let Err(err) = &result {
        warn!(error = %err, "Command failed");
    }
    print_json(&Report {
        outcome,
        data: result.ok(),
    });
    success
}

/// Resolves to `()` after `seconds`, or never.
async fn deadline(seconds: Option<u64>) {
    match seconds {
        Some(seconds) => tokio::time::sleep(Duration::from_secs(seconds)).await,
        None => std::future::pending().await,
    }
}

async fn interrupted() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "Ctrl-C handler unavailable");
        std::future::pending::<()>().await;
    }
}

/// Runs `cli` and returns whether the operation succeeded. Errors are
/// reserved for setup failures (config, storage).
pub async fn run(cli: Cli, storage: &StorageConfig) -> Result<bool, ClientError> {
    let mut config = load_config(&storage.config_file())?.with_env_overrides();
    if let Some(url) = cli.api_url {
        config.api.base_url = url;
    }
    let app = App::new(config, storage)?;
    info!(base_url = app.api().base_url(), "timesetor starting");

    let success = match cli.command {
        Commands::Login { username, password } => {
            emit(app.session().login(&username, &password).await)
        }
        Commands::Register { username, password } => {
            emit(app.session().register(&username, &password).await)
        }
        Commands::Logout => {
            app.session().logout();
            emit(Ok::<(), ClientError>(()))
        }
        Commands::Whoami => {
            let session = app.session().snapshot();
            emit(Ok::<_, ClientError>(json!({
                "logged_in": session.is_logged_in(),
                "user_id": session.user_id,
                "settings": session.settings,
            })))
        }
        Commands::Settings(command) => run_settings(&app, command).await,
        Commands::Time => match app.time().fetch_current_time().await {
            Some(response) => emit(Ok::<_, ClientError>(json!({
                "state": app.time().state(),
                "message": response.message,
            }))),
            None => emit(Err::<(), _>("Current time unavailable")),
        },
        Commands::Wake { at } => {
            let result = app.time().record_wake_at(at).await;
            // A one-shot command has no use for the poller the wake starts.
            app.time().stop_auto_update();
            emit(result)
        }
        Commands::Sleep { at } => emit(app.time().record_sleep_at(at).await),
        Commands::Activity { activity_type, app: app_name } => emit(
            app.time()
                .update_activity(activity_type, app_name.as_deref())
                .await,
        ),
        Commands::Watch { seconds } => watch(&app, deadline(seconds)).await,
        Commands::Pomodoro {
            minutes,
            session_type,
        } => run_pomodoro(&app, minutes, session_type, interrupted()).await,
        Commands::Data(command) => match command {
            DataCommand::Daily { date } => emit(app.data().daily(date).await),
            DataCommand::Weekly => emit(app.data().weekly().await),
            DataCommand::Config => emit(app.data().server_config().await),
        },
        Commands::Summaries {
            summary_type,
            limit,
            generate,
        } => match (generate, summary_type) {
            (true, Some(summary_type)) => emit(app.data().generate_summary(&summary_type).await),
            (_, summary_type) => emit(app.data().summaries(summary_type.as_deref(), limit).await),
        },
        Commands::Health => emit(app.data().health().await),
        Commands::Open { path } => {
            let result = app.router().navigate(&path).map(|route| {
                json!({
                    "requested": path,
                    "route": route.name(),
                    "path": route.path(),
                })
            });
            emit(result)
        }
    };
    Ok(success)
}

async fn run_settings(app: &App, command: SettingsCommand) -> bool {
    match command {
        SettingsCommand::Get { refresh: true } => emit(app.session().refresh_settings().await),
        SettingsCommand::Get { refresh: false } => {
            emit(Ok::<_, ClientError>(app.session().settings()))
        }
        SettingsCommand::Set { entries } => {
            let partial: Settings = entries.into_iter().collect();
            match app.session().update_settings(partial).await {
                Ok(()) => emit(Ok::<_, ClientError>(app.session().settings())),
                Err(err) => emit(Err::<(), _>(err)),
            }
        }
    }
}

/// Prints the virtual time as one JSON line per period until `stop`
/// resolves or Ctrl-C.
async fn watch(app: &App, stop: impl Future<Output = ()>) -> bool {
    let time = app.time();
    time.fetch_current_time().await;
    if !time.start_auto_update() {
        return emit(Err::<(), _>("Could not start polling"));
    }

    let mut ticker = tokio::time::interval(time.poll_interval().max(WATCH_MIN_PERIOD));
    tokio::pin!(stop);
    let ctrl_c = interrupted();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            _ = ticker.tick() => match serde_json::to_string(&time.state()) {
                Ok(line) => println!("{}", line),
                Err(err) => warn!(error = %err, "Failed to encode time state"),
            },
            _ = &mut stop => break,
            _ = &mut ctrl_c => break,
        }
    }
    time.stop_auto_update();
    true
}

/// Starts a session, counts it down, and ends it as completed when the time
/// is up or as interrupted when `interrupt` resolves first.
async fn run_pomodoro(
    app: &App,
    minutes: u32,
    session_type: SessionType,
    interrupt: impl Future<Output = ()>,
) -> bool {
    let pomodoro = app.pomodoro();
    if let Err(err) = pomodoro.start(minutes, session_type).await {
        return emit(Err::<(), _>(err));
    }
    if let Some(active) = pomodoro.active() {
        print_json(&active);
    }

    let mut ticker = tokio::time::interval(POMODORO_TICK);
    tokio::pin!(interrupt);
    let mut last_minute = None;
    let status = loop {
        tokio::select! {
            _ = ticker.tick() => {
                if pomodoro.is_finished() {
                    break PomodoroStatus::Completed;
                }
                let remaining = pomodoro.remaining().unwrap_or_default();
                let minute = remaining.as_secs().div_ceil(60);
                if last_minute != Some(minute) {
                    last_minute = Some(minute);
                    println!("{}", json!({ "remaining_minutes": minute }));
                }
            }
            _ = &mut interrupt => break PomodoroStatus::Interrupted,
        }
    };
    emit(pomodoro.end(status).await)
}
