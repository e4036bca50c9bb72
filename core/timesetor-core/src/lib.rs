//! # timesetor-core
//!
//! Client library for TimeSetor, shared by every front end.
//!
//! ## Design Principles
//!
//! - **Thin client**: the backend owns accounts, settings and the virtual
//!   clock. The stores here mirror its answers and never compute them.
//! - **Explicit context**: stores are built once by [`App`] and handed to
//!   whoever needs them. No globals.
//! - **Failures are values**: store operations return an [`ActionError`]
//!   with the message to show; they never panic on a bad response.
//! - **Local mirror only**: local storage restores a session on the next
//!   start, the in-memory session stays authoritative.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use timesetor_core::{load_config, App, StorageConfig};
//!
//! let storage = StorageConfig::resolve()?;
//! let config = load_config(&storage.config_file())?.with_env_overrides();
//! let app = App::new(config, &storage)?;
//!
//! app.session().login("alice", "secret").await?;
//! app.time().record_wake().await?;
//! ```

pub mod api;
pub mod app;
pub mod config;
pub mod data;
pub mod error;
pub mod local_store;
pub mod messages;
pub mod pomodoro;
pub mod router;
pub mod session;
pub mod storage;
pub mod time;

pub use api::{ApiClient, TokenHandle};
pub use app::App;
pub use config::{load_config, ApiConfig, ClientConfig, TimeConfig, UiConfig};
pub use data::DataClient;
pub use error::{ActionError, ActionResult, ClientError, Outcome, Result};
pub use local_store::{FileStore, KeyValueStore, MemoryStore};
pub use messages::{Locale, Messages};
pub use pomodoro::{ActivePomodoro, FinishedPomodoro, PomodoroError, PomodoroStore};
pub use router::{guard, AuthState, Navigation, Route, Router, RouterError};
pub use session::{Session, SessionStore};
pub use storage::StorageConfig;
pub use time::{TimeState, TimeStore};
