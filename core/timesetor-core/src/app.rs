//! Application context: one instance of each store, built from configuration.

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::data::DataClient;
use crate::error::Result;
use crate::local_store::{FileStore, KeyValueStore};
use crate::messages::Messages;
use crate::pomodoro::PomodoroStore;
use crate::router::Router;
use crate::session::SessionStore;
use crate::storage::StorageConfig;
use crate::time::TimeStore;
use std::sync::Arc;
use tracing::debug;

pub struct App {
    config: ClientConfig,
    api: ApiClient,
    session: Arc<SessionStore>,
    time: TimeStore,
    pomodoro: PomodoroStore,
    data: DataClient,
    router: Router,
}

impl App {
    /// Opens the file-backed local store under `storage` and restores the
    /// session persisted there.
    pub fn new(config: ClientConfig, storage: &StorageConfig) -> Result<Self> {
        storage.ensure_dirs()?;
        let store = FileStore::open(&storage.local_storage_file())?;
        Self::with_store(config, Arc::new(store))
    }

    pub fn with_store(config: ClientConfig, store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let api = ApiClient::new(&config)?;
        let messages = Messages::for_locale(config.ui.locale);

        let session = Arc::new(SessionStore::new(api.clone(), store, messages));
        let time = TimeStore::new(api.clone(), messages, config.poll_interval());
        let pomodoro = PomodoroStore::new(api.clone(), messages);
        let data = DataClient::new(api.clone());
        let router = Router::new(session.clone());

        debug!(
            base_url = api.base_url(),
            locale = config.ui.locale.as_str(),
            logged_in = session.is_logged_in(),
            "App context ready"
        );

        Ok(Self {
            config,
            api,
            session,
            time,
            pomodoro,
            data,
            router,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn time(&self) -> &TimeStore {
        &self.time
    }

    pub fn pomodoro(&self) -> &PomodoroStore {
        &self.pomodoro
    }

    pub fn data(&self) -> &DataClient {
        &self.data
    }

    pub fn router(&self) -> &Router {
        &self.router
    }
}
