//! Session store: token, user id and settings of the signed-in user.
//!
//! The in-memory session is authoritative; local storage only mirrors it so
//! the next start can restore it. Every network operation reports failure as
//! an [`ActionError`] and leaves both the session and storage untouched.

use crate::api::ApiClient;
use crate::error::{ActionError, ActionResult, ClientError};
use crate::local_store::KeyValueStore;
use crate::messages::Messages;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use timesetor_protocol::{
    paths, Ack, Credentials, LoginResponse, RegisterResponse, Settings, SettingsPayload,
};
use tracing::{info, warn};

/// Local storage keys mirrored by the session store.
pub mod keys {
    pub const TOKEN: &str = "token";
    pub const USER_ID: &str = "userId";
    pub const SETTINGS: &str = "settings";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Session {
    pub token: String,
    pub user_id: String,
    pub settings: Settings,
}

impl Session {
    pub fn is_logged_in(&self) -> bool {
        !self.token.is_empty()
    }
}

pub struct SessionStore {
    api: ApiClient,
    storage: Arc<dyn KeyValueStore>,
    messages: &'static Messages,
    session: Mutex<Session>,
}

impl SessionStore {
    /// Creates the store, restoring any session left in `storage`.
    pub fn new(api: ApiClient, storage: Arc<dyn KeyValueStore>, messages: &'static Messages) -> Self {
        let session = restore_session(storage.as_ref());
        api.token().set(Some(session.token.clone()));
        Self {
            api,
            storage,
            messages,
            session: Mutex::new(session),
        }
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn is_logged_in(&self) -> bool {
        self.session().is_logged_in()
    }

    /// Same predicate as [`SessionStore::is_logged_in`], kept for call sites
    /// that gate on auth before a request.
    pub fn check_auth(&self) -> bool {
        self.is_logged_in()
    }

    pub fn token(&self) -> String {
        self.session().token.clone()
    }

    pub fn user_id(&self) -> String {
        self.session().user_id.clone()
    }

    pub fn settings(&self) -> Settings {
        self.session().settings.clone()
    }

    pub fn snapshot(&self) -> Session {
        self.session().clone()
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Operations
    // ─────────────────────────────────────────────────────────────────────────────

    pub async fn login(&self, username: &str, password: &str) -> ActionResult {
        let credentials = credentials(username, password);
        let response: LoginResponse = self
            .api
            .post(paths::AUTH_LOGIN, &credentials)
            .await
            .map_err(|err| self.fail("login", err, self.messages.login_failed))?;

        let settings_json = encode_settings(&response.settings);
        let mut entries = {
            let mut session = self.session();
            session.token = response.token;
            session.user_id = response.user_id;
            session.settings = response.settings;
            self.api.token().set(Some(session.token.clone()));
            info!(user_id = %session.user_id, "Logged in");
            vec![
                (keys::TOKEN, session.token.clone()),
                (keys::USER_ID, session.user_id.clone()),
            ]
        };
        if let Some(json) = settings_json {
            entries.push((keys::SETTINGS, json));
        }
        self.persist(&entries);
        Ok(())
    }

    /// Registers a new account and signs into it. Settings are left as they
    /// were; the backend does not return them on registration.
    pub async fn register(&self, username: &str, password: &str) -> ActionResult {
        let credentials = credentials(username, password);
        let response: RegisterResponse = self
            .api
            .post(paths::AUTH_REGISTER, &credentials)
            .await
            .map_err(|err| self.fail("register", err, self.messages.register_failed))?;

        let entries = {
            let mut session = self.session();
            session.token = response.token;
            session.user_id = response.user_id;
            self.api.token().set(Some(session.token.clone()));
            info!(user_id = %session.user_id, "Registered");
            [
                (keys::TOKEN, session.token.clone()),
                (keys::USER_ID, session.user_id.clone()),
            ]
        };
        self.persist(&entries);
        Ok(())
    }

    /// Clears the session in memory and in storage. No network call.
    pub fn logout(&self) {
        *self.session() = Session::default();
        self.api.token().set(None);
        if let Err(err) = self
            .storage
            .remove_many(&[keys::TOKEN, keys::USER_ID, keys::SETTINGS])
        {
            warn!(error = %err, "Failed to clear persisted session");
        }
        info!("Logged out");
    }

    /// Sends a partial settings update; on success it is merged key by key
    /// into the current settings.
    pub async fn update_settings(&self, partial: Settings) -> ActionResult {
        let payload = SettingsPayload {
            settings: partial.clone(),
        };
        let _: Ack = self
            .api
            .put(paths::USER_SETTINGS, &payload)
            .await
            .map_err(|err| self.fail("update settings", err, self.messages.save_failed))?;

        let merged = {
            let mut session = self.session();
            session.settings.extend(partial);
            session.settings.clone()
        };
        self.persist_settings(&merged);
        Ok(())
    }

    /// Replaces the local settings with the backend's copy.
    pub async fn refresh_settings(&self) -> ActionResult<Settings> {
        let payload: SettingsPayload = self.api.get(paths::USER_SETTINGS).await.map_err(|err| {
            self.fail("refresh settings", err, self.messages.settings_load_failed)
        })?;

        self.session().settings = payload.settings.clone();
        self.persist_settings(&payload.settings);
        Ok(payload.settings)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────────────────────

    fn fail(&self, operation: &str, err: ClientError, default_message: &str) -> ActionError {
        warn!(operation, error = %err, "Session request failed");
        ActionError::from_client(err, default_message)
    }

    fn persist(&self, entries: &[(&str, String)]) {
        if let Err(err) = self.storage.set_many(entries) {
            warn!(error = %err, "Failed to persist session");
        }
    }

    fn persist_settings(&self, settings: &Settings) {
        if let Some(json) = encode_settings(settings) {
            self.persist(&[(keys::SETTINGS, json)]);
        }
    }
}

fn credentials(username: &str, password: &str) -> Credentials {
    Credentials {
        username: username.to_string(),
        password: password.to_string(),
    }
}

fn encode_settings(settings: &Settings) -> Option<String> {
    match serde_json::to_string(settings) {
        Ok(json) => Some(json),
        Err(err) => {
            warn!(error = %err, "Failed to encode settings");
            None
        }
    }
}

fn restore_session(storage: &dyn KeyValueStore) -> Session {
    let settings = match storage.get(keys::SETTINGS) {
        None => Settings::new(),
        Some(raw) => serde_json::from_str::<Settings>(&raw).unwrap_or_else(|err| {
            warn!(error = %err, "Ignoring unreadable persisted settings");
            Settings::new()
        }),
    };
    Session {
        token: storage.get(keys::TOKEN).unwrap_or_default(),
        user_id: storage.get(keys::USER_ID).unwrap_or_default(),
        settings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::local_store::MemoryStore;
    use crate::messages::Locale;
    use serde_json::json;

    fn store_over(storage: Arc<MemoryStore>) -> SessionStore {
        let api = ApiClient::new(&ClientConfig::default()).unwrap();
        SessionStore::new(api, storage, Messages::for_locale(Locale::ZhCn))
    }

    #[test]
    fn fresh_storage_means_logged_out() {
        let store = store_over(Arc::new(MemoryStore::new()));
        assert!(!store.is_logged_in());
        assert!(!store.check_auth());
        assert!(store.settings().is_empty());
    }

    #[test]
    fn restores_persisted_session() {
        let storage = Arc::new(MemoryStore::new());
        storage.set(keys::TOKEN, "t1").unwrap();
        storage.set(keys::USER_ID, "u1").unwrap();
        storage
            .set(keys::SETTINGS, r#"{"target_wake_time":"07:00"}"#)
            .unwrap();

        let store = store_over(storage);
        assert!(store.is_logged_in());
        assert_eq!(store.user_id(), "u1");
        assert_eq!(store.settings().get("target_wake_time"), Some(&json!("07:00")));
    }

    #[test]
    fn restored_token_is_published_to_the_adapter() {
        let storage = Arc::new(MemoryStore::new());
        storage.set(keys::TOKEN, "t1").unwrap();
        let api = ApiClient::new(&ClientConfig::default()).unwrap();
        let _store = SessionStore::new(api.clone(), storage, Messages::for_locale(Locale::ZhCn));
        assert_eq!(api.token().get().as_deref(), Some("t1"));
    }

    #[test]
    fn unreadable_settings_restore_as_empty() {
        let storage = Arc::new(MemoryStore::new());
        storage.set(keys::TOKEN, "t1").unwrap();
        storage.set(keys::SETTINGS, "[1, 2").unwrap();

        let store = store_over(storage);
        assert!(store.is_logged_in());
        assert!(store.settings().is_empty());
    }

    #[test]
    fn logout_clears_memory_and_storage() {
        let storage = Arc::new(MemoryStore::new());
        storage.set(keys::TOKEN, "t1").unwrap();
        storage.set(keys::USER_ID, "u1").unwrap();
        storage.set(keys::SETTINGS, "{}").unwrap();

        let store = store_over(Arc::clone(&storage));
        store.logout();

        assert!(!store.is_logged_in());
        assert_eq!(store.snapshot(), Session::default());
        assert!(storage.is_empty());
    }
}
