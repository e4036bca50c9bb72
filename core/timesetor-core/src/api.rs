//! HTTP adapter for the TimeSetor backend.
//!
//! Prefixes every path with the configured base URL and injects
//! `Authorization: Bearer <token>` while a session token is set. Any non-2xx
//! status or transport failure becomes a [`ClientError`]; the backend's
//! `{"error": "..."}` text is kept on the error when present.

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock};
use timesetor_protocol::ErrorBody;
use tracing::debug;

/// Shared slot for the bearer token.
///
/// The session store writes it; the adapter reads it on every request.
#[derive(Debug, Clone, Default)]
pub struct TokenHandle(Arc<RwLock<Option<String>>>);

impl TokenHandle {
    pub fn get(&self) -> Option<String> {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set(&self, token: Option<String>) {
        let token = token.filter(|t| !t.is_empty());
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = token;
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: TokenHandle,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|source| ClientError::Transport {
                path: "<client setup>".to_string(),
                source,
            })?;
        Ok(Self {
            http,
            base_url: config.api.base_url.trim_end_matches('/').to_string(),
            token: TokenHandle::default(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> &TokenHandle {
        &self.token
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(path, self.request(Method::GET, path)).await
    }

    pub async fn get_with_query<Q, T>(&self, path: &str, query: &Q) -> Result<T>
    where
        Q: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(path, self.request(Method::GET, path).query(query))
            .await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(path, self.request(Method::POST, path).json(body))
            .await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(path, self.request(Method::PUT, path).json(body))
            .await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match self.token.get() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, path: &str, builder: RequestBuilder) -> Result<T> {
        let transport = |source| ClientError::Transport {
            path: path.to_string(),
            source,
        };

        let response = builder.send().await.map_err(transport)?;
        let status = response.status();
        let body = response.bytes().await.map_err(transport)?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&body)
                .ok()
                .map(|body| body.error);
            debug!(path, status = status.as_u16(), message = ?message, "Backend request failed");
            return Err(ClientError::Http {
                status: status.as_u16(),
                path: path.to_string(),
                message,
            });
        }

        // Some acknowledgements come back with an empty body.
        let body: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
            b"{}"
        } else {
            &body
        };
        serde_json::from_slice(body).map_err(|err| ClientError::Decode {
            path: path.to_string(),
            details: err.to_string(),
        })
    }
}
