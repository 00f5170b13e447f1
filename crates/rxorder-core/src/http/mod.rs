//! Authenticated HTTP client wrapper.
//!
//! One configured `reqwest::Client` shared by every API call. Before
//! dispatch the current token (if any) is attached as a bearer header;
//! after a failure the error is classified through [`normalize`]. A 401 or
//! 403 clears the [`SessionStore`] and fires the session-expired callback
//! before the error is handed back to the caller.

mod config;
mod error;

pub use config::*;
pub use error::*;

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::error::ClientResult;
use crate::session::SessionStore;

/// Invoked after an auth failure or explicit logout has cleared the session.
pub type SessionExpiredCallback = Arc<dyn Fn() + Send + Sync>;

/// Extra per-request settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub query: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }
}

pub struct ApiClient {
    config: ClientConfig,
    http: reqwest::Client,
    session: Arc<SessionStore>,
    on_session_expired: SessionExpiredCallback,
}

impl ApiClient {
    pub fn new(
        config: ClientConfig,
        session: Arc<SessionStore>,
        on_session_expired: SessionExpiredCallback,
    ) -> ClientResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            // Bounds the whole exchange, connect through body read.
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            config,
            http,
            session,
            on_session_expired,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Explicit user logout: clear the session, then reset navigation.
    pub fn logout(&self) -> ClientResult<()> {
        self.session.logout()?;
        (self.on_session_expired)();
        Ok(())
    }

    /// Dispatch one request and return the parsed response body unchanged.
    ///
    /// An empty success body is returned as `Value::Null`; a body that is
    /// not JSON is returned as `Value::String`.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        options: &RequestOptions,
    ) -> Result<Value, NormalizedError> {
        let mut builder = self.http.request(method.clone(), self.config.url_for(path));
        if !options.query.is_empty() {
            builder = builder.query(&options.query);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let token = self.session.token();
        if let Some(token) = &token {
            builder = builder.bearer_auth(token);
        }
        debug!(%method, path, authenticated = token.is_some(), "dispatching request");

        exchange(builder)
            .await
            .map_err(|failure| self.handle_failure(&method, path, failure))
    }

    fn handle_failure(&self, method: &Method, path: &str, failure: RawFailure) -> NormalizedError {
        let err = normalize(failure);
        if err.is_auth_failure() {
            warn!(%method, path, status = ?err.status, "authentication rejected, clearing session");
            if let Err(e) = self.session.logout() {
                error!(error = %e, "failed to clear session after auth failure");
            }
            (self.on_session_expired)();
        } else {
            debug!(
                %method,
                path,
                kind = ?err.kind,
                status = ?err.status,
                error = %err.message,
                "request failed"
            );
        }
        err
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, options: &RequestOptions) -> ClientResult<T> {
        let value = self.request(Method::GET, path, None, options).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        let value = self
            .request(Method::POST, path, Some(&body), &RequestOptions::default())
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        let value = self
            .request(Method::PUT, path, Some(&body), &RequestOptions::default())
            .await?;
        Ok(serde_json::from_value(value)?)
    }
}

async fn exchange(builder: RequestBuilder) -> Result<Value, RawFailure> {
    let response = builder
        .send()
        .await
        .map_err(|e| classify_transport_error(&e))?;
    let status = response.status();
    let bytes = response
        .bytes()
        .await
        .map_err(|e| classify_transport_error(&e))?;
    let body = parse_body(&bytes);

    if status.is_success() {
        Ok(body.unwrap_or(Value::Null))
    } else {
        Err(RawFailure::Response {
            status: status.as_u16(),
            status_text: status_text(status),
            body,
        })
    }
}

fn parse_body(bytes: &[u8]) -> Option<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    Some(
        serde_json::from_slice(bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned())),
    )
}
