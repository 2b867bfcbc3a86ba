//! HTTP client for the Mini Notes API with transparent token refresh.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::{header, Method, StatusCode};
use serde_json::{json, Value};

use crate::cli::config::{Session, SessionStore, SessionUser};

/// Error body returned by the server, or a local session failure
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ApiFailure {
    pub status: u16,
    pub message: String,
    pub code: Option<String>,
    pub field_errors: BTreeMap<String, String>,
    pub retry_after: Option<u64>,
}

impl ApiFailure {
    fn from_body(status: StatusCode, body: &Value) -> Self {
        let field_errors = body
            .get("field_errors")
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            status: status.as_u16(),
            message: body
                .get("error")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("Request failed with status {}", status)),
            code: body.get("code").and_then(Value::as_str).map(str::to_string),
            field_errors,
            retry_after: body.get("retry_after").and_then(Value::as_u64),
        }
    }

    fn session_expired() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED.as_u16(),
            message: "Your session has expired. Please log in again.".to_string(),
            code: Some("UNAUTHORIZED".to_string()),
            field_errors: BTreeMap::new(),
            retry_after: None,
        }
    }
}

/// A successful response body plus the headers commands care about
#[derive(Debug, Clone)]
pub struct ApiReply {
    pub body: Value,
    pub content_disposition: Option<String>,
}

impl ApiReply {
    pub fn data(&self) -> &Value {
        self.body.get("data").unwrap_or(&Value::Null)
    }

    pub fn message(&self) -> Option<&str> {
        self.body.get("message").and_then(Value::as_str)
    }
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    store: SessionStore,
    session: Option<Session>,
}

impl ApiClient {
    /// Sessions saved for a different server are ignored
    pub fn new(base_url: &str, store: SessionStore) -> anyhow::Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let session = store.load()?.filter(|s| s.server == base_url);
        let http = reqwest::Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            http,
            base_url,
            store,
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Persist the tokens (and user, if present) from an auth response's `data`
    pub fn start_session(&mut self, data: &Value) -> anyhow::Result<()> {
        let token = |key: &str| {
            data.get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| anyhow::anyhow!("response did not include {}", key))
        };
        let user = data.get("user").and_then(|u| {
            Some(SessionUser {
                id: u.get("id")?.as_i64()?,
                username: u.get("username")?.as_str()?.to_string(),
                email: u.get("email")?.as_str()?.to_string(),
            })
        });
        let session = Session::new(&self.base_url, token("accessToken")?, token("refreshToken")?, user);
        self.store.save(&session)?;
        self.session = Some(session);
        Ok(())
    }

    pub fn end_session(&mut self) -> anyhow::Result<()> {
        self.session = None;
        self.store.clear()
    }

    pub async fn get(&mut self, path: &str) -> anyhow::Result<ApiReply> {
        self.send(Method::GET, path, None).await
    }

    pub async fn post(&mut self, path: &str, body: &Value) -> anyhow::Result<ApiReply> {
        self.send(Method::POST, path, Some(body)).await
    }

    pub async fn put(&mut self, path: &str, body: &Value) -> anyhow::Result<ApiReply> {
        self.send(Method::PUT, path, Some(body)).await
    }

    pub async fn patch(&mut self, path: &str, body: &Value) -> anyhow::Result<ApiReply> {
        self.send(Method::PATCH, path, Some(body)).await
    }

    pub async fn delete(&mut self, path: &str, body: Option<&Value>) -> anyhow::Result<ApiReply> {
        self.send(Method::DELETE, path, body).await
    }

    /// Send with the stored access token. On 401, refresh once and retry once;
    /// if the refresh fails the stored session is discarded.
    pub async fn send(&mut self, method: Method, path: &str, body: Option<&Value>) -> anyhow::Result<ApiReply> {
        let token = self.session.as_ref().map(|s| s.access_token.clone());
        let mut response = self.execute(method.clone(), path, body, token.as_deref()).await?;

        if response.status() == StatusCode::UNAUTHORIZED && token.is_some() {
            tracing::debug!("Access token rejected for {} {}, refreshing", method, path);
            if !self.refresh().await? {
                self.end_session()?;
                return Err(ApiFailure::session_expired().into());
            }
            let token = self.session.as_ref().map(|s| s.access_token.clone());
            response = self.execute(method, path, body, token.as_deref()).await?;
        }

        decode(response).await
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        token: Option<&str>,
    ) -> anyhow::Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.request(method, &url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        request
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("could not reach {}: {}", self.base_url, e))
    }

    /// Ok(true) when a new token pair was obtained and stored
    async fn refresh(&mut self) -> anyhow::Result<bool> {
        let Some(refresh_token) = self.session.as_ref().map(|s| s.refresh_token.clone()) else {
            return Ok(false);
        };

        let response = self
            .execute(
                Method::POST,
                "/api/auth/refresh",
                Some(&json!({ "refreshToken": refresh_token })),
                None,
            )
            .await?;
        if !response.status().is_success() {
            return Ok(false);
        }

        let reply = decode(response).await?;
        let user = self.session.as_ref().and_then(|s| s.user.clone());
        let mut data = reply.data().clone();
        if let (Some(user), Some(obj)) = (user, data.as_object_mut()) {
            obj.insert("user".into(), json!({ "id": user.id, "username": user.username, "email": user.email }));
        }
        self.start_session(&data)?;
        Ok(true)
    }
}

async fn decode(response: reqwest::Response) -> anyhow::Result<ApiReply> {
    let status = response.status();
    let content_disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = response.bytes().await?;
    let body: Value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| json!({ "error": String::from_utf8_lossy(&bytes) }))
    };

    if status.is_success() {
        Ok(ApiReply { body, content_disposition })
    } else {
        Err(ApiFailure::from_body(status, &body).into())
    }
}
