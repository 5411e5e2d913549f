use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use shared_config::AppConfig;

/// Failure modes of the PostgREST storage layer.
///
/// `Conflict` is load-bearing: the `appointments` table carries a partial
/// unique index over `(doctor_id, date, start_time)` for active statuses,
/// and PostgREST reports a violation as HTTP 409. Callers that insert
/// must be able to branch on it.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage conflict: {0}")]
    Conflict(String),

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("storage authentication rejected: {0}")]
    Auth(String),

    #[error("storage transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected storage response ({status}): {body}")]
    Unexpected { status: u16, body: String },
}

pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.clone(),
            anon_key: config.supabase_anon_key.clone(),
        }
    }

    fn get_headers(&self, auth_token: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();

        if let Ok(key) = HeaderValue::from_str(&self.anon_key) {
            headers.insert("apikey", key);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = auth_token {
            if let Ok(bearer) = HeaderValue::from_str(&format!("Bearer {}", token)) {
                headers.insert(AUTHORIZATION, bearer);
            }
        }

        headers
    }

    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
    ) -> Result<T, StorageError>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(method, path, auth_token, body, None)
            .await
    }

    /// Like `request`, with extra headers merged in (`Prefer:
    /// return=representation` for writes, `resolution=merge-duplicates`
    /// for upserts).
    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<T, StorageError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making request to {}", url);

        let mut headers = self.get_headers(auth_token);
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url).headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Storage API error ({}): {}", status, error_text);

            return Err(match status.as_u16() {
                401 | 403 => StorageError::Auth(error_text),
                404 => StorageError::NotFound(error_text),
                409 => StorageError::Conflict(error_text),
                code => StorageError::Unexpected {
                    status: code,
                    body: error_text,
                },
            });
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }
}
