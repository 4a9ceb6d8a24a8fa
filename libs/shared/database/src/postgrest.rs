use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_TYPE},
    Client, Method,
};
use serde::de::DeserializeOwned;
use thiserror::Error;
use serde_json::Value;
use tracing::{debug, error};

use shared_config::AppConfig;

/// Errors surfaced by the storage boundary. `Conflict` carries the
/// uniqueness violations the database enforces for active appointments.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage conflict: {0}")]
    Conflict(String),

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("authentication error: {0}")]
    Unauthorized(String),

    #[error("storage api error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

pub struct PostgrestClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl PostgrestClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.postgrest_url.clone(),
            api_key: config.postgrest_api_key.clone(),
        }
    }

    fn get_headers(&self, extra: Option<HeaderMap>) -> HeaderMap {
        let mut headers = HeaderMap::new();

        if let Ok(key) = HeaderValue::from_str(&self.api_key) {
            headers.insert("apikey", key);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(extra) = extra {
            headers.extend(extra);
        }

        headers
    }

    pub async fn request<T>(&self, method: Method, path: &str, body: Option<Value>) -> Result<T, StorageError>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(method, path, body, None).await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        headers: Option<HeaderMap>,
    ) -> Result<T, StorageError>
    where
        T: DeserializeOwned,
    {
        let response = self.send(method, path, body, headers).await?;
        let data = response.json::<T>().await?;
        Ok(data)
    }

    /// Fire a request whose response body is irrelevant (DELETE and
    /// PATCH calls without a representation preference).
    pub async fn execute(&self, method: Method, path: &str, body: Option<Value>) -> Result<(), StorageError> {
        self.send(method, path, body, None).await?;
        Ok(())
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        headers: Option<HeaderMap>,
    ) -> Result<reqwest::Response, StorageError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making request to {}", url);

        let mut req = self.client.request(method, &url).headers(self.get_headers(headers));

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Storage API error ({}): {}", status, error_text);

            return Err(match status.as_u16() {
                401 | 403 => StorageError::Unauthorized(error_text),
                404 => StorageError::NotFound(error_text),
                409 => StorageError::Conflict(error_text),
                code => StorageError::Api { status: code, message: error_text },
            });
        }

        Ok(response)
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}
