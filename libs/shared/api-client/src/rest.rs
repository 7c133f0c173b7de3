use anyhow::{anyhow, Result};
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    Client, Method, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error};

use shared_config::AppConfig;

use crate::token::{token_store_from_config, TokenStore};

pub struct ApiClient {
    client: Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
}

impl ApiClient {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_token_store(config, token_store_from_config(config))
    }

    pub fn with_token_store(config: &AppConfig, tokens: Arc<dyn TokenStore>) -> Self {
        Self {
            client: Client::new(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            tokens,
        }
    }

    fn get_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(token) = self.tokens.read_token() {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| anyhow!("Authentication error: stored token is not a valid header value"))?;
            headers.insert(AUTHORIZATION, value);
        }

        Ok(headers)
    }

    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut req = self.client.request(method, &url).headers(self.get_headers()?);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = extract_error_message(&error_text);
            error!("API error ({}): {}", status, message);

            return Err(map_status_error(status, &message));
        }

        Ok(response)
    }

    pub async fn request<T>(&self, method: Method, path: &str, body: Option<Value>) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = self.send(method, path, body).await?;
        let data = response.json::<T>().await?;
        Ok(data)
    }

    /// For endpoints whose success body is empty or irrelevant.
    pub async fn request_empty(&self, method: Method, path: &str, body: Option<Value>) -> Result<()> {
        self.send(method, path, body).await?;
        Ok(())
    }
}

fn map_status_error(status: StatusCode, message: &str) -> anyhow::Error {
    match status.as_u16() {
        400 | 422 => anyhow!("Bad request: {}", message),
        401 | 403 => anyhow!("Authentication error: {}", message),
        404 => anyhow!("Resource not found: {}", message),
        409 => anyhow!("Conflict: {}", message),
        _ => anyhow!("API error ({}): {}", status, message),
    }
}

// The API answers errors as `{"error": ...}` or `{"message": ...}`; anything
// else is passed through verbatim.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("error")
                .or_else(|| value.get("message"))
                .and_then(|v| v.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}
