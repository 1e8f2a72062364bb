use std::time::Duration;

use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE},
    Client, Method, Response,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, warn};

use shared_config::AppConfig;
use shared_models::error::AppError;

/// Thin wrapper over the clinic REST backend. Every failure is classified
/// into the transport / rejection split of [`AppError`].
#[derive(Debug, Clone)]
pub struct ClinicApiClient {
    client: Client,
    base_url: String,
}

impl ClinicApiClient {
    pub fn new(config: &AppConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                warn!("Could not build HTTP client with timeout ({}), using defaults", e);
                Client::new()
            });

        Self {
            client,
            base_url: config.clinic_api_url.clone(),
        }
    }

    fn get_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<Response, AppError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut req = self.client.request(method, &url).headers(self.get_headers());

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await.map_err(|e| {
            error!("No response from {}: {}", url, e);
            AppError::Transport(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("API error ({}) for {}: {}", status, url, error_text);

            return Err(AppError::Rejected {
                status: status.as_u16(),
                message: error_text,
            });
        }

        Ok(response)
    }

    pub async fn request<T>(&self, method: Method, path: &str, body: Option<Value>) -> Result<T, AppError>
    where
        T: DeserializeOwned,
    {
        let response = self.send(method, path, body).await?;

        let is_html = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.starts_with("text/html"))
            .unwrap_or(false);
        if is_html {
            error!("Backend answered {} with HTML instead of JSON", path);
            return Err(AppError::Internal(
                "The clinic API answered with HTML instead of JSON; check that the backend is running".to_string(),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::Transport(e.to_string()))?;

        serde_json::from_slice::<T>(&bytes).map_err(|e| {
            error!("Malformed response body from {}: {}", path, e);
            AppError::Internal(format!("Malformed response from clinic API: {}", e))
        })
    }

    /// For endpoints that answer with an empty body (DELETE).
    pub async fn request_empty(&self, method: Method, path: &str, body: Option<Value>) -> Result<(), AppError> {
        self.send(method, path, body).await?;
        Ok(())
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}
