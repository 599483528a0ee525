use crate::{
    config::{ForgeConfig, TimeoutCategory},
    error::{ForgeError, Result},
    forge::response::error_report,
};
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

pub const API_PREFIX: &str = "/sdapi/v1";

/// HTTP client for a single logical operation. It carries the base URL,
/// credentials and one timeout category; dropping it releases its connections.
pub struct ForgeConnection {
    client: Client,
    base_url: String,
    auth: Option<(String, String)>,
    timeout: Duration,
}

impl ForgeConnection {
    pub fn open(config: &ForgeConfig, category: TimeoutCategory) -> Result<Self> {
        let timeout = config.timeout(category);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ForgeError::ClientError(format!("Failed to build HTTP client: {}", e)))?;

        let auth = config
            .username
            .clone()
            .map(|user| (user, config.password.clone().unwrap_or_default()));

        log::debug!(
            "Opened {} connection to {} (timeout {:?}, auth: {})",
            category,
            config.base_url,
            timeout,
            auth.is_some()
        );

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            auth,
            timeout,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, API_PREFIX, path)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Sends the request; any HTTP status counts as success here.
    pub async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Response> {
        let mut request = self.client.request(method.clone(), self.url(path));
        if let Some((user, password)) = &self.auth {
            request = request.basic_auth(user, Some(password));
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        log::debug!("{} {} -> {}", method, path, response.status());
        Ok(response)
    }

    /// Sends the request and fails with a [`ForgeError::BackendError`] on a non-2xx status.
    pub async fn send_checked(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Response> {
        let response = self.send(method, path, body).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let report = error_report(response).await;
        log::warn!("{} {}", path, report);
        Err(ForgeError::BackendError(report))
    }

    pub async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T> {
        let response = self.send_checked(method, path, body).await?;
        let text = response
            .text()
            .await
            .map_err(|e| self.transport_error(e))?;
        serde_json::from_str(&text).map_err(|e| {
            log::error!("Could not parse {} response: {}", path, e);
            ForgeError::ResponseError(format!("{}: {}", path, e))
        })
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.call(Method::GET, path, None).await
    }

    pub async fn post_json<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T> {
        self.call(Method::POST, path, Some(body)).await
    }

    /// POST whose response body is ignored.
    pub async fn post_unit(&self, path: &str, body: Option<&Value>) -> Result<()> {
        self.send_checked(Method::POST, path, body).await.map(|_| ())
    }

    fn transport_error(&self, e: reqwest::Error) -> ForgeError {
        if e.is_timeout() {
            log::warn!("Forge request timed out after {:?}", self.timeout);
            ForgeError::Timeout(self.timeout)
        } else {
            log::error!("Forge request failed: {}", e);
            ForgeError::RequestError(e.to_string())
        }
    }
}
