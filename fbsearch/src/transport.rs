use crate::config::Config;
use crate::error::{Result, SearchError};
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoffBuilder;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Query parameters for a single private API call.
pub type Params = HashMap<String, String>;

/// Authenticated access to the private API.
///
/// Implementations return the parsed JSON object of a successful response.
/// `domain` selects an alternate host; `None` means the default API host.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    async fn private_request(
        &self,
        path: &str,
        params: &Params,
        domain: Option<&str>,
    ) -> Result<Value>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn private_request(
        &self,
        path: &str,
        params: &Params,
        domain: Option<&str>,
    ) -> Result<Value> {
        (**self).private_request(path, params, domain).await
    }
}

/// reqwest-backed transport with bounded exponential retries on transient failures.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    api_domain: String,
    app_id: String,
    user_agent: String,
    sessionid: Option<String>,
    max_elapsed: Duration,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            api_domain: config.api_domain.clone(),
            app_id: config.app_id.clone(),
            user_agent: config.user_agent.clone(),
            sessionid: config.sessionid.clone(),
            max_elapsed: Duration::from_secs(4),
        }
    }

    pub(crate) fn endpoint_url(&self, path: &str, domain: Option<&str>) -> Result<Url> {
        let host = domain.unwrap_or(&self.api_domain);
        let base = if host.contains("://") {
            format!("{}/api/v1/", host.trim_end_matches('/'))
        } else {
            format!("https://{}/api/v1/", host)
        };
        Url::parse(&base)
            .and_then(|b| b.join(path.trim_start_matches('/')))
            .map_err(|e| SearchError::Config(format!("bad endpoint {}{}: {}", base, path, e)))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn private_request(
        &self,
        path: &str,
        params: &Params,
        domain: Option<&str>,
    ) -> Result<Value> {
        let url = self.endpoint_url(path, domain)?;
        debug!("GET {} ({} params)", url, params.len());

        let cookie = self.sessionid.as_ref().map(|s| format!("sessionid={}", s));
        let url = &url;
        let cookie = cookie.as_deref();
        let value: Value = retry(
            ExponentialBackoffBuilder::new()
                .with_initial_interval(Duration::from_millis(200))
                .with_max_interval(Duration::from_secs(2))
                .with_max_elapsed_time(Some(self.max_elapsed))
                .build(),
            || async move {
                let mut req = self
                    .client
                    .get(url.clone())
                    .query(params)
                    .header("User-Agent", &self.user_agent)
                    .header("Accept", "*/*")
                    .header("X-IG-App-ID", &self.app_id);
                if let Some(cookie) = cookie {
                    req = req.header("Cookie", cookie);
                }
                let resp = req.send().await.map_err(|e| {
                    if e.is_connect() || e.is_timeout() {
                        backoff::Error::transient(SearchError::Http(e))
                    } else {
                        backoff::Error::permanent(SearchError::Http(e))
                    }
                })?;
                let status = resp.status();
                if !status.is_success() {
                    let body = resp.text().await.unwrap_or_default();
                    let err = SearchError::Status {
                        path: path.to_string(),
                        status: status.as_u16(),
                        body: body.chars().take(500).collect(),
                    };
                    // 5xx transient, others permanent
                    return if status.is_server_error() {
                        Err(backoff::Error::transient(err))
                    } else {
                        Err(backoff::Error::permanent(err))
                    };
                }
                resp.json::<Value>()
                    .await
                    .map_err(|e| backoff::Error::permanent(SearchError::Http(e)))
            },
        )
        .await
        .map_err(|e| {
            info!("request to {} gave up: {}", path, e);
            e
        })?;

        check_api_status(path, value)
    }
}

/// Reject bodies that are not objects or that carry `status: "fail"`.
pub(crate) fn check_api_status(path: &str, value: Value) -> Result<Value> {
    if !value.is_object() {
        return Err(SearchError::missing("response body", "object"));
    }
    if value.get("status").and_then(Value::as_str) == Some("fail") {
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        return Err(SearchError::ApiFail {
            path: path.to_string(),
            message,
        });
    }
    Ok(value)
}
