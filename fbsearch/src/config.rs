use crate::error::{Result, SearchError};
use std::env;
use std::time::Duration;
use uuid::Uuid;

pub const DEFAULT_API_DOMAIN: &str = "i.instagram.com";
pub const DEFAULT_WEB_DOMAIN: &str = "www.instagram.com";
pub const DEFAULT_APP_ID: &str = "936619743392459";
pub const DEFAULT_USER_AGENT: &str = "Instagram 269.0.0.18.75 Android (26/8.0.0; 480dpi; 1080x1920; OnePlus; 6T Dev; devitron; qcom; en_US; 314665256)";
pub const DEFAULT_BIND: &str = "0.0.0.0:5000";

/// Per-session values every search call reads but never changes.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionContext {
    /// Seconds east of UTC, sent as `timezone_offset`.
    pub timezone_offset: i64,
    /// Sent as `search_session_id` on the first web top-search page.
    pub client_session_id: String,
}

impl SessionContext {
    pub fn new(timezone_offset: i64, client_session_id: impl Into<String>) -> Self {
        Self {
            timezone_offset,
            client_session_id: client_session_id.into(),
        }
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new(0, Uuid::new_v4().to_string())
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub sessionid: Option<String>,
    pub user_agent: String,
    pub app_id: String,
    pub api_domain: String,
    pub web_domain: String,
    pub http_timeout: Duration,
    pub bind_addr: String,
    pub session: SessionContext,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sessionid: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            app_id: DEFAULT_APP_ID.to_string(),
            api_domain: DEFAULT_API_DOMAIN.to_string(),
            web_domain: DEFAULT_WEB_DOMAIN.to_string(),
            http_timeout: Duration::from_secs(30),
            bind_addr: DEFAULT_BIND.to_string(),
            session: SessionContext::default(),
        }
    }
}

impl Config {
    /// Build from `IG_*` environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Config::default();

        let timezone_offset = match get("IG_TIMEZONE_OFFSET") {
            Some(raw) => raw.trim().parse::<i64>().map_err(|e| {
                SearchError::Config(format!("IG_TIMEZONE_OFFSET={}: {}", raw, e))
            })?,
            None => 0,
        };
        let http_timeout = match get("IG_HTTP_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(raw.trim().parse::<u64>().map_err(|e| {
                SearchError::Config(format!("IG_HTTP_TIMEOUT_SECS={}: {}", raw, e))
            })?),
            None => defaults.http_timeout,
        };
        let client_session_id = get("IG_CLIENT_SESSION_ID")
            .unwrap_or_else(|| defaults.session.client_session_id.clone());

        Ok(Self {
            sessionid: get("IG_SESSIONID"),
            user_agent: get("IG_USER_AGENT").unwrap_or(defaults.user_agent),
            app_id: get("IG_APP_ID").unwrap_or(defaults.app_id),
            api_domain: get("IG_API_DOMAIN").unwrap_or(defaults.api_domain),
            web_domain: get("IG_WEB_DOMAIN").unwrap_or(defaults.web_domain),
            http_timeout,
            bind_addr: get("FBSEARCH_BIND").unwrap_or(defaults.bind_addr),
            session: SessionContext::new(timezone_offset, client_session_id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_env_is_empty() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.api_domain, DEFAULT_API_DOMAIN);
        assert_eq!(config.web_domain, DEFAULT_WEB_DOMAIN);
        assert_eq!(config.session.timezone_offset, 0);
        assert!(config.sessionid.is_none());
        assert!(!config.session.client_session_id.is_empty());
        assert_eq!(config.http_timeout, Duration::from_secs(30));
    }

    #[test]
    fn env_values_override_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            ("IG_SESSIONID", "abc%3A123"),
            ("IG_TIMEZONE_OFFSET", "-18000"),
            ("IG_CLIENT_SESSION_ID", "session-1"),
            ("IG_HTTP_TIMEOUT_SECS", "5"),
            ("IG_API_DOMAIN", "   "),
        ]))
        .unwrap();
        assert_eq!(config.sessionid.as_deref(), Some("abc%3A123"));
        assert_eq!(config.session, SessionContext::new(-18000, "session-1"));
        assert_eq!(config.http_timeout, Duration::from_secs(5));
        // blank values count as unset
        assert_eq!(config.api_domain, DEFAULT_API_DOMAIN);
    }

    #[test]
    fn bad_timezone_offset_is_a_config_error() {
        let err = Config::from_lookup(lookup_from(&[("IG_TIMEZONE_OFFSET", "utc")])).unwrap_err();
        assert!(matches!(err, SearchError::Config(_)));
    }
}
