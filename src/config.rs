use std::env;
use std::time::Duration;

use crate::http_client::DEFAULT_REQUEST_TIMEOUT_SECS;

const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000";
const LIVE_WS_PATH: &str = "/ws/live-matches";
const DEFAULT_RECONNECT_SECS: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveSource {
    WebSocket,
    Fake,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub api_base: String,
    pub ws_url: String,
    pub auth_token: Option<String>,
    pub live_source: LiveSource,
    /// `None` disables host-level reconnect.
    pub reconnect_delay: Option<Duration>,
    pub request_timeout_secs: u64,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_base = non_empty("GFPS_API_BASE")
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();
        let ws_url = non_empty("GFPS_WS_URL").unwrap_or_else(|| websocket_url(&api_base));
        let auth_token = non_empty("GFPS_AUTH_TOKEN");
        let live_source = match non_empty("GFPS_LIVE_SOURCE")
            .map(|v| v.to_ascii_lowercase())
            .as_deref()
        {
            Some("fake") | Some("demo") => LiveSource::Fake,
            _ => LiveSource::WebSocket,
        };
        let reconnect_secs = non_empty("GFPS_RECONNECT_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_RECONNECT_SECS);
        let reconnect_delay =
            (reconnect_secs > 0).then(|| Duration::from_secs(reconnect_secs.clamp(1, 300)));
        let request_timeout_secs = non_empty("GFPS_REQUEST_TIMEOUT_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
            .clamp(1, 120);

        Self {
            api_base,
            ws_url,
            auth_token,
            live_source,
            reconnect_delay,
            request_timeout_secs,
        }
    }
}

/// Live channel URL for an API base: `http` maps to `ws`, `https` to `wss`.
pub fn websocket_url(api_base: &str) -> String {
    let base = api_base.trim().trim_end_matches('/');
    let (scheme, host) = if let Some(rest) = base.strip_prefix("https://") {
        ("wss", rest)
    } else if let Some(rest) = base.strip_prefix("http://") {
        ("ws", rest)
    } else {
        ("ws", base)
    };
    format!("{scheme}://{host}{LIVE_WS_PATH}")
}
