use std::collections::HashMap;
use std::time::Duration;

use gfps_client::config::{ClientConfig, LiveSource, websocket_url};

fn config_from(pairs: &[(&str, &str)]) -> ClientConfig {
    let env: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    ClientConfig::from_lookup(|key| env.get(key).cloned())
}

#[test]
fn websocket_url_follows_api_scheme() {
    assert_eq!(
        websocket_url("http://10.0.2.2:8000/"),
        "ws://10.0.2.2:8000/ws/live-matches"
    );
    assert_eq!(
        websocket_url("https://api.example.com"),
        "wss://api.example.com/ws/live-matches"
    );
    assert_eq!(
        websocket_url("localhost:8000"),
        "ws://localhost:8000/ws/live-matches"
    );
}

#[test]
fn defaults_when_nothing_is_set() {
    let cfg = config_from(&[]);
    assert_eq!(cfg.api_base, "http://127.0.0.1:8000");
    assert_eq!(cfg.ws_url, "ws://127.0.0.1:8000/ws/live-matches");
    assert_eq!(cfg.auth_token, None);
    assert_eq!(cfg.live_source, LiveSource::WebSocket);
    assert_eq!(cfg.reconnect_delay, Some(Duration::from_secs(5)));
    assert_eq!(cfg.request_timeout_secs, 15);
}

#[test]
fn reads_and_clamps_overrides() {
    let cfg = config_from(&[
        ("GFPS_API_BASE", "https://gfps.example.com///"),
        ("GFPS_AUTH_TOKEN", "  abc  "),
        ("GFPS_LIVE_SOURCE", "FAKE"),
        ("GFPS_RECONNECT_SECS", "9999"),
        ("GFPS_REQUEST_TIMEOUT_SECS", "0"),
    ]);
    assert_eq!(cfg.api_base, "https://gfps.example.com");
    assert_eq!(cfg.ws_url, "wss://gfps.example.com/ws/live-matches");
    assert_eq!(cfg.auth_token.as_deref(), Some("abc"));
    assert_eq!(cfg.live_source, LiveSource::Fake);
    assert_eq!(cfg.reconnect_delay, Some(Duration::from_secs(300)));
    assert_eq!(cfg.request_timeout_secs, 1);
}

#[test]
fn explicit_ws_url_and_disabled_reconnect() {
    let cfg = config_from(&[
        ("GFPS_WS_URL", "ws://feed.local/live"),
        ("GFPS_AUTH_TOKEN", "   "),
        ("GFPS_RECONNECT_SECS", "0"),
    ]);
    assert_eq!(cfg.ws_url, "ws://feed.local/live");
    assert_eq!(cfg.auth_token, None);
    assert_eq!(cfg.reconnect_delay, None);
}
