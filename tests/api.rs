use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

use gfps_client::api::ApiClient;
use gfps_client::config::ClientConfig;

// Answers a single request with `body` and hands back the request head it saw.
fn serve_once(body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind local listener");
    let addr = listener.local_addr().expect("listener address");
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept request");
        let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
        let mut head = String::new();
        loop {
            let mut line = String::new();
            let n = reader.read_line(&mut line).expect("read request line");
            if n == 0 || line == "\r\n" {
                break;
            }
            head.push_str(&line);
        }
        write!(
            stream,
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        )
        .expect("write response");
        head
    });
    (format!("http://{addr}"), handle)
}

fn config_for(base: &str, token: &str) -> ClientConfig {
    let base = base.to_string();
    let token = token.to_string();
    ClientConfig::from_lookup(move |key| match key {
        "GFPS_API_BASE" => Some(base.clone()),
        "GFPS_AUTH_TOKEN" => Some(token.clone()),
        _ => None,
    })
}

#[test]
fn live_odds_sends_configured_token_as_bearer() {
    let (base, server) = serve_once(
        r#"{"outrights":[{"market":"Demo FC vs Sample United","home":1.95,"draw":3.3,"away":4.1}],"markets":{}}"#,
    );
    let cfg = config_for(&base, "  secret-token ");
    let token = cfg.auth_token.as_deref().expect("token should be configured");

    let api = ApiClient::new(&cfg).expect("client should build");
    let odds = api.fetch_live_odds(token).expect("live odds should load");
    let head = server.join().expect("server thread").to_ascii_lowercase();

    assert!(head.starts_with("get /live-odds "), "unexpected request: {head}");
    assert!(head.contains("authorization: bearer secret-token\r\n"));
    assert_eq!(odds.outrights.len(), 1);
    assert_eq!(odds.outrights[0].draw, 3.3);
}

#[test]
fn coupon_history_passes_token_as_query() {
    let (base, server) = serve_once(
        r#"{"items":[{"id":3,"name":"Friday double","status":"open","total_odds":2.5,"total_prob":0.4,"total_ev":0.0}]}"#,
    );
    let cfg = config_for(&base, "abc");

    let api = ApiClient::new(&cfg).expect("client should build");
    let coupons = api
        .list_coupons(cfg.auth_token.as_deref().expect("token should be configured"))
        .expect("coupon list should load");
    let head = server.join().expect("server thread");

    assert!(head.starts_with("GET /coupon/list?token=abc "), "unexpected request: {head}");
    assert_eq!(coupons.len(), 1);
    assert_eq!(coupons[0].name, "Friday double");
}
