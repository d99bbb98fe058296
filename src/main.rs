use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use gfps_client::api::ApiClient;
use gfps_client::config::{ClientConfig, LiveSource};
use gfps_client::fake_feed::spawn_fake_feed;
use gfps_client::live_feed::spawn_live_feed;
use gfps_client::live_store::{FeedEvent, FrameOutcome, LiveStateStore};
use gfps_client::state::{FixtureStatus, LiveMatchState};

const FAKE_TICK: Duration = Duration::from_millis(500);

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .init();

    let cfg = ClientConfig::from_env();
    info!(api = %cfg.api_base, ws = %cfg.ws_url, source = ?cfg.live_source, "starting");

    if cfg.live_source == LiveSource::WebSocket {
        log_service_reads(&cfg);
    }

    let mut store = LiveStateStore::new();
    store.subscribe(log_summary);

    let (tx, rx) = mpsc::channel::<FeedEvent>();
    loop {
        let feed = match cfg.live_source {
            LiveSource::WebSocket => spawn_live_feed(cfg.ws_url.clone(), tx.clone()),
            LiveSource::Fake => spawn_fake_feed(tx.clone(), FAKE_TICK),
        };

        while let Ok(event) = rx.recv() {
            let closed = matches!(event, FeedEvent::Closed { .. });
            match store.handle_feed_event(event) {
                Some(FrameOutcome::Applied(kind)) => debug!(kind = kind.tag(), "applied"),
                Some(FrameOutcome::Ignored(kind)) => debug!(%kind, "ignored"),
                Some(FrameOutcome::Malformed(_)) | Some(FrameOutcome::Inactive) | None => {}
            }
            if closed {
                break;
            }
        }
        feed.stop();

        match (cfg.live_source, cfg.reconnect_delay) {
            (LiveSource::WebSocket, Some(delay)) => {
                info!("reconnecting in {}s", delay.as_secs());
                thread::sleep(delay);
            }
            _ => break,
        }
    }

    let last = store.snapshot();
    info!(
        fixtures = last.fixtures.len(),
        finished = last
            .fixtures
            .iter()
            .filter(|f| f.status == FixtureStatus::Finished)
            .count(),
        "live feed done"
    );
    Ok(())
}

fn log_service_reads(cfg: &ClientConfig) {
    let api = match ApiClient::new(cfg) {
        Ok(api) => api,
        Err(err) => {
            warn!("api client unavailable: {err:#}");
            return;
        }
    };

    match api.fetch_value_bets() {
        Ok(bets) => {
            for bet in bets.iter().take(5) {
                info!(
                    "[VALUE] {} | {} @ {:.2} | p={:.2} ev={:+.2}",
                    bet.match_label,
                    bet.market,
                    bet.odds,
                    bet.model_probability,
                    bet.expected_value
                );
            }
        }
        Err(err) => warn!("value bets unavailable: {err:#}"),
    }

    let Some(token) = cfg.auth_token.as_deref() else {
        debug!("GFPS_AUTH_TOKEN unset, skipping live odds and coupon history");
        return;
    };
    match api.fetch_live_odds(token) {
        Ok(odds) => {
            for row in odds.outrights.iter().take(5) {
                info!(
                    "[ODDS] {} | {:.2} / {:.2} / {:.2} ({})",
                    row.market,
                    row.home,
                    row.draw,
                    row.away,
                    row.source.as_deref().unwrap_or("-")
                );
            }
        }
        Err(err) => warn!("live odds unavailable: {err:#}"),
    }
    match api.list_coupons(token) {
        Ok(coupons) => info!("[COUPONS] {} saved", coupons.len()),
        Err(err) => warn!("coupon history unavailable: {err:#}"),
    }
}

fn log_summary(state: &LiveMatchState) {
    let live = state
        .live_fixtures()
        .map(|f| {
            let score = f
                .score
                .map(|s| format!("{}-{}", s.home, s.away))
                .unwrap_or_else(|| "-".to_string());
            format!(
                "{} {} {} ({} ev)",
                f.label(),
                score,
                f.timer.as_deref().unwrap_or(""),
                state.events_for(&f.id).len()
            )
        })
        .collect::<Vec<_>>();
    info!(
        "[LIVE] {} fixtures, {} live: {}",
        state.fixtures.len(),
        live.len(),
        live.join(" | ")
    );
}
