use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use rand::Rng;
use serde_json::json;

use crate::live_feed::FeedHandle;
use crate::live_store::FeedEvent;
use crate::state::{
    Fixture, FixtureStatus, MarketKind, MarketLine, MatchEvent, MatchEventKind, Score,
};

const FULL_TIME_MINUTE: u32 = 90;
const MARKETS_EVERY_TICKS: u32 = 10;
const HEARTBEAT_EVERY_TICKS: u32 = 15;

/// Offline stand-in for the live channel: plays a scripted match day as JSON text frames.
pub fn spawn_fake_feed(tx: Sender<FeedEvent>, tick: Duration) -> FeedHandle {
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = stop.clone();
    let join = thread::spawn(move || {
        let reason = run_fake_feed(&tx, tick, &stop_flag);
        let _ = tx.send(FeedEvent::Closed { reason });
    });
    FeedHandle::new(stop, join)
}

fn run_fake_feed(tx: &Sender<FeedEvent>, tick: Duration, stop: &AtomicBool) -> Option<String> {
    let mut rng = rand::thread_rng();
    let mut fixtures = seed_fixtures();
    let mut markets = seed_markets(&fixtures);

    if tx.send(FeedEvent::Connecting).is_err() || tx.send(FeedEvent::Opened).is_err() {
        return None;
    }
    let snapshot = json!({
        "type": "snapshot",
        "fixtures": fixtures,
        "events": HashMap::<String, Vec<MatchEvent>>::new(),
        "markets": markets,
    });
    if !send_frame(tx, &snapshot) {
        return None;
    }

    let mut ticks: u32 = 0;
    loop {
        thread::sleep(tick);
        if stop.load(Ordering::Relaxed) {
            return None;
        }
        ticks = ticks.wrapping_add(1);

        // One fixture moves at a time, in feed order, like a staggered kickoff list.
        let Some(idx) = fixtures
            .iter()
            .position(|f| f.status != FixtureStatus::Finished)
        else {
            return Some("demo match day finished".to_string());
        };

        let mut frames = Vec::new();
        let fixture = &mut fixtures[idx];
        match fixture.status {
            FixtureStatus::Scheduled => {
                fixture.status = FixtureStatus::Live;
                fixture.timer = Some("1'".to_string());
                fixture.score = Some(Score { home: 0, away: 0 });
                frames.push(event_frame(&fixture.id, 1, MatchEventKind::Info, "Kick-off"));
            }
            FixtureStatus::Live => {
                let minute = timer_minute(fixture.timer.as_deref()) + 1;
                if minute >= FULL_TIME_MINUTE {
                    fixture.status = FixtureStatus::Finished;
                    fixture.timer = None;
                    frames.push(event_frame(
                        &fixture.id,
                        FULL_TIME_MINUTE,
                        MatchEventKind::Info,
                        "Full time",
                    ));
                } else {
                    fixture.timer = Some(format!("{minute}'"));
                    if rng.gen_bool(0.12) {
                        let (kind, desc) = match rng.gen_range(0..3) {
                            0 => (MatchEventKind::Goal, "Goal"),
                            1 => (MatchEventKind::Card, "Yellow card"),
                            _ => (MatchEventKind::Substitution, "Substitution"),
                        };
                        let home_side = rng.gen_bool(0.5);
                        let team = if home_side {
                            fixture.home_team.clone()
                        } else {
                            fixture.away_team.clone()
                        };
                        if kind == MatchEventKind::Goal
                            && let Some(score) = fixture.score.as_mut()
                        {
                            if home_side {
                                score.home += 1;
                            } else {
                                score.away += 1;
                            }
                        }
                        frames.push(event_frame(
                            &fixture.id,
                            minute,
                            kind,
                            &format!("{desc} ({team})"),
                        ));
                    }
                }
            }
            FixtureStatus::Finished => {}
        }
        frames.insert(0, json!({ "type": "fixtures", "fixtures": fixtures }));

        if ticks % MARKETS_EVERY_TICKS == 0 {
            jitter_markets(&mut markets, &mut rng);
            frames.push(json!({ "type": "markets", "markets": markets }));
        }
        if ticks % HEARTBEAT_EVERY_TICKS == 0 {
            frames.push(json!({ "type": "heartbeat" }));
        }

        for frame in &frames {
            if !send_frame(tx, frame) {
                return None;
            }
        }
    }
}

fn send_frame(tx: &Sender<FeedEvent>, frame: &serde_json::Value) -> bool {
    tx.send(FeedEvent::Frame(frame.to_string())).is_ok()
}

fn event_frame(
    fixture_id: &str,
    minute: u32,
    kind: MatchEventKind,
    description: &str,
) -> serde_json::Value {
    let event = MatchEvent {
        minute,
        description: description.to_string(),
        kind,
    };
    json!({
        "type": "event",
        "fixtureId": fixture_id,
        "event": event,
    })
}

fn timer_minute(timer: Option<&str>) -> u32 {
    timer
        .and_then(|t| t.trim().trim_end_matches('\'').parse::<u32>().ok())
        .unwrap_or(1)
}

fn seed_fixtures() -> Vec<Fixture> {
    let start = Utc::now();
    let teams = [
        ("1", "Premier League", "Demo FC", "Sample United"),
        ("2", "La Liga", "Example Town", "Placeholder City"),
        ("3", "Serie A", "Mock Rovers", "Fixture Athletic"),
    ];
    teams
        .iter()
        .enumerate()
        .map(|(i, (id, league, home, away))| Fixture {
            id: id.to_string(),
            home_team: home.to_string(),
            away_team: away.to_string(),
            league: league.to_string(),
            start_time: (start + ChronoDuration::hours(i as i64 + 1))
                .format("%Y-%m-%dT%H:%M:%SZ")
                .to_string(),
            status: FixtureStatus::Scheduled,
            timer: None,
            score: None,
        })
        .collect()
}

fn seed_markets(fixtures: &[Fixture]) -> HashMap<String, Vec<MarketLine>> {
    let source = Some("DemoBook".to_string());
    fixtures
        .iter()
        .map(|f| {
            let lines = vec![
                MarketLine {
                    fixture_id: Some(f.id.clone()),
                    label: "Match Winner".to_string(),
                    kind: MarketKind::MatchResult,
                    line: None,
                    home: Some(1.95),
                    draw: Some(3.30),
                    away: Some(4.10),
                    over: None,
                    under: None,
                    source: source.clone(),
                },
                MarketLine {
                    fixture_id: Some(f.id.clone()),
                    label: "Total 2.5".to_string(),
                    kind: MarketKind::Total,
                    line: Some("2.5".to_string()),
                    home: None,
                    draw: None,
                    away: None,
                    over: Some(1.90),
                    under: Some(1.85),
                    source: source.clone(),
                },
                MarketLine {
                    fixture_id: Some(f.id.clone()),
                    label: "Handicap -1.0".to_string(),
                    kind: MarketKind::Handicap,
                    line: Some("-1.0".to_string()),
                    home: Some(2.15),
                    draw: None,
                    away: Some(1.76),
                    over: None,
                    under: None,
                    source: source.clone(),
                },
            ];
            (f.id.clone(), lines)
        })
        .collect()
}

fn jitter_markets(markets: &mut HashMap<String, Vec<MarketLine>>, rng: &mut impl Rng) {
    for line in markets.values_mut().flatten() {
        for price in [
            &mut line.home,
            &mut line.draw,
            &mut line.away,
            &mut line.over,
            &mut line.under,
        ]
        .into_iter()
        .flatten()
        {
            let delta = rng.gen_range(-0.08..0.08);
            *price = ((*price + delta) * 100.0).round().max(101.0) / 100.0;
        }
    }
}
