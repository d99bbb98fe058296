use std::collections::HashMap;

use gfps_client::state::{
    Delta, Fixture, FixtureStatus, LiveMatchState, MarketKind, MarketLine, MatchEvent,
    MatchEventKind, Score, apply_delta,
};

fn fixture(id: &str, status: FixtureStatus) -> Fixture {
    Fixture {
        id: id.to_string(),
        home_team: format!("HOME-{id}"),
        away_team: format!("AWAY-{id}"),
        league: "Premier League".to_string(),
        start_time: "2026-06-11T18:00:00Z".to_string(),
        status,
        timer: None,
        score: None,
    }
}

fn event(minute: u32, kind: MatchEventKind) -> MatchEvent {
    MatchEvent {
        minute,
        description: format!("{kind:?} at {minute}"),
        kind,
    }
}

fn total_line(fixture_id: &str, over: f64) -> MarketLine {
    MarketLine {
        fixture_id: Some(fixture_id.to_string()),
        label: "Total 2.5".to_string(),
        kind: MarketKind::Total,
        line: Some("2.5".to_string()),
        home: None,
        draw: None,
        away: None,
        over: Some(over),
        under: Some(1.85),
        source: None,
    }
}

fn populated() -> LiveMatchState {
    let mut state = LiveMatchState::new();
    apply_delta(
        &mut state,
        Delta::Snapshot {
            fixtures: vec![
                fixture("m1", FixtureStatus::Live),
                fixture("m2", FixtureStatus::Scheduled),
            ],
            events: HashMap::from([("m1".to_string(), vec![event(12, MatchEventKind::Goal)])]),
            markets: HashMap::from([("m1".to_string(), vec![total_line("m1", 1.9)])]),
        },
    );
    state
}

#[test]
fn snapshot_replaces_everything_and_is_idempotent() {
    let snapshot = Delta::Snapshot {
        fixtures: vec![fixture("m9", FixtureStatus::Scheduled)],
        events: HashMap::new(),
        markets: HashMap::from([("m9".to_string(), vec![total_line("m9", 2.0)])]),
    };

    let mut state = populated();
    apply_delta(&mut state, snapshot.clone());
    let once = state.clone();
    apply_delta(&mut state, snapshot);

    assert_eq!(state, once);
    assert_eq!(state.fixtures.len(), 1);
    assert_eq!(state.fixtures[0].id, "m9");
    assert!(state.events.is_empty());
    assert_eq!(state.markets_for("m9").len(), 1);
    assert!(state.markets_for("m1").is_empty());
}

#[test]
fn snapshot_may_move_status_backwards() {
    let mut state = LiveMatchState::new();
    apply_delta(
        &mut state,
        Delta::SetFixtures(vec![fixture("m1", FixtureStatus::Finished)]),
    );
    apply_delta(
        &mut state,
        Delta::Snapshot {
            fixtures: vec![fixture("m1", FixtureStatus::Live)],
            events: HashMap::new(),
            markets: HashMap::new(),
        },
    );
    assert_eq!(state.fixture("m1").map(|f| f.status), Some(FixtureStatus::Live));
}

#[test]
fn events_append_in_arrival_order_regardless_of_minute() {
    let mut state = LiveMatchState::new();
    let minutes = [70, 5, 45, 45, 2];
    for minute in minutes {
        apply_delta(
            &mut state,
            Delta::AddEvent {
                fixture_id: "m1".to_string(),
                event: event(minute, MatchEventKind::Info),
            },
        );
    }

    let got: Vec<u32> = state.events_for("m1").iter().map(|e| e.minute).collect();
    assert_eq!(got, minutes);
    assert!(state.events_for("m2").is_empty());
}

#[test]
fn event_for_unknown_fixture_creates_its_sequence() {
    let mut state = populated();
    apply_delta(
        &mut state,
        Delta::AddEvent {
            fixture_id: "not-listed".to_string(),
            event: event(3, MatchEventKind::Card),
        },
    );
    assert_eq!(state.events_for("not-listed").len(), 1);
    assert_eq!(state.events_for("m1").len(), 1);
}

#[test]
fn message_kinds_only_touch_their_own_mapping() {
    let base = populated();

    let mut state = base.clone();
    apply_delta(
        &mut state,
        Delta::SetFixtures(vec![fixture("m3", FixtureStatus::Scheduled)]),
    );
    assert_eq!(state.events, base.events);
    assert_eq!(state.markets, base.markets);
    assert_eq!(state.fixtures.len(), 1);

    let mut state = base.clone();
    apply_delta(
        &mut state,
        Delta::SetMarkets(HashMap::from([(
            "m2".to_string(),
            vec![total_line("m2", 2.4)],
        )])),
    );
    assert_eq!(state.fixtures, base.fixtures);
    assert_eq!(state.events, base.events);
    assert!(state.markets_for("m1").is_empty());

    let mut state = base.clone();
    apply_delta(
        &mut state,
        Delta::AddEvent {
            fixture_id: "m1".to_string(),
            event: event(30, MatchEventKind::Substitution),
        },
    );
    assert_eq!(state.fixtures, base.fixtures);
    assert_eq!(state.markets, base.markets);
    assert_eq!(state.events_for("m1").len(), 2);
}

#[test]
fn fixtures_delta_never_regresses_status() {
    let mut state = populated();

    let mut finished = fixture("m1", FixtureStatus::Finished);
    finished.score = Some(Score { home: 2, away: 0 });
    apply_delta(&mut state, Delta::SetFixtures(vec![finished]));

    // A late frame still claiming the match is live keeps it finished but takes the rest.
    let mut stale = fixture("m1", FixtureStatus::Live);
    stale.timer = Some("88'".to_string());
    stale.score = Some(Score { home: 1, away: 0 });
    apply_delta(&mut state, Delta::SetFixtures(vec![stale]));

    let m1 = state.fixture("m1").expect("fixture should exist");
    assert_eq!(m1.status, FixtureStatus::Finished);
    assert_eq!(m1.timer.as_deref(), Some("88'"));
    assert_eq!(m1.score, Some(Score { home: 1, away: 0 }));
}

#[test]
fn duplicate_fixture_ids_keep_first_position_and_last_value() {
    let mut state = LiveMatchState::new();
    let mut later = fixture("a", FixtureStatus::Live);
    later.timer = Some("10'".to_string());
    apply_delta(
        &mut state,
        Delta::SetFixtures(vec![
            fixture("a", FixtureStatus::Scheduled),
            fixture("b", FixtureStatus::Scheduled),
            later,
        ]),
    );

    let ids: Vec<&str> = state.fixtures.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, ["a", "b"]);
    assert_eq!(state.fixtures[0].timer.as_deref(), Some("10'"));
    assert_eq!(state.live_fixtures().count(), 1);
}
