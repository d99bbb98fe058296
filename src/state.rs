use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixtureStatus {
    Scheduled,
    Live,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub home: u32,
    pub away: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fixture {
    pub id: String,
    pub home_team: String,
    pub away_team: String,
    pub league: String,
    pub start_time: String,
    pub status: FixtureStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<Score>,
}

impl Fixture {
    pub fn is_live(&self) -> bool {
        self.status == FixtureStatus::Live
    }

    pub fn label(&self) -> String {
        format!("{} vs {}", self.home_team, self.away_team)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchEventKind {
    Goal,
    Card,
    Substitution,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchEvent {
    pub minute: u32,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: MatchEventKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketKind {
    /// Base home/draw/away market; sent without a `type` field.
    #[default]
    #[serde(rename = "1x2")]
    MatchResult,
    Total,
    Handicap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketLine {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixture_id: Option<String>,
    pub label: String,
    #[serde(rename = "type", default)]
    pub kind: MarketKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draw: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub away: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub over: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub under: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Locally visible view of the tracked fixtures, as produced by the last applied live message.
///
/// Sections sit behind `Arc` so a cloned view shares everything a delta does not touch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LiveMatchState {
    /// Fixtures in feed order; ids are unique.
    pub fixtures: Arc<Vec<Fixture>>,
    /// Per-fixture events in arrival order.
    pub events: HashMap<String, Arc<Vec<MatchEvent>>>,
    pub markets: Arc<HashMap<String, Vec<MarketLine>>>,
}

impl LiveMatchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty() && self.events.is_empty() && self.markets.is_empty()
    }

    pub fn fixture(&self, id: &str) -> Option<&Fixture> {
        self.fixtures.iter().find(|f| f.id == id)
    }

    pub fn events_for(&self, id: &str) -> &[MatchEvent] {
        self.events.get(id).map(|e| e.as_slice()).unwrap_or_default()
    }

    pub fn markets_for(&self, id: &str) -> &[MarketLine] {
        self.markets.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn live_fixtures(&self) -> impl Iterator<Item = &Fixture> {
        self.fixtures.iter().filter(|f| f.is_live())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Snapshot,
    Fixtures,
    Event,
    Markets,
}

impl MessageKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "snapshot" => Some(Self::Snapshot),
            "fixtures" => Some(Self::Fixtures),
            "event" => Some(Self::Event),
            "markets" => Some(Self::Markets),
            _ => None,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Self::Snapshot => "snapshot",
            Self::Fixtures => "fixtures",
            Self::Event => "event",
            Self::Markets => "markets",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Delta {
    Snapshot {
        fixtures: Vec<Fixture>,
        events: HashMap<String, Vec<MatchEvent>>,
        markets: HashMap<String, Vec<MarketLine>>,
    },
    SetFixtures(Vec<Fixture>),
    AddEvent {
        fixture_id: String,
        event: MatchEvent,
    },
    SetMarkets(HashMap<String, Vec<MarketLine>>),
}

impl Delta {
    pub fn kind(&self) -> MessageKind {
        match self {
            Delta::Snapshot { .. } => MessageKind::Snapshot,
            Delta::SetFixtures(_) => MessageKind::Fixtures,
            Delta::AddEvent { .. } => MessageKind::Event,
            Delta::SetMarkets(_) => MessageKind::Markets,
        }
    }
}

pub fn apply_delta(state: &mut LiveMatchState, delta: Delta) {
    match delta {
        Delta::Snapshot {
            fixtures,
            events,
            markets,
        } => {
            // Resync point: taken verbatim, no status clamping against the old view.
            state.fixtures = Arc::new(dedup_fixtures(fixtures));
            state.events = events.into_iter().map(|(id, e)| (id, Arc::new(e))).collect();
            state.markets = Arc::new(markets);
        }
        Delta::SetFixtures(fixtures) => {
            let mut fixtures = dedup_fixtures(fixtures);
            for fixture in &mut fixtures {
                if let Some(prev) = state.fixture(&fixture.id)
                    && prev.status > fixture.status
                {
                    warn!(
                        fixture = %fixture.id,
                        from = ?prev.status,
                        to = ?fixture.status,
                        "ignoring fixture status regression"
                    );
                    fixture.status = prev.status;
                }
            }
            state.fixtures = Arc::new(fixtures);
        }
        Delta::AddEvent { fixture_id, event } => {
            // Copies only this fixture's history, and only while an older view still holds it.
            Arc::make_mut(state.events.entry(fixture_id).or_default()).push(event);
        }
        Delta::SetMarkets(markets) => {
            state.markets = Arc::new(markets);
        }
    }
}

fn dedup_fixtures(fixtures: Vec<Fixture>) -> Vec<Fixture> {
    let mut out: Vec<Fixture> = Vec::with_capacity(fixtures.len());
    for fixture in fixtures {
        if let Some(slot) = out.iter_mut().find(|f| f.id == fixture.id) {
            *slot = fixture;
        } else {
            out.push(fixture);
        }
    }
    out
}
