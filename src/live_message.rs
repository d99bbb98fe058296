use std::collections::HashMap;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use crate::state::{Delta, Fixture, MarketLine, MatchEvent, MessageKind};

/// Result of decoding one text frame from the live channel.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Delta(Delta),
    /// A well-formed object whose `type` is not one we apply.
    Unknown(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotPayload {
    #[serde(default, deserialize_with = "null_as_empty")]
    fixtures: Vec<Fixture>,
    #[serde(default, deserialize_with = "events_by_fixture")]
    events: HashMap<String, Vec<MatchEvent>>,
    #[serde(default, deserialize_with = "null_as_empty")]
    markets: HashMap<String, Vec<MarketLine>>,
}

#[derive(Debug, Deserialize)]
struct FixturesPayload {
    fixtures: Vec<Fixture>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventPayload {
    fixture_id: String,
    event: MatchEvent,
}

#[derive(Debug, Deserialize)]
struct MarketsPayload {
    markets: HashMap<String, Vec<MarketLine>>,
}

// Snapshot sections may be absent or null; both mean empty.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EventsSection {
    ByFixture(HashMap<String, Vec<MatchEvent>>),
    Unkeyed(Vec<Value>),
}

// The server's own snapshot carries `events` as a flat list with no fixture key. Those entries
// cannot be attributed, so the list reads as an empty mapping.
fn events_by_fixture<'de, D>(
    deserializer: D,
) -> Result<HashMap<String, Vec<MatchEvent>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<EventsSection>::deserialize(deserializer)? {
        Some(EventsSection::ByFixture(events)) => Ok(events),
        Some(EventsSection::Unkeyed(list)) => {
            if !list.is_empty() {
                debug!(count = list.len(), "snapshot events without fixture keys, skipping");
            }
            Ok(HashMap::new())
        }
        None => Ok(HashMap::new()),
    }
}

/// Decodes the `type` discriminator first, then parses the payload strictly for that kind.
///
/// Errors mean the frame is malformed and must be dropped; an unrecognized kind is not an error.
pub fn parse_live_frame(raw: &str) -> Result<Decoded> {
    let root: Value = serde_json::from_str(raw.trim()).context("invalid live frame json")?;
    let tag = root
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("live frame without a string `type`"))?;

    let Some(kind) = MessageKind::from_tag(tag) else {
        return Ok(Decoded::Unknown(tag.to_string()));
    };

    let delta = match kind {
        MessageKind::Snapshot => {
            let p: SnapshotPayload =
                serde_json::from_value(root).context("invalid snapshot payload")?;
            Delta::Snapshot {
                fixtures: p.fixtures,
                events: p.events,
                markets: p.markets,
            }
        }
        MessageKind::Fixtures => {
            let p: FixturesPayload =
                serde_json::from_value(root).context("invalid fixtures payload")?;
            Delta::SetFixtures(p.fixtures)
        }
        MessageKind::Event => {
            let p: EventPayload = serde_json::from_value(root).context("invalid event payload")?;
            Delta::AddEvent {
                fixture_id: p.fixture_id,
                event: p.event,
            }
        }
        MessageKind::Markets => {
            let p: MarketsPayload =
                serde_json::from_value(root).context("invalid markets payload")?;
            Delta::SetMarkets(p.markets)
        }
    };
    Ok(Decoded::Delta(delta))
}
