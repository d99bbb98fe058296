use std::sync::{Arc, RwLock};

use tracing::{debug, info, warn};

use crate::live_message::{Decoded, parse_live_frame};
use crate::observer::Observers;
pub use crate::observer::SubscriptionId;
use crate::state::{Delta, LiveMatchState, MessageKind, apply_delta};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Closed,
    Connecting,
    Open,
}

/// What happened to one inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    Applied(MessageKind),
    /// Unrecognized `type`; state untouched.
    Ignored(String),
    /// Recognized `type` but unusable payload; state untouched.
    Malformed(String),
    /// Arrived while the channel was not open.
    Inactive,
}

/// Socket-level activity forwarded by a live feed.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    Connecting,
    Opened,
    Frame(String),
    Closed { reason: Option<String> },
}

type Observer = dyn Fn(&LiveMatchState) + Send + Sync;

/// Cloneable read-only handle onto the store's current state.
#[derive(Clone)]
pub struct LiveStateReader {
    current: Arc<RwLock<Arc<LiveMatchState>>>,
}

impl LiveStateReader {
    /// Returns the last committed state; never a partially applied one.
    pub fn snapshot(&self) -> Arc<LiveMatchState> {
        self.current
            .read()
            .expect("live state lock poisoned")
            .clone()
    }
}

/// Single-writer store for the live match view. All mutation goes through `&mut self`.
pub struct LiveStateStore {
    current: Arc<RwLock<Arc<LiveMatchState>>>,
    channel: ChannelState,
    observers: Observers<Observer>,
}

impl Default for LiveStateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveStateStore {
    pub fn new() -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(LiveMatchState::new()))),
            channel: ChannelState::Closed,
            observers: Observers::default(),
        }
    }

    pub fn reader(&self) -> LiveStateReader {
        LiveStateReader {
            current: self.current.clone(),
        }
    }

    pub fn snapshot(&self) -> Arc<LiveMatchState> {
        self.reader().snapshot()
    }

    pub fn channel_state(&self) -> ChannelState {
        self.channel
    }

    pub fn subscribe<F>(&mut self, observer: F) -> SubscriptionId
    where
        F: Fn(&LiveMatchState) + Send + Sync + 'static,
    {
        self.observers.add(Box::new(observer))
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.remove(id)
    }

    /// `Closed -> Connecting`. Returns false, changing nothing, while the channel is open.
    pub fn begin_connect(&mut self) -> bool {
        match self.channel {
            ChannelState::Closed => {
                debug!("live channel connecting");
                self.channel = ChannelState::Connecting;
                true
            }
            ChannelState::Connecting => true,
            ChannelState::Open => {
                warn!("connect requested while live channel is open, ignoring");
                false
            }
        }
    }

    /// `Connecting -> Open`: start from an empty view and accept frames.
    /// Returns false, leaving state untouched, unless a connect is in progress.
    pub fn on_open(&mut self) -> bool {
        if self.channel != ChannelState::Connecting {
            warn!(from = ?self.channel, "open without a pending connect, ignoring");
            return false;
        }
        info!("live channel open");
        self.channel = ChannelState::Open;
        self.commit(LiveMatchState::new());
        true
    }

    /// Channel closed (error or explicit). Last known state is kept for readers.
    pub fn on_close(&mut self, reason: Option<&str>) {
        if self.channel == ChannelState::Closed {
            return;
        }
        match reason {
            Some(reason) => warn!(reason, "live channel closed"),
            None => info!("live channel closed"),
        }
        self.channel = ChannelState::Closed;
    }

    /// Drops all tracked state. Used by hosts that tear the view down on their own schedule.
    pub fn teardown(&mut self) {
        self.channel = ChannelState::Closed;
        self.commit(LiveMatchState::new());
    }

    pub fn handle_feed_event(&mut self, event: FeedEvent) -> Option<FrameOutcome> {
        match event {
            FeedEvent::Connecting => {
                self.begin_connect();
                None
            }
            FeedEvent::Opened => {
                self.on_open();
                None
            }
            FeedEvent::Frame(raw) => Some(self.handle_frame(&raw)),
            FeedEvent::Closed { reason } => {
                self.on_close(reason.as_deref());
                None
            }
        }
    }

    pub fn handle_frame(&mut self, raw: &str) -> FrameOutcome {
        if self.channel != ChannelState::Open {
            debug!("frame received while channel not open, skipping");
            return FrameOutcome::Inactive;
        }
        match parse_live_frame(raw) {
            Ok(Decoded::Delta(delta)) => FrameOutcome::Applied(self.apply(delta)),
            Ok(Decoded::Unknown(tag)) => {
                debug!(kind = %tag, "ignoring unknown live message kind");
                FrameOutcome::Ignored(tag)
            }
            Err(err) => {
                warn!("dropping malformed live frame: {err:#}");
                FrameOutcome::Malformed(format!("{err:#}"))
            }
        }
    }

    fn apply(&mut self, delta: Delta) -> MessageKind {
        let kind = delta.kind();
        let mut next = LiveMatchState::clone(&self.snapshot());
        apply_delta(&mut next, delta);
        self.commit(next);
        kind
    }

    fn commit(&mut self, next: LiveMatchState) {
        let next = Arc::new(next);
        {
            let mut guard = self.current.write().expect("live state lock poisoned");
            *guard = next.clone();
        }
        for observer in self.observers.iter() {
            observer(&next);
        }
    }
}
