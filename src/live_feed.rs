use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use futures_util::StreamExt;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info};

use crate::live_store::FeedEvent;

const STOP_POLL: Duration = Duration::from_millis(250);

/// Running feed thread. Dropping the handle leaves the thread running; call `stop`.
pub struct FeedHandle {
    stop: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl FeedHandle {
    pub(crate) fn new(stop: Arc<AtomicBool>, join: JoinHandle<()>) -> Self {
        Self {
            stop,
            join: Some(join),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.join.as_ref().is_none_or(|j| j.is_finished())
    }

    /// Asks the feed to close its channel and waits for the thread to exit.
    pub fn stop(mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

/// Connects to the live channel on a dedicated thread and forwards socket activity to `tx`.
///
/// Always ends with exactly one `FeedEvent::Closed`, unless the receiver is gone.
pub fn spawn_live_feed(url: String, tx: Sender<FeedEvent>) -> FeedHandle {
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = stop.clone();
    let join = thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(err) => {
                let _ = tx.send(FeedEvent::Closed {
                    reason: Some(format!("failed to start feed runtime: {err}")),
                });
                return;
            }
        };
        let reason = runtime.block_on(run_socket(&url, &tx, &stop_flag));
        let _ = tx.send(FeedEvent::Closed { reason });
    });
    FeedHandle::new(stop, join)
}

async fn run_socket(url: &str, tx: &Sender<FeedEvent>, stop: &AtomicBool) -> Option<String> {
    if tx.send(FeedEvent::Connecting).is_err() {
        return None;
    }
    let (mut ws, _) = match connect_async(url).await {
        Ok(conn) => conn,
        Err(err) => return Some(format!("connect to {url} failed: {err}")),
    };
    info!(url, "live socket connected");
    if tx.send(FeedEvent::Opened).is_err() {
        let _ = ws.close(None).await;
        return None;
    }

    loop {
        if stop.load(Ordering::Relaxed) {
            let _ = ws.close(None).await;
            return None;
        }
        let next = tokio::select! {
            msg = ws.next() => msg,
            _ = tokio::time::sleep(STOP_POLL) => continue,
        };
        match next {
            Some(Ok(Message::Text(text))) => {
                if tx.send(FeedEvent::Frame(text)).is_err() {
                    let _ = ws.close(None).await;
                    return None;
                }
            }
            Some(Ok(Message::Close(frame))) => {
                return Some(match frame {
                    Some(frame) if !frame.reason.is_empty() => {
                        format!("closed by server: {}", frame.reason)
                    }
                    _ => "closed by server".to_string(),
                });
            }
            Some(Ok(Message::Binary(bytes))) => {
                debug!(len = bytes.len(), "skipping binary live frame");
            }
            Some(Ok(_)) => {}
            Some(Err(err)) => return Some(format!("live socket error: {err}")),
            None => return Some("live socket ended".to_string()),
        }
    }
}
