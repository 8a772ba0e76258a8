use std::{
    convert::Infallible,
    pin::Pin,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    task::{Context, Poll},
    time::Duration,
};

use axum::response::sse::{Event, KeepAlive};
use metrics::{counter, gauge};
use tokio::sync::broadcast;
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};
use tracing::{debug, info};

pub const EVENT_NAME: &str = "refresh";
const BROADCAST_BUFFER: usize = 16;

/// What caused a refresh to be broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshSource {
    Trigger,
    VenueChange,
    CityChange,
}

impl RefreshSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trigger => "trigger",
            Self::VenueChange => "venue_change",
            Self::CityChange => "city_change",
        }
    }
}

/// Fan-out point for the bare `refresh` event.
#[derive(Clone)]
pub struct RefreshHub {
    sender: broadcast::Sender<RefreshSource>,
    listeners: Arc<AtomicUsize>,
}

impl RefreshHub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(BROADCAST_BUFFER);
        Self {
            sender,
            listeners: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Sends one refresh to every connected listener and returns how many
    /// were reached. Having no listeners is not an error.
    pub fn publish(&self, source: RefreshSource) -> usize {
        counter!("refresh_broadcast_total", "source" => source.as_str()).increment(1);
        match self.sender.send(source) {
            Ok(reached) => {
                info!(stage = "refresh", source = source.as_str(), listeners = reached, "refresh broadcast");
                reached
            }
            Err(_) => {
                debug!(stage = "refresh", source = source.as_str(), "refresh broadcast with no listeners");
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RefreshSource> {
        self.sender.subscribe()
    }

    /// Number of open event streams.
    pub fn listener_count(&self) -> usize {
        self.listeners.load(Ordering::SeqCst)
    }

    /// Opens an SSE stream for a newly connected listener.
    pub fn connect(&self) -> RefreshStream {
        let receiver = BroadcastStream::new(self.subscribe());
        let guard = ListenerGuard::new(self.listeners.clone());
        info!(stage = "refresh", listeners = self.listener_count(), "listener connected");

        // A lagged receiver has missed refreshes; one refresh covers them all.
        let stream = receiver.map(|_| Ok::<_, Infallible>(refresh_event()));
        RefreshStream {
            inner: Box::pin(stream),
            _guard: guard,
        }
    }
}

impl Default for RefreshHub {
    fn default() -> Self {
        Self::new()
    }
}

pub fn refresh_event() -> Event {
    Event::default().event(EVENT_NAME).data("")
}

pub fn keep_alive(interval_secs: u64) -> KeepAlive {
    KeepAlive::new()
        .interval(Duration::from_secs(interval_secs))
        .text("heartbeat")
}

pub struct RefreshStream {
    inner: Pin<Box<dyn Stream<Item = Result<Event, Infallible>> + Send>>,
    _guard: ListenerGuard,
}

impl Stream for RefreshStream {
    type Item = Result<Event, Infallible>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        this.inner.as_mut().poll_next(cx)
    }
}

struct ListenerGuard {
    listeners: Arc<AtomicUsize>,
}

impl ListenerGuard {
    fn new(listeners: Arc<AtomicUsize>) -> Self {
        let value = listeners.fetch_add(1, Ordering::SeqCst) + 1;
        gauge!("refresh_listeners").set(value as f64);
        Self { listeners }
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        let value = self
            .listeners
            .fetch_sub(1, Ordering::SeqCst)
            .saturating_sub(1);
        gauge!("refresh_listeners").set(value as f64);
        debug!(stage = "refresh", listeners = value, "listener disconnected");
    }
}
