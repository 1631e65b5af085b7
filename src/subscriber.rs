//! Subscriber handle: one outbound stream shared by every
//! [`crate::event::source::EventSource`] a connection has been admitted to.

// Layer 1: Standard library imports
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

// Layer 2: Third-party crate imports
use tokio::io::AsyncWrite;
use tokio::sync::Mutex;

// Layer 3: Internal module imports
use crate::framing::{self, Event, FramingError};
use crate::util::{ConnectionId, SubscriberId};

/// A per-connection output handle.
///
/// Cloning a `Subscriber` clones the handle, not the stream: every clone
/// shares the same underlying outbound stream and the same `corrupt`
/// flag, because a single client connection may own multiple
/// `Subscriber` values (one per offered topic) that all write to the
/// same stream. Once `corrupt` is set it never clears (spec §3); the
/// owning [`crate::event::source::EventSource`]'s cleaner evicts it on
/// its next pass.
pub struct Subscriber<S> {
    id: SubscriberId,
    connection: ConnectionId,
    stream: Arc<Mutex<S>>,
    corrupt: Arc<AtomicBool>,
}

impl<S> Clone for Subscriber<S> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            connection: self.connection,
            stream: Arc::clone(&self.stream),
            corrupt: Arc::clone(&self.corrupt),
        }
    }
}

impl<S> Subscriber<S> {
    pub fn new(connection: ConnectionId, stream: S) -> Self {
        Self {
            id: SubscriberId::new(),
            connection,
            stream: Arc::new(Mutex::new(stream)),
            corrupt: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection
    }

    pub fn is_corrupt(&self) -> bool {
        self.corrupt.load(Ordering::Acquire)
    }

    /// Monotonic: once set, stays set for the lifetime of this handle.
    pub fn mark_corrupt(&self) {
        self.corrupt.store(true, Ordering::Release);
    }

    #[cfg(test)]
    pub(crate) fn stream_for_test(&self) -> &Arc<Mutex<S>> {
        &self.stream
    }
}

impl<S> Subscriber<S>
where
    S: AsyncWrite + Unpin + Send,
{
    /// Writes one framed event to the subscriber's stream. On failure the
    /// caller is expected to call [`Subscriber::mark_corrupt`]; this
    /// method does not mark corruption itself so that non-distribution
    /// callers (e.g. the admission error path) can choose their own
    /// failure handling.
    pub async fn write_event(&self, event: &Event) -> Result<(), FramingError> {
        let mut stream = self.stream.lock().await;
        framing::write_event(&mut *stream, event).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fresh_subscriber_is_not_corrupt() {
        let sub = Subscriber::new(ConnectionId::new(), Vec::new());
        assert!(!sub.is_corrupt());
    }

    #[tokio::test]
    async fn mark_corrupt_is_visible_on_clones() {
        let sub = Subscriber::new(ConnectionId::new(), Vec::new());
        let clone = sub.clone();

        clone.mark_corrupt();

        assert!(sub.is_corrupt());
        assert!(clone.is_corrupt());
    }

    #[tokio::test]
    async fn corrupt_is_monotonic() {
        let sub = Subscriber::new(ConnectionId::new(), Vec::new());
        sub.mark_corrupt();
        sub.mark_corrupt();
        assert!(sub.is_corrupt());
    }

    #[tokio::test]
    async fn write_event_appends_to_shared_stream() {
        let sub = Subscriber::new(ConnectionId::new(), Vec::new());
        let clone = sub.clone();

        sub.write_event(&Event::new("a", vec![1])).await.unwrap();
        clone.write_event(&Event::new("b", vec![2])).await.unwrap();

        let stream = sub.stream.lock().await;
        assert!(!stream.is_empty());
    }

    #[tokio::test]
    async fn clones_share_connection_id() {
        let sub = Subscriber::new(ConnectionId::new(), Vec::new());
        let clone = sub.clone();
        assert_eq!(sub.connection_id(), clone.connection_id());
        assert_eq!(sub.id(), clone.id());
    }
}
