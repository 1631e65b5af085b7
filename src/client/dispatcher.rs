//! Reference client-side dispatcher (spec §4.7). Lives outside the
//! broker core but is part of the published wire contract: it reads the
//! delimited `Event` stream a connection's broker-opened unidirectional
//! stream carries and routes each record to a registered handler.

// Layer 1: Standard library imports
use std::collections::HashMap;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

// Layer 3: Internal module imports
use crate::framing::{decode_event, Event, ErrorPayload, DELIMITER, ERROR_TOPIC};
use crate::topic::match_related_wildcards;

pub type MessageHandler = Arc<dyn Fn(&Event) + Send + Sync>;
pub type ErrorHandler = Arc<dyn Fn(&ErrorPayload) + Send + Sync>;

#[derive(Debug, Error)]
pub enum DispatcherError {
    #[error("failed to read event record: {0}")]
    Read(#[source] std::io::Error),

    #[error("failed to decode event record: {0}")]
    Decode(#[source] crate::framing::FramingError),
}

/// Routes each inbound `Event` to the handler registered for its
/// matching subscribe pattern, falling back to a default handler when no
/// pattern matches (spec §4.7).
pub struct Dispatcher {
    client_topics: Vec<String>,
    pattern_handlers: HashMap<String, MessageHandler>,
    fallback: Option<MessageHandler>,
    error_handler: Option<ErrorHandler>,
}

impl Dispatcher {
    /// `client_topics` is the same pattern list offered to the broker at
    /// connection time; it's what `matchRelatedWildcards` matches a
    /// literal inbound topic against.
    pub fn new(client_topics: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            client_topics: client_topics.into_iter().map(Into::into).collect(),
            pattern_handlers: HashMap::new(),
            fallback: None,
            error_handler: None,
        }
    }

    /// Registers a handler for one of the patterns in `client_topics`.
    pub fn on_pattern(&mut self, pattern: impl Into<String>, handler: MessageHandler) -> &mut Self {
        self.pattern_handlers.insert(pattern.into(), handler);
        self
    }

    /// Registers the handler invoked when no pattern matches an inbound
    /// topic, or when a matched pattern has no handler of its own.
    pub fn on_fallback(&mut self, handler: MessageHandler) -> &mut Self {
        self.fallback = Some(handler);
        self
    }

    /// Registers the handler invoked for records on the reserved
    /// `"error"` topic.
    pub fn on_error(&mut self, handler: ErrorHandler) -> &mut Self {
        self.error_handler = Some(handler);
        self
    }

    /// Reads and dispatches records from `stream` until it closes (EOF).
    pub async fn run<R: AsyncRead + Unpin>(&self, stream: R) -> Result<(), DispatcherError> {
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let n = reader
                .read_until(DELIMITER, &mut buf)
                .await
                .map_err(DispatcherError::Read)?;

            if n == 0 {
                return Ok(());
            }

            if buf.last() == Some(&DELIMITER) {
                buf.pop();
            }

            if buf.is_empty() {
                continue;
            }

            let event = decode_event(&buf).map_err(DispatcherError::Decode)?;
            self.dispatch(&event);
        }
    }

    /// Routes one already-decoded event. Exposed separately from `run`
    /// so callers driving their own read loop can still use the routing
    /// rules.
    pub fn dispatch(&self, event: &Event) {
        if event.topic == ERROR_TOPIC {
            self.dispatch_error(event);
            return;
        }

        let matched = match_related_wildcards(&event.topic, &self.client_topics);

        if matched.is_empty() {
            self.invoke_fallback(event);
            return;
        }

        for pattern in matched {
            match self.pattern_handlers.get(pattern) {
                Some(handler) => handler(event),
                None => self.invoke_fallback(event),
            }
        }
    }

    fn dispatch_error(&self, event: &Event) {
        let Ok(payload) = serde_json::from_slice::<ErrorPayload>(&event.data) else {
            tracing::warn!("failed to decode error payload on reserved error topic");
            return;
        };

        if let Some(handler) = &self.error_handler {
            handler(&payload);
        } else {
            tracing::warn!(code = payload.code, "unhandled error record from broker");
        }
    }

    fn invoke_fallback(&self, event: &Event) {
        if let Some(fallback) = &self.fallback {
            fallback(event);
        } else {
            tracing::debug!(topic = %event.topic, "no handler registered, dropping event");
        }
    }
}
