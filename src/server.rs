//! `BrokerServer`: owns the listener, the event-source map, the
//! authenticator/authorizer, the metrics sink, and the worker pool;
//! connects every other component (spec §4.4).

// Layer 1: Standard library imports
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use parking_lot::{Mutex as SyncMutex, RwLock};
use tokio::io::AsyncWrite;
use tokio::task::JoinHandle;

// Layer 3: Internal module imports
use crate::auth::{allow_all_authenticator, allow_all_authorizer, Authenticator, Authorizer};
use crate::config::BrokerConfig;
use crate::error::BrokerError;
use crate::event::EventSource;
use crate::framing::{codes, Event, ErrorPayload};
use crate::metrics::MetricsSink;
use crate::offer::Offer;
use crate::subscriber::Subscriber;
use crate::topic::match_list;
use crate::util::ConnectionId;
use crate::worker::{WorkerPool, WorkerPoolConfig};

/// Outcome of running the subscribe handshake for one connection, used by
/// the QUIC-specific acceptor loop to decide whether the connection needs
/// to be closed with an application error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleOutcome {
    NotAuthorized,
    /// A requested topic was unknown or unauthorized; an error record was
    /// written and the subscribe loop stopped before admitting anything.
    Aborted,
    /// Every requested topic was valid; all were admitted.
    Admitted,
}

/// The broker core, generic over the outbound stream type so the
/// subscribe/publish logic can be exercised without a real QUIC
/// connection. [`BrokerServer::serve`] fixes `S` to `quinn::SendStream`
/// and wires up the transport.
pub struct BrokerServer<S> {
    topics: Vec<String>,
    event_sources: HashMap<String, Arc<EventSource<S>>>,
    authenticator: RwLock<Arc<dyn Authenticator>>,
    authorizer: RwLock<Arc<dyn Authorizer>>,
    metrics: Arc<dyn MetricsSink>,
    pool: Arc<WorkerPool<S>>,
    task_handles: SyncMutex<Vec<JoinHandle<()>>>,
}

impl<S> BrokerServer<S>
where
    S: AsyncWrite + Unpin + Send + 'static,
{
    /// Validates `config`, builds the worker pool, constructs one
    /// `EventSource` per declared topic, and starts their background
    /// tasks. Does not touch the transport at all.
    pub fn new(config: &BrokerConfig, metrics: Arc<dyn MetricsSink>) -> Result<Arc<Self>, BrokerError> {
        config
            .validate()
            .map_err(|reason| BrokerError::InvalidConfig { reason })?;

        let pool = Arc::new(WorkerPool::new(WorkerPoolConfig {
            distributor_concurrency: config.distributor_concurrency,
            distributor_queue_size: config.distributor_queue_size,
            acceptor_concurrency: config.acceptor_concurrency,
            acceptor_queue_size: config.acceptor_queue_size,
        }));

        let mut event_sources = HashMap::with_capacity(config.topics.len());
        let mut handles = Vec::new();

        for topic in &config.topics {
            let source = Arc::new(EventSource::new(
                topic.clone(),
                config.distributor_queue_size,
                config.cleaning_interval,
                Arc::clone(&pool),
                Arc::clone(&metrics),
            ));
            handles.extend(source.start());
            event_sources.insert(topic.clone(), source);
        }

        Ok(Arc::new(Self {
            topics: config.topics.clone(),
            event_sources,
            authenticator: RwLock::new(allow_all_authenticator()),
            authorizer: RwLock::new(allow_all_authorizer()),
            metrics,
            pool,
            task_handles: SyncMutex::new(handles),
        }))
    }

    pub fn set_authenticator(&self, authenticator: Arc<dyn Authenticator>) {
        *self.authenticator.write() = authenticator;
    }

    pub fn set_authorizer(&self, authorizer: Arc<dyn Authorizer>) {
        *self.authorizer.write() = authorizer;
    }

    /// Exposes the installed metrics sink so a host process can poll or
    /// export it however it likes. The broker itself never binds a port
    /// for metrics (spec's Out-of-scope).
    pub fn metrics_sink(&self) -> &Arc<dyn MetricsSink> {
        &self.metrics
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.event_sources
            .get(topic)
            .map(|source| source.subscriber_count())
            .unwrap_or(0)
    }

    /// Expands `pattern` against the declared topic set and pushes `bytes`
    /// onto the ingress of every matched topic with at least one
    /// subscriber. Topics with zero subscribers are skipped. Never
    /// returns an error: this is the fire-and-best-effort API spec §7
    /// requires.
    pub async fn publish(&self, pattern: &str, bytes: Vec<u8>) {
        for topic in match_list(&self.topics, pattern) {
            let Some(source) = self.event_sources.get(topic) else {
                continue;
            };

            if source.subscriber_count() == 0 {
                continue;
            }

            self.metrics.inc_pending(topic);
            source.publish(bytes.clone()).await;
        }
    }

    /// Runs the subscribe handshake (spec §4.4 steps 2 and 5) for one
    /// already-offered connection: authenticates the token, then
    /// validates every requested topic before admitting any of them —
    /// an all-or-nothing interpretation of "fail-fast" that matches
    /// spec §8 scenario 4 (a later invalid topic must not leave an
    /// earlier valid one subscribed).
    pub async fn handle_offer(
        &self,
        connection_id: ConnectionId,
        offer: Offer,
        stream: S,
    ) -> HandleOutcome {
        if !self.authenticator.read().authenticate(&offer.token) {
            tracing::info!(token = %offer.token, "client failed authentication");
            return HandleOutcome::NotAuthorized;
        }

        let subscriber = Subscriber::new(connection_id, stream);
        let mut to_admit: Vec<(String, Arc<EventSource<S>>)> = Vec::with_capacity(offer.topics.len());

        for topic in &offer.topics {
            match self.event_sources.get(topic) {
                None => {
                    tracing::warn!(topic = %topic, "topic not available, aborting subscribe loop");
                    self.send_error(&subscriber, codes::TOPIC_NOT_AVAILABLE, topic).await;
                    return HandleOutcome::Aborted;
                }
                Some(source) => {
                    if !self.authorizer.read().authorize(&offer.token, topic) {
                        tracing::warn!(topic = %topic, "client not authorized for topic, aborting subscribe loop");
                        self.send_error(&subscriber, codes::NOT_AUTHORIZED, topic).await;
                        return HandleOutcome::Aborted;
                    }
                    to_admit.push((topic.clone(), Arc::clone(source)));
                }
            }
        }

        for (topic, source) in to_admit {
            source.admit(subscriber.clone());
            self.metrics.inc_subscriber(&topic);
        }

        HandleOutcome::Admitted
    }

    async fn send_error(&self, subscriber: &Subscriber<S>, code: i32, topic: &str) {
        let payload = ErrorPayload::with_topic(code, topic);
        match Event::error(&payload) {
            Ok(event) => {
                if let Err(err) = subscriber.write_event(&event).await {
                    tracing::warn!(error = %err, "failed to write error record to subscriber");
                }
            }
            Err(err) => tracing::warn!(error = %err, "failed to encode error record"),
        }
    }
}

mod quic_server {
    use super::*;
    use crate::metrics::NoopMetricsSink;
    use crate::transport::quic::{accept_offer_stream, close_with_code, open_event_stream};
    use crate::transport::Listener;

    impl BrokerServer<quinn::SendStream> {
        /// Binds a QUIC listener, builds the broker core, and spawns
        /// `acceptor_concurrency` long-lived accept loops (spec §4.4's
        /// lifecycle operation `NewServer`).
        pub async fn serve(address: SocketAddr, config: BrokerConfig) -> Result<Arc<Self>, BrokerError> {
            let metrics: Arc<dyn MetricsSink> = Arc::new(NoopMetricsSink);
            Self::serve_with_metrics(address, config, metrics).await
        }

        pub async fn serve_with_metrics(
            address: SocketAddr,
            config: BrokerConfig,
            metrics: Arc<dyn MetricsSink>,
        ) -> Result<Arc<Self>, BrokerError> {
            let tls = match config.tls.clone() {
                Some(tls) => tls,
                None => crate::transport::tls::default_server_tls_config()
                    .map_err(|reason| BrokerError::Tls { reason })?,
            };

            let server = Self::new(&config, metrics)?;

            let listener = Arc::new(Listener::bind(address, tls).map_err(|err| BrokerError::Listen {
                address: address.to_string(),
                source: std::io::Error::other(err.to_string()),
            })?);

            let acceptor_concurrency = server.pool.acceptor_concurrency();
            {
                let mut handles = server.task_handles.lock();
                for _ in 0..acceptor_concurrency {
                    let server = Arc::clone(&server);
                    let listener = Arc::clone(&listener);
                    handles.push(tokio::spawn(async move { server.run_acceptor_loop(listener).await }));
                }
            }

            Ok(server)
        }

        async fn run_acceptor_loop(self: Arc<Self>, listener: Arc<Listener>) {
            loop {
                match listener.accept().await {
                    None => break,
                    Some(Err(err)) => {
                        tracing::warn!(error = %err, "failed to accept connection");
                    }
                    Some(Ok(connection)) => {
                        let server = Arc::clone(&self);
                        tokio::spawn(async move { server.handle_connection(connection).await });
                    }
                }
            }
        }

        async fn handle_connection(self: Arc<Self>, connection: quinn::Connection) {
            let offer_stream = match accept_offer_stream(&connection).await {
                Ok(stream) => stream,
                Err(err) => {
                    tracing::warn!(error = %err, "failed to accept offer stream");
                    return;
                }
            };

            let offer = match crate::offer::accept_offer(offer_stream).await {
                Ok(offer) => offer,
                Err(err) => {
                    tracing::warn!(error = %err, "failed to read offer");
                    return;
                }
            };

            let send_stream = match open_event_stream(&connection).await {
                Ok(stream) => stream,
                Err(err) => {
                    tracing::warn!(error = %err, "failed to open event stream");
                    close_with_code(&connection, codes::UNKNOWN, "failed to open stream");
                    return;
                }
            };

            let connection_id = ConnectionId::new();
            match self.handle_offer(connection_id, offer, send_stream).await {
                HandleOutcome::NotAuthorized => {
                    close_with_code(&connection, codes::NOT_AUTHORIZED, "not authorized");
                }
                HandleOutcome::Aborted | HandleOutcome::Admitted => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{AtomicMetricsSink, NoopMetricsSink};
    use std::time::Duration;

    fn config(topics: &[&str]) -> BrokerConfig {
        BrokerConfig::builder()
            .with_topics(topics.iter().map(|t| t.to_string()))
            .with_cleaning_interval(Duration::from_secs(3600))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn publish_delivers_only_to_subscribed_topic() {
        let server: Arc<BrokerServer<Vec<u8>>> =
            BrokerServer::new(&config(&["ride.accepted", "ride.rejected", "offer.first"]), Arc::new(NoopMetricsSink)).unwrap();

        let accepted = Offer::new("t", ["ride.accepted"]);
        let rejected = Offer::new("t", ["ride.rejected"]);

        let outcome_a = server
            .handle_offer(ConnectionId::new(), accepted, Vec::new())
            .await;
        let outcome_b = server
            .handle_offer(ConnectionId::new(), rejected, Vec::new())
            .await;
        assert_eq!(outcome_a, HandleOutcome::Admitted);
        assert_eq!(outcome_b, HandleOutcome::Admitted);

        tokio::time::sleep(Duration::from_millis(20)).await;

        server.publish("ride.*", vec![0x01]).await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(server.subscriber_count("ride.accepted"), 1);
        assert_eq!(server.subscriber_count("ride.rejected"), 1);
        assert_eq!(server.subscriber_count("offer.first"), 0);
    }

    #[tokio::test]
    async fn unknown_topic_aborts_without_admitting_earlier_valid_topics() {
        let server: Arc<BrokerServer<Vec<u8>>> =
            BrokerServer::new(&config(&["a"]), Arc::new(AtomicMetricsSink::new())).unwrap();

        let offer = Offer::new("t", ["a", "b"]);
        let outcome = server.handle_offer(ConnectionId::new(), offer, Vec::new()).await;

        assert_eq!(outcome, HandleOutcome::Aborted);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(server.subscriber_count("a"), 0);
    }

    #[tokio::test]
    async fn unauthenticated_token_never_reaches_an_event_source() {
        let server: Arc<BrokerServer<Vec<u8>>> =
            BrokerServer::new(&config(&["a"]), Arc::new(NoopMetricsSink)).unwrap();
        server.set_authenticator(Arc::new(|token: &str| token == "secret"));

        let offer = Offer::new("wrong", ["a"]);
        let outcome = server.handle_offer(ConnectionId::new(), offer, Vec::new()).await;

        assert_eq!(outcome, HandleOutcome::NotAuthorized);
        assert_eq!(server.subscriber_count("a"), 0);
    }

    #[tokio::test]
    async fn unauthorized_topic_writes_error_and_admits_nothing() {
        let server: Arc<BrokerServer<Vec<u8>>> =
            BrokerServer::new(&config(&["a", "b"]), Arc::new(NoopMetricsSink)).unwrap();
        server.set_authorizer(Arc::new(|_token: &str, topic: &str| topic != "b"));

        let offer = Offer::new("t", ["a", "b"]);
        let outcome = server.handle_offer(ConnectionId::new(), offer, Vec::new()).await;

        assert_eq!(outcome, HandleOutcome::Aborted);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(server.subscriber_count("a"), 0);
    }

    #[tokio::test]
    async fn publish_to_unknown_topic_is_a_silent_no_op() {
        let server: Arc<BrokerServer<Vec<u8>>> =
            BrokerServer::new(&config(&["a"]), Arc::new(NoopMetricsSink)).unwrap();
        server.publish("nonexistent", vec![0x01]).await;
    }
}
