//! Broker configuration: declared topics and the tunable knobs from
//! spec §6 (cleaning interval, acceptor/distributor concurrency and
//! queue sizes, TLS override, metric label prefixes).

// Layer 1: Standard library imports
use std::time::Duration;

// Layer 2: Third-party crate imports
use rustls::ServerConfig as TlsServerConfig;
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
use crate::error::BrokerError;

/// Reserved topic name carrying error records; never a valid declared topic.
pub const ERROR_TOPIC: &str = "error";

pub const DEFAULT_CLEANING_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_ACCEPTOR_CONCURRENCY: usize = 1;
pub const DEFAULT_ACCEPTOR_QUEUE_SIZE: usize = 1;
pub const DEFAULT_DISTRIBUTOR_CONCURRENCY: usize = 1;
pub const DEFAULT_DISTRIBUTOR_QUEUE_SIZE: usize = 10;

/// Declared broker configuration.
///
/// `tls` is intentionally excluded from `Serialize`/`Deserialize`: a
/// `rustls::ServerConfig` carries key material and trait objects that
/// don't round-trip through serde. Everything else is plain data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Topics declared at construction. Patterns are permitted here and
    /// matched literally at subscribe-time (per spec §6).
    pub topics: Vec<String>,

    /// Interval between subscriber-list compaction passes.
    #[serde(with = "duration_secs")]
    pub cleaning_interval: Duration,

    /// Number of parallel accept loops.
    pub acceptor_concurrency: usize,

    /// Bound on the Accept worker queue.
    pub acceptor_queue_size: usize,

    /// Number of parallel distribute workers.
    pub distributor_concurrency: usize,

    /// Bound on the Distribute worker queue (the dominant backpressure point).
    pub distributor_queue_size: usize,

    /// Label prefix for exported counters/gauges.
    pub metric_namespace: String,

    /// Label subsystem for exported counters/gauges.
    pub metric_subsystem: String,

    /// TLS server configuration override; `None` uses an ephemeral
    /// self-signed certificate (see [`crate::transport::tls`]).
    #[serde(skip)]
    pub tls: Option<TlsServerConfig>,
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(d)?;
        Ok(Duration::from_secs(secs))
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            topics: Vec::new(),
            cleaning_interval: DEFAULT_CLEANING_INTERVAL,
            acceptor_concurrency: DEFAULT_ACCEPTOR_CONCURRENCY,
            acceptor_queue_size: DEFAULT_ACCEPTOR_QUEUE_SIZE,
            distributor_concurrency: DEFAULT_DISTRIBUTOR_CONCURRENCY,
            distributor_queue_size: DEFAULT_DISTRIBUTOR_QUEUE_SIZE,
            metric_namespace: String::new(),
            metric_subsystem: "streamhub".to_string(),
            tls: None,
        }
    }
}

impl BrokerConfig {
    pub fn builder() -> BrokerConfigBuilder {
        BrokerConfigBuilder::default()
    }

    /// Validates field invariants. Does not validate `tls` (trusted
    /// once constructed by the caller or by [`crate::transport::tls`]).
    pub fn validate(&self) -> Result<(), String> {
        if self.topics.is_empty() {
            return Err("at least one topic must be declared".to_string());
        }

        if self.topics.iter().any(|t| t == ERROR_TOPIC) {
            return Err(format!(
                "'{ERROR_TOPIC}' is reserved and cannot be declared as a topic"
            ));
        }

        if self.cleaning_interval.is_zero() {
            return Err("cleaning_interval must be non-zero".to_string());
        }

        if self.acceptor_concurrency == 0 {
            return Err("acceptor_concurrency must be non-zero".to_string());
        }

        if self.acceptor_queue_size == 0 {
            return Err("acceptor_queue_size must be non-zero".to_string());
        }

        if self.distributor_concurrency == 0 {
            return Err("distributor_concurrency must be non-zero".to_string());
        }

        if self.distributor_queue_size == 0 {
            return Err("distributor_queue_size must be non-zero".to_string());
        }

        Ok(())
    }
}

/// Fluent builder for [`BrokerConfig`].
#[derive(Debug, Default)]
pub struct BrokerConfigBuilder {
    config: BrokerConfig,
}

impl BrokerConfigBuilder {
    pub fn with_topics(mut self, topics: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.config.topics = topics.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_cleaning_interval(mut self, interval: Duration) -> Self {
        self.config.cleaning_interval = interval;
        self
    }

    pub fn with_acceptor_concurrency(mut self, n: usize) -> Self {
        self.config.acceptor_concurrency = n;
        self
    }

    pub fn with_acceptor_queue_size(mut self, n: usize) -> Self {
        self.config.acceptor_queue_size = n;
        self
    }

    pub fn with_distributor_concurrency(mut self, n: usize) -> Self {
        self.config.distributor_concurrency = n;
        self
    }

    pub fn with_distributor_queue_size(mut self, n: usize) -> Self {
        self.config.distributor_queue_size = n;
        self
    }

    pub fn with_metric_labels(mut self, namespace: impl Into<String>, subsystem: impl Into<String>) -> Self {
        self.config.metric_namespace = namespace.into();
        self.config.metric_subsystem = subsystem.into();
        self
    }

    pub fn with_tls(mut self, tls: TlsServerConfig) -> Self {
        self.config.tls = Some(tls);
        self
    }

    pub fn build(self) -> Result<BrokerConfig, BrokerError> {
        self.config
            .validate()
            .map_err(|reason| BrokerError::InvalidConfig { reason })?;
        Ok(self.config)
    }
}
