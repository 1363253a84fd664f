use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum DomainError {
    #[error("Invalid domain name: {0}")]
    InvalidDomainName(String),

    #[error("Invalid upstream endpoint: {0}")]
    InvalidUpstream(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("No such host: {0}")]
    NoSuchHost(String),

    #[error("Lookup for {host} failed: {reasons}")]
    LookupFailed { host: String, reasons: String },

    #[error("All upstreams in group '{group}' failed: {reasons}")]
    UpstreamGroupFailed { group: String, reasons: String },

    #[error("Domain is blocked")]
    Blocked,

    #[error("Transport timeout connecting to {server}")]
    TransportTimeout { server: String },

    #[error("Transport error for {server}: {reason}")]
    TransportFailed { server: String, reason: String },

    #[error("No transport available for {0}")]
    UnsupportedTransport(String),

    #[error("Dial failed for {addr}: {reason}")]
    DialFailed { addr: String, reason: String },
}

/// Collects per-entry validation failures so a constructor can report every
/// bad entry at once and fail atomically.
#[derive(Debug, Default)]
pub struct ConfigErrors {
    items: Vec<String>,
}

impl ConfigErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.items.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_result(self, context: &str) -> Result<(), DomainError> {
        if self.items.is_empty() {
            Ok(())
        } else {
            Err(DomainError::ConfigError(format!(
                "{}: {}",
                context,
                self.items.join("; ")
            )))
        }
    }
}
