//! Error classification for fetching and batch runs

use std::fmt;

use hoopline_store::{EntityId, EntityKind, Partition, ResolveError, StoreError};

/// Failure from one Fetch Client call.
///
/// Every variant is transient from the runner's point of view: throttling,
/// network failure and a malformed payload are all retried the same way.
#[derive(Debug)]
pub enum FetchError {
    /// HTTP error with optional status code
    Http {
        status: Option<u16>,
        message: String,
    },
    /// Request exceeded the client timeout
    Timeout(String),
    /// Response arrived but could not be turned into a record set
    Decode(String),
}

impl FetchError {
    pub fn from_reqwest(e: &reqwest::Error) -> Self {
        if e.is_timeout() {
            return Self::Timeout(e.to_string());
        }
        Self::Http {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    /// 429 from the remote source. Only used to word log lines.
    pub fn is_rate_limited(&self) -> bool {
        matches!(
            self,
            Self::Http {
                status: Some(429),
                ..
            }
        )
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http {
                status: Some(s),
                message,
            } => write!(f, "HTTP {s}: {message}"),
            Self::Http {
                status: None,
                message,
            } => write!(f, "HTTP error: {message}"),
            Self::Timeout(msg) => write!(f, "timed out: {msg}"),
            Self::Decode(msg) => write!(f, "malformed response: {msg}"),
        }
    }
}

impl std::error::Error for FetchError {}

/// Fatal error that stops a stage or the whole pipeline.
#[derive(Debug)]
pub enum RunError {
    /// Store write/read failed; continuing could record a success that
    /// never reached disk.
    Store {
        partition: Partition,
        kind: EntityKind,
        id: Option<EntityId>,
        source: StoreError,
    },
    /// A downstream stage started before its upstream stage produced entries.
    Dependency {
        stage: EntityKind,
        source: ResolveError,
    },
    /// `max_attempts` consecutive failures for one id.
    RetriesExhausted {
        partition: Partition,
        kind: EntityKind,
        id: EntityId,
        attempts: u32,
        last: FetchError,
    },
    /// Shutdown requested via signal.
    Interrupted {
        partition: Partition,
        kind: EntityKind,
    },
}

impl RunError {
    pub fn store(
        partition: &Partition,
        kind: EntityKind,
        id: Option<&EntityId>,
        source: StoreError,
    ) -> Self {
        Self::Store {
            partition: partition.clone(),
            kind,
            id: id.cloned(),
            source,
        }
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted { .. })
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store {
                partition,
                kind,
                id: Some(id),
                source,
            } => write!(f, "[{partition}] {kind} stage, id {id}: {source}"),
            Self::Store {
                partition,
                kind,
                id: None,
                source,
            } => write!(f, "[{partition}] {kind} stage: {source}"),
            Self::Dependency { stage, source } => write!(f, "{stage} stage: {source}"),
            Self::RetriesExhausted {
                partition,
                kind,
                id,
                attempts,
                last,
            } => write!(
                f,
                "[{partition}] {kind} stage, id {id}: gave up after {attempts} attempts: {last}"
            ),
            Self::Interrupted { partition, kind } => {
                write!(f, "[{partition}] {kind} stage: interrupted by shutdown request")
            }
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store { source, .. } => Some(source),
            Self::Dependency { source, .. } => Some(source),
            Self::RetriesExhausted { last, .. } => Some(last),
            Self::Interrupted { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http_err(status: u16) -> FetchError {
        FetchError::Http {
            status: Some(status),
            message: "test".to_string(),
        }
    }

    #[test]
    fn rate_limit_detected() {
        assert!(http_err(429).is_rate_limited());
        assert!(!http_err(500).is_rate_limited());
        assert!(!FetchError::decode("bad").is_rate_limited());
    }

    #[test]
    fn display_http_with_status() {
        assert_eq!(http_err(404).to_string(), "HTTP 404: test");
    }

    #[test]
    fn display_http_without_status() {
        let err = FetchError::Http {
            status: None,
            message: "connection refused".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP error: connection refused");
    }

    #[test]
    fn display_decode() {
        assert!(FetchError::decode("no resultSets").to_string().contains("no resultSets"));
    }

    #[test]
    fn run_error_carries_context() {
        let err = RunError::store(
            &Partition::new("2019").unwrap(),
            EntityKind::BoxScore,
            Some(&EntityId::new("0021900050")),
            StoreError::InvalidKey {
                kind: EntityKind::BoxScore,
                id: EntityId::new("0021900050"),
            },
        );
        let msg = err.to_string();
        assert!(msg.contains("2019"));
        assert!(msg.contains("box score"));
        assert!(msg.contains("0021900050"));
    }

    #[test]
    fn retries_exhausted_has_source() {
        use std::error::Error;
        let err = RunError::RetriesExhausted {
            partition: Partition::new("2019").unwrap(),
            kind: EntityKind::GameLog,
            id: EntityId::new("1"),
            attempts: 3,
            last: http_err(503),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("3 attempts"));
    }
}
