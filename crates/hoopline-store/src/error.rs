//! Errors for the entity store and dependency resolver

use std::fmt;
use std::path::PathBuf;

use crate::key::{EntityId, Partition};
use crate::kind::EntityKind;

/// Failure from the entity store.
#[derive(Debug)]
pub enum StoreError {
    /// Destination could not be provisioned, written, or read.
    Io { path: PathBuf, source: std::io::Error },
    /// No cache entry for this key.
    NotFound {
        partition: Partition,
        kind: EntityKind,
        id: EntityId,
    },
    /// An entry exists but cannot be decoded.
    Corrupt { path: PathBuf, message: String },
    /// Id cannot be used as a file name.
    InvalidKey { kind: EntityKind, id: EntityId },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "storage error at {}: {source}", path.display()),
            Self::NotFound {
                partition,
                kind,
                id,
            } => write!(f, "no {kind} entry for id {id} in partition {partition}"),
            Self::Corrupt { path, message } => {
                write!(f, "corrupt entry {}: {message}", path.display())
            }
            Self::InvalidKey { kind, id } => write!(f, "{kind} id {id:?} is not a valid file name"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Failure deriving a work list from upstream entries.
#[derive(Debug)]
pub enum ResolveError {
    /// The upstream stage has produced nothing for this partition yet.
    DependencyUnavailable {
        partition: Partition,
        kind: EntityKind,
        column: String,
    },
    Store(StoreError),
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DependencyUnavailable {
                partition,
                kind,
                column,
            } => write!(
                f,
                "no {kind} entries in partition {partition} to derive {column} from; run that stage first"
            ),
            Self::Store(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ResolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(e) => Some(e),
            Self::DependencyUnavailable { .. } => None,
        }
    }
}

impl From<StoreError> for ResolveError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display_has_context() {
        let err = StoreError::NotFound {
            partition: Partition::new("2019").unwrap(),
            kind: EntityKind::PlayByPlay,
            id: EntityId::new("0021900050"),
        };
        let msg = err.to_string();
        assert!(msg.contains("2019"));
        assert!(msg.contains("0021900050"));
        assert!(msg.contains("play by play"));
        assert!(err.is_not_found());
    }

    #[test]
    fn io_error_has_source() {
        use std::error::Error;
        let err = StoreError::io(
            "/nope",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.source().is_some());
        assert!(err.to_string().contains("/nope"));
    }

    #[test]
    fn dependency_unavailable_display() {
        let err = ResolveError::DependencyUnavailable {
            partition: Partition::new("2019").unwrap(),
            kind: EntityKind::GameLog,
            column: "Game_ID".into(),
        };
        assert!(err.to_string().contains("Game_ID"));
    }
}
