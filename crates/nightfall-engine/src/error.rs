//! Error type for game operations.

use nightfall_lobby::StoreError;
use nightfall_protocol::ErrorKind;

/// Why an operation was refused. Each variant is one of the categories
/// callers see (see [`ErrorKind`]); the message is shown to them as-is.
///
/// Every check runs before anything is written, so an operation that
/// returns an error has changed nothing.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    InvalidPhase(String),

    #[error("{0}")]
    InvalidTarget(String),

    #[error("{0}")]
    RoleCountMismatch(String),

    #[error("{0}")]
    ResourceExhausted(String),

    #[error("{0}")]
    Internal(String),
}

impl GameError {
    /// The wire category for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::InvalidPhase(_) => ErrorKind::InvalidPhase,
            Self::InvalidTarget(_) => ErrorKind::InvalidTarget,
            Self::RoleCountMismatch(_) => ErrorKind::RoleCountMismatch,
            Self::ResourceExhausted(_) => ErrorKind::ResourceExhausted,
            Self::Internal(_) => ErrorKind::InternalError,
        }
    }
}

impl From<StoreError> for GameError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => Self::NotFound("Lobby not found".into()),
            // Store details stay in the logs.
            other => {
                tracing::error!(error = %other, "lobby store failure");
                Self::Internal("Internal Server Error".into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nightfall_protocol::LobbyCode;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            GameError::ResourceExhausted("out".into()).kind(),
            ErrorKind::ResourceExhausted
        );
        assert_eq!(GameError::Internal("x".into()).kind(), ErrorKind::InternalError);
    }

    #[test]
    fn test_store_not_found_becomes_not_found() {
        let err: GameError = StoreError::NotFound(LobbyCode::new("x")).into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "Lobby not found");
    }

    #[test]
    fn test_store_backend_failure_is_internal_and_opaque() {
        let err: GameError = StoreError::Backend("disk on fire".into()).into();
        assert_eq!(err.kind(), ErrorKind::InternalError);
        assert!(!err.to_string().contains("disk"));
    }
}
