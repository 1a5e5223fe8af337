use thiserror::Error;

use crate::legacy::types::ApiResult;

/// Failure of the remote call itself, as opposed to an error the backing
/// service reports in its result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkFault {
    #[error("backing service unreachable: {0}")]
    Unreachable(String),

    #[error("remote call timed out after {0} ms")]
    Timeout(u64),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed reply: {0}")]
    Protocol(String),
}

impl From<zbus::Error> for LinkFault {
    fn from(e: zbus::Error) -> Self {
        match e {
            zbus::Error::MethodError(ref name, _, _)
                if name.as_str() == "org.freedesktop.DBus.Error.ServiceUnknown" =>
            {
                Self::Unreachable(e.to_string())
            }
            other => Self::Transport(other.to_string()),
        }
    }
}

impl From<zbus::fdo::Error> for LinkFault {
    fn from(e: zbus::fdo::Error) -> Self {
        match e {
            // Not running and not activatable, or activation failed to start it
            zbus::fdo::Error::ServiceUnknown(msg)
            | zbus::fdo::Error::NameHasNoOwner(msg)
            | zbus::fdo::Error::SpawnServiceNotFound(msg)
            | zbus::fdo::Error::SpawnExecFailed(msg)
            | zbus::fdo::Error::SpawnFailed(msg) => Self::Unreachable(msg),
            other => Self::Transport(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for LinkFault {
    fn from(e: serde_json::Error) -> Self {
        Self::Protocol(e.to_string())
    }
}

/// Unified error type for the compatibility adapter
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompatError {
    #[error("missing parameter: {0}")]
    NullParam(&'static str),

    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    #[error("backing service not initialized")]
    NotInitialized,

    #[error("operation not supported: {0}")]
    NotSupported(String),

    #[error(transparent)]
    Link(#[from] LinkFault),

    #[error("credential storage failed: {0}")]
    Storage(LinkFault),
}

impl CompatError {
    /// Legacy transport status reported for this error
    pub fn api_result(&self) -> ApiResult {
        match self {
            Self::NullParam(_) => ApiResult::NullParam,
            Self::InvalidParam(_) => ApiResult::InvalidParam,
            Self::NotInitialized => ApiResult::NotInitialized,
            Self::NotSupported(_) => ApiResult::OperationNotSupported,
            Self::Link(_) => ApiResult::Failed,
            Self::Storage(_) => ApiResult::ReadWriteFailed,
        }
    }
}

pub type CompatResult<T> = Result<T, CompatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_faults_are_general_failures() {
        let err = CompatError::from(LinkFault::Timeout(10_000));
        assert_eq!(err.api_result(), ApiResult::Failed);
        assert_eq!(err.to_string(), "remote call timed out after 10000 ms");
    }

    #[test]
    fn storage_faults_are_read_write_failures() {
        let err = CompatError::Storage(LinkFault::Transport("gone".into()));
        assert_eq!(err.api_result(), ApiResult::ReadWriteFailed);
    }

    #[test]
    fn unactivatable_services_are_unreachable() {
        for e in [
            zbus::fdo::Error::ServiceUnknown("org.rdk.NetworkManager".into()),
            zbus::fdo::Error::SpawnServiceNotFound("org.rdk.NetworkManager".into()),
            zbus::fdo::Error::SpawnExecFailed("org.rdk.NetworkManager".into()),
        ] {
            assert!(matches!(LinkFault::from(e), LinkFault::Unreachable(_)));
        }
        assert!(matches!(
            LinkFault::from(zbus::fdo::Error::AccessDenied("policy".into())),
            LinkFault::Transport(_)
        ));
    }

    #[test]
    fn validation_faults_keep_their_codes() {
        assert_eq!(CompatError::NullParam("ssid").api_result(), ApiResult::NullParam);
        assert_eq!(
            CompatError::InvalidParam("too long".into()).api_result(),
            ApiResult::InvalidParam
        );
        assert_eq!(
            CompatError::NotSupported("retrieveSSID".into()).api_result(),
            ApiResult::OperationNotSupported
        );
    }
}
