use thiserror::Error;

/// Trail subsystem error types
///
/// Only `Configuration` is fatal. The others are collected as fallback
/// reasons during negotiation and end in a working, if less capable, source.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrailError {
    #[error("Capability unavailable: {0}")]
    CapabilityUnavailable(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Permission request unanswered after {0} ms")]
    PermissionTimeout(u64),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl TrailError {
    /// Whether this error leaves the subsystem unable to run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, TrailError::Configuration(_))
    }
}

/// Result type for trail operations
pub type TrailResult<T> = Result<T, TrailError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_configuration_is_fatal() {
        assert!(TrailError::Configuration("unbound".into()).is_fatal());
        assert!(!TrailError::PermissionDenied("motion".into()).is_fatal());
        assert!(!TrailError::PermissionTimeout(3000).is_fatal());
        assert!(!TrailError::CapabilityUnavailable("xr".into()).is_fatal());
    }

    #[test]
    fn test_display() {
        let err = TrailError::PermissionTimeout(3000);
        assert_eq!(err.to_string(), "Permission request unanswered after 3000 ms");
    }
}
