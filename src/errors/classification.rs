use super::types::TrackerError;

#[derive(Debug, Clone)]
pub struct ErrorClassification {
    pub error_type: &'static str,
    pub transient: bool,
}

impl TrackerError {
    /// Classify this error to determine its type and whether a later poll
    /// can reasonably be expected to succeed.
    pub fn classify(&self) -> ErrorClassification {
        match self {
            // Transient: the next tick may well succeed
            TrackerError::Network(_) => ErrorClassification {
                error_type: "NetworkError",
                transient: true,
            },
            TrackerError::Timeout(_) => ErrorClassification {
                error_type: "TimeoutError",
                transient: true,
            },
            TrackerError::RateLimit(_) => ErrorClassification {
                error_type: "RateLimitError",
                transient: true,
            },
            TrackerError::Decode(_) => ErrorClassification {
                error_type: "DecodeError",
                transient: true,
            },
            TrackerError::Io(_) => ErrorClassification {
                error_type: "IoError",
                transient: true,
            },
            TrackerError::Json(_) => ErrorClassification {
                error_type: "JsonError",
                transient: true,
            },

            // Persistent: polling keeps going, but someone should look
            TrackerError::Authentication(_) => ErrorClassification {
                error_type: "AuthenticationError",
                transient: false,
            },
            TrackerError::NotFound(_) => ErrorClassification {
                error_type: "NotFoundError",
                transient: false,
            },
            TrackerError::InvalidConfiguration(_) => ErrorClassification {
                error_type: "InvalidConfiguration",
                transient: false,
            },
            TrackerError::Config(_) => ErrorClassification {
                error_type: "ConfigError",
                transient: false,
            },
            TrackerError::Yaml(_) => ErrorClassification {
                error_type: "YamlError",
                transient: false,
            },
            TrackerError::JobFailed(_) => ErrorClassification {
                error_type: "JobFailed",
                transient: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_error_transient() {
        let err = TrackerError::Network("connection refused".into());
        let class = err.classify();
        assert!(class.transient);
        assert_eq!(class.error_type, "NetworkError");
    }

    #[test]
    fn test_timeout_transient() {
        let err = TrackerError::Timeout("timed out".into());
        assert!(err.classify().transient);
    }

    #[test]
    fn test_rate_limit_transient() {
        let err = TrackerError::RateLimit("slow down".into());
        assert!(err.classify().transient);
    }

    #[test]
    fn test_decode_transient() {
        let err = TrackerError::Decode("truncated body".into());
        assert!(err.classify().transient);
    }

    #[test]
    fn test_auth_error_not_transient() {
        let err = TrackerError::Authentication("token expired".into());
        let class = err.classify();
        assert!(!class.transient);
        assert_eq!(class.error_type, "AuthenticationError");
    }

    #[test]
    fn test_not_found_not_transient() {
        let err = TrackerError::NotFound("job-1".into());
        assert!(!err.classify().transient);
    }

    #[test]
    fn test_invalid_configuration_not_transient() {
        let err = TrackerError::InvalidConfiguration("no stages".into());
        assert_eq!(err.classify().error_type, "InvalidConfiguration");
        assert!(!err.classify().transient);
    }
}
