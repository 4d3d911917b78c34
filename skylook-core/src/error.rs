use thiserror::Error;

/// Why a weather lookup did not produce a snapshot.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The request never completed (DNS, TLS, connection reset, timeout...).
    #[error("Network error: {0}")]
    Network(String),

    /// The provider answered but the body could not be understood.
    #[error("Malformed provider response: {0}")]
    Malformed(String),

    /// The provider does not know the requested place.
    #[error("{message}")]
    NotFound { message: String },

    /// Any other non-success status reported by the provider.
    #[error("Provider returned {code}: {message}")]
    Rejected { code: String, message: String },

    #[error("No API key configured.\nHint: run `skylook configure` or set SKYLOOK_API_KEY.")]
    MissingApiKey,
}

impl LookupError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, LookupError::NotFound { .. })
    }
}

impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            LookupError::Malformed(err.to_string())
        } else {
            LookupError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for LookupError {
    fn from(err: serde_json::Error) -> Self {
        LookupError::Malformed(err.to_string())
    }
}

/// Why the device position could not be determined.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Location unavailable: {0}")]
    Unavailable(String),

    #[error("Location request timed out")]
    Timeout,
}

impl LocationError {
    /// Message shown to the user for this failure.
    pub fn user_message(&self) -> &'static str {
        match self {
            LocationError::PermissionDenied => "Location access denied.",
            LocationError::Unavailable(_) => "Location information is unavailable.",
            LocationError::Timeout => "The request to get your location timed out.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_displays_provider_message_verbatim() {
        let err = LookupError::NotFound { message: "city not found".into() };
        assert_eq!(err.to_string(), "city not found");
        assert!(err.is_not_found());
        assert!(!LookupError::Network("reset".into()).is_not_found());
    }

    #[test]
    fn each_location_failure_has_its_own_message() {
        let msgs = [
            LocationError::PermissionDenied.user_message(),
            LocationError::Unavailable("no signal".into()).user_message(),
            LocationError::Timeout.user_message(),
        ];
        assert_ne!(msgs[0], msgs[1]);
        assert_ne!(msgs[1], msgs[2]);
        assert_ne!(msgs[0], msgs[2]);
    }
}
