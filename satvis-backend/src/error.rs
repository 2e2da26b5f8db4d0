///! Error taxonomy of the visibility query
use thiserror::Error;

/// Failures surfaced at the query boundary.
///
/// A propagation that yields no position is not an error; it is reported
/// through `Visibility::NotObservable` instead.
#[derive(Debug, Error)]
pub enum VisibilityError {
    /// The client omitted or garbled a required input
    #[error("{0}")]
    InvalidRequest(String),

    /// Unknown satellite, or a catalog entry without orbital elements
    #[error("{0}")]
    NotFound(String),

    /// The TLE lines could not be decoded into an SGP4 model
    #[error("Invalid TLE format: {0}")]
    MalformedElements(String),

    /// Degenerate geometry while computing look angles
    #[error("Look angles calculation error: {0}")]
    Transform(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl VisibilityError {
    /// HTTP-style status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            VisibilityError::InvalidRequest(_) => 400,
            VisibilityError::NotFound(_) => 404,
            VisibilityError::MalformedElements(_)
            | VisibilityError::Transform(_)
            | VisibilityError::Internal(_) => 500,
        }
    }

    /// Message safe to return to a client.
    ///
    /// Unexpected internal failures never leak their details.
    pub fn public_message(&self) -> String {
        match self {
            VisibilityError::Internal(_) => "Internal Server Error".to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, VisibilityError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(VisibilityError::InvalidRequest("satId param required".into()).status_code(), 400);
        assert_eq!(VisibilityError::NotFound("TLE not found".into()).status_code(), 404);
        assert_eq!(VisibilityError::MalformedElements("bad".into()).status_code(), 500);
        assert_eq!(VisibilityError::Transform("zero range".into()).status_code(), 500);
        assert_eq!(VisibilityError::Internal(anyhow::anyhow!("boom")).status_code(), 500);
    }

    #[test]
    fn test_internal_error_is_not_leaked() {
        let err = VisibilityError::Internal(anyhow::anyhow!("disk on fire at /var/lib/x"));
        assert_eq!(err.public_message(), "Internal Server Error");

        let err = VisibilityError::NotFound("TLE not found for satellite: 99999".into());
        assert_eq!(err.public_message(), "TLE not found for satellite: 99999");
    }
}
