//! Conversions from external infrastructure errors into domain errors.

use busysync_domain::BusySyncError;
use reqwest::Error as HttpError;
use reqwest::StatusCode;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub BusySyncError);

impl From<InfraError> for BusySyncError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<BusySyncError> for InfraError {
    fn from(value: BusySyncError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoBusySyncError {
    fn into_busysync(self) -> BusySyncError;
}

/// Classify a non-success API response.
///
/// 5xx and 429 are transient; 401 is an authentication failure; 404 and
/// 410 mean the resource is gone; every other 4xx is permanent.
pub fn status_error(status: StatusCode, body: &str) -> BusySyncError {
    let code = status.as_u16();
    let message = if body.trim().is_empty() {
        format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"))
    } else {
        format!("HTTP {code}: {}", body.trim())
    };

    match code {
        401 => BusySyncError::Auth(message),
        404 | 410 => BusySyncError::NotFound(message),
        429 | 500..=599 => BusySyncError::TransientApi(message),
        _ => BusySyncError::PermanentApi { status: code, message },
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → BusySyncError */
/* -------------------------------------------------------------------------- */

impl IntoBusySyncError for HttpError {
    fn into_busysync(self) -> BusySyncError {
        if self.is_timeout() {
            return BusySyncError::TransientApi("HTTP request timed out".into());
        }

        if self.is_connect() {
            return BusySyncError::TransientApi("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            return status_error(status, "");
        }

        if self.is_decode() {
            return BusySyncError::Internal(format!("failed to decode API response: {self}"));
        }

        BusySyncError::TransientApi(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_busysync())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json / toml / io → BusySyncError */
/* -------------------------------------------------------------------------- */

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        InfraError(BusySyncError::Internal(format!("invalid JSON payload: {value}")))
    }
}

impl From<toml::de::Error> for InfraError {
    fn from(value: toml::de::Error) -> Self {
        InfraError(BusySyncError::Config(format!("invalid TOML configuration: {value}")))
    }
}

impl From<std::io::Error> for InfraError {
    fn from(value: std::io::Error) -> Self {
        InfraError(BusySyncError::Config(format!("failed to read configuration: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
