//! Conversions from external infrastructure errors into domain errors.

use dunner_domain::DunnerError;
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can
/// be converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub DunnerError);

impl From<InfraError> for DunnerError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<DunnerError> for InfraError {
    fn from(value: DunnerError) -> Self {
        InfraError(value)
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → DunnerError */
/* -------------------------------------------------------------------------- */

impl From<HttpError> for InfraError {
    fn from(err: HttpError) -> Self {
        let message = if err.is_timeout() {
            format!("http request timed out: {err}")
        } else if err.is_connect() {
            format!("http connection failed: {err}")
        } else if let Some(status) = err.status() {
            format!("http status {status}: {err}")
        } else {
            format!("http request failed: {err}")
        };
        InfraError(DunnerError::Network(message))
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error → DunnerError */
/* -------------------------------------------------------------------------- */

impl From<serde_json::Error> for InfraError {
    fn from(err: serde_json::Error) -> Self {
        InfraError(DunnerError::Internal(format!("json (de)serialization failed: {err}")))
    }
}

/* -------------------------------------------------------------------------- */
/* toml::de::Error → DunnerError */
/* -------------------------------------------------------------------------- */

impl From<toml::de::Error> for InfraError {
    fn from(err: toml::de::Error) -> Self {
        InfraError(DunnerError::Config(format!("toml parse failed: {err}")))
    }
}

/* -------------------------------------------------------------------------- */
/* url::ParseError → DunnerError */
/* -------------------------------------------------------------------------- */

impl From<url::ParseError> for InfraError {
    fn from(err: url::ParseError) -> Self {
        InfraError(DunnerError::Config(format!("invalid url: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_errors_map_to_internal() {
        let err = serde_json::from_str::<serde_json::Value>("{nope").unwrap_err();
        let infra: InfraError = err.into();
        assert!(matches!(infra.0, DunnerError::Internal(_)));
    }

    #[test]
    fn toml_errors_map_to_config() {
        let err = toml::from_str::<toml::Value>("= broken").unwrap_err();
        let infra: InfraError = err.into();
        assert!(matches!(infra.0, DunnerError::Config(_)));
    }
}
