//! Conversions from external infrastructure errors into domain errors.

use calbridge_domain::CalBridgeError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub CalBridgeError);

impl From<InfraError> for CalBridgeError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<CalBridgeError> for InfraError {
    fn from(value: CalBridgeError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoCalBridgeError {
    fn into_calbridge(self) -> CalBridgeError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → CalBridgeError */
/* -------------------------------------------------------------------------- */

impl IntoCalBridgeError for SqlError {
    fn into_calbridge(self) -> CalBridgeError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => {
                        CalBridgeError::Database("database is busy".into())
                    }
                    (ErrorCode::DatabaseLocked, _) => {
                        CalBridgeError::Database("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 2067) => {
                        CalBridgeError::Database("unique constraint violation".into())
                    }
                    (ErrorCode::ConstraintViolation, 787) => {
                        CalBridgeError::Database("foreign key constraint violation".into())
                    }
                    _ => CalBridgeError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => {
                CalBridgeError::NotFound("no rows returned by query".into())
            }
            RE::FromSqlConversionFailure(_, _, cause) => {
                CalBridgeError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                CalBridgeError::Database(format!("invalid column type: {ty}"))
            }
            RE::Utf8Error(_) => {
                CalBridgeError::Database("invalid UTF-8 returned from sqlite".into())
            }
            RE::InvalidParameterName(parameter_name) => {
                CalBridgeError::Database(format!("invalid parameter name: {parameter_name}"))
            }
            RE::InvalidPath(path) => CalBridgeError::Database(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            RE::InvalidQuery => CalBridgeError::Database("invalid SQL query".into()),
            other => CalBridgeError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_calbridge())
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → CalBridgeError */
/* -------------------------------------------------------------------------- */

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        InfraError(CalBridgeError::Database(format!("pool error: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → CalBridgeError */
/* -------------------------------------------------------------------------- */

impl IntoCalBridgeError for HttpError {
    fn into_calbridge(self) -> CalBridgeError {
        if self.is_timeout() {
            return CalBridgeError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return CalBridgeError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                404 => CalBridgeError::NotFound(message),
                400..=499 => CalBridgeError::InvalidInput(message),
                _ => CalBridgeError::Network(message),
            };
        }

        CalBridgeError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_calbridge())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use reqwest::{Client, StatusCode};
    use rusqlite::ffi::{Error as FfiError, ErrorCode};
    use rusqlite::Error as SqlError;
    use tokio::runtime::Runtime;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[test]
    fn sqlite_busy_maps_to_database_error() {
        let err = SqlError::SqliteFailure(
            FfiError { code: ErrorCode::DatabaseBusy, extended_code: 5 },
            Some("database is locked".into()),
        );

        let mapped: CalBridgeError = InfraError::from(err).into();
        match mapped {
            CalBridgeError::Database(msg) => {
                assert!(msg.contains("busy") || msg.contains("locked"));
            }
            other => panic!("expected database error, got {:?}", other),
        }
    }

    #[test]
    fn no_rows_maps_to_not_found() {
        let mapped: CalBridgeError = InfraError::from(SqlError::QueryReturnedNoRows).into();
        assert!(matches!(mapped, CalBridgeError::NotFound(_)));
    }

    #[test]
    fn http_status_422_maps_to_invalid_input() {
        Runtime::new().unwrap().block_on(async {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(StatusCode::UNPROCESSABLE_ENTITY))
                .mount(&server)
                .await;

            let client = Client::builder().no_proxy().build().unwrap();
            let error =
                client.get(server.uri()).send().await.unwrap().error_for_status().unwrap_err();

            let mapped: CalBridgeError = InfraError::from(error).into();
            match mapped {
                CalBridgeError::InvalidInput(msg) => assert!(msg.contains("422")),
                other => panic!("expected invalid input error, got {:?}", other),
            }
        });
    }

    #[test]
    fn http_status_500_maps_to_network_error() {
        Runtime::new().unwrap().block_on(async {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(StatusCode::INTERNAL_SERVER_ERROR))
                .mount(&server)
                .await;

            let client = Client::builder().no_proxy().build().unwrap();
            let error =
                client.get(server.uri()).send().await.unwrap().error_for_status().unwrap_err();

            let mapped: CalBridgeError = InfraError::from(error).into();
            match mapped {
                CalBridgeError::Network(msg) => assert!(msg.contains("500")),
                other => panic!("expected network error, got {:?}", other),
            }
        });
    }
}
