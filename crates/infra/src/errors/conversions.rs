//! Conversions from external infrastructure errors into domain errors.

use r2d2::Error as PoolError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;
use tnt_domain::TntError;
use tokio::task::JoinError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub TntError);

impl From<InfraError> for TntError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<TntError> for InfraError {
    fn from(value: TntError) -> Self {
        InfraError(value)
    }
}

trait IntoTntError {
    fn into_tnt(self) -> TntError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → TntError */
/* -------------------------------------------------------------------------- */

impl IntoTntError for SqlError {
    fn into_tnt(self) -> TntError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match err.code {
                    ErrorCode::DatabaseBusy => TntError::Database("database is busy".into()),
                    ErrorCode::DatabaseLocked => TntError::Database("database is locked".into()),
                    ErrorCode::NotADatabase | ErrorCode::DatabaseCorrupt => {
                        TntError::Database(format!("database file is unusable: {message}"))
                    }
                    ErrorCode::DiskFull => TntError::Database("disk is full".into()),
                    ErrorCode::ReadOnly => TntError::Database("database is read-only".into()),
                    _ => TntError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => TntError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                TntError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                TntError::Database(format!("invalid column type: {ty}"))
            }
            RE::InvalidPath(path) => {
                TntError::Config(format!("invalid database path: {}", path.to_string_lossy()))
            }
            other => TntError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_tnt())
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → TntError */
/* -------------------------------------------------------------------------- */

impl IntoTntError for PoolError {
    fn into_tnt(self) -> TntError {
        TntError::Database(format!("connection pool unavailable: {self}"))
    }
}

impl From<PoolError> for InfraError {
    fn from(value: PoolError) -> Self {
        InfraError(value.into_tnt())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → TntError */
/* -------------------------------------------------------------------------- */

impl IntoTntError for HttpError {
    fn into_tnt(self) -> TntError {
        if self.is_timeout() {
            return TntError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return TntError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => TntError::Auth(message),
                404 => TntError::NotFound(message),
                400..=499 if code != 429 => TntError::InvalidInput(message),
                _ => TntError::Network(message),
            };
        }

        if self.is_builder() {
            return TntError::Config(format!("invalid HTTP request: {self}"));
        }

        TntError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_tnt())
    }
}

/* -------------------------------------------------------------------------- */
/* tokio::task::JoinError → TntError */
/* -------------------------------------------------------------------------- */

impl From<JoinError> for InfraError {
    fn from(value: JoinError) -> Self {
        InfraError(TntError::Internal(format!("blocking task failed: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
