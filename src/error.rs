use sea_orm::{DbErr, RuntimeErr, SqlErr, sqlx};
use thiserror::Error;

// SQLite primary result codes; extended codes carry them in the low byte.
const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// Bad input shape or range; the operation was not attempted.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: String, id: i32 },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Another driver was assigned first.
    #[error("Order {order_id} already has a driver")]
    AlreadyAssigned { order_id: i32 },

    /// Unknown username and wrong password are deliberately indistinguishable.
    #[error("Invalid username or password")]
    AuthFailure,

    #[error("Conflict: {0}")]
    Conflict(String),

    /// A store constraint rejected a write. Signals a broken precondition, not bad user input.
    #[error("Integrity error: {0}")]
    Integrity(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Export failed: {0}")]
    Export(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(entity: impl Into<String>, id: i32) -> Self {
        AppError::NotFound {
            entity: entity.into(),
            id,
        }
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        if is_lock_contention(&err) {
            return AppError::StorageUnavailable(err.to_string());
        }

        if let Some(sql_err) = err.sql_err() {
            return match sql_err {
                SqlErr::UniqueConstraintViolation(msg) => {
                    AppError::Integrity(format!("unique constraint violated: {}", msg))
                }
                SqlErr::ForeignKeyConstraintViolation(msg) => {
                    AppError::Integrity(format!("foreign key constraint violated: {}", msg))
                }
                other => AppError::Integrity(other.to_string()),
            };
        }

        match &err {
            DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => {
                AppError::StorageUnavailable(err.to_string())
            }
            DbErr::Exec(_) | DbErr::Query(_) | DbErr::RecordNotInserted | DbErr::RecordNotUpdated => {
                AppError::Integrity(err.to_string())
            }
            _ => AppError::Internal(err.to_string()),
        }
    }
}

/// The database stayed locked past the busy timeout. The operation may
/// succeed on retry, so this is not an integrity failure.
fn is_lock_contention(err: &DbErr) -> bool {
    let (DbErr::Exec(RuntimeErr::SqlxError(sqlx::Error::Database(db_err)))
    | DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::Database(db_err)))) = err
    else {
        return false;
    };
    db_err
        .code()
        .and_then(|code| code.parse::<i32>().ok())
        .is_some_and(|code| matches!(code & 0xff, SQLITE_BUSY | SQLITE_LOCKED))
}
