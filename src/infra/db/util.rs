use sqlx::mysql::MySqlDatabaseError;

use crate::application::repos::RepoError;

/// MySQL error numbers that mean the statement was cut short.
const ER_QUERY_INTERRUPTED: u16 = 1317;
const ER_QUERY_TIMEOUT: u16 = 3024;
const ER_LOCK_WAIT_TIMEOUT: u16 = 1205;

pub fn map_sqlx_error(err: sqlx::Error) -> RepoError {
    match err {
        sqlx::Error::RowNotFound => RepoError::NotFound,
        sqlx::Error::PoolTimedOut => RepoError::Timeout,
        sqlx::Error::Database(db)
            if db
                .try_downcast_ref::<MySqlDatabaseError>()
                .is_some_and(|mysql| {
                    matches!(
                        mysql.number(),
                        ER_QUERY_INTERRUPTED | ER_QUERY_TIMEOUT | ER_LOCK_WAIT_TIMEOUT
                    )
                }) =>
        {
            RepoError::Timeout
        }
        other => RepoError::from_persistence(other),
    }
}
