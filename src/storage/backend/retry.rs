//! Retry and timeout executor for database operations
//!
//! Every store call runs through [`with_retry_timeout`]: transient errors
//! (deadlocks, lock waits, connection loss) are retried with exponential
//! backoff and jitter, and each attempt runs under an independent timeout
//! so no operation blocks indefinitely.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use sea_orm::DbErr;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Terminal failure of a retried operation.
#[derive(Debug)]
pub enum RetryError {
    /// The underlying driver error, after retries were exhausted or the
    /// error was classified non-retryable.
    Db(DbErr),
    /// Every attempt exceeded its timeout budget.
    TimedOut { operation: String, timeout_ms: u64 },
}

impl fmt::Display for RetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryError::Db(e) => write!(f, "{}", e),
            RetryError::TimedOut {
                operation,
                timeout_ms,
            } => write!(f, "operation '{}' timed out after {}ms", operation, timeout_ms),
        }
    }
}

impl std::error::Error for RetryError {}

/// Whether a database error indicates lost or unobtainable connectivity.
pub fn is_connection_error(err: &DbErr) -> bool {
    matches!(err, DbErr::ConnectionAcquire(_) | DbErr::Conn(_))
}

/// Whether a database error is worth retrying
pub fn is_retryable_error(err: &DbErr) -> bool {
    if is_connection_error(err) {
        return true;
    }
    match err {
        DbErr::Exec(runtime_err) | DbErr::Query(runtime_err) => {
            is_retryable_runtime_error(runtime_err)
        }
        _ => false,
    }
}

/// Deadlocks, lock waits and serialization failures are transient
fn is_retryable_runtime_error(err: &sea_orm::error::RuntimeErr) -> bool {
    use sea_orm::error::RuntimeErr;

    match err {
        RuntimeErr::SqlxError(sqlx_err) => {
            use std::ops::Deref;
            if let Some(db_err) = sqlx_err.deref().as_database_error() {
                if let Some(code) = db_err.code() {
                    let code_str = code.as_ref();
                    return matches!(
                        code_str,
                        // MySQL deadlock and lock wait timeout
                        "1213" | "1205" |
                        // PostgreSQL serialization failure and deadlock
                        "40001" | "40P01" |
                        // SQLite BUSY and LOCKED
                        "5" | "6"
                    );
                }
            }
            // Fall back to message matching for non-database errors
            is_retryable_error_message(&sqlx_err.to_string().to_lowercase())
        }
        RuntimeErr::Internal(msg) => is_retryable_error_message(&msg.to_lowercase()),
        #[allow(unreachable_patterns)]
        _ => false,
    }
}

fn is_retryable_error_message(err_str: &str) -> bool {
    err_str.contains("deadlock")
        || err_str.contains("lock wait timeout")
        || err_str.contains("database is locked")
        || err_str.contains("serialization failure")
}

#[derive(Clone, Copy)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 100,
            max_delay_ms: 2000,
        }
    }
}

/// Exponential backoff with 0-25% jitter to avoid thundering retries
fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> u64 {
    let exp_delay = base_ms.saturating_mul(2u64.saturating_pow(attempt - 1));
    let capped = exp_delay.min(max_ms);
    let jitter = rand::random_range(0..=capped / 4);
    capped.saturating_add(jitter)
}

/// Run `operation` with per-attempt timeouts and bounded retries.
///
/// Retryable errors and timeouts back off exponentially; a non-retryable
/// error returns immediately. Exhausting all attempts on timeouts yields
/// [`RetryError::TimedOut`], which callers surface as store unavailability.
pub async fn with_retry_timeout<T, F, Fut>(
    operation_name: &str,
    config: RetryConfig,
    timeout_ms: u64,
    mut operation: F,
) -> Result<T, RetryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbErr>>,
{
    let mut attempt = 0;
    loop {
        let result = tokio::time::timeout(Duration::from_millis(timeout_ms), operation()).await;

        match result {
            Ok(Ok(value)) => {
                if attempt > 0 {
                    debug!(
                        "Operation '{}' succeeded after {} retries",
                        operation_name, attempt
                    );
                }
                return Ok(value);
            }
            Ok(Err(e)) if is_retryable_error(&e) && attempt < config.max_retries => {
                attempt += 1;
                let delay = calculate_backoff(attempt, config.base_delay_ms, config.max_delay_ms);
                warn!(
                    "Operation '{}' failed (attempt {}/{}): {}; retrying in {} ms",
                    operation_name,
                    attempt,
                    config.max_retries + 1,
                    e,
                    delay
                );
                sleep(Duration::from_millis(delay)).await;
            }
            Ok(Err(e)) => {
                if !is_retryable_error(&e) {
                    debug!(
                        "Operation '{}' failed with non-retryable error: {}",
                        operation_name, e
                    );
                }
                return Err(RetryError::Db(e));
            }
            Err(_elapsed) => {
                if attempt < config.max_retries {
                    attempt += 1;
                    let delay =
                        calculate_backoff(attempt, config.base_delay_ms, config.max_delay_ms);
                    warn!(
                        "Operation '{}' timed out after {}ms (attempt {}/{}); retrying in {} ms",
                        operation_name,
                        timeout_ms,
                        attempt,
                        config.max_retries + 1,
                        delay
                    );
                    sleep(Duration::from_millis(delay)).await;
                } else {
                    warn!(
                        "Operation '{}' timed out after {}ms, retries exhausted",
                        operation_name, timeout_ms
                    );
                    return Err(RetryError::TimedOut {
                        operation: operation_name.to_string(),
                        timeout_ms,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    const TEST_TIMEOUT_MS: u64 = 1000;

    #[test]
    fn test_is_retryable_error_connection_acquire() {
        let err = DbErr::ConnectionAcquire(sea_orm::error::ConnAcquireErr::Timeout);
        assert!(is_retryable_error(&err));
        assert!(is_connection_error(&err));
    }

    #[test]
    fn test_is_retryable_error_record_not_found() {
        let err = DbErr::RecordNotFound("not found".to_string());
        assert!(!is_retryable_error(&err));
        assert!(!is_connection_error(&err));
    }

    #[test]
    fn test_is_retryable_error_deadlock() {
        let err = DbErr::Exec(sea_orm::error::RuntimeErr::Internal(
            "Deadlock found when trying to get lock".to_string(),
        ));
        assert!(is_retryable_error(&err));
        assert!(!is_connection_error(&err));
    }

    #[test]
    fn test_is_retryable_error_database_locked() {
        let err = DbErr::Query(sea_orm::error::RuntimeErr::Internal(
            "database is locked".to_string(),
        ));
        assert!(is_retryable_error(&err));
    }

    #[test]
    fn test_calculate_backoff_exponential() {
        let delay1 = calculate_backoff(1, 100, 2000);
        assert!((100..=125).contains(&delay1)); // 100 + 0-25% jitter

        let delay2 = calculate_backoff(2, 100, 2000);
        assert!((200..=250).contains(&delay2));

        let delay3 = calculate_backoff(3, 100, 2000);
        assert!((400..=500).contains(&delay3));
    }

    #[test]
    fn test_calculate_backoff_capped_at_max() {
        let delay = calculate_backoff(10, 100, 2000);
        assert!((2000..=2500).contains(&delay));
    }

    #[tokio::test]
    async fn test_success_first_try() {
        let config = RetryConfig::default();
        let call_count = AtomicU32::new(0);

        let result = with_retry_timeout("test_op", config, TEST_TIMEOUT_MS, || {
            call_count.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, DbErr>(42) }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_success_after_retries() {
        let config = RetryConfig {
            max_retries: 3,
            base_delay_ms: 10,
            max_delay_ms: 50,
        };
        let call_count = AtomicU32::new(0);

        let result = with_retry_timeout("test_op", config, TEST_TIMEOUT_MS, || {
            let count = call_count.fetch_add(1, Ordering::SeqCst);
            async move {
                if count < 2 {
                    Err(DbErr::ConnectionAcquire(
                        sea_orm::error::ConnAcquireErr::Timeout,
                    ))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(call_count.load(Ordering::SeqCst), 3); // initial + 2 retries
    }

    #[tokio::test]
    async fn test_retries_exhausted() {
        let config = RetryConfig {
            max_retries: 2,
            base_delay_ms: 10,
            max_delay_ms: 50,
        };
        let call_count = AtomicU32::new(0);

        let result = with_retry_timeout("test_op", config, TEST_TIMEOUT_MS, || {
            call_count.fetch_add(1, Ordering::SeqCst);
            async {
                Err::<i32, _>(DbErr::ConnectionAcquire(
                    sea_orm::error::ConnAcquireErr::Timeout,
                ))
            }
        })
        .await;

        assert!(matches!(result, Err(RetryError::Db(_))));
        assert_eq!(call_count.load(Ordering::SeqCst), 3); // initial + 2 retries
    }

    #[tokio::test]
    async fn test_non_retryable_error_no_retry() {
        let config = RetryConfig::default();
        let call_count = AtomicU32::new(0);

        let result = with_retry_timeout("test_op", config, TEST_TIMEOUT_MS, || {
            call_count.fetch_add(1, Ordering::SeqCst);
            async { Err::<i32, _>(DbErr::RecordNotFound("not found".to_string())) }
        })
        .await;

        assert!(matches!(result, Err(RetryError::Db(_))));
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeout_exhaustion_yields_timed_out() {
        let config = RetryConfig {
            max_retries: 1,
            base_delay_ms: 10,
            max_delay_ms: 20,
        };

        let result = with_retry_timeout("slow_op", config, 20, || async {
            sleep(Duration::from_secs(5)).await;
            Ok::<_, DbErr>(())
        })
        .await;

        match result {
            Err(RetryError::TimedOut {
                operation,
                timeout_ms,
            }) => {
                assert_eq!(operation, "slow_op");
                assert_eq!(timeout_ms, 20);
            }
            other => panic!("expected TimedOut, got {:?}", other.map(|_| ())),
        }
    }
}
