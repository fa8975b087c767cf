//! Opening the application database and creating its schema.
//!
//! Opening retries a bounded number of times so the app can start while the
//! database volume is still coming up. The delay between attempts comes from
//! a [BackoffPolicy] so tests can exhaust the budget without real sleeps.

use std::{thread, time::Duration};

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{
    Error,
    activity::{ActivityKind, create_activity_log_table, record_activity},
    expense::create_expense_table,
};

/// How many times to try opening the database before giving up.
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 5;

/// How long to wait between attempts to open the database.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(5);

/// The delay to apply between attempts of a retried operation.
pub trait BackoffPolicy {
    /// The delay to wait after `attempt` failed. The first attempt is 1.
    fn delay_for_attempt(&self, attempt: u32) -> Duration;
}

/// A fixed delay between attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantBackoff(pub Duration);

impl BackoffPolicy for ConstantBackoff {
    fn delay_for_attempt(&self, _attempt: u32) -> Duration {
        self.0
    }
}

/// A delay that doubles after each failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExponentialBackoff {
    /// The delay after the first failed attempt.
    pub base: Duration,
}

impl BackoffPolicy for ExponentialBackoff {
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.base
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

/// Open the SQLite database at `db_path`, retrying up to `max_attempts`
/// times with the delays given by `backoff`.
///
/// # Errors
/// Returns [Error::ConnectionExhausted] once the retry budget is spent.
/// Callers at startup should treat this as fatal.
pub fn open_with_retry(
    db_path: &str,
    max_attempts: u32,
    backoff: &impl BackoffPolicy,
) -> Result<Connection, Error> {
    for attempt in 1..=max_attempts {
        match Connection::open(db_path) {
            Ok(connection) => {
                tracing::info!("Successfully connected to the database.");
                return Ok(connection);
            }
            Err(error) => {
                tracing::warn!(
                    "Database isn't ready (attempt {attempt}/{max_attempts}), waiting: {error}"
                );

                if attempt < max_attempts {
                    thread::sleep(backoff.delay_for_attempt(attempt));
                }
            }
        }
    }

    tracing::error!("Could not connect to the database. Is it running?");
    Err(Error::ConnectionExhausted(max_attempts))
}

/// Add the tables for the domain models to the database and record the
/// application start in the activity log.
///
/// Table creation is idempotent and happens inside a single exclusive
/// transaction, so a failure leaves no partially created schema behind.
///
/// # Errors
/// Returns an error if a table cannot be created or the log entry cannot be
/// written. Callers at startup should treat this as fatal.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_expense_table(&transaction)?;
    create_activity_log_table(&transaction)?;

    transaction.commit()?;

    record_activity(connection, ActivityKind::AppStart, "Tables are ready.")?;

    Ok(())
}
