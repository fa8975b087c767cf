//! The append-only activity log: every mutating action taken against the
//! expense list, plus application lifecycle events, gets one entry here.
//!
//! Entries are only ever inserted. No update or delete operation exists for
//! this table, so log entries for deleted expenses remain valid historical
//! text.

use std::{
    fmt::Display,
    sync::{Arc, Mutex},
};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::{PrimitiveDateTime, format_description::BorrowedFormatItem, macros::format_description};

use crate::{AppState, Error, endpoints, html::base, navigation::NavBar};

/// The action tags the application writes to the activity log.
///
/// The `action_type` column itself is open ended text, so entries written by
/// other tools or older versions still load and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    /// The application started and the schema was initialized.
    AppStart,
    /// An expense was created.
    NewExpense,
    /// An expense's description or amount was changed.
    EditExpense,
    /// An expense was deleted.
    DeleteExpense,
}

impl ActivityKind {
    /// The string tag stored in the `action_type` column.
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityKind::AppStart => "APP_START",
            ActivityKind::NewExpense => "NEW_EXPENSE",
            ActivityKind::EditExpense => "EDIT_EXPENSE",
            ActivityKind::DeleteExpense => "DELETE_EXPENSE",
        }
    }
}

impl Display for ActivityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One row of the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    /// The ID of the log entry.
    pub id: i64,
    /// The action tag, e.g. `NEW_EXPENSE`.
    pub action_type: String,
    /// Free text narrating the action, referencing expense values by value.
    pub details: String,
    /// When the entry was written, assigned by the database at insert.
    pub timestamp: PrimitiveDateTime,
}

/// Append an entry to the activity log.
///
/// Call this after the corresponding mutation has succeeded. Narrations that
/// mention previous values must use values fetched before the mutation ran.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn record_activity(
    connection: &Connection,
    kind: ActivityKind,
    details: &str,
) -> Result<(), Error> {
    connection.execute(
        "INSERT INTO activity_log (action_type, details) VALUES (?1, ?2)",
        (kind.as_str(), details),
    )?;

    Ok(())
}

/// Retrieve all activity log entries, newest first.
///
/// The id tie-break keeps the order total for entries written within the
/// same second.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn list_activity(connection: &Connection) -> Result<Vec<ActivityLogEntry>, Error> {
    connection
        .prepare(
            "SELECT id, action_type, details, timestamp FROM activity_log
             ORDER BY timestamp DESC, id DESC;",
        )?
        .query_map([], map_row)?
        .map(|maybe_entry| maybe_entry.map_err(|error| error.into()))
        .collect()
}

/// Create the activity log table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_activity_log_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS activity_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                action_type TEXT NOT NULL,
                details TEXT NOT NULL DEFAULT '',
                timestamp TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
                )",
        (),
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<ActivityLogEntry, rusqlite::Error> {
    Ok(ActivityLogEntry {
        id: row.get(0)?,
        action_type: row.get(1)?,
        details: row.get(2)?,
        timestamp: row.get(3)?,
    })
}

/// The state needed for the activity log page.
#[derive(Debug, Clone)]
pub struct ActivityPageState {
    /// The database connection for reading the activity log.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ActivityPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Route handler for the activity log page.
pub async fn get_activity_page(
    State(state): State<ActivityPageState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let entries = list_activity(&connection)?;

    Ok(activity_view(&entries).into_response())
}

const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

fn activity_view(entries: &[ActivityLogEntry]) -> Markup {
    let nav_bar = NavBar::new(endpoints::ACTIVITY_VIEW).into_html();

    let content = html! {
        (nav_bar)

        main class="page"
        {
            h1 { "Activity" }

            @if entries.is_empty()
            {
                p class="empty-message" { "Nothing has happened yet." }
            }
            @else
            {
                table class="listing"
                {
                    thead
                    {
                        tr
                        {
                            th { "Time" }
                            th { "Action" }
                            th { "Details" }
                        }
                    }

                    tbody
                    {
                        @for entry in entries
                        {
                            tr
                            {
                                td class="timestamp"
                                {
                                    (entry
                                        .timestamp
                                        .format(&TIMESTAMP_FORMAT)
                                        .unwrap_or_else(|_| entry.timestamp.to_string()))
                                }
                                td class="action-tag" { (entry.action_type) }
                                td { (entry.details) }
                            }
                        }
                    }
                }
            }
        }
    };

    base("Activity", &content)
}
