//! Defines the endpoint for deleting an expense.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    response::{IntoResponse, Redirect, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    activity::{ActivityKind, record_activity},
    endpoints,
    html::format_currency,
};

use super::core::{ExpenseId, delete_expense, get_expense};

/// The state needed to delete an expense.
#[derive(Debug, Clone)]
pub struct DeleteExpenseState {
    /// The database connection for managing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting an expense, redirects to the expense list.
///
/// Deleting an id that matches no expense is an idempotent no-op: nothing is
/// deleted, no activity entry is written, and the client is still redirected.
/// The expense is fetched before the delete so the activity log can narrate
/// what was removed.
pub async fn delete_expense_endpoint(
    Path(expense_id): Path<ExpenseId>,
    State(state): State<DeleteExpenseState>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    let expense = match get_expense(expense_id, &connection) {
        Ok(Some(expense)) => expense,
        Ok(None) => return Redirect::to(endpoints::ROOT).into_response(),
        Err(error) => {
            tracing::error!("could not fetch expense {expense_id} for deletion: {error}");
            return error.into_response();
        }
    };

    if let Err(error) = delete_expense(expense_id, &connection) {
        tracing::error!("could not delete expense {expense_id}: {error}");
        return error.into_response();
    }

    if let Err(error) = record_activity(
        &connection,
        ActivityKind::DeleteExpense,
        &format!(
            "Deleted '{}' ({})",
            expense.description,
            format_currency(expense.amount)
        ),
    ) {
        tracing::error!("could not record activity for deleted expense: {error}");
        return error.into_response();
    }

    tracing::info!("User deleted expense {expense_id}");

    Redirect::to(endpoints::ROOT).into_response()
}

#[cfg(test)]
mod delete_expense_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, State},
        http::StatusCode,
        response::{IntoResponse, Response},
    };
    use rusqlite::Connection;

    use crate::{
        activity::list_activity,
        db::initialize,
        expense::core::{create_expense, get_expense, list_expenses},
    };

    use super::{DeleteExpenseState, delete_expense_endpoint};

    fn get_delete_expense_state() -> DeleteExpenseState {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        initialize(&connection).expect("Could not initialize database");

        DeleteExpenseState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    #[tokio::test]
    async fn deletes_expense_and_records_activity() {
        let state = get_delete_expense_state();
        let expense = {
            let connection = state.db_connection.lock().unwrap();
            create_expense("Coffee", 3.5, &connection).unwrap()
        };

        let response = delete_expense_endpoint(Path(expense.id), State(state.clone()))
            .await
            .into_response();

        assert_redirects_to_root(&response);

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(get_expense(expense.id, &connection).unwrap(), None);

        let entries = list_activity(&connection).unwrap();
        assert_eq!(entries[0].action_type, "DELETE_EXPENSE");
        assert!(entries[0].details.contains("Coffee"));
        assert!(entries[0].details.contains("3.5"));
    }

    #[tokio::test]
    async fn deleting_missing_expense_is_a_silent_no_op() {
        let state = get_delete_expense_state();
        {
            let connection = state.db_connection.lock().unwrap();
            create_expense("Coffee", 3.5, &connection).unwrap();
        }
        let activity_count_before = {
            let connection = state.db_connection.lock().unwrap();
            list_activity(&connection).unwrap().len()
        };

        let response = delete_expense_endpoint(Path(999_999), State(state.clone()))
            .await
            .into_response();

        // Still a redirect, but nothing was deleted and nothing was logged.
        assert_redirects_to_root(&response);

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(list_expenses(&connection).unwrap().len(), 1);

        let entries = list_activity(&connection).unwrap();
        assert_eq!(entries.len(), activity_count_before);
        let delete_entries = entries
            .iter()
            .filter(|entry| entry.action_type == "DELETE_EXPENSE")
            .count();
        assert_eq!(delete_entries, 0);
    }

    #[tokio::test]
    async fn deleted_expense_keeps_its_log_entries() {
        let state = get_delete_expense_state();
        let expense = {
            let connection = state.db_connection.lock().unwrap();
            create_expense("Coffee", 3.5, &connection).unwrap()
        };

        delete_expense_endpoint(Path(expense.id), State(state.clone())).await;

        // The narration references the expense by value, so it survives the
        // row it describes.
        let connection = state.db_connection.lock().unwrap();
        let entries = list_activity(&connection).unwrap();
        assert!(entries[0].details.contains("Coffee"));
    }

    #[track_caller]
    fn assert_redirects_to_root(response: &Response) {
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let location = response
            .headers()
            .get("location")
            .expect("expected response to have the header location");
        assert_eq!(
            location, "/",
            "got redirect to {location:?}, want redirect to /"
        );
    }
}
