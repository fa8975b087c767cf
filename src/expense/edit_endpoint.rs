//! Defines the endpoint for submitting an edit to an existing expense.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
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

use super::{
    core::{ExpenseId, get_expense, update_expense},
    create_endpoint::ExpenseForm,
    edit_page::expense_not_found_response,
};

/// The state needed to update an expense.
#[derive(Debug, Clone)]
pub struct EditExpenseState {
    /// The database connection for managing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for overwriting an expense's description and amount,
/// redirects to the expense list on success.
///
/// The previous values are fetched before the update so the activity log can
/// narrate the change. An id that matches no expense gets a 404 page and
/// writes no activity entry.
pub async fn edit_expense_endpoint(
    Path(expense_id): Path<ExpenseId>,
    State(state): State<EditExpenseState>,
    Form(form): Form<ExpenseForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    // Old values for the audit narration, fetched before the overwrite.
    let old_expense = match get_expense(expense_id, &connection) {
        Ok(Some(expense)) => expense,
        Ok(None) => return expense_not_found_response(),
        Err(error) => {
            tracing::error!("could not fetch expense {expense_id} for editing: {error}");
            return error.into_response();
        }
    };

    if let Err(error) = update_expense(expense_id, &form.description, form.amount, &connection) {
        tracing::error!("could not update expense {expense_id}: {error}");
        return error.into_response();
    }

    if let Err(error) = record_activity(
        &connection,
        ActivityKind::EditExpense,
        &format!(
            "Changed '{}' ({}) to '{}' ({})",
            old_expense.description,
            format_currency(old_expense.amount),
            form.description,
            format_currency(form.amount)
        ),
    ) {
        tracing::error!("could not record activity for edited expense: {error}");
        return error.into_response();
    }

    tracing::info!("User edited expense {expense_id}");

    Redirect::to(endpoints::ROOT).into_response()
}
