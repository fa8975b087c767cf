//! Defines the route handler for the edit expense page.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    html::{base, error_view, render},
    navigation::NavBar,
};

use super::core::{Expense, ExpenseId, get_expense};

/// The state needed for the edit expense page.
#[derive(Debug, Clone)]
pub struct EditExpensePageState {
    /// The database connection for reading expenses.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditExpensePageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Route handler for the edit expense page.
///
/// Requests for an id that matches no expense get a 404 page.
pub async fn get_edit_expense_page(
    Path(expense_id): Path<ExpenseId>,
    State(state): State<EditExpensePageState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    match get_expense(expense_id, &connection)? {
        Some(expense) => Ok(edit_expense_view(&expense).into_response()),
        None => Ok(expense_not_found_response()),
    }
}

/// The 404 page for edits that name an expense that is not in the database.
pub(crate) fn expense_not_found_response() -> Response {
    render(
        StatusCode::NOT_FOUND,
        error_view(
            "Not Found",
            "404",
            "Expense not found",
            "The expense may have been deleted. Head back to the expense list.",
        ),
    )
}

fn edit_expense_view(expense: &Expense) -> Markup {
    let nav_bar = NavBar::new(endpoints::ROOT).into_html();
    let submit_endpoint = endpoints::format_endpoint(endpoints::EDIT_EXPENSE_VIEW, expense.id);

    let content = html! {
        (nav_bar)

        main class="page"
        {
            h1 { "Edit Expense" }

            form action=(submit_endpoint) method="post" class="expense-form"
            {
                div
                {
                    label for="description" class="form-label" { "Description" }

                    input
                        id="description"
                        type="text"
                        name="description"
                        value=(expense.description)
                        required
                        autofocus
                        class="form-input";
                }

                div
                {
                    label for="amount" class="form-label" { "Amount" }

                    input
                        id="amount"
                        type="number"
                        name="amount"
                        step="0.01"
                        value=(expense.amount)
                        required
                        class="form-input";
                }

                button type="submit" class="button-primary" { "Save Changes" }
            }
        }
    };

    base("Edit Expense", &content)
}
