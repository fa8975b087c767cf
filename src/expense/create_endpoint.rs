//! Defines the endpoint for creating a new expense.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    response::{IntoResponse, Redirect, Response},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    activity::{ActivityKind, record_activity},
    endpoints,
    html::format_currency,
};

use super::core::create_expense;

/// The state needed to create an expense.
#[derive(Debug, Clone)]
pub struct CreateExpenseState {
    /// The database connection for managing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for creating or editing an expense.
///
/// A non-numeric amount is rejected by the form extractor with
/// 422 Unprocessable Entity before this handler runs.
#[derive(Debug, Deserialize)]
pub struct ExpenseForm {
    /// Text detailing the expense.
    pub description: String,
    /// The value of the expense in dollars.
    pub amount: f64,
}

/// A route handler for creating a new expense, redirects to the expense list
/// on success.
pub async fn create_expense_endpoint(
    State(state): State<CreateExpenseState>,
    Form(form): Form<ExpenseForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    let expense = match create_expense(&form.description, form.amount, &connection) {
        Ok(expense) => expense,
        Err(error) => {
            tracing::error!("could not create expense: {error}");
            return error.into_response();
        }
    };

    if let Err(error) = record_activity(
        &connection,
        ActivityKind::NewExpense,
        &format!(
            "Added '{}' for {}",
            expense.description,
            format_currency(expense.amount)
        ),
    ) {
        tracing::error!("could not record activity for new expense: {error}");
        return error.into_response();
    }

    tracing::info!("User added a new expense: {}", expense.description);

    Redirect::to(endpoints::ROOT).into_response()
}

#[cfg(test)]
mod create_expense_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Form,
        extract::State,
        http::StatusCode,
        response::{IntoResponse, Response},
    };
    use rusqlite::Connection;

    use crate::{
        activity::list_activity,
        db::initialize,
        expense::core::{get_expense, list_expenses},
    };

    use super::{CreateExpenseState, ExpenseForm, create_expense_endpoint};

    fn get_create_expense_state() -> CreateExpenseState {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        initialize(&connection).expect("Could not initialize database");

        CreateExpenseState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    #[tokio::test]
    async fn creates_expense_and_redirects() {
        let state = get_create_expense_state();
        let form = ExpenseForm {
            description: "Coffee".to_string(),
            amount: 3.5,
        };

        let response = create_expense_endpoint(State(state.clone()), Form(form))
            .await
            .into_response();

        assert_redirects_to_root(&response);

        // The first expense will have ID 1.
        let connection = state.db_connection.lock().unwrap();
        let expense = get_expense(1, &connection)
            .unwrap()
            .expect("Expense was not created");
        assert_eq!(expense.description, "Coffee");
        assert_eq!(expense.amount, 3.5);
    }

    #[tokio::test]
    async fn records_new_expense_activity() {
        let state = get_create_expense_state();
        let form = ExpenseForm {
            description: "Coffee".to_string(),
            amount: 3.5,
        };

        create_expense_endpoint(State(state.clone()), Form(form)).await;

        let connection = state.db_connection.lock().unwrap();
        let entries = list_activity(&connection).unwrap();
        // Newest first: the NEW_EXPENSE entry sits above the APP_START entry
        // written by initialize.
        assert_eq!(entries[0].action_type, "NEW_EXPENSE");
        assert!(entries[0].details.contains("Coffee"));
        assert!(entries[0].details.contains("3.5"));
        let new_expense_entries = entries
            .iter()
            .filter(|entry| entry.action_type == "NEW_EXPENSE")
            .count();
        assert_eq!(new_expense_entries, 1);
    }

    #[tokio::test]
    async fn created_expense_appears_at_head_of_list() {
        let state = get_create_expense_state();

        for (description, amount) in [("Coffee", 3.5), ("Book", 12.0)] {
            let form = ExpenseForm {
                description: description.to_string(),
                amount,
            };
            create_expense_endpoint(State(state.clone()), Form(form)).await;
        }

        let connection = state.db_connection.lock().unwrap();
        let expenses = list_expenses(&connection).unwrap();
        assert_eq!(expenses.len(), 2);
        assert_eq!(expenses[0].description, "Book");
        assert_eq!(expenses[0].amount, 12.0);
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
