//! Defines the route handler for the expense list page, which also hosts the
//! new expense form.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    html::{base, format_currency},
    navigation::NavBar,
};

use super::core::{Expense, list_expenses};

/// The state needed for the expense list page.
#[derive(Debug, Clone)]
pub struct ExpensesPageState {
    /// The database connection for reading expenses.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ExpensesPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Route handler for the expense list page.
pub async fn get_expenses_page(
    State(state): State<ExpensesPageState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let expenses = list_expenses(&connection)?;

    Ok(expenses_view(&expenses).into_response())
}

/// The form for submitting a new expense.
pub(crate) fn new_expense_form_view() -> Markup {
    html! {
        form action=(endpoints::ROOT) method="post" class="expense-form"
        {
            div
            {
                label for="description" class="form-label" { "Description" }

                input
                    id="description"
                    type="text"
                    name="description"
                    placeholder="What was the money spent on?"
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
                    placeholder="0.00"
                    required
                    class="form-input";
            }

            button type="submit" class="button-primary" { "Add Expense" }
        }
    }
}

fn expenses_view(expenses: &[Expense]) -> Markup {
    let nav_bar = NavBar::new(endpoints::ROOT).into_html();
    let form = new_expense_form_view();

    let content = html! {
        (nav_bar)

        main class="page"
        {
            h1 { "Expenses" }

            (form)

            @if expenses.is_empty()
            {
                p class="empty-message" { "No expenses yet. Add the first one above." }
            }
            @else
            {
                table class="listing"
                {
                    thead
                    {
                        tr
                        {
                            th { "Description" }
                            th { "Amount" }
                            th { "Date" }
                            th { "" }
                        }
                    }

                    tbody
                    {
                        @for expense in expenses
                        {
                            tr
                            {
                                td { (expense.description) }
                                td class="amount" { (format_currency(expense.amount)) }
                                td class="timestamp" { (expense.created_at.date()) }
                                td class="row-actions"
                                {
                                    a
                                        href=(endpoints::format_endpoint(
                                            endpoints::EDIT_EXPENSE_VIEW,
                                            expense.id,
                                        ))
                                    {
                                        "Edit"
                                    }

                                    form
                                        action=(endpoints::format_endpoint(
                                            endpoints::DELETE_EXPENSE,
                                            expense.id,
                                        ))
                                        method="post"
                                        class="inline-form"
                                    {
                                        button type="submit" class="button-delete" { "Delete" }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    };

    base("Expenses", &content)
}

#[cfg(test)]
mod expenses_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::StatusCode, response::Response};
    use rusqlite::Connection;
    use scraper::{ElementRef, Html};

    use crate::expense::core::{create_expense, create_expense_table};

    use super::{ExpensesPageState, get_expenses_page};

    fn get_expenses_page_state() -> ExpensesPageState {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        create_expense_table(&connection).expect("Could not create expense table");

        ExpensesPageState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    #[tokio::test]
    async fn renders_new_expense_form() {
        let state = get_expenses_page_state();

        let response = get_expenses_page(State(state)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html(response).await;
        assert_valid_html(&html);

        let form = must_get_form(&html);
        assert_eq!(form.value().attr("action"), Some("/"));
        assert_eq!(form.value().attr("method"), Some("post"));
        assert_form_input(&form, "description", "text");
        assert_form_input(&form, "amount", "number");
    }

    #[tokio::test]
    async fn renders_expenses_newest_first() {
        let state = get_expenses_page_state();
        {
            let connection = state.db_connection.lock().unwrap();
            create_expense("Coffee", 3.5, &connection).unwrap();
            create_expense("Book", 12.0, &connection).unwrap();
        }

        let response = get_expenses_page(State(state)).await.unwrap();

        let html = parse_html(response).await;
        let row_selector = scraper::Selector::parse("tbody tr").unwrap();
        let rows: Vec<String> = html
            .select(&row_selector)
            .map(|row| row.text().collect::<Vec<_>>().join(" "))
            .collect();

        assert_eq!(rows.len(), 2);
        assert!(rows[0].contains("Book"));
        assert!(rows[0].contains("$12.00"));
        assert!(rows[1].contains("Coffee"));
        assert!(rows[1].contains("$3.50"));
    }

    #[tokio::test]
    async fn rows_link_to_edit_and_delete() {
        let state = get_expenses_page_state();
        let expense = {
            let connection = state.db_connection.lock().unwrap();
            create_expense("Coffee", 3.5, &connection).unwrap()
        };

        let response = get_expenses_page(State(state)).await.unwrap();

        let html = parse_html(response).await;
        let edit_selector = scraper::Selector::parse("tbody a").unwrap();
        let edit_link = html.select(&edit_selector).next().expect("No edit link found");
        assert_eq!(
            edit_link.value().attr("href"),
            Some(format!("/edit/{}", expense.id).as_str())
        );

        let delete_selector = scraper::Selector::parse("tbody form").unwrap();
        let delete_form = html
            .select(&delete_selector)
            .next()
            .expect("No delete form found");
        assert_eq!(
            delete_form.value().attr("action"),
            Some(format!("/delete/{}", expense.id).as_str())
        );
        assert_eq!(delete_form.value().attr("method"), Some("post"));
    }

    async fn parse_html(response: Response) -> Html {
        let body = response.into_body();
        let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        let text = String::from_utf8_lossy(&body).to_string();

        Html::parse_document(&text)
    }

    #[track_caller]
    fn assert_valid_html(html: &Html) {
        assert!(
            html.errors.is_empty(),
            "Got HTML parsing errors: {:?}",
            html.errors
        );
    }

    #[track_caller]
    fn must_get_form(html: &Html) -> ElementRef<'_> {
        html.select(&scraper::Selector::parse("form.expense-form").unwrap())
            .next()
            .expect("No expense form found")
    }

    #[track_caller]
    fn assert_form_input(form: &ElementRef, name: &str, type_: &str) {
        for input in form.select(&scraper::Selector::parse("input").unwrap()) {
            let input_name = input.value().attr("name").unwrap_or_default();

            if input_name == name {
                let input_type = input.value().attr("type").unwrap_or_default();

                assert_eq!(
                    input_type, type_,
                    "want input with type \"{type_}\", got {input_type:?}"
                );

                assert!(
                    input.value().attr("required").is_some(),
                    "want input with name {name} to have the required attribute but got none"
                );

                return;
            }
        }

        panic!("No input found with name \"{name}\" and type \"{type_}\"");
    }
}
