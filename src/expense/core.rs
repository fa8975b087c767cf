//! Defines the core data model and database queries for expenses.

use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;

use crate::Error;

/// The ID of an expense row. Assigned by the database and immutable.
pub type ExpenseId = i64;

/// A single monetary record: what was spent, on what, and when it was
/// entered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// The ID of the expense.
    pub id: ExpenseId,
    /// A text description of what the money was spent on.
    pub description: String,
    /// The amount of money spent, in dollars.
    pub amount: f64,
    /// When the expense was entered, assigned by the database at insert and
    /// never changed by edits.
    pub created_at: PrimitiveDateTime,
}

/// Create a new expense in the database.
///
/// The creation timestamp is defaulted by the database.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn create_expense(
    description: &str,
    amount: f64,
    connection: &Connection,
) -> Result<Expense, Error> {
    let expense = connection
        .prepare(
            "INSERT INTO expense (description, amount)
             VALUES (?1, ?2)
             RETURNING id, description, amount, created_at",
        )?
        .query_row((description, amount), map_expense_row)?;

    Ok(expense)
}

/// Retrieve an expense from the database by its `id`.
///
/// An id that matches no row is a valid outcome and returns `Ok(None)`.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn get_expense(id: ExpenseId, connection: &Connection) -> Result<Option<Expense>, Error> {
    connection
        .prepare("SELECT id, description, amount, created_at FROM expense WHERE id = :id")?
        .query_row(&[(":id", &id)], map_expense_row)
        .optional()
        .map_err(|error| error.into())
}

/// Retrieve all expenses, newest first.
///
/// Sorted by creation timestamp descending; the id tie-break keeps the order
/// total for rows created within the same second.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn list_expenses(connection: &Connection) -> Result<Vec<Expense>, Error> {
    connection
        .prepare(
            "SELECT id, description, amount, created_at FROM expense
             ORDER BY created_at DESC, id DESC;",
        )?
        .query_map([], map_expense_row)?
        .map(|maybe_expense| maybe_expense.map_err(|error| error.into()))
        .collect()
}

/// Overwrite an expense's description and amount in place.
///
/// The creation timestamp is untouched.
///
/// # Errors
/// This function will return an [Error::UpdateMissingExpense] if `id` matches
/// no row, or an error if there is an SQL error.
pub fn update_expense(
    id: ExpenseId,
    new_description: &str,
    new_amount: f64,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE expense SET description = ?1, amount = ?2 WHERE id = ?3",
        (new_description, new_amount, id),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingExpense);
    }

    Ok(())
}

/// The number of rows removed by a delete.
pub type RowsAffected = usize;

/// Delete an expense from the database.
///
/// Deleting an id that matches no row affects zero rows and is not an error.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn delete_expense(id: ExpenseId, connection: &Connection) -> Result<RowsAffected, Error> {
    connection
        .execute("DELETE FROM expense WHERE id = :id", &[(":id", &id)])
        .map_err(|error| error.into())
}

/// Create the expense table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS expense (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                description TEXT NOT NULL,
                amount REAL NOT NULL,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
                )",
        (),
    )?;

    Ok(())
}

fn map_expense_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    Ok(Expense {
        id: row.get(0)?,
        description: row.get(1)?,
        amount: row.get(2)?,
        created_at: row.get(3)?,
    })
}
