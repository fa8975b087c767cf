//! Expense management for the application.
//!
//! This module contains everything related to expenses:
//! - The `Expense` model and database functions for storing, querying, and
//!   managing expenses
//! - View handlers for the expense-related web pages

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod edit_page;
mod list_page;

pub use core::{Expense, ExpenseId, create_expense_table};
pub use create_endpoint::create_expense_endpoint;
pub use delete_endpoint::delete_expense_endpoint;
pub use edit_endpoint::edit_expense_endpoint;
pub use edit_page::get_edit_expense_page;
pub use list_page::get_expenses_page;
