//! Implements the REST endpoints for creating, listing, updating, deleting
//! and summarizing expenses.
//!
//! Every handler takes [Claims] and is therefore only reachable with a valid
//! bearer token. All store access is scoped to the user the token resolves
//! to.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use time::{Date, OffsetDateTime, macros::date};

use crate::{
    AppState, Error,
    auth::Claims,
    filter::{DateRangeFilter, FilterSpec, SortKey, SortOrder},
    models::{Category, DatabaseID, ExpenseUpdate, NewExpense},
    pagination::{PageQuery, Pagination},
    stats::summarize,
    stores::{ExpenseQuery, ExpenseStore},
};

/// How many most recent months the statistics snapshot keeps.
const RECENT_MONTH_LIMIT: usize = 12;

/// The data submitted when creating an expense.
#[derive(Debug, Deserialize)]
pub struct CreateExpenseForm {
    pub title: String,
    pub amount: f64,
    pub date: Date,
    pub category: Category,
    pub description: Option<String>,
}

/// The query parameters accepted when listing expenses.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseListParams {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub category: Option<Category>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    /// Case-insensitive substring match against titles.
    pub search: Option<String>,
    pub sort_by: Option<SortKey>,
    pub sort_order: Option<SortOrder>,
}

/// The query parameters accepted by the statistics endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryParams {
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
}

/// Build the date window for independently optional bounds.
///
/// A missing bound is substituted with a date beyond any realistic expense so
/// the remaining bound still applies.
fn date_range_from_bounds(start: Option<Date>, end: Option<Date>) -> DateRangeFilter {
    match (start, end) {
        (None, None) => DateRangeFilter::AllTime,
        (start, end) => DateRangeFilter::Custom {
            start: Some(start.unwrap_or(date!(0001 - 01 - 01))),
            end: Some(end.unwrap_or(date!(9999 - 12 - 31))),
        },
    }
}

/// Handler for creating an expense.
///
/// # Errors
///
/// This function will return an [Error::Validation] listing every invalid
/// field when the title, amount or description fail validation.
pub async fn create_expense(
    State(state): State<AppState>,
    claims: Claims,
    Json(form): Json<CreateExpenseForm>,
) -> Result<Response, Error> {
    let new_expense = NewExpense::new(
        &form.title,
        form.amount,
        form.date,
        form.category,
        form.description,
    )?;

    let mut expense_store = state.expense_store;
    let expense = expense_store.create(claims.user_id(), new_expense)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Expense created successfully",
            "expense": expense,
        })),
    )
        .into_response())
}

/// Handler for listing a page of the caller's expenses.
///
/// # Errors
///
/// This function will return an [Error::Validation] when `page` or `limit`
/// are out of range.
pub async fn get_expenses(
    State(state): State<AppState>,
    claims: Claims,
    Query(params): Query<ExpenseListParams>,
) -> Result<Response, Error> {
    let page = PageQuery::new(params.page, params.limit)?;

    let query = ExpenseQuery {
        owner: claims.user_id(),
        filter: FilterSpec {
            search_term: params.search,
            category: params.category,
            date_range: date_range_from_bounds(params.start_date, params.end_date),
        },
        sort_key: params.sort_by,
        sort_order: params.sort_order.unwrap_or_default(),
        page,
        today: OffsetDateTime::now_utc().date(),
    };

    let result = state.expense_store.query(&query)?;
    let pagination = Pagination::new(page, result.total);

    Ok(Json(json!({
        "success": true,
        "expenses": result.expenses,
        "pagination": pagination,
    }))
    .into_response())
}

/// Handler for fetching a single expense.
///
/// # Errors
///
/// This function will return an [Error::NotFound] when the expense does not
/// exist or belongs to another user.
pub async fn get_expense(
    State(state): State<AppState>,
    claims: Claims,
    Path(expense_id): Path<DatabaseID>,
) -> Result<Response, Error> {
    let expense = state.expense_store.get(expense_id, claims.user_id())?;

    Ok(Json(json!({
        "success": true,
        "expense": expense,
    }))
    .into_response())
}

/// Handler for partially updating an expense.
///
/// Fields absent from the body retain their prior values.
///
/// # Errors
///
/// This function will return an [Error::Validation] when a present field is
/// invalid, or an [Error::NotFound] when the expense does not exist for the
/// caller. A failed update leaves the record untouched.
pub async fn update_expense(
    State(state): State<AppState>,
    claims: Claims,
    Path(expense_id): Path<DatabaseID>,
    Json(update): Json<ExpenseUpdate>,
) -> Result<Response, Error> {
    let update = update.validated()?;

    let mut expense_store = state.expense_store;
    let expense = expense_store.update(expense_id, claims.user_id(), update)?;

    Ok(Json(json!({
        "success": true,
        "message": "Expense updated successfully",
        "expense": expense,
    }))
    .into_response())
}

/// Handler for deleting an expense. Irreversible.
///
/// # Errors
///
/// This function will return an [Error::NotFound] when the expense does not
/// exist or belongs to another user.
pub async fn delete_expense(
    State(state): State<AppState>,
    claims: Claims,
    Path(expense_id): Path<DatabaseID>,
) -> Result<Response, Error> {
    let mut expense_store = state.expense_store;
    expense_store.delete(expense_id, claims.user_id())?;

    Ok(Json(json!({
        "success": true,
        "message": "Expense deleted successfully",
    }))
    .into_response())
}

/// Handler for the statistics snapshot over the caller's expenses.
///
/// The snapshot covers the optional date window and keeps the 12 most recent
/// months of monthly data.
pub async fn get_expense_summary(
    State(state): State<AppState>,
    claims: Claims,
    Query(params): Query<SummaryParams>,
) -> Result<Response, Error> {
    let date_range = date_range_from_bounds(params.start_date, params.end_date);
    let expenses = state.expense_store.get_all(claims.user_id(), &date_range)?;

    let mut summary = summarize(&expenses);
    summary.retain_recent_months(RECENT_MONTH_LIMIT);

    Ok(Json(json!({
        "success": true,
        "stats": summary,
    }))
    .into_response())
}
