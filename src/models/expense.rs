//! This file defines the expense record, the sole entity the application
//! persists, along with the validated input types used to create and update
//! expenses.

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    error::FieldError,
    models::{Category, DatabaseID, UserID},
};

/// The maximum length of an expense title in characters.
pub const TITLE_MAX_CHARS: usize = 100;

/// The maximum length of an expense description in characters.
pub const DESCRIPTION_MAX_CHARS: usize = 500;

/// A single expense record.
///
/// Expenses are created via [NewExpense], mutated in place via
/// [ExpenseUpdate] and deleted irreversibly. `created_at` and `updated_at`
/// are set by the store, never by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    /// The ID of the expense, assigned by the store at creation.
    pub id: DatabaseID,
    /// A short label for the expense, non-empty and at most 100 characters.
    pub title: String,
    /// How much money was spent. Never negative.
    pub amount: f64,
    /// The calendar day the expense occurred on.
    pub date: Date,
    /// The category the expense belongs to.
    pub category: Category,
    /// Optional free text, at most 500 characters.
    pub description: Option<String>,
    /// The user that owns the expense. `None` in the anonymous/local variant.
    pub user_id: Option<UserID>,
    /// When the record was created.
    pub created_at: OffsetDateTime,
    /// When the record was last modified.
    pub updated_at: OffsetDateTime,
}

/// The validated input for creating an expense.
///
/// Construct via [NewExpense::new], which rejects invalid input before it can
/// reach a store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    pub title: String,
    pub amount: f64,
    pub date: Date,
    pub category: Category,
    pub description: Option<String>,
}

impl NewExpense {
    /// Validate the input for a new expense.
    ///
    /// The title is trimmed before validation.
    ///
    /// # Errors
    /// Returns [Error::Validation] listing every failed field when the title
    /// is empty or too long, the amount is negative or not finite, or the
    /// description is too long.
    pub fn new(
        title: &str,
        amount: f64,
        date: Date,
        category: Category,
        description: Option<String>,
    ) -> Result<Self, Error> {
        let title = title.trim().to_owned();
        let mut field_errors = Vec::new();

        if let Some(error) = validate_title(&title) {
            field_errors.push(error);
        }

        if let Some(error) = validate_amount(amount) {
            field_errors.push(error);
        }

        if let Some(error) = description.as_deref().and_then(validate_description) {
            field_errors.push(error);
        }

        if field_errors.is_empty() {
            Ok(Self {
                title,
                amount,
                date,
                category,
                description,
            })
        } else {
            Err(Error::Validation(field_errors))
        }
    }
}

/// A partial update for an expense.
///
/// Fields left as `None` retain their prior values. Only the fields that are
/// present are re-validated.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExpenseUpdate {
    pub title: Option<String>,
    pub amount: Option<f64>,
    pub date: Option<Date>,
    pub category: Option<Category>,
    pub description: Option<String>,
}

impl ExpenseUpdate {
    /// Whether the update leaves every field untouched.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Validate the fields that are present, trimming the title if given.
    ///
    /// # Errors
    /// Returns [Error::Validation] listing every failed field.
    pub fn validated(mut self) -> Result<Self, Error> {
        let mut field_errors = Vec::new();

        if let Some(title) = self.title {
            let title = title.trim().to_owned();

            if let Some(error) = validate_title(&title) {
                field_errors.push(error);
            }

            self.title = Some(title);
        }

        if let Some(error) = self.amount.and_then(validate_amount) {
            field_errors.push(error);
        }

        if let Some(error) = self.description.as_deref().and_then(validate_description) {
            field_errors.push(error);
        }

        if field_errors.is_empty() {
            Ok(self)
        } else {
            Err(Error::Validation(field_errors))
        }
    }

    /// Produce the merged state of `expense` after applying this update.
    ///
    /// The id, owner and `created_at` timestamp are never touched.
    pub fn apply_to(self, mut expense: Expense) -> Expense {
        if let Some(title) = self.title {
            expense.title = title;
        }

        if let Some(amount) = self.amount {
            expense.amount = amount;
        }

        if let Some(date) = self.date {
            expense.date = date;
        }

        if let Some(category) = self.category {
            expense.category = category;
        }

        if let Some(description) = self.description {
            expense.description = Some(description);
        }

        expense
    }
}

fn validate_title(title: &str) -> Option<FieldError> {
    if title.is_empty() {
        Some(FieldError::new(
            "title",
            "Title must be between 1 and 100 characters",
        ))
    } else if title.chars().count() > TITLE_MAX_CHARS {
        Some(FieldError::new(
            "title",
            "Title must be between 1 and 100 characters",
        ))
    } else {
        None
    }
}

fn validate_amount(amount: f64) -> Option<FieldError> {
    if amount.is_finite() && amount >= 0.0 {
        None
    } else {
        Some(FieldError::new(
            "amount",
            "Amount must be a positive number",
        ))
    }
}

fn validate_description(description: &str) -> Option<FieldError> {
    if description.chars().count() > DESCRIPTION_MAX_CHARS {
        Some(FieldError::new(
            "description",
            "Description cannot exceed 500 characters",
        ))
    } else {
        None
    }
}


#[cfg(test)]
mod expense_update_tests {
    use time::{Date, Month, OffsetDateTime};

    use crate::{
        Error,
        models::{Category, Expense, ExpenseUpdate},
    };

    fn test_expense() -> Expense {
        Expense {
            id: 1,
            title: "Groceries".to_owned(),
            amount: 100.0,
            date: Date::from_calendar_date(2024, Month::January, 5).unwrap(),
            category: Category::Food,
            description: Some("weekly shop".to_owned()),
            user_id: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn apply_to_retains_omitted_fields() {
        let update = ExpenseUpdate {
            amount: Some(150.5),
            ..Default::default()
        };

        let got = update.apply_to(test_expense());

        assert_eq!(got.amount, 150.5);
        assert_eq!(got.title, "Groceries");
        assert_eq!(got.category, Category::Food);
        assert_eq!(got.description, Some("weekly shop".to_owned()));
    }

    #[test]
    fn validated_rejects_present_invalid_fields_only() {
        let update = ExpenseUpdate {
            amount: Some(-1.0),
            ..Default::default()
        };

        let result = update.validated();

        let Err(Error::Validation(field_errors)) = result else {
            panic!("want validation error, got {result:?}");
        };
        assert_eq!(field_errors.len(), 1);
        assert_eq!(field_errors[0].field, "amount");
    }

    #[test]
    fn validated_accepts_absent_fields() {
        let update = ExpenseUpdate::default();

        assert!(update.validated().is_ok());
    }
}
