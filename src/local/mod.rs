//! An offline, file-backed mirror of the expense list.
//!
//! The cache holds the whole state as one JSON document on disk and keeps an
//! in-memory copy. Every mutation validates first, writes the new document,
//! and only then replaces the in-memory state, so a failed operation leaves
//! both the file and memory as they were.
//!
//! Records here carry no owner (`user_id` is `None`); filtering and
//! aggregation go through the same [crate::filter] and [crate::stats]
//! pipelines as the server side.

use std::{
    fs,
    io::Read,
    path::PathBuf,
};

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    filter::{DateRangeFilter, FilterSpec, SortKey, SortOrder, filter_and_sort},
    models::{Category, DatabaseID, Expense, ExpenseUpdate, NewExpense},
    stats::{ExpenseSummary, summarize},
};

/// Display settings the client keeps between sessions.
///
/// Never sent to the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    /// The category filter in effect, if any.
    pub selected_category: Option<Category>,
    /// The field the expense list is ordered by.
    pub sort_key: Option<SortKey>,
    /// The direction the expense list is ordered in.
    pub sort_order: SortOrder,
    /// The date window in effect, including custom bounds.
    pub date_range: DateRangeFilter,
}

/// The whole persisted state of the cache.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalSnapshot {
    pub expenses: Vec<Expense>,
    pub preferences: Preferences,
}

/// The shape of one record in an imported JSON array.
///
/// Matches the wire shape of [Expense] minus the fields the cache assigns
/// itself.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportedExpense {
    #[serde(default)]
    id: Option<DatabaseID>,
    title: String,
    amount: f64,
    date: Date,
    category: Category,
    #[serde(default)]
    description: Option<String>,
}

/// A file-backed store of expenses and display preferences.
#[derive(Debug)]
pub struct LocalCache {
    path: PathBuf,
    snapshot: LocalSnapshot,
}

impl LocalCache {
    /// Load the cache from `path`.
    ///
    /// A missing file yields an empty cache; the file is created on the first
    /// mutation.
    ///
    /// # Errors
    /// Returns [Error::CacheIo] when the file exists but cannot be read, or
    /// [Error::MalformedJson] when its contents do not parse.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, Error> {
        let path = path.into();

        let snapshot = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => LocalSnapshot::default(),
            Err(error) => return Err(error.into()),
        };

        Ok(Self { path, snapshot })
    }

    /// The expenses in the cache, in insertion order.
    pub fn expenses(&self) -> &[Expense] {
        &self.snapshot.expenses
    }

    /// The persisted display preferences.
    pub fn preferences(&self) -> &Preferences {
        &self.snapshot.preferences
    }

    /// Write `snapshot` to disk, then make it the in-memory state.
    ///
    /// Not reached when validation fails, so the invariant that a failed
    /// operation mutates nothing holds file-side and memory-side.
    fn commit(&mut self, snapshot: LocalSnapshot) -> Result<(), Error> {
        let contents = serde_json::to_string_pretty(&snapshot)?;
        fs::write(&self.path, contents)?;

        self.snapshot = snapshot;

        Ok(())
    }

    fn next_id(&self) -> DatabaseID {
        self.snapshot
            .expenses
            .iter()
            .map(|expense| expense.id)
            .max()
            .unwrap_or(0)
            + 1
    }

    /// Add a validated expense to the cache.
    ///
    /// The cache assigns the id and both timestamps; `user_id` is `None`.
    ///
    /// # Errors
    /// Returns [Error::CacheIo] or [Error::MalformedJson] when the new state
    /// cannot be written.
    pub fn add(&mut self, new_expense: NewExpense) -> Result<Expense, Error> {
        let now = OffsetDateTime::now_utc();
        let expense = Expense {
            id: self.next_id(),
            title: new_expense.title,
            amount: new_expense.amount,
            date: new_expense.date,
            category: new_expense.category,
            description: new_expense.description,
            user_id: None,
            created_at: now,
            updated_at: now,
        };

        let mut snapshot = self.snapshot.clone();
        snapshot.expenses.push(expense.clone());
        self.commit(snapshot)?;

        Ok(expense)
    }

    /// Apply a partial update to the expense with `id`.
    ///
    /// # Errors
    /// Returns [Error::Validation] when a present field is invalid, or
    /// [Error::NotFound] when no expense has that id. Either way nothing is
    /// changed.
    pub fn update(&mut self, id: DatabaseID, update: ExpenseUpdate) -> Result<Expense, Error> {
        let update = update.validated()?;

        let mut snapshot = self.snapshot.clone();
        let expense = snapshot
            .expenses
            .iter_mut()
            .find(|expense| expense.id == id)
            .ok_or(Error::NotFound)?;

        *expense = update.apply_to(expense.clone());
        expense.updated_at = OffsetDateTime::now_utc();
        let updated = expense.clone();

        self.commit(snapshot)?;

        Ok(updated)
    }

    /// Remove the expense with `id`. Irreversible.
    ///
    /// # Errors
    /// Returns [Error::NotFound] when no expense has that id.
    pub fn remove(&mut self, id: DatabaseID) -> Result<(), Error> {
        let mut snapshot = self.snapshot.clone();
        let count_before = snapshot.expenses.len();
        snapshot.expenses.retain(|expense| expense.id != id);

        if snapshot.expenses.len() == count_before {
            return Err(Error::NotFound);
        }

        self.commit(snapshot)
    }

    /// Replace the persisted display preferences.
    pub fn set_preferences(&mut self, preferences: Preferences) -> Result<(), Error> {
        let mut snapshot = self.snapshot.clone();
        snapshot.preferences = preferences;

        self.commit(snapshot)
    }

    /// The expenses that pass the preference filters, ordered by the
    /// preference sort, evaluated on `today`.
    pub fn filtered(&self, today: Date) -> Vec<Expense> {
        let preferences = &self.snapshot.preferences;
        let spec = FilterSpec {
            search_term: None,
            category: preferences.selected_category,
            date_range: preferences.date_range.clone(),
        };

        filter_and_sort(
            self.snapshot.expenses.clone(),
            &spec,
            preferences.sort_key,
            preferences.sort_order,
            today,
        )
    }

    /// The statistics snapshot over every cached expense.
    pub fn summary(&self) -> ExpenseSummary {
        summarize(&self.snapshot.expenses)
    }

    /// Import a JSON array of expense-shaped records, appending them to the
    /// cache. Returns how many records were imported.
    ///
    /// Each record is validated against the same constraints as interactive
    /// creation. Records without an id get one assigned.
    ///
    /// # Errors
    /// Returns [Error::MalformedJson] when the input does not parse, or
    /// [Error::Validation] when any record is invalid. A failed import
    /// mutates nothing.
    pub fn import(&mut self, reader: impl Read) -> Result<usize, Error> {
        let imported: Vec<ImportedExpense> = serde_json::from_reader(reader)?;

        let mut next_id = self
            .snapshot
            .expenses
            .iter()
            .map(|expense| expense.id)
            .chain(imported.iter().filter_map(|record| record.id))
            .max()
            .unwrap_or(0)
            + 1;

        let now = OffsetDateTime::now_utc();
        let count = imported.len();
        let mut snapshot = self.snapshot.clone();

        for record in imported {
            let validated = NewExpense::new(
                &record.title,
                record.amount,
                record.date,
                record.category,
                record.description,
            )?;

            let id = match record.id {
                Some(id) => id,
                None => {
                    let id = next_id;
                    next_id += 1;
                    id
                }
            };

            snapshot.expenses.push(Expense {
                id,
                title: validated.title,
                amount: validated.amount,
                date: validated.date,
                category: validated.category,
                description: validated.description,
                user_id: None,
                created_at: now,
                updated_at: now,
            });
        }

        self.commit(snapshot)?;

        Ok(count)
    }
}
