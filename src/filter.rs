//! Narrows a set of expenses by search term, category and date range, then
//! orders the result by a chosen key and direction.
//!
//! The same pipeline backs both the local cache's filtered views and the
//! semantics the SQLite store reproduces in SQL, so the behaviour here is the
//! contract for both.

use serde::{Deserialize, Serialize};
use time::Date;

use crate::models::{Category, Expense};

/// The date window a filter matches expenses against.
///
/// The relative variants are evaluated against an explicit "today" passed in
/// by the caller rather than reading the clock, which keeps the pipeline a
/// pure function.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DateRangeFilter {
    /// Match every expense regardless of date.
    #[default]
    AllTime,
    /// Match expenses dated the same calendar day as the evaluation time.
    Today,
    /// Match expenses within the last 7 whole days, inclusive of both ends.
    Last7Days,
    /// Match expenses within the last 30 whole days, inclusive of both ends.
    Last30Days,
    /// Match expenses with `start <= date <= end`.
    ///
    /// If either bound is missing the filter degenerates to match-all.
    Custom {
        start: Option<Date>,
        end: Option<Date>,
    },
}

impl DateRangeFilter {
    /// The concrete inclusive `[start, end]` window this range covers when
    /// evaluated on `today`, or `None` for a range that matches everything.
    ///
    /// The SQLite store uses these bounds to reproduce the filter semantics
    /// in SQL, so this is the single definition of each window.
    pub fn bounds(&self, today: Date) -> Option<(Date, Date)> {
        match self {
            DateRangeFilter::AllTime => None,
            DateRangeFilter::Today => Some((today, today)),
            DateRangeFilter::Last7Days => Some((today - time::Duration::days(7), today)),
            DateRangeFilter::Last30Days => Some((today - time::Duration::days(30), today)),
            DateRangeFilter::Custom {
                start: Some(start),
                end: Some(end),
            } => Some((*start, *end)),
            // A custom range without both bounds matches everything.
            DateRangeFilter::Custom { .. } => None,
        }
    }

    /// Whether `date` falls inside this range when evaluated on `today`.
    pub fn matches(&self, date: Date, today: Date) -> bool {
        match self.bounds(today) {
            None => true,
            Some((start, end)) => start <= date && date <= end,
        }
    }
}

/// The combination of predicates applied to a record set before sorting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    /// Case-insensitive substring match against the title. Absent or empty
    /// matches all.
    pub search_term: Option<String>,
    /// Exact category match. `None` means no category filter.
    pub category: Option<Category>,
    /// The date window to keep.
    pub date_range: DateRangeFilter,
}

impl FilterSpec {
    /// Whether `expense` passes every predicate, evaluated on `today`.
    pub fn matches(&self, expense: &Expense, today: Date) -> bool {
        let search_matches = match self.search_term.as_deref() {
            None | Some("") => true,
            Some(term) => expense
                .title
                .to_lowercase()
                .contains(&term.to_lowercase()),
        };

        search_matches
            && self.category.is_none_or(|category| expense.category == category)
            && self.date_range.matches(expense.date, today)
    }
}

/// The field expenses are ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Chronological comparison.
    Date,
    /// Numeric comparison.
    Amount,
    /// Case-insensitive lexicographic comparison.
    Title,
}

/// The direction expenses are ordered in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    #[serde(rename = "asc")]
    Ascending,
    #[default]
    #[serde(rename = "desc")]
    Descending,
}

/// Sort `expenses` in place by `key` in the given `order`.
///
/// The sort is stable: expenses with equal keys keep their input order.
pub fn sort_expenses(expenses: &mut [Expense], key: SortKey, order: SortOrder) {
    expenses.sort_by(|a, b| {
        let ordering = match key {
            SortKey::Date => a.date.cmp(&b.date),
            SortKey::Amount => a.amount.total_cmp(&b.amount),
            SortKey::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        };

        match order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    });
}

/// Produce the ordered subsequence of `expenses` matching every predicate in
/// `spec`.
///
/// `sort_key = None` leaves the matching expenses in their input order.
/// An empty input yields an empty output.
pub fn filter_and_sort(
    expenses: Vec<Expense>,
    spec: &FilterSpec,
    sort_key: Option<SortKey>,
    sort_order: SortOrder,
    today: Date,
) -> Vec<Expense> {
    let mut matching: Vec<Expense> = expenses
        .into_iter()
        .filter(|expense| spec.matches(expense, today))
        .collect();

    if let Some(key) = sort_key {
        sort_expenses(&mut matching, key, sort_order);
    }

    matching
}

#[cfg(test)]
mod filter_tests {
    use time::{Date, Duration, Month, OffsetDateTime};

    use crate::{
        filter::{DateRangeFilter, FilterSpec, SortKey, SortOrder, filter_and_sort},
        models::{Category, Expense},
    };

    fn expense(id: i64, title: &str, amount: f64, date: Date, category: Category) -> Expense {
        Expense {
            id,
            title: title.to_owned(),
            amount,
            date,
            category,
            description: None,
            user_id: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn date(year: i32, month: Month, day: u8) -> Date {
        Date::from_calendar_date(year, month, day).unwrap()
    }

    fn test_today() -> Date {
        date(2024, Month::June, 15)
    }

    fn test_expenses() -> Vec<Expense> {
        vec![
            expense(1, "Rent", 1200.0, date(2024, Month::June, 1), Category::Bills),
            expense(2, "groceries", 85.5, date(2024, Month::June, 14), Category::Food),
            expense(3, "Bus pass", 40.0, date(2024, Month::May, 20), Category::Transportation),
            expense(4, "Cinema", 18.0, date(2024, Month::June, 15), Category::Entertainment),
        ]
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let got = filter_and_sort(
            vec![],
            &FilterSpec::default(),
            Some(SortKey::Date),
            SortOrder::Ascending,
            test_today(),
        );

        assert!(got.is_empty());
    }

    #[test]
    fn search_term_is_case_insensitive_substring() {
        let spec = FilterSpec {
            search_term: Some("GROC".to_owned()),
            ..Default::default()
        };

        let got = filter_and_sort(test_expenses(), &spec, None, SortOrder::Ascending, test_today());

        assert_eq!(got.len(), 1);
        assert_eq!(got[0].id, 2);
    }

    #[test]
    fn empty_search_term_matches_all() {
        let spec = FilterSpec {
            search_term: Some(String::new()),
            ..Default::default()
        };

        let got = filter_and_sort(test_expenses(), &spec, None, SortOrder::Ascending, test_today());

        assert_eq!(got.len(), 4);
    }

    #[test]
    fn category_filter_is_exact() {
        let spec = FilterSpec {
            category: Some(Category::Food),
            ..Default::default()
        };

        let got = filter_and_sort(test_expenses(), &spec, None, SortOrder::Ascending, test_today());

        assert_eq!(got.len(), 1);
        assert_eq!(got[0].category, Category::Food);
    }

    #[test]
    fn today_matches_same_calendar_day_only() {
        let range = DateRangeFilter::Today;

        assert!(range.matches(test_today(), test_today()));
        assert!(!range.matches(test_today() - Duration::days(1), test_today()));
    }

    #[test]
    fn last_7_days_window_is_inclusive() {
        let range = DateRangeFilter::Last7Days;
        let today = test_today();

        assert!(range.matches(today, today));
        assert!(range.matches(today - Duration::days(7), today));
        assert!(!range.matches(today - Duration::days(8), today));
        // Future dates are outside the window.
        assert!(!range.matches(today + Duration::days(1), today));
    }

    #[test]
    fn custom_range_is_inclusive_of_both_bounds() {
        let start = date(2024, Month::June, 1);
        let end = date(2024, Month::June, 14);
        let range = DateRangeFilter::Custom {
            start: Some(start),
            end: Some(end),
        };

        assert!(range.matches(start, test_today()));
        assert!(range.matches(end, test_today()));
        assert!(!range.matches(date(2024, Month::May, 31), test_today()));
        assert!(!range.matches(test_today(), test_today()));
    }

    #[test]
    fn custom_range_without_both_bounds_matches_all() {
        let range = DateRangeFilter::Custom {
            start: Some(date(2024, Month::June, 1)),
            end: None,
        };

        assert!(range.matches(date(1970, Month::January, 1), test_today()));
    }

    #[test]
    fn narrowing_then_sub_range_equals_direct_sub_range() {
        let wide = FilterSpec {
            date_range: DateRangeFilter::Custom {
                start: Some(date(2024, Month::May, 1)),
                end: Some(date(2024, Month::June, 30)),
            },
            ..Default::default()
        };
        let narrow = FilterSpec {
            date_range: DateRangeFilter::Custom {
                start: Some(date(2024, Month::June, 1)),
                end: Some(date(2024, Month::June, 14)),
            },
            ..Default::default()
        };

        let two_step = filter_and_sort(
            filter_and_sort(test_expenses(), &wide, None, SortOrder::Ascending, test_today()),
            &narrow,
            None,
            SortOrder::Ascending,
            test_today(),
        );
        let direct =
            filter_and_sort(test_expenses(), &narrow, None, SortOrder::Ascending, test_today());

        assert_eq!(two_step, direct);
    }

    #[test]
    fn sort_by_amount_descending_is_reverse_of_ascending() {
        let ascending = filter_and_sort(
            test_expenses(),
            &FilterSpec::default(),
            Some(SortKey::Amount),
            SortOrder::Ascending,
            test_today(),
        );
        let descending = filter_and_sort(
            test_expenses(),
            &FilterSpec::default(),
            Some(SortKey::Amount),
            SortOrder::Descending,
            test_today(),
        );

        let mut reversed = ascending;
        reversed.reverse();
        assert_eq!(reversed, descending);
    }

    #[test]
    fn sort_by_title_ignores_case() {
        let got = filter_and_sort(
            test_expenses(),
            &FilterSpec::default(),
            Some(SortKey::Title),
            SortOrder::Ascending,
            test_today(),
        );

        let titles: Vec<&str> = got.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, ["Bus pass", "Cinema", "groceries", "Rent"]);
    }

    #[test]
    fn equal_keys_keep_input_order() {
        let today = test_today();
        let expenses = vec![
            expense(1, "First", 10.0, today, Category::Other),
            expense(2, "Second", 10.0, today, Category::Other),
            expense(3, "Third", 10.0, today, Category::Other),
        ];

        let got = filter_and_sort(
            expenses,
            &FilterSpec::default(),
            Some(SortKey::Amount),
            SortOrder::Descending,
            today,
        );

        let ids: Vec<i64> = got.iter().map(|e| e.id).collect();
        assert_eq!(ids, [1, 2, 3]);
    }

    #[test]
    fn no_sort_key_keeps_input_order() {
        let got = filter_and_sort(
            test_expenses(),
            &FilterSpec::default(),
            None,
            SortOrder::Descending,
            test_today(),
        );

        let ids: Vec<i64> = got.iter().map(|e| e.id).collect();
        assert_eq!(ids, [1, 2, 3, 4]);
    }
}
