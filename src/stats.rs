//! Derives summary statistics from a set of expenses.
//!
//! [summarize] is a pure function of its input: it performs no IO and its
//! output is independent of input order except for the documented
//! first-encountered tie-breaks. Callers filter the record set first (see
//! [crate::filter]) and aggregate second.

use std::collections::BTreeMap;

use serde::Serialize;
use time::Date;

use crate::models::{Category, Expense};

/// Per-category totals with a running count and average.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CategoryTrend {
    /// Sum of amounts in this category.
    pub total: f64,
    /// How many expenses fall in this category.
    pub count: usize,
    /// `total / count`, or 0 when the category has no expenses.
    pub average: f64,
}

/// The full statistics snapshot for a set of expenses.
///
/// Category maps cover every known category, including those with no matching
/// expenses, so the presentation layer can render zero-valued rows without
/// extra lookups. Monthly maps are keyed "YYYY-MM" and therefore iterate in
/// chronological order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseSummary {
    /// The number of expenses in the input.
    pub total_count: usize,
    /// The sum of all amounts. 0 for an empty input.
    pub total_amount: f64,
    /// `total_amount / total_count`, or 0 for an empty input.
    pub average_amount: f64,
    /// Summed amount per category, zero-initialized for absent categories.
    pub category_totals: BTreeMap<Category, f64>,
    /// Total, count and average per category.
    pub category_trends: BTreeMap<Category, CategoryTrend>,
    /// The expense with the largest amount. Ties go to the expense seen
    /// first in input order. `None` for an empty input.
    pub highest: Option<Expense>,
    /// The expense with the smallest amount, with the same tie-break.
    ///
    /// `None` for an empty input rather than a zero amount, so an empty set
    /// cannot be mistaken for one containing a free expense.
    pub lowest: Option<Expense>,
    /// Summed amount per month present in the input.
    pub monthly_totals: BTreeMap<String, f64>,
    /// Percentage change per month versus the immediately preceding month
    /// present in the data.
    ///
    /// The chronologically earliest month has no entry, and neither does any
    /// month whose predecessor total is 0 (no baseline to compare against).
    pub monthly_changes: BTreeMap<String, f64>,
    /// Average spend per day-of-week, indexed Sunday = 0 through Saturday = 6.
    ///
    /// Amounts are first summed per calendar date, then those per-date sums
    /// are averaged across the dates sharing a weekday, so a single busy day
    /// counts as one data point no matter how many expenses it holds.
    pub daily_averages: [f64; 7],
}

/// The "YYYY-MM" key for a date, e.g. "2024-01".
///
/// Zero-padded so lexicographic order is chronological order.
pub fn month_key(date: Date) -> String {
    format!("{:04}-{:02}", date.year(), u8::from(date.month()))
}

/// Compute the statistics snapshot for `expenses`.
pub fn summarize(expenses: &[Expense]) -> ExpenseSummary {
    let total_count = expenses.len();
    let total_amount: f64 = expenses.iter().map(|expense| expense.amount).sum();
    let average_amount = if total_count > 0 {
        total_amount / total_count as f64
    } else {
        0.0
    };

    let mut category_trends: BTreeMap<Category, CategoryTrend> = Category::ALL
        .into_iter()
        .map(|category| {
            (
                category,
                CategoryTrend {
                    total: 0.0,
                    count: 0,
                    average: 0.0,
                },
            )
        })
        .collect();

    let mut highest: Option<&Expense> = None;
    let mut lowest: Option<&Expense> = None;
    let mut monthly_totals: BTreeMap<String, f64> = BTreeMap::new();
    let mut per_date_totals: BTreeMap<Date, f64> = BTreeMap::new();

    for expense in expenses {
        let trend = category_trends
            .get_mut(&expense.category)
            .unwrap_or_else(|| unreachable!("category map covers the closed enumeration"));
        trend.total += expense.amount;
        trend.count += 1;

        // Strict comparisons so the first of equal amounts wins.
        if highest.is_none_or(|current| expense.amount > current.amount) {
            highest = Some(expense);
        }

        if lowest.is_none_or(|current| expense.amount < current.amount) {
            lowest = Some(expense);
        }

        *monthly_totals.entry(month_key(expense.date)).or_insert(0.0) += expense.amount;
        *per_date_totals.entry(expense.date).or_insert(0.0) += expense.amount;
    }

    for trend in category_trends.values_mut() {
        if trend.count > 0 {
            trend.average = trend.total / trend.count as f64;
        }
    }

    let category_totals = category_trends
        .iter()
        .map(|(category, trend)| (*category, trend.total))
        .collect();

    ExpenseSummary {
        total_count,
        total_amount,
        average_amount,
        category_totals,
        category_trends,
        highest: highest.cloned(),
        lowest: lowest.cloned(),
        monthly_changes: monthly_changes(&monthly_totals),
        monthly_totals,
        daily_averages: daily_averages(&per_date_totals),
    }
}

/// Percentage change per month against the previous month present in the
/// data, skipping the earliest month and any month without a usable baseline.
fn monthly_changes(monthly_totals: &BTreeMap<String, f64>) -> BTreeMap<String, f64> {
    let mut changes = BTreeMap::new();

    for (previous, current) in monthly_totals.iter().zip(monthly_totals.iter().skip(1)) {
        let (_, previous_total) = previous;
        let (month, current_total) = current;

        if *previous_total != 0.0 {
            changes.insert(
                month.clone(),
                (current_total - previous_total) / previous_total * 100.0,
            );
        }
    }

    changes
}

fn daily_averages(per_date_totals: &BTreeMap<Date, f64>) -> [f64; 7] {
    let mut sums = [0.0_f64; 7];
    let mut date_counts = [0_usize; 7];

    for (date, total) in per_date_totals {
        let weekday = date.weekday().number_days_from_sunday() as usize;
        sums[weekday] += total;
        date_counts[weekday] += 1;
    }

    let mut averages = [0.0_f64; 7];
    for weekday in 0..7 {
        if date_counts[weekday] > 0 {
            averages[weekday] = sums[weekday] / date_counts[weekday] as f64;
        }
    }

    averages
}

impl ExpenseSummary {
    /// Keep only the `limit` most recent months in the monthly maps.
    /// A limit of zero empties both maps.
    ///
    /// The statistics endpoint reports at most the 12 most recent months.
    pub fn retain_recent_months(&mut self, limit: usize) {
        if limit == 0 {
            self.monthly_totals.clear();
            self.monthly_changes.clear();
            return;
        }

        if self.monthly_totals.len() <= limit {
            return;
        }

        let cutoff = self
            .monthly_totals
            .keys()
            .rev()
            .nth(limit - 1)
            .cloned()
            .unwrap_or_default();

        self.monthly_totals.retain(|month, _| *month >= cutoff);
        self.monthly_changes.retain(|month, _| *month >= cutoff);
    }
}

#[cfg(test)]
mod summarize_tests {
    use time::{Date, Month, OffsetDateTime};

    use crate::{
        models::{Category, Expense},
        stats::summarize,
    };

    fn expense(id: i64, amount: f64, date: Date, category: Category) -> Expense {
        Expense {
            id,
            title: format!("expense #{id}"),
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

    #[test]
    fn empty_input_produces_zeroed_summary() {
        let summary = summarize(&[]);

        assert_eq!(summary.total_count, 0);
        assert_eq!(summary.total_amount, 0.0);
        assert_eq!(summary.average_amount, 0.0);
        assert_eq!(summary.highest, None);
        assert_eq!(summary.lowest, None);
        assert!(summary.monthly_totals.is_empty());
        assert!(summary.monthly_changes.is_empty());
        assert_eq!(summary.daily_averages, [0.0; 7]);
        // Every category is still present, zero-valued.
        assert_eq!(summary.category_totals.len(), Category::ALL.len());
        assert!(summary.category_totals.values().all(|total| *total == 0.0));
    }

    #[test]
    fn two_month_example_matches_expected_snapshot() {
        let expenses = [
            expense(1, 100.0, date(2024, Month::January, 5), Category::Food),
            expense(2, 50.0, date(2024, Month::February, 10), Category::Food),
        ];

        let summary = summarize(&expenses);

        assert_eq!(summary.total_amount, 150.0);
        assert_eq!(summary.average_amount, 75.0);
        assert_eq!(summary.monthly_totals.get("2024-01"), Some(&100.0));
        assert_eq!(summary.monthly_totals.get("2024-02"), Some(&50.0));
        assert_eq!(summary.monthly_changes.get("2024-02"), Some(&-50.0));
        assert_eq!(summary.monthly_changes.get("2024-01"), None);
    }

    #[test]
    fn category_totals_sum_to_total_amount() {
        let expenses = [
            expense(1, 12.5, date(2024, Month::March, 1), Category::Food),
            expense(2, 30.0, date(2024, Month::March, 2), Category::Bills),
            expense(3, 7.25, date(2024, Month::April, 3), Category::Food),
            expense(4, 99.99, date(2024, Month::April, 4), Category::Travel),
        ];

        let summary = summarize(&expenses);

        let category_sum: f64 = summary.category_totals.values().sum();
        assert!((category_sum - summary.total_amount).abs() < 1e-9);
    }

    #[test]
    fn category_trends_average_absent_categories_as_zero() {
        let expenses = [
            expense(1, 10.0, date(2024, Month::March, 1), Category::Food),
            expense(2, 20.0, date(2024, Month::March, 2), Category::Food),
        ];

        let summary = summarize(&expenses);

        let food = summary.category_trends[&Category::Food];
        assert_eq!(food.count, 2);
        assert_eq!(food.average, 15.0);

        let travel = summary.category_trends[&Category::Travel];
        assert_eq!(travel.count, 0);
        assert_eq!(travel.average, 0.0);
    }

    #[test]
    fn highest_and_lowest_break_ties_by_input_order() {
        let day = date(2024, Month::May, 1);
        let expenses = [
            expense(1, 50.0, day, Category::Other),
            expense(2, 50.0, day, Category::Other),
            expense(3, 5.0, day, Category::Other),
            expense(4, 5.0, day, Category::Other),
        ];

        let summary = summarize(&expenses);

        assert_eq!(summary.highest.unwrap().id, 1);
        assert_eq!(summary.lowest.unwrap().id, 3);
    }

    #[test]
    fn monthly_change_skips_zero_baseline() {
        let expenses = [
            expense(1, 0.0, date(2024, Month::January, 5), Category::Other),
            expense(2, 50.0, date(2024, Month::February, 5), Category::Other),
            expense(3, 100.0, date(2024, Month::March, 5), Category::Other),
        ];

        let summary = summarize(&expenses);

        // January's total is 0, so February has no baseline.
        assert_eq!(summary.monthly_changes.get("2024-02"), None);
        assert_eq!(summary.monthly_changes.get("2024-03"), Some(&100.0));
    }

    #[test]
    fn changes_compare_against_preceding_month_present_in_data() {
        // No expenses in February: March compares against January.
        let expenses = [
            expense(1, 100.0, date(2024, Month::January, 5), Category::Other),
            expense(2, 150.0, date(2024, Month::March, 5), Category::Other),
        ];

        let summary = summarize(&expenses);

        assert_eq!(summary.monthly_changes.get("2024-03"), Some(&50.0));
    }

    #[test]
    fn daily_averages_treat_one_date_as_one_data_point() {
        // 2024-06-03 and 2024-06-10 are both Mondays.
        let expenses = [
            // Many small expenses on the first Monday sum to 30.
            expense(1, 10.0, date(2024, Month::June, 3), Category::Food),
            expense(2, 10.0, date(2024, Month::June, 3), Category::Food),
            expense(3, 10.0, date(2024, Month::June, 3), Category::Food),
            // One expense of 10 on the second Monday.
            expense(4, 10.0, date(2024, Month::June, 10), Category::Food),
        ];

        let summary = summarize(&expenses);

        // Two Monday data points: 30 and 10, averaging 20 (not 10, which
        // averaging the four expenses individually would give).
        assert_eq!(summary.daily_averages[1], 20.0);
        assert_eq!(summary.daily_averages[0], 0.0);
    }

    #[test]
    fn average_times_count_recovers_total() {
        let expenses = [
            expense(1, 12.34, date(2024, Month::March, 1), Category::Food),
            expense(2, 56.78, date(2024, Month::March, 2), Category::Bills),
            expense(3, 9.99, date(2024, Month::March, 3), Category::Travel),
        ];

        let summary = summarize(&expenses);

        let recovered = summary.average_amount * summary.total_count as f64;
        assert!((recovered - summary.total_amount).abs() < 1e-9);
    }
}
