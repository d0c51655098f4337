use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate};
use common::{CategoryTotal, MonthlyTotal};
use model::entities::{prelude::Transaction, transaction};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use tracing::{debug, instrument, trace};

use crate::error::{ComputeError, Result};

/// Returns the half-open range `[first day of month, first day of next month)`.
pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate)> {
    let invalid = || ComputeError::InvalidPeriod {
        month: i64::from(month),
        year,
    };
    let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let end = NaiveDate::from_ymd_opt(next_year, next_month, 1).ok_or_else(invalid)?;
    Ok((start, end))
}

/// Returns the half-open range covering the whole calendar year.
pub fn year_bounds(year: i32) -> Result<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1).ok_or(ComputeError::InvalidYear(year))?;
    let end = year
        .checked_add(1)
        .and_then(|next| NaiveDate::from_ymd_opt(next, 1, 1))
        .ok_or(ComputeError::InvalidYear(year))?;
    Ok((start, end))
}

/// Groups transactions by month number.
///
/// Only months that actually contain transactions are returned, in
/// ascending order.
pub fn summarize_by_month(transactions: &[transaction::Model]) -> Vec<MonthlyTotal> {
    let mut months: BTreeMap<u32, (Decimal, u64)> = BTreeMap::new();
    for t in transactions {
        let entry = months.entry(t.date.month()).or_insert((Decimal::ZERO, 0));
        entry.0 += t.amount;
        entry.1 += 1;
    }

    months
        .into_iter()
        .map(|(month, (total, count))| MonthlyTotal { month, total, count })
        .collect()
}

/// Groups transactions by category name.
///
/// Sorted by total descending; equal totals are ordered by name.
pub fn summarize_by_category(transactions: &[transaction::Model]) -> Vec<CategoryTotal> {
    let mut categories: HashMap<&str, (Decimal, u64)> = HashMap::new();
    for t in transactions {
        let entry = categories.entry(t.category.as_str()).or_insert((Decimal::ZERO, 0));
        entry.0 += t.amount;
        entry.1 += 1;
    }

    let mut totals: Vec<CategoryTotal> = categories
        .into_iter()
        .map(|(category, (total, count))| CategoryTotal::from_sum(category.to_string(), total, count))
        .collect();
    totals.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.category.cmp(&b.category)));
    totals
}

/// Per-month totals of the owner's transactions in `year`.
#[instrument(skip(db))]
pub async fn monthly_totals<C>(db: &C, user_id: &str, year: i32) -> Result<Vec<MonthlyTotal>>
where
    C: ConnectionTrait,
{
    let (start, end) = year_bounds(year)?;
    let transactions = Transaction::find()
        .filter(transaction::Column::UserId.eq(user_id))
        .filter(transaction::Column::Date.gte(start))
        .filter(transaction::Column::Date.lt(end))
        .all(db)
        .await?;

    debug!("Summarizing {} transactions for year {}", transactions.len(), year);
    let totals = summarize_by_month(&transactions);
    trace!(?totals, "Monthly totals");
    Ok(totals)
}

/// Per-category totals of the owner's transactions between `start_date` and
/// `end_date`, both inclusive.
#[instrument(skip(db))]
pub async fn category_totals<C>(
    db: &C,
    user_id: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<Vec<CategoryTotal>>
where
    C: ConnectionTrait,
{
    if start_date > end_date {
        return Err(ComputeError::InvertedRange {
            start: start_date,
            end: end_date,
        });
    }

    let transactions = Transaction::find()
        .filter(transaction::Column::UserId.eq(user_id))
        .filter(transaction::Column::Date.gte(start_date))
        .filter(transaction::Column::Date.lte(end_date))
        .order_by_asc(transaction::Column::Date)
        .all(db)
        .await?;

    debug!(
        "Summarizing {} transactions from {} to {}",
        transactions.len(),
        start_date,
        end_date
    );
    Ok(summarize_by_category(&transactions))
}

/// Sum of the owner's transactions in `category` during the given month.
#[instrument(skip(db))]
pub async fn period_spend<C>(
    db: &C,
    user_id: &str,
    category: &str,
    month: i32,
    year: i32,
) -> Result<Decimal>
where
    C: ConnectionTrait,
{
    let month = u32::try_from(month).map_err(|_| ComputeError::InvalidPeriod {
        month: i64::from(month),
        year,
    })?;
    let (start, end) = month_bounds(year, month)?;

    let transactions = Transaction::find()
        .filter(transaction::Column::UserId.eq(user_id))
        .filter(transaction::Column::Category.eq(category))
        .filter(transaction::Column::Date.gte(start))
        .filter(transaction::Column::Date.lt(end))
        .all(db)
        .await?;

    let spend: Decimal = transactions.iter().map(|t| t.amount).sum();
    debug!("Period spend for {} in {}/{}: {}", category, month, year, spend);
    Ok(spend)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::setup_db;
    use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(amount: Decimal, category: &str, on: NaiveDate) -> transaction::Model {
        let now = chrono::Utc::now();
        transaction::Model {
            id: 0,
            user_id: "owner".to_string(),
            amount,
            description: "test".to_string(),
            category: category.to_string(),
            date: on,
            created_at: now,
            updated_at: now,
        }
    }

    async fn insert(
        db: &DatabaseConnection,
        owner: &str,
        amount: Decimal,
        category: &str,
        on: NaiveDate,
    ) {
        transaction::ActiveModel {
            user_id: Set(owner.to_string()),
            amount: Set(amount),
            description: Set(format!("{} purchase", category)),
            category: Set(category.to_string()),
            date: Set(on),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("insert transaction");
    }

    #[test]
    fn test_month_bounds_rolls_over_december() {
        assert_eq!(month_bounds(2024, 12).unwrap(), (date(2024, 12, 1), date(2025, 1, 1)));
        assert_eq!(month_bounds(2024, 2).unwrap(), (date(2024, 2, 1), date(2024, 3, 1)));
        assert!(matches!(
            month_bounds(2024, 13),
            Err(ComputeError::InvalidPeriod { month: 13, year: 2024 })
        ));
        assert!(month_bounds(2024, 0).is_err());
        assert!(matches!(year_bounds(i32::MAX), Err(ComputeError::InvalidYear(_))));
    }

    #[test]
    fn test_summarize_by_month_skips_empty_months() {
        let rows = vec![
            row(Decimal::new(1000, 2), "Food", date(2024, 3, 1)),
            row(Decimal::new(550, 2), "Food", date(2024, 3, 31)),
            row(Decimal::new(-2000, 2), "Travel", date(2024, 1, 15)),
        ];

        let totals = summarize_by_month(&rows);
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].month, 1);
        assert_eq!(totals[0].total, Decimal::new(-2000, 2));
        assert_eq!(totals[1].month, 3);
        assert_eq!(totals[1].total, Decimal::new(1550, 2));
        assert_eq!(totals[1].count, 2);
    }

    #[test]
    fn test_summarize_by_category_orders_by_total_then_name() {
        let rows = vec![
            row(Decimal::new(10, 0), "Shopping", date(2024, 1, 1)),
            row(Decimal::new(30, 0), "Food", date(2024, 1, 2)),
            row(Decimal::new(30, 0), "Bills", date(2024, 1, 3)),
            row(Decimal::new(5, 0), "Shopping", date(2024, 1, 4)),
        ];

        let totals = summarize_by_category(&rows);
        let names: Vec<&str> = totals.iter().map(|t| t.category.as_str()).collect();
        assert_eq!(names, vec!["Bills", "Food", "Shopping"]);

        let shopping = &totals[2];
        assert_eq!(shopping.total, Decimal::new(15, 0));
        assert_eq!(shopping.count, 2);
        assert_eq!(shopping.average, Decimal::new(75, 1));
    }

    #[test]
    fn test_summaries_of_nothing_are_empty() {
        assert!(summarize_by_month(&[]).is_empty());
        assert!(summarize_by_category(&[]).is_empty());
    }

    #[tokio::test]
    async fn test_monthly_totals_only_counts_owner_and_year() {
        let db = setup_db().await;
        insert(&db, "a", Decimal::new(2550, 2), "Food", date(2024, 1, 1)).await;
        insert(&db, "a", Decimal::new(5000, 2), "Food", date(2024, 12, 31)).await;
        insert(&db, "a", Decimal::new(100, 0), "Food", date(2023, 12, 31)).await;
        insert(&db, "a", Decimal::new(100, 0), "Food", date(2025, 1, 1)).await;
        insert(&db, "b", Decimal::new(100, 0), "Food", date(2024, 6, 1)).await;

        let totals = monthly_totals(&db, "a", 2024).await.unwrap();
        assert_eq!(totals.len(), 2);
        assert!(totals.iter().all(|t| (1..=12).contains(&t.month)));
        assert_eq!(totals[0].month, 1);
        assert_eq!(totals[0].total, Decimal::new(2550, 2));
        assert_eq!(totals[1].month, 12);
        assert_eq!(totals[1].total, Decimal::new(5000, 2));
    }

    #[tokio::test]
    async fn test_category_totals_sum_to_range_total() {
        let db = setup_db().await;
        let amounts = [
            (Decimal::new(2550, 2), "Food", date(2024, 2, 1)),
            (Decimal::new(1225, 2), "Food", date(2024, 2, 10)),
            (Decimal::new(-40, 0), "Travel", date(2024, 2, 29)),
            (Decimal::new(75, 0), "Housing", date(2024, 2, 15)),
        ];
        for (amount, category, on) in amounts {
            insert(&db, "a", amount, category, on).await;
        }
        // Outside the range.
        insert(&db, "a", Decimal::new(999, 0), "Food", date(2024, 3, 1)).await;

        let totals = category_totals(&db, "a", date(2024, 2, 1), date(2024, 2, 29))
            .await
            .unwrap();

        let expected: Decimal = amounts.iter().map(|(a, _, _)| *a).sum();
        let actual: Decimal = totals.iter().map(|t| t.total).sum();
        assert_eq!(actual, expected);
        assert_eq!(totals[0].category, "Housing");
        assert_eq!(totals.last().unwrap().category, "Travel");
    }

    #[tokio::test]
    async fn test_category_totals_rejects_inverted_range() {
        let db = setup_db().await;
        let result = category_totals(&db, "a", date(2024, 3, 1), date(2024, 2, 1)).await;
        assert!(matches!(result, Err(ComputeError::InvertedRange { .. })));
    }

    #[tokio::test]
    async fn test_period_spend_filters_category_and_month() {
        let db = setup_db().await;
        insert(&db, "a", Decimal::new(2550, 2), "Food", date(2024, 5, 1)).await;
        insert(&db, "a", Decimal::new(1250, 2), "Food", date(2024, 5, 31)).await;
        insert(&db, "a", Decimal::new(10, 0), "Travel", date(2024, 5, 2)).await;
        insert(&db, "a", Decimal::new(10, 0), "Food", date(2024, 6, 1)).await;

        let spend = period_spend(&db, "a", "Food", 5, 2024).await.unwrap();
        assert_eq!(spend, Decimal::new(3800, 2));

        let nothing = period_spend(&db, "b", "Food", 5, 2024).await.unwrap();
        assert_eq!(nothing, Decimal::ZERO);
    }
}
