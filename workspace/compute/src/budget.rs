use std::collections::BTreeMap;

use common::BudgetVsActual;
use model::entities::{budget, prelude::Budget};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbBackend, EntityTrait, IntoActiveModel,
    QueryFilter, QuerySelect, Set,
};
use tracing::{debug, info, instrument, trace, warn};

use crate::error::Result;
use crate::transaction::period_spend;

/// Groups budgets by month, summing planned and spent amounts.
pub fn summarize_budgets(budgets: &[budget::Model]) -> Vec<BudgetVsActual> {
    let mut months: BTreeMap<i32, (Decimal, Decimal)> = BTreeMap::new();
    for b in budgets {
        let entry = months.entry(b.month).or_insert((Decimal::ZERO, Decimal::ZERO));
        entry.0 += b.budget_amount;
        entry.1 += b.spent_amount;
    }

    months
        .into_iter()
        .map(|(month, (budgeted, spent))| BudgetVsActual::new(month, budgeted, spent))
        .collect()
}

/// Budgeted versus spent amounts per month of `year`, ascending by month.
#[instrument(skip(db))]
pub async fn budget_vs_actual<C>(db: &C, user_id: &str, year: i32) -> Result<Vec<BudgetVsActual>>
where
    C: ConnectionTrait,
{
    let budgets = Budget::find()
        .filter(budget::Column::UserId.eq(user_id))
        .filter(budget::Column::Year.eq(year))
        .all(db)
        .await?;

    debug!("Summarizing {} budgets for year {}", budgets.len(), year);
    Ok(summarize_budgets(&budgets))
}

/// Adds `amount` to the spent counter of the budget matching owner, category
/// and period.
///
/// The sum is taken in `Decimal` and written back, so the counter stays exact
/// on backends that keep decimals as floating point. Call it inside the
/// transaction that writes the transaction row; on Postgres the budget row is
/// locked until that commit. Returns the number of budgets touched; zero means
/// no budget exists for that period.
#[instrument(skip(db))]
pub async fn update_spent_amount<C>(
    db: &C,
    user_id: &str,
    category: &str,
    month: i32,
    year: i32,
    amount: Decimal,
) -> Result<u64>
where
    C: ConnectionTrait,
{
    if amount.is_zero() {
        return Ok(0);
    }

    let mut select = Budget::find()
        .filter(budget::Column::UserId.eq(user_id))
        .filter(budget::Column::Category.eq(category))
        .filter(budget::Column::Month.eq(month))
        .filter(budget::Column::Year.eq(year));
    if db.get_database_backend() == DbBackend::Postgres {
        select = select.lock_exclusive();
    }

    let Some(existing) = select.one(db).await? else {
        debug!("No budget for {} in {}/{}", category, month, year);
        return Ok(0);
    };

    let spent = existing.spent_amount + amount;
    trace!("Budget {} spent amount {} -> {}", existing.id, existing.spent_amount, spent);
    let mut active = existing.into_active_model();
    active.spent_amount = Set(spent);
    active.update(db).await?;

    debug!("Adjusted spent amount of {} in {}/{} by {}", category, month, year, amount);
    Ok(1)
}

/// Recomputes the spent counter of `budget` from its transactions.
#[instrument(skip(db, budget), fields(budget_id = budget.id))]
pub async fn reconcile_spent_amount<C>(db: &C, budget: budget::Model) -> Result<budget::Model>
where
    C: ConnectionTrait,
{
    let actual = period_spend(db, &budget.user_id, &budget.category, budget.month, budget.year).await?;
    if actual == budget.spent_amount {
        debug!("Budget {} already consistent", budget.id);
        return Ok(budget);
    }

    warn!(
        "Budget {} spent amount {} differs from transactions total {}",
        budget.id, budget.spent_amount, actual
    );
    let mut active = budget.into_active_model();
    active.spent_amount = Set(actual);
    let updated = active.update(db).await?;
    info!("Reconciled budget {} to {}", updated.id, updated.spent_amount);
    Ok(updated)
}
