use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Sum of one owner's transactions within a single calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTotal {
    /// Month number, 1 (January) to 12 (December)
    pub month: u32,
    /// Sum of the transaction amounts
    pub total: Decimal,
    /// Number of transactions in the month
    pub count: u64,
}

/// Spending summary of one category over a date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    /// Category name as recorded on the transactions
    pub category: String,
    /// Sum of the transaction amounts
    pub total: Decimal,
    /// Number of transactions
    pub count: u64,
    /// Mean transaction amount
    pub average: Decimal,
}

/// Budgeted versus spent amounts for one month, summed over all categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BudgetVsActual {
    /// Month number, 1 (January) to 12 (December)
    pub month: i32,
    pub total_budget: Decimal,
    pub total_spent: Decimal,
    /// `total_budget - total_spent`, negative when overspent
    pub remaining: Decimal,
}

impl CategoryTotal {
    /// Builds a row from a running sum, deriving the average.
    pub fn from_sum(category: String, total: Decimal, count: u64) -> Self {
        let average = if count == 0 {
            Decimal::ZERO
        } else {
            (total / Decimal::from(count)).normalize()
        };

        Self {
            category,
            total,
            count,
            average,
        }
    }
}

impl BudgetVsActual {
    pub fn new(month: i32, total_budget: Decimal, total_spent: Decimal) -> Self {
        Self {
            month,
            total_budget,
            total_spent,
            remaining: total_budget - total_spent,
        }
    }
}
