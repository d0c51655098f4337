use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::Set;

/// A monthly spending limit for one category.
///
/// `spent_amount` is a counter maintained alongside transaction writes; see
/// `compute::budget` for the rules that keep it in step with the
/// transactions it summarizes.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Owner identifier. `(user_id, category, month, year)` is unique.
    pub user_id: String,
    pub category: String,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub budget_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub spent_amount: Decimal,
    /// 1 to 12.
    pub month: i32,
    pub year: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let now = chrono::Utc::now();
        if insert {
            self.created_at = Set(now);
        }
        self.updated_at = Set(now);
        Ok(self)
    }
}
