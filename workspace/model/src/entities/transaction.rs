use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::Set;

/// A single income or expense entry.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: String,
    /// The value of the transaction. Never zero.
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub amount: Decimal,
    pub description: String,
    /// Category name. Not a foreign key.
    pub category: String,
    pub date: NaiveDate,
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

impl Model {
    /// The budget period this transaction counts towards, as `(month, year)`.
    pub fn period(&self) -> (i32, i32) {
        (self.date.month() as i32, self.date.year())
    }
}
