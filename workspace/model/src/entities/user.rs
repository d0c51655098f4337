use sea_orm::entity::prelude::*;
use sea_orm::Set;

/// Represents a user of the tracker.
///
/// Display preferences are stored flat; the API nests them under
/// `preferences`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Globally unique e-mail address.
    #[sea_orm(unique)]
    pub email: String,
    pub name: String,
    /// ISO 4217 currency code.
    pub currency: String,
    pub date_format: String,
    pub theme: String,
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
    /// The owner identifier used to scope this user's data in other tables.
    pub fn owner_id(&self) -> String {
        self.id.to_string()
    }
}
