use sea_orm::entity::prelude::*;
use sea_orm::{Set, SqlErr};
use tracing::{debug, info, instrument};

/// Icon used when a category is created without one.
pub const DEFAULT_ICON: &str = "DollarSign";
/// Color used when a category is created without one.
pub const DEFAULT_COLOR: &str = "#45B7D1";

/// A spending category owned by a single user.
///
/// Transactions and budgets refer to categories by name, not by id, so
/// renaming or deleting a category leaves existing rows untouched.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Owner identifier. `(user_id, name)` is unique.
    pub user_id: String,
    pub name: String,
    /// Icon name understood by the dashboard.
    pub icon: String,
    /// Hex color, e.g. `#FF6B6B`.
    pub color: String,
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

/// One entry of the built-in category set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DefaultCategory {
    pub name: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
}

/// The categories every new owner starts with.
pub const DEFAULT_CATEGORIES: [DefaultCategory; 10] = [
    DefaultCategory { name: "Food & Dining", icon: "Utensils", color: "#FF6B6B" },
    DefaultCategory { name: "Transportation", icon: "Car", color: "#4ECDC4" },
    DefaultCategory { name: "Shopping", icon: "ShoppingCart", color: "#45B7D1" },
    DefaultCategory { name: "Bills & Utilities", icon: "Zap", color: "#96CEB4" },
    DefaultCategory { name: "Entertainment", icon: "GamepadIcon", color: "#FFEAA7" },
    DefaultCategory { name: "Travel", icon: "Plane", color: "#DDA0DD" },
    DefaultCategory { name: "Housing", icon: "Home", color: "#98D8C8" },
    DefaultCategory { name: "Healthcare", icon: "Heart", color: "#FF7675" },
    DefaultCategory { name: "Education", icon: "BookOpen", color: "#74B9FF" },
    DefaultCategory { name: "Personal Care", icon: "User", color: "#FD79A8" },
];

/// Inserts the default categories for `user_id` in a single statement.
///
/// Returns `Ok(Some(count))` with the number of inserted rows, or `Ok(None)`
/// when the owner already has at least one of the default names. Any other
/// database error is returned unchanged.
#[instrument(skip(db))]
pub async fn initialize_defaults<C>(db: &C, user_id: &str) -> Result<Option<u64>, DbErr>
where
    C: ConnectionTrait,
{
    let now = chrono::Utc::now();
    let rows = DEFAULT_CATEGORIES.iter().map(|default| ActiveModel {
        user_id: Set(user_id.to_string()),
        name: Set(default.name.to_string()),
        icon: Set(default.icon.to_string()),
        color: Set(default.color.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    });

    match Entity::insert_many(rows).exec_without_returning(db).await {
        Ok(inserted) => {
            info!("Initialized {} default categories for user {}", inserted, user_id);
            Ok(Some(inserted))
        }
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            debug!("Default categories already exist for user {}", user_id);
            Ok(None)
        }
        Err(err) => Err(err),
    }
}
