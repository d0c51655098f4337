//! This file serves as the root for all SeaORM entity modules.
//! Every table is scoped by an opaque `user_id` owner string; there are no
//! foreign keys between tables, so categories, budgets and transactions are
//! linked only by category name and owner.

pub mod budget;
pub mod category;
pub mod transaction;
pub mod user;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::budget::Entity as Budget;
    pub use super::category::Entity as Category;
    pub use super::transaction::Entity as Transaction;
    pub use super::user::Entity as User;
}

#[cfg(test)]
mod test {
    use chrono::NaiveDate;
    use migration::{Migrator, MigratorTrait};
    use rust_decimal::Decimal;
    use sea_orm::{
        ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, DbErr, EntityTrait,
        QueryFilter, Set, SqlErr,
    };

    use super::*;
    use prelude::*;

    async fn setup_db() -> Result<DatabaseConnection, DbErr> {
        let db = Database::connect("sqlite::memory:").await?;
        Migrator::up(&db, None).await.expect("Migrations failed.");
        Ok(db)
    }

    fn is_unique_violation(err: &DbErr) -> bool {
        matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
    }

    #[tokio::test]
    async fn test_timestamps_are_set_on_insert_and_update() -> Result<(), DbErr> {
        let db = setup_db().await?;

        let inserted = transaction::ActiveModel {
            user_id: Set("owner-1".to_string()),
            amount: Set(Decimal::new(-4250, 2)),
            description: Set("Groceries".to_string()),
            category: Set("Food & Dining".to_string()),
            date: Set(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        assert_eq!(inserted.created_at, inserted.updated_at);
        assert_eq!(inserted.period(), (3, 2024));

        let mut active: transaction::ActiveModel = inserted.clone().into();
        active.description = Set("Weekly groceries".to_string());
        let updated = active.update(&db).await?;

        assert_eq!(updated.created_at, inserted.created_at);
        assert!(updated.updated_at >= inserted.updated_at);
        assert_eq!(updated.description, "Weekly groceries");

        Ok(())
    }

    #[tokio::test]
    async fn test_category_name_is_unique_per_owner() -> Result<(), DbErr> {
        let db = setup_db().await?;

        let new_category = |owner: &str| category::ActiveModel {
            user_id: Set(owner.to_string()),
            name: Set("Pets".to_string()),
            icon: Set(category::DEFAULT_ICON.to_string()),
            color: Set(category::DEFAULT_COLOR.to_string()),
            ..Default::default()
        };

        new_category("owner-1").insert(&db).await?;

        let duplicate = new_category("owner-1").insert(&db).await;
        let err = duplicate.expect_err("second insert should violate uniqueness");
        assert!(is_unique_violation(&err));

        // Another owner may reuse the name.
        new_category("owner-2").insert(&db).await?;

        let pets = Category::find()
            .filter(category::Column::Name.eq("Pets"))
            .all(&db)
            .await?;
        assert_eq!(pets.len(), 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_budget_is_unique_per_owner_category_and_period() -> Result<(), DbErr> {
        let db = setup_db().await?;

        let new_budget = |month: i32| budget::ActiveModel {
            user_id: Set("owner-1".to_string()),
            category: Set("Travel".to_string()),
            budget_amount: Set(Decimal::new(500, 0)),
            spent_amount: Set(Decimal::ZERO),
            month: Set(month),
            year: Set(2024),
            ..Default::default()
        };

        new_budget(5).insert(&db).await?;
        new_budget(6).insert(&db).await?;

        let err = new_budget(5).insert(&db).await.unwrap_err();
        assert!(is_unique_violation(&err));

        assert_eq!(Budget::find().all(&db).await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_user_email_is_globally_unique() -> Result<(), DbErr> {
        let db = setup_db().await?;

        let new_user = |name: &str| user::ActiveModel {
            email: Set("ada@example.com".to_string()),
            name: Set(name.to_string()),
            currency: Set("USD".to_string()),
            date_format: Set("MM/DD/YYYY".to_string()),
            theme: Set("dark".to_string()),
            ..Default::default()
        };

        let ada = new_user("Ada").insert(&db).await?;
        assert_eq!(ada.owner_id(), ada.id.to_string());

        let err = new_user("Someone Else").insert(&db).await.unwrap_err();
        assert!(is_unique_violation(&err));

        assert_eq!(User::find().all(&db).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_initialize_defaults_is_idempotent() -> Result<(), DbErr> {
        let db = setup_db().await?;

        let first = category::initialize_defaults(&db, "owner-1").await?;
        assert_eq!(first, Some(10));

        let second = category::initialize_defaults(&db, "owner-1").await?;
        assert_eq!(second, None);

        let owned = Category::find()
            .filter(category::Column::UserId.eq("owner-1"))
            .all(&db)
            .await?;
        assert_eq!(owned.len(), 10);
        assert!(owned.iter().any(|c| c.name == "Food & Dining" && c.icon == "Utensils"));
        assert!(owned.iter().any(|c| c.name == "Personal Care" && c.color == "#FD79A8"));

        // Defaults for one owner do not block another owner.
        assert_eq!(category::initialize_defaults(&db, "owner-2").await?, Some(10));

        Ok(())
    }

    #[tokio::test]
    async fn test_initialize_defaults_after_manual_default_name() -> Result<(), DbErr> {
        let db = setup_db().await?;

        category::ActiveModel {
            user_id: Set("owner-1".to_string()),
            name: Set("Travel".to_string()),
            icon: Set("Plane".to_string()),
            color: Set("#000000".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        // The bulk insert is a single statement, so nothing is half-inserted.
        assert_eq!(category::initialize_defaults(&db, "owner-1").await?, None);
        assert_eq!(Category::find().all(&db).await?.len(), 1);

        Ok(())
    }
}
