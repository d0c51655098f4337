use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::{BudgetVsActual, CategoryTotal, MonthlyTotal, UserPreferences};
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

use crate::handlers::{
    budgets::{BudgetQuery, BudgetResponse, CreateBudgetRequest, UpdateBudgetRequest},
    categories::{
        CategoryResponse, CreateCategoryRequest, InitializeCategoriesRequest,
        InitializeCategoriesResponse, UpdateCategoryRequest,
    },
    transactions::{
        CategoryTotalsQuery, CreateTransactionRequest, OwnerQuery, SortField, TransactionQuery,
        TransactionResponse, UpdateTransactionRequest,
    },
    users::{CreateUserRequest, UpdatePreferencesRequest, UpdateUserRequest, UserResponse},
};
use crate::store::Store;

pub use common::ApiResponse;

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Lazily connected database handle
    pub store: Arc<Store>,
}

impl AppState {
    pub fn new(store: Store) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// "OK", or "DEGRADED" when the database is unreachable
    pub status: String,
    /// Service version
    pub version: String,
    /// "connected" or "disconnected"
    pub database: String,
    pub timestamp: DateTime<Utc>,
}

/// Returned by every delete endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeletedResponse {
    /// ID of the deleted row
    pub id: i32,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::transactions::get_transactions,
        crate::handlers::transactions::get_transaction,
        crate::handlers::transactions::create_transaction,
        crate::handlers::transactions::update_transaction,
        crate::handlers::transactions::delete_transaction,
        crate::handlers::transactions::get_monthly_totals,
        crate::handlers::transactions::get_category_totals,
        crate::handlers::categories::get_categories,
        crate::handlers::categories::get_category,
        crate::handlers::categories::create_category,
        crate::handlers::categories::update_category,
        crate::handlers::categories::delete_category,
        crate::handlers::categories::initialize_categories,
        crate::handlers::categories::initialize_default_categories,
        crate::handlers::budgets::get_budgets,
        crate::handlers::budgets::get_budget,
        crate::handlers::budgets::create_budget,
        crate::handlers::budgets::update_budget,
        crate::handlers::budgets::delete_budget,
        crate::handlers::budgets::reconcile_budget,
        crate::handlers::budgets::get_budget_vs_actual,
        crate::handlers::users::create_user,
        crate::handlers::users::get_user,
        crate::handlers::users::get_user_by_email,
        crate::handlers::users::update_user,
        crate::handlers::users::delete_user,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            DeletedResponse,
            TransactionResponse,
            CreateTransactionRequest,
            UpdateTransactionRequest,
            TransactionQuery,
            CategoryTotalsQuery,
            OwnerQuery,
            SortField,
            CategoryResponse,
            CreateCategoryRequest,
            UpdateCategoryRequest,
            InitializeCategoriesRequest,
            InitializeCategoriesResponse,
            BudgetResponse,
            CreateBudgetRequest,
            UpdateBudgetRequest,
            BudgetQuery,
            UserResponse,
            CreateUserRequest,
            UpdateUserRequest,
            UpdatePreferencesRequest,
            UserPreferences,
            MonthlyTotal,
            CategoryTotal,
            BudgetVsActual,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "transactions", description = "Transaction CRUD endpoints"),
        (name = "categories", description = "Category CRUD endpoints"),
        (name = "budgets", description = "Budget CRUD endpoints"),
        (name = "users", description = "User profile endpoints"),
        (name = "analytics", description = "Monthly, category and budget reports"),
    ),
    info(
        title = "fintrack API",
        description = "Personal finance tracker API: transactions, categories, monthly budgets and spending reports",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
