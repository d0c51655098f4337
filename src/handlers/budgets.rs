use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use common::BudgetVsActual;
use compute::{budget as budgets, transaction::period_spend};
use model::entities::budget;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::ApiError;
use crate::handlers::transactions::OwnerQuery;
use crate::handlers::{require_owner, required, ApiJson, ApiPath, ApiQuery, ValidQuery};
use crate::schemas::{ApiResponse, AppState, DeletedResponse, ErrorResponse};

const DUPLICATE_BUDGET: &str = "DUPLICATE_BUDGET";
const MIN_YEAR: i32 = 1900;
const MAX_YEAR: i32 = 9998;

/// Request body for creating a budget
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBudgetRequest {
    #[validate(required, length(min = 1))]
    pub user_id: Option<String>,
    #[validate(required, length(min = 1))]
    pub category: Option<String>,
    /// Planned amount; must be positive
    #[validate(required)]
    pub budget_amount: Option<Decimal>,
    /// Starting spent amount. When absent it is computed from the existing
    /// transactions of the period.
    pub spent_amount: Option<Decimal>,
    #[validate(required, range(min = 1, max = 12))]
    pub month: Option<i32>,
    #[validate(required, range(min = 1900, max = 9998))]
    pub year: Option<i32>,
}

/// Request body for updating a budget
#[derive(Debug, Default, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBudgetRequest {
    #[validate(length(min = 1))]
    pub category: Option<String>,
    pub budget_amount: Option<Decimal>,
    /// Explicit override of the spent counter
    pub spent_amount: Option<Decimal>,
    #[validate(range(min = 1, max = 12))]
    pub month: Option<i32>,
    #[validate(range(min = 1900, max = 9998))]
    pub year: Option<i32>,
}

/// Query parameters for listing budgets
#[derive(Debug, Deserialize, ToSchema, IntoParams, Validate)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct BudgetQuery {
    /// Owner identifier (required)
    pub user_id: Option<String>,
    /// Month filter; applied only together with `year`
    #[validate(range(min = 1, max = 12))]
    pub month: Option<i32>,
    /// Year filter; applied only together with `month`
    pub year: Option<i32>,
}

/// Budget response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BudgetResponse {
    pub id: i32,
    pub user_id: String,
    pub category: String,
    pub budget_amount: Decimal,
    pub spent_amount: Decimal,
    pub month: i32,
    pub year: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<budget::Model> for BudgetResponse {
    fn from(model: budget::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            category: model.category,
            budget_amount: model.budget_amount,
            spent_amount: model.spent_amount,
            month: model.month,
            year: model.year,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

fn ensure_positive(amount: Decimal) -> Result<Decimal, ApiError> {
    if amount <= Decimal::ZERO {
        return Err(ApiError::Validation("budgetAmount must be positive".to_string()));
    }
    Ok(amount)
}

fn duplicate_period(err: sea_orm::DbErr) -> ApiError {
    ApiError::unique_violation(
        err,
        DUPLICATE_BUDGET,
        "Budget already exists for this category and month",
    )
}

/// List the budgets of an owner, sorted by category
#[utoipa::path(
    get,
    path = "/api/budgets",
    tag = "budgets",
    params(BudgetQuery),
    responses(
        (status = 200, description = "Budgets retrieved successfully", body = ApiResponse<Vec<BudgetResponse>>),
        (status = 400, description = "Missing owner or invalid parameters", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_budgets(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<BudgetQuery>,
) -> Result<Json<ApiResponse<Vec<BudgetResponse>>>, ApiError> {
    let user_id = require_owner(query.user_id)?;

    let mut select = budget::Entity::find().filter(budget::Column::UserId.eq(&user_id));
    if let (Some(month), Some(year)) = (query.month, query.year) {
        debug!("Filtering budgets to {}/{}", month, year);
        select = select
            .filter(budget::Column::Month.eq(month))
            .filter(budget::Column::Year.eq(year));
    }

    let db = state.store.conn().await?;
    let budgets = select.order_by_asc(budget::Column::Category).all(db).await?;

    debug!("Retrieved {} budgets for {}", budgets.len(), user_id);
    Ok(Json(ApiResponse::ok(
        budgets.into_iter().map(BudgetResponse::from).collect(),
        "Budgets retrieved successfully",
    )))
}

/// Get a budget by ID
#[utoipa::path(
    get,
    path = "/api/budgets/{id}",
    tag = "budgets",
    params(("id" = i32, Path, description = "Budget ID")),
    responses(
        (status = 200, description = "Budget retrieved successfully", body = ApiResponse<BudgetResponse>),
        (status = 404, description = "Budget not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_budget(
    ApiPath(id): ApiPath<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<BudgetResponse>>, ApiError> {
    let db = state.store.conn().await?;
    let model = budget::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(ApiError::NotFound("Budget"))?;

    Ok(Json(ApiResponse::ok(
        BudgetResponse::from(model),
        "Budget retrieved successfully",
    )))
}

/// Create a budget
///
/// Unless `spentAmount` is given, the counter starts at the sum of the
/// transactions already recorded for the category and month.
#[utoipa::path(
    post,
    path = "/api/budgets",
    tag = "budgets",
    request_body = CreateBudgetRequest,
    responses(
        (status = 201, description = "Budget created successfully", body = ApiResponse<BudgetResponse>),
        (status = 400, description = "Invalid request or duplicate budget", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_budget(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateBudgetRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BudgetResponse>>), ApiError> {
    trace!("Entering create_budget function");
    request.validate()?;
    let user_id = require_owner(request.user_id)?;
    let category = required(request.category, "category")?;
    let budget_amount = ensure_positive(required(request.budget_amount, "budgetAmount")?)?;
    let month = required(request.month, "month")?;
    let year = required(request.year, "year")?;

    let db = state.store.conn().await?;
    let txn = db.begin().await?;

    let spent_amount = match request.spent_amount {
        Some(explicit) => explicit,
        None => period_spend(&txn, &user_id, &category, month, year).await?,
    };
    debug!("Starting spent amount for {} in {}/{}: {}", category, month, year, spent_amount);

    let model = budget::ActiveModel {
        user_id: Set(user_id),
        category: Set(category),
        budget_amount: Set(budget_amount),
        spent_amount: Set(spent_amount),
        month: Set(month),
        year: Set(year),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(duplicate_period)?;
    txn.commit().await?;

    info!(
        "Budget created with ID: {} for {} in {}/{}",
        model.id, model.category, model.month, model.year
    );
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            BudgetResponse::from(model),
            "Budget created successfully",
        )),
    ))
}

/// Update a budget
///
/// Moving a budget to another category or period recomputes its spent
/// amount unless `spentAmount` is given explicitly.
#[utoipa::path(
    put,
    path = "/api/budgets/{id}",
    tag = "budgets",
    params(("id" = i32, Path, description = "Budget ID")),
    request_body = UpdateBudgetRequest,
    responses(
        (status = 200, description = "Budget updated successfully", body = ApiResponse<BudgetResponse>),
        (status = 400, description = "Invalid request or duplicate budget", body = ErrorResponse),
        (status = 404, description = "Budget not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_budget(
    ApiPath(id): ApiPath<i32>,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<UpdateBudgetRequest>,
) -> Result<Json<ApiResponse<BudgetResponse>>, ApiError> {
    request.validate()?;
    if let Some(amount) = request.budget_amount {
        ensure_positive(amount)?;
    }

    let db = state.store.conn().await?;
    let txn = db.begin().await?;

    let existing = match budget::Entity::find_by_id(id).one(&txn).await? {
        Some(model) => model,
        None => {
            warn!("Budget with ID {} not found for update", id);
            return Err(ApiError::NotFound("Budget"));
        }
    };

    let category = request.category.unwrap_or_else(|| existing.category.clone());
    let month = request.month.unwrap_or(existing.month);
    let year = request.year.unwrap_or(existing.year);
    let moved = category != existing.category || month != existing.month || year != existing.year;

    let spent_amount = match request.spent_amount {
        Some(explicit) => {
            warn!("Spent amount of budget {} overridden to {}", id, explicit);
            Some(explicit)
        }
        None if moved => Some(period_spend(&txn, &existing.user_id, &category, month, year).await?),
        None => None,
    };

    let mut active: budget::ActiveModel = existing.into();
    active.category = Set(category);
    active.month = Set(month);
    active.year = Set(year);
    if let Some(amount) = request.budget_amount {
        active.budget_amount = Set(amount);
    }
    if let Some(spent) = spent_amount {
        active.spent_amount = Set(spent);
    }

    let updated = active.update(&txn).await.map_err(duplicate_period)?;
    txn.commit().await?;

    info!("Budget {} updated", id);
    Ok(Json(ApiResponse::ok(
        BudgetResponse::from(updated),
        "Budget updated successfully",
    )))
}

/// Delete a budget
#[utoipa::path(
    delete,
    path = "/api/budgets/{id}",
    tag = "budgets",
    params(("id" = i32, Path, description = "Budget ID")),
    responses(
        (status = 200, description = "Budget deleted successfully", body = ApiResponse<DeletedResponse>),
        (status = 404, description = "Budget not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_budget(
    ApiPath(id): ApiPath<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<DeletedResponse>>, ApiError> {
    let db = state.store.conn().await?;
    let result = budget::Entity::delete_by_id(id).exec(db).await?;
    if result.rows_affected == 0 {
        warn!("Budget with ID {} not found for deletion", id);
        return Err(ApiError::NotFound("Budget"));
    }

    info!("Budget {} deleted", id);
    Ok(Json(ApiResponse::ok(
        DeletedResponse { id },
        "Budget deleted successfully",
    )))
}

/// Recompute a budget's spent amount from its transactions
#[utoipa::path(
    post,
    path = "/api/budgets/{id}/reconcile",
    tag = "budgets",
    params(("id" = i32, Path, description = "Budget ID")),
    responses(
        (status = 200, description = "Budget reconciled", body = ApiResponse<BudgetResponse>),
        (status = 404, description = "Budget not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn reconcile_budget(
    ApiPath(id): ApiPath<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<BudgetResponse>>, ApiError> {
    let db = state.store.conn().await?;
    let txn = db.begin().await?;

    let existing = budget::Entity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(ApiError::NotFound("Budget"))?;
    let reconciled = budgets::reconcile_spent_amount(&txn, existing).await?;
    txn.commit().await?;

    Ok(Json(ApiResponse::ok(
        BudgetResponse::from(reconciled),
        "Budget reconciled successfully",
    )))
}

/// Budgeted versus spent amounts per month
#[utoipa::path(
    get,
    path = "/api/budgets/analytics/vs-actual/{year}",
    tag = "analytics",
    params(("year" = i32, Path, description = "Calendar year"), OwnerQuery),
    responses(
        (status = 200, description = "Budget comparison computed", body = ApiResponse<Vec<BudgetVsActual>>),
        (status = 400, description = "Missing owner or invalid year", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_budget_vs_actual(
    ApiPath(year): ApiPath<i32>,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<OwnerQuery>,
) -> Result<Json<ApiResponse<Vec<BudgetVsActual>>>, ApiError> {
    let user_id = require_owner(query.user_id)?;
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(ApiError::Validation(format!("year must be between {} and {}", MIN_YEAR, MAX_YEAR)));
    }

    let db = state.store.conn().await?;
    let summary = budgets::budget_vs_actual(db, &user_id, year).await?;

    debug!("Computed budget comparison for {} months of {}", summary.len(), year);
    Ok(Json(ApiResponse::ok(summary, "Budget comparison computed successfully")))
}
