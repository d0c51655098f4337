use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use common::{CategoryTotal, MonthlyTotal};
use compute::{budget::update_spent_amount, transaction as analytics};
use model::entities::transaction;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, Order, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::ApiError;
use crate::handlers::{
    flexible_date, require_owner, required, ApiJson, ApiPath, ApiQuery, ValidQuery,
};
use crate::schemas::{ApiResponse, AppState, DeletedResponse, ErrorResponse};

const DEFAULT_LIMIT: u64 = 50;

/// Request body for creating a transaction
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    /// Owner identifier
    #[validate(required, length(min = 1))]
    pub user_id: Option<String>,
    /// Signed amount; must not be zero
    #[validate(required)]
    pub amount: Option<Decimal>,
    #[validate(required, length(min = 1))]
    pub description: Option<String>,
    /// Category name
    #[validate(required, length(min = 1))]
    pub category: Option<String>,
    /// `YYYY-MM-DD` or an RFC 3339 timestamp
    #[validate(required)]
    #[serde(default, deserialize_with = "flexible_date::deserialize")]
    pub date: Option<NaiveDate>,
}

/// Request body for updating a transaction. Absent fields are left as they are.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTransactionRequest {
    pub amount: Option<Decimal>,
    #[validate(length(min = 1))]
    pub description: Option<String>,
    #[validate(length(min = 1))]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "flexible_date::deserialize")]
    pub date: Option<NaiveDate>,
}

/// Column a transaction listing is sorted by
#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    #[default]
    Date,
    Amount,
    Category,
    Description,
    CreatedAt,
}

impl SortField {
    fn column(self) -> transaction::Column {
        match self {
            SortField::Date => transaction::Column::Date,
            SortField::Amount => transaction::Column::Amount,
            SortField::Category => transaction::Column::Category,
            SortField::Description => transaction::Column::Description,
            SortField::CreatedAt => transaction::Column::CreatedAt,
        }
    }
}

/// Query parameters for listing transactions
#[derive(Debug, Deserialize, ToSchema, IntoParams, Validate)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TransactionQuery {
    /// Owner identifier (required)
    pub user_id: Option<String>,
    /// Page size (default: 50)
    #[validate(range(min = 1, max = 500))]
    pub limit: Option<u64>,
    /// Number of rows to skip (default: 0)
    pub skip: Option<u64>,
    /// Only this category
    pub category: Option<String>,
    /// Inclusive lower date bound
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper date bound
    pub end_date: Option<NaiveDate>,
    /// Sort column (default: date)
    pub sort_by: Option<SortField>,
    /// -1 for descending (default), 1 for ascending
    pub sort_order: Option<i32>,
}

/// Query parameters for the category analytics
#[derive(Debug, Deserialize, ToSchema, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CategoryTotalsQuery {
    pub user_id: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Query parameters carrying only the owner
#[derive(Debug, Deserialize, ToSchema, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct OwnerQuery {
    pub user_id: Option<String>,
}

/// Transaction response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub id: i32,
    pub user_id: String,
    pub amount: Decimal,
    pub description: String,
    pub category: String,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<transaction::Model> for TransactionResponse {
    fn from(model: transaction::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            amount: model.amount,
            description: model.description,
            category: model.category,
            date: model.date,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

fn ensure_non_zero(amount: Decimal) -> Result<Decimal, ApiError> {
    if amount.is_zero() {
        return Err(ApiError::Validation("amount must not be zero".to_string()));
    }
    Ok(amount)
}

/// Applies `sign * amount` to the budget matching the transaction.
async fn adjust_budget(
    txn: &DatabaseTransaction,
    model: &transaction::Model,
    sign: Decimal,
) -> Result<(), ApiError> {
    let (month, year) = model.period();
    let touched = update_spent_amount(
        txn,
        &model.user_id,
        &model.category,
        month,
        year,
        model.amount * sign,
    )
    .await?;
    trace!("Budget adjustment touched {} budget(s)", touched);
    Ok(())
}

/// List transactions of an owner
#[utoipa::path(
    get,
    path = "/api/transactions",
    tag = "transactions",
    params(TransactionQuery),
    responses(
        (status = 200, description = "Transactions retrieved successfully", body = ApiResponse<Vec<TransactionResponse>>),
        (status = 400, description = "Missing owner or invalid parameters", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_transactions(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<TransactionQuery>,
) -> Result<Json<ApiResponse<Vec<TransactionResponse>>>, ApiError> {
    trace!("Entering get_transactions function");
    let user_id = require_owner(query.user_id)?;

    let order = match query.sort_order {
        None | Some(-1) => Order::Desc,
        Some(1) => Order::Asc,
        Some(other) => {
            warn!("Rejected sort order {}", other);
            return Err(ApiError::Validation("sortOrder must be 1 or -1".to_string()));
        }
    };
    let sort_by = query.sort_by.unwrap_or_default();
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    let skip = query.skip.unwrap_or(0);

    let mut select = transaction::Entity::find().filter(transaction::Column::UserId.eq(&user_id));
    if let Some(category) = query.category.filter(|c| !c.is_empty()) {
        select = select.filter(transaction::Column::Category.eq(category));
    }
    if let Some(start_date) = query.start_date {
        select = select.filter(transaction::Column::Date.gte(start_date));
    }
    if let Some(end_date) = query.end_date {
        select = select.filter(transaction::Column::Date.lte(end_date));
    }

    debug!(
        "Listing transactions for {} sorted by {:?} {:?}, limit {}, skip {}",
        user_id, sort_by, order, limit, skip
    );
    let db = state.store.conn().await?;
    let transactions = select
        .order_by(sort_by.column(), order.clone())
        .order_by(transaction::Column::Id, order)
        .limit(limit)
        .offset(skip)
        .all(db)
        .await?;

    info!("Retrieved {} transactions for {}", transactions.len(), user_id);
    Ok(Json(ApiResponse::ok(
        transactions.into_iter().map(TransactionResponse::from).collect(),
        "Transactions retrieved successfully",
    )))
}

/// Get a transaction by ID
#[utoipa::path(
    get,
    path = "/api/transactions/{id}",
    tag = "transactions",
    params(("id" = i32, Path, description = "Transaction ID")),
    responses(
        (status = 200, description = "Transaction retrieved successfully", body = ApiResponse<TransactionResponse>),
        (status = 404, description = "Transaction not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_transaction(
    ApiPath(id): ApiPath<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<TransactionResponse>>, ApiError> {
    let db = state.store.conn().await?;
    match transaction::Entity::find_by_id(id).one(db).await? {
        Some(model) => Ok(Json(ApiResponse::ok(
            TransactionResponse::from(model),
            "Transaction retrieved successfully",
        ))),
        None => {
            warn!("Transaction with ID {} not found", id);
            Err(ApiError::NotFound("Transaction"))
        }
    }
}

/// Create a transaction
///
/// The matching budget's spent amount is incremented in the same database
/// transaction.
#[utoipa::path(
    post,
    path = "/api/transactions",
    tag = "transactions",
    request_body = CreateTransactionRequest,
    responses(
        (status = 201, description = "Transaction created successfully", body = ApiResponse<TransactionResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_transaction(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TransactionResponse>>), ApiError> {
    trace!("Entering create_transaction function");
    request.validate()?;
    let user_id = require_owner(request.user_id)?;
    let amount = ensure_non_zero(required(request.amount, "amount")?)?;

    let new_transaction = transaction::ActiveModel {
        user_id: Set(user_id),
        amount: Set(amount),
        description: Set(required(request.description, "description")?),
        category: Set(required(request.category, "category")?),
        date: Set(required(request.date, "date")?),
        ..Default::default()
    };

    let db = state.store.conn().await?;
    let txn = db.begin().await?;
    let model = new_transaction.insert(&txn).await?;
    adjust_budget(&txn, &model, Decimal::ONE).await?;
    txn.commit().await?;

    info!(
        "Transaction created with ID: {}, amount: {}, category: {}",
        model.id, model.amount, model.category
    );
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            TransactionResponse::from(model),
            "Transaction created successfully",
        )),
    ))
}

/// Update a transaction
///
/// When amount, category or date change, the old budget is decremented and
/// the new one incremented.
#[utoipa::path(
    put,
    path = "/api/transactions/{id}",
    tag = "transactions",
    params(("id" = i32, Path, description = "Transaction ID")),
    request_body = UpdateTransactionRequest,
    responses(
        (status = 200, description = "Transaction updated successfully", body = ApiResponse<TransactionResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Transaction not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_transaction(
    ApiPath(id): ApiPath<i32>,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<UpdateTransactionRequest>,
) -> Result<Json<ApiResponse<TransactionResponse>>, ApiError> {
    trace!("Entering update_transaction function for id: {}", id);
    request.validate()?;
    if let Some(amount) = request.amount {
        ensure_non_zero(amount)?;
    }

    let db = state.store.conn().await?;
    let txn = db.begin().await?;

    let existing = match transaction::Entity::find_by_id(id).one(&txn).await? {
        Some(model) => model,
        None => {
            warn!("Transaction with ID {} not found for update", id);
            return Err(ApiError::NotFound("Transaction"));
        }
    };

    let mut active: transaction::ActiveModel = existing.clone().into();
    if let Some(amount) = request.amount {
        active.amount = Set(amount);
    }
    if let Some(description) = request.description {
        active.description = Set(description);
    }
    if let Some(category) = request.category {
        active.category = Set(category);
    }
    if let Some(date) = request.date {
        active.date = Set(date);
    }

    let updated = active.update(&txn).await?;

    let moved = updated.amount != existing.amount
        || updated.category != existing.category
        || updated.period() != existing.period();
    if moved {
        debug!("Transaction {} moved between budgets or changed amount", id);
        adjust_budget(&txn, &existing, Decimal::NEGATIVE_ONE).await?;
        adjust_budget(&txn, &updated, Decimal::ONE).await?;
    }
    txn.commit().await?;

    info!("Transaction {} updated", id);
    Ok(Json(ApiResponse::ok(
        TransactionResponse::from(updated),
        "Transaction updated successfully",
    )))
}

/// Delete a transaction
///
/// The matching budget's spent amount is decremented.
#[utoipa::path(
    delete,
    path = "/api/transactions/{id}",
    tag = "transactions",
    params(("id" = i32, Path, description = "Transaction ID")),
    responses(
        (status = 200, description = "Transaction deleted successfully", body = ApiResponse<DeletedResponse>),
        (status = 404, description = "Transaction not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_transaction(
    ApiPath(id): ApiPath<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<DeletedResponse>>, ApiError> {
    let db = state.store.conn().await?;
    let txn = db.begin().await?;

    let existing = match transaction::Entity::find_by_id(id).one(&txn).await? {
        Some(model) => model,
        None => {
            warn!("Transaction with ID {} not found for deletion", id);
            return Err(ApiError::NotFound("Transaction"));
        }
    };

    transaction::Entity::delete_by_id(id).exec(&txn).await?;
    adjust_budget(&txn, &existing, Decimal::NEGATIVE_ONE).await?;
    txn.commit().await?;

    info!("Transaction {} deleted", id);
    Ok(Json(ApiResponse::ok(
        DeletedResponse { id },
        "Transaction deleted successfully",
    )))
}

/// Per-month totals for a year
#[utoipa::path(
    get,
    path = "/api/transactions/analytics/monthly/{year}",
    tag = "analytics",
    params(("year" = i32, Path, description = "Calendar year"), OwnerQuery),
    responses(
        (status = 200, description = "Monthly totals computed", body = ApiResponse<Vec<MonthlyTotal>>),
        (status = 400, description = "Missing owner or invalid year", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_monthly_totals(
    ApiPath(year): ApiPath<i32>,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<OwnerQuery>,
) -> Result<Json<ApiResponse<Vec<MonthlyTotal>>>, ApiError> {
    let user_id = require_owner(query.user_id)?;
    let db = state.store.conn().await?;
    let totals = analytics::monthly_totals(db, &user_id, year).await?;

    debug!("Computed {} monthly totals for {} in {}", totals.len(), user_id, year);
    Ok(Json(ApiResponse::ok(totals, "Monthly totals computed successfully")))
}

/// Per-category totals for a date range
#[utoipa::path(
    get,
    path = "/api/transactions/analytics/categories",
    tag = "analytics",
    params(CategoryTotalsQuery),
    responses(
        (status = 200, description = "Category totals computed", body = ApiResponse<Vec<CategoryTotal>>),
        (status = 400, description = "Missing owner or invalid date range", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_category_totals(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CategoryTotalsQuery>,
) -> Result<Json<ApiResponse<Vec<CategoryTotal>>>, ApiError> {
    let user_id = require_owner(query.user_id)?;
    let (Some(start_date), Some(end_date)) = (query.start_date, query.end_date) else {
        return Err(ApiError::Validation(
            "startDate and endDate are required".to_string(),
        ));
    };

    let db = state.store.conn().await?;
    let totals = analytics::category_totals(db, &user_id, start_date, end_date).await?;

    debug!("Computed {} category totals for {}", totals.len(), user_id);
    Ok(Json(ApiResponse::ok(totals, "Category totals computed successfully")))
}
