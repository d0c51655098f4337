use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use model::entities::category;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::error::ApiError;
use crate::handlers::transactions::OwnerQuery;
use crate::handlers::{require_owner, required, ApiJson, ApiPath, ApiQuery};
use crate::schemas::{ApiResponse, AppState, DeletedResponse, ErrorResponse};

const DUPLICATE_CATEGORY: &str = "DUPLICATE_CATEGORY";

/// Request body for creating a category
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    #[validate(required, length(min = 1))]
    pub user_id: Option<String>,
    /// Unique per owner
    #[validate(required, length(min = 1))]
    pub name: Option<String>,
    /// Defaults to "DollarSign"
    pub icon: Option<String>,
    /// Defaults to "#45B7D1"
    pub color: Option<String>,
}

/// Request body for updating a category
#[derive(Debug, Default, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1))]
    pub name: Option<String>,
    #[validate(length(min = 1))]
    pub icon: Option<String>,
    #[validate(length(min = 1))]
    pub color: Option<String>,
}

/// Request body for bulk-inserting the default categories
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InitializeCategoriesRequest {
    #[validate(required, length(min = 1))]
    pub user_id: Option<String>,
}

/// Outcome of the default category bootstrap
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InitializeCategoriesResponse {
    /// Number of inserted categories; zero when they already existed
    pub count: u64,
}

/// Category response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    pub id: i32,
    pub user_id: String,
    pub name: String,
    pub icon: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<category::Model> for CategoryResponse {
    fn from(model: category::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            name: model.name,
            icon: model.icon,
            color: model.color,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

fn duplicate_name(err: sea_orm::DbErr) -> ApiError {
    ApiError::unique_violation(err, DUPLICATE_CATEGORY, "Category already exists")
}

/// List the categories of an owner, sorted by name
#[utoipa::path(
    get,
    path = "/api/categories",
    tag = "categories",
    params(OwnerQuery),
    responses(
        (status = 200, description = "Categories retrieved successfully", body = ApiResponse<Vec<CategoryResponse>>),
        (status = 400, description = "Missing owner", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_categories(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<OwnerQuery>,
) -> Result<Json<ApiResponse<Vec<CategoryResponse>>>, ApiError> {
    let user_id = require_owner(query.user_id)?;
    let db = state.store.conn().await?;

    let categories = category::Entity::find()
        .filter(category::Column::UserId.eq(&user_id))
        .order_by_asc(category::Column::Name)
        .all(db)
        .await?;

    debug!("Retrieved {} categories for {}", categories.len(), user_id);
    Ok(Json(ApiResponse::ok(
        categories.into_iter().map(CategoryResponse::from).collect(),
        "Categories retrieved successfully",
    )))
}

/// Get a category by ID
#[utoipa::path(
    get,
    path = "/api/categories/{id}",
    tag = "categories",
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category retrieved successfully", body = ApiResponse<CategoryResponse>),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_category(
    ApiPath(id): ApiPath<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<CategoryResponse>>, ApiError> {
    let db = state.store.conn().await?;
    let model = category::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(ApiError::NotFound("Category"))?;

    Ok(Json(ApiResponse::ok(
        CategoryResponse::from(model),
        "Category retrieved successfully",
    )))
}

/// Create a category
#[utoipa::path(
    post,
    path = "/api/categories",
    tag = "categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created successfully", body = ApiResponse<CategoryResponse>),
        (status = 400, description = "Invalid request or duplicate name", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_category(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CategoryResponse>>), ApiError> {
    trace!("Entering create_category function");
    request.validate()?;
    let user_id = require_owner(request.user_id)?;
    let name = required(request.name, "name")?;

    let new_category = category::ActiveModel {
        user_id: Set(user_id),
        name: Set(name.clone()),
        icon: Set(request
            .icon
            .filter(|icon| !icon.is_empty())
            .unwrap_or_else(|| category::DEFAULT_ICON.to_string())),
        color: Set(request
            .color
            .filter(|color| !color.is_empty())
            .unwrap_or_else(|| category::DEFAULT_COLOR.to_string())),
        ..Default::default()
    };

    let db = state.store.conn().await?;
    match new_category.insert(db).await {
        Ok(model) => {
            info!("Category created with ID: {}, name: {}", model.id, model.name);
            Ok((
                StatusCode::CREATED,
                Json(ApiResponse::ok(
                    CategoryResponse::from(model),
                    "Category created successfully",
                )),
            ))
        }
        Err(db_error) => {
            error!("Failed to create category '{}': {}", name, db_error);
            Err(duplicate_name(db_error))
        }
    }
}

/// Update a category
#[utoipa::path(
    put,
    path = "/api/categories/{id}",
    tag = "categories",
    params(("id" = i32, Path, description = "Category ID")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Category updated successfully", body = ApiResponse<CategoryResponse>),
        (status = 400, description = "Invalid request or duplicate name", body = ErrorResponse),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_category(
    ApiPath(id): ApiPath<i32>,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<UpdateCategoryRequest>,
) -> Result<Json<ApiResponse<CategoryResponse>>, ApiError> {
    request.validate()?;
    let db = state.store.conn().await?;

    let existing = match category::Entity::find_by_id(id).one(db).await? {
        Some(model) => model,
        None => {
            warn!("Category with ID {} not found for update", id);
            return Err(ApiError::NotFound("Category"));
        }
    };

    let mut active: category::ActiveModel = existing.into();
    if let Some(name) = request.name {
        active.name = Set(name);
    }
    if let Some(icon) = request.icon {
        active.icon = Set(icon);
    }
    if let Some(color) = request.color {
        active.color = Set(color);
    }

    let updated = active.update(db).await.map_err(duplicate_name)?;
    info!("Category {} updated", id);
    Ok(Json(ApiResponse::ok(
        CategoryResponse::from(updated),
        "Category updated successfully",
    )))
}

/// Delete a category
///
/// Transactions and budgets that use the name are left untouched.
#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    tag = "categories",
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category deleted successfully", body = ApiResponse<DeletedResponse>),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_category(
    ApiPath(id): ApiPath<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<DeletedResponse>>, ApiError> {
    let db = state.store.conn().await?;
    let result = category::Entity::delete_by_id(id).exec(db).await?;
    if result.rows_affected == 0 {
        warn!("Category with ID {} not found for deletion", id);
        return Err(ApiError::NotFound("Category"));
    }

    info!("Category {} deleted", id);
    Ok(Json(ApiResponse::ok(
        DeletedResponse { id },
        "Category deleted successfully",
    )))
}

/// Insert the default categories for an owner
#[utoipa::path(
    post,
    path = "/api/categories/initialize",
    tag = "categories",
    request_body = InitializeCategoriesRequest,
    responses(
        (status = 201, description = "Default categories created", body = ApiResponse<InitializeCategoriesResponse>),
        (status = 200, description = "Default categories already exist", body = ApiResponse<InitializeCategoriesResponse>),
        (status = 400, description = "Missing owner", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn initialize_categories(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<InitializeCategoriesRequest>,
) -> Result<(StatusCode, Json<ApiResponse<InitializeCategoriesResponse>>), ApiError> {
    request.validate()?;
    let user_id = require_owner(request.user_id)?;
    let db = state.store.conn().await?;

    match category::initialize_defaults(db, &user_id).await? {
        Some(count) => Ok((
            StatusCode::CREATED,
            Json(ApiResponse::ok(
                InitializeCategoriesResponse { count },
                "Default categories created successfully",
            )),
        )),
        None => Ok((
            StatusCode::OK,
            Json(ApiResponse::ok(
                InitializeCategoriesResponse { count: 0 },
                "Default categories already exist",
            )),
        )),
    }
}

/// Insert the default categories for an owner
///
/// Same behavior as `POST /api/categories/initialize`, kept for older clients.
#[utoipa::path(
    post,
    path = "/api/categories/initialize-default",
    tag = "categories",
    request_body = InitializeCategoriesRequest,
    responses(
        (status = 201, description = "Default categories created", body = ApiResponse<InitializeCategoriesResponse>),
        (status = 200, description = "Default categories already exist", body = ApiResponse<InitializeCategoriesResponse>),
        (status = 400, description = "Missing owner", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn initialize_default_categories(
    state: State<AppState>,
    request: ApiJson<InitializeCategoriesRequest>,
) -> Result<(StatusCode, Json<ApiResponse<InitializeCategoriesResponse>>), ApiError> {
    initialize_categories(state, request).await
}
