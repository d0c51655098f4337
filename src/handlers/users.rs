use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use common::UserPreferences;
use model::entities::{category, user};
use sea_orm::{ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, QueryFilter, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::error::ApiError;
use crate::handlers::{required, ApiJson, ApiPath};
use crate::schemas::{ApiResponse, AppState, DeletedResponse, ErrorResponse};

const EMAIL_ALREADY_EXISTS: &str = "EMAIL_ALREADY_EXISTS";

/// Request body for creating a new user
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(required, length(min = 1))]
    pub name: Option<String>,
    /// Must be unique
    #[validate(required, email)]
    pub email: Option<String>,
    /// Defaults to USD, MM/DD/YYYY and the dark theme
    pub preferences: Option<UserPreferences>,
}

/// Partial preference update
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePreferencesRequest {
    pub currency: Option<String>,
    pub date_format: Option<String>,
    pub theme: Option<String>,
}

/// Request body for updating a user
#[derive(Debug, Default, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(length(min = 1))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub preferences: Option<UpdatePreferencesRequest>,
}

/// User response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub preferences: UserPreferences,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            preferences: UserPreferences {
                currency: model.currency,
                date_format: model.date_format,
                theme: model.theme,
            },
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

fn ensure_known_currency(preferences: &UserPreferences) -> Result<(), ApiError> {
    if !preferences.has_known_currency() {
        return Err(ApiError::Validation(format!(
            "Unknown currency code: {}",
            preferences.currency
        )));
    }
    Ok(())
}

fn duplicate_email(err: DbErr) -> ApiError {
    ApiError::unique_violation(err, EMAIL_ALREADY_EXISTS, "Email already exists")
}

/// Create a new user
///
/// The default categories are created for the new user in the same
/// database transaction.
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created successfully", body = ApiResponse<UserResponse>),
        (status = 400, description = "Invalid request or email already exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), ApiError> {
    trace!("Entering create_user function");
    request.validate()?;
    let name = required(request.name, "name")?;
    let email = required(request.email, "email")?;
    let preferences = request.preferences.unwrap_or_default();
    ensure_known_currency(&preferences)?;

    debug!("Creating user with email: {}", email);
    let new_user = user::ActiveModel {
        name: Set(name),
        email: Set(email.clone()),
        currency: Set(preferences.currency),
        date_format: Set(preferences.date_format),
        theme: Set(preferences.theme),
        ..Default::default()
    };

    let db = state.store.conn().await?;
    let txn = db.begin().await?;
    let user_model = match new_user.insert(&txn).await {
        Ok(model) => model,
        Err(db_error) => {
            error!("Failed to create user '{}': {}", email, db_error);
            return Err(duplicate_email(db_error));
        }
    };

    match category::initialize_defaults(&txn, &user_model.owner_id()).await? {
        Some(count) => debug!("Created {} default categories for user {}", count, user_model.id),
        None => warn!("Default categories already existed for user {}", user_model.id),
    }
    txn.commit().await?;

    info!("User created successfully with ID: {}", user_model.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            UserResponse::from(user_model),
            "User created successfully",
        )),
    ))
}

/// Get a user by ID
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User retrieved successfully", body = ApiResponse<UserResponse>),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_user(
    ApiPath(id): ApiPath<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let db = state.store.conn().await?;
    match user::Entity::find_by_id(id).one(db).await? {
        Some(user_model) => {
            debug!("Retrieved user with ID: {}", user_model.id);
            Ok(Json(ApiResponse::ok(
                UserResponse::from(user_model),
                "User retrieved successfully",
            )))
        }
        None => {
            warn!("User with ID {} not found", id);
            Err(ApiError::NotFound("User"))
        }
    }
}

/// Get a user by e-mail address
#[utoipa::path(
    get,
    path = "/api/users/email/{email}",
    tag = "users",
    params(("email" = String, Path, description = "E-mail address")),
    responses(
        (status = 200, description = "User retrieved successfully", body = ApiResponse<UserResponse>),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_user_by_email(
    ApiPath(email): ApiPath<String>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let db = state.store.conn().await?;
    let user_model = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(db)
        .await?
        .ok_or(ApiError::NotFound("User"))?;

    Ok(Json(ApiResponse::ok(
        UserResponse::from(user_model),
        "User retrieved successfully",
    )))
}

/// Update a user
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated successfully", body = ApiResponse<UserResponse>),
        (status = 400, description = "Invalid request or email already exists", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_user(
    ApiPath(id): ApiPath<i32>,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    trace!("Entering update_user function for id: {}", id);
    request.validate()?;

    let db = state.store.conn().await?;
    let existing = match user::Entity::find_by_id(id).one(db).await? {
        Some(user_model) => user_model,
        None => {
            warn!("User with ID {} not found for update", id);
            return Err(ApiError::NotFound("User"));
        }
    };

    let mut preferences = UserPreferences {
        currency: existing.currency.clone(),
        date_format: existing.date_format.clone(),
        theme: existing.theme.clone(),
    };
    if let Some(update) = request.preferences {
        if let Some(currency) = update.currency {
            preferences.currency = currency;
        }
        if let Some(date_format) = update.date_format {
            preferences.date_format = date_format;
        }
        if let Some(theme) = update.theme {
            preferences.theme = theme;
        }
    }
    ensure_known_currency(&preferences)?;

    let mut active: user::ActiveModel = existing.into();
    let mut updated_fields = Vec::new();
    if let Some(name) = request.name {
        active.name = Set(name);
        updated_fields.push("name");
    }
    if let Some(email) = request.email {
        active.email = Set(email);
        updated_fields.push("email");
    }
    active.currency = Set(preferences.currency);
    active.date_format = Set(preferences.date_format);
    active.theme = Set(preferences.theme);

    debug!("Updating user {} fields: {:?}", id, updated_fields);
    let updated = active.update(db).await.map_err(duplicate_email)?;

    info!("User {} updated", id);
    Ok(Json(ApiResponse::ok(
        UserResponse::from(updated),
        "User updated successfully",
    )))
}

/// Delete a user
///
/// Categories, budgets and transactions owned by the user are kept.
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted successfully", body = ApiResponse<DeletedResponse>),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_user(
    ApiPath(id): ApiPath<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<DeletedResponse>>, ApiError> {
    let db = state.store.conn().await?;
    let result = user::Entity::delete_by_id(id).exec(db).await?;
    if result.rows_affected == 0 {
        warn!("User with ID {} not found for deletion", id);
        return Err(ApiError::NotFound("User"));
    }

    info!("User {} deleted", id);
    Ok(Json(ApiResponse::ok(
        DeletedResponse { id },
        "User deleted successfully",
    )))
}
