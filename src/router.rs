use crate::handlers::{
    budgets::{
        create_budget, delete_budget, get_budget, get_budget_vs_actual, get_budgets,
        reconcile_budget, update_budget,
    },
    categories::{
        create_category, delete_category, get_categories, get_category, initialize_categories,
        initialize_default_categories, update_category,
    },
    health::health_check,
    route_not_found,
    transactions::{
        create_transaction, delete_transaction, get_category_totals, get_monthly_totals,
        get_transaction, get_transactions, update_transaction,
    },
    users::{create_user, delete_user, get_user, get_user_by_email, update_user},
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use axum_prometheus::PrometheusMetricLayer;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/api/health", get(health_check))
        // Transaction routes
        .route("/api/transactions", get(get_transactions).post(create_transaction))
        .route(
            "/api/transactions/:id",
            get(get_transaction)
                .put(update_transaction)
                .delete(delete_transaction),
        )
        .route("/api/transactions/analytics/monthly/:year", get(get_monthly_totals))
        .route("/api/transactions/analytics/categories", get(get_category_totals))
        // Category routes
        .route("/api/categories", get(get_categories).post(create_category))
        .route("/api/categories/initialize", post(initialize_categories))
        .route(
            "/api/categories/initialize-default",
            post(initialize_default_categories),
        )
        .route(
            "/api/categories/:id",
            get(get_category).put(update_category).delete(delete_category),
        )
        // Budget routes
        .route("/api/budgets", get(get_budgets).post(create_budget))
        .route(
            "/api/budgets/:id",
            get(get_budget).put(update_budget).delete(delete_budget),
        )
        .route("/api/budgets/:id/reconcile", post(reconcile_budget))
        .route("/api/budgets/analytics/vs-actual/:year", get(get_budget_vs_actual))
        // User routes
        .route("/api/users", post(create_user))
        .route("/api/users/email/:email", get(get_user_by_email))
        .route(
            "/api/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(route_not_found)
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Adds the Prometheus request metrics layer and the `/metrics` endpoint.
///
/// The recorder is process global, so this may only be called once.
pub fn attach_metrics(router: Router) -> Router {
    let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
    router
        .route("/metrics", get(move || async move { metric_handle.render() }))
        .layer(prometheus_layer)
}
