use crate::schemas::ApiDoc;
use utoipa::openapi::{schema::Schema, PathItemType, RefOr};
use utoipa::OpenApi;

fn object_properties(name: &str) -> Vec<String> {
    let openapi = ApiDoc::openapi();
    let components = openapi.components.expect("components");
    match components.schemas.get(name) {
        Some(RefOr::T(Schema::Object(obj))) => obj.properties.keys().cloned().collect(),
        _ => panic!("{} should be an object schema", name),
    }
}

#[test]
fn test_openapi_schema_generation() {
    let openapi = ApiDoc::openapi();

    let components = openapi.components.as_ref().unwrap();
    for schema in [
        "ErrorResponse",
        "HealthResponse",
        "TransactionResponse",
        "CategoryResponse",
        "BudgetResponse",
        "UserResponse",
        "MonthlyTotal",
        "CategoryTotal",
        "BudgetVsActual",
    ] {
        assert!(components.schemas.contains_key(schema), "missing schema {}", schema);
    }

    assert!(serde_json::to_string(&openapi).is_ok());
}

#[test]
fn test_error_response_schema_structure() {
    let properties = object_properties("ErrorResponse");
    for field in ["error", "code", "success"] {
        assert!(properties.iter().any(|p| p == field), "missing {}", field);
    }
}

#[test]
fn test_response_schemas_use_camel_case() {
    let budget = object_properties("BudgetResponse");
    assert!(budget.iter().any(|p| p == "budgetAmount"));
    assert!(budget.iter().any(|p| p == "spentAmount"));
    assert!(!budget.iter().any(|p| p == "spent_amount"));

    let transaction = object_properties("TransactionResponse");
    assert!(transaction.iter().any(|p| p == "userId"));
    assert!(transaction.iter().any(|p| p == "createdAt"));
}

#[test]
fn test_openapi_paths_contain_health_endpoint() {
    let openapi = ApiDoc::openapi();

    let health_path = openapi.paths.paths.get("/api/health").expect("health path");
    let health_get = health_path
        .operations
        .get(&PathItemType::Get)
        .expect("GET /api/health");

    assert!(health_get.responses.responses.contains_key("200"));
}

#[test]
fn test_openapi_lists_every_route() {
    let openapi = ApiDoc::openapi();
    let paths = &openapi.paths.paths;

    let expected = [
        ("/api/transactions", vec![PathItemType::Get, PathItemType::Post]),
        (
            "/api/transactions/{id}",
            vec![PathItemType::Get, PathItemType::Put, PathItemType::Delete],
        ),
        ("/api/transactions/analytics/monthly/{year}", vec![PathItemType::Get]),
        ("/api/transactions/analytics/categories", vec![PathItemType::Get]),
        ("/api/categories", vec![PathItemType::Get, PathItemType::Post]),
        ("/api/categories/initialize", vec![PathItemType::Post]),
        ("/api/categories/initialize-default", vec![PathItemType::Post]),
        (
            "/api/categories/{id}",
            vec![PathItemType::Get, PathItemType::Put, PathItemType::Delete],
        ),
        ("/api/budgets", vec![PathItemType::Get, PathItemType::Post]),
        (
            "/api/budgets/{id}",
            vec![PathItemType::Get, PathItemType::Put, PathItemType::Delete],
        ),
        ("/api/budgets/{id}/reconcile", vec![PathItemType::Post]),
        ("/api/budgets/analytics/vs-actual/{year}", vec![PathItemType::Get]),
        ("/api/users", vec![PathItemType::Post]),
        ("/api/users/email/{email}", vec![PathItemType::Get]),
        (
            "/api/users/{id}",
            vec![PathItemType::Get, PathItemType::Put, PathItemType::Delete],
        ),
    ];

    for (path, methods) in expected {
        let item = paths.get(path).unwrap_or_else(|| panic!("missing path {}", path));
        assert_eq!(item.operations.len(), methods.len(), "operations on {}", path);
        for method in methods {
            assert!(item.operations.contains_key(&method), "missing method on {}", path);
        }
    }
}

#[test]
fn test_all_error_responses_reference_correct_schema() {
    let openapi_json = serde_json::to_string(&ApiDoc::openapi()).unwrap();

    assert!(!openapi_json.contains("crate.schemas.ErrorResponse"));
    assert!(!openapi_json.contains("crate::schemas::ErrorResponse"));
    assert!(openapi_json.contains("#/components/schemas/ErrorResponse"));
}
