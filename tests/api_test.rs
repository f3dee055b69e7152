use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use bibliolend::config::{Config, LibraryConfig};
use bibliolend::db;
use bibliolend::infrastructure::{AppState, SeaOrmKeyValueStore};
use bibliolend::server::build_router;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use tower::util::ServiceExt; // for `oneshot`

// Helper to create a test app backed by in-memory SQLite
async fn setup_app(prefix: &str, env: &[(&str, &str)]) -> Router {
    let db = db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB");
    let vars: HashMap<String, String> = env
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let config = Config::from_lookup(|key| vars.get(key).cloned());
    let library_config = LibraryConfig {
        user_code_prefix: prefix.to_string(),
    };
    let state = AppState::new(
        Arc::new(SeaOrmKeyValueStore::new(db)),
        &config,
        library_config,
    )
    .expect("Failed to build state");
    build_router(state, &[])
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().uri(uri).method(method);
    let req = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn create_asset(app: &Router, title: &str, copies: &str) -> String {
    let (status, assets) = send(
        app,
        "POST",
        "/api/assets",
        Some(json!({
            "title": title,
            "type": "Libro",
            "copies": copies,
            "isLoanable": true
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let assets = assets.as_array().unwrap();
    assets.last().unwrap()["id"].as_str().unwrap().to_string()
}

async fn create_user(app: &Router, name: &str, last_name: &str) -> String {
    let (status, users) = send(
        app,
        "POST",
        "/api/users",
        Some(json!({"name": name, "lastName": last_name, "type": "Profesor"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    users.as_array().unwrap().last().unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_health() {
    let app = setup_app("LIB", &[]).await;
    let (status, body) = send(&app, "GET", "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_user_codes_and_changes() {
    let app = setup_app("LIB", &[]).await;
    create_user(&app, "Ana", "Ruiz").await;
    create_user(&app, "Luis", "Gil").await;

    let (status, users) = send(&app, "GET", "/api/users", None).await;
    assert_eq!(status, StatusCode::OK);
    // sorted by last name
    assert_eq!(users[0]["userCode"], "LIB-0002");
    assert_eq!(users[1]["userCode"], "LIB-0001");
    assert_eq!(users[1]["type"], "Profesor");

    let (_, filtered) = send(&app, "GET", "/api/users?q=ruiz,%20ana", None).await;
    assert_eq!(filtered.as_array().unwrap().len(), 1);

    let (status, pending) = send(&app, "GET", "/api/changes/users/pending", None).await;
    assert_eq!(status, StatusCode::OK);
    let pending = pending.as_array().unwrap();
    assert_eq!(pending.len(), 2);
    assert_eq!(pending[0]["changeType"], "CREATE");

    let first_id = pending[0]["id"].clone();
    let (status, _) = send(
        &app,
        "POST",
        "/api/changes/users/mark-synced",
        Some(json!({"ids": [first_id]})),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, pending) = send(&app, "GET", "/api/changes/users/pending", None).await;
    assert_eq!(pending.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, "DELETE", "/api/changes/users", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, all) = send(&app, "GET", "/api/changes/users", None).await;
    assert!(all.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_prefix_is_server_error() {
    let app = setup_app("", &[]).await;
    let (status, body) = send(
        &app,
        "POST",
        "/api/users",
        Some(json!({"name": "Ana", "lastName": "Ruiz"})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body["error"],
        "Configuration error: User code prefix not configured."
    );
}

#[tokio::test]
async fn test_update_missing_user_is_not_found() {
    let app = setup_app("LIB", &[]).await;
    let (status, body) = send(
        &app,
        "PUT",
        "/api/users/missing-id",
        Some(json!({"name": "Nobody"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User with id missing-id not found");

    let (_, changes) = send(&app, "GET", "/api/changes/users", None).await;
    assert!(changes.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_borrow_return_flow() {
    let app = setup_app("LIB", &[]).await;
    let asset_id = create_asset(&app, "245-Rayuela", "2").await;
    let user_id = create_user(&app, "Ana", "Ruiz").await;

    let (status, loans) = send(
        &app,
        "POST",
        "/api/loans",
        Some(json!({"assetId": asset_id, "userId": user_id})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let loan = loans[0].clone();
    assert_eq!(loan["assetTitle"], "Rayuela");
    assert_eq!(loan["userName"], "Ruiz, Ana");

    let (_, availability) = send(
        &app,
        "GET",
        &format!("/api/assets/{}/availability", asset_id),
        None,
    )
    .await;
    assert_eq!(availability["available"], 1);
    assert_eq!(availability["borrowable"], true);

    let loan_id = loan["id"].as_str().unwrap();
    let (status, returned) = send(
        &app,
        "POST",
        &format!("/api/loans/{}/return", loan_id),
        Some(json!({"returnDate": "2024-05-08T09:00"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(returned["activeLoans"].as_array().unwrap().is_empty());
    assert_eq!(returned["history"][0]["returnDate"], "2024-05-08T09:00");
    assert_eq!(returned["history"][0]["borrowDate"], loan["borrowDate"]);

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/loans/{}/return", loan_id),
        Some(json!({"returnDate": "2024-05-09"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, history) = send(&app, "GET", "/api/loans/history?user=ana", None).await;
    assert_eq!(history.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, "GET", "/api/loans/history?from=last-week", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, loan_changes) = send(&app, "GET", "/api/changes/loans", None).await;
    let kinds: Vec<&str> = loan_changes
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["changeType"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, vec!["CREATE", "DELETE", "CREATE"]);
}

#[tokio::test]
async fn test_permissive_borrow_over_commits() {
    let app = setup_app("LIB", &[]).await;
    let asset_id = create_asset(&app, "Momo", "1").await;
    let user_id = create_user(&app, "Ana", "Ruiz").await;
    let body = json!({"assetId": asset_id, "userId": user_id});

    send(&app, "POST", "/api/loans", Some(body.clone())).await;
    let (status, loans) = send(&app, "POST", "/api/loans", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(loans.as_array().unwrap().len(), 2);

    let (_, availability) = send(
        &app,
        "GET",
        &format!("/api/assets/{}/availability", asset_id),
        None,
    )
    .await;
    assert_eq!(availability["available"], -1);
}

#[tokio::test]
async fn test_copy_limit_conflict() {
    let app = setup_app("LIB", &[("ENFORCE_COPY_LIMIT", "true")]).await;
    let asset_id = create_asset(&app, "Momo", "1").await;
    let user_id = create_user(&app, "Ana", "Ruiz").await;
    let body = json!({"assetId": asset_id, "userId": user_id});

    let (status, _) = send(&app, "POST", "/api/loans", Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, err) = send(&app, "POST", "/api/loans", Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["error"], "No copies of 'Momo' are available");
}

#[tokio::test]
async fn test_delete_asset_cascades() {
    let app = setup_app("LIB", &[]).await;
    let gone = create_asset(&app, "Momo", "1").await;
    let kept = create_asset(&app, "Rayuela", "1").await;
    let user_id = create_user(&app, "Ana", "Ruiz").await;
    for asset_id in [&gone, &kept] {
        send(
            &app,
            "POST",
            "/api/loans",
            Some(json!({"assetId": asset_id, "userId": user_id})),
        )
        .await;
    }

    let (status, result) = send(&app, "DELETE", &format!("/api/assets/{}", gone), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["assets"].as_array().unwrap().len(), 1);
    let active = result["activeLoans"].as_array().unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0]["assetId"], kept.as_str());

    let (status, _) = send(&app, "GET", &format!("/api/assets/{}", gone), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_asset_filters() {
    let app = setup_app("LIB", &[]).await;
    create_asset(&app, "245-Rayuela", "1").await;
    send(
        &app,
        "POST",
        "/api/assets",
        Some(json!({"title": "Planeta azul", "type": "DVD"})),
    )
    .await;

    let (_, types) = send(&app, "GET", "/api/assets/types", None).await;
    assert_eq!(types, json!(["DVD", "Libro"]));

    let (_, dvds) = send(&app, "GET", "/api/assets?types=DVD", None).await;
    assert_eq!(dvds.as_array().unwrap().len(), 1);

    let (_, found) = send(&app, "GET", "/api/assets?q=rayu", None).await;
    assert_eq!(found[0]["title"], "245-Rayuela");
}

#[tokio::test]
async fn test_unknown_domain_and_unconfigured_sync() {
    let app = setup_app("LIB", &[]).await;

    let (status, _) = send(&app, "GET", "/api/changes/books", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, "POST", "/api/sync/users/down", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("Spreadsheet URL"));
}

#[tokio::test]
async fn test_repair_and_export() {
    let app = setup_app("LIB", &[]).await;
    create_asset(&app, "Momo", "1").await;
    create_user(&app, "Ana", "Ruiz").await;

    let (status, report) = send(&app, "POST", "/api/loans/repair", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["closedDuplicates"], 0);

    let (status, backup) = send(&app, "GET", "/api/export", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(backup["userCodePrefix"], "LIB");
    assert_eq!(backup["assets"].as_array().unwrap().len(), 1);
    assert_eq!(backup["userChanges"].as_array().unwrap().len(), 1);
}
