use axum::http::StatusCode;
use fuelbook::api::{self, AppState};
use fuelbook::config::Config;
use fuelbook::db::init_db;
use fuelbook::engine::OdometerPolicy;
use fuelbook::{FuelLedger, Repository, UserId};
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

async fn setup_test_app() -> (axum::Router, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();

    let pool = init_db(&db_path).await.expect("init_db failed");
    let ledger: Arc<dyn FuelLedger> = Arc::new(Repository::new(pool));

    let config = Config {
        port: 0,
        database_path: db_path,
        odometer_policy: OdometerPolicy::Warn,
    };

    (api::create_router(AppState::new(ledger, config)), temp_dir)
}

async fn request(
    app: &axum::Router,
    method: &str,
    uri: &str,
    user: Option<UserId>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = axum::http::Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("X-User-Id", user.to_string());
    }
    let req = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(axum::body::Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(axum::body::Body::empty()).unwrap(),
    };

    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _temp) = setup_test_app().await;

    let (status, body) = request(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_ready_endpoint() {
    let (app, _temp) = setup_test_app().await;

    let (status, body) = request(&app, "GET", "/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["odometerPolicy"], "warn");
}

#[tokio::test]
async fn test_missing_user_header_is_unauthorized() {
    let (app, _temp) = setup_test_app().await;

    let (status, body) = request(&app, "GET", "/v1/vehicles", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].as_str().unwrap().contains("X-User-Id"));
}

#[tokio::test]
async fn test_create_list_and_get_vehicle() {
    let (app, _temp) = setup_test_app().await;
    let owner = UserId::random();

    let (status, created) = request(
        &app,
        "POST",
        "/v1/vehicles",
        Some(owner),
        Some(serde_json::json!({
            "nickname": "Daily",
            "registrationNumber": "KA-01-1234",
            "make": "Honda",
            "initialOdometer": 1000
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["nickname"], "Daily");
    assert_eq!(created["registrationNumber"], "KA-01-1234");
    assert_eq!(created["initialOdometer"], 1000);
    assert_eq!(created["currentOdometer"], 1000);
    assert!(created["model"].is_null());
    assert!(created["updatedAt"].is_null());

    let id = created["id"].as_str().unwrap().to_string();

    let (status, listed) = request(&app, "GET", "/v1/vehicles", Some(owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["vehicles"].as_array().unwrap().len(), 1);
    assert_eq!(listed["vehicles"][0]["id"], id.as_str());

    let (status, fetched) =
        request(&app, "GET", &format!("/v1/vehicles/{}", id), Some(owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn test_vehicle_access_is_owner_only() {
    let (app, _temp) = setup_test_app().await;
    let owner = UserId::random();

    let (_, created) = request(
        &app,
        "POST",
        "/v1/vehicles",
        Some(owner),
        Some(serde_json::json!({ "nickname": "Mine" })),
    )
    .await;
    let uri = format!("/v1/vehicles/{}", created["id"].as_str().unwrap());

    let (status, _) = request(&app, "GET", &uri, Some(UserId::random()), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = request(&app, "GET", &format!("{}/stats", uri), Some(UserId::random()), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].is_string());

    let (listed_status, listed) =
        request(&app, "GET", "/v1/vehicles", Some(UserId::random()), None).await;
    assert_eq!(listed_status, StatusCode::OK);
    assert!(listed["vehicles"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_and_malformed_vehicle_ids() {
    let (app, _temp) = setup_test_app().await;
    let user = UserId::random();

    let (status, _) = request(
        &app,
        "GET",
        &format!("/v1/vehicles/{}", UserId::random()),
        Some(user),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = request(&app, "GET", "/v1/vehicles/not-a-uuid", Some(user), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_negative_initial_odometer_is_rejected() {
    let (app, _temp) = setup_test_app().await;

    let (status, _) = request(
        &app,
        "POST",
        "/v1/vehicles",
        Some(UserId::random()),
        Some(serde_json::json!({ "initialOdometer": -5 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

async fn create_vehicle(app: &axum::Router, owner: UserId, body: serde_json::Value) -> String {
    let (status, created) = request(app, "POST", "/v1/vehicles", Some(owner), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    format!("/v1/vehicles/{}", created["id"].as_str().unwrap())
}

#[tokio::test]
async fn test_update_vehicle() {
    let (app, _temp) = setup_test_app().await;
    let owner = UserId::random();
    let uri = create_vehicle(
        &app,
        owner,
        serde_json::json!({ "nickname": "Daily", "make": "Honda", "initialOdometer": 1000 }),
    )
    .await;

    let (status, updated) = request(
        &app,
        "PUT",
        &uri,
        Some(owner),
        Some(serde_json::json!({ "model": "City", "nickname": "  ", "currentOdometer": 1500 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["nickname"], "Daily");
    assert_eq!(updated["make"], "Honda");
    assert_eq!(updated["model"], "City");
    assert_eq!(updated["initialOdometer"], 1000);
    assert_eq!(updated["currentOdometer"], 1500);
    assert!(updated["updatedAt"].is_string());

    let (_, fetched) = request(&app, "GET", &uri, Some(owner), None).await;
    assert_eq!(fetched, updated);
}

#[tokio::test]
async fn test_update_vehicle_rejections() {
    let (app, _temp) = setup_test_app().await;
    let owner = UserId::random();
    let uri = create_vehicle(&app, owner, serde_json::json!({ "initialOdometer": 1000 })).await;

    let (status, body) = request(
        &app,
        "PUT",
        &uri,
        Some(owner),
        Some(serde_json::json!({ "currentOdometer": 900 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("1000"));

    let (status, _) = request(
        &app,
        "PUT",
        &uri,
        Some(owner),
        Some(serde_json::json!({ "currentOdometer": -1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = request(
        &app,
        "PUT",
        &uri,
        Some(owner),
        Some(serde_json::json!({ "registrationNumber": "R".repeat(51) })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = request(
        &app,
        "PUT",
        &uri,
        Some(UserId::random()),
        Some(serde_json::json!({ "nickname": "Stolen" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, fetched) = request(&app, "GET", &uri, Some(owner), None).await;
    assert_eq!(fetched["currentOdometer"], 1000);
    assert!(fetched["nickname"].is_null());
    assert!(fetched["updatedAt"].is_null());
}

#[tokio::test]
async fn test_delete_vehicle() {
    let (app, _temp) = setup_test_app().await;
    let owner = UserId::random();
    let kept = create_vehicle(&app, owner, serde_json::json!({ "nickname": "Kept" })).await;
    let uri = create_vehicle(&app, owner, serde_json::json!({ "nickname": "Sold" })).await;

    let (status, _) = request(&app, "DELETE", &uri, Some(UserId::random()), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = request(&app, "DELETE", &uri, Some(owner), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, _) = request(&app, "GET", &uri, Some(owner), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = request(
        &app,
        "PUT",
        &uri,
        Some(owner),
        Some(serde_json::json!({ "nickname": "Back" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = request(&app, "DELETE", &uri, Some(owner), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, listed) = request(&app, "GET", "/v1/vehicles", Some(owner), None).await;
    let vehicles = listed["vehicles"].as_array().unwrap();
    assert_eq!(vehicles.len(), 1);
    assert_eq!(
        format!("/v1/vehicles/{}", vehicles[0]["id"].as_str().unwrap()),
        kept
    );
}

